//! Command handlers for the medfaq CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod datasets;
pub mod import;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use datasets::DatasetsCommand;
pub use import::ImportCommand;
pub use stats::StatsCommand;

use medfaq_chat::SessionController;
use medfaq_core::{config::AppConfig, AppResult};
use medfaq_knowledge::DatasetRegistry;
use std::sync::Arc;

/// Wire the session controller from the workspace configuration.
pub(crate) fn build_controller(config: &AppConfig) -> AppResult<SessionController> {
    let registry = DatasetRegistry::from_config(&config.datasets)?;
    let index = medfaq_knowledge::open_index(config)?;
    let retriever = medfaq_knowledge::retriever(config, index)?;
    let generator = medfaq_knowledge::synthesizer(config)?;

    Ok(
        SessionController::new(registry, Arc::new(retriever), Arc::new(generator))
            .with_top_k(config.retrieval.top_k)
            .with_export_policy(config.export.clear_policy),
    )
}

/// Render the references of an answer, one per line.
pub(crate) fn format_references(references: &[Option<String>]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("  [{}] {}", i + 1, r.as_deref().unwrap_or("(無參考資料)")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_references() {
        let rendered = format_references(&[Some("多喝水".to_string()), None]);
        assert_eq!(rendered, "  [1] 多喝水\n  [2] (無參考資料)");
        assert_eq!(format_references(&[]), "");
    }
}
