//! Stats command handler.
//!
//! Shows document counts of the vector index.

use clap::Args;
use medfaq_core::{config::AppConfig, AppResult};
use medfaq_knowledge::DatasetRegistry;

/// Show vector index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = medfaq_knowledge::stats(config)?;
        let registry = DatasetRegistry::from_config(&config.datasets)?;

        if self.json {
            let output = serde_json::json!({
                "indexPath": config.index_path(),
                "documentsCount": stats.documents_count,
                "perDataset": stats.per_dataset,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Index: {}", config.index_path().display());
        println!("Documents: {}", stats.documents_count);
        for dataset in registry.iter() {
            let count = stats.per_dataset.get(&dataset.label).copied().unwrap_or(0);
            println!("  {}: {}", dataset.label, count);
        }
        for (label, count) in &stats.per_dataset {
            if !registry.contains(label) {
                println!("  {} (not configured): {}", label, count);
            }
        }

        Ok(())
    }
}
