//! Import command handler.
//!
//! Reads FAQ JSON-lines files into the workspace vector index.

use clap::Args;
use medfaq_core::{config::AppConfig, ApiKey, AppResult};
use medfaq_knowledge::{DatasetRegistry, ImportOptions};
use std::path::PathBuf;

/// Import FAQ records into the vector index
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Files (.jsonl, .json) or directories to import
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Clear the index before importing
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportCommand {
    pub async fn execute(&self, config: &AppConfig, api_key: Option<&ApiKey>) -> AppResult<()> {
        tracing::info!("Executing import command");
        tracing::debug!("Import options: {:?}", self);

        let registry = DatasetRegistry::from_config(&config.datasets)?;
        let options = ImportOptions::new(self.paths.clone()).with_reset(self.reset);

        let stats = medfaq_knowledge::import_files(config, &registry, &options, api_key).await?;

        if self.json {
            let output = serde_json::json!({
                "filesCount": stats.files_count,
                "documentsCount": stats.documents_count,
                "skippedCount": stats.skipped_count,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Imported {} documents from {} files in {:.2}s",
                stats.documents_count, stats.files_count, stats.duration_secs
            );
            if stats.skipped_count > 0 {
                println!(
                    "Skipped {} records whose category is not a configured dataset",
                    stats.skipped_count
                );
            }
        }

        Ok(())
    }
}
