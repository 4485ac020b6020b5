//! Datasets command handler.

use clap::Args;
use medfaq_core::{config::AppConfig, AppResult};
use medfaq_knowledge::DatasetRegistry;

/// List the available datasets
#[derive(Args, Debug)]
pub struct DatasetsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DatasetsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing datasets command");

        let registry = DatasetRegistry::from_config(&config.datasets)?;

        if self.json {
            let datasets: Vec<_> = registry.iter().collect();
            println!("{}", serde_json::to_string_pretty(&datasets)?);
        } else {
            for (i, dataset) in registry.iter().enumerate() {
                let marker = if i == 0 { " (default)" } else { "" };
                println!("{}{} - {}", dataset.label, marker, dataset.department);
                println!("    {}", dataset.source_url);
            }
        }

        Ok(())
    }
}
