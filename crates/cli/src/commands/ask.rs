//! Ask command handler.
//!
//! Answers one question against a dataset and exits.

use super::{build_controller, format_references};
use clap::Args;
use medfaq_chat::{SubmitOutcome, CREDENTIAL_NOTICE, DISCLAIMER};
use medfaq_core::{config::AppConfig, ApiKey, AppError, AppResult};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Dataset label (default: first configured dataset)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig, api_key: Option<&ApiKey>) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        // Credential gate runs before the index is opened.
        let Some(api_key) = api_key.filter(|k| !k.is_blank()) else {
            return Err(missing_key(CREDENTIAL_NOTICE));
        };

        let controller = build_controller(config)?;
        let mut state = match self.dataset {
            Some(ref label) => controller.new_session_with(label)?,
            None => controller.new_session(),
        };

        let outcome = controller
            .submit_question(&mut state, &self.question, Some(api_key))
            .await?;

        let (answer, references) = match outcome {
            SubmitOutcome::Answered { answer, references } => (answer, references),
            SubmitOutcome::CredentialMissing { notice } => return Err(missing_key(notice)),
        };

        if self.json {
            let output = serde_json::json!({
                "dataset": state.selected_dataset(),
                "question": self.question,
                "answer": answer,
                "references": references,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            eprintln!("{}\n", DISCLAIMER);
            println!("{}", answer);
            if !references.is_empty() {
                println!("\n參考資料:");
                println!("{}", format_references(&references));
            }
        }

        Ok(())
    }
}

fn missing_key(notice: &str) -> AppError {
    eprintln!("{}", notice);
    AppError::Authentication("No API key supplied; use --api-key or MEDFAQ_API_KEY".to_string())
}
