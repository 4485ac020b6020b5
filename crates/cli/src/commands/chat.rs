//! Chat command handler.
//!
//! Interactive session: plain lines are questions, lines starting with `/`
//! are session commands. The API key lives in the loop, never in the
//! session state.

use super::{build_controller, format_references};
use clap::Args;
use medfaq_chat::{SessionController, SessionState, SubmitOutcome, DISCLAIMER};
use medfaq_core::{config::AppConfig, ApiKey, AppResult};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /dataset <label>   switch dataset (clears the history)
  /datasets          list datasets
  /key <secret>      set the API key for this session (/key alone clears it)
  /history           show the dialogue so far
  /export [dir]      write dialogue.json and clear the history
  /help              show this help
  /quit              leave the chat
Any other line is sent as a question.";

/// Interactive chat session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Initial dataset label (default: first configured dataset)
    #[arg(short, long)]
    pub dataset: Option<String>,
}

/// One line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChatInput {
    Question(String),
    SelectDataset(String),
    ListDatasets,
    SetKey(Option<String>),
    History,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Classify a raw input line.
pub(crate) fn parse_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return ChatInput::Question(line.to_string());
    };

    let (command, argument) = match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (rest, ""),
    };
    let argument = (!argument.is_empty()).then(|| argument.to_string());

    match (command, argument) {
        ("dataset", Some(label)) => ChatInput::SelectDataset(label),
        ("datasets", None) => ChatInput::ListDatasets,
        ("key", argument) => ChatInput::SetKey(argument),
        ("history", None) => ChatInput::History,
        ("export", dir) => ChatInput::Export(dir.map(PathBuf::from)),
        ("help", None) => ChatInput::Help,
        ("quit", None) | ("exit", None) => ChatInput::Quit,
        _ => ChatInput::Unknown(line.to_string()),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig, api_key: Option<ApiKey>) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let controller = build_controller(config)?;
        let mut state = match self.dataset {
            Some(ref label) => controller.new_session_with(label)?,
            None => controller.new_session(),
        };
        let mut credential = api_key;

        println!("{}\n", DISCLAIMER);
        print_dataset(&controller, state.selected_dataset());
        println!("Type /help for commands.\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("medfaq [{}]> ", state.selected_dataset());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                ChatInput::Empty => {}
                ChatInput::Quit => break,
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Unknown(input) => {
                    eprintln!("Unknown command: {} (try /help)", input)
                }
                ChatInput::ListDatasets => {
                    for dataset in controller.registry().iter() {
                        let marker = if dataset.label == state.selected_dataset() {
                            "*"
                        } else {
                            " "
                        };
                        println!("{} {} - {}", marker, dataset.label, dataset.department);
                    }
                }
                ChatInput::SelectDataset(label) => {
                    match controller.select_dataset(&mut state, &label) {
                        Ok(true) => {
                            print_dataset(&controller, state.selected_dataset());
                            println!("History cleared.");
                        }
                        Ok(false) => println!("Already using {}.", label),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                ChatInput::SetKey(secret) => {
                    credential = ApiKey::from_optional(secret.as_deref());
                    if credential.is_some() {
                        println!("API key set for this session.");
                    } else {
                        println!("API key cleared.");
                    }
                }
                ChatInput::History => print_history(&state),
                ChatInput::Export(dir) => {
                    let dir = dir.unwrap_or_else(|| config.export_dir());
                    match controller.export(&mut state, |artifact| artifact.write_to_dir(&dir)) {
                        Ok(path) => println!("Dialogue exported to {}", path.display()),
                        Err(e) => eprintln!("Export failed: {}", e),
                    }
                    if state.history().is_empty() {
                        println!("History cleared.");
                    }
                }
                ChatInput::Question(question) => {
                    match controller
                        .submit_question(&mut state, &question, credential.as_ref())
                        .await
                    {
                        Ok(SubmitOutcome::CredentialMissing { notice }) => println!("{}", notice),
                        Ok(SubmitOutcome::Answered { answer, references }) => {
                            println!("\n{}\n", answer);
                            if !references.is_empty() {
                                println!("參考資料:\n{}\n", format_references(&references));
                            }
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
            }
        }

        tracing::debug!("Chat session ended");
        Ok(())
    }
}

fn print_dataset(controller: &SessionController, label: &str) {
    if let Ok(dataset) = controller.registry().lookup(label) {
        println!(
            "Dataset: {} ({}) {}",
            dataset.label, dataset.department, dataset.source_url
        );
    }
}

fn print_history(state: &SessionState) {
    if state.history().is_empty() {
        println!("(no messages)");
        return;
    }
    for message in state.history().snapshot() {
        println!("{}: {}", message.role, message.content);
        if let Some(ref references) = message.references {
            if !references.is_empty() {
                println!("{}", format_references(references));
            }
        }
    }
}
