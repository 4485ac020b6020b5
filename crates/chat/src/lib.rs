//! Chat session state and control for medfaq.
//!
//! A session is a dataset selection plus an append-only dialogue history.
//! The [`SessionController`] runs the retrieve-then-answer pipeline for a
//! question and keeps the history consistent: turns are appended only after
//! the whole pipeline succeeded.

pub mod export;
pub mod history;
pub mod session;

pub use export::{export_to_json, ExportArtifact, EXPORT_FILE_NAME, EXPORT_MIME};
pub use history::{HistoryStore, Message, Role};
pub use session::{SessionController, SessionState, SubmitOutcome, CREDENTIAL_NOTICE, DISCLAIMER};
