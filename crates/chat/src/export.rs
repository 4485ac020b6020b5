//! Dialogue export.

use crate::history::Message;
use medfaq_core::AppResult;
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "dialogue.json";
pub const EXPORT_MIME: &str = "application/json";

/// Serialize a dialogue as a pretty-printed JSON array.
///
/// Each element is `{role, content, references?}` in that key order.
/// Non-ASCII text is written as UTF-8, not escaped. Output depends only on
/// the input.
pub fn export_to_json(messages: &[Message]) -> AppResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(messages)?)
}

/// A serialized dialogue ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn from_messages(messages: &[Message]) -> AppResult<Self> {
        Ok(Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime: EXPORT_MIME.to_string(),
            bytes: export_to_json(messages)?,
        })
    }

    /// Write the artifact into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> AppResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!("Exported dialogue to {:?}", path);
        Ok(path)
    }
}
