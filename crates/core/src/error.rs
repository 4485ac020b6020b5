//! Error types for medfaq.
//!
//! A single error enum covers the question-answering pipeline (dataset lookup,
//! retrieval, generation, export) and the ambient concerns around it
//! (configuration, I/O, prompt rendering).

use thiserror::Error;

/// Unified error type for medfaq.
///
/// All fallible functions return `Result<T, AppError>`. Errors are propagated
/// to the front-end, never turned into panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown dataset label or other missing entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credential
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Vector index or embedding backend unreachable
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Answer backend failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied an unusable argument (blank question, k = 0)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local vector index errors (schema, corrupt rows)
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a single retry of the failed call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Connectivity(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connectivity_is_retryable() {
        assert!(AppError::Connectivity("down".to_string()).is_retryable());
        assert!(!AppError::Authentication("bad key".to_string()).is_retryable());
        assert!(!AppError::Generation("500".to_string()).is_retryable());
        assert!(!AppError::NotFound("x".to_string()).is_retryable());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_display_includes_category() {
        let err = AppError::NotFound("Dataset '牙痛'".to_string());
        assert_eq!(err.to_string(), "Not found: Dataset '牙痛'");
    }
}
