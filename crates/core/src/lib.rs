//! medfaq core library
//!
//! Foundational pieces shared by every medfaq crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Per-session credential type (`ApiKey`)

pub mod config;
pub mod error;
pub mod logging;
pub mod secret;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use secret::ApiKey;
