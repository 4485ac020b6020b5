//! Embedding providers for FAQ entries and queries.
//!
//! Providers hold no credential. The session key is handed to every call and
//! forwarded to the backend when it needs one.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider, OpenAiProvider};
