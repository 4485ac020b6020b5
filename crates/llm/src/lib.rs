//! Answer-generation backends for medfaq.
//!
//! A provider-agnostic [`LlmClient`] trait with two implementations:
//! - **OpenAI**: chat completions API (default, needs the session key)
//! - **Ollama**: local runtime, no key required
//!
//! # Example
//! ```no_run
//! use medfaq_core::ApiKey;
//! use medfaq_llm::{LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new();
//! let key = ApiKey::new("sk-...");
//! let request = LlmRequest::new("為什麼會便秘？", "gpt-4o-mini");
//! let response = client.complete(&request, Some(&key)).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ProviderType};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
