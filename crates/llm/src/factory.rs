//! LLM provider factory.
//!
//! Builds an [`LlmClient`] from the `llm` section of the application config.
//! Clients never hold a credential; the session key is handed to each call.

use crate::client::{LlmClient, ProviderType};
use crate::providers::{ollama, openai, OllamaClient, OpenAiClient};
use medfaq_core::config::LlmSettings;
use medfaq_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client for the configured provider.
///
/// # Arguments
/// * `settings` - The `llm` config section (provider, optional endpoint)
/// * `timeout` - Per-request HTTP timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(settings: &LlmSettings, timeout: Duration) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    tracing::debug!(
        "Creating LLM client: provider={}, endpoint={:?}",
        provider.as_str(),
        settings.endpoint
    );

    match provider {
        ProviderType::OpenAI => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(openai::DEFAULT_BASE_URL);
            Ok(Arc::new(OpenAiClient::with_timeout(base_url, timeout)?))
        }
        ProviderType::Ollama => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(ollama::DEFAULT_BASE_URL);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str, endpoint: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider: provider.to_string(),
            endpoint: endpoint.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_openai_client() {
        let client = create_client(&settings("openai", None), Duration::from_secs(5)).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            &settings("ollama", Some("http://localhost:8080")),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client(&settings("unknown", None), Duration::from_secs(5)) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
