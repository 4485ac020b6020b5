//! Embedding provider trait and factory.

use super::providers::{ollama, openai, MockProvider, OllamaProvider, OpenAiProvider};
use medfaq_core::config::EmbeddingSettings;
use medfaq_core::{ApiKey, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(
        &self,
        texts: &[String],
        api_key: Option<&ApiKey>,
    ) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str, api_key: Option<&ApiKey>) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()], api_key).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Connectivity("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from the `embedding` config section.
pub fn create_provider(
    settings: &EmbeddingSettings,
    timeout: Duration,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        settings.provider,
        settings.model,
        settings.dimensions
    );

    match settings.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "openai" => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(openai::DEFAULT_BASE_URL);
            Ok(Arc::new(OpenAiProvider::new(
                base_url,
                &settings.model,
                settings.dimensions,
                timeout,
            )?))
        }

        "ollama" => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(ollama::DEFAULT_BASE_URL);
            Ok(Arc::new(OllamaProvider::new(
                base_url,
                &settings.model,
                settings.dimensions,
                timeout,
            )?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, openai, ollama",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&settings("mock"), Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_remote_providers() {
        let openai = create_provider(&settings("openai"), Duration::from_secs(5)).unwrap();
        assert_eq!(openai.provider_name(), "openai");

        let ollama = create_provider(&settings("ollama"), Duration::from_secs(5)).unwrap();
        assert_eq!(ollama.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("gguf"), Duration::from_secs(5));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("mock"), Duration::from_secs(5)).unwrap();
        let embedding = provider.embed("經痛怎麼辦", None).await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
