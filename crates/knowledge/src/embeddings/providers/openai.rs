//! OpenAI embedding provider.
//!
//! API: https://platform.openai.com/docs/api-reference/embeddings
//! Requires the session API key on every call.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use medfaq_core::{ApiKey, AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const EMBEDDING_ENDPOINT: &str = "/embeddings";

/// OpenAI embeddings client.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    /// Model name (e.g., "text-embedding-3-small")
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiProvider {
    /// Create a provider whose requests time out after `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for OpenAI: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }
}

/// Map a non-success status to the error taxonomy.
fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Authentication(format!(
            "OpenAI rejected the API key ({}): {}",
            status, message
        )),
        _ => AppError::Connectivity(format!(
            "OpenAI embeddings error ({}): {}",
            status, message
        )),
    }
}

/// Order vectors by their `index` and check the count and dimensions.
fn collect_embeddings(
    response: EmbeddingResponse,
    expected_count: usize,
    dimensions: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected_count {
        return Err(AppError::Connectivity(format!(
            "OpenAI returned {} embeddings for {} inputs",
            data.len(),
            expected_count
        )));
    }
    data.sort_by_key(|d| d.index);

    data.into_iter()
        .map(|d| {
            if d.embedding.len() != dimensions {
                return Err(AppError::Config(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    d.embedding.len(),
                    dimensions
                )));
            }
            Ok(d.embedding)
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip_all, fields(batch_size = texts.len(), provider = "openai", model = %self.model))]
    async fn embed_batch(
        &self,
        texts: &[String],
        api_key: Option<&ApiKey>,
    ) -> AppResult<Vec<Vec<f32>>> {
        let api_key = api_key.filter(|k| !k.is_blank()).ok_or_else(|| {
            AppError::Authentication("OpenAI embeddings require an API key".to_string())
        })?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::InvalidInput("Cannot embed empty text".to_string()));
        }

        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        debug!("Sending embedding request for {} texts", texts.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Connectivity(format!("Failed to reach OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &body));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Connectivity(format!("Failed to parse OpenAI response: {}", e))
        })?;

        collect_embeddings(body, texts.len(), self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(
            DEFAULT_BASE_URL,
            "text-embedding-3-small",
            3,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let input = vec!["經痛".to_string(), "便秘".to_string()];
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"][1], "便秘");
    }

    #[test]
    fn test_collect_embeddings_orders_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[
                {"object":"embedding","index":1,"embedding":[0.0,1.0,0.0]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0,0.0]}
            ]}"#,
        )
        .unwrap();

        let vectors = collect_embeddings(response, 2, 3).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_collect_embeddings_rejects_mismatch() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(matches!(
            collect_embeddings(response, 1, 3),
            Err(AppError::Config(_))
        ));

        let empty: EmbeddingResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(collect_embeddings(empty, 1, 3).is_err());
    }

    #[test]
    fn test_status_error_mapping() {
        let unauthorized = status_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        );
        assert!(matches!(unauthorized, AppError::Authentication(ref m) if m.contains("Incorrect")));

        let unavailable = status_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert!(matches!(unavailable, AppError::Connectivity(_)));
        assert!(unavailable.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_error() {
        let result = provider().embed("便秘", None).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));

        let blank = ApiKey::new("  ");
        let result = provider().embed("便秘", Some(&blank)).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }
}
