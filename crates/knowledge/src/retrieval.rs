//! Dataset-filtered similarity search over the FAQ index.

use crate::embeddings::EmbeddingProvider;
use crate::types::RetrievedDocument;
use crate::vector_index::{SearchFilter, VectorIndex};
use medfaq_core::config::RetrievalSettings;
use medfaq_core::{ApiKey, AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Longest wait between two attempts
const MAX_BACKOFF_MS: u64 = 5_000;

/// Source of documents relevant to a question.
#[async_trait::async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Return at most `k` documents of `dataset`, most relevant first.
    ///
    /// # Errors
    /// * `InvalidInput` when `k` is zero or the query is blank
    /// * `Authentication` when the backend rejects `api_key`
    /// * `Connectivity` when the index or embedding backend is unreachable
    async fn search(
        &self,
        query: &str,
        dataset: &str,
        k: usize,
        api_key: &ApiKey,
    ) -> AppResult<Vec<RetrievedDocument>>;
}

/// Timeout and retry rules for a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Upper bound for a single attempt
    pub timeout: Duration,

    /// Extra attempts after a retryable failure
    pub retries: u32,
}

impl CallPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.request_timeout_secs),
            settings.retries,
        )
    }

    /// Run `call`, bounding each attempt by the timeout and retrying
    /// retryable failures with exponential backoff.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0u32;

        loop {
            let result = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Connectivity(format!(
                    "{} timed out after {}s",
                    operation,
                    self.timeout.as_secs_f64()
                ))),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    let backoff_ms = backoff_ms(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {}ms: {}",
                        operation,
                        attempt,
                        self.retries + 1,
                        backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                other => return other,
            }
        }
    }
}

fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrievalSettings::default())
    }
}

/// Retriever backed by an embedding provider and a vector index.
pub struct RetrievalClient {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    policy: CallPolicy,
}

impl RetrievalClient {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        policy: CallPolicy,
    ) -> Self {
        Self {
            embedder,
            index,
            policy,
        }
    }

    async fn search_once(
        &self,
        query: &str,
        filter: &SearchFilter,
        k: usize,
        api_key: &ApiKey,
    ) -> AppResult<Vec<RetrievedDocument>> {
        let embedding = self.embedder.embed(query, Some(api_key)).await?;
        let hits = self.index.search(&embedding, filter, k)?;

        Ok(hits
            .into_iter()
            .map(|(doc, score)| RetrievedDocument::new(doc.content, doc.metadata, score))
            .collect())
    }
}

#[async_trait::async_trait]
impl DocumentRetriever for RetrievalClient {
    #[tracing::instrument(skip(self, query, api_key), fields(provider = %self.embedder.provider_name()))]
    async fn search(
        &self,
        query: &str,
        dataset: &str,
        k: usize,
        api_key: &ApiKey,
    ) -> AppResult<Vec<RetrievedDocument>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "Number of documents to retrieve must be at least 1".to_string(),
            ));
        }
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }

        let filter = SearchFilter::dataset(dataset);
        let documents = self
            .policy
            .run("Retrieval", || self.search_once(query, &filter, k, api_key))
            .await?;

        if let Some(top) = documents.first() {
            tracing::info!(
                "Retrieved {} documents (top score: {:.3})",
                documents.len(),
                top.score
            );
        } else {
            tracing::info!("No documents found for dataset '{}'", dataset);
        }

        Ok(documents)
    }
}
