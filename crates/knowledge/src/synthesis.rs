//! Answer synthesis from retrieved FAQ entries.

use crate::types::RetrievedDocument;
use medfaq_core::config::LlmSettings;
use medfaq_core::{ApiKey, AppError, AppResult};
use medfaq_llm::{LlmClient, LlmRequest};
use medfaq_prompt::{build_prompt, PromptDefinition};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Turns retrieved documents and a question into a natural-language answer.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer grounded in `documents`.
    ///
    /// An empty document list still produces an answer.
    ///
    /// # Errors
    /// * `Authentication` when the backend rejects `api_key`
    /// * `Generation` for any other backend failure, including timeouts
    async fn synthesize(
        &self,
        documents: &[RetrievedDocument],
        question: &str,
        api_key: &ApiKey,
    ) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct PromptDocument<'a> {
    position: usize,
    content: &'a str,
    answer: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PromptContext<'a> {
    question: &'a str,
    has_documents: bool,
    documents: Vec<PromptDocument<'a>>,
}

impl<'a> PromptContext<'a> {
    fn new(documents: &'a [RetrievedDocument], question: &'a str) -> Self {
        Self {
            question,
            has_documents: !documents.is_empty(),
            documents: documents
                .iter()
                .enumerate()
                .map(|(i, doc)| PromptDocument {
                    position: i + 1,
                    content: &doc.content,
                    answer: doc.answer(),
                })
                .collect(),
        }
    }
}

/// LLM-backed answer generator.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: &LlmSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            prompt,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout,
        }
    }

    fn build_request(
        &self,
        documents: &[RetrievedDocument],
        question: &str,
    ) -> AppResult<LlmRequest> {
        let built = build_prompt(&self.prompt, &PromptContext::new(documents, question))?;

        tracing::debug!(
            "Built prompt '{}' ({} bytes, {} documents)",
            built.metadata.source_prompt_id,
            built.metadata.rendered_bytes,
            documents.len()
        );

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for AnswerSynthesizer {
    #[tracing::instrument(skip_all, fields(provider = %self.llm.provider_name(), documents = documents.len()))]
    async fn synthesize(
        &self,
        documents: &[RetrievedDocument],
        question: &str,
        api_key: &ApiKey,
    ) -> AppResult<String> {
        let request = self.build_request(documents, question)?;

        let response = tokio::time::timeout(self.timeout, self.llm.complete(&request, Some(api_key)))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "Answer generation timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| match e {
                AppError::Authentication(_) | AppError::Generation(_) => e,
                other => AppError::Generation(other.to_string()),
            })?;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::Generation(
                "Answer backend returned an empty answer".to_string(),
            ));
        }

        tracing::info!(
            "Generated answer ({} tokens)",
            response.usage.total_tokens
        );

        Ok(answer.to_string())
    }
}
