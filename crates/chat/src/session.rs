//! Session state and the controller that drives the question pipeline.

use crate::export::ExportArtifact;
use crate::history::{HistoryStore, Message};
use medfaq_core::config::ExportClearPolicy;
use medfaq_core::{ApiKey, AppError, AppResult};
use medfaq_knowledge::{AnswerGenerator, DatasetRegistry, DocumentRetriever};
use std::sync::Arc;

/// Shown instead of running the pipeline when no credential was given.
pub const CREDENTIAL_NOTICE: &str = "請先輸入您的 OpenAI Key...🔐";

/// Shown before the first question of a session.
pub const DISCLAIMER: &str =
    "本網站並非專業醫療諮詢網站，僅用於學習系統開發，請勿依賴本網站的資訊作為醫療建議。";

const DEFAULT_TOP_K: usize = 3;

/// Per-session state: the selected dataset and the dialogue so far.
///
/// The credential is deliberately not part of it.
#[derive(Debug, Clone)]
pub struct SessionState {
    history: HistoryStore,
    selected_dataset: String,
}

impl SessionState {
    fn new(selected_dataset: impl Into<String>) -> Self {
        Self {
            history: HistoryStore::new(),
            selected_dataset: selected_dataset.into(),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn selected_dataset(&self) -> &str {
        &self.selected_dataset
    }
}

/// Result of submitting a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No credential; nothing was run and the history is unchanged
    CredentialMissing { notice: &'static str },

    /// The pipeline ran and both turns were appended
    Answered {
        answer: String,
        references: Vec<Option<String>>,
    },
}

/// Runs dataset selection, question answering and export for a session.
pub struct SessionController {
    registry: DatasetRegistry,
    retriever: Arc<dyn DocumentRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
    export_policy: ExportClearPolicy,
}

impl SessionController {
    pub fn new(
        registry: DatasetRegistry,
        retriever: Arc<dyn DocumentRetriever>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            registry,
            retriever,
            generator,
            top_k: DEFAULT_TOP_K,
            export_policy: ExportClearPolicy::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_export_policy(mut self, policy: ExportClearPolicy) -> Self {
        self.export_policy = policy;
        self
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Fresh session on the registry's default dataset.
    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.registry.default_label())
    }

    /// Fresh session on `label`.
    pub fn new_session_with(&self, label: &str) -> AppResult<SessionState> {
        let descriptor = self.registry.lookup(label)?;
        Ok(SessionState::new(descriptor.label.clone()))
    }

    /// Switch the session to `label`.
    ///
    /// Returns `true` when the selection changed, in which case the history
    /// was cleared. Selecting the current dataset again keeps the history.
    pub fn select_dataset(&self, state: &mut SessionState, label: &str) -> AppResult<bool> {
        let descriptor = self.registry.lookup(label)?;

        if descriptor.label == state.selected_dataset {
            return Ok(false);
        }

        tracing::info!(
            "Switching dataset from '{}' to '{}', clearing {} messages",
            state.selected_dataset,
            descriptor.label,
            state.history.len()
        );

        state.selected_dataset = descriptor.label.clone();
        state.history.clear();
        Ok(true)
    }

    /// Answer `question` against the selected dataset.
    ///
    /// Without a usable credential nothing runs and
    /// [`SubmitOutcome::CredentialMissing`] is returned. Any pipeline error is
    /// returned as is and the history stays unchanged.
    pub async fn submit_question(
        &self,
        state: &mut SessionState,
        question: &str,
        credential: Option<&ApiKey>,
    ) -> AppResult<SubmitOutcome> {
        let Some(api_key) = credential.filter(|k| !k.is_blank()) else {
            tracing::debug!("No credential supplied, pipeline not run");
            return Ok(SubmitOutcome::CredentialMissing {
                notice: CREDENTIAL_NOTICE,
            });
        };

        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
        }

        let dataset = state.selected_dataset.as_str();
        let documents = self
            .retriever
            .search(question, dataset, self.top_k, api_key)
            .await?;

        tracing::debug!(
            "Retrieved {} documents from dataset '{}'",
            documents.len(),
            dataset
        );

        let answer = self
            .generator
            .synthesize(&documents, question, api_key)
            .await?;

        let references: Vec<Option<String>> = documents.iter().map(|d| d.reference()).collect();

        state.history.append(Message::user(question));
        state
            .history
            .append(Message::assistant(answer.clone(), references.clone()));

        Ok(SubmitOutcome::Answered { answer, references })
    }

    /// Serialize the history, hand it to `deliver`, then clear the history
    /// according to the export policy.
    ///
    /// Returns whatever `deliver` returned, or the serialization error.
    pub fn export<T, F>(&self, state: &mut SessionState, deliver: F) -> AppResult<T>
    where
        F: FnOnce(&ExportArtifact) -> AppResult<T>,
    {
        let result =
            ExportArtifact::from_messages(state.history.snapshot()).and_then(|a| deliver(&a));

        match (self.export_policy, &result) {
            (ExportClearPolicy::Always, _) | (ExportClearPolicy::OnSuccess, Ok(_)) => {
                state.history.clear();
            }
            (ExportClearPolicy::OnSuccess, Err(e)) => {
                tracing::warn!("Export failed, keeping history: {}", e);
            }
        }

        result
    }
}
