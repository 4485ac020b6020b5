//! FAQ knowledge base for medfaq.
//!
//! Holds the dataset registry, the embedding providers, the SQLite vector
//! index and the two pipeline stages built on them: dataset-filtered
//! retrieval and answer synthesis.

pub mod datasets;
pub mod embeddings;
pub mod import;
pub mod index;
pub mod retrieval;
pub mod synthesis;
pub mod types;
pub mod vector_index;

pub use datasets::{DatasetDescriptor, DatasetRegistry};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use import::ImportOptions;
pub use index::SqliteIndex;
pub use retrieval::{CallPolicy, DocumentRetriever, RetrievalClient};
pub use synthesis::{AnswerGenerator, AnswerSynthesizer};
pub use types::{
    FaqRecord, ImportStats, IndexStats, IndexedDocument, RetrievedDocument, REFERENCE_FIELD,
};
pub use vector_index::{SearchFilter, VectorIndex};

use medfaq_core::{ApiKey, AppConfig, AppResult};
use medfaq_llm::create_client;
use medfaq_prompt::{default_answer_prompt, load_prompt_or, ANSWER_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

fn request_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.retrieval.request_timeout_secs)
}

/// Open the workspace index, failing if nothing has been imported yet.
pub fn open_index(config: &AppConfig) -> AppResult<Arc<SqliteIndex>> {
    Ok(Arc::new(SqliteIndex::open_existing(&config.index_path())?))
}

/// Build the retriever for the configured embedding provider and `index`.
pub fn retriever(config: &AppConfig, index: Arc<dyn VectorIndex>) -> AppResult<RetrievalClient> {
    let embedder = create_provider(&config.embedding, request_timeout(config))?;
    Ok(RetrievalClient::new(
        embedder,
        index,
        CallPolicy::from_settings(&config.retrieval),
    ))
}

/// Build the answer synthesizer for the configured LLM provider.
///
/// Uses `.medfaq/prompts/answer.yml` when the workspace defines one.
pub fn synthesizer(config: &AppConfig) -> AppResult<AnswerSynthesizer> {
    let timeout = request_timeout(config);
    let llm = create_client(&config.llm, timeout)?;
    let prompt = load_prompt_or(&config.workspace, ANSWER_PROMPT_ID, default_answer_prompt())?;
    Ok(AnswerSynthesizer::new(llm, prompt, &config.llm, timeout))
}

/// Import FAQ files into the workspace index, creating it if needed.
pub async fn import_files(
    config: &AppConfig,
    registry: &DatasetRegistry,
    options: &ImportOptions,
    api_key: Option<&ApiKey>,
) -> AppResult<ImportStats> {
    tracing::info!("Importing {} path(s)", options.paths.len());

    config.ensure_medfaq_dir()?;
    let index = SqliteIndex::open(&config.index_path())?;
    let embedder = create_provider(&config.embedding, request_timeout(config))?;

    import::import(&index, embedder.as_ref(), registry, options, api_key).await
}

/// Document counts of the workspace index.
pub fn stats(config: &AppConfig) -> AppResult<IndexStats> {
    open_index(config)?.stats()
}
