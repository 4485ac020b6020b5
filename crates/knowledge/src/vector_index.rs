//! Vector index abstraction for FAQ documents.
//!
//! Defines a trait for backend-agnostic vector storage and retrieval.

use crate::types::{IndexStats, IndexedDocument};
use medfaq_core::AppResult;

/// Restricts a search to a subset of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Only documents whose dataset equals this label
    pub dataset: Option<String>,
}

impl SearchFilter {
    /// Match documents of one dataset.
    pub fn dataset(label: impl Into<String>) -> Self {
        Self {
            dataset: Some(label.into()),
        }
    }
}

/// Trait for vector index backends.
///
/// Batch writes are atomic: either every document lands or the index is
/// left as it was.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace documents by id.
    fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()>;

    /// Remove all documents, then store `documents`.
    fn replace_all(&self, documents: &[IndexedDocument]) -> AppResult<()>;

    /// Search for the top-k documents most similar to the query embedding.
    ///
    /// Returns documents ordered by descending similarity score.
    fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> AppResult<Vec<(IndexedDocument, f32)>>;

    /// Get statistics about the index.
    fn stats(&self) -> AppResult<IndexStats>;
}
