//! Core types for the FAQ knowledge base.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata field carrying the reference answer shown next to a reply.
pub const REFERENCE_FIELD: &str = "refactor_answer";

/// A FAQ entry stored in the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    /// Stable identifier (hash of dataset and question)
    pub id: String,

    /// Dataset label the entry belongs to
    pub dataset: String,

    /// Text that was embedded
    pub content: String,

    /// Remaining record fields
    pub metadata: Map<String, Value>,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// A document returned by a retrieval call, ordered by descending relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Cosine similarity to the query
    #[serde(default)]
    pub score: f32,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>, score: f32) -> Self {
        Self {
            content: content.into(),
            metadata,
            score,
        }
    }

    /// The stored reference answer, passed through as-is.
    ///
    /// Missing and non-string values count as absent.
    pub fn reference(&self) -> Option<String> {
        self.metadata
            .get(REFERENCE_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The FAQ answer text, used as grounding in the prompt.
    pub fn answer(&self) -> Option<&str> {
        self.metadata.get("answer").and_then(Value::as_str)
    }
}

/// One line of a FAQ import file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,

    pub answer: String,

    /// Dataset label
    pub category: String,

    /// Rewritten question; embedded in place of `question` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refactor_question: Option<String>,

    /// Rewritten answer; surfaced as the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refactor_answer: Option<String>,

    /// Source page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl FaqRecord {
    /// Text to embed for this record.
    pub fn content(&self) -> &str {
        self.refactor_question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.question)
    }

    /// Metadata stored alongside the embedding.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("question".to_string(), Value::from(self.question.clone()));
        metadata.insert("answer".to_string(), Value::from(self.answer.clone()));
        metadata.insert("category".to_string(), Value::from(self.category.clone()));
        if let Some(ref q) = self.refactor_question {
            metadata.insert("refactor_question".to_string(), Value::from(q.clone()));
        }
        if let Some(ref a) = self.refactor_answer {
            metadata.insert(REFERENCE_FIELD.to_string(), Value::from(a.clone()));
        }
        if let Some(ref url) = self.url {
            metadata.insert("url".to_string(), Value::from(url.clone()));
        }
        metadata
    }
}

/// Statistics about the vector index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents
    pub documents_count: u64,

    /// Documents per dataset label
    pub per_dataset: BTreeMap<String, u64>,
}

/// Statistics from an import operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    /// Number of files read
    pub files_count: u32,

    /// Number of documents written to the index
    pub documents_count: u32,

    /// Records skipped (unknown dataset)
    pub skipped_count: u32,

    /// Duration in seconds
    pub duration_secs: f64,
}
