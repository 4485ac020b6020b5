//! SQLite-backed vector index for FAQ documents.
//!
//! Embeddings are stored as little-endian `f32` blobs; similarity is computed
//! in process over the rows matching the dataset filter.

use crate::types::{IndexStats, IndexedDocument};
use crate::vector_index::{SearchFilter, VectorIndex};
use chrono::Utc;
use medfaq_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        dataset TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_dataset ON documents(dataset);
"#;

/// Vector index stored in a single SQLite file.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Connectivity(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            AppError::Connectivity(format!("Failed to open index at {:?}: {}", db_path, e))
        })?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// Open an existing index, failing if the file is missing.
    pub fn open_existing(db_path: &Path) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::Connectivity(format!(
                "Index not found at {:?}. Run 'medfaq import' first.",
                db_path
            )));
        }
        Self::open(db_path)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("Index connection lock poisoned".to_string()))
    }

    fn write_all(&self, documents: &[IndexedDocument], clear: bool) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        if clear {
            tx.execute("DELETE FROM documents", [])
                .map_err(|e| AppError::Index(format!("Failed to delete documents: {}", e)))?;
        }
        for document in documents {
            insert_document(&tx, document)?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit documents: {}", e)))?;

        tracing::debug!("Stored {} documents (cleared: {})", documents.len(), clear);
        Ok(())
    }
}

impl VectorIndex for SqliteIndex {
    fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()> {
        self.write_all(documents, false)
    }

    fn replace_all(&self, documents: &[IndexedDocument]) -> AppResult<()> {
        self.write_all(documents, true)
    }

    fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> AppResult<Vec<(IndexedDocument, f32)>> {
        let conn = self.lock()?;

        let documents = match filter.dataset {
            Some(ref dataset) => {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, dataset, content, metadata, embedding FROM documents
                         WHERE dataset = ?1",
                    )
                    .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;
                let rows = stmt
                    .query_map(params![dataset], row_to_document)
                    .map_err(|e| AppError::Index(format!("Failed to query documents: {}", e)))?;
                let documents: Result<Vec<_>, _> = rows.collect();
                documents
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT id, dataset, content, metadata, embedding FROM documents")
                    .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;
                let rows = stmt
                    .query_map([], row_to_document)
                    .map_err(|e| AppError::Index(format!("Failed to query documents: {}", e)))?;
                let documents: Result<Vec<_>, _> = rows.collect();
                documents
            }
        }
        .map_err(|e| AppError::Index(format!("Failed to read document row: {}", e)))?;

        let mut skipped = 0usize;
        let mut results: Vec<(IndexedDocument, f32)> = documents
            .into_iter()
            .filter_map(|doc| {
                if doc.embedding.len() != query_embedding.len() {
                    skipped += 1;
                    return None;
                }
                let score = cosine_similarity(query_embedding, &doc.embedding);
                Some((doc, score))
            })
            .collect();

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} documents whose embedding dimensions differ from the query ({}); re-import with --reset",
                skipped,
                query_embedding.len()
            );
        }

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} documents (requested top-{}, filter {:?})",
            results.len(),
            top_k,
            filter.dataset
        );

        Ok(results)
    }

    fn stats(&self) -> AppResult<IndexStats> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT dataset, COUNT(*) FROM documents GROUP BY dataset ORDER BY dataset")
            .map_err(|e| AppError::Index(format!("Failed to prepare stats query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .map_err(|e| AppError::Index(format!("Failed to count documents: {}", e)))?;

        let mut stats = IndexStats::default();
        for row in rows {
            let (dataset, count) =
                row.map_err(|e| AppError::Index(format!("Failed to count documents: {}", e)))?;
            stats.documents_count += count;
            stats.per_dataset.insert(dataset, count);
        }

        Ok(stats)
    }
}

fn insert_document(conn: &Connection, document: &IndexedDocument) -> AppResult<()> {
    let metadata_json = serde_json::to_string(&document.metadata)?;

    conn.execute(
        "INSERT OR REPLACE INTO documents (id, dataset, content, metadata, embedding, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            document.id,
            document.dataset,
            document.content,
            metadata_json,
            embedding_to_bytes(&document.embedding),
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Index(format!("Failed to insert document: {}", e)))?;

    Ok(())
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedDocument> {
    let embedding_bytes: Vec<u8> = row.get(4)?;
    let embedding = bytes_to_embedding(&embedding_bytes).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Blob,
            "embedding blob length is not a multiple of 4".into(),
        )
    })?;

    let metadata_json: String = row.get(3)?;
    let metadata: Map<String, Value> = serde_json::from_str(&metadata_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(IndexedDocument {
        id: row.get(0)?,
        dataset: row.get(1)?,
        content: row.get(2)?,
        metadata,
        embedding,
    })
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
impl SqliteIndex {
    pub(crate) fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::Connectivity(format!("Failed to open in-memory index: {}", e))
        })?;
        Self::with_connection(conn)
    }

    pub(crate) fn get(&self, id: &str) -> AppResult<Option<IndexedDocument>> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, dataset, content, metadata, embedding FROM documents WHERE id = ?1",
            params![id],
            row_to_document,
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to read document {}: {}", id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn document(id: &str, dataset: &str, content: &str, embedding: Vec<f32>) -> IndexedDocument {
        IndexedDocument {
            id: id.to_string(),
            dataset: dataset.to_string(),
            content: content.to_string(),
            metadata: json!({"refactor_answer": format!("ref-{}", id)})
                .as_object()
                .cloned()
                .unwrap(),
            embedding,
        }
    }

    #[test]
    fn test_open_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".medfaq").join("index.sqlite");
        let index = SqliteIndex::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(index.stats().unwrap().documents_count, 0);
    }

    #[test]
    fn test_open_existing_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = SqliteIndex::open_existing(&temp.path().join("missing.sqlite"));
        assert!(matches!(result, Err(AppError::Connectivity(_))));
    }

    #[test]
    fn test_upsert_and_get() {
        let index = SqliteIndex::in_memory().unwrap();
        let doc = document("d1", "經痛", "經痛可以熱敷嗎？", vec![1.0, 0.0, 0.5]);
        index.upsert(std::slice::from_ref(&doc)).unwrap();

        let loaded = index.get("d1").unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert!(index.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .upsert(&[document("d1", "經痛", "old", vec![1.0, 0.0])])
            .unwrap();
        index
            .upsert(&[document("d1", "經痛", "new", vec![1.0, 0.0])])
            .unwrap();

        assert_eq!(index.stats().unwrap().documents_count, 1);
        assert_eq!(index.get("d1").unwrap().unwrap().content, "new");
    }

    #[test]
    fn test_search_filters_by_dataset() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .upsert(&[document("a", "排便問題", "便秘", vec![1.0, 0.0])])
            .unwrap();
        index
            .upsert(&[document("b", "藥水", "眼藥水", vec![1.0, 0.0])])
            .unwrap();

        let results = index
            .search(&[1.0, 0.0], &SearchFilter::dataset("藥水"), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "b");

        let all = index.search(&[1.0, 0.0], &SearchFilter::default(), 5).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_search_orders_and_truncates() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .upsert(&[document("far", "經痛", "far", vec![0.0, 1.0])])
            .unwrap();
        index
            .upsert(&[document("near", "經痛", "near", vec![1.0, 0.1])])
            .unwrap();
        index
            .upsert(&[document("mid", "經痛", "mid", vec![1.0, 1.0])])
            .unwrap();

        let results = index
            .search(&[1.0, 0.0], &SearchFilter::dataset("經痛"), 2)
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_search_skips_mismatched_dimensions() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .upsert(&[document("old", "經痛", "old", vec![1.0, 0.0, 0.0])])
            .unwrap();
        index
            .upsert(&[document("new", "經痛", "new", vec![1.0, 0.0])])
            .unwrap();

        let results = index.search(&[1.0, 0.0], &SearchFilter::default(), 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "new");
    }

    #[test]
    fn test_stats_and_clear() {
        let index = SqliteIndex::in_memory().unwrap();
        index.upsert(&[document("a", "經痛", "a", vec![1.0])]).unwrap();
        index.upsert(&[document("b", "經痛", "b", vec![1.0])]).unwrap();
        index.upsert(&[document("c", "藥水", "c", vec![1.0])]).unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.documents_count, 3);
        assert_eq!(stats.per_dataset.get("經痛"), Some(&2));
        assert_eq!(stats.per_dataset.get("藥水"), Some(&1));

        index.replace_all(&[]).unwrap();
        assert_eq!(index.stats().unwrap(), IndexStats::default());
    }

    #[test]
    fn test_upsert_batch_keeps_existing_documents() {
        let index = SqliteIndex::in_memory().unwrap();
        index.upsert(&[document("a", "經痛", "a", vec![1.0])]).unwrap();

        index
            .upsert(&[
                document("a", "經痛", "a2", vec![1.0]),
                document("b", "藥水", "b", vec![1.0]),
            ])
            .unwrap();

        assert_eq!(index.stats().unwrap().documents_count, 2);
        assert_eq!(index.get("a").unwrap().unwrap().content, "a2");
    }

    #[test]
    fn test_replace_all_drops_previous_documents() {
        let index = SqliteIndex::in_memory().unwrap();
        index.upsert(&[document("old", "經痛", "old", vec![1.0])]).unwrap();

        index
            .replace_all(&[document("new", "藥水", "new", vec![1.0])])
            .unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.documents_count, 1);
        assert!(index.get("old").unwrap().is_none());
        assert_eq!(stats.per_dataset.get("藥水"), Some(&1));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes_to_embedding(&bytes), Some(embedding));
        assert_eq!(bytes_to_embedding(&[0, 1, 2]), None);
    }
}
