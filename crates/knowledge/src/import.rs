//! Import FAQ records into the vector index.
//!
//! Accepts `.jsonl` files (one record per line) and `.json` files holding an
//! array of records. Directories are walked recursively.

use crate::datasets::DatasetRegistry;
use crate::embeddings::EmbeddingProvider;
use crate::types::{FaqRecord, ImportStats, IndexedDocument};
use crate::vector_index::VectorIndex;
use medfaq_core::{ApiKey, AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

const DEFAULT_BATCH_SIZE: usize = 64;

/// Options for an import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Files or directories to read
    pub paths: Vec<PathBuf>,

    /// Clear the index before importing
    pub reset: bool,

    /// Texts per embedding request
    pub batch_size: usize,
}

impl ImportOptions {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            reset: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }
}

/// Read, embed and store every record found under `options.paths`.
///
/// Every file is parsed and every record embedded before the index is
/// written, and the write is a single transaction. A malformed line or a
/// failed embedding call leaves the index untouched, even with `reset`.
/// Records whose category is not a registered dataset are skipped.
pub async fn import(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    registry: &DatasetRegistry,
    options: &ImportOptions,
    api_key: Option<&ApiKey>,
) -> AppResult<ImportStats> {
    let start = Instant::now();

    let files = collect_files(&options.paths)?;
    if files.is_empty() {
        return Err(AppError::InvalidInput(
            "No .jsonl or .json files found to import".to_string(),
        ));
    }

    let mut stats = ImportStats::default();
    let mut records = Vec::new();

    for file in &files {
        let parsed = read_records(file)?;
        tracing::debug!("Read {} records from {:?}", parsed.len(), file);
        stats.files_count += 1;

        for record in parsed {
            if registry.contains(&record.category) {
                records.push(record);
            } else {
                tracing::warn!(
                    "Skipping record with unknown dataset '{}' in {:?}",
                    record.category,
                    file
                );
                stats.skipped_count += 1;
            }
        }
    }

    let batch_size = options.batch_size.max(1);
    let mut documents = Vec::with_capacity(records.len());
    for batch in records.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|r| r.content().to_string()).collect();
        let embeddings = embedder.embed_batch(&texts, api_key).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Connectivity(format!(
                "Embedding backend returned {} vectors for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        documents.extend(batch.iter().zip(embeddings).map(|(record, embedding)| {
            IndexedDocument {
                id: document_id(record),
                dataset: record.category.clone(),
                content: record.content().to_string(),
                metadata: record.metadata(),
                embedding,
            }
        }));

        tracing::debug!("Embedded {}/{} records", documents.len(), records.len());
    }

    if options.reset {
        tracing::info!("Replacing index contents with {} documents", documents.len());
        index.replace_all(&documents)?;
    } else {
        index.upsert(&documents)?;
    }
    stats.documents_count = documents.len() as u32;

    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Import completed: {} files, {} documents, {} skipped in {:.2}s",
        stats.files_count,
        stats.documents_count,
        stats.skipped_count,
        stats.duration_secs
    );

    Ok(stats)
}

/// Stable id, so re-importing a record replaces it.
fn document_id(record: &FaqRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.category.as_bytes());
    hasher.update([0u8]);
    hasher.update(record.question.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_importable(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("json")
    )
}

fn collect_files(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    AppError::Io(std::io::Error::other(format!(
                        "Failed to walk {:?}: {}",
                        path, e
                    )))
                })?;
                if entry.file_type().is_file() && is_importable(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            return Err(AppError::NotFound(format!("Import path {:?}", path)));
        }
    }

    Ok(files)
}

fn read_records(path: &Path) -> AppResult<Vec<FaqRecord>> {
    let contents = std::fs::read_to_string(path)?;

    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        return serde_json::from_str(&contents)
            .map_err(|e| AppError::Serialization(format!("{}: {}", path.display(), e)));
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                AppError::Serialization(format!("{}:{}: {}", path.display(), i + 1, e))
            })
        })
        .collect()
}
