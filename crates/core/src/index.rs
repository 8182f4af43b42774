use crate::embeddings::Embedder;
use crate::error::IndexError;
use crate::models::{DocChunk, ScoredChunk};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One stored triple: chunk text plus metadata, aligned 1:1 with its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocChunk,
    pub embedding: Vec<f32>,
}

/// Append-only nearest-neighbor index over document chunks, persisted as a
/// named collection on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorIndex {
    collection: String,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn index_path(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{collection}.json"))
    }

    /// Embed every chunk and assemble the index. Any embedding failure aborts
    /// the build so no partial index is ever produced.
    pub async fn build(
        collection: impl Into<String>,
        chunks: Vec<DocChunk>,
        embedder: &impl Embedder,
    ) -> Result<Self, IndexError> {
        let mut entries = Vec::with_capacity(chunks.len());
        let mut dimensions = None;

        for chunk in chunks {
            let embedding = embedder.embed(&chunk.text).await?;

            match dimensions {
                None => dimensions = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
            }

            entries.push(IndexEntry { chunk, embedding });
        }

        Ok(Self {
            collection: collection.into(),
            entries,
        })
    }

    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(dir)?;
        let path = Self::index_path(dir, &self.collection);
        let serialized = serde_json::to_string(self)?;
        fs::write(&path, serialized)?;
        info!(path = %path.display(), entries = self.entries.len(), "vector index persisted");
        Ok(())
    }

    pub fn load(dir: &Path, collection: &str) -> Result<Self, IndexError> {
        let path = Self::index_path(dir, collection);
        let raw = fs::read_to_string(&path)?;
        let index: Self =
            serde_json::from_str(&raw).map_err(|error| IndexError::Corrupt {
                collection: collection.to_string(),
                details: error.to_string(),
            })?;

        if index.collection != collection {
            return Err(IndexError::Corrupt {
                collection: collection.to_string(),
                details: format!("file contains collection {}", index.collection),
            });
        }

        Ok(index)
    }

    /// Load the persisted collection when one exists at `dir`, otherwise build
    /// from `chunks` and persist. Building never happens twice for the same
    /// path; a prior collection wins even if the source document changed, so a
    /// warning is logged on load.
    pub async fn open_or_build(
        dir: &Path,
        collection: &str,
        chunks: Vec<DocChunk>,
        embedder: &impl Embedder,
    ) -> Result<Self, IndexError> {
        if Self::index_path(dir, collection).exists() {
            let index = Self::load(dir, collection)?;
            warn!(
                collection,
                entries = index.len(),
                "loaded persisted collection; source document changes are not reflected"
            );
            return Ok(index);
        }

        info!(collection, chunks = chunks.len(), "building vector index");
        let index = Self::build(collection, chunks, embedder).await?;
        index.persist(dir)?;
        Ok(index)
    }

    /// Return the `k` entries closest to `query_vector` by cosine similarity,
    /// best first. Ties keep insertion order; an empty index yields an empty
    /// result.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vector, &entry.embedding),
            })
            .collect();

        // sort_by is stable, so equal scores retain insertion order.
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() {
        return 0.0;
    }

    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm: f32 = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm: f32 = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }

    dot / (left_norm * right_norm)
}
