use crate::embeddings::Embedder;
use crate::error::EmbeddingError;
use crate::index::VectorIndex;
use crate::models::ScoredChunk;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 3;

/// Fixed top-k nearest-neighbor query over the shared index.
pub struct Retriever<E: Embedder> {
    index: Arc<VectorIndex>,
    embedder: E,
    top_k: usize,
}

impl<E: Embedder> Retriever<E> {
    pub fn new(index: Arc<VectorIndex>, embedder: E, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the query and return the closest chunks, best first. An empty
    /// index yields an empty result without touching the embedding service.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.index.search(&query_vector, self.top_k);
        debug!(hits = hits.len(), top_k = self.top_k, "retrieved chunks");
        Ok(hits)
    }
}
