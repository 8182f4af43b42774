use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the ingested source document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub document_title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// A bounded-length passage of the source document, the unit of retrieval.
/// Created once at ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub source_path: String,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
}

/// A retrieval hit: a chunk with its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: DocChunk,
    pub score: f32,
}
