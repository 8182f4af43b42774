use crate::chunking::{build_chunks, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::extract_page_texts;
use crate::models::{DocChunk, DocumentFingerprint};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Load the source document, chunk every page, and return the chunks with the
/// document's identity. Fatal on unreadable or empty documents; no partial
/// state is created.
pub fn ingest_document(
    path: &Path,
    config: ChunkingConfig,
) -> Result<(DocumentFingerprint, Vec<DocChunk>), IngestError> {
    config.validate()?;

    let fingerprint = build_document_fingerprint(path)?;
    let pages = extract_page_texts(path)?;
    info!(pages = pages.len(), path = %path.display(), "document loaded");

    let chunks = build_chunks(&fingerprint, &pages, config)?;
    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument(path.display().to_string()));
    }
    info!(chunks = chunks.len(), "document split into chunks");

    Ok((fingerprint, chunks))
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
