use crate::error::IngestError;
use crate::extractor::PageText;
use crate::models::{DocChunk, DocumentFingerprint};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Boundary ladder tried in order before falling back to raw character cuts.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Break `text` into atomic fragments of at most `max_chars` characters,
/// preferring the ladder of natural boundaries. Separators are kept with the
/// fragment that precedes them, so concatenating the fragments reproduces
/// `text` exactly.
fn fragment(text: &str, max_chars: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    match separators.split_first() {
        Some((separator, rest)) => {
            let mut pieces = Vec::new();
            for piece in text.split_inclusive(separator) {
                if char_len(piece) <= max_chars {
                    pieces.push(piece.to_string());
                } else {
                    pieces.extend(fragment(piece, max_chars, rest));
                }
            }
            pieces
        }
        None => {
            let chars: Vec<char> = text.chars().collect();
            chars
                .chunks(max_chars)
                .map(|window| window.iter().collect())
                .collect()
        }
    }
}

/// Merge fragments into chunks of at most `chunk_size` characters, carrying
/// roughly `chunk_overlap` characters of trailing fragments into the start of
/// the next chunk.
fn merge_with_overlap(fragments: Vec<String>, config: ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for piece in fragments {
        let piece_len = char_len(&piece);

        if !current.is_empty() && current_len + piece_len > config.chunk_size {
            chunks.push(current.concat());

            let mut carried: Vec<String> = Vec::new();
            let mut carried_len = 0usize;
            for prev in current.iter().rev() {
                let prev_len = char_len(prev);
                if carried_len + prev_len > config.chunk_overlap {
                    break;
                }
                carried_len += prev_len;
                carried.push(prev.clone());
            }
            carried.reverse();

            current = carried;
            current_len = carried_len;

            // If the carried overlap plus the new piece would still exceed the
            // budget, shed overlap from the front until the piece fits.
            while !current.is_empty() && current_len + piece_len > config.chunk_size {
                let dropped = current.remove(0);
                current_len -= char_len(&dropped);
            }
        }

        current_len += piece_len;
        current.push(piece);
    }

    if !current.is_empty() {
        chunks.push(current.concat());
    }

    chunks
}

/// Split raw text into overlapping passages no longer than the configured
/// chunk size. The final short chunk is retained; empty input yields an
/// empty sequence.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    merge_with_overlap(fragment(text, config.chunk_size, &SEPARATORS), config)
}

/// Split every page of a document into chunks with a document-wide index.
pub fn build_chunks(
    document: &DocumentFingerprint,
    pages: &[PageText],
    config: ChunkingConfig,
) -> Result<Vec<DocChunk>, IngestError> {
    config.validate()?;

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for page in pages {
        for passage in split_text(&page.text, config) {
            if passage.trim().is_empty() {
                continue;
            }

            let chunk_id = make_chunk_id(&document.document_id, page.number, cursor, &passage);
            chunks.push(DocChunk {
                chunk_id,
                document_id: document.document_id.clone(),
                source_path: document.source_path.clone(),
                page: page.number,
                chunk_index: cursor,
                text: passage,
            });
            cursor = cursor.saturating_add(1);
        }
    }

    Ok(chunks)
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
