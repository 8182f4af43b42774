pub mod cache;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod sanitize;

pub use cache::{ContextCache, DEFAULT_CACHE_CAPACITY};
pub use chunking::{build_chunks, split_text, ChunkingConfig};
pub use embeddings::{Embedder, OllamaEmbedder, DEFAULT_EMBEDDING_MODEL};
pub use error::{AnswerError, EmbeddingError, GenerationError, IndexError, IngestError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use generator::{Generator, OllamaGenerator, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE};
pub use index::{IndexEntry, VectorIndex};
pub use ingest::{digest_file, ingest_document};
pub use models::{DocChunk, DocumentFingerprint, ScoredChunk};
pub use pipeline::AnswerPipeline;
pub use prompt::{PromptBuilder, PromptVariant, DEFAULT_DOMAIN};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use sanitize::strip_reasoning;
