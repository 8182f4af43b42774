use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("document has no readable text: {0}")]
    EmptyDocument(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding service returned {status}: {details}")]
    Backend { status: String, details: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {details}")]
    Backend { status: String, details: String },

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("persisted collection {collection} is unreadable: {details}")]
    Corrupt { collection: String, details: String },

    #[error("embedding failed while building index: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding dimension {actual} does not match {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Per-request failure, kept split by stage so the interaction surface can
/// tell the user whether retrieval or generation broke.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbeddingError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
