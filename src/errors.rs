use thiserror::Error;

/// Failure taxonomy for the extraction and retrieval pipeline.
///
/// Per-filing extraction failures (`NoStructuredData`, `SectionNotFound`,
/// `EmptyExtraction`) are recoverable at the batch level: the filing is
/// skipped and reported, sibling filings keep processing. Contract
/// violations (`InvalidTopK`, `InvalidFilter`, `DimensionMismatch`) are
/// surfaced to the caller immediately and never retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("filing {accession}: no XBRL instance or inline XBRL source available")]
    NoStructuredData { accession: String },

    #[error("filing {accession}: Item 8 financial statements section not found")]
    SectionNotFound { accession: String },

    #[error("filing {accession}: parsed structured source but zero facts resolved")]
    EmptyExtraction { accession: String },

    #[error("fact {concept}: cannot resolve scale attribute {scale:?}")]
    ScaleResolution { concept: String, scale: String },

    #[error("embedding service failure: {0}")]
    EmbeddingService(String),

    #[error("embedding dimension mismatch: got {got}, store holds {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    #[error("invalid search filter: {0}")]
    InvalidFilter(String),

    #[error("top_k must be positive, got {got}")]
    InvalidTopK { got: usize },

    #[error("vector store failure: {0}")]
    Store(String),
}

impl PipelineError {
    /// Transient failures are worth retrying with backoff; everything else
    /// is either a contract violation or a per-filing condition that a
    /// retry cannot change.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::EmbeddingService(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
