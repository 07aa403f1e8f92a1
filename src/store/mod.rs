use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::records::RecordMetadata;

pub mod memory;

pub use memory::InMemoryStore;

/// A fully materialized record as persisted in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub record_id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// One similarity-search hit. Cosine score, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record_id: String,
    pub score: f32,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// Whether an upsert created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Conjunctive equality filters over record metadata. An unset field
/// imposes no restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    pub ticker: Option<String>,
    pub year: Option<i32>,
    pub cik: Option<String>,
}

impl SearchFilter {
    pub fn by_ticker(ticker: impl Into<String>) -> Self {
        SearchFilter {
            ticker: Some(ticker.into()),
            ..Default::default()
        }
    }

    /// Reject malformed filter values before any store query runs.
    pub fn validate(&self) -> Result<()> {
        if let Some(year) = self.year {
            if !(1000..=9999).contains(&year) {
                return Err(PipelineError::InvalidFilter(format!(
                    "year must be a 4-digit year, got {}",
                    year
                )));
            }
        }
        if let Some(cik) = &self.cik {
            if cik.is_empty() || cik.len() > 10 || !cik.chars().all(|c| c.is_ascii_digit()) {
                return Err(PipelineError::InvalidFilter(format!(
                    "cik must be 1-10 digits, got {:?}",
                    cik
                )));
            }
        }
        if let Some(ticker) = &self.ticker {
            if ticker.is_empty() || !ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
                return Err(PipelineError::InvalidFilter(format!(
                    "ticker must be alphanumeric, got {:?}",
                    ticker
                )));
            }
        }
        Ok(())
    }

    /// Every supplied filter must hold; ticker and CIK compare after the
    /// same normalization ingestion applies.
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        if let Some(ticker) = &self.ticker {
            if !ticker.eq_ignore_ascii_case(&metadata.ticker) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if year != metadata.year {
                return false;
            }
        }
        if let Some(cik) = &self.cik {
            if crate::filing::normalize_cik(cik) != metadata.cik {
                return false;
            }
        }
        true
    }
}

/// Vector store collaborator contract. The store is the sole source of
/// durable truth; per-key upsert must be atomic, which is all the
/// synchronization the pipeline relies on for overlapping ingestion runs.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or fully replace the record keyed by its `record_id`.
    async fn upsert(&self, record: VectorRecord) -> Result<UpsertOutcome>;

    /// Remove a record; returns whether it existed.
    async fn delete(&self, record_id: &str) -> Result<bool>;

    /// k-nearest-neighbor search restricted to records matching `filter`.
    /// Results come back ordered by descending score, ties broken by
    /// `record_id`.
    async fn query(
        &self,
        embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>>;

    /// Number of records currently stored.
    async fn count(&self) -> Result<usize>;

    /// Dimension of stored embeddings; `None` while the store is empty.
    async fn dimension(&self) -> Result<Option<usize>>;
}
