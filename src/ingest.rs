use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::embedding::EmbeddingProvider;
use crate::errors::{PipelineError, Result};
use crate::records::RecordCandidate;
use crate::store::{UpsertOutcome, VectorRecord, VectorStore};

/// Outcome of one ingestion run. `failed_ids` identifies the candidates
/// whose embedding or upsert did not go through; everything else landed.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.failed
    }
}

/// Embeds candidates in batches and upserts them keyed by `record_id`.
/// Not all-or-nothing: a batch that exhausts its embedding retries is
/// marked failed and the run continues with the remainder.
pub struct IngestionEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: PipelineConfig,
}

impl IngestionEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub async fn ingest(&self, candidates: Vec<RecordCandidate>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let batch_size = self.config.embed_batch_size.max(1);
        for batch in candidates.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = match self.embed_with_retry(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    log::warn!("embedding batch of {} failed for good: {}", batch.len(), e);
                    report.failed += batch.len();
                    report
                        .failed_ids
                        .extend(batch.iter().map(|c| c.record_id.clone()));
                    continue;
                }
            };
            for (candidate, embedding) in batch.iter().zip(embeddings) {
                if embedding.len() != self.embedder.dimension() {
                    return Err(PipelineError::DimensionMismatch {
                        got: embedding.len(),
                        expected: self.embedder.dimension(),
                    });
                }
                let record = VectorRecord {
                    record_id: candidate.record_id.clone(),
                    embedding,
                    text: candidate.text.clone(),
                    metadata: candidate.metadata.clone(),
                };
                match self.store.upsert(record).await {
                    Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                    Ok(UpsertOutcome::Updated) => report.updated += 1,
                    Err(e @ PipelineError::DimensionMismatch { .. }) => return Err(e),
                    Err(e) => {
                        log::warn!("upsert of {} failed: {}", candidate.record_id, e);
                        report.failed += 1;
                        report.failed_ids.push(candidate.record_id.clone());
                    }
                }
            }
        }
        log::info!(
            "ingested {} candidates: {} inserted, {} updated, {} failed",
            report.total(),
            report.inserted,
            report.updated,
            report.failed
        );
        Ok(report)
    }

    /// Bounded exponential backoff; only transient embedding failures are
    /// retried.
    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let attempts = self.config.max_embed_attempts.max(1);
        let mut last_err = None;
        for attempt in 0..attempts {
            match self.embedder.embed(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) if e.is_transient() => {
                    let delay = Duration::from_millis(
                        self.config.retry_base_delay_ms.saturating_mul(1 << attempt),
                    );
                    log::debug!(
                        "embedding attempt {}/{} failed ({}), retrying in {:?}",
                        attempt + 1,
                        attempts,
                        e,
                        delay
                    );
                    last_err = Some(e);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            PipelineError::EmbeddingService("no attempts were made".to_string())
        }))
    }
}
