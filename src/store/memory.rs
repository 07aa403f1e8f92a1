use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::{PipelineError, Result};
use crate::store::{ScoredRecord, SearchFilter, UpsertOutcome, VectorRecord, VectorStore};

/// Reference vector store: a map keyed by record id behind an `RwLock`,
/// brute-force cosine scan on query. Used by the test suite and small
/// local corpora; swap in a real ANN backend through the same trait for
/// anything bigger.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, record: VectorRecord) -> Result<UpsertOutcome> {
        let mut records = self.records.write().expect("store lock poisoned");
        // One collection, one dimension; reject the mismatch instead of
        // letting scores silently degrade.
        if let Some(existing) = records.values().next() {
            if existing.embedding.len() != record.embedding.len() {
                return Err(PipelineError::DimensionMismatch {
                    got: record.embedding.len(),
                    expected: existing.embedding.len(),
                });
            }
        }
        match records.insert(record.record_id.clone(), record) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    async fn delete(&self, record_id: &str) -> Result<bool> {
        let mut records = self.records.write().expect("store lock poisoned");
        Ok(records.remove(record_id).is_some())
    }

    async fn query(
        &self,
        embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        let records = self.records.read().expect("store lock poisoned");
        if let Some(existing) = records.values().next() {
            if existing.embedding.len() != embedding.len() {
                return Err(PipelineError::DimensionMismatch {
                    got: embedding.len(),
                    expected: existing.embedding.len(),
                });
            }
        }
        let mut scored: Vec<ScoredRecord> = records
            .values()
            .filter(|r| filter.matches(&r.metadata))
            .map(|r| ScoredRecord {
                record_id: r.record_id.clone(),
                score: cosine_similarity(embedding, &r.embedding),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().expect("store lock poisoned").len())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        let records = self.records.read().expect("store lock poisoned");
        Ok(records.values().next().map(|r| r.embedding.len()))
    }
}
