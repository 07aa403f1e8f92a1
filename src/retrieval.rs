use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::errors::{PipelineError, Result};
use crate::store::{ScoredRecord, SearchFilter, VectorStore};

/// Read-only similarity search over the ingested corpus. Uses the same
/// embedding collaborator as ingestion; a dimension drift between the two
/// is a configuration error and fails before any query runs.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub async fn search(
        &self,
        query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        if top_k == 0 {
            return Err(PipelineError::InvalidTopK { got: top_k });
        }
        filter.validate()?;

        if let Some(stored_dim) = self.store.dimension().await? {
            if stored_dim != self.embedder.dimension() {
                return Err(PipelineError::DimensionMismatch {
                    got: self.embedder.dimension(),
                    expected: stored_dim,
                });
            }
        }

        let query = query_text.to_string();
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&query)).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| PipelineError::EmbeddingService("empty embedding batch".to_string()))?;
        if embedding.len() != self.embedder.dimension() {
            return Err(PipelineError::DimensionMismatch {
                got: embedding.len(),
                expected: self.embedder.dimension(),
            });
        }

        let results = self.store.query(&embedding, filter, top_k).await?;
        log::debug!(
            "query {:?} returned {} of up to {} results",
            query_text,
            results.len(),
            top_k
        );
        Ok(results)
    }
}
