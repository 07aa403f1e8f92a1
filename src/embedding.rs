use async_trait::async_trait;

use crate::errors::Result;

/// Black-box embedding collaborator: text in, fixed-dimension vector out.
/// The dimension is fixed per deployment; the ingestion and retrieval
/// engines both verify every returned vector against it, because a store
/// holding mixed dimensionalities is unrecoverable without re-ingestion.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The constant output dimension of this provider.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts. Must return one vector per input, in order,
    /// each of length `dimension()`. Transient failures map to
    /// `PipelineError::EmbeddingService` and are retried by the caller.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic stand-in embedder: hashed character trigrams, L2
    /// normalized, so lexically similar texts land near each other.
    pub struct TrigramEmbedder {
        dim: usize,
    }

    impl TrigramEmbedder {
        pub fn new(dim: usize) -> Self {
            Self { dim }
        }

        pub fn embed_one(&self, text: &str) -> Vec<f32> {
            let mut v = vec![0f32; self.dim];
            let cleaned: Vec<char> = text
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            for window in cleaned.windows(3) {
                let mut hash: u64 = 5381;
                for c in window {
                    hash = hash.wrapping_mul(33).wrapping_add(*c as u64);
                }
                v[(hash % self.dim as u64) as usize] += 1.0;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in &mut v {
                    *x /= norm;
                }
            }
            v
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TrigramEmbedder {
        fn dimension(&self) -> usize {
            self.dim
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.embed_one(t)).collect())
        }
    }

    /// Fails the first `failures` calls, then behaves like `TrigramEmbedder`.
    pub struct FlakyEmbedder {
        inner: TrigramEmbedder,
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyEmbedder {
        pub fn new(dim: usize, failures: usize) -> Self {
            Self {
                inner: TrigramEmbedder::new(dim),
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(crate::errors::PipelineError::EmbeddingService(
                    "simulated outage".to_string(),
                ));
            }
            self.inner.embed(texts).await
        }
    }
}
