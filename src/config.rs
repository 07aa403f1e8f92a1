use anyhow::{anyhow, Result};

/// Tunables for ingestion and chunking, environment-driven with defaults
/// that suit a single-machine batch run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Texts per embedding request.
    pub embed_batch_size: usize,
    /// Character budget for one text chunk.
    pub max_chunk_chars: usize,
    /// Attempts per embedding batch before its records are marked failed.
    pub max_embed_attempts: usize,
    /// Backoff base; attempt n sleeps base * 2^n.
    pub retry_base_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            embed_batch_size: 32,
            max_chunk_chars: 1000,
            max_embed_attempts: 3,
            retry_base_delay_ms: 250,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = PipelineConfig::default();
        Ok(PipelineConfig {
            embed_batch_size: env_or("SECSEARCH_EMBED_BATCH_SIZE", defaults.embed_batch_size)?,
            max_chunk_chars: env_or("SECSEARCH_MAX_CHUNK_CHARS", defaults.max_chunk_chars)?,
            max_embed_attempts: env_or("SECSEARCH_MAX_EMBED_ATTEMPTS", defaults.max_embed_attempts)?,
            retry_base_delay_ms: env_or("SECSEARCH_RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms)?,
        })
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow!("{} has invalid value {:?}", name, value)),
        Err(_) => Ok(default),
    }
}
