use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use context_protocol::capability::{Embedder, EmbedderError};
use context_protocol::config::EmbeddingConfig;

/// Wraps an `Embedder` with batch-size chunking, a per-batch timeout,
/// bounded retry, and an optional fallback embedder used once the primary
/// has exhausted its retries. The fallback must share the primary's
/// dimensionality and model id so a caller never silently gets vectors
/// from an incompatible space.
pub struct BatchingEmbedder {
    primary: Arc<dyn Embedder>,
    fallback: Option<Arc<dyn Embedder>>,
    config: EmbeddingConfig,
}

impl BatchingEmbedder {
    pub fn new(primary: Arc<dyn Embedder>, config: EmbeddingConfig) -> Self {
        Self {
            primary,
            fallback: None,
            config,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Embedder>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    async fn embed_with_retry(
        &self,
        embedder: &dyn Embedder,
        batch: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut attempt = 0;
        loop {
            let call = tokio::time::timeout(
                Duration::from_millis(self.config.timeout_ms),
                embedder.embed_batch(batch),
            )
            .await;

            match call {
                Ok(Ok(vectors)) => return Ok(vectors),
                Ok(Err(err)) if attempt < self.config.max_retries => {
                    warn!("embedding batch failed (attempt {attempt}): {err}");
                    attempt += 1;
                }
                Ok(Err(err)) => return Err(err),
                Err(_) if attempt < self.config.max_retries => {
                    warn!("embedding batch timed out after {}ms (attempt {attempt})", self.config.timeout_ms);
                    attempt += 1;
                }
                Err(_) => return Err(EmbedderError::Timeout(self.config.timeout_ms)),
            }
        }
    }

    pub fn interactive_batch_size(&self) -> usize {
        self.config.interactive_batch_size
    }
}

#[async_trait]
impl Embedder for BatchingEmbedder {
    fn model_id(&self) -> &str {
        self.primary.model_id()
    }

    fn dimensions(&self) -> usize {
        self.primary.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            let result = match self.embed_with_retry(self.primary.as_ref(), chunk).await {
                Ok(v) => v,
                Err(primary_err) => {
                    let Some(fallback) = &self.fallback else {
                        return Err(primary_err);
                    };
                    warn!("falling back to secondary embedder after: {primary_err}");
                    self.embed_with_retry(fallback.as_ref(), chunk).await?
                }
            };
            out.extend(result);
        }
        Ok(out)
    }
}
