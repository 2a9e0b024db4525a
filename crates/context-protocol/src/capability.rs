use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    #[error("embedding request timed out after {0}ms")]
    Timeout(u64),
    #[error("embedding provider returned a malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm provider unavailable: {0}")]
    Unavailable(String),
    #[error("llm request timed out after {0}ms")]
    Timeout(u64),
    #[error("llm returned content that could not be parsed: {0}")]
    Malformed(String),
}

/// Turns text into vectors. Implemented by a local ONNX runtime or a
/// remote HTTP provider; never implemented inside the retrieval core
/// itself.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier distinguishing models with different vector
    /// spaces (used for the multi-project compatibility check).
    fn model_id(&self) -> &str;

    /// Dimensionality of the vectors this embedder produces.
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut out = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        out.pop()
            .ok_or_else(|| EmbedderError::Malformed("empty batch result".into()))
    }
}

/// A chat-capable large language model, used by the router and the
/// conversational agent.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn chat(&self, system: &str, messages: &[(String, String)]) -> Result<String, LlmError>;

    /// Streams the response as incremental text deltas over `on_delta`.
    /// The default implementation falls back to a single non-streaming
    /// call followed by one synthetic delta, so callers that only
    /// implement `chat` still satisfy this trait.
    async fn stream_chat(
        &self,
        system: &str,
        messages: &[(String, String)],
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String, LlmError> {
        let full = self.chat(system, messages).await?;
        on_delta(&full);
        Ok(full)
    }
}

/// Optional re-scoring stage applied to a fused result list before it is
/// returned to a caller.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[(String, String)],
    ) -> Result<Vec<(String, f32)>, EmbedderError>;
}

/// Observability hook for pipeline and agent stages. Production callers
/// wire this into their tracing backend of choice; library code never
/// assumes one is present beyond the `NoOpTracer` default.
pub trait Tracer: Send + Sync {
    fn event(&self, name: &str, fields: &[(&str, &str)]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpTracer;

impl Tracer for NoOpTracer {
    fn event(&self, _name: &str, _fields: &[(&str, &str)]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEmbedder;

    #[async_trait]
    impl Embedder for EchoEmbedder {
        fn model_id(&self) -> &str {
            "echo-1"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
    }

    #[tokio::test]
    async fn embed_query_delegates_to_batch() {
        let embedder = EchoEmbedder;
        let vec = embedder.embed_query("hello").await.unwrap();
        assert_eq!(vec.len(), 4);
    }

    #[test]
    fn noop_tracer_does_not_panic() {
        let tracer = NoOpTracer;
        tracer.event("anything", &[("k", "v")]);
    }
}
