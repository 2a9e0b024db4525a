//! Concrete `Embedder` implementations: a local ONNX-Runtime model, and a
//! batching/retry/fallback wrapper usable around any `Embedder`.

pub mod batching;
pub mod cache;
pub mod error;
pub mod local_onnx;

pub use batching::BatchingEmbedder;
pub use cache::EmbeddingCache;
pub use error::LocalEmbedderError;
pub use local_onnx::LocalOnnxEmbedder;
