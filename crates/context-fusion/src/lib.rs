//! Fuses dense and BM25 retrieval with Reciprocal Rank Fusion, and the
//! per-project orchestration (concurrent retrieval + fuse) on top of it.

pub mod error;
pub mod fusion;
pub mod hybrid;

pub use error::FusionError;
pub use fusion::RrfFusion;
pub use hybrid::{EnrichedResult, HybridSearch};
