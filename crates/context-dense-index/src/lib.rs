//! HNSW-backed dense vector index, one per project, built lazily and
//! cached behind a registry that deduplicates concurrent builds.

pub mod error;
pub mod index;
pub mod registry;

pub use error::DenseIndexError;
pub use index::{DenseIndex, DenseIndexConfig, DenseIndexEntry};
pub use registry::DenseIndexRegistry;
