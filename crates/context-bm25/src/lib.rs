//! Hand-rolled Okapi BM25 sparse index, one per project, cached behind a
//! registry that deduplicates concurrent builds.

pub mod index;
pub mod registry;
pub mod tokenizer;

pub use index::{Bm25Config, Bm25Index};
pub use registry::Bm25Registry;
pub use tokenizer::tokenize;
