//! Splits source files into retrievable chunks: AST-aware for the
//! languages tree-sitter supports, line-window based (with overlap) for
//! everything else.

pub mod chunker;
pub mod error;
pub mod language;

pub use chunker::{Chunker, ChunkPiece, ChunkResult, ChunkerConfig, SkipReason};
pub use error::ChunkerError;
pub use language::{Language, LanguageSizeLimits};
