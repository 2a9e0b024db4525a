//! Shared types, capability traits and error envelope used across the
//! context-finder crates: nothing in here talks to a database, a model
//! runtime or the filesystem directly.

pub mod capability;
pub mod config;
pub mod error;
pub mod model;

pub use capability::{Embedder, EmbedderError, Llm, LlmError, NoOpTracer, Reranker, Tracer};
pub use config::RuntimeConfig;
pub use error::{ConfigError, ProjectMismatch, RetrievalError};
pub use model::{Chunk, ChunkMetadata, ContentType, EvalResult, EvalRun, FileHash, Project, SearchFilter};
