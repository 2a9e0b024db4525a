//! # Context Pipeline
//!
//! Project indexing for semantic code search: scan the filesystem, chunk
//! source files, embed the chunks, and stage them into storage behind an
//! atomic swap.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> Scanner (.gitignore aware)
//!     │      └─> Source files
//!     │
//!     ├──> Chunker (AST-aware)
//!     │      └─> Code chunks
//!     │
//!     └──> Embedder + Storage (staging, then atomic swap)
//!            └─> Searchable index
//! ```

mod error;
mod index_state;
mod pipeline;
mod scanner;

pub use error::{PipelineError, Result};
pub use index_state::{
    assess_staleness, IndexState, ReindexAttempt, ReindexResult, StaleAssessment, StaleReason,
    Watermark, INDEX_STATE_SCHEMA_VERSION,
};
pub use pipeline::{compute_watermark, IndexStats, Pipeline, PipelineConfig, StageEvent};
pub use scanner::{FileScanner, ScanConfig, ScannedFile};
