use thiserror::Error;

/// One project that failed an embedding-compatibility check during a
/// cross-project merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMismatch {
    pub project_id: String,
    pub expected_model: String,
    pub found_model: String,
    pub expected_dimensions: u32,
    pub found_dimensions: u32,
}

/// Errors raised at a boundary where a failure must be explained to a
/// caller (a tool result, an agent turn) rather than just logged and
/// retried internally. Component-local errors (`StoreError`,
/// `IndexerError`, ...) convert into this via `From`.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("no embedding provider is configured or reachable")]
    EmbeddingUnavailable,

    #[error("{} project(s) use an incompatible embedding model", offending.len())]
    EmbeddingMismatch { offending: Vec<ProjectMismatch> },

    #[error("project '{project_id}' has not been indexed yet: {hint}")]
    ProjectNotIndexed { project_id: String, hint: String },

    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("failed to assemble context: {0}")]
    AssemblyFailed(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("corrupt vector: expected {expected} dimensions, found {found}")]
    CorruptVector { expected: usize, found: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("field '{field}' must be > 0, got {value}")]
    MustBePositive { field: &'static str, value: i64 },

    #[error("field '{field}' must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("field '{field}' is required")]
    Missing { field: &'static str },
}
