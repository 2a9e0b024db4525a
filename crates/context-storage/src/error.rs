use thiserror::Error;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("schema version mismatch: database is v{0}, engine expects v{1}")]
    SchemaMismatch(i64, i64),
    #[error("database was created by a newer engine (schema v{0})")]
    SchemaNewerThanEngine(i64),
    #[error("vector has {found} dimensions, project expects {expected}")]
    CorruptVector { expected: usize, found: usize },
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("blocking task panicked: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for context_protocol::error::RetrievalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CorruptVector { expected, found } => {
                context_protocol::error::RetrievalError::CorruptVector { expected, found }
            }
            StoreError::ProjectNotFound(id) => context_protocol::error::RetrievalError::ProjectNotIndexed {
                project_id: id,
                hint: "run an initial index for this project before querying it".to_string(),
            },
            other => context_protocol::error::RetrievalError::RetrievalFailed(other.to_string()),
        }
    }
}
