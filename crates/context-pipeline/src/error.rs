use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunker error: {0}")]
    Chunker(#[from] context_chunker::ChunkerError),

    #[error("storage error: {0}")]
    Storage(#[from] context_storage::StoreError),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("invalid project path: {0}")]
    InvalidPath(String),

    #[error("system time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("indexing was cancelled")]
    Cancelled,

    #[error("blocking task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PipelineError> for context_protocol::error::RetrievalError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Storage(store_err) => store_err.into(),
            other => context_protocol::error::RetrievalError::RetrievalFailed(other.to_string()),
        }
    }
}
