use thiserror::Error;

#[derive(Debug, Error)]
pub enum DenseIndexError {
    #[error("vector has {found} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("index for project '{0}' has no chunks to search")]
    Empty(String),
}

pub type Result<T> = std::result::Result<T, DenseIndexError>;

impl From<DenseIndexError> for context_protocol::error::RetrievalError {
    fn from(err: DenseIndexError) -> Self {
        context_protocol::error::RetrievalError::RetrievalFailed(err.to_string())
    }
}
