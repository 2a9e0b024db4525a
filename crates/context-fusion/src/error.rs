use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("embedding the query failed: {0}")]
    Embedding(String),
    #[error("loading the dense index failed: {0}")]
    DenseIndex(String),
    #[error(transparent)]
    Storage(#[from] context_storage::StoreError),
}

pub type Result<T> = std::result::Result<T, FusionError>;

impl From<FusionError> for context_protocol::error::RetrievalError {
    fn from(err: FusionError) -> Self {
        match err {
            FusionError::Storage(store_err) => store_err.into(),
            other => context_protocol::error::RetrievalError::RetrievalFailed(other.to_string()),
        }
    }
}
