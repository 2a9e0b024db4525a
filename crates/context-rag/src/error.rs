use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("failed to assemble context: {0}")]
    AssemblyFailed(String),
    #[error("rerank failed: {0}")]
    RerankFailed(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl From<RagError> for context_protocol::error::RetrievalError {
    fn from(err: RagError) -> Self {
        context_protocol::error::RetrievalError::AssemblyFailed(err.to_string())
    }
}
