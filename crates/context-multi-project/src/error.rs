use thiserror::Error;

use context_protocol::error::ProjectMismatch;

#[derive(Debug, Error)]
pub enum MultiProjectError {
    #[error("{} project(s) use an incompatible embedding model", offending.len())]
    EmbeddingMismatch { offending: Vec<ProjectMismatch> },

    #[error(transparent)]
    Storage(#[from] context_storage::StoreError),

    #[error(transparent)]
    Fusion(#[from] context_fusion::FusionError),
}

pub type Result<T> = std::result::Result<T, MultiProjectError>;

impl From<MultiProjectError> for context_protocol::error::RetrievalError {
    fn from(err: MultiProjectError) -> Self {
        match err {
            MultiProjectError::EmbeddingMismatch { offending } => {
                context_protocol::error::RetrievalError::EmbeddingMismatch { offending }
            }
            MultiProjectError::Storage(store_err) => store_err.into(),
            MultiProjectError::Fusion(fusion_err) => fusion_err.into(),
        }
    }
}
