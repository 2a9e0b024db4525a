use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalEmbedderError {
    #[error("failed to load tokenizer: {0}")]
    TokenizerLoad(String),
    #[error("failed to load onnx session: {0}")]
    SessionLoad(String),
    #[error("tokenization failed: {0}")]
    Tokenize(String),
    #[error("onnx inference failed: {0}")]
    Inference(String),
    #[error("blocking task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LocalEmbedderError>;
