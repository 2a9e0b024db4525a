use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("language '{0}' is not supported for AST-aware chunking")]
    UnsupportedLanguage(String),
    #[error("tree-sitter failed to parse the file")]
    ParseFailed,
    #[error("file exceeds the configured size limit ({0} lines)")]
    TooLarge(usize),
    #[error("file could not be decoded as UTF-8")]
    DecodeFailure,
}

impl ChunkerError {
    pub fn unsupported_language(lang: &str) -> Self {
        Self::UnsupportedLanguage(lang.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChunkerError>;
