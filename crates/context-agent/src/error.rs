use thiserror::Error;

/// Structured code attached to an `AgentEvent::Error`, so a consumer can
/// branch on outcome without string-matching the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorCode {
    MaxIterations,
    Cancelled,
    ToolFailed,
    LlmFailed,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("tool '{0}' is not registered")]
    UnknownTool(String),
    #[error("tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },
    #[error("llm call failed: {0}")]
    LlmFailed(String),
    #[error("turn cancelled")]
    Cancelled,
    #[error("exhausted {0} iterations without a final answer")]
    MaxIterations(u32),
}

impl AgentError {
    pub fn code(&self) -> AgentErrorCode {
        match self {
            AgentError::UnknownTool(_) | AgentError::ToolFailed { .. } => AgentErrorCode::ToolFailed,
            AgentError::LlmFailed(_) => AgentErrorCode::LlmFailed,
            AgentError::Cancelled => AgentErrorCode::Cancelled,
            AgentError::MaxIterations(_) => AgentErrorCode::MaxIterations,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl From<AgentError> for context_protocol::error::RetrievalError {
    fn from(err: AgentError) -> Self {
        context_protocol::error::RetrievalError::RetrievalFailed(err.to_string())
    }
}
