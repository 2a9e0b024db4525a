use context_rag::AssembledSource;

use crate::error::AgentErrorCode;

/// One call the agent made to a registered tool during a turn.
#[derive(Debug, Clone)]
pub struct ToolCallInfo {
    pub name: String,
    pub input: serde_json::Value,
    pub success: bool,
    pub duration_ms: u64,
}

/// Events streamed out of a `ChatAgent` turn over its `mpsc::Receiver`.
/// The think/act/observe cycle shows up as the matching sequence of
/// `ThinkingDelta*`/`ThinkingComplete`/`ToolStart`/`ToolResult` events,
/// terminated by exactly one of `ResponseComplete` or `Error`.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    ThinkingDelta(String),
    ThinkingComplete,
    ToolStart { name: String, input: serde_json::Value },
    ToolResult(ToolCallInfo),
    ResponseComplete {
        answer: String,
        sources: Vec<AssembledSource>,
        degraded: bool,
    },
    Error { code: AgentErrorCode, message: String },
}
