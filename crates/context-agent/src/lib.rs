//! Conversational ReAct agent: a think/act/observe loop that treats
//! retrieval as a tool, streamed as `AgentEvent`s over an `mpsc::Receiver`.

mod agent;
mod error;
mod event;
mod react;
mod tools;

pub use agent::ChatAgent;
pub use error::{AgentError, AgentErrorCode, Result};
pub use event::{AgentEvent, ToolCallInfo};
pub use react::{parse_thought, ConversationWindow, ParsedThought};
pub use tools::{ProjectContext, RetrieveKnowledgeTool, Tool, ToolOutput, ToolRegistry};
