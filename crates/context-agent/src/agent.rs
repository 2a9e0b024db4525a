use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use context_protocol::capability::{Llm, Tracer};
use context_protocol::config::AgentConfig;
use context_protocol::model::Project;

use crate::error::AgentError;
use crate::event::{AgentEvent, ToolCallInfo};
use crate::react::{parse_thought, ConversationWindow, ParsedThought};
use crate::tools::{ProjectContext, ToolRegistry};

const SYSTEM_PROMPT: &str = "You are a coding assistant. Reason step by step. \
To use a tool, reply with lines 'Action: <tool name>' and 'Action Input: <json>'. \
When you are ready to answer the user, reply with 'Final Answer: <answer>'.";

/// Per-turn tracing span. Closes on the first of: explicit `close`, or
/// drop (covering early returns and panics), so a turn is observed
/// exactly once regardless of how it ends.
struct TurnSpan {
    tracer: Arc<dyn Tracer>,
    turn_id: String,
    closed: bool,
}

impl TurnSpan {
    fn open(tracer: Arc<dyn Tracer>) -> Self {
        let turn_id = Uuid::new_v4().to_string();
        tracer.event("turn_start", &[("turn_id", turn_id.as_str())]);
        Self { tracer, turn_id, closed: false }
    }

    fn close(&mut self, outcome: &str) {
        if !self.closed {
            self.tracer
                .event("turn_end", &[("turn_id", self.turn_id.as_str()), ("outcome", outcome)]);
            self.closed = true;
        }
    }
}

impl Drop for TurnSpan {
    fn drop(&mut self) {
        self.close("dropped");
    }
}

/// Holds an LLM, a tool registry, a bounded conversation window, and a
/// tracer. `send` spawns one ReAct turn and streams its events back over
/// an `mpsc::Receiver`.
pub struct ChatAgent {
    llm: Arc<dyn Llm>,
    tools: Arc<ToolRegistry>,
    tracer: Arc<dyn Tracer>,
    config: AgentConfig,
    context: Arc<RwLock<ProjectContext>>,
    window: Arc<RwLock<ConversationWindow>>,
}

impl ChatAgent {
    pub fn new(
        llm: Arc<dyn Llm>,
        tools: Arc<ToolRegistry>,
        tracer: Arc<dyn Tracer>,
        config: AgentConfig,
        context: Arc<RwLock<ProjectContext>>,
        window_size: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            tracer,
            config,
            context,
            window: Arc::new(RwLock::new(ConversationWindow::new(window_size))),
        }
    }

    /// Switches which project(s) the agent's tools see. Tools hold an
    /// `Arc` to the same `ProjectContext`, so this takes effect on the
    /// next tool call without rebuilding the registry.
    pub async fn reconfigure(&self, current_project_id: Option<String>, known_projects: Vec<Project>) {
        let mut ctx = self.context.write().await;
        ctx.current_project_id = current_project_id;
        ctx.known_projects = known_projects;
    }

    pub fn send(&self, user_message: String, cancel: CancellationToken) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel(64);
        let llm = Arc::clone(&self.llm);
        let tools = Arc::clone(&self.tools);
        let tracer = Arc::clone(&self.tracer);
        let config = self.config.clone();
        let window = Arc::clone(&self.window);

        tokio::spawn(async move {
            run_turn(llm, tools, tracer, config, window, user_message, cancel, tx).await;
        });

        rx
    }
}

async fn run_turn(
    llm: Arc<dyn Llm>,
    tools: Arc<ToolRegistry>,
    tracer: Arc<dyn Tracer>,
    config: AgentConfig,
    window: Arc<RwLock<ConversationWindow>>,
    user_message: String,
    cancel: CancellationToken,
    tx: mpsc::Sender<AgentEvent>,
) {
    let mut span = TurnSpan::open(tracer);

    {
        let mut w = window.write().await;
        w.push("user", &user_message);
    }

    let mut collected_sources = Vec::new();
    let mut last_complete_thought: Option<String> = None;

    for _ in 0..config.max_iterations {
        if cancel.is_cancelled() {
            rollback_user_message(&window).await;
            span.close("cancelled");
            let _ = tx.send(AgentEvent::Error {
                code: AgentError::Cancelled.code(),
                message: AgentError::Cancelled.to_string(),
            }).await;
            return;
        }

        let messages = {
            let w = window.read().await;
            w.as_slice()
        };

        let chat_result = {
            let tx = tx.clone();
            llm.stream_chat(SYSTEM_PROMPT, &messages, &mut |delta: &str| {
                let _ = tx.try_send(AgentEvent::ThinkingDelta(delta.to_string()));
            }).await
        };

        let thought = match chat_result {
            Ok(full) => full,
            Err(err) => {
                rollback_user_message(&window).await;
                span.close("error");
                let _ = tx.send(AgentEvent::Error {
                    code: AgentError::LlmFailed(err.to_string()).code(),
                    message: err.to_string(),
                }).await;
                return;
            }
        };
        let _ = tx.send(AgentEvent::ThinkingComplete).await;

        match parse_thought(&thought) {
            ParsedThought::FinalAnswer(answer) => {
                {
                    let mut w = window.write().await;
                    w.push("assistant", &answer);
                }
                span.close("complete");
                let _ = tx.send(AgentEvent::ResponseComplete {
                    answer,
                    sources: collected_sources,
                    degraded: false,
                }).await;
                return;
            }
            ParsedThought::Action { tool, input } => {
                last_complete_thought = Some(thought.clone());
                let _ = tx.send(AgentEvent::ToolStart { name: tool.clone(), input: input.clone() }).await;

                let start = Instant::now();
                let outcome = match tools.get(&tool) {
                    Some(handler) => handler.execute(input.clone(), &cancel).await,
                    None => Err(AgentError::UnknownTool(tool.clone())),
                };
                let duration_ms = start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(output) => {
                        collected_sources.extend(output.sources);
                        let _ = tx.send(AgentEvent::ToolResult(ToolCallInfo {
                            name: tool,
                            input,
                            success: true,
                            duration_ms,
                        })).await;
                        let mut w = window.write().await;
                        w.push("observation", &output.content);
                    }
                    Err(err) => {
                        let _ = tx.send(AgentEvent::ToolResult(ToolCallInfo {
                            name: tool.clone(),
                            input,
                            success: false,
                            duration_ms,
                        })).await;
                        rollback_user_message(&window).await;
                        span.close("error");
                        let _ = tx.send(AgentEvent::Error {
                            code: err.code(),
                            message: err.to_string(),
                        }).await;
                        return;
                    }
                }
            }
        }
    }

    // MAX_ITERATIONS: graceful degradation promotes the last complete
    // thought to the final answer instead of surfacing a bare error.
    span.close("max_iterations");
    let answer = last_complete_thought.unwrap_or_default();
    let _ = tx.send(AgentEvent::ResponseComplete {
        answer,
        sources: collected_sources,
        degraded: true,
    }).await;
}

async fn rollback_user_message(window: &Arc<RwLock<ConversationWindow>>) {
    let mut w = window.write().await;
    w.pop_back();
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context_protocol::capability::{LlmError, NoOpTracer};
    use pretty_assertions::assert_eq;

    use crate::tools::{Tool, ToolOutput};

    struct StubTool;

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            "retrieve_knowledge"
        }
        async fn execute(
            &self,
            _input: serde_json::Value,
            _cancel: &CancellationToken,
        ) -> crate::error::Result<ToolOutput> {
            Ok(ToolOutput { content: "stub observation".to_string(), sources: Vec::new() })
        }
    }

    struct ScriptedLlm {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn chat(&self, _system: &str, _messages: &[(String, String)]) -> std::result::Result<String, LlmError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok("Final Answer: out of script".to_string())
            } else {
                Ok(replies.remove(0).to_string())
            }
        }
    }

    fn agent_with_replies(replies: Vec<&'static str>) -> ChatAgent {
        let llm = Arc::new(ScriptedLlm { replies: std::sync::Mutex::new(replies) });
        let tools = Arc::new(ToolRegistry::new());
        let tracer: Arc<dyn Tracer> = Arc::new(NoOpTracer);
        let context = Arc::new(RwLock::new(ProjectContext::default()));
        ChatAgent::new(llm, tools, tracer, AgentConfig::default(), context, 20)
    }

    #[tokio::test]
    async fn direct_final_answer_completes_immediately() {
        let agent = agent_with_replies(vec!["Final Answer: hello there"]);
        let mut rx = agent.send("hi".to_string(), CancellationToken::new());

        let mut saw_complete = false;
        while let Some(event) = rx.recv().await {
            if let AgentEvent::ResponseComplete { answer, degraded, .. } = event {
                assert_eq!(answer, "hello there");
                assert!(!degraded);
                saw_complete = true;
            }
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn max_iterations_promotes_last_thought() {
        let mut config = AgentConfig::default();
        config.max_iterations = 2;
        let llm = Arc::new(ScriptedLlm {
            replies: std::sync::Mutex::new(vec![
                "Action: retrieve_knowledge\nAction Input: {\"query\": \"x\"}",
                "Action: retrieve_knowledge\nAction Input: {\"query\": \"x\"}",
            ]),
        });
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(StubTool));
        let tools = Arc::new(tools);
        let tracer: Arc<dyn Tracer> = Arc::new(NoOpTracer);
        let context = Arc::new(RwLock::new(ProjectContext::default()));
        let agent = ChatAgent::new(llm, tools, tracer, config, context, 20);

        let mut rx = agent.send("hi".to_string(), CancellationToken::new());
        let mut degraded_seen = false;
        while let Some(event) = rx.recv().await {
            if let AgentEvent::ResponseComplete { degraded, .. } = event {
                degraded_seen = degraded;
            }
        }
        assert!(degraded_seen);
    }

    #[tokio::test]
    async fn unknown_tool_rolls_back_user_message_and_errors() {
        let llm = Arc::new(ScriptedLlm {
            replies: std::sync::Mutex::new(vec!["Action: nonexistent\nAction Input: {}"]),
        });
        let tools = Arc::new(ToolRegistry::new());
        let tracer: Arc<dyn Tracer> = Arc::new(NoOpTracer);
        let context = Arc::new(RwLock::new(ProjectContext::default()));
        let agent = ChatAgent::new(llm, tools, tracer, AgentConfig::default(), context, 20);

        let mut rx = agent.send("hi".to_string(), CancellationToken::new());
        let mut saw_error = false;
        while let Some(event) = rx.recv().await {
            if matches!(event, AgentEvent::Error { .. }) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
