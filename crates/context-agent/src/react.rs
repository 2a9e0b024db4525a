use std::collections::VecDeque;

/// Bounded conversation history. Oldest turns are dropped once the window
/// exceeds `max_messages`, so a long-running chat doesn't grow the prompt
/// without bound.
pub struct ConversationWindow {
    messages: VecDeque<(String, String)>,
    max_messages: usize,
}

impl ConversationWindow {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
        }
    }

    pub fn push(&mut self, role: &str, content: &str) {
        self.messages.push_back((role.to_string(), content.to_string()));
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    pub fn pop_back(&mut self) -> Option<(String, String)> {
        self.messages.pop_back()
    }

    pub fn as_slice(&self) -> Vec<(String, String)> {
        self.messages.iter().cloned().collect()
    }
}

/// A parsed reasoning step: either the model decided to call a tool, or it
/// produced a final answer.
pub enum ParsedThought {
    Action { tool: String, input: serde_json::Value },
    FinalAnswer(String),
}

const ACTION_MARKER: &str = "Action:";
const ACTION_INPUT_MARKER: &str = "Action Input:";
const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Parses one ReAct-style completion. A completion containing `Action:` /
/// `Action Input:` lines is a tool call; a completion containing `Final
/// Answer:` is treated as the answer; anything else falls through to a
/// final answer of the raw text, so a model that forgets the markers still
/// produces a usable response instead of looping forever.
pub fn parse_thought(text: &str) -> ParsedThought {
    if let Some(pos) = text.find(FINAL_ANSWER_MARKER) {
        let answer = text[pos + FINAL_ANSWER_MARKER.len()..].trim().to_string();
        return ParsedThought::FinalAnswer(answer);
    }

    if let (Some(action_pos), Some(input_pos)) = (text.find(ACTION_MARKER), text.find(ACTION_INPUT_MARKER)) {
        if input_pos > action_pos {
            let tool = text[action_pos + ACTION_MARKER.len()..input_pos].trim().to_string();
            let raw_input = text[input_pos + ACTION_INPUT_MARKER.len()..].trim();
            let input = serde_json::from_str(raw_input).unwrap_or(serde_json::Value::Null);
            if !tool.is_empty() {
                return ParsedThought::Action { tool, input };
            }
        }
    }

    ParsedThought::FinalAnswer(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_final_answer_marker() {
        match parse_thought("Thought: done.\nFinal Answer: the sky is blue") {
            ParsedThought::FinalAnswer(answer) => assert_eq!(answer, "the sky is blue"),
            _ => panic!("expected final answer"),
        }
    }

    #[test]
    fn parses_action_with_json_input() {
        let text = "Thought: need context.\nAction: retrieve_knowledge\nAction Input: {\"query\": \"auth flow\"}";
        match parse_thought(text) {
            ParsedThought::Action { tool, input } => {
                assert_eq!(tool, "retrieve_knowledge");
                assert_eq!(input["query"], "auth flow");
            }
            _ => panic!("expected an action"),
        }
    }

    #[test]
    fn falls_back_to_final_answer_when_unmarked() {
        match parse_thought("just answering directly") {
            ParsedThought::FinalAnswer(answer) => assert_eq!(answer, "just answering directly"),
            _ => panic!("expected final answer"),
        }
    }

    #[test]
    fn conversation_window_drops_oldest_past_capacity() {
        let mut window = ConversationWindow::new(2);
        window.push("user", "one");
        window.push("assistant", "two");
        window.push("user", "three");
        let messages = window.as_slice();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].1, "two");
    }
}
