use std::collections::BTreeSet;

use context_protocol::capability::Llm;
use context_protocol::config::RouterConfig;

/// The subset of a project's fields the LLM router needs to describe it
/// in the routing prompt.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmRouteResult {
    pub project_ids: Vec<String>,
    pub confidence: f32,
}

/// Asks an LLM to pick which known projects a query is about. Builds a
/// JSON-only prompt, bounds the call with a timeout whose timer is
/// dropped on every settle path (cancelling the inner call rather than
/// leaving it to run past its deadline), and retries up to
/// `config.llm_max_retries`.
pub async fn route_with_llm(
    llm: &dyn Llm,
    query: &str,
    projects: &[ProjectDescriptor],
    config: &RouterConfig,
) -> Option<LlmRouteResult> {
    let prompt = build_prompt(query, projects);
    let known_ids: BTreeSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();

    for attempt in 0..=config.llm_max_retries {
        let call = llm.chat(SYSTEM_PROMPT, &[("user".to_string(), prompt.clone())]);
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(config.llm_timeout_ms),
            call,
        )
        .await;

        match outcome {
            Ok(Ok(text)) => {
                if let Some(parsed) = parse_response(&text, &known_ids) {
                    return Some(parsed);
                }
                log::warn!("llm router returned unparsable output on attempt {attempt}");
            }
            Ok(Err(err)) => {
                log::warn!("llm router call failed on attempt {attempt}: {err}");
            }
            Err(_) => {
                log::warn!("llm router timed out after {}ms on attempt {attempt}", config.llm_timeout_ms);
            }
        }
    }

    None
}

const SYSTEM_PROMPT: &str = "You route a user query to the project(s) it concerns. \
Respond with exactly one JSON object: {\"project_ids\": [...], \"confidence\": 0.0-1.0}. \
No other text.";

fn build_prompt(query: &str, projects: &[ProjectDescriptor]) -> String {
    let catalog: Vec<serde_json::Value> = projects
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "name": p.name,
                "description": p.description,
                "tags": p.tags,
            })
        })
        .collect();

    format!(
        "Query: {query}\nKnown projects: {}",
        serde_json::Value::Array(catalog)
    )
}

/// Parses the first `{...}` substring in `text`, filters ids against the
/// known set, and forces confidence to 0 if every returned id was
/// hallucinated (present but unknown). A genuinely empty id list at high
/// confidence is passed through untouched — that's the router's policy
/// to fall through the chain, not a malformed response.
fn parse_response(text: &str, known_ids: &BTreeSet<&str>) -> Option<LlmRouteResult> {
    let start = text.find('{')?;
    let end = find_matching_brace(text, start)?;
    let slice = &text[start..=end];

    #[derive(serde::Deserialize)]
    struct Raw {
        #[serde(default)]
        project_ids: Vec<String>,
        #[serde(default)]
        confidence: f32,
    }

    let raw: Raw = serde_json::from_str(slice).ok()?;

    let total = raw.project_ids.len();
    let valid: Vec<String> = raw
        .project_ids
        .into_iter()
        .filter(|id| known_ids.contains(id.as_str()))
        .collect();

    let confidence = if total > 0 && valid.is_empty() {
        0.0
    } else {
        raw.confidence
    };

    Some(LlmRouteResult {
        project_ids: valid,
        confidence,
    })
}

fn find_matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> BTreeSet<&str> {
        names.iter().copied().collect()
    }

    #[test]
    fn parses_valid_response() {
        let text = r#"here you go: {"project_ids": ["a", "b"], "confidence": 0.8} thanks"#;
        let result = parse_response(text, &ids(&["a", "b", "c"])).unwrap();
        assert_eq!(result.project_ids, vec!["a", "b"]);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn hallucinated_ids_force_confidence_to_zero() {
        let text = r#"{"project_ids": ["ghost"], "confidence": 0.9}"#;
        let result = parse_response(text, &ids(&["a", "b"])).unwrap();
        assert!(result.project_ids.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn genuinely_empty_ids_keep_original_confidence() {
        let text = r#"{"project_ids": [], "confidence": 0.9}"#;
        let result = parse_response(text, &ids(&["a", "b"])).unwrap();
        assert!(result.project_ids.is_empty());
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn unparsable_text_returns_none() {
        assert!(parse_response("not json at all", &ids(&["a"])).is_none());
    }
}
