use context_protocol::capability::Llm;
use context_protocol::config::RouterConfig;

use crate::heuristic::{classify, QueryClass};
use crate::llm_router::{route_with_llm, ProjectDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingMethod {
    Heuristic,
    Llm,
    FallbackAll,
}

#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub project_ids: Vec<String>,
    pub method: RoutingMethod,
    pub confidence: f32,
    pub reason: String,
}

/// Resolves which project(s) a query concerns, trying the heuristic
/// classifier first, falling back to an LLM for ambiguous queries, then
/// to the caller's current project, then to every known project.
pub struct Router {
    config: RouterConfig,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub async fn route(
        &self,
        query: &str,
        projects: &[ProjectDescriptor],
        current_project_id: Option<&str>,
        llm: Option<&dyn Llm>,
    ) -> RoutingResult {
        if projects.is_empty() {
            return RoutingResult {
                project_ids: Vec::new(),
                method: RoutingMethod::FallbackAll,
                confidence: 1.0,
                reason: "no projects registered".to_string(),
            };
        }

        let names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
        let heuristic = classify(query, &names);

        if heuristic.class != QueryClass::General {
            let ids = resolve_ids_by_name(projects, &heuristic.mentioned_projects);
            return RoutingResult {
                project_ids: ids,
                method: RoutingMethod::Heuristic,
                confidence: heuristic.confidence,
                reason: format!("{:?} classified by heuristic", heuristic.class),
            };
        }

        if let Some(llm) = llm {
            if let Some(llm_result) = route_with_llm(llm, query, projects, &self.config).await {
                if llm_result.confidence >= self.config.confidence_threshold && !llm_result.project_ids.is_empty() {
                    return RoutingResult {
                        project_ids: llm_result.project_ids,
                        method: RoutingMethod::Llm,
                        confidence: llm_result.confidence,
                        reason: "llm router resolved project(s)".to_string(),
                    };
                }
            }
        }

        if let Some(current) = current_project_id {
            if projects.iter().any(|p| p.id == current) {
                return RoutingResult {
                    project_ids: vec![current.to_string()],
                    method: RoutingMethod::FallbackAll,
                    confidence: heuristic.confidence,
                    reason: "fell back to the caller's current project".to_string(),
                };
            }
        }

        RoutingResult {
            project_ids: projects.iter().map(|p| p.id.clone()).collect(),
            method: RoutingMethod::FallbackAll,
            confidence: heuristic.confidence,
            reason: "fell back to all known projects".to_string(),
        }
    }
}

fn resolve_ids_by_name(projects: &[ProjectDescriptor], names: &[String]) -> Vec<String> {
    projects
        .iter()
        .filter(|p| names.iter().any(|n| n.eq_ignore_ascii_case(&p.name)))
        .map(|p| p.id.clone())
        .collect()
}
