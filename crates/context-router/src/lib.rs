//! Resolves which project(s) a query concerns: a heuristic feature-based
//! classifier first, an LLM for ambiguous queries, then a fallback chain.

mod heuristic;
mod llm_router;
mod router;

pub use heuristic::{classify, Classification, QueryClass};
pub use llm_router::{route_with_llm, LlmRouteResult, ProjectDescriptor};
pub use router::{Router, RoutingMethod, RoutingResult};
