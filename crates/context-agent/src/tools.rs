use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use context_multi_project::MultiProjectSearch;
use context_protocol::capability::Reranker;
use context_protocol::model::Project;
use context_rag::{AssembledSource, RagEngine, RetrievalHit};
use context_router::{ProjectDescriptor, Router};

use crate::error::{AgentError, Result};

/// Shared, mutable view of which projects the agent can see and which one
/// is currently focused. Tools hold an `Arc` to this rather than a copy,
/// so a focus switch is visible to an already-built tool registry without
/// rebuilding it.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub current_project_id: Option<String>,
    pub known_projects: Vec<Project>,
}

impl ProjectContext {
    fn descriptors(&self) -> Vec<ProjectDescriptor> {
        self.known_projects
            .iter()
            .map(|p| ProjectDescriptor {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                tags: p.tags.iter().cloned().collect(),
            })
            .collect()
    }

    fn resolve(&self, ids: &[String]) -> Vec<Project> {
        self.known_projects
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect()
    }
}

/// Unwrapped result of a tool call: the `content` is handed to the LLM
/// verbatim as the next observation, `sources` are aggregated onto the
/// turn's final `response_complete` event.
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<AssembledSource>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    async fn execute(&self, input: serde_json::Value, cancel: &CancellationToken) -> Result<ToolOutput>;
}

/// Retrieves context for a query: routes it to the relevant project(s)
/// via the heuristic/LLM router, runs hybrid search, then assembles the
/// hits into a `<sources>` block via the RAG engine.
pub struct RetrieveKnowledgeTool {
    context: Arc<RwLock<ProjectContext>>,
    router: Arc<Router>,
    search: Arc<MultiProjectSearch>,
    rag: Arc<RagEngine>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl RetrieveKnowledgeTool {
    pub fn new(
        context: Arc<RwLock<ProjectContext>>,
        router: Arc<Router>,
        search: Arc<MultiProjectSearch>,
        rag: Arc<RagEngine>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Self {
        Self {
            context,
            router,
            search,
            rag,
            reranker,
        }
    }
}

#[derive(serde::Deserialize)]
struct RetrieveInput {
    query: String,
}

#[async_trait]
impl Tool for RetrieveKnowledgeTool {
    fn name(&self) -> &str {
        "retrieve_knowledge"
    }

    async fn execute(&self, input: serde_json::Value, cancel: &CancellationToken) -> Result<ToolOutput> {
        let parsed: RetrieveInput = serde_json::from_value(input)
            .map_err(|e| AgentError::ToolFailed { name: self.name().to_string(), message: e.to_string() })?;

        tokio::select! {
            result = self.execute_inner(&parsed.query) => result,
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
        }
    }
}

impl RetrieveKnowledgeTool {
    async fn execute_inner(&self, query: &str) -> Result<ToolOutput> {
        let snapshot = self.context.read().await.clone();
        let descriptors = snapshot.descriptors();
        let routing = self
            .router
            .route(query, &descriptors, snapshot.current_project_id.as_deref(), None)
            .await;
        let projects = snapshot.resolve(&routing.project_ids);

        let retrieve_k = self.rag.config().retrieve_k;
        let retrieval_start = Instant::now();
        let hits: Vec<RetrievalHit> = self
            .search
            .search(&projects, query, retrieve_k, |_progress| {})
            .await
            .map_err(|e| AgentError::ToolFailed { name: self.name().to_string(), message: e.to_string() })?
            .into_iter()
            .map(RetrievalHit::from)
            .collect();
        let retrieval_ms = retrieval_start.elapsed().as_millis() as u64;

        let result = self
            .rag
            .assemble_from_hits(hits, self.reranker.as_deref(), query, retrieval_ms)
            .await
            .map_err(|e| AgentError::ToolFailed { name: self.name().to_string(), message: e.to_string() })?;

        Ok(ToolOutput {
            content: result.context_xml,
            sources: result.sources,
        })
    }
}

/// Looks tools up by name. Populated once at agent construction; callers
/// reconfigure project focus through `ProjectContext`, not by rebuilding
/// this registry.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context_bm25::Bm25Registry;
    use context_dense_index::DenseIndexRegistry;
    use context_fusion::HybridSearch;
    use context_multi_project::MultiProjectSearchConfig;
    use context_protocol::capability::{Embedder, EmbedderError};
    use context_protocol::config::{RagConfig, RouterConfig, SearchConfig};
    use context_protocol::model::{Chunk, ChunkMetadata, ContentType};
    use context_rag::RagEngine;
    use context_router::Router;
    use context_storage::Storage;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    struct HangingEmbedder;

    #[async_trait]
    impl Embedder for HangingEmbedder {
        fn model_id(&self) -> &str {
            "hang-1"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, _texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbedderError> {
            std::future::pending().await
        }
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_string(),
            root_path: PathBuf::from("/tmp"),
            model_id: "hang-1".to_string(),
            dimensions: 2,
            file_count: 0,
            chunk_count: 0,
            last_indexed_at: None,
            updated_at: 0,
            description: None,
            tags: BTreeSet::new(),
            ignore_patterns: Vec::new(),
        }
    }

    fn chunk(project_id: &str, id: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            project_id: project_id.to_string(),
            content: format!("content for {id}"),
            content_type: ContentType::Code,
            language: Some("rust".to_string()),
            relative_path: format!("{id}.rs"),
            start_line: 1,
            end_line: 1,
            vector: vec![1.0, 0.0],
            metadata: ChunkMetadata::default(),
        }
    }

    fn build_tool() -> RetrieveKnowledgeTool {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        storage.upsert_project(&project("a")).unwrap();
        storage.stage_chunk_batch(&[chunk("a", "a-1")]).unwrap();
        storage.commit_staging("a").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(HangingEmbedder);
        let hybrid = Arc::new(HybridSearch::new(
            Arc::clone(&storage),
            Arc::new(DenseIndexRegistry::new()),
            Arc::new(Bm25Registry::new()),
            embedder,
            SearchConfig::default(),
        ));
        let search = Arc::new(MultiProjectSearch::new(hybrid, MultiProjectSearchConfig::default()));
        let router = Arc::new(Router::new(RouterConfig::default()));
        let rag = Arc::new(RagEngine::new(RagConfig::default()));
        let context = Arc::new(RwLock::new(ProjectContext {
            current_project_id: None,
            known_projects: vec![project("a")],
        }));

        RetrieveKnowledgeTool::new(context, router, search, rag, None)
    }

    #[tokio::test]
    async fn cancellation_interrupts_an_in_flight_retrieval() {
        let tool = build_tool();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let input = serde_json::json!({ "query": "what does this do?" });
        let err = tool.execute(input, &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}
