use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use context_fusion::{EnrichedResult, HybridSearch, RrfFusion};
use context_protocol::model::{Chunk, Project};
use context_protocol::SearchFilter;

use crate::compat::validate_compatible;
use crate::error::Result;

/// Progress callback payload emitted while per-project stores are loaded
/// for a cross-project search.
#[derive(Debug, Clone)]
pub struct LoadProgress {
    pub project_id: String,
    pub project_name: String,
    pub project_index: usize,
    pub total_projects: usize,
}

/// One cross-project search hit, attributed to the project it came from.
#[derive(Debug, Clone)]
pub struct CrossProjectResult {
    pub project_id: String,
    pub project_name: String,
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct MultiProjectSearchConfig {
    pub top_k_per_project: usize,
    pub rrf_k: f32,
}

impl Default for MultiProjectSearchConfig {
    fn default() -> Self {
        Self {
            top_k_per_project: 20,
            rrf_k: 60.0,
        }
    }
}

/// Runs a query against several projects' hybrid search and merges the
/// per-project rankings with RRF, treating each project's ranking as one
/// fusion input.
pub struct MultiProjectSearch {
    hybrid: Arc<HybridSearch>,
    config: MultiProjectSearchConfig,
}

impl MultiProjectSearch {
    pub fn new(hybrid: Arc<HybridSearch>, config: MultiProjectSearchConfig) -> Self {
        Self { hybrid, config }
    }

    pub async fn search(
        &self,
        projects: &[Project],
        query: &str,
        top_k: usize,
        on_progress: impl FnMut(LoadProgress),
    ) -> Result<Vec<CrossProjectResult>> {
        self.search_filtered(projects, query, top_k, None, on_progress).await
    }

    /// Same as `search`, but restricts hits to those matching `filter`.
    pub async fn search_filtered(
        &self,
        projects: &[Project],
        query: &str,
        top_k: usize,
        filter: Option<&SearchFilter>,
        mut on_progress: impl FnMut(LoadProgress),
    ) -> Result<Vec<CrossProjectResult>> {
        validate_compatible(projects)?;

        if projects.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let total_projects = projects.len();
        let top_k_per_project = self.config.top_k_per_project;

        // Each project's search runs concurrently; `on_progress` fires as
        // the futures are built so callers still see one call per project
        // in order, before any of them actually resolve.
        let searches = projects.iter().enumerate().map(|(index, project)| {
            on_progress(LoadProgress {
                project_id: project.id.clone(),
                project_name: project.name.clone(),
                project_index: index,
                total_projects,
            });

            let hybrid = Arc::clone(&self.hybrid);
            let project_id = project.id.clone();
            let project_name = project.name.clone();
            let query = query.to_string();
            async move {
                let result = hybrid
                    .search_filtered(&project_id, &query, top_k_per_project, filter)
                    .await;
                (project_id, project_name, result)
            }
        });

        let outcomes = join_all(searches).await;

        let mut per_project: Vec<(String, String, Vec<EnrichedResult>)> = Vec::new();
        for (project_id, project_name, result) in outcomes {
            match result {
                Ok(results) => per_project.push((project_id, project_name, results)),
                Err(err) => {
                    log::warn!("skipping project {project_id} in cross-project search: {err}");
                }
            }
        }

        if per_project.len() == 1 {
            let (project_id, project_name, results) = per_project.into_iter().next().unwrap();
            return Ok(results
                .into_iter()
                .take(top_k)
                .map(|r| CrossProjectResult {
                    project_id: project_id.clone(),
                    project_name: project_name.clone(),
                    chunk: r.chunk,
                    score: r.score,
                })
                .collect());
        }

        let mut attribution: HashMap<String, (String, String, Chunk)> = HashMap::new();
        let mut source_lists: Vec<Vec<(String, f32)>> = Vec::new();

        for (project_id, project_name, results) in &per_project {
            let mut ranked = Vec::with_capacity(results.len());
            for result in results {
                attribution
                    .entry(result.chunk.id.clone())
                    .or_insert_with(|| (project_id.clone(), project_name.clone(), result.chunk.clone()));
                ranked.push((result.chunk.id.clone(), result.score));
            }
            source_lists.push(ranked);
        }

        let fusion = RrfFusion::new(self.config.rrf_k);
        let sources: Vec<(&[(String, f32)], f32)> =
            source_lists.iter().map(|s| (s.as_slice(), 1.0)).collect();
        let fused = fusion.fuse_many(&sources);

        Ok(fused
            .into_iter()
            .take(top_k)
            .filter_map(|(id, score)| {
                attribution.get(&id).map(|(project_id, project_name, chunk)| CrossProjectResult {
                    project_id: project_id.clone(),
                    project_name: project_name.clone(),
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context_bm25::Bm25Registry;
    use context_dense_index::DenseIndexRegistry;
    use context_protocol::capability::{Embedder, EmbedderError};
    use context_protocol::config::SearchConfig;
    use context_protocol::model::{Chunk, ChunkMetadata, ContentType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn model_id(&self) -> &str {
            "stub-1"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbedderError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn project(id: &str, dimensions: u32) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_string(),
            root_path: PathBuf::from("/tmp"),
            model_id: "stub-1".to_string(),
            dimensions,
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

    fn build_search() -> (Arc<HybridSearch>, Arc<Storage>) {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        storage.upsert_project(&project("a", 2)).unwrap();
        storage.stage_chunk_batch(&[chunk("a", "a-1")]).unwrap();
        storage.commit_staging("a").unwrap();

        storage.upsert_project(&project("b", 2)).unwrap();
        storage.stage_chunk_batch(&[chunk("b", "b-1")]).unwrap();
        storage.commit_staging("b").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let hybrid = Arc::new(HybridSearch::new(
            Arc::clone(&storage),
            Arc::new(DenseIndexRegistry::new()),
            Arc::new(Bm25Registry::new()),
            embedder,
            SearchConfig::default(),
        ));
        (hybrid, storage)
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_rejected_before_any_load() {
        let (hybrid, _storage) = build_search();
        let search = MultiProjectSearch::new(hybrid, MultiProjectSearchConfig::default());
        let projects = vec![project("a", 2), project("b", 99)];
        let err = search
            .search(&projects, "content", 10, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, MultiProjectError::EmbeddingMismatch { .. }));
    }

    #[tokio::test]
    async fn single_project_scores_are_not_rrf_transformed() {
        let (hybrid, _storage) = build_search();
        let search = MultiProjectSearch::new(hybrid, MultiProjectSearchConfig::default());
        let projects = vec![project("a", 2)];
        let results = search
            .search(&projects, "content", 10, |_| {})
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].project_id, "a");
    }

    #[tokio::test]
    async fn cross_project_results_are_attributed_to_their_project() {
        let (hybrid, _storage) = build_search();
        let search = MultiProjectSearch::new(hybrid, MultiProjectSearchConfig::default());
        let projects = vec![project("a", 2), project("b", 2)];
        let mut progress_calls = 0;
        let results = search
            .search(&projects, "content", 10, |_| progress_calls += 1)
            .await
            .unwrap();

        assert_eq!(progress_calls, 2);
        let project_ids: BTreeSet<String> = results.iter().map(|r| r.project_id.clone()).collect();
        assert!(project_ids.contains("a"));
        assert!(project_ids.contains("b"));
    }
}
