use std::sync::Arc;

use context_bm25::{Bm25Config, Bm25Index, Bm25Registry};
use context_dense_index::{DenseIndex, DenseIndexConfig, DenseIndexEntry, DenseIndexRegistry};
use context_protocol::capability::Embedder;
use context_protocol::{config::SearchConfig, model::Chunk, SearchFilter};
use context_storage::Storage;

use crate::error::{FusionError, Result};
use crate::fusion::RrfFusion;

/// One fused search hit: the chunk plus its post-fusion score.
#[derive(Debug, Clone)]
pub struct EnrichedResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Runs dense and BM25 retrieval for a single project concurrently, then
/// fuses them with RRF.
pub struct HybridSearch {
    storage: Arc<Storage>,
    dense_registry: Arc<DenseIndexRegistry>,
    bm25_registry: Arc<Bm25Registry>,
    embedder: Arc<dyn Embedder>,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(
        storage: Arc<Storage>,
        dense_registry: Arc<DenseIndexRegistry>,
        bm25_registry: Arc<Bm25Registry>,
        embedder: Arc<dyn Embedder>,
        config: SearchConfig,
    ) -> Self {
        Self {
            storage,
            dense_registry,
            bm25_registry,
            embedder,
            config,
        }
    }

    pub async fn search(&self, project_id: &str, query: &str, limit: usize) -> Result<Vec<EnrichedResult>> {
        self.search_filtered(project_id, query, limit, None).await
    }

    pub async fn search_filtered(
        &self,
        project_id: &str,
        query: &str,
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<EnrichedResult>> {
        let query_vector = self
            .embedder
            .embed_query(query)
            .await
            .map_err(|e| FusionError::Embedding(e.to_string()))?;

        let dense_fut = self.dense_scores(project_id, &query_vector, limit, filter);
        let bm25_fut = self.bm25_scores(project_id, query, limit);
        let (dense, bm25) = tokio::join!(dense_fut, bm25_fut);
        let dense = dense?;
        let bm25 = bm25?;

        let fusion = RrfFusion::new(self.config.rrf_k);
        let fused = fusion.fuse(&dense, self.config.dense_weight, &bm25, self.config.bm25_weight);

        let top_ids: Vec<&str> = fused.iter().take(limit).map(|(id, _)| id.as_str()).collect();
        let chunks = self.storage.get_chunks_by_ids(&top_ids)?;
        let by_id: std::collections::HashMap<&str, &Chunk> =
            chunks.iter().map(|c| (c.id.as_str(), c)).collect();

        Ok(fused
            .into_iter()
            .take(limit)
            .filter_map(|(id, score)| {
                by_id.get(id.as_str()).map(|chunk| EnrichedResult {
                    chunk: (*chunk).clone(),
                    score,
                })
            })
            .collect())
    }

    async fn dense_scores(
        &self,
        project_id: &str,
        query_vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<(String, f32)>> {
        let storage = Arc::clone(&self.storage);
        let pid = project_id.to_string();
        let config = DenseIndexConfig {
            max_connections: self.config.hnsw_m,
            ef_construction: self.config.hnsw_ef_construction,
            ef_search: self.config.hnsw_ef_search,
        };
        let index: Arc<DenseIndex> = self
            .dense_registry
            .get_or_build(project_id, || async move {
                let chunks = tokio::task::spawn_blocking(move || storage.get_chunks_for_project(&pid))
                    .await
                    .map_err(|e| FusionError::DenseIndex(e.to_string()))??;
                let entries: Vec<DenseIndexEntry> = chunks
                    .into_iter()
                    .map(|c| DenseIndexEntry {
                        id: c.id,
                        vector: c.vector,
                        content_type: c.content_type,
                        language: c.language,
                    })
                    .collect();
                DenseIndex::build(&entries, &config).map_err(|e| FusionError::DenseIndex(e.to_string()))
            })
            .await?;

        Ok(index
            .search(query_vector, limit, self.config.hnsw_ef_search, filter)
            .unwrap_or_default())
    }

    async fn bm25_scores(&self, project_id: &str, query: &str, limit: usize) -> Result<Vec<(String, f32)>> {
        let storage = Arc::clone(&self.storage);
        let pid = project_id.to_string();
        let index: Arc<Bm25Index> = self
            .bm25_registry
            .get_or_build(project_id, || async move {
                let documents = tokio::task::spawn_blocking(move || storage.get_chunks_for_project(&pid))
                    .await
                    .unwrap_or_else(|_| Ok(Vec::new()))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| (c.id, c.content))
                    .collect::<Vec<_>>();
                Bm25Index::build(&documents, Bm25Config::default())
            })
            .await;

        Ok(index.search(query, limit))
    }

    pub fn invalidate(&self, project_id: &str) {
        self.dense_registry.invalidate(project_id);
        self.bm25_registry.invalidate(project_id);
    }
}
