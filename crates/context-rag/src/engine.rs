use std::collections::HashMap;
use std::time::Instant;

use context_fusion::EnrichedResult;
use context_multi_project::CrossProjectResult;
use context_protocol::capability::Reranker;
use context_protocol::config::{RagConfig, RagOrdering};
use context_protocol::model::Chunk;

use crate::assembly::{apply_token_budget, assemble, chronological_order, sandwich_order, AssembledSource, AssemblyCandidate};
use crate::dedup::dedup_by_similarity;
use crate::error::{RagError, Result};

/// One retrieved chunk plus its fusion score, before rerank/dedup/assembly.
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    pub score: f32,
}

impl From<EnrichedResult> for RetrievalHit {
    fn from(result: EnrichedResult) -> Self {
        Self {
            chunk: result.chunk,
            score: result.score,
        }
    }
}

impl From<CrossProjectResult> for RetrievalHit {
    fn from(result: CrossProjectResult) -> Self {
        Self {
            chunk: result.chunk,
            score: result.score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagTiming {
    pub retrieval_ms: u64,
    pub assembly_ms: u64,
    pub total_ms: u64,
    pub results_retrieved: usize,
    pub results_assembled: usize,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct RagResult {
    pub context_xml: String,
    pub sources: Vec<AssembledSource>,
    pub timing: RagTiming,
}

/// Turns retrieved chunks into an assembled `<sources>` context block:
/// optional rerank, Jaccard dedup, sandwich ordering, token budget, then
/// 1-based citation assignment.
pub struct RagEngine {
    config: RagConfig,
}

impl RagEngine {
    pub fn new(config: RagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub async fn assemble_from_hits(
        &self,
        hits: Vec<RetrievalHit>,
        reranker: Option<&dyn Reranker>,
        query: &str,
        retrieval_ms: u64,
    ) -> Result<RagResult> {
        let assembly_start = Instant::now();
        let results_retrieved = hits.len();

        let mut scored = hits;

        if let Some(reranker) = reranker {
            let candidates: Vec<(String, String)> = scored
                .iter()
                .map(|h| (h.chunk.id.clone(), h.chunk.content.clone()))
                .collect();
            let reranked = reranker
                .rerank(query, &candidates)
                .await
                .map_err(|e| RagError::RerankFailed(e.to_string()))?;
            let score_by_id: HashMap<String, f32> = reranked.into_iter().collect();
            for hit in &mut scored {
                if let Some(&s) = score_by_id.get(&hit.chunk.id) {
                    hit.score = s;
                }
            }
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let deduped = dedup_by_similarity(scored, self.config.dedup_jaccard_threshold, |h| {
            h.chunk.content.as_str()
        });
        let limited: Vec<RetrievalHit> = deduped.into_iter().take(self.config.final_k).collect();

        let candidates: Vec<AssemblyCandidate> = limited
            .into_iter()
            .map(|h| AssemblyCandidate {
                file: h.chunk.relative_path,
                start_line: h.chunk.start_line,
                end_line: h.chunk.end_line,
                content: h.chunk.content,
                score: h.score,
            })
            .collect();

        let ordered = match self.config.ordering {
            RagOrdering::Relevance => candidates,
            RagOrdering::Sandwich => sandwich_order(candidates),
            RagOrdering::Chronological => chronological_order(candidates),
        };
        let budgeted = apply_token_budget(ordered, self.config.max_tokens);
        let results_assembled = budgeted.len();
        let (context_xml, sources) = assemble(budgeted);

        let assembly_ms = assembly_start.elapsed().as_millis() as u64;

        Ok(RagResult {
            context_xml,
            sources,
            timing: RagTiming {
                retrieval_ms,
                assembly_ms,
                total_ms: retrieval_ms + assembly_ms,
                results_retrieved,
                results_assembled,
                from_cache: false,
            },
        })
    }
}
