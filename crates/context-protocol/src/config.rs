use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub batch_size: usize,
    pub interactive_batch_size: usize,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            interactive_batch_size: 8,
            timeout_ms: 30_000,
            max_retries: 2,
            cache_capacity: 10_000,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::MustBePositive {
                field: "batch_size",
                value: self.batch_size as i64,
            });
        }
        if self.interactive_batch_size == 0 {
            return Err(ConfigError::MustBePositive {
                field: "interactive_batch_size",
                value: self.interactive_batch_size as i64,
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::MustBePositive {
                field: "timeout_ms",
                value: self.timeout_ms as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub dense_weight: f32,
    pub bm25_weight: f32,
    pub rrf_k: f32,
    pub top_k: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
    pub hnsw_m: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dense_weight: 1.0,
            bm25_weight: 1.0,
            rrf_k: 60.0,
            top_k: 10,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 100,
            hnsw_m: 16,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::MustBePositive {
                field: "top_k",
                value: self.top_k as i64,
            });
        }
        if self.dense_weight < 0.0 || self.bm25_weight < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "dense_weight/bm25_weight",
                value: self.dense_weight.min(self.bm25_weight) as f64,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(())
    }
}

/// How assembled sources are arranged in the `<sources>` block before the
/// token budget is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagOrdering {
    /// Keep descending-score order as handed to the engine.
    Relevance,
    /// Best results at both ends of the window ("lost in the middle" mitigation).
    Sandwich,
    /// Order by file path then by line, ignoring score.
    Chronological,
}

impl Default for RagOrdering {
    fn default() -> Self {
        RagOrdering::Sandwich
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum tokens (whitespace-delimited words, approximated) the
    /// assembled `<sources>` block may spend.
    pub max_tokens: usize,
    /// How many candidates the caller should retrieve before handing hits
    /// to the RAG engine.
    pub retrieve_k: usize,
    /// How many sources survive dedup/budgeting into the final assembly.
    pub final_k: usize,
    pub ordering: RagOrdering,
    /// Whether the caller should rewrite the query before retrieval.
    /// Not exercised by `RagEngine` itself; read by the host wiring layer.
    pub enhance_query: bool,
    pub dedup_jaccard_threshold: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4_000,
            retrieve_k: 20,
            final_k: 5,
            ordering: RagOrdering::Sandwich,
            enhance_query: false,
            dedup_jaccard_threshold: 0.8,
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(500..=16_000).contains(&self.max_tokens) {
            return Err(ConfigError::OutOfRange {
                field: "max_tokens",
                value: self.max_tokens as f64,
                min: 500.0,
                max: 16_000.0,
            });
        }
        if !(5..=100).contains(&self.retrieve_k) {
            return Err(ConfigError::OutOfRange {
                field: "retrieve_k",
                value: self.retrieve_k as f64,
                min: 5.0,
                max: 100.0,
            });
        }
        if !(1..=20).contains(&self.final_k) {
            return Err(ConfigError::OutOfRange {
                field: "final_k",
                value: self.final_k as f64,
                min: 1.0,
                max: 20.0,
            });
        }
        if !(0.0..=1.0).contains(&self.dedup_jaccard_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "dedup_jaccard_threshold",
                value: self.dedup_jaccard_threshold as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub llm_timeout_ms: u64,
    pub llm_max_retries: u32,
    pub confidence_threshold: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 5_000,
            llm_max_retries: 1,
            confidence_threshold: 0.7,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "confidence_threshold",
                value: self.confidence_threshold as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: u32,
    pub turn_timeout_ms: u64,
    pub max_context_tokens: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            turn_timeout_ms: 120_000,
            max_context_tokens: 8_000,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::MustBePositive {
                field: "max_iterations",
                value: self.max_iterations as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub rag: RagConfig,
    pub router: RouterConfig,
    pub agent: AgentConfig,
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.search.validate()?;
        self.rag.validate()?;
        self.router.validate()?;
        self.agent.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_runtime_config_validates() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut cfg = EmbeddingConfig::default();
        cfg.batch_size = 0;
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MustBePositive {
                field: "batch_size",
                value: 0
            }
        );
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut cfg = RouterConfig::default();
        cfg.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }
}
