use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A project registered with the engine: one root directory indexed under
/// one embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub root_path: PathBuf,
    pub model_id: String,
    pub dimensions: u32,
    pub file_count: u64,
    pub chunk_count: u64,
    pub last_indexed_at: Option<i64>,
    pub updated_at: i64,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// Coarse classification of a chunk's source, used by filters and by the
/// chunker to decide which splitting strategy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Code,
    Docs,
    Config,
    Unknown,
}

/// Free-form metadata attached to a chunk. `symbol_name` is promoted to a
/// named field because it is read on every search hit; everything else
/// the chunker or embedder wants to attach rides in `extra` rather than
/// forcing every producer to agree on one fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub symbol_name: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One retrievable unit of text plus its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub content_type: ContentType,
    pub language: Option<String>,
    pub relative_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Predicate over chunk metadata applied during dense/lexical search, per
/// spec's `search(vector, top_k, filter)` contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub content_type: Option<ContentType>,
    pub language: Option<String>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.content_type.is_none() && self.language.is_none()
    }

    pub fn matches(&self, content_type: ContentType, language: Option<&str>) -> bool {
        if let Some(expected) = self.content_type {
            if expected != content_type {
                return false;
            }
        }
        if let Some(expected) = &self.language {
            if language != Some(expected.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Staleness tracking row: one per indexed file, per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHash {
    pub project_id: String,
    pub relative_path: String,
    pub content_hash: String,
    pub indexed_at: i64,
}

/// One invocation of the (external) evaluation harness against a project's
/// index, naming the run so its results can be queried back together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRun {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub created_at: i64,
}

/// One question/answer sample produced by a run, in the shape the
/// evaluation export expects: `{question, answer, contexts, ground_truths}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub id: String,
    pub run_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(default)]
    pub ground_truths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chunk_metadata_defaults_are_empty() {
        let meta = ChunkMetadata::default();
        assert_eq!(meta.symbol_name, None);
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn content_type_round_trips_through_json() {
        let encoded = serde_json::to_string(&ContentType::Code).unwrap();
        assert_eq!(encoded, "\"code\"");
        let decoded: ContentType = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, ContentType::Code);
    }
}
