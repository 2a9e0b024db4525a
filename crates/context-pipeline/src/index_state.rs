use serde::{Deserialize, Serialize};

pub const INDEX_STATE_SCHEMA_VERSION: u32 = 1;

/// A snapshot of a project's filesystem state, compared against what was
/// indexed last time to decide whether a re-index is needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watermark {
    pub file_count: u64,
    pub max_mtime_ms: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    IndexMissing,
    WatermarkMissing,
    FilesystemChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReindexResult {
    Ok,
    Cancelled,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReindexAttempt {
    pub attempted: bool,
    pub performed: bool,
    pub duration_ms: Option<u64>,
    pub result: Option<ReindexResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexState {
    pub schema_version: u32,
    pub project_id: String,
    pub model_id: String,
    pub project_watermark: Watermark,
    pub index_exists: bool,
    pub index_watermark: Option<Watermark>,
    pub stale: bool,
    #[serde(default)]
    pub stale_reasons: Vec<StaleReason>,
    pub reindex: Option<ReindexAttempt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleAssessment {
    pub stale: bool,
    pub reasons: Vec<StaleReason>,
}

#[must_use]
pub fn assess_staleness(
    project_watermark: &Watermark,
    index_exists: bool,
    index_watermark: Option<&Watermark>,
) -> StaleAssessment {
    let mut reasons = Vec::new();

    if !index_exists {
        reasons.push(StaleReason::IndexMissing);
    }

    match index_watermark {
        None => {
            if index_exists {
                reasons.push(StaleReason::WatermarkMissing);
            }
        }
        Some(indexed) if indexed != project_watermark => {
            reasons.push(StaleReason::FilesystemChanged);
        }
        Some(_) => {}
    }

    let stale = !reasons.is_empty();
    StaleAssessment { stale, reasons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mark(files: u64, mtime: u64, bytes: u64) -> Watermark {
        Watermark {
            file_count: files,
            max_mtime_ms: mtime,
            total_bytes: bytes,
        }
    }

    #[test]
    fn stale_when_index_missing() {
        let out = assess_staleness(&mark(1, 1, 1), false, None);
        assert_eq!(out.stale, true);
        assert_eq!(out.reasons, vec![StaleReason::IndexMissing]);
    }

    #[test]
    fn stale_when_watermark_missing() {
        let out = assess_staleness(&mark(1, 1, 1), true, None);
        assert_eq!(out.stale, true);
        assert_eq!(out.reasons, vec![StaleReason::WatermarkMissing]);
    }

    #[test]
    fn stale_when_filesystem_changed() {
        let out = assess_staleness(&mark(10, 200, 500), true, Some(&mark(10, 100, 500)));
        assert_eq!(out.stale, true);
        assert_eq!(out.reasons, vec![StaleReason::FilesystemChanged]);
    }

    #[test]
    fn fresh_when_watermarks_match() {
        let current = mark(10, 100, 500);
        let out = assess_staleness(&current, true, Some(&current));
        assert_eq!(out.stale, false);
        assert_eq!(out.reasons, Vec::<StaleReason>::new());
    }
}
