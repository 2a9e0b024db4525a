use std::collections::HashMap;

/// Reciprocal Rank Fusion over any number of named ranking sources.
///
/// `score(d) = sum over sources of weight_source / (k + rank_source(d))`,
/// where `rank_source(d)` is the 1-based rank of `d` in that source's
/// result list (sources that don't contain `d` contribute nothing).
pub struct RrfFusion {
    k: f32,
}

impl RrfFusion {
    pub const fn new(k: f32) -> Self {
        Self { k }
    }

    /// Fuses exactly two weighted sources — the common case of dense +
    /// BM25 retrieval.
    pub fn fuse(
        &self,
        dense: &[(String, f32)],
        dense_weight: f32,
        bm25: &[(String, f32)],
        bm25_weight: f32,
    ) -> Vec<(String, f32)> {
        self.fuse_many(&[(dense, dense_weight), (bm25, bm25_weight)])
    }

    /// Fuses an arbitrary number of weighted ranked lists. Used both for
    /// dense+BM25 fusion and for merging one project's fused ranking
    /// against another's during a cross-project search.
    ///
    /// When only one source is non-empty, the RRF rank transform is
    /// skipped entirely and that source's original scores are returned
    /// unchanged (sorted descending) — there is nothing to fuse against.
    pub fn fuse_many(&self, sources: &[(&[(String, f32)], f32)]) -> Vec<(String, f32)> {
        let mut non_empty = sources.iter().filter(|(results, _)| !results.is_empty());
        if let Some((only_results, _)) = non_empty.next() {
            if non_empty.next().is_none() {
                let mut single: Vec<(String, f32)> = only_results.to_vec();
                single.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });
                return single;
            }
        }

        let mut scores: HashMap<String, f32> = HashMap::new();

        for (results, weight) in sources {
            for (rank, (id, _original_score)) in results.iter().enumerate() {
                let contribution = weight / (self.k + rank as f32 + 1.0);
                *scores.entry(id.clone()).or_insert(0.0) += contribution;
            }
        }

        let mut fused: Vec<(String, f32)> = scores.into_iter().collect();
        fused.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        fused
    }
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn item_present_in_both_sources_outranks_single_source_items() {
        let fusion = RrfFusion::default();
        let dense = vec![("a".to_string(), 0.9), ("b".to_string(), 0.8)];
        let bm25 = vec![("c".to_string(), 0.95), ("a".to_string(), 0.7)];

        let fused = fusion.fuse(&dense, 0.8, &bm25, 0.2);
        assert_eq!(fused[0].0, "a");
    }

    #[test]
    fn weighting_favors_the_heavier_source() {
        let fusion = RrfFusion::default();
        let dense = vec![("a".to_string(), 0.9)];
        let bm25 = vec![("b".to_string(), 0.9)];

        let fused = fusion.fuse(&dense, 0.95, &bm25, 0.05);
        assert_eq!(fused[0].0, "a");
    }

    #[test]
    fn fuse_many_merges_an_arbitrary_number_of_sources() {
        let fusion = RrfFusion::default();
        let s1 = vec![("a".to_string(), 1.0)];
        let s2 = vec![("a".to_string(), 1.0)];
        let s3 = vec![("b".to_string(), 1.0)];

        let fused = fusion.fuse_many(&[
            (s1.as_slice(), 1.0),
            (s2.as_slice(), 1.0),
            (s3.as_slice(), 1.0),
        ]);
        assert_eq!(fused[0].0, "a");
    }

    #[test]
    fn empty_sources_produce_empty_fusion() {
        let fusion = RrfFusion::default();
        let empty: Vec<(String, f32)> = Vec::new();
        assert!(fusion.fuse(&empty, 0.8, &empty, 0.2).is_empty());
    }

    #[test]
    fn single_contributing_source_preserves_original_scores() {
        let fusion = RrfFusion::default();
        let dense = vec![("a".to_string(), 0.42), ("b".to_string(), 0.17)];
        let empty: Vec<(String, f32)> = Vec::new();

        let fused = fusion.fuse(&dense, 0.8, &empty, 0.2);
        assert_eq!(fused, dense);
    }

    #[test]
    fn ties_break_deterministically_by_id() {
        let fusion = RrfFusion::default();
        let dense = vec![("z".to_string(), 1.0), ("a".to_string(), 1.0)];
        let empty: Vec<(String, f32)> = Vec::new();

        let fused = fusion.fuse(&dense, 1.0, &empty, 1.0);
        assert_eq!(fused[0].0, "a");
        assert_eq!(fused[1].0, "z");
    }
}
