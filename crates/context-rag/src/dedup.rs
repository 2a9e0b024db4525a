use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

fn word_set(text: &str) -> HashSet<&str> {
    text.unicode_words().collect()
}

/// Jaccard similarity of two texts' word sets: `|A ∩ B| / |A ∪ B|`.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let set_a = word_set(a);
    let set_b = word_set(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Greedy dedup: `items` must already be sorted best-first. Keeps an item
/// unless it is at least `threshold`-similar to one already kept.
pub fn dedup_by_similarity<T>(items: Vec<T>, threshold: f32, content_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut kept: Vec<T> = Vec::new();
    for item in items {
        let is_duplicate = kept
            .iter()
            .any(|k| jaccard_similarity(content_of(&item), content_of(k)) >= threshold);
        if !is_duplicate {
            kept.push(item);
        }
    }
    kept
}
