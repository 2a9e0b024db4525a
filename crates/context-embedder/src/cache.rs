use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Caches embeddings keyed by a content hash so a re-index does not pay to
/// re-embed chunks whose text has not changed.
pub struct EmbeddingCache {
    inner: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.inner.lock().expect("embedding cache lock poisoned").get(key).cloned()
    }

    pub fn put(&self, key: String, vector: Vec<f32>) {
        self.inner.lock().expect("embedding cache lock poisoned").put(key, vector);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("embedding cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn put_then_get_round_trips() {
        let cache = EmbeddingCache::new(4);
        cache.put("hash-a".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("hash-a"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let cache = EmbeddingCache::new(1);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }
}
