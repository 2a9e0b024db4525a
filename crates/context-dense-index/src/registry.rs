use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

use crate::index::DenseIndex;

enum Slot {
    Building(Arc<Notify>),
    Ready(Arc<DenseIndex>),
}

/// Lazily builds and caches one `DenseIndex` per project. Concurrent
/// requests for the same project while a build is in flight wait on that
/// build rather than triggering duplicate work.
#[derive(Default)]
pub struct DenseIndexRegistry {
    slots: DashMap<String, Slot>,
}

impl DenseIndexRegistry {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Returns the cached index for `project_id`, building it with
    /// `builder` if absent. `builder` runs at most once per cache miss even
    /// under concurrent callers.
    pub async fn get_or_build<F, Fut, E>(
        &self,
        project_id: &str,
        builder: F,
    ) -> Result<Arc<DenseIndex>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DenseIndex, E>>,
    {
        loop {
            let notify = {
                match self.slots.get(project_id) {
                    Some(entry) => match entry.value() {
                        Slot::Ready(index) => return Ok(Arc::clone(index)),
                        Slot::Building(notify) => Some(Arc::clone(notify)),
                    },
                    None => None,
                }
            };

            if let Some(notify) = notify {
                notify.notified().await;
                continue;
            }

            let notify = Arc::new(Notify::new());
            let claimed = self
                .slots
                .entry(project_id.to_string())
                .or_insert_with(|| Slot::Building(Arc::clone(&notify)));
            let already_building = matches!(claimed.value(), Slot::Building(n) if !Arc::ptr_eq(n, &notify));
            drop(claimed);
            if already_building {
                continue;
            }

            let result = builder().await;
            match result {
                Ok(index) => {
                    let index = Arc::new(index);
                    self.slots
                        .insert(project_id.to_string(), Slot::Ready(Arc::clone(&index)));
                    notify.notify_waiters();
                    return Ok(index);
                }
                Err(err) => {
                    self.slots.remove(project_id);
                    notify.notify_waiters();
                    return Err(err);
                }
            }
        }
    }

    /// Drops a project's cached index so the next lookup rebuilds it —
    /// called after a re-index commits new chunks.
    pub fn invalidate(&self, project_id: &str) {
        self.slots.remove(project_id);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DenseIndexConfig, DenseIndexEntry};
    use context_protocol::ContentType;

    fn entry(id: &str, vector: Vec<f32>) -> DenseIndexEntry {
        DenseIndexEntry {
            id: id.to_string(),
            vector,
            content_type: ContentType::Code,
            language: None,
        }
    }

    #[tokio::test]
    async fn caches_built_index_across_calls() {
        let registry = DenseIndexRegistry::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..3 {
            let calls_ref = &calls;
            let _index: Arc<DenseIndex> = registry
                .get_or_build("p1", || async {
                    calls_ref.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    DenseIndex::build(&[entry("a", vec![1.0, 0.0])], &DenseIndexConfig::default())
                        .map_err(|e| e)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_rebuild() {
        let registry = DenseIndexRegistry::new();
        let build = || async { DenseIndex::build(&[entry("a", vec![1.0])], &DenseIndexConfig::default()) };

        registry.get_or_build("p1", build).await.unwrap();
        registry.invalidate("p1");
        assert_eq!(registry.len(), 0);
        registry.get_or_build("p1", build).await.unwrap();
        assert_eq!(registry.len(), 1);
    }
}
