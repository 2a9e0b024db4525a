use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

use crate::index::Bm25Index;

enum Slot {
    Building(Arc<Notify>),
    Ready(Arc<Bm25Index>),
}

/// Lazily builds and caches one `Bm25Index` per project, deduplicating
/// concurrent builds the same way the dense index registry does.
#[derive(Default)]
pub struct Bm25Registry {
    slots: DashMap<String, Slot>,
}

impl Bm25Registry {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    pub async fn get_or_build<F, Fut>(&self, project_id: &str, builder: F) -> Arc<Bm25Index>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Bm25Index>,
    {
        loop {
            let notify = match self.slots.get(project_id) {
                Some(entry) => match entry.value() {
                    Slot::Ready(index) => return Arc::clone(index),
                    Slot::Building(notify) => Some(Arc::clone(notify)),
                },
                None => None,
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

            let index = Arc::new(builder().await);
            self.slots
                .insert(project_id.to_string(), Slot::Ready(Arc::clone(&index)));
            notify.notify_waiters();
            return index;
        }
    }

    pub fn invalidate(&self, project_id: &str) {
        self.slots.remove(project_id);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
