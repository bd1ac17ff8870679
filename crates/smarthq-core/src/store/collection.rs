// ── Generic reactive entity collection ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification via a `watch` channel carrying the full snapshot.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// A concurrent, reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) lookups and a `watch` channel for the
/// snapshot that readers receive. Every mutation rebuilds the snapshot,
/// ordered by key.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns the stored entity and
    /// whether the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> (Arc<T>, bool) {
        let entity = Arc::new(entity);
        let is_new = self.by_key.insert(key, Arc::clone(&entity)).is_none();
        self.rebuild_snapshot();
        (entity, is_new)
    }

    /// Build the next value from the current one (if any) and store it.
    ///
    /// The shard stays locked while `build` runs, so concurrent writers
    /// to the same key are serialized. Returns the stored entity and
    /// whether the key was new.
    pub(crate) fn upsert_with(
        &self,
        key: String,
        build: impl FnOnce(Option<&T>) -> T,
    ) -> (Arc<T>, bool) {
        let (entity, is_new) = match self.by_key.entry(key) {
            Entry::Occupied(mut slot) => {
                let next = Arc::new(build(Some(&**slot.get())));
                slot.insert(Arc::clone(&next));
                (next, false)
            }
            Entry::Vacant(slot) => {
                let next = Arc::new(build(None));
                slot.insert(Arc::clone(&next));
                (next, true)
            }
        };
        self.rebuild_snapshot();
        (entity, is_new)
    }

    /// Rewrite an existing entity. Returns `None` (and changes nothing)
    /// if the key is absent.
    pub(crate) fn update(&self, key: &str, edit: impl FnOnce(&T) -> T) -> Option<Arc<T>> {
        let updated = {
            let mut slot = self.by_key.get_mut(key)?;
            let next = Arc::new(edit(&**slot.value()));
            *slot.value_mut() = Arc::clone(&next);
            next
        };
        self.rebuild_snapshot();
        Some(updated)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a key-ordered vec and broadcast it.
    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(String, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
