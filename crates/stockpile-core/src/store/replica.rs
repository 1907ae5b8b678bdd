// ── Generic reactive replica ──
//
// Local, subscription-maintained copy of one remote collection.
// Refreshes replace the whole snapshot; there is no incremental
// patching. Push-based change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A reactive replica of a single remote collection.
///
/// Uses `DashMap` for O(1) id lookups and `watch` channels for
/// push-based change notification. Every refresh swaps in a complete
/// new snapshot and bumps a version counter.
pub(crate) struct Replica<T: Clone + Send + Sync + 'static> {
    /// Secondary index: document id -> entity.
    by_id: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every refresh.
    version: watch::Sender<u64>,

    /// Full snapshot in refresh order, broadcast to subscribers.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> Replica<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the entire replica with a fresh snapshot.
    ///
    /// The snapshot keeps the given order (the caller sorts where the
    /// collection has an ordering contract, e.g. sales by date desc).
    pub(crate) fn replace_all(&self, items: Vec<(String, T)>) {
        let entities: Vec<Arc<T>> = items
            .iter()
            .map(|(_, entity)| Arc::new(entity.clone()))
            .collect();

        self.by_id.clear();
        for ((id, _), entity) in items.into_iter().zip(entities.iter()) {
            self.by_id.insert(id, Arc::clone(entity));
        }

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(entities));
        self.version.send_modify(|v| *v += 1);
    }

    /// Look up an entity by its document id.
    pub(crate) fn get(&self, id: &str) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Remove all entities (sign-out teardown).
    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.snapshot.send_modify(|snap| *snap = Arc::new(Vec::new()));
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
