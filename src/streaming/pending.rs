//! Bookkeeping for coordinates with an in-flight generation task.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::world::ChunkPos;

/// The set of chunk coordinates currently assigned to a generation task.
///
/// Shared between the dispatching thread and the workers; every access
/// holds the lock only for the duration of the set mutation itself, never
/// across generation work.
#[derive(Clone, Default)]
pub struct PendingSet {
    inner: Arc<Mutex<HashSet<ChunkPos>>>,
}

impl PendingSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a coordinate unless it is already claimed.
    ///
    /// Returns `true` if this call inserted it — the caller then owns the
    /// claim and must see it released exactly once.
    pub fn try_claim(&self, pos: ChunkPos) -> bool {
        self.inner.lock().unwrap().insert(pos)
    }

    /// Releases a claim. Returns `true` if the coordinate was present.
    pub fn release(&self, pos: ChunkPos) -> bool {
        self.inner.lock().unwrap().remove(&pos)
    }

    /// Whether a coordinate is currently claimed.
    pub fn contains(&self, pos: &ChunkPos) -> bool {
        self.inner.lock().unwrap().contains(pos)
    }

    /// Number of claimed coordinates.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether no coordinate is claimed.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
