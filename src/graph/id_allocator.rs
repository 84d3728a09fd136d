//! Dense, reusable node identifiers.
//!
//! Ids handed out by [`IdAllocator`] fill released gaps before growing, so a
//! network of N nodes normally uses exactly the ids `1..=N`. The coupling
//! matrix orders its rows by id, which keeps matrix indices predictable.

use crate::types::NodeId;
use std::collections::BTreeSet;

/// Tracks which node ids are in use and which released ids can be reused.
///
/// Invariant: `used ∩ available = ∅`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    used: BTreeSet<NodeId>,
    available: BTreeSet<NodeId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an allocator for an existing set of ids (e.g. a loaded file).
    ///
    /// Every id is registered with [`add`](Self::add); ids missing below the
    /// maximum become available so they are reused first.
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut allocator = Self::new();
        for id in ids {
            allocator.add(id);
        }
        if let Some(max) = allocator.max_id() {
            for candidate in 1..max.get() {
                let candidate = NodeId(candidate);
                if !allocator.used.contains(&candidate) {
                    allocator.available.insert(candidate);
                }
            }
        }
        allocator
    }

    /// Smallest id that keeps the id space gap-filling. Does not reserve it.
    pub fn next_id(&self) -> NodeId {
        match self.available.first() {
            Some(&id) => id,
            None => NodeId(self.used.len() as u32 + 1),
        }
    }

    /// Mark `id` as used
    pub fn add(&mut self, id: NodeId) {
        self.available.remove(&id);
        self.used.insert(id);
    }

    /// Release a used id for reuse. Unknown ids are ignored.
    pub fn release(&mut self, id: NodeId) {
        if self.used.remove(&id) {
            self.available.insert(id);
        }
    }

    /// Whether two ids can exchange owners: both must be in use.
    ///
    /// Only checks the precondition; the caller reassigns the nodes.
    pub fn swap(&self, a: NodeId, b: NodeId) -> bool {
        self.used.contains(&a) && self.used.contains(&b)
    }

    /// Whether `candidate` can be assigned without leaving a gap past the
    /// current maximum.
    pub fn is_valid(&self, candidate: NodeId) -> bool {
        candidate.is_positive() && candidate.get() <= self.max_valid()
    }

    /// Largest id [`is_valid`](Self::is_valid) accepts
    pub fn max_valid(&self) -> u32 {
        self.max_id().map_or(0, NodeId::get) + 1
    }

    pub fn max_id(&self) -> Option<NodeId> {
        self.used.last().copied()
    }

    pub fn is_used(&self, id: NodeId) -> bool {
        self.used.contains(&id)
    }

    pub fn used(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.used.iter().copied()
    }

    pub fn available(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.available.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
        self.available.clear();
    }
}
