//! Cycle-safe memoization for `Resolver::infer` (spec 4.8).
//!
//! Before a node's inference begins we mark it `Inferring`; if the walk
//! recurses back into the same node (an instance variable initialized from
//! a method that reads itself, two methods calling each other, ...) the
//! re-entrant call observes the sentinel and answers `Unknown` rather than
//! recursing forever. The outer call then overwrites the sentinel with the
//! real answer once it finishes, so only the cyclic leg sees `Unknown` —
//! everything else downstream of it gets the fully resolved type.

use crate::Inference;
use guessr_ir::NodeId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
enum Slot {
    Inferring,
    Resolved(Inference),
}

#[derive(Debug, Default)]
pub struct ResolverCache {
    slots: FxHashMap<NodeId, Slot>,
}

impl ResolverCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(inference)` for an already-resolved node, `Some(cyclic marker)`
    /// semantics are handled by the caller via `is_inferring`; this just
    /// returns the cached answer when one exists.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Inference> {
        match self.slots.get(&id) {
            Some(Slot::Resolved(inf)) => Some(inf),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_inferring(&self, id: NodeId) -> bool {
        matches!(self.slots.get(&id), Some(Slot::Inferring))
    }

    pub fn mark_inferring(&mut self, id: NodeId) {
        self.slots.insert(id, Slot::Inferring);
    }

    pub fn store(&mut self, id: NodeId, inference: Inference) {
        self.slots.insert(id, Slot::Resolved(inference));
    }

    /// Drops every cached answer. The runtime facade calls this whenever a
    /// file is re-ingested or removed, since a single node's resolved type
    /// can depend on any other file through a duck-typed parameter or an
    /// ancestor lookup, and there is no cheap dependency tracking to target
    /// an invalidation more narrowly than "everything" (spec 4.8).
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
