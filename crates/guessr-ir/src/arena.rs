//! Node storage.
//!
//! `Arena` is append-only: nodes are never mutated in shape after
//! construction (only a write/param node's `called_methods` grows, and only
//! while its file is being lowered) and never physically removed. Removal
//! of a file's nodes happens one layer up, in the key index and registries,
//! which simply stop referencing the `NodeId`s a removed file contributed;
//! the arena slots become unreachable garbage rather than being reclaimed.
//! This mirrors the design notes' guidance to use arena indices with
//! back-edges instead of true pointer cycles.

use crate::node::{CalledMethod, Node, NodeId, NodeKind};

#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena overflowed u32"));
        self.nodes.push(node);
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `method` to the called-methods list owned by `id`, unless an
    /// equal usage (same name, arity, keywords) is already present (spec
    /// 4.2: "append... unless already present"). No-op for node kinds that
    /// don't own a called-methods list.
    pub fn record_called_method(&mut self, id: NodeId, method: CalledMethod) {
        let called = match &mut self.get_mut(id).kind {
            NodeKind::LocalWrite { called_methods, .. }
            | NodeKind::InstanceVarWrite { called_methods, .. }
            | NodeKind::ClassVarWrite { called_methods, .. }
            | NodeKind::Param { called_methods, .. }
            | NodeKind::BlockParamSlot { called_methods, .. } => called_methods,
            _ => return,
        };
        if !called.contains(&method) {
            called.push(method);
        }
    }

    /// The called-methods list for a node that owns one, or `&[]` for node
    /// kinds that don't (spec design notes: reads carry a back-reference
    /// rather than their own list).
    #[must_use]
    pub fn called_methods(&self, id: NodeId) -> &[CalledMethod] {
        match &self.get(id).kind {
            NodeKind::LocalWrite { called_methods, .. }
            | NodeKind::InstanceVarWrite { called_methods, .. }
            | NodeKind::ClassVarWrite { called_methods, .. }
            | NodeKind::Param { called_methods, .. }
            | NodeKind::BlockParamSlot { called_methods, .. } => called_methods,
            _ => &[],
        }
    }
}
