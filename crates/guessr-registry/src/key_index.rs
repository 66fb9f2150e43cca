//! The location / key index (spec 4.5): per-file append + per-file
//! remove; key -> node lookup. Readers and writers never overlap — the
//! runtime facade (`guessr-core`) serializes access with a mutex.

use guessr_common::Atom;
use guessr_ir::{NodeId, NodeKey};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct KeyIndex {
    by_key: FxHashMap<NodeKey, NodeId>,
    by_file: FxHashMap<Atom, Vec<NodeKey>>,
}

impl KeyIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: Atom, key: NodeKey, node: NodeId) {
        self.by_key.insert(key.clone(), node);
        self.by_file.entry(file).or_default().push(key);
    }

    /// Delete every key `file` contributed. O(entries in that file).
    pub fn remove_file(&mut self, file: &Atom) {
        if let Some(keys) = self.by_file.remove(file) {
            for key in keys {
                self.by_key.remove(&key);
            }
        }
    }

    #[must_use]
    pub fn find_by_key(&self, key: &NodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    #[must_use]
    pub fn nodes_for_file(&self, file: &Atom) -> Vec<NodeId> {
        self.by_file
            .get(file)
            .map(|keys| keys.iter().filter_map(|k| self.by_key.get(k).copied()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_ir::Scope;

    #[test]
    fn remove_file_only_affects_its_own_keys() {
        let mut idx = KeyIndex::new();
        let file_a: Atom = "a.rb".into();
        let file_b: Atom = "b.rb".into();
        let key_a = NodeKey::build(&Scope::TopLevel, "local_write", "x", 1);
        let key_b = NodeKey::build(&Scope::TopLevel, "local_write", "y", 2);
        idx.add(file_a.clone(), key_a.clone(), NodeId(0));
        idx.add(file_b.clone(), key_b.clone(), NodeId(1));

        idx.remove_file(&file_a);

        assert!(idx.find_by_key(&key_a).is_none());
        assert_eq!(idx.find_by_key(&key_b), Some(NodeId(1)));
        assert!(idx.nodes_for_file(&file_a).is_empty());
        assert_eq!(idx.nodes_for_file(&file_b), vec![NodeId(1)]);
    }
}
