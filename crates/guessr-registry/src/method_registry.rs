//! `MethodRegistry` (spec 4.3): project-defined methods, indexed by owning
//! class, with ancestry-aware lookup.

use guessr_common::Atom;
use guessr_ir::{AncestryOracle, NodeId};
use rustc_hash::FxHashMap;

type Key = (Atom, Atom);

#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: FxHashMap<Key, NodeId>,
    by_file: FxHashMap<Atom, Vec<Key>>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, file: Atom, class_path: Atom, method_name: Atom, def_node: NodeId) {
        let key = (class_path, method_name);
        self.methods.insert(key.clone(), def_node);
        self.by_file.entry(file).or_default().push(key);
    }

    /// Walk `class_path`'s ancestors in method-resolution order; first hit
    /// wins.
    #[must_use]
    pub fn lookup(
        &self,
        oracle: &dyn AncestryOracle,
        class_path: &Atom,
        method_name: &Atom,
    ) -> Option<NodeId> {
        for ancestor in oracle.ancestors(class_path) {
            if let Some(id) = self.methods.get(&(ancestor, method_name.clone())) {
                return Some(*id);
            }
        }
        None
    }

    /// Every method name registered directly on `class_path` (no ancestry
    /// walk — used by debug UIs, not by resolution).
    #[must_use]
    pub fn methods_for_class(&self, class_path: &Atom) -> Vec<Atom> {
        self.methods
            .keys()
            .filter(|(c, _)| c == class_path)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// All `(class_path, method_name)` pairs whose method name starts with
    /// `prefix`, for debug UIs.
    #[must_use]
    pub fn search(&self, prefix: &str) -> Vec<(Atom, Atom)> {
        self.methods
            .keys()
            .filter(|(_, m)| m.as_str().starts_with(prefix))
            .cloned()
            .collect()
    }

    /// O(entries in that file).
    pub fn remove_file(&mut self, file: &Atom) {
        if let Some(keys) = self.by_file.remove(file) {
            for key in keys {
                self.methods.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LinearOracle;
    impl AncestryOracle for LinearOracle {
        fn ancestors(&self, class_path: &Atom) -> Vec<Atom> {
            if class_path.as_str() == "Dog" {
                vec!["Dog".into(), "Animal".into(), "Object".into()]
            } else {
                vec![class_path.clone(), "Object".into()]
            }
        }
        fn find_classes_defining_methods(&self, _names: &[Atom]) -> Vec<Atom> {
            vec![]
        }
        fn constant_kind(&self, _name: &Atom) -> Option<guessr_ir::ConstantKind> {
            None
        }
    }

    #[test]
    fn lookup_honors_ancestry() {
        let mut reg = MethodRegistry::new();
        reg.register("a.rb".into(), "Animal".into(), "speak".into(), NodeId(7));
        let oracle = LinearOracle;
        let found = reg.lookup(&oracle, &"Dog".into(), &"speak".into());
        assert_eq!(found, Some(NodeId(7)));
    }

    #[test]
    fn lookup_prefers_closer_ancestor() {
        let mut reg = MethodRegistry::new();
        reg.register("a.rb".into(), "Animal".into(), "speak".into(), NodeId(1));
        reg.register("a.rb".into(), "Dog".into(), "speak".into(), NodeId(2));
        let oracle = LinearOracle;
        let found = reg.lookup(&oracle, &"Dog".into(), &"speak".into());
        assert_eq!(found, Some(NodeId(2)));
    }

    #[test]
    fn remove_file_drops_only_its_entries() {
        let mut reg = MethodRegistry::new();
        reg.register("a.rb".into(), "Dog".into(), "speak".into(), NodeId(1));
        reg.register("b.rb".into(), "Cat".into(), "meow".into(), NodeId(2));
        reg.remove_file(&"a.rb".into());
        let oracle = LinearOracle;
        assert!(reg.lookup(&oracle, &"Dog".into(), &"speak".into()).is_none());
        assert!(reg.lookup(&oracle, &"Cat".into(), &"meow".into()).is_some());
    }
}
