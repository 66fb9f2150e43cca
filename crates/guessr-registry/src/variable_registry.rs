//! `InstanceVariableRegistry` / `ClassVariableRegistry` (spec 4.3):
//! `(class_path, var_name) -> write_node?`. Instance-variable lookup walks
//! ancestors (a subclass can read an ivar only ever written by a
//! superclass method); class-variable lookup does not, since Ruby-style
//! class variables are shared by identity across the hierarchy rather than
//! inherited per-class.

use guessr_common::Atom;
use guessr_ir::{AncestryOracle, NodeId};
use rustc_hash::FxHashMap;

type Key = (Atom, Atom);

#[derive(Debug, Default)]
struct VariableTable {
    vars: FxHashMap<Key, NodeId>,
    by_file: FxHashMap<Atom, Vec<Key>>,
}

impl VariableTable {
    fn register(&mut self, file: Atom, class_path: Atom, var_name: Atom, write_node: NodeId) {
        let key = (class_path, var_name);
        self.vars.insert(key.clone(), write_node);
        self.by_file.entry(file).or_default().push(key);
    }

    fn get(&self, class_path: &Atom, var_name: &Atom) -> Option<NodeId> {
        self.vars.get(&(class_path.clone(), var_name.clone())).copied()
    }

    fn remove_file(&mut self, file: &Atom) {
        if let Some(keys) = self.by_file.remove(file) {
            for key in keys {
                self.vars.remove(&key);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InstanceVariableRegistry(VariableTable);

impl InstanceVariableRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, file: Atom, class_path: Atom, var_name: Atom, write_node: NodeId) {
        self.0.register(file, class_path, var_name, write_node);
    }

    /// Walks ancestors in method-resolution order; first hit wins.
    #[must_use]
    pub fn lookup(
        &self,
        oracle: &dyn AncestryOracle,
        class_path: &Atom,
        var_name: &Atom,
    ) -> Option<NodeId> {
        for ancestor in oracle.ancestors(class_path) {
            if let Some(id) = self.0.get(&ancestor, var_name) {
                return Some(id);
            }
        }
        None
    }

    pub fn remove_file(&mut self, file: &Atom) {
        self.0.remove_file(file);
    }
}

#[derive(Debug, Default)]
pub struct ClassVariableRegistry(VariableTable);

impl ClassVariableRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, file: Atom, class_path: Atom, var_name: Atom, write_node: NodeId) {
        self.0.register(file, class_path, var_name, write_node);
    }

    /// Does not walk ancestors.
    #[must_use]
    pub fn lookup(&self, class_path: &Atom, var_name: &Atom) -> Option<NodeId> {
        self.0.get(class_path, var_name)
    }

    pub fn remove_file(&mut self, file: &Atom) {
        self.0.remove_file(file);
    }
}
