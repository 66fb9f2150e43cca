//! Everything the facade's mutex protects: the IR arena, the key index,
//! the project registries, and the resolver cache (spec 4.11). Grouped
//! into one struct so a single `Mutex<State>` is all `Engine` needs.

use guessr_ir::Arena;
use guessr_registry::{ClassVariableRegistry, InstanceVariableRegistry, KeyIndex, MethodRegistry};
use guessr_resolve::ResolverCache;

#[derive(Default)]
pub struct State {
    pub arena: Arena,
    pub key_index: KeyIndex,
    pub methods: MethodRegistry,
    pub ivars: InstanceVariableRegistry,
    pub cvars: ClassVariableRegistry,
    pub cache: ResolverCache,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry `file` contributed to the key index and the
    /// project registries (spec 4.5, 4.3). The arena itself never shrinks
    /// (spec 3.4: nodes are "freed" by becoming unreachable, not by
    /// physical removal — see `guessr_ir::arena`'s module doc).
    pub fn remove_file(&mut self, file: &guessr_common::Atom) {
        self.key_index.remove_file(file);
        self.methods.remove_file(file);
        self.ivars.remove_file(file);
        self.cvars.remove_file(file);
    }
}
