//! The lowering `Context`: the scope chain, the current class/method
//! path, and handles onto the IR arena, key index, and registries that
//! get populated inline as the walk proceeds (spec 4.2).

use guessr_common::{Atom, Interner};
use guessr_ir::{Arena, NodeId, NodeKey, Scope};
use guessr_registry::{ClassVariableRegistry, InstanceVariableRegistry, KeyIndex, MethodRegistry};
use rustc_hash::FxHashMap;

/// A single scope's local variable table: name -> the write node that last
/// bound it in this scope. Forked (cloned) when entering `if`/`case`
/// branches or a block/method body so branch-local shadowing doesn't leak.
#[derive(Debug, Clone, Default)]
pub struct LocalTable {
    vars: FxHashMap<Atom, NodeId>,
}

impl LocalTable {
    pub fn bind(&mut self, name: Atom, node: NodeId) {
        self.vars.insert(name, node);
    }

    #[must_use]
    pub fn get(&self, name: &Atom) -> Option<NodeId> {
        self.vars.get(name).copied()
    }

    #[must_use]
    pub fn names(&self) -> Vec<Atom> {
        self.vars.keys().cloned().collect()
    }
}

/// The lowering's scope stack: `top_level -> class -> method -> block ...`.
/// Reads walk the chain innermost-first; a miss at every level means the
/// name is assumed externally defined.
#[derive(Debug, Default)]
pub struct ScopeChain {
    tables: Vec<LocalTable>,
}

impl ScopeChain {
    pub fn push(&mut self, table: LocalTable) {
        self.tables.push(table);
    }

    pub fn push_new(&mut self) {
        self.tables.push(LocalTable::default());
    }

    pub fn pop(&mut self) -> LocalTable {
        self.tables.pop().expect("popped an empty scope chain")
    }

    #[must_use]
    pub fn lookup(&self, name: &Atom) -> Option<NodeId> {
        self.tables.iter().rev().find_map(|t| t.get(name))
    }

    /// Bind in the innermost scope (shadowing any outer entry of the same
    /// name, per spec 4.2 "Assignment").
    pub fn bind(&mut self, name: Atom, node: NodeId) {
        self.tables
            .last_mut()
            .expect("bind with an empty scope chain")
            .bind(name, node);
    }

    #[must_use]
    pub fn top(&self) -> &LocalTable {
        self.tables.last().expect("empty scope chain")
    }
}

/// A `Class`/`Def` frame, tracked so nested definitions can compute their
/// node-key scope (spec 3.3) and so method defs know their owning class.
#[derive(Debug, Clone)]
pub enum PathFrame {
    Class(Atom),
    Method(Atom),
}

/// Shared, side-effecting state threaded through one file's lowering walk.
pub struct Context<'a> {
    pub file: Atom,
    pub interner: &'a Interner,
    pub arena: &'a mut Arena,
    pub key_index: &'a mut KeyIndex,
    pub methods: &'a mut MethodRegistry,
    pub ivars: &'a mut InstanceVariableRegistry,
    pub cvars: &'a mut ClassVariableRegistry,
    pub scopes: ScopeChain,
    class_path: Vec<Atom>,
    method_name: Option<Atom>,
    in_singleton: bool,
}

impl<'a> Context<'a> {
    pub fn new(
        file: Atom,
        interner: &'a Interner,
        arena: &'a mut Arena,
        key_index: &'a mut KeyIndex,
        methods: &'a mut MethodRegistry,
        ivars: &'a mut InstanceVariableRegistry,
        cvars: &'a mut ClassVariableRegistry,
    ) -> Self {
        let mut scopes = ScopeChain::default();
        scopes.push_new();
        Self {
            file,
            interner,
            arena,
            key_index,
            methods,
            ivars,
            cvars,
            scopes,
            class_path: Vec::new(),
            method_name: None,
            in_singleton: false,
        }
    }

    pub fn intern(&self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    /// The fully-qualified class path joined with `::`, or `None` at the
    /// top level.
    #[must_use]
    pub fn current_class_path(&self) -> Option<Atom> {
        if self.class_path.is_empty() {
            None
        } else {
            let joined = self
                .class_path
                .iter()
                .map(Atom::as_str)
                .collect::<Vec<_>>()
                .join("::");
            Some(self.intern(&joined))
        }
    }

    #[must_use]
    pub fn current_scope(&self) -> Scope {
        match (self.current_class_path(), &self.method_name) {
            (Some(class), Some(method)) => Scope::Method(class, method.clone()),
            (Some(class), None) => Scope::Class(class),
            (None, _) => Scope::TopLevel,
        }
    }

    pub fn push_class(&mut self, name: Atom) {
        self.class_path.push(name);
    }

    pub fn pop_class(&mut self) {
        self.class_path.pop();
    }

    /// Pushes a method frame, returning the frame being shadowed so the
    /// caller can restore it with `exit_method` once the body is lowered.
    pub fn enter_method(&mut self, name: Atom, singleton: bool) -> (Option<Atom>, bool) {
        let previous = (self.method_name.replace(name), self.in_singleton);
        self.in_singleton = singleton;
        previous
    }

    pub fn exit_method(&mut self, previous: (Option<Atom>, bool)) {
        self.method_name = previous.0;
        self.in_singleton = previous.1;
    }

    /// Whether the innermost enclosing method def is a singleton
    /// (`def self.foo`) definition, per spec 4.6's `Self` rule.
    #[must_use]
    pub fn in_singleton_method(&self) -> bool {
        self.in_singleton
    }

    /// Register a node in the global arena and the key index in one step
    /// (spec 4.2: "insertion into the key index happens inline").
    pub fn record(&mut self, tag: &str, discriminator: &str, offset: u32, node: NodeId) {
        let key = NodeKey::build(&self.current_scope(), tag, discriminator, offset);
        self.key_index.add(self.file.clone(), key, node);
    }
}
