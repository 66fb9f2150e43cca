//! The IR node set (spec 3.2).
//!
//! Nodes live in an `Arena` (see `arena.rs`) and reference each other by
//! `NodeId`, never by pointer: this is the index-into-arena representation
//! the design notes call for in place of the source's pointer-aliased,
//! class-hierarchy node shapes. A node's shape is immutable once built;
//! only the `called_methods` list on `Param`/write/`BlockParamSlot` nodes
//! grows, and only while its owning file is being lowered.

use guessr_common::{Atom, Loc};
use guessr_types::{ParamKind, Type};

/// An index into an `Arena`. Stable for the lifetime of the node; never
/// reused, so a stale `NodeId` from a removed file simply fails lookup
/// rather than aliasing an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A scalar literal's decoded value, kept around for hover display and for
/// constant-folding-free evidence (not used in type inference itself,
/// beyond picking the literal's `Type`).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Bool(bool),
    Nil,
}

/// One recorded call against a duck-typed evidence node: the method name
/// plus enough of the call site's shape (positional argument count,
/// keyword-argument names) for duck typing to reject a candidate class
/// whose own signature for that name couldn't actually accept the call
/// (spec 4.7 step 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalledMethod {
    pub name: Atom,
    pub positional_args: u32,
    pub keywords: Vec<Atom>,
}

/// One IR node: a location plus a tagged-union payload.
#[derive(Debug, Clone)]
pub struct Node {
    pub loc: Loc,
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn new(loc: Loc, kind: NodeKind) -> Self {
        Self { loc, kind }
    }
}

/// Every expression/definition form the lowering produces.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Scalar, array, or hash literal. `values` holds child nodes for array
    /// elements / hash values so their dependencies stay reachable.
    Literal {
        ty: Type,
        literal_value: Option<LiteralValue>,
        values: Vec<NodeId>,
    },

    LocalWrite {
        name: Atom,
        value: NodeId,
        called_methods: Vec<CalledMethod>,
    },
    LocalRead {
        name: Atom,
        /// `None` means "assumed externally defined / unknown".
        write_node: Option<NodeId>,
    },

    InstanceVarWrite {
        name: Atom,
        class_name: Atom,
        value: NodeId,
        called_methods: Vec<CalledMethod>,
    },
    InstanceVarRead {
        name: Atom,
        class_name: Atom,
        write_node: Option<NodeId>,
    },

    ClassVarWrite {
        name: Atom,
        class_name: Atom,
        value: NodeId,
        called_methods: Vec<CalledMethod>,
    },
    ClassVarRead {
        name: Atom,
        class_name: Atom,
        write_node: Option<NodeId>,
    },

    Param {
        name: Atom,
        kind: ParamKind,
        default: Option<NodeId>,
        called_methods: Vec<CalledMethod>,
    },

    Call {
        method: Atom,
        /// `None` is implicit self.
        receiver: Option<NodeId>,
        args: Vec<NodeId>,
        block_params: Vec<NodeId>,
        block_body: Option<NodeId>,
        has_block: bool,
    },

    /// A parameter bound by a block; typed from the receiver of its
    /// owning call.
    BlockParamSlot {
        index: u32,
        call_node: NodeId,
        called_methods: Vec<CalledMethod>,
    },

    Def {
        name: Atom,
        class_name: Option<Atom>,
        params: Vec<NodeId>,
        /// `None` only when the body is empty (the method returns nil).
        return_node: Option<NodeId>,
        body_nodes: Vec<NodeId>,
        singleton: bool,
    },

    ClassModule {
        name: Atom,
        members: Vec<NodeId>,
    },

    Constant {
        name: Atom,
        dependency: Option<NodeId>,
    },

    /// The `self` receiver, possibly in a singleton (class-body) context.
    SelfNode {
        class_name: Atom,
        singleton: bool,
    },

    Return {
        value: NodeId,
    },

    /// Control-flow join (if/else, case, rescue, `||=`, `&&=`, multi-return
    /// methods). Branches are evaluated independently; the resolver unions
    /// their types.
    Merge {
        branches: Vec<NodeId>,
    },
}

impl NodeKind {
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "lit",
            NodeKind::LocalWrite { .. } => "local_write",
            NodeKind::LocalRead { .. } => "local_read",
            NodeKind::InstanceVarWrite { .. } => "ivar_write",
            NodeKind::InstanceVarRead { .. } => "ivar_read",
            NodeKind::ClassVarWrite { .. } => "cvar_write",
            NodeKind::ClassVarRead { .. } => "cvar_read",
            NodeKind::Param { .. } => "param",
            NodeKind::Call { .. } => "call",
            NodeKind::BlockParamSlot { .. } => "bparam",
            NodeKind::Def { .. } => "def",
            NodeKind::ClassModule { .. } => "class",
            NodeKind::Constant { .. } => "const",
            NodeKind::SelfNode { .. } => "self",
            NodeKind::Return { .. } => "return",
            NodeKind::Merge { .. } => "merge",
        }
    }
}
