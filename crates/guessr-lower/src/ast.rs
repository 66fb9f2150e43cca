//! The parsed-AST contract the lowering consumes (spec 6, "External
//! Interfaces" -> "Parsed AST"). The real host parser is out of scope for
//! this engine; this module is the shape a collaborator's parser output
//! must be adapted to before `lower_program` can walk it.
//!
//! Arena-indexed, exactly like the IR itself: an `ExprId` is an index into
//! an `AstArena`, never a pointer, so the tree can describe arbitrarily
//! deep nesting (and, via `ExprId`, even forward references) without
//! lifetime gymnastics.

use guessr_common::Loc;
use guessr_types::ParamKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone)]
pub struct Expr {
    pub loc: Loc,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum HashKey {
    Symbol(String),
    Dynamic(ExprId),
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<ExprId>,
    /// Nested destructuring targets flatten to their leaf names during
    /// lowering (spec 4.2, "Method def"); a non-destructured parameter
    /// simply has no children here.
    pub destructure: Vec<ParamDef>,
}

impl ParamDef {
    #[must_use]
    pub fn simple(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            destructure: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AssignTarget {
    Local(String),
    IVar(String),
    CVar(String),
    Const(String),
    /// `a[k] = v`
    Index { receiver: ExprId, index: ExprId },
}

#[derive(Debug, Clone)]
pub enum OpAssignKind {
    /// `x ||= e`
    OrOr,
    /// `x &&= e`
    AndAnd,
    /// `x += e`, `x -= e`, ... the binary method name (e.g. `"+"`).
    Binary(String),
}

#[derive(Debug, Clone)]
pub struct BlockLiteral {
    pub params: Vec<String>,
    pub body: Vec<ExprId>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    SymbolLiteral(String),
    BoolLiteral(bool),
    NilLiteral,
    ArrayLiteral(Vec<ExprId>),
    HashLiteral(Vec<(HashKey, ExprId)>),

    Ident(String),
    IVarRead(String),
    CVarRead(String),
    ConstRead(String),
    SelfExpr,

    Assign { target: AssignTarget, value: ExprId },
    OpAssign { target: AssignTarget, op: OpAssignKind, value: ExprId },

    If { cond: ExprId, then_branch: Vec<ExprId>, else_branch: Option<Vec<ExprId>> },
    Case {
        subject: Option<ExprId>,
        whens: Vec<(Vec<ExprId>, Vec<ExprId>)>,
        else_branch: Option<Vec<ExprId>>,
    },

    MethodCall {
        receiver: Option<ExprId>,
        method: String,
        args: Vec<ExprId>,
        block: Option<BlockLiteral>,
    },

    MethodDef {
        name: String,
        params: Vec<ParamDef>,
        body: Vec<ExprId>,
        singleton: bool,
    },
    ClassDef {
        name: String,
        body: Vec<ExprId>,
    },
    ModuleDef {
        name: String,
        body: Vec<ExprId>,
    },

    Return(Option<ExprId>),

    BeginRescue {
        body: Vec<ExprId>,
        rescues: Vec<Vec<ExprId>>,
        else_branch: Option<Vec<ExprId>>,
        ensure: Option<Vec<ExprId>>,
    },
}

/// Owns every `Expr` parsed from one file. Built by (or adapted from) the
/// host parser; consumed, never mutated, by the lowering.
#[derive(Debug, Default)]
pub struct AstArena {
    exprs: Vec<Expr>,
}

impl AstArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, loc: Loc, kind: ExprKind) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).expect("ast arena overflowed u32"));
        self.exprs.push(Expr { loc, kind });
        id
    }

    #[must_use]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }
}

/// A whole file: its arena plus the top-level statement sequence.
#[derive(Debug, Default)]
pub struct Program {
    pub arena: AstArena,
    pub body: Vec<ExprId>,
}
