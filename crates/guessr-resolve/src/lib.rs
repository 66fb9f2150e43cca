//! The resolver (spec 2 component 8, spec 4.6-4.10): a memoized,
//! cycle-safe walk over the IR graph that produces a `(Type, Reason,
//! Source)` for any node, consulting project registries and the
//! library-signature registry along the way.
//!
//! Every public entry point is total: there is no error path, only
//! `Type::Unknown` with an explanatory `Reason` (spec 7, "Propagation
//! policy: all errors are values").

use guessr_common::Atom;
use guessr_types::Type;

pub mod cache;
pub use cache::ResolverCache;

pub mod duck;

pub mod simplify;
pub use simplify::simplify;

pub mod resolver;
pub use resolver::Resolver;

pub mod signature;
pub use signature::build_signature;

/// Where a `Type` came from (spec 4.6: "`Result` carries `(type, reason,
/// source)`"), mirroring the spec's `source ∈ {literal, project, library,
/// inference, unknown}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Literal,
    Project,
    Library,
    Inference,
    Unknown,
}

/// The evidence behind a `Type`, rendered as the spec's `"<strategy>:
/// <evidence>"` reason string (spec 4.6, 4.7). Variant names track the
/// resolver protocol that produced them; `Display` renders the exact
/// phrases the error taxonomy in spec 7 and the duck-typing protocol in
/// spec 4.7 name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Literal,
    AssignedFrom(Box<Reason>),
    Constructor(Atom),
    ProjectMethod(Atom, Atom),
    LibraryMethod(Atom, Atom),
    UniqueMethodSet(Vec<Atom>),
    AmbiguousMethodSet(Vec<Atom>),
    UnresolvedMethods,
    TooAmbiguous,
    CircularDependency,
    ParameterWithoutTypeInfo,
    NoMatchingOverload,
    UnassignedVariable,
    UnknownNodeType,
    NonReturningBranches,
    Merged,
    SelfReceiver,
    ClassObject,
    BlockElement,
    EmptyBody,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Literal => write!(f, "literal"),
            Reason::AssignedFrom(inner) => write!(f, "assigned from: {inner}"),
            Reason::Constructor(class) => write!(f, "new: constructs {class}"),
            Reason::ProjectMethod(class, method) => write!(f, "project method: {class}#{method}"),
            Reason::LibraryMethod(class, method) => write!(f, "library signature: {class}#{method}"),
            Reason::UniqueMethodSet(names) => {
                write!(f, "inferred by unique method set {{{}}}", join(names))
            }
            Reason::AmbiguousMethodSet(names) => {
                write!(f, "inferred by method set, ambiguous between {{{}}}", join(names))
            }
            Reason::UnresolvedMethods => write!(f, "unresolved methods"),
            Reason::TooAmbiguous => write!(f, "too ambiguous"),
            Reason::CircularDependency => write!(f, "circular dependency"),
            Reason::ParameterWithoutTypeInfo => write!(f, "parameter without type info"),
            Reason::NoMatchingOverload => write!(f, "no matching overload"),
            Reason::UnassignedVariable => write!(f, "unassigned variable"),
            Reason::UnknownNodeType => write!(f, "unknown node type"),
            Reason::NonReturningBranches => write!(f, "non-returning branches"),
            Reason::Merged => write!(f, "merged branches"),
            Reason::SelfReceiver => write!(f, "self receiver"),
            Reason::ClassObject => write!(f, "class object"),
            Reason::BlockElement => write!(f, "block element"),
            Reason::EmptyBody => write!(f, "empty method body"),
        }
    }
}

fn join(names: &[Atom]) -> String {
    names.iter().map(Atom::to_string).collect::<Vec<_>>().join(", ")
}

/// One resolver result: a type plus why the resolver believes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub ty: Type,
    pub reason: Reason,
    pub source: Source,
}

impl Inference {
    #[must_use]
    pub fn unknown(reason: Reason) -> Self {
        Self {
            ty: Type::Unknown,
            reason,
            source: Source::Unknown,
        }
    }

    /// The spec's `"<strategy>: <evidence>"` display form.
    #[must_use]
    pub fn reason_text(&self) -> String {
        self.reason.to_string()
    }
}
