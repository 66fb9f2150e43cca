//! The `Type` value and the parameter shape used by `MethodSignature`.

use guessr_common::Atom;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The kind of a parameter in a `MethodSignature`, or on an IR `Param` node
/// (see `guessr_ir::ParamKind`, which this mirrors for display purposes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    KeywordRequired,
    KeywordOptional,
    KeywordRest,
    Block,
    Forwarding,
}

/// One parameter of a `MethodSignature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: Atom,
    pub kind: ParamKind,
    pub ty: Type,
}

impl Param {
    #[must_use]
    pub fn new(name: Atom, kind: ParamKind, ty: Type) -> Self {
        Self { name, kind, ty }
    }
}

/// A type value in the engine's algebra (spec 3.1). All variants are
/// structural values: two `Type`s are equal when structurally equal, never
/// by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// "We could not decide."
    Unknown,
    /// "Decidable in principle, not yet computed" — used for lazy externals.
    Unguessed,
    /// Instance of a named (fully-qualified, dotted) class.
    ClassInstance(Atom),
    /// The class object itself, e.g. the value `User` refers to.
    Singleton(Atom),
    /// Homogeneous sequence.
    ArrayType(Box<Type>),
    /// Heterogeneous fixed-length sequence, up to `MAX_TUPLE_ARITY` positions.
    TupleType(Vec<Type>),
    /// Mapping with a uniform key and value type.
    HashType(Box<Type>, Box<Type>),
    /// Mapping from literal symbol keys to per-key types. Preserves
    /// insertion order for display but compares as an order-independent map.
    HashShape(IndexMap<Atom, Type>),
    /// Range over an element type.
    RangeType(Box<Type>),
    /// Set of >= 2 distinct members; flattened (never nested) and
    /// order-independent. Construct only via `union()`.
    Union(Vec<Type>),
    /// Placeholder for a library-signature type parameter, resolved by
    /// substitution during overload resolution.
    TypeVariable(Atom),
    /// "The receiver type at the call site"; substituted during resolution.
    SelfType,
    /// The `...`-style argument-forwarding parameter.
    ForwardingArgs,
    /// First-class callable signature.
    MethodSignature(Vec<Param>, Box<Type>),
}

impl Type {
    #[must_use]
    pub fn array(element: Type) -> Type {
        Type::ArrayType(Box::new(element))
    }

    #[must_use]
    pub fn hash(key: Type, value: Type) -> Type {
        Type::HashType(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub fn range(element: Type) -> Type {
        Type::RangeType(Box::new(element))
    }

    #[must_use]
    pub fn class_instance(name: impl Into<Atom>) -> Type {
        Type::ClassInstance(name.into())
    }

    #[must_use]
    pub fn singleton(name: impl Into<Atom>) -> Type {
        Type::Singleton(name.into())
    }

    /// A fixed-length sequence, widening to `ArrayType(Union(elems))` past
    /// `MAX_TUPLE_ARITY` positions (spec 3.1, "Invariants").
    #[must_use]
    pub fn tuple(elements: Vec<Type>) -> Type {
        if elements.len() > guessr_common::limits::MAX_TUPLE_ARITY {
            Type::array(crate::union::union(elements))
        } else {
            Type::TupleType(elements)
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }
}
