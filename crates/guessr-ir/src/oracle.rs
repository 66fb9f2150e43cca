//! The ancestry oracle (spec 6): a read-safe, externally supplied view of
//! class hierarchy and constant kind. The core never builds this itself —
//! it is handed one by the editor bridge / host project model — but the
//! registries, the resolver, and the simplifier all consult it, so its
//! trait lives alongside the IR it operates over.

use guessr_common::Atom;

/// What a constant name denotes, for `Constant` node resolution (spec 4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Class,
    Module,
}

/// Must be read-safe from multiple threads (spec 5, "Shared resources").
pub trait AncestryOracle: Send + Sync {
    /// `class_path`'s ancestors in method-resolution order, closest first.
    /// Implementations conventionally include `class_path` itself as the
    /// first element.
    fn ancestors(&self, class_path: &Atom) -> Vec<Atom>;

    /// Every class (and, per the Open Questions in spec 9, optionally
    /// module) that defines all of `names`, used by duck-typing inference.
    fn find_classes_defining_methods(&self, names: &[Atom]) -> Vec<Atom>;

    /// Whether `name` denotes a class, a module, or neither.
    fn constant_kind(&self, name: &Atom) -> Option<ConstantKind>;
}
