//! Union normalization (spec 4.1).
//!
//! `union(ts)` flattens nested unions, drops duplicates, collapses a
//! single-element result to that element, and returns `Unknown` iff every
//! input was `Unknown`. Construction is total: there is no error path.

use crate::ty::Type;

/// A deterministic, total order used only to canonicalize union members so
/// that two unions built from differently-ordered inputs compare equal.
/// Not exposed as a public `Ord` impl: `HashShape` carries an `IndexMap`,
/// which has no natural total order, so we fall back to its `Debug` form.
fn sort_key(t: &Type) -> String {
    format!("{t:?}")
}

/// Normalize a set of types into the union algebra's canonical form.
#[must_use]
pub fn union(ts: impl IntoIterator<Item = Type>) -> Type {
    let mut flat = Vec::new();
    for t in ts {
        flatten_into(t, &mut flat);
    }

    if flat.is_empty() {
        return Type::Unknown;
    }

    // All-Unknown collapses to the singleton Unknown; Unknown mixed with a
    // concrete type preserves both, per the "Invariants" paragraph of 3.1.
    if flat.iter().all(Type::is_unknown) {
        return Type::Unknown;
    }

    flat.sort_by_key(sort_key);
    flat.dedup_by_key(|t| sort_key(t));

    if flat.len() == 1 {
        flat.into_iter().next().expect("checked len == 1")
    } else {
        Type::Union(flat)
    }
}

fn flatten_into(t: Type, out: &mut Vec<Type>) {
    match t {
        Type::Union(members) => {
            for m in members {
                flatten_into(m, out);
            }
        }
        other => out.push(other),
    }
}

/// Structural, order-independent equality (spec 4.1 `equal(a,b)`).
///
/// This is exactly `Type`'s derived `PartialEq` as long as both sides were
/// produced by `union()`: canonicalization guarantees that two equal sets
/// of members serialize to the same `Vec` order. Exposed as a free function
/// to match the spec's named operation.
#[must_use]
pub fn equal(a: &Type, b: &Type) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;

    #[test]
    fn union_is_order_independent() {
        let a = union([Type::class_instance("A"), Type::class_instance("B")]);
        let b = union([Type::class_instance("B"), Type::class_instance("A")]);
        assert_eq!(a, b);
    }

    #[test]
    fn single_member_collapses() {
        let t = union([Type::class_instance("A")]);
        assert_eq!(t, Type::class_instance("A"));
    }

    #[test]
    fn all_unknown_collapses_to_unknown() {
        let t = union([Type::Unknown, Type::Unknown]);
        assert_eq!(t, Type::Unknown);
    }

    #[test]
    fn unknown_mixed_with_concrete_preserves_both() {
        let t = union([Type::Unknown, Type::class_instance("A")]);
        match &t {
            Type::Union(members) => {
                assert_eq!(members.len(), 2);
                assert!(members.contains(&Type::Unknown));
                assert!(members.contains(&Type::class_instance("A")));
            }
            other => panic!("expected Union, got {other:?}"),
        }
    }

    #[test]
    fn nested_unions_flatten() {
        let inner = union([Type::class_instance("A"), Type::class_instance("B")]);
        let t = union([inner, Type::class_instance("C")]);
        match &t {
            Type::Union(members) => assert_eq!(members.len(), 3),
            other => panic!("expected Union, got {other:?}"),
        }
    }

    #[test]
    fn duplicates_drop() {
        let t = union([Type::class_instance("A"), Type::class_instance("A")]);
        assert_eq!(t, Type::class_instance("A"));
    }
}
