//! The type simplifier (spec 4.9): bounds how many members of a `Union`
//! get surfaced to a caller (a hover tooltip, a generated signature, ...),
//! collapsing descendants into an already-listed ancestor first.
//!
//! This is a *display-oriented* trim, not a change to the type's internal,
//! structurally-exact value: `union()` in `guessr-types` already computes
//! the precise, deduplicated set of possibilities, and callers that need
//! that precision (e.g. overload resolution) use it directly rather than
//! going through `simplify`.

use guessr_common::limits::UNION_DISPLAY_CAP;
use guessr_ir::AncestryOracle;
use guessr_types::Type;

/// Simplifies a `Union` for display:
///
/// 1. Remove duplicates (defensive; `union()` already guarantees this).
/// 2. For every pair `(a, b)` where both are `ClassInstance` and `a` is an
///    ancestor of `b`, drop `b` — but only when `a` itself is present in
///    the union (siblings with a common, unlisted ancestor are untouched).
/// 3. Unwrap a single-member result.
/// 4. If more than `UNION_DISPLAY_CAP` members remain, collapse to
///    `Unknown` to avoid a noisy display.
///
/// Every other `Type` variant passes through unchanged, since only `Union`
/// can be unboundedly wide.
#[must_use]
pub fn simplify(ty: Type, oracle: &dyn AncestryOracle) -> Type {
    match ty {
        Type::Union(members) => {
            let kept = drop_listed_descendants(members, oracle);
            match kept.len() {
                0 => Type::Unknown,
                1 => kept.into_iter().next().expect("checked len == 1"),
                n if n > UNION_DISPLAY_CAP => Type::Unknown,
                _ => Type::Union(kept),
            }
        }
        other => other,
    }
}

/// Drops any `ClassInstance(b)` for which some other member `ClassInstance(a)`
/// (`a != b`) is one of `b`'s ancestors.
fn drop_listed_descendants(members: Vec<Type>, oracle: &dyn AncestryOracle) -> Vec<Type> {
    let present: Vec<&guessr_common::Atom> = members
        .iter()
        .filter_map(|m| match m {
            Type::ClassInstance(name) => Some(name),
            _ => None,
        })
        .collect();

    members
        .into_iter()
        .filter(|member| {
            let Type::ClassInstance(name) = member else {
                return true;
            };
            !oracle
                .ancestors(name)
                .iter()
                .any(|ancestor| ancestor != name && present.iter().any(|p| *p == ancestor))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_common::Atom;
    use guessr_ir::ConstantKind;

    /// `Dog < Animal < Object`; `Cat < Animal < Object`.
    struct LinearOracle;
    impl AncestryOracle for LinearOracle {
        fn ancestors(&self, class_path: &Atom) -> Vec<Atom> {
            match class_path.as_str() {
                "Dog" => vec!["Dog".into(), "Animal".into(), "Object".into()],
                "Cat" => vec!["Cat".into(), "Animal".into(), "Object".into()],
                _ => vec![class_path.clone(), "Object".into()],
            }
        }
        fn find_classes_defining_methods(&self, _names: &[Atom]) -> Vec<Atom> {
            vec![]
        }
        fn constant_kind(&self, _name: &Atom) -> Option<ConstantKind> {
            None
        }
    }

    #[test]
    fn small_union_is_untouched() {
        let oracle = LinearOracle;
        let t = guessr_types::union([Type::class_instance("Dog"), Type::class_instance("Cat")]);
        assert_eq!(simplify(t.clone(), &oracle), t);
    }

    #[test]
    fn descendant_collapses_into_listed_ancestor() {
        let oracle = LinearOracle;
        let t = guessr_types::union([Type::class_instance("Dog"), Type::class_instance("Animal")]);
        assert_eq!(simplify(t, &oracle), Type::class_instance("Animal"));
    }

    #[test]
    fn siblings_without_the_ancestor_listed_are_preserved() {
        let oracle = LinearOracle;
        let t = guessr_types::union([Type::class_instance("Dog"), Type::class_instance("Cat")]);
        // Both share Animal as an ancestor, but Animal itself isn't a member,
        // so neither is dropped.
        assert_eq!(simplify(t.clone(), &oracle), t);
    }

    #[test]
    fn oversized_union_collapses_to_unknown() {
        let oracle = LinearOracle;
        let t = guessr_types::union([
            Type::class_instance("A"),
            Type::class_instance("B"),
            Type::class_instance("C"),
            Type::class_instance("D"),
            Type::class_instance("E"),
        ]);
        assert_eq!(simplify(t, &oracle), Type::Unknown);
    }

    #[test]
    fn non_union_passes_through() {
        let oracle = LinearOracle;
        assert_eq!(simplify(Type::Unknown, &oracle), Type::Unknown);
        assert_eq!(simplify(Type::class_instance("A"), &oracle), Type::class_instance("A"));
    }
}
