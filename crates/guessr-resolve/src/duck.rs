//! Duck-typing / method-uniqueness inference (spec 4.7).
//!
//! A parameter, block parameter, or other untyped evidence node that is
//! never assigned a concrete literal but does have calls recorded against
//! it can still be typed by asking "which project classes define all of
//! these method names?" — the same heuristic a Ruby programmer uses when
//! reading unannotated code.

use crate::Reason;
use guessr_common::{limits::DUCK_TYPING_CANDIDATE_CAP, Atom};
use guessr_ir::{AncestryOracle, CalledMethod, NodeKind};
use guessr_registry::MethodRegistry;
use guessr_types::{ParamKind, Type};

/// Resolves a set of observed method calls to a type via the project's
/// ancestry oracle, which is responsible for finding every class that
/// defines all of them, then narrows by rejecting any candidate whose own
/// project-defined signature couldn't actually accept the calls observed
/// (spec 4.7 step 2: "reject members whose signature... is incompatible
/// with the call-site's positional/keyword usage").
///
/// - 0 candidates: nothing defines these methods; `Unknown` / "unresolved
///   methods".
/// - 1 candidate: unambiguous; that class.
/// - 2..=cap candidates: plausible but undetermined; their union.
/// - more than cap: too ambiguous to be useful; `Unknown`.
#[must_use]
pub fn infer_from_called_methods(
    oracle: &dyn AncestryOracle,
    arena: &guessr_ir::Arena,
    methods: &MethodRegistry,
    called_methods: &[CalledMethod],
) -> (Type, Reason) {
    if called_methods.is_empty() {
        return (Type::Unknown, Reason::UnresolvedMethods);
    }
    let names: Vec<Atom> = called_methods.iter().map(|c| c.name.clone()).collect();
    let mut candidates = oracle.find_classes_defining_methods(&names);
    candidates.retain(|class| called_methods.iter().all(|usage| signature_accepts(arena, methods, oracle, class, usage)));
    candidates.sort();
    match candidates.len() {
        0 => (Type::Unknown, Reason::UnresolvedMethods),
        1 => {
            let class = candidates.into_iter().next().expect("len checked above");
            (Type::class_instance(class.clone()), Reason::UniqueMethodSet(vec![class]))
        }
        n if n <= DUCK_TYPING_CANDIDATE_CAP => {
            let ty = guessr_types::union(candidates.iter().cloned().map(Type::class_instance));
            (ty, Reason::AmbiguousMethodSet(candidates))
        }
        _ => (Type::Unknown, Reason::TooAmbiguous),
    }
}

/// Whether `class`'s own registered signature for `usage.name` (if any) can
/// accept a call shaped like `usage`. A class the oracle reports as
/// defining the method, but that this project's `MethodRegistry` has no
/// `Def` for (a library method, or one from a file not yet lowered), is
/// treated as compatible — there's no project signature to contradict it.
fn signature_accepts(
    arena: &guessr_ir::Arena,
    methods: &MethodRegistry,
    oracle: &dyn AncestryOracle,
    class: &Atom,
    usage: &CalledMethod,
) -> bool {
    let Some(def_id) = methods.lookup(oracle, class, &usage.name) else {
        return true;
    };
    let NodeKind::Def { params, .. } = arena.kind(def_id) else {
        return true;
    };

    let mut required = 0u32;
    let mut optional = 0u32;
    let mut has_rest = false;
    let mut has_keyword_rest = false;
    let mut keyword_required = Vec::new();
    let mut keyword_names = Vec::new();
    for param_id in params {
        let NodeKind::Param { name, kind, .. } = arena.kind(*param_id) else { continue };
        match kind {
            ParamKind::Required => required += 1,
            ParamKind::Optional => optional += 1,
            ParamKind::Rest => has_rest = true,
            ParamKind::KeywordRequired => {
                keyword_required.push(name);
                keyword_names.push(name);
            }
            ParamKind::KeywordOptional => keyword_names.push(name),
            ParamKind::KeywordRest => has_keyword_rest = true,
            ParamKind::Block | ParamKind::Forwarding => {}
        }
    }

    if usage.positional_args < required {
        return false;
    }
    if !has_rest && usage.positional_args > required + optional {
        return false;
    }
    if !has_keyword_rest && usage.keywords.iter().any(|k| !keyword_names.contains(&k)) {
        return false;
    }
    if keyword_required.iter().any(|k| !usage.keywords.contains(*k)) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_ir::{Arena, ConstantKind, Node, NodeKind};

    struct FixedOracle(Vec<Atom>);
    impl AncestryOracle for FixedOracle {
        fn ancestors(&self, class_path: &Atom) -> Vec<Atom> {
            vec![class_path.clone()]
        }
        fn find_classes_defining_methods(&self, _names: &[Atom]) -> Vec<Atom> {
            self.0.clone()
        }
        fn constant_kind(&self, _name: &Atom) -> Option<ConstantKind> {
            None
        }
    }

    fn usage(name: &str, positional_args: u32, keywords: &[&str]) -> CalledMethod {
        CalledMethod {
            name: Atom::from(name),
            positional_args,
            keywords: keywords.iter().map(|k| Atom::from(*k)).collect(),
        }
    }

    #[test]
    fn no_called_methods_is_unknown() {
        let oracle = FixedOracle(vec![]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        assert_eq!(infer_from_called_methods(&oracle, &arena, &methods, &[]).0, Type::Unknown);
    }

    #[test]
    fn zero_candidates_is_unknown() {
        let oracle = FixedOracle(vec![]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        let called = vec![usage("quack", 0, &[])];
        let (ty, reason) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::Unknown);
        assert_eq!(reason, Reason::UnresolvedMethods);
    }

    #[test]
    fn single_candidate_is_unambiguous() {
        let oracle = FixedOracle(vec![Atom::from("Duck")]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        let called = vec![usage("quack", 0, &[])];
        let (ty, reason) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::class_instance("Duck"));
        assert!(matches!(reason, Reason::UniqueMethodSet(_)));
        assert!(reason.to_string().contains("unique method set"));
    }

    #[test]
    fn a_few_candidates_union() {
        let oracle = FixedOracle(vec![Atom::from("Duck"), Atom::from("Goose")]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        let called = vec![usage("quack", 0, &[])];
        let (t, reason) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(t, guessr_types::union([Type::class_instance("Duck"), Type::class_instance("Goose")]));
        assert!(reason.to_string().contains("ambiguous"));
    }

    #[test]
    fn too_many_candidates_is_unknown() {
        let oracle = FixedOracle(vec![
            Atom::from("A"),
            Atom::from("B"),
            Atom::from("C"),
            Atom::from("D"),
        ]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        let called = vec![usage("quack", 0, &[])];
        let (ty, reason) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::Unknown);
        assert_eq!(reason, Reason::TooAmbiguous);
    }

    /// Registers a project `Def` for `class#method` with the given params,
    /// for tests exercising spec 4.7 step 2's signature filtering.
    fn register_def(arena: &mut Arena, methods: &mut MethodRegistry, class: &str, method: &str, params: Vec<(&str, ParamKind)>) {
        let loc = guessr_common::Loc::synthetic();
        let param_ids = params
            .into_iter()
            .map(|(name, kind)| {
                arena.push(Node::new(
                    loc,
                    NodeKind::Param { name: Atom::from(name), kind, default: None, called_methods: vec![] },
                ))
            })
            .collect();
        let def = arena.push(Node::new(
            loc,
            NodeKind::Def {
                name: Atom::from(method),
                class_name: Some(Atom::from(class)),
                params: param_ids,
                return_node: None,
                body_nodes: vec![],
                singleton: false,
            },
        ));
        methods.register(Atom::from("fixture.rb"), Atom::from(class), Atom::from(method), def);
    }

    #[test]
    fn candidate_with_too_few_positional_args_is_rejected() {
        let oracle = FixedOracle(vec![Atom::from("Duck"), Atom::from("Goose")]);
        let mut arena = Arena::new();
        let mut methods = MethodRegistry::new();
        register_def(&mut arena, &mut methods, "Duck", "feed", vec![("amount", ParamKind::Required)]);
        // The call site passes no args; `Duck#feed` requires one, so `Duck`
        // is rejected even though the oracle reports it as a candidate.
        let called = vec![usage("feed", 0, &[])];
        let (ty, reason) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::class_instance("Goose"));
        assert!(matches!(reason, Reason::UniqueMethodSet(_)));
    }

    #[test]
    fn candidate_with_forbidden_keyword_is_rejected() {
        let oracle = FixedOracle(vec![Atom::from("Duck"), Atom::from("Goose")]);
        let mut arena = Arena::new();
        let mut methods = MethodRegistry::new();
        register_def(&mut arena, &mut methods, "Duck", "feed", vec![("amount", ParamKind::Required)]);
        let called = vec![usage("feed", 1, &["loudly"])];
        let (ty, _) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::class_instance("Goose"));
    }

    #[test]
    fn candidate_missing_required_keyword_is_rejected() {
        let oracle = FixedOracle(vec![Atom::from("Duck"), Atom::from("Goose")]);
        let mut arena = Arena::new();
        let mut methods = MethodRegistry::new();
        register_def(&mut arena, &mut methods, "Duck", "feed", vec![("amount", ParamKind::KeywordRequired)]);
        let called = vec![usage("feed", 0, &[])];
        let (ty, _) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, Type::class_instance("Goose"));
    }

    #[test]
    fn candidate_without_a_project_def_is_kept() {
        // `Duck` is reported by the oracle but has no project `Def` for
        // `feed` (e.g. it's a library method); nothing contradicts it, so
        // it stays a candidate alongside `Goose`.
        let oracle = FixedOracle(vec![Atom::from("Duck"), Atom::from("Goose")]);
        let arena = Arena::new();
        let methods = MethodRegistry::new();
        let called = vec![usage("feed", 5, &["loudly"])];
        let (ty, _) = infer_from_called_methods(&oracle, &arena, &methods, &called);
        assert_eq!(ty, guessr_types::union([Type::class_instance("Duck"), Type::class_instance("Goose")]));
    }
}
