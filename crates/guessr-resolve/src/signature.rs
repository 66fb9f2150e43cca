//! Signature building (spec 4.10): turns a `Def` node into a
//! `Type::MethodSignature`, one parameter at a time, by asking the resolver
//! for each parameter's and the body's inferred type. The resulting value's
//! surface rendering comes for free from `guessr_types`'s `Display` impl.

use crate::Resolver;
use guessr_ir::{NodeId, NodeKind};
use guessr_types::{Param, Type};

/// Builds the `MethodSignature` for the `Def` at `def`. Panics only if
/// `def` isn't actually a `Def` node, which would be a caller bug (the
/// runtime facade only ever calls this with method-registry entries, which
/// are always `Def` nodes).
pub fn build_signature(resolver: &mut Resolver<'_>, def: NodeId) -> Type {
    let NodeKind::Def { params, return_node, .. } = resolver.arena.kind(def).clone() else {
        return Type::Unknown;
    };

    let sig_params: Vec<Param> = params
        .iter()
        .map(|&param_id| build_param(resolver, param_id))
        .collect();

    let return_ty = match return_node {
        Some(r) => resolver.infer(r).ty,
        None => Type::class_instance("NilClass"),
    };

    Type::MethodSignature(sig_params, Box::new(return_ty))
}

fn build_param(resolver: &mut Resolver<'_>, param_id: NodeId) -> Param {
    let NodeKind::Param { name, kind, .. } = resolver.arena.kind(param_id).clone() else {
        unreachable!("Def.params only ever contains Param nodes");
    };
    let ty = resolver.infer(param_id).ty;
    Param::new(name, kind, ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolverCache;
    use guessr_common::{Atom, Loc};
    use guessr_ir::{Arena, AncestryOracle, ConstantKind, LiteralValue, Node};
    use guessr_registry::{ClassVariableRegistry, InstanceVariableRegistry, MethodRegistry};
    use guessr_sig::SignatureRegistry;

    struct NoOracle;
    impl AncestryOracle for NoOracle {
        fn ancestors(&self, class_path: &Atom) -> Vec<Atom> {
            vec![class_path.clone()]
        }
        fn find_classes_defining_methods(&self, _names: &[Atom]) -> Vec<Atom> {
            vec![]
        }
        fn constant_kind(&self, _name: &Atom) -> Option<ConstantKind> {
            None
        }
    }

    #[test]
    fn builds_signature_from_param_and_return_types() {
        let mut arena = Arena::new();
        let loc = Loc::synthetic();

        let int_lit = arena.push(Node::new(
            loc,
            NodeKind::Literal {
                ty: Type::class_instance("Integer"),
                literal_value: Some(LiteralValue::Integer(1)),
                values: vec![],
            },
        ));
        let param = arena.push(Node::new(
            loc,
            NodeKind::Param {
                name: "x".into(),
                kind: guessr_types::ParamKind::Required,
                default: None,
                called_methods: vec![],
            },
        ));
        let ret = arena.push(Node::new(loc, NodeKind::Return { value: int_lit }));
        let def = arena.push(Node::new(
            loc,
            NodeKind::Def {
                name: "identity".into(),
                class_name: Some("Calc".into()),
                params: vec![param],
                return_node: Some(ret),
                body_nodes: vec![],
                singleton: false,
            },
        ));

        let methods = MethodRegistry::new();
        let ivars = InstanceVariableRegistry::new();
        let cvars = ClassVariableRegistry::new();
        let sigs = SignatureRegistry::new();
        let oracle = NoOracle;
        let mut cache = ResolverCache::new();
        let mut resolver = Resolver::new(&arena, &methods, &ivars, &cvars, &sigs, &oracle, &mut cache);

        let sig = build_signature(&mut resolver, def);
        match sig {
            Type::MethodSignature(params, ret_ty) => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].name.as_str(), "x");
                assert_eq!(*ret_ty, Type::class_instance("Integer"));
            }
            other => panic!("expected MethodSignature, got {other:?}"),
        }
    }
}
