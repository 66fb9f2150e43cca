//! Generic type-parameter and `SelfType` substitution (spec 4.4 step 4-5).
//!
//! Receiver type arguments aren't represented on `Type::ClassInstance` in
//! this engine (see `DESIGN.md`, Open Questions), so the only binding
//! source is inference from the matched argument position: when a
//! positional parameter's declared type is exactly `TypeVariable(name)`
//! (optionally wrapped one level deep in `ArrayType`/`RangeType`), we bind
//! `name` to the corresponding argument's type (or its unwrapped element).

use guessr_common::Atom;
use guessr_types::Type;
use rustc_hash::FxHashMap;

pub type Bindings = FxHashMap<Atom, Type>;

/// Infer generic bindings by matching declared positional parameter types
/// against the actual argument types.
#[must_use]
pub fn infer_bindings(declared: &[Type], args: &[Type]) -> Bindings {
    let mut bindings = Bindings::default();
    for (decl, arg) in declared.iter().zip(args.iter()) {
        bind_one(decl, arg, &mut bindings);
    }
    bindings
}

fn bind_one(decl: &Type, arg: &Type, bindings: &mut Bindings) {
    match decl {
        Type::TypeVariable(name) => {
            bindings.entry(name.clone()).or_insert_with(|| arg.clone());
        }
        Type::ArrayType(decl_elem) => {
            if let Type::ArrayType(arg_elem) = arg {
                bind_one(decl_elem, arg_elem, bindings);
            }
        }
        Type::RangeType(decl_elem) => {
            if let Type::RangeType(arg_elem) = arg {
                bind_one(decl_elem, arg_elem, bindings);
            }
        }
        _ => {}
    }
}

/// Replace every `TypeVariable` bound in `bindings` and every `SelfType`
/// with `self_ty`, recursively.
#[must_use]
pub fn substitute(ty: &Type, bindings: &Bindings, self_ty: &Type) -> Type {
    match ty {
        Type::TypeVariable(name) => bindings.get(name).cloned().unwrap_or(Type::Unknown),
        Type::SelfType => self_ty.clone(),
        Type::ArrayType(elem) => Type::array(substitute(elem, bindings, self_ty)),
        Type::TupleType(elems) => {
            Type::tuple(elems.iter().map(|e| substitute(e, bindings, self_ty)).collect())
        }
        Type::HashType(k, v) => Type::hash(
            substitute(k, bindings, self_ty),
            substitute(v, bindings, self_ty),
        ),
        Type::HashShape(fields) => Type::HashShape(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), substitute(v, bindings, self_ty)))
                .collect(),
        ),
        Type::RangeType(elem) => Type::range(substitute(elem, bindings, self_ty)),
        Type::Union(members) => {
            guessr_types::union(members.iter().map(|m| substitute(m, bindings, self_ty)))
        }
        Type::MethodSignature(params, ret) => Type::MethodSignature(
            params
                .iter()
                .map(|p| guessr_types::Param::new(p.name.clone(), p.kind, substitute(&p.ty, bindings, self_ty)))
                .collect(),
            Box::new(substitute(ret, bindings, self_ty)),
        ),
        other => other.clone(),
    }
}
