//! The library-signature registry (spec 4.4): preloaded at startup, every
//! method signature from a bundled signature store, indexed by
//! `(class_path, method_name)` for instance methods and
//! `(class_path, class_method_name)` for singleton methods. Read-only
//! after preload, so it needs no locking of its own (spec 5).

use crate::entry::{MethodEntry, Overload};
use crate::substitute::{infer_bindings, substitute};
use guessr_common::Atom;
use guessr_ir::AncestryOracle;
use guessr_types::Type;
use rustc_hash::FxHashMap;

type Key = (Atom, Atom);

#[derive(Debug, Default)]
pub struct SignatureRegistry {
    instance: FxHashMap<Key, MethodEntry>,
    singleton: FxHashMap<Key, MethodEntry>,
}

impl SignatureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_instance(&mut self, class: impl Into<Atom>, method: impl Into<Atom>, entry: MethodEntry) {
        self.instance.insert((class.into(), method.into()), entry);
    }

    pub fn insert_singleton(&mut self, class: impl Into<Atom>, method: impl Into<Atom>, entry: MethodEntry) {
        self.singleton.insert((class.into(), method.into()), entry);
    }

    #[must_use]
    pub fn lookup_instance(&self, class: &Atom, method: &Atom) -> Option<&MethodEntry> {
        self.instance.get(&(class.clone(), method.clone()))
    }

    #[must_use]
    pub fn lookup_singleton(&self, class: &Atom, method: &Atom) -> Option<&MethodEntry> {
        self.singleton.get(&(class.clone(), method.clone()))
    }

    /// Overload resolution against `arg_types`, producing the return type
    /// with generics and `SelfType` substituted (spec 4.4).
    ///
    /// Never fails: returns `Unknown` when no overload's arity matches.
    #[must_use]
    pub fn return_type(
        &self,
        oracle: &dyn AncestryOracle,
        class: &Atom,
        method: &Atom,
        arg_types: &[Type],
        receiver_ty: &Type,
    ) -> Type {
        let Some(entry) = self.lookup_instance(class, method) else {
            return Type::Unknown;
        };
        resolve_overloads(entry, oracle, arg_types, receiver_ty)
    }

    /// Same as `return_type` but for a method called on the class object
    /// itself (`Class.method`), e.g. `new`.
    #[must_use]
    pub fn return_type_singleton(
        &self,
        oracle: &dyn AncestryOracle,
        class: &Atom,
        method: &Atom,
        arg_types: &[Type],
        receiver_ty: &Type,
    ) -> Type {
        let Some(entry) = self.lookup_singleton(class, method) else {
            return Type::Unknown;
        };
        resolve_overloads(entry, oracle, arg_types, receiver_ty)
    }

    /// The declared block parameter types for `class#method`, used when a
    /// block literal's own parameters carry no other inference evidence.
    #[must_use]
    pub fn block_param_types(&self, class: &Atom, method: &Atom) -> Vec<Type> {
        self.lookup_instance(class, method)
            .and_then(|entry| entry.overloads.iter().find_map(|o| o.block.clone()))
            .map(|params| params.into_iter().map(|p| p.ty).collect())
            .unwrap_or_default()
    }
}

/// Step 1: filter by arity. Step 2: score specificity. Step 3: union ties.
/// Step 4-5: substitute generics then `SelfType`.
fn resolve_overloads(
    entry: &MethodEntry,
    oracle: &dyn AncestryOracle,
    arg_types: &[Type],
    receiver_ty: &Type,
) -> Type {
    let candidates: Vec<&Overload> = entry
        .overloads
        .iter()
        .filter(|o| o.accepts_arity(arg_types.len()))
        .collect();

    if candidates.is_empty() {
        return Type::Unknown;
    }

    let mut best_score = usize::MAX;
    let mut best: Vec<&Overload> = Vec::new();
    for overload in candidates {
        let Some(score) = specificity_score(overload, arg_types, oracle) else {
            continue;
        };
        match score.cmp(&best_score) {
            std::cmp::Ordering::Less => {
                best_score = score;
                best = vec![overload];
            }
            std::cmp::Ordering::Equal => best.push(overload),
            std::cmp::Ordering::Greater => {}
        }
    }

    if best.is_empty() {
        return Type::Unknown;
    }

    let instantiated: Vec<Type> = best
        .iter()
        .map(|overload| {
            let declared: Vec<Type> = overload.positional.iter().map(|p| p.ty.clone()).collect();
            let bindings = infer_bindings(&declared, arg_types);
            substitute(&overload.return_type, &bindings, receiver_ty)
        })
        .collect();

    guessr_types::union(instantiated)
}

/// Lower is more specific. `None` means this overload is not a candidate
/// at all (an argument is incompatible with every interpretation).
fn specificity_score(overload: &Overload, arg_types: &[Type], oracle: &dyn AncestryOracle) -> Option<usize> {
    let mut total = 0usize;
    for (param, arg) in overload.positional.iter().zip(arg_types.iter()) {
        total += match_tier(&param.ty, arg, oracle)?;
    }
    Some(total)
}

/// 0 = exact match, 1 = param type is a declared ancestor of the argument's
/// class, 2 = param type is `Unknown` (maximally permissive, last resort).
/// `None` = incompatible.
fn match_tier(param_ty: &Type, arg_ty: &Type, oracle: &dyn AncestryOracle) -> Option<usize> {
    if param_ty == arg_ty {
        return Some(0);
    }
    if matches!(param_ty, Type::TypeVariable(_)) {
        return Some(0);
    }
    if let (Type::ClassInstance(param_class), Type::ClassInstance(arg_class)) = (param_ty, arg_ty) {
        if oracle.ancestors(arg_class).contains(param_class) {
            return Some(1);
        }
    }
    if matches!(param_ty, Type::Unknown) || matches!(arg_ty, Type::Unknown) {
        return Some(2);
    }
    None
}
