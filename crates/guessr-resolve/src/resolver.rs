//! The resolver's node dispatch (spec 4.6): one `infer` entry point, memoized
//! and cycle-safe, that pattern-matches over every `NodeKind` variant.

use crate::{cache::ResolverCache, duck, Inference, Reason, Source};
use guessr_common::Atom;
use guessr_ir::{Arena, AncestryOracle, CalledMethod, NodeId, NodeKind};
use guessr_registry::{ClassVariableRegistry, InstanceVariableRegistry, MethodRegistry};
use guessr_sig::{Bindings, SignatureRegistry};
use guessr_types::Type;

/// The synthetic root class every object ultimately descends from; methods
/// like `to_s`, `==`, and `!` are looked up here when nothing more specific
/// answers (spec 4.6, "Call").
const OBJECT_CLASS: &str = "Object";
const INITIALIZE: &str = "initialize";
const NEW: &str = "new";
const ARRAY_CLASS: &str = "Array";
const HASH_CLASS: &str = "Hash";
const RANGE_CLASS: &str = "Range";

/// Maps a structural type to the class whose registered methods govern it
/// (spec 4.6, "Call": receiver-type lookup has no carve-out for structural
/// types — `[1, 2].wrap` and `User.new.wrap` both resolve through the same
/// `MethodRegistry`/`SignatureRegistry` path once the receiver is concrete).
/// A `TupleType` is still backed by `Array` at the method-dispatch level;
/// its element-wise shape only matters to the display layer and to
/// `BlockParamSlot`.
fn structural_class_name(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::ArrayType(_) | Type::TupleType(_) => Some(ARRAY_CLASS),
        Type::HashType(..) | Type::HashShape(_) => Some(HASH_CLASS),
        Type::RangeType(_) => Some(RANGE_CLASS),
        _ => None,
    }
}

/// Borrows every piece of state a single `infer` call needs: the IR arena,
/// the project registries, the library-signature registry, the caller's
/// ancestry oracle, and the memoization cache. None of these are owned —
/// the runtime facade (`guessr-core`) owns them all and hands out a fresh
/// `Resolver` (cheap: it's all references) per query, under its mutex.
pub struct Resolver<'a> {
    pub arena: &'a Arena,
    pub methods: &'a MethodRegistry,
    pub ivars: &'a InstanceVariableRegistry,
    pub cvars: &'a ClassVariableRegistry,
    pub sigs: &'a SignatureRegistry,
    pub oracle: &'a dyn AncestryOracle,
    pub cache: &'a mut ResolverCache,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(
        arena: &'a Arena,
        methods: &'a MethodRegistry,
        ivars: &'a InstanceVariableRegistry,
        cvars: &'a ClassVariableRegistry,
        sigs: &'a SignatureRegistry,
        oracle: &'a dyn AncestryOracle,
        cache: &'a mut ResolverCache,
    ) -> Self {
        Self { arena, methods, ivars, cvars, sigs, oracle, cache }
    }

    /// Memoized, cycle-safe inference for `id` (spec 4.6, 4.8).
    pub fn infer(&mut self, id: NodeId) -> Inference {
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }
        if self.cache.is_inferring(id) {
            tracing::trace!(node = id.0, "cycle sentinel fired, short-circuiting to Unknown");
            return Inference::unknown(Reason::CircularDependency);
        }
        self.cache.mark_inferring(id);
        let result = self.compute(id);
        self.cache.store(id, result.clone());
        result
    }

    fn compute(&mut self, id: NodeId) -> Inference {
        let kind = self.arena.kind(id).clone();
        match kind {
            NodeKind::Literal { ty, values, .. } => self.infer_literal(&ty, &values),

            NodeKind::LocalWrite { value, .. }
            | NodeKind::InstanceVarWrite { value, .. }
            | NodeKind::ClassVarWrite { value, .. } => self.infer(value),

            NodeKind::LocalRead { write_node, .. } => match write_node {
                Some(write) => self.assigned_from(write),
                None => Inference::unknown(Reason::UnassignedVariable),
            },

            NodeKind::InstanceVarRead { name, class_name, write_node } => {
                match write_node.or_else(|| self.ivars.lookup(self.oracle, &class_name, &name)) {
                    Some(write) => self.assigned_from(write),
                    None => Inference::unknown(Reason::UnassignedVariable),
                }
            }

            NodeKind::ClassVarRead { name, class_name, write_node } => {
                match write_node.or_else(|| self.cvars.lookup(&class_name, &name)) {
                    Some(write) => self.assigned_from(write),
                    None => Inference::unknown(Reason::UnassignedVariable),
                }
            }

            NodeKind::Param { default, called_methods, .. } => {
                if let Some(default) = default {
                    return self.infer(default);
                }
                if !called_methods.is_empty() {
                    let (ty, reason) = duck::infer_from_called_methods(self.oracle, self.arena, self.methods, &called_methods);
                    return Inference { ty, reason, source: Source::Inference };
                }
                Inference::unknown(Reason::ParameterWithoutTypeInfo)
            }

            NodeKind::Call { method, receiver, args, block_params, .. } => {
                self.infer_call(&method, receiver, &args, block_params.len())
            }

            NodeKind::BlockParamSlot { index, call_node, called_methods } => {
                self.infer_block_param(index, call_node, &called_methods)
            }

            NodeKind::Def { name, return_node, .. } => {
                if name.as_str() == INITIALIZE {
                    return Inference { ty: Type::SelfType, reason: Reason::Constructor(name), source: Source::Project };
                }
                match return_node {
                    Some(r) => self.infer(r),
                    None => Inference { ty: Type::class_instance("NilClass"), reason: Reason::EmptyBody, source: Source::Inference },
                }
            }

            NodeKind::ClassModule { name, .. } => {
                Inference { ty: Type::singleton(name), reason: Reason::ClassObject, source: Source::Project }
            }

            NodeKind::Constant { name, dependency } => {
                if let Some(dep) = dependency {
                    return self.infer(dep);
                }
                match self.oracle.constant_kind(&name) {
                    Some(_) => Inference { ty: Type::singleton(name), reason: Reason::ClassObject, source: Source::Project },
                    None => Inference::unknown(Reason::UnassignedVariable),
                }
            }

            NodeKind::SelfNode { class_name, singleton } => {
                let ty = if singleton { Type::singleton(class_name) } else { Type::class_instance(class_name) };
                Inference { ty, reason: Reason::SelfReceiver, source: Source::Inference }
            }

            NodeKind::Return { value } => self.infer(value),

            NodeKind::Merge { branches } => self.infer_merge(&branches),
        }
    }

    /// `LocalRead`/ivar/cvar reads that delegate to a write node: same type
    /// and source, reason wrapped to record that it came via assignment
    /// (spec 8, scenario 1: "reason contains literal or assigned from").
    fn assigned_from(&mut self, write: NodeId) -> Inference {
        let inner = self.infer(write);
        Inference {
            ty: inner.ty,
            reason: Reason::AssignedFrom(Box::new(inner.reason)),
            source: inner.source,
        }
    }

    /// Array/hash literals store a placeholder `Unknown` element type at
    /// lowering time (the real element type depends on the graph, which
    /// only the resolver can walk); fill it in here from `values`. Scalar
    /// literals already carry a concrete type and pass straight through.
    fn infer_literal(&mut self, ty: &Type, values: &[NodeId]) -> Inference {
        let concrete = match ty {
            Type::ArrayType(elem) if elem.is_unknown() && !values.is_empty() => {
                let elems: Vec<Type> = values.iter().map(|v| self.infer(*v).ty).collect();
                Type::array(guessr_types::union(elems))
            }
            Type::HashType(key, value) if key.is_unknown() && value.is_unknown() && !values.is_empty() => {
                let elems: Vec<Type> = values.iter().map(|v| self.infer(*v).ty).collect();
                Type::hash(Type::Unknown, guessr_types::union(elems))
            }
            Type::HashShape(fields) => {
                let mut updated = fields.clone();
                for (entry, value_id) in updated.iter_mut().zip(values.iter()) {
                    *entry.1 = self.infer(*value_id).ty;
                }
                Type::HashShape(updated)
            }
            other => other.clone(),
        };
        Inference { ty: concrete, reason: Reason::Literal, source: Source::Literal }
    }

    fn infer_merge(&mut self, branches: &[NodeId]) -> Inference {
        let kept: Vec<Type> = branches
            .iter()
            .map(|b| self.infer(*b).ty)
            .filter(|ty| !ty.is_unknown())
            .collect();
        if kept.is_empty() {
            return Inference::unknown(Reason::NonReturningBranches);
        }
        Inference { ty: guessr_types::union(kept), reason: Reason::Merged, source: Source::Inference }
    }

    fn infer_call(&mut self, method: &Atom, receiver: Option<NodeId>, args: &[NodeId], block_param_count: usize) -> Inference {
        let _ = block_param_count;
        let Some(receiver_id) = receiver else {
            return Inference::unknown(Reason::UnknownNodeType);
        };
        let receiver_inf = self.infer(receiver_id);
        let arg_types: Vec<Type> = args.iter().map(|a| self.infer(*a).ty).collect();

        match &receiver_inf.ty {
            Type::Singleton(class) if method.as_str() == NEW => self.infer_constructor_call(class.clone(), method, &arg_types),

            Type::ClassInstance(class) => {
                self.lookup_return_type(class, method, &arg_types, &receiver_inf.ty, false)
                    .or_else(|| self.object_fallback(method, &arg_types, &receiver_inf.ty))
                    .unwrap_or_else(|| Inference::unknown(Reason::NoMatchingOverload))
            }

            Type::Singleton(class) => {
                self.lookup_return_type(class, method, &arg_types, &receiver_inf.ty, true)
                    .or_else(|| self.object_fallback(method, &arg_types, &receiver_inf.ty))
                    .unwrap_or_else(|| Inference::unknown(Reason::NoMatchingOverload))
            }

            Type::Unknown => self.infer_call_on_unknown_receiver(receiver_id, method, &arg_types),

            Type::Union(members) => self.infer_call_on_union_receiver(members.clone(), method, &arg_types),

            other => match structural_class_name(other) {
                Some(class) => {
                    let class = Atom::from(class);
                    self.lookup_return_type(&class, method, &arg_types, &receiver_inf.ty, false)
                        .or_else(|| self.object_fallback(method, &arg_types, &receiver_inf.ty))
                        .unwrap_or_else(|| Inference::unknown(Reason::NoMatchingOverload))
                }
                None => Inference::unknown(Reason::NoMatchingOverload),
            },
        }
    }

    /// A call on a receiver already narrowed to a fixed set of alternatives
    /// (spec 4.6): ask each concrete or structural member for a return type
    /// and union what answers; fall back to `Object` only when none do.
    fn infer_call_on_union_receiver(&mut self, members: Vec<Type>, method: &Atom, arg_types: &[Type]) -> Inference {
        let per_member: Vec<Type> = members
            .iter()
            .filter_map(|m| match m {
                Type::ClassInstance(class) => self.lookup_return_type(class, method, arg_types, m, false).map(|inf| inf.ty),
                Type::Singleton(class) => self.lookup_return_type(class, method, arg_types, m, true).map(|inf| inf.ty),
                other => structural_class_name(other).and_then(|class| {
                    self.lookup_return_type(&Atom::from(class), method, arg_types, m, false).map(|inf| inf.ty)
                }),
            })
            .collect();
        if per_member.is_empty() {
            return self
                .object_fallback(method, arg_types, &Type::Union(members))
                .unwrap_or_else(|| Inference::unknown(Reason::NoMatchingOverload));
        }
        Inference { ty: guessr_types::union(per_member), reason: Reason::Merged, source: Source::Inference }
    }

    fn infer_constructor_call(&mut self, class: Atom, method: &Atom, arg_types: &[Type]) -> Inference {
        let instance = Type::class_instance(class.clone());
        if let Some(def_id) = self.methods.lookup(self.oracle, &class, &Atom::from(INITIALIZE)) {
            let def_ty = self.infer(def_id).ty;
            let substituted = guessr_sig::substitute(&def_ty, &Bindings::default(), &instance);
            return Inference { ty: substituted, reason: Reason::Constructor(class), source: Source::Project };
        }
        if let Some(inf) = self.lookup_return_type(&class, method, arg_types, &instance, true) {
            return inf;
        }
        Inference { ty: instance, reason: Reason::Constructor(class), source: Source::Inference }
    }

    fn infer_call_on_unknown_receiver(&mut self, receiver_id: NodeId, method: &Atom, arg_types: &[Type]) -> Inference {
        let called = self.called_methods_evidence(receiver_id);
        let (duck_ty, duck_reason) = duck::infer_from_called_methods(self.oracle, self.arena, self.methods, &called);
        match &duck_ty {
            Type::ClassInstance(class) => self
                .lookup_return_type(class, method, arg_types, &duck_ty, false)
                .unwrap_or_else(|| Inference { ty: Type::Unknown, reason: duck_reason, source: Source::Inference }),
            Type::Union(members) => {
                let per_class: Vec<Type> = members
                    .iter()
                    .filter_map(|m| match m {
                        Type::ClassInstance(class) => {
                            self.lookup_return_type(class, method, arg_types, m, false).map(|inf| inf.ty)
                        }
                        _ => None,
                    })
                    .collect();
                if per_class.is_empty() {
                    self.object_fallback(method, arg_types, &Type::Unknown)
                        .unwrap_or(Inference { ty: Type::Unknown, reason: duck_reason, source: Source::Inference })
                } else {
                    Inference { ty: guessr_types::union(per_class), reason: duck_reason, source: Source::Inference }
                }
            }
            _ => self
                .object_fallback(method, arg_types, &Type::Unknown)
                .unwrap_or(Inference { ty: Type::Unknown, reason: duck_reason, source: Source::Unknown }),
        }
    }

    /// The called-methods evidence for a receiver: follows a read's
    /// back-reference to its write/param node, since only those own a
    /// `called_methods` list (spec design notes).
    fn called_methods_evidence(&self, node: NodeId) -> Vec<CalledMethod> {
        let owner = match self.arena.kind(node) {
            NodeKind::LocalRead { write_node, .. }
            | NodeKind::InstanceVarRead { write_node, .. }
            | NodeKind::ClassVarRead { write_node, .. } => write_node.unwrap_or(node),
            _ => node,
        };
        self.arena.called_methods(owner).to_vec()
    }

    /// Project method first, then library signature (spec 4.6, "Call":
    /// "ask registries in order MethodRegistry then SignatureRegistry").
    /// `None` means neither source answered.
    fn lookup_return_type(
        &mut self,
        class: &Atom,
        method: &Atom,
        arg_types: &[Type],
        receiver_ty: &Type,
        singleton_receiver: bool,
    ) -> Option<Inference> {
        if !singleton_receiver {
            if let Some(def_id) = self.methods.lookup(self.oracle, class, method) {
                let def_ty = self.infer(def_id).ty;
                let substituted = guessr_sig::substitute(&def_ty, &Bindings::default(), receiver_ty);
                return Some(Inference {
                    ty: substituted,
                    reason: Reason::ProjectMethod(class.clone(), method.clone()),
                    source: Source::Project,
                });
            }
        }

        let lib_ty = if singleton_receiver {
            self.sigs.return_type_singleton(self.oracle, class, method, arg_types, receiver_ty)
        } else {
            self.sigs.return_type(self.oracle, class, method, arg_types, receiver_ty)
        };
        if lib_ty.is_unknown() {
            return None;
        }
        Some(Inference {
            ty: lib_ty,
            reason: Reason::LibraryMethod(class.clone(), method.clone()),
            source: Source::Library,
        })
    }

    fn object_fallback(&mut self, method: &Atom, arg_types: &[Type], receiver_ty: &Type) -> Option<Inference> {
        tracing::debug!(method = method.as_str(), "falling back to Object for method lookup");
        self.lookup_return_type(&Atom::from(OBJECT_CLASS), method, arg_types, receiver_ty, false)
    }

    fn infer_block_param(&mut self, index: u32, call_node: NodeId, called_methods: &[CalledMethod]) -> Inference {
        let NodeKind::Call { method, receiver, block_params, .. } = self.arena.kind(call_node).clone() else {
            return Inference::unknown(Reason::UnknownNodeType);
        };
        let param_count = block_params.len();
        let receiver_ty = receiver.map(|r| self.infer(r).ty).unwrap_or(Type::Unknown);

        if let Some((ty, reason)) = block_element_type(&receiver_ty, index as usize, param_count) {
            return Inference { ty, reason, source: Source::Inference };
        }

        if let Type::ClassInstance(class) | Type::Singleton(class) = &receiver_ty {
            let declared = self.sigs.block_param_types(class, &method);
            if let Some(ty) = declared.get(index as usize).cloned() {
                return Inference { ty, reason: Reason::LibraryMethod(class.clone(), method), source: Source::Library };
            }
        }

        if !called_methods.is_empty() {
            let (ty, reason) = duck::infer_from_called_methods(self.oracle, self.arena, self.methods, called_methods);
            return Inference { ty, reason, source: Source::Inference };
        }

        Inference::unknown(Reason::ParameterWithoutTypeInfo)
    }
}

/// Derives a block parameter's type from its call's receiver element type
/// (spec 4.6, "BlockParamSlot"): an `Array`/`Range` yields its element at
/// index 0; a `Hash` yields key/value across two params, or a 2-tuple of
/// them when the block destructures both into one parameter.
fn block_element_type(receiver_ty: &Type, index: usize, param_count: usize) -> Option<(Type, Reason)> {
    match receiver_ty {
        Type::ArrayType(elem) | Type::RangeType(elem) => {
            (index == 0).then(|| ((**elem).clone(), Reason::BlockElement))
        }
        Type::HashType(key, value) => hash_pair_element(index, param_count, (**key).clone(), (**value).clone()),
        Type::HashShape(fields) => {
            let key = Type::class_instance("Symbol");
            let value = guessr_types::union(fields.values().cloned());
            hash_pair_element(index, param_count, key, value)
        }
        _ => None,
    }
}

fn hash_pair_element(index: usize, param_count: usize, key: Type, value: Type) -> Option<(Type, Reason)> {
    if param_count >= 2 {
        match index {
            0 => Some((key, Reason::BlockElement)),
            1 => Some((value, Reason::BlockElement)),
            _ => None,
        }
    } else if param_count == 1 && index == 0 {
        Some((Type::tuple(vec![key, value]), Reason::BlockElement))
    } else {
        None
    }
}
