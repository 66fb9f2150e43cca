//! The recursive AST -> IR walk (spec 4.2).

use crate::ast::{AssignTarget, AstArena, BlockLiteral, Expr, ExprId, ExprKind, HashKey, OpAssignKind, Program};
use crate::context::{Context, LocalTable};
use guessr_common::Loc;
use guessr_ir::{CalledMethod, LiteralValue as IrLiteral, Node, NodeId, NodeKind};
use guessr_types::Type;
use indexmap::IndexMap;

/// Lower a whole file. Returns the top-level body's node ids. The
/// context's key index, arena, and registries are populated inline as a
/// side effect, so by the time this returns the file's final graph is
/// already addressable (spec 4.2's closing invariant).
pub fn lower_program(ctx: &mut Context, ast: &AstArena, program: &Program) -> Vec<NodeId> {
    let _ = program;
    lower_body(ctx, ast, &program.body)
}

fn lower_body(ctx: &mut Context, ast: &AstArena, body: &[ExprId]) -> Vec<NodeId> {
    body.iter().map(|id| lower_expr(ctx, ast, *id)).collect()
}

fn push(ctx: &mut Context, node: Node) -> NodeId {
    ctx.arena.push(node)
}

/// Key every node the editor bridge might need to find by source position
/// (spec 3.3 names a tag for all twelve node kinds, not only writes/defs).
/// Synthetic nodes (a synthesized nil standing in for a missing `else`, an
/// implicit container-mutation literal's loc aside) carry no real anchor
/// token, so they're left unkeyed rather than colliding on the sentinel
/// offset.
fn record(ctx: &mut Context, tag: &str, loc: Loc, node: NodeId) {
    if loc.byte_offset == u32::MAX {
        return;
    }
    let disc = guessr_ir::discriminator(ctx.arena.kind(node));
    ctx.record(tag, &disc, loc.byte_offset, node);
}

fn nil_literal(ctx: &mut Context, loc: Loc) -> NodeId {
    push(
        ctx,
        Node::new(
            loc,
            NodeKind::Literal {
                ty: Type::class_instance("NilClass"),
                literal_value: Some(IrLiteral::Nil),
                values: Vec::new(),
            },
        ),
    )
}

fn record_call_on_receiver(ctx: &mut Context, receiver: Option<NodeId>, method: &str, positional_args: u32, keywords: &[String]) {
    let Some(receiver) = receiver else { return };
    // Walk through transparent wrapper kinds (reads/params own no list of
    // their own; the resolver follows their back-reference instead, so we
    // record directly on the owner here).
    let owner = match ctx.arena.kind(receiver) {
        NodeKind::LocalRead { write_node, .. }
        | NodeKind::InstanceVarRead { write_node, .. }
        | NodeKind::ClassVarRead { write_node, .. } => *write_node,
        _ => Some(receiver),
    };
    if let Some(owner) = owner {
        let keywords = keywords.iter().map(|k| ctx.intern(k)).collect();
        let name = ctx.intern(method);
        ctx.arena.record_called_method(owner, CalledMethod { name, positional_args, keywords });
    }
}

/// Ruby's keyword-argument convention: a trailing hash literal whose keys
/// are all plain symbols is the call's keyword arguments, not a positional
/// hash. Read off the raw AST args, before lowering, since duck typing
/// needs the call site's shape even when the receiver's type is unknown.
fn split_call_usage(ast: &AstArena, args: &[ExprId]) -> (u32, Vec<String>) {
    if let Some(last) = args.last() {
        if let ExprKind::HashLiteral(fields) = &ast.get(*last).kind {
            if !fields.is_empty() && fields.iter().all(|(k, _)| matches!(k, HashKey::Symbol(_))) {
                let keywords = fields
                    .iter()
                    .filter_map(|(k, _)| match k {
                        HashKey::Symbol(s) => Some(s.clone()),
                        HashKey::Dynamic(_) => None,
                    })
                    .collect();
                let positional = u32::try_from(args.len() - 1).unwrap_or(0);
                return (positional, keywords);
            }
        }
    }
    (u32::try_from(args.len()).unwrap_or(0), Vec::new())
}

fn lower_expr(ctx: &mut Context, ast: &AstArena, id: ExprId) -> NodeId {
    let expr = ast.get(id);
    let loc = expr.loc;
    match &expr.kind {
        ExprKind::IntLiteral(n) => {
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: Type::class_instance("Integer"),
                        literal_value: Some(IrLiteral::Integer(*n)),
                        values: Vec::new(),
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }
        ExprKind::FloatLiteral(n) => {
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: Type::class_instance("Float"),
                        literal_value: Some(IrLiteral::Float(*n)),
                        values: Vec::new(),
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }
        ExprKind::StringLiteral(s) => {
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: Type::class_instance("String"),
                        literal_value: Some(IrLiteral::String(s.clone())),
                        values: Vec::new(),
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }
        ExprKind::SymbolLiteral(s) => {
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: Type::class_instance("Symbol"),
                        literal_value: Some(IrLiteral::Symbol(s.clone())),
                        values: Vec::new(),
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }
        ExprKind::BoolLiteral(b) => {
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: Type::class_instance(if *b { "TrueClass" } else { "FalseClass" }),
                        literal_value: Some(IrLiteral::Bool(*b)),
                        values: Vec::new(),
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }
        ExprKind::NilLiteral => {
            let node = nil_literal(ctx, loc);
            record(ctx, "lit", loc, node);
            node
        }

        ExprKind::ArrayLiteral(elems) => {
            let values = lower_body(ctx, ast, elems);
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        // Placeholder element type; the resolver derives
                        // the real element type from `values`.
                        ty: Type::array(Type::Unknown),
                        literal_value: None,
                        values,
                    },
                ),
            );
            record(ctx, "lit", loc, node);
            node
        }

        ExprKind::HashLiteral(pairs) => {
            let all_symbol = pairs.iter().all(|(k, _)| matches!(k, HashKey::Symbol(_)));
            let mut values = Vec::with_capacity(pairs.len());
            let node = if all_symbol {
                let mut fields: IndexMap<guessr_common::Atom, Type> = IndexMap::new();
                for (key, value_id) in pairs {
                    let HashKey::Symbol(name) = key else { unreachable!() };
                    values.push(lower_expr(ctx, ast, *value_id));
                    fields.insert(ctx.intern(name), Type::Unknown);
                }
                push(
                    ctx,
                    Node::new(
                        loc,
                        NodeKind::Literal {
                            ty: Type::HashShape(fields),
                            literal_value: None,
                            values,
                        },
                    ),
                )
            } else {
                for (key, value_id) in pairs {
                    if let HashKey::Dynamic(key_id) = key {
                        lower_expr(ctx, ast, *key_id);
                    }
                    values.push(lower_expr(ctx, ast, *value_id));
                }
                push(
                    ctx,
                    Node::new(
                        loc,
                        NodeKind::Literal {
                            ty: Type::hash(Type::Unknown, Type::Unknown),
                            literal_value: None,
                            values,
                        },
                    ),
                )
            };
            record(ctx, "lit", loc, node);
            node
        }

        ExprKind::Ident(name) => {
            let name = ctx.intern(name);
            let write_node = ctx.scopes.lookup(&name);
            let node = push(ctx, Node::new(loc, NodeKind::LocalRead { name, write_node }));
            record(ctx, "local_read", loc, node);
            node
        }

        ExprKind::IVarRead(name) => {
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write_node = ctx.ivars.lookup(&NullOracle, &class_name, &name);
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::InstanceVarRead {
                        name,
                        class_name,
                        write_node,
                    },
                ),
            );
            record(ctx, "ivar_read", loc, node);
            node
        }

        ExprKind::CVarRead(name) => {
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write_node = ctx.cvars.lookup(&class_name, &name);
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::ClassVarRead {
                        name,
                        class_name,
                        write_node,
                    },
                ),
            );
            record(ctx, "cvar_read", loc, node);
            node
        }

        ExprKind::ConstRead(name) => {
            let name = ctx.intern(name);
            let node = push(ctx, Node::new(loc, NodeKind::Constant { name, dependency: None }));
            record(ctx, "const", loc, node);
            node
        }

        ExprKind::SelfExpr => {
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern("Object"));
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::SelfNode {
                        class_name,
                        singleton: ctx.in_singleton_method(),
                    },
                ),
            );
            record(ctx, "self", loc, node);
            node
        }

        ExprKind::Assign { target, value } => lower_assign(ctx, ast, loc, target, *value),

        ExprKind::OpAssign { target, op, value } => lower_op_assign(ctx, ast, loc, target, op, *value),

        ExprKind::If { cond, then_branch, else_branch } => {
            lower_expr(ctx, ast, *cond);
            lower_if(ctx, ast, loc, then_branch, else_branch.as_deref())
        }

        ExprKind::Case { subject, whens, else_branch } => {
            if let Some(subject) = subject {
                lower_expr(ctx, ast, *subject);
            }
            let branches: Vec<Vec<ExprId>> = whens.iter().map(|(_, body)| body.clone()).collect();
            lower_branch_merge(ctx, ast, loc, &branches, else_branch.as_deref())
        }

        ExprKind::MethodCall { receiver, method, args, block } => {
            lower_call(ctx, ast, loc, receiver.as_ref(), method, args, block.as_ref())
        }

        ExprKind::MethodDef { name, params, body, singleton } => {
            lower_def(ctx, ast, loc, name, params, body, *singleton)
        }

        ExprKind::ClassDef { name, body } => lower_class_like(ctx, ast, loc, name, body),
        ExprKind::ModuleDef { name, body } => lower_class_like(ctx, ast, loc, name, body),

        ExprKind::Return(value) => {
            let value = match value {
                Some(v) => lower_expr(ctx, ast, *v),
                None => nil_literal(ctx, loc),
            };
            let node = push(ctx, Node::new(loc, NodeKind::Return { value }));
            record(ctx, "return", loc, node);
            node
        }

        ExprKind::BeginRescue { body, rescues, else_branch, ensure } => {
            lower_begin_rescue(ctx, ast, loc, body, rescues, else_branch.as_deref(), ensure.as_deref())
        }
    }
}

fn lower_assign(ctx: &mut Context, ast: &AstArena, loc: Loc, target: &AssignTarget, value: ExprId) -> NodeId {
    match target {
        AssignTarget::Local(name) => {
            let value_node = lower_expr(ctx, ast, value);
            let name = ctx.intern(name);
            let write = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::LocalWrite {
                        name: name.clone(),
                        value: value_node,
                        called_methods: Vec::new(),
                    },
                ),
            );
            ctx.record("local_write", name.as_str(), loc.byte_offset, write);
            ctx.scopes.bind(name, write);
            write
        }
        AssignTarget::IVar(name) => {
            let value_node = lower_expr(ctx, ast, value);
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::InstanceVarWrite {
                        name: name.clone(),
                        class_name: class_name.clone(),
                        value: value_node,
                        called_methods: Vec::new(),
                    },
                ),
            );
            ctx.record("ivar_write", name.as_str(), loc.byte_offset, write);
            ctx.ivars.register(ctx.file.clone(), class_name, name, write);
            write
        }
        AssignTarget::CVar(name) => {
            let value_node = lower_expr(ctx, ast, value);
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::ClassVarWrite {
                        name: name.clone(),
                        class_name: class_name.clone(),
                        value: value_node,
                        called_methods: Vec::new(),
                    },
                ),
            );
            ctx.record("cvar_write", name.as_str(), loc.byte_offset, write);
            ctx.cvars.register(ctx.file.clone(), class_name, name, write);
            write
        }
        AssignTarget::Const(name) => {
            let value_node = lower_expr(ctx, ast, value);
            let name = ctx.intern(name);
            let node = push(ctx, Node::new(loc, NodeKind::Constant { name, dependency: Some(value_node) }));
            record(ctx, "const", loc, node);
            node
        }
        AssignTarget::Index { receiver, index } => lower_indexed_assign(ctx, ast, loc, *receiver, *index, value),
    }
}

/// `a[k] = v`: always emits the `[]=` call (so duck typing sees it), and
/// additionally rebinds `a` to a mutated literal write when `a` is a local
/// bound to an array/hash literal we can see structurally (spec 4.2).
fn lower_indexed_assign(ctx: &mut Context, ast: &AstArena, loc: Loc, receiver: ExprId, index: ExprId, value: ExprId) -> NodeId {
    let receiver_node = lower_expr(ctx, ast, receiver);
    let index_node = lower_expr(ctx, ast, index);
    let value_node = lower_expr(ctx, ast, value);

    record_call_on_receiver(ctx, Some(receiver_node), "[]=", 2, &[]);
    let call = push(
        ctx,
        Node::new(
            loc,
            NodeKind::Call {
                method: ctx.intern("[]="),
                receiver: Some(receiver_node),
                args: vec![index_node, value_node],
                block_params: Vec::new(),
                block_body: None,
                has_block: false,
            },
        ),
    );

    // Only a bare local identifier receiver bound to a literal container
    // can be mutated structurally; anything else is left to the `[]=` call.
    if let NodeKind::LocalRead { name, write_node: Some(prior_write) } = ctx.arena.kind(receiver_node).clone() {
        let mutated_ty = mutate_container_type(ctx, prior_write, &index, ast, index_node, value_node);
        if let Some(mutated_ty) = mutated_ty {
            let new_value = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Literal {
                        ty: mutated_ty,
                        literal_value: None,
                        values: vec![value_node],
                    },
                ),
            );
            let write = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::LocalWrite {
                        name: name.clone(),
                        value: new_value,
                        called_methods: Vec::new(),
                    },
                ),
            );
            ctx.record("local_write", name.as_str(), loc.byte_offset, write);
            ctx.scopes.bind(name, write);
        }
    }

    call
}

fn mutate_container_type(
    ctx: &mut Context,
    prior_write: NodeId,
    index_ast: &ExprId,
    ast: &AstArena,
    _index_node: NodeId,
    value_node: NodeId,
) -> Option<Type> {
    let NodeKind::LocalWrite { value: prior_value, .. } = ctx.arena.kind(prior_write).clone() else {
        return None;
    };
    let NodeKind::Literal { ty: prior_ty, .. } = ctx.arena.kind(prior_value).clone() else {
        return None;
    };
    let value_ty = literal_type_hint(ctx, value_node);
    let index_is_symbol = matches!(&ast.get(*index_ast).kind, ExprKind::SymbolLiteral(_));

    match prior_ty {
        Type::ArrayType(elem) => Some(Type::array(guessr_types::union([*elem, value_ty]))),
        Type::HashShape(mut fields) if index_is_symbol => {
            let ExprKind::SymbolLiteral(key) = &ast.get(*index_ast).kind else {
                unreachable!()
            };
            fields.insert(ctx.intern(key), value_ty);
            Some(Type::HashShape(fields))
        }
        Type::HashShape(fields) => {
            // Non-symbol key added to a hash shape: widen (spec 3.1).
            let value_union = guessr_types::union(fields.into_values().chain([value_ty]));
            Some(Type::hash(Type::Unknown, value_union))
        }
        Type::HashType(key, val) => Some(Type::hash(*key, guessr_types::union([*val, value_ty]))),
        _ => None,
    }
}

/// A best-effort, lowering-time-only hint at a value node's type, used
/// purely to widen a sibling literal's shape; real inference is the
/// resolver's job. Only literal nodes carry enough information to be
/// useful here.
fn literal_type_hint(ctx: &Context, node: NodeId) -> Type {
    match ctx.arena.kind(node) {
        NodeKind::Literal { ty, .. } => ty.clone(),
        _ => Type::Unknown,
    }
}

fn lower_op_assign(ctx: &mut Context, ast: &AstArena, loc: Loc, target: &AssignTarget, op: &OpAssignKind, value: ExprId) -> NodeId {
    // The "original" read of the target, used as one Merge branch.
    let original = match target {
        AssignTarget::Local(name) => {
            let name = ctx.intern(name);
            let write_node = ctx.scopes.lookup(&name);
            let node = push(ctx, Node::new(loc, NodeKind::LocalRead { name, write_node }));
            record(ctx, "local_read", loc, node);
            node
        }
        AssignTarget::IVar(name) => {
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write_node = ctx.ivars.lookup(&NullOracle, &class_name, &name);
            let node = push(ctx, Node::new(loc, NodeKind::InstanceVarRead { name, class_name, write_node }));
            record(ctx, "ivar_read", loc, node);
            node
        }
        AssignTarget::CVar(name) => {
            let name = ctx.intern(name);
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
            let write_node = ctx.cvars.lookup(&class_name, &name);
            let node = push(ctx, Node::new(loc, NodeKind::ClassVarRead { name, class_name, write_node }));
            record(ctx, "cvar_read", loc, node);
            node
        }
        AssignTarget::Const(_) | AssignTarget::Index { .. } => {
            // Rare in practice; treat as a fresh nil evidence branch.
            nil_literal(ctx, Loc::synthetic())
        }
    };

    let new_value = match op {
        OpAssignKind::OrOr | OpAssignKind::AndAnd => {
            let rhs = lower_expr(ctx, ast, value);
            let node = push(ctx, Node::new(loc, NodeKind::Merge { branches: vec![original, rhs] }));
            record(ctx, "merge", loc, node);
            node
        }
        OpAssignKind::Binary(method) => {
            let rhs = lower_expr(ctx, ast, value);
            record_call_on_receiver(ctx, Some(original), method, 1, &[]);
            push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::Call {
                        method: ctx.intern(method),
                        receiver: Some(original),
                        args: vec![rhs],
                        block_params: Vec::new(),
                        block_body: None,
                        has_block: false,
                    },
                ),
            )
        }
    };

    new_value.pipe_replace(ctx, new_value, target)
}

/// `if`/`case` with a single `then`/`else` pair of bodies.
fn lower_if(ctx: &mut Context, ast: &AstArena, loc: Loc, then_branch: &[ExprId], else_branch: Option<&[ExprId]>) -> NodeId {
    lower_branch_merge(ctx, ast, loc, &[then_branch.to_vec()], else_branch)
}

/// Shared machinery for `if`/`case`: lower every branch in a forked scope,
/// then merge every variable touched in any branch (spec 4.2).
fn lower_branch_merge(ctx: &mut Context, ast: &AstArena, loc: Loc, branches: &[Vec<ExprId>], else_branch: Option<&[ExprId]>) -> NodeId {
    let pre_branch = ctx.scopes.top().clone();
    let mut touched = rustc_hash::FxHashSet::default();
    let mut branch_results = Vec::new();

    for branch in branches {
        ctx.scopes.push(pre_branch.clone());
        let ids = lower_body(ctx, ast, branch);
        let forked = ctx.scopes.pop();
        for name in forked.names() {
            touched.insert(name);
        }
        branch_results.push((forked, ids.last().copied()));
    }

    let else_forked = if let Some(else_branch) = else_branch {
        ctx.scopes.push(pre_branch.clone());
        let ids = lower_body(ctx, ast, else_branch);
        let forked = ctx.scopes.pop();
        for name in forked.names() {
            touched.insert(name);
        }
        Some((forked, ids.last().copied()))
    } else {
        None
    };

    // Merge every variable touched in any branch: a variable not
    // reassigned in a given branch falls back to its pre-branch value, or
    // a synthesized nil for "no else" (spec 4.2, "may be unassigned").
    for name in touched {
        let mut branch_values = Vec::new();
        for (forked, _) in &branch_results {
            let v = forked.get(&name).or_else(|| pre_branch.get(&name));
            branch_values.push(v.unwrap_or_else(|| nil_literal(ctx, Loc::synthetic())));
        }
        match &else_forked {
            Some((forked, _)) => {
                let v = forked.get(&name).or_else(|| pre_branch.get(&name));
                branch_values.push(v.unwrap_or_else(|| nil_literal(ctx, Loc::synthetic())));
            }
            None => branch_values.push(nil_literal(ctx, Loc::synthetic())),
        }
        // Not keyed: this per-variable merge is lowering bookkeeping, not
        // something a cursor can land on directly — the `if`/`case`'s own
        // result value below is the one keyed at this source position.
        let merge = push(ctx, Node::new(loc, NodeKind::Merge { branches: branch_values }));
        ctx.scopes.bind(name, merge);
    }

    // The construct's own value (used when it appears as an expression,
    // e.g. the RHS of an op-assign or the method's last expression).
    let mut result_branches: Vec<NodeId> = branch_results.iter().filter_map(|(_, last)| *last).collect();
    if let Some((_, last)) = &else_forked {
        if let Some(last) = last {
            result_branches.push(*last);
        }
    } else {
        result_branches.push(nil_literal(ctx, Loc::synthetic()));
    }
    let result = push(ctx, Node::new(loc, NodeKind::Merge { branches: result_branches }));
    record(ctx, "merge", loc, result);
    result
}

fn lower_call(
    ctx: &mut Context,
    ast: &AstArena,
    loc: Loc,
    receiver: Option<&ExprId>,
    method: &str,
    args: &[ExprId],
    block: Option<&BlockLiteral>,
) -> NodeId {
    let receiver_node = match receiver {
        Some(r) => Some(lower_expr(ctx, ast, *r)),
        None => {
            let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern("Object"));
            let node = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::SelfNode {
                        class_name,
                        singleton: ctx.in_singleton_method(),
                    },
                ),
            );
            record(ctx, "self", loc, node);
            Some(node)
        }
    };
    let arg_nodes = lower_body(ctx, ast, args);

    // Reserve the Call node's id before lowering the block, since a
    // BlockParamSlot must point back at its owning call.
    let call_id = push(
        ctx,
        Node::new(
            loc,
            NodeKind::Call {
                method: ctx.intern(method),
                receiver: receiver_node,
                args: arg_nodes.clone(),
                block_params: Vec::new(),
                block_body: None,
                has_block: block.is_some(),
            },
        ),
    );

    let (positional_args, keywords) = split_call_usage(ast, args);
    record_call_on_receiver(ctx, receiver_node, method, positional_args, &keywords);
    for arg in &arg_nodes {
        // Arguments aren't "called on" anything extra; called-methods
        // tracking only applies to the receiver and to block params.
        let _ = arg;
    }

    if let Some(block) = block {
        let pre_branch = ctx.scopes.top().clone();
        ctx.scopes.push(pre_branch);
        let mut slot_ids = Vec::with_capacity(block.params.len());
        for (i, name) in block.params.iter().enumerate() {
            let slot = push(
                ctx,
                Node::new(
                    loc,
                    NodeKind::BlockParamSlot {
                        index: u32::try_from(i).expect("block param index overflowed u32"),
                        call_node: call_id,
                        called_methods: Vec::new(),
                    },
                ),
            );
            let name = ctx.intern(name);
            ctx.record("bparam", name.as_str(), loc.byte_offset + u32::try_from(i).unwrap_or(0), slot);
            ctx.scopes.bind(name, slot);
            slot_ids.push(slot);
        }
        let body_ids = lower_body(ctx, ast, &block.body);
        ctx.scopes.pop();

        if let NodeKind::Call { block_params, block_body, .. } = &mut ctx.arena.get_mut(call_id).kind {
            *block_params = slot_ids;
            *block_body = body_ids.last().copied();
        }
    }

    ctx.record("call", method, loc.byte_offset, call_id);
    call_id
}

fn lower_def(ctx: &mut Context, ast: &AstArena, loc: Loc, name: &str, params: &[crate::ast::ParamDef], body: &[ExprId], singleton: bool) -> NodeId {
    let name = ctx.intern(name);
    let class_name = ctx.current_class_path();

    let pre_scope = LocalTable::default();
    ctx.scopes.push(pre_scope);
    let previous_method = ctx.enter_method(name.clone(), singleton);

    let mut param_ids = Vec::with_capacity(params.len());
    flatten_params(ctx, ast, loc, params, &mut param_ids);

    let body_ids = lower_body(ctx, ast, body);

    // Collect explicit Return nodes plus the final body expression (if it
    // isn't itself a Return) into `return_node` (spec 4.2, "Method def").
    let mut return_candidates: Vec<NodeId> = body_ids
        .iter()
        .copied()
        .filter(|id| matches!(ctx.arena.kind(*id), NodeKind::Return { .. }))
        .collect();
    if let Some(last) = body_ids.last() {
        if !matches!(ctx.arena.kind(*last), NodeKind::Return { .. }) {
            return_candidates.push(*last);
        }
    }
    let return_node = match return_candidates.len() {
        0 => None,
        1 => Some(return_candidates[0]),
        _ => Some(push(ctx, Node::new(loc, NodeKind::Merge { branches: return_candidates }))),
    };

    ctx.exit_method(previous_method);
    ctx.scopes.pop();

    let def = push(
        ctx,
        Node::new(
            loc,
            NodeKind::Def {
                name: name.clone(),
                class_name: class_name.clone(),
                params: param_ids,
                return_node,
                body_nodes: body_ids,
                singleton,
            },
        ),
    );
    ctx.record("def", name.as_str(), loc.byte_offset, def);
    if let Some(class_name) = class_name {
        ctx.methods.register(ctx.file.clone(), class_name, name, def);
    }
    def
}

/// Lowers each parameter, flattening destructured parameters to their leaf
/// names (spec 4.2, "Method def"). Leaves bind in the method's scope and
/// are registered as `Param` nodes so duck typing can see their own
/// called-methods list.
fn flatten_params(ctx: &mut Context, ast: &AstArena, loc: Loc, params: &[crate::ast::ParamDef], out: &mut Vec<NodeId>) {
    for p in params {
        if !p.destructure.is_empty() {
            flatten_params(ctx, ast, loc, &p.destructure, out);
            continue;
        }
        let default = p.default.map(|d| lower_expr(ctx, ast, d));
        let name = ctx.intern(&p.name);
        let node = push(
            ctx,
            Node::new(
                loc,
                NodeKind::Param {
                    name: name.clone(),
                    kind: p.kind,
                    default,
                    called_methods: Vec::new(),
                },
            ),
        );
        ctx.record("param", name.as_str(), loc.byte_offset, node);
        ctx.scopes.bind(name, node);
        out.push(node);
    }
}

fn lower_class_like(ctx: &mut Context, ast: &AstArena, loc: Loc, name: &str, body: &[ExprId]) -> NodeId {
    let name_atom = ctx.intern(name);
    ctx.push_class(name_atom.clone());
    let full_path = ctx.current_class_path().unwrap_or_else(|| name_atom.clone());

    ctx.scopes.push_new();
    let members = lower_body(ctx, ast, body);
    ctx.scopes.pop();

    ctx.pop_class();

    let class_node = push(ctx, Node::new(loc, NodeKind::ClassModule { name: full_path.clone(), members }));
    ctx.record("class", full_path.as_str(), loc.byte_offset, class_node);
    class_node
}

fn lower_begin_rescue(
    ctx: &mut Context,
    ast: &AstArena,
    loc: Loc,
    body: &[ExprId],
    rescues: &[Vec<ExprId>],
    else_branch: Option<&[ExprId]>,
    ensure: Option<&[ExprId]>,
) -> NodeId {
    // Flatten begin/rescue/else/ensure into a sequence of sibling bodies
    // that feed the enclosing method's return_node through the normal
    // merge machinery (spec 4.2, "Rescue/ensure").
    let mut branches: Vec<Vec<ExprId>> = vec![body.to_vec()];
    branches.extend(rescues.iter().cloned());
    let merged = lower_branch_merge(ctx, ast, loc, &branches, else_branch);
    if let Some(ensure) = ensure {
        lower_body(ctx, ast, ensure);
    }
    merged
}

// -- helpers ---------------------------------------------------------------

/// A dummy oracle used only for the `NullOracle`-tagged lookups during
/// instance-variable resolution inside a single file's lowering, where
/// this engine does not (yet) have access to the project's ancestry
/// oracle. Instance variables are looked up by exact class path at
/// lowering time; cross-class ancestry-aware resolution happens in the
/// resolver, which is handed a real oracle by the runtime facade.
struct NullOracle;
impl guessr_ir::AncestryOracle for NullOracle {
    fn ancestors(&self, class_path: &guessr_common::Atom) -> Vec<guessr_common::Atom> {
        vec![class_path.clone()]
    }
    fn find_classes_defining_methods(&self, _names: &[guessr_common::Atom]) -> Vec<guessr_common::Atom> {
        Vec::new()
    }
    fn constant_kind(&self, _name: &guessr_common::Atom) -> Option<guessr_ir::ConstantKind> {
        None
    }
}

trait PipeReplace {
    fn pipe_replace(self, ctx: &mut Context, new_value: NodeId, target: &AssignTarget) -> NodeId;
}

impl PipeReplace for NodeId {
    fn pipe_replace(self, ctx: &mut Context, new_value: NodeId, target: &AssignTarget) -> NodeId {
        let _ = self;
        match target {
            AssignTarget::Local(name) => {
                let name = ctx.intern(name);
                let loc = ctx.arena.get(new_value).loc;
                let write = push(
                    ctx,
                    Node::new(
                        loc,
                        NodeKind::LocalWrite {
                            name: name.clone(),
                            value: new_value,
                            called_methods: Vec::new(),
                        },
                    ),
                );
                ctx.record("local_write", name.as_str(), loc.byte_offset, write);
                ctx.scopes.bind(name, write);
                write
            }
            AssignTarget::IVar(name) => {
                let name = ctx.intern(name);
                let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
                let loc = ctx.arena.get(new_value).loc;
                let write = push(
                    ctx,
                    Node::new(
                        loc,
                        NodeKind::InstanceVarWrite {
                            name: name.clone(),
                            class_name: class_name.clone(),
                            value: new_value,
                            called_methods: Vec::new(),
                        },
                    ),
                );
                ctx.record("ivar_write", name.as_str(), loc.byte_offset, write);
                ctx.ivars.register(ctx.file.clone(), class_name, name, write);
                write
            }
            AssignTarget::CVar(name) => {
                let name = ctx.intern(name);
                let class_name = ctx.current_class_path().unwrap_or_else(|| ctx.intern(""));
                let loc = ctx.arena.get(new_value).loc;
                let write = push(
                    ctx,
                    Node::new(
                        loc,
                        NodeKind::ClassVarWrite {
                            name: name.clone(),
                            class_name: class_name.clone(),
                            value: new_value,
                            called_methods: Vec::new(),
                        },
                    ),
                );
                ctx.record("cvar_write", name.as_str(), loc.byte_offset, write);
                ctx.cvars.register(ctx.file.clone(), class_name, name, write);
                write
            }
            AssignTarget::Const(_) | AssignTarget::Index { .. } => new_value,
        }
    }
}
