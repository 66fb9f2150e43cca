//! AST -> IR lowering (spec 4.2). Walks a parsed source tree, builds the
//! reverse-dependency graph in the shared `Arena`, and registers every node
//! in the key index and the method/variable registries inline as it goes.

pub mod ast;
pub mod context;
pub mod lower;

pub use ast::{AssignTarget, AstArena, BlockLiteral, Expr, ExprId, ExprKind, HashKey, OpAssignKind, ParamDef, Program};
pub use context::Context;
pub use lower::lower_program;

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_common::{Atom, Interner, Loc};
    use guessr_ir::{Arena, NodeKind};
    use guessr_registry::{ClassVariableRegistry, InstanceVariableRegistry, KeyIndex, MethodRegistry};
    use guessr_types::ParamKind;

    struct Fixture {
        interner: Interner,
        arena: Arena,
        key_index: KeyIndex,
        methods: MethodRegistry,
        ivars: InstanceVariableRegistry,
        cvars: ClassVariableRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                interner: Interner::default(),
                arena: Arena::new(),
                key_index: KeyIndex::new(),
                methods: MethodRegistry::new(),
                ivars: InstanceVariableRegistry::new(),
                cvars: ClassVariableRegistry::new(),
            }
        }

        fn ctx(&mut self, file: &str) -> Context<'_> {
            Context::new(
                self.interner.intern(file),
                &self.interner,
                &mut self.arena,
                &mut self.key_index,
                &mut self.methods,
                &mut self.ivars,
                &mut self.cvars,
            )
        }
    }

    fn loc(offset: u32) -> Loc {
        Loc::new(1, 0, 0, offset)
    }

    #[test]
    fn literal_local_assignment_binds_read_to_write() {
        let mut fx = Fixture::new();
        let mut ast = AstArena::new();
        let five = ast.push(loc(0), ExprKind::IntLiteral(5));
        let assign = ast.push(
            loc(1),
            ExprKind::Assign {
                target: AssignTarget::Local("x".into()),
                value: five,
            },
        );
        let read = ast.push(loc(2), ExprKind::Ident("x".into()));
        let program = Program { arena: ast, body: vec![assign, read] };

        let mut ctx = fx.ctx("a.rb");
        let ids = lower_program(&mut ctx, &program.arena, &program);
        let write_id = ids[0];
        let read_id = ids[1];

        assert!(matches!(ctx.arena.kind(write_id), NodeKind::LocalWrite { .. }));
        match ctx.arena.kind(read_id) {
            NodeKind::LocalRead { write_node, .. } => assert_eq!(*write_node, Some(write_id)),
            other => panic!("expected LocalRead, got {other:?}"),
        }
    }

    #[test]
    fn if_without_else_merges_with_synthetic_nil() {
        let mut fx = Fixture::new();
        let mut ast = AstArena::new();
        let cond = ast.push(loc(0), ExprKind::BoolLiteral(true));
        let ten = ast.push(loc(1), ExprKind::IntLiteral(10));
        let assign = ast.push(
            loc(2),
            ExprKind::Assign {
                target: AssignTarget::Local("y".into()),
                value: ten,
            },
        );
        let if_expr = ast.push(
            loc(3),
            ExprKind::If {
                cond,
                then_branch: vec![assign],
                else_branch: None,
            },
        );
        let read = ast.push(loc(4), ExprKind::Ident("y".into()));
        let program = Program { arena: ast, body: vec![if_expr, read] };

        let mut ctx = fx.ctx("a.rb");
        let ids = lower_program(&mut ctx, &program.arena, &program);
        let read_id = *ids.last().unwrap();
        let NodeKind::LocalRead { write_node: Some(merge_id), .. } = ctx.arena.kind(read_id) else {
            panic!("expected a LocalRead bound to the branch merge");
        };
        match ctx.arena.kind(*merge_id) {
            NodeKind::Merge { branches } => {
                assert_eq!(branches.len(), 2);
                let nil_branch = branches[1];
                assert!(matches!(
                    ctx.arena.kind(nil_branch),
                    NodeKind::Literal { literal_value: Some(guessr_ir::LiteralValue::Nil), .. }
                ));
            }
            other => panic!("expected Merge, got {other:?}"),
        }
    }

    #[test]
    fn method_def_collects_explicit_and_implicit_returns() {
        let mut fx = Fixture::new();
        let mut ast = AstArena::new();
        let cond = ast.push(loc(0), ExprKind::BoolLiteral(true));
        let one = ast.push(loc(1), ExprKind::IntLiteral(1));
        let ret = ast.push(loc(2), ExprKind::Return(Some(one)));
        let two = ast.push(loc(3), ExprKind::IntLiteral(2));
        let if_expr = ast.push(
            loc(4),
            ExprKind::If {
                cond,
                then_branch: vec![ret],
                else_branch: None,
            },
        );
        let def = ast.push(
            loc(5),
            ExprKind::MethodDef {
                name: "pick".into(),
                params: vec![],
                body: vec![if_expr, two],
                singleton: false,
            },
        );
        let program = Program { arena: ast, body: vec![def] };

        let mut ctx = fx.ctx("a.rb");
        let ids = lower_program(&mut ctx, &program.arena, &program);
        match ctx.arena.kind(ids[0]) {
            NodeKind::Def { return_node: Some(_), .. } => {}
            other => panic!("expected a Def with a return_node, got {other:?}"),
        }
    }

    #[test]
    fn call_records_receiver_duck_typing_evidence() {
        let mut fx = Fixture::new();
        let mut ast = AstArena::new();
        let one = ast.push(loc(0), ExprKind::IntLiteral(1));
        let param = ParamDef::simple("thing", ParamKind::Required);
        let recv = ast.push(loc(1), ExprKind::Ident("thing".into()));
        let call = ast.push(
            loc(2),
            ExprKind::MethodCall {
                receiver: Some(recv),
                method: "quack".into(),
                args: vec![],
                block: None,
            },
        );
        let def = ast.push(
            loc(3),
            ExprKind::MethodDef {
                name: "go".into(),
                params: vec![param],
                body: vec![call],
                singleton: false,
            },
        );
        let _ = one;
        let program = Program { arena: ast, body: vec![def] };

        let mut ctx = fx.ctx("a.rb");
        let ids = lower_program(&mut ctx, &program.arena, &program);
        let NodeKind::Def { params, .. } = ctx.arena.kind(ids[0]) else {
            panic!("expected Def");
        };
        let param_id = params[0];
        let methods = ctx.arena.called_methods(param_id);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.as_str(), "quack");
        assert_eq!(methods[0].positional_args, 0);
        assert!(methods[0].keywords.is_empty());
    }
}
