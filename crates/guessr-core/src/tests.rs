//! End-to-end facade tests: build a small AST by hand (the way
//! `guessr_lower`'s own fixture does), ingest it through [`Engine`], then
//! exercise the find-by-key -> infer path an editor bridge actually walks
//! (spec 8).

use std::sync::Arc;

use guessr_common::Loc;
use guessr_ir::{AncestryOracle, ConstantKind, NodeKey, Scope};
use guessr_lower::{AssignTarget, AstArena, ExprKind, ParamDef, Program};
use guessr_resolve::Reason;
use guessr_types::{ParamKind, Type};

use crate::Engine;

fn loc(offset: u32) -> Loc {
    Loc::new(1, 0, 0, offset)
}

/// An oracle with no classes and no ancestry, for tests that never touch
/// duck typing or inheritance.
struct EmptyOracle;

impl AncestryOracle for EmptyOracle {
    fn ancestors(&self, class_path: &guessr_common::Atom) -> Vec<guessr_common::Atom> {
        vec![class_path.clone()]
    }

    fn find_classes_defining_methods(&self, _names: &[guessr_common::Atom]) -> Vec<guessr_common::Atom> {
        vec![]
    }

    fn constant_kind(&self, _name: &guessr_common::Atom) -> Option<ConstantKind> {
        None
    }
}

/// An oracle that knows exactly one class, `Recipe`, which defines
/// `ingredients` and `steps` — enough for the duck-typing scenario in spec
/// 8 (scenario 3).
struct RecipeOracle;

impl AncestryOracle for RecipeOracle {
    fn ancestors(&self, class_path: &guessr_common::Atom) -> Vec<guessr_common::Atom> {
        vec![class_path.clone()]
    }

    fn find_classes_defining_methods(&self, names: &[guessr_common::Atom]) -> Vec<guessr_common::Atom> {
        let mut wanted: Vec<&str> = names.iter().map(|a| a.as_str()).collect();
        wanted.sort_unstable();
        if wanted == ["ingredients", "steps"] {
            vec!["Recipe".into()]
        } else {
            vec![]
        }
    }

    fn constant_kind(&self, _name: &guessr_common::Atom) -> Option<ConstantKind> {
        None
    }
}

#[test]
fn literal_assignment_is_found_by_key_and_resolves_through_the_write() {
    // name = "John"
    // name
    let mut ast = AstArena::new();
    let lit = ast.push(loc(0), ExprKind::StringLiteral("John".into()));
    let assign = ast.push(
        loc(5),
        ExprKind::Assign {
            target: AssignTarget::Local("name".into()),
            value: lit,
        },
    );
    let read = ast.push(loc(20), ExprKind::Ident("name".into()));
    let program = Program { arena: ast, body: vec![assign, read] };

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.ingest("greeter.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::TopLevel, "local_read", "name", 20);
    let node = engine.find(&key).expect("local_read at offset 20 should be keyed");

    let inference = engine.infer(node);
    assert_eq!(inference.ty, Type::class_instance("String"));
    assert!(
        inference.reason_text().contains("literal"),
        "expected the reason to mention the literal it came from, got: {}",
        inference.reason_text()
    );
}

#[test]
fn duck_typed_parameter_resolves_from_called_methods() {
    // def process(recipe)
    //   recipe.ingredients
    //   recipe.steps
    // end
    let mut ast = AstArena::new();
    let recv1 = ast.push(loc(10), ExprKind::Ident("recipe".into()));
    let call1 = ast.push(
        loc(11),
        ExprKind::MethodCall {
            receiver: Some(recv1),
            method: "ingredients".into(),
            args: vec![],
            block: None,
        },
    );
    let recv2 = ast.push(loc(12), ExprKind::Ident("recipe".into()));
    let call2 = ast.push(
        loc(13),
        ExprKind::MethodCall {
            receiver: Some(recv2),
            method: "steps".into(),
            args: vec![],
            block: None,
        },
    );
    let param = ParamDef::simple("recipe", ParamKind::Required);
    let def = ast.push(
        loc(1),
        ExprKind::MethodDef {
            name: "process".into(),
            params: vec![param],
            body: vec![call1, call2],
            singleton: false,
        },
    );
    let program = Program { arena: ast, body: vec![def] };

    let engine = Engine::new(Arc::new(RecipeOracle));
    engine.ingest("processor.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::TopLevel, "param", "recipe", 1);
    let node = engine.find(&key).expect("the def's own offset keys its params too; see lowering");

    let inference = engine.infer(node);
    assert_eq!(inference.ty, Type::class_instance("Recipe"));
    assert!(matches!(inference.reason, Reason::UniqueMethodSet(_)));
}

#[test]
fn branch_merge_unions_both_arms() {
    // if flag
    //   x = 1
    // else
    //   x = "a"
    // end
    // x
    let mut ast = AstArena::new();
    let cond = ast.push(loc(0), ExprKind::BoolLiteral(true));
    let one = ast.push(loc(1), ExprKind::IntLiteral(1));
    let then_assign = ast.push(
        loc(2),
        ExprKind::Assign {
            target: AssignTarget::Local("x".into()),
            value: one,
        },
    );
    let str_lit = ast.push(loc(3), ExprKind::StringLiteral("a".into()));
    let else_assign = ast.push(
        loc(4),
        ExprKind::Assign {
            target: AssignTarget::Local("x".into()),
            value: str_lit,
        },
    );
    let if_expr = ast.push(
        loc(5),
        ExprKind::If {
            cond,
            then_branch: vec![then_assign],
            else_branch: Some(vec![else_assign]),
        },
    );
    let read = ast.push(loc(30), ExprKind::Ident("x".into()));
    let program = Program { arena: ast, body: vec![if_expr, read] };

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.ingest("branchy.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::TopLevel, "local_read", "x", 30);
    let node = engine.find(&key).expect("local_read at offset 30 should be keyed");

    let inference = engine.infer(node);
    assert_eq!(
        inference.ty,
        guessr_types::union([Type::class_instance("Integer"), Type::class_instance("String")])
    );
}

#[test]
fn removing_a_file_drops_its_keys_and_method_registrations() {
    let mut ast = AstArena::new();
    let lit = ast.push(loc(0), ExprKind::IntLiteral(1));
    let assign = ast.push(
        loc(1),
        ExprKind::Assign {
            target: AssignTarget::Local("n".into()),
            value: lit,
        },
    );
    let read = ast.push(loc(2), ExprKind::Ident("n".into()));
    let program = Program { arena: ast, body: vec![assign, read] };

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.ingest("scratch.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::TopLevel, "local_read", "n", 2);
    assert!(engine.find(&key).is_some());
    assert!(!engine.nodes_for_file("scratch.rb").is_empty());

    engine.remove_file("scratch.rb");

    assert!(engine.find(&key).is_none());
    assert!(engine.nodes_for_file("scratch.rb").is_empty());
}

#[test]
fn reingesting_a_file_replaces_rather_than_accumulates() {
    let mut first = AstArena::new();
    let lit = first.push(loc(0), ExprKind::IntLiteral(1));
    let assign = first.push(
        loc(1),
        ExprKind::Assign {
            target: AssignTarget::Local("n".into()),
            value: lit,
        },
    );
    let program_one = Program { arena: first, body: vec![assign] };

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.ingest("same.rb", &program_one.arena, &program_one);
    let before = engine.nodes_for_file("same.rb").len();

    let mut second = AstArena::new();
    let lit2 = second.push(loc(0), ExprKind::IntLiteral(2));
    let assign2 = second.push(
        loc(1),
        ExprKind::Assign {
            target: AssignTarget::Local("n".into()),
            value: lit2,
        },
    );
    let program_two = Program { arena: second, body: vec![assign2] };
    engine.ingest("same.rb", &program_two.arena, &program_two);

    assert_eq!(engine.nodes_for_file("same.rb").len(), before);
}

#[test]
fn self_referential_method_call_does_not_recurse_forever() {
    // class Foo
    //   def bar
    //     self.bar
    //   end
    // end
    let mut ast = AstArena::new();
    let recv = ast.push(loc(10), ExprKind::SelfExpr);
    let call = ast.push(
        loc(11),
        ExprKind::MethodCall {
            receiver: Some(recv),
            method: "bar".into(),
            args: vec![],
            block: None,
        },
    );
    let def = ast.push(
        loc(1),
        ExprKind::MethodDef {
            name: "bar".into(),
            params: vec![],
            body: vec![call],
            singleton: false,
        },
    );
    let class_def = ast.push(
        loc(0),
        ExprKind::ClassDef {
            name: "Foo".into(),
            body: vec![def],
        },
    );
    let program = Program { arena: ast, body: vec![class_def] };

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.ingest("foo.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::Class("Foo".into()), "def", "bar", 1);
    let node = engine.find(&key).expect("def bar should be keyed under class Foo's scope");

    // The point of this test is that `infer` returns at all rather than
    // blowing the stack; the cycle collapses to `Unknown` somewhere in
    // the chain (spec 4.8).
    let inference = engine.infer(node);
    let _ = inference;
}

#[test]
fn finalize_preloads_library_signatures_for_queries() {
    use crate::SignatureRecord;
    use guessr_sig::Overload;

    let engine = Engine::new(Arc::new(EmptyOracle));
    engine.finalize(vec![SignatureRecord::new(
        "String",
        "upcase",
        false,
        vec![Overload::new(vec![], Type::class_instance("String"))],
    )]);

    // recv = "hi"
    // recv.upcase
    let mut ast = AstArena::new();
    let lit = ast.push(loc(0), ExprKind::StringLiteral("hi".into()));
    let assign = ast.push(
        loc(1),
        ExprKind::Assign {
            target: AssignTarget::Local("recv".into()),
            value: lit,
        },
    );
    let recv = ast.push(loc(2), ExprKind::Ident("recv".into()));
    let call = ast.push(
        loc(3),
        ExprKind::MethodCall {
            receiver: Some(recv),
            method: "upcase".into(),
            args: vec![],
            block: None,
        },
    );
    let program = Program { arena: ast, body: vec![assign, call] };
    engine.ingest("lib_call.rb", &program.arena, &program);

    let key = NodeKey::build(&Scope::TopLevel, "call", "upcase", 3);
    let node = engine.find(&key).expect("call at offset 3 should be keyed");

    let inference = engine.infer(node);
    assert_eq!(inference.ty, Type::class_instance("String"));
    assert!(matches!(inference.reason, Reason::LibraryMethod(_, _)));
}
