//! Generic instantiation tests: binding generics from arguments, contextual
//! lambdas, explicit arguments, constraints, variant constructors and `new`.

use typec_ast::{Ast, AstBuilder, IntSuffix, NodeId};
use typec_common::TypeckConfig;
use typec_typeck::error::TypeErrorKind;
use typec_typeck::{InstantiationKind, TypeChecker};

// ── Helpers ────────────────────────────────────────────────────────────

fn checker() -> TypeChecker {
    TypeChecker::new(TypeckConfig::default())
}

fn type_of(tc: &mut TypeChecker, ast: &Ast, node: NodeId) -> String {
    tc.get_type(ast, node).to_string()
}

fn expected_of(tc: &mut TypeChecker, ast: &Ast, node: NodeId) -> Option<String> {
    tc.get_expected_type(ast, node).map(|t| t.to_string())
}

// ── Functions ──────────────────────────────────────────────────────────

/// `fn identity<T>(x: T): T` called with an unsuffixed literal.
#[test]
fn test_identity_defaults_literal_argument() {
    let mut ast = Ast::new();
    let b = ast.builder("identity.tc");
    let t = b.generic("T", None);
    let x = b.param("x", Some(b.ty("T")));
    let identity = b.func("identity", vec![t], vec![x], Some(b.ty("T")), Some(b.name("x")));
    let arg = b.int(42);
    let call = b.call(b.name("identity"), vec![arg]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![identity, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, identity), "fn<T>(x: T) -> T");
    assert_eq!(type_of(&mut tc, &ast, call), "i32");
    assert_eq!(expected_of(&mut tc, &ast, arg).as_deref(), Some("T"));
    assert!(tc.registry().contains(InstantiationKind::Function, "identity<i32>"));
    assert_eq!(tc.registry().count(InstantiationKind::Function), 1);
}

#[test]
fn test_explicit_generic_arguments() {
    let mut ast = Ast::new();
    let b = ast.builder("explicit.tc");
    let t = b.generic("T", None);
    let x = b.param("x", Some(b.ty("T")));
    let identity = b.func("identity", vec![t], vec![x], Some(b.ty("T")), Some(b.name("x")));
    let arg = b.int(200);
    let call = b.call_generic(b.name("identity"), vec![b.ty("u8")], vec![arg]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![identity, stmt]);

    let mut tc = checker();
    assert_eq!(expected_of(&mut tc, &ast, arg).as_deref(), Some("u8"));
    assert_eq!(type_of(&mut tc, &ast, arg), "u8");
    assert_eq!(type_of(&mut tc, &ast, call), "u8");
    assert!(tc.registry().contains(InstantiationKind::Function, "identity<u8>"));
}

/// `apply(5u32, (v) => v)` binds `T` from the concrete argument first, then
/// types the lambda's parameter from it.
#[test]
fn test_lambda_after_concrete_argument() {
    let mut ast = Ast::new();
    let b = ast.builder("apply.tc");
    let t = b.generic("T", None);
    let u = b.generic("U", None);
    let x = b.param("x", Some(b.ty("T")));
    let f = b.param(
        "f",
        Some(b.fn_ty(vec![b.param("value", Some(b.ty("T")))], b.ty("U"))),
    );
    let body = b.call(b.name("f"), vec![b.name("x")]);
    let apply = b.func("apply", vec![t, u], vec![x, f], Some(b.ty("U")), Some(body));
    let v = b.param("v", None);
    let lambda = b.lambda(vec![v], None, b.name("v"));
    let call = b.call(b.name("apply"), vec![b.int_suffixed(5, IntSuffix::U32), lambda]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![apply, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, call), "u32");
    assert_eq!(type_of(&mut tc, &ast, v), "u32");
    assert_eq!(expected_of(&mut tc, &ast, lambda).as_deref(), Some("fn(value: u32) -> U"));
    assert!(tc.registry().contains(InstantiationKind::Function, "apply<u32, u32>"));
}

/// A generic bound to an argument that does not satisfy its constraint is
/// reported at that argument; the call still gets a type.
#[test]
fn test_constraint_violation_is_a_side_error() {
    let mut ast = Ast::new();
    let b = ast.builder("bound.tc");
    let t = b.generic("T", Some(b.ty("u32")));
    let x = b.param("x", Some(b.ty("T")));
    let only = b.func("only", vec![t], vec![x], Some(b.ty("T")), Some(b.name("x")));
    let bad_arg = b.string("hi");
    let bad = b.call(b.name("only"), vec![bad_arg]);
    let good = b.call(b.name("only"), vec![b.int_suffixed(3, IntSuffix::U8)]);
    let s1 = b.expr_stmt(bad);
    let s2 = b.expr_stmt(good);
    let doc = b.finish(vec![only, s1, s2]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, bad), "string");
    assert_eq!(type_of(&mut tc, &ast, good), "u8");

    let errors = tc.collect_errors(&ast, doc);
    assert_eq!(errors.len(), 1, "got: {:?}", errors);
    assert_eq!(errors[0].node, Some(bad_arg));
    insta::assert_snapshot!(
        errors[0].to_string(),
        @"`string` does not satisfy the constraint `T: u32`"
    );
    assert!(tc.registry().contains(InstantiationKind::Function, "only<u8>"));
}

#[test]
fn test_arity_mismatch_is_reported_on_the_call() {
    let mut ast = Ast::new();
    let b = ast.builder("arity.tc");
    let x = b.param("x", Some(b.ty("bool")));
    let f = b.func("f", vec![], vec![x], Some(b.ty("bool")), Some(b.name("x")));
    let call = b.call(b.name("f"), vec![b.boolean(true), b.boolean(false)]);
    let stmt = b.expr_stmt(call);
    let doc = b.finish(vec![f, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, call), "bool");
    let errors = tc.collect_errors(&ast, doc);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, Some(call));
    assert_eq!(
        errors[0].kind,
        TypeErrorKind::ArityMismatch {
            expected: 1,
            found: 2
        }
    );
}

// ── Classes ────────────────────────────────────────────────────────────

/// `type Box<T> = class { value: T; init(value: T); map<U>(f: fn(x: T) -> U): U }`
fn box_class(b: &AstBuilder<'_>) -> NodeId {
    let t = b.generic("T", None);
    let value = b.attribute("value", b.ty("T"));
    let init = b.method(
        "init",
        vec![b.param("value", Some(b.ty("T")))],
        None,
        Some(b.block(vec![])),
    );
    let u = b.generic("U", None);
    let f = b.param("f", Some(b.fn_ty(vec![b.param("x", Some(b.ty("T")))], b.ty("U"))));
    let map = b.generic_method("map", vec![u], vec![f], Some(b.ty("U")), None);
    b.type_decl("Box", vec![t], b.class_ty(vec![], vec![value], vec![init, map], vec![]))
}

#[test]
fn test_new_infers_class_arguments() {
    let mut ast = Ast::new();
    let b = ast.builder("box.tc");
    let decl = box_class(&b);
    let created = b.new_object(b.ty("Box"), vec![b.int_suffixed(5, IntSuffix::U32)]);
    let boxed = b.var("boxed", None, Some(created));
    let read = b.member(b.name("boxed"), "value");
    let stmt = b.expr_stmt(read);
    b.finish(vec![decl, boxed, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, created), "Box<u32>");
    assert_eq!(type_of(&mut tc, &ast, read), "u32");
    assert!(tc.registry().contains(InstantiationKind::Class, "Box<u32>"));
}

#[test]
fn test_generic_method_on_generic_class() {
    let mut ast = Ast::new();
    let b = ast.builder("map.tc");
    let decl = box_class(&b);
    let annotated = b.ty_ref("Box", vec![b.ty("u32")]);
    let bx = b.var("bx", Some(annotated), None);
    let v = b.param("v", None);
    let lambda = b.lambda(vec![v], None, b.string("s"));
    let call = b.call(b.member(b.name("bx"), "map"), vec![lambda]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![decl, bx, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, call), "string");
    assert_eq!(type_of(&mut tc, &ast, v), "u32");
    let registry = tc.registry();
    assert!(registry.contains(InstantiationKind::Class, "Box<u32>"));
    assert!(registry.contains(InstantiationKind::Method, "Box<u32>.map<string>"));
    assert_eq!(registry.mangled_name("Box<u32>.map<string>"), "Box_u32_map_string");
}

// ── Variants ───────────────────────────────────────────────────────────

/// `var r: Result<u32, string> = Result.Ok(1)`: the annotation seeds the
/// constructor's generics, so the literal is a `u32`.
#[test]
fn test_variant_constructor_uses_expected_arguments() {
    let mut ast = Ast::new();
    let b = ast.builder("result.tc");
    let t = b.generic("T", None);
    let e = b.generic("E", None);
    let ok = b.ctor("Ok", vec![b.param("value", Some(b.ty("T")))]);
    let err = b.ctor("Err", vec![b.param("error", Some(b.ty("E")))]);
    let decl = b.type_decl("Result", vec![t, e], b.variant_ty(vec![ok, err]));
    let arg = b.int(1);
    let call = b.call(b.member(b.name("Result"), "Ok"), vec![arg]);
    let annotation = b.ty_ref("Result", vec![b.ty("u32"), b.ty("string")]);
    let r = b.var("r", Some(annotation), Some(call));
    let bare_arg = b.int(2);
    let bare = b.call(b.member(b.name("Result"), "Ok"), vec![bare_arg]);
    let stmt = b.expr_stmt(bare);
    b.finish(vec![decl, r, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, arg), "u32");
    assert_eq!(type_of(&mut tc, &ast, call), "Result.Ok<u32, string>");
    assert_eq!(type_of(&mut tc, &ast, r), "Result<u32, string>");
    // Without an expectation `E` has nothing to bind to.
    assert_eq!(type_of(&mut tc, &ast, bare_arg), "i32");
    assert_eq!(type_of(&mut tc, &ast, bare), "Result.Ok<i32, never>");
}
