//! Member lookup tests: shadowing between class and implementation methods,
//! overrides of superclass methods, overloads, operator methods, callable
//! classes and members reached through a type name.

use typec_ast::{Ast, AstBuilder, BinOp, IntSuffix, NodeId, NodeKind};
use typec_common::TypeckConfig;
use typec_typeck::{MemberKind, TypeChecker};

// ── Helpers ────────────────────────────────────────────────────────────

fn checker() -> TypeChecker {
    TypeChecker::new(TypeckConfig::default())
}

fn type_of(tc: &mut TypeChecker, ast: &Ast, node: NodeId) -> String {
    tc.get_type(ast, node).to_string()
}

/// ```text
/// type Extra = impl { area(): f32; perimeter(): f64 }
/// type Square = class { side: f64; area(scale: f64): f64 } with Extra
/// ```
fn square(b: &AstBuilder<'_>) -> Vec<NodeId> {
    let extra = b.type_decl(
        "Extra",
        vec![],
        b.impl_ty(
            vec![],
            vec![
                b.method("area", vec![], Some(b.ty("f32")), None),
                b.method("perimeter", vec![], Some(b.ty("f64")), None),
            ],
        ),
    );
    let side = b.attribute("side", b.ty("f64"));
    let area = b.method(
        "area",
        vec![b.param("scale", Some(b.ty("f64")))],
        Some(b.ty("f64")),
        None,
    );
    let square = b.type_decl(
        "Square",
        vec![],
        b.class_ty(vec![], vec![side], vec![area], vec![b.ty("Extra")]),
    );
    vec![extra, square]
}

/// ```text
/// type Base = class { describe(n: u32): string }
/// type Derived = class extends Base { describe(): bool }
/// ```
fn derived(b: &AstBuilder<'_>, is_override: bool) -> Vec<NodeId> {
    let base_describe = b.method(
        "describe",
        vec![b.param("n", Some(b.ty("u32")))],
        Some(b.ty("string")),
        None,
    );
    let base = b.type_decl(
        "Base",
        vec![],
        b.class_ty(vec![], vec![], vec![base_describe], vec![]),
    );
    let describe = b.node(NodeKind::Method {
        name: "describe".to_string(),
        generics: vec![],
        params: vec![],
        ret: Some(b.ty("bool")),
        body: None,
        is_override,
        is_static: false,
    });
    let derived = b.type_decl(
        "Derived",
        vec![],
        b.class_ty(vec![b.ty("Base")], vec![], vec![describe], vec![]),
    );
    let d = b.var("d", Some(b.ty("Derived")), None);
    vec![base, derived, d]
}

fn listing(tc: &mut TypeChecker, ast: &Ast, node: NodeId) -> String {
    let ty = tc.get_type(ast, node);
    tc.identifiable_fields(ast, &ty)
        .iter()
        .map(|m| format!("{}: {}", m.name, m.ty))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Listings ───────────────────────────────────────────────────────────

#[test]
fn test_impl_methods_listed_after_class_members() {
    let mut ast = Ast::new();
    let b = ast.builder("square.tc");
    let mut items = square(&b);
    let sq = b.var("sq", Some(b.ty("Square")), None);
    items.push(sq);
    b.finish(items);

    let mut tc = checker();
    let sq_ty = tc.get_type(&ast, sq);
    let listing: Vec<String> = tc
        .identifiable_fields(&ast, &sq_ty)
        .iter()
        .map(|m| format!("{}: {}", m.name, m.ty))
        .collect();
    insta::assert_snapshot!(listing.join("\n"), @r"
    side: f64
    area: fn(scale: f64) -> f64
    area: fn() -> f32
    perimeter: fn() -> f64
    ");
}

#[test]
fn test_class_method_shadows_same_signature() {
    let mut ast = Ast::new();
    let b = ast.builder("shadow.tc");
    let extra = b.type_decl(
        "Extra",
        vec![],
        b.impl_ty(vec![], vec![b.method("area", vec![], Some(b.ty("f32")), None)]),
    );
    let area = b.method("area", vec![], Some(b.ty("f64")), None);
    let square = b.type_decl(
        "Square",
        vec![],
        b.class_ty(vec![], vec![], vec![area], vec![b.ty("Extra")]),
    );
    let sq = b.var("sq", Some(b.ty("Square")), None);
    let call = b.call(b.member(b.name("sq"), "area"), vec![]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![extra, square, sq, stmt]);

    let mut tc = checker();
    let sq_ty = tc.get_type(&ast, sq);
    let members = tc.identifiable_fields(&ast, &sq_ty);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].kind, MemberKind::Method);
    assert_eq!(members[0].decl, Some(area));
    assert_eq!(type_of(&mut tc, &ast, call), "f64");
}

#[test]
fn test_overloads_selected_by_arity() {
    let mut ast = Ast::new();
    let b = ast.builder("overload.tc");
    let mut items = square(&b);
    let sq = b.var("sq", Some(b.ty("Square")), None);
    let scaled_arg = b.float("2.0");
    let scaled = b.call(b.member(b.name("sq"), "area"), vec![scaled_arg]);
    let plain = b.call(b.member(b.name("sq"), "area"), vec![]);
    items.push(sq);
    items.push(b.expr_stmt(scaled));
    items.push(b.expr_stmt(plain));
    b.finish(items);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, scaled), "f64");
    assert_eq!(type_of(&mut tc, &ast, plain), "f32");
    assert_eq!(type_of(&mut tc, &ast, scaled_arg), "f64");
}

#[test]
fn test_override_hides_inherited_overloads() {
    let mut ast = Ast::new();
    let b = ast.builder("override.tc");
    let mut items = derived(&b, true);
    let d = items[2];
    let call = b.call(b.member(b.name("d"), "describe"), vec![]);
    items.push(b.expr_stmt(call));
    b.finish(items);

    let mut tc = checker();
    insta::assert_snapshot!(listing(&mut tc, &ast, d), @"describe: fn() -> bool");
    assert_eq!(type_of(&mut tc, &ast, call), "bool");
}

#[test]
fn test_inherited_overload_kept_without_override() {
    let mut ast = Ast::new();
    let b = ast.builder("overload_super.tc");
    let mut items = derived(&b, false);
    let d = items[2];
    let arg = b.int(4);
    let inherited = b.call(b.member(b.name("d"), "describe"), vec![arg]);
    items.push(b.expr_stmt(inherited));
    b.finish(items);

    let mut tc = checker();
    insta::assert_snapshot!(listing(&mut tc, &ast, d), @r"
    describe: fn() -> bool
    describe: fn(n: u32) -> string
    ");
    assert_eq!(type_of(&mut tc, &ast, inherited), "string");
    assert_eq!(type_of(&mut tc, &ast, arg), "u32");
}

// ── Operators and callables ────────────────────────────────────────────

#[test]
fn test_operator_method_overloads_addition() {
    let mut ast = Ast::new();
    let b = ast.builder("vec2.tc");
    let add = b.method(
        "__add__",
        vec![b.param("other", Some(b.ty("Vec2")))],
        Some(b.ty("Vec2")),
        None,
    );
    let vec2 = b.type_decl(
        "Vec2",
        vec![],
        b.class_ty(vec![], vec![b.attribute("x", b.ty("f32"))], vec![add], vec![]),
    );
    let a = b.var("a", Some(b.ty("Vec2")), None);
    let sum = b.binary(BinOp::Add, b.name("a"), b.name("a"));
    let cmp = b.binary(BinOp::Eq, b.name("a"), b.name("a"));
    let s1 = b.expr_stmt(sum);
    let s2 = b.expr_stmt(cmp);
    b.finish(vec![vec2, a, s1, s2]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, sum), "Vec2");
    assert_eq!(type_of(&mut tc, &ast, cmp), "bool");
}

#[test]
fn test_callable_class() {
    let mut ast = Ast::new();
    let b = ast.builder("callable.tc");
    let call_method = b.method(
        "__call__",
        vec![b.param("n", Some(b.ty("u16")))],
        Some(b.ty("bool")),
        None,
    );
    let pred = b.type_decl(
        "Pred",
        vec![],
        b.class_ty(vec![], vec![], vec![call_method], vec![]),
    );
    let p = b.var("p", Some(b.ty("Pred")), None);
    let arg = b.int(7);
    let call = b.call(b.name("p"), vec![arg]);
    let stmt = b.expr_stmt(call);
    b.finish(vec![pred, p, stmt]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, call), "bool");
    assert_eq!(type_of(&mut tc, &ast, arg), "u16");
}

#[test]
fn test_callable_prefers_exact_overload() {
    let mut ast = Ast::new();
    let b = ast.builder("exact_call.tc");
    let wide = b.method(
        "__call__",
        vec![b.param("n", Some(b.ty("u64")))],
        Some(b.ty("string")),
        None,
    );
    let narrow = b.method(
        "__call__",
        vec![b.param("n", Some(b.ty("u8")))],
        Some(b.ty("bool")),
        None,
    );
    let pred = b.type_decl(
        "Pred",
        vec![],
        b.class_ty(vec![], vec![], vec![wide, narrow], vec![]),
    );
    let p = b.var("p", Some(b.ty("Pred")), None);
    let exact = b.call(b.name("p"), vec![b.int_suffixed(5, IntSuffix::U8)]);
    let widened = b.call(b.name("p"), vec![b.int_suffixed(5, IntSuffix::U32)]);
    let s1 = b.expr_stmt(exact);
    let s2 = b.expr_stmt(widened);
    b.finish(vec![pred, p, s1, s2]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, exact), "bool");
    assert_eq!(type_of(&mut tc, &ast, widened), "string");
}

// ── Through a type name ────────────────────────────────────────────────

#[test]
fn test_static_attribute_and_enum_case() {
    let mut ast = Ast::new();
    let b = ast.builder("statics.tc");
    let total = b.node(NodeKind::Attribute {
        name: "total".to_string(),
        ty: b.ty("u64"),
        is_static: true,
        is_const: false,
    });
    let id = b.attribute("id", b.ty("u32"));
    let counter = b.type_decl(
        "Counter",
        vec![],
        b.class_ty(vec![], vec![total, id], vec![], vec![]),
    );
    let color = b.type_decl("Color", vec![], b.enum_ty(&["Red", "Green"]));
    let read_total = b.member(b.name("Counter"), "total");
    let red = b.member(b.name("Color"), "Red");
    let instance_id = b.member(b.name("Counter"), "id");
    let s1 = b.expr_stmt(read_total);
    let s2 = b.expr_stmt(red);
    let s3 = b.expr_stmt(instance_id);
    b.finish(vec![counter, color, s1, s2, s3]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, read_total), "u64");
    assert_eq!(type_of(&mut tc, &ast, red), "Color");
    // Instance attributes are not reachable through the type.
    assert!(tc.get_type(&ast, instance_id).is_error());
}

#[test]
fn test_tuple_positions_and_length() {
    let mut ast = Ast::new();
    let b = ast.builder("tuple.tc");
    let pair = b.var(
        "pair",
        Some(b.tuple_ty(vec![b.ty("string"), b.array_ty(b.ty("u8"))])),
        None,
    );
    let second = b.member(b.name("pair"), "1");
    let len = b.member(b.member(b.name("pair"), "0"), "length");
    let s1 = b.expr_stmt(second);
    let s2 = b.expr_stmt(len);
    b.finish(vec![pair, s1, s2]);

    let mut tc = checker();
    assert_eq!(type_of(&mut tc, &ast, second), "u8[]");
    assert_eq!(type_of(&mut tc, &ast, len), "u64");
}
