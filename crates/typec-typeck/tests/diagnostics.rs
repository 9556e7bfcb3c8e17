//! Error collection and rendering tests.
//!
//! Errors are values inside types; these tests check that a document's
//! errors are gathered once per origin, stay with the document they come
//! from, and render through the ariadne and JSON paths.

use typec_ast::{Ast, IntSuffix, NodeId, UnOp};
use typec_common::{DocumentId, TypeckConfig};
use typec_typeck::diagnostics::DiagnosticOptions;
use typec_typeck::error::TypeErrorKind;
use typec_typeck::TypeChecker;

// ── Helpers ────────────────────────────────────────────────────────────

fn checker() -> TypeChecker {
    TypeChecker::new(TypeckConfig::default())
}

const DUPLICATE_SRC: &str = "var p = {x: 1, x: 2}";

/// `var p = {x: 1, x: 2}` with spans matching `DUPLICATE_SRC`.
fn duplicate_field(ast: &mut Ast) -> (DocumentId, NodeId) {
    let b = ast.builder("dup.tc");
    let one = b.at(b.int(1), 12, 13);
    let two = b.at(b.int(2), 18, 19);
    let lit = b.struct_lit(vec![("x", one), ("x", two)]);
    let p = b.at(b.var("p", None, Some(lit)), 0, 20);
    (b.finish(vec![p]), p)
}

// ── Collection ─────────────────────────────────────────────────────────

#[test]
fn test_well_typed_document_has_no_errors() {
    let mut ast = Ast::new();
    let b = ast.builder("ok.tc");
    let x = b.var("x", Some(b.ty("u64")), Some(b.int(3)));
    let y = b.var("y", None, Some(b.array(vec![b.name("x"), b.name("x")])));
    let doc = b.finish(vec![x, y]);

    let mut tc = checker();
    assert!(tc.collect_errors(&ast, doc).is_empty());
    assert_eq!(tc.get_type(&ast, y).to_string(), "u64[]");
}

#[test]
fn test_duplicate_field_reported_once() {
    let mut ast = Ast::new();
    let (doc, p) = duplicate_field(&mut ast);

    let mut tc = checker();
    let errors = tc.collect_errors(&ast, doc);
    assert_eq!(errors.len(), 1, "got: {:?}", errors);
    assert_eq!(
        errors[0].kind,
        TypeErrorKind::DuplicateField { name: "x".into() }
    );
    // The literal keeps the first initializer.
    assert_eq!(tc.get_type(&ast, p).to_string(), "{x: i32}");
}

#[test]
fn test_errors_stay_in_their_document() {
    let mut ast = Ast::new();
    let b = ast.builder("lib.tc");
    let body = b.block(vec![b.ret(Some(b.name("missing")))]);
    let broken = b.func("broken", vec![], vec![], None, Some(body));
    let lib = b.finish(vec![broken]);

    let b = ast.builder("main.tc");
    let r = b.var("r", None, Some(b.call(b.name("broken"), vec![])));
    let main = b.finish(vec![r]);

    let mut tc = checker();
    assert!(tc.get_type(&ast, r).is_error());
    assert!(tc.collect_errors(&ast, main).is_empty());
    let lib_errors = tc.collect_errors(&ast, lib);
    assert_eq!(lib_errors.len(), 1);
    insta::assert_snapshot!(lib_errors[0].to_string(), @"cannot resolve `missing`");
}

#[test]
fn test_node_errors_include_side_errors() {
    let mut ast = Ast::new();
    let b = ast.builder("neg.tc");
    let operand = b.int_suffixed(4, IntSuffix::U8);
    let neg = b.unary(UnOp::Neg, operand);
    let stmt = b.expr_stmt(neg);
    b.finish(vec![stmt]);

    let mut tc = checker();
    let errors = tc.node_errors(&ast, neg);
    assert_eq!(errors.len(), 1);
    insta::assert_snapshot!(errors[0].to_string(), @"type mismatch: expected `i8`, found `u8`");
}

#[test]
fn test_negating_nullable_unsigned_names_the_inner_type() {
    let mut ast = Ast::new();
    let b = ast.builder("neg_null.tc");
    let n = b.var("n", Some(b.nullable_ty(b.ty("u16"))), None);
    let neg = b.unary(UnOp::Neg, b.name("n"));
    let stmt = b.expr_stmt(neg);
    let doc = b.finish(vec![n, stmt]);

    let mut tc = checker();
    let errors = tc.collect_errors(&ast, doc);
    assert_eq!(errors.len(), 1, "got: {:?}", errors);
    assert_eq!(errors[0].node, Some(neg));
    insta::assert_snapshot!(errors[0].to_string(), @"type mismatch: expected `i16`, found `u16`");
}

// ── Rendering ──────────────────────────────────────────────────────────

#[test]
fn test_render_json() {
    let mut ast = Ast::new();
    let (doc, _) = duplicate_field(&mut ast);

    let mut tc = checker();
    let rendered = tc.render_errors(&ast, doc, DUPLICATE_SRC, &DiagnosticOptions::json_mode());
    assert_eq!(rendered.len(), 1);
    insta::assert_snapshot!(rendered[0], @r#"{"code":"E0007","severity":"error","message":"field `x` is initialized more than once","file":"dup.tc","spans":[{"start":18,"end":19,"line":1,"column":19,"label":"initialized again here"}],"help":"remove one of the `x` initializers"}"#);
}

#[test]
fn test_render_text() {
    let mut ast = Ast::new();
    let (doc, _) = duplicate_field(&mut ast);

    let mut tc = checker();
    let rendered = tc.render_errors(&ast, doc, DUPLICATE_SRC, &DiagnosticOptions::colorless());
    assert_eq!(rendered.len(), 1);
    let text = &rendered[0];
    assert!(text.contains("E0007"), "got: {text}");
    assert!(text.contains("field `x` is initialized more than once"), "got: {text}");
    assert!(text.contains("initialized again here"), "got: {text}");
    assert!(text.contains("dup.tc:1:19"), "got: {text}");
    assert!(!text.contains('\u{1b}'), "colorless output has escape codes: {text}");
}

#[test]
fn test_unknown_member_on_nullable_names_the_inner_type() {
    let mut ast = Ast::new();
    let b = ast.builder("member.tc");
    let n = b.var("n", Some(b.nullable_ty(b.ty("string"))), None);
    let access = b.at(b.member(b.at(b.name("n"), 0, 1), "size"), 0, 6);
    let stmt = b.expr_stmt(access);
    let doc = b.finish(vec![n, stmt]);

    let mut tc = checker();
    let rendered = tc.render_errors(&ast, doc, "n.size", &DiagnosticOptions::json_mode());
    assert_eq!(rendered.len(), 1);
    let json: serde_json::Value = serde_json::from_str(&rendered[0]).expect("valid json");
    assert_eq!(json["code"], "E0006");
    assert_eq!(json["message"], "type `string` has no member `size`");
    assert_eq!(json["spans"][0]["label"], "no member `size`");
    assert!(json["help"].is_null());
}
