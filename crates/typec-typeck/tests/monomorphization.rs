//! Monomorphization registry tests: which instantiations inference records,
//! how repeated and aliased uses collapse, and the registry's lifetime.

use typec_ast::{Ast, AstBuilder, NodeId};
use typec_common::{DocumentId, TypeckConfig};
use typec_typeck::{InstantiationKind, TypeChecker};

// ── Helpers ────────────────────────────────────────────────────────────

/// `type Array<T> = class { items: T[] }`
fn array_class(b: &AstBuilder<'_>) -> NodeId {
    let t = b.generic("T", None);
    let items = b.attribute("items", b.array_ty(b.ty("T")));
    b.type_decl("Array", vec![t], b.class_ty(vec![], vec![items], vec![], vec![]))
}

/// `Array<u32>` named directly and through two alias hops.
fn aliased_arrays(ast: &mut Ast) -> (DocumentId, Vec<NodeId>) {
    let b = ast.builder("alias.tc");
    let array = array_class(&b);
    let numbers = b.type_decl("Numbers", vec![], b.ty_ref("Array", vec![b.ty("u32")]));
    let counts = b.type_decl("Counts", vec![], b.ty("Numbers"));
    let direct = b.var("direct", Some(b.ty_ref("Array", vec![b.ty("u32")])), None);
    let one_hop = b.var("one_hop", Some(b.ty("Numbers")), None);
    let two_hops = b.var("two_hops", Some(b.ty("Counts")), None);
    let strings = b.var("strings", Some(b.ty_ref("Array", vec![b.ty("string")])), None);
    let doc = b.finish(vec![array, numbers, counts, direct, one_hop, two_hops, strings]);
    (doc, vec![direct, one_hop, two_hops, strings])
}

fn class_keys(tc: &TypeChecker) -> Vec<String> {
    tc.registry()
        .classes()
        .iter()
        .map(|c| c.key.clone())
        .collect()
}

// ── Registration ───────────────────────────────────────────────────────

#[test]
fn test_alias_chain_registers_once() {
    let mut ast = Ast::new();
    let (_, vars) = aliased_arrays(&mut ast);

    let mut tc = TypeChecker::new(TypeckConfig::default());
    let rendered: Vec<String> = vars.iter().map(|v| tc.get_type(&ast, *v).to_string()).collect();
    assert_eq!(rendered, ["Array<u32>", "Array<u32>", "Array<u32>", "Array<string>"]);
    assert_eq!(class_keys(&tc), ["Array<u32>", "Array<string>"]);
    assert_eq!(tc.registry().count(InstantiationKind::Class), 2);
}

#[test]
fn test_generic_declaration_alone_registers_nothing() {
    let mut ast = Ast::new();
    let b = ast.builder("open.tc");
    let array = array_class(&b);
    let t = b.generic("T", None);
    let xs = b.param("xs", Some(b.ty_ref("Array", vec![b.ty("T")])));
    let len = b.func("len", vec![t], vec![xs], Some(b.ty("u64")), None);
    b.finish(vec![array, len]);

    let mut tc = TypeChecker::new(TypeckConfig::default());
    assert_eq!(tc.get_type(&ast, len).to_string(), "fn<T>(xs: Array<T>) -> u64");
    assert!(tc.registry().is_empty());
}

#[test]
fn test_registry_survives_invalidation() {
    let mut ast = Ast::new();
    let (doc, vars) = aliased_arrays(&mut ast);

    let mut tc = TypeChecker::new(TypeckConfig::default());
    for v in &vars {
        tc.get_type(&ast, *v);
    }
    assert!(tc.invalidate_cache(doc));
    assert_eq!(tc.registry().count(InstantiationKind::Class), 2);

    // Re-inferring after invalidation finds the same instantiations.
    for v in &vars {
        tc.get_type(&ast, *v);
    }
    assert_eq!(class_keys(&tc), ["Array<u32>", "Array<string>"]);

    tc.registry_mut().clear();
    assert!(tc.registry().is_empty());
}

#[test]
fn test_disabled_recording() {
    let mut ast = Ast::new();
    let (_, vars) = aliased_arrays(&mut ast);

    let config = TypeckConfig {
        record_instantiations: false,
        ..TypeckConfig::default()
    };
    let mut tc = TypeChecker::new(config);
    assert_eq!(tc.get_type(&ast, vars[0]).to_string(), "Array<u32>");
    assert!(tc.registry().is_empty());
    assert!(!tc.config().record_instantiations);
}

#[test]
fn test_mangled_names_use_configured_separator() {
    let mut ast = Ast::new();
    let (_, vars) = aliased_arrays(&mut ast);

    let config = TypeckConfig {
        mangle_separator: '$',
        ..TypeckConfig::default()
    };
    let mut tc = TypeChecker::new(config);
    tc.get_type(&ast, vars[3]);
    let registry = tc.registry();
    let mangled: Vec<String> = registry
        .keys()
        .into_iter()
        .map(|(_, key)| registry.mangled_name(key))
        .collect();
    assert_eq!(mangled, ["Array$string"]);
}
