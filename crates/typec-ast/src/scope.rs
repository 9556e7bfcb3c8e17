//! Default lexical name resolution.
//!
//! Fills the `target` of every unresolved [`NodeKind::Name`],
//! [`NodeKind::RefType`] and [`NodeKind::PatVariant`] in a document. Targets
//! that are already set (by a front end with its own resolver) are kept, and
//! names that cannot be found stay `None` for the type checker to report.
//!
//! Module-level declarations of every document are visible everywhere. Values
//! and types live in separate namespaces; a name in value position falls back
//! to the type namespace so `Result.Ok(1)` finds the `Result` declaration.

use rustc_hash::FxHashMap;
use typec_common::DocumentId;

use crate::node::{NodeId, NodeKind};
use crate::Ast;

#[derive(Default)]
struct Scope {
    values: FxHashMap<String, NodeId>,
    types: FxHashMap<String, NodeId>,
}

struct Resolver<'a> {
    ast: &'a Ast,
    scopes: Vec<Scope>,
    found: Vec<(NodeId, NodeId)>,
}

/// Resolve the cross-references of `doc` in place.
pub fn resolve_names(ast: &mut Ast, doc: DocumentId) {
    let Some(root) = ast.root(doc) else {
        return;
    };
    let found = {
        let shared: &Ast = ast;
        let mut resolver = Resolver {
            ast: shared,
            scopes: vec![globals(shared)],
            found: Vec::new(),
        };
        resolver.visit(root);
        resolver.found
    };
    for (node, resolved) in found {
        match &mut ast.nodes[node.0 as usize].kind {
            NodeKind::Name { target, .. }
            | NodeKind::RefType { target, .. }
            | NodeKind::PatVariant { target, .. } => *target = Some(resolved),
            _ => {}
        }
    }
}

fn globals(ast: &Ast) -> Scope {
    let mut scope = Scope::default();
    for doc in ast.documents() {
        let Some(root) = doc.root else { continue };
        let NodeKind::Module { items } = ast.kind(root) else {
            continue;
        };
        for &item in items {
            match ast.kind(item) {
                NodeKind::TypeDecl { name, .. } => {
                    scope.types.insert(name.clone(), item);
                }
                NodeKind::FnDecl { name, .. } | NodeKind::VarDecl { name, .. } => {
                    scope.values.insert(name.clone(), item);
                }
                _ => {}
            }
        }
    }
    scope
}

impl<'a> Resolver<'a> {
    fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare_value(&mut self, name: &str, node: NodeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.to_string(), node);
        }
    }

    fn declare_type(&mut self, name: &str, node: NodeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.types.insert(name.to_string(), node);
        }
    }

    fn lookup_value(&self, name: &str) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.values.get(name).or_else(|| s.types.get(name)).copied())
    }

    fn lookup_type(&self, name: &str) -> Option<NodeId> {
        self.scopes.iter().rev().find_map(|s| s.types.get(name).copied())
    }

    fn visit_all(&mut self, nodes: &[NodeId]) {
        for &n in nodes {
            self.visit(n);
        }
    }

    fn declare_generics(&mut self, generics: &[NodeId]) {
        for &g in generics {
            if let NodeKind::GenericParam { name, .. } = self.ast.kind(g) {
                self.declare_type(name, g);
            }
        }
        self.visit_all(generics);
    }

    fn visit_signature(&mut self, generics: &[NodeId], params: &[NodeId], ret: Option<NodeId>) {
        self.declare_generics(generics);
        for &p in params {
            self.visit(p);
            if let NodeKind::Param { name, .. } = self.ast.kind(p) {
                self.declare_value(name, p);
            }
        }
        if let Some(ret) = ret {
            self.visit(ret);
        }
    }

    fn visit(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::FnDecl { generics, params, ret, body, .. }
            | NodeKind::Method { generics, params, ret, body, .. } => {
                self.push();
                self.visit_signature(generics, params, *ret);
                if let Some(body) = body {
                    self.visit(*body);
                }
                self.pop();
            }
            NodeKind::MethodSig { generics, params, ret, .. } => {
                self.push();
                self.visit_signature(generics, params, Some(*ret));
                self.pop();
            }
            NodeKind::Lambda { params, ret, body } => {
                self.push();
                self.visit_signature(&[], params, *ret);
                self.visit(*body);
                self.pop();
            }
            NodeKind::TypeDecl { generics, body, .. } => {
                self.push();
                self.declare_generics(generics);
                self.visit(*body);
                self.pop();
            }
            NodeKind::Block { stmts } => {
                self.push();
                for &stmt in stmts {
                    match ast.kind(stmt) {
                        NodeKind::FnDecl { name, .. } => {
                            self.declare_value(name, stmt);
                            self.visit(stmt);
                        }
                        NodeKind::VarDecl { name, .. } => {
                            self.visit(stmt);
                            self.declare_value(name, stmt);
                        }
                        _ => self.visit(stmt),
                    }
                }
                self.pop();
            }
            NodeKind::ForRange { binding, start, end, step, body } => {
                self.visit(*start);
                self.visit(*end);
                if let Some(step) = step {
                    self.visit(*step);
                }
                self.push();
                if let NodeKind::Binding { name } = ast.kind(*binding) {
                    self.declare_value(name, *binding);
                }
                self.visit(*body);
                self.pop();
            }
            NodeKind::MatchCase { pattern, guard, body } => {
                self.push();
                self.visit(*pattern);
                if let Some(guard) = guard {
                    self.visit(*guard);
                }
                self.visit(*body);
                self.pop();
            }
            NodeKind::PatBinding { name } | NodeKind::PatRest { name } => {
                self.declare_value(name, id);
            }
            NodeKind::PatVariant { path, args, target } => {
                if target.is_none() {
                    if let Some(ctor) = self.lookup_ctor(path) {
                        self.found.push((id, ctor));
                    }
                }
                self.visit_all(args);
            }
            NodeKind::Name { name, target: None } => {
                if let Some(t) = self.lookup_value(name) {
                    self.found.push((id, t));
                }
            }
            NodeKind::RefType { name, args, target } => {
                if target.is_none() {
                    if let Some(t) = self.lookup_type(name) {
                        self.found.push((id, t));
                    }
                }
                self.visit_all(args);
            }
            kind => {
                let children = kind.children();
                self.visit_all(&children);
            }
        }
    }

    /// `Type.Ctor` through the named type, or a bare `Ctor` through every
    /// variant declared at module level.
    fn lookup_ctor(&self, path: &str) -> Option<NodeId> {
        let ast = self.ast;
        let ctor_in = |decl: NodeId, ctor_name: &str| -> Option<NodeId> {
            let NodeKind::TypeDecl { body, .. } = ast.kind(decl) else {
                return None;
            };
            let NodeKind::VariantType { constructors } = ast.kind(*body) else {
                return None;
            };
            constructors
                .iter()
                .copied()
                .find(|c| matches!(ast.kind(*c), NodeKind::VariantCtor { name, .. } if name == ctor_name))
        };
        match path.rsplit_once('.') {
            Some((type_name, ctor_name)) => ctor_in(self.lookup_type(type_name)?, ctor_name),
            None => {
                let mut decls: Vec<NodeId> = self
                    .scopes
                    .iter()
                    .flat_map(|s| s.types.values().copied())
                    .collect();
                decls.sort();
                decls.into_iter().find_map(|d| ctor_in(d, path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ast: &Ast, id: NodeId) -> Option<NodeId> {
        match ast.kind(id) {
            NodeKind::Name { target, .. }
            | NodeKind::RefType { target, .. }
            | NodeKind::PatVariant { target, .. } => *target,
            _ => None,
        }
    }

    #[test]
    fn params_shadow_globals_and_recursion_sees_itself() {
        let mut ast = Ast::new();
        let b = ast.builder("scope.tc");
        let global_n = b.var("n", None, Some(b.int(0)));
        let use_n = b.name("n");
        let use_f = b.name("f");
        let body = b.call(use_f, vec![use_n]);
        let n = b.param("n", Some(b.ty("u32")));
        let f = b.func("f", vec![], vec![n], None, Some(body));
        b.finish(vec![global_n, f]);

        assert_eq!(target(&ast, use_n), Some(n));
        assert_eq!(target(&ast, use_f), Some(f));
    }

    #[test]
    fn let_initializer_sees_outer_binding() {
        let mut ast = Ast::new();
        let b = ast.builder("scope.tc");
        let outer = b.param("x", Some(b.ty("u32")));
        let inner_init = b.name("x");
        let inner = b.var("x", None, Some(inner_init));
        let after = b.name("x");
        let body = b.block(vec![inner, b.ret(Some(after))]);
        let g = b.func("g", vec![], vec![outer], None, Some(body));
        b.finish(vec![g]);

        assert_eq!(target(&ast, inner_init), Some(outer));
        assert_eq!(target(&ast, after), Some(inner));
    }

    #[test]
    fn generic_params_and_variant_paths() {
        let mut ast = Ast::new();
        let b = ast.builder("scope.tc");
        let t = b.generic("T", None);
        let t_use = b.ty("T");
        let ok = b.ctor("Ok", vec![b.param("value", Some(t_use))]);
        let decl = b.type_decl("Result", vec![t], b.variant_ty(vec![ok]));
        let qualified = b.p_variant("Result.Ok", vec![b.p_bind("v")]);
        let bare = b.p_variant("Ok", vec![b.p_wild()]);
        let m = b.match_expr(
            b.int(1),
            vec![b.case(qualified, b.int(1)), b.case(bare, b.int(2))],
        );
        let stmt = b.expr_stmt(m);
        b.finish(vec![decl, stmt]);

        assert_eq!(target(&ast, t_use), Some(t));
        assert_eq!(target(&ast, qualified), Some(ok));
        assert_eq!(target(&ast, bare), Some(ok));
    }

    #[test]
    fn declarations_in_other_documents_are_visible() {
        let mut ast = Ast::new();
        let b = ast.builder("lib.tc");
        let decl = b.type_decl("Point", vec![], b.struct_ty(vec![("x", b.ty("u32"))]));
        b.finish(vec![decl]);

        let b = ast.builder("main.tc");
        let r = b.ty("Point");
        let p = b.var("p", Some(r), None);
        b.finish(vec![p]);
        assert_eq!(target(&ast, r), Some(decl));
    }
}
