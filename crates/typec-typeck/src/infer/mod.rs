//! The inference engine.
//!
//! [`Infer`] borrows the syntax tree and the [`TypeChecker`] session for one
//! query. Types are computed on demand: [`Infer::get_type`] serves a node from
//! the per-document cache or computes it through [`Infer::compute_type`],
//! which dispatches on the node kind to the rules in the submodules:
//!
//! - `decl`: type expressions, declarations, reference resolution, stubs
//! - `expr`: literals, names, operators, conditionals, lambdas, literals of
//!   composite types
//! - `expected`: contextual types flowing down from the parent
//! - `member`: member access and member listings
//! - `call`: calls, `new`, overload selection and generic instantiation
//! - `pattern`: bindings introduced by match patterns
//!
//! Re-entrant inference is cut by the in-flight tracker: declarations that
//! can reach themselves get a stub, any other node gets the recursion
//! placeholder. Nothing computed while such a stand-in was observed for a
//! still-unfinished entity is memoized.

mod call;
pub(crate) mod decl;
mod expected;
mod expr;
pub(crate) mod member;
mod pattern;

use typec_ast::{Ast, NodeId, NodeKind};

use crate::cache::{EntityKey, EntityKind};
use crate::ty::Ty;
use crate::TypeChecker;

pub use member::{Member, MemberKind};

pub(crate) struct Infer<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) tc: &'a mut TypeChecker,
}

impl<'a> Infer<'a> {
    pub(crate) fn new(ast: &'a Ast, tc: &'a mut TypeChecker) -> Self {
        Infer { ast, tc }
    }

    /// Cached type of `node`, computing it on a miss.
    pub(crate) fn get_type(&mut self, node: NodeId) -> Ty {
        let doc = self.ast.document_of(node);
        if let Some(ty) = self.tc.cache.doc(doc).and_then(|c| c.types.get(&node)) {
            return ty.clone();
        }
        let key = self.entity_key(node);
        let ty = self.guarded(
            key,
            |this| {
                this.tc.computations += 1;
                log::trace!("[infer] {} {}", this.ast.kind(node).label(), node);
                this.compute_type(node)
            },
            |this| this.stand_in(key),
        );
        if self.tc.in_flight.is_clean() {
            self.tc.cache.doc_mut(doc).types.insert(node, ty.clone());
        }
        ty
    }

    /// Run `compute` with `key` marked in flight. If `key` is already in
    /// flight the entity is tainted and `on_cycle` supplies the result instead.
    pub(crate) fn guarded<T>(
        &mut self,
        key: EntityKey,
        compute: impl FnOnce(&mut Self) -> T,
        on_cycle: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if self.tc.in_flight.contains(key) {
            self.tc.in_flight.taint(key);
            return on_cycle(self);
        }
        self.tc.in_flight.enter(key);
        let result = compute(self);
        self.tc.in_flight.exit(key);
        result
    }

    fn entity_key(&self, node: NodeId) -> EntityKey {
        let ast = self.ast;
        let kind = match ast.kind(node) {
            NodeKind::FnDecl { .. } => EntityKind::Function,
            NodeKind::TypeDecl { body, .. } => match ast.kind(*body) {
                NodeKind::ClassType { .. } | NodeKind::InterfaceType { .. } => EntityKind::Class,
                NodeKind::ImplType { .. } => EntityKind::Implementation,
                _ => EntityKind::TypeAlias,
            },
            NodeKind::Method { .. } => match ast.parent(node).map(|p| ast.kind(p)) {
                Some(NodeKind::ImplType { .. }) => EntityKind::ImplMethod,
                _ => EntityKind::Method,
            },
            _ => EntityKind::Node,
        };
        (kind, node)
    }

    /// What a re-entrant request for `key` sees.
    fn stand_in(&mut self, key: EntityKey) -> Ty {
        let (kind, node) = key;
        log::debug!("[infer] re-entered {:?} {}, using a stand-in", kind, node);
        match kind {
            EntityKind::Function | EntityKind::Method | EntityKind::ImplMethod => {
                self.signature_stub(node)
            }
            EntityKind::Class | EntityKind::Implementation => self.declaration_stub(node),
            EntityKind::TypeAlias
            | EntityKind::Node
            | EntityKind::Expected
            | EntityKind::Pattern => Ty::recursion_placeholder(Some(node)),
        }
    }

    /// The rule for every node kind.
    pub(crate) fn compute_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let kind = ast.kind(node);
        match kind {
            NodeKind::Module { .. }
            | NodeKind::Block { .. }
            | NodeKind::ExprStmt { .. }
            | NodeKind::Return { .. }
            | NodeKind::IfStmt { .. }
            | NodeKind::While { .. }
            | NodeKind::ForRange { .. }
            | NodeKind::Yield { .. } => Ty::Void,

            NodeKind::FnDecl { .. } | NodeKind::Method { .. } | NodeKind::MethodSig { .. } => {
                self.signature_type(node)
            }
            NodeKind::Param { .. } => self.param_type(node),
            NodeKind::GenericParam { name, constraint } => {
                let constraint = constraint.map(|c| self.annotation(c));
                Ty::generic(name.clone(), constraint, Some(node))
            }
            NodeKind::VarDecl { name, ty, init, .. } => match (ty, init) {
                (Some(ty), _) => self.annotation(*ty),
                (None, Some(init)) => self.get_type(*init),
                (None, None) => Ty::unsupported(
                    format!("cannot infer the type of `{}` without an initializer", name),
                    Some(node),
                ),
            },
            NodeKind::TypeDecl { .. } => self.declared_type(node),
            NodeKind::Attribute { ty, .. } | NodeKind::StructFieldType { ty, .. } => {
                self.annotation(*ty)
            }
            NodeKind::VariantCtor { .. } => self.constructor_decl_type(node),
            _ if kind.is_type_expr() => match ast.parent(node).map(|p| (p, ast.kind(p))) {
                // The body of a declaration is typed as the declaration.
                Some((decl, NodeKind::TypeDecl { body, .. })) if *body == node => {
                    self.get_type(decl)
                }
                _ => self.compute_type_expr(node),
            },
            NodeKind::Binding { .. } => self.range_binding_type(node),

            NodeKind::MatchCase { body, .. } => self.get_type(*body),
            NodeKind::FieldInit { .. } => self.field_init_type(node),
            _ if kind.is_pattern() => self.pattern_node_type(node),
            _ => self.compute_expr(node),
        }
    }

    /// Nearest enclosing function-like node: declaration, method or lambda.
    pub(crate) fn enclosing_callable(&self, node: NodeId) -> Option<NodeId> {
        self.ast.ancestors(node).find(|a| {
            matches!(
                self.ast.kind(*a),
                NodeKind::FnDecl { .. } | NodeKind::Method { .. } | NodeKind::Lambda { .. }
            )
        })
    }
}
