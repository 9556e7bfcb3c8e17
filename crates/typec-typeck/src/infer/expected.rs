//! Expected types: what the surrounding syntax wants a node to be.
//!
//! The expected type flows from the parent to the child and is what literal
//! defaulting, empty array literals, lambda parameters and variant
//! constructors look at. A node with no contextual expectation has none.

use std::rc::Rc;

use typec_ast::{NodeId, NodeKind};

use crate::cache::EntityKind;
use crate::infer::Infer;
use crate::ty::{FnTy, Ty};

impl<'a> Infer<'a> {
    pub(crate) fn get_expected_type(&mut self, node: NodeId) -> Option<Ty> {
        let doc = self.ast.document_of(node);
        if let Some(hit) = self.tc.cache.doc(doc).and_then(|c| c.expected.get(&node)) {
            return hit.clone();
        }
        let expected = self.guarded(
            (EntityKind::Expected, node),
            |this| this.compute_expected(node),
            |_| None,
        );
        if self.tc.in_flight.is_clean() {
            self.tc.cache.doc_mut(doc).expected.insert(node, expected.clone());
        }
        expected
    }

    fn compute_expected(&mut self, node: NodeId) -> Option<Ty> {
        let ast = self.ast;
        let parent = ast.parent(node)?;
        match ast.kind(parent) {
            NodeKind::VarDecl {
                ty: Some(ty),
                init: Some(init),
                ..
            } if *init == node => Some(self.annotation(*ty)),
            NodeKind::Binary { op, lhs, rhs } if op.is_assignment() && *rhs == node => {
                Some(self.get_type(*lhs))
            }
            NodeKind::Call { args, .. } => {
                let index = args.iter().position(|a| *a == node)?;
                let sig = self.call_signature(parent).ok()?;
                self.argument_expected(parent, &sig, args, index)
            }
            NodeKind::New { args, .. } => {
                let index = args.iter().position(|a| *a == node)?;
                let sig = self.new_signature(parent)?;
                self.argument_expected(parent, &sig, args, index)
            }
            NodeKind::Return { expr: Some(expr) } if *expr == node => {
                let callable = self.enclosing_callable(parent)?;
                self.declared_return(callable)
            }
            NodeKind::FnDecl {
                body: Some(body),
                ret,
                ..
            }
            | NodeKind::Method {
                body: Some(body),
                ret,
                ..
            } if *body == node => ret.map(|r| self.annotation(r)),
            NodeKind::Lambda { body, .. } if *body == node => self.declared_return(parent),
            NodeKind::Lambda { params, .. } => {
                let index = params.iter().position(|p| *p == node)?;
                let sig = self.expected_function(parent)?;
                sig.params.get(index).map(|p| p.ty.clone())
            }
            NodeKind::IfExpr { cond, .. } if *cond == node => Some(Ty::Bool),
            NodeKind::IfExpr { .. } => self.get_expected_type(parent),
            NodeKind::IfStmt { cond, .. } | NodeKind::While { cond, .. } if *cond == node => {
                Some(Ty::Bool)
            }
            NodeKind::MatchCase { guard: Some(guard), .. } if *guard == node => Some(Ty::Bool),
            NodeKind::MatchCase { body, .. } if *body == node => {
                let matched = ast.parent(parent)?;
                self.get_expected_type(matched)
            }
            NodeKind::ArrayLit { .. } => match self.expected_shape(parent)? {
                Ty::Array(elem) => Some(*elem),
                _ => None,
            },
            NodeKind::TupleLit { elems } => {
                let index = elems.iter().position(|e| *e == node)?;
                match self.expected_shape(parent)? {
                    Ty::Tuple(expected) => expected.get(index).cloned(),
                    _ => None,
                }
            }
            NodeKind::FieldInit { name, value } if *value == node => {
                self.field_expected(parent, name)
            }
            NodeKind::ForRange { step: Some(step), .. } if *step == node => Some(Ty::u64()),
            NodeKind::PatLiteral { .. } => Some(self.get_type(parent)),
            _ => None,
        }
    }

    /// Expected type of `node` with references resolved and nullability
    /// removed, for looking at its structure.
    fn expected_shape(&mut self, node: NodeId) -> Option<Ty> {
        let expected = self.get_expected_type(node)?;
        let resolved = self.resolve(expected.unwrap_nullable());
        Some(resolved)
    }

    /// Annotated return type of a function or method; for a lambda the
    /// annotation or the return type of its expected function type.
    fn declared_return(&mut self, callable: NodeId) -> Option<Ty> {
        match self.ast.kind(callable) {
            NodeKind::FnDecl { ret, .. } | NodeKind::Method { ret, .. } => {
                ret.map(|r| self.annotation(r))
            }
            NodeKind::Lambda { ret: Some(r), .. } => Some(self.annotation(*r)),
            NodeKind::Lambda { .. } => {
                let sig = self.expected_function(callable)?;
                (!sig.ret.has_generics()).then(|| sig.ret.clone())
            }
            _ => None,
        }
    }

    fn expected_function(&mut self, lambda: NodeId) -> Option<Rc<FnTy>> {
        match self.expected_shape(lambda)? {
            Ty::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Expected type of the value of field `name` in a struct literal or an
    /// object update.
    fn field_expected(&mut self, field: NodeId, name: &str) -> Option<Ty> {
        let ast = self.ast;
        let owner = ast.parent(field)?;
        let shape = match ast.kind(owner) {
            NodeKind::StructLit { .. } => self.expected_shape(owner)?,
            NodeKind::ObjectUpdate { base, .. } => {
                let base_ty = self.get_type(*base);
                self.resolve(base_ty.unwrap_nullable())
            }
            _ => return None,
        };
        match &shape {
            Ty::Struct(s) => s.field(name).map(|f| f.ty.clone()),
            Ty::Class(c) => c
                .attributes
                .iter()
                .find(|a| a.name == name && !a.is_static)
                .map(|a| a.ty.clone()),
            _ => None,
        }
    }
}
