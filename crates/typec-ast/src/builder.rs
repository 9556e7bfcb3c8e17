//! Construction of documents without a parser.
//!
//! Every constructor takes `&self` so calls nest naturally:
//!
//! ```
//! # use typec_ast::Ast;
//! let mut ast = Ast::new();
//! let b = ast.builder("main.tc");
//! let f = b.func("id", vec![], vec![b.param("x", Some(b.ty("u32")))], None, Some(b.name("x")));
//! let doc = b.finish(vec![f]);
//! # assert!(ast.root(doc).is_some());
//! ```
//!
//! Names are left unresolved and bound by [`scope::resolve_names`](crate::scope::resolve_names)
//! when the document is finished.

use std::cell::RefCell;

use typec_common::{DocumentId, Span};

use crate::node::{
    BinOp, CastKind, FloatSuffix, IntSuffix, Node, NodeId, NodeKind, PostfixOp, Prim, UnOp,
};
use crate::{scope, Ast};

pub struct AstBuilder<'a> {
    ast: &'a mut Ast,
    doc: DocumentId,
    base: u32,
    pending: RefCell<Vec<Node>>,
}

impl<'a> AstBuilder<'a> {
    pub(crate) fn new(ast: &'a mut Ast, doc: DocumentId) -> Self {
        let base = ast.len() as u32;
        AstBuilder {
            ast,
            doc,
            base,
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.doc
    }

    /// Append a node of any kind.
    pub fn node(&self, kind: NodeKind) -> NodeId {
        let mut pending = self.pending.borrow_mut();
        let id = NodeId(self.base + pending.len() as u32);
        pending.push(Node {
            kind,
            span: Span::detached(),
            document: self.doc,
            parent: None,
        });
        id
    }

    /// Attach a source span to a node built by this builder.
    pub fn at(&self, id: NodeId, start: u32, end: u32) -> NodeId {
        if let Some(node) = self.pending.borrow_mut().get_mut((id.0 - self.base) as usize) {
            node.span = Span::new(start, end);
        }
        id
    }

    /// Wrap `items` in the document's module, link it and resolve names.
    pub fn finish(self, items: Vec<NodeId>) -> DocumentId {
        let root = self.node(NodeKind::Module { items });
        let AstBuilder { ast, doc, pending, .. } = self;
        for node in pending.into_inner() {
            ast.push(node);
        }
        ast.set_root(doc, root);
        ast.link(doc);
        scope::resolve_names(ast, doc);
        doc
    }

    // ── Type expressions ────────────────────────────────────────────────

    /// A primitive type when `name` is one, otherwise an unresolved reference.
    pub fn ty(&self, name: &str) -> NodeId {
        match Prim::from_name(name) {
            Some(prim) => self.node(NodeKind::PrimType(prim)),
            None => self.ty_ref(name, vec![]),
        }
    }

    pub fn ty_ref(&self, name: &str, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::RefType {
            name: name.to_string(),
            args,
            target: None,
        })
    }

    pub fn array_ty(&self, elem: NodeId) -> NodeId {
        self.node(NodeKind::ArrayType { elem })
    }

    pub fn nullable_ty(&self, base: NodeId) -> NodeId {
        self.node(NodeKind::NullableType { base })
    }

    pub fn tuple_ty(&self, elems: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TupleType { elems })
    }

    pub fn fn_ty(&self, params: Vec<NodeId>, ret: NodeId) -> NodeId {
        self.node(NodeKind::FnType { params, ret })
    }

    pub fn coroutine_ty(&self, func: NodeId) -> NodeId {
        self.node(NodeKind::CoroutineType { func })
    }

    pub fn union_ty(&self, members: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::UnionType { members })
    }

    pub fn struct_ty(&self, fields: Vec<(&str, NodeId)>) -> NodeId {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| {
                self.node(NodeKind::StructFieldType {
                    name: name.to_string(),
                    ty,
                })
            })
            .collect();
        self.node(NodeKind::StructType { fields })
    }

    pub fn class_ty(
        &self,
        supers: Vec<NodeId>,
        attributes: Vec<NodeId>,
        methods: Vec<NodeId>,
        impls: Vec<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::ClassType {
            supers,
            attributes,
            methods,
            impls,
        })
    }

    pub fn interface_ty(&self, supers: Vec<NodeId>, methods: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::InterfaceType { supers, methods })
    }

    pub fn impl_ty(&self, attributes: Vec<NodeId>, methods: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::ImplType { attributes, methods })
    }

    pub fn variant_ty(&self, constructors: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::VariantType { constructors })
    }

    pub fn ctor(&self, name: &str, params: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::VariantCtor {
            name: name.to_string(),
            params,
        })
    }

    pub fn enum_ty(&self, cases: &[&str]) -> NodeId {
        self.node(NodeKind::EnumType {
            cases: cases.iter().map(|c| c.to_string()).collect(),
        })
    }

    // ── Declarations ────────────────────────────────────────────────────

    pub fn func(
        &self,
        name: &str,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::FnDecl {
            name: name.to_string(),
            generics,
            params,
            ret,
            body,
        })
    }

    pub fn param(&self, name: &str, ty: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Param {
            name: name.to_string(),
            ty,
            mutable: false,
        })
    }

    pub fn generic(&self, name: &str, constraint: Option<NodeId>) -> NodeId {
        self.node(NodeKind::GenericParam {
            name: name.to_string(),
            constraint,
        })
    }

    pub fn var(&self, name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> NodeId {
        self.node(NodeKind::VarDecl {
            name: name.to_string(),
            ty,
            init,
            is_const: false,
        })
    }

    pub fn type_decl(&self, name: &str, generics: Vec<NodeId>, body: NodeId) -> NodeId {
        self.node(NodeKind::TypeDecl {
            name: name.to_string(),
            generics,
            body,
        })
    }

    pub fn attribute(&self, name: &str, ty: NodeId) -> NodeId {
        self.node(NodeKind::Attribute {
            name: name.to_string(),
            ty,
            is_static: false,
            is_const: false,
        })
    }

    pub fn method(
        &self,
        name: &str,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::Method {
            name: name.to_string(),
            generics: vec![],
            params,
            ret,
            body,
            is_override: false,
            is_static: false,
        })
    }

    pub fn generic_method(
        &self,
        name: &str,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::Method {
            name: name.to_string(),
            generics,
            params,
            ret,
            body,
            is_override: false,
            is_static: false,
        })
    }

    pub fn method_sig(&self, name: &str, params: Vec<NodeId>, ret: NodeId) -> NodeId {
        self.node(NodeKind::MethodSig {
            name: name.to_string(),
            generics: vec![],
            params,
            ret,
        })
    }

    // ── Statements ──────────────────────────────────────────────────────

    pub fn block(&self, stmts: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block { stmts })
    }

    pub fn expr_stmt(&self, expr: NodeId) -> NodeId {
        self.node(NodeKind::ExprStmt { expr })
    }

    pub fn ret(&self, expr: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Return { expr })
    }

    pub fn if_stmt(&self, cond: NodeId, then: NodeId, otherwise: Option<NodeId>) -> NodeId {
        self.node(NodeKind::IfStmt {
            cond,
            then,
            otherwise,
        })
    }

    pub fn while_loop(&self, cond: NodeId, body: NodeId) -> NodeId {
        self.node(NodeKind::While { cond, body })
    }

    pub fn for_range(
        &self,
        name: &str,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let binding = self.node(NodeKind::Binding {
            name: name.to_string(),
        });
        self.node(NodeKind::ForRange {
            binding,
            start,
            end,
            step,
            body,
        })
    }

    pub fn yield_(&self, expr: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Yield { expr })
    }

    // ── Expressions ─────────────────────────────────────────────────────

    pub fn int(&self, value: u64) -> NodeId {
        self.node(NodeKind::IntLit {
            value,
            suffix: None,
        })
    }

    pub fn int_suffixed(&self, value: u64, suffix: IntSuffix) -> NodeId {
        self.node(NodeKind::IntLit {
            value,
            suffix: Some(suffix),
        })
    }

    pub fn float(&self, text: &str) -> NodeId {
        self.node(NodeKind::FloatLit {
            text: text.to_string(),
            suffix: None,
        })
    }

    pub fn float_suffixed(&self, text: &str, suffix: FloatSuffix) -> NodeId {
        self.node(NodeKind::FloatLit {
            text: text.to_string(),
            suffix: Some(suffix),
        })
    }

    pub fn string(&self, value: &str) -> NodeId {
        self.node(NodeKind::StringLit {
            value: value.to_string(),
        })
    }

    pub fn boolean(&self, value: bool) -> NodeId {
        self.node(NodeKind::BoolLit { value })
    }

    pub fn null(&self) -> NodeId {
        self.node(NodeKind::NullLit)
    }

    pub fn name(&self, name: &str) -> NodeId {
        self.node(NodeKind::Name {
            name: name.to_string(),
            target: None,
        })
    }

    pub fn this(&self) -> NodeId {
        self.node(NodeKind::This)
    }

    pub fn member(&self, base: NodeId, name: &str) -> NodeId {
        self.node(NodeKind::Member {
            base,
            name: name.to_string(),
            optional: false,
            optional_chain: false,
        })
    }

    pub fn opt_member(&self, base: NodeId, name: &str) -> NodeId {
        self.node(NodeKind::Member {
            base,
            name: name.to_string(),
            optional: true,
            optional_chain: true,
        })
    }

    pub fn index(&self, base: NodeId, index: NodeId) -> NodeId {
        self.node(NodeKind::Index {
            base,
            index,
            optional_chain: false,
        })
    }

    pub fn call(&self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.call_generic(callee, vec![], args)
    }

    pub fn call_generic(&self, callee: NodeId, generic_args: Vec<NodeId>, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Call {
            callee,
            generic_args,
            args,
            optional_chain: false,
        })
    }

    pub fn new_object(&self, ty: NodeId, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::New { ty, args })
    }

    pub fn binary(&self, op: BinOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.node(NodeKind::Binary { op, lhs, rhs })
    }

    pub fn unary(&self, op: UnOp, operand: NodeId) -> NodeId {
        self.node(NodeKind::Unary { op, operand })
    }

    pub fn postfix(&self, op: PostfixOp, operand: NodeId) -> NodeId {
        self.node(NodeKind::Postfix { op, operand })
    }

    pub fn cast(&self, expr: NodeId, ty: NodeId, kind: CastKind) -> NodeId {
        self.node(NodeKind::Cast { expr, ty, kind })
    }

    pub fn instance_check(&self, expr: NodeId, ty: NodeId) -> NodeId {
        self.node(NodeKind::InstanceCheck { expr, ty })
    }

    pub fn non_null(&self, expr: NodeId) -> NodeId {
        self.node(NodeKind::NonNull { expr })
    }

    pub fn if_expr(&self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        self.node(NodeKind::IfExpr {
            cond,
            then,
            otherwise,
        })
    }

    pub fn match_expr(&self, scrutinee: NodeId, cases: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Match { scrutinee, cases })
    }

    pub fn case(&self, pattern: NodeId, body: NodeId) -> NodeId {
        self.node(NodeKind::MatchCase {
            pattern,
            guard: None,
            body,
        })
    }

    pub fn lambda(&self, params: Vec<NodeId>, ret: Option<NodeId>, body: NodeId) -> NodeId {
        self.node(NodeKind::Lambda { params, ret, body })
    }

    pub fn array(&self, elems: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::ArrayLit { elems })
    }

    pub fn tuple(&self, elems: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TupleLit { elems })
    }

    pub fn field_init(&self, name: &str, value: NodeId) -> NodeId {
        self.node(NodeKind::FieldInit {
            name: name.to_string(),
            value,
        })
    }

    pub fn struct_lit(&self, fields: Vec<(&str, NodeId)>) -> NodeId {
        let fields = fields
            .into_iter()
            .map(|(name, value)| self.field_init(name, value))
            .collect();
        self.node(NodeKind::StructLit { fields })
    }

    pub fn update(&self, base: NodeId, fields: Vec<(&str, NodeId)>) -> NodeId {
        let fields = fields
            .into_iter()
            .map(|(name, value)| self.field_init(name, value))
            .collect();
        self.node(NodeKind::ObjectUpdate { base, fields })
    }

    pub fn coroutine(&self, func: NodeId) -> NodeId {
        self.node(NodeKind::CoroutineNew { func })
    }

    // ── Patterns ────────────────────────────────────────────────────────

    pub fn p_bind(&self, name: &str) -> NodeId {
        self.node(NodeKind::PatBinding {
            name: name.to_string(),
        })
    }

    pub fn p_wild(&self) -> NodeId {
        self.node(NodeKind::PatWildcard)
    }

    pub fn p_lit(&self, lit: NodeId) -> NodeId {
        self.node(NodeKind::PatLiteral { lit })
    }

    pub fn p_rest(&self, name: &str) -> NodeId {
        self.node(NodeKind::PatRest {
            name: name.to_string(),
        })
    }

    pub fn p_array(&self, elems: Vec<NodeId>, rest: Option<&str>) -> NodeId {
        let rest = rest.map(|r| self.p_rest(r));
        self.node(NodeKind::PatArray { elems, rest })
    }

    pub fn p_struct(&self, fields: Vec<(&str, NodeId)>, rest: Option<&str>) -> NodeId {
        let fields = fields
            .into_iter()
            .map(|(name, pattern)| {
                self.node(NodeKind::PatField {
                    name: name.to_string(),
                    pattern,
                })
            })
            .collect();
        let rest = rest.map(|r| self.p_rest(r));
        self.node(NodeKind::PatStruct { fields, rest })
    }

    pub fn p_tuple(&self, elems: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::PatTuple { elems })
    }

    pub fn p_variant(&self, path: &str, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::PatVariant {
            path: path.to_string(),
            args,
            target: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_continue_after_existing_documents() {
        let mut ast = Ast::new();
        let b = ast.builder("a.tc");
        let one = b.int(1);
        b.finish(vec![one]);
        let first_len = ast.len();

        let b = ast.builder("b.tc");
        let two = b.int(2);
        let doc = b.finish(vec![two]);
        assert_eq!(two.0 as usize, first_len);
        assert_eq!(ast.document_of(two), doc);
    }

    #[test]
    fn explicit_spans_survive_linking() {
        let mut ast = Ast::new();
        let b = ast.builder("a.tc");
        let one = b.at(b.int(1), 8, 9);
        let x = b.var("x", None, Some(one));
        b.finish(vec![x]);
        assert_eq!(ast.span(one), Span::new(8, 9));
        assert_eq!(ast.span(x), Span::new(8, 9));
    }
}
