//! Declarations, type expressions and reference resolution.

use std::rc::Rc;

use typec_ast::{NodeId, NodeKind};

use crate::error::TypeErrorKind;
use crate::infer::Infer;
use crate::subst::{apply, subst_from};
use crate::ty::{
    Attribute, ClassTy, CtorSig, EnumTy, FnParam, FnTy, GenericTy, ImplTy, InterfaceTy, Method,
    Nominal, RefTy, StructField, StructTy, Ty, VariantTy,
};

/// Bound on alias and reference chains followed by [`Infer::resolve`].
const MAX_RESOLVE_DEPTH: usize = 32;

impl<'a> Infer<'a> {
    /// Type denoted by a type expression node.
    pub(crate) fn annotation(&mut self, node: NodeId) -> Ty {
        if self.ast.kind(node).is_type_expr() {
            self.get_type(node)
        } else {
            Ty::unsupported(
                format!("expected a type, found {}", self.ast.kind(node).label()),
                Some(node),
            )
        }
    }

    pub(crate) fn compute_type_expr(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::PrimType(prim) => Ty::from_prim(*prim),
            NodeKind::RefType { name, args, target } => {
                let args: Vec<Ty> = args.iter().map(|a| self.annotation(*a)).collect();
                self.reference_type(node, name, args, *target)
            }
            NodeKind::ArrayType { elem } => Ty::array(self.annotation(*elem)),
            NodeKind::NullableType { base } => Ty::nullable(self.annotation(*base)),
            NodeKind::TupleType { elems } => {
                Ty::tuple(elems.iter().map(|e| self.annotation(*e)).collect())
            }
            NodeKind::FnType { params, ret } => {
                let params = params.iter().map(|p| self.fn_param(*p)).collect();
                Ty::function(vec![], params, self.annotation(*ret))
            }
            NodeKind::CoroutineType { func } => {
                let func = self.annotation(*func);
                Ty::coroutine(func, Some(node))
            }
            NodeKind::UnionType { members } => {
                Ty::union(members.iter().map(|m| self.annotation(*m)).collect())
            }
            NodeKind::ClassType { .. } => self.class_type(None, node, false),
            NodeKind::InterfaceType { .. } => self.interface_type(None, node, false),
            NodeKind::ImplType { .. } => self.impl_type(None, node, false),
            NodeKind::VariantType { .. } => self.variant_type(None, node),
            NodeKind::StructType { .. } => self.struct_type(None, node),
            NodeKind::EnumType { cases } => Ty::Enum(Rc::new(EnumTy {
                decl: None,
                name: None,
                cases: cases.clone(),
            })),
            NodeKind::StringEnumType { values } => Ty::StringEnum(Rc::new(values.clone())),
            other => Ty::unsupported(format!("expected a type, found {}", other.label()), Some(node)),
        }
    }

    fn reference_type(
        &mut self,
        node: NodeId,
        name: &str,
        args: Vec<Ty>,
        target: Option<NodeId>,
    ) -> Ty {
        let Some(target) = target else {
            return Ty::unresolved(name, Some(node));
        };
        let ast = self.ast;
        match ast.kind(target) {
            NodeKind::GenericParam { .. } => self.get_type(target),
            NodeKind::TypeDecl {
                name: decl_name,
                generics,
                body,
            } => {
                if !args.is_empty() && args.len() != generics.len() {
                    return Ty::error(
                        TypeErrorKind::ArityMismatch {
                            expected: generics.len(),
                            found: args.len(),
                        },
                        Some(node),
                    );
                }
                if ast.kind(*body).is_type_expr() && !is_nominal_body(ast.kind(*body)) {
                    return self.expand_alias(target, &args);
                }
                let reference = Ty::reference(target, decl_name.clone(), args);
                if let Ty::Reference(r) = &reference {
                    if !r.args.is_empty() && r.args.iter().all(Ty::is_concrete) {
                        // Resolving records the instantiation.
                        self.resolve_reference(r);
                    }
                }
                reference
            }
            _ => Ty::unsupported(format!("`{}` does not name a type", name), Some(node)),
        }
    }

    /// The aliased type with the alias's generic parameters bound to `args`.
    fn expand_alias(&mut self, decl: NodeId, args: &[Ty]) -> Ty {
        let aliased = self.get_type(decl);
        if aliased.is_recursion_placeholder() {
            return Ty::unsupported("type alias refers to itself", Some(decl));
        }
        let generics = self.decl_generics(decl);
        let expanded = apply(&aliased, &subst_from(&generics, args));
        if let Ty::Reference(r) = &expanded {
            if r.args.iter().all(Ty::is_concrete) && !r.args.is_empty() {
                self.resolve_reference(r);
            }
        }
        expanded
    }

    /// Follow references to the declared type they point at. Other types are
    /// returned unchanged.
    pub(crate) fn resolve(&mut self, ty: &Ty) -> Ty {
        match ty {
            Ty::Reference(r) => self.resolve_reference(r),
            _ => ty.clone(),
        }
    }

    pub(crate) fn resolve_reference(&mut self, r: &Rc<RefTy>) -> Ty {
        let mut current = r.clone();
        for _ in 0..MAX_RESOLVE_DEPTH {
            let resolved = self.resolve_once(&current);
            match resolved {
                Ty::Reference(next) if next.decl != current.decl => current = next,
                Ty::Reference(_) => {
                    return Ty::unsupported("type refers to itself", Some(current.decl));
                }
                other => return other,
            }
        }
        Ty::unsupported("reference chain is too deep", Some(r.decl))
    }

    fn resolve_once(&mut self, r: &Rc<RefTy>) -> Ty {
        let doc = self.ast.document_of(r.decl);
        if let Some(hit) = self.tc.cache.doc(doc).and_then(|c| c.references.get(r.as_ref())) {
            return hit.clone();
        }
        let declared = self.get_type(r.decl);
        let generics = self.decl_generics(r.decl);
        let resolved = if r.args.is_empty() {
            declared
        } else {
            apply(&declared, &subst_from(&generics, &r.args))
        };
        log::debug!("[infer] resolved {} to a {}", Ty::Reference(r.clone()), kind_name(&resolved));

        if matches!(resolved, Ty::Class(_))
            && !generics.is_empty()
            && r.args.len() == generics.len()
            && r.args.iter().all(Ty::is_concrete)
        {
            self.tc.registry.register_class(r.decl, &r.name, &r.args);
        }
        if self.tc.in_flight.is_clean() {
            self.tc
                .cache
                .doc_mut(doc)
                .references
                .insert(r.as_ref().clone(), resolved.clone());
        }
        resolved
    }

    /// Generic parameters declared by a type, function or method declaration.
    pub(crate) fn decl_generics(&mut self, decl: NodeId) -> Vec<GenericTy> {
        let ast = self.ast;
        let generics = match ast.kind(decl) {
            NodeKind::TypeDecl { generics, .. }
            | NodeKind::FnDecl { generics, .. }
            | NodeKind::Method { generics, .. }
            | NodeKind::MethodSig { generics, .. } => generics,
            _ => return Vec::new(),
        };
        generics
            .iter()
            .filter_map(|g| match self.get_type(*g) {
                Ty::Generic(gt) => Some(gt.as_ref().clone()),
                _ => None,
            })
            .collect()
    }

    fn nominal(&mut self, decl: Option<NodeId>) -> Nominal {
        let Some(decl) = decl else {
            return Nominal::anonymous();
        };
        let generics = self.decl_generics(decl);
        let args = generics
            .iter()
            .map(|g| Ty::Generic(Rc::new(g.clone())))
            .collect();
        Nominal {
            decl: Some(decl),
            name: self.ast.kind(decl).decl_name().map(str::to_string),
            generics,
            args,
        }
    }

    /// Type of a `type Name = ...` declaration.
    pub(crate) fn declared_type(&mut self, decl: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::TypeDecl { body, .. } = ast.kind(decl) else {
            return Ty::unsupported("not a type declaration", Some(decl));
        };
        match ast.kind(*body) {
            NodeKind::ClassType { .. } => self.class_type(Some(decl), *body, false),
            NodeKind::InterfaceType { .. } => self.interface_type(Some(decl), *body, false),
            NodeKind::ImplType { .. } => self.impl_type(Some(decl), *body, false),
            NodeKind::VariantType { .. } => self.variant_type(Some(decl), *body),
            NodeKind::StructType { .. } => self.struct_type(Some(decl), *body),
            NodeKind::EnumType { cases } => Ty::Enum(Rc::new(EnumTy {
                decl: Some(decl),
                name: ast.kind(decl).decl_name().map(str::to_string),
                cases: cases.clone(),
            })),
            _ => self.compute_type_expr(*body),
        }
    }

    /// Class or implementation built from syntax alone, for use while the
    /// declaration itself is being inferred.
    pub(crate) fn declaration_stub(&mut self, decl: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::TypeDecl { body, .. } = ast.kind(decl) else {
            return Ty::recursion_placeholder(Some(decl));
        };
        match ast.kind(*body) {
            NodeKind::ClassType { .. } => self.class_type(Some(decl), *body, true),
            NodeKind::InterfaceType { .. } => self.interface_type(Some(decl), *body, true),
            NodeKind::ImplType { .. } => self.impl_type(Some(decl), *body, true),
            _ => Ty::recursion_placeholder(Some(decl)),
        }
    }

    fn attributes(&mut self, nodes: &[NodeId]) -> Vec<Attribute> {
        let ast = self.ast;
        nodes
            .iter()
            .filter_map(|a| match ast.kind(*a) {
                NodeKind::Attribute {
                    name,
                    ty,
                    is_static,
                    is_const,
                } => Some(Attribute {
                    name: name.clone(),
                    ty: self.annotation(*ty),
                    is_static: *is_static,
                    is_const: *is_const,
                }),
                _ => None,
            })
            .collect()
    }

    fn methods(&mut self, nodes: &[NodeId], stub: bool) -> Vec<Method> {
        let ast = self.ast;
        let mut methods = Vec::with_capacity(nodes.len());
        for &m in nodes {
            let (name, is_override, is_static) = match ast.kind(m) {
                NodeKind::Method {
                    name,
                    is_override,
                    is_static,
                    ..
                } => (name, *is_override, *is_static),
                NodeKind::MethodSig { name, .. } => (name, false, false),
                _ => continue,
            };
            let ty = if stub {
                self.signature_stub(m)
            } else {
                self.get_type(m)
            };
            let sig = match ty {
                Ty::Function(sig) => sig,
                other => Rc::new(FnTy {
                    generics: vec![],
                    params: vec![],
                    ret: other,
                }),
            };
            methods.push(Method {
                name: name.clone(),
                decl: Some(m),
                sig,
                is_override,
                is_static,
            });
        }
        methods
    }

    fn annotations(&mut self, nodes: &[NodeId]) -> Vec<Ty> {
        nodes.iter().map(|n| self.annotation(*n)).collect()
    }

    fn class_type(&mut self, decl: Option<NodeId>, body: NodeId, stub: bool) -> Ty {
        let ast = self.ast;
        let NodeKind::ClassType {
            supers,
            attributes,
            methods,
            impls,
        } = ast.kind(body)
        else {
            return Ty::unsupported("not a class", Some(body));
        };
        let nominal = self.nominal(decl);
        let attributes = self.attributes(attributes);
        let methods = self.methods(methods, stub);
        let supers = self.annotations(supers);
        let impls = self.annotations(impls);
        Ty::Class(Rc::new(ClassTy {
            nominal,
            attributes,
            methods,
            supers,
            impls,
            stub,
        }))
    }

    fn interface_type(&mut self, decl: Option<NodeId>, body: NodeId, stub: bool) -> Ty {
        let ast = self.ast;
        let NodeKind::InterfaceType { supers, methods } = ast.kind(body) else {
            return Ty::unsupported("not an interface", Some(body));
        };
        let nominal = self.nominal(decl);
        let methods = self.methods(methods, stub);
        let supers = self.annotations(supers);
        Ty::Interface(Rc::new(InterfaceTy {
            nominal,
            methods,
            supers,
        }))
    }

    fn impl_type(&mut self, decl: Option<NodeId>, body: NodeId, stub: bool) -> Ty {
        let ast = self.ast;
        let NodeKind::ImplType {
            attributes,
            methods,
        } = ast.kind(body)
        else {
            return Ty::unsupported("not an implementation", Some(body));
        };
        let nominal = self.nominal(decl);
        let attributes = self.attributes(attributes);
        let methods = self.methods(methods, stub);
        Ty::Implementation(Rc::new(ImplTy {
            nominal,
            attributes,
            methods,
            stub,
        }))
    }

    fn variant_type(&mut self, decl: Option<NodeId>, body: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::VariantType { constructors } = ast.kind(body) else {
            return Ty::unsupported("not a variant", Some(body));
        };
        let nominal = self.nominal(decl);
        let mut ctors = Vec::with_capacity(constructors.len());
        for &c in constructors {
            if let NodeKind::VariantCtor { name, params } = ast.kind(c) {
                let params = params.iter().map(|p| self.fn_param(*p)).collect();
                ctors.push(CtorSig {
                    name: name.clone(),
                    decl: c,
                    params,
                });
            }
        }
        Ty::Variant(Rc::new(VariantTy {
            nominal,
            constructors: ctors,
        }))
    }

    fn struct_type(&mut self, decl: Option<NodeId>, body: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::StructType { fields } = ast.kind(body) else {
            return Ty::unsupported("not a struct", Some(body));
        };
        let mut out = Vec::with_capacity(fields.len());
        for &f in fields {
            if let NodeKind::StructFieldType { name, ty } = ast.kind(f) {
                out.push(StructField {
                    name: name.clone(),
                    ty: self.annotation(*ty),
                });
            }
        }
        Ty::Struct(Rc::new(StructTy {
            decl,
            name: decl.and_then(|d| ast.kind(d).decl_name().map(str::to_string)),
            fields: out,
        }))
    }

    /// A constructor declaration on its own: the constructor of the
    /// unapplied variant.
    pub(crate) fn constructor_decl_type(&mut self, ctor: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::VariantCtor { name, .. } = ast.kind(ctor) else {
            return Ty::unsupported("not a constructor", Some(ctor));
        };
        let Some(body) = ast.parent(ctor) else {
            return Ty::unsupported("constructor outside of a variant", Some(ctor));
        };
        let variant = self.get_type(body);
        let args = match &variant {
            Ty::Variant(v) => v.nominal.args.clone(),
            _ => Vec::new(),
        };
        Ty::variant_constructor(&variant, name, args, Some(ctor))
    }

    fn fn_param(&mut self, param: NodeId) -> FnParam {
        let ast = self.ast;
        let (name, mutable) = match ast.kind(param) {
            NodeKind::Param { name, mutable, .. } => (name.clone(), *mutable),
            _ => (String::new(), false),
        };
        FnParam {
            name,
            ty: self.get_type(param),
            mutable,
        }
    }

    /// Declared or inferred type of a parameter. Unannotated lambda
    /// parameters take their type from the lambda's expected function type.
    pub(crate) fn param_type(&mut self, param: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::Param { name, ty, .. } = ast.kind(param) else {
            return Ty::unsupported("not a parameter", Some(param));
        };
        if let Some(ty) = ty {
            return self.annotation(*ty);
        }
        if let Some(lambda) = ast.parent(param) {
            if let NodeKind::Lambda { params, .. } = ast.kind(lambda) {
                let index = params.iter().position(|p| *p == param);
                let expected = self.get_expected_type(lambda).map(|e| self.resolve(&e));
                if let (Some(i), Some(Ty::Function(sig))) = (index, expected) {
                    if let Some(p) = sig.params.get(i) {
                        return p.ty.clone();
                    }
                }
                return Ty::unsupported(
                    format!("cannot infer the type of parameter `{}` from context", name),
                    Some(param),
                );
            }
        }
        Ty::unsupported(format!("parameter `{}` needs a type annotation", name), Some(param))
    }

    /// Function type of a function, method or method signature.
    ///
    /// An annotated return type is taken as is; the body is inferred only
    /// when the annotation is missing.
    pub(crate) fn signature_type(&mut self, node: NodeId) -> Ty {
        self.signature(node, false)
    }

    /// Signature built without looking at the body: an unannotated return
    /// type becomes the recursion placeholder.
    pub(crate) fn signature_stub(&mut self, node: NodeId) -> Ty {
        self.signature(node, true)
    }

    fn signature(&mut self, node: NodeId, stub: bool) -> Ty {
        let ast = self.ast;
        let (params, ret, body) = match ast.kind(node) {
            NodeKind::FnDecl {
                params, ret, body, ..
            }
            | NodeKind::Method {
                params, ret, body, ..
            } => (params, *ret, *body),
            NodeKind::MethodSig { params, ret, .. } => (params, Some(*ret), None),
            _ => return Ty::unsupported("not a function", Some(node)),
        };
        let generics = self.decl_generics(node);
        let params = params.iter().map(|p| self.fn_param(*p)).collect();
        let ret = match (ret, body) {
            (Some(ret), _) => self.annotation(ret),
            (None, _) if stub => Ty::recursion_placeholder(Some(node)),
            (None, Some(body)) => self.body_type(body),
            (None, None) => Ty::Void,
        };
        Ty::function(generics, params, ret)
    }

    /// Result type of a function body: an expression body's type, or the
    /// join of a block's `return` statements (`void` without any).
    pub(crate) fn body_type(&mut self, body: NodeId) -> Ty {
        if !matches!(self.ast.kind(body), NodeKind::Block { .. }) {
            return self.get_type(body);
        }
        let returns = self.returns_of(body);
        if returns.is_empty() {
            return Ty::Void;
        }
        let types = returns
            .into_iter()
            .map(|expr| match expr {
                Some(e) => self.get_type(e),
                None => Ty::Void,
            })
            .collect();
        self.join(types)
    }

    /// `return` statements of a body, not descending into nested functions.
    fn returns_of(&self, body: NodeId) -> Vec<Option<NodeId>> {
        let ast = self.ast;
        let mut out = Vec::new();
        let mut stack = vec![body];
        while let Some(n) = stack.pop() {
            match ast.kind(n) {
                NodeKind::Return { expr } => out.push(*expr),
                NodeKind::FnDecl { .. }
                | NodeKind::Method { .. }
                | NodeKind::Lambda { .. }
                | NodeKind::TypeDecl { .. }
                | NodeKind::ClassType { .. } => {}
                kind => {
                    let mut children = kind.children();
                    children.reverse();
                    stack.extend(children);
                }
            }
        }
        out
    }

    /// Type of `this`: the enclosing class or implementation.
    pub(crate) fn this_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let owner = ast.ancestors(node).find(|a| {
            matches!(
                ast.kind(*a),
                NodeKind::ClassType { .. } | NodeKind::ImplType { .. }
            )
        });
        let Some(owner) = owner else {
            return Ty::unsupported("`this` outside of a class", Some(node));
        };
        match ast.parent(owner).map(|p| (p, ast.kind(p))) {
            Some((decl, NodeKind::TypeDecl { name, body, .. })) if *body == owner => {
                let args = self
                    .decl_generics(decl)
                    .into_iter()
                    .map(|g| Ty::Generic(Rc::new(g)))
                    .collect();
                Ty::reference(decl, name.clone(), args)
            }
            _ => self.get_type(owner),
        }
    }

    /// Loop variable of a range: the join of the bounds.
    pub(crate) fn range_binding_type(&mut self, binding: NodeId) -> Ty {
        let ast = self.ast;
        match ast.parent(binding).map(|p| ast.kind(p)) {
            Some(NodeKind::ForRange { start, end, .. }) => {
                let bounds = vec![self.get_type(*start), self.get_type(*end)];
                self.join(bounds)
            }
            _ => Ty::unsupported("binding outside of a range loop", Some(binding)),
        }
    }
}

pub(crate) fn is_nominal_body(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ClassType { .. }
            | NodeKind::InterfaceType { .. }
            | NodeKind::ImplType { .. }
            | NodeKind::VariantType { .. }
            | NodeKind::StructType { .. }
            | NodeKind::EnumType { .. }
            | NodeKind::StringEnumType { .. }
    )
}

fn kind_name(ty: &Ty) -> &'static str {
    match ty {
        Ty::Class(_) => "class",
        Ty::Interface(_) => "interface",
        Ty::Implementation(_) => "impl",
        Ty::Variant(_) => "variant",
        Ty::Struct(_) => "struct",
        Ty::Enum(_) => "enum",
        Ty::Error(_) => "error",
        _ => "type",
    }
}
