//! Pattern typing.
//!
//! All patterns of one match case are typed together, top-down from the
//! scrutinee's type. The first time any pattern node of a case is asked
//! for, the whole case is bound and the results are stored per node.
//!
//! A pattern that does not fit its subject records one error at that pattern
//! and gives every node below it the same error type, so a single mistake is
//! reported once instead of once per binding.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use typec_ast::{NodeId, NodeKind};

use crate::cache::EntityKind;
use crate::error::{TypeError, TypeErrorKind};
use crate::infer::Infer;
use crate::subst::{apply, subst_from};
use crate::ty::{StructField, Ty};

/// Results of binding one case.
#[derive(Default)]
struct CaseBindings {
    types: FxHashMap<NodeId, Ty>,
    errors: Vec<TypeError>,
}

impl CaseBindings {
    fn set(&mut self, node: NodeId, ty: Ty) {
        self.types.insert(node, ty);
    }

    /// Record an error at `node` and return it as a type.
    fn fail(&mut self, node: NodeId, kind: TypeErrorKind) -> Ty {
        let err = TypeError::new(kind, Some(node));
        self.errors.push(err.clone());
        Ty::Error(Rc::new(err))
    }
}

impl<'a> Infer<'a> {
    pub(crate) fn pattern_node_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let Some(case) = self.enclosing_case(node) else {
            return Ty::unsupported("pattern outside of a match case", Some(node));
        };
        let doc = ast.document_of(node);
        if let Some(ty) = self.tc.cache.doc(doc).and_then(|c| c.patterns.get(&node)) {
            return ty.clone();
        }
        let types = self.guarded(
            (EntityKind::Pattern, case),
            |this| Some(this.bind_case(case)),
            |_| None,
        );
        match types.and_then(|t| t.get(&node).cloned()) {
            Some(ty) => ty,
            None => Ty::recursion_placeholder(Some(node)),
        }
    }

    /// The match case whose pattern tree contains `node`.
    fn enclosing_case(&self, node: NodeId) -> Option<NodeId> {
        let ast = self.ast;
        let mut current = node;
        loop {
            let parent = ast.parent(current)?;
            match ast.kind(parent) {
                NodeKind::MatchCase { pattern, .. } if *pattern == current => return Some(parent),
                kind if kind.is_pattern() => current = parent,
                _ => return None,
            }
        }
    }

    fn bind_case(&mut self, case: NodeId) -> FxHashMap<NodeId, Ty> {
        let ast = self.ast;
        let NodeKind::MatchCase { pattern, .. } = ast.kind(case) else {
            return FxHashMap::default();
        };
        let scrutinee_ty = match ast.parent(case).map(|m| ast.kind(m)) {
            Some(NodeKind::Match { scrutinee, .. }) => self.get_type(*scrutinee),
            _ => Ty::unsupported("match case outside of a match", Some(case)),
        };
        let mut bindings = CaseBindings::default();
        self.bind_pattern(*pattern, scrutinee_ty, &mut bindings);

        let doc = ast.document_of(case);
        for err in bindings.errors {
            if let Some(node) = err.node {
                self.tc.cache.push_side_error(doc, node, err);
            }
        }
        if self.tc.in_flight.is_clean() {
            let cache = self.tc.cache.doc_mut(doc);
            cache
                .patterns
                .extend(bindings.types.iter().map(|(n, t)| (*n, t.clone())));
        }
        bindings.types
    }

    fn bind_pattern(&mut self, pat: NodeId, ty: Ty, out: &mut CaseBindings) {
        if ty.is_error() {
            self.poison(pat, ty, out);
            return;
        }
        let ast = self.ast;
        match ast.kind(pat) {
            NodeKind::PatArray { elems, rest } => {
                let subject = self.resolve(ty.unwrap_nullable());
                let elem = match &subject {
                    Ty::Array(elem) => (**elem).clone(),
                    Ty::Any => Ty::Any,
                    _ => return self.mismatch(pat, "array", &ty, out),
                };
                out.set(pat, subject.clone());
                for e in elems {
                    self.bind_pattern(*e, elem.clone(), out);
                }
                if let Some(rest) = rest {
                    out.set(*rest, subject);
                }
            }
            NodeKind::PatTuple { elems } => {
                let subject = self.resolve(ty.unwrap_nullable());
                let Ty::Tuple(parts) = &subject else {
                    return self.mismatch(pat, "tuple", &ty, out);
                };
                out.set(pat, subject.clone());
                let extra = if parts.len() != elems.len() {
                    Some(out.fail(
                        pat,
                        TypeErrorKind::ArityMismatch {
                            expected: parts.len(),
                            found: elems.len(),
                        },
                    ))
                } else {
                    None
                };
                for (k, e) in elems.iter().enumerate() {
                    match (parts.get(k), &extra) {
                        (Some(part), _) => self.bind_pattern(*e, part.clone(), out),
                        (None, Some(err)) => self.poison(*e, err.clone(), out),
                        (None, None) => {}
                    }
                }
            }
            NodeKind::PatStruct { fields, rest } => {
                let subject = self.resolve(ty.unwrap_nullable());
                let available: Vec<StructField> = match &subject {
                    Ty::Struct(s) => s.fields.clone(),
                    Ty::Class(c) => c
                        .attributes
                        .iter()
                        .filter(|a| !a.is_static)
                        .map(|a| StructField {
                            name: a.name.clone(),
                            ty: a.ty.clone(),
                        })
                        .collect(),
                    _ => return self.mismatch(pat, "struct", &ty, out),
                };
                out.set(pat, ty.clone());
                let mut matched = Vec::with_capacity(fields.len());
                for &f in fields {
                    let NodeKind::PatField { name, pattern } = ast.kind(f) else {
                        continue;
                    };
                    match available.iter().find(|a| a.name == *name) {
                        Some(field) => {
                            matched.push(name.clone());
                            out.set(f, field.ty.clone());
                            self.bind_pattern(*pattern, field.ty.clone(), out);
                        }
                        None => {
                            let err = out.fail(
                                f,
                                TypeErrorKind::UnknownMember {
                                    ty: subject.clone(),
                                    name: name.clone(),
                                },
                            );
                            self.poison(f, err, out);
                        }
                    }
                }
                if let Some(rest) = rest {
                    let remaining = available
                        .into_iter()
                        .filter(|a| !matched.contains(&a.name))
                        .map(|a| (a.name, a.ty))
                        .collect();
                    out.set(*rest, Ty::structure(remaining));
                }
            }
            NodeKind::PatVariant { path, args, target } => {
                self.bind_variant(pat, path, args, *target, ty, out)
            }
            NodeKind::PatField { pattern, .. } => {
                out.set(pat, ty.clone());
                self.bind_pattern(*pattern, ty, out);
            }
            _ => out.set(pat, ty),
        }
    }

    fn bind_variant(
        &mut self,
        pat: NodeId,
        path: &str,
        args: &[NodeId],
        target: Option<NodeId>,
        ty: Ty,
        out: &mut CaseBindings,
    ) {
        let Some(ctor) = target else {
            let err = out.fail(pat, TypeErrorKind::UnresolvedReference { name: path.to_string() });
            return self.poison(pat, err, out);
        };
        let ctor_ty = self.get_type(ctor);
        let Ty::VariantConstructor(c) = &ctor_ty else {
            return self.poison(pat, ctor_ty.clone(), out);
        };
        let subject = self.resolve(ty.unwrap_nullable());
        let decl = c.variant.nominal.decl;
        let scrutinee_args = match &subject {
            Ty::Variant(v) if v.nominal.decl == decl => v.nominal.args.clone(),
            Ty::VariantConstructor(sc) if sc.variant.nominal.decl == decl => sc.args.clone(),
            Ty::Any => vec![Ty::Any; c.variant.nominal.generics.len()],
            _ => return self.mismatch(pat, "variant", &ty, out),
        };
        let subst = subst_from(&c.variant.nominal.generics, &scrutinee_args);
        let params: Vec<Ty> = c
            .sig()
            .map(|s| s.params.iter().map(|p| apply(&p.ty, &subst)).collect())
            .unwrap_or_default();
        out.set(pat, apply(&ctor_ty, &subst));

        let extra = if params.len() != args.len() {
            Some(out.fail(
                pat,
                TypeErrorKind::ArityMismatch {
                    expected: params.len(),
                    found: args.len(),
                },
            ))
        } else {
            None
        };
        for (k, a) in args.iter().enumerate() {
            match (params.get(k), &extra) {
                (Some(param), _) => self.bind_pattern(*a, param.clone(), out),
                (None, Some(err)) => self.poison(*a, err.clone(), out),
                (None, None) => {}
            }
        }
    }

    fn mismatch(&mut self, pat: NodeId, what: &'static str, ty: &Ty, out: &mut CaseBindings) {
        let err = out.fail(
            pat,
            TypeErrorKind::StructuralMismatch {
                pattern: what,
                scrutinee: ty.clone(),
            },
        );
        self.poison(pat, err, out);
    }

    /// Give `pat` and every pattern below it the type `err`.
    fn poison(&mut self, pat: NodeId, err: Ty, out: &mut CaseBindings) {
        let ast = self.ast;
        let mut stack = vec![pat];
        while let Some(n) = stack.pop() {
            if !ast.kind(n).is_pattern() {
                continue;
            }
            out.set(n, err.clone());
            stack.extend(ast.kind(n).children());
        }
    }
}
