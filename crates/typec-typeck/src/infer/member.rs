//! Member access and member listings.
//!
//! [`Infer::members_of`] lists what can follow a `.` on a value of some type,
//! in lookup order and with shadowing already applied. Member access takes
//! the first listed member of the requested name; operator overloading and
//! overloaded calls pick among all members of one name.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use typec_ast::{NodeId, NodeKind};

use crate::error::TypeErrorKind;
use crate::infer::Infer;
use crate::ty::{Attribute, FnTy, Method, Ty};

/// Depth bound for walking supertypes and implementation blocks.
const MAX_MEMBER_DEPTH: usize = 16;

/// One member visible on a type.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: Ty,
    pub kind: MemberKind,
    /// Declaring node (attribute, method, constructor), when there is one.
    pub decl: Option<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Attribute,
    Method,
    /// Field of a struct.
    Field,
    /// Variant constructor reached through the variant's type.
    Constructor,
    /// Case of an enum reached through the enum's type.
    Case,
    /// `length` of arrays and strings, positions of tuples.
    Builtin,
}

impl Member {
    fn attribute(a: &Attribute) -> Self {
        Member {
            name: a.name.clone(),
            ty: a.ty.clone(),
            kind: MemberKind::Attribute,
            decl: None,
        }
    }

    fn method(m: &Method) -> Self {
        Member {
            name: m.name.clone(),
            ty: Ty::Function(m.sig.clone()),
            kind: MemberKind::Method,
            decl: m.decl,
        }
    }

    fn builtin(name: impl Into<String>, ty: Ty) -> Self {
        Member {
            name: name.into(),
            ty,
            kind: MemberKind::Builtin,
            decl: None,
        }
    }

    pub fn signature(&self) -> Option<&Rc<FnTy>> {
        self.ty.as_function()
    }
}

/// Lookup state of one listing.
struct Listing {
    out: Vec<Member>,
    visited: FxHashSet<NodeId>,
    /// Names of `override` methods listed so far; they hide every inherited
    /// method of that name.
    overridden: FxHashSet<String>,
}

impl<'a> Infer<'a> {
    /// Members visible on a value of type `ty`. Nullable types list the
    /// members of their base.
    pub(crate) fn members_of(&mut self, ty: &Ty) -> Vec<Member> {
        let mut listing = Listing {
            out: Vec::new(),
            visited: FxHashSet::default(),
            overridden: FxHashSet::default(),
        };
        self.collect_members(ty, false, &mut listing, 0);
        listing.out
    }

    fn collect_members(&mut self, ty: &Ty, statics: bool, listing: &mut Listing, depth: usize) {
        if depth > MAX_MEMBER_DEPTH {
            return;
        }
        let depth = depth + 1;
        match ty {
            Ty::Nullable(inner) => self.collect_members(inner, statics, listing, depth),
            Ty::Reference(_) => {
                let resolved = self.resolve(ty);
                if !matches!(resolved, Ty::Reference(_)) {
                    self.collect_members(&resolved, statics, listing, depth);
                }
            }
            Ty::Generic(g) => {
                if let Some(constraint) = &g.constraint {
                    self.collect_members(constraint, statics, listing, depth);
                }
            }
            Ty::Class(c) => {
                if let Some(decl) = c.nominal.decl {
                    if !listing.visited.insert(decl) {
                        return;
                    }
                }
                for a in c.attributes.iter().filter(|a| a.is_static == statics) {
                    self.push_attribute(a, listing);
                }
                let methods: Vec<&Method> =
                    c.methods.iter().filter(|m| m.is_static == statics).collect();
                for m in &methods {
                    self.push_inherited(m, listing);
                }
                if statics {
                    return;
                }
                listing
                    .overridden
                    .extend(methods.iter().filter(|m| m.is_override).map(|m| m.name.clone()));
                for i in &c.impls {
                    self.collect_members(i, false, listing, depth);
                }
                for s in &c.supers {
                    self.collect_members(s, false, listing, depth);
                }
            }
            Ty::Interface(i) => {
                if let Some(decl) = i.nominal.decl {
                    if !listing.visited.insert(decl) {
                        return;
                    }
                }
                for m in &i.methods {
                    self.push_inherited(m, listing);
                }
                for s in &i.supers {
                    self.collect_members(s, false, listing, depth);
                }
            }
            Ty::Implementation(i) => {
                if let Some(decl) = i.nominal.decl {
                    if !listing.visited.insert(decl) {
                        return;
                    }
                }
                for a in i.attributes.iter().filter(|a| !a.is_static) {
                    self.push_attribute(a, listing);
                }
                for m in i.methods.iter().filter(|m| !m.is_static) {
                    self.push_inherited(m, listing);
                }
            }
            Ty::Struct(s) => {
                for f in &s.fields {
                    listing.out.push(Member {
                        name: f.name.clone(),
                        ty: f.ty.clone(),
                        kind: MemberKind::Field,
                        decl: None,
                    });
                }
            }
            Ty::Array(_) | Ty::String => listing.out.push(Member::builtin("length", Ty::u64())),
            Ty::Tuple(elems) => {
                for (i, e) in elems.iter().enumerate() {
                    listing.out.push(Member::builtin(i.to_string(), e.clone()));
                }
            }
            Ty::Meta(inner) => self.collect_static_members(inner, listing, depth),
            _ => {}
        }
    }

    /// Members reached through a type in value position.
    fn collect_static_members(&mut self, ty: &Ty, listing: &mut Listing, depth: usize) {
        let resolved = self.resolve(ty);
        match &resolved {
            Ty::Class(_) => self.collect_members(&resolved, true, listing, depth),
            Ty::Variant(v) => {
                for c in &v.constructors {
                    listing.out.push(Member {
                        name: c.name.clone(),
                        ty: Ty::variant_constructor(
                            &resolved,
                            &c.name,
                            v.nominal.args.clone(),
                            Some(c.decl),
                        ),
                        kind: MemberKind::Constructor,
                        decl: Some(c.decl),
                    });
                }
            }
            Ty::Enum(e) => {
                for case in &e.cases {
                    listing.out.push(Member {
                        name: case.clone(),
                        ty: resolved.clone(),
                        kind: MemberKind::Case,
                        decl: None,
                    });
                }
            }
            _ => {}
        }
    }

    fn push_attribute(&mut self, a: &Attribute, listing: &mut Listing) {
        let taken = listing.out.iter().any(|m| {
            m.name == a.name && matches!(m.kind, MemberKind::Attribute | MemberKind::Field)
        });
        if !taken {
            listing.out.push(Member::attribute(a));
        }
    }

    /// A method, unless an `override` of its name or a method with the same
    /// name and parameter types is already listed.
    fn push_inherited(&mut self, m: &Method, listing: &mut Listing) {
        if listing.overridden.contains(&m.name) {
            return;
        }
        let params: Vec<Ty> = m.sig.param_types().cloned().collect();
        let existing: Vec<Rc<FnTy>> = listing
            .out
            .iter()
            .filter(|e| e.name == m.name)
            .filter_map(|e| e.signature().cloned())
            .collect();
        for sig in existing {
            if sig.params.len() != params.len() {
                continue;
            }
            let shadowed = sig
                .params
                .iter()
                .zip(&params)
                .all(|(a, b)| self.same_type(&a.ty, b));
            if shadowed {
                return;
            }
        }
        listing.out.push(Member::method(m));
    }

    /// Type of `base.name` / `base?.name`.
    pub(crate) fn member_access_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::Member {
            base,
            name,
            optional,
            ..
        } = ast.kind(node)
        else {
            return Ty::unsupported("not a member access", Some(node));
        };
        let base_ty = self.get_type(*base);
        if base_ty.is_error() {
            return base_ty;
        }
        if base_ty == Ty::Any {
            return Ty::Any;
        }
        let was_nullable = base_ty.is_nullable();
        let owner = base_ty.unwrap_nullable().clone();
        let found = self
            .members_of(&owner)
            .into_iter()
            .find(|m| m.name == *name)
            .map(|m| m.ty);
        let ty = match found {
            Some(ty) => ty,
            None => {
                return Ty::error(
                    TypeErrorKind::UnknownMember {
                        ty: self.resolve(&owner),
                        name: name.clone(),
                    },
                    Some(node),
                )
            }
        };
        if *optional || was_nullable {
            Ty::nullable(ty)
        } else {
            ty
        }
    }

    /// Return type of the user-defined operator `method` on `owner` for
    /// operand types `args`.
    pub(crate) fn operator_overload(&mut self, owner: &Ty, method: &str, args: &[Ty]) -> Option<Ty> {
        let candidates: Vec<Rc<FnTy>> = self
            .members_of(owner)
            .into_iter()
            .filter(|m| m.name == method)
            .filter_map(|m| m.signature().cloned())
            .filter(|sig| sig.params.len() == args.len())
            .collect();
        let known: Vec<Option<Ty>> = args.iter().cloned().map(Some).collect();
        let index = self.pick_overload(&candidates, &known)?;
        Some(candidates[index].ret.clone())
    }

    /// Index of the candidate whose parameters match `args` exactly, else of
    /// the first one every argument is assignable to. `None` entries are
    /// arguments whose type must not be looked at yet.
    pub(crate) fn pick_overload(
        &mut self,
        candidates: &[Rc<FnTy>],
        args: &[Option<Ty>],
    ) -> Option<usize> {
        let exact = (0..candidates.len()).find(|&i| {
            let sig = candidates[i].clone();
            sig.params.iter().zip(args).all(|(p, a)| match a {
                Some(a) if !a.is_recursion_placeholder() => self.same_type(&p.ty, a),
                _ => true,
            })
        });
        if exact.is_some() {
            return exact;
        }
        (0..candidates.len()).find(|&i| {
            let sig = candidates[i].clone();
            sig.params.iter().zip(args).all(|(p, a)| match a {
                Some(a) if !a.is_recursion_placeholder() => self.is_assignable(a, &p.ty),
                _ => true,
            })
        })
    }
}
