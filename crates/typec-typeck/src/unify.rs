//! One-directional unification of parameter types against argument types.
//!
//! Walking a parameter type next to the type of the argument passed for it
//! offers every type found opposite a generic leaf to that generic's [`Bag`].
//! A generic's binding is the join of its offers, or `never` when nothing was
//! offered. Unification never fails: shapes that do not line up simply offer
//! nothing.

use rustc_hash::FxHashMap;
use typec_ast::NodeId;

use crate::error::TypeErrorKind;
use crate::infer::Infer;
use crate::subst::{apply, Subst};
use crate::ty::{GenericTy, Ty};

/// Types offered per generic name, with the argument node that offered them.
#[derive(Default, Debug)]
pub(crate) struct Bag {
    offers: FxHashMap<String, Vec<(Ty, Option<NodeId>)>>,
}

impl Bag {
    pub fn offer(&mut self, name: &str, ty: Ty, origin: Option<NodeId>) {
        self.offers.entry(name.to_string()).or_default().push((ty, origin));
    }

    pub fn types(&self, name: &str) -> Vec<Ty> {
        self.offers
            .get(name)
            .map(|o| o.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default()
    }

    /// First argument node that offered a type for `name`.
    pub fn origin(&self, name: &str) -> Option<NodeId> {
        self.offers
            .get(name)
            .and_then(|o| o.iter().find_map(|(_, n)| *n))
    }
}

/// Depth bound for walking argument types; references can unfold forever.
const MAX_UNIFY_DEPTH: usize = 16;

fn super_args(decl: NodeId, supers: &[Ty]) -> Option<Vec<Ty>> {
    supers.iter().find_map(|s| match s {
        Ty::Reference(r) if r.decl == decl => Some(r.args.clone()),
        _ => None,
    })
}

impl<'a> Infer<'a> {
    /// Offer the parts of `arg` that sit opposite a generic of `generics`
    /// in `param`.
    pub(crate) fn unify_into(
        &mut self,
        param: &Ty,
        arg: &Ty,
        generics: &[GenericTy],
        bag: &mut Bag,
        origin: Option<NodeId>,
    ) {
        self.unify_at(param, arg, generics, bag, origin, 0);
    }

    fn unify_at(
        &mut self,
        param: &Ty,
        arg: &Ty,
        generics: &[GenericTy],
        bag: &mut Bag,
        origin: Option<NodeId>,
        depth: usize,
    ) {
        if depth > MAX_UNIFY_DEPTH || !param.has_generics() {
            return;
        }
        let depth = depth + 1;
        let pairwise = |this: &mut Self, ps: &[Ty], xs: &[Ty], bag: &mut Bag| {
            for (p, x) in ps.iter().zip(xs) {
                this.unify_at(p, x, generics, bag, origin, depth);
            }
        };
        match (param, arg) {
            (Ty::Generic(g), _) => {
                if !generics.iter().any(|d| d.name == g.name) {
                    return;
                }
                if matches!(arg, Ty::Generic(a) if a.name == g.name) {
                    return;
                }
                bag.offer(&g.name, arg.clone(), origin);
            }
            (Ty::Reference(p), _) => {
                if let Some(xs) = self.nominal_args_for(p.decl, arg) {
                    pairwise(self, &p.args, &xs, bag);
                }
            }
            (Ty::Class(_) | Ty::Interface(_) | Ty::Variant(_), _) => {
                let (decl, ps) = match param {
                    Ty::Class(c) => (c.nominal.decl, c.nominal.args.clone()),
                    Ty::Interface(i) => (i.nominal.decl, i.nominal.args.clone()),
                    Ty::Variant(v) => (v.nominal.decl, v.nominal.args.clone()),
                    _ => (None, Vec::new()),
                };
                if let Some(decl) = decl {
                    if let Some(xs) = self.nominal_args_for(decl, arg) {
                        pairwise(self, &ps, &xs, bag);
                    }
                }
            }
            (Ty::VariantConstructor(p), _) => {
                let arg = self.resolve(arg);
                if let Ty::VariantConstructor(a) = &arg {
                    if a.decl == p.decl {
                        pairwise(self, &p.args, &a.args, bag);
                    }
                }
            }
            (_, Ty::Reference(_)) => {
                let resolved = self.resolve(arg);
                if !matches!(resolved, Ty::Reference(_)) {
                    self.unify_at(param, &resolved, generics, bag, origin, depth);
                }
            }
            (Ty::Struct(p), Ty::Struct(a)) => {
                for field in &p.fields {
                    if let Some(af) = a.field(&field.name) {
                        self.unify_at(&field.ty, &af.ty, generics, bag, origin, depth);
                    }
                }
            }
            (Ty::Array(p), Ty::Array(a)) => self.unify_at(p, a, generics, bag, origin, depth),
            (Ty::Nullable(p), Ty::Nullable(a)) => {
                self.unify_at(p, a, generics, bag, origin, depth)
            }
            (Ty::Nullable(_), Ty::Null) => {}
            (Ty::Nullable(p), _) => self.unify_at(p, arg, generics, bag, origin, depth),
            (Ty::Tuple(ps), Ty::Tuple(xs)) => pairwise(self, ps, xs, bag),
            (Ty::Function(p), Ty::Function(a)) | (Ty::Coroutine(p), Ty::Coroutine(a)) => {
                for (pp, ap) in p.params.iter().zip(&a.params) {
                    self.unify_at(&pp.ty, &ap.ty, generics, bag, origin, depth);
                }
                self.unify_at(&p.ret, &a.ret, generics, bag, origin, depth);
            }
            (Ty::Union(ps), _) => {
                // Only a single generic-carrying member can be matched
                // without guessing.
                let mut open = ps.iter().filter(|p| p.has_generics());
                if let (Some(p), None) = (open.next(), open.next()) {
                    self.unify_at(p, arg, generics, bag, origin, depth);
                }
            }
            _ => {}
        }
    }

    /// Arguments `arg` supplies for the nominal declaration `decl`: its own
    /// arguments if it is an instance of `decl`, else those of a supertype
    /// that is.
    fn nominal_args_for(&mut self, decl: NodeId, arg: &Ty) -> Option<Vec<Ty>> {
        if let Ty::Reference(r) = arg {
            if r.decl == decl {
                return Some(r.args.clone());
            }
        }
        let resolved = self.resolve(arg);
        match &resolved {
            Ty::VariantConstructor(c) if c.variant.nominal.decl == Some(decl) => {
                Some(c.args.clone())
            }
            Ty::Class(c) => {
                if c.nominal.decl == Some(decl) {
                    return Some(c.nominal.args.clone());
                }
                let supers = c.supers.clone();
                super_args(decl, &supers)
            }
            Ty::Interface(i) => {
                if i.nominal.decl == Some(decl) {
                    return Some(i.nominal.args.clone());
                }
                let supers = i.supers.clone();
                super_args(decl, &supers)
            }
            Ty::Variant(v) if v.nominal.decl == Some(decl) => Some(v.nominal.args.clone()),
            Ty::Implementation(i) if i.nominal.decl == Some(decl) => {
                Some(i.nominal.args.clone())
            }
            _ => None,
        }
    }

    /// Bindings from `bag`. With `partial`, generics without offers stay
    /// unbound; otherwise they bind to `never`.
    pub(crate) fn bindings(&mut self, generics: &[GenericTy], bag: &Bag, partial: bool) -> Subst {
        let mut subst = Subst::default();
        for g in generics {
            let offered = bag.types(&g.name);
            if offered.is_empty() {
                if !partial {
                    subst.insert(g.name.clone(), Ty::Never);
                }
                continue;
            }
            let joined = self.join(offered);
            if partial && joined.is_recursion_placeholder() {
                continue;
            }
            subst.insert(g.name.clone(), joined);
        }
        subst
    }

    /// Check each binding against its generic's constraint. Violations are
    /// recorded as side errors on the offering argument, or on `fallback`.
    pub(crate) fn check_constraints(
        &mut self,
        generics: &[GenericTy],
        subst: &Subst,
        bag: &Bag,
        fallback: NodeId,
    ) {
        for g in generics {
            let (Some(constraint), Some(bound)) = (&g.constraint, subst.get(&g.name)) else {
                continue;
            };
            if *bound == Ty::Never || bound.is_error() {
                continue;
            }
            let constraint = apply(constraint, subst);
            if self.satisfies(bound, &constraint) {
                continue;
            }
            let node = bag.origin(&g.name).unwrap_or(fallback);
            let doc = self.ast.document_of(node);
            log::debug!("[infer] `{}` violates `{}: {}`", bound, g.name, constraint);
            self.tc.cache.push_side_error(
                doc,
                node,
                crate::error::TypeError::new(
                    TypeErrorKind::ConstraintViolation {
                        generic: g.name.clone(),
                        constraint,
                        found: bound.clone(),
                    },
                    Some(node),
                ),
            );
        }
    }

    /// A binding satisfies a constraint when it is assignable to it.
    pub(crate) fn satisfies(&mut self, ty: &Ty, constraint: &Ty) -> bool {
        self.is_assignable(ty, constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_remembers_the_first_origin() {
        let mut bag = Bag::default();
        bag.offer("T", Ty::u32(), None);
        bag.offer("T", Ty::u8(), Some(NodeId(7)));
        bag.offer("T", Ty::u8(), Some(NodeId(9)));
        assert_eq!(bag.types("T").len(), 3);
        assert_eq!(bag.origin("T"), Some(NodeId(7)));
        assert!(bag.types("U").is_empty());
    }
}
