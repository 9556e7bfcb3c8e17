//! Relations between types: semantic equality, assignability and the common
//! type of a set of candidates.
//!
//! All three look through references, so they live on [`Infer`] rather than
//! on [`Ty`]. Named types compare by declaration node, never by name.

use std::rc::Rc;

use typec_ast::NodeId;

use crate::infer::Infer;
use crate::subst::{apply, subst_from};
use crate::ty::{FloatBits, IntTy, Nominal, Ty, VariantTy};

/// Nesting bound for the recursive relations; types reached through
/// references can be infinite.
const MAX_RELATE_DEPTH: usize = 24;

fn int_widens(from: IntTy, to: IntTy) -> bool {
    if from.signed == to.signed {
        from.bits <= to.bits
    } else {
        !from.signed && to.signed && from.bits < to.bits
    }
}

/// Declaration and arguments of a nominal type, reference or constructor.
fn nominal_parts(ty: &Ty) -> Option<(NodeId, &[Ty])> {
    match ty {
        Ty::Reference(r) => Some((r.decl, &r.args)),
        Ty::Class(c) => c.nominal.decl.map(|d| (d, c.nominal.args.as_slice())),
        Ty::Interface(i) => i.nominal.decl.map(|d| (d, i.nominal.args.as_slice())),
        Ty::Implementation(i) => i.nominal.decl.map(|d| (d, i.nominal.args.as_slice())),
        Ty::Variant(v) => v.nominal.decl.map(|d| (d, v.nominal.args.as_slice())),
        _ => None,
    }
}

impl<'a> Infer<'a> {
    /// Semantic equality: structural, except that references are resolved
    /// against nominal types and named types compare by declaration.
    pub(crate) fn same_type(&mut self, a: &Ty, b: &Ty) -> bool {
        self.same_at(a, b, 0)
    }

    fn same_at(&mut self, a: &Ty, b: &Ty, depth: usize) -> bool {
        if a == b {
            return true;
        }
        if depth > MAX_RELATE_DEPTH {
            return false;
        }
        let depth = depth + 1;
        if let (Some((da, aa)), Some((db, ab))) = (nominal_parts(a), nominal_parts(b)) {
            if da != db || aa.len() != ab.len() {
                return false;
            }
            let (aa, ab) = (aa.to_vec(), ab.to_vec());
            return aa.iter().zip(&ab).all(|(x, y)| self.same_at(x, y, depth));
        }
        match (a, b) {
            (Ty::Array(x), Ty::Array(y)) | (Ty::Nullable(x), Ty::Nullable(y)) => {
                self.same_at(x, y, depth)
            }
            (Ty::Meta(x), Ty::Meta(y)) => self.same_at(x, y, depth),
            (Ty::Tuple(xs), Ty::Tuple(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.same_at(x, y, depth))
            }
            (Ty::Union(xs), Ty::Union(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|x| ys.iter().any(|y| self.same_at(x, y, depth)))
            }
            (Ty::Struct(x), Ty::Struct(y)) => match (x.decl, y.decl) {
                (Some(dx), Some(dy)) => dx == dy,
                (None, None) => {
                    x.fields.len() == y.fields.len()
                        && x.fields.iter().zip(&y.fields).all(|(fx, fy)| {
                            fx.name == fy.name && self.same_at(&fx.ty, &fy.ty, depth)
                        })
                }
                _ => false,
            },
            (Ty::Function(x), Ty::Function(y)) | (Ty::Coroutine(x), Ty::Coroutine(y)) => {
                x.params.len() == y.params.len()
                    && x.generics.len() == y.generics.len()
                    && x.params
                        .iter()
                        .zip(&y.params)
                        .all(|(px, py)| self.same_at(&px.ty, &py.ty, depth))
                    && self.same_at(&x.ret, &y.ret, depth)
            }
            (Ty::VariantConstructor(x), Ty::VariantConstructor(y)) => {
                x.decl == y.decl
                    && x.args.len() == y.args.len()
                    && x.args.iter().zip(&y.args).all(|(p, q)| self.same_at(p, q, depth))
            }
            (Ty::Enum(x), Ty::Enum(y)) => match (x.decl, y.decl) {
                (Some(dx), Some(dy)) => dx == dy,
                _ => x.cases == y.cases,
            },
            (Ty::Generic(x), Ty::Generic(y)) => match (x.decl, y.decl) {
                (Some(dx), Some(dy)) => dx == dy,
                _ => x.name == y.name,
            },
            _ => false,
        }
    }

    /// Whether a value of type `from` can be used where `to` is expected.
    pub(crate) fn is_assignable(&mut self, from: &Ty, to: &Ty) -> bool {
        self.assignable_at(from, to, 0)
    }

    fn assignable_at(&mut self, from: &Ty, to: &Ty, depth: usize) -> bool {
        if from == to {
            return true;
        }
        if depth > MAX_RELATE_DEPTH {
            return false;
        }
        let depth = depth + 1;
        match (from, to) {
            (Ty::Error(_), _) | (_, Ty::Error(_)) => true,
            (Ty::Never, _) | (_, Ty::Any) | (Ty::Any, _) => true,
            (Ty::Null, Ty::Nullable(_)) => true,
            (Ty::Nullable(f), Ty::Nullable(t)) => self.assignable_at(f, t, depth),
            (_, Ty::Nullable(t)) => self.assignable_at(from, t, depth),
            (Ty::Int(f), Ty::Int(t)) => int_widens(*f, *t),
            (Ty::Float(FloatBits::F32), Ty::Float(FloatBits::F64)) => true,
            (Ty::StringEnum(_), Ty::String) => true,
            (Ty::Union(members), _) => {
                let members = members.clone();
                members.iter().all(|m| self.assignable_at(m, to, depth))
            }
            (_, Ty::Union(members)) => {
                let members = members.clone();
                members.iter().any(|m| self.assignable_at(from, m, depth))
            }
            (Ty::Array(f), Ty::Array(t)) => self.assignable_at(f, t, depth),
            (Ty::Tuple(fs), Ty::Tuple(ts)) => {
                fs.len() == ts.len()
                    && fs.iter().zip(ts).all(|(f, t)| self.assignable_at(f, t, depth))
            }
            (Ty::Struct(f), Ty::Struct(t)) => {
                if let (Some(df), Some(dt)) = (f.decl, t.decl) {
                    return df == dt;
                }
                let (f, t) = (f.clone(), t.clone());
                t.fields.iter().all(|tf| match f.field(&tf.name) {
                    Some(ff) => self.assignable_at(&ff.ty, &tf.ty, depth),
                    None => false,
                })
            }
            (Ty::Function(f), Ty::Function(t)) => {
                let (f, t) = (f.clone(), t.clone());
                f.params.len() == t.params.len()
                    && f.params
                        .iter()
                        .zip(&t.params)
                        .all(|(pf, pt)| self.assignable_at(&pt.ty, &pf.ty, depth))
                    && self.assignable_at(&f.ret, &t.ret, depth)
            }
            (Ty::Coroutine(f), Ty::Coroutine(t)) => self.assignable_at(&f.ret, &t.ret, depth),
            (Ty::VariantConstructor(c), _) => match to {
                Ty::VariantConstructor(d) => {
                    let (c, d) = (c.clone(), d.clone());
                    c.decl == d.decl && self.args_assignable(&c.args, &d.args, depth)
                }
                _ => match nominal_parts(to) {
                    Some((decl, args)) if Some(decl) == c.variant.nominal.decl => {
                        let (c, args) = (c.clone(), args.to_vec());
                        self.args_assignable(&c.args, &args, depth)
                    }
                    _ => false,
                },
            },
            _ => self.nominal_assignable(from, to, depth),
        }
    }

    fn args_assignable(&mut self, from: &[Ty], to: &[Ty], depth: usize) -> bool {
        from.len() == to.len()
            && from
                .iter()
                .zip(to)
                .all(|(f, t)| self.assignable_at(f, t, depth))
    }

    /// Nominal cases: same declaration with assignable arguments, or a class
    /// or interface reaching the target through its supertypes.
    fn nominal_assignable(&mut self, from: &Ty, to: &Ty, depth: usize) -> bool {
        let Some((to_decl, to_args)) = nominal_parts(to) else {
            return match from {
                Ty::Reference(_) => {
                    let resolved = self.resolve(from);
                    !matches!(resolved, Ty::Reference(_))
                        && self.assignable_at(&resolved, to, depth)
                }
                _ => false,
            };
        };
        let to_args = to_args.to_vec();
        let Some((from_decl, from_args)) = nominal_parts(from) else {
            return false;
        };
        if from_decl == to_decl {
            let from_args = from_args.to_vec();
            return self.args_assignable(&from_args, &to_args, depth);
        }
        let resolved = self.resolve(from);
        let supers = match &resolved {
            Ty::Class(c) => c.supers.clone(),
            Ty::Interface(i) => i.supers.clone(),
            _ => return false,
        };
        supers
            .iter()
            .any(|s| self.assignable_at(s, to, depth))
    }

    /// Common type of `candidates`.
    ///
    /// 1. recursion placeholders are dropped (all of them kept if nothing
    ///    else remains);
    /// 2. `never` is dropped; nothing left gives `never`;
    /// 3. `null` makes the result the nullable join of the rest;
    /// 4. the first candidate every other candidate is assignable to;
    /// 5. constructors and instances of one variant give the variant with
    ///    argument-wise joins;
    /// 6. otherwise the first candidate.
    pub(crate) fn join(&mut self, candidates: Vec<Ty>) -> Ty {
        let mut cands: Vec<Ty> = candidates
            .iter()
            .filter(|c| !c.is_recursion_placeholder())
            .cloned()
            .collect();
        if cands.is_empty() {
            cands = candidates;
        }
        cands.retain(|c| *c != Ty::Never);
        if cands.is_empty() {
            return Ty::Never;
        }
        if cands.iter().any(|c| *c == Ty::Null) {
            let rest: Vec<Ty> = cands.into_iter().filter(|c| *c != Ty::Null).collect();
            if rest.is_empty() {
                return Ty::Null;
            }
            let inner = self.join(rest);
            return Ty::nullable(inner);
        }
        if cands.len() == 1 {
            return cands.swap_remove(0);
        }
        for i in 0..cands.len() {
            let target = cands[i].clone();
            let covers = (0..cands.len())
                .filter(|j| *j != i)
                .all(|j| {
                    let other = cands[j].clone();
                    self.is_assignable(&other, &target)
                });
            if covers {
                return target;
            }
        }
        if let Some(variant) = self.join_variants(&cands) {
            return variant;
        }
        cands.swap_remove(0)
    }

    fn join_variants(&mut self, cands: &[Ty]) -> Option<Ty> {
        let mut base: Option<Rc<VariantTy>> = None;
        let mut arg_lists: Vec<Vec<Ty>> = Vec::with_capacity(cands.len());
        for c in cands {
            let resolved = self.resolve(c);
            let (variant, args) = match &resolved {
                Ty::Variant(v) => (v.clone(), v.nominal.args.clone()),
                Ty::VariantConstructor(ctor) => (ctor.variant.clone(), ctor.args.clone()),
                _ => return None,
            };
            match &base {
                Some(b) if b.nominal.decl != variant.nominal.decl => return None,
                Some(_) => {}
                None => base = Some(variant),
            }
            arg_lists.push(args);
        }
        let base = base?;
        let arity = base.nominal.generics.len();
        if arg_lists.iter().any(|a| a.len() != arity) {
            return None;
        }
        let joined: Vec<Ty> = (0..arity)
            .map(|k| arg_lists.iter().map(|a| a[k].clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>()
            .into_iter()
            .map(|column| self.join(column))
            .collect();
        let Some(decl) = base.nominal.decl else {
            return Some(Ty::Variant(base));
        };
        // Rebuild from the declaration so constructor signatures match the
        // joined arguments.
        let declared = self.get_type(decl);
        let generics = self.decl_generics(decl);
        let variant = apply(&declared, &subst_from(&generics, &joined));
        Some(match variant {
            Ty::Variant(_) => variant,
            _ => Ty::Variant(Rc::new(VariantTy {
                nominal: Nominal {
                    args: joined,
                    ..base.nominal.clone()
                },
                constructors: base.constructors.clone(),
            })),
        })
    }
}
