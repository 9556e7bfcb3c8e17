//! Substitution of generic parameters.
//!
//! A [`Subst`] maps generic parameter names to types. [`apply`] rewrites a
//! type tree bottom-up; a function's own generic parameters shadow outer
//! bindings of the same name inside its signature.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ty::{
    Attribute, ClassTy, CtorSig, FnParam, FnTy, GenericTy, ImplTy, InterfaceTy, Method, Nominal,
    RefTy, StructField, StructTy, Ty, VariantCtorTy, VariantTy,
};

pub type Subst = FxHashMap<String, Ty>;

/// Pair generic parameters with arguments positionally. Missing arguments
/// leave the parameter unbound.
pub fn subst_from(generics: &[GenericTy], args: &[Ty]) -> Subst {
    generics
        .iter()
        .zip(args)
        .filter(|(g, a)| !matches!(a, Ty::Generic(ag) if ag.name == g.name))
        .map(|(g, a)| (g.name.clone(), a.clone()))
        .collect()
}

/// Replace every bound generic in `ty`.
pub fn apply(ty: &Ty, subst: &Subst) -> Ty {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        Ty::Generic(g) => match subst.get(&g.name) {
            Some(bound) => bound.clone(),
            None => ty.clone(),
        },
        Ty::Function(sig) => Ty::Function(apply_fn(sig, subst)),
        Ty::Coroutine(sig) => Ty::Coroutine(apply_fn(sig, subst)),
        _ => map_children(ty, &mut |child| apply(child, subst)),
    }
}

pub fn apply_fn(sig: &Rc<FnTy>, subst: &Subst) -> Rc<FnTy> {
    if sig.generics.iter().any(|g| subst.contains_key(&g.name)) {
        let mut inner = subst.clone();
        for g in &sig.generics {
            inner.remove(&g.name);
        }
        return map_fn(sig, &mut |t| apply(t, &inner));
    }
    map_fn(sig, &mut |t| apply(t, subst))
}

fn map_fn(sig: &FnTy, f: &mut dyn FnMut(&Ty) -> Ty) -> Rc<FnTy> {
    Rc::new(FnTy {
        generics: sig.generics.iter().map(|g| map_generic(g, f)).collect(),
        params: sig
            .params
            .iter()
            .map(|p| FnParam {
                name: p.name.clone(),
                ty: f(&p.ty),
                mutable: p.mutable,
            })
            .collect(),
        ret: f(&sig.ret),
    })
}

fn map_generic(g: &GenericTy, f: &mut dyn FnMut(&Ty) -> Ty) -> GenericTy {
    GenericTy {
        name: g.name.clone(),
        constraint: g.constraint.as_ref().map(|c| f(c)),
        decl: g.decl,
    }
}

fn map_nominal(n: &Nominal, f: &mut dyn FnMut(&Ty) -> Ty) -> Nominal {
    Nominal {
        decl: n.decl,
        name: n.name.clone(),
        generics: n.generics.clone(),
        args: n.args.iter().map(|a| f(a)).collect(),
    }
}

fn map_attributes(attrs: &[Attribute], f: &mut dyn FnMut(&Ty) -> Ty) -> Vec<Attribute> {
    attrs
        .iter()
        .map(|a| Attribute {
            name: a.name.clone(),
            ty: f(&a.ty),
            is_static: a.is_static,
            is_const: a.is_const,
        })
        .collect()
}

fn map_methods(methods: &[Method], f: &mut dyn FnMut(&Ty) -> Ty) -> Vec<Method> {
    methods
        .iter()
        .map(|m| {
            let sig = match f(&Ty::Function(m.sig.clone())) {
                Ty::Function(sig) => sig,
                _ => m.sig.clone(),
            };
            Method {
                name: m.name.clone(),
                decl: m.decl,
                sig,
                is_override: m.is_override,
                is_static: m.is_static,
            }
        })
        .collect()
}

fn map_variant(v: &VariantTy, f: &mut dyn FnMut(&Ty) -> Ty) -> VariantTy {
    VariantTy {
        nominal: map_nominal(&v.nominal, f),
        constructors: v
            .constructors
            .iter()
            .map(|c| CtorSig {
                name: c.name.clone(),
                decl: c.decl,
                params: c
                    .params
                    .iter()
                    .map(|p| FnParam {
                        name: p.name.clone(),
                        ty: f(&p.ty),
                        mutable: p.mutable,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Rebuild `ty` with `f` applied to each direct child type. Method signatures
/// are passed to `f` as function types.
pub fn map_children(ty: &Ty, f: &mut dyn FnMut(&Ty) -> Ty) -> Ty {
    match ty {
        Ty::Array(elem) => Ty::Array(Box::new(f(elem))),
        Ty::Nullable(base) => Ty::nullable(f(base)),
        Ty::Meta(inner) => Ty::Meta(Box::new(f(inner))),
        Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| f(e)).collect()),
        Ty::Union(members) => Ty::union(members.iter().map(|m| f(m)).collect()),
        Ty::Struct(s) => Ty::Struct(Rc::new(StructTy {
            decl: s.decl,
            name: s.name.clone(),
            fields: s
                .fields
                .iter()
                .map(|fd| StructField {
                    name: fd.name.clone(),
                    ty: f(&fd.ty),
                })
                .collect(),
        })),
        Ty::Function(sig) => Ty::Function(map_fn(sig, f)),
        Ty::Coroutine(sig) => Ty::Coroutine(map_fn(sig, f)),
        Ty::Class(c) => Ty::Class(Rc::new(ClassTy {
            nominal: map_nominal(&c.nominal, f),
            attributes: map_attributes(&c.attributes, f),
            methods: map_methods(&c.methods, f),
            supers: c.supers.iter().map(|s| f(s)).collect(),
            impls: c.impls.iter().map(|i| f(i)).collect(),
            stub: c.stub,
        })),
        Ty::Interface(i) => Ty::Interface(Rc::new(InterfaceTy {
            nominal: map_nominal(&i.nominal, f),
            methods: map_methods(&i.methods, f),
            supers: i.supers.iter().map(|s| f(s)).collect(),
        })),
        Ty::Implementation(i) => Ty::Implementation(Rc::new(ImplTy {
            nominal: map_nominal(&i.nominal, f),
            attributes: map_attributes(&i.attributes, f),
            methods: map_methods(&i.methods, f),
            stub: i.stub,
        })),
        Ty::Variant(v) => Ty::Variant(Rc::new(map_variant(v, f))),
        Ty::VariantConstructor(c) => Ty::VariantConstructor(Rc::new(VariantCtorTy {
            variant: Rc::new(map_variant(&c.variant, f)),
            name: c.name.clone(),
            args: c.args.iter().map(|a| f(a)).collect(),
            decl: c.decl,
        })),
        Ty::Reference(r) => Ty::Reference(Rc::new(RefTy {
            decl: r.decl,
            name: r.name.clone(),
            args: r.args.iter().map(|a| f(a)).collect(),
        })),
        Ty::Generic(g) => Ty::Generic(Rc::new(map_generic(g, f))),
        Ty::Int(_)
        | Ty::Float(_)
        | Ty::Bool
        | Ty::Char
        | Ty::String
        | Ty::Void
        | Ty::Null
        | Ty::Never
        | Ty::Any
        | Ty::Enum(_)
        | Ty::StringEnum(_)
        | Ty::Error(_) => ty.clone(),
    }
}

/// Replace recursion placeholders anywhere in `ty` using `f`.
pub fn replace_placeholders(ty: &Ty, f: &dyn Fn(&Ty) -> Ty) -> Ty {
    if ty.is_recursion_placeholder() {
        return f(ty);
    }
    match ty {
        // Member signatures of nominal types may legitimately mention stubs of
        // other entities; only the instantiation is exposed.
        Ty::Class(_) | Ty::Interface(_) | Ty::Implementation(_) | Ty::Variant(_) => ty.clone(),
        _ if !ty.has_placeholder() => ty.clone(),
        _ => map_children(ty, &mut |child| replace_placeholders(child, f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Ty {
        Ty::generic("T", None, None)
    }

    fn generic_t() -> GenericTy {
        GenericTy {
            name: "T".into(),
            constraint: None,
            decl: None,
        }
    }

    #[test]
    fn substitutes_through_nested_types() {
        let mut subst = Subst::default();
        subst.insert("T".into(), Ty::u32());
        let ty = Ty::nullable(Ty::array(Ty::tuple(vec![t(), Ty::String])));
        assert_eq!(apply(&ty, &subst).to_string(), "(u32, string)[]?");
    }

    #[test]
    fn function_generics_shadow_outer_bindings() {
        let mut subst = Subst::default();
        subst.insert("T".into(), Ty::u32());
        let inner = Ty::function(vec![generic_t()], vec![FnParam::new("x", t())], t());
        let outer = Ty::tuple(vec![t(), inner]);
        assert_eq!(
            apply(&outer, &subst).to_string(),
            "(u32, fn<T>(x: T) -> T)"
        );
    }

    #[test]
    fn pairs_generics_with_arguments() {
        let subst = subst_from(&[generic_t()], &[Ty::Bool]);
        assert_eq!(subst.get("T"), Some(&Ty::Bool));
        assert!(subst_from(&[generic_t()], &[t()]).is_empty());
    }

    #[test]
    fn placeholders_are_replaced_deeply() {
        let ty = Ty::array(Ty::recursion_placeholder(None));
        let replaced = replace_placeholders(&ty, &|_| Ty::Never);
        assert_eq!(replaced.to_string(), "never[]");
    }
}
