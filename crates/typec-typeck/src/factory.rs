//! Constructors for [`Ty`] values.
//!
//! Every kind with an invariant is built here: integer and float widths are
//! checked, nullable wrappers collapse, unions flatten, and a constructor type
//! can only be made from a resolved variant. Code elsewhere in the checker
//! should go through these instead of building variants by hand.

use std::rc::Rc;

use typec_ast::{FloatSuffix, IntSuffix, NodeId, Prim};

use crate::error::{TypeError, TypeErrorKind};
use crate::ty::{
    FloatBits, FnParam, FnTy, GenericTy, IntTy, RefTy, StructField, StructTy, Ty, VariantCtorTy,
};

impl Ty {
    /// Integer type; an unsupported width yields an error value.
    pub fn int(signed: bool, bits: u8) -> Ty {
        match bits {
            8 | 16 | 32 | 64 => Ty::Int(IntTy { signed, bits }),
            _ => Ty::unsupported(format!("unsupported integer width {}", bits), None),
        }
    }

    pub fn u8() -> Ty {
        Ty::int(false, 8)
    }

    pub fn u32() -> Ty {
        Ty::int(false, 32)
    }

    pub fn u64() -> Ty {
        Ty::int(false, 64)
    }

    pub fn i32() -> Ty {
        Ty::int(true, 32)
    }

    pub fn i64() -> Ty {
        Ty::int(true, 64)
    }

    /// Float type; only 32 and 64 bits exist.
    pub fn float(bits: u8) -> Ty {
        match bits {
            32 => Ty::Float(FloatBits::F32),
            64 => Ty::Float(FloatBits::F64),
            _ => Ty::unsupported(format!("unsupported float width {}", bits), None),
        }
    }

    pub fn f32() -> Ty {
        Ty::Float(FloatBits::F32)
    }

    pub fn f64() -> Ty {
        Ty::Float(FloatBits::F64)
    }

    pub fn from_prim(prim: Prim) -> Ty {
        match prim {
            Prim::U8 => Ty::int(false, 8),
            Prim::U16 => Ty::int(false, 16),
            Prim::U32 => Ty::int(false, 32),
            Prim::U64 => Ty::int(false, 64),
            Prim::I8 => Ty::int(true, 8),
            Prim::I16 => Ty::int(true, 16),
            Prim::I32 => Ty::int(true, 32),
            Prim::I64 => Ty::int(true, 64),
            Prim::F32 => Ty::f32(),
            Prim::F64 => Ty::f64(),
            Prim::Bool => Ty::Bool,
            Prim::Char => Ty::Char,
            Prim::String => Ty::String,
            Prim::Void => Ty::Void,
            Prim::Null => Ty::Null,
            Prim::Never => Ty::Never,
            Prim::Any => Ty::Any,
        }
    }

    pub fn from_int_suffix(suffix: IntSuffix) -> Ty {
        Ty::int(suffix.signed(), suffix.bits())
    }

    pub fn from_float_suffix(suffix: FloatSuffix) -> Ty {
        match suffix {
            FloatSuffix::F32 => Ty::f32(),
            FloatSuffix::F64 => Ty::f64(),
        }
    }

    pub fn array(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    /// `T?`. Already-nullable types, `null` and errors are returned unchanged.
    pub fn nullable(base: Ty) -> Ty {
        match base {
            Ty::Nullable(_) | Ty::Null | Ty::Any | Ty::Error(_) => base,
            other => Ty::Nullable(Box::new(other)),
        }
    }

    pub fn tuple(elems: Vec<Ty>) -> Ty {
        Ty::Tuple(elems)
    }

    /// Anonymous struct. Field names are not checked for uniqueness here.
    pub fn structure(fields: Vec<(String, Ty)>) -> Ty {
        Ty::Struct(Rc::new(StructTy {
            decl: None,
            name: None,
            fields: fields
                .into_iter()
                .map(|(name, ty)| StructField { name, ty })
                .collect(),
        }))
    }

    /// Union of `members`, flattening nested unions and dropping duplicates.
    /// A single remaining member is returned as is.
    pub fn union(members: Vec<Ty>) -> Ty {
        let mut flat: Vec<Ty> = Vec::with_capacity(members.len());
        for m in members {
            let parts = match m {
                Ty::Union(inner) => inner,
                other => vec![other],
            };
            for p in parts {
                if !flat.contains(&p) {
                    flat.push(p);
                }
            }
        }
        match flat.len() {
            0 => Ty::Never,
            1 => flat.pop().unwrap_or(Ty::Never),
            _ => Ty::Union(flat),
        }
    }

    pub fn function(generics: Vec<GenericTy>, params: Vec<FnParam>, ret: Ty) -> Ty {
        Ty::Function(Rc::new(FnTy {
            generics,
            params,
            ret,
        }))
    }

    /// Coroutine over `func`; anything but a function is rejected.
    pub fn coroutine(func: Ty, node: Option<NodeId>) -> Ty {
        match func {
            Ty::Function(sig) => Ty::Coroutine(sig),
            Ty::Error(_) => func,
            other => Ty::error(TypeErrorKind::NotCallable { ty: other }, node),
        }
    }

    pub fn reference(decl: NodeId, name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::Reference(Rc::new(RefTy {
            decl,
            name: name.into(),
            args,
        }))
    }

    pub fn generic(name: impl Into<String>, constraint: Option<Ty>, decl: Option<NodeId>) -> Ty {
        Ty::Generic(Rc::new(GenericTy {
            name: name.into(),
            constraint,
            decl,
        }))
    }

    /// A constructor of the resolved `variant`. Anything other than a variant
    /// (in particular an unresolved reference) yields an error value.
    pub fn variant_constructor(variant: &Ty, name: &str, args: Vec<Ty>, node: Option<NodeId>) -> Ty {
        let Ty::Variant(v) = variant else {
            return Ty::unsupported(
                format!("`{}` is not a variant type", variant),
                node,
            );
        };
        match v.constructor(name) {
            Some(ctor) => Ty::VariantConstructor(Rc::new(VariantCtorTy {
                variant: v.clone(),
                name: name.to_string(),
                args,
                decl: ctor.decl,
            })),
            None => Ty::error(
                TypeErrorKind::UnknownMember {
                    ty: variant.clone(),
                    name: name.to_string(),
                },
                node,
            ),
        }
    }

    pub fn meta(ty: Ty) -> Ty {
        match ty {
            Ty::Error(_) => ty,
            other => Ty::Meta(Box::new(other)),
        }
    }

    pub fn error(kind: TypeErrorKind, node: Option<NodeId>) -> Ty {
        Ty::Error(Rc::new(TypeError::new(kind, node)))
    }

    pub fn unsupported(what: impl Into<String>, node: Option<NodeId>) -> Ty {
        Ty::error(TypeErrorKind::UnsupportedConstruct { what: what.into() }, node)
    }

    pub fn unresolved(name: impl Into<String>, node: Option<NodeId>) -> Ty {
        Ty::error(TypeErrorKind::UnresolvedReference { name: name.into() }, node)
    }

    /// The placeholder returned for a type that is still being inferred.
    pub fn recursion_placeholder(node: Option<NodeId>) -> Ty {
        Ty::error(TypeErrorKind::CircularInference, node)
    }
}

impl FnParam {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        FnParam {
            name: name.into(),
            ty,
            mutable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Nominal, VariantTy, CtorSig};

    #[test]
    fn widths_are_checked() {
        assert_eq!(Ty::int(false, 16).to_string(), "u16");
        assert!(Ty::int(true, 12).is_error());
        assert!(Ty::float(16).is_error());
        assert_eq!(Ty::float(32), Ty::f32());
    }

    #[test]
    fn nullable_collapses() {
        let once = Ty::nullable(Ty::u32());
        assert_eq!(Ty::nullable(once.clone()), once);
        assert_eq!(Ty::nullable(Ty::Null), Ty::Null);
    }

    #[test]
    fn unions_flatten_and_dedup() {
        let inner = Ty::union(vec![Ty::u32(), Ty::String]);
        let outer = Ty::union(vec![inner, Ty::u32(), Ty::Bool]);
        assert_eq!(outer.to_string(), "u32 | string | bool");
        assert_eq!(Ty::union(vec![Ty::Bool]), Ty::Bool);
    }

    #[test]
    fn constructors_need_a_resolved_variant() {
        let variant = Ty::Variant(Rc::new(VariantTy {
            nominal: Nominal {
                decl: Some(NodeId(0)),
                name: Some("Result".into()),
                generics: vec![],
                args: vec![Ty::i32(), Ty::Never],
            },
            constructors: vec![CtorSig {
                name: "Ok".into(),
                decl: NodeId(1),
                params: vec![],
            }],
        }));
        let ok = Ty::variant_constructor(&variant, "Ok", vec![Ty::i32(), Ty::Never], None);
        assert_eq!(ok.to_string(), "Result.Ok<i32, never>");

        let reference = Ty::reference(NodeId(0), "Result", vec![]);
        assert!(Ty::variant_constructor(&reference, "Ok", vec![], None).is_error());
        assert!(Ty::variant_constructor(&variant, "Err", vec![], None).is_error());
    }
}
