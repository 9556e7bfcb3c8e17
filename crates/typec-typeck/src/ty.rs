//! Type representation for the TypeC type system.
//!
//! [`Ty`] is a closed sum over every kind of type the checker knows about.
//! Values are immutable once built; large payloads sit behind `Rc` so types
//! clone cheaply while the checker memoizes them per node.
//!
//! Equality is structural (`derive`). The canonical rendering produced by
//! `Display` is for diagnostics and instantiation keys; semantic comparison
//! that looks through references lives in [`crate::relate`].

use std::fmt;
use std::rc::Rc;

use typec_ast::NodeId;

use crate::error::{TypeError, TypeErrorKind};

/// Signedness and width of an integer type. Width is one of 8, 16, 32, 64.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntTy {
    pub signed: bool,
    pub bits: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatBits {
    F32,
    F64,
}

/// A generic type parameter: `T` or `T: Comparable`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericTy {
    pub name: String,
    pub constraint: Option<Ty>,
    pub decl: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnParam {
    pub name: String,
    pub ty: Ty,
    pub mutable: bool,
}

/// Signature of a function, method, lambda or coroutine body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnTy {
    /// The function's own generic parameters (not its owner's).
    pub generics: Vec<GenericTy>,
    pub params: Vec<FnParam>,
    pub ret: Ty,
}

impl FnTy {
    pub fn param_types(&self) -> impl Iterator<Item = &Ty> {
        self.params.iter().map(|p| &p.ty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: Ty,
}

/// A struct type; `name` is set for `type Point = struct {..}` declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructTy {
    pub decl: Option<NodeId>,
    pub name: Option<String>,
    pub fields: Vec<StructField>,
}

impl StructTy {
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumTy {
    pub decl: Option<NodeId>,
    pub name: Option<String>,
    pub cases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub ty: Ty,
    pub is_static: bool,
    pub is_const: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub decl: Option<NodeId>,
    pub sig: Rc<FnTy>,
    /// Hides every inherited method of the same name, whatever its parameters.
    pub is_override: bool,
    pub is_static: bool,
}

/// Shared header of every nominal type: which declaration, under which name,
/// with which generic parameters, applied to which arguments.
///
/// For an unapplied generic declaration `args` holds the parameters themselves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Nominal {
    pub decl: Option<NodeId>,
    pub name: Option<String>,
    pub generics: Vec<GenericTy>,
    pub args: Vec<Ty>,
}

impl Nominal {
    pub fn anonymous() -> Self {
        Nominal {
            decl: None,
            name: None,
            generics: Vec::new(),
            args: Vec::new(),
        }
    }

    fn fmt_named(&self, f: &mut fmt::Formatter<'_>, fallback: &str) -> fmt::Result {
        match &self.name {
            Some(name) => {
                write!(f, "{}", name)?;
                fmt_args(f, &self.args)
            }
            None => write!(f, "{}", fallback),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassTy {
    pub nominal: Nominal,
    pub attributes: Vec<Attribute>,
    pub methods: Vec<Method>,
    /// Implemented interfaces.
    pub supers: Vec<Ty>,
    /// Implementation blocks mixed into the class.
    pub impls: Vec<Ty>,
    /// Built from syntax alone while the class itself is being inferred.
    pub stub: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceTy {
    pub nominal: Nominal,
    pub methods: Vec<Method>,
    pub supers: Vec<Ty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImplTy {
    pub nominal: Nominal,
    pub attributes: Vec<Attribute>,
    pub methods: Vec<Method>,
    pub stub: bool,
}

/// One alternative of a variant declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CtorSig {
    pub name: String,
    pub decl: NodeId,
    pub params: Vec<FnParam>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantTy {
    pub nominal: Nominal,
    pub constructors: Vec<CtorSig>,
}

impl VariantTy {
    pub fn constructor(&self, name: &str) -> Option<&CtorSig> {
        self.constructors.iter().find(|c| c.name == name)
    }
}

/// A constructor of a variant, e.g. `Result.Ok<i32, never>`.
///
/// Always carries the resolved variant; `args` are the constructor's own view
/// of the variant's generic arguments (unconstrained ones are `never`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantCtorTy {
    pub variant: Rc<VariantTy>,
    pub name: String,
    pub args: Vec<Ty>,
    pub decl: NodeId,
}

impl VariantCtorTy {
    pub fn sig(&self) -> Option<&CtorSig> {
        self.variant.constructor(&self.name)
    }
}

/// A lazy pointer to a declared type plus concrete generic arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefTy {
    pub decl: NodeId,
    pub name: String,
    pub args: Vec<Ty>,
}

/// A TypeC type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Int(IntTy),
    Float(FloatBits),
    Bool,
    Char,
    String,
    Void,
    Null,
    /// The bottom type.
    Never,
    Any,
    Array(Box<Ty>),
    Nullable(Box<Ty>),
    Tuple(Vec<Ty>),
    Struct(Rc<StructTy>),
    Union(Vec<Ty>),
    Enum(Rc<EnumTy>),
    StringEnum(Rc<Vec<String>>),
    Function(Rc<FnTy>),
    /// A coroutine instance; calling it resumes the body and yields `ret`.
    Coroutine(Rc<FnTy>),
    Class(Rc<ClassTy>),
    Interface(Rc<InterfaceTy>),
    Implementation(Rc<ImplTy>),
    Variant(Rc<VariantTy>),
    VariantConstructor(Rc<VariantCtorTy>),
    Reference(Rc<RefTy>),
    Generic(Rc<GenericTy>),
    /// A type used in value position (`Result` in `Result.Ok(1)`).
    Meta(Box<Ty>),
    Error(Rc<TypeError>),
}

impl Ty {
    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error(_))
    }

    /// The internal value standing in for a type still being inferred.
    pub fn is_recursion_placeholder(&self) -> bool {
        matches!(self, Ty::Error(e) if e.kind == TypeErrorKind::CircularInference)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Ty::Nullable(_))
    }

    /// `T` for `T?`, the type itself otherwise.
    pub fn unwrap_nullable(&self) -> &Ty {
        match self {
            Ty::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(self, Ty::Int(IntTy { signed: false, .. }))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int(_) | Ty::Float(_))
    }

    pub fn as_function(&self) -> Option<&Rc<FnTy>> {
        match self {
            Ty::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Declaration node of a nominal type or reference.
    pub fn decl(&self) -> Option<NodeId> {
        match self {
            Ty::Reference(r) => Some(r.decl),
            Ty::Class(c) => c.nominal.decl,
            Ty::Interface(i) => i.nominal.decl,
            Ty::Implementation(i) => i.nominal.decl,
            Ty::Variant(v) => v.nominal.decl,
            Ty::VariantConstructor(c) => c.variant.nominal.decl,
            Ty::Struct(s) => s.decl,
            Ty::Enum(e) => e.decl,
            Ty::Generic(g) => g.decl,
            _ => None,
        }
    }

    /// Whether any generic parameter occurs in the type.
    pub fn has_generics(&self) -> bool {
        let mut found = false;
        self.visit(&mut |t| {
            if matches!(t, Ty::Generic(_)) {
                found = true;
            }
        });
        found
    }

    /// Whether the type contains the recursion placeholder anywhere.
    pub fn has_placeholder(&self) -> bool {
        let mut found = false;
        self.visit(&mut |t| {
            if t.is_recursion_placeholder() {
                found = true;
            }
        });
        found
    }

    /// Fully concrete: no generics and no errors anywhere.
    pub fn is_concrete(&self) -> bool {
        let mut concrete = true;
        self.visit(&mut |t| {
            if matches!(t, Ty::Generic(_) | Ty::Error(_)) {
                concrete = false;
            }
        });
        concrete
    }

    /// Pre-order walk over the type and the types it is built from.
    ///
    /// Member signatures of classes, interfaces and implementations are not
    /// visited: they describe the declaration, not the instantiation.
    pub fn visit(&self, f: &mut dyn FnMut(&Ty)) {
        f(self);
        match self {
            Ty::Array(inner) | Ty::Nullable(inner) | Ty::Meta(inner) => inner.visit(f),
            Ty::Tuple(elems) | Ty::Union(elems) => elems.iter().for_each(|e| e.visit(f)),
            Ty::Struct(s) => s.fields.iter().for_each(|fd| fd.ty.visit(f)),
            Ty::Function(sig) | Ty::Coroutine(sig) => {
                sig.params.iter().for_each(|p| p.ty.visit(f));
                sig.ret.visit(f);
            }
            Ty::Class(c) => c.nominal.args.iter().for_each(|a| a.visit(f)),
            Ty::Interface(i) => i.nominal.args.iter().for_each(|a| a.visit(f)),
            Ty::Implementation(i) => i.nominal.args.iter().for_each(|a| a.visit(f)),
            Ty::Variant(v) => v.nominal.args.iter().for_each(|a| a.visit(f)),
            Ty::VariantConstructor(c) => c.args.iter().for_each(|a| a.visit(f)),
            Ty::Reference(r) => r.args.iter().for_each(|a| a.visit(f)),
            _ => {}
        }
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Ty], sep: &str) -> fmt::Result {
    for (i, t) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

fn fmt_args(f: &mut fmt::Formatter<'_>, args: &[Ty]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    fmt_list(f, args, ", ")?;
    write!(f, ">")
}

/// Postfix operators bind tighter than unions and function arrows.
fn fmt_postfix_operand(f: &mut fmt::Formatter<'_>, ty: &Ty) -> fmt::Result {
    match ty {
        Ty::Union(_) | Ty::Function(_) | Ty::StringEnum(_) => write!(f, "({})", ty),
        _ => write!(f, "{}", ty),
    }
}

impl fmt::Display for FnTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn")?;
        if !self.generics.is_empty() {
            write!(f, "<")?;
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", g.name)?;
            }
            write!(f, ">")?;
        }
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int(i) => write!(f, "{}{}", if i.signed { "i" } else { "u" }, i.bits),
            Ty::Float(FloatBits::F32) => write!(f, "f32"),
            Ty::Float(FloatBits::F64) => write!(f, "f64"),
            Ty::Bool => write!(f, "bool"),
            Ty::Char => write!(f, "char"),
            Ty::String => write!(f, "string"),
            Ty::Void => write!(f, "void"),
            Ty::Null => write!(f, "null"),
            Ty::Never => write!(f, "never"),
            Ty::Any => write!(f, "any"),
            Ty::Array(elem) => {
                fmt_postfix_operand(f, elem)?;
                write!(f, "[]")
            }
            Ty::Nullable(base) => {
                fmt_postfix_operand(f, base)?;
                write!(f, "?")
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                fmt_list(f, elems, ", ")?;
                write!(f, ")")
            }
            Ty::Struct(s) => match &s.name {
                Some(name) => write!(f, "{}", name),
                None => {
                    write!(f, "{{")?;
                    for (i, field) in s.fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: {}", field.name, field.ty)?;
                    }
                    write!(f, "}}")
                }
            },
            Ty::Union(members) => fmt_list(f, members, " | "),
            Ty::Enum(e) => match &e.name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "enum {{{}}}", e.cases.join(", ")),
            },
            Ty::StringEnum(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{:?}", v)?;
                }
                Ok(())
            }
            Ty::Function(sig) => write!(f, "{}", sig),
            Ty::Coroutine(sig) => write!(f, "coroutine<{}>", sig),
            Ty::Class(c) => c.nominal.fmt_named(f, "class"),
            Ty::Interface(i) => i.nominal.fmt_named(f, "interface"),
            Ty::Implementation(i) => i.nominal.fmt_named(f, "impl"),
            Ty::Variant(v) => v.nominal.fmt_named(f, "variant"),
            Ty::VariantConstructor(c) => {
                match &c.variant.nominal.name {
                    Some(name) => write!(f, "{}.{}", name, c.name)?,
                    None => write!(f, "variant.{}", c.name)?,
                }
                fmt_args(f, &c.args)
            }
            Ty::Reference(r) => {
                write!(f, "{}", r.name)?;
                fmt_args(f, &r.args)
            }
            Ty::Generic(g) => write!(f, "{}", g.name),
            Ty::Meta(inner) => write!(f, "type {}", inner),
            Ty::Error(e) => write!(f, "<error: {}>", e.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitives_and_composites() {
        let u32_ = Ty::Int(IntTy { signed: false, bits: 32 });
        assert_eq!(u32_.to_string(), "u32");
        assert_eq!(Ty::Array(Box::new(u32_.clone())).to_string(), "u32[]");
        assert_eq!(Ty::Nullable(Box::new(Ty::String)).to_string(), "string?");
        assert_eq!(
            Ty::Tuple(vec![u32_.clone(), Ty::Bool]).to_string(),
            "(u32, bool)"
        );
        let union = Ty::Union(vec![u32_, Ty::String]);
        assert_eq!(Ty::Array(Box::new(union)).to_string(), "(u32 | string)[]");
    }

    #[test]
    fn renders_functions_and_references() {
        let sig = FnTy {
            generics: vec![GenericTy {
                name: "T".into(),
                constraint: None,
                decl: None,
            }],
            params: vec![FnParam {
                name: "x".into(),
                ty: Ty::Generic(Rc::new(GenericTy {
                    name: "T".into(),
                    constraint: None,
                    decl: None,
                })),
                mutable: false,
            }],
            ret: Ty::Bool,
        };
        assert_eq!(Ty::Function(Rc::new(sig)).to_string(), "fn<T>(x: T) -> bool");

        let r = RefTy {
            decl: NodeId(3),
            name: "Array".into(),
            args: vec![Ty::Int(IntTy { signed: false, bits: 32 })],
        };
        assert_eq!(Ty::Reference(Rc::new(r)).to_string(), "Array<u32>");
    }

    #[test]
    fn concreteness_looks_inside_arguments() {
        let t = Ty::Generic(Rc::new(GenericTy {
            name: "T".into(),
            constraint: None,
            decl: None,
        }));
        let arr = Ty::Array(Box::new(t));
        assert!(arr.has_generics());
        assert!(!arr.is_concrete());
        assert!(Ty::Array(Box::new(Ty::Bool)).is_concrete());
    }
}
