//! Type errors as values.
//!
//! Inference never fails: a problem becomes a [`Ty::Error`](crate::Ty::Error)
//! carrying a [`TypeError`], which then flows through composite types like any
//! other type. Each error remembers the node it originates from so tooling
//! can point at it.

use std::fmt;

use typec_ast::NodeId;

use crate::ty::Ty;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeErrorKind {
    /// A name, type reference or pattern path without a declaration.
    UnresolvedReference { name: String },
    /// Stands in for a type still being inferred. Internal: filtered out of
    /// joins and converted before it leaves the checker.
    CircularInference,
    Mismatch { expected: Ty, found: Ty },
    /// A generic binding that does not satisfy the parameter's constraint.
    ConstraintViolation {
        generic: String,
        constraint: Ty,
        found: Ty,
    },
    ArityMismatch { expected: usize, found: usize },
    /// Pattern shape incompatible with the scrutinee.
    StructuralMismatch { pattern: &'static str, scrutinee: Ty },
    UnknownMember { ty: Ty, name: String },
    /// A field initialized twice in one struct literal.
    DuplicateField { name: String },
    NotCallable { ty: Ty },
    UnsupportedConstruct { what: String },
}

impl fmt::Display for TypeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeErrorKind::UnresolvedReference { name } => {
                write!(f, "cannot resolve `{}`", name)
            }
            TypeErrorKind::CircularInference => write!(f, "type is still being inferred"),
            TypeErrorKind::Mismatch { expected, found } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)
            }
            TypeErrorKind::ConstraintViolation {
                generic,
                constraint,
                found,
            } => write!(
                f,
                "`{}` does not satisfy the constraint `{}: {}`",
                found, generic, constraint
            ),
            TypeErrorKind::ArityMismatch { expected, found } => write!(
                f,
                "arity mismatch: expected {} arguments, found {}",
                expected, found
            ),
            TypeErrorKind::StructuralMismatch { pattern, scrutinee } => {
                write!(f, "{} pattern cannot match a value of type `{}`", pattern, scrutinee)
            }
            TypeErrorKind::UnknownMember { ty, name } => {
                write!(f, "type `{}` has no member `{}`", ty, name)
            }
            TypeErrorKind::DuplicateField { name } => {
                write!(f, "field `{}` is initialized more than once", name)
            }
            TypeErrorKind::NotCallable { ty } => write!(f, "`{}` is not callable", ty),
            TypeErrorKind::UnsupportedConstruct { what } => write!(f, "{}", what),
        }
    }
}

/// An error kind plus the node it was raised for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub node: Option<NodeId>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, node: Option<NodeId>) -> Self {
        TypeError { kind, node }
    }

    /// Stable diagnostic code, one per kind.
    pub fn code(&self) -> &'static str {
        match self.kind {
            TypeErrorKind::UnresolvedReference { .. } => "E0001",
            TypeErrorKind::Mismatch { .. } => "E0002",
            TypeErrorKind::ConstraintViolation { .. } => "E0003",
            TypeErrorKind::ArityMismatch { .. } => "E0004",
            TypeErrorKind::StructuralMismatch { .. } => "E0005",
            TypeErrorKind::UnknownMember { .. } => "E0006",
            TypeErrorKind::DuplicateField { .. } => "E0007",
            TypeErrorKind::NotCallable { .. } => "E0008",
            TypeErrorKind::UnsupportedConstruct { .. } => "E0009",
            TypeErrorKind::CircularInference => "E0010",
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_quote_types() {
        let err = TypeError::new(
            TypeErrorKind::Mismatch {
                expected: Ty::Bool,
                found: Ty::String,
            },
            Some(NodeId(4)),
        );
        assert_eq!(err.to_string(), "type mismatch: expected `bool`, found `string`");
        assert_eq!(err.code(), "E0002");
    }

    #[test]
    fn codes_are_distinct() {
        let kinds = [
            TypeErrorKind::UnresolvedReference { name: "x".into() },
            TypeErrorKind::CircularInference,
            TypeErrorKind::ArityMismatch { expected: 1, found: 2 },
            TypeErrorKind::DuplicateField { name: "x".into() },
            TypeErrorKind::NotCallable { ty: Ty::Bool },
            TypeErrorKind::UnsupportedConstruct { what: "x".into() },
        ];
        let mut codes: Vec<_> = kinds
            .into_iter()
            .map(|k| TypeError::new(k, None).code())
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 6);
    }
}
