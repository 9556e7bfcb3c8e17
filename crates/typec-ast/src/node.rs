//! Node kinds of the TypeC syntax tree.
//!
//! Nodes live in the [`Ast`](crate::Ast) arena and refer to each other by
//! [`NodeId`]. Cross-references (names, type references, variant paths) carry
//! an `Option<NodeId>` target filled by a resolver; `None` means unresolved.

use std::fmt;

use serde::{Deserialize, Serialize};
use typec_common::{DocumentId, Span};

/// Index of a node in the [`Ast`](crate::Ast) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub document: DocumentId,
    /// Filled by the link pass.
    #[serde(default)]
    pub parent: Option<NodeId>,
}

/// Built-in type names usable in annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prim {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Char,
    String,
    Void,
    Null,
    Never,
    Any,
}

impl Prim {
    pub fn from_name(name: &str) -> Option<Prim> {
        Some(match name {
            "u8" => Prim::U8,
            "u16" => Prim::U16,
            "u32" => Prim::U32,
            "u64" => Prim::U64,
            "i8" => Prim::I8,
            "i16" => Prim::I16,
            "i32" => Prim::I32,
            "i64" => Prim::I64,
            "f32" => Prim::F32,
            "f64" => Prim::F64,
            "bool" => Prim::Bool,
            "char" => Prim::Char,
            "string" => Prim::String,
            "void" => Prim::Void,
            "null" => Prim::Null,
            "never" => Prim::Never,
            "any" => Prim::Any,
            _ => return None,
        })
    }
}

/// Explicit suffix on an integer literal (`42u8`, `7i64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntSuffix {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl IntSuffix {
    pub fn signed(self) -> bool {
        matches!(self, IntSuffix::I8 | IntSuffix::I16 | IntSuffix::I32 | IntSuffix::I64)
    }

    pub fn bits(self) -> u8 {
        match self {
            IntSuffix::U8 | IntSuffix::I8 => 8,
            IntSuffix::U16 | IntSuffix::I16 => 16,
            IntSuffix::U32 | IntSuffix::I32 => 32,
            IntSuffix::U64 | IntSuffix::I64 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatSuffix {
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Coalesce,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl BinOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinOp::Assign
                | BinOp::AddAssign
                | BinOp::SubAssign
                | BinOp::MulAssign
                | BinOp::DivAssign
                | BinOp::ModAssign
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Coalesce => "??",
            BinOp::Assign => "=",
            BinOp::AddAssign => "+=",
            BinOp::SubAssign => "-=",
            BinOp::MulAssign => "*=",
            BinOp::DivAssign => "/=",
            BinOp::ModAssign => "%=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostfixOp {
    Incr,
    Decr,
}

/// `as`, `as?` (nullable on failure) and `as!` (unchecked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    Regular,
    Safe,
    Force,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Module {
        items: Vec<NodeId>,
    },

    // ── Declarations ────────────────────────────────────────────────────
    FnDecl {
        name: String,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: Option<NodeId>,
    },
    Param {
        name: String,
        ty: Option<NodeId>,
        mutable: bool,
    },
    GenericParam {
        name: String,
        constraint: Option<NodeId>,
    },
    VarDecl {
        name: String,
        ty: Option<NodeId>,
        init: Option<NodeId>,
        is_const: bool,
    },
    /// `type Name<generics> = body`; classes, interfaces, variants, structs and
    /// aliases are all declared this way.
    TypeDecl {
        name: String,
        generics: Vec<NodeId>,
        body: NodeId,
    },
    ClassType {
        supers: Vec<NodeId>,
        attributes: Vec<NodeId>,
        methods: Vec<NodeId>,
        impls: Vec<NodeId>,
    },
    Attribute {
        name: String,
        ty: NodeId,
        is_static: bool,
        is_const: bool,
    },
    Method {
        name: String,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: Option<NodeId>,
        is_override: bool,
        is_static: bool,
    },
    InterfaceType {
        supers: Vec<NodeId>,
        methods: Vec<NodeId>,
    },
    MethodSig {
        name: String,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        ret: NodeId,
    },
    ImplType {
        attributes: Vec<NodeId>,
        methods: Vec<NodeId>,
    },
    VariantType {
        constructors: Vec<NodeId>,
    },
    VariantCtor {
        name: String,
        params: Vec<NodeId>,
    },
    StructType {
        fields: Vec<NodeId>,
    },
    StructFieldType {
        name: String,
        ty: NodeId,
    },
    EnumType {
        cases: Vec<String>,
    },
    StringEnumType {
        values: Vec<String>,
    },

    // ── Type expressions ────────────────────────────────────────────────
    PrimType(Prim),
    RefType {
        name: String,
        args: Vec<NodeId>,
        target: Option<NodeId>,
    },
    ArrayType {
        elem: NodeId,
    },
    NullableType {
        base: NodeId,
    },
    TupleType {
        elems: Vec<NodeId>,
    },
    FnType {
        params: Vec<NodeId>,
        ret: NodeId,
    },
    CoroutineType {
        func: NodeId,
    },
    UnionType {
        members: Vec<NodeId>,
    },

    // ── Statements ──────────────────────────────────────────────────────
    Block {
        stmts: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    Return {
        expr: Option<NodeId>,
    },
    IfStmt {
        cond: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    /// `for i in start..end step s { body }`
    ForRange {
        binding: NodeId,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        body: NodeId,
    },
    /// Loop variable declared by a [`NodeKind::ForRange`].
    Binding {
        name: String,
    },
    Yield {
        expr: Option<NodeId>,
    },

    // ── Expressions ─────────────────────────────────────────────────────
    IntLit {
        value: u64,
        suffix: Option<IntSuffix>,
    },
    FloatLit {
        text: String,
        suffix: Option<FloatSuffix>,
    },
    StringLit {
        value: String,
    },
    CharLit {
        value: char,
    },
    BoolLit {
        value: bool,
    },
    NullLit,
    Name {
        name: String,
        target: Option<NodeId>,
    },
    This,
    Member {
        base: NodeId,
        name: String,
        /// `base?.name`
        optional: bool,
        /// Set by the link pass: this access or one earlier in its chain uses `?.`.
        #[serde(default)]
        optional_chain: bool,
    },
    Index {
        base: NodeId,
        index: NodeId,
        #[serde(default)]
        optional_chain: bool,
    },
    Call {
        callee: NodeId,
        generic_args: Vec<NodeId>,
        args: Vec<NodeId>,
        /// Set by the link pass: the callee contains `?.` earlier in its chain.
        #[serde(default)]
        optional_chain: bool,
    },
    New {
        ty: NodeId,
        args: Vec<NodeId>,
    },
    Binary {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnOp,
        operand: NodeId,
    },
    Postfix {
        op: PostfixOp,
        operand: NodeId,
    },
    Cast {
        expr: NodeId,
        ty: NodeId,
        kind: CastKind,
    },
    InstanceCheck {
        expr: NodeId,
        ty: NodeId,
    },
    NonNull {
        expr: NodeId,
    },
    IfExpr {
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
    Match {
        scrutinee: NodeId,
        cases: Vec<NodeId>,
    },
    MatchCase {
        pattern: NodeId,
        guard: Option<NodeId>,
        body: NodeId,
    },
    Lambda {
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: NodeId,
    },
    ArrayLit {
        elems: Vec<NodeId>,
    },
    TupleLit {
        elems: Vec<NodeId>,
    },
    /// Anonymous struct literal `{x: 1, y: 2}`.
    StructLit {
        fields: Vec<NodeId>,
    },
    FieldInit {
        name: String,
        value: NodeId,
    },
    /// `{...base, x: 1}`
    ObjectUpdate {
        base: NodeId,
        fields: Vec<NodeId>,
    },
    CoroutineNew {
        func: NodeId,
    },

    // ── Patterns ────────────────────────────────────────────────────────
    PatBinding {
        name: String,
    },
    PatWildcard,
    PatLiteral {
        lit: NodeId,
    },
    PatArray {
        elems: Vec<NodeId>,
        rest: Option<NodeId>,
    },
    PatStruct {
        fields: Vec<NodeId>,
        rest: Option<NodeId>,
    },
    PatField {
        name: String,
        pattern: NodeId,
    },
    /// `...name` at the end of an array or struct pattern.
    PatRest {
        name: String,
    },
    PatTuple {
        elems: Vec<NodeId>,
    },
    /// `Result.Ok(v)`; `target` is the constructor declaration.
    PatVariant {
        path: String,
        args: Vec<NodeId>,
        target: Option<NodeId>,
    },
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let opt = |out: &mut Vec<NodeId>, n: &Option<NodeId>| out.extend(n.iter().copied());
        match self {
            NodeKind::Module { items } => out.extend(items),
            NodeKind::FnDecl { generics, params, ret, body, .. }
            | NodeKind::Method { generics, params, ret, body, .. } => {
                out.extend(generics);
                out.extend(params);
                opt(&mut out, ret);
                opt(&mut out, body);
            }
            NodeKind::Param { ty, .. } => opt(&mut out, ty),
            NodeKind::GenericParam { constraint, .. } => opt(&mut out, constraint),
            NodeKind::VarDecl { ty, init, .. } => {
                opt(&mut out, ty);
                opt(&mut out, init);
            }
            NodeKind::TypeDecl { generics, body, .. } => {
                out.extend(generics);
                out.push(*body);
            }
            NodeKind::ClassType { supers, attributes, methods, impls } => {
                out.extend(supers);
                out.extend(attributes);
                out.extend(methods);
                out.extend(impls);
            }
            NodeKind::Attribute { ty, .. } => out.push(*ty),
            NodeKind::InterfaceType { supers, methods } => {
                out.extend(supers);
                out.extend(methods);
            }
            NodeKind::MethodSig { generics, params, ret, .. } => {
                out.extend(generics);
                out.extend(params);
                out.push(*ret);
            }
            NodeKind::ImplType { attributes, methods } => {
                out.extend(attributes);
                out.extend(methods);
            }
            NodeKind::VariantType { constructors } => out.extend(constructors),
            NodeKind::VariantCtor { params, .. } => out.extend(params),
            NodeKind::StructType { fields } => out.extend(fields),
            NodeKind::StructFieldType { ty, .. } => out.push(*ty),
            NodeKind::RefType { args, .. } => out.extend(args),
            NodeKind::ArrayType { elem } => out.push(*elem),
            NodeKind::NullableType { base } => out.push(*base),
            NodeKind::TupleType { elems }
            | NodeKind::ArrayLit { elems }
            | NodeKind::TupleLit { elems }
            | NodeKind::PatTuple { elems } => out.extend(elems),
            NodeKind::FnType { params, ret } => {
                out.extend(params);
                out.push(*ret);
            }
            NodeKind::CoroutineType { func } | NodeKind::CoroutineNew { func } => out.push(*func),
            NodeKind::UnionType { members } => out.extend(members),
            NodeKind::Block { stmts } => out.extend(stmts),
            NodeKind::ExprStmt { expr }
            | NodeKind::NonNull { expr } => out.push(*expr),
            NodeKind::Return { expr } | NodeKind::Yield { expr } => opt(&mut out, expr),
            NodeKind::IfStmt { cond, then, otherwise } => {
                out.push(*cond);
                out.push(*then);
                opt(&mut out, otherwise);
            }
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::ForRange { binding, start, end, step, body } => {
                out.push(*binding);
                out.push(*start);
                out.push(*end);
                opt(&mut out, step);
                out.push(*body);
            }
            NodeKind::Member { base, .. } => out.push(*base),
            NodeKind::Index { base, index, .. } => {
                out.push(*base);
                out.push(*index);
            }
            NodeKind::Call { callee, generic_args, args, .. } => {
                out.push(*callee);
                out.extend(generic_args);
                out.extend(args);
            }
            NodeKind::New { ty, args } => {
                out.push(*ty);
                out.extend(args);
            }
            NodeKind::Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::Unary { operand, .. } | NodeKind::Postfix { operand, .. } => {
                out.push(*operand)
            }
            NodeKind::Cast { expr, ty, .. } | NodeKind::InstanceCheck { expr, ty } => {
                out.push(*expr);
                out.push(*ty);
            }
            NodeKind::IfExpr { cond, then, otherwise } => {
                out.push(*cond);
                out.push(*then);
                out.push(*otherwise);
            }
            NodeKind::Match { scrutinee, cases } => {
                out.push(*scrutinee);
                out.extend(cases);
            }
            NodeKind::MatchCase { pattern, guard, body } => {
                out.push(*pattern);
                opt(&mut out, guard);
                out.push(*body);
            }
            NodeKind::Lambda { params, ret, body } => {
                out.extend(params);
                opt(&mut out, ret);
                out.push(*body);
            }
            NodeKind::StructLit { fields } => out.extend(fields),
            NodeKind::FieldInit { value, .. } => out.push(*value),
            NodeKind::ObjectUpdate { base, fields } => {
                out.push(*base);
                out.extend(fields);
            }
            NodeKind::PatLiteral { lit } => out.push(*lit),
            NodeKind::PatArray { elems, rest } => {
                out.extend(elems);
                opt(&mut out, rest);
            }
            NodeKind::PatStruct { fields, rest } => {
                out.extend(fields);
                opt(&mut out, rest);
            }
            NodeKind::PatField { pattern, .. } => out.push(*pattern),
            NodeKind::PatVariant { args, .. } => out.extend(args),
            NodeKind::EnumType { .. }
            | NodeKind::StringEnumType { .. }
            | NodeKind::PrimType(_)
            | NodeKind::Binding { .. }
            | NodeKind::IntLit { .. }
            | NodeKind::FloatLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::CharLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::Name { .. }
            | NodeKind::This
            | NodeKind::PatBinding { .. }
            | NodeKind::PatWildcard
            | NodeKind::PatRest { .. } => {}
        }
        out
    }

    /// Short kind label used by tooling output.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "module",
            NodeKind::FnDecl { .. } => "fn",
            NodeKind::Param { .. } => "param",
            NodeKind::GenericParam { .. } => "generic",
            NodeKind::VarDecl { .. } => "let",
            NodeKind::TypeDecl { .. } => "type",
            NodeKind::ClassType { .. } => "class",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Method { .. } => "method",
            NodeKind::InterfaceType { .. } => "interface",
            NodeKind::MethodSig { .. } => "method-sig",
            NodeKind::ImplType { .. } => "impl",
            NodeKind::VariantType { .. } => "variant",
            NodeKind::VariantCtor { .. } => "variant-ctor",
            NodeKind::StructType { .. } => "struct",
            NodeKind::StructFieldType { .. } => "struct-field",
            NodeKind::EnumType { .. } => "enum",
            NodeKind::StringEnumType { .. } => "string-enum",
            NodeKind::PrimType(_) => "prim-type",
            NodeKind::RefType { .. } => "type-ref",
            NodeKind::ArrayType { .. } => "array-type",
            NodeKind::NullableType { .. } => "nullable-type",
            NodeKind::TupleType { .. } => "tuple-type",
            NodeKind::FnType { .. } => "fn-type",
            NodeKind::CoroutineType { .. } => "coroutine-type",
            NodeKind::UnionType { .. } => "union-type",
            NodeKind::Block { .. } => "block",
            NodeKind::ExprStmt { .. } => "expr-stmt",
            NodeKind::Return { .. } => "return",
            NodeKind::IfStmt { .. } => "if-stmt",
            NodeKind::While { .. } => "while",
            NodeKind::ForRange { .. } => "for",
            NodeKind::Binding { .. } => "binding",
            NodeKind::Yield { .. } => "yield",
            NodeKind::IntLit { .. } => "int",
            NodeKind::FloatLit { .. } => "float",
            NodeKind::StringLit { .. } => "string",
            NodeKind::CharLit { .. } => "char",
            NodeKind::BoolLit { .. } => "bool",
            NodeKind::NullLit => "null",
            NodeKind::Name { .. } => "name",
            NodeKind::This => "this",
            NodeKind::Member { .. } => "member",
            NodeKind::Index { .. } => "index",
            NodeKind::Call { .. } => "call",
            NodeKind::New { .. } => "new",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Postfix { .. } => "postfix",
            NodeKind::Cast { .. } => "cast",
            NodeKind::InstanceCheck { .. } => "is",
            NodeKind::NonNull { .. } => "non-null",
            NodeKind::IfExpr { .. } => "if-expr",
            NodeKind::Match { .. } => "match",
            NodeKind::MatchCase { .. } => "case",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::ArrayLit { .. } => "array",
            NodeKind::TupleLit { .. } => "tuple",
            NodeKind::StructLit { .. } => "struct-lit",
            NodeKind::FieldInit { .. } => "field-init",
            NodeKind::ObjectUpdate { .. } => "update",
            NodeKind::CoroutineNew { .. } => "coroutine",
            NodeKind::PatBinding { .. } => "pat-binding",
            NodeKind::PatWildcard => "pat-wildcard",
            NodeKind::PatLiteral { .. } => "pat-literal",
            NodeKind::PatArray { .. } => "pat-array",
            NodeKind::PatStruct { .. } => "pat-struct",
            NodeKind::PatField { .. } => "pat-field",
            NodeKind::PatRest { .. } => "pat-rest",
            NodeKind::PatTuple { .. } => "pat-tuple",
            NodeKind::PatVariant { .. } => "pat-variant",
        }
    }

    pub fn is_type_expr(&self) -> bool {
        matches!(
            self,
            NodeKind::PrimType(_)
                | NodeKind::RefType { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::NullableType { .. }
                | NodeKind::TupleType { .. }
                | NodeKind::FnType { .. }
                | NodeKind::CoroutineType { .. }
                | NodeKind::UnionType { .. }
                | NodeKind::ClassType { .. }
                | NodeKind::InterfaceType { .. }
                | NodeKind::ImplType { .. }
                | NodeKind::VariantType { .. }
                | NodeKind::StructType { .. }
                | NodeKind::EnumType { .. }
                | NodeKind::StringEnumType { .. }
        )
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            NodeKind::PatBinding { .. }
                | NodeKind::PatWildcard
                | NodeKind::PatLiteral { .. }
                | NodeKind::PatArray { .. }
                | NodeKind::PatStruct { .. }
                | NodeKind::PatField { .. }
                | NodeKind::PatRest { .. }
                | NodeKind::PatTuple { .. }
                | NodeKind::PatVariant { .. }
        )
    }

    /// Name introduced by a declaration node, if any.
    pub fn decl_name(&self) -> Option<&str> {
        match self {
            NodeKind::FnDecl { name, .. }
            | NodeKind::Param { name, .. }
            | NodeKind::GenericParam { name, .. }
            | NodeKind::VarDecl { name, .. }
            | NodeKind::TypeDecl { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::Method { name, .. }
            | NodeKind::MethodSig { name, .. }
            | NodeKind::VariantCtor { name, .. }
            | NodeKind::StructFieldType { name, .. }
            | NodeKind::Binding { name }
            | NodeKind::PatBinding { name }
            | NodeKind::PatRest { name } => Some(name),
            _ => None,
        }
    }
}
