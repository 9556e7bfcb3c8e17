//! Expression typing: literals, names, operators, conditionals, lambdas and
//! composite literals.

use std::rc::Rc;

use typec_ast::{BinOp, CastKind, NodeId, NodeKind, UnOp};

use crate::error::TypeErrorKind;
use crate::infer::decl::is_nominal_body;
use crate::infer::Infer;
use crate::ty::{FnParam, StructField, StructTy, Ty};

/// Method name of a user-defined binary operator.
fn operator_method(op: BinOp) -> Option<&'static str> {
    Some(match op {
        BinOp::Add => "__add__",
        BinOp::Sub => "__sub__",
        BinOp::Mul => "__mul__",
        BinOp::Div => "__div__",
        BinOp::Mod => "__mod__",
        BinOp::BitAnd => "__band__",
        BinOp::BitOr => "__bor__",
        BinOp::BitXor => "__bxor__",
        BinOp::Shl => "__lshift__",
        BinOp::Shr => "__rshift__",
        _ => return None,
    })
}

impl<'a> Infer<'a> {
    pub(crate) fn compute_expr(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::IntLit { suffix, .. } => match suffix {
                Some(s) => Ty::from_int_suffix(*s),
                None => match self.expected_core(node) {
                    Some(ty @ Ty::Int(_)) => ty,
                    _ => Ty::i32(),
                },
            },
            NodeKind::FloatLit { suffix, .. } => match suffix {
                Some(s) => Ty::from_float_suffix(*s),
                None => match self.expected_core(node) {
                    Some(ty @ Ty::Float(_)) => ty,
                    _ => Ty::f64(),
                },
            },
            NodeKind::StringLit { .. } => Ty::String,
            NodeKind::CharLit { .. } => Ty::Char,
            NodeKind::BoolLit { .. } => Ty::Bool,
            NodeKind::NullLit => Ty::Null,
            NodeKind::Name { name, target } => self.name_type(node, name, *target),
            NodeKind::This => self.this_type(node),
            NodeKind::Member { .. } => self.member_access_type(node),
            NodeKind::Index { .. } => self.index_type(node),
            NodeKind::Call { .. } => self.call_type(node),
            NodeKind::New { .. } => self.new_type(node),
            NodeKind::Binary { op, lhs, rhs } => self.binary_type(*op, *lhs, *rhs),
            NodeKind::Unary { op, operand } => self.unary_type(node, *op, *operand),
            NodeKind::Postfix { operand, .. } => self.get_type(*operand),
            NodeKind::Cast { expr, ty, kind } => {
                let source = self.get_type(*expr);
                let target = self.annotation(*ty);
                let chained = source.is_nullable() || ast.in_optional_chain(*expr);
                match kind {
                    CastKind::Safe => Ty::nullable(target),
                    CastKind::Regular | CastKind::Force if chained => Ty::nullable(target),
                    CastKind::Regular | CastKind::Force => target,
                }
            }
            NodeKind::InstanceCheck { .. } => Ty::Bool,
            NodeKind::NonNull { expr } => self.get_type(*expr).unwrap_nullable().clone(),
            NodeKind::IfExpr { then, otherwise, .. } => {
                let branches = vec![self.get_type(*then), self.get_type(*otherwise)];
                self.join(branches)
            }
            NodeKind::Match { cases, .. } => {
                let arms = cases.iter().map(|c| self.get_type(*c)).collect();
                self.join(arms)
            }
            NodeKind::Lambda { params, ret, body } => {
                let params: Vec<FnParam> = params
                    .iter()
                    .map(|p| {
                        let name = ast.kind(*p).decl_name().unwrap_or_default().to_string();
                        FnParam::new(name, self.get_type(*p))
                    })
                    .collect();
                let ret = match ret {
                    Some(r) => self.annotation(*r),
                    None => self.body_type(*body),
                };
                Ty::function(vec![], params, ret)
            }
            NodeKind::ArrayLit { elems } => self.array_literal_type(node, elems),
            NodeKind::TupleLit { elems } => {
                Ty::tuple(elems.iter().map(|e| self.get_type(*e)).collect())
            }
            NodeKind::StructLit { fields } => self.struct_literal_type(fields),
            NodeKind::ObjectUpdate { base, fields } => self.object_update_type(*base, fields),
            NodeKind::CoroutineNew { func } => {
                let func_ty = self.get_type(*func);
                let func_ty = self.resolve(&func_ty);
                Ty::coroutine(func_ty, Some(node))
            }
            other => Ty::unsupported(
                format!("{} has no type of its own", other.label()),
                Some(node),
            ),
        }
    }

    /// Expected type with references resolved and nullability removed; what
    /// literal defaulting looks at.
    fn expected_core(&mut self, node: NodeId) -> Option<Ty> {
        let expected = self.get_expected_type(node)?;
        let resolved = self.resolve(&expected);
        Some(resolved.unwrap_nullable().clone())
    }

    fn name_type(&mut self, node: NodeId, name: &str, target: Option<NodeId>) -> Ty {
        let Some(target) = target else {
            return Ty::unresolved(name, Some(node));
        };
        let ast = self.ast;
        match ast.kind(target) {
            NodeKind::TypeDecl {
                name: decl_name,
                body,
                ..
            } => {
                // A type in value position: `Result` in `Result.Ok(1)`.
                if ast.kind(*body).is_type_expr() && !is_nominal_body(ast.kind(*body)) {
                    Ty::meta(self.get_type(target))
                } else {
                    Ty::meta(Ty::reference(target, decl_name.clone(), vec![]))
                }
            }
            NodeKind::GenericParam { .. } => Ty::meta(self.get_type(target)),
            _ => self.get_type(target),
        }
    }

    fn index_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::Index {
            base,
            index,
            optional_chain,
        } = ast.kind(node)
        else {
            return Ty::unsupported("not an index expression", Some(node));
        };
        let base_ty = self.get_type(*base);
        if base_ty.is_error() {
            return base_ty;
        }
        let was_nullable = base_ty.is_nullable();
        let container = self.resolve(base_ty.unwrap_nullable());
        let elem = match &container {
            Ty::Array(elem) => (**elem).clone(),
            Ty::String => Ty::Char,
            Ty::Any => Ty::Any,
            Ty::Tuple(elems) => match ast.kind(*index) {
                NodeKind::IntLit { value, .. } => match elems.get(*value as usize) {
                    Some(e) => e.clone(),
                    None => Ty::error(
                        TypeErrorKind::UnknownMember {
                            ty: container.clone(),
                            name: value.to_string(),
                        },
                        Some(node),
                    ),
                },
                _ => Ty::unsupported("tuples are indexed with integer literals", Some(*index)),
            },
            Ty::Class(_) | Ty::Interface(_) => {
                let index_ty = self.get_type(*index);
                match self.operator_overload(&container, "__index__", &[index_ty]) {
                    Some(ret) => ret,
                    None => Ty::unsupported(format!("type `{}` cannot be indexed", container), Some(node)),
                }
            }
            other => Ty::unsupported(format!("type `{}` cannot be indexed", other), Some(node)),
        };
        if was_nullable || *optional_chain {
            Ty::nullable(elem)
        } else {
            elem
        }
    }

    fn binary_type(&mut self, op: BinOp, lhs: NodeId, rhs: NodeId) -> Ty {
        if op.is_assignment() || op == BinOp::Coalesce {
            return self.get_type(rhs);
        }
        if op.is_comparison() || op.is_logical() {
            return Ty::Bool;
        }
        let lhs_ty = self.get_type(lhs);
        let owner = self.resolve(&lhs_ty);
        if matches!(owner, Ty::Class(_) | Ty::Interface(_)) {
            if let Some(method) = operator_method(op) {
                let rhs_ty = self.get_type(rhs);
                if let Some(ret) = self.operator_overload(&owner, method, &[rhs_ty]) {
                    return ret;
                }
            }
        }
        lhs_ty
    }

    fn unary_type(&mut self, node: NodeId, op: UnOp, operand: NodeId) -> Ty {
        let operand_ty = self.get_type(operand);
        if op == UnOp::Not {
            return Ty::Bool;
        }
        let was_nullable = operand_ty.is_nullable();
        let core = operand_ty.unwrap_nullable().clone();
        match (op, &core) {
            (UnOp::Neg, Ty::Int(int)) if !int.signed => Ty::error(
                TypeErrorKind::Mismatch {
                    expected: Ty::int(true, int.bits),
                    found: core.clone(),
                },
                Some(node),
            ),
            (UnOp::Neg, _) => {
                let owner = self.resolve(&core);
                if matches!(owner, Ty::Class(_) | Ty::Interface(_)) {
                    if let Some(ret) = self.operator_overload(&owner, "__neg__", &[]) {
                        return if was_nullable { Ty::nullable(ret) } else { ret };
                    }
                }
                operand_ty
            }
            _ => operand_ty,
        }
    }

    fn array_literal_type(&mut self, node: NodeId, elems: &[NodeId]) -> Ty {
        if elems.is_empty() {
            return match self.get_expected_type(node).map(|e| self.resolve(&e)) {
                Some(ty @ Ty::Array(_)) => ty,
                Some(Ty::Nullable(inner)) if matches!(*inner, Ty::Array(_)) => *inner,
                _ => Ty::array(Ty::Never),
            };
        }
        let types = elems.iter().map(|e| self.get_type(*e)).collect();
        Ty::array(self.join(types))
    }

    /// Anonymous struct from the first initializer of each field.
    fn struct_literal_type(&mut self, fields: &[NodeId]) -> Ty {
        let ast = self.ast;
        let mut out: Vec<StructField> = Vec::with_capacity(fields.len());
        for &f in fields {
            let NodeKind::FieldInit { name, .. } = ast.kind(f) else {
                continue;
            };
            if out.iter().any(|existing| existing.name == *name) {
                continue;
            }
            out.push(StructField {
                name: name.clone(),
                ty: self.get_type(f),
            });
        }
        Ty::Struct(Rc::new(StructTy {
            decl: None,
            name: None,
            fields: out,
        }))
    }

    /// `{...base, x: v}` has the base's type; on an anonymous struct the
    /// updated fields replace or extend the base's fields.
    fn object_update_type(&mut self, base: NodeId, fields: &[NodeId]) -> Ty {
        let ast = self.ast;
        let base_ty = self.get_type(base);
        let Ty::Struct(s) = &base_ty else {
            return base_ty;
        };
        if s.name.is_some() {
            return base_ty;
        }
        let mut out = s.fields.clone();
        for &f in fields {
            let NodeKind::FieldInit { name, .. } = ast.kind(f) else {
                continue;
            };
            let ty = self.get_type(f);
            match out.iter_mut().find(|existing| existing.name == *name) {
                Some(existing) => existing.ty = ty,
                None => out.push(StructField {
                    name: name.clone(),
                    ty,
                }),
            }
        }
        Ty::Struct(Rc::new(StructTy {
            decl: None,
            name: None,
            fields: out,
        }))
    }

    /// A field initializer has its value's type, unless an earlier
    /// initializer of the same literal already set the field.
    pub(crate) fn field_init_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::FieldInit { name, value } = ast.kind(node) else {
            return Ty::unsupported("not a field initializer", Some(node));
        };
        let siblings = match ast.parent(node).map(|p| ast.kind(p)) {
            Some(NodeKind::StructLit { fields }) | Some(NodeKind::ObjectUpdate { fields, .. }) => {
                fields.as_slice()
            }
            _ => &[],
        };
        let earlier = siblings.iter().take_while(|s| **s != node).any(|s| {
            matches!(ast.kind(*s), NodeKind::FieldInit { name: other, .. } if other == name)
        });
        if earlier {
            return Ty::error(
                TypeErrorKind::DuplicateField { name: name.clone() },
                Some(node),
            );
        }
        self.get_type(*value)
    }
}
