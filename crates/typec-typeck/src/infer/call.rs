//! Calls, `new`, overload selection and generic instantiation.
//!
//! A call is typed in two steps. [`Infer::call_signature`] works out what is
//! being called: the callee's parameter types, return type and the generic
//! parameters still to be bound. [`Infer::instantiate`] then binds those
//! generics from the arguments.
//!
//! Arguments whose own type depends on what they are expected to be
//! (lambdas with unannotated parameters, `[]`, struct literals) are
//! *contextual*. They are unified after the concrete arguments, in rounds,
//! each one as soon as the parameter it is passed for no longer mentions an
//! unbound generic. The expected type of an argument is computed by running
//! the same procedure up to that argument ([`Stop`]), so an argument never
//! looks at itself.

use std::rc::Rc;

use typec_ast::{Ast, NodeId, NodeKind};

use crate::error::{TypeError, TypeErrorKind};
use crate::infer::member::{Member, MemberKind};
use crate::infer::Infer;
use crate::subst::{apply, subst_from, Subst};
use crate::ty::{FnTy, GenericTy, Ty, VariantCtorTy};
use crate::unify::Bag;

/// Whether the type of `arg` depends on its expected type.
pub(crate) fn is_contextual(ast: &Ast, arg: NodeId) -> bool {
    match ast.kind(arg) {
        NodeKind::Lambda { params, .. } => params
            .iter()
            .any(|p| matches!(ast.kind(*p), NodeKind::Param { ty: None, .. })),
        NodeKind::ArrayLit { elems } => elems.is_empty(),
        NodeKind::StructLit { .. } => true,
        _ => false,
    }
}

/// How far [`Infer::instantiate`] runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Stop {
    /// All arguments, then constraint checks.
    Full,
    /// Only the concrete arguments before this index.
    Concrete(usize),
    /// Until the contextual argument at this index is ready.
    Contextual(usize),
}

/// What a successful call instantiates.
#[derive(Clone, Debug)]
pub(crate) enum Instantiation {
    Untracked,
    Function {
        decl: NodeId,
        name: String,
    },
    Method {
        decl: NodeId,
        owner: String,
        class_args: Vec<Ty>,
        name: String,
    },
}

/// The callee of a call, with the generics the call has to bind.
#[derive(Clone, Debug)]
pub(crate) struct CallSig {
    pub generics: Vec<GenericTy>,
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// Explicit generic arguments, `f<u32>(..)`.
    pub explicit: Vec<Ty>,
    /// Bindings known before looking at any argument.
    pub seed: Vec<(Ty, Ty)>,
    pub instantiation: Instantiation,
    /// The call goes through `?.` on a nullable value.
    pub wrap: bool,
}

impl CallSig {
    fn plain(sig: &FnTy, explicit: Vec<Ty>, instantiation: Instantiation, wrap: bool) -> Self {
        CallSig {
            generics: sig.generics.clone(),
            params: sig.param_types().cloned().collect(),
            ret: sig.ret.clone(),
            explicit,
            seed: Vec::new(),
            instantiation,
            wrap,
        }
    }
}

impl<'a> Infer<'a> {
    pub(crate) fn call_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::Call { args, .. } = ast.kind(node) else {
            return Ty::unsupported("not a call", Some(node));
        };
        let sig = match self.call_signature(node) {
            Ok(sig) => sig,
            Err(ty) => return ty,
        };
        if sig.params.len() != args.len() {
            self.side_error(
                node,
                TypeErrorKind::ArityMismatch {
                    expected: sig.params.len(),
                    found: args.len(),
                },
            );
        }
        let subst = self.instantiate(node, &sig, args, Stop::Full);
        self.record_instantiation(&sig, &subst);
        let ret = apply(&sig.ret, &subst);
        if sig.wrap {
            Ty::nullable(ret)
        } else {
            ret
        }
    }

    /// What `call` calls. `Err` carries the call's type when there is no
    /// signature to work with (an error, or `any`).
    pub(crate) fn call_signature(&mut self, call: NodeId) -> Result<CallSig, Ty> {
        let ast = self.ast;
        let NodeKind::Call {
            callee,
            generic_args,
            args,
            optional_chain,
        } = ast.kind(call)
        else {
            return Err(Ty::unsupported("not a call", Some(call)));
        };
        let explicit: Vec<Ty> = generic_args.iter().map(|g| self.annotation(*g)).collect();
        let mut instantiation = Instantiation::Untracked;
        let mut wrap = false;
        let callee_ty = match ast.kind(*callee) {
            NodeKind::Member {
                base,
                name,
                optional,
                ..
            } => {
                let base_ty = self.get_type(*base);
                if base_ty.is_error() || base_ty == Ty::Any {
                    return Err(base_ty);
                }
                wrap = *optional || base_ty.is_nullable();
                let owner = self.resolve(base_ty.unwrap_nullable());
                let candidates: Vec<Member> = self
                    .members_of(&owner)
                    .into_iter()
                    .filter(|m| m.name == *name)
                    .collect();
                let Some(chosen) = self.select_member(candidates, args) else {
                    return Err(Ty::error(
                        TypeErrorKind::UnknownMember {
                            ty: owner,
                            name: name.clone(),
                        },
                        Some(*callee),
                    ));
                };
                if let (MemberKind::Method, Some(decl), Ty::Class(c)) =
                    (chosen.kind, chosen.decl, &owner)
                {
                    if let Some(class_name) = &c.nominal.name {
                        instantiation = Instantiation::Method {
                            decl,
                            owner: class_name.clone(),
                            class_args: c.nominal.args.clone(),
                            name: name.clone(),
                        };
                    }
                }
                chosen.ty
            }
            NodeKind::Name {
                name,
                target: Some(target),
            } if matches!(ast.kind(*target), NodeKind::FnDecl { .. }) => {
                instantiation = Instantiation::Function {
                    decl: *target,
                    name: name.clone(),
                };
                self.get_type(*callee)
            }
            _ => {
                let ty = self.get_type(*callee);
                match ty {
                    Ty::Nullable(inner) if *optional_chain => {
                        wrap = true;
                        *inner
                    }
                    other => other,
                }
            }
        };
        self.signature_of(call, callee_ty, explicit, instantiation, wrap)
    }

    fn signature_of(
        &mut self,
        call: NodeId,
        callee_ty: Ty,
        explicit: Vec<Ty>,
        instantiation: Instantiation,
        wrap: bool,
    ) -> Result<CallSig, Ty> {
        let resolved = self.resolve(&callee_ty);
        match &resolved {
            Ty::Error(_) | Ty::Any => Err(resolved.clone()),
            Ty::Function(sig) => Ok(CallSig::plain(sig, explicit, instantiation, wrap)),
            Ty::Coroutine(sig) => Ok(CallSig {
                generics: Vec::new(),
                params: sig.param_types().cloned().collect(),
                ret: sig.ret.clone(),
                explicit: Vec::new(),
                seed: Vec::new(),
                instantiation: Instantiation::Untracked,
                wrap,
            }),
            Ty::VariantConstructor(c) => Ok(self.constructor_signature(call, c, explicit, wrap)),
            Ty::Class(_) | Ty::Interface(_) => {
                let ast = self.ast;
                let args = match ast.kind(call) {
                    NodeKind::Call { args, .. } => args.as_slice(),
                    _ => &[],
                };
                let candidates: Vec<Member> = self
                    .members_of(&resolved)
                    .into_iter()
                    .filter(|m| m.name == "__call__")
                    .collect();
                match self.select_member(candidates, args).map(|m| m.ty) {
                    Some(Ty::Function(sig)) => {
                        Ok(CallSig::plain(&sig, explicit, Instantiation::Untracked, wrap))
                    }
                    _ => Err(Ty::error(
                        TypeErrorKind::NotCallable { ty: resolved.clone() },
                        Some(call),
                    )),
                }
            }
            _ => Err(Ty::error(TypeErrorKind::NotCallable { ty: callee_ty }, Some(call))),
        }
    }

    /// Calling a variant constructor binds the variant's generic arguments
    /// the constructor leaves open. An expected instance of the same variant
    /// seeds them.
    fn constructor_signature(
        &mut self,
        call: NodeId,
        ctor: &Rc<VariantCtorTy>,
        explicit: Vec<Ty>,
        wrap: bool,
    ) -> CallSig {
        let variant = &ctor.variant;
        let generics: Vec<GenericTy> = variant
            .nominal
            .generics
            .iter()
            .zip(&ctor.args)
            .filter(|(g, a)| matches!(a, Ty::Generic(ag) if ag.name == g.name))
            .map(|(g, _)| g.clone())
            .collect();
        let base = subst_from(&variant.nominal.generics, &ctor.args);
        let params = ctor
            .sig()
            .map(|s| s.params.iter().map(|p| apply(&p.ty, &base)).collect())
            .unwrap_or_default();

        let mut seed = Vec::new();
        if !generics.is_empty() {
            if let Some(expected) = self.get_expected_type(call) {
                let expected = self.resolve(expected.unwrap_nullable());
                let expected_args = match &expected {
                    Ty::Variant(v) if v.nominal.decl == variant.nominal.decl => {
                        Some(v.nominal.args.clone())
                    }
                    Ty::VariantConstructor(c)
                        if c.variant.nominal.decl == variant.nominal.decl =>
                    {
                        Some(c.args.clone())
                    }
                    _ => None,
                };
                for (g, arg) in variant.nominal.generics.iter().zip(expected_args.unwrap_or_default()) {
                    if generics.iter().any(|open| open.name == g.name) && arg.is_concrete() {
                        seed.push((Ty::Generic(Rc::new(g.clone())), arg));
                    }
                }
            }
        }
        CallSig {
            generics,
            params,
            ret: Ty::VariantConstructor(ctor.clone()),
            explicit,
            seed,
            instantiation: Instantiation::Untracked,
            wrap,
        }
    }

    /// Overload resolution among members of one name: the only candidate,
    /// else by arity, then exact parameter types, then assignability, then
    /// the first candidate of matching arity.
    pub(crate) fn select_member(&mut self, candidates: Vec<Member>, args: &[NodeId]) -> Option<Member> {
        if candidates.len() <= 1 {
            return candidates.into_iter().next();
        }
        let by_arity: Vec<Member> = candidates
            .iter()
            .filter(|m| m.signature().is_some_and(|s| s.params.len() == args.len()))
            .cloned()
            .collect();
        match by_arity.len() {
            0 => return candidates.into_iter().next(),
            1 => return by_arity.into_iter().next(),
            _ => {}
        }
        let ast = self.ast;
        let arg_types: Vec<Option<Ty>> = args
            .iter()
            .map(|a| {
                if is_contextual(ast, *a) {
                    None
                } else {
                    Some(self.get_type(*a))
                }
            })
            .collect();
        let sigs: Vec<Rc<FnTy>> = by_arity.iter().filter_map(|m| m.signature().cloned()).collect();
        let index = self.pick_overload(&sigs, &arg_types).unwrap_or(0);
        by_arity.into_iter().nth(index)
    }

    /// Bind the generics of `sig` from the arguments of `call`.
    pub(crate) fn instantiate(
        &mut self,
        call: NodeId,
        sig: &CallSig,
        args: &[NodeId],
        stop: Stop,
    ) -> Subst {
        if sig.generics.is_empty() {
            return Subst::default();
        }
        if !sig.explicit.is_empty() {
            if sig.explicit.len() != sig.generics.len() && stop == Stop::Full {
                self.side_error(
                    call,
                    TypeErrorKind::ArityMismatch {
                        expected: sig.generics.len(),
                        found: sig.explicit.len(),
                    },
                );
            }
            let subst = subst_from(&sig.generics, &sig.explicit);
            if stop == Stop::Full {
                self.check_constraints(&sig.generics, &subst, &Bag::default(), call);
            }
            return subst;
        }

        let ast = self.ast;
        let mut bag = Bag::default();
        for (generic, known) in &sig.seed {
            self.unify_into(generic, known, &sig.generics, &mut bag, None);
        }
        let contextual: Vec<bool> = args.iter().map(|a| is_contextual(ast, *a)).collect();
        let limit = match stop {
            Stop::Concrete(i) => i,
            _ => args.len(),
        };
        for (j, arg) in args.iter().enumerate().take(limit) {
            if contextual[j] {
                continue;
            }
            let Some(param) = sig.params.get(j) else {
                break;
            };
            let arg_ty = self.get_type(*arg);
            self.unify_into(param, &arg_ty, &sig.generics, &mut bag, Some(*arg));
        }
        if let Stop::Concrete(_) = stop {
            return self.bindings(&sig.generics, &bag, true);
        }

        let mut pending: Vec<usize> = (0..args.len())
            .filter(|j| contextual[*j] && *j < sig.params.len())
            .collect();
        for _ in 0..args.len() {
            if pending.is_empty() {
                break;
            }
            let current = self.bindings(&sig.generics, &bag, true);
            let mut waiting = Vec::new();
            let mut progressed = false;
            for j in pending {
                let expectation = apply(&sig.params[j], &current);
                if !self.expectation_ready(args[j], &expectation) {
                    waiting.push(j);
                    continue;
                }
                if stop == Stop::Contextual(j) {
                    return current;
                }
                let arg_ty = self.get_type(args[j]);
                self.unify_into(&sig.params[j], &arg_ty, &sig.generics, &mut bag, Some(args[j]));
                progressed = true;
            }
            pending = waiting;
            if !progressed {
                break;
            }
        }
        if let Stop::Contextual(_) = stop {
            return self.bindings(&sig.generics, &bag, true);
        }
        // Contextual arguments that never became ready go last, with
        // whatever is known by then.
        for j in pending {
            let arg_ty = self.get_type(args[j]);
            self.unify_into(&sig.params[j], &arg_ty, &sig.generics, &mut bag, Some(args[j]));
        }
        let subst = self.bindings(&sig.generics, &bag, false);
        self.check_constraints(&sig.generics, &subst, &bag, call);
        subst
    }

    /// A lambda can be typed once the parameter types it would receive are
    /// known; other contextual arguments need the whole expectation.
    fn expectation_ready(&mut self, arg: NodeId, expectation: &Ty) -> bool {
        match self.ast.kind(arg) {
            NodeKind::Lambda { .. } => match self.resolve(expectation) {
                Ty::Function(sig) => sig.params.iter().all(|p| !p.ty.has_generics()),
                _ => true,
            },
            _ => !expectation.has_generics(),
        }
    }

    /// Expected type of argument `index` of a call or `new` whose signature
    /// is `sig`.
    pub(crate) fn argument_expected(
        &mut self,
        call: NodeId,
        sig: &CallSig,
        args: &[NodeId],
        index: usize,
    ) -> Option<Ty> {
        let param = sig.params.get(index)?.clone();
        if sig.generics.is_empty() {
            return Some(param);
        }
        let stop = if is_contextual(self.ast, args[index]) {
            Stop::Contextual(index)
        } else {
            Stop::Concrete(index)
        };
        let subst = self.instantiate(call, sig, args, stop);
        Some(apply(&param, &subst))
    }

    fn record_instantiation(&mut self, sig: &CallSig, subst: &Subst) {
        let method_args: Option<Vec<Ty>> = sig
            .generics
            .iter()
            .map(|g| subst.get(&g.name).cloned().filter(Ty::is_concrete))
            .collect();
        let Some(method_args) = method_args else {
            return;
        };
        match &sig.instantiation {
            Instantiation::Function { decl, name } if !method_args.is_empty() => {
                self.tc.registry.register_function(*decl, name, &method_args);
            }
            Instantiation::Method {
                decl,
                owner,
                class_args,
                name,
            } if !(method_args.is_empty() && class_args.is_empty())
                && class_args.iter().all(Ty::is_concrete) =>
            {
                self.tc
                    .registry
                    .register_method(*decl, owner, class_args, name, &method_args);
            }
            _ => {}
        }
    }

    /// Type of `new T(args)`. A generic class named without arguments gets
    /// them from its `init` parameters.
    pub(crate) fn new_type(&mut self, node: NodeId) -> Ty {
        let ast = self.ast;
        let NodeKind::New { ty, args } = ast.kind(node) else {
            return Ty::unsupported("not a `new` expression", Some(node));
        };
        let target = self.annotation(*ty);
        let Some(sig) = self.new_signature(node) else {
            return target;
        };
        if sig.params.len() != args.len() {
            self.side_error(
                node,
                TypeErrorKind::ArityMismatch {
                    expected: sig.params.len(),
                    found: args.len(),
                },
            );
        }
        if sig.generics.is_empty() {
            return target;
        }
        let subst = self.instantiate(node, &sig, args, Stop::Full);
        let instance = apply(&sig.ret, &subst);
        if let Ty::Reference(r) = &instance {
            if r.args.iter().all(Ty::is_concrete) {
                self.resolve_reference(r);
            }
        }
        instance
    }

    /// The `init` signature used by `new`, with the class generics to bind
    /// when the class was named without arguments.
    pub(crate) fn new_signature(&mut self, node: NodeId) -> Option<CallSig> {
        let ast = self.ast;
        let NodeKind::New { ty, args } = ast.kind(node) else {
            return None;
        };
        let target = self.annotation(*ty);
        let Ty::Reference(r) = &target else {
            return None;
        };
        let class = self.resolve(&target);
        let candidates: Vec<Member> = self
            .members_of(&class)
            .into_iter()
            .filter(|m| m.name == "init" && m.kind == MemberKind::Method)
            .collect();
        let init = self.select_member(candidates, args)?;
        let init = init.signature()?.clone();
        let generics = if r.args.is_empty() {
            self.decl_generics(r.decl)
        } else {
            Vec::new()
        };
        let ret = if generics.is_empty() {
            target.clone()
        } else {
            let params = generics.iter().map(|g| Ty::Generic(Rc::new(g.clone()))).collect();
            Ty::reference(r.decl, r.name.clone(), params)
        };
        Some(CallSig {
            generics,
            params: init.param_types().cloned().collect(),
            ret,
            explicit: Vec::new(),
            seed: Vec::new(),
            instantiation: Instantiation::Untracked,
            wrap: false,
        })
    }

    /// Record a non-fatal error against `node`.
    pub(crate) fn side_error(&mut self, node: NodeId, kind: TypeErrorKind) {
        let doc = self.ast.document_of(node);
        self.tc
            .cache
            .push_side_error(doc, node, TypeError::new(kind, Some(node)));
    }
}
