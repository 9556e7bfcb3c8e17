//! TypeC type checker: on-demand, memoized type inference.
//!
//! The checker answers "what is the type of this node?" for any node of a
//! linked and resolved [`Ast`]. Nothing is checked up front: each query
//! computes what it needs, memoizes it per document, and records generic
//! instantiations it encounters in the session's [`MonoRegistry`].
//!
//! Inference never fails. Problems are ordinary [`Ty::Error`] values that
//! flow through composite types; [`TypeChecker::collect_errors`] gathers them
//! for a document.
//!
//! # Architecture
//!
//! - [`ty`]: type representation and canonical rendering
//! - [`error`]: error kinds with their origin node
//! - [`subst`]: generic substitution
//! - [`mono`]: registry of concrete generic instantiations
//! - [`diagnostics`]: ariadne and JSON rendering of errors
//! - `infer`: the inference rules, expected types, member lookup, calls and
//!   patterns
//! - `relate`: semantic equality, assignability and joins
//! - `unify`: binding generics from argument types
//! - `cache`: per-document memoization and the in-flight tracker

mod cache;
pub mod diagnostics;
pub mod error;
mod factory;
mod infer;
pub mod mono;
mod relate;
pub mod subst;
pub mod ty;
mod unify;

use rustc_hash::FxHashSet;
use typec_ast::{Ast, NodeId};
use typec_common::{DocumentId, TypeckConfig};

use crate::cache::{InFlight, InferenceCache};
use crate::diagnostics::{render_diagnostic, DiagnosticOptions};
use crate::error::{TypeError, TypeErrorKind};
use crate::infer::Infer;
use crate::subst::replace_placeholders;

pub use crate::infer::{Member, MemberKind};
pub use crate::mono::{InstantiationKind, MonoRegistry};
pub use crate::ty::Ty;

/// One type checking session.
///
/// Holds the memoized results for every document it was asked about and the
/// monomorphization registry. The syntax tree is passed to each query, so
/// the caller keeps ownership and can edit it between queries (followed by
/// [`TypeChecker::invalidate_cache`]).
#[derive(Debug, Default)]
pub struct TypeChecker {
    config: TypeckConfig,
    pub(crate) cache: InferenceCache,
    pub(crate) in_flight: InFlight,
    pub(crate) registry: MonoRegistry,
    /// Nodes computed so far, cache hits excluded.
    pub(crate) computations: usize,
}

/// What a query returns for a type that could only be computed in terms of
/// itself.
fn expose(ty: Ty) -> Ty {
    replace_placeholders(&ty, &|p| {
        let node = match p {
            Ty::Error(e) => e.node,
            _ => None,
        };
        Ty::unsupported("type depends on itself and cannot be inferred", node)
    })
}

impl TypeChecker {
    pub fn new(config: TypeckConfig) -> Self {
        TypeChecker {
            registry: MonoRegistry::new(&config),
            config,
            cache: InferenceCache::default(),
            in_flight: InFlight::default(),
            computations: 0,
        }
    }

    pub fn config(&self) -> &TypeckConfig {
        &self.config
    }

    /// Type of `node`.
    pub fn get_type(&mut self, ast: &Ast, node: NodeId) -> Ty {
        let ty = Infer::new(ast, self).get_type(node);
        expose(ty)
    }

    /// Type the context of `node` wants it to have, if any.
    pub fn get_expected_type(&mut self, ast: &Ast, node: NodeId) -> Option<Ty> {
        Infer::new(ast, self).get_expected_type(node).map(expose)
    }

    /// Members visible on a value of type `ty`, for completion.
    pub fn identifiable_fields(&mut self, ast: &Ast, ty: &Ty) -> Vec<Member> {
        Infer::new(ast, self).members_of(ty)
    }

    /// Drop everything memoized for `doc`. Recorded instantiations stay.
    /// Returns whether anything was cached.
    pub fn invalidate_cache(&mut self, doc: DocumentId) -> bool {
        let dropped = self.cache.invalidate(doc);
        log::debug!("[typeck] invalidated {} (cached: {})", doc, dropped);
        dropped
    }

    /// Errors attached to `node`: those inside its type plus side errors
    /// recorded against it.
    pub fn node_errors(&mut self, ast: &Ast, node: NodeId) -> Vec<TypeError> {
        let ty = self.get_type(ast, node);
        let mut out = Vec::new();
        ty.visit(&mut |t| {
            if let Ty::Error(e) = t {
                if e.kind != TypeErrorKind::CircularInference && !out.contains(e.as_ref()) {
                    out.push(e.as_ref().clone());
                }
            }
        });
        let doc = ast.document_of(node);
        if let Some(side) = self.cache.doc(doc).and_then(|c| c.side_errors.get(&node)) {
            for e in side {
                if !out.contains(e) {
                    out.push(e.clone());
                }
            }
        }
        out
    }

    /// Every error originating in `doc`, once per origin node and kind,
    /// ordered by source position.
    pub fn collect_errors(&mut self, ast: &Ast, doc: DocumentId) -> Vec<TypeError> {
        let nodes = ast.descendants(doc);
        let mut found: Vec<TypeError> = Vec::new();
        for &node in &nodes {
            let ty = self.get_type(ast, node);
            ty.visit(&mut |t| {
                if let Ty::Error(e) = t {
                    found.push(e.as_ref().clone());
                }
            });
        }
        if let Some(cache) = self.cache.doc(doc) {
            for &node in &nodes {
                if let Some(side) = cache.side_errors.get(&node) {
                    found.extend(side.iter().cloned());
                }
            }
        }

        let mut seen: FxHashSet<(Option<NodeId>, TypeErrorKind)> = FxHashSet::default();
        found.retain(|e| {
            let in_doc = e.node.map_or(true, |n| ast.document_of(n) == doc);
            in_doc && seen.insert((e.node, e.kind.clone()))
        });
        found.sort_by_key(|e| e.node.map(|n| ast.span(n).start));
        found
    }

    /// Render every error of `doc` with the source text it was parsed from.
    pub fn render_errors(
        &mut self,
        ast: &Ast,
        doc: DocumentId,
        source: &str,
        options: &DiagnosticOptions,
    ) -> Vec<String> {
        let filename = ast
            .document(doc)
            .map(|d| d.uri.clone())
            .unwrap_or_default();
        self.collect_errors(ast, doc)
            .iter()
            .map(|e| {
                let span = e.node.map(|n| ast.span(n)).unwrap_or_default();
                render_diagnostic(e, span, source, &filename, options)
            })
            .collect()
    }

    pub fn registry(&self) -> &MonoRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MonoRegistry {
        &mut self.registry
    }

    /// Number of node computations performed (cache hits are not counted).
    pub fn computations(&self) -> usize {
        self.computations
    }
}
