//! Per-document memoization and the in-flight tracker.

use rustc_hash::{FxHashMap, FxHashSet};
use typec_ast::NodeId;
use typec_common::DocumentId;

use crate::error::TypeError;
use crate::ty::{RefTy, Ty};

/// Everything memoized for one document. Dropped as a whole on invalidation.
#[derive(Default, Debug)]
pub(crate) struct DocCache {
    pub types: FxHashMap<NodeId, Ty>,
    pub expected: FxHashMap<NodeId, Option<Ty>>,
    /// Non-fatal errors (constraint violations, pattern errors) by node.
    pub side_errors: FxHashMap<NodeId, Vec<TypeError>>,
    /// Types of pattern nodes, filled one match case at a time.
    pub patterns: FxHashMap<NodeId, Ty>,
    /// Resolutions of references whose declaration lives in this document.
    pub references: FxHashMap<RefTy, Ty>,
}

#[derive(Default, Debug)]
pub(crate) struct InferenceCache {
    docs: FxHashMap<DocumentId, DocCache>,
}

impl InferenceCache {
    pub fn doc(&self, doc: DocumentId) -> Option<&DocCache> {
        self.docs.get(&doc)
    }

    pub fn doc_mut(&mut self, doc: DocumentId) -> &mut DocCache {
        self.docs.entry(doc).or_default()
    }

    pub fn invalidate(&mut self, doc: DocumentId) -> bool {
        self.docs.remove(&doc).is_some()
    }

    /// Record a side error once; re-running a computation must not duplicate it.
    pub fn push_side_error(&mut self, doc: DocumentId, node: NodeId, err: TypeError) {
        let errors = self.doc_mut(doc).side_errors.entry(node).or_default();
        if !errors.contains(&err) {
            errors.push(err);
        }
    }
}

/// What an in-flight entry stands for. Declarations that can be re-entered
/// through their own uses get a stub instead of a placeholder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EntityKind {
    Function,
    /// Classes and interfaces.
    Class,
    Method,
    Implementation,
    ImplMethod,
    TypeAlias,
    /// Any other node.
    Node,
    /// Expected-type computation of a node.
    Expected,
    /// The pattern pass of a match case.
    Pattern,
}

pub(crate) type EntityKey = (EntityKind, NodeId);

/// Entities currently being inferred.
///
/// An entity whose stub (or placeholder) was handed out while it was still in
/// flight is *tainted* until it finishes; nothing computed while any entity is
/// tainted may be memoized.
#[derive(Default, Debug)]
pub(crate) struct InFlight {
    active: FxHashSet<EntityKey>,
    tainted: FxHashSet<EntityKey>,
}

impl InFlight {
    pub fn contains(&self, key: EntityKey) -> bool {
        self.active.contains(&key)
    }

    pub fn enter(&mut self, key: EntityKey) {
        self.active.insert(key);
    }

    pub fn exit(&mut self, key: EntityKey) {
        self.active.remove(&key);
        self.tainted.remove(&key);
    }

    pub fn taint(&mut self, key: EntityKey) {
        self.tainted.insert(key);
    }

    /// No stub of an unfinished entity has been observed.
    pub fn is_clean(&self) -> bool {
        self.tainted.is_empty()
    }
}
