//! The syntax tree consumed by the TypeC type checker.
//!
//! Parsing is not done here: a front end (or a test, through [`AstBuilder`])
//! appends nodes to an [`Ast`] arena, one document at a time. The arena spans
//! every open document so cross-references between documents are plain
//! [`NodeId`]s.
//!
//! - [`node`]: node kinds and operators
//! - [`builder`]: ergonomic construction of documents
//! - [`scope`]: default lexical resolver for unresolved cross-references

pub mod builder;
pub mod node;
pub mod scope;

use serde::{Deserialize, Serialize};
use typec_common::{DocumentId, Span};

pub use builder::AstBuilder;
pub use node::{
    BinOp, CastKind, FloatSuffix, IntSuffix, Node, NodeId, NodeKind, PostfixOp, Prim, UnOp,
};

/// Metadata of one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub uri: String,
    /// The document's `Module` node; `None` until the first build finishes.
    pub root: Option<NodeId>,
}

/// Arena of syntax nodes for all documents of a compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    documents: Vec<DocumentInfo>,
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new document and return a builder for its contents.
    pub fn builder(&mut self, uri: impl Into<String>) -> AstBuilder<'_> {
        let id = DocumentId(self.documents.len() as u32);
        self.documents.push(DocumentInfo {
            id,
            uri: uri.into(),
            root: None,
        });
        AstBuilder::new(self, id)
    }

    /// Start rebuilding an existing document. Its old nodes stay in the arena
    /// but become unreachable once the new root is installed.
    pub fn rebuild(&mut self, doc: DocumentId) -> AstBuilder<'_> {
        AstBuilder::new(self, doc)
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn document(&self, doc: DocumentId) -> Option<&DocumentInfo> {
        self.documents.get(doc.0 as usize)
    }

    pub fn root(&self, doc: DocumentId) -> Option<NodeId> {
        self.document(doc).and_then(|d| d.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn document_of(&self, id: NodeId) -> DocumentId {
        self.node(id).document
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// All nodes reachable from the document root, in pre-order.
    pub fn descendants(&self, doc: DocumentId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root(doc).into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.kind(id).children();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Replace a node's kind in place (an edit). Callers must invalidate the
    /// type checker's caches for the node's document afterwards.
    pub fn replace_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0 as usize].kind = kind;
        if let Some(doc) = self.get(id).map(|n| n.document) {
            self.link(doc);
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn set_root(&mut self, doc: DocumentId, root: NodeId) {
        if let Some(info) = self.documents.get_mut(doc.0 as usize) {
            info.root = Some(root);
        }
    }

    /// Recompute derived properties of a document: parent pointers, spans of
    /// detached nodes (covering their children) and optional-chain flags.
    ///
    /// Deserialized trees must be linked before use.
    pub fn link(&mut self, doc: DocumentId) {
        let Some(root) = self.root(doc) else {
            return;
        };
        self.nodes[root.0 as usize].parent = None;
        // Pre-order for parents, then post-order (reverse) for spans and chains.
        let order = self.descendants(doc);
        for &id in &order {
            for child in self.kind(id).children() {
                self.nodes[child.0 as usize].parent = Some(id);
            }
        }
        for &id in order.iter().rev() {
            let children = self.kind(id).children();
            if self.span(id).is_empty() {
                let covered = children
                    .iter()
                    .fold(Span::detached(), |acc, c| acc.cover(self.span(*c)));
                self.nodes[id.0 as usize].span = covered;
            }
            let chain = match self.kind(id) {
                NodeKind::Member { base, optional, .. } => *optional || self.in_optional_chain(*base),
                NodeKind::Index { base, .. } => self.in_optional_chain(*base),
                NodeKind::Call { callee, .. } => self.in_optional_chain(*callee),
                _ => continue,
            };
            match &mut self.nodes[id.0 as usize].kind {
                NodeKind::Member { optional_chain, .. }
                | NodeKind::Index { optional_chain, .. }
                | NodeKind::Call { optional_chain, .. } => *optional_chain = chain,
                _ => {}
            }
        }
    }

    /// Whether `id` is an access chain containing `?.` (as computed by [`Ast::link`]).
    pub fn in_optional_chain(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Member { optional_chain, .. }
            | NodeKind::Index { optional_chain, .. } => *optional_chain,
            NodeKind::Call { callee, .. } => self.in_optional_chain(*callee),
            NodeKind::Cast { expr, .. } => self.in_optional_chain(*expr),
            NodeKind::Unary { operand, .. } | NodeKind::Postfix { operand, .. } => {
                self.in_optional_chain(*operand)
            }
            _ => false,
        }
    }
}
