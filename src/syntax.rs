//! Scoped syntax tree
//!
//! The matcher assembles the tree in an arena as it goes; a failed attempt
//! truncates the arena back to where the attempt started. Scope nodes own a
//! local-variable map that reduce and finalize callbacks can use.

use crate::context::Variables;
use crate::grammar::NodeId;
use std::fmt;
use std::rc::Rc;

/// Handle to a node in a [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId(u32);

impl SyntaxId {
    /// Index in the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        SyntaxId(index as u32)
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// What a syntax node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    /// Matched text
    Text(String),
    /// Aggregated children without a scope of their own
    List(Vec<SyntaxId>),
    /// An opaque unit with retained children and locals
    Scope(Vec<SyntaxId>),
    /// Erased content
    Empty,
    /// End of input matched by an any-or-end node
    End,
}

/// A node of the syntax tree
#[derive(Debug, Clone)]
pub struct SyntaxNode<V> {
    pub(crate) kind: SyntaxKind,
    pub(crate) origin: Option<NodeId>,
    pub(crate) label: Option<Rc<str>>,
    pub(crate) parent: Option<SyntaxId>,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) locals: Variables<V>,
}

impl<V> SyntaxNode<V> {
    /// Contents
    #[inline]
    pub fn kind(&self) -> &SyntaxKind {
        &self.kind
    }

    /// Grammar node that produced this unit
    #[inline]
    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    /// Label inherited from the grammar node
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Enclosing scope, set when a scope adopts this node
    #[inline]
    pub fn parent(&self) -> Option<SyntaxId> {
        self.parent
    }

    /// Byte range of the input covered by this node
    #[inline]
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Local variables (only scopes use them)
    #[inline]
    pub fn locals(&self) -> &Variables<V> {
        &self.locals
    }

    /// Whether this is a scope
    #[inline]
    pub fn is_scope(&self) -> bool {
        matches!(self.kind, SyntaxKind::Scope(_))
    }
}

/// Arena holding the syntax tree of one compile run
#[derive(Debug, Clone)]
pub struct SyntaxTree<V> {
    nodes: Vec<SyntaxNode<V>>,
    root: Option<SyntaxId>,
}

impl<V> Default for SyntaxTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SyntaxTree<V> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Number of allocated nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node has been allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The synthetic top-level scope, once matching has completed
    #[inline]
    pub fn root(&self) -> Option<SyntaxId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: SyntaxId) {
        self.root = Some(root);
    }

    /// Look up a node
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[inline]
    pub fn node(&self, id: SyntaxId) -> &SyntaxNode<V> {
        &self.nodes[id.index()]
    }

    /// Look up a node
    #[inline]
    pub fn get(&self, id: SyntaxId) -> Option<&SyntaxNode<V>> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: SyntaxId) -> &mut SyntaxNode<V> {
        &mut self.nodes[id.index()]
    }

    /// Borrowing view of a node
    #[inline]
    pub fn view(&self, id: SyntaxId) -> SyntaxRef<'_, V> {
        SyntaxRef { tree: self, id }
    }

    /// Members of a list or scope; empty for other kinds
    pub fn children(&self, id: SyntaxId) -> &[SyntaxId] {
        match &self.node(id).kind {
            SyntaxKind::List(items) | SyntaxKind::Scope(items) => items,
            SyntaxKind::Text(_) | SyntaxKind::Empty | SyntaxKind::End => &[],
        }
    }

    /// Concatenated text of the subtree
    pub fn text(&self, id: SyntaxId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    /// Append the subtree's text to `out`
    pub fn write_text(&self, id: SyntaxId, out: &mut String) {
        match &self.node(id).kind {
            SyntaxKind::Text(text) => out.push_str(text),
            SyntaxKind::List(items) | SyntaxKind::Scope(items) => {
                for &item in items {
                    self.write_text(item, out);
                }
            }
            SyntaxKind::Empty | SyntaxKind::End => {}
        }
    }

    /// Scopes enclosing `id`, innermost first
    pub fn ancestors(&self, id: SyntaxId) -> impl Iterator<Item = SyntaxId> + '_ {
        std::iter::successors(self.node(id).parent, move |&p| self.node(p).parent)
    }

    pub(crate) fn push(
        &mut self,
        kind: SyntaxKind,
        origin: Option<NodeId>,
        label: Option<Rc<str>>,
        span: (usize, usize),
    ) -> SyntaxId {
        let id = SyntaxId::from_index(self.nodes.len());
        self.nodes.push(SyntaxNode {
            kind,
            origin,
            label,
            parent: None,
            start: span.0,
            end: span.1,
            locals: Variables::new(),
        });
        id
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// Make `scope` the parent of `items`, descending through list units
    pub(crate) fn adopt(&mut self, scope: SyntaxId, items: &[SyntaxId]) {
        let mut pending: Vec<SyntaxId> = items.to_vec();
        while let Some(item) = pending.pop() {
            self.node_mut(item).parent = Some(scope);
            if let SyntaxKind::List(members) = &self.node(item).kind {
                pending.extend(members.iter().copied());
            }
        }
    }
}

/// Read-only view of one syntax node, handed to `is_necessary` filters
pub struct SyntaxRef<'t, V> {
    tree: &'t SyntaxTree<V>,
    id: SyntaxId,
}

impl<V> Clone for SyntaxRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for SyntaxRef<'_, V> {}

impl<'t, V> SyntaxRef<'t, V> {
    /// Handle of the node
    #[inline]
    pub fn id(&self) -> SyntaxId {
        self.id
    }

    /// The node itself
    #[inline]
    pub fn node(&self) -> &'t SyntaxNode<V> {
        self.tree.node(self.id)
    }

    /// Contents
    #[inline]
    pub fn kind(&self) -> &'t SyntaxKind {
        &self.node().kind
    }

    /// Label
    #[inline]
    pub fn label(&self) -> Option<&'t str> {
        self.node().label.as_deref()
    }

    /// Originating grammar node
    #[inline]
    pub fn origin(&self) -> Option<NodeId> {
        self.node().origin
    }

    /// Concatenated text
    pub fn text(&self) -> String {
        self.tree.text(self.id)
    }

    /// Whether this is a scope
    #[inline]
    pub fn is_scope(&self) -> bool {
        self.node().is_scope()
    }

    /// Whether this is erased content
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.node().kind, SyntaxKind::Empty | SyntaxKind::End)
    }

    /// Views of the list or scope members
    pub fn children(&self) -> impl Iterator<Item = SyntaxRef<'t, V>> + 't {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |&id| SyntaxRef { tree, id })
    }
}

impl<V> fmt::Debug for SyntaxRef<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxRef")
            .field("id", &self.id)
            .field("kind", self.kind())
            .field("label", &self.label())
            .finish()
    }
}
