//! Grammar model
//!
//! A [`Grammar`] is an arena of [`GrammarNode`]s addressed by [`NodeId`]
//! handles. Composite nodes store handles to their children, so a node can
//! be shared by several parents, including itself, which is how recursive
//! grammars are built:
//!
//! ```rust
//! use ebnfkit::grammar::Grammar;
//!
//! let mut g: Grammar<String> = Grammar::new();
//! // list = '(' { list } ')'
//! let list = g.empty_sequence();
//! let inner = g.repeat(list);
//! g.append(list, '(').unwrap();
//! g.append(list, inner).unwrap();
//! g.append(list, ')').unwrap();
//! assert_eq!(g.render(list, 2), "'(' {...} ')'");
//! ```

pub mod analysis;
mod builder;
mod display;
mod node;
pub mod templates;

pub use analysis::GrammarAnalysis;
pub use builder::{IntoNode, NodeMut};
pub use node::{
    FinalizeFn, GrammarNode, InitFn, NecessityFn, NodeId, NodeKind, ParseCallbacks, ReduceFn,
    ScopeKind, ANY_LABEL, END_LABEL,
};

/// Arena of grammar nodes
///
/// `V` is the value type produced by reduce callbacks.
pub struct Grammar<V> {
    nodes: Vec<GrammarNode<V>>,
}

impl<V> Default for Grammar<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Grammar<V> {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Create an empty grammar with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Number of nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the grammar has no nodes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` belongs to this grammar
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Look up a node
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&GrammarNode<V>> {
        self.nodes.get(id.index())
    }

    /// Look up a node
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this grammar.
    #[inline]
    pub fn node(&self, id: NodeId) -> &GrammarNode<V> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_raw_mut(&mut self, id: NodeId) -> &mut GrammarNode<V> {
        &mut self.nodes[id.index()]
    }

    /// All node handles in creation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// Iterate over `(handle, node)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &GrammarNode<V>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_index(i), n))
    }

    pub(crate) fn push(&mut self, node: GrammarNode<V>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Compute reachability facts for every node
    pub fn analyze(&self) -> GrammarAnalysis {
        GrammarAnalysis::new(self)
    }
}

impl<V> std::fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("nodes", &self.nodes)
            .finish()
    }
}
