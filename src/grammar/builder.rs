//! Combinators and node setters
//!
//! Composition flattens *plain* operands of the same kind: an operand is
//! merged into the new composite when it is not pinned, carries no callbacks,
//! commit flag, custom message or explicit scope, and no reduce callback is
//! reachable from it. Everything else is kept as an addressable sub-tree.

use super::analysis;
use super::node::{GrammarNode, NodeId, NodeKind, ScopeKind, ANY_LABEL, END_LABEL};
use super::Grammar;
use crate::context::{ScopeContext, Variables};
use crate::error::{CallbackError, ConfigError};
use crate::syntax::{SyntaxId, SyntaxRef};
use std::rc::Rc;

/// Anything that can stand where a grammar node is expected
///
/// Characters become [`Grammar::char`] nodes and strings become
/// [`Grammar::text`] nodes.
pub trait IntoNode<V> {
    /// Add `self` to the grammar (if needed) and return its handle
    fn into_node(self, grammar: &mut Grammar<V>) -> NodeId;
}

impl<V> IntoNode<V> for NodeId {
    #[inline]
    fn into_node(self, _grammar: &mut Grammar<V>) -> NodeId {
        self
    }
}

impl<V> IntoNode<V> for char {
    fn into_node(self, grammar: &mut Grammar<V>) -> NodeId {
        grammar.char(self)
    }
}

impl<V> IntoNode<V> for &str {
    fn into_node(self, grammar: &mut Grammar<V>) -> NodeId {
        grammar.text(self)
    }
}

impl<V> IntoNode<V> for String {
    fn into_node(self, grammar: &mut Grammar<V>) -> NodeId {
        grammar.text(&self)
    }
}

/// Composite kinds that accept appended children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Composite {
    Sequence,
    Choice,
    Permutation,
}

impl Composite {
    fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Sequence(_) => Some(Composite::Sequence),
            NodeKind::Choice(_) => Some(Composite::Choice),
            NodeKind::Permutation(_) => Some(Composite::Permutation),
            _ => None,
        }
    }

    fn build(self, children: Vec<NodeId>) -> NodeKind {
        match self {
            Composite::Sequence => NodeKind::Sequence(children),
            Composite::Choice => NodeKind::Choice(children),
            Composite::Permutation => NodeKind::Permutation(children),
        }
    }

    /// Alternatives and permutation members are sets
    fn dedupes(self) -> bool {
        !matches!(self, Composite::Sequence)
    }
}

fn push_child(children: &mut Vec<NodeId>, id: NodeId, dedupe: bool) {
    if !dedupe || !children.contains(&id) {
        children.push(id);
    }
}

impl<V> Grammar<V> {
    // ========================================================================
    // Leaves
    // ========================================================================

    /// A single character, labelled with itself
    pub fn char(&mut self, c: char) -> NodeId {
        self.push(GrammarNode::labeled(NodeKind::Char(c), c.to_string()))
    }

    /// An inclusive character range
    ///
    /// Reversed bounds are swapped; equal bounds produce a [`Grammar::char`].
    pub fn range(&mut self, lo: char, hi: char) -> NodeId {
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        if lo == hi {
            return self.char(lo);
        }
        self.push(GrammarNode::labeled(
            NodeKind::Range { lo, hi },
            format!("[{}-{}]", lo, hi),
        ))
    }

    /// Any single character
    pub fn any(&mut self) -> NodeId {
        self.push(GrammarNode::labeled(NodeKind::Any { or_end: false }, ANY_LABEL))
    }

    /// Any single character, or the end of input
    pub fn any_or_end(&mut self) -> NodeId {
        self.push(GrammarNode::labeled(NodeKind::Any { or_end: true }, ANY_LABEL))
    }

    /// End of input
    pub fn end(&mut self) -> NodeId {
        self.push(GrammarNode::labeled(NodeKind::EndMarker, END_LABEL))
    }

    /// A string literal: a sequence of its characters, labelled with the string
    pub fn text(&mut self, literal: &str) -> NodeId {
        let mut chars = literal.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return self.char(c);
        }
        let children = literal.chars().map(|c| self.char(c)).collect();
        self.push(GrammarNode::labeled(NodeKind::Sequence(children), literal))
    }

    // ========================================================================
    // Composites
    // ========================================================================

    /// Sequence of the given items
    pub fn seq<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator,
        I::Item: IntoNode<V>,
    {
        self.compose(Composite::Sequence, items)
    }

    /// Ordered choice between the given items
    pub fn choice<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator,
        I::Item: IntoNode<V>,
    {
        self.compose(Composite::Choice, items)
    }

    /// Permutation of the given items
    pub fn permutation<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator,
        I::Item: IntoNode<V>,
    {
        self.compose(Composite::Permutation, items)
    }

    /// `a` followed by `b`
    pub fn and(&mut self, a: impl IntoNode<V>, b: impl IntoNode<V>) -> NodeId {
        let a = a.into_node(self);
        let b = b.into_node(self);
        self.compose(Composite::Sequence, [a, b])
    }

    /// `a`, or else `b`
    pub fn or(&mut self, a: impl IntoNode<V>, b: impl IntoNode<V>) -> NodeId {
        let a = a.into_node(self);
        let b = b.into_node(self);
        self.compose(Composite::Choice, [a, b])
    }

    /// `a` and `b` in either order
    pub fn perm(&mut self, a: impl IntoNode<V>, b: impl IntoNode<V>) -> NodeId {
        let a = a.into_node(self);
        let b = b.into_node(self);
        self.compose(Composite::Permutation, [a, b])
    }

    /// An empty sequence to be filled with [`Grammar::append`]
    pub fn empty_sequence(&mut self) -> NodeId {
        self.placeholder(Composite::Sequence)
    }

    /// An empty choice to be filled with [`Grammar::append`]
    pub fn empty_choice(&mut self) -> NodeId {
        self.placeholder(Composite::Choice)
    }

    /// An empty permutation to be filled with [`Grammar::append`]
    pub fn empty_permutation(&mut self) -> NodeId {
        self.placeholder(Composite::Permutation)
    }

    /// Append `item` to a sequence, choice or permutation in place
    ///
    /// The target becomes pinned: later compositions keep referring to it
    /// instead of copying its children.
    pub fn append(&mut self, target: NodeId, item: impl IntoNode<V>) -> Result<(), ConfigError> {
        let composite = self.composite_target(target)?;
        let item = item.into_node(self);
        self.node_raw_mut(target).pinned = true;

        let mut children = self.node(target).kind.children().to_vec();
        self.merge(composite, &mut children, &[item]);
        if let Some(slot) = self.node_raw_mut(target).kind.children_mut() {
            *slot = children;
        }
        Ok(())
    }

    /// Insert `item` in front of the children of a composite in place
    pub fn prepend(&mut self, target: NodeId, item: impl IntoNode<V>) -> Result<(), ConfigError> {
        let composite = self.composite_target(target)?;
        let item = item.into_node(self);
        self.node_raw_mut(target).pinned = true;

        let mut children = Vec::new();
        self.merge(composite, &mut children, &[item]);
        for &existing in self.node(target).kind.children() {
            push_child(&mut children, existing, composite.dedupes());
        }
        if let Some(slot) = self.node_raw_mut(target).kind.children_mut() {
            *slot = children;
        }
        Ok(())
    }

    // ========================================================================
    // Wrappers
    // ========================================================================

    /// Zero or one `item`; returns `item` itself if it already is optional
    pub fn optional(&mut self, item: impl IntoNode<V>) -> NodeId {
        let child = item.into_node(self);
        if matches!(self.node(child).kind, NodeKind::Optional(_)) {
            return child;
        }
        self.push(GrammarNode::new(NodeKind::Optional(child)))
    }

    /// Zero or more `item`
    ///
    /// Repeating a repeat collapses to the inner node when both carry the
    /// same bounds, or when the inner one is an unbounded zero-or-more.
    /// Other bound pairs nest: `repeat(repeat_min(x, 2))` keeps both nodes.
    pub fn repeat(&mut self, item: impl IntoNode<V>) -> NodeId {
        self.repeat_bounds(item, 0, None)
    }

    /// At least `min` times `item`
    pub fn repeat_min(&mut self, item: impl IntoNode<V>, min: usize) -> NodeId {
        self.repeat_bounds(item, min, None)
    }

    /// Between `min` and `max` times `item`
    pub fn repeat_range(
        &mut self,
        item: impl IntoNode<V>,
        min: usize,
        max: usize,
    ) -> Result<NodeId, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidRepeat { min, max });
        }
        Ok(self.repeat_bounds(item, min, Some(max)))
    }

    /// Negative lookahead on `item`; never consumes input
    pub fn exclude(&mut self, item: impl IntoNode<V>) -> NodeId {
        let child = item.into_node(self);
        self.push(GrammarNode::new(NodeKind::Exclude {
            child,
            serious: false,
        }))
    }

    /// Duplicate a node with its metadata and child handles
    ///
    /// The copy is not pinned. Copies of a committed node no longer have an
    /// exclusive prefix, so a warning is logged.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        if node.commit {
            log_warn!(
                "cloning committed node {} ({}); commit exclusivity is not preserved",
                id,
                node.label.as_deref().unwrap_or("unlabeled")
            );
        }
        node.pinned = false;
        self.push(node)
    }

    /// Fluent access to a node's metadata
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this grammar.
    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_, V> {
        NodeMut {
            id,
            node: self.node_raw_mut(id),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn compose<I>(&mut self, composite: Composite, items: I) -> NodeId
    where
        I: IntoIterator,
        I::Item: IntoNode<V>,
    {
        let ids: Vec<NodeId> = items.into_iter().map(|item| item.into_node(self)).collect();
        let mut children = Vec::with_capacity(ids.len());
        self.merge(composite, &mut children, &ids);
        self.push(GrammarNode::new(composite.build(children)))
    }

    fn placeholder(&mut self, composite: Composite) -> NodeId {
        let mut node = GrammarNode::new(composite.build(Vec::new()));
        node.pinned = true;
        self.push(node)
    }

    fn composite_target(&self, target: NodeId) -> Result<Composite, ConfigError> {
        let node = self
            .get(target)
            .ok_or(ConfigError::UnknownNode { node: target })?;
        Composite::of(&node.kind).ok_or(ConfigError::NotComposite { node: target })
    }

    fn merge(&self, composite: Composite, children: &mut Vec<NodeId>, incoming: &[NodeId]) {
        let dedupe = composite.dedupes();
        for &id in incoming {
            if self.flattens_into(composite, id) {
                for &child in self.node(id).kind.children() {
                    push_child(children, child, dedupe);
                }
            } else {
                push_child(children, id, dedupe);
            }
        }
    }

    fn flattens_into(&self, composite: Composite, id: NodeId) -> bool {
        let node = self.node(id);
        Composite::of(&node.kind) == Some(composite)
            && node.is_plain()
            && analysis::is_generic(self, id)
    }

    fn repeat_bounds(&mut self, item: impl IntoNode<V>, min: usize, max: Option<usize>) -> NodeId {
        let child = item.into_node(self);
        if let NodeKind::Repeat {
            min: inner_min,
            max: inner_max,
            ..
        } = self.node(child).kind
        {
            // x* repeated any number of times is still x*
            if (inner_min == min && inner_max == max) || (inner_min == 0 && inner_max.is_none()) {
                return child;
            }
        }
        self.push(GrammarNode::new(NodeKind::Repeat { child, min, max }))
    }
}

// ============================================================================
// Node setters
// ============================================================================

/// Fluent setter handle returned by [`Grammar::node_mut`]
pub struct NodeMut<'g, V> {
    id: NodeId,
    node: &'g mut GrammarNode<V>,
}

impl<'g, V> NodeMut<'g, V> {
    /// Handle of the node being edited
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Set the label
    pub fn label(self, label: impl Into<String>) -> Self {
        let label: String = label.into();
        self.node.label = Some(Rc::from(label));
        self
    }

    /// Set the error message; `{}` is replaced by the offending character
    pub fn error_message(self, message: impl Into<String>) -> Self {
        self.node.error_message = Some(message.into());
        self
    }

    /// Set the scope tag
    pub fn scope(self, scope: ScopeKind) -> Self {
        self.node.scope = scope;
        self
    }

    /// Set the reduce callback
    pub fn reduce<F>(self, f: F) -> Self
    where
        F: Fn(&mut ScopeContext<'_, V>, Vec<V>) -> Result<V, CallbackError> + 'static,
    {
        let f: super::ReduceFn<V> = Rc::new(f);
        self.node.reduce = Some(f);
        self
    }

    /// Set the one-time initializer; the node must be labelled
    pub fn init<F>(self, f: F) -> Self
    where
        F: Fn(&mut Variables<V>) -> Result<(), CallbackError> + 'static,
    {
        let f: super::InitFn<V> = Rc::new(f);
        self.node.callbacks_mut().init = Some(f);
        self
    }

    /// Set the child filter
    pub fn is_necessary<F>(self, f: F) -> Self
    where
        F: Fn(&SyntaxRef<'_, V>) -> bool + 'static,
    {
        let f: super::NecessityFn<V> = Rc::new(f);
        self.node.callbacks_mut().is_necessary = Some(f);
        self
    }

    /// Set the post-match hook
    pub fn finalize<F>(self, f: F) -> Self
    where
        F: Fn(&mut ScopeContext<'_, V>, &[SyntaxId]) -> Result<(), CallbackError> + 'static,
    {
        let f: super::FinalizeFn<V> = Rc::new(f);
        self.node.callbacks_mut().finalize = Some(f);
        self
    }

    /// Mark a sequence or permutation as committed
    pub fn commit(self) -> Result<Self, ConfigError> {
        match self.node.kind {
            NodeKind::Sequence(_) | NodeKind::Permutation(_) => {
                self.node.commit = true;
                Ok(self)
            }
            _ => Err(ConfigError::CommitNotAllowed { node: self.id }),
        }
    }

    /// Make an exclusion raise a fatal error when its child matches
    pub fn serious(self) -> Result<Self, ConfigError> {
        match &mut self.node.kind {
            NodeKind::Exclude { serious, .. } => {
                *serious = true;
                Ok(self)
            }
            _ => Err(ConfigError::SeriousNotAllowed { node: self.id }),
        }
    }
}
