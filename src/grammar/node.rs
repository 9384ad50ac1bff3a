//! Grammar node definitions

use crate::context::{ScopeContext, Variables};
use crate::error::CallbackError;
use crate::syntax::{SyntaxId, SyntaxRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Label given to nodes built by [`Grammar::any`](super::Grammar::any)
pub const ANY_LABEL: &str = "[[ANY]]";

/// Label given to end-of-input nodes and units
pub const END_LABEL: &str = "[[END]]";

/// Handle to a node inside a [`Grammar`](super::Grammar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Index of the node in its grammar
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural kind of a grammar node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A single character
    Char(char),
    /// An inclusive character range
    Range {
        /// Lowest accepted character
        lo: char,
        /// Highest accepted character
        hi: char,
    },
    /// Any single character, optionally also the end of input
    Any {
        /// Also match at the end of input
        or_end: bool,
    },
    /// End of input; never consumes
    EndMarker,
    /// Children in order
    Sequence(Vec<NodeId>),
    /// First matching child
    Choice(Vec<NodeId>),
    /// Child or nothing
    Optional(NodeId),
    /// Child repeated between `min` and `max` times
    Repeat {
        /// Repeated node
        child: NodeId,
        /// Lower bound
        min: usize,
        /// Upper bound, unbounded when `None`
        max: Option<usize>,
    },
    /// Negative lookahead
    Exclude {
        /// Forbidden node
        child: NodeId,
        /// Raise a fatal error instead of a mismatch
        serious: bool,
    },
    /// Every child exactly once, in any order
    Permutation(Vec<NodeId>),
}

impl NodeKind {
    /// Child handles in declaration order
    pub fn children(&self) -> &[NodeId] {
        match self {
            NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::Permutation(c) => c,
            NodeKind::Optional(child)
            | NodeKind::Repeat { child, .. }
            | NodeKind::Exclude { child, .. } => std::slice::from_ref(child),
            NodeKind::Char(_)
            | NodeKind::Range { .. }
            | NodeKind::Any { .. }
            | NodeKind::EndMarker => &[],
        }
    }

    /// Whether the node holds an appendable child list
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            NodeKind::Sequence(_) | NodeKind::Choice(_) | NodeKind::Permutation(_)
        )
    }

    /// Short kind name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Char(_) => "char",
            NodeKind::Range { .. } => "range",
            NodeKind::Any { .. } => "any",
            NodeKind::EndMarker => "end",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Choice(_) => "choice",
            NodeKind::Optional(_) => "optional",
            NodeKind::Repeat { .. } => "repeat",
            NodeKind::Exclude { .. } => "exclude",
            NodeKind::Permutation(_) => "permutation",
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::Permutation(c) => Some(c),
            _ => None,
        }
    }

    /// Whether the node is a character-level leaf
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Char(_) | NodeKind::Range { .. } | NodeKind::Any { .. } | NodeKind::EndMarker
        )
    }
}

/// Visibility policy of a node's match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Force a scope when callbacks are reachable, otherwise follow the compiler policy
    #[default]
    Default,
    /// Force a scope when callbacks are reachable, otherwise aggregate
    Inherited,
    /// Always create a scope
    Force,
    /// Pass the match through to the enclosing node
    Parent,
    /// Erase the content, keeping only a placeholder
    Empty,
}

/// Reduce callback: receives reduced children, returns this node's value
pub type ReduceFn<V> = Rc<dyn Fn(&mut ScopeContext<'_, V>, Vec<V>) -> Result<V, CallbackError>>;

/// One-time, label-keyed initializer over the run's globals
pub type InitFn<V> = Rc<dyn Fn(&mut Variables<V>) -> Result<(), CallbackError>>;

/// Structural filter deciding whether a child is retained
pub type NecessityFn<V> = Rc<dyn Fn(&SyntaxRef<'_, V>) -> bool>;

/// Post-match hook receiving the retained children
pub type FinalizeFn<V> =
    Rc<dyn Fn(&mut ScopeContext<'_, V>, &[SyntaxId]) -> Result<(), CallbackError>>;

/// Parse-time hooks of a node
pub struct ParseCallbacks<V> {
    pub(crate) init: Option<InitFn<V>>,
    pub(crate) is_necessary: Option<NecessityFn<V>>,
    pub(crate) finalize: Option<FinalizeFn<V>>,
}

impl<V> ParseCallbacks<V> {
    pub(crate) fn empty() -> Self {
        Self {
            init: None,
            is_necessary: None,
            finalize: None,
        }
    }

    /// Whether an `init` hook is set
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    /// Whether an `is_necessary` filter is set
    pub fn has_filter(&self) -> bool {
        self.is_necessary.is_some()
    }

    /// Whether a `finalize` hook is set
    pub fn has_finalize(&self) -> bool {
        self.finalize.is_some()
    }
}

impl<V> Clone for ParseCallbacks<V> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            is_necessary: self.is_necessary.clone(),
            finalize: self.finalize.clone(),
        }
    }
}

impl<V> fmt::Debug for ParseCallbacks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseCallbacks")
            .field("init", &self.has_init())
            .field("is_necessary", &self.has_filter())
            .field("finalize", &self.has_finalize())
            .finish()
    }
}

/// A grammar node with its metadata
pub struct GrammarNode<V> {
    pub(crate) kind: NodeKind,
    pub(crate) label: Option<Rc<str>>,
    pub(crate) error_message: Option<String>,
    pub(crate) scope: ScopeKind,
    pub(crate) commit: bool,
    /// Addressed by reference; composition never flattens it
    pub(crate) pinned: bool,
    pub(crate) reduce: Option<ReduceFn<V>>,
    pub(crate) parse: Option<ParseCallbacks<V>>,
}

impl<V> GrammarNode<V> {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            label: None,
            error_message: None,
            scope: ScopeKind::Default,
            commit: false,
            pinned: false,
            reduce: None,
            parse: None,
        }
    }

    pub(crate) fn labeled(kind: NodeKind, label: impl Into<String>) -> Self {
        let mut node = Self::new(kind);
        let label: String = label.into();
        node.label = Some(Rc::from(label));
        node
    }

    /// Structural kind
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Label, if any
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Custom error message, if any
    #[inline]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Declared scope tag
    #[inline]
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// Whether the node is committed (cut)
    #[inline]
    pub fn is_commit(&self) -> bool {
        self.commit
    }

    /// Whether the node is a placeholder or append target
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Whether a reduce callback is set
    #[inline]
    pub fn has_reduce(&self) -> bool {
        self.reduce.is_some()
    }

    /// Parse callbacks, if any
    #[inline]
    pub fn parse_callbacks(&self) -> Option<&ParseCallbacks<V>> {
        self.parse.as_ref()
    }

    /// Whether the node may be merged into a same-kind composite
    pub(crate) fn is_plain(&self) -> bool {
        !self.pinned
            && !self.commit
            && self.reduce.is_none()
            && self.parse.is_none()
            && self.error_message.is_none()
            && matches!(self.scope, ScopeKind::Default | ScopeKind::Inherited)
    }

    pub(crate) fn callbacks_mut(&mut self) -> &mut ParseCallbacks<V> {
        self.parse.get_or_insert_with(ParseCallbacks::empty)
    }
}

impl<V> Clone for GrammarNode<V> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            label: self.label.clone(),
            error_message: self.error_message.clone(),
            scope: self.scope,
            commit: self.commit,
            pinned: self.pinned,
            reduce: self.reduce.clone(),
            parse: self.parse.clone(),
        }
    }
}

impl<V> fmt::Debug for GrammarNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarNode")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("error_message", &self.error_message)
            .field("scope", &self.scope)
            .field("commit", &self.commit)
            .field("pinned", &self.pinned)
            .field("reduce", &self.reduce.is_some())
            .field("parse", &self.parse)
            .finish()
    }
}
