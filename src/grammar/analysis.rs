//! Grammar analysis
//!
//! Static facts about nodes, computed once per compile run and never written
//! back into the grammar:
//!
//! - **generic**: no reduce callback is reachable from the node
//! - **opaque**: a reduce or parse callback is reachable from the node; such
//!   nodes always get their own scope
//! - **can be empty**: the node can succeed without consuming input
//!
//! All traversals track visited nodes, so self-referential grammars terminate.

use super::node::{NodeId, NodeKind};
use super::Grammar;
use ahash::AHashSet;

/// Per-node reachability facts
#[derive(Debug, Clone)]
pub struct GrammarAnalysis {
    generic: Vec<bool>,
    opaque: Vec<bool>,
    nullable: Vec<bool>,
}

impl GrammarAnalysis {
    /// Analyze every node of `grammar`
    pub fn new<V>(grammar: &Grammar<V>) -> Self {
        let parents = reverse_edges(grammar);

        let reducing = grammar
            .iter()
            .filter(|(_, node)| node.reduce.is_some())
            .map(|(id, _)| id);
        let generic = reaches(&parents, reducing)
            .into_iter()
            .map(|reaches_reduce| !reaches_reduce)
            .collect();

        let hooked = grammar
            .iter()
            .filter(|(_, node)| node.reduce.is_some() || node.parse.is_some())
            .map(|(id, _)| id);
        let opaque = reaches(&parents, hooked);

        Self {
            generic,
            opaque,
            nullable: nullable_fixpoint(grammar),
        }
    }

    /// No reduce callback is reachable from `id`
    #[inline]
    pub fn is_generic(&self, id: NodeId) -> bool {
        self.generic.get(id.index()).copied().unwrap_or(true)
    }

    /// A reduce or parse callback is reachable from `id`
    #[inline]
    pub fn is_opaque(&self, id: NodeId) -> bool {
        self.opaque.get(id.index()).copied().unwrap_or(false)
    }

    /// `id` can match without consuming input
    #[inline]
    pub fn can_be_empty(&self, id: NodeId) -> bool {
        self.nullable.get(id.index()).copied().unwrap_or(false)
    }
}

/// Forward check used while composing, before a full analysis exists
pub(crate) fn is_generic<V>(grammar: &Grammar<V>, root: NodeId) -> bool {
    let mut visited = AHashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = grammar.get(id) else {
            continue;
        };
        if node.reduce.is_some() {
            return false;
        }
        stack.extend(node.kind.children().iter().copied());
    }
    true
}

fn reverse_edges<V>(grammar: &Grammar<V>) -> Vec<Vec<NodeId>> {
    let mut parents = vec![Vec::new(); grammar.len()];
    for (id, node) in grammar.iter() {
        for &child in node.kind.children() {
            if let Some(list) = parents.get_mut(child.index()) {
                list.push(id);
            }
        }
    }
    parents
}

/// Mark every node from which one of `seeds` is reachable
fn reaches(parents: &[Vec<NodeId>], seeds: impl Iterator<Item = NodeId>) -> Vec<bool> {
    let mut marked = vec![false; parents.len()];
    let mut worklist: Vec<NodeId> = Vec::new();
    for seed in seeds {
        if !marked[seed.index()] {
            marked[seed.index()] = true;
            worklist.push(seed);
        }
    }
    while let Some(id) = worklist.pop() {
        for &parent in &parents[id.index()] {
            if !marked[parent.index()] {
                marked[parent.index()] = true;
                worklist.push(parent);
            }
        }
    }
    marked
}

/// Least fixpoint of the structural "can match empty" rules
///
/// Nodes on a cycle that never reaches a nullable base case stay `false`.
fn nullable_fixpoint<V>(grammar: &Grammar<V>) -> Vec<bool> {
    let mut nullable = vec![false; grammar.len()];
    let get = |nullable: &[bool], id: NodeId| nullable.get(id.index()).copied().unwrap_or(false);

    let mut changed = true;
    while changed {
        changed = false;
        for (id, node) in grammar.iter() {
            if nullable[id.index()] {
                continue;
            }
            let value = match &node.kind {
                NodeKind::Optional(_) | NodeKind::Exclude { .. } => true,
                NodeKind::Repeat { min, .. } => *min == 0,
                NodeKind::Sequence(children) | NodeKind::Permutation(children) => {
                    children.iter().all(|&c| get(&nullable, c))
                }
                NodeKind::Choice(children) => children.iter().any(|&c| get(&nullable, c)),
                NodeKind::Char(_)
                | NodeKind::Range { .. }
                | NodeKind::Any { .. }
                | NodeKind::EndMarker => false,
            };
            if value {
                nullable[id.index()] = true;
                changed = true;
            }
        }
    }
    nullable
}
