//! Scope resolution
//!
//! After a node's combinator succeeded, its raw match is turned into what the
//! enclosing node sees. The node's scope tag, whether callbacks are reachable
//! from it and the compiler's policies decide between four outcomes:
//!
//! | effective scope | result                                              |
//! |-----------------|-----------------------------------------------------|
//! | `Force`         | a scope unit adopting the retained children          |
//! | `Parent`        | the raw match, unchanged                             |
//! | `Empty`         | an empty placeholder unit                            |
//! | `Default`       | a text, list or empty unit per the aggregation policy |
//!
//! An `Ignored` raw match (an unmatched optional, a zero-count repeat) stays
//! `Ignored` under every scope.

use super::{MatchError, MatchResult, Matched, Run};
use crate::config::Aggregation;
use crate::error::{CompileError, ConfigError};
use crate::grammar::{NodeId, ScopeKind};
use crate::syntax::{SyntaxId, SyntaxKind};
use crate::value::CompiledValue;

/// Scope a node actually gets
///
/// `opaque` tells whether a reduce or parse callback is reachable from the
/// node, `ambient` is the compiler's policy for `Default` tags.
pub(crate) fn effective_scope(tag: ScopeKind, opaque: bool, ambient: ScopeKind) -> ScopeKind {
    match tag {
        ScopeKind::Default | ScopeKind::Inherited if opaque => ScopeKind::Force,
        ScopeKind::Default => match ambient {
            ScopeKind::Default | ScopeKind::Inherited => ScopeKind::Default,
            other => other,
        },
        ScopeKind::Inherited => ScopeKind::Default,
        explicit => explicit,
    }
}

impl<V: CompiledValue> Run<'_, V> {
    pub(crate) fn scope_of(&self, id: NodeId) -> ScopeKind {
        effective_scope(
            self.grammar.node(id).scope(),
            self.analysis.is_opaque(id),
            self.config.default_scope,
        )
    }

    /// Match the root and wrap its result in the synthetic base scope
    pub(crate) fn match_root(&mut self, root: NodeId) -> Result<SyntaxId, CompileError> {
        if self.scope_of(root) == ScopeKind::Parent {
            return Err(ConfigError::ParentRoot { node: root }.into());
        }
        let start = self.cursor.position();
        let unit = match self.match_node(root) {
            Ok(unit) => unit,
            Err(MatchError::Mismatch(failure)) => return Err(self.syntax_error(failure).into()),
            Err(MatchError::Fatal(err)) => return Err(err),
        };
        let items = unit.into_items();
        let end = self.cursor.position();
        let base = self
            .tree
            .push(SyntaxKind::Scope(items.clone()), None, None, (start, end));
        self.tree.adopt(base, &items);
        self.tree.set_root(base);
        log_debug!(
            "matched {} bytes into {} syntax nodes",
            end - start,
            self.tree.len()
        );
        Ok(base)
    }

    /// Turn the raw match of `id` into what its parent receives
    ///
    /// `mark` is the tree length before the attempt; content that does not
    /// survive resolution is truncated back to it.
    pub(crate) fn resolve(
        &mut self,
        id: NodeId,
        raw: Matched,
        start: usize,
        mark: usize,
    ) -> MatchResult {
        let grammar = self.grammar;
        let node = grammar.node(id);
        let end = self.cursor.position();

        match self.scope_of(id) {
            ScopeKind::Parent => Ok(raw),
            // nothing matched: no scope, no init, no reduce
            ScopeKind::Force | ScopeKind::Empty if raw.is_ignored() => Ok(Matched::Ignored),
            ScopeKind::Force => {
                self.run_init(id, start)?;
                let items = self.retained(id, raw);
                let scope = self.tree.push(
                    SyntaxKind::Scope(items.clone()),
                    Some(id),
                    node.label.clone(),
                    (start, end),
                );
                self.tree.adopt(scope, &items);
                Ok(Matched::Unit(scope))
            }
            ScopeKind::Empty => {
                self.run_init(id, start)?;
                self.tree.truncate(mark);
                let empty = self
                    .tree
                    .push(SyntaxKind::Empty, Some(id), node.label.clone(), (start, end));
                Ok(Matched::Unit(empty))
            }
            ScopeKind::Default | ScopeKind::Inherited => {
                Ok(self.aggregate(id, raw, (start, end), mark))
            }
        }
    }

    fn aggregate(
        &mut self,
        id: NodeId,
        raw: Matched,
        span: (usize, usize),
        mark: usize,
    ) -> Matched {
        let label = self.grammar.node(id).label.clone();
        match (self.config.aggregation, raw) {
            (_, Matched::Ignored) => Matched::Ignored,
            // leaves already are their own unit
            (_, Matched::Unit(unit)) if self.tree.node(unit).origin() == Some(id) => {
                Matched::Unit(unit)
            }
            (Aggregation::Ignore, _) => {
                self.tree.truncate(mark);
                Matched::Unit(self.tree.push(SyntaxKind::Empty, Some(id), label, span))
            }
            (Aggregation::Text, raw) => {
                let items = self.retained(id, raw);
                let mut text = String::new();
                for &item in &items {
                    self.tree.write_text(item, &mut text);
                }
                self.tree.truncate(mark);
                Matched::Unit(self.tree.push(SyntaxKind::Text(text), Some(id), label, span))
            }
            (Aggregation::List, raw) => {
                let items = self.retained(id, raw);
                Matched::Unit(self.tree.push(SyntaxKind::List(items), Some(id), label, span))
            }
        }
    }

    /// Children of `id`'s match that pass its `is_necessary` filter
    fn retained(&self, id: NodeId, raw: Matched) -> Vec<SyntaxId> {
        let items = raw.into_items();
        let grammar = self.grammar;
        match grammar
            .node(id)
            .parse_callbacks()
            .and_then(|p| p.is_necessary.as_ref())
        {
            Some(filter) => items
                .into_iter()
                .filter(|&item| filter(&self.tree.view(item)))
                .collect(),
            None => items,
        }
    }

    /// Run the node's `init` once per label and run
    fn run_init(&mut self, id: NodeId, offset: usize) -> Result<(), MatchError> {
        let grammar = self.grammar;
        let node = grammar.node(id);
        let Some(init) = node.parse_callbacks().and_then(|p| p.init.as_ref()) else {
            return Ok(());
        };
        let Some(label) = node.label() else {
            return Err(ConfigError::UnlabeledInit { node: id }.into());
        };
        if !self.initialized.insert(label.to_owned()) {
            return Ok(());
        }
        log_debug!("init '{}'", label);
        init(&mut self.globals).map_err(|e| MatchError::Fatal(self.callback_failure(id, e, offset)))
    }
}
