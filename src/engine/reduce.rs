//! Finalize and reduction passes
//!
//! Both passes walk the finished syntax tree from the base scope. Callbacks
//! get a [`ScopeContext`] positioned on the scope that encloses the element
//! being processed, so siblings share their parent's locals.

use super::Run;
use crate::config::Aggregation;
use crate::context::ScopeContext;
use crate::error::{recover_engine_error, CallbackError, CompileError};
use crate::grammar::NodeId;
use crate::syntax::{SyntaxId, SyntaxKind};
use crate::value::CompiledValue;

impl<V: CompiledValue> Run<'_, V> {
    /// Run every `finalize` hook, children before their scope
    pub(crate) fn finalize(&mut self, id: SyntaxId) -> Result<(), CompileError> {
        let children = self.tree.children(id).to_vec();
        for &child in &children {
            self.finalize(child)?;
        }

        let node = self.tree.node(id);
        if !matches!(node.kind(), SyntaxKind::Scope(_) | SyntaxKind::Empty) {
            return Ok(());
        }
        let Some(origin) = node.origin() else {
            return Ok(());
        };
        let offset = node.span().0;
        let enclosing = node.parent().unwrap_or(id);

        let grammar = self.grammar;
        let Some(hook) = grammar
            .node(origin)
            .parse_callbacks()
            .and_then(|p| p.finalize.as_ref())
        else {
            return Ok(());
        };
        let mut ctx = ScopeContext::new(&mut self.tree, &mut self.globals, enclosing);
        hook(&mut ctx, &children).map_err(|e| self.callback_failure(origin, e, offset))
    }

    /// Fold the subtree at `id` into a value
    pub(crate) fn reduce(&mut self, id: SyntaxId) -> Result<V, CompileError> {
        let node = self.tree.node(id);
        let children = match node.kind() {
            SyntaxKind::Text(text) => return Ok(V::from_text(text)),
            SyntaxKind::End => return Ok(V::empty()),
            SyntaxKind::List(items) => {
                let items = items.clone();
                return Ok(V::from_list(self.reduce_all(&items)?));
            }
            SyntaxKind::Scope(items) => items.clone(),
            SyntaxKind::Empty => Vec::new(),
        };
        let is_empty = matches!(node.kind(), SyntaxKind::Empty);
        let enclosing = node.parent().unwrap_or(id);

        let values = self.reduce_all(&children)?;
        let Some(origin) = self.tree.node(id).origin() else {
            // base scope
            return Ok(match values.len() {
                1 => values.into_iter().next().unwrap_or_else(V::empty),
                _ => self.default_aggregate(values),
            });
        };

        let grammar = self.grammar;
        match grammar.node(origin).reduce.as_ref() {
            Some(reduce) => {
                let mut ctx = ScopeContext::new(&mut self.tree, &mut self.globals, enclosing);
                reduce(&mut ctx, values).map_err(|e| self.reduce_failure(origin, e))
            }
            None if is_empty => Ok(V::empty()),
            None => Ok(self.default_aggregate(values)),
        }
    }

    fn reduce_all(&mut self, items: &[SyntaxId]) -> Result<Vec<V>, CompileError> {
        items.iter().map(|&item| self.reduce(item)).collect()
    }

    fn default_aggregate(&self, values: Vec<V>) -> V {
        match self.config.aggregation {
            Aggregation::Text => V::concat(values),
            Aggregation::List => V::from_list(values),
            Aggregation::Ignore => V::empty(),
        }
    }

    fn reduce_failure(&self, id: NodeId, err: CallbackError) -> CompileError {
        match recover_engine_error(err) {
            Ok(engine) => engine,
            Err(other) => CompileError::Compile {
                message: other.to_string(),
                label: self.grammar.node(id).label().map(str::to_owned),
                source: Some(other),
            },
        }
    }
}
