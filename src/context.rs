//! Variables and callback context
//!
//! Every scope owns a [`Variables`] map, and the run owns one more for
//! globals. Callbacks reach both through a [`ScopeContext`] positioned on the
//! scope that encloses the element being processed.

use crate::syntax::{SyntaxId, SyntaxRef, SyntaxTree};
use hashbrown::HashMap;

/// Named values owned by a scope or by the run
#[derive(Debug, Clone, PartialEq)]
pub struct Variables<V> {
    map: HashMap<String, V>,
}

impl<V> Default for Variables<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Variables<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Look up a variable
    #[inline]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.map.get(name)
    }

    /// Look up a variable mutably
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.map.get_mut(name)
    }

    /// Set a variable, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.map.insert(name.into(), value)
    }

    /// Get a variable, inserting the result of `init` first if it is missing
    pub fn get_or_insert_with(&mut self, name: &str, init: impl FnOnce() -> V) -> &mut V {
        self.map.entry(name.to_owned()).or_insert_with(init)
    }

    /// Remove a variable
    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.map.remove(name)
    }

    /// Whether a variable is set
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Number of variables
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no variable is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove every variable
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<V> FromIterator<(String, V)> for Variables<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Access to the syntax tree and variables from inside a callback
pub struct ScopeContext<'r, V> {
    tree: &'r mut SyntaxTree<V>,
    globals: &'r mut Variables<V>,
    scope: SyntaxId,
}

impl<'r, V> ScopeContext<'r, V> {
    pub(crate) fn new(
        tree: &'r mut SyntaxTree<V>,
        globals: &'r mut Variables<V>,
        scope: SyntaxId,
    ) -> Self {
        Self {
            tree,
            globals,
            scope,
        }
    }

    /// The scope this context is positioned on
    #[inline]
    pub fn scope(&self) -> SyntaxId {
        self.scope
    }

    /// Label of the current scope
    pub fn label(&self) -> Option<&str> {
        self.tree.node(self.scope).label()
    }

    /// Locals of the current scope
    pub fn locals(&self) -> &Variables<V> {
        &self.tree.node(self.scope).locals
    }

    /// Locals of the current scope, mutably
    pub fn locals_mut(&mut self) -> &mut Variables<V> {
        &mut self.tree.node_mut(self.scope).locals
    }

    /// Locals of any scope
    pub fn locals_of(&self, scope: SyntaxId) -> &Variables<V> {
        &self.tree.node(scope).locals
    }

    /// Locals of any scope, mutably
    pub fn locals_of_mut(&mut self, scope: SyntaxId) -> &mut Variables<V> {
        &mut self.tree.node_mut(scope).locals
    }

    /// Run-wide variables
    pub fn globals(&self) -> &Variables<V> {
        &*self.globals
    }

    /// Run-wide variables, mutably
    pub fn globals_mut(&mut self) -> &mut Variables<V> {
        &mut *self.globals
    }

    /// Enclosing scopes of the current scope, innermost first
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxId> + '_ {
        self.tree.ancestors(self.scope)
    }

    /// Nearest scope (the current one included) with the given label
    pub fn find_scope(&self, label: &str) -> Option<SyntaxId> {
        std::iter::once(self.scope)
            .chain(self.tree.ancestors(self.scope))
            .find(|&s| self.tree.node(s).label() == Some(label))
    }

    /// Resolve a name through the scope chain, then the globals
    pub fn lookup(&self, name: &str) -> Option<&V> {
        std::iter::once(self.scope)
            .chain(self.tree.ancestors(self.scope))
            .find_map(|s| self.tree.node(s).locals.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// View of a syntax node
    pub fn syntax(&self, id: SyntaxId) -> SyntaxRef<'_, V> {
        self.tree.view(id)
    }

    /// Text of a syntax node
    pub fn text(&self, id: SyntaxId) -> String {
        self.tree.text(id)
    }

    /// The whole tree
    pub fn tree(&self) -> &SyntaxTree<V> {
        &*self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;

    #[test]
    fn test_variables_basic_ops() {
        let mut vars: Variables<i32> = Variables::new();
        assert!(vars.is_empty());
        assert_eq!(vars.set("x", 1), None);
        assert_eq!(vars.set("x", 2), Some(1));
        *vars.get_or_insert_with("y", || 10) += 1;
        assert_eq!(vars.get("y"), Some(&11));
        assert!(vars.contains("x"));
        assert_eq!(vars.remove("x"), Some(2));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_lookup_walks_scope_chain() {
        let mut tree: SyntaxTree<i32> = SyntaxTree::new();
        let inner = tree.push(SyntaxKind::Scope(vec![]), None, Some("inner".into()), (0, 0));
        let outer = tree.push(SyntaxKind::Scope(vec![inner]), None, Some("outer".into()), (0, 0));
        tree.adopt(outer, &[inner]);
        let mut globals: Variables<i32> = Variables::new();
        globals.set("g", 7);

        let mut ctx = ScopeContext::new(&mut tree, &mut globals, outer);
        ctx.locals_mut().set("depth", 1);

        let ctx = ScopeContext::new(ctx.tree, ctx.globals, inner);
        assert_eq!(ctx.lookup("depth"), Some(&1));
        assert_eq!(ctx.lookup("g"), Some(&7));
        assert_eq!(ctx.lookup("missing"), None);
        assert_eq!(ctx.find_scope("outer"), Some(outer));
        assert_eq!(ctx.label(), Some("inner"));
    }

    #[test]
    fn test_locals_shadow_globals() {
        let mut tree: SyntaxTree<i32> = SyntaxTree::new();
        let scope = tree.push(SyntaxKind::Scope(vec![]), None, None, (0, 0));
        let mut globals: Variables<i32> = Variables::new();
        globals.set("x", 1);
        let mut ctx = ScopeContext::new(&mut tree, &mut globals, scope);
        ctx.locals_mut().set("x", 2);
        assert_eq!(ctx.lookup("x"), Some(&2));
        ctx.globals_mut().set("x", 3);
        assert_eq!(ctx.globals().get("x"), Some(&3));
    }
}
