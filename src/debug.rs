//! Developer tools
//!
//! - [`TreePrinter`] dumps a syntax tree, one node per line
//! - [`GrammarVisualizer`] renders the node arena as Graphviz DOT or Mermaid,
//!   or as a JSON snapshot of node shapes

use crate::grammar::{Grammar, NodeId, NodeKind, ScopeKind};
use crate::syntax::{SyntaxId, SyntaxKind, SyntaxTree};
use serde::Serialize;
use std::fmt::Write;

/// Syntax tree pretty printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Print the tree from its base scope; empty if matching did not complete
    pub fn print<V>(&self, tree: &SyntaxTree<V>) -> String {
        let mut output = String::new();
        if let Some(root) = tree.root() {
            self.print_node(tree, root, 0, &mut output);
        }
        output
    }

    /// Print the subtree at `id`
    pub fn print_from<V>(&self, tree: &SyntaxTree<V>, id: SyntaxId) -> String {
        let mut output = String::new();
        self.print_node(tree, id, 0, &mut output);
        output
    }

    fn print_node<V>(&self, tree: &SyntaxTree<V>, id: SyntaxId, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if self.max_depth.is_some_and(|max| depth > max) {
            let _ = writeln!(output, "{}...", indent);
            return;
        }

        let node = tree.node(id);
        let (start, end) = node.span();
        let label = node.label().map(|l| format!(" '{}'", l)).unwrap_or_default();
        match node.kind() {
            SyntaxKind::Text(text) => {
                let _ = writeln!(output, "{}{:?}{} @ {}..{}", indent, text, label, start, end);
            }
            SyntaxKind::Empty => {
                let _ = writeln!(output, "{}empty{} @ {}..{}", indent, label, start, end);
            }
            SyntaxKind::End => {
                let _ = writeln!(output, "{}end @ {}", indent, start);
            }
            SyntaxKind::List(items) | SyntaxKind::Scope(items) => {
                let name = if node.is_scope() { "scope" } else { "list" };
                let _ = writeln!(output, "{}{}{} @ {}..{}", indent, name, label, start, end);
                for &item in items {
                    self.print_node(tree, item, depth + 1, output);
                }
            }
        }
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable shape of one grammar node
#[derive(Debug, Serialize)]
struct NodeShape<'g> {
    id: NodeId,
    kind: &'g NodeKind,
    label: Option<&'g str>,
    scope: ScopeKind,
    commit: bool,
    pinned: bool,
    reduce: bool,
    init: bool,
    is_necessary: bool,
    finalize: bool,
}

/// Grammar visualizer
pub struct GrammarVisualizer<'a, V> {
    grammar: &'a Grammar<V>,
    root: Option<NodeId>,
}

impl<'a, V> GrammarVisualizer<'a, V> {
    /// Create a new grammar visualizer
    pub fn new(grammar: &'a Grammar<V>) -> Self {
        Self {
            grammar,
            root: None,
        }
    }

    /// Highlight `root` in the diagrams
    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    /// Generate a GraphViz DOT diagram
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph Grammar {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n");

        for (id, node) in self.grammar.iter() {
            let _ = writeln!(
                output,
                "  n{} [label=\"{}: {}\"]",
                id.index(),
                id.index(),
                dot_escape(&self.node_label(id))
            );
            for &child in node.kind().children() {
                let _ = writeln!(output, "  n{} -> n{}", id.index(), child.index());
            }
        }

        if let Some(root) = self.root {
            let _ = writeln!(
                output,
                "  n{} [style=filled, fillcolor=lightblue]",
                root.index()
            );
        }

        output.push_str("}\n");
        output
    }

    /// Generate a Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut output = String::from("graph TD\n");
        if let Some(root) = self.root {
            let _ = writeln!(output, "  root[Root] --> n{}", root.index());
        }
        for (id, node) in self.grammar.iter() {
            let label = self.node_label(id).replace('"', "#quot;");
            let _ = writeln!(output, "  n{}[\"{}: {}\"]", id.index(), id.index(), label);
            for &child in node.kind().children() {
                let _ = writeln!(output, "  n{} --> n{}", id.index(), child.index());
            }
        }
        output
    }

    /// Pretty JSON array describing every node
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let shapes: Vec<NodeShape<'_>> = self
            .grammar
            .iter()
            .map(|(id, node)| {
                let parse = node.parse_callbacks();
                NodeShape {
                    id,
                    kind: node.kind(),
                    label: node.label(),
                    scope: node.scope(),
                    commit: node.is_commit(),
                    pinned: node.is_pinned(),
                    reduce: node.has_reduce(),
                    init: parse.is_some_and(|p| p.has_init()),
                    is_necessary: parse.is_some_and(|p| p.has_filter()),
                    finalize: parse.is_some_and(|p| p.has_finalize()),
                }
            })
            .collect();
        serde_json::to_string_pretty(&shapes)
    }

    fn node_label(&self, id: NodeId) -> String {
        let node = self.grammar.node(id);
        let shape = match node.kind() {
            NodeKind::Sequence(c) => format!("seq({})", c.len()),
            NodeKind::Choice(c) => format!("choice({})", c.len()),
            NodeKind::Permutation(c) => format!("perm({})", c.len()),
            NodeKind::Optional(_) => "optional".to_string(),
            NodeKind::Repeat { min, max, .. } => match max {
                Some(max) => format!("repeat({}..{})", min, max),
                None => format!("repeat({}..)", min),
            },
            NodeKind::Exclude { serious: true, .. } => "exclude!".to_string(),
            NodeKind::Exclude { .. } => "exclude".to_string(),
            _ => self.grammar.render(id, 1),
        };
        match node.label() {
            Some(label) if !node.kind().is_leaf() => format!("{} {}", shape, label),
            _ => shape,
        }
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
