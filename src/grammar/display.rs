//! EBNF-style rendering of grammar nodes

use super::node::{NodeId, NodeKind};
use super::Grammar;
use std::fmt::Write;

/// Where a node is being rendered
#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    /// The requested node itself
    Top,
    /// Delimited by the parent (`[..]`, `{..}`, alternatives)
    Delimited,
    /// Juxtaposed with siblings
    Inline,
}

impl<V> Grammar<V> {
    /// Render `id` in EBNF-like notation, expanding `depth` levels of composites
    ///
    /// Labelled composites below the top level are shown by label; composites
    /// past the depth limit are shown as `...`.
    ///
    /// ```rust
    /// use ebnfkit::grammar::Grammar;
    ///
    /// let mut g: Grammar<String> = Grammar::new();
    /// let sign = g.or('+', '-');
    /// let digit = g.range('0', '9');
    /// let digits = g.repeat_min(digit, 1);
    /// let signed = g.optional(sign);
    /// let number = g.seq([signed, digits]);
    /// assert_eq!(g.render(number, 3), "[('+' | '-')] {[0-9]}1..");
    /// assert_eq!(g.render(number, 1), "... ...");
    /// ```
    pub fn render(&self, id: NodeId, depth: usize) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id, depth, Context::Top);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, depth: usize, ctx: Context) {
        let Some(node) = self.get(id) else {
            let _ = write!(out, "<unknown {}>", id);
            return;
        };

        match &node.kind {
            NodeKind::Char(c) => {
                let _ = write!(out, "'{}'", c.escape_default());
                return;
            }
            NodeKind::Range { lo, hi } => {
                let _ = write!(out, "[{}-{}]", lo.escape_default(), hi.escape_default());
                return;
            }
            NodeKind::Any { or_end: false } => {
                out.push_str("(*)");
                return;
            }
            NodeKind::Any { or_end: true } => {
                out.push_str("(*|[[END]])");
                return;
            }
            NodeKind::EndMarker => {
                out.push_str("[[END]]");
                return;
            }
            _ => {}
        }

        if ctx != Context::Top {
            if let Some(label) = node.label() {
                if self.is_literal(&node.kind, label) {
                    let _ = write!(out, "\"{}\"", label.escape_default());
                } else {
                    out.push_str(label);
                }
                return;
            }
        }
        if depth == 0 {
            out.push_str("...");
            return;
        }
        let next = depth - 1;

        match &node.kind {
            NodeKind::Sequence(children) => {
                let paren = ctx == Context::Inline && children.len() > 1;
                if paren {
                    out.push('(');
                }
                self.write_list(out, children, next, " ", Context::Inline);
                if paren {
                    out.push(')');
                }
            }
            NodeKind::Choice(children) => {
                out.push('(');
                self.write_list(out, children, next, " | ", Context::Delimited);
                out.push(')');
            }
            NodeKind::Permutation(children) => {
                out.push('<');
                self.write_list(out, children, next, ", ", Context::Delimited);
                out.push('>');
            }
            NodeKind::Optional(child) => {
                out.push('[');
                self.write_node(out, *child, next, Context::Delimited);
                out.push(']');
            }
            NodeKind::Repeat { child, min, max } => {
                out.push('{');
                self.write_node(out, *child, next, Context::Delimited);
                out.push('}');
                match (min, max) {
                    (0, None) => {}
                    (min, None) => {
                        let _ = write!(out, "{}..", min);
                    }
                    (min, Some(max)) => {
                        let _ = write!(out, "{}..{}", min, max);
                    }
                }
            }
            NodeKind::Exclude { child, .. } => {
                out.push('-');
                self.write_node(out, *child, next, Context::Inline);
            }
            NodeKind::Char(_)
            | NodeKind::Range { .. }
            | NodeKind::Any { .. }
            | NodeKind::EndMarker => {}
        }
    }

    fn write_list(
        &self,
        out: &mut String,
        items: &[NodeId],
        depth: usize,
        sep: &str,
        ctx: Context,
    ) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_node(out, item, depth, ctx);
        }
    }

    /// A sequence of chars labelled with its own text, as built by `text`
    fn is_literal(&self, kind: &NodeKind, label: &str) -> bool {
        let NodeKind::Sequence(children) = kind else {
            return false;
        };
        let mut chars = label.chars();
        children.iter().all(|&c| match self.get(c).map(|n| &n.kind) {
            Some(NodeKind::Char(ch)) => chars.next() == Some(*ch),
            _ => false,
        }) && chars.next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_leaves() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let nl = g.char('\n');
        let az = g.range('a', 'z');
        let any = g.any();
        let end = g.end();
        assert_eq!(g.render(a, 0), "'a'");
        assert_eq!(g.render(nl, 0), "'\\n'");
        assert_eq!(g.render(az, 0), "[a-z]");
        assert_eq!(g.render(any, 0), "(*)");
        assert_eq!(g.render(end, 0), "[[END]]");
    }

    #[test]
    fn test_render_composites() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let b = g.char('b');
        let choice = g.or(a, b);
        let perm = g.perm(a, b);
        let not_a = g.exclude(a);
        let bounded = g.repeat_range(b, 2, 3).unwrap();
        let all = g.seq([choice, perm, not_a, bounded]);
        assert_eq!(
            g.render(all, 3),
            "('a' | 'b') <'a', 'b'> -'a' {'b'}2..3"
        );
    }

    #[test]
    fn test_render_uses_labels_below_top() {
        let mut g: Grammar<String> = Grammar::new();
        let kw = g.text("null");
        let ident = g.repeat_min('x', 1);
        g.node_mut(ident).label("identifier");
        let stmt = g.or(kw, ident);
        assert_eq!(g.render(stmt, 5), "(\"null\" | identifier)");
        assert_eq!(g.render(kw, 5), "'n' 'u' 'l' 'l'");
    }

    #[test]
    fn test_render_nested_sequence_gets_parens() {
        let mut g: Grammar<String> = Grammar::new();
        let inner = g.empty_sequence();
        g.append(inner, 'a').unwrap();
        g.append(inner, 'b').unwrap();
        let c = g.char('c');
        let outer = g.seq([inner, c]);
        assert_eq!(g.render(outer, 2), "('a' 'b') 'c'");
    }

    #[test]
    fn test_render_recursion_is_bounded() {
        let mut g: Grammar<String> = Grammar::new();
        let rec = g.empty_sequence();
        let inner = g.repeat(rec);
        g.append(rec, '(').unwrap();
        g.append(rec, inner).unwrap();
        g.append(rec, ')').unwrap();
        assert_eq!(g.render(rec, 2), "'(' {...} ')'");
    }
}
