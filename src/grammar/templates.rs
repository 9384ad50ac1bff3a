//! Frequently used grammar fragments
//!
//! Each function adds fresh nodes to the grammar and returns the fragment's
//! root. Inner pieces use the `Parent` scope so the fragment is seen as one
//! unit by whatever encloses it.

use super::node::{NodeId, ScopeKind};
use super::Grammar;

fn parent_range<V>(g: &mut Grammar<V>, lo: char, hi: char) -> NodeId {
    let id = g.range(lo, hi);
    g.node_mut(id).scope(ScopeKind::Parent);
    id
}

fn parent_char<V>(g: &mut Grammar<V>, c: char) -> NodeId {
    let id = g.char(c);
    g.node_mut(id).scope(ScopeKind::Parent);
    id
}

/// A single space
pub fn space<V>(g: &mut Grammar<V>) -> NodeId {
    g.char(' ')
}

/// `a` to `z`
pub fn lowercase<V>(g: &mut Grammar<V>) -> NodeId {
    g.range('a', 'z')
}

/// `A` to `Z`
pub fn uppercase<V>(g: &mut Grammar<V>) -> NodeId {
    g.range('A', 'Z')
}

/// `0` to `9`
pub fn digit<V>(g: &mut Grammar<V>) -> NodeId {
    g.range('0', '9')
}

/// One ASCII letter
pub fn alpha<V>(g: &mut Grammar<V>) -> NodeId {
    let lower = parent_range(g, 'a', 'z');
    let upper = parent_range(g, 'A', 'Z');
    g.choice([lower, upper])
}

/// One ASCII letter or digit
pub fn alphanumeric<V>(g: &mut Grammar<V>) -> NodeId {
    let lower = parent_range(g, 'a', 'z');
    let upper = parent_range(g, 'A', 'Z');
    let digits = parent_range(g, '0', '9');
    g.choice([lower, upper, digits])
}

/// One of space, tab, carriage return or line feed
pub fn whitespace<V>(g: &mut Grammar<V>) -> NodeId {
    let chars = [' ', '\t', '\r', '\n'].map(|c| parent_char(g, c));
    g.choice(chars)
}

/// A letter or underscore followed by any number of letters, digits or underscores
pub fn identifier<V>(g: &mut Grammar<V>) -> NodeId {
    let lower = parent_range(g, 'a', 'z');
    let upper = parent_range(g, 'A', 'Z');
    let digits = parent_range(g, '0', '9');
    let underscore = parent_char(g, '_');

    let first = g.choice([lower, upper, underscore]);
    g.node_mut(first).scope(ScopeKind::Parent);
    let next = g.choice([lower, upper, digits, underscore]);
    g.node_mut(next).scope(ScopeKind::Parent);
    let rest = g.repeat(next);
    g.node_mut(rest).scope(ScopeKind::Parent);

    g.seq([first, rest])
}

/// Negative lookahead on letters, digits and underscore: a word boundary
pub fn separator<V>(g: &mut Grammar<V>) -> NodeId {
    let lower = parent_range(g, 'a', 'z');
    let upper = parent_range(g, 'A', 'Z');
    let digits = parent_range(g, '0', '9');
    let underscore = parent_char(g, '_');
    let word = g.choice([lower, upper, digits, underscore]);
    g.exclude(word)
}
