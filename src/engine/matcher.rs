//! Grammar matching
//!
//! Every node match follows the same protocol: remember the cursor and the
//! tree length, run the node's combinator, resolve the raw result through the
//! node's effective scope. If anything fails, the cursor and the tree are
//! restored to where the attempt started, so a failed attempt leaves no
//! trace besides the recorded diagnostic.

use super::{MatchError, MatchResult, Matched, Run};
use crate::error::{MatchFailure, ParseError, ParseErrorKind};
use crate::grammar::{NodeId, NodeKind, END_LABEL};
use crate::syntax::{SyntaxId, SyntaxKind};
use crate::value::CompiledValue;
use std::rc::Rc;

impl<V: CompiledValue> Run<'_, V> {
    /// Match `id` at the cursor
    pub(crate) fn match_node(&mut self, id: NodeId) -> MatchResult {
        self.enter(id)?;
        let start = self.cursor.position();
        let mark = self.tree.len();

        let result = self
            .match_kind(id)
            .and_then(|raw| self.resolve(id, raw, start, mark));

        self.depth -= 1;
        if result.is_err() {
            self.cursor.set_position(start);
            self.tree.truncate(mark);
        }
        result
    }

    fn enter(&mut self, id: NodeId) -> Result<(), MatchError> {
        let limit = self.config.max_recursion_depth;
        if limit > 0 && self.depth >= limit {
            let err = ParseError::new(
                ParseErrorKind::RecursionLimit,
                format!("nesting exceeds {} levels", limit),
                self.cursor.position(),
            )
            .with_node(id, self.grammar.node(id).label());
            return Err(err.into());
        }
        self.depth += 1;
        Ok(())
    }

    fn match_kind(&mut self, id: NodeId) -> MatchResult {
        let grammar = self.grammar;
        match grammar.node(id).kind() {
            NodeKind::Char(expected) => {
                let expected = *expected;
                self.match_char(id, |c| c == expected)
            }
            NodeKind::Range { lo, hi } => {
                let (lo, hi) = (*lo, *hi);
                self.match_char(id, |c| lo <= c && c <= hi)
            }
            NodeKind::Any { or_end } => self.match_any(id, *or_end),
            NodeKind::EndMarker => self.match_end(id),
            NodeKind::Sequence(children) => self.match_sequence(id, children),
            NodeKind::Choice(children) => self.match_choice(id, children),
            NodeKind::Optional(child) => self.match_optional(*child),
            NodeKind::Repeat { child, min, max } => self.match_repeat(id, *child, *min, *max),
            NodeKind::Exclude { child, serious } => self.match_exclude(id, *child, *serious),
            NodeKind::Permutation(children) => self.match_permutation(id, children),
        }
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    fn match_char(&mut self, id: NodeId, accept: impl Fn(char) -> bool) -> MatchResult {
        let start = self.cursor.position();
        match self.decoder.next_char(&mut *self.cursor)? {
            Some(c) if accept(c) => Ok(Matched::Unit(self.leaf(id, c, start))),
            found => Err(self.mismatch(id, start, found)),
        }
    }

    fn match_any(&mut self, id: NodeId, or_end: bool) -> MatchResult {
        let start = self.cursor.position();
        match self.decoder.next_char(&mut *self.cursor)? {
            Some(c) => Ok(Matched::Unit(self.leaf(id, c, start))),
            None if or_end => {
                let end = self.tree.push(
                    SyntaxKind::End,
                    Some(id),
                    Some(Rc::from(END_LABEL)),
                    (start, start),
                );
                Ok(Matched::Unit(end))
            }
            None => Err(self.mismatch(id, start, None)),
        }
    }

    fn match_end(&mut self, id: NodeId) -> MatchResult {
        let start = self.cursor.position();
        let next = self.decoder.next_char(&mut *self.cursor)?;
        self.cursor.set_position(start);
        match next {
            None => Ok(Matched::Ignored),
            found => Err(self.mismatch(id, start, found)),
        }
    }

    fn leaf(&mut self, id: NodeId, c: char, start: usize) -> SyntaxId {
        let end = self.cursor.position();
        let label = self.grammar.node(id).label.clone();
        self.tree
            .push(SyntaxKind::Text(c.to_string()), Some(id), label, (start, end))
    }

    // ========================================================================
    // Composites
    // ========================================================================

    fn match_sequence(&mut self, id: NodeId, children: &[NodeId]) -> MatchResult {
        let start = self.cursor.position();
        let committed = self.grammar.node(id).is_commit();
        let mut items = Vec::new();
        let mut progressed = false;

        for &child in children {
            match self.match_node(child) {
                Ok(unit) => {
                    progressed |= !unit.is_ignored();
                    unit.append_to(&mut items);
                }
                Err(MatchError::Mismatch(failure)) => {
                    if committed && progressed {
                        return Err(self.commit_error(id, &failure.message, failure.offset));
                    }
                    return Err(self.composite_failure(id, start, failure));
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(Matched::from_items(items))
    }

    fn match_choice(&mut self, id: NodeId, children: &[NodeId]) -> MatchResult {
        let start = self.cursor.position();
        for &child in children {
            match self.match_node(child) {
                Ok(unit) => return Ok(unit),
                Err(MatchError::Mismatch(_)) => {}
                Err(fatal) => return Err(fatal),
            }
        }
        let found = self.found_at(start);
        Err(self.mismatch(id, start, found))
    }

    fn match_optional(&mut self, child: NodeId) -> MatchResult {
        match self.match_node(child) {
            Err(MatchError::Mismatch(_)) => Ok(Matched::Ignored),
            other => other,
        }
    }

    fn match_repeat(
        &mut self,
        id: NodeId,
        child: NodeId,
        min: usize,
        max: Option<usize>,
    ) -> MatchResult {
        let mut items = Vec::new();
        let mut count = 0usize;

        // No progress check: an unbounded repeat of a child that matches
        // without consuming never terminates.
        loop {
            match self.match_node(child) {
                Ok(unit) => {
                    count += 1;
                    unit.append_to(&mut items);
                }
                Err(MatchError::Mismatch(_)) => break,
                Err(fatal) => return Err(fatal),
            }
            if max.is_some_and(|max| count > max) {
                break;
            }
        }

        if count < min || max.is_some_and(|max| count > max) {
            let at = self.cursor.position();
            let found = self.found_at(at);
            let (message, custom) = match self.custom_message(id, found) {
                Some(message) => (message, true),
                None => (
                    format!(
                        "expected {} repetitions of {}, matched {}",
                        bounds_text(min, max),
                        self.describe(child),
                        count
                    ),
                    false,
                ),
            };
            return Err(self.fail(MatchFailure {
                node: id,
                offset: at,
                message,
                custom,
            }));
        }
        Ok(Matched::from_items(items))
    }

    fn match_exclude(&mut self, id: NodeId, child: NodeId, serious: bool) -> MatchResult {
        let start = self.cursor.position();
        let mark = self.tree.len();
        let saved = self.furthest.clone();

        let outcome = self.match_node(child);
        self.cursor.set_position(start);
        self.tree.truncate(mark);
        self.furthest = saved;

        match outcome {
            Ok(_) => {
                let found = self.found_at(start);
                if serious {
                    let message = self
                        .custom_message(id, found)
                        .unwrap_or_else(|| format!("{} is not allowed here", self.describe(child)));
                    let err = ParseError::new(ParseErrorKind::Serious, message, start)
                        .with_node(id, self.grammar.node(id).label());
                    Err(err.into())
                } else {
                    Err(self.mismatch(id, start, found))
                }
            }
            Err(MatchError::Mismatch(_)) => Ok(Matched::Ignored),
            Err(fatal) => Err(fatal),
        }
    }

    fn match_permutation(&mut self, id: NodeId, children: &[NodeId]) -> MatchResult {
        let mut done = vec![false; children.len()];
        let mut items = Vec::new();
        let mut matched_any = false;

        for _ in 0..children.len() {
            let mut progressed = false;
            for (slot, &child) in children.iter().enumerate() {
                if done[slot] {
                    continue;
                }
                let before = self.cursor.position();
                match self.match_node(child) {
                    Ok(unit) => {
                        if unit.is_ignored() && self.cursor.position() == before {
                            continue;
                        }
                        done[slot] = true;
                        matched_any = true;
                        progressed = true;
                        unit.append_to(&mut items);
                        break;
                    }
                    Err(MatchError::Mismatch(_)) => {}
                    Err(fatal) => return Err(fatal),
                }
            }
            if !progressed {
                break;
            }
        }

        let missing = children
            .iter()
            .zip(&done)
            .find(|&(&child, &finished)| !finished && !self.analysis.can_be_empty(child))
            .map(|(&child, _)| child);

        if let Some(missing) = missing {
            let at = self.cursor.position();
            let found = self.found_at(at);
            let message = self.custom_message(id, found).unwrap_or_else(|| {
                format!(
                    "expected {}, found {}",
                    self.describe(missing),
                    found_text(found)
                )
            });
            if matched_any && self.grammar.node(id).is_commit() {
                return Err(self.commit_error(id, &message, at));
            }
            let custom = self.grammar.node(id).error_message().is_some();
            return Err(self.fail(MatchFailure {
                node: id,
                offset: at,
                message,
                custom,
            }));
        }
        Ok(Matched::from_items(items))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Record that `id` did not match at `offset`
    fn mismatch(&mut self, id: NodeId, offset: usize, found: Option<char>) -> MatchError {
        let (message, custom) = match self.custom_message(id, found) {
            Some(message) => (message, true),
            None => (self.default_message(id, found), false),
        };
        self.fail(MatchFailure {
            node: id,
            offset,
            message,
            custom,
        })
    }

    /// A child of a sequence failed; the sequence's own message takes over if it has one
    fn composite_failure(&mut self, id: NodeId, start: usize, failure: MatchFailure) -> MatchError {
        if self.grammar.node(id).error_message().is_none() {
            return MatchError::Mismatch(failure);
        }
        let found = self.found_at(start);
        self.mismatch(id, start, found)
    }

    fn commit_error(&self, id: NodeId, message: &str, offset: usize) -> MatchError {
        let node = self.grammar.node(id);
        let message = format!("incomplete {}: {}", self.describe(id), message);
        ParseError::new(ParseErrorKind::Commit, message, offset)
            .with_node(id, node.label())
            .into()
    }

    /// The node's error message with `{}` replaced by the offending character
    fn custom_message(&self, id: NodeId, found: Option<char>) -> Option<String> {
        let template = self.grammar.node(id).error_message()?;
        let shown = match found {
            Some(c) => c.to_string(),
            None => "end of input".to_string(),
        };
        Some(template.replace("{}", &shown))
    }

    fn default_message(&self, id: NodeId, found: Option<char>) -> String {
        match self.grammar.node(id).kind() {
            NodeKind::EndMarker => format!("expected end of input, found {}", found_text(found)),
            NodeKind::Exclude { child, .. } => format!("unexpected {}", self.describe(*child)),
            _ => format!("expected {}, found {}", self.describe(id), found_text(found)),
        }
    }

    /// Short description: the label of a labelled composite, the notation otherwise
    fn describe(&self, id: NodeId) -> String {
        let node = self.grammar.node(id);
        match node.label() {
            Some(label) if !node.kind().is_leaf() => label.to_string(),
            _ => self.grammar.render(id, 1),
        }
    }

    /// Peek at the character at `offset` without moving the cursor
    fn found_at(&mut self, offset: usize) -> Option<char> {
        let saved = self.cursor.position();
        self.cursor.set_position(offset);
        let found = self.decoder.next_char(&mut *self.cursor).ok().flatten();
        self.cursor.set_position(saved);
        found
    }
}

fn found_text(found: Option<char>) -> String {
    match found {
        Some(c) => format!("'{}'", c.escape_default()),
        None => "end of input".to_string(),
    }
}

fn bounds_text(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CompilerConfig;
    use crate::context::Variables;
    use crate::decoder::{ByteDecoder, Utf8Decoder};
    use crate::engine::{MatchError, Matched, Run};
    use crate::error::{CompileError, ParseErrorKind};
    use crate::grammar::{Grammar, NodeId, ScopeKind};
    use crate::source::SliceCursor;

    fn run_match(
        g: &Grammar<String>,
        root: NodeId,
        input: &str,
    ) -> (Result<Matched, MatchError>, usize) {
        let config = CompilerConfig::default();
        let mut cursor = SliceCursor::new(input.as_bytes());
        let mut run = Run::new(g, &config, &Utf8Decoder, &mut cursor, Variables::new());
        let result = run.match_node(root);
        let pos = run.cursor.position();
        (result, pos)
    }

    fn matches(g: &Grammar<String>, root: NodeId, input: &str) -> Option<usize> {
        match run_match(g, root, input) {
            (Ok(_), pos) => Some(pos),
            _ => None,
        }
    }

    #[test]
    fn test_char_and_range() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let digit = g.range('0', '9');
        assert_eq!(matches(&g, a, "abc"), Some(1));
        assert_eq!(matches(&g, a, "b"), None);
        assert_eq!(matches(&g, digit, "7"), Some(1));
        assert_eq!(matches(&g, digit, ""), None);
    }

    #[test]
    fn test_failed_sequence_restores_cursor() {
        let mut g: Grammar<String> = Grammar::new();
        let ab = g.text("ab");
        let (result, pos) = run_match(&g, ab, "ax");
        assert!(matches!(result, Err(MatchError::Mismatch(_))));
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_choice_takes_first_match() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.text("a");
        let ab = g.text("ab");
        let choice = g.or(a, ab);
        assert_eq!(matches(&g, choice, "ab"), Some(1));
    }

    #[test]
    fn test_repeat_bounds() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let two_or_three = g.repeat_range(a, 2, 3).unwrap();
        assert_eq!(matches(&g, two_or_three, "a"), None);
        assert_eq!(matches(&g, two_or_three, "aa"), Some(2));
        assert_eq!(matches(&g, two_or_three, "aaa"), Some(3));
        // the fourth repetition exceeds the maximum
        assert_eq!(matches(&g, two_or_three, "aaaa"), None);
    }

    #[test]
    fn test_exclude_never_consumes() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let not_a = g.exclude(a);
        let (result, pos) = run_match(&g, not_a, "b");
        assert_eq!(result.ok(), Some(Matched::Ignored));
        assert_eq!(pos, 0);
        assert_eq!(matches(&g, not_a, "a"), None);
    }

    #[test]
    fn test_serious_exclude_is_fatal() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let not_a = g.exclude(a);
        g.node_mut(not_a).serious().unwrap();
        let b = g.char('b');
        let choice = g.or(not_a, b);
        match run_match(&g, choice, "a").0 {
            Err(MatchError::Fatal(CompileError::Parse(e))) => {
                assert_eq!(e.kind, ParseErrorKind::Serious)
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_commit_after_progress_is_fatal() {
        let mut g: Grammar<String> = Grammar::new();
        let kw = g.text("let");
        let x = g.char('x');
        let stmt = g.seq([kw, x]);
        g.node_mut(stmt).commit().unwrap();
        let other = g.text("map");
        let choice = g.or(stmt, other);

        // nothing matched yet: an ordinary mismatch, the choice moves on
        assert_eq!(matches(&g, choice, "map"), Some(3));
        // "let" matched, then 'y': fatal
        match run_match(&g, choice, "lety").0 {
            Err(MatchError::Fatal(CompileError::Parse(e))) => {
                assert_eq!(e.kind, ParseErrorKind::Commit)
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_permutation_any_order() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let b = g.char('b');
        let c = g.char('c');
        let perm = g.permutation([a, b, c]);
        assert_eq!(matches(&g, perm, "cab"), Some(3));
        assert_eq!(matches(&g, perm, "bca"), Some(3));
        assert_eq!(matches(&g, perm, "ab"), None);
        assert_eq!(matches(&g, perm, "aab"), None);
    }

    #[test]
    fn test_permutation_skips_nullable_children() {
        let mut g: Grammar<String> = Grammar::new();
        let a = g.char('a');
        let b = g.char('b');
        let opt_b = g.optional(b);
        let perm = g.permutation([a, opt_b]);
        assert_eq!(matches(&g, perm, "a"), Some(1));
        assert_eq!(matches(&g, perm, "ba"), Some(2));
    }

    #[test]
    fn test_end_marker_is_zero_width() {
        let mut g: Grammar<String> = Grammar::new();
        let end = g.end();
        let (result, pos) = run_match(&g, end, "");
        assert_eq!(result.ok(), Some(Matched::Ignored));
        assert_eq!(pos, 0);
        assert_eq!(matches(&g, end, "x"), None);
    }

    #[test]
    fn test_any_or_end_matches_at_eof() {
        let mut g: Grammar<String> = Grammar::new();
        let any = g.any();
        let any_or_end = g.any_or_end();
        assert_eq!(matches(&g, any, ""), None);
        assert_eq!(matches(&g, any_or_end, ""), Some(0));
        assert_eq!(matches(&g, any_or_end, "z"), Some(1));
    }

    #[test]
    fn test_recursion_limit() {
        let mut g: Grammar<String> = Grammar::new();
        let nested = g.empty_sequence();
        g.node_mut(nested).scope(ScopeKind::Parent);
        let open = g.char('(');
        let inner = g.optional(nested);
        g.append(nested, open).unwrap();
        g.append(nested, inner).unwrap();

        let config = CompilerConfig::default().with_max_recursion_depth(10);
        let input = "(".repeat(50);
        let mut cursor = SliceCursor::new(input.as_bytes());
        let mut run = Run::new(&g, &config, &ByteDecoder, &mut cursor, Variables::new());
        match run.match_node(nested) {
            Err(MatchError::Fatal(CompileError::Parse(e))) => {
                assert_eq!(e.kind, ParseErrorKind::RecursionLimit)
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_furthest_failure_wins() {
        let mut g: Grammar<String> = Grammar::new();
        let abc = g.text("abc");
        let ax = g.text("ax");
        let choice = g.or(abc, ax);
        let config = CompilerConfig::default();
        let mut cursor = SliceCursor::new(b"abd");
        let mut run = Run::new(&g, &config, &ByteDecoder, &mut cursor, Variables::new());
        let failure = match run.match_node(choice) {
            Err(MatchError::Mismatch(f)) => f,
            other => panic!("unexpected: {:?}", other),
        };
        let err = run.syntax_error(failure);
        assert_eq!(err.offset, 2);
        assert_eq!(err.message, "expected 'c', found 'd'");
    }

    #[test]
    fn test_custom_message_replaces_placeholder() {
        let mut g: Grammar<String> = Grammar::new();
        let digit = g.range('0', '9');
        g.node_mut(digit).error_message("digit expected, got {}");
        match run_match(&g, digit, "x").0 {
            Err(MatchError::Mismatch(f)) => {
                assert_eq!(f.message, "digit expected, got x");
                assert!(f.custom);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
