//! Compile run engine
//!
//! A [`Run`] holds the state of one compile run: the cursor, the syntax tree
//! under construction, the run's globals and the diagnostics gathered while
//! matching. The work happens in three passes:
//!
//! 1. [`matcher`] walks the grammar over the input, [`scope`] decides per
//!    node whether its match becomes a scope, an aggregated unit or is passed
//!    through.
//! 2. [`reduce`] runs the `finalize` hooks bottom-up.
//! 3. [`reduce`] folds the tree into a single value.

mod matcher;
pub(crate) mod reduce;
pub(crate) mod scope;

use crate::config::CompilerConfig;
use crate::context::Variables;
use crate::decoder::DocumentDecoder;
use crate::error::{
    recover_engine_error, CallbackError, CompileError, ConfigError, DecodeError, MatchFailure,
    ParseError, ParseErrorKind,
};
use crate::grammar::{Grammar, GrammarAnalysis, NodeId};
use crate::source::ByteCursor;
use crate::source_location::SourcePosition;
use crate::syntax::{SyntaxId, SyntaxTree};
use ahash::AHashSet;

/// Outcome of a successful node match
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Matched {
    /// A single unit
    Unit(SyntaxId),
    /// Several units handed to the enclosing node as they are
    List(Vec<SyntaxId>),
    /// Nothing retained
    Ignored,
}

impl Matched {
    pub(crate) fn from_items(items: Vec<SyntaxId>) -> Self {
        if items.is_empty() {
            Matched::Ignored
        } else {
            Matched::List(items)
        }
    }

    #[inline]
    pub(crate) fn is_ignored(&self) -> bool {
        matches!(self, Matched::Ignored)
    }

    pub(crate) fn append_to(self, items: &mut Vec<SyntaxId>) {
        match self {
            Matched::Unit(id) => items.push(id),
            Matched::List(ids) => items.extend(ids),
            Matched::Ignored => {}
        }
    }

    pub(crate) fn into_items(self) -> Vec<SyntaxId> {
        let mut items = Vec::new();
        self.append_to(&mut items);
        items
    }
}

/// Why a node did not match
#[derive(Debug)]
pub(crate) enum MatchError {
    /// Backtrackable mismatch
    Mismatch(MatchFailure),
    /// Aborts the run
    Fatal(CompileError),
}

impl From<CompileError> for MatchError {
    fn from(e: CompileError) -> Self {
        MatchError::Fatal(e)
    }
}

impl From<ParseError> for MatchError {
    fn from(e: ParseError) -> Self {
        MatchError::Fatal(CompileError::Parse(e))
    }
}

impl From<ConfigError> for MatchError {
    fn from(e: ConfigError) -> Self {
        MatchError::Fatal(CompileError::Config(e))
    }
}

impl From<DecodeError> for MatchError {
    fn from(e: DecodeError) -> Self {
        MatchError::Fatal(e.into())
    }
}

pub(crate) type MatchResult = Result<Matched, MatchError>;

/// State of one compile run
pub(crate) struct Run<'a, V> {
    grammar: &'a Grammar<V>,
    analysis: GrammarAnalysis,
    config: &'a CompilerConfig,
    decoder: &'a dyn DocumentDecoder,
    cursor: &'a mut dyn ByteCursor,
    tree: SyntaxTree<V>,
    globals: Variables<V>,
    /// Labels whose `init` already ran
    initialized: AHashSet<String>,
    /// Deepest recoverable failure seen so far
    furthest: Option<MatchFailure>,
    depth: usize,
}

impl<'a, V> Run<'a, V> {
    pub(crate) fn new(
        grammar: &'a Grammar<V>,
        config: &'a CompilerConfig,
        decoder: &'a dyn DocumentDecoder,
        cursor: &'a mut dyn ByteCursor,
        globals: Variables<V>,
    ) -> Self {
        Self {
            analysis: grammar.analyze(),
            grammar,
            config,
            decoder,
            cursor,
            tree: SyntaxTree::new(),
            globals,
            initialized: AHashSet::new(),
            furthest: None,
            depth: 0,
        }
    }

    /// The syntax tree built so far
    pub(crate) fn tree(&self) -> &SyntaxTree<V> {
        &self.tree
    }

    /// Tear the run down into its tree and globals
    pub(crate) fn into_parts(self) -> (SyntaxTree<V>, Variables<V>) {
        (self.tree, self.globals)
    }

    /// Resolve the line and column of a parse error before it leaves the run
    pub(crate) fn locate(&mut self, err: CompileError) -> CompileError {
        match err {
            CompileError::Parse(e) if e.position.is_none() => {
                match SourcePosition::locate(&mut *self.cursor, e.offset) {
                    Ok(position) => CompileError::Parse(e.with_position(position)),
                    Err(io) => CompileError::Io(io),
                }
            }
            other => other,
        }
    }

    /// Record a mismatch as a diagnostic candidate and return it
    ///
    /// A deeper failure always wins; at equal depth a custom message replaces
    /// a generated one.
    pub(crate) fn fail(&mut self, failure: MatchFailure) -> MatchError {
        let replace = match &self.furthest {
            None => true,
            Some(best) => {
                failure.offset > best.offset
                    || (failure.offset == best.offset && failure.custom && !best.custom)
            }
        };
        if replace {
            self.furthest = Some(failure.clone());
        }
        MatchError::Mismatch(failure)
    }

    /// Top-level syntax error from the root's failure and the furthest one
    pub(crate) fn syntax_error(&mut self, failure: MatchFailure) -> ParseError {
        let best = match self.furthest.take() {
            Some(best) if best.offset >= failure.offset => best,
            _ => failure,
        };
        let label = self.grammar.node(best.node).label();
        ParseError::new(ParseErrorKind::Syntax, best.message, best.offset)
            .with_node(best.node, label)
    }

    /// Wrap an `init` or `finalize` failure
    pub(crate) fn callback_failure(
        &self,
        id: NodeId,
        err: CallbackError,
        offset: usize,
    ) -> CompileError {
        match recover_engine_error(err) {
            Ok(engine) => engine,
            Err(other) => ParseError::new(ParseErrorKind::Callback, other.to_string(), offset)
                .with_node(id, self.grammar.node(id).label())
                .into(),
        }
    }
}
