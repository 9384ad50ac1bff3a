//! Error types
//!
//! Every failure that can leave [`Compiler::compile`](crate::Compiler::compile)
//! is a [`CompileError`]. Local, recoverable mismatches never leave the
//! matcher; they are represented by [`MatchFailure`] and handled by the
//! combinators that offer alternatives.

use crate::grammar::NodeId;
use crate::source_location::SourcePosition;
use std::fmt;
use std::io;

/// Error type returned by user callbacks.
///
/// A callback may return a boxed [`CompileError`] or [`ParseError`]; those are
/// passed through unchanged. Anything else is wrapped.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Parse errors
// ============================================================================

/// Classification of a fatal parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The root node did not match the input
    Syntax,
    /// A committed sequence or permutation matched partially
    Commit,
    /// A serious exclusion matched
    Serious,
    /// An `init` or `finalize` callback failed
    Callback,
    /// Nesting exceeded the configured recursion depth
    RecursionLimit,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::Commit => "commit error",
            ParseErrorKind::Serious => "forbidden element",
            ParseErrorKind::Callback => "parse callback error",
            ParseErrorKind::RecursionLimit => "recursion limit exceeded",
        };
        f.write_str(name)
    }
}

/// A fatal error raised while matching or finalizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Human readable description
    pub message: String,
    /// Grammar node that raised the error
    pub node: Option<NodeId>,
    /// Label of that node, if any
    pub label: Option<String>,
    /// Byte offset in the input
    pub offset: usize,
    /// Line and column, attached before the error leaves the compiler
    pub position: Option<SourcePosition>,
}

impl ParseError {
    /// Create a parse error at a byte offset
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            node: None,
            label: None,
            offset,
            position: None,
        }
    }

    /// Attach the originating node
    pub fn with_node(mut self, node: NodeId, label: Option<&str>) -> Self {
        self.node = Some(node);
        self.label = label.map(str::to_owned);
        self
    }

    /// Attach a resolved line/column
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "{} on line {}:{}: {}",
                self.kind, pos.line, pos.column, self.message
            )?,
            None => write!(f, "{} at offset {}: {}", self.kind, self.offset, self.message)?,
        }
        if let Some(label) = &self.label {
            write!(f, " (in '{}')", label)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Decode errors
// ============================================================================

/// Failure at the byte-to-character boundary
#[derive(Debug)]
pub enum DecodeError {
    /// The bytes at `offset` do not form a valid character
    Malformed {
        /// Offset of the first byte of the bad sequence
        offset: usize,
        /// Description of the problem
        message: String,
    },
    /// The underlying source could not be read
    Io(io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { offset, message } => {
                write!(f, "malformed input at offset {}: {}", offset, message)
            }
            DecodeError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(e) => Some(e),
            DecodeError::Malformed { .. } => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Io(e)
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

/// Misuse of the grammar or compiler API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A compile run is already in progress on this compiler
    Reentrant,
    /// A node with an `init` callback has no label
    UnlabeledInit {
        /// Offending node
        node: NodeId,
    },
    /// `repeat` with `min > max`
    InvalidRepeat {
        /// Requested lower bound
        min: usize,
        /// Requested upper bound
        max: usize,
    },
    /// The root node resolves to the `Parent` scope
    ParentRoot {
        /// Root node
        node: NodeId,
    },
    /// `append`/`prepend` on a node that has no child list
    NotComposite {
        /// Target node
        node: NodeId,
    },
    /// `commit` on something other than a sequence or permutation
    CommitNotAllowed {
        /// Target node
        node: NodeId,
    },
    /// `serious` on something other than an exclusion
    SeriousNotAllowed {
        /// Target node
        node: NodeId,
    },
    /// The handle does not belong to this grammar
    UnknownNode {
        /// Offending handle
        node: NodeId,
    },
    /// Configuration could not be loaded
    InvalidConfig(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Reentrant => write!(f, "compiler already in use"),
            ConfigError::UnlabeledInit { node } => {
                write!(f, "node {} has an init callback but no label", node)
            }
            ConfigError::InvalidRepeat { min, max } => {
                write!(f, "repeat minimum {} exceeds maximum {}", min, max)
            }
            ConfigError::ParentRoot { node } => {
                write!(f, "root node {} cannot use the parent scope", node)
            }
            ConfigError::NotComposite { node } => {
                write!(f, "node {} is not a sequence, choice or permutation", node)
            }
            ConfigError::CommitNotAllowed { node } => {
                write!(f, "node {} cannot be committed", node)
            }
            ConfigError::SeriousNotAllowed { node } => {
                write!(f, "node {} is not an exclusion", node)
            }
            ConfigError::UnknownNode { node } => write!(f, "unknown node {}", node),
            ConfigError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Compile errors
// ============================================================================

/// Any failure of a compile run
#[derive(Debug)]
pub enum CompileError {
    /// Fatal error during matching or finalizing
    Parse(ParseError),
    /// A reduce callback failed
    Compile {
        /// Description of the failure
        message: String,
        /// Label of the node whose callback failed
        label: Option<String>,
        /// The error returned by the callback
        source: Option<CallbackError>,
    },
    /// Malformed input bytes
    Decode(DecodeError),
    /// Grammar or compiler misuse
    Config(ConfigError),
    /// The input could not be read
    Io(io::Error),
}

impl CompileError {
    /// The parse error, if this is one
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            CompileError::Parse(e) => Some(e),
            _ => None,
        }
    }

    /// Kind of the parse error, if this is one
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        self.as_parse().map(|e| e.kind)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Compile { message, label, .. } => match label {
                Some(label) => write!(f, "compile error in '{}': {}", label, message),
                None => write!(f, "compile error: {}", message),
            },
            CompileError::Decode(e) => write!(f, "{}", e),
            CompileError::Config(e) => write!(f, "{}", e),
            CompileError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(e) => Some(e),
            CompileError::Compile { source, .. } => source
                .as_ref()
                .map(|e| &**e as &(dyn std::error::Error + 'static)),
            CompileError::Decode(e) => Some(e),
            CompileError::Config(e) => Some(e),
            CompileError::Io(e) => Some(e),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<ConfigError> for CompileError {
    fn from(e: ConfigError) -> Self {
        CompileError::Config(e)
    }
}

impl From<DecodeError> for CompileError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Io(io) => CompileError::Io(io),
            other => CompileError::Decode(other),
        }
    }
}

impl From<io::Error> for CompileError {
    fn from(e: io::Error) -> Self {
        CompileError::Io(e)
    }
}

/// Recover an engine error that a callback returned, if it is one.
pub(crate) fn recover_engine_error(err: CallbackError) -> Result<CompileError, CallbackError> {
    let err = match err.downcast::<CompileError>() {
        Ok(e) => return Ok(*e),
        Err(other) => other,
    };
    let err = match err.downcast::<ParseError>() {
        Ok(e) => return Ok(CompileError::Parse(*e)),
        Err(other) => other,
    };
    match err.downcast::<ConfigError>() {
        Ok(e) => Ok(CompileError::Config(*e)),
        Err(other) => Err(other),
    }
}

// ============================================================================
// Match failures
// ============================================================================

/// A local, backtrackable mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    /// Node that failed
    pub node: NodeId,
    /// Offset where the attempt failed
    pub offset: usize,
    /// Description of the mismatch
    pub message: String,
    /// Whether `message` came from the node's own error message
    pub custom: bool,
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_position() {
        let err = ParseError::new(ParseErrorKind::Syntax, "expected 'a'", 4)
            .with_position(SourcePosition::new(4, 2, 3));
        assert_eq!(err.to_string(), "syntax error on line 2:3: expected 'a'");
    }

    #[test]
    fn test_parse_error_display_without_position() {
        let err = ParseError::new(ParseErrorKind::Commit, "partial match", 7)
            .with_node(NodeId::from_index(3), Some("object"));
        assert_eq!(
            err.to_string(),
            "commit error at offset 7: partial match (in 'object')"
        );
    }

    #[test]
    fn test_recover_engine_error_passes_through() {
        let boxed: CallbackError = Box::new(CompileError::Config(ConfigError::Reentrant));
        match recover_engine_error(boxed) {
            Ok(CompileError::Config(ConfigError::Reentrant)) => {}
            other => panic!("unexpected: {:?}", other),
        }

        let boxed: CallbackError = Box::new(ParseError::new(ParseErrorKind::Serious, "no", 0));
        assert!(matches!(
            recover_engine_error(boxed),
            Ok(CompileError::Parse(_))
        ));
    }

    #[test]
    fn test_recover_engine_error_keeps_foreign_errors() {
        let boxed: CallbackError = "boom".into();
        let err = recover_engine_error(boxed).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_decode_io_becomes_compile_io() {
        let err: CompileError = DecodeError::Io(io::Error::other("gone")).into();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
