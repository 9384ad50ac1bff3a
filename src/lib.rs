//! ebnfkit - scoped EBNF grammar combinators with a reduction engine
//!
//! Grammars are built at runtime from combinators (characters, ranges,
//! sequences, choices, optionals, repeats, negative lookaheads and
//! permutations) and compiled against a seekable byte source. Matching
//! produces a scoped syntax tree; reduce callbacks on the grammar nodes fold
//! it into a value of your choosing.
//!
//! It provides:
//! - Arena-backed grammars with handles, so recursive grammars are plain data
//! - Backtracking matcher with commit (cut) and serious exclusions
//! - Scope resolution deciding which matches become opaque units
//! - Parse-time hooks (`init`, `is_necessary`, `finalize`) and reduce callbacks
//! - Scope-local and run-wide variables visible to callbacks
//! - Byte and UTF-8 decoders, line/column diagnostics
//! - Developer tools (tree printer, grammar visualization)
//!
//! ## Quick Start
//!
//! ```rust
//! use ebnfkit::{Compiler, Grammar, ScopeKind, Value};
//!
//! let mut g: Grammar<Value> = Grammar::new();
//! let digit = g.range('0', '9');
//! let number = g.repeat_min(digit, 1);
//! g.node_mut(number).reduce(|_, digits| {
//!     let text: String = digits.iter().filter_map(|d| d.as_str()).collect();
//!     Ok(Value::int(text.parse()?))
//! });
//! let comma = g.char(',');
//! let more = g.seq([comma, number]);
//! let tail = g.repeat(more);
//! // pass the numbers straight through to the list
//! g.node_mut(more).scope(ScopeKind::Parent);
//! g.node_mut(tail).scope(ScopeKind::Parent);
//! let list = g.seq([number, tail]);
//! g.node_mut(list)
//!     .is_necessary(|child| child.text() != ",")
//!     .reduce(|_, items| Ok(Value::array(items)));
//!
//! let compiler = Compiler::new(g, list);
//! let value = compiler.compile_str("1,22,333").unwrap();
//! assert_eq!(value.to_json().unwrap(), "[1,22,333]");
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

pub mod compiler;
pub mod config;
pub mod context;
pub mod debug;
pub mod decoder;
mod engine;
pub mod error;
pub mod grammar;
pub mod source;
pub mod source_location;
pub mod syntax;
pub mod value;

/// Re-export commonly used types for convenience
pub use compiler::{Compilation, Compiler};
pub use config::{Aggregation, CompilerConfig};
pub use context::{ScopeContext, Variables};
pub use debug::{GrammarVisualizer, TreePrinter};
pub use decoder::{ByteDecoder, DocumentDecoder, Utf8Decoder};
pub use error::{
    CallbackError, CompileError, ConfigError, DecodeError, MatchFailure, ParseError,
    ParseErrorKind,
};
pub use grammar::{Grammar, GrammarNode, IntoNode, NodeId, NodeKind, ScopeKind};
pub use source::{ByteCursor, SeekCursor, SliceCursor};
pub use source_location::SourcePosition;
pub use syntax::{SyntaxId, SyntaxKind, SyntaxNode, SyntaxRef, SyntaxTree};
pub use value::{CompiledValue, Value};
