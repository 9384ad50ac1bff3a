//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from ebnfkit.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use ebnfkit::prelude::*;
//!
//! let mut g: Grammar<String> = Grammar::new();
//! let root = g.text("ok");
//! assert_eq!(Compiler::new(g, root).compile_str("ok").unwrap(), "ok");
//! ```
//!
//! # Re-exported Items
//!
//! ## Grammar
//! - [`Grammar`] - Arena of grammar nodes
//! - [`NodeId`] - Handle to a grammar node
//! - [`ScopeKind`] - Scope tag of a node
//! - [`IntoNode`] - Conversion of literals into nodes
//!
//! ## Compiling
//! - [`Compiler`] - Compiles input against a grammar
//! - [`CompilerConfig`] - Run-wide policies
//! - [`Aggregation`] - Default aggregation policy
//! - [`Utf8Decoder`] / [`ByteDecoder`] - Document decoders
//!
//! ## Callbacks and Values
//! - [`ScopeContext`] - Callback access to the tree and variables
//! - [`Variables`] - Named values of a scope or run
//! - [`CompiledValue`] - Values the reduction pass can build
//! - [`Value`] - Dynamic value type
//!
//! ## Error Handling
//! - [`CompileError`] - Any failure of a compile run
//! - [`CallbackError`] - Error type returned by callbacks

// ============================================================================
// Grammar
// ============================================================================

pub use crate::grammar::{Grammar, IntoNode, NodeId, ScopeKind};

// ============================================================================
// Compiling
// ============================================================================

pub use crate::compiler::Compiler;
pub use crate::config::{Aggregation, CompilerConfig};
pub use crate::decoder::{ByteDecoder, Utf8Decoder};

// ============================================================================
// Callbacks and Values
// ============================================================================

pub use crate::context::{ScopeContext, Variables};
pub use crate::value::{CompiledValue, Value};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::error::{CallbackError, CompileError};
