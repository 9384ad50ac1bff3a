//! Compiler configuration
//!
//! ```rust
//! use ebnfkit::config::{Aggregation, CompilerConfig};
//! use ebnfkit::grammar::ScopeKind;
//!
//! let config = CompilerConfig::new()
//!     .with_aggregation(Aggregation::List)
//!     .with_max_recursion_depth(64);
//! let json = config.to_json().unwrap();
//! let loaded = CompilerConfig::from_json(&json).unwrap();
//! assert_eq!(loaded, config);
//! assert_eq!(loaded.default_scope, ScopeKind::Inherited);
//! ```

use crate::error::ConfigError;
use crate::grammar::ScopeKind;
use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of node matches; see
/// [`CompilerConfig::max_recursion_depth`]
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Default scope policy for nodes tagged `Default`
pub const DEFAULT_SCOPE: ScopeKind = ScopeKind::Inherited;

/// How untouched content is aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Concatenate the children's text
    #[default]
    Text,
    /// Keep the children as a list
    List,
    /// Discard the content
    Ignore,
}

/// Run-wide policies of a [`Compiler`](crate::Compiler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Ambient policy for nodes tagged `Default`
    pub default_scope: ScopeKind,

    /// Aggregation of content that does not form a scope
    pub aggregation: Aggregation,

    /// Maximum nesting depth of node matches (0 = unlimited)
    ///
    /// Every nested node match counts, so valid input nested deeper than
    /// this is rejected with a recursion-limit error. Set it to 0 to accept
    /// any depth the thread's stack can hold.
    pub max_recursion_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_scope: DEFAULT_SCOPE,
            aggregation: Aggregation::default(),
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl CompilerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ambient scope policy
    pub fn with_default_scope(mut self, scope: ScopeKind) -> Self {
        self.default_scope = scope;
        self
    }

    /// Set the aggregation policy
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Load from JSON; missing fields take their default
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }
}
