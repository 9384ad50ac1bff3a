//! Compiler entry point
//!
//! A [`Compiler`] owns a grammar, its root node and the run-wide policies.
//! Each call to one of the `compile_*` methods is an independent run: a
//! fresh syntax tree, fresh locals, and globals cloned from the compiler's
//! template.
//!
//! ```rust
//! use ebnfkit::{Compiler, Grammar};
//!
//! let mut g: Grammar<String> = Grammar::new();
//! let digit = g.range('0', '9');
//! let number = g.repeat_min(digit, 1);
//! let end = g.end();
//! let root = g.seq([number, end]);
//!
//! let compiler = Compiler::new(g, root);
//! assert_eq!(compiler.compile_str("2024").unwrap(), "2024");
//! assert!(compiler.compile_str("20x4").is_err());
//! ```

use crate::config::CompilerConfig;
use crate::context::Variables;
use crate::decoder::{ByteDecoder, DocumentDecoder};
use crate::engine::Run;
use crate::error::{CompileError, ConfigError};
use crate::grammar::{Grammar, NodeId};
use crate::source::{ByteCursor, SeekCursor, SliceCursor};
use crate::syntax::SyntaxTree;
use crate::value::CompiledValue;
use std::cell::Cell;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

/// Hook called with the syntax tree once matching and finalizing are done
pub type MatchingCompleteFn<V> = Box<dyn Fn(&SyntaxTree<V>)>;

/// Hook called with the root value once reduction is done
pub type CompilationCompleteFn<V> = Box<dyn Fn(&V)>;

/// Result of [`Compiler::compile_run`]
#[derive(Debug, Clone)]
pub struct Compilation<V> {
    /// The reduced value of the root
    pub value: V,
    /// The run's globals after every callback ran
    pub globals: Variables<V>,
}

/// Compiles input against a grammar
pub struct Compiler<V> {
    grammar: Grammar<V>,
    root: NodeId,
    config: CompilerConfig,
    decoder: Box<dyn DocumentDecoder>,
    globals: Variables<V>,
    on_matching_complete: Option<MatchingCompleteFn<V>>,
    on_compilation_complete: Option<CompilationCompleteFn<V>>,
    busy: Cell<bool>,
}

impl<V: CompiledValue> Compiler<V> {
    /// Create a compiler with the default configuration and the byte decoder
    pub fn new(grammar: Grammar<V>, root: NodeId) -> Self {
        Self {
            grammar,
            root,
            config: CompilerConfig::default(),
            decoder: Box::new(ByteDecoder),
            globals: Variables::new(),
            on_matching_complete: None,
            on_compilation_complete: None,
            busy: Cell::new(false),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the document decoder
    pub fn with_decoder(mut self, decoder: impl DocumentDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Globals every run starts with
    pub fn with_globals(mut self, globals: Variables<V>) -> Self {
        self.globals = globals;
        self
    }

    /// Called with the syntax tree before reduction starts
    pub fn on_matching_complete(mut self, hook: impl Fn(&SyntaxTree<V>) + 'static) -> Self {
        self.on_matching_complete = Some(Box::new(hook));
        self
    }

    /// Called with the root value after reduction
    pub fn on_compilation_complete(mut self, hook: impl Fn(&V) + 'static) -> Self {
        self.on_compilation_complete = Some(Box::new(hook));
        self
    }

    /// The grammar
    pub fn grammar(&self) -> &Grammar<V> {
        &self.grammar
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Whether a run is in progress
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Compile a seekable source
    pub fn compile<R: Read + Seek>(&self, source: R) -> Result<V, CompileError> {
        self.compile_run(source).map(|c| c.value)
    }

    /// Compile a seekable source, also returning the final globals
    pub fn compile_run<R: Read + Seek>(&self, source: R) -> Result<Compilation<V>, CompileError> {
        let mut cursor = SeekCursor::new(source);
        self.run(&mut cursor)
    }

    /// Compile an in-memory buffer
    pub fn compile_bytes(&self, input: &[u8]) -> Result<V, CompileError> {
        let mut cursor = SliceCursor::new(input);
        self.run(&mut cursor).map(|c| c.value)
    }

    /// Compile a string
    pub fn compile_str(&self, input: &str) -> Result<V, CompileError> {
        self.compile_bytes(input.as_bytes())
    }

    /// Compile the contents of a file
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<V, CompileError> {
        let data = std::fs::read(path)?;
        self.compile_bytes(&data)
    }

    fn run(&self, cursor: &mut dyn ByteCursor) -> Result<Compilation<V>, CompileError> {
        let _guard = RunGuard::acquire(&self.busy)?;
        if !self.grammar.contains(self.root) {
            return Err(ConfigError::UnknownNode { node: self.root }.into());
        }
        log_debug!(
            "compile run: root {}, {} nodes, {} decoder",
            self.root,
            self.grammar.len(),
            self.decoder.name()
        );

        let mut run = Run::new(
            &self.grammar,
            &self.config,
            self.decoder.as_ref(),
            cursor,
            self.globals.clone(),
        );
        match self.execute(&mut run) {
            Ok(value) => {
                let (_, globals) = run.into_parts();
                log_debug!("compile run finished");
                Ok(Compilation { value, globals })
            }
            Err(err) => {
                log_debug!("compile run failed: {}", err);
                Err(run.locate(err))
            }
        }
    }

    fn execute(&self, run: &mut Run<'_, V>) -> Result<V, CompileError> {
        let base = run.match_root(self.root)?;
        run.finalize(base)?;
        log_debug!("matching complete");
        if let Some(hook) = &self.on_matching_complete {
            hook(run.tree());
        }

        let value = run.reduce(base)?;
        log_debug!("compilation complete");
        if let Some(hook) = &self.on_compilation_complete {
            hook(&value);
        }
        Ok(value)
    }
}

impl<V> fmt::Debug for Compiler<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("root", &self.root)
            .field("nodes", &self.grammar.len())
            .field("config", &self.config)
            .field("decoder", &self.decoder.name())
            .field("busy", &self.busy.get())
            .finish()
    }
}

/// Marks a compiler busy for the lifetime of a run
struct RunGuard<'c> {
    busy: &'c Cell<bool>,
}

impl<'c> RunGuard<'c> {
    fn acquire(busy: &'c Cell<bool>) -> Result<Self, ConfigError> {
        if busy.replace(true) {
            return Err(ConfigError::Reentrant);
        }
        Ok(Self { busy })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}
