//! Source Location Utilities
//!
//! Line and column numbers are never tracked during matching. They are
//! recovered on demand by rescanning the source from its start, once per
//! reported error.

use crate::source::ByteCursor;
use std::fmt;
use std::io;

const SCAN_CHUNK: usize = 4096;

/// A position in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in bytes)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Create a position at the start of input
    #[inline]
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Calculate the position of `offset` in an in-memory buffer
    pub fn from_bytes(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut scan = LineScan::default();
        scan.feed(&input[..offset]);
        scan.finish(offset)
    }

    /// Calculate the position of `offset` by rescanning a cursor from its start
    ///
    /// The cursor position is restored afterwards.
    pub fn locate(cursor: &mut dyn ByteCursor, offset: usize) -> io::Result<Self> {
        let saved = cursor.position();
        cursor.set_position(0);

        let mut scan = LineScan::default();
        let mut buf = [0u8; SCAN_CHUNK];
        let mut consumed = 0;
        let result = loop {
            if consumed >= offset {
                break Ok(scan.finish(offset));
            }
            let want = (offset - consumed).min(SCAN_CHUNK);
            match cursor.read_chunk(&mut buf[..want]) {
                Ok(0) => break Ok(scan.finish(consumed)),
                Ok(n) => {
                    scan.feed(&buf[..n]);
                    consumed += n;
                }
                Err(e) => break Err(e),
            }
        };

        cursor.set_position(saved);
        result
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

/// Running line count over consecutive chunks
#[derive(Default)]
struct LineScan {
    newlines: usize,
    /// Absolute offset just past the last line feed
    line_start: usize,
    seen: usize,
}

impl LineScan {
    fn feed(&mut self, chunk: &[u8]) {
        self.newlines += memchr::memchr_iter(b'\n', chunk).count();
        if let Some(last) = memchr::memrchr(b'\n', chunk) {
            self.line_start = self.seen + last + 1;
        }
        self.seen += chunk.len();
    }

    fn finish(&self, offset: usize) -> SourcePosition {
        SourcePosition::new(offset, self.newlines + 1, offset - self.line_start + 1)
    }
}
