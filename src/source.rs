//! Seekable byte sources
//!
//! The matcher backtracks by saving and restoring an integer position, so
//! every input is accessed through a [`ByteCursor`] that supports O(1)
//! repositioning.

use std::io::{self, Read, Seek, SeekFrom};

/// Size of the block cached by [`SeekCursor`]
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// A byte source with random-access positioning
pub trait ByteCursor {
    /// Current byte offset
    fn position(&self) -> usize;

    /// Move to an absolute byte offset
    ///
    /// Positions past the end are allowed; reads there return `None`.
    fn set_position(&mut self, pos: usize);

    /// Read the byte at the current position and advance
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Fill `buf` from the current position, returning the number of bytes read
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            match self.read_byte()? {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

// ============================================================================
// In-memory cursor
// ============================================================================

/// Cursor over an in-memory byte slice
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceCursor<'a> {
    /// Create a cursor at offset 0
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The underlying bytes
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

impl ByteCursor for SliceCursor<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

// ============================================================================
// Reader-backed cursor
// ============================================================================

/// Cursor over any `Read + Seek` source
///
/// Keeps one block of the source in memory so that short backtracking jumps
/// do not hit the underlying reader.
#[derive(Debug)]
pub struct SeekCursor<R> {
    inner: R,
    block: Vec<u8>,
    block_start: usize,
    block_size: usize,
    pos: usize,
}

impl<R: Read + Seek> SeekCursor<R> {
    /// Wrap a reader, starting at offset 0
    pub fn new(inner: R) -> Self {
        Self::with_block_size(inner, DEFAULT_BLOCK_SIZE)
    }

    /// Wrap a reader with a custom block size
    pub fn with_block_size(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            block: Vec::new(),
            block_start: 0,
            block_size: block_size.max(1),
            pos: 0,
        }
    }

    /// Unwrap the reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn cached(&self) -> Option<u8> {
        self.pos
            .checked_sub(self.block_start)
            .and_then(|i| self.block.get(i).copied())
    }

    fn load_block(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(self.pos as u64))?;
        self.block.resize(self.block_size, 0);
        let mut filled = 0;
        while filled < self.block.len() {
            match self.inner.read(&mut self.block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.block.truncate(filled);
        self.block_start = self.pos;
        Ok(())
    }
}

impl<R: Read + Seek> ByteCursor for SeekCursor<R> {
    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.cached() {
            self.pos += 1;
            return Ok(Some(b));
        }
        self.load_block()?;
        match self.cached() {
            Some(b) => {
                self.pos += 1;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}
