//! Bounded look-ahead over a byte stream.
//!
//! [`PeekReader`] is the only buffer the parser owns.  It holds a fixed
//! number of bytes (64 by default) and never grows, which is what keeps
//! peak memory independent of block size: block payloads are skipped with
//! [`PeekReader::seek_to`] and never pass through the buffer.
//!
//! # Operations
//! - `peek(n)`     — make up to `n` bytes visible without consuming them
//! - `consume(n)`  — drop bytes that were already peeked
//! - `Read`        — drain the buffer first, then the inner stream
//! - `seek_to(p)`  — reposition the inner stream and discard the buffer

use std::io::{self, Read, Seek, SeekFrom};

/// Default look-ahead capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

pub struct PeekReader<R> {
    inner:  R,
    buf:    Box<[u8]>,
    pos:    usize,
    filled: usize,
}

impl<R: Read> PeekReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf:    vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos:    0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently held in the buffer and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.filled - self.pos
    }

    /// Return up to `n` upcoming bytes without advancing.
    ///
    /// The slice is shorter than `n` only when the inner stream reached end
    /// of input.  Asking for more than the capacity is an `InvalidInput` error.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        if n > self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("peek of {} bytes exceeds look-ahead capacity {}", n, self.buf.len()),
            ));
        }
        if self.buffered() < n {
            if self.pos + n > self.buf.len() {
                self.buf.copy_within(self.pos..self.filled, 0);
                self.filled -= self.pos;
                self.pos = 0;
            }
            while self.buffered() < n {
                match self.inner.read(&mut self.buf[self.filled..]) {
                    Ok(0) => break,
                    Ok(k) => self.filled += k,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
        }
        let end = (self.pos + n).min(self.filled);
        Ok(&self.buf[self.pos..end])
    }

    /// Advance past `n` buffered bytes.  Never reads from the inner stream.
    pub fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.filled);
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> PeekReader<R> {
    /// Seek the inner stream to the absolute position `pos`, dropping any
    /// buffered look-ahead.  Returns the position the stream reports.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<u64> {
        self.pos = 0;
        self.filled = 0;
        self.inner.seek(SeekFrom::Start(pos))
    }

    /// Total length of the inner stream.  Leaves the stream at `pos`.
    pub fn stream_len_from(&mut self, pos: u64) -> io::Result<u64> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.seek_to(pos)?;
        Ok(len)
    }
}

impl<R: Read> Read for PeekReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.buffered() == 0 {
            if out.len() >= self.buf.len() {
                return self.inner.read(out);
            }
            self.pos = 0;
            self.filled = self.inner.read(&mut self.buf)?;
        }
        let n = out.len().min(self.buffered());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input.
/// Returns the number of bytes read.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}
