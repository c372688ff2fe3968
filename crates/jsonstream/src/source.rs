//! Byte sources the decoder can pull from.
//!
//! A [`ByteSource`] differs from [`std::io::Read`] in one respect: a read that
//! writes nothing is not the end of the stream. Flaky transports and the
//! fault-injecting sources used in tests routinely return nothing for a while
//! and then resume, so the outcome of a read is tri-state.

use std::io::{self, ErrorKind, Read};

/// The outcome of a single [`ByteSource::fill`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were written at the front of the buffer. `Bytes(0)` is
    /// treated as [`ReadOutcome::Stalled`].
    Bytes(usize),
    /// Nothing is available yet; the stream has not ended.
    Stalled,
    /// This many bytes (possibly zero) were written and the stream has ended.
    End(usize),
}

impl ReadOutcome {
    /// Number of bytes written by the read.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Bytes(n) | Self::End(n) => n,
            Self::Stalled => 0,
        }
    }

    /// Returns `true` when the read wrote nothing.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when the source reported end of stream.
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(self, Self::End(_))
    }
}

/// Anything that can fill a region with bytes.
pub trait ByteSource {
    /// Writes up to `buf.len()` bytes to the front of `buf`.
    ///
    /// `buf` is never empty when called by the decoder. Once `End` has been
    /// returned the decoder does not call `fill` again.
    ///
    /// # Errors
    ///
    /// Any error aborts the current decoder call and is returned to its caller
    /// as [`DecodeError::Io`](crate::DecodeError::Io). The decoder does not
    /// remember it: the next call reads again.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).fill(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).fill(buf)
    }
}

/// An in-memory slice delivers everything it has in as few reads as the
/// buffer allows, then ends.
impl ByteSource for &[u8] {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        let n = self.len().min(buf.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        if self.is_empty() {
            Ok(ReadOutcome::End(n))
        } else {
            Ok(ReadOutcome::Bytes(n))
        }
    }
}

/// Adapts a [`std::io::Read`] into a [`ByteSource`].
///
/// `Ok(0)` from the reader is the end of the stream. `Interrupted` and
/// `WouldBlock` errors are stalls: the decoder retries them.
#[derive(Debug)]
pub struct IoSource<R> {
    reader: R,
}

impl<R: Read> IoSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Borrows the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Mutably borrows the wrapped reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        match self.reader.read(buf) {
            Ok(0) => Ok(ReadOutcome::End(0)),
            Ok(n) => Ok(ReadOutcome::Bytes(n)),
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                Ok(ReadOutcome::Stalled)
            }
            Err(e) => Err(e),
        }
    }
}
