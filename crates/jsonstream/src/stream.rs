//! The stream decoder.
//!
//! [`StreamDecoder`] pulls bytes from a [`ByteSource`] and yields one JSON
//! value per [`decode`](StreamDecoder::decode) call. Results do not depend on
//! how the source fragments its data: short reads, reads that split a token
//! in half and reads that return nothing at all are all the same to it.
//!
//! # Examples
//!
//! ```rust
//! use jsonstream::{DecodeError, StreamDecoder};
//! use serde_json::Value;
//!
//! let mut decoder = StreamDecoder::new(&br#"{"a":1} [2] "three""#[..]);
//! while decoder.more().unwrap() {
//!     let value: Value = decoder.decode().unwrap();
//!     println!("{value} ends at {}", decoder.input_offset());
//! }
//! assert!(matches!(decoder.decode::<Value>(), Err(DecodeError::EndOfStream)));
//! ```

use core::{fmt, marker::PhantomData};
use std::io::Read;

use bstr::BStr;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{
    buffer::Window,
    error::DecodeError,
    options::StreamOptions,
    scanner::{JsonScanner, Scan, ValueScanner, is_whitespace},
    source::{ByteSource, IoSource, ReadOutcome},
};

/// Decodes a sequence of JSON values from a [`ByteSource`].
///
/// The decoder owns a buffer of bytes read from the source but not yet
/// consumed. Consuming a value (or the whitespace in front of it) retires its
/// bytes: they count towards [`input_offset`](Self::input_offset) and leave
/// the buffer. At all times
/// `input_offset() + buffered().len()` is the number of bytes read so far.
pub struct StreamDecoder<S, V = JsonScanner> {
    source: S,
    scanner: V,
    window: Window,
    offset: usize,
    exhausted: bool,
    /// Set by a syntax error or an unexpected end of stream. Neither can be
    /// recovered from, so `more` stops reporting values.
    failed: bool,
    options: StreamOptions,
}

impl<S: ByteSource> StreamDecoder<S> {
    /// Creates a decoder over `source` with default options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, StreamOptions::default())
    }

    /// Creates a decoder over `source` with the given options.
    pub fn with_options(source: S, options: StreamOptions) -> Self {
        Self::with_scanner(source, JsonScanner::new(), options)
    }
}

impl<R: Read> StreamDecoder<IoSource<R>> {
    /// Creates a decoder over a [`std::io::Read`].
    ///
    /// A read returning `Ok(0)` ends the stream; see [`IoSource`].
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoSource::new(reader))
    }
}

impl<S: ByteSource, V: ValueScanner> StreamDecoder<S, V> {
    /// Creates a decoder that locates and materializes values with `scanner`.
    pub fn with_scanner(source: S, scanner: V, options: StreamOptions) -> Self {
        Self {
            source,
            scanner,
            window: Window::with_capacity(options.initial_capacity),
            offset: 0,
            exhausted: false,
            failed: false,
            options,
        }
    }

    /// Reports whether another value can be decoded.
    ///
    /// Skips (and retires) whitespace, reading from the source until a
    /// non-whitespace byte shows up or the source ends. Returns `false` at the
    /// end of the stream and when the next byte is `]` or `}`, neither of
    /// which can start a value. Calling it repeatedly without decoding gives
    /// the same answer.
    ///
    /// Once [`decode`](Self::decode) has failed with
    /// [`DecodeError::Syntax`] or [`DecodeError::UnexpectedEndOfStream`],
    /// `more` returns `false` without touching the source.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Io`] when the source fails.
    pub fn more(&mut self) -> Result<bool, DecodeError> {
        if self.failed {
            return Ok(false);
        }
        match self.skip_whitespace()? {
            Some((at, byte)) => {
                self.retire(at);
                Ok(!matches!(byte, b']' | b'}'))
            }
            None => {
                self.retire(self.window.len());
                Ok(false)
            }
        }
    }

    /// Decodes the next value into a `T`.
    ///
    /// Leading whitespace is retired together with the value; whitespace
    /// after the value is left in the buffer, so on success
    /// [`input_offset`](Self::input_offset) points just past the value.
    /// A failed call leaves `input_offset` and `buffered` as they were.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::EndOfStream`]: the source ended at a value boundary.
    /// - [`DecodeError::UnexpectedEndOfStream`]: the source ended inside a
    ///   value. Nothing is retired.
    /// - [`DecodeError::Syntax`]: the buffered bytes are not valid JSON.
    ///   Nothing is retired, so retrying fails the same way.
    /// - [`DecodeError::Io`]: the source failed. Bytes read before the failure
    ///   stay buffered; the next call reads again.
    /// - [`DecodeError::Target`]: the value is valid JSON but not a `T`. Its
    ///   bytes are retired and the next call moves on to the following value.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T, DecodeError> {
        if self.skip_whitespace()?.is_none() {
            self.retire(self.window.len());
            return Err(DecodeError::EndOfStream);
        }
        loop {
            match self.scanner.scan(self.window.pending(), self.exhausted) {
                Scan::Complete { consumed } => {
                    let value = &self.window.pending()[..consumed];
                    let decoded = self.scanner.decode(value);
                    self.retire(consumed);
                    return decoded.map_err(DecodeError::Target);
                }
                Scan::Incomplete if self.exhausted => {
                    self.failed = true;
                    return Err(DecodeError::UnexpectedEndOfStream {
                        offset: self.offset + self.window.len(),
                    });
                }
                Scan::Incomplete => {
                    // Rescanning after a stall would see the same bytes.
                    while self.refill()? == 0 && !self.exhausted {}
                }
                Scan::Invalid { offset, error } => {
                    self.failed = true;
                    return Err(DecodeError::Syntax {
                        offset: self.offset + offset,
                        error,
                    });
                }
            }
        }
    }

    /// Returns an iterator that decodes values until the end of the stream.
    ///
    /// The iterator yields each error once and then stops.
    pub fn values<T: DeserializeOwned>(&mut self) -> Values<'_, S, V, T> {
        Values {
            decoder: self,
            failed: false,
            marker: PhantomData,
        }
    }

    /// Reads until the pending bytes hold something other than whitespace and
    /// returns its position and value, or `None` at the end of the stream.
    /// Nothing is retired.
    fn skip_whitespace(&mut self) -> Result<Option<(usize, u8)>, DecodeError> {
        let mut from = 0;
        loop {
            let pending = self.window.pending();
            if let Some(at) = pending[from..].iter().position(|&byte| !is_whitespace(byte)) {
                return Ok(Some((from + at, pending[from + at])));
            }
            if self.exhausted {
                return Ok(None);
            }
            from = pending.len();
            self.refill()?;
        }
    }

    /// Issues one read against the source and returns how many bytes it
    /// delivered. Zero means a stall or the end of the stream.
    fn refill(&mut self) -> Result<usize, DecodeError> {
        if self.exhausted {
            return Ok(0);
        }
        let outcome = self
            .window
            .fill_from(&mut self.source, self.options.read_size)?;
        match outcome {
            ReadOutcome::Bytes(0) | ReadOutcome::Stalled => {
                trace!(offset = self.offset, "source stalled");
            }
            ReadOutcome::Bytes(n) => {
                trace!(bytes = n, pending = self.window.len(), "read from source");
            }
            ReadOutcome::End(n) => {
                self.exhausted = true;
                trace!(bytes = n, pending = self.window.len(), "source ended");
            }
        }
        Ok(outcome.len())
    }

    fn retire(&mut self, n: usize) {
        self.window.retire(n);
        self.offset += n;
    }
}

impl<S, V> StreamDecoder<S, V> {
    /// The bytes read from the source but not consumed yet.
    ///
    /// The slice implements [`std::io::Read`], so the remainder of the stream
    /// can be handed to another reader by chaining it with
    /// [`into_inner`](Self::into_inner).
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        self.window.pending()
    }

    /// Number of bytes consumed from the source so far.
    #[must_use]
    pub fn input_offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` once the source has reported the end of the stream.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Borrows the source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrows the source.
    ///
    /// Reading from it directly skips the decoder's buffer.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the source. Buffered bytes are dropped; copy
    /// [`buffered`](Self::buffered) first to keep them.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S, V> fmt::Debug for StreamDecoder<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("offset", &self.offset)
            .field("exhausted", &self.exhausted)
            .field("buffered", &BStr::new(self.window.pending()))
            .finish_non_exhaustive()
    }
}

/// Iterator over the values of a [`StreamDecoder`], see
/// [`StreamDecoder::values`].
pub struct Values<'a, S, V, T> {
    decoder: &'a mut StreamDecoder<S, V>,
    failed: bool,
    marker: PhantomData<fn() -> T>,
}

impl<S: ByteSource, V: ValueScanner, T: DeserializeOwned> Iterator for Values<'_, S, V, T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.decoder.decode() {
            Ok(value) => Some(Ok(value)),
            Err(DecodeError::EndOfStream) => {
                self.failed = true;
                None
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: ByteSource, V: ValueScanner, T: DeserializeOwned> core::iter::FusedIterator
    for Values<'_, S, V, T>
{
}
