use std::io;

use thiserror::Error;

/// Boxed error returned by a [`ValueScanner`](crate::ValueScanner) when a
/// located value cannot be materialized into the requested target.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors returned by [`StreamDecoder`](crate::StreamDecoder).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The stream ended cleanly at a value boundary. There are no more values.
    #[error("end of stream")]
    EndOfStream,
    /// The stream ended after a value was begun but before it was complete.
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEndOfStream {
        /// Absolute offset at which the source ended.
        offset: usize,
    },
    /// The bytes at `offset` are not valid JSON.
    #[error("{error} at offset {offset}")]
    Syntax {
        /// Absolute offset of the offending byte.
        offset: usize,
        /// What the scanner found there.
        error: SyntaxError,
    },
    /// The byte source failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A complete value was read but could not be decoded into the target.
    #[error("cannot decode value into target: {0}")]
    Target(#[source] BoxError),
}

/// Discriminant of a [`DecodeError`], convenient for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`DecodeError::EndOfStream`].
    EndOfStream,
    /// See [`DecodeError::UnexpectedEndOfStream`].
    UnexpectedEndOfStream,
    /// See [`DecodeError::Syntax`].
    Syntax,
    /// See [`DecodeError::Io`].
    Io,
    /// See [`DecodeError::Target`].
    Target,
}

impl DecodeError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EndOfStream => ErrorKind::EndOfStream,
            Self::UnexpectedEndOfStream { .. } => ErrorKind::UnexpectedEndOfStream,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Io(_) => ErrorKind::Io,
            Self::Target(_) => ErrorKind::Target,
        }
    }

    /// Returns `true` for [`DecodeError::EndOfStream`].
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Absolute stream offset the error refers to, if it has one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEndOfStream { offset } | Self::Syntax { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Why a byte sequence is not valid JSON.
///
/// Messages follow the wording of the common reference decoders, e.g.
/// `invalid character 'b' looking for beginning of value`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    /// A byte that cannot appear at this point of the grammar.
    #[error("invalid character {} {context}", quote_byte(*.found))]
    InvalidCharacter {
        /// The offending byte.
        found: u8,
        /// Where in the grammar the scanner was.
        context: &'static str,
    },
    /// A misspelled `true`, `false` or `null`.
    #[error(
        "invalid character {} in literal {literal} (expecting {})",
        quote_byte(*.found),
        quote_byte(*.expected)
    )]
    InvalidLiteral {
        /// The offending byte.
        found: u8,
        /// The byte the literal needs here.
        expected: u8,
        /// The literal being matched.
        literal: &'static str,
    },
    /// A backslash followed by something other than a JSON escape.
    #[error("invalid character {} in string escape code", quote_byte(*.0))]
    InvalidEscape(u8),
    /// A non-hex digit inside `\uXXXX`.
    #[error("invalid character {} in \\u hexadecimal character escape", quote_byte(*.0))]
    InvalidHexEscape(u8),
    /// An unescaped byte below `0x20` inside a string.
    #[error("invalid control character {} in string literal", quote_byte(*.0))]
    ControlCharacter(u8),
    /// A `\uD800`..`\uDFFF` escape without its partner.
    #[error("unpaired surrogate \\u{0:04X} in string literal")]
    UnpairedSurrogate(u16),
    /// String content that is not UTF-8.
    #[error("invalid UTF-8 in string literal")]
    InvalidUtf8,
    /// Arrays and objects nested deeper than
    /// [`ScannerOptions::max_depth`](crate::ScannerOptions::max_depth).
    #[error("exceeded max depth of {0}")]
    NestingTooDeep(usize),
}

fn quote_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("'\\x{byte:02x}'")
    }
}
