//! Scanner: finds where one JSON value ends in a contiguous byte prefix.
//!
//! The stream decoder hands the scanner its whole pending tail on every
//! attempt. The scanner either reports the length of the first complete value,
//! asks for more bytes, or points at the first byte that cannot be part of
//! valid JSON. It keeps no state between calls, so a tail that grew by a few
//! bytes is simply scanned again.
//!
//! Value boundaries
//! - Objects, arrays, strings and literals end at their last byte.
//! - A number ends at the first byte that cannot continue it. A number running
//!   to the end of the input is complete only when `at_end` says no more bytes
//!   will ever arrive.
//! - Trailing bytes are never inspected, so `1true` is two values.

use memchr::memchr2;
use serde::de::DeserializeOwned;

use crate::{
    error::{BoxError, SyntaxError},
    options::ScannerOptions,
};


/// Result of scanning a byte prefix for one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The first value ends `consumed` bytes into the input. The count
    /// includes leading whitespace and nothing after the value.
    Complete {
        /// Number of input bytes up to and including the value's last byte.
        consumed: usize,
    },
    /// The input is a valid but unfinished prefix of a value (or is empty).
    Incomplete,
    /// The byte at `offset` cannot appear where it does.
    Invalid {
        /// Offset of the offending byte within the input.
        offset: usize,
        /// What is wrong with it.
        error: SyntaxError,
    },
}

/// Locates and materializes JSON values for a
/// [`StreamDecoder`](crate::StreamDecoder).
pub trait ValueScanner {
    /// Scans `input` for the first value after optional leading whitespace.
    ///
    /// `at_end` is `true` once no bytes will ever be appended to `input`.
    /// Implementations must be deterministic in `input` and `at_end`.
    fn scan(&mut self, input: &[u8], at_end: bool) -> Scan;

    /// Decodes a value previously reported as [`Scan::Complete`].
    ///
    /// # Errors
    ///
    /// Returns an error when the value does not fit `T`.
    fn decode<T: DeserializeOwned>(&mut self, value: &[u8]) -> Result<T, BoxError>;
}

impl<V: ValueScanner> ValueScanner for &mut V {
    fn scan(&mut self, input: &[u8], at_end: bool) -> Scan {
        (**self).scan(input, at_end)
    }

    fn decode<T: DeserializeOwned>(&mut self, value: &[u8]) -> Result<T, BoxError> {
        (**self).decode(value)
    }
}

/// The default scanner: validates the full JSON grammar and hands complete
/// values to `serde_json`.
///
/// Strings are checked for UTF-8 and for paired surrogate escapes, so a value
/// the scanner accepts only fails to decode because of its shape.
#[derive(Debug, Default, Clone)]
pub struct JsonScanner {
    options: ScannerOptions,
    stack: Vec<Container>,
}

impl JsonScanner {
    /// Creates a scanner with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scanner with the given options.
    #[must_use]
    pub fn with_options(options: ScannerOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
        }
    }
}

impl ValueScanner for JsonScanner {
    fn scan(&mut self, input: &[u8], at_end: bool) -> Scan {
        self.stack.clear();
        let mut cursor = Cursor {
            input,
            at_end,
            max_depth: self.options.max_depth,
            stack: &mut self.stack,
        };
        match cursor.value() {
            Ok(consumed) => Scan::Complete { consumed },
            Err(Stop::Incomplete) => Scan::Incomplete,
            Err(Stop::Invalid(offset, error)) => Scan::Invalid { offset, error },
        }
    }

    fn decode<T: DeserializeOwned>(&mut self, value: &[u8]) -> Result<T, BoxError> {
        serde_json::from_slice(value).map_err(Into::into)
    }
}

/// Standard JSON insignificant whitespace.
#[inline]
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Value,
    FirstElement,
    FirstKey,
    Key,
    Colon,
    AfterValue,
}

enum Stop {
    Incomplete,
    Invalid(usize, SyntaxError),
}

fn invalid<T>(offset: usize, error: SyntaxError) -> Result<T, Stop> {
    Err(Stop::Invalid(offset, error))
}

fn unexpected<T>(offset: usize, found: u8, context: &'static str) -> Result<T, Stop> {
    invalid(offset, SyntaxError::InvalidCharacter { found, context })
}

struct Cursor<'a> {
    input: &'a [u8],
    at_end: bool,
    max_depth: usize,
    stack: &'a mut Vec<Container>,
}

impl Cursor<'_> {
    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while pos < self.input.len() && is_whitespace(self.input[pos]) {
            pos += 1;
        }
        pos
    }

    fn value(&mut self) -> Result<usize, Stop> {
        let mut pos = 0;
        let mut expect = Expect::Value;
        loop {
            if expect == Expect::AfterValue && self.stack.is_empty() {
                return Ok(pos);
            }
            pos = self.skip_whitespace(pos);
            let Some(&byte) = self.input.get(pos) else {
                return Err(Stop::Incomplete);
            };
            expect = match expect {
                Expect::Value => match byte {
                    b'{' => {
                        pos = self.open(pos, Container::Object)?;
                        Expect::FirstKey
                    }
                    b'[' => {
                        pos = self.open(pos, Container::Array)?;
                        Expect::FirstElement
                    }
                    b'"' => {
                        pos = self.string(pos + 1)?;
                        Expect::AfterValue
                    }
                    b't' => {
                        pos = self.literal(pos, "true")?;
                        Expect::AfterValue
                    }
                    b'f' => {
                        pos = self.literal(pos, "false")?;
                        Expect::AfterValue
                    }
                    b'n' => {
                        pos = self.literal(pos, "null")?;
                        Expect::AfterValue
                    }
                    b'-' | b'0'..=b'9' => {
                        pos = self.number(pos)?;
                        Expect::AfterValue
                    }
                    _ => return unexpected(pos, byte, "looking for beginning of value"),
                },
                Expect::FirstElement if byte == b']' => {
                    self.stack.pop();
                    pos += 1;
                    Expect::AfterValue
                }
                Expect::FirstElement => Expect::Value,
                Expect::FirstKey if byte == b'}' => {
                    self.stack.pop();
                    pos += 1;
                    Expect::AfterValue
                }
                Expect::FirstKey | Expect::Key => {
                    if byte != b'"' {
                        return unexpected(pos, byte, "looking for beginning of object key string");
                    }
                    pos = self.string(pos + 1)?;
                    Expect::Colon
                }
                Expect::Colon => {
                    if byte != b':' {
                        return unexpected(pos, byte, "after object key");
                    }
                    pos += 1;
                    Expect::Value
                }
                Expect::AfterValue => match (self.stack.last(), byte) {
                    (Some(Container::Object), b',') => {
                        pos += 1;
                        Expect::Key
                    }
                    (Some(Container::Array), b',') => {
                        pos += 1;
                        Expect::Value
                    }
                    (Some(Container::Object), b'}') | (Some(Container::Array), b']') => {
                        self.stack.pop();
                        pos += 1;
                        Expect::AfterValue
                    }
                    (Some(Container::Object), _) => {
                        return unexpected(pos, byte, "after object key:value pair");
                    }
                    (_, _) => return unexpected(pos, byte, "after array element"),
                },
            };
        }
    }

    fn open(&mut self, pos: usize, container: Container) -> Result<usize, Stop> {
        if self.stack.len() >= self.max_depth {
            return invalid(pos, SyntaxError::NestingTooDeep(self.max_depth));
        }
        self.stack.push(container);
        Ok(pos + 1)
    }

    /// Scans string content starting just after the opening quote and returns
    /// the offset just past the closing quote.
    fn string(&self, mut pos: usize) -> Result<usize, Stop> {
        let input = self.input;
        loop {
            let rest = &input[pos..];
            let run = memchr2(b'"', b'\\', rest).unwrap_or(rest.len());
            check_plain(&rest[..run], pos, run == rest.len())?;
            pos += run;
            match input.get(pos) {
                None => return Err(Stop::Incomplete),
                Some(b'"') => return Ok(pos + 1),
                Some(_) => pos = self.escape(pos)?,
            }
        }
    }

    /// Scans one escape sequence at `pos` (the backslash).
    fn escape(&self, pos: usize) -> Result<usize, Stop> {
        let Some(&kind) = self.input.get(pos + 1) else {
            return Err(Stop::Incomplete);
        };
        match kind {
            b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => Ok(pos + 2),
            b'u' => {
                let unit = self.hex4(pos + 2)?;
                match unit {
                    0xD800..=0xDBFF => self.low_surrogate(pos + 6, unit),
                    0xDC00..=0xDFFF => invalid(pos, SyntaxError::UnpairedSurrogate(unit)),
                    _ => Ok(pos + 6),
                }
            }
            other => invalid(pos + 1, SyntaxError::InvalidEscape(other)),
        }
    }

    /// Expects `\uDC00`..`\uDFFF` at `pos` to complete `high`.
    fn low_surrogate(&self, pos: usize, high: u16) -> Result<usize, Stop> {
        let lone = || invalid(pos - 6, SyntaxError::UnpairedSurrogate(high));
        match self.input.get(pos) {
            None => return Err(Stop::Incomplete),
            Some(b'\\') => {}
            Some(_) => return lone(),
        }
        match self.input.get(pos + 1) {
            None => return Err(Stop::Incomplete),
            Some(b'u') => {}
            Some(_) => return lone(),
        }
        match self.hex4(pos + 2)? {
            0xDC00..=0xDFFF => Ok(pos + 6),
            _ => lone(),
        }
    }

    fn hex4(&self, pos: usize) -> Result<u16, Stop> {
        let mut unit = 0u16;
        for offset in pos..pos + 4 {
            let Some(&byte) = self.input.get(offset) else {
                return Err(Stop::Incomplete);
            };
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => return invalid(offset, SyntaxError::InvalidHexEscape(byte)),
            };
            unit = (unit << 4) | u16::from(digit);
        }
        Ok(unit)
    }

    fn literal(&self, pos: usize, literal: &'static str) -> Result<usize, Stop> {
        for (i, &expected) in literal.as_bytes().iter().enumerate() {
            match self.input.get(pos + i) {
                None => return Err(Stop::Incomplete),
                Some(&found) if found != expected => {
                    return invalid(
                        pos + i,
                        SyntaxError::InvalidLiteral {
                            found,
                            expected,
                            literal,
                        },
                    );
                }
                Some(_) => {}
            }
        }
        Ok(pos + literal.len())
    }

    /// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    fn number(&self, start: usize) -> Result<usize, Stop> {
        let input = self.input;
        let mut pos = start;
        if input[pos] == b'-' {
            pos += 1;
        }
        match input.get(pos) {
            None => return Err(Stop::Incomplete),
            Some(b'0') => pos += 1,
            Some(b'1'..=b'9') => pos = digits(input, pos + 1),
            Some(&byte) => return unexpected(pos, byte, "in numeric literal"),
        }
        if input.get(pos) == Some(&b'.') {
            pos += 1;
            match input.get(pos) {
                None => return Err(Stop::Incomplete),
                Some(b'0'..=b'9') => pos = digits(input, pos + 1),
                Some(&byte) => {
                    return unexpected(pos, byte, "after decimal point in numeric literal");
                }
            }
        }
        if matches!(input.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            if matches!(input.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            match input.get(pos) {
                None => return Err(Stop::Incomplete),
                Some(b'0'..=b'9') => pos = digits(input, pos + 1),
                Some(&byte) => return unexpected(pos, byte, "in exponent of numeric literal"),
            }
        }
        // A number touching the end of the input may still grow.
        if pos == input.len() && !(self.at_end && self.stack.is_empty()) {
            return Err(Stop::Incomplete);
        }
        Ok(pos)
    }
}

fn digits(input: &[u8], mut pos: usize) -> usize {
    while matches!(input.get(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    pos
}

/// Validates a run of string bytes that holds no quote and no backslash.
/// `open_ended` marks a run cut off by the end of the input, where a partial
/// UTF-8 sequence is still acceptable.
fn check_plain(run: &[u8], base: usize, open_ended: bool) -> Result<(), Stop> {
    if let Some(at) = run.iter().position(|&b| b < 0x20) {
        check_utf8(&run[..at], base, false)?;
        return invalid(base + at, SyntaxError::ControlCharacter(run[at]));
    }
    check_utf8(run, base, open_ended)
}

fn check_utf8(run: &[u8], base: usize, open_ended: bool) -> Result<(), Stop> {
    if run.is_ascii() {
        return Ok(());
    }
    match core::str::from_utf8(run) {
        Ok(_) => Ok(()),
        Err(e) if e.error_len().is_none() && open_ended => Err(Stop::Incomplete),
        Err(e) => invalid(base + e.valid_up_to(), SyntaxError::InvalidUtf8),
    }
}
