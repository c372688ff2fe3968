//! A streaming JSON decoder that is indifferent to how its input is
//! fragmented.
//!
//! [`StreamDecoder`] reads from any [`ByteSource`], including ones that return
//! short reads or nothing at all for a while, and yields one JSON value per
//! [`decode`](StreamDecoder::decode) call. Values, errors and offsets are the
//! same whether the input arrives in one read or one byte at a time.
//!
//! ```rust
//! use jsonstream::{ErrorKind, StreamDecoder};
//! use serde_json::{Value, json};
//!
//! let input = br#"{"a":1}{ } [true] oops"#;
//! let mut decoder = StreamDecoder::new(&input[..]);
//!
//! assert_eq!(decoder.decode::<Value>().unwrap(), json!({"a": 1}));
//! assert_eq!(decoder.input_offset(), 7);
//! assert_eq!(decoder.decode::<Value>().unwrap(), json!({}));
//! assert_eq!(decoder.decode::<Vec<bool>>().unwrap(), [true]);
//!
//! assert!(decoder.more().unwrap());
//! let err = decoder.decode::<Value>().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Syntax);
//! assert_eq!(err.offset(), Some(18));
//! ```

mod buffer;
pub mod chunk_utils;
mod error;
mod options;
mod scanner;
mod source;
mod stream;

#[cfg(test)]
mod tests;

pub use error::{BoxError, DecodeError, ErrorKind, SyntaxError};
pub use options::{ScannerOptions, StreamOptions};
pub use scanner::{JsonScanner, Scan, ValueScanner};
pub use source::{ByteSource, IoSource, ReadOutcome};
pub use stream::{StreamDecoder, Values};
