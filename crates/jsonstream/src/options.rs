/// Configuration options for [`StreamDecoder`](crate::StreamDecoder).
///
/// These options only affect how bytes are pulled from the source and held in
/// memory. They never change which values are decoded or which errors are
/// reported.
///
/// # Examples
///
/// ```rust
/// use jsonstream::{StreamDecoder, StreamOptions};
///
/// let options = StreamOptions {
///     read_size: 64,
///     ..Default::default()
/// };
/// let mut decoder = StreamDecoder::with_options(&b"[1, 2] 3"[..], options);
/// let first: Vec<u32> = decoder.decode().unwrap();
/// assert_eq!(first, [1, 2]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Spare room, in bytes, offered to the source on every read.
    ///
    /// The source may write fewer bytes. Larger values mean fewer reads for
    /// large documents; smaller values mean less memory for many tiny values.
    /// Zero is treated as one.
    ///
    /// # Default
    ///
    /// `4096`
    pub read_size: usize,

    /// Capacity reserved for the buffer when the decoder is created.
    ///
    /// # Default
    ///
    /// `4096`
    pub initial_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            read_size: 4096,
            initial_capacity: 4096,
        }
    }
}

/// Configuration options for [`JsonScanner`](crate::JsonScanner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerOptions {
    /// Maximum nesting of arrays and objects.
    ///
    /// A value that nests deeper fails with
    /// [`SyntaxError::NestingTooDeep`](crate::SyntaxError::NestingTooDeep) at
    /// the opening bracket that crosses the limit.
    ///
    /// `serde_json` refuses to materialize anything nested deeper than 127
    /// levels. Raising the limit past that turns the syntax error into a
    /// [`DecodeError::Target`](crate::DecodeError::Target) without an offset.
    ///
    /// # Default
    ///
    /// `127`
    pub max_depth: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self { max_depth: 127 }
    }
}
