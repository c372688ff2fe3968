//! Fault-injecting byte sources for exercising stream decoding.

use std::{collections::BTreeMap, io};

use crate::source::{ByteSource, ReadOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    /// End the current read early at this offset.
    Short,
    /// Return nothing once at this offset.
    Stall,
}

/// A source that delivers `data` but misbehaves at chosen offsets.
///
/// When a read reaches a halt offset it stops there (a short read, possibly
/// of zero bytes), and the next read returns [`ReadOutcome::Stalled`]. Each
/// halt fires once. Reads can also be capped to a maximum length. The last
/// bytes arrive together with [`ReadOutcome::End`].
///
/// ```rust
/// use jsonstream::{StreamDecoder, chunk_utils::HaltingSource};
///
/// let source = HaltingSource::new(b"[1, 2]".to_vec(), [1, 3]);
/// let mut decoder = StreamDecoder::new(source);
/// let value: Vec<u8> = decoder.decode().unwrap();
/// assert_eq!(value, [1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct HaltingSource<B> {
    data: B,
    pos: usize,
    halts: BTreeMap<usize, Halt>,
    max_read: usize,
}

impl<B: AsRef<[u8]>> HaltingSource<B> {
    /// Delivers `data`, halting once at each offset in `halts`.
    pub fn new(data: B, halts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            data,
            pos: 0,
            halts: halts.into_iter().map(|at| (at, Halt::Short)).collect(),
            max_read: usize::MAX,
        }
    }

    /// Caps every read at `max_read` bytes (at least one).
    #[must_use]
    pub fn with_max_read(mut self, max_read: usize) -> Self {
        self.max_read = max_read.max(1);
        self
    }

    /// Number of bytes delivered so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<B: AsRef<[u8]>> ByteSource for HaltingSource<B> {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        let data = self.data.as_ref();
        let limit = buf.len().min(self.max_read);
        let mut written = 0;
        while written < limit {
            if self.pos >= data.len() {
                return Ok(ReadOutcome::End(written));
            }
            match self.halts.get(&self.pos).copied() {
                Some(Halt::Short) => {
                    self.halts.insert(self.pos, Halt::Stall);
                    return Ok(short(written));
                }
                Some(Halt::Stall) => {
                    self.halts.remove(&self.pos);
                    return Ok(short(written));
                }
                None => {}
            }
            let run = self
                .halts
                .range(self.pos..)
                .next()
                .map_or(data.len(), |(&at, _)| at)
                .min(data.len())
                .min(self.pos + (limit - written));
            let n = run - self.pos;
            buf[written..written + n].copy_from_slice(&data[self.pos..run]);
            self.pos = run;
            written += n;
        }
        if self.pos >= data.len() {
            Ok(ReadOutcome::End(written))
        } else {
            Ok(short(written))
        }
    }
}

fn short(written: usize) -> ReadOutcome {
    if written == 0 {
        ReadOutcome::Stalled
    } else {
        ReadOutcome::Bytes(written)
    }
}
