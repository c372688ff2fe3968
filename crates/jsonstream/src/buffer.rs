use std::io;

use tracing::trace;

use crate::source::{ByteSource, ReadOutcome};

/// Growable window over the bytes read from a source but not yet retired.
///
/// `data[..start]` holds retired bytes that have not been physically dropped
/// yet; `data[start..]` is the pending tail. Retirement only moves `start`.
/// Retired bytes are shifted out lazily, when a read needs the room.
#[derive(Debug, Default)]
pub(crate) struct Window {
    data: Vec<u8>,
    start: usize,
}

impl Window {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            start: 0,
        }
    }

    #[inline]
    pub(crate) fn pending(&self) -> &[u8] {
        &self.data[self.start..]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len() - self.start
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the first `n` pending bytes.
    pub(crate) fn retire(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "retiring {n} of {} pending bytes", self.len());
        self.start += n.min(self.len());
        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }
    }

    /// Reads once from `source` into `min_extra` bytes of room past the pending
    /// tail. Only the bytes the source wrote are kept.
    ///
    /// The region offered to the source is exactly `min_extra` bytes, however
    /// large the buffer has grown, so the cost of a read tracks the read size.
    pub(crate) fn fill_from<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        min_extra: usize,
    ) -> io::Result<ReadOutcome> {
        let min_extra = min_extra.max(1);
        self.make_room(min_extra);

        let filled = self.data.len();
        self.data.resize(filled + min_extra, 0);
        let outcome = source.fill(&mut self.data[filled..]);
        let written = match &outcome {
            Ok(read) => read.len().min(min_extra),
            Err(_) => 0,
        };
        self.data.truncate(filled + written);
        outcome
    }

    /// Ensures `capacity - len >= min_extra`, shifting retired bytes out first
    /// and growing at least geometrically when that is not enough.
    fn make_room(&mut self, min_extra: usize) {
        if self.data.capacity() - self.data.len() >= min_extra {
            return;
        }
        if self.start > 0 {
            let retired = self.start;
            self.data.drain(..retired);
            self.start = 0;
            trace!(retired, pending = self.data.len(), "compacted stream buffer");
            if self.data.capacity() - self.data.len() >= min_extra {
                return;
            }
        }
        let grow = min_extra.max(self.data.capacity());
        self.data.reserve(grow);
        trace!(capacity = self.data.capacity(), "grew stream buffer");
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repeat(u8);

    impl ByteSource for Repeat {
        fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
            buf.fill(self.0);
            Ok(ReadOutcome::Bytes(buf.len()))
        }
    }

    /// Fills everything it is offered and records how much that was.
    #[derive(Default)]
    struct Recording(Vec<usize>);

    impl ByteSource for Recording {
        fn fill(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
            self.0.push(buf.len());
            buf.fill(b'r');
            Ok(ReadOutcome::Bytes(buf.len()))
        }
    }

    struct Failing;

    impl ByteSource for Failing {
        fn fill(&mut self, _buf: &mut [u8]) -> io::Result<ReadOutcome> {
            Err(io::Error::other("nope"))
        }
    }

    #[test]
    fn fill_keeps_only_written_bytes() {
        let mut w = Window::with_capacity(8);
        let mut src: &[u8] = b"abc";
        assert_eq!(w.fill_from(&mut src, 4).unwrap(), ReadOutcome::End(3));
        assert_eq!(w.pending(), b"abc");
    }

    #[test]
    fn retire_is_prefix_only() {
        let mut w = Window::with_capacity(8);
        let mut src: &[u8] = b"abcdef";
        w.fill_from(&mut src, 8).unwrap();
        w.retire(2);
        assert_eq!(w.pending(), b"cdef");
        w.retire(0);
        assert_eq!(w.pending(), b"cdef");
        w.retire(4);
        assert!(w.is_empty());
    }

    #[test]
    fn compaction_preserves_pending_bytes() {
        let mut w = Window::with_capacity(4);
        let mut src: &[u8] = b"abcdefgh";
        w.fill_from(&mut src, 4).unwrap();
        assert_eq!(w.pending(), b"abcd");
        w.retire(3);
        w.fill_from(&mut src, 3).unwrap();
        assert_eq!(w.pending(), b"defg");
    }

    #[test]
    fn growth_is_geometric() {
        let mut w = Window::with_capacity(16);
        let mut src = Repeat(b'x');
        let mut capacities = vec![];
        for _ in 0..6 {
            w.fill_from(&mut src, 16).unwrap();
            capacities.push(w.capacity());
        }
        for pair in capacities.windows(2) {
            assert!(pair[1] == pair[0] || pair[1] >= pair[0] * 2, "{capacities:?}");
        }
        assert_eq!(w.len(), 6 * 16);
        assert!(w.pending().iter().all(|&b| b == b'x'));
    }

    #[test]
    fn failed_read_leaves_pending_intact() {
        let mut w = Window::with_capacity(8);
        let mut src: &[u8] = b"ab";
        w.fill_from(&mut src, 8).unwrap();
        assert!(w.fill_from(&mut Failing, 8).is_err());
        assert_eq!(w.pending(), b"ab");
    }

    #[test]
    fn reads_are_bounded_by_the_requested_room() {
        let mut w = Window::with_capacity(4);
        let mut src = Recording::default();
        for _ in 0..64 {
            w.fill_from(&mut src, 16).unwrap();
        }
        assert!(w.capacity() >= 64 * 16);

        // A drained window keeps its capacity but not its read size.
        w.retire(w.len());
        w.fill_from(&mut src, 8).unwrap();
        w.fill_from(&mut src, 1).unwrap();
        assert!(src.0[..64].iter().all(|&n| n == 16), "{:?}", src.0);
        assert_eq!(src.0[64..], [8, 1]);
        assert_eq!(w.pending(), b"rrrrrrrrr");
    }
}
