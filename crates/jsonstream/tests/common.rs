#![allow(missing_docs)]
#![allow(dead_code)]

use std::io::{self, Read};

/// A log-shaped stream of values with the separators found in the wild.
pub const LOG_STREAM: &str = r#"{"level":"info","msg":"listening","addr":"0.0.0.0:8080","tags":["http","v2"]}
{"level":"warn","msg":"slow request","latency_ms":1250.5,"path":"/api/items?page=2"}
	{"level":"error","msg":"upstream \"db\" unreachable","retry":{"attempt":3,"backoff":[0.5,1,2e0]}}
[1, -2, 3.25e-2, 0, -0.0]   "a bare string with éscapes 😀 and \\ slashes"
true false null 42 {"unicode":"✓ ünïcødé ✓","empty":{},"nested":[[[]],[{}]]}
"#;

/// Delivers at most `chunk` bytes per call, like a socket under load.
pub struct ShortReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> ShortReader<'a> {
    pub fn new(data: &'a [u8], chunk: usize) -> Self {
        Self {
            data,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ShortReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}
