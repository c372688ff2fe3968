#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use jsonstream::{DecodeError, ErrorKind, StreamDecoder, StreamOptions, chunk_utils::HaltingSource};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Number, Value};

/// A stream of documents, how to split it, and optional trailing junk.
#[derive(Debug, Arbitrary)]
struct StreamCase {
    docs: Vec<Doc>,
    separators: Vec<Separator>,
    junk: Vec<u8>,
    halts: Vec<u16>,
    max_read: u8,
    read_size: u8,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Separator {
    Space,
    Tab,
    Newline,
    CarriageReturn,
    Crlf,
}

impl Separator {
    fn bytes(self) -> &'static [u8] {
        match self {
            Self::Space => b" ",
            Self::Tab => b"\t",
            Self::Newline => b"\n",
            Self::CarriageReturn => b"\r",
            Self::Crlf => b"\r\n",
        }
    }
}

#[derive(Debug)]
struct Doc(Value);

impl<'a> Arbitrary<'a> for Doc {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        value(u, 3).map(Doc)
    }
}

fn value(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Value> {
    let kinds = if depth == 0 { 5 } else { 7 };
    Ok(match u.choose_index(kinds)? {
        0 => Value::Null,
        1 => Value::Bool(u.arbitrary()?),
        2 => Value::from(u.arbitrary::<i64>()?),
        3 => Number::from_f64(u.arbitrary()?).map_or(Value::Null, Value::Number),
        4 => Value::String(u.arbitrary()?),
        5 => {
            let len = u.int_in_range(0..=4)?;
            let items = (0..len).map(|_| value(u, depth - 1));
            Value::Array(items.collect::<arbitrary::Result<_>>()?)
        }
        _ => {
            let mut map = Map::new();
            for _ in 0..u.int_in_range(0..=4)? {
                map.insert(u.arbitrary()?, value(u, depth - 1)?);
            }
            Value::Object(map)
        }
    })
}

impl StreamCase {
    fn input(&self) -> Vec<u8> {
        let mut input = Vec::new();
        for (i, doc) in self.docs.iter().enumerate() {
            input.extend_from_slice(doc.0.to_string().as_bytes());
            let sep = self.separators.get(i).copied().unwrap_or(Separator::Space);
            input.extend_from_slice(sep.bytes());
        }
        input.extend_from_slice(&self.junk);
        input
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Value(Value, usize),
    End,
    Failed(ErrorKind, Option<usize>),
}

/// Decodes until the first error, checking that offsets only move forward and
/// that `input_offset + buffered` always matches what the source delivered.
fn run(data: &[u8], halts: Vec<usize>, max_read: usize, read_size: usize) -> Vec<Outcome> {
    let source = HaltingSource::new(data, halts).with_max_read(max_read);
    let options = StreamOptions {
        read_size,
        initial_capacity: read_size,
    };
    let mut decoder = StreamDecoder::with_options(source, options);
    let mut out = vec![];
    let mut last = 0;
    loop {
        let outcome = match decoder.decode::<Value>() {
            Ok(value) => Outcome::Value(value, decoder.input_offset()),
            Err(DecodeError::EndOfStream) => Outcome::End,
            Err(err) => Outcome::Failed(err.kind(), err.offset()),
        };
        let offset = decoder.input_offset();
        let delivered = decoder.get_ref().position();
        assert!(offset >= last);
        assert_eq!(decoder.buffered(), &data[offset..delivered]);
        last = offset;

        let done = !matches!(outcome, Outcome::Value(..));
        if matches!(outcome, Outcome::Failed(ErrorKind::Syntax | ErrorKind::UnexpectedEndOfStream, _)) {
            assert!(!decoder.more().expect("in-memory sources do not fail"));
        }
        out.push(outcome);
        if done {
            return out;
        }
    }
}

fn stream(case: &StreamCase) {
    let data = case.input();
    let whole = run(&data, vec![], usize::MAX, 4096);

    let halts = case.halts.iter().map(|&h| usize::from(h) % (data.len() + 1)).collect();
    let max_read = 1 + usize::from(case.max_read % 64);
    let read_size = 1 + usize::from(case.read_size % 32);
    let fragmented = run(&data, halts, max_read, read_size);
    assert_eq!(whole, fragmented);

    if case.junk.is_empty() {
        assert_eq!(whole.len(), case.docs.len() + 1);
        assert_eq!(whole.last(), Some(&Outcome::End));
    }

    // Every value serde_json finds, in the same places.
    let mut reference = serde_json::Deserializer::from_slice(&data).into_iter::<Value>();
    for outcome in &whole {
        match (outcome, reference.next()) {
            (Outcome::Value(value, offset), Some(Ok(expected))) => {
                assert_eq!(value, &expected);
                assert_eq!(*offset, reference.byte_offset());
            }
            // serde_json also wants a delimiter after scalars, as in `1true`.
            (Outcome::Value(..), Some(Err(_))) => break,
            (Outcome::End, None) => {}
            (Outcome::Failed(..), Some(Err(_))) => {}
            (ours, theirs) => panic!("{ours:?} but serde_json gave {theirs:?}"),
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(case) = StreamCase::arbitrary_take_rest(Unstructured::new(data)) {
        stream(&case);
    }
});
