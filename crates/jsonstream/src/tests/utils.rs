use serde_json::Value;

use crate::{ByteSource, DecodeError, ErrorKind, StreamDecoder, ValueScanner};

/// What one `decode` call produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    /// A value and the input offset right after it.
    Value(Value, usize),
    End,
    Failed(ErrorKind, Option<usize>),
}

impl Outcome {
    fn from_result(result: Result<Value, DecodeError>, offset: usize) -> Self {
        match result {
            Ok(value) => Outcome::Value(value, offset),
            Err(DecodeError::EndOfStream) => Outcome::End,
            Err(err) => Outcome::Failed(err.kind(), err.offset()),
        }
    }

    pub(crate) fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(..))
    }
}

/// Decodes `source` to its end or to the first error, checking the
/// bookkeeping invariants after every call. `delivered` reports how many
/// bytes the source has handed out so far.
pub(crate) fn transcript<S, V>(
    decoder: &mut StreamDecoder<S, V>,
    input: &[u8],
    delivered: impl Fn(&S) -> usize,
) -> Vec<Outcome>
where
    S: ByteSource,
    V: ValueScanner,
{
    let mut out = vec![];
    let mut last_offset = 0;
    loop {
        let outcome = Outcome::from_result(decoder.decode::<Value>(), decoder.input_offset());
        let offset = decoder.input_offset();
        let buffered = decoder.buffered();
        assert!(offset >= last_offset, "offset went backwards");
        assert_eq!(offset + buffered.len(), delivered(decoder.get_ref()));
        assert_eq!(buffered, &input[offset..offset + buffered.len()]);
        last_offset = offset;

        let stop = !matches!(outcome, Outcome::Value(..));
        out.push(outcome);
        if stop {
            return out;
        }
    }
}

/// The same transcript produced by `serde_json`'s stream deserializer over the
/// whole input at once.
pub(crate) fn reference_transcript(input: &[u8]) -> Vec<Outcome> {
    let mut stream = serde_json::Deserializer::from_slice(input).into_iter::<Value>();
    let mut out = vec![];
    loop {
        let outcome = match stream.next() {
            Some(Ok(value)) => Outcome::Value(value, stream.byte_offset()),
            Some(Err(err)) if err.is_eof() => {
                Outcome::Failed(ErrorKind::UnexpectedEndOfStream, None)
            }
            Some(Err(err)) if err.is_syntax() => Outcome::Failed(ErrorKind::Syntax, None),
            Some(Err(err)) => panic!("unexpected reference error: {err}"),
            None => Outcome::End,
        };
        let stop = !matches!(outcome, Outcome::Value(..));
        out.push(outcome);
        if stop {
            return out;
        }
    }
}

/// Compares two transcripts, ignoring error offsets.
pub(crate) fn same_up_to_offsets(ours: &[Outcome], reference: &[Outcome]) -> bool {
    ours.len() == reference.len()
        && ours.iter().zip(reference).all(|pair| match pair {
            (Outcome::Failed(a, _), Outcome::Failed(b, _)) => a == b,
            (a, b) => a == b,
        })
}
