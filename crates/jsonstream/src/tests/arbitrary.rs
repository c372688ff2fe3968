use quickcheck::{Arbitrary, Gen};
use serde_json::{Map, Number, Value};

/// A JSON document: any finite `serde_json::Value`, at most three levels deep.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Doc(pub(crate) Value);

impl Arbitrary for Doc {
    fn arbitrary(g: &mut Gen) -> Self {
        fn number(g: &mut Gen) -> Value {
            if bool::arbitrary(g) {
                return Value::from(i64::arbitrary(g));
            }
            let mut n = f64::arbitrary(g);
            while !n.is_finite() {
                n = f64::arbitrary(g);
            }
            Number::from_f64(n).map_or(Value::Null, Value::Number)
        }

        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            let kinds = if depth == 0 { 4 } else { 6 };
            match usize::arbitrary(g) % kinds {
                0 => Value::Null,
                1 => Value::Bool(bool::arbitrary(g)),
                2 => number(g),
                3 => Value::String(String::arbitrary(g)),
                4 => {
                    let len = usize::arbitrary(g) % 4;
                    Value::Array((0..len).map(|_| gen_val(g, depth - 1)).collect())
                }
                _ => {
                    let len = usize::arbitrary(g) % 4;
                    let mut map = Map::new();
                    for _ in 0..len {
                        map.insert(String::arbitrary(g), gen_val(g, depth - 1));
                    }
                    Value::Object(map)
                }
            }
        }

        let depth = usize::arbitrary(g) % 3;
        Doc(gen_val(g, depth))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match &self.0 {
            Value::Array(items) => Box::new(items.clone().into_iter().map(Doc)),
            Value::Object(map) => Box::new(
                map.values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(Doc),
            ),
            _ => Box::new(core::iter::empty()),
        }
    }
}

/// Insignificant whitespace between two documents. Never empty, so adjacent
/// scalars stay separate values for every reference decoder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Separator(pub(crate) &'static str);

impl Arbitrary for Separator {
    fn arbitrary(g: &mut Gen) -> Self {
        const SEPARATORS: &[&str] = &[" ", "\n", "\t", "\r\n", "    ", " \t\n\r "];
        Separator(SEPARATORS[usize::arbitrary(g) % SEPARATORS.len()])
    }
}
