//! JSON bridge.
//!
//! Serializes the JSON-representable subset of terms and parses JSON text
//! into heap terms. Numbers without a fractional or exponent part parse as
//! `Int` when they fit in 64 bits, everything else as `Float`.

use thiserror::Error;

use crate::{Heap, TermId, TermKind, TermType};

/// Host-level JSON failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum JsonError {
    /// The term (or something inside it) has no JSON representation.
    #[error("cannot serialize {0} as JSON")]
    Unserializable(TermType),
    /// An object key was not a string.
    #[error("cannot serialize {0} as a JSON object key")]
    InvalidKey(TermType),
    /// Malformed input text.
    #[error("invalid JSON at byte {offset}: {message}")]
    Malformed { offset: usize, message: String },
}

/// Convert a term to a `serde_json::Value`.
///
/// Iterators, functions, unevaluated expressions, symbols and signals are
/// rejected. Non-finite floats become `null`.
pub fn to_json(heap: &Heap, id: TermId) -> Result<serde_json::Value, JsonError> {
    use serde_json::Value;

    Ok(match *heap.kind(id) {
        TermKind::Nil => Value::Null,
        TermKind::Boolean(b) => Value::Bool(b),
        TermKind::Int(n) => Value::from(n),
        TermKind::Timestamp(ms) => Value::from(ms),
        TermKind::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        TermKind::String(range) => Value::String(heap.get_str(range).to_owned()),
        TermKind::List(range) => Value::Array(
            heap.get_list(range)
                .iter()
                .map(|&item| to_json(heap, item))
                .collect::<Result<_, _>>()?,
        ),
        TermKind::Hashset(_) => Value::Array(
            heap.hashset_items(id)
                .into_iter()
                .map(|item| to_json(heap, item))
                .collect::<Result<_, _>>()?,
        ),
        TermKind::Record { .. } => object(heap, heap.record_entries(id))?,
        TermKind::Hashmap(_) => object(heap, heap.hashmap_entries(id))?,
        _ => return Err(JsonError::Unserializable(heap.term_type(id))),
    })
}

fn object(heap: &Heap, entries: Vec<(TermId, TermId)>) -> Result<serde_json::Value, JsonError> {
    let mut map = serde_json::Map::with_capacity(entries.len());
    for (key, value) in entries {
        let Some(key) = heap.as_str(key) else {
            return Err(JsonError::InvalidKey(heap.term_type(key)));
        };
        map.insert(key.to_owned(), to_json(heap, value)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Append the compact JSON encoding of a term to `out`.
pub fn write_json(heap: &Heap, id: TermId, out: &mut String) -> Result<(), JsonError> {
    let value = to_json(heap, id)?;
    out.push_str(&value.to_string());
    Ok(())
}

/// Parse JSON text into heap terms.
pub fn parse_json(heap: &mut Heap, text: &str) -> Result<TermId, JsonError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| JsonError::Malformed {
            offset: byte_offset(text, err.line(), err.column()),
            message: err.to_string(),
        })?;
    Ok(from_json(heap, &value))
}

/// Allocate a term mirroring a JSON value. Objects become records.
pub fn from_json(heap: &mut Heap, value: &serde_json::Value) -> TermId {
    use serde_json::Value;

    match value {
        Value::Null => TermId::NIL,
        Value::Bool(b) => heap.boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => heap.int(i),
            None => heap.float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => heap.alloc_string(s),
        Value::Array(items) => {
            let ids: Vec<TermId> = items.iter().map(|item| from_json(heap, item)).collect();
            heap.list(&ids)
        }
        Value::Object(map) => {
            let entries: Vec<(TermId, TermId)> = map
                .iter()
                .map(|(key, value)| {
                    let key = heap.alloc_string(key);
                    (key, from_json(heap, value))
                })
                .collect();
            heap.record_from_entries(&entries)
        }
    }
}

/// Convert serde_json's 1-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}
