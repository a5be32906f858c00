//! Text operations and the JSON bridge.

use rheo_term::json::{self, JsonError};
use rheo_term::{TermId, TermType};

use super::collections::resolve_deep;
use crate::dispatch::Strictness::Strict;
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};

const STRING: Guard = Guard::Type(TermType::String);

/// Owned copies of the string arguments, in order.
fn strings(inv: &Invocation<'_, '_>, args: &[TermId]) -> Vec<String> {
    args.iter()
        .map(|&arg| inv.heap().as_str(arg).unwrap_or_default().to_owned())
        .collect()
}

/// `Split(text, separator)`. An empty separator splits into characters.
pub(super) static SPLIT: BuiltinDef = BuiltinDef {
    name: "Split",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[STRING, STRING],
        handler: |inv, args| {
            let parts = strings(inv, args);
            let (text, separator) = (&parts[0], &parts[1]);
            let heap = inv.heap_mut();
            let items: Vec<TermId> = if separator.is_empty() {
                text.chars()
                    .map(|ch| heap.alloc_string(ch.encode_utf8(&mut [0u8; 4])))
                    .collect()
            } else {
                text.split(separator.as_str())
                    .map(|part| heap.alloc_string(part))
                    .collect()
            };
            heap.list(&items)
        },
    }],
    default: reject,
};

/// `Replace(text, pattern, replacement)`: replaces the first occurrence.
pub(super) static REPLACE: BuiltinDef = BuiltinDef {
    name: "Replace",
    signature: Signature::fixed(&[Strict, Strict, Strict]),
    overloads: &[Overload {
        guards: &[STRING, STRING, STRING],
        handler: |inv, args| {
            let parts = strings(inv, args);
            let replaced = parts[0].replacen(parts[1].as_str(), &parts[2], 1);
            inv.heap_mut().alloc_string(&replaced)
        },
    }],
    default: reject,
};

pub(super) static STARTS_WITH: BuiltinDef = BuiltinDef {
    name: "StartsWith",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[STRING, STRING],
        handler: |inv, args| {
            let heap = inv.heap();
            let result = match (heap.as_str(args[0]), heap.as_str(args[1])) {
                (Some(text), Some(prefix)) => text.starts_with(prefix),
                _ => false,
            };
            heap.boolean(result)
        },
    }],
    default: reject,
};

pub(super) static ENDS_WITH: BuiltinDef = BuiltinDef {
    name: "EndsWith",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[STRING, STRING],
        handler: |inv, args| {
            let heap = inv.heap();
            let result = match (heap.as_str(args[0]), heap.as_str(args[1])) {
                (Some(text), Some(suffix)) => text.ends_with(suffix),
                _ => false,
            };
            heap.boolean(result)
        },
    }],
    default: reject,
};

/// `Join(iterable, separator)`. Non-string items use their display form.
pub(super) static JOIN: BuiltinDef = BuiltinDef {
    name: "Join",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable, STRING],
        handler: join,
    }],
    default: reject,
};

fn join(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let items = match inv.collect_evaluated(args[0]) {
        Ok(items) => items,
        Err(signal) => return signal,
    };
    let heap = inv.heap();
    let separator = heap.as_str(args[1]).unwrap_or_default();
    let joined = items
        .iter()
        .map(|&item| match heap.as_str(item) {
            Some(text) => text.to_owned(),
            None => heap.display(item).to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator);
    inv.heap_mut().alloc_string(&joined)
}

pub(super) static TO_STRING: BuiltinDef = BuiltinDef {
    name: "ToString",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[STRING],
            handler: |_, args| args[0],
        },
        Overload {
            guards: &[Guard::Any],
            handler: |inv, args| {
                let text = inv.heap().display(args[0]).to_string();
                inv.heap_mut().alloc_string(&text)
            },
        },
    ],
    default: reject,
};

pub(super) static PARSE_INT: BuiltinDef = BuiltinDef {
    name: "ParseInt",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Type(TermType::Int)],
            handler: |_, args| args[0],
        },
        Overload {
            guards: &[STRING],
            handler: |inv, args| {
                let text = strings(inv, args).swap_remove(0);
                match text.trim().parse::<i64>() {
                    Ok(n) => inv.heap_mut().int(n),
                    Err(_) => inv.error(&format!("Invalid integer: {text:?}")),
                }
            },
        },
    ],
    default: reject,
};

pub(super) static PARSE_FLOAT: BuiltinDef = BuiltinDef {
    name: "ParseFloat",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Numeric],
            handler: |inv, args| {
                let x = inv.heap().as_number(args[0]).unwrap_or(f64::NAN);
                inv.heap_mut().float(x)
            },
        },
        Overload {
            guards: &[STRING],
            handler: |inv, args| {
                let text = strings(inv, args).swap_remove(0);
                match text.trim().parse::<f64>() {
                    Ok(x) => inv.heap_mut().float(x),
                    Err(_) => inv.error(&format!("Invalid number: {text:?}")),
                }
            },
        },
    ],
    default: reject,
};

/// Malformed input yields an `InvalidJson` signal carrying the byte offset.
pub(super) static PARSE_JSON: BuiltinDef = BuiltinDef {
    name: "ParseJson",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[STRING],
        handler: |inv, args| {
            let text = strings(inv, args).swap_remove(0);
            match json::parse_json(inv.heap_mut(), &text) {
                Ok(value) => value,
                Err(JsonError::Malformed { offset, message }) => {
                    tracing::trace!(offset, %message, "malformed JSON");
                    let offset = u32::try_from(offset).unwrap_or(u32::MAX);
                    inv.heap_mut().invalid_json_signal(args[0], offset)
                }
                Err(err) => inv.error(&err.to_string()),
            }
        },
    }],
    default: reject,
};

/// Serialize a deeply resolved value as compact JSON text.
pub(super) static STRINGIFY_JSON: BuiltinDef = BuiltinDef {
    name: "StringifyJson",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| {
            let value = match resolve_deep(inv, args[0]) {
                Ok(value) => value,
                Err(signal) => return signal,
            };
            let mut text = String::new();
            match json::write_json(inv.heap(), value, &mut text) {
                Ok(()) => inv.heap_mut().alloc_string(&text),
                Err(err) => inv.error(&err.to_string()),
            }
        },
    }],
    default: reject,
};

#[cfg(test)]
mod tests;
