//! Lookup, persistent updates and resolution of collections.
//!
//! Updates never touch their input: `Insert`, `Push` and friends allocate a
//! new collection sharing unchanged children with the original.

use rheo_term::{TermId, TermKind, TermType};

use crate::dispatch::Strictness::{Lazy, Strict};
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};
use crate::iterator;
use crate::stack::ensure_sufficient_stack;

const LIST: Guard = Guard::Type(TermType::List);
const RECORD: Guard = Guard::Type(TermType::Record);
const HASHMAP: Guard = Guard::Type(TermType::Hashmap);
const HASHSET: Guard = Guard::Type(TermType::Hashset);
const STRING: Guard = Guard::Type(TermType::String);
const INT: Guard = Guard::Type(TermType::Int);

/// Value under a key, or `null`.
pub(super) static LOOKUP: BuiltinDef = BuiltinDef {
    name: "Lookup",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[
        Overload {
            guards: &[RECORD, Guard::Any],
            handler: |inv, args| inv.heap().record_get(args[0], args[1]).unwrap_or(TermId::NIL),
        },
        Overload {
            guards: &[HASHMAP, Guard::Any],
            handler: |inv, args| inv.heap().hashmap_get(args[0], args[1]).unwrap_or(TermId::NIL),
        },
        Overload {
            guards: &[LIST, INT],
            handler: |inv, args| {
                let heap = inv.heap();
                heap.as_int(args[1])
                    .and_then(|index| usize::try_from(index).ok())
                    .and_then(|index| heap.list_item(args[0], index))
                    .unwrap_or(TermId::NIL)
            },
        },
    ],
    default: reject,
};

/// Persistent `collection[key] = value`. The value is stored unevaluated.
pub(super) static INSERT: BuiltinDef = BuiltinDef {
    name: "Insert",
    signature: Signature::fixed(&[Strict, Strict, Lazy]),
    overloads: &[
        Overload {
            guards: &[RECORD, Guard::Any],
            handler: |inv, args| inv.heap_mut().record_set(args[0], args[1], args[2]),
        },
        Overload {
            guards: &[HASHMAP, Guard::Any],
            handler: |inv, args| inv.heap_mut().hashmap_set(args[0], args[1], args[2]),
        },
        Overload {
            guards: &[LIST, INT],
            handler: list_set,
        },
    ],
    default: reject,
};

fn list_set(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let heap = inv.heap();
    let index = heap
        .as_int(args[1])
        .and_then(|index| usize::try_from(index).ok())
        .filter(|&index| index < heap.list_len(args[0]));
    let Some(index) = index else {
        return inv.invalid_args(args);
    };
    let mut items = heap.as_list(args[0]).map(<[TermId]>::to_vec).unwrap_or_default();
    items[index] = args[2];
    inv.heap_mut().list(&items)
}

pub(super) static CONTAINS: BuiltinDef = BuiltinDef {
    name: "Contains",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[
        Overload {
            guards: &[HASHSET, Guard::Any],
            handler: |inv, args| {
                let heap = inv.heap();
                heap.boolean(heap.hashset_has(args[0], args[1]))
            },
        },
        Overload {
            guards: &[HASHMAP, Guard::Any],
            handler: |inv, args| {
                let heap = inv.heap();
                heap.boolean(heap.hashmap_has(args[0], args[1]))
            },
        },
        Overload {
            guards: &[RECORD, Guard::Any],
            handler: |inv, args| {
                let heap = inv.heap();
                heap.boolean(heap.record_get(args[0], args[1]).is_some())
            },
        },
        Overload {
            guards: &[STRING, STRING],
            handler: |inv, args| {
                let heap = inv.heap();
                let found = match (heap.as_str(args[0]), heap.as_str(args[1])) {
                    (Some(text), Some(needle)) => text.contains(needle),
                    _ => false,
                };
                heap.boolean(found)
            },
        },
        Overload {
            guards: &[Guard::Iterable, Guard::Any],
            handler: iterable_contains,
        },
    ],
    default: reject,
};

fn iterable_contains(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let (iterable, needle) = (args[0], args[1]);
    let mut cursor = iterator::Cursor::Start;
    loop {
        match inv.next(iterable, &cursor) {
            Ok(Some((item, advanced))) => {
                let item = inv.evaluate(item);
                if inv.heap().equals(item, needle) {
                    return TermId::TRUE;
                }
                cursor = advanced;
            }
            Ok(None) => return TermId::FALSE,
            Err(signal) => return signal,
        }
    }
}

/// Item count of a finite iterable (characters for strings).
pub(super) static LENGTH: BuiltinDef = BuiltinDef {
    name: "Length",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| match iterator::count(inv, args[0]) {
            Ok(count) => inv.heap_mut().int(count as i64),
            Err(signal) => signal,
        },
    }],
    default: reject,
};

/// Append to a list, or add to a hashset.
pub(super) static PUSH: BuiltinDef = BuiltinDef {
    name: "Push",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[
        Overload {
            guards: &[LIST, Guard::Any],
            handler: |inv, args| inv.heap_mut().list_push(args[0], args[1]),
        },
        Overload {
            guards: &[HASHSET, Guard::Any],
            handler: |inv, args| inv.heap_mut().hashset_add(args[0], args[1]),
        },
    ],
    default: reject,
};

pub(super) static PUSH_FRONT: BuiltinDef = BuiltinDef {
    name: "PushFront",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[LIST, Guard::Any],
        handler: |inv, args| inv.heap_mut().list_push_front(args[0], args[1]),
    }],
    default: reject,
};

/// Concatenate lists or strings; every argument must match the first.
pub(super) static CONCAT: BuiltinDef = BuiltinDef {
    name: "Concat",
    signature: Signature::variadic(&[Strict], Strict),
    overloads: &[
        Overload {
            guards: &[LIST],
            handler: |inv, args| {
                if !all_of_type(inv, args, TermType::List) {
                    return inv.invalid_args(args);
                }
                let heap = inv.heap_mut();
                args[1..]
                    .iter()
                    .fold(args[0], |acc, &list| heap.list_concat(acc, list))
            },
        },
        Overload {
            guards: &[STRING],
            handler: |inv, args| {
                if !all_of_type(inv, args, TermType::String) {
                    return inv.invalid_args(args);
                }
                let mut builder = inv.heap_mut().begin_string();
                for &part in args {
                    builder.push_term(part);
                }
                builder.finish()
            },
        },
    ],
    default: reject,
};

fn all_of_type(inv: &Invocation<'_, '_>, args: &[TermId], ty: TermType) -> bool {
    args.iter().all(|&arg| inv.heap().term_type(arg) == ty)
}

/// `Slice(collection, start[, end])` with negative indices counted from the
/// end and bounds clamped.
pub(super) static SLICE: BuiltinDef = BuiltinDef {
    name: "Slice",
    signature: Signature::variadic(&[Strict, Strict], Strict),
    overloads: &[
        Overload {
            guards: &[LIST, INT],
            handler: |inv, args| match slice_bounds(inv, args) {
                Some((start, end)) => inv.heap_mut().list_slice(args[0], start, end),
                None => inv.invalid_args(args),
            },
        },
        Overload {
            guards: &[STRING, INT],
            handler: |inv, args| {
                let Some((start, end)) = slice_bounds(inv, args) else {
                    return inv.invalid_args(args);
                };
                let slice: String = inv
                    .heap()
                    .as_str(args[0])
                    .unwrap_or_default()
                    .chars()
                    .skip(start)
                    .take(end - start)
                    .collect();
                inv.heap_mut().alloc_string(&slice)
            },
        },
    ],
    default: reject,
};

/// Resolve `start`/`end` arguments against the collection length.
fn slice_bounds(inv: &Invocation<'_, '_>, args: &[TermId]) -> Option<(usize, usize)> {
    let heap = inv.heap();
    if args.len() > 3 {
        return None;
    }
    let len = heap.collection_len(args[0])?;
    let resolve = |index: i64| -> usize {
        if index < 0 {
            len.saturating_sub(index.unsigned_abs() as usize)
        } else {
            (index as usize).min(len)
        }
    };
    let start = resolve(heap.as_int(args[1])?);
    let end = match args.get(2) {
        Some(&end) => resolve(heap.as_int(end)?),
        None => len,
    };
    Some((start, end.max(start)))
}

/// Merge records (or hashmaps); later arguments win.
pub(super) static MERGE: BuiltinDef = BuiltinDef {
    name: "Merge",
    signature: Signature::variadic(&[Strict], Strict),
    overloads: &[
        Overload {
            guards: &[RECORD],
            handler: |inv, args| {
                if !all_of_type(inv, args, TermType::Record) {
                    return inv.invalid_args(args);
                }
                let heap = inv.heap_mut();
                let entries: Vec<(TermId, TermId)> = args
                    .iter()
                    .flat_map(|&record| heap.record_entries(record))
                    .collect();
                heap.record_from_entries(&entries)
            },
        },
        Overload {
            guards: &[HASHMAP],
            handler: |inv, args| {
                if !all_of_type(inv, args, TermType::Hashmap) {
                    return inv.invalid_args(args);
                }
                let heap = inv.heap_mut();
                let mut merged = args[0];
                for &map in &args[1..] {
                    for (key, value) in heap.hashmap_entries(map) {
                        merged = heap.hashmap_set(merged, key, value);
                    }
                }
                merged
            },
        },
    ],
    default: reject,
};

/// `[key, value]` pairs of a record or hashmap.
pub(super) static ENTRIES: BuiltinDef = BuiltinDef {
    name: "Entries",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::OneOf(&[TermType::Record, TermType::Hashmap])],
        handler: |inv, args| match iterator::collect_list(inv, args[0]) {
            Ok(list) => list,
            Err(signal) => signal,
        },
    }],
    default: reject,
};

/// Evaluate every item of a list.
pub(super) static RESOLVE_LIST: BuiltinDef = BuiltinDef {
    name: "ResolveList",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[LIST],
        handler: |inv, args| {
            if inv.heap().is_atomic(args[0]) {
                return args[0];
            }
            match inv.collect_evaluated(args[0]) {
                Ok(items) => inv.heap_mut().list(&items),
                Err(signal) => signal,
            }
        },
    }],
    default: reject,
};

/// Evaluate every value of a record, keeping its keys.
pub(super) static RESOLVE_RECORD: BuiltinDef = BuiltinDef {
    name: "ResolveRecord",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[RECORD],
        handler: |inv, args| {
            let TermKind::Record { keys, values } = *inv.heap().kind(args[0]) else {
                return inv.invalid_args(args);
            };
            if inv.heap().is_atomic(values) {
                return args[0];
            }
            match inv.collect_evaluated(values) {
                Ok(items) => {
                    let heap = inv.heap_mut();
                    let values = heap.list(&items);
                    heap.record(keys, values)
                }
                Err(signal) => signal,
            }
        },
    }],
    default: reject,
};

/// Evaluate a value and, recursively, everything inside its lists, records
/// and hashmaps. Iterators are left lazy.
pub(super) static RESOLVE_DEEP: BuiltinDef = BuiltinDef {
    name: "ResolveDeep",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| resolve_deep(inv, args[0]).unwrap_or_else(|signal| signal),
    }],
    default: reject,
};

/// Deeply evaluate `term`; all signals found are combined into `Err`.
pub(super) fn resolve_deep(inv: &mut Invocation<'_, '_>, term: TermId) -> Result<TermId, TermId> {
    let value = inv.evaluate(term);
    if inv.heap().is_atomic(value) {
        return Ok(value);
    }
    ensure_sufficient_stack(|| match *inv.heap().kind(value) {
        TermKind::Signal(_) => Err(value),
        TermKind::List(range) => {
            let items = inv.heap().get_list(range).to_vec();
            let resolved = resolve_all(inv, &items)?;
            Ok(inv.heap_mut().list(&resolved))
        }
        TermKind::Record { keys, values } => {
            let items = inv.heap().as_list(values).map(<[TermId]>::to_vec).unwrap_or_default();
            let resolved = resolve_all(inv, &items)?;
            let heap = inv.heap_mut();
            let values = heap.list(&resolved);
            Ok(heap.record(keys, values))
        }
        TermKind::Hashmap(_) => {
            let entries = inv.heap().hashmap_entries(value);
            let values: Vec<TermId> = entries.iter().map(|&(_, value)| value).collect();
            let resolved = resolve_all(inv, &values)?;
            let entries: Vec<(TermId, TermId)> = entries
                .iter()
                .zip(resolved)
                .map(|(&(key, _), value)| (key, value))
                .collect();
            Ok(inv.heap_mut().hashmap(&entries))
        }
        _ => Ok(value),
    })
}

fn resolve_all(inv: &mut Invocation<'_, '_>, terms: &[TermId]) -> Result<Vec<TermId>, TermId> {
    let mut resolved = Vec::with_capacity(terms.len());
    let mut signals = Vec::new();
    for &term in terms {
        match resolve_deep(inv, term) {
            Ok(value) => resolved.push(value),
            Err(signal) => signals.push(signal),
        }
    }
    match inv.heap_mut().combine_signals(&signals) {
        Some(signal) => Err(signal),
        None => Ok(resolved),
    }
}

#[cfg(test)]
mod tests;
