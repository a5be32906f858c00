//! Lazy sequence constructors and consumers.
//!
//! Constructors only allocate iterator terms; nothing is forced until a
//! consumer (`Fold`, the `Collect*` family, `Length`, `Join`, ...) walks them.

use rheo_term::{TermId, TermType};

use crate::dispatch::Strictness::Strict;
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};
use crate::iterator;

const INT: Guard = Guard::Type(TermType::Int);

/// Defines `Name(iterable, callable)` building an iterator term.
macro_rules! transform {
    ($def:ident, $name:literal, $build:ident) => {
        pub(super) static $def: BuiltinDef = BuiltinDef {
            name: $name,
            signature: Signature::fixed(&[Strict, Strict]),
            overloads: &[Overload {
                guards: &[Guard::Iterable, Guard::Callable],
                handler: |inv, args| inv.heap_mut().$build(args[0], args[1]),
            }],
            default: reject,
        };
    };
}

transform!(MAP, "Map", map_iterator);
transform!(FILTER, "Filter", filter_iterator);
transform!(FLAT_MAP, "FlatMap", flat_map_iterator);

pub(super) static FLATTEN: BuiltinDef = BuiltinDef {
    name: "Flatten",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| inv.heap_mut().flatten_iterator(args[0]),
    }],
    default: reject,
};

/// Concatenate any number of iterables.
pub(super) static CHAIN: BuiltinDef = BuiltinDef {
    name: "Chain",
    signature: Signature::variadic(&[], Strict),
    overloads: &[Overload {
        guards: &[],
        handler: |inv, args| {
            let heap = inv.heap();
            if !args.iter().all(|&arg| heap.term_type(arg).is_iterable()) {
                return inv.invalid_args(args);
            }
            match args {
                [] => TermId::EMPTY_ITERATOR,
                _ => inv.heap_mut().chain_iterator(args),
            }
        },
    }],
    default: reject,
};

pub(super) static ZIP: BuiltinDef = BuiltinDef {
    name: "Zip",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable, Guard::Iterable],
        handler: |inv, args| inv.heap_mut().zip_iterator(args[0], args[1]),
    }],
    default: reject,
};

/// Non-negative count argument, saturated to `u32`.
fn count_arg(inv: &Invocation<'_, '_>, arg: TermId) -> Option<u32> {
    let n = inv.heap().as_int(arg)?;
    if n < 0 {
        return None;
    }
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}

pub(super) static SKIP: BuiltinDef = BuiltinDef {
    name: "Skip",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable, INT],
        handler: |inv, args| match count_arg(inv, args[1]) {
            Some(count) => inv.heap_mut().skip_iterator(args[0], count),
            None => inv.invalid_args(args),
        },
    }],
    default: reject,
};

pub(super) static TAKE: BuiltinDef = BuiltinDef {
    name: "Take",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable, INT],
        handler: |inv, args| match count_arg(inv, args[1]) {
            Some(count) => inv.heap_mut().take_iterator(args[0], count),
            None => inv.invalid_args(args),
        },
    }],
    default: reject,
};

pub(super) static REPEAT: BuiltinDef = BuiltinDef {
    name: "Repeat",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| inv.heap_mut().repeat_iterator(args[0]),
    }],
    default: reject,
};

pub(super) static ONCE: BuiltinDef = BuiltinDef {
    name: "Once",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| inv.heap_mut().once_iterator(args[0]),
    }],
    default: reject,
};

/// `Range(start, count)`: `start, start + 1, ...` for `count` items.
pub(super) static RANGE: BuiltinDef = BuiltinDef {
    name: "Range",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[INT, INT],
        handler: |inv, args| {
            let heap = inv.heap_mut();
            let start = heap.as_int(args[0]).unwrap_or_default();
            let len = heap.as_int(args[1]).unwrap_or_default().max(0) as u64;
            heap.range_iterator(start, len)
        },
    }],
    default: reject,
};

pub(super) static INTEGERS: BuiltinDef = BuiltinDef {
    name: "Integers",
    signature: Signature::fixed(&[]),
    overloads: &[Overload {
        guards: &[],
        handler: |_, _| TermId::INTEGERS,
    }],
    default: reject,
};

/// Force every item of an iterable as it is produced.
pub(super) static EVALUATE: BuiltinDef = BuiltinDef {
    name: "Evaluate",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| inv.heap_mut().evaluate_iterator(args[0]),
    }],
    default: reject,
};

pub(super) static KEYS: BuiltinDef = BuiltinDef {
    name: "Keys",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Type(TermType::Hashmap)],
            handler: |inv, args| inv.heap_mut().hashmap_keys_iterator(args[0]),
        },
        Overload {
            guards: &[Guard::Type(TermType::Record)],
            handler: |inv, args| inv.heap().record_keys(args[0]).unwrap_or(TermId::EMPTY_LIST),
        },
    ],
    default: reject,
};

pub(super) static VALUES: BuiltinDef = BuiltinDef {
    name: "Values",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Type(TermType::Hashmap)],
            handler: |inv, args| inv.heap_mut().hashmap_values_iterator(args[0]),
        },
        Overload {
            guards: &[Guard::Type(TermType::Record)],
            handler: |inv, args| inv.heap().record_values(args[0]).unwrap_or(TermId::EMPTY_LIST),
        },
        Overload {
            guards: &[Guard::Type(TermType::Hashset)],
            handler: |inv, args| {
                let heap = inv.heap_mut();
                let items = heap.hashset_items(args[0]);
                heap.list(&items)
            },
        },
    ],
    default: reject,
};

/// `Fold(iterable, seed, reducer)` with `reducer(accumulator, item)`.
pub(super) static FOLD: BuiltinDef = BuiltinDef {
    name: "Fold",
    signature: Signature::fixed(&[Strict, Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable, Guard::Any, Guard::Callable],
        handler: |inv, args| iterator::fold(inv, args[0], args[1], args[2]),
    }],
    default: reject,
};

/// Items of a finite iterable as a list, each evaluated.
pub(super) static COLLECT_LIST: BuiltinDef = BuiltinDef {
    name: "CollectList",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| match inv.collect_evaluated(args[0]) {
            Ok(items) => inv.heap_mut().list(&items),
            Err(signal) => signal,
        },
    }],
    default: reject,
};

pub(super) static COLLECT_HASHSET: BuiltinDef = BuiltinDef {
    name: "CollectHashset",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| match inv.collect_evaluated(args[0]) {
            Ok(items) => inv.heap_mut().hashset(&items),
            Err(signal) => signal,
        },
    }],
    default: reject,
};

/// Hashmap from `[key, value]` pairs.
pub(super) static COLLECT_HASHMAP: BuiltinDef = BuiltinDef {
    name: "CollectHashmap",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| match collect_pairs(inv, args) {
            Ok(entries) => inv.heap_mut().hashmap(&entries),
            Err(signal) => signal,
        },
    }],
    default: reject,
};

/// Record from `[key, value]` pairs.
pub(super) static COLLECT_RECORD: BuiltinDef = BuiltinDef {
    name: "CollectRecord",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: |inv, args| match collect_pairs(inv, args) {
            Ok(entries) => inv.heap_mut().record_from_entries(&entries),
            Err(signal) => signal,
        },
    }],
    default: reject,
};

/// Evaluated `[key, value]` pairs; any other item rejects the call.
fn collect_pairs(
    inv: &mut Invocation<'_, '_>,
    args: &[TermId],
) -> Result<Vec<(TermId, TermId)>, TermId> {
    let items = inv.collect_evaluated(args[0])?;
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match inv.heap().as_list(item) {
            Some(&[key, value]) => {
                let key = inv.evaluate(key);
                let value = inv.evaluate(value);
                entries.push((key, value));
            }
            _ => return Err(inv.invalid_args(args)),
        }
    }
    Ok(entries)
}
