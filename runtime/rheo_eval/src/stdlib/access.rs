//! Accessor dispatch, application, sequencing and state reads.

use rheo_term::{StateToken, TermId, TermType};

use super::{bind_method, Stdlib};
use crate::dispatch::Strictness::{Lazy, Strict};
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};

pub(super) static ACCESSOR: BuiltinDef = BuiltinDef {
    name: "Accessor",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Type(TermType::Record), Guard::Any],
            handler: record_field,
        },
        Overload {
            guards: &[Guard::Type(TermType::List), Guard::Type(TermType::Int)],
            handler: list_index,
        },
        Overload {
            guards: &[Guard::Type(TermType::String), Guard::Type(TermType::Int)],
            handler: string_index,
        },
        Overload {
            guards: &[Guard::Type(TermType::List), Guard::Type(TermType::String)],
            handler: list_method,
        },
        Overload {
            guards: &[Guard::Type(TermType::String), Guard::Type(TermType::String)],
            handler: string_method,
        },
        Overload {
            guards: &[Guard::Type(TermType::Hashmap), Guard::Type(TermType::String)],
            handler: hashmap_method,
        },
        Overload {
            guards: &[Guard::Type(TermType::Hashset), Guard::Type(TermType::String)],
            handler: hashset_method,
        },
        Overload {
            guards: &[Guard::Iterable, Guard::Type(TermType::String)],
            handler: iterator_method,
        },
    ],
    default: reject,
};

const LIST_METHODS: &[(&str, Stdlib)] = &[
    ("map", Stdlib::Map),
    ("filter", Stdlib::Filter),
    ("flatMap", Stdlib::FlatMap),
    ("flatten", Stdlib::Flatten),
    ("push", Stdlib::Push),
    ("slice", Stdlib::Slice),
    ("concat", Stdlib::Concat),
    ("join", Stdlib::Join),
    ("includes", Stdlib::Contains),
    ("zip", Stdlib::Zip),
    ("take", Stdlib::Take),
    ("skip", Stdlib::Skip),
    ("chain", Stdlib::Chain),
];

const STRING_METHODS: &[(&str, Stdlib)] = &[
    ("split", Stdlib::Split),
    ("replace", Stdlib::Replace),
    ("startsWith", Stdlib::StartsWith),
    ("endsWith", Stdlib::EndsWith),
    ("slice", Stdlib::Slice),
    ("concat", Stdlib::Concat),
    ("includes", Stdlib::Contains),
];

const HASHMAP_METHODS: &[(&str, Stdlib)] = &[
    ("get", Stdlib::Lookup),
    ("set", Stdlib::Insert),
    ("has", Stdlib::Contains),
    ("keys", Stdlib::Keys),
    ("values", Stdlib::Values),
    ("entries", Stdlib::Entries),
];

const HASHSET_METHODS: &[(&str, Stdlib)] = &[
    ("has", Stdlib::Contains),
    ("add", Stdlib::Push),
    ("values", Stdlib::Values),
];

const ITERATOR_METHODS: &[(&str, Stdlib)] = &[
    ("map", Stdlib::Map),
    ("filter", Stdlib::Filter),
    ("flatMap", Stdlib::FlatMap),
    ("flatten", Stdlib::Flatten),
    ("zip", Stdlib::Zip),
    ("take", Stdlib::Take),
    ("skip", Stdlib::Skip),
    ("chain", Stdlib::Chain),
    ("collect", Stdlib::CollectList),
];

fn record_field(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    inv.heap().record_get(args[0], args[1]).unwrap_or(TermId::NIL)
}

fn list_index(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let heap = inv.heap();
    heap.as_int(args[1])
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| heap.list_item(args[0], index))
        .unwrap_or(TermId::NIL)
}

fn string_index(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let heap = inv.heap();
    let ch = heap
        .as_int(args[1])
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| heap.as_str(args[0])?.chars().nth(index));
    match ch {
        Some(ch) => {
            let mut buf = [0u8; 4];
            inv.heap_mut().alloc_string(ch.encode_utf8(&mut buf))
        }
        None => TermId::NIL,
    }
}

/// Resolve a method name against a table, binding the receiver.
fn method(
    inv: &mut Invocation<'_, '_>,
    args: &[TermId],
    table: &[(&str, Stdlib)],
) -> TermId {
    let found = inv.heap().as_str(args[1]).and_then(|name| {
        table
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, builtin)| builtin)
    });
    match found {
        Some(builtin) => bind_method(inv, builtin, args[0]),
        None => inv.invalid_args(args),
    }
}

/// `length`/`size` properties evaluate directly to the item count.
fn size_property(inv: &mut Invocation<'_, '_>, args: &[TermId], property: &str) -> Option<TermId> {
    let heap = inv.heap();
    if heap.as_str(args[1]) != Some(property) {
        return None;
    }
    let len = heap.collection_len(args[0])?;
    Some(inv.heap_mut().int(len as i64))
}

fn list_method(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    size_property(inv, args, "length").unwrap_or_else(|| method(inv, args, LIST_METHODS))
}

fn string_method(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    size_property(inv, args, "length").unwrap_or_else(|| method(inv, args, STRING_METHODS))
}

fn hashmap_method(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    size_property(inv, args, "size").unwrap_or_else(|| method(inv, args, HASHMAP_METHODS))
}

fn hashset_method(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    size_property(inv, args, "size").unwrap_or_else(|| method(inv, args, HASHSET_METHODS))
}

fn iterator_method(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    method(inv, args, ITERATOR_METHODS)
}

pub(super) static APPLY: BuiltinDef = BuiltinDef {
    name: "Apply",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Callable, Guard::Type(TermType::List)],
        handler: |inv, args| {
            let heap = inv.heap_mut();
            let call_args = heap.as_list(args[1]).map(<[TermId]>::to_vec).unwrap_or_default();
            heap.apply(args[0], &call_args)
        },
    }],
    default: reject,
};

/// Evaluates every item but the last in order; the last is the result.
pub(super) static SEQUENCE: BuiltinDef = BuiltinDef {
    name: "Sequence",
    signature: Signature::variadic(&[], Lazy),
    overloads: &[Overload {
        guards: &[],
        handler: sequence,
    }],
    default: reject,
};

fn sequence(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let Some((&last, init)) = args.split_last() else {
        return TermId::NIL;
    };
    for &item in init {
        let value = inv.evaluate(item);
        if inv.heap().is_signal(value) {
            return value;
        }
    }
    last
}

/// Read a state key. Absent values are pending.
pub(super) static GET: BuiltinDef = BuiltinDef {
    name: "Get",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| {
            let token = StateToken::of(inv.heap(), args[0]);
            read_or_pending(inv, token)
        },
    }],
    default: reject,
};

/// Read the host clock.
pub(super) static NOW: BuiltinDef = BuiltinDef {
    name: "Now",
    signature: Signature::fixed(&[]),
    overloads: &[Overload {
        guards: &[],
        handler: |inv, _| read_or_pending(inv, StateToken::CLOCK),
    }],
    default: reject,
};

fn read_or_pending(inv: &mut Invocation<'_, '_>, token: StateToken) -> TermId {
    match inv.read_state(token) {
        Some(value) => value,
        None => {
            tracing::trace!(?token, "state value not available");
            inv.heap_mut().pending_signal()
        }
    }
}
