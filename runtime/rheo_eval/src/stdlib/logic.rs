//! Comparison, boolean logic and branching.
//!
//! `And`, `Or` and `If` take their branches lazily and return the chosen
//! branch unevaluated, so it is reduced in tail position.

use std::cmp::Ordering;

use rheo_term::{Heap, TermId, TermKind, TermType};

use crate::dispatch::Strictness::{Lazy, Strict};
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};

/// Structural equality, with `Int` and `Float` compared numerically.
pub(super) static EQ: BuiltinDef = BuiltinDef {
    name: "Eq",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any, Guard::Any],
        handler: |inv, args| {
            let heap = inv.heap();
            let equal = match (heap.as_number(args[0]), heap.as_number(args[1])) {
                (Some(a), Some(b)) => numeric_eq(heap, args[0], args[1], a, b),
                _ => heap.equals(args[0], args[1]),
            };
            heap.boolean(equal)
        },
    }],
    default: reject,
};

fn numeric_eq(heap: &Heap, left: TermId, right: TermId, a: f64, b: f64) -> bool {
    match (heap.as_int(left), heap.as_int(right)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Order two comparable terms: numbers, strings or timestamps.
fn compare(heap: &Heap, left: TermId, right: TermId) -> Option<Ordering> {
    match (*heap.kind(left), *heap.kind(right)) {
        (TermKind::Int(a), TermKind::Int(b)) | (TermKind::Timestamp(a), TermKind::Timestamp(b)) => {
            Some(a.cmp(&b))
        }
        (TermKind::String(a), TermKind::String(b)) => Some(heap.get_str(a).cmp(heap.get_str(b))),
        _ => heap.as_number(left)?.partial_cmp(&heap.as_number(right)?),
    }
}

/// Defines a comparison builtin over numbers, strings and timestamps.
macro_rules! comparison {
    ($def:ident, $name:literal, $handler:ident, $test:expr) => {
        fn $handler(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
            let test: fn(Ordering) -> bool = $test;
            match compare(inv.heap(), args[0], args[1]) {
                Some(ordering) => inv.heap().boolean(test(ordering)),
                // NaN operands are unordered.
                None => TermId::FALSE,
            }
        }

        pub(super) static $def: BuiltinDef = BuiltinDef {
            name: $name,
            signature: Signature::fixed(&[Strict, Strict]),
            overloads: &[
                Overload {
                    guards: &[Guard::Numeric, Guard::Numeric],
                    handler: $handler,
                },
                Overload {
                    guards: &[Guard::Type(TermType::String), Guard::Type(TermType::String)],
                    handler: $handler,
                },
                Overload {
                    guards: &[
                        Guard::Type(TermType::Timestamp),
                        Guard::Type(TermType::Timestamp),
                    ],
                    handler: $handler,
                },
            ],
            default: reject,
        };
    };
}

comparison!(GT, "Gt", gt, Ordering::is_gt);
comparison!(GTE, "Gte", gte, Ordering::is_ge);
comparison!(LT, "Lt", lt, Ordering::is_lt);
comparison!(LTE, "Lte", lte, Ordering::is_le);

pub(super) static NOT: BuiltinDef = BuiltinDef {
    name: "Not",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| {
            let heap = inv.heap();
            heap.boolean(!heap.is_truthy(args[0]))
        },
    }],
    default: reject,
};

/// `a && b`: `a` if falsy, otherwise `b`.
pub(super) static AND: BuiltinDef = BuiltinDef {
    name: "And",
    signature: Signature::fixed(&[Strict, Lazy]),
    overloads: &[Overload {
        guards: &[Guard::Any, Guard::Any],
        handler: |inv, args| {
            if inv.heap().is_truthy(args[0]) {
                args[1]
            } else {
                args[0]
            }
        },
    }],
    default: reject,
};

/// `a || b`: `a` if truthy, otherwise `b`.
pub(super) static OR: BuiltinDef = BuiltinDef {
    name: "Or",
    signature: Signature::fixed(&[Strict, Lazy]),
    overloads: &[Overload {
        guards: &[Guard::Any, Guard::Any],
        handler: |inv, args| {
            if inv.heap().is_truthy(args[0]) {
                args[0]
            } else {
                args[1]
            }
        },
    }],
    default: reject,
};

pub(super) static IF: BuiltinDef = BuiltinDef {
    name: "If",
    signature: Signature::fixed(&[Strict, Lazy, Lazy]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: |inv, args| {
            if inv.heap().is_truthy(args[0]) {
                args[1]
            } else {
                args[2]
            }
        },
    }],
    default: reject,
};

#[cfg(test)]
mod tests;
