//! Numeric operators.
//!
//! `Int` operands stay integral and use checked arithmetic: overflow and
//! division by zero yield error signals. Any `Float` operand promotes the
//! operation to `Float`.

use rheo_term::{Heap, TermId, TermKind, TermType};

use crate::dispatch::Strictness::Strict;
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};

const INT: Guard = Guard::Type(TermType::Int);

/// Defines a binary operator with an integral and a floating overload.
macro_rules! binary {
    ($def:ident, $name:literal, $int:expr, $float:expr) => {
        pub(super) static $def: BuiltinDef = BuiltinDef {
            name: $name,
            signature: Signature::fixed(&[Strict, Strict]),
            overloads: &[
                Overload {
                    guards: &[INT, INT],
                    handler: |inv, args| {
                        let op: fn(i64, i64) -> Result<i64, &'static str> = $int;
                        let (a, b) = ints(inv.heap(), args);
                        match op(a, b) {
                            Ok(n) => inv.heap_mut().int(n),
                            Err(message) => inv.error(message),
                        }
                    },
                },
                Overload {
                    guards: &[Guard::Numeric, Guard::Numeric],
                    handler: |inv, args| {
                        let op: fn(f64, f64) -> f64 = $float;
                        let (a, b) = floats(inv.heap(), args);
                        inv.heap_mut().float(op(a, b))
                    },
                },
            ],
            default: reject,
        };
    };
}

fn ints(heap: &Heap, args: &[TermId]) -> (i64, i64) {
    (
        heap.as_int(args[0]).unwrap_or_default(),
        heap.as_int(args[1]).unwrap_or_default(),
    )
}

fn floats(heap: &Heap, args: &[TermId]) -> (f64, f64) {
    (
        heap.as_number(args[0]).unwrap_or(f64::NAN),
        heap.as_number(args[1]).unwrap_or(f64::NAN),
    )
}

const OVERFLOW: &str = "Integer overflow";
const DIVISION_BY_ZERO: &str = "Division by zero";

binary!(ADD, "Add", |a, b| a.checked_add(b).ok_or(OVERFLOW), |a, b| a + b);
binary!(SUBTRACT, "Subtract", |a, b| a.checked_sub(b).ok_or(OVERFLOW), |a, b| a - b);
binary!(MULTIPLY, "Multiply", |a, b| a.checked_mul(b).ok_or(OVERFLOW), |a, b| a * b);
binary!(
    DIVIDE,
    "Divide",
    |a, b| match b {
        0 => Err(DIVISION_BY_ZERO),
        _ => a.checked_div(b).ok_or(OVERFLOW),
    },
    |a, b| a / b
);
binary!(
    REMAINDER,
    "Remainder",
    |a, b| match b {
        0 => Err(DIVISION_BY_ZERO),
        _ => a.checked_rem(b).ok_or(OVERFLOW),
    },
    |a, b| a % b
);

/// `Int ** Int` stays integral for non-negative exponents.
pub(super) static POW: BuiltinDef = BuiltinDef {
    name: "Pow",
    signature: Signature::fixed(&[Strict, Strict]),
    overloads: &[
        Overload {
            guards: &[INT, INT],
            handler: |inv, args| {
                let (base, exponent) = ints(inv.heap(), args);
                match u32::try_from(exponent) {
                    Ok(exponent) => match base.checked_pow(exponent) {
                        Some(n) => inv.heap_mut().int(n),
                        None => inv.error(OVERFLOW),
                    },
                    Err(_) => inv.heap_mut().float((base as f64).powf(exponent as f64)),
                }
            },
        },
        Overload {
            guards: &[Guard::Numeric, Guard::Numeric],
            handler: |inv, args| {
                let (base, exponent) = floats(inv.heap(), args);
                inv.heap_mut().float(base.powf(exponent))
            },
        },
    ],
    default: reject,
};

pub(super) static ABS: BuiltinDef = BuiltinDef {
    name: "Abs",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[INT],
            handler: |inv, args| match inv.heap().as_int(args[0]).and_then(i64::checked_abs) {
                Some(n) => inv.heap_mut().int(n),
                None => inv.error(OVERFLOW),
            },
        },
        Overload {
            guards: &[Guard::Type(TermType::Float)],
            handler: |inv, args| {
                let x = inv.heap().as_float(args[0]).unwrap_or(f64::NAN);
                inv.heap_mut().float(x.abs())
            },
        },
    ],
    default: reject,
};

/// Float result as an `Int` when it is integral and representable.
fn integral(heap: &mut Heap, x: f64) -> TermId {
    // `i64::MAX as f64` rounds up to 2^63, which is out of range.
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        heap.int(x as i64)
    } else {
        heap.float(x)
    }
}

/// Defines a rounding builtin: integers pass through, floats round to an
/// `Int` where possible.
macro_rules! rounding {
    ($def:ident, $name:literal, $round:path) => {
        pub(super) static $def: BuiltinDef = BuiltinDef {
            name: $name,
            signature: Signature::fixed(&[Strict]),
            overloads: &[
                Overload {
                    guards: &[INT],
                    handler: |_, args| args[0],
                },
                Overload {
                    guards: &[Guard::Type(TermType::Float)],
                    handler: |inv, args| {
                        let x = inv.heap().as_float(args[0]).unwrap_or(f64::NAN);
                        integral(inv.heap_mut(), $round(x))
                    },
                },
            ],
            default: reject,
        };
    };
}

rounding!(FLOOR, "Floor", f64::floor);
rounding!(CEIL, "Ceil", f64::ceil);
rounding!(ROUND, "Round", f64::round);

/// Defines a variadic extremum; the winning operand is returned unchanged.
macro_rules! extremum {
    ($def:ident, $name:literal, $wins:expr) => {
        pub(super) static $def: BuiltinDef = BuiltinDef {
            name: $name,
            signature: Signature::variadic(&[Strict], Strict),
            overloads: &[Overload {
                guards: &[Guard::Numeric],
                handler: |inv, args| {
                    let wins: fn(f64, f64) -> bool = $wins;
                    extremum(inv, args, wins)
                },
            }],
            default: reject,
        };
    };
}

fn extremum(inv: &mut Invocation<'_, '_>, args: &[TermId], wins: fn(f64, f64) -> bool) -> TermId {
    let heap = inv.heap();
    let mut best: Option<(TermId, f64)> = None;
    for &arg in args {
        let value = match *heap.kind(arg) {
            TermKind::Int(n) => n as f64,
            TermKind::Float(x) => x,
            _ => return inv.invalid_args(args),
        };
        match best {
            Some((_, current)) if !wins(value, current) => {}
            _ => best = Some((arg, value)),
        }
    }
    best.map_or(TermId::NIL, |(term, _)| term)
}

extremum!(MAX, "Max", |candidate, current| candidate > current);
extremum!(MIN, "Min", |candidate, current| candidate < current);
