//! Throwing, catching and formatting errors.

use rheo_term::{Condition, TermId, TermType};

use crate::dispatch::Strictness::{Eager, Lazy, Strict};
use crate::dispatch::{reject, BuiltinDef, Guard, Invocation, Overload, Signature};

/// Errors shown in full before the list is truncated.
const MAX_LISTED_ERRORS: usize = 10;

/// Raise a value as an error.
///
/// A record named `AggregateError` with a non-empty `errors` list raises one
/// condition per nested error, unwrapping nested aggregates recursively.
pub(super) static THROW: BuiltinDef = BuiltinDef {
    name: "Throw",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any],
        handler: throw,
    }],
    default: reject,
};

fn throw(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let mut payloads = Vec::new();
    if let Err(signal) = aggregate_payloads(inv, args[0], &mut payloads) {
        return signal;
    }
    let heap = inv.heap_mut();
    let conditions: Vec<TermId> = payloads
        .into_iter()
        .map(|payload| heap.condition(Condition::Error(payload)))
        .collect();
    heap.signal(&conditions)
}

/// Payloads raised by `error`. Record fields are forced as they are read.
fn aggregate_payloads(
    inv: &mut Invocation<'_, '_>,
    error: TermId,
    out: &mut Vec<TermId>,
) -> Result<(), TermId> {
    match aggregate_errors(inv, error)? {
        Some(errors) => {
            for nested in errors {
                let nested = inv.evaluate(nested);
                if inv.heap().is_signal(nested) {
                    return Err(nested);
                }
                aggregate_payloads(inv, nested, out)?;
            }
        }
        None => out.push(error),
    }
    Ok(())
}

/// The non-empty `errors` list of an `AggregateError` record.
fn aggregate_errors(
    inv: &mut Invocation<'_, '_>,
    error: TermId,
) -> Result<Option<Vec<TermId>>, TermId> {
    let Some(name) = inv.heap().record_field(error, "name") else {
        return Ok(None);
    };
    let name = inv.evaluate(name);
    if inv.heap().is_signal(name) {
        return Err(name);
    }
    if inv.heap().as_str(name) != Some("AggregateError") {
        return Ok(None);
    }
    let Some(errors) = inv.heap().record_field(error, "errors") else {
        return Ok(None);
    };
    let errors = inv.evaluate(errors);
    if inv.heap().is_signal(errors) {
        return Err(errors);
    }
    Ok(inv
        .heap()
        .as_list(errors)
        .filter(|errors| !errors.is_empty())
        .map(<[TermId]>::to_vec))
}

/// Render error records as one newline-separated message.
pub(super) static FORMAT_ERROR_MESSAGE: BuiltinDef = BuiltinDef {
    name: "FormatErrorMessage",
    signature: Signature::fixed(&[Strict]),
    overloads: &[
        Overload {
            guards: &[Guard::Type(TermType::Record)],
            handler: |inv, args| {
                let message = error_message(inv, args[0]);
                inv.heap_mut().alloc_string(&message)
            },
        },
        Overload {
            guards: &[Guard::Iterable],
            handler: format_error_list,
        },
    ],
    default: reject,
};

fn format_error_list(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let errors = match inv.collect_evaluated(args[0]) {
        Ok(errors) => errors,
        Err(signal) => return signal,
    };
    let shown = if errors.len() > MAX_LISTED_ERRORS {
        MAX_LISTED_ERRORS - 1
    } else {
        errors.len()
    };
    let mut lines: Vec<String> = errors[..shown]
        .iter()
        .map(|&error| error_message(inv, error))
        .collect();
    if shown < errors.len() {
        lines.push(format!("...{} more errors", errors.len() - shown));
    }
    let message = lines.join("\n");
    inv.heap_mut().alloc_string(&message)
}

/// The `message` field of an error record, a raw string, or the display form.
fn error_message(inv: &mut Invocation<'_, '_>, error: TermId) -> String {
    if let Some(message) = inv.heap().record_field(error, "message") {
        let message = inv.evaluate(message);
        if let Some(text) = inv.heap().as_str(message) {
            return text.to_owned();
        }
    }
    let heap = inv.heap();
    match heap.as_str(error) {
        Some(text) => text.to_owned(),
        None => heap.display(error).to_string(),
    }
}

/// `IfError(value, handler)`: on an error signal, call `handler` with the
/// list of error payloads. Pending conditions take precedence and are
/// passed through.
pub(super) static IF_ERROR: BuiltinDef = BuiltinDef {
    name: "IfError",
    signature: Signature::fixed(&[Eager, Strict]),
    overloads: &[Overload {
        guards: &[Guard::Any, Guard::Callable],
        handler: if_error,
    }],
    default: reject,
};

fn if_error(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let (value, handler) = (args[0], args[1]);
    let heap = inv.heap_mut();
    if !heap.is_signal(value) {
        return value;
    }
    let conditions = heap.signal_conditions(value).to_vec();
    let mut payloads = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let payload = match heap.as_condition(condition) {
            Some(Condition::Pending) => return heap.pending_signal(),
            Some(Condition::Error(payload)) => payload,
            Some(Condition::InvalidFunctionArgs { target, .. }) => {
                let message = format!("Invalid arguments for {}", heap.display(target));
                heap.error_record("InvalidFunctionArgs", &message)
            }
            Some(Condition::InvalidJson { offset, .. }) => {
                let message = format!("Invalid JSON at byte {offset}");
                heap.error_record("InvalidJson", &message)
            }
            None => condition,
        };
        payloads.push(payload);
    }
    let errors = heap.list(&payloads);
    heap.apply(handler, &[errors])
}

/// `IfPending(value, fallback)`: `fallback` when `value` is only pending.
pub(super) static IF_PENDING: BuiltinDef = BuiltinDef {
    name: "IfPending",
    signature: Signature::fixed(&[Eager, Lazy]),
    overloads: &[Overload {
        guards: &[Guard::Any, Guard::Any],
        handler: |inv, args| {
            if inv.heap().is_pending_signal(args[0]) {
                args[1]
            } else {
                args[0]
            }
        },
    }],
    default: reject,
};

/// Combined signal of the items of an iterable, or `null` if none failed.
pub(super) static COLLECT_SIGNAL: BuiltinDef = BuiltinDef {
    name: "CollectSignal",
    signature: Signature::fixed(&[Strict]),
    overloads: &[Overload {
        guards: &[Guard::Iterable],
        handler: collect_signal,
    }],
    default: reject,
};

fn collect_signal(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    let items = match inv.collect(args[0]) {
        Ok(items) => items,
        Err(signal) => return signal,
    };
    let values: Vec<TermId> = items.into_iter().map(|item| inv.evaluate(item)).collect();
    inv.heap_mut()
        .combine_signals(&values)
        .unwrap_or(TermId::NIL)
}

pub(super) static PENDING: BuiltinDef = BuiltinDef {
    name: "Pending",
    signature: Signature::fixed(&[]),
    overloads: &[Overload {
        guards: &[],
        handler: |inv, _| inv.heap_mut().pending_signal(),
    }],
    default: reject,
};
