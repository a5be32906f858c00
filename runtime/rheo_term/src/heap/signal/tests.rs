use pretty_assertions::assert_eq;

use super::*;

#[test]
fn combine_preserves_order_and_dedupes() {
    let mut heap = Heap::new();
    let a = heap.error_message_signal("a");
    let b = heap.error_message_signal("b");
    let a_again = heap.error_message_signal("a");

    let combined = heap.combine_signals(&[a, TermId::NIL, b, a_again]);
    let combined = combined.unwrap_or(TermId::NIL);
    let conditions = heap.signal_conditions(combined).to_vec();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[0], heap.signal_conditions(a)[0]);
    assert_eq!(conditions[1], heap.signal_conditions(b)[0]);
}

#[test]
fn combine_without_signals_is_none() {
    let mut heap = Heap::new();
    let one = heap.int(1);
    assert_eq!(heap.combine_signals(&[one, TermId::NIL]), None);
}

#[test]
fn single_signal_returned_unchanged() {
    let mut heap = Heap::new();
    let s = heap.pending_signal();
    assert_eq!(heap.combine_signals(&[s]), Some(s));
}

#[test]
fn pending_and_error_classification() {
    let mut heap = Heap::new();
    let pending = heap.pending_signal();
    let error = heap.error_message_signal("x");
    assert!(heap.is_pending_signal(pending));
    assert!(!heap.is_error_signal(pending));
    assert!(heap.is_error_signal(error));

    let mixed = heap.combine_signals(&[pending, error]).unwrap_or(TermId::NIL);
    assert!(!heap.is_pending_signal(mixed));
    assert!(heap.is_error_signal(mixed));
}

#[test]
fn invalid_args_condition_references_target_and_args() {
    let mut heap = Heap::new();
    let target = heap.builtin(crate::BuiltinId(4));
    let arg = heap.int(9);
    let signal = heap.invalid_args_signal(target, &[arg]);
    let condition = heap.signal_conditions(signal)[0];
    let Some(Condition::InvalidFunctionArgs { target: t, args }) = heap.as_condition(condition)
    else {
        panic!("expected InvalidFunctionArgs");
    };
    assert_eq!(t, target);
    assert_eq!(heap.as_list(args), Some(&[arg][..]));
}

#[test]
fn error_record_has_name_and_message() {
    let mut heap = Heap::new();
    let record = heap.error_record("TypeError", "bad");
    let name = heap.record_field(record, "name").and_then(|n| heap.as_str(n));
    let message = heap.record_field(record, "message").and_then(|m| heap.as_str(m));
    assert_eq!(name, Some("TypeError"));
    assert_eq!(message, Some("bad"));
}
