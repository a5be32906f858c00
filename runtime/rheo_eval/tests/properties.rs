//! Behavioral properties of the runtime, checked through the public API.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]
#![allow(
    clippy::disallowed_types,
    reason = "Proptest macros generate code with these patterns"
)]

mod common;

use common::{collect_ints, int_list, run, runtime, show};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rheo_eval::{Condition, Runtime, StateSnapshot, Stdlib, TermId};

fn small_ints() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 0..12)
}

proptest! {
    #[test]
    fn atomic_terms_evaluate_to_themselves(values in small_ints(), label in "[a-z]{0,8}") {
        let mut rt = runtime();
        let list = int_list(rt.heap_mut(), &values);
        let text = rt.heap_mut().alloc_string(&label);
        let key = rt.heap_mut().alloc_string("key");
        let term = rt.heap_mut().list(&[list, text]);
        prop_assert!(rt.heap().is_atomic(term));

        let mut state = StateSnapshot::new();
        state.write(rt.heap(), key, list);
        let evaluation = rt.evaluate(term, &state);
        prop_assert_eq!(evaluation.value, term);
        prop_assert!(evaluation.dependencies.is_empty());
    }

    #[test]
    fn iteration_is_restartable(values in small_ints(), offset in -5i64..5) {
        let mut rt = Runtime::builder().memoize(false).build();
        let list = int_list(rt.heap_mut(), &values);
        let x = rt.heap_mut().variable(0);
        let offset = rt.heap_mut().int(offset);
        let body = rt.call(Stdlib::Add, &[x, offset]);
        let shift = rt.heap_mut().lambda(1, body);
        let mapped = run(&mut rt, Stdlib::Map, &[list, shift]);

        let first = collect_ints(&mut rt, mapped);
        let second = collect_ints(&mut rt, mapped);
        prop_assert_eq!(first.len(), values.len());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn zip_stops_at_shorter_side(a in small_ints(), b in small_ints()) {
        let mut rt = runtime();
        let left = int_list(rt.heap_mut(), &a);
        let right = int_list(rt.heap_mut(), &b);
        let zipped = run(&mut rt, Stdlib::Zip, &[left, right]);
        let collected = run(&mut rt, Stdlib::CollectList, &[zipped]);
        prop_assert_eq!(rt.heap().list_len(collected), a.len().min(b.len()));
    }

    #[test]
    fn chain_concatenates(a in small_ints(), b in small_ints()) {
        let mut rt = runtime();
        let left = int_list(rt.heap_mut(), &a);
        let right = int_list(rt.heap_mut(), &b);
        let chained = run(&mut rt, Stdlib::Chain, &[left, right]);
        let expected: Vec<i64> = a.iter().chain(&b).copied().collect();
        prop_assert_eq!(collect_ints(&mut rt, chained), expected);
    }

    #[test]
    fn flatten_concatenates(a in small_ints(), b in small_ints(), c in small_ints()) {
        let mut rt = runtime();
        let lists: Vec<TermId> = [&a, &b, &c]
            .iter()
            .map(|values| int_list(rt.heap_mut(), values))
            .collect();
        let nested = rt.heap_mut().list(&lists);
        let flat = run(&mut rt, Stdlib::Flatten, &[nested]);
        let expected: Vec<i64> = a.iter().chain(&b).chain(&c).copied().collect();
        prop_assert_eq!(collect_ints(&mut rt, flat), expected);
    }

    #[test]
    fn hashmap_set_is_persistent(
        entries in prop::collection::vec((0i64..20, -100i64..100), 0..10),
        key in 0i64..25,
        value in -100i64..100,
    ) {
        let mut rt = runtime();
        let heap = rt.heap_mut();
        let pairs: Vec<(TermId, TermId)> = entries
            .iter()
            .map(|&(k, v)| (heap.int(k), heap.int(v)))
            .collect();
        let original = heap.hashmap(&pairs);
        let before = heap.hashmap_entries(original);
        let size = heap.hashmap_len(original);
        let key = heap.int(key);
        let value = heap.int(value);

        let updated = run(&mut rt, Stdlib::Insert, &[original, key, value]);

        let heap = rt.heap();
        prop_assert_eq!(heap.hashmap_entries(original), before.clone());
        prop_assert_eq!(heap.hashmap_len(original), size);
        prop_assert!(heap.equals(heap.hashmap_get(updated, key).unwrap(), value));
        for (k, v) in before {
            if !heap.equals(k, key) {
                prop_assert!(heap.equals(heap.hashmap_get(updated, k).unwrap(), v));
            }
        }
    }
}

#[test]
fn accessor_dispatch() {
    let mut rt = runtime();
    let heap = rt.heap_mut();
    let names = ["foo", "bar", "baz"].map(|name| heap.alloc_string(name));
    let values = [3, 4, 5].map(|n| heap.int(n));
    let record = heap.record_from_entries(&[
        (names[0], values[0]),
        (names[1], values[1]),
        (names[2], values[2]),
    ]);
    let list = heap.list(&values);
    let three = heap.int(3);
    let text = heap.alloc_string("foo");
    let map = heap.hashmap(&[]);
    let invalid = heap.alloc_string("invalid-method");

    let foo = run(&mut rt, Stdlib::Accessor, &[record, names[0]]);
    assert_eq!(rt.heap().as_int(foo), Some(3));
    assert_eq!(run(&mut rt, Stdlib::Accessor, &[list, three]), TermId::NIL);
    assert_eq!(run(&mut rt, Stdlib::Accessor, &[text, three]), TermId::NIL);

    let signal = run(&mut rt, Stdlib::Accessor, &[map, invalid]);
    let heap = rt.heap();
    let conditions = heap.signal_conditions(signal);
    assert_eq!(conditions.len(), 1);
    let Some(Condition::InvalidFunctionArgs { args, .. }) = heap.as_condition(conditions[0]) else {
        panic!("expected InvalidFunctionArgs, got {}", show(&rt, signal));
    };
    assert_eq!(heap.as_list(args), Some(&[map, invalid][..]));
}

#[test]
fn format_error_message_truncation() {
    let mut rt = runtime();
    for (count, trailer) in [(9, None), (10, None), (11, Some("...2 more errors")), (12, Some("...3 more errors"))] {
        let errors: Vec<TermId> = (1..=count)
            .map(|i| rt.heap_mut().error_record("Error", &format!("error {i}")))
            .collect();
        let list = rt.heap_mut().list(&errors);
        let message = run(&mut rt, Stdlib::FormatErrorMessage, &[list]);
        let text = rt.heap().as_str(message).unwrap().to_owned();
        let lines: Vec<&str> = text.lines().collect();
        match trailer {
            None => {
                assert_eq!(lines.len(), count);
                assert_eq!(lines[count - 1], format!("error {count}"));
            }
            Some(trailer) => {
                assert_eq!(lines.len(), 10);
                assert_eq!(lines[8], "error 9");
                assert_eq!(lines[9], trailer);
            }
        }
    }
}

#[test]
fn throw_unwraps_aggregate_error() {
    let mut rt = runtime();
    let heap = rt.heap_mut();
    let errors: Vec<TermId> = (1..=3)
        .map(|i| heap.error_record("Error", &format!("e{i}")))
        .collect();
    let name_key = heap.alloc_string("name");
    let errors_key = heap.alloc_string("errors");
    let name = heap.alloc_string("AggregateError");
    let error_list = heap.list(&errors);
    let aggregate = heap.record_from_entries(&[(name_key, name), (errors_key, error_list)]);
    let empty_aggregate =
        heap.record_from_entries(&[(name_key, name), (errors_key, TermId::EMPTY_LIST)]);

    let signal = run(&mut rt, Stdlib::Throw, &[aggregate]);
    let payloads: Vec<Option<Condition>> = rt
        .heap()
        .signal_conditions(signal)
        .iter()
        .map(|&c| rt.heap().as_condition(c))
        .collect();
    let expected: Vec<Option<Condition>> =
        errors.iter().map(|&e| Some(Condition::Error(e))).collect();
    assert_eq!(payloads, expected);

    let signal = run(&mut rt, Stdlib::Throw, &[empty_aggregate]);
    let conditions = rt.heap().signal_conditions(signal);
    assert_eq!(conditions.len(), 1);
    assert_eq!(
        rt.heap().as_condition(conditions[0]),
        Some(Condition::Error(empty_aggregate))
    );
}

#[test]
fn parse_json_display_round_trip() {
    let mut rt = runtime();
    let cases = [
        ("42", "42"),
        ("-7.5", "-7.5"),
        ("1e2", "100.0"),
        ("\"hi\"", "\"hi\""),
        ("null", "null"),
        ("[1, 2.0, true]", "[1, 2.0, true]"),
        (r#"{"a": {"b": []}, "c": "d"}"#, r#"{ "a": { "b": [] }, "c": "d" }"#),
    ];
    for (source, expected) in cases {
        let text = rt.heap_mut().alloc_string(source);
        let parsed = run(&mut rt, Stdlib::ParseJson, &[text]);
        assert_eq!(show(&rt, parsed), expected, "{source}");
    }
}

#[test]
fn dependent_results_track_state_changes() {
    let mut rt = runtime();
    let key = rt.heap_mut().alloc_string("count");
    let one = rt.heap_mut().int(1);
    let read = rt.call(Stdlib::Get, &[key]);
    let term = rt.call(Stdlib::Add, &[read, one]);

    let empty = StateSnapshot::new();
    let pending = rt.evaluate(term, &empty);
    assert!(rt.heap().is_pending_signal(pending.value));

    let mut first = StateSnapshot::new();
    let five = rt.heap_mut().int(5);
    let token = first.write(rt.heap(), key, five);
    let evaluation = rt.evaluate(term, &first);
    assert_eq!(rt.heap().as_int(evaluation.value), Some(6));
    assert!(evaluation.dependencies.contains(token));

    let mut second = StateSnapshot::new();
    let nine = rt.heap_mut().int(9);
    second.write(rt.heap(), key, nine);
    let changed = second.diff(rt.heap(), &first);
    assert_eq!(changed, vec![token]);
    assert!(rt.invalidate(&changed) >= 1);
    let evaluation = rt.evaluate(term, &second);
    assert_eq!(rt.heap().as_int(evaluation.value), Some(10));
}
