use pretty_assertions::assert_eq;
use rheo_term::{Condition, TermId, TermType};

use crate::{EmptyState, Runtime, Stdlib};

fn run(rt: &mut Runtime, builtin: Stdlib, args: &[TermId]) -> TermId {
    let term = rt.call(builtin, args);
    rt.evaluate(term, &EmptyState).value
}

fn text(rt: &mut Runtime, value: &str) -> TermId {
    rt.heap_mut().alloc_string(value)
}

fn show(rt: &Runtime, id: TermId) -> String {
    rt.heap().display(id).to_string()
}

#[test]
fn split_on_separator_or_characters() {
    let mut rt = Runtime::new();
    let csv = text(&mut rt, "a,b,,c");
    let comma = text(&mut rt, ",");
    let word = text(&mut rt, "hé!");
    let empty = text(&mut rt, "");

    let parts = run(&mut rt, Stdlib::Split, &[csv, comma]);
    assert_eq!(show(&rt, parts), r#"["a", "b", "", "c"]"#);
    let chars = run(&mut rt, Stdlib::Split, &[word, empty]);
    assert_eq!(show(&rt, chars), r#"["h", "é", "!"]"#);
}

#[test]
fn replace_first_occurrence() {
    let mut rt = Runtime::new();
    let source = text(&mut rt, "a-b-c");
    let dash = text(&mut rt, "-");
    let plus = text(&mut rt, "+");
    let result = run(&mut rt, Stdlib::Replace, &[source, dash, plus]);
    assert_eq!(rt.heap().as_str(result), Some("a+b-c"));
}

#[test]
fn prefix_and_suffix() {
    let mut rt = Runtime::new();
    let source = text(&mut rt, "rheology");
    let prefix = text(&mut rt, "rheo");
    let suffix = text(&mut rt, "logy");
    assert_eq!(run(&mut rt, Stdlib::StartsWith, &[source, prefix]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::StartsWith, &[source, suffix]), TermId::FALSE);
    assert_eq!(run(&mut rt, Stdlib::EndsWith, &[source, suffix]), TermId::TRUE);
}

#[test]
fn join_uses_display_for_non_strings() {
    let mut rt = Runtime::new();
    let a = text(&mut rt, "a");
    let one = rt.heap_mut().int(1);
    let sum = rt.call(Stdlib::Add, &[one, one]);
    let list = rt.heap_mut().list(&[a, one, sum, TermId::NIL]);
    let separator = text(&mut rt, ", ");
    let joined = run(&mut rt, Stdlib::Join, &[list, separator]);
    assert_eq!(rt.heap().as_str(joined), Some("a, 1, 2, null"));
}

#[test]
fn to_string_of_values() {
    let mut rt = Runtime::new();
    let s = text(&mut rt, "keep");
    let n = rt.heap_mut().float(1.5);
    assert_eq!(run(&mut rt, Stdlib::ToString, &[s]), s);
    let rendered = run(&mut rt, Stdlib::ToString, &[n]);
    assert_eq!(rt.heap().as_str(rendered), Some("1.5"));
}

#[test]
fn parse_numbers() {
    let mut rt = Runtime::new();
    let digits = text(&mut rt, " 42 ");
    let decimal = text(&mut rt, "2.25");
    let junk = text(&mut rt, "4x");
    let int = rt.heap_mut().int(3);

    let parsed = run(&mut rt, Stdlib::ParseInt, &[digits]);
    assert_eq!(rt.heap().as_int(parsed), Some(42));
    assert_eq!(run(&mut rt, Stdlib::ParseInt, &[int]), int);
    let bad = run(&mut rt, Stdlib::ParseInt, &[junk]);
    assert!(show(&rt, bad).contains("Invalid integer"));

    let parsed = run(&mut rt, Stdlib::ParseFloat, &[decimal]);
    assert_eq!(rt.heap().as_float(parsed), Some(2.25));
    let promoted = run(&mut rt, Stdlib::ParseFloat, &[int]);
    assert_eq!(rt.heap().term_type(promoted), TermType::Float);
    let bad = run(&mut rt, Stdlib::ParseFloat, &[junk]);
    assert!(rt.heap().is_error_signal(bad));
}

#[test]
fn parse_json_builds_terms() {
    let mut rt = Runtime::new();
    let source = text(&mut rt, r#"{"a": [1, 2.5, "x", null, true]}"#);
    let parsed = run(&mut rt, Stdlib::ParseJson, &[source]);
    assert_eq!(show(&rt, parsed), r#"{ "a": [1, 2.5, "x", null, true] }"#);
}

#[test]
fn malformed_json_reports_offset() {
    let mut rt = Runtime::new();
    let source = text(&mut rt, r#"{"a": }"#);
    let parsed = run(&mut rt, Stdlib::ParseJson, &[source]);
    let conditions = rt.heap().signal_conditions(parsed);
    assert_eq!(conditions.len(), 1);
    match rt.heap().as_condition(conditions[0]) {
        Some(Condition::InvalidJson { source: reported, offset }) => {
            assert_eq!(reported, source);
            assert!(offset <= 7, "offset {offset}");
        }
        other => panic!("expected InvalidJson, got {other:?}"),
    }
}

#[test]
fn stringify_resolves_before_serializing() {
    let mut rt = Runtime::new();
    let key = text(&mut rt, "total");
    let one = rt.heap_mut().int(1);
    let sum = rt.call(Stdlib::Add, &[one, one]);
    let list = rt.heap_mut().list(&[sum, TermId::NIL]);
    let rec = rt.heap_mut().record_from_entries(&[(key, list)]);
    let json = run(&mut rt, Stdlib::StringifyJson, &[rec]);
    assert_eq!(rt.heap().as_str(json), Some(r#"{"total":[2,null]}"#));
}

#[test]
fn stringify_rejects_functions() {
    let mut rt = Runtime::new();
    let body = rt.heap_mut().variable(0);
    let lambda = rt.heap_mut().lambda(1, body);
    let result = run(&mut rt, Stdlib::StringifyJson, &[lambda]);
    assert!(rt.heap().is_error_signal(result));
}
