#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;
use rheo_term::{Heap, TermId};

use crate::{EmptyState, Runtime, Stdlib};

fn run(rt: &mut Runtime, builtin: Stdlib, args: &[TermId]) -> TermId {
    let term = rt.call(builtin, args);
    rt.evaluate(term, &EmptyState).value
}

fn show(rt: &Runtime, id: TermId) -> String {
    rt.heap().display(id).to_string()
}

fn int_list(heap: &mut Heap, values: &[i64]) -> TermId {
    let items: Vec<TermId> = values.iter().map(|&v| heap.int(v)).collect();
    heap.list(&items)
}

fn record(heap: &mut Heap, entries: &[(&str, i64)]) -> TermId {
    let entries: Vec<(TermId, TermId)> = entries
        .iter()
        .map(|&(key, value)| (heap.alloc_string(key), heap.int(value)))
        .collect();
    heap.record_from_entries(&entries)
}

#[test]
fn lookup_by_key_or_index() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let rec = record(heap, &[("a", 1)]);
    let a = heap.alloc_string("a");
    let b = heap.alloc_string("b");
    let two = heap.int(2);
    let map = heap.hashmap(&[(a, two)]);
    let list = int_list(heap, &[5, 6]);
    let one = heap.int(1);

    let from_record = run(&mut rt, Stdlib::Lookup, &[rec, a]);
    assert_eq!(rt.heap().as_int(from_record), Some(1));
    let from_map = run(&mut rt, Stdlib::Lookup, &[map, a]);
    assert_eq!(rt.heap().as_int(from_map), Some(2));
    let from_list = run(&mut rt, Stdlib::Lookup, &[list, one]);
    assert_eq!(rt.heap().as_int(from_list), Some(6));
    assert_eq!(run(&mut rt, Stdlib::Lookup, &[map, b]), TermId::NIL);
    assert_eq!(run(&mut rt, Stdlib::Lookup, &[list, two]), TermId::NIL);
}

#[test]
fn insert_is_persistent() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let rec = record(heap, &[("a", 1)]);
    let a = heap.alloc_string("a");
    let b = heap.alloc_string("b");
    let nine = heap.int(9);
    let map = heap.hashmap(&[(a, nine)]);

    let updated = run(&mut rt, Stdlib::Insert, &[rec, b, nine]);
    assert_eq!(show(&rt, updated), r#"{ "a": 1, "b": 9 }"#);
    assert_eq!(show(&rt, rec), r#"{ "a": 1 }"#);

    let updated_map = run(&mut rt, Stdlib::Insert, &[map, b, nine]);
    assert!(rt.heap().hashmap_has(updated_map, b));
    assert!(!rt.heap().hashmap_has(map, b));
    assert_eq!(rt.heap().hashmap_len(updated_map), 2);
}

#[test]
fn inserted_value_is_evaluated_on_read() {
    let mut rt = Runtime::new();
    let rec = record(rt.heap_mut(), &[]);
    let key = rt.heap_mut().alloc_string("sum");
    let one = rt.heap_mut().int(1);
    let sum = rt.call(Stdlib::Add, &[one, one]);

    let updated = run(&mut rt, Stdlib::Insert, &[rec, key, sum]);
    assert_eq!(rt.heap().record_get(updated, key), Some(sum));

    let read = run(&mut rt, Stdlib::Lookup, &[updated, key]);
    assert_eq!(rt.heap().as_int(read), Some(2));
}

#[test]
fn list_insert_checks_bounds() {
    let mut rt = Runtime::new();
    let list = int_list(rt.heap_mut(), &[1, 2]);
    let zero = rt.heap_mut().int(0);
    let two = rt.heap_mut().int(2);
    let seven = rt.heap_mut().int(7);

    let updated = run(&mut rt, Stdlib::Insert, &[list, zero, seven]);
    assert_eq!(show(&rt, updated), "[7, 2]");
    let rejected = run(&mut rt, Stdlib::Insert, &[list, two, seven]);
    assert!(rt.heap().is_error_signal(rejected));
}

#[test]
fn contains_across_collections() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let one = heap.int(1);
    let three = heap.int(3);
    let a = heap.alloc_string("a");
    let set = heap.hashset(&[one]);
    let map = heap.hashmap(&[(a, one)]);
    let rec = record(heap, &[("a", 1)]);
    let text = heap.alloc_string("banana");
    let nan = heap.alloc_string("nan");
    let list = int_list(heap, &[1, 2]);

    let cases = [
        (set, one, TermId::TRUE),
        (set, three, TermId::FALSE),
        (map, a, TermId::TRUE),
        (rec, a, TermId::TRUE),
        (text, nan, TermId::TRUE),
        (list, one, TermId::TRUE),
        (list, three, TermId::FALSE),
    ];
    for (collection, needle, expected) in cases {
        assert_eq!(run(&mut rt, Stdlib::Contains, &[collection, needle]), expected);
    }
}

#[test]
fn length_of_iterables() {
    let mut rt = Runtime::new();
    let list = int_list(rt.heap_mut(), &[1, 2, 3]);
    let text = rt.heap_mut().alloc_string("añb");
    let rec = record(rt.heap_mut(), &[("a", 1), ("b", 2)]);
    let range = rt.heap_mut().range_iterator(0, 4);
    for (iterable, expected) in [(list, 3), (text, 3), (rec, 2), (range, 4)] {
        let len = run(&mut rt, Stdlib::Length, &[iterable]);
        assert_eq!(rt.heap().as_int(len), Some(expected));
    }
}

#[test]
fn push_and_push_front() {
    let mut rt = Runtime::new();
    let list = int_list(rt.heap_mut(), &[1]);
    let two = rt.heap_mut().int(2);
    let set = rt.heap_mut().hashset(&[two]);

    let back = run(&mut rt, Stdlib::Push, &[list, two]);
    assert_eq!(show(&rt, back), "[1, 2]");
    let front = run(&mut rt, Stdlib::PushFront, &[list, two]);
    assert_eq!(show(&rt, front), "[2, 1]");
    let same = run(&mut rt, Stdlib::Push, &[set, two]);
    assert_eq!(rt.heap().hashset_len(same), 1);
}

#[test]
fn concat_lists_or_strings() {
    let mut rt = Runtime::new();
    let a = int_list(rt.heap_mut(), &[1]);
    let b = int_list(rt.heap_mut(), &[2, 3]);
    let x = rt.heap_mut().alloc_string("foo");
    let y = rt.heap_mut().alloc_string("bar");

    let lists = run(&mut rt, Stdlib::Concat, &[a, b, a]);
    assert_eq!(show(&rt, lists), "[1, 2, 3, 1]");
    let text = run(&mut rt, Stdlib::Concat, &[x, y]);
    assert_eq!(rt.heap().as_str(text), Some("foobar"));
    let mixed = run(&mut rt, Stdlib::Concat, &[a, x]);
    assert!(rt.heap().is_error_signal(mixed));
}

#[test]
fn slice_with_negative_and_clamped_bounds() {
    let mut rt = Runtime::new();
    let list = int_list(rt.heap_mut(), &[0, 1, 2, 3, 4]);
    let text = rt.heap_mut().alloc_string("hello");
    let [one, three, minus_one, minus_two, four, two] =
        [1, 3, -1, -2, 4, 2].map(|n| rt.heap_mut().int(n));

    let middle = run(&mut rt, Stdlib::Slice, &[list, one, three]);
    assert_eq!(show(&rt, middle), "[1, 2]");
    let tail = run(&mut rt, Stdlib::Slice, &[list, minus_two]);
    assert_eq!(show(&rt, tail), "[3, 4]");
    let inverted = run(&mut rt, Stdlib::Slice, &[list, four, two]);
    assert_eq!(show(&rt, inverted), "[]");
    let inner = run(&mut rt, Stdlib::Slice, &[text, one, minus_one]);
    assert_eq!(rt.heap().as_str(inner), Some("ell"));
}

#[test]
fn merge_later_wins() {
    let mut rt = Runtime::new();
    let first = record(rt.heap_mut(), &[("a", 1), ("b", 2)]);
    let second = record(rt.heap_mut(), &[("b", 3), ("c", 4)]);
    let merged = run(&mut rt, Stdlib::Merge, &[first, second]);
    assert_eq!(show(&rt, merged), r#"{ "a": 1, "b": 3, "c": 4 }"#);

    let heap = rt.heap_mut();
    let k = heap.alloc_string("k");
    let one = heap.int(1);
    let two = heap.int(2);
    let left = heap.hashmap(&[(k, one)]);
    let right = heap.hashmap(&[(k, two)]);
    let merged = run(&mut rt, Stdlib::Merge, &[left, right]);
    let value = rt.heap().hashmap_get(merged, k).unwrap();
    assert_eq!(rt.heap().as_int(value), Some(2));
}

#[test]
fn entries_of_record() {
    let mut rt = Runtime::new();
    let rec = record(rt.heap_mut(), &[("a", 1), ("b", 2)]);
    let entries = run(&mut rt, Stdlib::Entries, &[rec]);
    assert_eq!(show(&rt, entries), r#"[["a", 1], ["b", 2]]"#);
}

#[test]
fn resolve_list_and_record() {
    let mut rt = Runtime::new();
    let one = rt.heap_mut().int(1);
    let sum = rt.call(Stdlib::Add, &[one, one]);
    let list = rt.heap_mut().list(&[one, sum]);
    let resolved = run(&mut rt, Stdlib::ResolveList, &[list]);
    assert_eq!(show(&rt, resolved), "[1, 2]");

    let key = rt.heap_mut().alloc_string("sum");
    let rec = rt.heap_mut().record_from_entries(&[(key, sum)]);
    let resolved = run(&mut rt, Stdlib::ResolveRecord, &[rec]);
    assert_eq!(show(&rt, resolved), r#"{ "sum": 2 }"#);

    let atomic = int_list(rt.heap_mut(), &[1]);
    assert_eq!(run(&mut rt, Stdlib::ResolveList, &[atomic]), atomic);
}

#[test]
fn resolve_deep_reaches_nested_values() {
    let mut rt = Runtime::new();
    let one = rt.heap_mut().int(1);
    let sum = rt.call(Stdlib::Add, &[one, one]);
    let key = rt.heap_mut().alloc_string("inner");
    let inner = rt.heap_mut().list(&[sum]);
    let rec = rt.heap_mut().record_from_entries(&[(key, inner)]);
    let outer = rt.heap_mut().list(&[rec, one]);

    let resolved = run(&mut rt, Stdlib::ResolveDeep, &[outer]);
    assert_eq!(show(&rt, resolved), r#"[{ "inner": [2] }, 1]"#);
    assert!(rt.heap().is_atomic(resolved));
}

#[test]
fn resolve_deep_combines_nested_signals() {
    let mut rt = Runtime::new();
    let a = rt.heap_mut().alloc_string("a");
    let b = rt.heap_mut().alloc_string("b");
    let first = rt.call(Stdlib::Throw, &[a]);
    let second = rt.call(Stdlib::Throw, &[b]);
    let inner = rt.heap_mut().list(&[second]);
    let outer = rt.heap_mut().list(&[first, inner]);
    let resolved = run(&mut rt, Stdlib::ResolveDeep, &[outer]);
    assert_eq!(rt.heap().signal_conditions(resolved).len(), 2);
}
