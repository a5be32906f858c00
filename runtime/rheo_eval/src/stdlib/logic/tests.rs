use pretty_assertions::assert_eq;
use rheo_term::TermId;

use crate::{EmptyState, Runtime, Stdlib};

fn run(rt: &mut Runtime, builtin: Stdlib, args: &[TermId]) -> TermId {
    let term = rt.call(builtin, args);
    rt.evaluate(term, &EmptyState).value
}

#[test]
fn eq_compares_numbers_numerically() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let int = heap.int(2);
    let float = heap.float(2.0);
    let other = heap.int(3);
    let text = heap.alloc_string("2");
    assert_eq!(run(&mut rt, Stdlib::Eq, &[int, float]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Eq, &[int, other]), TermId::FALSE);
    assert_eq!(run(&mut rt, Stdlib::Eq, &[int, text]), TermId::FALSE);
}

#[test]
fn eq_is_structural() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let one = heap.int(1);
    let a = heap.list(&[one, TermId::NIL]);
    let one_again = heap.int(1);
    let b = heap.list(&[one_again, TermId::NIL]);
    assert_eq!(run(&mut rt, Stdlib::Eq, &[a, b]), TermId::TRUE);
}

#[test]
fn comparisons_over_numbers_strings_and_timestamps() {
    let mut rt = Runtime::new();
    let heap = rt.heap_mut();
    let one = heap.int(1);
    let half = heap.float(1.5);
    let apple = heap.alloc_string("apple");
    let banana = heap.alloc_string("banana");
    let early = heap.timestamp(10);
    let late = heap.timestamp(20);

    assert_eq!(run(&mut rt, Stdlib::Lt, &[one, half]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Gte, &[one, one]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Gt, &[apple, banana]), TermId::FALSE);
    assert_eq!(run(&mut rt, Stdlib::Lte, &[apple, banana]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Gt, &[late, early]), TermId::TRUE);
}

#[test]
fn nan_is_unordered() {
    let mut rt = Runtime::new();
    let nan = rt.heap_mut().float(f64::NAN);
    let zero = rt.heap_mut().int(0);
    for op in [Stdlib::Gt, Stdlib::Gte, Stdlib::Lt, Stdlib::Lte] {
        assert_eq!(run(&mut rt, op, &[nan, zero]), TermId::FALSE);
    }
}

#[test]
fn mixed_comparison_is_rejected() {
    let mut rt = Runtime::new();
    let one = rt.heap_mut().int(1);
    let text = rt.heap_mut().alloc_string("1");
    let result = run(&mut rt, Stdlib::Lt, &[one, text]);
    assert!(rt.heap().is_error_signal(result));
}

#[test]
fn not_uses_truthiness() {
    let mut rt = Runtime::new();
    let zero = rt.heap_mut().int(0);
    let empty = rt.heap_mut().alloc_string("");
    let list = rt.heap_mut().list(&[]);
    assert_eq!(run(&mut rt, Stdlib::Not, &[zero]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Not, &[empty]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Not, &[TermId::NIL]), TermId::TRUE);
    assert_eq!(run(&mut rt, Stdlib::Not, &[list]), TermId::FALSE);
}

#[test]
fn and_or_short_circuit() {
    let mut rt = Runtime::new();
    let boom = rt.heap_mut().alloc_string("boom");
    let explode = rt.call(Stdlib::Throw, &[boom]);
    let one = rt.heap_mut().int(1);

    assert_eq!(run(&mut rt, Stdlib::And, &[TermId::FALSE, explode]), TermId::FALSE);
    assert_eq!(run(&mut rt, Stdlib::Or, &[one, explode]), one);
    assert_eq!(run(&mut rt, Stdlib::And, &[one, TermId::NIL]), TermId::NIL);

    let result = run(&mut rt, Stdlib::Or, &[TermId::NIL, explode]);
    assert!(rt.heap().is_error_signal(result));
}

#[test]
fn if_evaluates_only_chosen_branch() {
    let mut rt = Runtime::new();
    let boom = rt.heap_mut().alloc_string("boom");
    let explode = rt.call(Stdlib::Throw, &[boom]);
    let two = rt.heap_mut().int(2);
    let doubled = rt.call(Stdlib::Add, &[two, two]);

    let taken = run(&mut rt, Stdlib::If, &[TermId::TRUE, doubled, explode]);
    assert_eq!(rt.heap().as_int(taken), Some(4));

    let other = run(&mut rt, Stdlib::If, &[TermId::NIL, explode, two]);
    assert_eq!(other, two);
}
