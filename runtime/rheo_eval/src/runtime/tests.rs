use pretty_assertions::assert_eq;

use super::*;
use crate::state::{EmptyState, StateSnapshot};

#[test]
fn default_configuration() {
    let runtime = Runtime::new();
    assert_eq!(runtime.config(), &RuntimeConfig::default());
    assert!(runtime.config().memoize);
    assert_eq!(runtime.config().max_depth, None);
}

#[test]
fn builder_sets_options() {
    let runtime = Runtime::builder()
        .max_terms(10_000)
        .max_depth(64)
        .memoize(false)
        .build();
    assert_eq!(
        runtime.config(),
        &RuntimeConfig {
            max_terms: Some(10_000),
            max_depth: Some(64),
            memoize: false,
        }
    );
}

#[test]
fn evaluate_reduces_calls() {
    let mut runtime = Runtime::new();
    let two = runtime.heap_mut().int(2);
    let three = runtime.heap_mut().int(3);
    let product = runtime.call(Stdlib::Multiply, &[two, three]);
    let evaluation = runtime.evaluate(product, &EmptyState);
    assert_eq!(runtime.heap().as_int(evaluation.value), Some(6));
    assert!(evaluation.dependencies.is_empty());
}

#[test]
fn memoization_follows_configuration() {
    let mut memoized = Runtime::new();
    let one = memoized.heap_mut().int(1);
    let term = memoized.call(Stdlib::Add, &[one, one]);
    memoized.evaluate(term, &EmptyState);
    memoized.evaluate(term, &EmptyState);
    assert_eq!(memoized.cache().hits(), 1);

    let mut plain = Runtime::builder().memoize(false).build();
    let one = plain.heap_mut().int(1);
    let term = plain.call(Stdlib::Add, &[one, one]);
    plain.evaluate(term, &EmptyState);
    assert!(plain.cache().is_empty());
}

#[test]
fn invalidate_drops_dependent_entries() {
    let mut runtime = Runtime::new();
    let key = runtime.heap_mut().alloc_string("k");
    let value = runtime.heap_mut().int(1);
    let mut state = StateSnapshot::new();
    let token = state.write(runtime.heap(), key, value);
    let read = runtime.call(Stdlib::Get, &[key]);
    let one = runtime.heap_mut().int(1);
    let pure = runtime.call(Stdlib::Add, &[one, one]);
    runtime.evaluate(read, &state);
    runtime.evaluate(pure, &state);
    assert_eq!(runtime.cache().len(), 2);

    assert_eq!(runtime.invalidate(&[token]), 1);
    assert_eq!(runtime.cache().len(), 1);
    runtime.clear_cache();
    assert!(runtime.cache().is_empty());
}

#[test]
fn evaluate_deep_resolves_nested_terms() {
    let mut runtime = Runtime::new();
    let one = runtime.heap_mut().int(1);
    let sum = runtime.call(Stdlib::Add, &[one, one]);
    let inner = runtime.heap_mut().list(&[sum]);
    let outer = runtime.heap_mut().list(&[inner]);

    let shallow = runtime.evaluate(outer, &EmptyState);
    assert_eq!(shallow.value, outer);

    let deep = runtime.evaluate_deep(outer, &EmptyState);
    assert_eq!(runtime.heap().display(deep.value).to_string(), "[[2]]");
}

#[test]
fn depth_limit_applies() {
    let mut runtime = Runtime::builder().max_depth(2).build();
    let one = runtime.heap_mut().int(1);
    let mut term = one;
    for _ in 0..5 {
        term = runtime.call(Stdlib::Add, &[term, one]);
    }
    let evaluation = runtime.evaluate(term, &EmptyState);
    assert!(runtime.heap().is_error_signal(evaluation.value));
}

#[test]
fn reset_releases_terms() {
    let mut runtime = Runtime::new();
    let empty_len = runtime.heap().len();
    let one = runtime.heap_mut().int(1);
    let term = runtime.call(Stdlib::Add, &[one, one]);
    runtime.evaluate(term, &EmptyState);
    assert!(runtime.heap().len() > empty_len);

    runtime.reset();
    assert_eq!(runtime.heap().len(), empty_len);
    assert!(runtime.cache().is_empty());
}
