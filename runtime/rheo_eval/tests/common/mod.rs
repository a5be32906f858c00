//! Helpers shared by the integration test binaries.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Once;

use rheo_eval::{EmptyState, Heap, Runtime, Stdlib, TermId};

static TRACING_INIT: Once = Once::new();

/// Install a `fmt` subscriber honoring `RUST_LOG`, writing through the test
/// harness so output is captured per test.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Runtime with tracing installed.
pub fn runtime() -> Runtime {
    init_tracing();
    Runtime::new()
}

/// Evaluate `builtin(args...)` against empty state.
pub fn run(rt: &mut Runtime, builtin: Stdlib, args: &[TermId]) -> TermId {
    let term = rt.call(builtin, args);
    rt.evaluate(term, &EmptyState).value
}

pub fn show(rt: &Runtime, id: TermId) -> String {
    rt.heap().display(id).to_string()
}

pub fn int_list(heap: &mut Heap, values: &[i64]) -> TermId {
    let items: Vec<TermId> = values.iter().map(|&v| heap.int(v)).collect();
    heap.list(&items)
}

/// Collect a finite iterable of integers.
pub fn collect_ints(rt: &mut Runtime, iterable: TermId) -> Vec<i64> {
    let list = run(rt, Stdlib::CollectList, &[iterable]);
    let heap = rt.heap();
    heap.as_list(list)
        .unwrap_or_default()
        .iter()
        .filter_map(|&item| heap.as_int(item))
        .collect()
}
