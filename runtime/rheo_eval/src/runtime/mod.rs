//! Runtime entry point.
//!
//! A [`Runtime`] owns one heap and one evaluation cache. Terms are built
//! through [`Runtime::heap_mut`], evaluated against a [`State`] snapshot with
//! [`Runtime::evaluate`], and re-evaluated after the host swaps in a newer
//! snapshot. Memory is reclaimed wholesale: [`Runtime::reset`] (or dropping
//! the runtime) releases every term at once.

mod builder;

pub use builder::{RuntimeBuilder, RuntimeConfig};

use rheo_term::{Heap, StateToken, TermId};

use crate::evaluator::{Evaluation, EvaluationCache, Evaluator};
use crate::state::State;
use crate::stdlib::Stdlib;

/// Heap, cache and configuration for a sequence of evaluations.
pub struct Runtime {
    heap: Heap,
    cache: EvaluationCache,
    config: RuntimeConfig,
}

impl Runtime {
    /// Runtime with the default configuration.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub(crate) fn from_config(config: RuntimeConfig) -> Self {
        Runtime {
            heap: new_heap(&config),
            cache: EvaluationCache::new(),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[inline]
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// `Builtin` term for a stdlib function.
    pub fn builtin(&mut self, builtin: Stdlib) -> TermId {
        self.heap.builtin(builtin.id())
    }

    /// Unevaluated application of a stdlib function.
    pub fn call(&mut self, builtin: Stdlib, args: &[TermId]) -> TermId {
        let target = self.builtin(builtin);
        self.heap.apply(target, args)
    }

    /// Reduce `term` to normal form against `state`.
    #[tracing::instrument(level = "debug", skip_all, fields(term = term.raw()))]
    pub fn evaluate(&mut self, term: TermId, state: &dyn State) -> Evaluation {
        let evaluator =
            Evaluator::new(&mut self.heap, state).with_max_depth(self.config.max_depth);
        let mut evaluator = if self.config.memoize {
            evaluator.with_cache(&mut self.cache)
        } else {
            evaluator
        };
        let evaluation = evaluator.evaluate(term);
        tracing::debug!(
            dependencies = evaluation.dependencies.len(),
            terms = self.heap.len(),
            "evaluated"
        );
        evaluation
    }

    /// Evaluate `term` and everything inside the lists, records and hashmaps
    /// it produces.
    pub fn evaluate_deep(&mut self, term: TermId, state: &dyn State) -> Evaluation {
        let resolve = self.call(Stdlib::ResolveDeep, &[term]);
        self.evaluate(resolve, state)
    }

    /// Drop cached evaluations depending on any of `changed`.
    pub fn invalidate(&mut self, changed: &[StateToken]) -> usize {
        self.cache.invalidate(changed)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Release every term and cached evaluation.
    ///
    /// All previously returned `TermId`s become meaningless.
    pub fn reset(&mut self) {
        tracing::debug!(terms = self.heap.len(), "runtime reset");
        self.heap = new_heap(&self.config);
        self.cache.clear();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("heap", &self.heap)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

fn new_heap(config: &RuntimeConfig) -> Heap {
    let heap = match config.max_terms {
        Some(limit) => Heap::with_limit(limit),
        None => Heap::new(),
    };
    heap.with_builtin_names(Stdlib::NAMES)
}

#[cfg(test)]
mod tests;
