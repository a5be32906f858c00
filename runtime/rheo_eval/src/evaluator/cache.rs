//! Memoization of reducible roots.
//!
//! Entries are keyed by structural hash and confirmed with structural
//! equality, so two separately allocated but identical applications share a
//! result. Each entry remembers the state values it observed for its
//! dependencies; a hit is only served while the current state still agrees.

use rheo_term::{Heap, StateToken, TermId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::Evaluation;
use crate::state::State;

struct Entry {
    term: TermId,
    result: Evaluation,
    /// State value seen for each dependency, in dependency order.
    observed: SmallVec<[Option<TermId>; 4]>,
}

/// Memo table from reducible terms to their evaluations.
#[derive(Default)]
pub struct EvaluationCache {
    entries: FxHashMap<u64, SmallVec<[Entry; 1]>>,
    len: usize,
    hits: u64,
    misses: u64,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached evaluation of `term`, if still valid for `state`.
    pub fn get(&mut self, heap: &Heap, state: &dyn State, term: TermId) -> Option<Evaluation> {
        let found = self.entries.get(&heap.hash(term)).and_then(|bucket| {
            bucket
                .iter()
                .find(|entry| heap.equals(entry.term, term))
                .filter(|entry| entry.is_current(heap, state))
        });
        match found {
            Some(entry) => {
                self.hits += 1;
                tracing::trace!(?term, "evaluation cache hit");
                Some(entry.result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Record the evaluation of `term` under the current `state`.
    pub fn insert(&mut self, heap: &Heap, state: &dyn State, term: TermId, result: &Evaluation) {
        let entry = Entry {
            term,
            result: result.clone(),
            observed: result
                .dependencies
                .iter()
                .map(|token| state.read(token))
                .collect(),
        };
        let bucket = self.entries.entry(heap.hash(term)).or_default();
        match bucket.iter_mut().find(|e| heap.equals(e.term, term)) {
            Some(existing) => *existing = entry,
            None => {
                bucket.push(entry);
                self.len += 1;
            }
        }
    }

    /// Drop every entry depending on any of `tokens`. Returns the number dropped.
    pub fn invalidate(&mut self, tokens: &[StateToken]) -> usize {
        if tokens.is_empty() {
            return 0;
        }
        let before = self.len;
        self.entries.retain(|_, bucket| {
            bucket.retain(|entry| !entry.result.dependencies.intersects(tokens));
            !bucket.is_empty()
        });
        self.len = self.entries.values().map(SmallVec::len).sum();
        let dropped = before - self.len;
        tracing::debug!(tokens = tokens.len(), dropped, "evaluation cache invalidated");
        dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Entry {
    fn is_current(&self, heap: &Heap, state: &dyn State) -> bool {
        self.result
            .dependencies
            .iter()
            .zip(&self.observed)
            .all(|(token, observed)| match (state.read(token), *observed) {
                (None, None) => true,
                (Some(now), Some(then)) => heap.equals(now, then),
                _ => false,
            })
    }
}

impl std::fmt::Debug for EvaluationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("len", &self.len)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
