//! External state collaborator.
//!
//! The evaluator never owns state: it reads through the [`State`] trait and
//! records every token it read. A [`StateSnapshot`] is a stable, in-memory
//! view; callers swap snapshots between evaluations and use [`StateSnapshot::diff`]
//! to learn which tokens changed.

use rheo_term::{Heap, StateToken, TermId};
use rustc_hash::FxHashMap;

/// Read-only view of external state for one evaluation.
///
/// Repeated reads of the same token within one evaluation must agree.
pub trait State {
    /// Current value for `token`, or `None` if not yet available.
    fn read(&self, token: StateToken) -> Option<TermId>;
}

/// State with no values at all: every read is pending.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyState;

impl State for EmptyState {
    fn read(&self, _token: StateToken) -> Option<TermId> {
        None
    }
}

/// In-memory state keyed by [`StateToken`].
///
/// Values are terms of the heap the snapshot is used with. The key term
/// written for each token is kept so token collisions can be detected.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    values: FxHashMap<StateToken, TermId>,
    keys: FxHashMap<StateToken, TermId>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the value for a key term.
    pub fn write(&mut self, heap: &Heap, key: TermId, value: TermId) -> StateToken {
        let token = StateToken::of(heap, key);
        if let Some(&existing) = self.keys.get(&token) {
            if !heap.equals(existing, key) {
                tracing::warn!(?token, "distinct state keys share a token");
            }
        }
        self.keys.insert(token, key);
        self.values.insert(token, value);
        token
    }

    /// Key term last written for `token`, if it was written by key.
    pub fn key(&self, token: StateToken) -> Option<TermId> {
        self.keys.get(&token).copied()
    }

    /// Bind the value for a raw token.
    pub fn write_token(&mut self, token: StateToken, value: TermId) {
        self.values.insert(token, value);
    }

    /// Set the clock read by `Now`, in milliseconds since the Unix epoch.
    pub fn set_clock(&mut self, heap: &mut Heap, millis: i64) {
        let now = heap.timestamp(millis);
        self.values.insert(StateToken::CLOCK, now);
    }

    /// Remove the value for a key term, making reads pending again.
    pub fn remove(&mut self, heap: &Heap, key: TermId) -> Option<TermId> {
        let token = StateToken::of(heap, key);
        self.keys.remove(&token);
        self.values.remove(&token)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tokens whose values differ between `self` and `previous`.
    ///
    /// Values are compared structurally; the result is sorted.
    pub fn diff(&self, heap: &Heap, previous: &StateSnapshot) -> Vec<StateToken> {
        let mut changed: Vec<StateToken> = self
            .values
            .iter()
            .filter(|&(token, &value)| {
                !matches!(previous.values.get(token), Some(&old) if heap.equals(old, value))
            })
            .map(|(&token, _)| token)
            .collect();
        changed.extend(
            previous
                .values
                .keys()
                .filter(|token| !self.values.contains_key(token))
                .copied(),
        );
        changed.sort_unstable();
        changed
    }
}

impl State for StateSnapshot {
    fn read(&self, token: StateToken) -> Option<TermId> {
        self.values.get(&token).copied()
    }
}

#[cfg(test)]
mod tests;
