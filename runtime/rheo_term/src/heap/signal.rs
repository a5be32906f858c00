//! Signal construction and combination.
//!
//! A signal is a non-empty ordered set of condition terms. Combining signals
//! keeps first-encounter order and drops structurally equal duplicates.

use super::Heap;
use crate::id::TermId;
use crate::term::{Condition, TermKind};

impl Heap {
    /// Allocate a condition term.
    pub fn condition(&mut self, condition: Condition) -> TermId {
        if condition == Condition::Pending {
            return TermId::PENDING;
        }
        self.alloc(TermKind::Condition(condition))
    }

    /// Allocate a signal over `conditions`, removing duplicates.
    pub fn signal(&mut self, conditions: &[TermId]) -> TermId {
        debug_assert!(!conditions.is_empty(), "signals carry at least one condition");
        let mut unique: Vec<TermId> = Vec::with_capacity(conditions.len());
        for &condition in conditions {
            if !unique.iter().any(|&seen| self.equals(seen, condition)) {
                unique.push(condition);
            }
        }
        let range = self.alloc_range(&unique);
        self.alloc(TermKind::Signal(range))
    }

    /// Signal with a single `Error(payload)` condition.
    pub fn error_signal(&mut self, payload: TermId) -> TermId {
        let condition = self.condition(Condition::Error(payload));
        self.signal(&[condition])
    }

    /// Error signal whose payload is an `{ name: "Error", message }` record.
    pub fn error_message_signal(&mut self, message: &str) -> TermId {
        let payload = self.error_record("Error", message);
        self.error_signal(payload)
    }

    /// `{ name, message }` error record.
    pub fn error_record(&mut self, name: &str, message: &str) -> TermId {
        let name_key = self.alloc_string("name");
        let message_key = self.alloc_string("message");
        let name = self.alloc_string(name);
        let message = self.alloc_string(message);
        self.record_from_entries(&[(name_key, name), (message_key, message)])
    }

    /// Signal reporting that `target` rejected `args`.
    pub fn invalid_args_signal(&mut self, target: TermId, args: &[TermId]) -> TermId {
        let args = self.list(args);
        let condition = self.condition(Condition::InvalidFunctionArgs { target, args });
        self.signal(&[condition])
    }

    pub fn invalid_json_signal(&mut self, source: TermId, offset: u32) -> TermId {
        let condition = self.condition(Condition::InvalidJson { source, offset });
        self.signal(&[condition])
    }

    pub fn pending_signal(&mut self) -> TermId {
        self.signal(&[TermId::PENDING])
    }

    /// Union the conditions of every signal in `terms`, in order.
    ///
    /// Non-signal terms are ignored. Returns `None` if no signal was found;
    /// a single signal is returned unchanged.
    pub fn combine_signals(&mut self, terms: &[TermId]) -> Option<TermId> {
        let mut signals = terms.iter().copied().filter(|&id| self.is_signal(id));
        let first = signals.next()?;
        let rest: Vec<TermId> = signals.collect();
        if rest.is_empty() {
            return Some(first);
        }
        let mut conditions = self.signal_conditions(first).to_vec();
        for signal in rest {
            conditions.extend_from_slice(self.signal_conditions(signal));
        }
        Some(self.signal(&conditions))
    }

    /// Condition terms of a signal (empty for non-signals).
    pub fn signal_conditions(&self, signal: TermId) -> &[TermId] {
        match *self.kind(signal) {
            TermKind::Signal(range) => self.get_list(range),
            _ => &[],
        }
    }

    /// Condition payload of a condition term.
    pub fn as_condition(&self, id: TermId) -> Option<Condition> {
        match *self.kind(id) {
            TermKind::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    /// Signal made only of `Pending` conditions.
    pub fn is_pending_signal(&self, signal: TermId) -> bool {
        let conditions = self.signal_conditions(signal);
        !conditions.is_empty()
            && conditions
                .iter()
                .all(|&c| self.as_condition(c) == Some(Condition::Pending))
    }

    /// Signal containing at least one non-`Pending` condition.
    pub fn is_error_signal(&self, signal: TermId) -> bool {
        self.signal_conditions(signal)
            .iter()
            .any(|&c| !matches!(self.as_condition(c), Some(Condition::Pending) | None))
    }
}

#[cfg(test)]
mod tests;
