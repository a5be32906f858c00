//! State dependency tracking.
//!
//! A [`Dependencies`] set records which external state keys a computed value
//! was derived from. Sets are kept sorted and deduplicated, so union is
//! commutative, associative and idempotent regardless of the order in which
//! sub-expressions were evaluated.

use std::fmt;

use smallvec::SmallVec;

use crate::{Heap, TermId};

/// Opaque key identifying one piece of external state.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateToken(pub u64);

impl StateToken {
    /// Reserved token for the host clock read by `Now`.
    pub const CLOCK: StateToken = StateToken(0);

    /// Token for a key term, derived from its structural hash.
    ///
    /// Structurally equal keys map to the same token. Tokens are 64-bit
    /// hashes, so two distinct keys whose hashes collide would share one
    /// state slot; collisions are assumed not to occur.
    /// `StateSnapshot::write` in `rheo_eval` logs one if it does.
    pub fn of(heap: &Heap, key: TermId) -> StateToken {
        // Keep the reserved clock slot out of the derived space.
        match heap.hash(key) {
            0 => StateToken(1),
            hash => StateToken(hash),
        }
    }
}

impl fmt::Debug for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::CLOCK {
            write!(f, "StateToken::CLOCK")
        } else {
            write!(f, "StateToken({:#018x})", self.0)
        }
    }
}

/// Sorted, duplicate-free set of [`StateToken`]s.
///
/// The empty set means "no dependency".
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Dependencies {
    tokens: SmallVec<[StateToken; 4]>,
}

impl Dependencies {
    /// The empty set.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// Set containing a single token.
    pub fn of(token: StateToken) -> Self {
        let mut tokens = SmallVec::new();
        tokens.push(token);
        Dependencies { tokens }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: StateToken) -> bool {
        self.tokens.binary_search(&token).is_ok()
    }

    /// Add a single token.
    pub fn insert(&mut self, token: StateToken) {
        if let Err(pos) = self.tokens.binary_search(&token) {
            self.tokens.insert(pos, token);
        }
    }

    /// Union `other` into `self`.
    pub fn extend(&mut self, other: &Dependencies) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.tokens.clone_from(&other.tokens);
            return;
        }
        let mut merged = SmallVec::with_capacity(self.tokens.len() + other.tokens.len());
        let (mut left, mut right) = (self.tokens.iter().peekable(), other.tokens.iter().peekable());
        loop {
            match (left.peek(), right.peek()) {
                (Some(&&a), Some(&&b)) => {
                    if a < b {
                        merged.push(a);
                        left.next();
                    } else if b < a {
                        merged.push(b);
                        right.next();
                    } else {
                        merged.push(a);
                        left.next();
                        right.next();
                    }
                }
                (Some(&&a), None) => {
                    merged.push(a);
                    left.next();
                }
                (None, Some(&&b)) => {
                    merged.push(b);
                    right.next();
                }
                (None, None) => break,
            }
        }
        self.tokens = merged;
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(mut self, other: &Dependencies) -> Self {
        self.extend(other);
        self
    }

    /// Whether any of `tokens` is in the set.
    pub fn intersects(&self, tokens: &[StateToken]) -> bool {
        tokens.iter().any(|token| self.contains(*token))
    }

    pub fn iter(&self) -> impl Iterator<Item = StateToken> + '_ {
        self.tokens.iter().copied()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tokens.iter()).finish()
    }
}

impl FromIterator<StateToken> for Dependencies {
    fn from_iter<I: IntoIterator<Item = StateToken>>(iter: I) -> Self {
        let mut deps = Dependencies::none();
        for token in iter {
            deps.insert(token);
        }
        deps
    }
}
