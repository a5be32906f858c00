//! Term construction helpers for the heap.
//!
//! Provides ergonomic methods for creating scalar, expression and iterator
//! terms. Collections live in `collections`, signals in `signal`.

use super::Heap;
use crate::id::{BuiltinId, TermId};
use crate::term::{IteratorTerm, TermKind};

impl Heap {
    // === Scalars ===

    pub fn int(&mut self, value: i64) -> TermId {
        self.alloc(TermKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> TermId {
        self.alloc(TermKind::Float(value))
    }

    pub fn boolean(&self, value: bool) -> TermId {
        if value {
            TermId::TRUE
        } else {
            TermId::FALSE
        }
    }

    /// One-shot string allocation.
    pub fn alloc_string(&mut self, value: &str) -> TermId {
        if value.is_empty() {
            return TermId::EMPTY_STRING;
        }
        let mut builder = self.begin_string();
        builder.push_str(value);
        builder.finish()
    }

    pub fn symbol(&mut self, id: u32) -> TermId {
        self.alloc(TermKind::Symbol(id))
    }

    /// Timestamp in milliseconds since the Unix epoch.
    pub fn timestamp(&mut self, millis: i64) -> TermId {
        self.alloc(TermKind::Timestamp(millis))
    }

    // === Expressions ===

    pub fn variable(&mut self, index: u32) -> TermId {
        self.alloc(TermKind::Variable(index))
    }

    /// Function of `arity` arguments; the last argument is `Variable(0)`.
    pub fn lambda(&mut self, arity: u32, body: TermId) -> TermId {
        self.alloc(TermKind::Lambda { arity, body })
    }

    /// Application of `target` to `args`.
    pub fn apply(&mut self, target: TermId, args: &[TermId]) -> TermId {
        let args = self.alloc_range(args);
        self.alloc(TermKind::Application { target, args })
    }

    /// Partial application of `target` to an argument prefix.
    pub fn partial(&mut self, target: TermId, args: &[TermId]) -> TermId {
        let args = self.alloc_range(args);
        self.alloc(TermKind::Partial { target, args })
    }

    pub fn builtin(&mut self, id: BuiltinId) -> TermId {
        self.alloc(TermKind::Builtin(id))
    }

    /// `let x = initializer in body`, with `x` as `Variable(0)` in `body`.
    pub fn let_(&mut self, initializer: TermId, body: TermId) -> TermId {
        self.alloc(TermKind::Let { initializer, body })
    }

    /// Record constructor for the given key list.
    pub fn constructor(&mut self, keys: &[TermId]) -> TermId {
        let keys = self.list(keys);
        self.alloc(TermKind::Constructor { keys })
    }

    /// Fixed point of a one-argument `factory`.
    pub fn recursive(&mut self, factory: TermId) -> TermId {
        self.alloc(TermKind::Recursive { factory })
    }

    // === Iterators ===

    pub fn iterator(&mut self, iterator: IteratorTerm) -> TermId {
        match iterator {
            IteratorTerm::Empty => TermId::EMPTY_ITERATOR,
            IteratorTerm::Integers => TermId::INTEGERS,
            other => self.alloc(TermKind::Iterator(other)),
        }
    }

    /// `start, start + 1, ...` for `len` items.
    pub fn range_iterator(&mut self, start: i64, len: u64) -> TermId {
        if len == 0 {
            return TermId::EMPTY_ITERATOR;
        }
        self.iterator(IteratorTerm::Range { start, len })
    }

    pub fn once_iterator(&mut self, value: TermId) -> TermId {
        self.iterator(IteratorTerm::Once(value))
    }

    pub fn repeat_iterator(&mut self, value: TermId) -> TermId {
        self.iterator(IteratorTerm::Repeat(value))
    }

    pub fn map_iterator(&mut self, source: TermId, transform: TermId) -> TermId {
        self.iterator(IteratorTerm::Map { source, transform })
    }

    pub fn filter_iterator(&mut self, source: TermId, predicate: TermId) -> TermId {
        self.iterator(IteratorTerm::Filter { source, predicate })
    }

    pub fn flatten_iterator(&mut self, source: TermId) -> TermId {
        self.iterator(IteratorTerm::Flatten(source))
    }

    pub fn flat_map_iterator(&mut self, source: TermId, transform: TermId) -> TermId {
        self.iterator(IteratorTerm::FlatMap { source, transform })
    }

    pub fn chain_iterator(&mut self, sources: &[TermId]) -> TermId {
        if sources.is_empty() {
            return TermId::EMPTY_ITERATOR;
        }
        let range = self.alloc_range(sources);
        self.iterator(IteratorTerm::Chain(range))
    }

    pub fn zip_iterator(&mut self, left: TermId, right: TermId) -> TermId {
        self.iterator(IteratorTerm::Zip { left, right })
    }

    /// Skipping nothing returns `source` only when it is already an iterator.
    pub fn skip_iterator(&mut self, source: TermId, count: u32) -> TermId {
        if count == 0 && matches!(self.kind(source), TermKind::Iterator(_)) {
            return source;
        }
        self.iterator(IteratorTerm::Skip { source, count })
    }

    pub fn take_iterator(&mut self, source: TermId, count: u32) -> TermId {
        if count == 0 {
            return TermId::EMPTY_ITERATOR;
        }
        self.iterator(IteratorTerm::Take { source, count })
    }

    pub fn evaluate_iterator(&mut self, source: TermId) -> TermId {
        self.iterator(IteratorTerm::Evaluate(source))
    }

    pub fn hashmap_keys_iterator(&mut self, map: TermId) -> TermId {
        self.iterator(IteratorTerm::HashmapKeys(map))
    }

    pub fn hashmap_values_iterator(&mut self, map: TermId) -> TermId {
        self.iterator(IteratorTerm::HashmapValues(map))
    }
}
