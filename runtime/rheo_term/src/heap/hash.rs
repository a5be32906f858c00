//! Structural hashing and equality.
//!
//! Hashes are computed once per term at allocation from the kind's scalar
//! payload and the cached hashes of its children, so hashing a term of any
//! depth is O(1). Equality short-circuits on identity and on hash mismatch
//! before comparing structure.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::Heap;
use crate::id::{Table, TermId, TermRange};
use crate::term::{Condition, IteratorTerm, TermKind};

impl Heap {
    /// Compute the structural hash of a kind whose children are allocated.
    pub(super) fn structural_hash(&self, kind: &TermKind) -> u64 {
        let mut hasher = FxHasher::default();
        (kind.term_type() as u8).hash(&mut hasher);
        match *kind {
            TermKind::Nil => {}
            TermKind::Boolean(b) => b.hash(&mut hasher),
            TermKind::Int(n) => n.hash(&mut hasher),
            TermKind::Float(f) => f.to_bits().hash(&mut hasher),
            TermKind::String(range) => self.get_str(range).hash(&mut hasher),
            TermKind::Symbol(id) | TermKind::Variable(id) => id.hash(&mut hasher),
            TermKind::Timestamp(ms) => ms.hash(&mut hasher),
            TermKind::Builtin(id) => id.hash(&mut hasher),
            TermKind::Lambda { arity, body } => {
                arity.hash(&mut hasher);
                self.hash(body).hash(&mut hasher);
            }
            TermKind::Hashmap(table) | TermKind::Hashset(table) => {
                table.len.hash(&mut hasher);
                self.table_hash(table).hash(&mut hasher);
            }
            TermKind::Condition(condition) => {
                condition_tag(condition).hash(&mut hasher);
                if let Condition::InvalidJson { offset, .. } = condition {
                    offset.hash(&mut hasher);
                }
                self.hash_children(kind, &mut hasher);
            }
            TermKind::Iterator(iterator) => {
                iterator.name().hash(&mut hasher);
                match iterator {
                    IteratorTerm::Range { start, len } => {
                        start.hash(&mut hasher);
                        len.hash(&mut hasher);
                    }
                    IteratorTerm::Skip { count, .. } | IteratorTerm::Take { count, .. } => {
                        count.hash(&mut hasher);
                    }
                    _ => {}
                }
                self.hash_children(kind, &mut hasher);
            }
            TermKind::Let { .. }
            | TermKind::Application { .. }
            | TermKind::Partial { .. }
            | TermKind::Constructor { .. }
            | TermKind::Recursive { .. }
            | TermKind::List(_)
            | TermKind::Record { .. }
            | TermKind::Signal(_) => self.hash_children(kind, &mut hasher),
        }
        hasher.finish()
    }

    fn hash_children(&self, kind: &TermKind, hasher: &mut FxHasher) {
        let mut count = 0u32;
        self.for_each_child(kind, |child| {
            self.hash(child).hash(hasher);
            count += 1;
        });
        count.hash(hasher);
    }

    /// Order-independent combination of entry hashes.
    fn table_hash(&self, table: Table) -> u64 {
        self.get_buckets(table)
            .iter()
            .filter(|bucket| !bucket.is_empty())
            .fold(0u64, |acc, bucket| {
                let mut entry = FxHasher::default();
                self.hash(bucket.key).hash(&mut entry);
                self.hash(bucket.value).hash(&mut entry);
                acc.wrapping_add(entry.finish())
            })
    }

    /// Structural equality.
    ///
    /// Floats compare by bit pattern, so `NaN` equals itself. Records compare
    /// field order; hashmaps and hashsets ignore bucket layout.
    pub fn equals(&self, a: TermId, b: TermId) -> bool {
        if a == b {
            return true;
        }
        if a.is_none() || b.is_none() || self.hash(a) != self.hash(b) {
            return false;
        }
        match (*self.kind(a), *self.kind(b)) {
            (TermKind::Nil, TermKind::Nil) => true,
            (TermKind::Boolean(x), TermKind::Boolean(y)) => x == y,
            (TermKind::Int(x), TermKind::Int(y)) => x == y,
            (TermKind::Float(x), TermKind::Float(y)) => x.to_bits() == y.to_bits(),
            (TermKind::String(x), TermKind::String(y)) => self.get_str(x) == self.get_str(y),
            (TermKind::Symbol(x), TermKind::Symbol(y))
            | (TermKind::Variable(x), TermKind::Variable(y)) => x == y,
            (TermKind::Timestamp(x), TermKind::Timestamp(y)) => x == y,
            (TermKind::Builtin(x), TermKind::Builtin(y)) => x == y,
            (
                TermKind::Let {
                    initializer: i1,
                    body: b1,
                },
                TermKind::Let {
                    initializer: i2,
                    body: b2,
                },
            ) => self.equals(i1, i2) && self.equals(b1, b2),
            (
                TermKind::Lambda {
                    arity: a1,
                    body: b1,
                },
                TermKind::Lambda {
                    arity: a2,
                    body: b2,
                },
            ) => a1 == a2 && self.equals(b1, b2),
            (
                TermKind::Application {
                    target: t1,
                    args: r1,
                },
                TermKind::Application {
                    target: t2,
                    args: r2,
                },
            )
            | (
                TermKind::Partial {
                    target: t1,
                    args: r1,
                },
                TermKind::Partial {
                    target: t2,
                    args: r2,
                },
            ) => self.equals(t1, t2) && self.ranges_equal(r1, r2),
            (TermKind::Constructor { keys: k1 }, TermKind::Constructor { keys: k2 }) => {
                self.equals(k1, k2)
            }
            (TermKind::Recursive { factory: f1 }, TermKind::Recursive { factory: f2 }) => {
                self.equals(f1, f2)
            }
            (TermKind::List(r1), TermKind::List(r2))
            | (TermKind::Signal(r1), TermKind::Signal(r2)) => self.ranges_equal(r1, r2),
            (
                TermKind::Record {
                    keys: k1,
                    values: v1,
                },
                TermKind::Record {
                    keys: k2,
                    values: v2,
                },
            ) => self.equals(k1, k2) && self.equals(v1, v2),
            (TermKind::Hashmap(t1), TermKind::Hashmap(t2)) => {
                t1.len == t2.len
                    && self.get_buckets(t1).iter().all(|bucket| {
                        bucket.is_empty()
                            || self
                                .table_lookup(t2, bucket.key)
                                .is_some_and(|other| self.equals(bucket.value, other))
                    })
            }
            (TermKind::Hashset(t1), TermKind::Hashset(t2)) => {
                t1.len == t2.len
                    && self.get_buckets(t1).iter().all(|bucket| {
                        bucket.is_empty() || self.table_lookup(t2, bucket.key).is_some()
                    })
            }
            (TermKind::Condition(c1), TermKind::Condition(c2)) => self.conditions_equal(c1, c2),
            (TermKind::Iterator(i1), TermKind::Iterator(i2)) => self.iterators_equal(i1, i2),
            _ => false,
        }
    }

    fn ranges_equal(&self, a: TermRange, b: TermRange) -> bool {
        a.len == b.len
            && self
                .get_list(a)
                .iter()
                .zip(self.get_list(b))
                .all(|(&x, &y)| self.equals(x, y))
    }

    fn conditions_equal(&self, a: Condition, b: Condition) -> bool {
        match (a, b) {
            (Condition::Error(x), Condition::Error(y)) => self.equals(x, y),
            (
                Condition::InvalidFunctionArgs {
                    target: t1,
                    args: a1,
                },
                Condition::InvalidFunctionArgs {
                    target: t2,
                    args: a2,
                },
            ) => self.equals(t1, t2) && self.equals(a1, a2),
            (
                Condition::InvalidJson {
                    source: s1,
                    offset: o1,
                },
                Condition::InvalidJson {
                    source: s2,
                    offset: o2,
                },
            ) => o1 == o2 && self.equals(s1, s2),
            (Condition::Pending, Condition::Pending) => true,
            _ => false,
        }
    }

    fn iterators_equal(&self, a: IteratorTerm, b: IteratorTerm) -> bool {
        use IteratorTerm as I;
        match (a, b) {
            (I::Empty, I::Empty) | (I::Integers, I::Integers) => true,
            (I::Range { start: s1, len: l1 }, I::Range { start: s2, len: l2 }) => {
                s1 == s2 && l1 == l2
            }
            (I::Once(x), I::Once(y))
            | (I::Repeat(x), I::Repeat(y))
            | (I::Flatten(x), I::Flatten(y))
            | (I::Evaluate(x), I::Evaluate(y))
            | (I::HashmapKeys(x), I::HashmapKeys(y))
            | (I::HashmapValues(x), I::HashmapValues(y)) => self.equals(x, y),
            (
                I::Map {
                    source: s1,
                    transform: f1,
                },
                I::Map {
                    source: s2,
                    transform: f2,
                },
            )
            | (
                I::FlatMap {
                    source: s1,
                    transform: f1,
                },
                I::FlatMap {
                    source: s2,
                    transform: f2,
                },
            )
            | (
                I::Filter {
                    source: s1,
                    predicate: f1,
                },
                I::Filter {
                    source: s2,
                    predicate: f2,
                },
            )
            | (I::Zip { left: s1, right: f1 }, I::Zip { left: s2, right: f2 }) => {
                self.equals(s1, s2) && self.equals(f1, f2)
            }
            (I::Chain(r1), I::Chain(r2)) => self.ranges_equal(r1, r2),
            (
                I::Skip {
                    source: s1,
                    count: c1,
                },
                I::Skip {
                    source: s2,
                    count: c2,
                },
            )
            | (
                I::Take {
                    source: s1,
                    count: c1,
                },
                I::Take {
                    source: s2,
                    count: c2,
                },
            ) => c1 == c2 && self.equals(s1, s2),
            _ => false,
        }
    }
}

fn condition_tag(condition: Condition) -> u8 {
    match condition {
        Condition::Error(_) => 0,
        Condition::InvalidFunctionArgs { .. } => 1,
        Condition::InvalidJson { .. } => 2,
        Condition::Pending => 3,
    }
}
