//! Growth-only term heap.
//!
//! # Design (after the type pool's struct-of-arrays layout)
//!
//! - Parallel `kinds`/`hashes`/`flags`/`scopes` arrays indexed by [`TermId`]
//! - Child lists flattened into `extra`, referenced by [`TermRange`]
//! - String payloads in one `bytes` buffer, referenced by [`StrRange`]
//! - Hash tables in one `buckets` buffer, referenced by [`Table`]
//!
//! Metadata (structural hash, [`TermFlags`], free-variable scope) is computed
//! once at allocation from the already-allocated children, so every query is
//! O(1) afterwards.
//!
//! Allocation is bump-style: buffers only grow, and an ID stays valid for the
//! lifetime of the heap. Running out of ID space is fatal.

mod collections;
mod construct;
mod format;
mod hash;
mod signal;

pub use format::{DebugTerm, DisplayTerm};

use crate::id::{to_u32, StrRange, Table, TermId, TermRange};
use crate::term::{Condition, IteratorTerm, TermFlags, TermKind, TermType};

/// One slot of an open-addressed hash table.
///
/// `key == TermId::NONE` marks an empty slot. Hashset slots store
/// `TermId::NIL` as their value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub key: TermId,
    pub value: TermId,
}

impl Bucket {
    pub const EMPTY: Bucket = Bucket {
        key: TermId::NONE,
        value: TermId::NONE,
    };

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.key.is_none()
    }
}

/// Occupancy counters for observability.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub terms: usize,
    pub extra: usize,
    pub bytes: usize,
    pub buckets: usize,
}

/// Arena owning every term of one runtime.
#[derive(Clone)]
pub struct Heap {
    /// Term payloads (parallel with hashes, flags and scopes).
    kinds: Vec<TermKind>,
    /// Structural hashes (parallel with kinds).
    hashes: Vec<u64>,
    /// Pre-computed flags (parallel with kinds).
    flags: Vec<TermFlags>,
    /// Number of enclosing binders the term's free variables need.
    scopes: Vec<u32>,
    /// Flattened child ID lists.
    extra: Vec<TermId>,
    /// String payloads.
    bytes: String,
    /// Hash table slots.
    buckets: Vec<Bucket>,
    /// Maximum number of terms before allocation is fatal.
    limit: usize,
    /// Names used when rendering builtin IDs.
    builtin_names: &'static [&'static str],
}

impl Heap {
    /// Create a heap with all singletons pre-allocated.
    pub fn new() -> Self {
        Self::with_limit(u32::MAX as usize - 1)
    }

    /// Create a heap that refuses to grow beyond `max_terms` terms.
    pub fn with_limit(max_terms: usize) -> Self {
        let mut heap = Heap {
            kinds: Vec::with_capacity(1024),
            hashes: Vec::with_capacity(1024),
            flags: Vec::with_capacity(1024),
            scopes: Vec::with_capacity(1024),
            extra: Vec::with_capacity(1024),
            bytes: String::with_capacity(4096),
            buckets: Vec::new(),
            limit: max_terms.max(TermId::SINGLETON_COUNT as usize),
            builtin_names: &[],
        };
        heap.intern_singletons();
        heap
    }

    /// Attach builtin names for display output.
    #[must_use]
    pub fn with_builtin_names(mut self, names: &'static [&'static str]) -> Self {
        self.builtin_names = names;
        self
    }

    fn intern_singletons(&mut self) {
        let nil = self.alloc(TermKind::Nil);
        let t = self.alloc(TermKind::Boolean(true));
        let f = self.alloc(TermKind::Boolean(false));
        let empty_list = self.alloc(TermKind::List(TermRange::EMPTY));
        let empty_string = self.alloc(TermKind::String(StrRange::EMPTY));
        let empty_iter = self.alloc(TermKind::Iterator(IteratorTerm::Empty));
        let integers = self.alloc(TermKind::Iterator(IteratorTerm::Integers));
        let pending = self.alloc(TermKind::Condition(Condition::Pending));
        debug_assert_eq!(nil, TermId::NIL);
        debug_assert_eq!(t, TermId::TRUE);
        debug_assert_eq!(f, TermId::FALSE);
        debug_assert_eq!(empty_list, TermId::EMPTY_LIST);
        debug_assert_eq!(empty_string, TermId::EMPTY_STRING);
        debug_assert_eq!(empty_iter, TermId::EMPTY_ITERATOR);
        debug_assert_eq!(integers, TermId::INTEGERS);
        debug_assert_eq!(pending, TermId::PENDING);
    }

    // === Allocation ===

    /// Allocate and initialize a term.
    ///
    /// All children referenced by `kind` must already be allocated.
    pub fn alloc(&mut self, kind: TermKind) -> TermId {
        let hash = self.structural_hash(&kind);
        let (flags, scope) = self.compute_metadata(&kind);
        if self.kinds.len() >= self.limit {
            heap_exhausted("terms");
        }
        let id = TermId::from_raw(to_u32(self.kinds.len(), "terms"));
        self.kinds.push(kind);
        self.hashes.push(hash);
        self.flags.push(flags);
        self.scopes.push(scope);
        id
    }

    /// Grow the term buffers ahead of a burst of allocations.
    ///
    /// Previously returned IDs stay valid; only capacity changes.
    pub fn reserve_terms(&mut self, additional: usize) {
        self.kinds.reserve(additional);
        self.hashes.reserve(additional);
        self.flags.reserve(additional);
        self.scopes.reserve(additional);
    }

    /// Copy a run of IDs into `extra`.
    pub fn alloc_range(&mut self, ids: &[TermId]) -> TermRange {
        if ids.is_empty() {
            return TermRange::EMPTY;
        }
        let start = to_u32(self.extra.len(), "child lists");
        self.extra.extend_from_slice(ids);
        TermRange::new(start, to_u32(ids.len(), "child list"))
    }

    /// Begin building a child list incrementally.
    pub fn begin_list(&self) -> u32 {
        to_u32(self.extra.len(), "child lists")
    }

    /// Push one ID to the list being built.
    pub fn push_list_item(&mut self, id: TermId) {
        self.extra.push(id);
    }

    /// Finish the list started at `start`.
    pub fn finish_list(&self, start: u32) -> TermRange {
        let len = to_u32(self.extra.len() - start as usize, "child list");
        if len == 0 {
            TermRange::EMPTY
        } else {
            TermRange::new(start, len)
        }
    }

    /// Begin an unsized string allocation.
    ///
    /// Bytes are appended straight into the heap's string buffer; the term is
    /// initialized by [`StringBuilder::finish`]. Dropping the builder without
    /// finishing rolls the bytes back.
    pub fn begin_string(&mut self) -> StringBuilder<'_> {
        let start = self.bytes.len();
        StringBuilder {
            heap: self,
            start,
            finished: false,
        }
    }

    /// Reserve a bucket array of `capacity` empty slots.
    pub(crate) fn alloc_buckets(&mut self, capacity: usize) -> u32 {
        let start = to_u32(self.buckets.len(), "hash buckets");
        self.buckets.resize(self.buckets.len() + capacity, Bucket::EMPTY);
        start
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket {
        &mut self.buckets[index]
    }

    // === Accessors ===

    #[inline]
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.kinds[id.index()]
    }

    #[inline]
    pub fn term_type(&self, id: TermId) -> TermType {
        self.kinds[id.index()].term_type()
    }

    /// Cached structural hash.
    #[inline]
    pub fn hash(&self, id: TermId) -> u64 {
        self.hashes[id.index()]
    }

    #[inline]
    pub fn flags(&self, id: TermId) -> TermFlags {
        self.flags[id.index()]
    }

    /// Binder depth needed by the term's free variables (`0` = closed).
    #[inline]
    pub fn scope(&self, id: TermId) -> u32 {
        self.scopes[id.index()]
    }

    /// Term contains no redex, signal or pending state anywhere inside.
    #[inline]
    pub fn is_atomic(&self, id: TermId) -> bool {
        self.flags(id).contains(TermFlags::ATOMIC)
    }

    #[inline]
    pub fn is_reducible(&self, id: TermId) -> bool {
        self.flags(id).contains(TermFlags::REDUCIBLE)
    }

    #[inline]
    pub fn is_signal(&self, id: TermId) -> bool {
        matches!(self.kind(id), TermKind::Signal(_))
    }

    /// `null`, `false`, zero, `NaN` and `""` are falsy.
    pub fn is_truthy(&self, id: TermId) -> bool {
        match *self.kind(id) {
            TermKind::Nil => false,
            TermKind::Boolean(b) => b,
            TermKind::Int(n) => n != 0,
            TermKind::Float(f) => f != 0.0 && !f.is_nan(),
            TermKind::String(range) => !range.is_empty(),
            _ => true,
        }
    }

    /// Number of heap cells occupied by the term's own payload.
    pub fn size(&self, id: TermId) -> usize {
        let payload = match *self.kind(id) {
            TermKind::String(range) => range.len().div_ceil(8),
            TermKind::List(range)
            | TermKind::Signal(range)
            | TermKind::Application { args: range, .. }
            | TermKind::Partial { args: range, .. }
            | TermKind::Iterator(IteratorTerm::Chain(range)) => range.len(),
            TermKind::Hashmap(table) | TermKind::Hashset(table) => table.capacity as usize * 2,
            _ => 0,
        };
        1 + payload
    }

    /// IDs of a child range.
    #[inline]
    pub fn get_list(&self, range: TermRange) -> &[TermId] {
        if range.is_empty() {
            return &[];
        }
        let start = range.start as usize;
        &self.extra[start..start + range.len()]
    }

    /// Text of a string payload.
    #[inline]
    pub fn get_str(&self, range: StrRange) -> &str {
        let start = range.start as usize;
        &self.bytes[start..start + range.len()]
    }

    /// Slots of a hash table.
    #[inline]
    pub fn get_buckets(&self, table: Table) -> &[Bucket] {
        let start = table.start as usize;
        &self.buckets[start..start + table.capacity as usize]
    }

    pub fn as_int(&self, id: TermId) -> Option<i64> {
        match *self.kind(id) {
            TermKind::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self, id: TermId) -> Option<f64> {
        match *self.kind(id) {
            TermKind::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Numeric value of an `Int` or `Float`.
    pub fn as_number(&self, id: TermId) -> Option<f64> {
        match *self.kind(id) {
            TermKind::Int(n) => Some(n as f64),
            TermKind::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bool(&self, id: TermId) -> Option<bool> {
        match *self.kind(id) {
            TermKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self, id: TermId) -> Option<&str> {
        match *self.kind(id) {
            TermKind::String(range) => Some(self.get_str(range)),
            _ => None,
        }
    }

    /// Items of a `List` term.
    pub fn as_list(&self, id: TermId) -> Option<&[TermId]> {
        match *self.kind(id) {
            TermKind::List(range) => Some(self.get_list(range)),
            _ => None,
        }
    }

    /// Name of a builtin ID, if names were attached.
    pub fn builtin_name(&self, id: crate::BuiltinId) -> Option<&'static str> {
        self.builtin_names.get(id.0 as usize).copied()
    }

    /// Number of allocated terms (including singletons).
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`: singletons are allocated up front.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            terms: self.kinds.len(),
            extra: self.extra.len(),
            bytes: self.bytes.len(),
            buckets: self.buckets.len(),
        }
    }

    // === Metadata ===

    /// Visit every direct child of a kind.
    pub fn for_each_child(&self, kind: &TermKind, mut f: impl FnMut(TermId)) {
        match *kind {
            TermKind::Nil
            | TermKind::Boolean(_)
            | TermKind::Int(_)
            | TermKind::Float(_)
            | TermKind::String(_)
            | TermKind::Symbol(_)
            | TermKind::Timestamp(_)
            | TermKind::Variable(_)
            | TermKind::Builtin(_) => {}
            TermKind::Let { initializer, body } => {
                f(initializer);
                f(body);
            }
            TermKind::Lambda { body, .. } => f(body),
            TermKind::Application { target, args } | TermKind::Partial { target, args } => {
                f(target);
                self.get_list(args).iter().copied().for_each(f);
            }
            TermKind::Constructor { keys } => f(keys),
            TermKind::Recursive { factory } => f(factory),
            TermKind::List(items) | TermKind::Signal(items) => {
                self.get_list(items).iter().copied().for_each(f);
            }
            TermKind::Record { keys, values } => {
                f(keys);
                f(values);
            }
            TermKind::Hashmap(table) => {
                for bucket in self.get_buckets(table) {
                    if !bucket.is_empty() {
                        f(bucket.key);
                        f(bucket.value);
                    }
                }
            }
            TermKind::Hashset(table) => {
                for bucket in self.get_buckets(table) {
                    if !bucket.is_empty() {
                        f(bucket.key);
                    }
                }
            }
            TermKind::Condition(condition) => match condition {
                Condition::Error(payload) => f(payload),
                Condition::InvalidFunctionArgs { target, args } => {
                    f(target);
                    f(args);
                }
                Condition::InvalidJson { source, .. } => f(source),
                Condition::Pending => {}
            },
            TermKind::Iterator(iterator) => match iterator {
                IteratorTerm::Empty | IteratorTerm::Integers | IteratorTerm::Range { .. } => {}
                IteratorTerm::Once(value) | IteratorTerm::Repeat(value) => f(value),
                IteratorTerm::Map { source, transform }
                | IteratorTerm::FlatMap { source, transform } => {
                    f(source);
                    f(transform);
                }
                IteratorTerm::Filter { source, predicate } => {
                    f(source);
                    f(predicate);
                }
                IteratorTerm::Flatten(source)
                | IteratorTerm::Evaluate(source)
                | IteratorTerm::HashmapKeys(source)
                | IteratorTerm::HashmapValues(source)
                | IteratorTerm::Skip { source, .. }
                | IteratorTerm::Take { source, .. } => f(source),
                IteratorTerm::Chain(sources) => {
                    self.get_list(sources).iter().copied().for_each(f);
                }
                IteratorTerm::Zip { left, right } => {
                    f(left);
                    f(right);
                }
            },
        }
    }

    fn compute_metadata(&self, kind: &TermKind) -> (TermFlags, u32) {
        let mut flags = TermFlags::empty();
        let mut atomic = true;
        let mut scope = 0u32;
        self.for_each_child(kind, |child| {
            let child_flags = self.flags(child);
            flags |= TermFlags::propagate_from(child_flags);
            atomic &= child_flags.contains(TermFlags::ATOMIC);
            scope = scope.max(self.scope(child));
        });

        match *kind {
            TermKind::Variable(index) => {
                scope = index.saturating_add(1);
                atomic = false;
            }
            TermKind::Lambda { arity, body } => {
                scope = self.scope(body).saturating_sub(arity);
                // Function values are opaque: the body only runs once applied.
                atomic = true;
            }
            TermKind::Let { initializer, body } => {
                scope = self.scope(initializer).max(self.scope(body).saturating_sub(1));
            }
            TermKind::Signal(_) => {
                flags |= TermFlags::HAS_SIGNAL;
                atomic = false;
            }
            TermKind::Condition(Condition::Pending) => {
                flags |= TermFlags::HAS_PENDING;
                atomic = false;
            }
            _ => {}
        }
        if kind.is_reducible() {
            flags |= TermFlags::REDUCIBLE;
            atomic = false;
        }
        if atomic {
            flags |= TermFlags::ATOMIC;
        }
        (flags, scope)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap").field("stats", &self.stats()).finish()
    }
}

/// In-progress unsized string allocation.
pub struct StringBuilder<'h> {
    heap: &'h mut Heap,
    start: usize,
    finished: bool,
}

impl StringBuilder<'_> {
    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.heap.bytes.push_str(s);
        self
    }

    pub fn push(&mut self, ch: char) -> &mut Self {
        self.heap.bytes.push(ch);
        self
    }

    /// Append the contents of an existing string term.
    pub fn push_term(&mut self, id: TermId) -> &mut Self {
        if let TermKind::String(range) = *self.heap.kind(id) {
            let start = range.start as usize;
            let segment = self.heap.bytes[start..start + range.len()].to_owned();
            self.heap.bytes.push_str(&segment);
        }
        self
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.heap.bytes.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Initialize the string term.
    pub fn finish(mut self) -> TermId {
        self.finished = true;
        let len = self.heap.bytes.len() - self.start;
        if len == 0 {
            return TermId::EMPTY_STRING;
        }
        let range = StrRange::new(
            to_u32(self.start, "string bytes"),
            to_u32(len, "string length"),
        );
        self.heap.alloc(TermKind::String(range))
    }
}

impl Drop for StringBuilder<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.heap.bytes.truncate(self.start);
        }
    }
}

/// Abort on heap exhaustion: there is no recovery path.
#[cold]
#[inline(never)]
pub(crate) fn heap_exhausted(what: &str) -> ! {
    tracing::error!(what, "term heap exhausted");
    panic!("heap exhausted: too many {what}");
}
