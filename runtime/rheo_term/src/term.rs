//! Term kinds stored in the heap.
//!
//! Every variant is `Copy`: composite payloads reference children through
//! [`TermId`]s and ranges into the heap's side buffers. This lets callers read
//! a kind out of the heap and keep allocating without holding a borrow.

use std::fmt;

use bitflags::bitflags;

use crate::id::{BuiltinId, StrRange, Table, TermId, TermRange};

/// Payload of a single heap term.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TermKind {
    // === Scalars ===
    /// `null`.
    Nil,
    Boolean(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit IEEE float.
    Float(f64),
    /// UTF-8 string payload in the heap's string buffer.
    String(StrRange),
    /// Opaque unique symbol.
    Symbol(u32),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),

    // === Expressions ===
    /// De Bruijn variable: binders are counted from the innermost outward.
    Variable(u32),
    /// Binds `initializer` as `Variable(0)` inside `body`.
    Let { initializer: TermId, body: TermId },
    /// Function of `arity` arguments; the last argument is `Variable(0)`.
    Lambda { arity: u32, body: TermId },
    /// Call `target` with `args`.
    Application { target: TermId, args: TermRange },
    /// Callable with a partially applied argument prefix.
    Partial { target: TermId, args: TermRange },
    /// Native function resolved by the stdlib dispatch engine.
    Builtin(BuiltinId),
    /// Record constructor: applying it to N values builds a record with these keys.
    Constructor { keys: TermId },
    /// Fixed point: reduces to `factory(self)`.
    Recursive { factory: TermId },

    // === Collections ===
    List(TermRange),
    /// Parallel `keys`/`values` lists (both `List` terms).
    Record { keys: TermId, values: TermId },
    Hashmap(Table),
    Hashset(Table),

    // === Signals ===
    /// Non-empty ordered set of `Condition` terms.
    Signal(TermRange),
    Condition(Condition),

    // === Lazy sequences ===
    Iterator(IteratorTerm),
}

/// Reason a computation could not produce a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// User-level thrown error with an arbitrary payload.
    Error(TermId),
    /// No builtin implementation accepted the arguments.
    ///
    /// `args` is a `List` term.
    InvalidFunctionArgs { target: TermId, args: TermId },
    /// Malformed JSON input; `offset` is the byte offset of the failure.
    InvalidJson { source: TermId, offset: u32 },
    /// The value depends on state that is not yet available.
    Pending,
}

/// Lazy sequence variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IteratorTerm {
    Empty,
    /// `0, 1, 2, ...` (unbounded).
    Integers,
    /// `start, start + 1, ...` for `len` items.
    Range { start: i64, len: u64 },
    Once(TermId),
    /// The same value forever.
    Repeat(TermId),
    /// Lazily applies `transform` to each item.
    Map { source: TermId, transform: TermId },
    /// Yields source items for which `predicate` is truthy.
    Filter { source: TermId, predicate: TermId },
    /// Concatenates the iterables yielded by `source`.
    Flatten(TermId),
    /// `Flatten(Map(source, transform))`.
    FlatMap { source: TermId, transform: TermId },
    /// Concatenates a fixed list of sources in order.
    Chain(TermRange),
    /// Pairs items in lockstep, ending with the shorter side.
    Zip { left: TermId, right: TermId },
    Skip { source: TermId, count: u32 },
    Take { source: TermId, count: u32 },
    /// Forces every item of `source` to normal form.
    Evaluate(TermId),
    HashmapKeys(TermId),
    HashmapValues(TermId),
}

impl IteratorTerm {
    /// Short lowercase name used by display output.
    pub fn name(self) -> &'static str {
        match self {
            IteratorTerm::Empty => "empty",
            IteratorTerm::Integers => "integers",
            IteratorTerm::Range { .. } => "range",
            IteratorTerm::Once(_) => "once",
            IteratorTerm::Repeat(_) => "repeat",
            IteratorTerm::Map { .. } => "map",
            IteratorTerm::Filter { .. } => "filter",
            IteratorTerm::Flatten(_) => "flatten",
            IteratorTerm::FlatMap { .. } => "flat_map",
            IteratorTerm::Chain(_) => "chain",
            IteratorTerm::Zip { .. } => "zip",
            IteratorTerm::Skip { .. } => "skip",
            IteratorTerm::Take { .. } => "take",
            IteratorTerm::Evaluate(_) => "evaluate",
            IteratorTerm::HashmapKeys(_) => "hashmap_keys",
            IteratorTerm::HashmapValues(_) => "hashmap_values",
        }
    }
}

/// Fieldless tag for each [`TermKind`] variant.
///
/// Used by dispatch guards and error messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TermType {
    Nil = 0,
    Boolean = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Symbol = 5,
    Timestamp = 6,
    Variable = 16,
    Let = 17,
    Lambda = 18,
    Application = 19,
    Partial = 20,
    Builtin = 21,
    Constructor = 22,
    Recursive = 23,
    List = 32,
    Record = 33,
    Hashmap = 34,
    Hashset = 35,
    Signal = 48,
    Condition = 49,
    Iterator = 64,
}

impl TermType {
    /// Human-readable type name.
    pub const fn name(self) -> &'static str {
        match self {
            TermType::Nil => "Nil",
            TermType::Boolean => "Boolean",
            TermType::Int => "Int",
            TermType::Float => "Float",
            TermType::String => "String",
            TermType::Symbol => "Symbol",
            TermType::Timestamp => "Timestamp",
            TermType::Variable => "Variable",
            TermType::Let => "Let",
            TermType::Lambda => "Lambda",
            TermType::Application => "Application",
            TermType::Partial => "Partial",
            TermType::Builtin => "Builtin",
            TermType::Constructor => "Constructor",
            TermType::Recursive => "Recursive",
            TermType::List => "List",
            TermType::Record => "Record",
            TermType::Hashmap => "Hashmap",
            TermType::Hashset => "Hashset",
            TermType::Signal => "Signal",
            TermType::Condition => "Condition",
            TermType::Iterator => "Iterator",
        }
    }

    /// Types that can be iterated by the iterator protocol.
    pub const fn is_iterable(self) -> bool {
        matches!(
            self,
            TermType::List
                | TermType::Record
                | TermType::Hashmap
                | TermType::Hashset
                | TermType::String
                | TermType::Iterator
        )
    }

    /// Types that can be the target of an application.
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            TermType::Lambda | TermType::Partial | TermType::Builtin | TermType::Constructor
        )
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, TermType::Int | TermType::Float)
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TermKind {
    /// Get the type tag for this kind.
    pub const fn term_type(&self) -> TermType {
        match self {
            TermKind::Nil => TermType::Nil,
            TermKind::Boolean(_) => TermType::Boolean,
            TermKind::Int(_) => TermType::Int,
            TermKind::Float(_) => TermType::Float,
            TermKind::String(_) => TermType::String,
            TermKind::Symbol(_) => TermType::Symbol,
            TermKind::Timestamp(_) => TermType::Timestamp,
            TermKind::Variable(_) => TermType::Variable,
            TermKind::Let { .. } => TermType::Let,
            TermKind::Lambda { .. } => TermType::Lambda,
            TermKind::Application { .. } => TermType::Application,
            TermKind::Partial { .. } => TermType::Partial,
            TermKind::Builtin(_) => TermType::Builtin,
            TermKind::Constructor { .. } => TermType::Constructor,
            TermKind::Recursive { .. } => TermType::Recursive,
            TermKind::List(_) => TermType::List,
            TermKind::Record { .. } => TermType::Record,
            TermKind::Hashmap(_) => TermType::Hashmap,
            TermKind::Hashset(_) => TermType::Hashset,
            TermKind::Signal(_) => TermType::Signal,
            TermKind::Condition(_) => TermType::Condition,
            TermKind::Iterator(_) => TermType::Iterator,
        }
    }

    /// Whether the term itself is a redex (evaluation may rewrite it).
    pub const fn is_reducible(&self) -> bool {
        matches!(
            self,
            TermKind::Application { .. }
                | TermKind::Let { .. }
                | TermKind::Variable(_)
                | TermKind::Recursive { .. }
        )
    }
}

bitflags! {
    /// Pre-computed term properties for O(1) queries.
    ///
    /// Computed once at allocation time, never recomputed.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TermFlags: u8 {
        /// Contains no redex, signal or pending condition anywhere inside.
        const ATOMIC = 1 << 0;
        /// The term itself is a redex.
        const REDUCIBLE = 1 << 1;
        /// A signal occurs somewhere inside.
        const HAS_SIGNAL = 1 << 2;
        /// A pending condition occurs somewhere inside.
        const HAS_PENDING = 1 << 3;
    }
}

impl TermFlags {
    /// Flags inherited by a parent from its children.
    pub const PROPAGATE_MASK: Self =
        Self::from_bits_truncate(Self::HAS_SIGNAL.bits() | Self::HAS_PENDING.bits());

    /// Combine propagated flags from a child.
    #[inline]
    pub const fn propagate_from(child: Self) -> Self {
        Self::from_bits_truncate(child.bits() & Self::PROPAGATE_MASK.bits())
    }
}
