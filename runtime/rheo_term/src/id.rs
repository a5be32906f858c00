//! Term IDs and ranges into the heap's flat storage.
//!
//! Every term lives in the [`Heap`](crate::Heap) and is referenced by a
//! 32-bit [`TermId`]. Child lists, string payloads and hash tables are stored
//! in side buffers and referenced by compact ranges, so every [`TermKind`]
//! stays `Copy`.
//!
//! [`TermKind`]: crate::TermKind

use std::fmt;

/// Index into the term heap.
///
/// - Memory: 4 bytes
/// - Equality: O(1) identity compare (structural equality lives on `Heap`)
/// - Singletons have fixed indices and are allocated by every heap up front
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TermId(u32);

impl TermId {
    // === Pre-interned singletons (indices 0-7) ===

    /// The `null` value.
    pub const NIL: Self = Self(0);
    /// `true`.
    pub const TRUE: Self = Self(1);
    /// `false`.
    pub const FALSE: Self = Self(2);
    /// The empty list `[]`.
    pub const EMPTY_LIST: Self = Self(3);
    /// The empty string `""`.
    pub const EMPTY_STRING: Self = Self(4);
    /// The empty iterator.
    pub const EMPTY_ITERATOR: Self = Self(5);
    /// The infinite `0, 1, 2, ...` iterator.
    pub const INTEGERS: Self = Self(6);
    /// A bare `Pending` condition (not a signal).
    pub const PENDING: Self = Self(7);

    /// Number of pre-interned singletons.
    pub const SINGLETON_COUNT: u32 = 8;

    /// Sentinel for "no term" (empty hash buckets).
    pub const NONE: Self = Self(u32::MAX);

    /// Create an ID from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index into the heap.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the `NONE` sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Check if this is one of the pre-interned singletons.
    #[inline]
    pub const fn is_singleton(self) -> bool {
        self.0 < Self::SINGLETON_COUNT
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NIL => write!(f, "TermId::NIL"),
            Self::TRUE => write!(f, "TermId::TRUE"),
            Self::FALSE => write!(f, "TermId::FALSE"),
            Self::EMPTY_LIST => write!(f, "TermId::EMPTY_LIST"),
            Self::EMPTY_STRING => write!(f, "TermId::EMPTY_STRING"),
            Self::EMPTY_ITERATOR => write!(f, "TermId::EMPTY_ITERATOR"),
            Self::INTEGERS => write!(f, "TermId::INTEGERS"),
            Self::PENDING => write!(f, "TermId::PENDING"),
            Self::NONE => write!(f, "TermId::NONE"),
            Self(raw) => write!(f, "TermId({raw})"),
        }
    }
}

/// Range of term IDs in the heap's flattened `extra` buffer.
///
/// Used for argument lists, list items, signal condition sets and chain
/// sources. `start` is an offset into `extra`, `len` the number of IDs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TermRange {
    pub start: u32,
    pub len: u32,
}

impl TermRange {
    /// Empty range.
    pub const EMPTY: TermRange = TermRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        TermRange { start, len }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }
}

/// Byte range of a string payload in the heap's string buffer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StrRange {
    pub start: u32,
    pub len: u32,
}

impl StrRange {
    /// Empty string payload.
    pub const EMPTY: StrRange = StrRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        StrRange { start, len }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Open-addressed hash table stored in the heap's bucket buffer.
///
/// `capacity` is always a power of two (or zero for the empty table).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Table {
    /// Offset of the first bucket.
    pub start: u32,
    /// Number of buckets.
    pub capacity: u32,
    /// Number of occupied buckets.
    pub len: u32,
}

impl Table {
    /// Table with no buckets.
    pub const EMPTY: Table = Table {
        start: 0,
        capacity: 0,
        len: 0,
    };

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Opaque builtin identifier, resolved by the stdlib dispatch engine.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BuiltinId(pub u32);

/// Convert a buffer length to `u32`, treating overflow as heap exhaustion.
#[inline]
pub(crate) fn to_u32(value: usize, what: &str) -> u32 {
    match u32::try_from(value) {
        Ok(v) => v,
        Err(_) => crate::heap::heap_exhausted(what),
    }
}
