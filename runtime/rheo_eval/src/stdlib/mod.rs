//! Native builtins.
//!
//! Every builtin is a static [`BuiltinDef`] registered in [`Stdlib`]. The
//! enum discriminant is the [`BuiltinId`] stored in `Builtin` terms, and
//! [`Stdlib::NAMES`] is handed to the heap so builtins display by name.
//!
//! Builtins are grouped by concern:
//!
//! - `access`: accessor dispatch, application, sequencing and state reads
//! - `arithmetic` / `logic`: numeric operators, comparisons, branching
//! - `collections`: lookup, persistent updates and deep resolution
//! - `iterators`: lazy sequence constructors and consumers
//! - `strings`: text operations and the JSON bridge
//! - `signals`: throwing, catching and formatting errors

mod access;
mod arithmetic;
mod collections;
mod iterators;
mod logic;
mod signals;
mod strings;

use rheo_term::{BuiltinId, TermId};

use crate::dispatch::{BuiltinDef, Invocation};

/// Defines the [`Stdlib`] enum and its registry tables from one list, so
/// ids, names and definitions cannot drift apart.
macro_rules! define_stdlib {
    ($($variant:ident => $def:path),* $(,)?) => {
        /// Registered builtins.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Stdlib {
            $($variant),*
        }

        impl Stdlib {
            /// Every builtin, in id order.
            pub const ALL: &'static [Stdlib] = &[$(Stdlib::$variant),*];

            /// Builtin names, in id order.
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),*];

            /// Static registration of this builtin.
            pub fn definition(self) -> &'static BuiltinDef {
                match self {
                    $(Stdlib::$variant => &$def),*
                }
            }
        }
    };
}

define_stdlib! {
    // access
    Accessor => access::ACCESSOR,
    Apply => access::APPLY,
    Sequence => access::SEQUENCE,
    Get => access::GET,
    Now => access::NOW,
    // signals
    Throw => signals::THROW,
    FormatErrorMessage => signals::FORMAT_ERROR_MESSAGE,
    IfError => signals::IF_ERROR,
    IfPending => signals::IF_PENDING,
    CollectSignal => signals::COLLECT_SIGNAL,
    Pending => signals::PENDING,
    // logic
    Eq => logic::EQ,
    Gt => logic::GT,
    Gte => logic::GTE,
    Lt => logic::LT,
    Lte => logic::LTE,
    Not => logic::NOT,
    And => logic::AND,
    Or => logic::OR,
    If => logic::IF,
    // arithmetic
    Add => arithmetic::ADD,
    Subtract => arithmetic::SUBTRACT,
    Multiply => arithmetic::MULTIPLY,
    Divide => arithmetic::DIVIDE,
    Remainder => arithmetic::REMAINDER,
    Pow => arithmetic::POW,
    Abs => arithmetic::ABS,
    Floor => arithmetic::FLOOR,
    Ceil => arithmetic::CEIL,
    Round => arithmetic::ROUND,
    Max => arithmetic::MAX,
    Min => arithmetic::MIN,
    // collections
    Lookup => collections::LOOKUP,
    Insert => collections::INSERT,
    Contains => collections::CONTAINS,
    Length => collections::LENGTH,
    Push => collections::PUSH,
    PushFront => collections::PUSH_FRONT,
    Concat => collections::CONCAT,
    Slice => collections::SLICE,
    Merge => collections::MERGE,
    Entries => collections::ENTRIES,
    ResolveList => collections::RESOLVE_LIST,
    ResolveRecord => collections::RESOLVE_RECORD,
    ResolveDeep => collections::RESOLVE_DEEP,
    // strings
    Split => strings::SPLIT,
    Replace => strings::REPLACE,
    StartsWith => strings::STARTS_WITH,
    EndsWith => strings::ENDS_WITH,
    Join => strings::JOIN,
    ToString => strings::TO_STRING,
    ParseInt => strings::PARSE_INT,
    ParseFloat => strings::PARSE_FLOAT,
    ParseJson => strings::PARSE_JSON,
    StringifyJson => strings::STRINGIFY_JSON,
    // iterators
    Map => iterators::MAP,
    Filter => iterators::FILTER,
    Flatten => iterators::FLATTEN,
    FlatMap => iterators::FLAT_MAP,
    Chain => iterators::CHAIN,
    Zip => iterators::ZIP,
    Skip => iterators::SKIP,
    Take => iterators::TAKE,
    Repeat => iterators::REPEAT,
    Once => iterators::ONCE,
    Range => iterators::RANGE,
    Integers => iterators::INTEGERS,
    Evaluate => iterators::EVALUATE,
    Keys => iterators::KEYS,
    Values => iterators::VALUES,
    Fold => iterators::FOLD,
    CollectList => iterators::COLLECT_LIST,
    CollectHashmap => iterators::COLLECT_HASHMAP,
    CollectHashset => iterators::COLLECT_HASHSET,
    CollectRecord => iterators::COLLECT_RECORD,
}

impl Stdlib {
    /// Id stored in `Builtin` terms.
    #[inline]
    pub const fn id(self) -> BuiltinId {
        BuiltinId(self as u32)
    }

    pub fn from_id(id: BuiltinId) -> Option<Stdlib> {
        Self::ALL.get(id.0 as usize).copied()
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    /// Look a builtin up by name.
    pub fn from_name(name: &str) -> Option<Stdlib> {
        Self::NAMES
            .iter()
            .position(|&candidate| candidate == name)
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

/// `Partial(method, [receiver])`: a builtin bound to its first argument.
fn bind_method(inv: &mut Invocation<'_, '_>, method: Stdlib, receiver: TermId) -> TermId {
    let heap = inv.heap_mut();
    let builtin = heap.builtin(method.id());
    heap.partial(builtin, &[receiver])
}
