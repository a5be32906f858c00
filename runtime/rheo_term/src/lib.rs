//! Term model for the Rheo reactive expression runtime.
//!
//! This crate owns the data side of the runtime:
//!
//! - [`Heap`]: growth-only arena holding every term, with cached structural
//!   hashes, flags and scope depths
//! - [`TermKind`]: the tagged payload of each term
//! - persistent lists, records, hashmaps and hashsets
//! - [`Dependencies`] and signal helpers
//! - display, debug and JSON serialization
//!
//! Evaluation lives in `rheo_eval`.

mod dependencies;
mod heap;
mod id;
pub mod json;
mod term;

pub use dependencies::{Dependencies, StateToken};
pub use heap::{Bucket, DebugTerm, DisplayTerm, Heap, HeapStats, StringBuilder};
pub use id::{BuiltinId, StrRange, Table, TermId, TermRange};
pub use term::{Condition, IteratorTerm, TermFlags, TermKind, TermType};
