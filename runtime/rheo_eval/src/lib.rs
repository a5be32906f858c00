//! Rheo Eval - graph-reduction evaluator for the Rheo runtime.
//!
//! Evaluates term graphs built in a [`Heap`] to weak head normal form while
//! recording which external state keys each result depends on.
//!
//! # Architecture
//!
//! - [`Runtime`]: owns a heap and memo cache; the host's entry point
//! - [`Evaluator`]: trampolined reduction of applications, `Let`,
//!   `Recursive` and variables
//! - [`iterator`]: cursor-based advancement of every iterable term
//! - dispatch: strictness-aware argument preparation and guarded overload
//!   resolution for builtins
//! - [`Stdlib`]: the registered builtins
//! - [`State`]: the read-only state collaborator
//!
//! Failures inside the language are `Signal` terms, never Rust errors: a
//! signal flows through further application until the host inspects it.
//!
//! # Re-exports
//!
//! Term model types from `rheo_term` are re-exported for convenience.

mod dispatch;
mod evaluator;
pub mod iterator;
mod runtime;
mod stack;
mod state;
mod stdlib;

pub use rheo_term::{
    json, Condition, Dependencies, Heap, IteratorTerm, StateToken, TermId, TermKind, TermType,
};

pub use dispatch::{
    reject, BuiltinDef, Guard, Handler, Invocation, Overload, Signature, Strictness,
};
pub use evaluator::{Evaluation, EvaluationCache, Evaluator};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use stack::ensure_sufficient_stack;
pub use state::{EmptyState, State, StateSnapshot};
pub use stdlib::Stdlib;
