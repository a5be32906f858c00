//! Graph-reduction evaluator.
//!
//! Reduces a term to weak head normal form while recording the state tokens
//! the result depends on. Values, lambdas, partials, collections, iterators
//! and signals are already in normal form; only applications, `Let`,
//! `Recursive` and free variables reduce.
//!
//! # Reduction loop
//!
//! [`Evaluator::evaluate`] runs a trampoline: each step rewrites the current
//! redex into its successor (a substituted lambda body, a builtin's result, a
//! recursive unfolding) until the term is no longer reducible. Tail positions
//! therefore run in constant Rust stack; only genuinely nested evaluation
//! (a strict builtin argument, an application target) recurses, and that
//! recursion is guarded by [`ensure_sufficient_stack`].
//!
//! # Memoization
//!
//! When an [`EvaluationCache`] is attached, every reducible root is cached
//! under its structural identity together with its dependencies and the
//! state values observed for them, so a hit is only served while those
//! values are unchanged.

mod cache;
mod substitute;

pub use cache::EvaluationCache;
pub(crate) use substitute::substitute;

use rheo_term::{Dependencies, Heap, StateToken, TermId, TermKind};
use smallvec::SmallVec;

use crate::dispatch;
use crate::stack::ensure_sufficient_stack;
use crate::state::State;
use crate::stdlib::Stdlib;

/// Result of evaluating a term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    /// Normal form of the term (possibly a signal).
    pub value: TermId,
    /// State tokens read while producing `value`.
    pub dependencies: Dependencies,
}

impl Evaluation {
    /// Evaluation that read no state.
    pub fn pure(value: TermId) -> Self {
        Evaluation {
            value,
            dependencies: Dependencies::none(),
        }
    }
}

/// Reduces terms of one heap against one state snapshot.
pub struct Evaluator<'a> {
    heap: &'a mut Heap,
    state: &'a dyn State,
    cache: Option<&'a mut EvaluationCache>,
    max_depth: Option<usize>,
    depth: usize,
    /// Set when the depth limit cut an evaluation short; such results are
    /// not memoized.
    truncated: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(heap: &'a mut Heap, state: &'a dyn State) -> Self {
        Evaluator {
            heap,
            state,
            cache: None,
            max_depth: None,
            depth: 0,
            truncated: false,
        }
    }

    /// Memoize reducible roots in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &'a mut EvaluationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bound the nesting depth of evaluation.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        self.heap
    }

    #[inline]
    pub fn heap_mut(&mut self) -> &mut Heap {
        self.heap
    }

    /// Read a state token. The caller is responsible for recording it.
    pub(crate) fn read_state(&self, token: StateToken) -> Option<TermId> {
        self.state.read(token)
    }

    /// Reduce `term` to normal form.
    pub fn evaluate(&mut self, term: TermId) -> Evaluation {
        if !self.heap.is_reducible(term) {
            return Evaluation::pure(term);
        }
        ensure_sufficient_stack(|| self.evaluate_reducible(term))
    }

    fn evaluate_reducible(&mut self, root: TermId) -> Evaluation {
        if let Some(limit) = self.max_depth {
            if self.depth >= limit {
                tracing::debug!(limit, "evaluation depth limit reached");
                self.truncated = true;
                let signal = self
                    .heap
                    .error_message_signal("Maximum evaluation depth exceeded");
                return Evaluation::pure(signal);
            }
        }

        if let Some(cache) = self.cache.as_deref_mut() {
            if let Some(hit) = cache.get(self.heap, self.state, root) {
                return hit;
            }
        }

        let outer_truncated = std::mem::replace(&mut self.truncated, false);
        self.depth += 1;
        let mut dependencies = Dependencies::none();
        let mut term = root;
        while self.heap.is_reducible(term) {
            term = self.reduce(term, &mut dependencies);
        }
        self.depth -= 1;

        let result = Evaluation {
            value: term,
            dependencies,
        };
        let truncated = self.truncated;
        self.truncated |= outer_truncated;
        if !truncated {
            if let Some(cache) = self.cache.as_deref_mut() {
                cache.insert(self.heap, self.state, root, &result);
            }
        }
        result
    }

    /// One reduction step of a redex.
    fn reduce(&mut self, term: TermId, dependencies: &mut Dependencies) -> TermId {
        match *self.heap.kind(term) {
            TermKind::Variable(index) => {
                tracing::trace!(index, "unbound variable");
                self.heap.error_message_signal("Unbound variable")
            }
            TermKind::Let { initializer, body } => substitute(self.heap, body, &[initializer], 0),
            TermKind::Recursive { factory } => self.heap.apply(factory, &[term]),
            TermKind::Application { target, args } => {
                let callee = self.evaluate(target);
                dependencies.extend(&callee.dependencies);
                let args: SmallVec<[TermId; 4]> = SmallVec::from_slice(self.heap.get_list(args));
                self.apply(callee.value, &args, dependencies)
            }
            _ => term,
        }
    }

    /// Apply an evaluated callable to unevaluated arguments.
    ///
    /// Returns the next term of the trampoline, which may itself be a redex.
    pub(crate) fn apply(
        &mut self,
        callee: TermId,
        args: &[TermId],
        dependencies: &mut Dependencies,
    ) -> TermId {
        match *self.heap.kind(callee) {
            TermKind::Lambda { arity, body } => {
                if args.len() == arity as usize {
                    substitute(self.heap, body, args, 0)
                } else {
                    self.heap.invalid_args_signal(callee, args)
                }
            }
            TermKind::Builtin(id) => match Stdlib::from_id(id) {
                Some(builtin) => {
                    dispatch::invoke(self, callee, builtin.definition(), args, dependencies)
                }
                None => self.heap.invalid_args_signal(callee, args),
            },
            TermKind::Partial {
                target,
                args: prefix,
            } => {
                let mut combined: SmallVec<[TermId; 4]> =
                    SmallVec::from_slice(self.heap.get_list(prefix));
                combined.extend_from_slice(args);
                match self.arity(target) {
                    Some(arity) if combined.len() < arity => self.heap.partial(target, &combined),
                    _ => self.apply(target, &combined, dependencies),
                }
            }
            TermKind::Constructor { keys } => {
                if args.len() == self.heap.list_len(keys) {
                    let values = self.heap.list(args);
                    self.heap.record(keys, values)
                } else {
                    self.heap.invalid_args_signal(callee, args)
                }
            }
            TermKind::Signal(_) => callee,
            _ => self.heap.invalid_args_signal(callee, args),
        }
    }

    /// Number of arguments a callable still accepts, if fixed.
    pub(crate) fn arity(&self, callable: TermId) -> Option<usize> {
        match *self.heap.kind(callable) {
            TermKind::Lambda { arity, .. } => Some(arity as usize),
            TermKind::Builtin(id) => {
                Stdlib::from_id(id).and_then(|builtin| builtin.definition().signature.arity())
            }
            TermKind::Constructor { keys } => Some(self.heap.list_len(keys)),
            TermKind::Partial { target, args } => self
                .arity(target)
                .map(|arity| arity.saturating_sub(args.len())),
            _ => None,
        }
    }
}
