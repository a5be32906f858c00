//! Builtin dispatch engine.
//!
//! A builtin declares a [`Signature`] (one [`Strictness`] per parameter plus
//! an optional variadic tail), an ordered list of [`Overload`]s and a default
//! handler. Invoking it:
//!
//! 1. Argument count is checked against the signature; a mismatch goes
//!    straight to the default handler with the raw arguments.
//! 2. Arguments are evaluated left to right according to their strictness,
//!    and every dependency read along the way is recorded.
//! 3. Signals from `Strict` arguments are unioned into one signal, which is
//!    the result.
//! 4. Otherwise overloads are tried in declaration order; the first whose
//!    guards all accept wins. No match falls back to the default handler.
//!
//! Handlers run with an [`Invocation`], which gives them the heap, nested
//! evaluation, state reads and iteration while accumulating dependencies.

use rheo_term::{Dependencies, Heap, StateToken, TermId, TermType};
use smallvec::SmallVec;

use crate::evaluator::Evaluator;
use crate::iterator::{self, Cursor};

/// How an argument is prepared before the handler runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strictness {
    /// Evaluated; a signal short-circuits the call.
    Strict,
    /// Evaluated; signals are handed to the handler.
    Eager,
    /// Passed through unevaluated.
    Lazy,
}

/// Parameter list of a builtin.
#[derive(Copy, Clone, Debug)]
pub struct Signature {
    pub params: &'static [Strictness],
    /// Strictness of any number of trailing arguments.
    pub variadic: Option<Strictness>,
}

impl Signature {
    /// Fixed parameter list.
    pub const fn fixed(params: &'static [Strictness]) -> Self {
        Signature {
            params,
            variadic: None,
        }
    }

    /// Fixed prefix followed by a variadic tail.
    pub const fn variadic(params: &'static [Strictness], rest: Strictness) -> Self {
        Signature {
            params,
            variadic: Some(rest),
        }
    }

    /// Exact argument count, or `None` for variadic signatures.
    pub const fn arity(&self) -> Option<usize> {
        match self.variadic {
            Some(_) => None,
            None => Some(self.params.len()),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        match self.variadic {
            Some(_) => count >= self.params.len(),
            None => count == self.params.len(),
        }
    }

    /// Strictness of the argument at `index`.
    pub fn strictness(&self, index: usize) -> Strictness {
        self.params
            .get(index)
            .copied()
            .or(self.variadic)
            .unwrap_or(Strictness::Lazy)
    }
}

/// Per-argument type predicate.
#[derive(Copy, Clone, Debug)]
pub enum Guard {
    Any,
    Type(TermType),
    OneOf(&'static [TermType]),
    /// Anything the iterator protocol accepts.
    Iterable,
    /// `Int` or `Float`.
    Numeric,
    /// Lambdas, partials, builtins and constructors.
    Callable,
}

impl Guard {
    pub fn matches(self, heap: &Heap, term: TermId) -> bool {
        let ty = heap.term_type(term);
        match self {
            Guard::Any => true,
            Guard::Type(expected) => ty == expected,
            Guard::OneOf(types) => types.contains(&ty),
            Guard::Iterable => ty.is_iterable(),
            Guard::Numeric => ty.is_numeric(),
            Guard::Callable => ty.is_callable(),
        }
    }
}

/// Builtin implementation.
///
/// Receives the prepared arguments and returns the next term, which may be a
/// redex for the evaluator to keep reducing.
pub type Handler = fn(&mut Invocation<'_, '_>, &[TermId]) -> TermId;

/// One guarded implementation of a builtin.
#[derive(Copy, Clone)]
pub struct Overload {
    /// Guards for the leading arguments; extra arguments are unchecked.
    pub guards: &'static [Guard],
    pub handler: Handler,
}

impl Overload {
    fn matches(&self, heap: &Heap, args: &[TermId]) -> bool {
        self.guards.len() <= args.len()
            && self
                .guards
                .iter()
                .zip(args)
                .all(|(guard, &arg)| guard.matches(heap, arg))
    }
}

/// Registration of a builtin.
pub struct BuiltinDef {
    pub name: &'static str,
    pub signature: Signature,
    pub overloads: &'static [Overload],
    /// Runs on arity mismatch or when no overload matches.
    pub default: Handler,
}

impl std::fmt::Debug for BuiltinDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinDef")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("overloads", &self.overloads.len())
            .finish_non_exhaustive()
    }
}

/// Default handler for most builtins: reject the arguments.
pub fn reject(inv: &mut Invocation<'_, '_>, args: &[TermId]) -> TermId {
    inv.invalid_args(args)
}

/// Run a builtin against unevaluated `args`.
pub(crate) fn invoke(
    evaluator: &mut Evaluator<'_>,
    callee: TermId,
    def: &BuiltinDef,
    args: &[TermId],
    dependencies: &mut Dependencies,
) -> TermId {
    let mut inv = Invocation::new(evaluator, callee);
    let result = if def.signature.accepts(args.len()) {
        let mut prepared: SmallVec<[TermId; 4]> = SmallVec::with_capacity(args.len());
        let mut signals: SmallVec<[TermId; 2]> = SmallVec::new();
        for (index, &arg) in args.iter().enumerate() {
            let value = match def.signature.strictness(index) {
                Strictness::Lazy => arg,
                Strictness::Strict => {
                    let value = inv.evaluate(arg);
                    if inv.heap().is_signal(value) {
                        signals.push(value);
                    }
                    value
                }
                Strictness::Eager => inv.evaluate(arg),
            };
            prepared.push(value);
        }

        if signals.is_empty() {
            let heap = inv.heap();
            match def.overloads.iter().find(|o| o.matches(heap, &prepared)) {
                Some(overload) => (overload.handler)(&mut inv, &prepared),
                None => {
                    tracing::trace!(builtin = def.name, "no overload matched");
                    (def.default)(&mut inv, &prepared)
                }
            }
        } else {
            inv.heap_mut()
                .combine_signals(&signals)
                .unwrap_or(TermId::NIL)
        }
    } else {
        tracing::trace!(
            builtin = def.name,
            count = args.len(),
            "argument count mismatch"
        );
        (def.default)(&mut inv, args)
    };
    dependencies.extend(&inv.dependencies);
    result
}

/// Execution context of one builtin call.
pub struct Invocation<'e, 'a> {
    evaluator: &'e mut Evaluator<'a>,
    /// The builtin term being invoked.
    target: TermId,
    dependencies: Dependencies,
}

impl<'e, 'a> Invocation<'e, 'a> {
    pub(crate) fn new(evaluator: &'e mut Evaluator<'a>, target: TermId) -> Self {
        Invocation {
            evaluator,
            target,
            dependencies: Dependencies::none(),
        }
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        self.evaluator.heap()
    }

    #[inline]
    pub fn heap_mut(&mut self) -> &mut Heap {
        self.evaluator.heap_mut()
    }

    /// The builtin term being invoked.
    pub fn target(&self) -> TermId {
        self.target
    }

    /// Dependencies recorded so far.
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Evaluate a term, recording its dependencies.
    pub fn evaluate(&mut self, term: TermId) -> TermId {
        let evaluation = self.evaluator.evaluate(term);
        self.dependencies.extend(&evaluation.dependencies);
        evaluation.value
    }

    /// Evaluate `callable(args...)`. A reducible callable is forced first.
    pub fn call(&mut self, callable: TermId, args: &[TermId]) -> TermId {
        let callable = if self.heap().is_reducible(callable) {
            self.evaluate(callable)
        } else {
            callable
        };
        if self.heap().is_signal(callable) {
            return callable;
        }
        let next = self
            .evaluator
            .apply(callable, args, &mut self.dependencies);
        self.evaluate(next)
    }

    /// Read external state, recording the token.
    pub fn read_state(&mut self, token: StateToken) -> Option<TermId> {
        self.dependencies.insert(token);
        self.evaluator.read_state(token)
    }

    /// `InvalidFunctionArgs(target, args)` signal for this call.
    pub fn invalid_args(&mut self, args: &[TermId]) -> TermId {
        let target = self.target;
        self.heap_mut().invalid_args_signal(target, args)
    }

    /// Error signal with a message payload.
    pub fn error(&mut self, message: &str) -> TermId {
        self.heap_mut().error_message_signal(message)
    }

    /// Advance an iterable. See [`iterator::next`].
    pub fn next(
        &mut self,
        iterable: TermId,
        cursor: &Cursor,
    ) -> Result<Option<(TermId, Cursor)>, TermId> {
        iterator::next(self, iterable, cursor)
    }

    /// Collect the items of a finite iterable.
    pub fn collect(&mut self, iterable: TermId) -> Result<Vec<TermId>, TermId> {
        iterator::collect_items(self, iterable)
    }

    /// Collect and evaluate the items of a finite iterable.
    ///
    /// Signals among the items are combined into a single `Err`.
    pub fn collect_evaluated(&mut self, iterable: TermId) -> Result<Vec<TermId>, TermId> {
        let items = self.collect(iterable)?;
        self.evaluate_all(&items)
    }

    /// Evaluate each term in order; all signals are combined into `Err`.
    pub fn evaluate_all(&mut self, terms: &[TermId]) -> Result<Vec<TermId>, TermId> {
        let values: Vec<TermId> = terms.iter().map(|&t| self.evaluate(t)).collect();
        match self.heap_mut().combine_signals(&values) {
            Some(signal) => Err(signal),
            None => Ok(values),
        }
    }
}
