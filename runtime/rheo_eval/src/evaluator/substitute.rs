//! De Bruijn substitution and shifting.
//!
//! `Variable(i)` counts binders from the innermost outward. Below `cutoff`
//! binders introduced inside the term being rewritten, indices are bound
//! locally and left alone.
//!
//! Every term caches its scope depth, so any sub-term whose free variables
//! cannot reach the cutoff is shared as-is instead of being rebuilt.

use rheo_term::{Condition, Heap, IteratorTerm, TermId, TermKind, TermRange};
use smallvec::SmallVec;

use crate::stack::ensure_sufficient_stack;

/// Replace the `args.len()` innermost free variables of `body` with `args`.
///
/// The last argument binds `Variable(cutoff)`, the first binds
/// `Variable(cutoff + args.len() - 1)`; deeper free variables drop by
/// `args.len()`.
pub(crate) fn substitute(heap: &mut Heap, body: TermId, args: &[TermId], cutoff: u32) -> TermId {
    if heap.scope(body) <= cutoff || args.is_empty() {
        return body;
    }
    ensure_sufficient_stack(|| {
        if let TermKind::Variable(index) = *heap.kind(body) {
            let n = args.len();
            let relative = (index - cutoff) as usize;
            return if relative < n {
                shift(heap, args[n - 1 - relative], cutoff, 0)
            } else {
                heap.variable(index - n as u32)
            };
        }
        rebuild(heap, body, cutoff, &mut |heap, child, depth| {
            substitute(heap, child, args, depth)
        })
    })
}

/// Add `amount` to every free variable index of `term` at or above `cutoff`.
pub(crate) fn shift(heap: &mut Heap, term: TermId, amount: u32, cutoff: u32) -> TermId {
    if amount == 0 || heap.scope(term) <= cutoff {
        return term;
    }
    ensure_sufficient_stack(|| {
        if let TermKind::Variable(index) = *heap.kind(term) {
            return heap.variable(index + amount);
        }
        rebuild(heap, term, cutoff, &mut |heap, child, depth| {
            shift(heap, child, amount, depth)
        })
    })
}

type Rewrite<'f> = dyn FnMut(&mut Heap, TermId, u32) -> TermId + 'f;

/// Rebuild `id` with `f` applied to each child at its binder depth.
///
/// Returns `id` itself when no child changed.
fn rebuild(heap: &mut Heap, id: TermId, cutoff: u32, f: &mut Rewrite<'_>) -> TermId {
    match *heap.kind(id) {
        TermKind::Nil
        | TermKind::Boolean(_)
        | TermKind::Int(_)
        | TermKind::Float(_)
        | TermKind::String(_)
        | TermKind::Symbol(_)
        | TermKind::Timestamp(_)
        | TermKind::Variable(_)
        | TermKind::Builtin(_) => id,
        TermKind::Lambda { arity, body } => {
            let new_body = f(heap, body, cutoff + arity);
            if new_body == body {
                id
            } else {
                heap.lambda(arity, new_body)
            }
        }
        TermKind::Let { initializer, body } => {
            let new_init = f(heap, initializer, cutoff);
            let new_body = f(heap, body, cutoff + 1);
            if new_init == initializer && new_body == body {
                id
            } else {
                heap.let_(new_init, new_body)
            }
        }
        TermKind::Application { target, args } => {
            let new_target = f(heap, target, cutoff);
            match map_range(heap, args, cutoff, f) {
                None if new_target == target => id,
                None => {
                    let args = heap.get_list(args).to_vec();
                    heap.apply(new_target, &args)
                }
                Some(args) => heap.apply(new_target, &args),
            }
        }
        TermKind::Partial { target, args } => {
            let new_target = f(heap, target, cutoff);
            match map_range(heap, args, cutoff, f) {
                None if new_target == target => id,
                None => {
                    let args = heap.get_list(args).to_vec();
                    heap.partial(new_target, &args)
                }
                Some(args) => heap.partial(new_target, &args),
            }
        }
        TermKind::Constructor { keys } => {
            let new_keys = f(heap, keys, cutoff);
            if new_keys == keys {
                id
            } else {
                heap.alloc(TermKind::Constructor { keys: new_keys })
            }
        }
        TermKind::Recursive { factory } => {
            let new_factory = f(heap, factory, cutoff);
            if new_factory == factory {
                id
            } else {
                heap.recursive(new_factory)
            }
        }
        TermKind::List(items) => match map_range(heap, items, cutoff, f) {
            Some(items) => heap.list(&items),
            None => id,
        },
        TermKind::Record { keys, values } => {
            let new_keys = f(heap, keys, cutoff);
            let new_values = f(heap, values, cutoff);
            if new_keys == keys && new_values == values {
                id
            } else {
                heap.record(new_keys, new_values)
            }
        }
        TermKind::Hashmap(_) => {
            let entries = heap.hashmap_entries(id);
            let rewritten: Vec<(TermId, TermId)> = entries
                .iter()
                .map(|&(k, v)| (f(heap, k, cutoff), f(heap, v, cutoff)))
                .collect();
            if rewritten == entries {
                id
            } else {
                heap.hashmap(&rewritten)
            }
        }
        TermKind::Hashset(_) => {
            let items = heap.hashset_items(id);
            let rewritten: Vec<TermId> = items.iter().map(|&i| f(heap, i, cutoff)).collect();
            if rewritten == items {
                id
            } else {
                heap.hashset(&rewritten)
            }
        }
        TermKind::Signal(conditions) => match map_range(heap, conditions, cutoff, f) {
            Some(conditions) => heap.signal(&conditions),
            None => id,
        },
        TermKind::Condition(condition) => {
            let rewritten = match condition {
                Condition::Error(payload) => Condition::Error(f(heap, payload, cutoff)),
                Condition::InvalidFunctionArgs { target, args } => {
                    Condition::InvalidFunctionArgs {
                        target: f(heap, target, cutoff),
                        args: f(heap, args, cutoff),
                    }
                }
                Condition::InvalidJson { source, offset } => Condition::InvalidJson {
                    source: f(heap, source, cutoff),
                    offset,
                },
                Condition::Pending => Condition::Pending,
            };
            if rewritten == condition {
                id
            } else {
                heap.condition(rewritten)
            }
        }
        TermKind::Iterator(iterator) => rebuild_iterator(heap, id, iterator, cutoff, f),
    }
}

fn rebuild_iterator(
    heap: &mut Heap,
    id: TermId,
    iterator: IteratorTerm,
    cutoff: u32,
    f: &mut Rewrite<'_>,
) -> TermId {
    use IteratorTerm as I;
    let rewritten = match iterator {
        I::Empty | I::Integers | I::Range { .. } => return id,
        I::Once(value) => I::Once(f(heap, value, cutoff)),
        I::Repeat(value) => I::Repeat(f(heap, value, cutoff)),
        I::Map { source, transform } => I::Map {
            source: f(heap, source, cutoff),
            transform: f(heap, transform, cutoff),
        },
        I::Filter { source, predicate } => I::Filter {
            source: f(heap, source, cutoff),
            predicate: f(heap, predicate, cutoff),
        },
        I::Flatten(source) => I::Flatten(f(heap, source, cutoff)),
        I::FlatMap { source, transform } => I::FlatMap {
            source: f(heap, source, cutoff),
            transform: f(heap, transform, cutoff),
        },
        I::Chain(sources) => match map_range(heap, sources, cutoff, f) {
            Some(sources) => return heap.chain_iterator(&sources),
            None => return id,
        },
        I::Zip { left, right } => I::Zip {
            left: f(heap, left, cutoff),
            right: f(heap, right, cutoff),
        },
        I::Skip { source, count } => I::Skip {
            source: f(heap, source, cutoff),
            count,
        },
        I::Take { source, count } => I::Take {
            source: f(heap, source, cutoff),
            count,
        },
        I::Evaluate(source) => I::Evaluate(f(heap, source, cutoff)),
        I::HashmapKeys(map) => I::HashmapKeys(f(heap, map, cutoff)),
        I::HashmapValues(map) => I::HashmapValues(f(heap, map, cutoff)),
    };
    if rewritten == iterator {
        id
    } else {
        heap.iterator(rewritten)
    }
}

/// Apply `f` to each ID of a range; `None` when nothing changed.
fn map_range(
    heap: &mut Heap,
    range: TermRange,
    cutoff: u32,
    f: &mut Rewrite<'_>,
) -> Option<SmallVec<[TermId; 4]>> {
    let items: SmallVec<[TermId; 4]> = SmallVec::from_slice(heap.get_list(range));
    let mut changed = false;
    let mut rewritten: SmallVec<[TermId; 4]> = SmallVec::with_capacity(items.len());
    for &item in &items {
        let new_item = f(heap, item, cutoff);
        changed |= new_item != item;
        rewritten.push(new_item);
    }
    changed.then_some(rewritten)
}
