//! Iterator protocol.
//!
//! Every iterable term (lists, strings, records, hashmaps, hashsets and the
//! [`IteratorTerm`] family) is advanced with [`next`]:
//!
//! ```text
//! next(iterable, cursor) -> Ok(Some((item, cursor'))) | Ok(None) | Err(signal)
//! ```
//!
//! Iterator terms are immutable; all progress lives in the [`Cursor`], so
//! restarting from [`Cursor::Start`] reproduces the same sequence. Combinators
//! that wrap other iterables keep their inner cursors boxed inside their own
//! cursor variant, so abandoning an iteration simply drops the cursor.
//!
//! `Map` is lazy: it yields the application of its transform without
//! evaluating it. `Filter` evaluates its predicate per candidate, and
//! `Evaluate` forces each item; both surface signals as `Err`.

use rheo_term::{Heap, IteratorTerm, Table, TermId, TermKind};

use crate::dispatch::Invocation;

/// Position within one iteration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing consumed yet.
    #[default]
    Start,
    /// Index (items, buckets, bytes or generated count, by iterable kind).
    Position(u64),
    /// Cursor of the single wrapped source.
    Inner(Box<Cursor>),
    /// Outer source position plus the current inner iterable, if any.
    Flatten {
        outer: Box<Cursor>,
        inner: Option<(TermId, Box<Cursor>)>,
    },
    /// Index of the current chain source and its cursor.
    Chain { index: usize, inner: Box<Cursor> },
    Zip { left: Box<Cursor>, right: Box<Cursor> },
    /// Items still allowed through and the source cursor.
    Take { remaining: u32, inner: Box<Cursor> },
}

impl Cursor {
    fn position(&self) -> u64 {
        match self {
            Cursor::Position(n) => *n,
            _ => 0,
        }
    }

    fn inner(&self) -> Cursor {
        match self {
            Cursor::Inner(inner) => (**inner).clone(),
            _ => Cursor::Start,
        }
    }
}

/// Result of one advancement.
pub type Step = Result<Option<(TermId, Cursor)>, TermId>;

/// Advance `iterable` from `cursor`.
pub fn next(inv: &mut Invocation<'_, '_>, iterable: TermId, cursor: &Cursor) -> Step {
    let iterable = if inv.heap().is_reducible(iterable) {
        inv.evaluate(iterable)
    } else {
        iterable
    };
    match *inv.heap().kind(iterable) {
        TermKind::List(range) => {
            let index = cursor.position();
            Ok(inv
                .heap()
                .get_list(range)
                .get(index as usize)
                .map(|&item| (item, Cursor::Position(index + 1))))
        }
        TermKind::String(range) => {
            let offset = cursor.position() as usize;
            let Some(ch) = inv
                .heap()
                .get_str(range)
                .get(offset..)
                .and_then(|rest| rest.chars().next())
            else {
                return Ok(None);
            };
            let mut buf = [0u8; 4];
            let item = inv.heap_mut().alloc_string(ch.encode_utf8(&mut buf));
            Ok(Some((item, Cursor::Position((offset + ch.len_utf8()) as u64))))
        }
        TermKind::Record { keys, values } => {
            let index = cursor.position() as usize;
            let heap = inv.heap();
            let (Some(key), Some(value)) = (heap.list_item(keys, index), heap.list_item(values, index))
            else {
                return Ok(None);
            };
            let pair = inv.heap_mut().list(&[key, value]);
            Ok(Some((pair, Cursor::Position(index as u64 + 1))))
        }
        TermKind::Hashmap(table) => {
            Ok(next_bucket(inv.heap(), table, cursor).map(|(key, value, next)| {
                let pair = inv.heap_mut().list(&[key, value]);
                (pair, next)
            }))
        }
        TermKind::Hashset(table) => {
            Ok(next_bucket(inv.heap(), table, cursor).map(|(key, _, next)| (key, next)))
        }
        TermKind::Iterator(iterator) => next_iterator(inv, iterable, iterator, cursor),
        TermKind::Signal(_) => Err(iterable),
        _ => Err(inv.invalid_args(&[iterable])),
    }
}

/// First occupied bucket at or after the cursor position.
fn next_bucket(heap: &Heap, table: Table, cursor: &Cursor) -> Option<(TermId, TermId, Cursor)> {
    let start = cursor.position() as usize;
    heap.get_buckets(table)
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, bucket)| !bucket.is_empty())
        .map(|(index, bucket)| (bucket.key, bucket.value, Cursor::Position(index as u64 + 1)))
}

fn next_iterator(
    inv: &mut Invocation<'_, '_>,
    iterable: TermId,
    iterator: IteratorTerm,
    cursor: &Cursor,
) -> Step {
    match iterator {
        IteratorTerm::Empty => Ok(None),
        IteratorTerm::Integers => {
            let n = cursor.position();
            let item = inv.heap_mut().int(n as i64);
            Ok(Some((item, Cursor::Position(n + 1))))
        }
        IteratorTerm::Range { start, len } => {
            let i = cursor.position();
            if i >= len {
                return Ok(None);
            }
            let item = inv.heap_mut().int(start.wrapping_add(i as i64));
            Ok(Some((item, Cursor::Position(i + 1))))
        }
        IteratorTerm::Once(value) => Ok(match cursor {
            Cursor::Start => Some((value, Cursor::Position(1))),
            _ => None,
        }),
        IteratorTerm::Repeat(value) => Ok(Some((value, Cursor::Position(1)))),
        IteratorTerm::Map { source, transform } => {
            Ok(next(inv, source, &cursor.inner())?.map(|(item, inner)| {
                let mapped = inv.heap_mut().apply(transform, &[item]);
                (mapped, Cursor::Inner(Box::new(inner)))
            }))
        }
        IteratorTerm::Filter { source, predicate } => {
            let mut inner = cursor.inner();
            loop {
                let Some((item, advanced)) = next(inv, source, &inner)? else {
                    return Ok(None);
                };
                let keep = inv.call(predicate, &[item]);
                if inv.heap().is_signal(keep) {
                    return Err(keep);
                }
                if inv.heap().is_truthy(keep) {
                    return Ok(Some((item, Cursor::Inner(Box::new(advanced)))));
                }
                inner = advanced;
            }
        }
        IteratorTerm::Flatten(source) => next_flatten(inv, source, None, cursor),
        IteratorTerm::FlatMap { source, transform } => {
            next_flatten(inv, source, Some(transform), cursor)
        }
        IteratorTerm::Chain(sources) => {
            let (mut index, mut inner) = match cursor {
                Cursor::Chain { index, inner } => (*index, (**inner).clone()),
                _ => (0, Cursor::Start),
            };
            loop {
                let Some(&source) = inv.heap().get_list(sources).get(index) else {
                    return Ok(None);
                };
                if let Some((item, advanced)) = next(inv, source, &inner)? {
                    let cursor = Cursor::Chain {
                        index,
                        inner: Box::new(advanced),
                    };
                    return Ok(Some((item, cursor)));
                }
                index += 1;
                inner = Cursor::Start;
            }
        }
        IteratorTerm::Zip { left, right } => {
            let (left_cursor, right_cursor) = match cursor {
                Cursor::Zip { left, right } => ((**left).clone(), (**right).clone()),
                _ => (Cursor::Start, Cursor::Start),
            };
            let Some((a, left_cursor)) = next(inv, left, &left_cursor)? else {
                return Ok(None);
            };
            let Some((b, right_cursor)) = next(inv, right, &right_cursor)? else {
                return Ok(None);
            };
            let pair = inv.heap_mut().list(&[a, b]);
            let cursor = Cursor::Zip {
                left: Box::new(left_cursor),
                right: Box::new(right_cursor),
            };
            Ok(Some((pair, cursor)))
        }
        IteratorTerm::Skip { source, count } => {
            let inner = match cursor {
                Cursor::Inner(inner) => (**inner).clone(),
                _ => {
                    // First call: discard `count` items eagerly.
                    let mut skipped = Cursor::Start;
                    for _ in 0..count {
                        match next(inv, source, &skipped)? {
                            Some((_, advanced)) => skipped = advanced,
                            None => return Ok(None),
                        }
                    }
                    skipped
                }
            };
            Ok(next(inv, source, &inner)?
                .map(|(item, advanced)| (item, Cursor::Inner(Box::new(advanced)))))
        }
        IteratorTerm::Take { source, count } => {
            let (remaining, inner) = match cursor {
                Cursor::Take { remaining, inner } => (*remaining, (**inner).clone()),
                _ => (count, Cursor::Start),
            };
            if remaining == 0 {
                return Ok(None);
            }
            Ok(next(inv, source, &inner)?.map(|(item, advanced)| {
                let cursor = Cursor::Take {
                    remaining: remaining - 1,
                    inner: Box::new(advanced),
                };
                (item, cursor)
            }))
        }
        IteratorTerm::Evaluate(source) => {
            let Some((item, advanced)) = next(inv, source, &cursor.inner())? else {
                return Ok(None);
            };
            let value = inv.evaluate(item);
            if inv.heap().is_signal(value) {
                return Err(value);
            }
            Ok(Some((value, Cursor::Inner(Box::new(advanced)))))
        }
        IteratorTerm::HashmapKeys(map) | IteratorTerm::HashmapValues(map) => {
            let map = inv.evaluate(map);
            let TermKind::Hashmap(table) = *inv.heap().kind(map) else {
                return Err(inv.invalid_args(&[iterable]));
            };
            let keys = matches!(iterator, IteratorTerm::HashmapKeys(_));
            Ok(next_bucket(inv.heap(), table, cursor)
                .map(|(key, value, next)| (if keys { key } else { value }, next)))
        }
    }
}

/// Shared advancement of `Flatten` and `FlatMap`.
///
/// Lists, hashsets and iterators are descended into; any other item is
/// yielded as-is.
fn next_flatten(
    inv: &mut Invocation<'_, '_>,
    source: TermId,
    transform: Option<TermId>,
    cursor: &Cursor,
) -> Step {
    let (mut outer, mut inner) = match cursor {
        Cursor::Flatten { outer, inner } => ((**outer).clone(), inner.clone()),
        _ => (Cursor::Start, None),
    };
    loop {
        if let Some((current, inner_cursor)) = inner.take() {
            if let Some((item, advanced)) = next(inv, current, &inner_cursor)? {
                let cursor = Cursor::Flatten {
                    outer: Box::new(outer),
                    inner: Some((current, Box::new(advanced))),
                };
                return Ok(Some((item, cursor)));
            }
        }
        let Some((item, advanced)) = next(inv, source, &outer)? else {
            return Ok(None);
        };
        outer = advanced;
        let value = match transform {
            Some(transform) => inv.call(transform, &[item]),
            None => inv.evaluate(item),
        };
        match inv.heap().term_type(value) {
            rheo_term::TermType::Signal => return Err(value),
            rheo_term::TermType::List
            | rheo_term::TermType::Hashset
            | rheo_term::TermType::Iterator => {
                inner = Some((value, Box::new(Cursor::Start)));
            }
            _ => {
                let cursor = Cursor::Flatten {
                    outer: Box::new(outer),
                    inner: None,
                };
                return Ok(Some((value, cursor)));
            }
        }
    }
}

/// Number of items, when known without iterating.
pub fn size_hint(heap: &Heap, iterable: TermId) -> Option<usize> {
    match *heap.kind(iterable) {
        TermKind::List(_)
        | TermKind::String(_)
        | TermKind::Record { .. }
        | TermKind::Hashmap(_)
        | TermKind::Hashset(_) => heap.collection_len(iterable),
        TermKind::Iterator(iterator) => match iterator {
            IteratorTerm::Empty => Some(0),
            IteratorTerm::Once(_) => Some(1),
            IteratorTerm::Range { len, .. } => usize::try_from(len).ok(),
            IteratorTerm::Integers
            | IteratorTerm::Repeat(_)
            | IteratorTerm::Filter { .. }
            | IteratorTerm::Flatten(_)
            | IteratorTerm::FlatMap { .. } => None,
            IteratorTerm::Map { source, .. } | IteratorTerm::Evaluate(source) => {
                size_hint(heap, source)
            }
            IteratorTerm::Chain(sources) => heap
                .get_list(sources)
                .iter()
                .map(|&source| size_hint(heap, source))
                .sum(),
            IteratorTerm::Zip { left, right } => {
                Some(size_hint(heap, left)?.min(size_hint(heap, right)?))
            }
            IteratorTerm::Skip { source, count } => {
                size_hint(heap, source).map(|n| n.saturating_sub(count as usize))
            }
            IteratorTerm::Take { source, count } => {
                size_hint(heap, source).map(|n| n.min(count as usize))
            }
            IteratorTerm::HashmapKeys(map) | IteratorTerm::HashmapValues(map) => {
                match heap.kind(map) {
                    TermKind::Hashmap(_) => Some(heap.hashmap_len(map)),
                    _ => None,
                }
            }
        },
        _ => None,
    }
}

/// Collect every item of a finite iterable (items are not forced).
pub fn collect_items(inv: &mut Invocation<'_, '_>, iterable: TermId) -> Result<Vec<TermId>, TermId> {
    let capacity = size_hint(inv.heap(), iterable).unwrap_or(0);
    let mut items = Vec::with_capacity(capacity);
    let mut cursor = Cursor::Start;
    while let Some((item, advanced)) = next(inv, iterable, &cursor)? {
        items.push(item);
        cursor = advanced;
    }
    Ok(items)
}

/// Collect a finite iterable into a list term.
pub fn collect_list(inv: &mut Invocation<'_, '_>, iterable: TermId) -> Result<TermId, TermId> {
    if inv.heap().term_type(iterable) == rheo_term::TermType::List {
        return Ok(iterable);
    }
    let items = collect_items(inv, iterable)?;
    Ok(inv.heap_mut().list(&items))
}

/// Left fold: `f(...f(f(seed, a), b)..., z)`, stopping at the first signal.
pub fn fold(inv: &mut Invocation<'_, '_>, iterable: TermId, seed: TermId, f: TermId) -> TermId {
    let mut acc = inv.evaluate(seed);
    let mut cursor = Cursor::Start;
    loop {
        if inv.heap().is_signal(acc) {
            return acc;
        }
        match next(inv, iterable, &cursor) {
            Ok(Some((item, advanced))) => {
                acc = inv.call(f, &[acc, item]);
                cursor = advanced;
            }
            Ok(None) => return acc,
            Err(signal) => return signal,
        }
    }
}

/// Number of items of a finite iterable.
pub fn count(inv: &mut Invocation<'_, '_>, iterable: TermId) -> Result<usize, TermId> {
    if let Some(known) = size_hint(inv.heap(), iterable) {
        return Ok(known);
    }
    let mut total = 0;
    let mut cursor = Cursor::Start;
    while let Some((_, advanced)) = next(inv, iterable, &cursor)? {
        total += 1;
        cursor = advanced;
    }
    Ok(total)
}
