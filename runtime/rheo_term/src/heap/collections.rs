//! Persistent lists, records, hashmaps and hashsets.
//!
//! Every "mutating" operation allocates a new term and leaves the original
//! untouched. Children are shared by ID; only the spine (child range or
//! bucket array) is copied.
//!
//! Hash tables use open addressing with linear probing over a power-of-two
//! bucket array kept at load factor ≤ 3/4.

use super::{Bucket, Heap};
use crate::id::{to_u32, Table, TermId, TermRange};
use crate::term::TermKind;

const MIN_TABLE_CAPACITY: usize = 4;

/// Bucket count for a table holding `len` entries.
fn capacity_for(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (len * 4).div_ceil(3).next_power_of_two().max(MIN_TABLE_CAPACITY)
}

impl Heap {
    // === Lists ===

    /// Allocate a list of `items`.
    pub fn list(&mut self, items: &[TermId]) -> TermId {
        if items.is_empty() {
            return TermId::EMPTY_LIST;
        }
        let range = self.alloc_range(items);
        self.alloc(TermKind::List(range))
    }

    /// Allocate a list from a child range built with `begin_list`.
    pub fn list_from_range(&mut self, range: TermRange) -> TermId {
        if range.is_empty() {
            return TermId::EMPTY_LIST;
        }
        self.alloc(TermKind::List(range))
    }

    /// Number of items of a list (`0` for non-lists).
    pub fn list_len(&self, list: TermId) -> usize {
        self.as_list(list).map_or(0, <[TermId]>::len)
    }

    pub fn list_item(&self, list: TermId, index: usize) -> Option<TermId> {
        self.as_list(list).and_then(|items| items.get(index).copied())
    }

    /// New list with `item` appended.
    pub fn list_push(&mut self, list: TermId, item: TermId) -> TermId {
        let start = self.begin_list();
        self.copy_list_items(list);
        self.push_list_item(item);
        let range = self.finish_list(start);
        self.list_from_range(range)
    }

    /// New list with `item` prepended.
    pub fn list_push_front(&mut self, list: TermId, item: TermId) -> TermId {
        let start = self.begin_list();
        self.push_list_item(item);
        self.copy_list_items(list);
        let range = self.finish_list(start);
        self.list_from_range(range)
    }

    /// New list holding the items of `a` followed by those of `b`.
    pub fn list_concat(&mut self, a: TermId, b: TermId) -> TermId {
        if self.list_len(a) == 0 {
            return b;
        }
        if self.list_len(b) == 0 {
            return a;
        }
        let start = self.begin_list();
        self.copy_list_items(a);
        self.copy_list_items(b);
        let range = self.finish_list(start);
        self.list_from_range(range)
    }

    /// Items `start..end` of a list, clamped to its bounds.
    pub fn list_slice(&mut self, list: TermId, start: usize, end: usize) -> TermId {
        let TermKind::List(range) = *self.kind(list) else {
            return TermId::EMPTY_LIST;
        };
        let end = end.min(range.len());
        let start = start.min(end);
        if start == 0 && end == range.len() {
            return list;
        }
        // Sub-ranges of an immutable range can be shared without copying.
        let sub = TermRange::new(range.start + start as u32, (end - start) as u32);
        self.list_from_range(sub)
    }

    fn copy_list_items(&mut self, list: TermId) {
        if let TermKind::List(range) = *self.kind(list) {
            if !range.is_empty() {
                let start = range.start as usize;
                self.extra.extend_from_within(start..start + range.len());
            }
        }
    }

    // === Records ===

    /// Allocate a record from parallel `keys` and `values` lists.
    pub fn record(&mut self, keys: TermId, values: TermId) -> TermId {
        debug_assert_eq!(self.list_len(keys), self.list_len(values));
        self.alloc(TermKind::Record { keys, values })
    }

    /// Allocate a record from `(key, value)` pairs.
    ///
    /// A repeated key keeps its first position and takes the last value.
    pub fn record_from_entries(&mut self, entries: &[(TermId, TermId)]) -> TermId {
        let mut keys: Vec<TermId> = Vec::with_capacity(entries.len());
        let mut values: Vec<TermId> = Vec::with_capacity(entries.len());
        for &(key, value) in entries {
            match keys.iter().position(|&k| self.equals(k, key)) {
                Some(pos) => values[pos] = value,
                None => {
                    keys.push(key);
                    values.push(value);
                }
            }
        }
        let keys = self.list(&keys);
        let values = self.list(&values);
        self.record(keys, values)
    }

    /// Value stored under `key`, compared structurally.
    pub fn record_get(&self, record: TermId, key: TermId) -> Option<TermId> {
        let TermKind::Record { keys, values } = *self.kind(record) else {
            return None;
        };
        let pos = self.as_list(keys)?.iter().position(|&k| self.equals(k, key))?;
        self.list_item(values, pos)
    }

    /// Value stored under the string key `name`.
    pub fn record_field(&self, record: TermId, name: &str) -> Option<TermId> {
        let TermKind::Record { keys, values } = *self.kind(record) else {
            return None;
        };
        let pos = self
            .as_list(keys)?
            .iter()
            .position(|&k| self.as_str(k) == Some(name))?;
        self.list_item(values, pos)
    }

    /// New record with `key` bound to `value`.
    ///
    /// Replacing an existing key shares the original keys list.
    pub fn record_set(&mut self, record: TermId, key: TermId, value: TermId) -> TermId {
        let TermKind::Record { keys, values } = *self.kind(record) else {
            return self.record_from_entries(&[(key, value)]);
        };
        let position = self
            .as_list(keys)
            .and_then(|items| items.iter().position(|&k| self.equals(k, key)));
        match position {
            Some(pos) => {
                let mut items = self.as_list(values).map(<[TermId]>::to_vec).unwrap_or_default();
                items[pos] = value;
                let values = self.list(&items);
                self.record(keys, values)
            }
            None => {
                let keys = self.list_push(keys, key);
                let values = self.list_push(values, value);
                self.record(keys, values)
            }
        }
    }

    /// The keys list of a record.
    pub fn record_keys(&self, record: TermId) -> Option<TermId> {
        match *self.kind(record) {
            TermKind::Record { keys, .. } => Some(keys),
            _ => None,
        }
    }

    /// The values list of a record.
    pub fn record_values(&self, record: TermId) -> Option<TermId> {
        match *self.kind(record) {
            TermKind::Record { values, .. } => Some(values),
            _ => None,
        }
    }

    /// `(key, value)` pairs of a record in field order.
    pub fn record_entries(&self, record: TermId) -> Vec<(TermId, TermId)> {
        match (self.record_keys(record), self.record_values(record)) {
            (Some(keys), Some(values)) => self
                .as_list(keys)
                .unwrap_or_default()
                .iter()
                .copied()
                .zip(self.as_list(values).unwrap_or_default().iter().copied())
                .collect(),
            _ => Vec::new(),
        }
    }

    // === Hash tables ===

    fn table_of(&self, id: TermId) -> Table {
        match *self.kind(id) {
            TermKind::Hashmap(table) | TermKind::Hashset(table) => table,
            _ => Table::EMPTY,
        }
    }

    /// Probe a table for `key`, returning the stored value.
    pub(crate) fn table_lookup(&self, table: Table, key: TermId) -> Option<TermId> {
        if table.capacity == 0 {
            return None;
        }
        let mask = table.capacity as usize - 1;
        let mut slot = self.hash(key) as usize & mask;
        for _ in 0..table.capacity {
            let bucket = self.buckets[table.start as usize + slot];
            if bucket.is_empty() {
                return None;
            }
            if self.equals(bucket.key, key) {
                return Some(bucket.value);
            }
            slot = (slot + 1) & mask;
        }
        None
    }

    /// Insert into a table under construction. Returns `true` if the key was new.
    fn table_insert(&mut self, table: &mut Table, key: TermId, value: TermId) -> bool {
        let mask = table.capacity as usize - 1;
        let mut slot = self.hash(key) as usize & mask;
        loop {
            let index = table.start as usize + slot;
            let bucket = self.buckets[index];
            if bucket.is_empty() {
                *self.bucket_mut(index) = Bucket { key, value };
                table.len += 1;
                return true;
            }
            if self.equals(bucket.key, key) {
                self.bucket_mut(index).value = value;
                return false;
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Build a fresh table from entries; later duplicates win.
    fn build_table(&mut self, entries: &[(TermId, TermId)]) -> Table {
        let capacity = capacity_for(entries.len());
        if capacity == 0 {
            return Table::EMPTY;
        }
        let mut table = Table {
            start: self.alloc_buckets(capacity),
            capacity: to_u32(capacity, "hash buckets"),
            len: 0,
        };
        for &(key, value) in entries {
            self.table_insert(&mut table, key, value);
        }
        table
    }

    /// Copy of `table` with `key` bound to `value`.
    fn table_with(&mut self, table: Table, key: TermId, value: TermId) -> Table {
        let grows = self.table_lookup(table, key).is_none();
        let needed = table.len() + usize::from(grows);
        if capacity_for(needed) <= table.capacity as usize {
            // Same capacity: copy the bucket array and overwrite in place.
            let start = to_u32(self.buckets.len(), "hash buckets");
            let from = table.start as usize;
            self.buckets
                .extend_from_within(from..from + table.capacity as usize);
            let mut copy = Table { start, ..table };
            self.table_insert(&mut copy, key, value);
            copy
        } else {
            let mut entries = self.table_entries(table);
            entries.push((key, value));
            self.build_table(&entries)
        }
    }

    fn table_entries(&self, table: Table) -> Vec<(TermId, TermId)> {
        self.get_buckets(table)
            .iter()
            .filter(|bucket| !bucket.is_empty())
            .map(|bucket| (bucket.key, bucket.value))
            .collect()
    }

    // === Hashmap ===

    /// Allocate a hashmap; later duplicate keys win.
    pub fn hashmap(&mut self, entries: &[(TermId, TermId)]) -> TermId {
        let table = self.build_table(entries);
        self.alloc(TermKind::Hashmap(table))
    }

    pub fn hashmap_get(&self, map: TermId, key: TermId) -> Option<TermId> {
        match *self.kind(map) {
            TermKind::Hashmap(table) => self.table_lookup(table, key),
            _ => None,
        }
    }

    pub fn hashmap_has(&self, map: TermId, key: TermId) -> bool {
        self.hashmap_get(map, key).is_some()
    }

    /// New hashmap with `key` bound to `value`; `map` is unchanged.
    pub fn hashmap_set(&mut self, map: TermId, key: TermId, value: TermId) -> TermId {
        let table = self.table_of(map);
        let table = if table.capacity == 0 {
            self.build_table(&[(key, value)])
        } else {
            self.table_with(table, key, value)
        };
        self.alloc(TermKind::Hashmap(table))
    }

    pub fn hashmap_len(&self, map: TermId) -> usize {
        self.table_of(map).len()
    }

    /// `(key, value)` pairs in bucket order.
    pub fn hashmap_entries(&self, map: TermId) -> Vec<(TermId, TermId)> {
        self.table_entries(self.table_of(map))
    }

    pub fn hashmap_keys(&self, map: TermId) -> Vec<TermId> {
        self.hashmap_entries(map).into_iter().map(|(k, _)| k).collect()
    }

    pub fn hashmap_values(&self, map: TermId) -> Vec<TermId> {
        self.hashmap_entries(map).into_iter().map(|(_, v)| v).collect()
    }

    // === Hashset ===

    /// Allocate a hashset of distinct `items`.
    pub fn hashset(&mut self, items: &[TermId]) -> TermId {
        let entries: Vec<(TermId, TermId)> = items.iter().map(|&i| (i, TermId::NIL)).collect();
        let table = self.build_table(&entries);
        self.alloc(TermKind::Hashset(table))
    }

    pub fn hashset_has(&self, set: TermId, item: TermId) -> bool {
        match *self.kind(set) {
            TermKind::Hashset(table) => self.table_lookup(table, item).is_some(),
            _ => false,
        }
    }

    /// New hashset including `item`; returns `set` itself when already present.
    pub fn hashset_add(&mut self, set: TermId, item: TermId) -> TermId {
        if self.hashset_has(set, item) {
            return set;
        }
        let table = self.table_of(set);
        let table = if table.capacity == 0 {
            self.build_table(&[(item, TermId::NIL)])
        } else {
            self.table_with(table, item, TermId::NIL)
        };
        self.alloc(TermKind::Hashset(table))
    }

    pub fn hashset_len(&self, set: TermId) -> usize {
        self.table_of(set).len()
    }

    /// Items in bucket order.
    pub fn hashset_items(&self, set: TermId) -> Vec<TermId> {
        self.table_entries(self.table_of(set))
            .into_iter()
            .map(|(k, _)| k)
            .collect()
    }

    /// Number of items of any finite collection or characters of a string.
    pub fn collection_len(&self, id: TermId) -> Option<usize> {
        match *self.kind(id) {
            TermKind::List(range) => Some(range.len()),
            TermKind::Record { keys, .. } => Some(self.list_len(keys)),
            TermKind::Hashmap(table) | TermKind::Hashset(table) => Some(table.len()),
            TermKind::String(range) => Some(self.get_str(range).chars().count()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
