use pretty_assertions::assert_eq;

use super::*;

fn ints(heap: &mut Heap, values: &[i64]) -> Vec<TermId> {
    values.iter().map(|&n| heap.int(n)).collect()
}

fn as_ints(heap: &Heap, list: TermId) -> Vec<i64> {
    heap.as_list(list)
        .unwrap_or_default()
        .iter()
        .filter_map(|&id| heap.as_int(id))
        .collect()
}

#[test]
fn capacity_keeps_load_factor() {
    assert_eq!(capacity_for(0), 0);
    assert_eq!(capacity_for(1), 4);
    assert_eq!(capacity_for(3), 4);
    assert_eq!(capacity_for(4), 8);
    for len in 1..200 {
        let cap = capacity_for(len);
        assert!(cap.is_power_of_two());
        assert!(len * 4 <= cap * 3, "len {len} overfills {cap}");
    }
}

#[test]
fn list_push_leaves_original() {
    let mut heap = Heap::new();
    let items = ints(&mut heap, &[1, 2]);
    let list = heap.list(&items);
    let three = heap.int(3);
    let pushed = heap.list_push(list, three);
    let zero = heap.int(0);
    let front = heap.list_push_front(list, zero);
    assert_eq!(as_ints(&heap, list), vec![1, 2]);
    assert_eq!(as_ints(&heap, pushed), vec![1, 2, 3]);
    assert_eq!(as_ints(&heap, front), vec![0, 1, 2]);
}

#[test]
fn list_concat_and_slice() {
    let mut heap = Heap::new();
    let a_items = ints(&mut heap, &[1, 2]);
    let b_items = ints(&mut heap, &[3, 4, 5]);
    let a = heap.list(&a_items);
    let b = heap.list(&b_items);
    let joined = heap.list_concat(a, b);
    assert_eq!(as_ints(&heap, joined), vec![1, 2, 3, 4, 5]);
    assert_eq!(heap.list_concat(TermId::EMPTY_LIST, b), b);

    let middle = heap.list_slice(joined, 1, 4);
    assert_eq!(as_ints(&heap, middle), vec![2, 3, 4]);
    let clamped = heap.list_slice(joined, 3, 99);
    assert_eq!(as_ints(&heap, clamped), vec![4, 5]);
    assert_eq!(heap.list_slice(joined, 4, 2), TermId::EMPTY_LIST);
}

#[test]
fn record_get_and_set() {
    let mut heap = Heap::new();
    let foo = heap.alloc_string("foo");
    let bar = heap.alloc_string("bar");
    let three = heap.int(3);
    let four = heap.int(4);
    let record = heap.record_from_entries(&[(foo, three), (bar, four)]);

    let key = heap.alloc_string("foo");
    assert_eq!(heap.record_get(record, key), Some(three));
    assert_eq!(heap.record_field(record, "bar"), Some(four));
    assert_eq!(heap.record_field(record, "baz"), None);

    let five = heap.int(5);
    let updated = heap.record_set(record, key, five);
    assert_eq!(heap.record_get(updated, foo), Some(five));
    assert_eq!(heap.record_get(record, foo), Some(three));
    // Replacing an existing field shares the keys list.
    assert_eq!(heap.record_keys(updated), heap.record_keys(record));

    let baz = heap.alloc_string("baz");
    let extended = heap.record_set(record, baz, five);
    assert_eq!(heap.record_entries(extended).len(), 3);
    assert_eq!(heap.record_entries(record).len(), 2);
}

#[test]
fn record_from_entries_last_value_wins() {
    let mut heap = Heap::new();
    let k = heap.alloc_string("k");
    let k2 = heap.alloc_string("k");
    let one = heap.int(1);
    let two = heap.int(2);
    let record = heap.record_from_entries(&[(k, one), (k2, two)]);
    assert_eq!(heap.record_entries(record), vec![(k, two)]);
}

#[test]
fn hashmap_set_is_persistent() {
    let mut heap = Heap::new();
    let entries: Vec<(TermId, TermId)> = (0..3)
        .map(|n| {
            let k = heap.int(n);
            let v = heap.int(n + 100);
            (k, v)
        })
        .collect();
    let map = heap.hashmap(&entries);

    let new_key = heap.int(7);
    let new_value = heap.int(700);
    let updated = heap.hashmap_set(map, new_key, new_value);

    assert_eq!(heap.hashmap_len(map), 3);
    assert!(!heap.hashmap_has(map, new_key));
    assert_eq!(heap.hashmap_len(updated), 4);
    assert_eq!(heap.hashmap_get(updated, new_key), Some(new_value));
    for &(k, v) in &entries {
        assert_eq!(heap.hashmap_get(map, k), Some(v));
        assert_eq!(heap.hashmap_get(updated, k), Some(v));
    }
}

#[test]
fn hashmap_overwrite_keeps_len() {
    let mut heap = Heap::new();
    let k = heap.alloc_string("a");
    let one = heap.int(1);
    let two = heap.int(2);
    let map = heap.hashmap(&[(k, one)]);
    let same_key = heap.alloc_string("a");
    let updated = heap.hashmap_set(map, same_key, two);
    assert_eq!(heap.hashmap_len(updated), 1);
    assert_eq!(heap.hashmap_get(updated, k), Some(two));
    assert_eq!(heap.hashmap_get(map, k), Some(one));
}

#[test]
fn hashmap_grows_through_many_sets() {
    let mut heap = Heap::new();
    let mut map = heap.hashmap(&[]);
    for n in 0..100 {
        let k = heap.int(n);
        let v = heap.int(-n);
        map = heap.hashmap_set(map, k, v);
    }
    assert_eq!(heap.hashmap_len(map), 100);
    for n in 0..100 {
        let k = heap.int(n);
        let found = heap.hashmap_get(map, k).and_then(|v| heap.as_int(v));
        assert_eq!(found, Some(-n));
    }
    assert_eq!(heap.hashmap_keys(map).len(), 100);
    assert_eq!(heap.hashmap_values(map).len(), 100);
}

#[test]
fn hashmap_duplicate_entries_last_wins() {
    let mut heap = Heap::new();
    let k = heap.int(1);
    let a = heap.int(10);
    let b = heap.int(20);
    let map = heap.hashmap(&[(k, a), (k, b)]);
    assert_eq!(heap.hashmap_len(map), 1);
    assert_eq!(heap.hashmap_get(map, k), Some(b));
}

#[test]
fn hashset_dedupes_and_adds() {
    let mut heap = Heap::new();
    let items = ints(&mut heap, &[1, 2, 2, 3]);
    let set = heap.hashset(&items);
    assert_eq!(heap.hashset_len(set), 3);

    let two = heap.int(2);
    assert_eq!(heap.hashset_add(set, two), set);

    let four = heap.int(4);
    let bigger = heap.hashset_add(set, four);
    assert_eq!(heap.hashset_len(bigger), 4);
    assert!(heap.hashset_has(bigger, four));
    assert!(!heap.hashset_has(set, four));
    assert_eq!(heap.hashset_items(bigger).len(), 4);
}

#[test]
fn collection_len_counts_chars() {
    let mut heap = Heap::new();
    let s = heap.alloc_string("héllo");
    assert_eq!(heap.collection_len(s), Some(5));
    assert_eq!(heap.collection_len(TermId::EMPTY_LIST), Some(0));
    assert_eq!(heap.collection_len(TermId::NIL), None);
}
