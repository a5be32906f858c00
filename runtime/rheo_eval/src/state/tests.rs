use pretty_assertions::assert_eq;

use super::*;

#[test]
fn write_and_read_by_key() {
    let mut heap = Heap::new();
    let key = heap.alloc_string("user");
    let value = heap.int(42);
    let mut state = StateSnapshot::new();
    let token = state.write(&heap, key, value);
    assert_eq!(state.read(token), Some(value));

    // A structurally equal key reads the same slot.
    let same_key = heap.alloc_string("user");
    assert_eq!(state.read(StateToken::of(&heap, same_key)), Some(value));

    assert_eq!(state.remove(&heap, same_key), Some(value));
    assert_eq!(state.read(token), None);
}

#[test]
fn clock_uses_reserved_token() {
    let mut heap = Heap::new();
    let mut state = StateSnapshot::new();
    state.set_clock(&mut heap, 1_700_000_000_000);
    let now = state.read(StateToken::CLOCK);
    assert!(now.is_some_and(|id| heap.term_type(id) == rheo_term::TermType::Timestamp));
}

#[test]
fn diff_reports_changed_added_and_removed() {
    let mut heap = Heap::new();
    let a = heap.alloc_string("a");
    let b = heap.alloc_string("b");
    let c = heap.alloc_string("c");
    let one = heap.int(1);
    let two = heap.int(2);
    let one_again = heap.int(1);

    let mut before = StateSnapshot::new();
    let ta = before.write(&heap, a, one);
    let tb = before.write(&heap, b, one);

    let mut after = StateSnapshot::new();
    after.write(&heap, a, one_again);
    let tc = after.write(&heap, c, two);

    let mut expected = vec![tb, tc];
    expected.sort_unstable();
    assert_eq!(after.diff(&heap, &before), expected);
    assert!(!after.diff(&heap, &before).contains(&ta));
}

#[test]
fn empty_state_is_always_pending() {
    assert_eq!(EmptyState.read(StateToken::CLOCK), None);
}

#[test]
fn written_keys_are_tracked_per_token() {
    let mut heap = Heap::new();
    let user = heap.alloc_string("user");
    let group = heap.alloc_string("group");
    let value = heap.int(1);
    let mut state = StateSnapshot::new();
    let user_token = state.write(&heap, user, value);
    let group_token = state.write(&heap, group, value);
    assert_ne!(user_token, group_token);
    assert_eq!(state.key(user_token), Some(user));
    assert_eq!(state.key(group_token), Some(group));

    state.write_token(StateToken::CLOCK, value);
    assert_eq!(state.key(StateToken::CLOCK), None);

    state.remove(&heap, user);
    assert_eq!(state.key(user_token), None);
    assert_eq!(state.len(), 2);
}
