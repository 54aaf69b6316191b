use super::*;
use crate::index::comparator::NaturalOrder;
use crate::index::rng::SeededRng;

fn new_list(seed: u64) -> SkipList<i32, NaturalOrder, SeededRng> {
    SkipList::with_rng(NaturalOrder, 7, 4, SeededRng::new(seed)).unwrap()
}

#[test]
fn rejects_invalid_construction_params() {
    assert!(SkipList::<i32, _, _>::with_rng(NaturalOrder, 0, 4, SeededRng::new(1)).is_err());
    assert!(SkipList::<i32, _, _>::with_rng(NaturalOrder, MAX_HEIGHT_CAP + 1, 4, SeededRng::new(1)).is_err());
    assert!(SkipList::<i32, _, _>::with_rng(NaturalOrder, 7, 1, SeededRng::new(1)).is_err());
    assert!(SkipList::<i32, _, _>::with_rng(NaturalOrder, 7, 4, SeededRng::new(1)).is_ok());
}

#[test]
fn contains_reflects_inserted_keys() {
    let list = new_list(1);
    let keys = [50, 10, 40, 20, 30, 5, 90, 60];
    for &k in &keys {
        list.insert(k);
    }
    for &k in &keys {
        assert!(list.contains(&k), "missing {k}");
    }
    for absent in [0, 11, 45, 100] {
        assert!(!list.contains(&absent));
    }
}

#[test]
fn duplicate_insert_is_a_fatal_precondition_violation() {
    let list = new_list(2);
    list.insert(7);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| list.insert(7)));
    assert!(result.is_err());
}

#[test]
fn iteration_visits_keys_in_ascending_order() {
    let list = new_list(3);
    let mut keys: Vec<i32> = (0..200).map(|i| (i * 37) % 997).collect();
    for &k in &keys {
        // dedup: a repeated residue would violate the no-duplicates precondition
        if !list.contains(&k) {
            list.insert(k);
        }
    }
    keys.sort_unstable();
    keys.dedup();

    let mut it = list.iterator();
    it.seek_to_first();
    let mut seen = Vec::new();
    while it.valid() {
        seen.push(*it.key());
        it.next();
    }
    assert_eq!(seen, keys);
}

#[test]
fn seek_lands_on_first_key_greater_or_equal() {
    let list = new_list(4);
    for k in [10, 20, 30, 40, 50] {
        list.insert(k);
    }
    let mut it = list.iterator();

    it.seek(&25);
    assert!(it.valid());
    assert_eq!(*it.key(), 30);

    it.seek(&30);
    assert!(it.valid());
    assert_eq!(*it.key(), 30);

    it.seek(&51);
    assert!(!it.valid());
}

#[test]
fn seek_for_prev_lands_on_floor() {
    let list = new_list(5);
    for k in [10, 20, 30, 40, 50] {
        list.insert(k);
    }
    let mut it = list.iterator();

    it.seek_for_prev(&25);
    assert!(it.valid());
    assert_eq!(*it.key(), 20);

    it.seek_for_prev(&30);
    assert!(it.valid());
    assert_eq!(*it.key(), 30);

    it.seek_for_prev(&5);
    assert!(!it.valid());

    it.seek_for_prev(&1000);
    assert!(it.valid());
    assert_eq!(*it.key(), 50);
}

#[test]
fn next_and_prev_are_inverse_across_the_whole_list() {
    let list = new_list(6);
    let keys = [1, 2, 3, 5, 8, 13, 21, 34];
    for &k in &keys {
        list.insert(k);
    }

    let mut it = list.iterator();
    it.seek_to_first();
    for &k in &keys {
        assert_eq!(*it.key(), k);
        it.next();
    }
    assert!(!it.valid());

    it.seek_to_last();
    for &k in keys.iter().rev() {
        assert_eq!(*it.key(), k);
        it.prev();
    }
    assert!(!it.valid());
}

#[test]
fn estimate_max_matches_exact_node_count() {
    let list = new_list(7);
    for k in 0..150 {
        list.insert(k);
    }
    assert_eq!(list.estimate_max(), 150);
}

#[test]
fn estimate_count_less_than_is_monotonic_and_bounded() {
    let list = new_list(8);
    for k in 0..300 {
        list.insert(k);
    }
    let mut prev = 0;
    for target in (0..300).step_by(17) {
        let est = list.estimate_count_less_than(&target);
        assert!(est <= 300);
        assert!(est >= prev || target == 0);
        prev = est;
    }
}

#[test]
fn tree_accel_lookup_agrees_with_plain_contains() {
    let list = new_list(9);
    let keys: Vec<i32> = (0..400).map(|i| (i * 131) % 2003).collect();
    for &k in &keys {
        if !list.contains(&k) {
            list.insert_tree_accel(k);
        }
    }
    for &k in &keys {
        assert_eq!(list.contains_tree_accel(&k), list.contains(&k));
        assert!(list.contains_tree_accel(&k));
    }
    assert!(!list.contains_tree_accel(&999_999));
}

#[test]
fn rb_accel_lookup_agrees_with_plain_contains_and_stays_balanced() {
    let list = new_list(10);
    // ascending insertion order is the adversarial case for the BST accelerator,
    // and exactly where the red-black accelerator should still behave.
    for k in 0..400 {
        list.insert_rb_accel(k);
    }
    for k in 0..400 {
        assert!(list.contains_rb_accel(&k));
    }
    assert!(!list.contains_rb_accel(&400));
    assert!(list.check_rb_invariants());
}
