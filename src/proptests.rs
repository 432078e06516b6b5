use super::*;

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

/// Check the per-slot bookkeeping against a full walk of the table.
fn validate_table<S: BucketStore<u64>>(t: &ArrayHash<u64, S>) {
    let mut total = 0usize;
    for (idx, store) in t.slots().iter().enumerate() {
        let mut walked = 0usize;
        let mut cursor = store.first();
        while let Some(c) = cursor {
            let (key, _) = store.item(c);
            assert!(!key.is_empty(), "empty key stored in slot {idx}");
            assert_eq!(
                t.hasher().hash(key) as usize % t.slot_count(),
                idx,
                "key {key:?} lives in the wrong slot"
            );
            walked += 1;
            cursor = store.next(c);
        }
        assert_eq!(walked, store.len(), "slot {idx} len disagrees with its walk");
        total += walked;
    }
    assert_eq!(total, t.len(), "table len must match the sum of slot walks");
}

#[derive(Clone, Debug)]
enum Op {
    Add(Vec<u8>, u64),
    Remove(Vec<u8>),
    Find(Vec<u8>),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Small alphabet so keys collide often; a few long keys exercise the
    // 2-byte length prefix.
    prop_oneof![
        9 => prop::collection::vec(b'a'..=b'd', 1..=6),
        1 => prop::collection::vec(any::<u8>(), 120..=300),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Add(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        24 => key.clone().prop_map(Op::Find),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn run_against_model<S: BucketStore<u64>>(
    slot_count: usize,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut t: ArrayHash<u64, S> = ArrayHash::with_slot_count(slot_count);
    let mut m: HashMap<Vec<u8>, u64> = HashMap::new();

    for op in ops {
        match op {
            Op::Add(key, value) => {
                let old_t = t.add(&key, value);
                let old_m = m.insert(key, value);
                prop_assert_eq!(old_t, Ok(old_m));
            }
            Op::Remove(key) => {
                prop_assert_eq!(t.remove(&key), m.remove(&key));
            }
            Op::Find(key) => {
                prop_assert_eq!(t.get(&key), m.get(&key).copied());
            }
            Op::Clear => {
                t.clear();
                m.clear();
            }
        }
        prop_assert_eq!(t.len(), m.len());
    }

    validate_table(&t);
    let got: HashMap<Vec<u8>, u64> = t.iter().map(|(k, v)| (k.to_vec(), v.get())).collect();
    prop_assert_eq!(t.iter().count(), m.len(), "iteration yielded duplicates");
    prop_assert_eq!(got, m);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_packed(ops in ops_strategy(), slots in prop_oneof![Just(1usize), Just(7), Just(4096)]) {
        run_against_model::<PackedBufferStore<u64>>(slots, ops)?;
    }

    #[test]
    fn prop_equivalence_list(ops in ops_strategy(), slots in prop_oneof![Just(1usize), Just(7), Just(4096)]) {
        run_against_model::<LinkedListStore<u64>>(slots, ops)?;
    }

    #[test]
    fn prop_packed_size_accounting(keys in prop::collection::hash_set(key_strategy(), 1..64)) {
        let mut store: PackedBufferStore<u64> = PackedBufferStore::new();
        for (i, key) in keys.iter().enumerate() {
            let before = store.size();
            store.add(key, i as u64).unwrap();
            let expected = (if key.len() < 128 { 1 } else { 2 }) + key.len() + 8;
            prop_assert_eq!(store.size() - before, expected);
        }
        for key in &keys {
            let before = store.size();
            prop_assert!(store.remove(key).is_some());
            let expected = (if key.len() < 128 { 1 } else { 2 }) + key.len() + 8;
            prop_assert_eq!(before - store.size(), expected);
        }
        prop_assert_eq!(store.size(), 0);
    }

    #[test]
    fn prop_distinct_keys_either_order(a in key_strategy(), b in key_strategy(), flip in any::<bool>()) {
        prop_assume!(a != b);
        let mut t: ArrayHash<u64> = ArrayHash::with_slot_count(1);
        let (first, second) = if flip { ((&b, 2), (&a, 1)) } else { ((&a, 1), (&b, 2)) };
        t.add(first.0, first.1).unwrap();
        t.add(second.0, second.1).unwrap();
        prop_assert_eq!(t.get(&a), Some(1));
        prop_assert_eq!(t.get(&b), Some(2));
    }
}

#[test]
fn round_trip_insert_then_iterate() {
    for slots in [1usize, 3, 64, 4096] {
        let mut packed: PackedHashTable<u64> = PackedHashTable::with_slot_count(slots);
        let mut list: ListHashTable<u64> = ListHashTable::with_slot_count(slots);
        let mut expected = HashSet::new();
        for i in 0..2_000u64 {
            let key = format!("round-trip/{i}/{}", "x".repeat((i % 200) as usize));
            packed.add(&key, i).unwrap();
            list.add(&key, i).unwrap();
            expected.insert((key.into_bytes(), i));
        }

        let from_packed: HashSet<(Vec<u8>, u64)> =
            packed.iter().map(|(k, v)| (k.to_vec(), v.get())).collect();
        let from_list: HashSet<(Vec<u8>, u64)> =
            list.iter().map(|(k, v)| (k.to_vec(), v.get())).collect();
        assert_eq!(packed.iter().count(), 2_000);
        assert_eq!(list.iter().count(), 2_000);
        assert_eq!(from_packed, expected);
        assert_eq!(from_list, expected);
    }
}
