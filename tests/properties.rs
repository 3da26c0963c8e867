use std::collections::BTreeMap;

use btree_index::{BtreeConfig, BtreeIndex};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Insert(u16, u32),
    Remove(u16),
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (any::<u16>(), any::<u32>()).prop_map(|(k, v)| Operation::Insert(k % 512, v)),
        2 => any::<u16>().prop_map(|k| Operation::Remove(k % 512)),
    ]
}

proptest! {
    #[test]
    fn iteration_is_sorted_and_complete(order in 2usize..8, keys in prop::collection::vec(any::<i32>(), 0..400)) {
        let mut t = BtreeIndex::new(BtreeConfig::default().order(order)).unwrap();
        let mut expected = keys.clone();
        for k in keys {
            t.insert(k, ()).unwrap();
        }
        expected.sort_unstable();
        expected.dedup();

        let actual: Vec<i32> = t.iter().unwrap().map(|(k, _)| *k).collect();
        prop_assert_eq!(expected, actual);
        t.check_invariants();
    }

    #[test]
    fn behaves_like_btreemap(order in 2usize..6, operations in prop::collection::vec(operation(), 0..600)) {
        let mut m = BTreeMap::new();
        let mut t = BtreeIndex::new(BtreeConfig::default().order(order)).unwrap();

        for op in operations {
            match op {
                Operation::Insert(k, v) => {
                    prop_assert_eq!(m.insert(k, v), t.insert(k, v).unwrap());
                    prop_assert_eq!(Some(&v), t.get(&k));
                }
                Operation::Remove(k) => {
                    prop_assert_eq!(m.remove(&k), t.remove(&k));
                    prop_assert_eq!(None, t.get(&k));
                }
            }
        }
        t.check_invariants();
        prop_assert_eq!(m.len(), t.len());
        for (k, v) in m.iter() {
            prop_assert_eq!(Some(v), t.get(k));
        }
        let expected: Vec<_> = m.iter().collect();
        let actual: Vec<_> = t.iter().unwrap().collect();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn removing_absent_keys_changes_nothing(keys in prop::collection::btree_set(0u32..1000, 0..200), absent in 1000u32..2000) {
        let mut t = BtreeIndex::new(BtreeConfig::default().order(2)).unwrap();
        for k in keys.iter() {
            t.insert(*k, *k).unwrap();
        }
        let height = t.height();

        prop_assert_eq!(None, t.remove(&absent));
        prop_assert_eq!(height, t.height());
        prop_assert_eq!(keys.len(), t.len());
        let actual: Vec<u32> = t.iter().unwrap().map(|(k, _)| *k).collect();
        prop_assert_eq!(keys.into_iter().collect::<Vec<_>>(), actual);
    }
}
