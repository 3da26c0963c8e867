use btree_index::{BtreeConfig, BtreeIndex, BtreeSet};

#[test]
fn insert_search_delete_minimal_order() {
    let mut t: BtreeIndex<u32, String> = BtreeIndex::new(BtreeConfig::default().order(2)).unwrap();

    let input = [10, 20, 5, 6, 12, 30, 7, 17];
    for k in input {
        t.insert(k, format!("value {}", k)).unwrap();
    }
    t.check_invariants();
    for k in input {
        assert_eq!(Some(&format!("value {}", k)), t.get(&k));
    }

    for k in [6, 20, 10] {
        assert_eq!(Some(format!("value {}", k)), t.remove(&k));
        t.check_invariants();
    }
    for k in [6, 20, 10] {
        assert_eq!(None, t.get(&k));
    }
    for k in [5, 7, 12, 17, 30] {
        assert_eq!(true, t.contains_key(&k));
    }

    let keys: Vec<u32> = t.iter().unwrap().map(|(k, _)| *k).collect();
    assert_eq!(vec![5, 7, 12, 17, 30], keys);
}

#[test]
fn ascending_insert_order_three() {
    let mut t: BtreeIndex<u32, u32> = BtreeIndex::new(BtreeConfig::default().order(3)).unwrap();
    for k in 1..=30 {
        t.insert(k, k * k).unwrap();
        t.check_invariants();
    }
    assert_eq!(30, t.len());

    let entries: Vec<(u32, u32)> = t.iter().unwrap().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u32, u32)> = (1..=30).map(|k| (k, k * k)).collect();
    assert_eq!(expected, entries);
}

#[test]
fn descending_insert_and_delete() {
    let mut t: BtreeIndex<i64, ()> = BtreeIndex::new(BtreeConfig::default().order(2)).unwrap();
    for k in (0..500).rev() {
        t.insert(k, ()).unwrap();
    }
    t.check_invariants();

    // Remove every second key
    for k in (0..500).step_by(2) {
        assert_eq!(Some(()), t.remove(&k));
    }
    t.check_invariants();
    assert_eq!(250, t.len());

    let keys: Vec<i64> = t.iter().unwrap().map(|(k, _)| *k).collect();
    assert_eq!((1..500).step_by(2).collect::<Vec<_>>(), keys);
}

#[test]
fn set_with_string_keys() {
    let mut s: BtreeSet<String> = BtreeSet::new(BtreeConfig::default().order(2)).unwrap();
    for word in "the quick brown fox jumps over the lazy dog".split(' ') {
        s.insert(word.to_string()).unwrap();
    }
    assert_eq!(8, s.len());
    assert_eq!(true, s.remove(&"the".to_string()));

    let words: Vec<&str> = s.iter().unwrap().map(|w| w.as_str()).collect();
    assert_eq!(
        vec!["brown", "dog", "fox", "jumps", "lazy", "over", "quick"],
        words
    );
}
