#![no_main]
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;
use btree_index::{BtreeConfig, BtreeIndex};

fuzz_target!(|data: (Vec<(String, String)>, u8)| {
    let order = (data.1 as usize).max(2);
    let mut m: BTreeMap<String, String> = BTreeMap::default();
    let mut t: BtreeIndex<String, String> =
        BtreeIndex::new(BtreeConfig::default().order(order)).unwrap();

    for (key, value) in data.0 {
        m.insert(key.clone(), value.clone());
        t.insert(key, value).unwrap();
    }
    t.check_invariants();

    // Check that the maps are equal
    let m: Vec<_> = m.iter().collect();
    let t: Vec<_> = t.iter().unwrap().collect();

    assert_eq!(m, t);
});
