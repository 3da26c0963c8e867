#![no_main]
use libfuzzer_sys::fuzz_target;

use std::collections::BTreeMap;
use btree_index::{BtreeConfig, BtreeIndex};

fuzz_target!(|data: (Vec<(u32, u32)>, Vec<u32>, u8)| {
    let order = (data.2 as usize).max(2);
    let mut m = BTreeMap::default();
    let mut fixture = BtreeIndex::new(BtreeConfig::default().order(order)).unwrap();

    for (key, value) in data.0 {
        assert_eq!(m.insert(key, value), fixture.insert(key, value).unwrap());
    }
    for key in data.1 {
        assert_eq!(m.remove(&key), fixture.remove(&key));
    }
    fixture.check_invariants();

    // Check len() function
    assert_eq!(m.len(), fixture.len());

    // get query for each entry
    for (k, v1) in m.iter() {
        assert!(fixture.contains_key(k));
        assert_eq!(Some(v1), fixture.get(k));
    }

    // Check that the maps are equal when iterating
    let m: Vec<_> = m.iter().collect();
    let fixture_result: Vec<_> = fixture.iter().unwrap().collect();

    assert_eq!(m, fixture_result);
});
