use std::iter::FusedIterator;

use crate::{
    btree::{BtreeIndex, Iter},
    compare::{Comparator, NaturalOrder},
    error::Result,
    BtreeConfig,
};

/// Ordered set of keys, implemented as a [`BtreeIndex`] without values.
pub struct BtreeSet<K, C = NaturalOrder> {
    index: BtreeIndex<K, (), C>,
}

impl<K> BtreeSet<K, NaturalOrder>
where
    K: Ord,
{
    pub fn new(config: BtreeConfig) -> Result<BtreeSet<K, NaturalOrder>> {
        Ok(BtreeSet {
            index: BtreeIndex::new(config)?,
        })
    }
}

impl<K, C> BtreeSet<K, C>
where
    C: Comparator<K>,
{
    pub fn with_comparator(config: BtreeConfig, comparator: C) -> Result<BtreeSet<K, C>> {
        Ok(BtreeSet {
            index: BtreeIndex::with_comparator(config, comparator)?,
        })
    }

    /// Add a key to the set.
    ///
    /// Returns whether the key was newly inserted.
    pub fn insert(&mut self, key: K) -> Result<bool> {
        Ok(self.index.insert(key, ())?.is_none())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a key from the set and return whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.index.remove(key).is_some()
    }

    pub fn first(&self) -> Option<&K> {
        self.index.first_key_value().map(|(k, _)| k)
    }

    pub fn last(&self) -> Option<&K> {
        self.index.last_key_value().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Return an iterator over all keys in ascending order.
    pub fn iter(&self) -> Result<SetIter<'_, K>> {
        Ok(SetIter {
            inner: self.index.iter()?,
        })
    }

    pub fn clear(&mut self) {
        self.index.clear()
    }
}

/// Iterator over the keys of a [`BtreeSet`] in ascending order.
pub struct SetIter<'a, K> {
    inner: Iter<'a, K, ()>,
}

impl<'a, K> Iterator for SetIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K> ExactSizeIterator for SetIter<'a, K> {}

impl<'a, K> FusedIterator for SetIter<'a, K> {}
