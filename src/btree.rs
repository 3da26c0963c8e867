use std::{cmp::Ordering, iter::FusedIterator, mem};

use tracing::{debug, trace};

use crate::{
    compare::{Comparator, NaturalOrder},
    error::Result,
    BtreeConfig, Error,
};

use node::{Entry, NodeArena, NodeId, SearchResult};

mod node;

/// In-memory B-tree index.
///
/// Operations similar to the interface of [`std::collections::BTreeMap`] are implemented.
/// Keys are ordered by a [`Comparator`], which defaults to the [`Ord`] implementation of the key.
/// Since node storage is allocated fallibly, operations that may allocate return a `Result`.
/// If such an operation fails, the index is left in a valid state, but the operation did not take effect.
pub struct BtreeIndex<K, V, C = NaturalOrder> {
    nodes: NodeArena<K, V>,
    comparator: C,
    root_id: Option<NodeId>,
    order: usize,
    nr_elements: usize,
}

impl<K, V> BtreeIndex<K, V, NaturalOrder>
where
    K: Ord,
{
    /// Create a new empty index that orders the keys by their [`Ord`] implementation.
    pub fn new(config: BtreeConfig) -> Result<BtreeIndex<K, V, NaturalOrder>> {
        BtreeIndex::with_comparator(config, NaturalOrder)
    }
}

impl<K, V, C> BtreeIndex<K, V, C>
where
    C: Comparator<K>,
{
    /// Create a new empty index that orders the keys with the given comparator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use btree_index::{BtreeConfig, BtreeIndex, Error};
    ///
    /// fn main() -> std::result::Result<(), Error> {
    ///     let reverse = |a: &u32, b: &u32| b.cmp(a);
    ///     let mut b: BtreeIndex<u32, &str, _> =
    ///         BtreeIndex::with_comparator(BtreeConfig::default(), reverse)?;
    ///     b.insert(1, "one")?;
    ///     b.insert(3, "three")?;
    ///     b.insert(2, "two")?;
    ///
    ///     let keys: Vec<u32> = b.iter()?.map(|(k, _)| *k).collect();
    ///     assert_eq!(vec![3, 2, 1], keys);
    ///     Ok(())
    /// }
    /// ```
    pub fn with_comparator(config: BtreeConfig, comparator: C) -> Result<BtreeIndex<K, V, C>> {
        let order = config.get_order();
        if order < 2 {
            return Err(Error::OrderTooSmall(order));
        } else if order.checked_mul(2).is_none() {
            // Nodes hold up to 2t children
            return Err(Error::OrderTooLarge(order));
        }
        let nodes = NodeArena::with_capacity(config.get_capacity(), order)?;
        debug!(order, capacity = config.get_capacity(), "created B-tree index");

        Ok(BtreeIndex {
            nodes,
            comparator,
            root_id: None,
            order,
            nr_elements: 0,
        })
    }

    /// Searches for a key in the index and returns the value if found.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Searches for a key and returns the stored key and value if found.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let (node_id, i) = self.search(self.root_id?, key)?;
        let entry = &self.nodes.get(node_id).entries[i];
        Some((&entry.key, &entry.value))
    }

    /// Returns a mutable reference to the value of the key if found.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (node_id, i) = self.search(self.root_id?, key)?;
        Some(&mut self.nodes.get_mut(node_id).entries[i].value)
    }

    /// Returns whether the index contains the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        match self.root_id {
            Some(root_id) => self.search(root_id, key).is_some(),
            None => false,
        }
    }

    /// Insert a new element into the index.
    ///
    /// Existing values will be overwritten and returned.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let root_id = match self.root_id {
            Some(root_id) => root_id,
            None => {
                // The first entry becomes a leaf root node
                let mut root = self.nodes.allocate_new_node(true)?;
                self.nodes.reserve(1)?;
                root.entries.push(Entry { key, value });
                self.root_id = Some(self.nodes.store(root));
                self.nr_elements = 1;
                return Ok(None);
            }
        };

        if self.nodes.is_full(root_id) {
            // Create a new root node, because the current one is full
            let new_root_id = self.nodes.split_root_node(root_id)?;
            self.root_id = Some(new_root_id);
            self.insert_nonfull(new_root_id, key, value)
        } else {
            self.insert_nonfull(root_id, key, value)
        }
    }

    /// Remove the key from the index and return its value if it existed.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove the key from the index and return the stored key and value if it existed.
    ///
    /// Removing a key that is not part of the index does not change the index.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let root_id = self.root_id?;
        // Only restructure the tree if the key actually exists
        self.search(root_id, key)?;

        let removed = self.remove_from(root_id, key);
        self.nr_elements -= 1;

        // Merging the last key of the root into its children leaves an empty root
        let root = self.nodes.get(root_id);
        if root.entries.is_empty() {
            self.root_id = root.child_nodes.first().copied();
            self.nodes.release_node(root_id);
            trace!(old_root = root_id, new_root = ?self.root_id, "removed empty root node");
        }
        Some((removed.key, removed.value))
    }

    /// Swaps the values for the given keys.
    pub fn swap(&mut self, a: &K, b: &K) -> Result<()> {
        // Get the node ids and position in the node for both keys,
        // fail when they do not exist
        let root_id = self.root_id.ok_or(Error::NonExistingKey)?;
        let (a_node, a_pos) = self.search(root_id, a).ok_or(Error::NonExistingKey)?;
        let (b_node, b_pos) = self.search(root_id, b).ok_or(Error::NonExistingKey)?;

        if a_node == b_node {
            if a_pos != b_pos {
                let entries = &mut self.nodes.get_mut(a_node).entries;
                let (lower, upper) = (a_pos.min(b_pos), a_pos.max(b_pos));
                let (head, tail) = entries.split_at_mut(upper);
                mem::swap(&mut head[lower].value, &mut tail[0].value);
            }
        } else {
            let (a_node, b_node) = self.nodes.get_pair_mut(a_node, b_node);
            mem::swap(&mut a_node.entries[a_pos].value, &mut b_node.entries[b_pos].value);
        }
        Ok(())
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.nodes.get(self.root_id?);
        while !node.is_leaf() {
            node = self.nodes.get(node.child_nodes[0]);
        }
        node.entries.first().map(|e| (&e.key, &e.value))
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.nodes.get(self.root_id?);
        while let Some(last_child) = node.child_nodes.last() {
            node = self.nodes.get(*last_child);
        }
        node.entries.last().map(|e| (&e.key, &e.value))
    }

    /// Return an iterator over all entries, sorted by key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use btree_index::{BtreeConfig, BtreeIndex, Error};
    ///
    /// fn main() -> std::result::Result<(), Error> {
    ///     let mut b = BtreeIndex::<u16, u16>::new(BtreeConfig::default())?;
    ///     b.insert(1, 2)?;
    ///     b.insert(200, 4)?;
    ///     b.insert(20, 3)?;
    ///
    ///     for (k, v) in b.iter()? {
    ///         dbg!(k, v);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn iter(&self) -> Result<Iter<'_, K, V>> {
        // The stack never holds more than one entry per level of the tree
        let mut stack = Vec::new();
        stack.try_reserve_exact(self.height())?;

        let mut result = Iter {
            nodes: &self.nodes,
            stack,
            remaining: self.nr_elements,
        };
        if let Some(root_id) = self.root_id {
            result.descend_leftmost(root_id);
        }
        Ok(result)
    }

    /// Remove all entries and release the node storage.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_id = None;
        self.nr_elements = 0;
        debug!("cleared B-tree index");
    }

    /// Returns true if the index does not contain any elements.
    pub fn is_empty(&self) -> bool {
        self.nr_elements == 0
    }

    /// Returns the length of the index.
    pub fn len(&self) -> usize {
        self.nr_elements
    }

    /// Returns the minimum degree of the tree.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the number of levels of the tree, which is 0 for an empty index.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root_id;
        while let Some(node_id) = current {
            height += 1;
            current = self.nodes.get(node_id).child_nodes.first().copied();
        }
        height
    }

    fn search(&self, node_id: NodeId, key: &K) -> Option<(NodeId, usize)> {
        match self.nodes.binary_search(node_id, key, &self.comparator) {
            SearchResult::Found(i) => Some((node_id, i)),
            SearchResult::NotFound(i) => {
                let node = self.nodes.get(node_id);
                if node.is_leaf() {
                    None
                } else {
                    // search in the matching child node
                    self.search(node.child_nodes[i], key)
                }
            }
        }
    }

    fn insert_nonfull(&mut self, node_id: NodeId, key: K, value: V) -> Result<Option<V>> {
        match self.nodes.binary_search(node_id, &key, &self.comparator) {
            SearchResult::Found(i) => {
                // Key already exists, replace the value
                let entry = &mut self.nodes.get_mut(node_id).entries[i];
                Ok(Some(mem::replace(&mut entry.value, value)))
            }
            SearchResult::NotFound(i) => {
                let node = self.nodes.get_mut(node_id);
                if node.is_leaf() {
                    // Insert new key at the given position, moving the other items to the right
                    node.entries.insert(i, Entry { key, value });
                    self.nr_elements += 1;
                    Ok(None)
                } else {
                    // Insert key into correct child
                    let child_id = node.child_nodes[i];
                    // If the child is full, we need to split it
                    if self.nodes.is_full(child_id) {
                        let right_id = self.nodes.split_child(node_id, i)?;
                        let node_key = &self.nodes.get(node_id).entries[i].key;
                        match self.comparator.compare(&key, node_key) {
                            Ordering::Equal => {
                                // Key already exists and was moved to the parent node, replace the value
                                let entry = &mut self.nodes.get_mut(node_id).entries[i];
                                Ok(Some(mem::replace(&mut entry.value, value)))
                            }
                            // Key is now larger, use the newly created right child
                            Ordering::Greater => self.insert_nonfull(right_id, key, value),
                            // Use the updated left child
                            Ordering::Less => self.insert_nonfull(child_id, key, value),
                        }
                    } else {
                        self.insert_nonfull(child_id, key, value)
                    }
                }
            }
        }
    }

    /// Remove a key that is known to exist in the subtree of the given node.
    ///
    /// Every child the removal descends into is first filled up to at least `t` keys,
    /// so removing a key from it never leaves less than `t - 1` keys behind.
    fn remove_from(&mut self, node_id: NodeId, key: &K) -> Entry<K, V> {
        match self.nodes.binary_search(node_id, key, &self.comparator) {
            SearchResult::Found(i) => {
                let node = self.nodes.get(node_id);
                if node.is_leaf() {
                    return self.nodes.get_mut(node_id).entries.remove(i);
                }
                let left_id = node.child_nodes[i];
                let right_id = node.child_nodes[i + 1];
                if self.nodes.get(left_id).number_of_keys() >= self.order {
                    // Replace with the in-order predecessor
                    let predecessor = self.remove_max(left_id);
                    mem::replace(&mut self.nodes.get_mut(node_id).entries[i], predecessor)
                } else if self.nodes.get(right_id).number_of_keys() >= self.order {
                    // Replace with the in-order successor
                    let successor = self.remove_min(right_id);
                    mem::replace(&mut self.nodes.get_mut(node_id).entries[i], successor)
                } else {
                    // Both children are minimal, the key moves down into the merged node
                    let merged_id = self.nodes.merge_children(node_id, i);
                    self.remove_from(merged_id, key)
                }
            }
            SearchResult::NotFound(i) => {
                if self.nodes.get(node_id).is_leaf() {
                    panic!("key to remove is missing from leaf node {}", node_id);
                }
                let child_id = self.fill_child(node_id, i);
                self.remove_from(child_id, key)
            }
        }
    }

    fn remove_max(&mut self, node_id: NodeId) -> Entry<K, V> {
        let node = self.nodes.get_mut(node_id);
        if node.is_leaf() {
            match node.entries.pop() {
                Some(entry) => entry,
                None => panic!("leaf node {} has no keys", node_id),
            }
        } else {
            let last_child = node.number_of_keys();
            let child_id = self.fill_child(node_id, last_child);
            self.remove_max(child_id)
        }
    }

    fn remove_min(&mut self, node_id: NodeId) -> Entry<K, V> {
        if self.nodes.get(node_id).is_leaf() {
            self.nodes.get_mut(node_id).entries.remove(0)
        } else {
            let child_id = self.fill_child(node_id, 0);
            self.remove_min(child_id)
        }
    }

    /// Make sure the child at position `idx` has at least `t` keys before descending into it.
    ///
    /// Returns the ID of the node that now covers the key range of the child.
    fn fill_child(&mut self, node_id: NodeId, idx: usize) -> NodeId {
        let node = self.nodes.get(node_id);
        let child_id = node.child_nodes[idx];
        if self.nodes.get(child_id).number_of_keys() >= self.order {
            return child_id;
        }

        let number_of_keys = node.number_of_keys();
        let has_left_sibling = idx > 0;
        let has_right_sibling = idx < number_of_keys;
        if has_left_sibling
            && self.nodes.get(node.child_nodes[idx - 1]).number_of_keys() >= self.order
        {
            self.nodes.borrow_from_left(node_id, idx);
            child_id
        } else if has_right_sibling
            && self.nodes.get(node.child_nodes[idx + 1]).number_of_keys() >= self.order
        {
            self.nodes.borrow_from_right(node_id, idx);
            child_id
        } else if has_right_sibling {
            self.nodes.merge_children(node_id, idx)
        } else {
            self.nodes.merge_children(node_id, idx - 1)
        }
    }

    /// Check all structural invariants of the B-tree and panic if one is violated.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let mut leaf_depth = None;
        let mut nr_nodes = 0;
        let nr_elements = match self.root_id {
            Some(root_id) => self.check_node(root_id, None, None, 1, &mut leaf_depth, &mut nr_nodes),
            None => 0,
        };
        assert_eq!(self.nr_elements, nr_elements, "number of elements");
        assert_eq!(self.nodes.number_of_nodes(), nr_nodes, "number of nodes");
        assert_eq!(leaf_depth.unwrap_or(0), self.height(), "height");
    }

    fn check_node(
        &self,
        node_id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        nr_nodes: &mut usize,
    ) -> usize {
        *nr_nodes += 1;
        let node = self.nodes.get(node_id);
        let n = node.number_of_keys();
        assert!(n <= self.nodes.max_keys(), "node {} has too many keys", node_id);
        if Some(node_id) == self.root_id {
            assert!(n > 0, "root node {} is empty", node_id);
        } else {
            assert!(n >= self.nodes.min_keys(), "node {} has too few keys", node_id);
        }

        for (i, e) in node.entries.iter().enumerate() {
            if i > 0 {
                assert_eq!(
                    Ordering::Less,
                    self.comparator.compare(&node.entries[i - 1].key, &e.key),
                    "keys of node {} are not sorted",
                    node_id
                );
            }
            if let Some(lower) = lower {
                assert_eq!(Ordering::Less, self.comparator.compare(lower, &e.key));
            }
            if let Some(upper) = upper {
                assert_eq!(Ordering::Less, self.comparator.compare(&e.key, upper));
            }
        }

        if node.is_leaf() {
            match leaf_depth {
                Some(leaf_depth) => assert_eq!(*leaf_depth, depth, "leaf {} has wrong depth", node_id),
                None => *leaf_depth = Some(depth),
            }
            n
        } else {
            assert_eq!(n + 1, node.child_nodes.len(), "node {} has wrong number of children", node_id);
            let mut nr_elements = n;
            for (i, child_id) in node.child_nodes.iter().enumerate() {
                let child_lower = if i == 0 { lower } else { Some(&node.entries[i - 1].key) };
                let child_upper = if i == n { upper } else { Some(&node.entries[i].key) };
                nr_elements +=
                    self.check_node(*child_id, child_lower, child_upper, depth + 1, leaf_depth, nr_nodes);
            }
            nr_elements
        }
    }
}

/// Iterator over the entries of a [`BtreeIndex`], sorted by key.
///
/// The iterator borrows the index, so the index can not be changed while iterating.
pub struct Iter<'a, K, V> {
    nodes: &'a NodeArena<K, V>,
    stack: Vec<StackEntry>,
    remaining: usize,
}

/// Position in a node: the next key to return is at `idx`.
struct StackEntry {
    node: NodeId,
    idx: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn descend_leftmost(&mut self, node_id: NodeId) {
        let mut current = Some(node_id);
        while let Some(node_id) = current {
            self.stack.push(StackEntry {
                node: node_id,
                idx: 0,
            });
            current = self.nodes.get(node_id).child_nodes.first().copied();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while let Some(top) = self.stack.last_mut() {
            let node = nodes.get(top.node);
            if top.idx < node.number_of_keys() {
                let idx = top.idx;
                top.idx += 1;
                // All keys of the right child are between this key and the next one
                if !node.is_leaf() {
                    self.descend_leftmost(node.child_nodes[idx + 1]);
                }
                self.remaining -= 1;
                let entry = &node.entries[idx];
                return Some((&entry.key, &entry.value));
            }
            self.stack.pop();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}
