use std::mem;

use tracing::trace;

use crate::compare::Comparator;
use crate::error::Result;

pub(crate) type NodeId = usize;

pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

pub(crate) struct Node<K, V> {
    pub(crate) entries: Vec<Entry<K, V>>,
    pub(crate) child_nodes: Vec<NodeId>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn is_leaf(&self) -> bool {
        self.child_nodes.is_empty()
    }

    pub(crate) fn number_of_keys(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) enum SearchResult {
    Found(usize),
    NotFound(usize),
}

enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

/// Storage for all nodes of a tree.
///
/// Nodes are addressed by their index in the slot vector.
/// Released slots form a free list and are reused before the vector grows.
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<NodeId>,
    order: usize,
    nr_nodes: usize,
    #[cfg(test)]
    node_limit: Option<usize>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn with_capacity(capacity: usize, order: usize) -> Result<NodeArena<K, V>> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        Ok(NodeArena {
            slots,
            free_head: None,
            order,
            nr_nodes: 0,
            #[cfg(test)]
            node_limit: None,
        })
    }

    pub(crate) fn max_keys(&self) -> usize {
        2 * self.order - 1
    }

    pub(crate) fn min_keys(&self) -> usize {
        self.order - 1
    }

    pub(crate) fn number_of_nodes(&self) -> usize {
        self.nr_nodes
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Let node allocation fail once the arena holds `limit` nodes.
    #[cfg(test)]
    pub(crate) fn limit_nodes(&mut self, limit: Option<usize>) {
        self.node_limit = limit;
    }

    pub(crate) fn get(&self, node_id: NodeId) -> &Node<K, V> {
        match self.slots.get(node_id) {
            Some(Slot::Occupied(n)) => n,
            _ => panic!("node {} is not allocated", node_id),
        }
    }

    pub(crate) fn get_mut(&mut self, node_id: NodeId) -> &mut Node<K, V> {
        match self.slots.get_mut(node_id) {
            Some(Slot::Occupied(n)) => n,
            _ => panic!("node {} is not allocated", node_id),
        }
    }

    /// Get mutable access to two different nodes at the same time.
    pub(crate) fn get_pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut Node<K, V>, &mut Node<K, V>) {
        assert_ne!(a, b, "can not borrow node {} twice", a);
        let (first, second) = if a < b {
            let (head, tail) = self.slots.split_at_mut(b);
            (&mut head[a], &mut tail[0])
        } else {
            let (head, tail) = self.slots.split_at_mut(a);
            (&mut tail[0], &mut head[b])
        };
        match (first, second) {
            (Slot::Occupied(first), Slot::Occupied(second)) => (first, second),
            _ => panic!("node {} or {} is not allocated", a, b),
        }
    }

    pub(crate) fn is_full(&self, node_id: NodeId) -> bool {
        self.get(node_id).number_of_keys() == self.max_keys()
    }

    /// Create a new node that is not yet part of the arena.
    ///
    /// All memory the node's keys and children can ever need is allocated here.
    /// Together with [`NodeArena::reserve`] this makes [`NodeArena::store`] infallible.
    pub(crate) fn allocate_new_node(&self, is_leaf: bool) -> Result<Node<K, V>> {
        let mut entries = Vec::new();
        #[cfg(test)]
        if self.node_limit.map_or(false, |limit| self.nr_nodes >= limit) {
            entries.try_reserve_exact(usize::MAX)?;
        }
        entries.try_reserve_exact(self.max_keys())?;
        let mut child_nodes = Vec::new();
        if !is_leaf {
            child_nodes.try_reserve_exact(self.max_keys() + 1)?;
        }
        Ok(Node {
            entries,
            child_nodes,
        })
    }

    /// Make sure that the given number of nodes can be stored without allocating.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        self.slots.try_reserve(additional)?;
        Ok(())
    }

    /// Add a node to the arena and return its ID.
    pub(crate) fn store(&mut self, node: Node<K, V>) -> NodeId {
        self.nr_nodes += 1;
        if let Some(node_id) = self.free_head {
            let previous = mem::replace(&mut self.slots[node_id], Slot::Occupied(node));
            if let Slot::Vacant { next_free } = previous {
                self.free_head = next_free;
            } else {
                panic!("free list points to occupied node {}", node_id);
            }
            node_id
        } else {
            self.slots.push(Slot::Occupied(node));
            self.slots.len() - 1
        }
    }

    /// Remove a node from the arena and return its content.
    pub(crate) fn release_node(&mut self, node_id: NodeId) -> Node<K, V> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match mem::replace(&mut self.slots[node_id], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(node_id);
                self.nr_nodes -= 1;
                node
            }
            Slot::Vacant { .. } => panic!("node {} was released twice", node_id),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots = Vec::new();
        self.free_head = None;
        self.nr_nodes = 0;
    }

    pub(crate) fn binary_search<C>(&self, node_id: NodeId, key: &K, comparator: &C) -> SearchResult
    where
        C: Comparator<K>,
    {
        match self
            .get(node_id)
            .entries
            .binary_search_by(|e| comparator.compare(&e.key, key))
        {
            Ok(i) => SearchResult::Found(i),
            Err(i) => SearchResult::NotFound(i),
        }
    }

    /// Split the full child at position `idx` of the parent node.
    ///
    /// Returns the ID of the newly created right sibling.
    /// The parent must not be full.
    pub(crate) fn split_child(&mut self, parent_id: NodeId, idx: usize) -> Result<NodeId> {
        let child_id = self.get(parent_id).child_nodes[idx];
        let child_is_leaf = self.get(child_id).is_leaf();
        let sibling = self.allocate_new_node(child_is_leaf)?;
        self.reserve(1)?;
        Ok(self.split_child_into(parent_id, idx, sibling))
    }

    /// Split a full root node by adding a new root above it.
    ///
    /// Returns the ID of the new root node.
    pub(crate) fn split_root_node(&mut self, root_id: NodeId) -> Result<NodeId> {
        let root_is_leaf = self.get(root_id).is_leaf();
        let mut new_root = self.allocate_new_node(false)?;
        let sibling = self.allocate_new_node(root_is_leaf)?;
        self.reserve(2)?;

        new_root.child_nodes.push(root_id);
        let new_root_id = self.store(new_root);
        self.split_child_into(new_root_id, 0, sibling);
        trace!(old_root = root_id, new_root = new_root_id, "split root node");
        Ok(new_root_id)
    }

    fn split_child_into(&mut self, parent_id: NodeId, idx: usize, mut sibling: Node<K, V>) -> NodeId {
        let order = self.order;
        let child_id = self.get(parent_id).child_nodes[idx];
        debug_assert!(self.is_full(child_id));

        // The upper t-1 keys and t children move to the new sibling,
        // the key in the middle moves up to the parent.
        let child = self.get_mut(child_id);
        sibling.entries.extend(child.entries.drain(order..));
        if !child.is_leaf() {
            sibling.child_nodes.extend(child.child_nodes.drain(order..));
        }
        let median = child
            .entries
            .pop()
            .unwrap_or_else(|| panic!("split of node {} without keys", child_id));

        let sibling_id = self.store(sibling);
        let parent = self.get_mut(parent_id);
        parent.entries.insert(idx, median);
        parent.child_nodes.insert(idx + 1, sibling_id);

        trace!(
            parent = parent_id,
            left = child_id,
            right = sibling_id,
            "split child node"
        );
        sibling_id
    }

    /// Merge the child at `idx + 1` and the separating key into the child at `idx`.
    ///
    /// The right child is released. Returns the ID of the merged node.
    pub(crate) fn merge_children(&mut self, parent_id: NodeId, idx: usize) -> NodeId {
        let max_keys = self.max_keys();
        let parent = self.get_mut(parent_id);
        let left_id = parent.child_nodes[idx];
        let right_id = parent.child_nodes.remove(idx + 1);
        let separator = parent.entries.remove(idx);

        let right = self.release_node(right_id);
        let left = self.get_mut(left_id);
        left.entries.push(separator);
        left.entries.extend(right.entries);
        left.child_nodes.extend(right.child_nodes);
        debug_assert!(left.number_of_keys() <= max_keys);

        trace!(
            parent = parent_id,
            left = left_id,
            right = right_id,
            "merged child nodes"
        );
        left_id
    }

    /// Move the largest key of the left sibling up into the parent and the
    /// separating key down into the child at `idx`.
    pub(crate) fn borrow_from_left(&mut self, parent_id: NodeId, idx: usize) {
        let parent = self.get(parent_id);
        let child_id = parent.child_nodes[idx];
        let left_id = parent.child_nodes[idx - 1];

        let left = self.get_mut(left_id);
        let (entry, grandchild) = match left.entries.pop() {
            Some(entry) => (entry, left.child_nodes.pop()),
            None => panic!("borrowing from empty node {}", left_id),
        };
        let separator = mem::replace(&mut self.get_mut(parent_id).entries[idx - 1], entry);

        let child = self.get_mut(child_id);
        child.entries.insert(0, separator);
        if let Some(grandchild) = grandchild {
            child.child_nodes.insert(0, grandchild);
        }
        trace!(parent = parent_id, from = left_id, to = child_id, "borrowed from left sibling");
    }

    /// Move the smallest key of the right sibling up into the parent and the
    /// separating key down into the child at `idx`.
    pub(crate) fn borrow_from_right(&mut self, parent_id: NodeId, idx: usize) {
        let parent = self.get(parent_id);
        let child_id = parent.child_nodes[idx];
        let right_id = parent.child_nodes[idx + 1];

        let right = self.get_mut(right_id);
        if right.entries.is_empty() {
            panic!("borrowing from empty node {}", right_id);
        }
        let entry = right.entries.remove(0);
        let grandchild = if right.is_leaf() {
            None
        } else {
            Some(right.child_nodes.remove(0))
        };
        let separator = mem::replace(&mut self.get_mut(parent_id).entries[idx], entry);

        let child = self.get_mut(child_id);
        child.entries.push(separator);
        if let Some(grandchild) = grandchild {
            child.child_nodes.push(grandchild);
        }
        trace!(parent = parent_id, from = right_id, to = child_id, "borrowed from right sibling");
    }
}
