mod btree;
mod compare;
mod error;
mod set;

pub use btree::{BtreeIndex, Iter};
pub use compare::{Comparator, NaturalOrder};
pub use error::{Error, Result};
pub use set::{BtreeSet, SetIter};

use serde_derive::{Deserialize, Serialize};

/// Configuration for a B-tree index.
///
/// ```rust
/// use btree_index::BtreeConfig;
///
/// let config = BtreeConfig::default().order(3).capacity(64);
/// assert_eq!(3, config.get_order());
/// assert_eq!(64, config.get_capacity());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BtreeConfig {
    order: usize,
    capacity: usize,
}

impl Default for BtreeConfig {
    fn default() -> Self {
        Self {
            order: 6,
            capacity: 0,
        }
    }
}

impl BtreeConfig {
    /// Set the minimum degree `t` of the tree.
    ///
    /// Each node except the root holds between `t - 1` and `2t - 1` keys.
    /// The order must be at least 2 and at most `usize::MAX / 2`.
    pub fn order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Number of nodes to reserve space for when the index is created.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Minimum degree `t` of the tree.
    pub fn get_order(&self) -> usize {
        self.order
    }

    /// Number of nodes reserved when the index is created.
    pub fn get_capacity(&self) -> usize {
        self.capacity
    }
}
