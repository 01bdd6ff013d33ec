//! Ordered forests of n-ary trees with stackless bidirectional traversal.
//!
//! A [`LinkedForest`] stores every node together with two markers, one for
//! entering the node and one for leaving it. All markers of a forest are
//! threaded into a single circular doubly linked list, the Euler tour of the
//! forest. Walking that list and stopping only at entry markers visits the
//! nodes in pre-order; stopping only at exit markers visits them in
//! post-order. A header node without a value closes the cycle and acts as the
//! end position of both orders.
//!
//! # Example
//!
//! ```
//! use tourforest::LinkedForest;
//!
//! let mut forest = LinkedForest::new();
//! let one = forest.insert(forest.end(), 1).unwrap();
//! forest.insert(forest.end(), 4).unwrap();
//! forest.insert(one, 2).unwrap();
//! forest.insert(one, 3).unwrap();
//!
//! assert!(forest.iter().eq(&[1, 2, 3, 4]));
//! assert!(forest.post_order().iter().eq(&[2, 3, 1, 4]));
//! assert_eq!(forest.level(one), Ok(1));
//! ```
pub mod dump;
pub mod forest;
pub mod memory;

pub use dump::Dump;
pub use forest::{Cursor, ForestError, LinkedForest, Marker, Order, ValidationError};

/// Index of a node slot in a forest's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);
crate::entity_impl!(NodeIndex, u32);

/// Direction in which the links of a marker are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Forward = 0,
    Backward = 1,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Backward];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}
