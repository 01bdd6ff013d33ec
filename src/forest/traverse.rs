use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::Slab;
use crate::{Direction, NodeIndex};

use super::node::{Marker, Node};

/// Order in which the nodes of a forest are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Order {
    /// Every node before its descendants.
    PreOrder,
    /// Every node after its descendants.
    PostOrder,
}

impl Order {
    pub const ALL: [Order; 2] = [Order::PreOrder, Order::PostOrder];

    /// The marker kind at which a traversal in this order stops.
    #[inline(always)]
    pub fn marker(self) -> Marker {
        match self {
            Order::PreOrder => Marker::Entry,
            Order::PostOrder => Marker::Exit,
        }
    }
}

/// Identity of a forest instance, shared by every cursor it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ForestId(u64);

impl ForestId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Position of a node within a traversal order.
///
/// Cursors do not borrow the forest they point into. They are moved along
/// with [`LinkedForest::next`] and [`LinkedForest::prev`] and read with
/// [`LinkedForest::get`]. Two cursors are equal when they point at the same
/// node in the same order.
///
/// A cursor remembers the generation of its node's arena slot and the forest
/// that created it. Once the node is erased, or when the cursor is handed to
/// another forest, every operation that takes a position rejects it, even
/// after the slot has been reused by a later insertion.
///
/// [`LinkedForest::next`]: super::LinkedForest::next
/// [`LinkedForest::prev`]: super::LinkedForest::prev
/// [`LinkedForest::get`]: super::LinkedForest::get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub(crate) node: NodeIndex,
    pub(crate) generation: u32,
    pub(crate) forest: ForestId,
    pub(crate) order: Order,
}

impl Cursor {
    /// The node the cursor points at.
    #[inline]
    pub fn node(self) -> NodeIndex {
        self.node
    }

    #[inline]
    pub fn order(self) -> Order {
        self.order
    }

    /// The same node, seen from another traversal order.
    #[inline]
    pub fn with_order(self, order: Order) -> Self {
        Self { order, ..self }
    }
}

/// Returns the node that follows `node` in `order` when walking in `direction`.
///
/// Starts at the node's marker of the kind selected by `order` and follows the
/// links in `direction`, skipping every marker of the opposite kind. A run of
/// skipped markers corresponds to a subtree boundary, so a full traversal
/// costs O(n) even though a single step may cross many markers.
///
/// The walk terminates because the markers form one finite cycle that
/// contains both markers of every node.
pub(crate) fn step<T>(
    nodes: &Slab<NodeIndex, Node<T>>,
    node: NodeIndex,
    order: Order,
    direction: Direction,
) -> NodeIndex {
    let stop = order.marker();
    let skip = stop.opposite();
    let mut current = nodes[node].pass(stop).link(direction);

    while current.marker == skip {
        current = nodes[current.node].pass(current.marker).link(direction);
    }

    current.node
}
