use crate::{Direction, NodeIndex};

/// One of the two markers every node contributes to the Euler tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    /// Emitted when the tour descends into the node.
    Entry = 0,
    /// Emitted when the tour leaves the node after all of its descendants.
    Exit = 1,
}

impl Marker {
    pub const ALL: [Marker; 2] = [Marker::Entry, Marker::Exit];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub fn opposite(self) -> Marker {
        match self {
            Marker::Entry => Marker::Exit,
            Marker::Exit => Marker::Entry,
        }
    }
}

/// Address of a single marker: the owning node and which of its two markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MarkerRef {
    pub node: NodeIndex,
    pub marker: Marker,
}

impl MarkerRef {
    #[inline(always)]
    pub fn new(node: NodeIndex, marker: Marker) -> Self {
        Self { node, marker }
    }
}

/// The links of one marker, indexed by [`Direction`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pass {
    pub links: [MarkerRef; 2],
}

impl Pass {
    #[inline(always)]
    pub fn link(&self, direction: Direction) -> MarkerRef {
        self.links[direction.index()]
    }
}

/// Arena slot of a forest.
///
/// The header is the only node without a value.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub weight: Option<T>,
    pub level: u32,
    /// Redundant with the marker nesting; lets ancestor lookups run in O(1).
    pub parent: Option<NodeIndex>,
    /// The entry and exit markers, indexed by [`Marker`].
    pub passes: [Pass; 2],
}

impl<T> Node<T> {
    /// Creates the header of a forest at `index`.
    ///
    /// An empty header is its own single-node cycle: entry leads to exit and
    /// exit leads back to entry.
    pub fn header(index: NodeIndex) -> Self {
        Self::leaf(
            index,
            None,
            0,
            None,
            MarkerRef::new(index, Marker::Exit),
            MarkerRef::new(index, Marker::Entry),
        )
    }

    /// Creates a node whose entry marker follows `prev` and whose exit marker
    /// precedes `next`.
    pub fn leaf(
        index: NodeIndex,
        weight: Option<T>,
        level: u32,
        parent: Option<NodeIndex>,
        prev: MarkerRef,
        next: MarkerRef,
    ) -> Self {
        let entry = MarkerRef::new(index, Marker::Entry);
        let exit = MarkerRef::new(index, Marker::Exit);
        Self {
            weight,
            level,
            parent,
            passes: [
                Pass { links: [exit, prev] },
                Pass { links: [next, entry] },
            ],
        }
    }

    #[inline(always)]
    pub fn pass(&self, marker: Marker) -> &Pass {
        &self.passes[marker.index()]
    }

    #[inline(always)]
    pub fn pass_mut(&mut self, marker: Marker) -> &mut Pass {
        &mut self.passes[marker.index()]
    }

    /// Whether the entry marker leads straight to the node's own exit marker.
    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        let exit = MarkerRef::new(index, Marker::Exit);
        let entry = MarkerRef::new(index, Marker::Entry);
        let leaf = self.pass(Marker::Entry).link(Direction::Forward) == exit;
        debug_assert_eq!(leaf, self.pass(Marker::Exit).link(Direction::Backward) == entry);
        leaf
    }
}
