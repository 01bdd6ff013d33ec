use std::collections::TryReserveError;
use std::fmt::{self, Debug};
use std::ops::{Index, IndexMut};

use thiserror::Error;
use tracing::{debug, trace};

use super::iter::{Cursors, Iter, PostOrder};
use super::node::{Marker, MarkerRef, Node};
use super::traverse::{step, Cursor, ForestId, Order};
use crate::memory::Slab;
use crate::{Direction, NodeIndex};

/// An ordered forest of n-ary trees.
///
/// Nodes live in a slab arena together with a header node that carries no
/// value. The entry and exit markers of all nodes are linked into a single
/// cycle, so both pre-order and post-order can be walked in either direction
/// one node at a time, without recursion and without an auxiliary stack.
///
/// Positions are [`Cursor`]s. Inserting at [`LinkedForest::end`] adds a new
/// root; inserting at any other cursor adds a last child to that node.
pub struct LinkedForest<T> {
    pub(crate) nodes: Slab<NodeIndex, Node<T>>,
    pub(crate) header: NodeIndex,
    id: ForestId,
}

impl<T> LinkedForest<T> {
    /// Creates a new empty forest.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new empty forest with room for `nodes` nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        let mut slab = Slab::with_capacity(nodes.saturating_add(1));
        let header = slab.vacant_key();
        slab.insert(Node::header(header));
        Self {
            nodes: slab,
            header,
            id: ForestId::fresh(),
        }
    }

    /// Returns the number of nodes, not counting the header.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The end position of the pre-order.
    #[inline]
    pub fn end(&self) -> Cursor {
        self.end_in(Order::PreOrder)
    }

    /// The first node in pre-order, or [`LinkedForest::end`] for an empty forest.
    #[inline]
    pub fn begin(&self) -> Cursor {
        self.begin_in(Order::PreOrder)
    }

    /// The end position of a traversal order.
    ///
    /// This is the header, read through the marker kind of `order`.
    #[inline]
    pub fn end_in(&self, order: Order) -> Cursor {
        self.cursor_at(self.header, order)
    }

    /// The first node of a traversal order: one step forward from the end.
    #[inline]
    pub fn begin_in(&self, order: Order) -> Cursor {
        let first = step(&self.nodes, self.header, order, Direction::Forward);
        self.cursor_at(first, order)
    }

    /// Returns a view that traverses the forest in post-order.
    #[inline]
    pub fn post_order(&self) -> PostOrder<'_, T> {
        PostOrder::new(self)
    }

    /// Iterates over the values in pre-order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, Order::PreOrder)
    }

    /// Iterates over the positions in pre-order.
    #[inline]
    pub fn cursors(&self) -> Cursors<'_, T> {
        Cursors::new(self, Order::PreOrder)
    }

    /// Moves a cursor one node forward in its order.
    ///
    /// The last node is followed by the end position, which is in turn
    /// followed by the first node.
    ///
    /// # Errors
    ///
    /// Fails when the cursor does not point at a node of the forest.
    pub fn next(&self, cursor: Cursor) -> Result<Cursor, ForestError> {
        self.step_cursor(cursor, Direction::Forward)
    }

    /// Moves a cursor one node backward in its order.
    ///
    /// # Errors
    ///
    /// Fails when the cursor does not point at a node of the forest.
    pub fn prev(&self, cursor: Cursor) -> Result<Cursor, ForestError> {
        self.step_cursor(cursor, Direction::Backward)
    }

    fn step_cursor(&self, cursor: Cursor, direction: Direction) -> Result<Cursor, ForestError> {
        self.node(cursor)?;
        let node = step(&self.nodes, cursor.node, cursor.order, direction);
        Ok(self.cursor_at(node, cursor.order))
    }

    /// Returns the value at a position.
    ///
    /// Returns `None` for end positions and dangling cursors.
    #[inline]
    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        self.node(cursor).ok()?.weight.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        self.node(cursor).ok()?;
        self.nodes.get_mut(cursor.node)?.weight.as_mut()
    }

    /// Returns the depth of a node. Roots are on level 1.
    ///
    /// # Errors
    ///
    /// Fails for end positions and dangling cursors.
    pub fn level(&self, cursor: Cursor) -> Result<u32, ForestError> {
        Ok(self.value_node(cursor)?.level)
    }

    /// Returns whether a node has no children.
    ///
    /// # Errors
    ///
    /// Fails for end positions and dangling cursors.
    pub fn is_leaf(&self, cursor: Cursor) -> Result<bool, ForestError> {
        Ok(self.value_node(cursor)?.is_leaf(cursor.node))
    }

    /// Returns a node's parent in the cursor's order, or `None` for a root.
    ///
    /// # Errors
    ///
    /// Fails for end positions and dangling cursors.
    pub fn parent(&self, cursor: Cursor) -> Result<Option<Cursor>, ForestError> {
        let parent = self
            .value_node(cursor)?
            .parent
            .filter(|&parent| parent != self.header);
        Ok(parent.map(|parent| self.cursor_at(parent, cursor.order)))
    }

    /// Adds a value as the last child of the node at `pos`.
    ///
    /// Inserting at an end position adds a new last root. Returns the position
    /// of the new node in the order of `pos`.
    ///
    /// # Errors
    ///
    /// Fails when `pos` is dangling or when the arena can not grow. The forest
    /// is unchanged in both cases.
    ///
    /// # Panics
    ///
    /// Panics when the forest would hold more than `u32::MAX` nodes.
    ///
    /// # Example
    ///
    /// ```
    /// # use tourforest::LinkedForest;
    /// let mut forest = LinkedForest::new();
    /// let root = forest.insert(forest.end(), 'a').unwrap();
    /// let first = forest.insert(root, 'b').unwrap();
    /// forest.insert(root, 'c').unwrap();
    ///
    /// assert!(forest.iter().eq(&['a', 'b', 'c']));
    /// assert_eq!(forest.level(first), Ok(2));
    /// assert_eq!(forest.is_leaf(root), Ok(false));
    /// ```
    pub fn insert(&mut self, pos: Cursor, value: T) -> Result<Cursor, ForestError> {
        let parent = self.node(pos)?;
        let level = parent.level + 1;
        let exit = MarkerRef::new(pos.node, Marker::Exit);
        let prev = parent.pass(Marker::Exit).link(Direction::Backward);

        self.try_reserve(1)?;

        // The new node goes right before the parent's exit marker, which
        // makes it the parent's last child in both orders.
        let index = self.nodes.vacant_key();
        let inserted = self
            .nodes
            .insert(Node::leaf(index, Some(value), level, Some(pos.node), prev, exit));
        debug_assert_eq!(inserted, index);

        self.set_link(prev, Direction::Forward, MarkerRef::new(index, Marker::Entry));
        self.set_link(exit, Direction::Backward, MarkerRef::new(index, Marker::Exit));

        Ok(self.cursor_at(index, pos.order))
    }

    /// Removes the node at `pos` and returns the position that followed it.
    ///
    /// The children of an internal node take its place among its siblings,
    /// keeping their relative order, and every descendant moves one level up.
    /// That level update visits the whole subtree, so erasing an internal node
    /// costs O(subtree size) while erasing a leaf is O(1).
    ///
    /// # Errors
    ///
    /// Fails for end positions and dangling cursors.
    ///
    /// # Example
    ///
    /// ```
    /// # use tourforest::LinkedForest;
    /// let mut forest = LinkedForest::new();
    /// let a = forest.insert(forest.end(), 'a').unwrap();
    /// let b = forest.insert(a, 'b').unwrap();
    ///
    /// let next = forest.erase(a).unwrap();
    /// assert_eq!(next, b);
    /// assert_eq!(forest.level(b), Ok(1));
    /// assert_eq!(forest.parent(b), Ok(None));
    /// ```
    pub fn erase(&mut self, pos: Cursor) -> Result<Cursor, ForestError> {
        self.value_node(pos)?;
        let following = step(&self.nodes, pos.node, pos.order, Direction::Forward);
        self.delete_promoting(pos.node);
        Ok(self.cursor_at(following, pos.order))
    }

    /// Removes the node at `pos` like [`LinkedForest::erase`] and returns its value.
    ///
    /// # Errors
    ///
    /// Fails for end positions and dangling cursors.
    pub fn remove(&mut self, pos: Cursor) -> Result<T, ForestError> {
        self.value_node(pos)?;
        self.delete_promoting(pos.node).ok_or(ForestError::InvalidPosition)
    }

    /// Removes all nodes, leaving only the header.
    pub fn clear(&mut self) {
        debug!(len = self.len(), "clearing forest");

        // Children of a removed root become the next roots; their levels
        // and parents go stale but they are about to be removed as well.
        while !self.is_empty() {
            let first = step(&self.nodes, self.header, Order::PreOrder, Direction::Forward);
            self.delete(first);
        }
    }

    /// Makes room for at least `additional` more nodes.
    ///
    /// # Errors
    ///
    /// Fails when the arena can not grow. The forest is unchanged in that case.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ForestError> {
        self.nodes.try_reserve(additional)?;
        Ok(())
    }

    /// Swaps the contents of two forests.
    ///
    /// Cursors keep pointing at the same nodes, which now belong to the other
    /// forest.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Copies the forest into a new one with the same shape and values.
    ///
    /// The copy is built in one pre-order pass over `self`, inserting every
    /// node under an insertion parent that descends by one level or ascends
    /// through parent links as the levels of the visited nodes dictate. The
    /// nodes of the copy are laid out in pre-order; cursors into `self` are
    /// not valid for the copy.
    ///
    /// # Errors
    ///
    /// Fails when the arena of the copy can not be allocated. Nothing is
    /// leaked and `self` is unchanged.
    pub fn try_clone(&self) -> Result<Self, ForestError>
    where
        T: Clone,
    {
        debug!(len = self.len(), "copying forest");

        let mut scratch = Self::new();
        scratch.try_reserve(self.len())?;

        let mut parent = scratch.header;
        let mut last = scratch.header;

        for cursor in self.cursors() {
            let level = self.nodes[cursor.node].level;
            let child_level = scratch.nodes[parent].level + 1;

            if level > child_level {
                debug_assert_eq!(level, child_level + 1, "pre-order descends one level at a time");
                parent = last;
            } else {
                for _ in level..child_level {
                    if let Some(up) = scratch.nodes[parent].parent {
                        parent = up;
                    }
                }
            }

            let pos = scratch.cursor_at(parent, Order::PreOrder);
            last = scratch.insert(pos, self[cursor].clone())?.node;
        }

        Ok(scratch)
    }

    /// Replaces the contents of `self` with a copy of `source`.
    ///
    /// # Errors
    ///
    /// Fails when the copy can not be allocated, in which case `self` keeps
    /// its previous contents.
    pub fn assign_from(&mut self, source: &Self) -> Result<(), ForestError>
    where
        T: Clone,
    {
        let mut scratch = source.try_clone()?;
        self.swap(&mut scratch);
        Ok(())
    }

    /// Returns the cursor for a live node of this forest.
    pub(crate) fn cursor_at(&self, node: NodeIndex, order: Order) -> Cursor {
        Cursor {
            node,
            generation: self.nodes.generation(node).unwrap_or_default(),
            forest: self.id,
            order,
        }
    }

    /// Resolves a cursor, rejecting erased nodes and cursors of other forests.
    fn node(&self, cursor: Cursor) -> Result<&Node<T>, ForestError> {
        let live = self.nodes.generation(cursor.node) == Some(cursor.generation);
        if cursor.forest != self.id || !live {
            return Err(ForestError::InvalidPosition);
        }
        self.nodes
            .get(cursor.node)
            .ok_or(ForestError::InvalidPosition)
    }

    /// Like [`LinkedForest::node`] but also rejects the header.
    fn value_node(&self, cursor: Cursor) -> Result<&Node<T>, ForestError> {
        let node = self.node(cursor)?;
        if cursor.node == self.header {
            return Err(ForestError::EndPosition);
        }
        Ok(node)
    }

    #[inline]
    fn set_link(&mut self, at: MarkerRef, direction: Direction, to: MarkerRef) {
        self.nodes[at.node].pass_mut(at.marker).links[direction.index()] = to;
    }

    /// Removes a node, moving its descendants one level closer to the roots
    /// and handing its children over to its parent.
    fn delete_promoting(&mut self, node: NodeIndex) -> Option<T> {
        let data = &self.nodes[node];

        if !data.is_leaf(node) {
            let level = data.level;
            let parent = data.parent;
            let mut promoted = 0usize;
            let mut current = step(&self.nodes, node, Order::PreOrder, Direction::Forward);

            // The subtree ends at the first node that is not deeper than
            // `node`; at the latest this is the header on level 0.
            loop {
                let descendant = &mut self.nodes[current];
                if descendant.level <= level {
                    break;
                }
                if descendant.level == level + 1 {
                    descendant.parent = parent;
                }
                descendant.level -= 1;
                promoted += 1;
                current = step(&self.nodes, current, Order::PreOrder, Direction::Forward);
            }

            trace!(?node, promoted, "promoted descendants of erased node");
        }

        self.delete(node)
    }

    /// Removes a node from the marker cycle and the arena.
    ///
    /// Levels and parents of the node's descendants are left as they are.
    fn delete(&mut self, node: NodeIndex) -> Option<T> {
        // Each neighbour of a marker is linked to the marker's other neighbour.
        for marker in Marker::ALL {
            let pass = *self.nodes[node].pass(marker);
            for direction in Direction::ALL {
                let back = direction.reverse();
                self.set_link(pass.link(direction), back, pass.link(back));
            }
        }

        self.nodes.remove(node)?.weight
    }
}

impl<T> Default for LinkedForest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for LinkedForest<T> {
    /// # Panics
    ///
    /// Panics when the copy can not be allocated. Use
    /// [`LinkedForest::try_clone`] to handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(forest) => forest,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Forests are equal when they hold equal values in the same pre-order.
impl<T: PartialEq> PartialEq for LinkedForest<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for LinkedForest<T> {}

impl<T> Index<Cursor> for LinkedForest<T> {
    type Output = T;

    fn index(&self, cursor: Cursor) -> &Self::Output {
        self.get(cursor).expect("invalid cursor")
    }
}

impl<T> IndexMut<Cursor> for LinkedForest<T> {
    fn index_mut(&mut self, cursor: Cursor) -> &mut Self::Output {
        self.get_mut(cursor).expect("invalid cursor")
    }
}

impl<T: Debug> Debug for LinkedForest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedForest")
            .field("len", &self.len())
            .field("nodes", &Levelled(self))
            .finish()
    }
}

/// Pre-order `(level, value)` pairs.
struct Levelled<'a, T>(&'a LinkedForest<T>);

impl<'a, T: Debug> Debug for Levelled<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let forest = self.0;
        f.debug_list()
            .entries(
                forest
                    .cursors()
                    .map(|cursor| (forest.nodes[cursor.node].level, &forest[cursor])),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    #[error("the position does not refer to a node of the forest")]
    InvalidPosition,
    #[error("the end position does not refer to a node")]
    EndPosition,
    #[error("failed to allocate forest nodes: {0}")]
    Alloc(#[from] TryReserveError),
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    struct Scenario {
        forest: LinkedForest<i32>,
        /// Positions of the values 1 to 6, in pre-order.
        nodes: [Cursor; 6],
    }

    impl Scenario {
        fn at(&self, value: i32) -> Cursor {
            self.nodes[value as usize - 1]
        }
    }

    /// ```text
    /// 1       6
    /// ├── 2
    /// └── 3
    ///     ├── 4
    ///     └── 5
    /// ```
    #[fixture]
    fn scenario() -> Scenario {
        let mut forest = LinkedForest::new();
        let one = forest.insert(forest.end(), 1).unwrap();
        let six = forest.insert(forest.end(), 6).unwrap();
        let two = forest.insert(one, 2).unwrap();
        let three = forest.insert(one, 3).unwrap();
        let four = forest.insert(three, 4).unwrap();
        let five = forest.insert(three, 5).unwrap();
        Scenario {
            forest,
            nodes: [one, two, three, four, five, six],
        }
    }

    fn pre_order<T: Clone>(forest: &LinkedForest<T>) -> Vec<T> {
        forest.iter().cloned().collect()
    }

    fn post_order<T: Clone>(forest: &LinkedForest<T>) -> Vec<T> {
        forest.post_order().iter().cloned().collect()
    }

    #[rstest]
    fn scenario_orders(scenario: Scenario) {
        let forest = &scenario.forest;

        assert_eq!(forest.len(), 6);
        assert_eq!(pre_order(forest), [1, 2, 3, 4, 5, 6]);
        assert_eq!(post_order(forest), [2, 4, 5, 3, 1, 6]);
        assert!(forest.iter().rev().eq(&[6, 5, 4, 3, 2, 1]));
        assert!(forest.post_order().iter().rev().eq(&[6, 1, 3, 5, 4, 2]));
        assert_eq!(forest.validate(), Ok(()));
    }

    #[rstest]
    fn scenario_shape(scenario: Scenario) {
        let forest = &scenario.forest;

        assert_eq!(forest.is_leaf(scenario.at(4)), Ok(true));
        assert_eq!(forest.is_leaf(scenario.at(1)), Ok(false));
        assert_eq!(forest.is_leaf(scenario.at(6)), Ok(true));
        assert_eq!(forest.level(scenario.at(4)), Ok(3));
        assert_eq!(forest.level(scenario.at(1)), Ok(1));
        assert_eq!(forest.level(scenario.at(3)), Ok(2));
        assert_eq!(forest.parent(scenario.at(5)), Ok(Some(scenario.at(3))));
        assert_eq!(forest.parent(scenario.at(6)), Ok(None));
    }

    #[rstest]
    fn cursors_step_in_both_directions(scenario: Scenario) {
        let forest = &scenario.forest;

        let mut cursor = forest.begin();
        for value in 1..=6 {
            assert_eq!(forest.get(cursor), Some(&value));
            cursor = forest.next(cursor).unwrap();
        }
        assert_eq!(cursor, forest.end());
        assert_eq!(forest.next(forest.end()), Ok(forest.begin()));
        assert_eq!(forest.prev(forest.end()), Ok(scenario.at(6)));

        let post = forest.post_order();
        let mut cursor = post.end();
        for value in [6, 1, 3, 5, 4, 2] {
            cursor = forest.prev(cursor).unwrap();
            assert_eq!(forest[cursor], value);
        }
        assert_eq!(cursor, post.begin());
        assert_eq!(forest.prev(cursor), Ok(post.end()));
    }

    #[rstest]
    fn end_positions_differ_per_order(scenario: Scenario) {
        let forest = &scenario.forest;

        assert_ne!(forest.end(), forest.post_order().end());
        assert_eq!(forest.end().node(), forest.post_order().end().node());
        assert_eq!(forest.get(forest.end()), None);
        assert_eq!(forest.begin(), scenario.at(1));
        assert_eq!(forest.post_order().begin(), scenario.at(2).with_order(Order::PostOrder));
    }

    #[rstest]
    fn erase_leaf_then_internal(mut scenario: Scenario) {
        let forest = &mut scenario.forest;
        let six = scenario.nodes[5];

        assert_eq!(forest.erase(scenario.nodes[4]), Ok(six));
        assert_eq!(pre_order(forest), [1, 2, 3, 4, 6]);
        assert_eq!(forest.len(), 5);

        let two = scenario.nodes[1];
        assert_eq!(forest.erase(scenario.nodes[0]), Ok(two));
        assert_eq!(pre_order(forest), [2, 3, 4, 6]);
        assert_eq!(post_order(forest), [2, 4, 3, 6]);
        assert_eq!(forest.level(two), Ok(1));
        assert_eq!(forest.level(scenario.nodes[2]), Ok(1));
        assert_eq!(forest.level(scenario.nodes[3]), Ok(2));
        assert_eq!(forest.parent(two), Ok(None));
        assert_eq!(forest.parent(scenario.nodes[3]), Ok(Some(scenario.nodes[2])));
        assert_eq!(forest.validate(), Ok(()));
    }

    #[rstest]
    fn erase_returns_follower_in_cursor_order(mut scenario: Scenario) {
        let three = scenario.at(3).with_order(Order::PostOrder);
        let one = scenario.at(1).with_order(Order::PostOrder);

        assert_eq!(scenario.forest.erase(three), Ok(one));
        assert_eq!(post_order(&scenario.forest), [2, 4, 5, 1, 6]);
        assert_eq!(pre_order(&scenario.forest), [1, 2, 4, 5, 6]);
        assert_eq!(scenario.forest.parent(scenario.at(4)), Ok(Some(scenario.at(1))));
    }

    #[test]
    fn erase_internal_keeps_sibling_order() {
        let mut forest = LinkedForest::new();
        let a = forest.insert(forest.end(), 'a').unwrap();
        let b = forest.insert(forest.end(), 'b').unwrap();
        forest.insert(forest.end(), 'c').unwrap();
        let x = forest.insert(b, 'x').unwrap();
        let y = forest.insert(b, 'y').unwrap();
        let z = forest.insert(y, 'z').unwrap();

        forest.erase(b).unwrap();

        assert!(forest.iter().eq(&['a', 'x', 'y', 'z', 'c']));
        assert!(forest.post_order().iter().eq(&['a', 'x', 'z', 'y', 'c']));
        for root in [a, x, y] {
            assert_eq!(forest.level(root), Ok(1));
            assert_eq!(forest.parent(root), Ok(None));
        }
        assert_eq!(forest.level(z), Ok(2));
        assert_eq!(forest.validate(), Ok(()));

        // New roots still go last.
        forest.insert(forest.end(), 'd').unwrap();
        assert!(forest.iter().eq(&['a', 'x', 'y', 'z', 'c', 'd']));
    }

    #[rstest]
    fn remove_returns_value(mut scenario: Scenario) {
        let three = scenario.at(3);
        assert_eq!(scenario.forest.remove(three), Ok(3));
        assert_eq!(pre_order(&scenario.forest), [1, 2, 4, 5, 6]);
        assert_eq!(scenario.forest.remove(three), Err(ForestError::InvalidPosition));
    }

    #[rstest]
    #[case(Order::PreOrder)]
    #[case(Order::PostOrder)]
    fn clear_resets_both_orders(mut scenario: Scenario, #[case] order: Order) {
        let forest = &mut scenario.forest;
        forest.clear();

        assert!(forest.is_empty());
        assert_eq!(forest.begin_in(order), forest.end_in(order));
        assert_eq!(forest.iter().next(), None);
        assert_eq!(forest.validate(), Ok(()));

        let root = forest.insert(forest.end_in(order), 7).unwrap();
        assert_eq!(forest.begin_in(order), root);
        assert_eq!(forest.level(root), Ok(1));
    }

    #[rstest]
    fn precondition_violations_are_reported(mut scenario: Scenario) {
        let forest = &mut scenario.forest;
        let end = forest.end();
        let five = scenario.nodes[4];

        assert_eq!(forest.erase(end), Err(ForestError::EndPosition));
        assert_eq!(forest.level(end), Err(ForestError::EndPosition));
        assert_eq!(forest.is_leaf(end), Err(ForestError::EndPosition));
        assert_eq!(forest.parent(end), Err(ForestError::EndPosition));

        forest.erase(five).unwrap();
        assert_eq!(forest.erase(five), Err(ForestError::InvalidPosition));
        assert_eq!(forest.level(five), Err(ForestError::InvalidPosition));
        assert_eq!(forest.next(five), Err(ForestError::InvalidPosition));
        assert_eq!(forest.insert(five, 0), Err(ForestError::InvalidPosition));
        assert_eq!(forest.get(five), None);
        assert_eq!(forest.validate(), Ok(()));

        let mut empty = LinkedForest::<i32>::new();
        assert_eq!(empty.erase(empty.begin()), Err(ForestError::EndPosition));
    }

    #[test]
    fn stale_cursor_rejected_after_slot_reuse() {
        let mut forest = LinkedForest::new();
        let a = forest.insert(forest.end(), 'a').unwrap();
        let b = forest.insert(a, 'b').unwrap();
        forest.erase(b).unwrap();
        let c = forest.insert(forest.end(), 'c').unwrap();

        assert_eq!(c.node(), b.node());
        assert_ne!(c, b);
        assert_eq!(forest.erase(b), Err(ForestError::InvalidPosition));
        assert_eq!(forest.level(b), Err(ForestError::InvalidPosition));
        assert_eq!(forest.is_leaf(b), Err(ForestError::InvalidPosition));
        assert_eq!(forest.insert(b, 'x'), Err(ForestError::InvalidPosition));
        assert_eq!(forest.get(b), None);
        assert!(forest.iter().eq(&['a', 'c']));
        assert_eq!(forest.level(c), Ok(1));
        assert_eq!(forest.validate(), Ok(()));
    }

    #[rstest]
    fn foreign_cursors_are_rejected(scenario: Scenario) {
        let mut other = LinkedForest::new();
        other.insert(other.end(), 1).unwrap();
        let copy = scenario.forest.try_clone().unwrap();
        let one = scenario.at(1);

        assert_eq!(other.level(one), Err(ForestError::InvalidPosition));
        assert_eq!(other.erase(one), Err(ForestError::InvalidPosition));
        assert_eq!(other.get(one), None);
        assert_eq!(other.erase(scenario.forest.end()), Err(ForestError::InvalidPosition));
        assert_eq!(copy.level(one), Err(ForestError::InvalidPosition));
        assert_eq!(other.len(), 1);
        assert_eq!(copy.len(), 6);
    }

    #[rstest]
    fn failed_reservation_leaves_forest_unchanged(mut scenario: Scenario) {
        let forest = &mut scenario.forest;
        let before = pre_order(forest);

        assert!(matches!(forest.try_reserve(usize::MAX), Err(ForestError::Alloc(_))));
        assert_eq!(forest.len(), 6);
        assert_eq!(pre_order(forest), before);
        assert_eq!(forest.validate(), Ok(()));

        assert_eq!(forest.try_reserve(16), Ok(()));
        let seven = forest.insert(forest.end(), 7).unwrap();
        assert_eq!(forest.level(seven), Ok(1));
    }

    #[test]
    fn single_node_orders_agree() {
        let mut forest = LinkedForest::new();
        let only = forest.insert(forest.end(), "only").unwrap();

        assert_eq!(pre_order(&forest), post_order(&forest));
        assert_eq!(forest.begin(), only);
        assert_eq!(forest.post_order().begin().node(), only.node());
        assert_eq!(forest.is_leaf(only), Ok(true));
    }

    #[rstest]
    fn copies_are_equal_and_independent(scenario: Scenario) {
        let original = scenario.forest;
        let mut copy = original.clone();

        assert_eq!(copy, original);
        assert_eq!(post_order(&copy), post_order(&original));
        assert_eq!(copy.validate(), Ok(()));
        for (a, b) in copy.cursors().zip(original.cursors()) {
            assert_eq!(copy.level(a), original.level(b));
            assert_eq!(copy.is_leaf(a), original.is_leaf(b));
        }

        let first = copy.begin();
        copy[first] = 10;
        assert_ne!(copy, original);
        assert_eq!(original[original.begin()], 1);

        let last = copy.prev(copy.end()).unwrap();
        copy.erase(last).unwrap();
        assert_eq!(original.len(), 6);
        assert_eq!(copy.len(), 5);
    }

    #[rstest]
    fn copy_survives_clearing_the_source(scenario: Scenario) {
        let mut original = scenario.forest;
        let snapshot = pre_order(&original);
        let copy = original.try_clone().unwrap();

        original.clear();

        assert!(original.is_empty());
        assert_eq!(pre_order(&copy), snapshot);
        assert_eq!(post_order(&copy), [2, 4, 5, 3, 1, 6]);
    }

    #[test]
    fn copy_ascends_several_levels() {
        let mut forest = LinkedForest::new();
        let a = forest.insert(forest.end(), 'a').unwrap();
        let b = forest.insert(a, 'b').unwrap();
        let c = forest.insert(b, 'c').unwrap();
        forest.insert(c, 'd').unwrap();
        forest.insert(a, 'e').unwrap();
        forest.insert(forest.end(), 'f').unwrap();

        let copy = forest.try_clone().unwrap();
        assert_eq!(copy, forest);
        assert_eq!(post_order(&copy), post_order(&forest));
        assert_eq!(copy.validate(), Ok(()));
    }

    #[rstest]
    fn assign_replaces_contents(scenario: Scenario) {
        let mut target = LinkedForest::new();
        target.insert(target.end(), 42).unwrap();

        target.assign_from(&scenario.forest).unwrap();
        assert_eq!(target, scenario.forest);
    }

    #[rstest]
    fn moved_from_forest_is_empty_and_usable(mut scenario: Scenario) {
        let moved = std::mem::take(&mut scenario.forest);
        assert_eq!(moved.len(), 6);
        assert!(scenario.forest.is_empty());

        let forest = &mut scenario.forest;
        forest.insert(forest.end(), 1).unwrap();
        assert_eq!(pre_order(forest), [1]);
    }

    #[rstest]
    fn swap_exchanges_contents(mut scenario: Scenario) {
        let mut other = LinkedForest::new();
        other.insert(other.end(), 9).unwrap();

        scenario.forest.swap(&mut other);
        assert_eq!(pre_order(&scenario.forest), [9]);
        assert_eq!(other.len(), 6);
        assert_eq!(other[scenario.at(4)], 4);
    }

    #[test]
    fn equality_ignores_shape_beyond_pre_order() {
        let mut chain = LinkedForest::new();
        let one = chain.insert(chain.end(), 1).unwrap();
        chain.insert(one, 2).unwrap();

        let mut flat = LinkedForest::new();
        flat.insert(flat.end(), 1).unwrap();
        flat.insert(flat.end(), 2).unwrap();

        assert_eq!(chain, flat);
        flat.insert(flat.end(), 3).unwrap();
        assert_ne!(chain, flat);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize),
        Erase(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<usize>().prop_map(Op::Insert),
            1 => any::<usize>().prop_map(Op::Erase),
        ]
    }

    /// Applies random operations, returning the forest and the number of
    /// successful inserts and erases.
    fn build(ops: &[Op]) -> (LinkedForest<usize>, usize, usize) {
        let mut forest = LinkedForest::new();
        let (mut inserted, mut erased) = (0, 0);

        for op in ops {
            match *op {
                Op::Insert(pick) => {
                    let pos = forest
                        .cursors()
                        .nth(pick % (forest.len() + 1))
                        .unwrap_or_else(|| forest.end());
                    forest.insert(pos, inserted).unwrap();
                    inserted += 1;
                }
                Op::Erase(pick) => {
                    let pos = forest.post_order().cursors().nth(pick % (forest.len() + 1));
                    if let Some(pos) = pos {
                        forest.erase(pos).unwrap();
                        erased += 1;
                    }
                }
            }
            assert_eq!(forest.validate(), Ok(()));
        }

        (forest, inserted, erased)
    }

    proptest! {
        #[test]
        fn random_edits_keep_invariants(ops in prop::collection::vec(op(), 0..64)) {
            let (forest, inserted, erased) = build(&ops);
            prop_assert_eq!(forest.len(), inserted - erased);

            let mut pre = pre_order(&forest);
            let mut post = post_order(&forest);
            pre.sort_unstable();
            post.sort_unstable();
            prop_assert_eq!(pre, post);

            for cursor in forest.cursors() {
                let has_children = forest
                    .cursors()
                    .any(|other| forest.parent(other).unwrap() == Some(cursor));
                prop_assert_eq!(forest.is_leaf(cursor).unwrap(), !has_children);

                let level = forest.level(cursor).unwrap();
                match forest.parent(cursor).unwrap() {
                    Some(parent) => {
                        prop_assert_eq!(level, forest.level(parent).unwrap() + 1);
                    }
                    None => {
                        prop_assert_eq!(level, 1);
                    }
                }
            }
        }

        #[test]
        fn copies_match_their_source(ops in prop::collection::vec(op(), 0..64)) {
            let (mut forest, _, _) = build(&ops);
            let copy = forest.try_clone().unwrap();

            prop_assert_eq!(&copy, &forest);
            prop_assert_eq!(post_order(&copy), post_order(&forest));
            prop_assert_eq!(copy.validate(), Ok(()));

            forest.clear();
            prop_assert!(forest.is_empty());
            prop_assert_eq!(copy.len(), copy.iter().count());
        }
    }
}
