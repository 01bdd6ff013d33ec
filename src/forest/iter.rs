use std::iter::FusedIterator;

use super::traverse::{step, Cursor, Order};
use super::LinkedForest;
use crate::{Direction, NodeIndex};

/// Iterator over the positions of a forest in a traversal order.
///
/// Created by [`LinkedForest::cursors`] and [`PostOrder::cursors`].
pub struct Cursors<'a, T> {
    forest: &'a LinkedForest<T>,
    front: NodeIndex,
    back: NodeIndex,
    order: Order,
    len: usize,
}

impl<'a, T> Cursors<'a, T> {
    pub(crate) fn new(forest: &'a LinkedForest<T>, order: Order) -> Self {
        let header = forest.header;
        Self {
            forest,
            front: step(&forest.nodes, header, order, Direction::Forward),
            back: step(&forest.nodes, header, order, Direction::Backward),
            order,
            len: forest.len(),
        }
    }

    #[inline]
    fn advance(&self, node: NodeIndex, direction: Direction) -> NodeIndex {
        step(&self.forest.nodes, node, self.order, direction)
    }
}

impl<'a, T> Clone for Cursors<'a, T> {
    fn clone(&self) -> Self {
        Self {
            forest: self.forest,
            front: self.front,
            back: self.back,
            order: self.order,
            len: self.len,
        }
    }
}

impl<'a, T> Iterator for Cursors<'a, T> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        let current = self.front;
        self.front = self.advance(current, Direction::Forward);
        Some(self.forest.cursor_at(current, self.order))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Cursors<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        let current = self.back;
        self.back = self.advance(current, Direction::Backward);
        Some(self.forest.cursor_at(current, self.order))
    }
}

impl<'a, T> ExactSizeIterator for Cursors<'a, T> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, T> FusedIterator for Cursors<'a, T> {}

/// Iterator over the values of a forest in a traversal order.
///
/// Created by [`LinkedForest::iter`] and [`PostOrder::iter`].
pub struct Iter<'a, T> {
    cursors: Cursors<'a, T>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(forest: &'a LinkedForest<T>, order: Order) -> Self {
        Self {
            cursors: Cursors::new(forest, order),
        }
    }

    #[inline]
    fn value(&self, cursor: Cursor) -> &'a T {
        // Cursors only ever yield occupied non-header nodes.
        let forest: &'a LinkedForest<T> = self.cursors.forest;
        &forest[cursor]
    }
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            cursors: self.cursors.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursors.next()?;
        Some(self.value(cursor))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursors.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let cursor = self.cursors.next_back()?;
        Some(self.value(cursor))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.cursors.len()
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

/// Post-order view of a forest.
///
/// Shares the forest's storage; only the order in which the markers are read
/// differs from the forest's own pre-order accessors.
pub struct PostOrder<'a, T> {
    forest: &'a LinkedForest<T>,
}

impl<'a, T> Clone for PostOrder<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for PostOrder<'a, T> {}

impl<'a, T> PostOrder<'a, T> {
    pub(crate) fn new(forest: &'a LinkedForest<T>) -> Self {
        Self { forest }
    }

    /// The position past the last node, which is also the position before the
    /// first one.
    #[inline]
    pub fn end(&self) -> Cursor {
        self.forest.end_in(Order::PostOrder)
    }

    /// The first node in post-order, or [`PostOrder::end`] for an empty forest.
    #[inline]
    pub fn begin(&self) -> Cursor {
        self.forest.begin_in(Order::PostOrder)
    }

    #[inline]
    pub fn iter(&self) -> Iter<'a, T> {
        Iter::new(self.forest, Order::PostOrder)
    }

    #[inline]
    pub fn cursors(&self) -> Cursors<'a, T> {
        Cursors::new(self.forest, Order::PostOrder)
    }
}

impl<'a, T> IntoIterator for PostOrder<'a, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a LinkedForest<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
