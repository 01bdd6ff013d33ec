//! Human readable listing of a forest.
use std::fmt::{self, Display};

use crate::forest::{Cursors, LinkedForest};

/// Displays the size of a forest and its values with their levels, once in
/// pre-order and once in post-order.
///
/// Only uses the public traversal API of [`LinkedForest`].
///
/// # Example
///
/// ```
/// # use tourforest::{Dump, LinkedForest};
/// let mut forest = LinkedForest::new();
/// let root = forest.insert(forest.end(), 1).unwrap();
/// forest.insert(root, 2).unwrap();
///
/// assert_eq!(
///     Dump::new(&forest).to_string(),
///     "Forest has 2 nodes.\nPre order:\n1(l:1) 2(l:2)\nPost order:\n2(l:2) 1(l:1)\n",
/// );
/// ```
pub struct Dump<'a, T> {
    forest: &'a LinkedForest<T>,
}

impl<'a, T> Dump<'a, T> {
    pub fn new(forest: &'a LinkedForest<T>) -> Self {
        Self { forest }
    }

    fn row(&self, f: &mut fmt::Formatter<'_>, cursors: Cursors<'a, T>) -> fmt::Result
    where
        T: Display,
    {
        for (i, cursor) in cursors.enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let level = self.forest.level(cursor).map_err(|_| fmt::Error)?;
            write!(f, "{}(l:{})", self.forest[cursor], level)?;
        }
        writeln!(f)
    }
}

impl<'a, T: Display> Display for Dump<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let forest = self.forest;
        if forest.is_empty() {
            return writeln!(f, "Forest is empty");
        }

        writeln!(f, "Forest has {} nodes.", forest.len())?;
        writeln!(f, "Pre order:")?;
        self.row(f, forest.cursors())?;
        writeln!(f, "Post order:")?;
        self.row(f, forest.post_order().cursors())
    }
}
