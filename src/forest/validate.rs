use bitvec::prelude::*;
use thiserror::Error;
use tracing::warn;

use super::node::{Marker, MarkerRef};
use super::LinkedForest;
use crate::memory::EntityIndex;
use crate::{Direction, NodeIndex};

impl<T> LinkedForest<T> {
    /// Checks the structural invariants of the forest.
    ///
    /// Walks the full marker cycle once, starting at the header's entry
    /// marker, and verifies that
    ///
    ///  - every link points at an occupied slot and is mirrored by the
    ///    opposite link of its target,
    ///  - every marker is visited exactly once and the cycle holds both
    ///    markers of every node,
    ///  - the markers nest properly and each node's stored parent is the node
    ///    whose markers enclose it,
    ///  - each node's level is one more than its parent's.
    ///
    /// This is meant for tests and debugging; it allocates a bit per marker
    /// and a stack as deep as the forest.
    ///
    /// # Errors
    ///
    /// Reports the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let result = self.check_tour();
        if let Err(err) = &result {
            warn!(%err, "forest failed validation");
        }
        result
    }

    fn check_tour(&self) -> Result<(), ValidationError> {
        let slots = self.nodes.capacity_used();
        let mut visited = bitvec![0; slots * 2];
        let mut open = vec![self.header];

        let start = MarkerRef::new(self.header, Marker::Entry);
        visited.set(marker_bit(start), true);
        let mut current = start;
        let mut count = 1;

        loop {
            let next = self.nodes[current.node].pass(current.marker).link(Direction::Forward);
            let Some(target) = self.nodes.get(next.node) else {
                return Err(ValidationError::Dangling(current.node));
            };
            if target.pass(next.marker).link(Direction::Backward) != current {
                return Err(ValidationError::BrokenLink(current.node));
            }

            current = next;
            if current == start {
                break;
            }
            if visited.replace(marker_bit(current), true) {
                return Err(ValidationError::Revisited(current.node));
            }
            count += 1;

            match current.marker {
                Marker::Entry => {
                    let Some(&enclosing) = open.last() else {
                        return Err(ValidationError::Nesting(current.node));
                    };
                    if target.parent != Some(enclosing) {
                        return Err(ValidationError::Parent(current.node));
                    }
                    let parent_level = self.nodes[enclosing].level;
                    if target.level != parent_level + 1 {
                        return Err(ValidationError::Level {
                            node: current.node,
                            level: target.level,
                            parent_level,
                        });
                    }
                    open.push(current.node);
                }
                Marker::Exit => {
                    if open.pop() != Some(current.node) {
                        return Err(ValidationError::Nesting(current.node));
                    }
                }
            }
        }

        let expected = self.nodes.len() * 2;
        if count != expected || !open.is_empty() {
            return Err(ValidationError::CycleLength {
                expected,
                found: count,
            });
        }

        Ok(())
    }
}

#[inline]
fn marker_bit(marker: MarkerRef) -> usize {
    marker.node.index() * 2 + marker.marker.index()
}

/// A broken structural invariant found by [`LinkedForest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a marker of {0:?} links to a free slot")]
    Dangling(NodeIndex),
    #[error("the forward link of a marker of {0:?} is not mirrored by a backward link")]
    BrokenLink(NodeIndex),
    #[error("a marker of {0:?} is reached twice")]
    Revisited(NodeIndex),
    #[error("the markers of {0:?} are not properly nested")]
    Nesting(NodeIndex),
    #[error("{0:?} is not enclosed by the markers of its stored parent")]
    Parent(NodeIndex),
    #[error("{node:?} has level {level} below a parent on level {parent_level}")]
    Level {
        node: NodeIndex,
        level: u32,
        parent_level: u32,
    },
    #[error("the marker cycle holds {found} markers instead of {expected}")]
    CycleLength { expected: usize, found: usize },
}
