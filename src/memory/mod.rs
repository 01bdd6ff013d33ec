//! Arena storage for the nodes of a forest.
//!
//! Nodes refer to each other through small copyable indices instead of
//! pointers. Inspired by the memory management in Cranelift IR.
pub mod slab;

pub use slab::Slab;

/// An index into an arena.
pub trait EntityIndex: Copy + Eq {
    /// Creates an index from a `usize`.
    ///
    /// # Panics
    ///
    /// Panics when `index` does not fit into the backing integer type.
    fn new(index: usize) -> Self {
        match Self::try_new(index) {
            Some(entity) => entity,
            None => panic!("entity index {index} out of range"),
        }
    }

    fn try_new(index: usize) -> Option<Self>;
    fn index(self) -> usize;
}

/// Macro which provides the common implementation of an n-bit entity reference
///
/// Based on [`cranelift_entity`'s `entity_impl!`](https://docs.rs/cranelift-entity/0.89.2/cranelift_entity/macro.entity_impl.html)
#[macro_export]
macro_rules! entity_impl {
    ($entity:ident, $backing:ty) => {
        impl $crate::memory::EntityIndex for $entity {
            #[inline(always)]
            fn try_new(ix: usize) -> Option<Self> {
                if ix <= (<$backing>::MAX as usize) || (<$backing>::BITS) > usize::BITS {
                    Some($entity(ix as $backing))
                } else {
                    None
                }
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}
