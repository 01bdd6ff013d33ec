use std::{
    collections::TryReserveError,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::memory::EntityIndex;

/// A slab arena that manages fixed-sized objects.
///
/// Freed slots are kept in an intrusive free list and handed out again by
/// later insertions, so indices stay small and stable for the lifetime of the
/// value they point to. Every slot counts how often it has been freed; a key
/// paired with that generation tells a value apart from later occupants of
/// the same slot.
#[derive(Debug, Clone)]
pub struct Slab<K, V> {
    data: Vec<Slot<V>>,
    free: usize,
    len: usize,
    phantom: PhantomData<K>,
}

impl<K, V> Slab<K, V>
where
    K: EntityIndex,
{
    /// Creates an empty [`Slab<K, V>`].
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            free: 0,
            len: 0,
            phantom: PhantomData,
        }
    }

    /// Returns the number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there is no stored value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the generation of an occupied slot, or `None` for a free one.
    ///
    /// The generation wraps around after `u32::MAX` removals from the slot.
    #[inline]
    pub fn generation(&self, key: K) -> Option<u32> {
        match self.data.get(key.index()) {
            Some(Slot {
                generation,
                entry: Entry::Full(_),
            }) => Some(*generation),
            _ => None,
        }
    }

    /// Makes sure that at least `additional` more values can be inserted
    /// without reallocating.
    ///
    /// Slots on the free list count towards the available space.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error when the backing buffer can not grow. The
    /// slab is left unchanged in that case.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let vacant = self.data.len() - self.len;
        match additional.checked_sub(vacant) {
            Some(missing) if missing > 0 => self.data.try_reserve(missing),
            _ => Ok(()),
        }
    }

    /// Returns the key that the next call to [`Slab::insert`] will return.
    ///
    /// Values that refer to their own key can be built with it before they are
    /// stored.
    ///
    /// # Panics
    ///
    /// Panics when the slab would hold more slots than `K` can address.
    #[inline]
    pub fn vacant_key(&self) -> K {
        K::new(self.free)
    }

    /// Stores a value and returns its key.
    ///
    /// # Panics
    ///
    /// Panics when the slab would hold more slots than `K` can address.
    pub fn insert(&mut self, value: V) -> K {
        let index = self.free;

        if index == self.data.len() {
            self.data.push(Slot {
                generation: 0,
                entry: Entry::Full(value),
            });
            self.free += 1;
        } else {
            let slot = &mut self.data[index];
            let Entry::Free(next) = slot.entry else { unreachable!() };
            self.free = next;
            slot.entry = Entry::Full(value);
        }

        self.len += 1;

        K::new(index)
    }

    /// Removes a value and advances the generation of its slot.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = key.index();
        let slot = self.data.get_mut(index)?;

        if let Entry::Free(_) = slot.entry {
            return None;
        }

        let Entry::Full(value) = std::mem::replace(&mut slot.entry, Entry::Free(self.free)) else {
            unreachable!()
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free = index;
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        match self.data.get(key.index()) {
            Some(Slot {
                entry: Entry::Full(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        match self.data.get_mut(key.index()) {
            Some(Slot {
                entry: Entry::Full(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Returns the number of slots, occupied or free.
    #[inline]
    pub fn capacity_used(&self) -> usize {
        self.data.len()
    }
}

impl<K, V> Index<K> for Slab<K, V>
where
    K: EntityIndex,
{
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key).expect("invalid key")
    }
}

impl<K, V> IndexMut<K> for Slab<K, V>
where
    K: EntityIndex,
{
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key).expect("invalid key")
    }
}

impl<K, V> Default for Slab<K, V>
where
    K: EntityIndex,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Slot<V> {
    generation: u32,
    entry: Entry<V>,
}

#[derive(Debug, Clone)]
enum Entry<V> {
    Free(usize),
    Full(V),
}
