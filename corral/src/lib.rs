#![warn(missing_docs)]

//! Typed Index Arena
//!
//! Values are pushed into one growable block and addressed by small `Copy` keys instead of references,
//! so graphs with cycles and self references can be built without `unsafe` or interior mutability.
//! Nothing is ever removed, a key handed out by an arena stays valid for the whole life of that arena.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A handle type usable as a key into an [`Arena`]. Use the [`key!`] macro to declare one.
pub trait Key: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Builds a key from its dense index.
    fn from_index(index: usize) -> Self;
    /// Returns the dense index of the key.
    fn index(self) -> usize;
}

/// Declares a `u32` backed newtype implementing [`Key`].
#[macro_export]
macro_rules! key {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $crate::Key for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                assert!(index <= u32::MAX as usize, "arena index overflowed u32");
                Self(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

/// One time use arena, values only ever get appended.
/// Useful for many values with the same lifetime which need to reference each other.
pub struct Arena<K: Key, T> {
    slots: Vec<T>,
    _boo: PhantomData<K>,
}

impl<K: Key, T> Arena<K, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty arena with room for `capacity` values before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            _boo: PhantomData,
        }
    }

    /// Moves the value into the arena, returns the key it can be found under.
    pub fn alloc(&mut self, value: T) -> K {
        let key = K::from_index(self.slots.len());
        self.slots.push(value);
        key
    }

    /// Returns true if the key was handed out by an arena of this length.
    pub fn contains(&self, key: K) -> bool {
        key.index() < self.slots.len()
    }

    /// Returns the value behind the key, None if the key is out of range.
    pub fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key.index())
    }

    /// Mutable version of [`Arena::get`].
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key.index())
    }

    /// Number of values stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing was allocated yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all keys, in allocation order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = K> + use<K, T> {
        (0..self.slots.len()).map(K::from_index)
    }

    /// Iterates over all `(key, value)` pairs, in allocation order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (K, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, value)| (K::from_index(i), value))
    }
}

impl<K: Key, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T: Clone> Clone for Arena<K, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            _boo: PhantomData,
        }
    }
}

impl<K: Key, T: fmt::Debug> fmt::Debug for Arena<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Panics if the key did not come from this arena.
impl<K: Key, T> Index<K> for Arena<K, T> {
    type Output = T;

    fn index(&self, key: K) -> &T {
        &self.slots[key.index()]
    }
}

impl<K: Key, T> IndexMut<K> for Arena<K, T> {
    fn index_mut(&mut self, key: K) -> &mut T {
        &mut self.slots[key.index()]
    }
}

// MARK: Tests
#[cfg(test)]
mod test {
    use super::*;

    key!(struct Slot;);

    #[test]
    fn test_isolated_arena() {
        let mut arena = Arena::<Slot, i32>::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        let c = arena.alloc(3);
        assert_eq!(arena[a], 1);
        assert_eq!(arena[b], 2);
        assert_eq!(arena[c], 3);
        assert_eq!(arena.len(), 3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_self_reference() {
        struct Node {
            next: Option<Slot>,
        }

        let mut arena = Arena::<Slot, Node>::new();
        let a = arena.alloc(Node { next: None });
        let b = arena.alloc(Node { next: Some(a) });
        arena[a].next = Some(b);

        let mut cur = a;
        for _ in 0..4 {
            cur = arena[cur].next.unwrap();
        }
        assert_eq!(cur, a);
    }

    #[test]
    fn test_keys_follow_allocation_order() {
        let mut arena = Arena::<Slot, char>::with_capacity(4);
        for c in "abcd".chars() {
            arena.alloc(c);
        }
        let keys: Vec<usize> = arena.keys().map(Key::index).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
        let values: String = arena.iter().map(|(_, c)| *c).collect();
        assert_eq!(values, "abcd");
    }

    #[test]
    fn test_foreign_key() {
        let mut small = Arena::<Slot, u8>::new();
        small.alloc(0);
        let mut big = Arena::<Slot, u8>::new();
        big.alloc(0);
        let far = big.alloc(1);

        assert!(!small.contains(far));
        assert!(small.get(far).is_none());
        assert_eq!(format!("{far:?}"), "Slot(1)");
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_range() {
        let mut small = Arena::<Slot, u8>::new();
        small.alloc(0);
        let _ = small[Slot::from_index(5)];
    }
}
