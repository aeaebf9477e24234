//! Bitset of states, the representation of an active configuration.

use std::fmt;
use std::hash::{Hash, Hasher};

use corral::Key;
use fixedbitset::FixedBitSet;

use crate::graph::StateId;

/// A set of states over the dense index range of one automaton.
/// Equality and hashing only look at members, two sets with different capacities but the same states are equal.
#[derive(Clone, Default)]
pub struct StateSet {
    bits: FixedBitSet,
}

impl StateSet {
    /// Creates an empty set sized for `capacity` states. Inserting beyond it grows the set.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(capacity),
        }
    }

    /// Creates a set holding exactly one state.
    pub fn singleton(state: StateId, capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity);
        set.insert(state);
        set
    }

    /// Inserts a state, returns true if it was not already present.
    pub fn insert(&mut self, state: StateId) -> bool {
        let idx = state.index();
        if idx >= self.bits.len() {
            self.bits.grow(idx + 1);
        }
        !self.bits.put(idx)
    }

    /// Returns true if the state is a member.
    pub fn contains(&self, state: StateId) -> bool {
        self.bits.contains(state.index())
    }

    /// Returns true if no state is a member.
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Number of member states.
    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Iterates over the members in index order.
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.bits.ones().map(StateId::from_index)
    }

    /// Adds every member of `other` to this set.
    pub fn union_with(&mut self, other: &StateSet) {
        if other.bits.len() > self.bits.len() {
            self.bits.grow(other.bits.len());
        }
        self.bits.union_with(&other.bits);
    }

    /// Returns a new set holding the members of both.
    pub fn union(&self, other: &StateSet) -> StateSet {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// Returns true if the two sets share at least one state.
    pub fn intersects(&self, other: &StateSet) -> bool {
        !self.bits.is_disjoint(&other.bits)
    }

    /// Returns true if every member of this set is also in `other`.
    pub fn is_subset(&self, other: &StateSet) -> bool {
        self.iter().all(|state| other.contains(state))
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits.ones().eq(other.bits.ones())
    }
}

impl Eq for StateSet {}

impl Hash for StateSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for idx in self.bits.ones() {
            idx.hash(state);
        }
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        let mut set = StateSet::default();
        set.extend(iter);
        set
    }
}

impl Extend<StateId> for StateSet {
    fn extend<I: IntoIterator<Item = StateId>>(&mut self, iter: I) {
        for state in iter {
            self.insert(state);
        }
    }
}
