//! Authoritative bookkeeping of live actors.

use std::{collections::BTreeMap, fmt};

use horde_core::Vec3;

/// Actor that can be stored in a [`Registry`].
pub trait Member {
    /// Identifier the actor is keyed by.
    type Id: Copy + Ord;

    /// Identifier of the actor.
    fn id(&self) -> Self::Id;

    /// Current world position of the actor.
    fn position(&self) -> Vec3;
}

/// Live set of actors keyed by identity.
///
/// Range queries return copies, so callers may mutate the registry while
/// holding a query result.
pub struct Registry<T: Member> {
    entries: BTreeMap<T::Id, T>,
}

impl<T: Member> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Member> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl<T: Member> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds the member, refusing identities that are already registered.
    ///
    /// Returns `false` and leaves the registry untouched for duplicates.
    pub fn register(&mut self, member: T) -> bool {
        let id = member.id();
        if self.entries.contains_key(&id) {
            return false;
        }
        let _ = self.entries.insert(id, member);
        true
    }

    /// Removes the member if present. Absent identities are ignored.
    pub fn deregister(&mut self, id: T::Id) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Number of registered members.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the identity is registered.
    #[must_use]
    pub fn contains(&self, id: T::Id) -> bool {
        self.entries.contains_key(&id)
    }

    /// Shared access to a member.
    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.get(&id)
    }

    /// Exclusive access to a member.
    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// Iterates members in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Iterates members mutably in ascending identity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    /// Identities of members strictly closer than `radius` to `point`.
    #[must_use]
    pub fn within_radius(&self, point: Vec3, radius: f32) -> Vec<T::Id> {
        self.entries
            .values()
            .filter(|member| member.position().distance(point) < radius)
            .map(Member::id)
            .collect()
    }

    /// Removes every member without notifying anyone.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
