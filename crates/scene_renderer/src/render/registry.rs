//! Handle registry and generic entity store
//!
//! Every entity lives in a [`Store`] slot and is addressed from outside only
//! through a [`Handle`]. Handles carry a per-store id drawn from a monotonic
//! counter; a translation table maps live ids to their current slot. Slots
//! are reused after deletion, ids never are, so a deleted handle stays
//! invalid forever instead of silently resolving to a newer entity.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Range;

use crate::foundation::collections::FreeList;
use super::{RenderError, RenderResult};

/// Entity kinds that can live in a [`Store`]
pub trait Entity {
    /// Kind name used in error reports
    const KIND: &'static str;
}

/// Opaque, typed reference to an entity
pub struct Handle<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn from_id(id: u64) -> Self {
        Self { id, _marker: PhantomData }
    }

    /// Raw id, unique within the issuing store
    pub const fn id(self) -> u64 {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Entity> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::KIND, self.id)
    }
}

/// Slot storage for one entity kind
#[derive(Debug)]
pub struct Store<T> {
    slots: FreeList<T>,
    slot_ids: Vec<u64>,
    translation: HashMap<u64, usize>,
    next_id: u64,
}

impl<T: Entity> Store<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slots: FreeList::new(),
            slot_ids: Vec::new(),
            translation: HashMap::new(),
            next_id: 0,
        }
    }

    /// Insert a record and issue a fresh handle for it
    pub fn add(&mut self, record: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;

        let slot = self.slots.insert(record);
        if slot == self.slot_ids.len() {
            self.slot_ids.push(id);
        } else {
            self.slot_ids[slot] = id;
        }
        self.translation.insert(id, slot);

        log::trace!("Added {} {} in slot {}", T::KIND, id, slot);
        Handle::from_id(id)
    }

    /// Current slot of a live handle
    pub fn resolve(&self, handle: Handle<T>) -> RenderResult<usize> {
        self.translation
            .get(&handle.id)
            .copied()
            .filter(|&slot| self.slots.get(slot).is_some())
            .ok_or(RenderError::InvalidHandle { kind: T::KIND, id: handle.id })
    }

    /// Whether the handle still refers to a live entity
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Borrow a live entity
    pub fn get(&self, handle: Handle<T>) -> RenderResult<&T> {
        let slot = self.resolve(handle)?;
        self.slots
            .get(slot)
            .ok_or(RenderError::InvalidHandle { kind: T::KIND, id: handle.id })
    }

    /// Mutably borrow a live entity
    pub fn get_mut(&mut self, handle: Handle<T>) -> RenderResult<&mut T> {
        let slot = self.resolve(handle)?;
        self.slots
            .get_mut(slot)
            .ok_or(RenderError::InvalidHandle { kind: T::KIND, id: handle.id })
    }

    /// Remove an entity, returning its record so owned resources can be released
    pub fn remove(&mut self, handle: Handle<T>) -> RenderResult<T> {
        let slot = self.resolve(handle)?;
        self.translation.remove(&handle.id);
        let record = self
            .slots
            .remove(slot)
            .ok_or(RenderError::InvalidHandle { kind: T::KIND, id: handle.id })?;

        log::trace!("Removed {} {} from slot {}", T::KIND, handle.id, slot);
        Ok(record)
    }

    /// Handle of the entity occupying a slot
    pub fn handle_at(&self, slot: usize) -> Option<Handle<T>> {
        self.slots.get(slot)?;
        Some(Handle::from_id(self.slot_ids[slot]))
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no live entity
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots, live or free; the upper bound of every update range
    pub fn slot_count(&self) -> usize {
        self.slots.slot_count()
    }

    /// Full slot range
    pub fn full_range(&self) -> Range<usize> {
        0..self.slot_count()
    }

    /// Reject ranges outside `0 <= start <= end <= slot_count`
    pub fn check_range(&self, range: &Range<usize>) -> RenderResult<()> {
        let count = self.slot_count();
        if range.start <= range.end && range.end <= count {
            Ok(())
        } else {
            Err(RenderError::InvalidRange { start: range.start, end: range.end, count })
        }
    }

    /// All slots, free ones as `None`
    pub fn slots(&self) -> &[Option<T>] {
        self.slots.slots()
    }

    /// Mutable view of a checked slot range
    pub fn slots_mut(&mut self, range: Range<usize>) -> RenderResult<&mut [Option<T>]> {
        self.check_range(&range)?;
        Ok(&mut self.slots.slots_mut()[range])
    }

    /// Live entities with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| {
                record.as_ref().map(|r| (Handle::from_id(self.slot_ids[slot]), r))
            })
    }

    /// Live entities, mutably, in slot order
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.slots_mut().iter_mut().flatten()
    }
}

impl<T: Entity> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Dummy(u32);

    impl Entity for Dummy {
        const KIND: &'static str = "dummy";
    }

    #[test]
    fn test_handles_survive_other_deletions() {
        let mut store = Store::new();
        let handles: Vec<_> = (0..8).map(|i| store.add(Dummy(i))).collect();

        for handle in handles.iter().step_by(2) {
            store.remove(*handle).unwrap();
        }
        // Refill freed slots; survivors must still see their own records.
        for i in 100..104 {
            store.add(Dummy(i));
        }

        for (i, handle) in handles.iter().enumerate().skip(1).step_by(2) {
            assert_eq!(store.get(*handle).unwrap(), &Dummy(i as u32));
        }
        assert_eq!(store.len(), 8);
        assert_eq!(store.slot_count(), 8);
    }

    #[test]
    fn test_deleted_handle_never_aliases() {
        let mut store = Store::new();
        let first = store.add(Dummy(1));
        store.remove(first).unwrap();
        let second = store.add(Dummy(2));

        assert_ne!(first, second);
        assert_eq!(store.resolve(second).unwrap(), 0);
        assert!(matches!(
            store.get(first),
            Err(RenderError::InvalidHandle { kind: "dummy", id: 0 })
        ));
        assert!(!store.is_valid(first));
        assert!(store.remove(first).is_err());
    }

    #[test]
    fn test_range_checks() {
        let mut store = Store::new();
        store.add(Dummy(0));
        store.add(Dummy(1));

        assert!(store.slots_mut(0..2).is_ok());
        assert!(store.slots_mut(2..2).is_ok());
        assert!(matches!(
            store.slots_mut(1..3),
            Err(RenderError::InvalidRange { start: 1, end: 3, count: 2 })
        ));
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 2..1;
        assert!(store.check_range(&reversed).is_err());
    }

    #[test]
    fn test_iter_reports_live_handles_in_slot_order() {
        let mut store = Store::new();
        let a = store.add(Dummy(0));
        let b = store.add(Dummy(1));
        let c = store.add(Dummy(2));
        store.remove(b).unwrap();

        let seen: Vec<_> = store.iter().map(|(h, _)| h).collect();
        assert_eq!(seen, vec![a, c]);
        assert_eq!(store.handle_at(1), None);
        assert_eq!(store.handle_at(2), Some(c));
    }
}
