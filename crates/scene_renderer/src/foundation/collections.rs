//! Specialized collection types

/// Free list for slot reuse
///
/// Removed entries leave a `None` tombstone in place so that the indices of
/// every other entry stay stable; the freed index is handed out again by the
/// next insert.
#[derive(Debug)]
pub struct FreeList<T> {
    items: Vec<Option<T>>,
    free_indices: Vec<usize>,
}

impl<T> FreeList<T> {
    /// Create a new free list
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_indices: Vec::new(),
        }
    }

    /// Insert an item and return its index
    pub fn insert(&mut self, item: T) -> usize {
        if let Some(index) = self.free_indices.pop() {
            self.items[index] = Some(item);
            index
        } else {
            let index = self.items.len();
            self.items.push(Some(item));
            index
        }
    }

    /// Remove an item by index
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.free_indices.push(index);
        Some(item)
    }

    /// Get an item by index
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_ref()
    }

    /// Get a mutable reference to an item by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)?.as_mut()
    }

    /// Number of slots, live or tombstoned
    pub fn slot_count(&self) -> usize {
        self.items.len()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len() - self.free_indices.len()
    }

    /// Whether no live items remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw slot view, tombstones included
    pub fn slots(&self) -> &[Option<T>] {
        &self.items
    }

    /// Mutable raw slot view, tombstones included
    pub fn slots_mut(&mut self) -> &mut [Option<T>] {
        &mut self.items
    }
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}
