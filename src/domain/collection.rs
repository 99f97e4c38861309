//! Ordered, index-addressable container used throughout the object model.
//!
//! Certificate lists, revoked entries, signers and attributes all live in
//! `ItemCollection`s. Indices are positional, not stable identifiers: any
//! removal shifts the indices of the elements after it.

use crate::infra::error::{PkiError, PkiResult};

/// Generic ordered collection with bounds-checked positional access.
///
/// The collection owns its elements. `pop` and `remove_at` hand the removed
/// element back to the caller by value, so an element is destroyed on removal
/// unless the caller keeps it.
#[derive(Debug)]
pub struct ItemCollection<T> {
    items: Vec<T>,
}

impl<T> ItemCollection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends an element at the end. Amortized O(1).
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Removes and returns the last element.
    ///
    /// # Errors
    /// `PkiError::EmptyCollection` if the collection has no elements.
    pub fn pop(&mut self) -> PkiResult<T> {
        self.items.pop().ok_or(PkiError::EmptyCollection)
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// down by one position.
    ///
    /// # Errors
    /// `PkiError::IndexOutOfRange` if `index` is not in `[0, len)`.
    pub fn remove_at(&mut self, index: usize) -> PkiResult<T> {
        if index >= self.items.len() {
            return Err(PkiError::IndexOutOfRange {
                index,
                length: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    /// `PkiError::IndexOutOfRange` if `index` is not in `[0, len)`.
    pub fn items(&self, index: usize) -> PkiResult<&T> {
        let length = self.items.len();
        self.items
            .get(index)
            .ok_or(PkiError::IndexOutOfRange { index, length })
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Errors
    /// `PkiError::IndexOutOfRange` if `index` is not in `[0, len)`.
    pub fn items_mut(&mut self, index: usize) -> PkiResult<&mut T> {
        let length = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(PkiError::IndexOutOfRange { index, length })
    }

    /// Number of elements currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the collection holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the elements in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for ItemCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ItemCollection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<'a, T> IntoIterator for &'a ItemCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
