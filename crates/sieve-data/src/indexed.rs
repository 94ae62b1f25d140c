// IndexedView: list-like storage addressable by position, position list or mask

use std::fmt;

use sieve_core::index::normalize;
use sieve_core::{Index, Picked, Result};

use crate::repr::{coll_repr, DEFAULT_REPR_ITEMS};

/// An ordered collection that can be indexed by a single position, a list of
/// positions, a boolean mask or a range.
///
/// Multi-index lookups borrow the selected elements in request order; nothing
/// is copied.
///
/// # Examples
/// ```ignore
/// let v = IndexedView::new(vec![10, 20, 30]);
/// assert_eq!(v.get(-1)?, Picked::One(&30));
/// assert_eq!(v.get(vec![true, false, true])?, Picked::Many(vec![&10, &30]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedView<T> {
    items: Vec<T>,
}

impl<T> IndexedView<T> {
    /// Materialize any iterable into a view.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// A view holding exactly one element.
    pub fn single(item: T) -> Self {
        Self { items: vec![item] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    /// Look up one element or a selection of elements.
    pub fn get(&self, idx: impl Into<Index>) -> Result<Picked<&T>> {
        let picked = idx.into().resolve(self.items.len())?;
        Ok(picked.map(|i| &self.items[i]))
    }

    /// The element at a single (possibly negative) position.
    pub fn at(&self, index: isize) -> Result<&T> {
        let i = normalize(index, self.items.len())?;
        Ok(&self.items[i])
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: isize, value: T) -> Result<()> {
        let i = normalize(index, self.items.len())?;
        self.items[i] = value;
        Ok(())
    }

    /// Remove and return the element at `index`, shifting later elements down.
    pub fn delete(&mut self, index: isize) -> Result<T> {
        let i = normalize(index, self.items.len())?;
        Ok(self.items.remove(i))
    }

    /// Element-wise comparison against any iterable; lengths must match.
    pub fn equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator,
        T: PartialEq<I::Item>,
    {
        let mut theirs = other.into_iter();
        for ours in &self.items {
            match theirs.next() {
                Some(o) if *ours == o => {}
                _ => return false,
            }
        }
        theirs.next().is_none()
    }
}

impl<T: fmt::Debug> IndexedView<T> {
    /// `(<n> items) [..]` summary showing at most ten elements.
    pub fn describe(&self) -> String {
        self.describe_n(DEFAULT_REPR_ITEMS)
    }

    pub fn describe_n(&self, max: usize) -> String {
        coll_repr(self.items.len(), &self.items, max)
    }
}

impl<T: fmt::Debug> fmt::Display for IndexedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexedView {}", self.describe())
    }
}

impl<T> Default for IndexedView<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> From<Vec<T>> for IndexedView<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> From<Option<T>> for IndexedView<T> {
    fn from(item: Option<T>) -> Self {
        Self {
            items: item.into_iter().collect(),
        }
    }
}

impl<T> FromIterator<T> for IndexedView<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T> IntoIterator for IndexedView<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a IndexedView<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for IndexedView<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.items == *other
    }
}

impl<T: PartialEq> PartialEq<[T]> for IndexedView<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items == other
    }
}
