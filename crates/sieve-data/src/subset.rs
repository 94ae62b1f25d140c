// Subset: a view of one filter of a DataSource
//
// Holds only a reference to the source and a filter id; every read is
// delegated back to the source. Subsets are created on demand and are
// cheap to copy.

use std::fmt::Debug;

use sieve_core::{Error, Index, Picked, Result};

use crate::config::Options;
use crate::repr::try_coll_repr;
use crate::source::DataSource;

/// Filtered subset `filt` of a [`DataSource`].
pub struct Subset<'a, T> {
    source: &'a DataSource<T>,
    filt: usize,
}

impl<T> Clone for Subset<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Subset<'_, T> {}

impl<'a, T> Subset<'a, T> {
    /// `filt` must name an existing filter of `source`.
    pub(crate) fn new(source: &'a DataSource<T>, filt: usize) -> Self {
        Self { source, filt }
    }

    pub fn filt(&self) -> usize {
        self.filt
    }

    pub fn source(&self) -> &'a DataSource<T> {
        self.source
    }
}

impl<'a, T: Clone + Debug> Subset<'a, T> {
    /// Number of items in this subset.
    pub fn len(&self) -> usize {
        // `filt` is validated when the subset is created.
        let len = self.source.len(self.filt);
        debug_assert!(len.is_ok(), "subset of missing filter {}", self.filt);
        len.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value(s) at `idx` within this subset.
    pub fn get(&self, idx: impl Into<Index>) -> Result<Picked<Vec<T>>> {
        self.source.get(idx, self.filt)
    }

    /// Per-branch outputs of the item at position `i`.
    pub fn at(&self, i: isize) -> Result<Vec<T>> {
        self.source.at(i, self.filt)
    }

    pub fn decode(&self, o: Vec<T>) -> Result<Vec<T>> {
        self.source.decode(o, self.filt, &Options::default())
    }

    /// Lazy iterator over the per-branch outputs of every item, in order.
    pub fn iter(&self) -> SubsetIter<'a, T> {
        SubsetIter {
            subset: *self,
            next: 0,
            len: self.len(),
        }
    }

    /// Lazy iterator over the first output of every item.
    ///
    /// While the pipeline sets up a branch, that output is the one produced
    /// by the branch being set up, which is what setup code wants to see.
    pub fn stream(&self) -> impl Iterator<Item = Result<T>> + 'a {
        self.iter().map(|outputs| {
            outputs?
                .into_iter()
                .next()
                .ok_or_else(|| Error::msg("pipeline has no branches"))
        })
    }

    /// Decode `o` and render it.
    pub fn show(&self, o: Vec<T>, opts: &Options) -> Result<String> {
        self.source.show(o, self.filt, opts)
    }

    /// Render the item at position `i`.
    pub fn show_at(&self, i: isize, opts: &Options) -> Result<String> {
        self.show(self.at(i)?, opts)
    }

    /// Element-wise comparison of this subset's outputs with `other`.
    pub fn equals<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Vec<T>>,
        T: PartialEq,
    {
        let mut theirs = other.into_iter();
        for ours in self.iter() {
            let ours = ours?;
            match theirs.next() {
                Some(o) if ours == o => {}
                _ => return Ok(false),
            }
        }
        Ok(theirs.next().is_none())
    }

    /// Element-wise comparison with another subset (of any source).
    pub fn equals_subset(&self, other: &Subset<'_, T>) -> Result<bool>
    where
        T: PartialEq,
    {
        if self.len() != other.len() {
            return Ok(false);
        }
        for (ours, theirs) in self.iter().zip(other.iter()) {
            if ours? != theirs? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `(<n> items) [..]` summary of the transformed items.
    pub fn describe(&self) -> Result<String> {
        try_coll_repr(self.len(), self.iter(), self.source.config().repr_items)
    }
}

impl<T> Debug for Subset<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subset").field("filt", &self.filt).finish()
    }
}

impl<'a, T: Clone + Debug> IntoIterator for Subset<'a, T> {
    type Item = Result<Vec<T>>;
    type IntoIter = SubsetIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`Subset`]; each item is transformed when pulled.
pub struct SubsetIter<'a, T> {
    subset: Subset<'a, T>,
    next: usize,
    len: usize,
}

impl<'a, T: Clone + Debug> Iterator for SubsetIter<'a, T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.subset.at(self.next as isize);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl<T: Clone + Debug> ExactSizeIterator for SubsetIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::pipeline::Branch;
    use crate::transform::Lambda;

    fn source() -> DataSource<i64> {
        DataSource::new(
            vec![1, 2, 3, 4, 5],
            Branch::new("x").add(Lambda::new("sq", |x: i64| x * x)),
            Some(vec![Filter::from(vec![4usize, 0, 2]), Filter::from(vec![1usize, 3])]),
        )
        .unwrap()
    }

    #[test]
    fn delegates_to_source() {
        let src = source();
        let train = src.train().unwrap();
        assert_eq!(train.filt(), 0);
        assert_eq!(train.len(), 3);
        assert_eq!(train.at(0).unwrap(), vec![25]);
        assert_eq!(train.get(vec![1, 2]).unwrap(), Picked::Many(vec![vec![1], vec![9]]));
    }

    #[test]
    fn iteration_is_restartable() {
        let src = source();
        let valid = src.valid().unwrap();
        let first: Vec<Vec<i64>> = valid.iter().collect::<Result<_>>().unwrap();
        let second: Vec<Vec<i64>> = valid.iter().collect::<Result<_>>().unwrap();
        assert_eq!(first, vec![vec![4], vec![16]]);
        assert_eq!(first, second);
        assert_eq!(valid.iter().len(), 2);
    }

    #[test]
    fn stream_yields_first_output() {
        let src = source();
        let firsts: Vec<i64> = src.train().unwrap().stream().collect::<Result<_>>().unwrap();
        assert_eq!(firsts, vec![25, 1, 9]);
    }

    #[test]
    fn equality() {
        let src = source();
        let valid = src.valid().unwrap();
        assert!(valid.equals(vec![vec![4], vec![16]]).unwrap());
        assert!(!valid.equals(vec![vec![4]]).unwrap());
        assert!(!valid.equals(vec![vec![4], vec![15]]).unwrap());
        assert!(valid.equals_subset(&src.valid().unwrap()).unwrap());
        assert!(!valid.equals_subset(&src.train().unwrap()).unwrap());
    }

    #[test]
    fn describe_is_bounded() {
        let src = DataSource::from_items(0..15i64).unwrap();
        assert_eq!(
            src.train().unwrap().describe().unwrap(),
            "(15 items) [[0],[1],[2],[3],[4],[5],[6],[7],[8],[9]...]"
        );
    }
}
