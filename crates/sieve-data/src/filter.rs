// Filters: named index subsets over a shared item collection
//
// Subset 0 is the training subset and subset 1 the validation subset by
// convention. Filters hold raw indices only; nothing is copied out of the
// item collection, and indices are checked when they are read, not here.

use std::ops::Range;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use sieve_core::index::mask_positions;
use sieve_core::{bail, Error, Index, Picked, Result};

use crate::indexed::IndexedView;

/// One filter definition: explicit raw indices, or a mask over all items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Raw indices, taken as-is and in order.
    Indices(Vec<usize>),
    /// One flag per item; selects the positions that are `true`.
    Mask(Vec<bool>),
}

impl From<Vec<usize>> for Filter {
    fn from(idxs: Vec<usize>) -> Self {
        Filter::Indices(idxs)
    }
}

impl From<Vec<bool>> for Filter {
    fn from(mask: Vec<bool>) -> Self {
        Filter::Mask(mask)
    }
}

impl From<Range<usize>> for Filter {
    fn from(r: Range<usize>) -> Self {
        Filter::Indices(r.collect())
    }
}

/// The ordered set of filters of a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    filts: Vec<IndexedView<usize>>,
}

impl FilterSet {
    /// Build the filters for a collection of `item_count` items.
    ///
    /// `None` yields one filter covering every item in order. Masks must have
    /// exactly `item_count` entries.
    pub fn new(filts: Option<Vec<Filter>>, item_count: usize) -> Result<Self> {
        let Some(filts) = filts else {
            return Ok(Self::full(item_count));
        };
        if filts.is_empty() {
            return Err(Error::NoFilters);
        }
        let filts = filts
            .into_iter()
            .map(|f| match f {
                Filter::Indices(idxs) => Ok(IndexedView::from(idxs)),
                Filter::Mask(mask) => {
                    if mask.len() != item_count {
                        return Err(Error::LengthMismatch {
                            expected: item_count,
                            got: mask.len(),
                        });
                    }
                    Ok(IndexedView::from(mask_positions(&mask)))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filts })
    }

    /// A single filter selecting `0..item_count`.
    pub fn full(item_count: usize) -> Self {
        Self {
            filts: vec![IndexedView::new(0..item_count)],
        }
    }

    /// Number of filters.
    pub fn count(&self) -> usize {
        self.filts.len()
    }

    /// The raw indices of filter `filt`.
    pub fn get(&self, filt: usize) -> Result<&IndexedView<usize>> {
        self.filts.get(filt).ok_or(Error::FilterOutOfRange {
            filt,
            count: self.filts.len(),
        })
    }

    /// Number of items selected by filter `filt`.
    pub fn size(&self, filt: usize) -> Result<usize> {
        Ok(self.get(filt)?.len())
    }

    /// Map a logical index within subset `filt` to raw item index(es).
    pub fn resolve(&self, filt: usize, idx: impl Into<Index>) -> Result<Picked<usize>> {
        Ok(self.get(filt)?.get(idx)?.map(|&raw| raw))
    }

    /// Raw item index of logical position `i` within subset `filt`.
    pub fn raw_index(&self, filt: usize, i: isize) -> Result<usize> {
        self.get(filt)?.at(i).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexedView<usize>> {
        self.filts.iter()
    }
}

/// Split `0..item_count` into shuffled, disjoint index filters.
///
/// Returns one [`Filter::Indices`] per ratio; pass them straight to
/// `DataSource::new`. The last filter receives the rounding remainder.
///
/// # Arguments
/// * `item_count` - number of items to split
/// * `ratios` - 2 or 3 floats that sum to 1.0, e.g. `[0.8, 0.2]`
/// * `seed` - random seed for reproducible shuffling
pub fn random_split(item_count: usize, ratios: &[f64], seed: u64) -> Result<Vec<Filter>> {
    if !(2..=3).contains(&ratios.len()) {
        bail!(
            "random_split: ratios must have 2 or 3 elements, got {}",
            ratios.len()
        );
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() > 1e-6 {
        bail!("random_split: ratios must sum to 1.0, got {}", sum);
    }

    let mut indices: Vec<usize> = (0..item_count).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut splits = Vec::with_capacity(ratios.len());
    let mut offset = 0;
    for (i, &ratio) in ratios.iter().enumerate() {
        let count = if i == ratios.len() - 1 {
            item_count - offset
        } else {
            (item_count as f64 * ratio).round() as usize
        };
        let end = (offset + count).min(item_count);
        splits.push(Filter::Indices(indices[offset..end].to_vec()));
        offset = end;
    }
    debug!(
        "random_split: {} items into {:?} (seed {seed})",
        item_count,
        splits
            .iter()
            .map(|f| match f {
                Filter::Indices(v) => v.len(),
                Filter::Mask(m) => m.len(),
            })
            .collect::<Vec<_>>()
    );
    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_full_range() {
        let fs = FilterSet::new(None, 4).unwrap();
        assert_eq!(fs.count(), 1);
        assert_eq!(fs.size(0).unwrap(), 4);
        assert_eq!(*fs.get(0).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn masks_become_positions() {
        let fs = FilterSet::new(
            Some(vec![
                vec![true, false, true, false].into(),
                vec![false, true, false, true].into(),
            ]),
            4,
        )
        .unwrap();
        assert_eq!(*fs.get(0).unwrap(), vec![0, 2]);
        assert_eq!(*fs.get(1).unwrap(), vec![1, 3]);
    }

    #[test]
    fn indices_are_kept_verbatim() {
        let fs = FilterSet::new(Some(vec![vec![3usize, 3, 0].into()]), 4).unwrap();
        assert_eq!(*fs.get(0).unwrap(), vec![3, 3, 0]);
        // not validated until read
        let fs = FilterSet::new(Some(vec![vec![99usize].into()]), 4).unwrap();
        assert_eq!(fs.raw_index(0, 0).unwrap(), 99);
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(FilterSet::new(Some(vec![]), 3), Err(Error::NoFilters)));
        assert!(matches!(
            FilterSet::new(Some(vec![vec![true, false].into()]), 3),
            Err(Error::LengthMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn resolve_scalar_and_multi() {
        let fs = FilterSet::new(Some(vec![Filter::from(2..6)]), 6).unwrap();
        assert_eq!(fs.resolve(0, 1).unwrap(), Picked::One(3));
        assert_eq!(fs.resolve(0, -1).unwrap(), Picked::One(5));
        assert_eq!(fs.resolve(0, vec![0, 3]).unwrap(), Picked::Many(vec![2, 5]));
        assert!(matches!(
            fs.resolve(1, 0),
            Err(Error::FilterOutOfRange { filt: 1, count: 1 })
        ));
        assert!(matches!(
            fs.resolve(0, 4),
            Err(Error::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn random_split_two_way() {
        let splits = random_split(100, &[0.8, 0.2], 42).unwrap();
        let fs = FilterSet::new(Some(splits), 100).unwrap();
        assert_eq!(fs.size(0).unwrap(), 80);
        assert_eq!(fs.size(1).unwrap(), 20);
        let mut all: Vec<usize> = fs.iter().flat_map(|f| f.iter().copied()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn random_split_three_way_and_reproducible() {
        let a = random_split(50, &[0.7, 0.15, 0.15], 123).unwrap();
        let b = random_split(50, &[0.7, 0.15, 0.15], 123).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
        let c = random_split(50, &[0.7, 0.15, 0.15], 7).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn random_split_rejects_bad_ratios() {
        assert!(random_split(10, &[1.0], 0).is_err());
        assert!(random_split(10, &[0.5, 0.2], 0).is_err());
    }
}
