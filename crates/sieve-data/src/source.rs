// DataSource: filtered, transformed access to an in-memory item collection
//
// A read at (filt, i) resolves the logical index i through filter `filt`
// to a raw index, fetches that item and runs it through the pipeline:
//
//   logical idx --FilterSet--> raw idx --IndexedView--> item --Pipeline--> outputs
//
// Construction happens in two phases. `build` wires items, filters and the
// pipeline; `initialize` then runs pipeline setup against the finished
// source, so transforms may read any subset (normally the training one)
// while they collect statistics.

use std::fmt::Debug;

use log::debug;

use sieve_core::{Error, Index, Picked, Result};

use crate::config::{Options, SourceConfig};
use crate::filter::{Filter, FilterSet};
use crate::indexed::IndexedView;
use crate::pipeline::Pipeline;
use crate::subset::Subset;

/// Applies a [`Pipeline`] of transforms to filtered subsets of `items`.
///
/// # Example
/// ```ignore
/// let filters = random_split(samples.len(), &[0.8, 0.2], 42)?;
/// let pipeline = Pipeline::new(vec![
///     Branch::new("x").add(Normalize::new()),
///     Branch::new("y").add(Categorize::new()),
/// ]);
/// let src = DataSource::new(samples, pipeline, Some(filters))?;
/// let outputs = src.train()?.at(0)?; // [normalized input, encoded target]
/// ```
pub struct DataSource<T> {
    items: IndexedView<T>,
    filts: FilterSet,
    tfm: Pipeline<T>,
    config: SourceConfig,
}

impl<T: Clone + Debug> DataSource<T> {
    /// Build and set up a source with the default configuration.
    ///
    /// `filts` of `None` selects every item in a single subset.
    pub fn new(
        items: impl IntoIterator<Item = T>,
        pipeline: impl Into<Pipeline<T>>,
        filts: Option<Vec<Filter>>,
    ) -> Result<Self> {
        Self::with_config(items, pipeline, filts, SourceConfig::default())
    }

    /// Build and set up a source.
    pub fn with_config(
        items: impl IntoIterator<Item = T>,
        pipeline: impl Into<Pipeline<T>>,
        filts: Option<Vec<Filter>>,
        config: SourceConfig,
    ) -> Result<Self> {
        let src = Self::build(items, pipeline, filts, config)?;
        src.initialize()?;
        Ok(src)
    }

    /// A single-subset source with the identity pipeline.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Result<Self> {
        Self::new(items, Pipeline::identity(), None)
    }

    /// First construction phase: wire items, filters and pipeline.
    ///
    /// The returned source has not been set up; call
    /// [`DataSource::initialize`] before reading through stateful transforms.
    pub fn build(
        items: impl IntoIterator<Item = T>,
        pipeline: impl Into<Pipeline<T>>,
        filts: Option<Vec<Filter>>,
        config: SourceConfig,
    ) -> Result<Self> {
        let items = IndexedView::new(items);
        let filts = FilterSet::new(filts, items.len())?;
        let mut tfm: Pipeline<T> = pipeline.into();
        tfm.set_decode_length(config.decode_length);
        Ok(Self {
            items,
            filts,
            tfm,
            config,
        })
    }

    /// Second construction phase: set up every pipeline branch against this
    /// source. Running it again recomputes the same state.
    pub fn initialize(&self) -> Result<()> {
        debug!(
            "data source: setting up {} branches over {} items in {} subsets",
            self.tfm.len(),
            self.items.len(),
            self.filts.count()
        );
        self.tfm.setup(self)
    }

    /// Number of filtered subsets.
    pub fn filter_count(&self) -> usize {
        self.filts.count()
    }

    /// Number of items in subset `filt`.
    pub fn len(&self, filt: usize) -> Result<usize> {
        self.filts.size(filt)
    }

    pub fn items(&self) -> &IndexedView<T> {
        &self.items
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filts
    }

    pub fn pipeline(&self) -> &Pipeline<T> {
        &self.tfm
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Value(s) at `idx` from filtered subset `filt`.
    ///
    /// A scalar index yields the per-branch outputs of one item; any other
    /// index yields them for each selected item, in order.
    pub fn get(&self, idx: impl Into<Index>, filt: usize) -> Result<Picked<Vec<T>>> {
        self.filts
            .resolve(filt, idx)?
            .try_map(|raw| self.transform_raw(raw, filt))
    }

    /// Per-branch outputs of the item at logical position `i` of subset `filt`.
    pub fn at(&self, i: isize, filt: usize) -> Result<Vec<T>> {
        let raw = self.filts.raw_index(filt, i)?;
        self.transform_raw(raw, filt)
    }

    fn transform_raw(&self, raw: usize, filt: usize) -> Result<Vec<T>> {
        // Raw filter indices are unchecked until read.
        let item = self
            .items
            .as_slice()
            .get(raw)
            .ok_or_else(|| Error::IndexOutOfRange {
                index: isize::try_from(raw).unwrap_or(isize::MAX),
                len: self.items.len(),
            })?;
        self.tfm.call(item, filt, &Options::default())
    }

    /// Filtered subset `filt`.
    pub fn subset(&self, filt: usize) -> Result<Subset<'_, T>> {
        self.filts.get(filt)?;
        Ok(Subset::new(self, filt))
    }

    /// The training subset (filter 0).
    pub fn train(&self) -> Result<Subset<'_, T>> {
        self.subset(0)
    }

    /// The validation subset (filter 1).
    pub fn valid(&self) -> Result<Subset<'_, T>> {
        self.subset(1)
    }

    /// Decode per-branch outputs `o` read from subset `filt`.
    pub fn decode(&self, o: Vec<T>, filt: usize, opts: &Options) -> Result<Vec<T>> {
        self.tfm.decode(o, filt, opts)
    }

    /// Decoded version of [`DataSource::get`].
    pub fn decoded(&self, idx: impl Into<Index>, filt: usize) -> Result<Picked<Vec<T>>> {
        let opts = Options::default();
        self.get(idx, filt)?
            .try_map(|o| self.decode(o, filt, &opts))
    }

    /// Decode `o` and render it with the pipeline's branches.
    pub fn show(&self, o: Vec<T>, filt: usize, opts: &Options) -> Result<String> {
        let decoded = self.decode(o, filt, opts)?;
        Ok(self.tfm.show(&decoded, opts))
    }

    /// Iterator over one [`Subset`] per filter.
    pub fn iter(&self) -> Subsets<'_, T> {
        Subsets {
            source: self,
            next: 0,
            count: self.filts.count(),
        }
    }

    /// Whether both sources have the same number of subsets and every pair of
    /// subsets yields equal outputs in order.
    pub fn equals(&self, other: &DataSource<T>) -> Result<bool>
    where
        T: PartialEq,
    {
        if self.filter_count() != other.filter_count() {
            return Ok(false);
        }
        for (ours, theirs) in self.iter().zip(other.iter()) {
            if !ours.equals_subset(&theirs)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Compare against plain items, wrapped in a default single-subset source.
    pub fn equals_items(&self, other: impl IntoIterator<Item = T>) -> Result<bool>
    where
        T: PartialEq,
    {
        self.equals(&DataSource::from_items(other)?)
    }

    /// One summary line per subset.
    pub fn describe(&self) -> Result<String> {
        let mut out = String::from("DataSource");
        for (i, subset) in self.iter().enumerate() {
            out.push_str(&format!("\n{i}: {}", subset.describe()?));
        }
        Ok(out)
    }
}

impl<T> Debug for DataSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("items", &self.items.len())
            .field("filts", &self.filts.count())
            .field("tfm", &self.tfm)
            .finish()
    }
}

impl<'a, T: Clone + Debug> IntoIterator for &'a DataSource<T> {
    type Item = Subset<'a, T>;
    type IntoIter = Subsets<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the subsets of a [`DataSource`], in filter order.
pub struct Subsets<'a, T> {
    source: &'a DataSource<T>,
    next: usize,
    count: usize,
}

impl<'a, T> Iterator for Subsets<'a, T> {
    type Item = Subset<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let subset = Subset::new(self.source, self.next);
        self.next += 1;
        Some(subset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl<T> ExactSizeIterator for Subsets<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_single_subset() {
        let src = DataSource::from_items(vec![10, 20, 30]).unwrap();
        assert_eq!(src.filter_count(), 1);
        assert_eq!(src.len(0).unwrap(), 3);
        assert!(src.len(1).is_err());
        assert!(matches!(
            src.valid(),
            Err(Error::FilterOutOfRange { filt: 1, count: 1 })
        ));
    }

    #[test]
    fn multi_index_returns_per_item_tuples() {
        let src = DataSource::from_items(vec![10, 20, 30]).unwrap();
        assert_eq!(src.get(1, 0).unwrap(), Picked::One(vec![20]));
        assert_eq!(
            src.get(vec![0, 2], 0).unwrap(),
            Picked::Many(vec![vec![10], vec![30]])
        );
        assert_eq!(src.at(-1, 0).unwrap(), vec![30]);
    }

    #[test]
    fn filtered_read_resolves_raw_index() {
        let src = DataSource::new(
            vec!['a', 'b', 'c', 'd'],
            Pipeline::identity(),
            Some(vec![vec![3usize, 1].into(), vec![true, false, true, false].into()]),
        )
        .unwrap();
        assert_eq!(src.get(0, 0).unwrap(), Picked::One(vec!['d']));
        assert_eq!(src.get(1, 1).unwrap(), Picked::One(vec!['c']));
        assert_eq!(src.decoded(0, 1).unwrap(), Picked::One(vec!['a']));
    }

    #[test]
    fn out_of_range_raw_index_fails_at_read() {
        let src = DataSource::new(vec![1, 2], Pipeline::identity(), Some(vec![vec![5usize].into()]))
            .unwrap();
        assert!(matches!(
            src.get(0, 0),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn huge_raw_index_does_not_wrap() {
        let src = DataSource::new(
            vec![10, 20, 30],
            Pipeline::identity(),
            Some(vec![Filter::Indices(vec![usize::MAX])]),
        )
        .unwrap();
        assert!(matches!(
            src.get(0, 0),
            Err(Error::IndexOutOfRange { len: 3, .. })
        ));
        assert!(matches!(
            src.train().unwrap().at(0),
            Err(Error::IndexOutOfRange { len: 3, .. })
        ));
    }

    #[test]
    fn huge_logical_index_does_not_wrap() {
        let src = DataSource::from_items(vec![10, 20, 30]).unwrap();
        assert!(matches!(
            src.get(usize::MAX, 0),
            Err(Error::IndexOutOfRange { len: 3, .. })
        ));
        assert!(src.get(vec![0usize, usize::MAX], 0).is_err());
        assert_eq!(src.get(-1isize, 0).unwrap(), Picked::One(vec![30]));
    }

    #[test]
    fn iterates_subsets_and_restarts() {
        let src = DataSource::new(
            0..6,
            Pipeline::identity(),
            Some(vec![Filter::from(0..4), Filter::from(4..6)]),
        )
        .unwrap();
        let lens: Vec<usize> = src.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![4, 2]);
        assert_eq!(src.iter().count(), 2);
        assert_eq!((&src).into_iter().len(), 2);
    }

    #[test]
    fn describe_lists_subsets() {
        let src = DataSource::new(
            0..15,
            Pipeline::identity(),
            Some(vec![Filter::from(0..12), Filter::from(12..15)]),
        )
        .unwrap();
        assert_eq!(
            src.describe().unwrap(),
            "DataSource\n\
             0: (12 items) [[0],[1],[2],[3],[4],[5],[6],[7],[8],[9]...]\n\
             1: (3 items) [[12],[13],[14]]"
        );
    }
}
