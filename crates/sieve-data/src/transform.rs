// Transform: one step of a pipeline branch, with setup and inverse
//
// A transform is applied lazily each time an item is read from a data
// source. Before normal use, `setup` is called once with the owning
// source so the transform can collect statistics (a mean, a vocabulary)
// by streaming over one of its subsets. State written during setup lives
// behind `Cell`/`RefCell` so `&self` suffices everywhere.

use std::cell::{Cell, RefCell};

use log::debug;

use sieve_core::{Error, Result};

use crate::config::Options;
use crate::dataset::Sample;
use crate::source::DataSource;

/// A reversible per-item transformation over items of type `T`.
///
/// Only `apply` is required. The defaults make a transform stateless
/// (`setup` does nothing), non-invertible (`decode` is the identity) and
/// without a custom rendering (`show` returns `None`).
///
/// # Example
/// ```ignore
/// struct AddOne;
///
/// impl Transform<i64> for AddOne {
///     fn apply(&self, x: i64, _filt: usize, _opts: &Options) -> Result<i64> {
///         Ok(x + 1)
///     }
///     fn decode(&self, x: i64, _filt: usize, _opts: &Options) -> Result<i64> {
///         Ok(x - 1)
///     }
/// }
/// ```
pub trait Transform<T> {
    /// Transform `item`, read from subset `filt`.
    fn apply(&self, item: T, filt: usize, opts: &Options) -> Result<T>;

    /// Invert [`Transform::apply`].
    fn decode(&self, item: T, _filt: usize, _opts: &Options) -> Result<T> {
        Ok(item)
    }

    /// Initialize internal state from `source` before normal use.
    ///
    /// While this runs, reads from `source` pass only through the transforms
    /// that precede this one in its branch.
    fn setup(&self, _source: &DataSource<T>) -> Result<()> {
        Ok(())
    }

    /// Render a decoded item, or `None` to let another transform (or `Debug`)
    /// do it.
    fn show(&self, _item: &T, _opts: &Options) -> Option<String> {
        None
    }

    /// Optional human-readable name, used in logs and errors.
    fn name(&self) -> &str {
        "transform"
    }
}

// Noop

/// The identity transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl<T> Transform<T> for Noop {
    fn apply(&self, item: T, _filt: usize, _opts: &Options) -> Result<T> {
        Ok(item)
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// Lambda

type MapFn<T> = Box<dyn Fn(T) -> T>;

/// A stateless transform built from closures.
///
/// Without a decode closure, decoding is the identity.
pub struct Lambda<T> {
    name: String,
    encode: MapFn<T>,
    decode: Option<MapFn<T>>,
}

impl<T> Lambda<T> {
    pub fn new(name: &str, encode: impl Fn(T) -> T + 'static) -> Self {
        Self {
            name: name.to_string(),
            encode: Box::new(encode),
            decode: None,
        }
    }

    /// Attach the inverse of the encode closure.
    pub fn with_decode(mut self, decode: impl Fn(T) -> T + 'static) -> Self {
        self.decode = Some(Box::new(decode));
        self
    }
}

impl<T> Transform<T> for Lambda<T> {
    fn apply(&self, item: T, _filt: usize, _opts: &Options) -> Result<T> {
        Ok((self.encode)(item))
    }

    fn decode(&self, item: T, _filt: usize, _opts: &Options) -> Result<T> {
        Ok(match &self.decode {
            Some(f) => f(item),
            None => item,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Scale

/// Divide features by a constant, e.g. `Scale::new(255.0)` for image pixels.
#[derive(Debug, Clone)]
pub struct Scale {
    scale: f64,
}

impl Scale {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Transform<Sample> for Scale {
    fn apply(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        if self.scale == 0.0 {
            return Err(Error::transform(self.name(), "scale must be non-zero"));
        }
        for v in &mut sample.features {
            *v /= self.scale;
        }
        Ok(sample)
    }

    fn decode(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        for v in &mut sample.features {
            *v *= self.scale;
        }
        Ok(sample)
    }

    fn name(&self) -> &str {
        "scale"
    }
}

// Normalize

/// Feature statistics used by [`Normalize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub std: f64,
}

/// Added to the computed standard deviation so constant features don't
/// divide by zero.
const STD_EPS: f64 = 1e-7;

/// Standardize features to zero mean and unit variance.
///
/// Built with [`Normalize::new`], the mean and standard deviation are
/// computed during setup over every feature of every sample in subset
/// `stats_filt` (the training subset by default). Built with
/// [`Normalize::with_stats`], the given statistics are used as-is.
#[derive(Debug)]
pub struct Normalize {
    stats: Cell<Option<Stats>>,
    stats_filt: usize,
    fixed: bool,
}

impl Normalize {
    pub fn new() -> Self {
        Self {
            stats: Cell::new(None),
            stats_filt: 0,
            fixed: false,
        }
    }

    /// Compute statistics from subset `filt` instead of the training subset.
    pub fn from_filter(filt: usize) -> Self {
        Self {
            stats_filt: filt,
            ..Self::new()
        }
    }

    pub fn with_stats(mean: f64, std: f64) -> Self {
        Self {
            stats: Cell::new(Some(Stats { mean, std })),
            stats_filt: 0,
            fixed: true,
        }
    }

    /// Statistics in effect, once set up.
    pub fn stats(&self) -> Option<Stats> {
        self.stats.get()
    }

    fn require_stats(&self) -> Result<Stats> {
        self.stats
            .get()
            .ok_or_else(|| Error::transform(self.name(), "used before setup"))
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform<Sample> for Normalize {
    fn apply(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let Stats { mean, std } = self.require_stats()?;
        for v in &mut sample.features {
            *v = (*v - mean) / std;
        }
        Ok(sample)
    }

    fn decode(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let Stats { mean, std } = self.require_stats()?;
        for v in &mut sample.features {
            *v = *v * std + mean;
        }
        Ok(sample)
    }

    fn setup(&self, source: &DataSource<Sample>) -> Result<()> {
        if self.fixed {
            return Ok(());
        }
        let train = source.subset(self.stats_filt)?;
        let (mut n, mut sum) = (0usize, 0.0);
        for sample in train.stream() {
            for &v in &sample?.features {
                n += 1;
                sum += v;
            }
        }
        if n == 0 {
            return Err(Error::transform(
                self.name(),
                format!("subset {} has no features to compute statistics", self.stats_filt),
            ));
        }
        let mean = sum / n as f64;
        let mut sq_dev = 0.0;
        for sample in train.stream() {
            sq_dev += sample?
                .features
                .iter()
                .map(|v| (v - mean) * (v - mean))
                .sum::<f64>();
        }
        let var = sq_dev / n as f64;
        let stats = Stats {
            mean,
            std: var.sqrt() + STD_EPS,
        };
        debug!("normalize: {n} values, mean {:.4}, std {:.4}", stats.mean, stats.std);
        self.stats.set(Some(stats));
        Ok(())
    }

    fn name(&self) -> &str {
        "normalize"
    }
}

// Categorize

/// Encode a sample's label as its index in a sorted vocabulary.
///
/// Built with [`Categorize::new`], the vocabulary is every distinct label
/// seen in the training subset during setup. Labels outside the vocabulary
/// are rejected.
#[derive(Debug)]
pub struct Categorize {
    vocab: RefCell<Vec<f64>>,
    fixed: bool,
}

impl Categorize {
    pub fn new() -> Self {
        Self {
            vocab: RefCell::new(Vec::new()),
            fixed: false,
        }
    }

    pub fn with_vocab(mut vocab: Vec<f64>) -> Self {
        vocab.sort_by(f64::total_cmp);
        vocab.dedup();
        Self {
            vocab: RefCell::new(vocab),
            fixed: true,
        }
    }

    pub fn vocab(&self) -> Vec<f64> {
        self.vocab.borrow().clone()
    }

    fn label_of(&self, sample: &Sample) -> Result<f64> {
        sample
            .label()
            .ok_or_else(|| Error::transform(self.name(), "sample has no target"))
    }
}

impl Default for Categorize {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform<Sample> for Categorize {
    fn apply(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let label = self.label_of(&sample)?;
        let idx = self
            .vocab
            .borrow()
            .binary_search_by(|v| v.total_cmp(&label))
            .map_err(|_| Error::transform(self.name(), format!("unknown label {label}")))?;
        sample.target = vec![idx as f64];
        sample.target_shape = vec![1];
        Ok(sample)
    }

    fn decode(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let idx = self.label_of(&sample)?;
        let vocab = self.vocab.borrow();
        let label = vocab
            .get(idx as usize)
            .copied()
            .filter(|_| idx >= 0.0 && idx.fract() == 0.0)
            .ok_or_else(|| Error::transform(self.name(), format!("no category {idx}")))?;
        sample.target = vec![label];
        sample.target_shape = vec![1];
        Ok(sample)
    }

    fn setup(&self, source: &DataSource<Sample>) -> Result<()> {
        if self.fixed {
            return Ok(());
        }
        let mut vocab = Vec::new();
        for sample in source.subset(0)?.stream() {
            vocab.push(self.label_of(&sample?)?);
        }
        vocab.sort_by(f64::total_cmp);
        vocab.dedup();
        debug!("categorize: {} categories", vocab.len());
        *self.vocab.borrow_mut() = vocab;
        Ok(())
    }

    fn show(&self, sample: &Sample, _opts: &Options) -> Option<String> {
        sample.label().map(|l| format!("category {l}"))
    }

    fn name(&self) -> &str {
        "categorize"
    }
}

// OneHotEncode

/// Largest class count [`OneHotEncode::infer`] accepts.
pub const MAX_CLASSES: usize = 1 << 24;

/// `label` as a class index: a whole number in `0..MAX_CLASSES`.
fn class_index(tfm: &str, label: f64) -> Result<usize> {
    if !label.is_finite() || label < 0.0 || label.fract() != 0.0 || label >= MAX_CLASSES as f64 {
        return Err(Error::transform(
            tfm,
            format!("label {label} is not a class index"),
        ));
    }
    Ok(label as usize)
}

/// One-hot encode a class index target into a vector of size `num_classes`.
///
/// With [`OneHotEncode::infer`], the class count is taken during setup as one
/// past the largest index seen in the training subset, so it must follow a
/// transform (like [`Categorize`]) that produces class indices. Decoding
/// takes the argmax.
#[derive(Debug)]
pub struct OneHotEncode {
    num_classes: Cell<usize>,
    fixed: bool,
}

impl OneHotEncode {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes: Cell::new(num_classes),
            fixed: true,
        }
    }

    pub fn infer() -> Self {
        Self {
            num_classes: Cell::new(0),
            fixed: false,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes.get()
    }
}

impl Transform<Sample> for OneHotEncode {
    fn apply(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let n = self.num_classes.get();
        let label = sample
            .label()
            .ok_or_else(|| Error::transform(self.name(), "sample has no target"))?;
        let class_idx = class_index(self.name(), label)?;
        if class_idx >= n {
            return Err(Error::transform(
                self.name(),
                format!("class {class_idx} out of range for {n} classes"),
            ));
        }
        let mut one_hot = vec![0.0; n];
        one_hot[class_idx] = 1.0;
        sample.target = one_hot;
        sample.target_shape = vec![n];
        Ok(sample)
    }

    fn decode(&self, mut sample: Sample, _filt: usize, _opts: &Options) -> Result<Sample> {
        let argmax = sample
            .target
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .ok_or_else(|| Error::transform(self.name(), "empty target"))?;
        sample.target = vec![argmax as f64];
        sample.target_shape = vec![1];
        Ok(sample)
    }

    fn setup(&self, source: &DataSource<Sample>) -> Result<()> {
        if self.fixed {
            return Ok(());
        }
        let mut max_idx: Option<usize> = None;
        for sample in source.subset(0)?.stream() {
            let sample = sample?;
            let label = sample
                .label()
                .ok_or_else(|| Error::transform(self.name(), "sample has no target"))?;
            let idx = class_index(self.name(), label)?;
            max_idx = Some(max_idx.map_or(idx, |m| m.max(idx)));
        }
        let n = match max_idx {
            None => 0,
            Some(m) => m
                .checked_add(1)
                .ok_or_else(|| Error::transform(self.name(), "too many classes"))?,
        };
        debug!("one_hot: inferred {n} classes");
        self.num_classes.set(n);
        Ok(())
    }

    fn name(&self) -> &str {
        "one_hot"
    }
}
