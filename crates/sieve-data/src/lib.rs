//! # sieve-data
//!
//! Filtered, transform-applying data sources for training loops.
//!
//! This crate provides:
//! - [`DataSource`]: items + named index filters + a transform pipeline
//! - [`Subset`]: a lazily transformed view of one filter (train, valid, ...)
//! - [`Pipeline`] / [`Branch`]: independent transform chains with a setup pass
//! - [`Transform`] trait and built-ins: Normalize, Categorize, OneHotEncode, ...
//! - [`IndexedView`]: list storage addressable by position, list or mask
//! - [`FilterSet`] and [`random_split`] for reproducible train/valid splits
//
// Reads never copy the item collection: a subset is a list of raw indices,
// and transforms run on demand as items are pulled.

pub mod config;
pub mod dataset;
pub mod filter;
pub mod indexed;
pub mod pipeline;
pub mod repr;
pub mod show;
pub mod source;
pub mod subset;
pub mod transform;

pub use config::{DecodeLength, Options, SourceConfig};
pub use dataset::Sample;
pub use filter::{random_split, Filter, FilterSet};
pub use indexed::IndexedView;
pub use pipeline::{Branch, Mode, Pipeline};
pub use repr::coll_repr;
pub use show::show_xs;
pub use source::{DataSource, Subsets};
pub use subset::{Subset, SubsetIter};
pub use transform::{Categorize, Lambda, Noop, Normalize, OneHotEncode, Scale, Transform};

pub use sieve_core::{Error, Index, Picked, Result};
