//! # sieve-core
//!
//! Shared primitives for the sieve crates.
//!
//! This crate provides:
//! - [`Error`] / [`Result`]: the error type used across the workspace
//! - [`Index`]: scalar, position-list, mask and range lookups
//! - [`Picked`]: the one-or-many result of an [`Index`] lookup

pub mod error;
pub mod index;

pub use error::{Error, Result};
pub use index::{Index, Picked};
