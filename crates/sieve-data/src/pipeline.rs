// Pipeline: independent transform branches with a setup mode
//
// A pipeline holds one branch per output "column" (say inputs and targets).
// In normal use every read fans out to all branches and yields one output
// per branch. During setup, branches are initialized one at a time in
// order; the branch being set up is the only one reads are routed to, so
// a branch sees data exactly as it will itself transform it.
//
//   Idle           item -> [branch0(item), branch1(item), ...]
//   SettingUp(i)   item -> [branch_i(item)]
//
// Within a branch the same idea applies one level down: while transform k
// sets up, the branch applies only transforms 0..k.

use std::cell::Cell;
use std::fmt::Debug;

use log::{debug, trace, warn};

use sieve_core::{Error, Result};

use crate::config::{DecodeLength, Options};
use crate::show::show_xs;
use crate::source::DataSource;
use crate::transform::{Noop, Transform};

// Branch

/// An ordered chain of transforms producing one pipeline output.
///
/// Each transform's output becomes the next one's input; decoding runs the
/// chain backwards.
pub struct Branch<T> {
    name: String,
    tfms: Vec<Box<dyn Transform<T>>>,
    /// Number of leading transforms applied while this branch sets up.
    limit: Cell<Option<usize>>,
}

impl<T> Branch<T> {
    /// Create an empty (identity) branch.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tfms: Vec::new(),
            limit: Cell::new(None),
        }
    }

    /// A branch holding only [`Noop`].
    pub fn noop(name: &str) -> Self {
        Self::new(name).add(Noop)
    }

    /// Append a transform. Returns self for chaining.
    #[allow(clippy::should_implement_trait)]
    pub fn add<F: Transform<T> + 'static>(mut self, tfm: F) -> Self {
        self.tfms.push(Box::new(tfm));
        self
    }

    pub fn push(&mut self, tfm: Box<dyn Transform<T>>) {
        self.tfms.push(tfm);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tfms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tfms.is_empty()
    }

    /// The transforms of this branch, in application order.
    pub fn transforms(&self) -> &[Box<dyn Transform<T>>] {
        &self.tfms
    }

    pub fn apply(&self, item: T, filt: usize, opts: &Options) -> Result<T> {
        let n = self.limit.get().unwrap_or(self.tfms.len());
        self.tfms[..n]
            .iter()
            .try_fold(item, |acc, t| t.apply(acc, filt, opts))
    }

    pub fn decode(&self, item: T, filt: usize, opts: &Options) -> Result<T> {
        self.tfms
            .iter()
            .rev()
            .try_fold(item, |acc, t| t.decode(acc, filt, opts))
    }

    /// Set up each transform in order against `source`.
    pub fn setup(&self, source: &DataSource<T>) -> Result<()> {
        for (k, tfm) in self.tfms.iter().enumerate() {
            self.limit.set(Some(k));
            debug!("branch {}: setting up {} ({k})", self.name, tfm.name());
            if let Err(e) = tfm.setup(source) {
                self.limit.set(None);
                return Err(e);
            }
        }
        self.limit.set(None);
        Ok(())
    }

    /// Rendering from the last transform that knows how to show `item`.
    pub fn show(&self, item: &T, opts: &Options) -> Option<String> {
        self.tfms.iter().rev().find_map(|t| t.show(item, opts))
    }
}

impl<T> Debug for Branch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tfms.iter().map(|t| t.name()).collect();
        f.debug_struct("Branch")
            .field("name", &self.name)
            .field("tfms", &names)
            .finish()
    }
}

// Pipeline

/// Whether the pipeline is in normal use or initializing a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    SettingUp(usize),
}

/// An ordered list of independent [`Branch`]es.
pub struct Pipeline<T> {
    branches: Vec<Branch<T>>,
    mode: Cell<Mode>,
    decode_length: DecodeLength,
}

impl<T> Pipeline<T> {
    pub fn new(branches: Vec<Branch<T>>) -> Self {
        Self {
            branches,
            mode: Cell::new(Mode::Idle),
            decode_length: DecodeLength::default(),
        }
    }

    /// A single identity branch.
    pub fn identity() -> Self {
        Self::new(vec![Branch::noop("x")])
    }

    pub fn decode_length(mut self, d: DecodeLength) -> Self {
        self.decode_length = d;
        self
    }

    pub(crate) fn set_decode_length(&mut self, d: DecodeLength) {
        self.decode_length = d;
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn branches(&self) -> &[Branch<T>] {
        &self.branches
    }

    pub fn branch(&self, i: usize) -> Option<&Branch<T>> {
        self.branches.get(i)
    }

    /// The input branch (branch 0).
    pub fn xt(&self) -> Option<&Branch<T>> {
        self.branch(0)
    }

    /// The target branch (branch 1).
    pub fn yt(&self) -> Option<&Branch<T>> {
        self.branch(1)
    }

    /// Set up every branch in order, each against `owner`.
    ///
    /// On failure the pipeline returns to [`Mode::Idle`] and the error is
    /// propagated; branches set up before the failure keep their state.
    pub fn setup(&self, owner: &DataSource<T>) -> Result<()> {
        for (i, branch) in self.branches.iter().enumerate() {
            self.mode.set(Mode::SettingUp(i));
            debug!("pipeline: setting up branch {i} ({})", branch.name());
            if let Err(e) = branch.setup(owner) {
                self.mode.set(Mode::Idle);
                return Err(e);
            }
        }
        self.mode.set(Mode::Idle);
        Ok(())
    }

    /// Transform `item` read from subset `filt`.
    ///
    /// Returns one output per branch, or only the active branch's output
    /// while a branch is setting up.
    pub fn call(&self, item: &T, filt: usize, opts: &Options) -> Result<Vec<T>>
    where
        T: Clone,
    {
        match self.mode.get() {
            Mode::SettingUp(i) => {
                trace!("pipeline: routing to branch {i} during setup");
                let branch = &self.branches[i];
                Ok(vec![branch.apply(item.clone(), filt, opts)?])
            }
            Mode::Idle => self
                .branches
                .iter()
                .map(|b| b.apply(item.clone(), filt, opts))
                .collect(),
        }
    }

    /// Decode one output per branch back into its original space.
    pub fn decode(&self, items: Vec<T>, filt: usize, opts: &Options) -> Result<Vec<T>> {
        if let Mode::SettingUp(branch) = self.mode.get() {
            return Err(Error::DecodeDuringSetup { branch });
        }
        if items.len() != self.branches.len() {
            match self.decode_length {
                DecodeLength::Strict => {
                    return Err(Error::BranchCountMismatch {
                        branches: self.branches.len(),
                        items: items.len(),
                    })
                }
                DecodeLength::Truncate => warn!(
                    "pipeline: decoding {} items with {} branches, extra entries dropped",
                    items.len(),
                    self.branches.len()
                ),
            }
        }
        items
            .into_iter()
            .zip(&self.branches)
            .map(|(o, b)| b.decode(o, filt, opts))
            .collect()
    }

    /// Render already decoded items, one per branch.
    pub fn show(&self, items: &[T], opts: &Options) -> String
    where
        T: Debug,
    {
        show_xs(items, &self.branches, opts)
    }
}

impl<T> From<Branch<T>> for Pipeline<T> {
    fn from(branch: Branch<T>) -> Self {
        Self::new(vec![branch])
    }
}

impl<T> From<Vec<Branch<T>>> for Pipeline<T> {
    fn from(branches: Vec<Branch<T>>) -> Self {
        Self::new(branches)
    }
}

impl<T> From<Box<dyn Transform<T>>> for Pipeline<T> {
    fn from(tfm: Box<dyn Transform<T>>) -> Self {
        let mut branch = Branch::new("x");
        branch.push(tfm);
        Self::new(vec![branch])
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T> Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("branches", &self.branches)
            .field("mode", &self.mode.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Lambda;

    fn two_branch() -> Pipeline<i64> {
        Pipeline::new(vec![
            Branch::new("x").add(Lambda::new("inc", |x: i64| x + 1).with_decode(|x| x - 1)),
            Branch::new("y").add(Lambda::new("neg", |x: i64| -x).with_decode(|x| -x)),
        ])
    }

    #[test]
    fn idle_call_fans_out() {
        let p = two_branch();
        assert_eq!(p.mode(), Mode::Idle);
        assert_eq!(p.call(&5, 0, &Options::default()).unwrap(), vec![6, -5]);
    }

    #[test]
    fn setting_up_routes_to_active_branch() {
        let p = two_branch();
        p.mode.set(Mode::SettingUp(1));
        assert_eq!(p.call(&5, 0, &Options::default()).unwrap(), vec![-5]);
        assert!(matches!(
            p.decode(vec![-5], 0, &Options::default()),
            Err(Error::DecodeDuringSetup { branch: 1 })
        ));
    }

    #[test]
    fn decode_per_branch() {
        let p = two_branch();
        assert_eq!(
            p.decode(vec![6, -5], 0, &Options::default()).unwrap(),
            vec![5, 5]
        );
    }

    #[test]
    fn decode_length_policy() {
        let strict = two_branch();
        assert!(matches!(
            strict.decode(vec![6], 0, &Options::default()),
            Err(Error::BranchCountMismatch {
                branches: 2,
                items: 1
            })
        ));
        let lenient = two_branch().decode_length(DecodeLength::Truncate);
        assert_eq!(
            lenient.decode(vec![6], 0, &Options::default()).unwrap(),
            vec![5]
        );
        assert_eq!(
            lenient.decode(vec![6, -5, 9], 0, &Options::default()).unwrap(),
            vec![5, 5]
        );
    }

    #[test]
    fn branch_chain_and_reverse_decode() {
        let b = Branch::new("x")
            .add(Lambda::new("inc", |x: i64| x + 1).with_decode(|x| x - 1))
            .add(Lambda::new("dbl", |x: i64| x * 2).with_decode(|x| x / 2));
        let opts = Options::default();
        assert_eq!(b.apply(3, 0, &opts).unwrap(), 8);
        assert_eq!(b.decode(8, 0, &opts).unwrap(), 3);
        b.limit.set(Some(1));
        assert_eq!(b.apply(3, 0, &opts).unwrap(), 4);
    }

    #[test]
    fn accessors() {
        let p = two_branch();
        assert_eq!(p.len(), 2);
        assert_eq!(p.xt().map(Branch::name), Some("x"));
        assert_eq!(p.yt().map(Branch::name), Some("y"));
        assert!(p.branch(2).is_none());
        let single: Pipeline<i64> = Pipeline::from(Box::new(Noop) as Box<dyn Transform<i64>>);
        assert_eq!(single.len(), 1);
    }
}
