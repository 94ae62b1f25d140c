// Index: the ways a sequence can be addressed
//
// A lookup either names one position (`At`) or a selection of positions
// (`Positions`, `Mask`, `Range`). Scalar lookups produce `Picked::One`,
// every other form produces `Picked::Many` in request order, even when the
// selection happens to hold a single element.
//
// Negative scalar positions count from the end, so `At(-1)` is the last
// element. Ranges clamp to the sequence like slices do; masks must match
// the sequence length exactly.

use std::ops::Range;

use crate::error::{Error, Result};

/// A position, or selection of positions, into an indexed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// A single position; negative values count from the end.
    At(isize),
    /// An explicit ordered list of positions (may repeat, may be negative).
    Positions(Vec<isize>),
    /// A boolean mask selecting the positions where it is `true`.
    Mask(Vec<bool>),
    /// A half-open range, clamped to the sequence length.
    Range(Range<usize>),
}

impl Index {
    /// Whether this index selects a collection rather than one element.
    pub fn is_multi(&self) -> bool {
        !matches!(self, Index::At(_))
    }

    /// Resolve this index against a sequence of length `len`.
    ///
    /// Returns concrete, in-bounds positions in the order requested.
    pub fn resolve(&self, len: usize) -> Result<Picked<usize>> {
        match self {
            Index::At(i) => normalize(*i, len).map(Picked::One),
            Index::Positions(ps) => ps
                .iter()
                .map(|&p| normalize(p, len))
                .collect::<Result<Vec<_>>>()
                .map(Picked::Many),
            Index::Mask(mask) => {
                if mask.len() != len {
                    return Err(Error::LengthMismatch {
                        expected: len,
                        got: mask.len(),
                    });
                }
                Ok(Picked::Many(mask_positions(mask)))
            }
            Index::Range(r) => {
                let end = r.end.min(len);
                let start = r.start.min(end);
                Ok(Picked::Many((start..end).collect()))
            }
        }
    }
}

/// Map a possibly negative position onto `[0, len)`.
pub fn normalize(index: isize, len: usize) -> Result<usize> {
    let n = len as isize;
    let pos = if index < 0 { index + n } else { index };
    if pos < 0 || pos >= n {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(pos as usize)
}

/// Ordered positions where `mask` is `true`.
pub fn mask_positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

// Positions past `isize::MAX` can never be in bounds, so conversions
// saturate instead of wrapping into the negative (from-the-end) range.
fn saturate_unsigned<T: TryInto<isize>>(i: T) -> isize {
    i.try_into().unwrap_or(isize::MAX)
}

fn saturate_signed<T: TryInto<isize> + Copy + Default + PartialOrd>(i: T) -> isize {
    let negative = i < T::default();
    i.try_into()
        .unwrap_or(if negative { isize::MIN } else { isize::MAX })
}

macro_rules! impl_index_from_int {
    ($conv:ident: $($t:ty),*) => {
        $(
            impl From<$t> for Index {
                fn from(i: $t) -> Self {
                    Index::At($conv(i))
                }
            }

            impl From<Vec<$t>> for Index {
                fn from(ps: Vec<$t>) -> Self {
                    Index::Positions(ps.into_iter().map($conv).collect())
                }
            }

            impl From<&[$t]> for Index {
                fn from(ps: &[$t]) -> Self {
                    Index::Positions(ps.iter().map(|&p| $conv(p)).collect())
                }
            }
        )*
    };
}

impl_index_from_int!(saturate_signed: i32, i64, isize);
impl_index_from_int!(saturate_unsigned: u32, u64, usize);

impl From<Vec<bool>> for Index {
    fn from(mask: Vec<bool>) -> Self {
        Index::Mask(mask)
    }
}

impl From<&[bool]> for Index {
    fn from(mask: &[bool]) -> Self {
        Index::Mask(mask.to_vec())
    }
}

impl From<Range<usize>> for Index {
    fn from(r: Range<usize>) -> Self {
        Index::Range(r)
    }
}

/// The result of an [`Index`] lookup: one element, or an ordered selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picked<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Picked<T> {
    pub fn is_many(&self) -> bool {
        matches!(self, Picked::Many(_))
    }

    /// The single element, if this was a scalar lookup.
    pub fn one(self) -> Option<T> {
        match self {
            Picked::One(v) => Some(v),
            Picked::Many(_) => None,
        }
    }

    /// The selection, if this was a multi-index lookup.
    pub fn many(self) -> Option<Vec<T>> {
        match self {
            Picked::One(_) => None,
            Picked::Many(vs) => Some(vs),
        }
    }

    /// Flatten into a vec; a scalar lookup becomes a one-element vec.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Picked::One(v) => vec![v],
            Picked::Many(vs) => vs,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Picked<U> {
        match self {
            Picked::One(v) => Picked::One(f(v)),
            Picked::Many(vs) => Picked::Many(vs.into_iter().map(f).collect()),
        }
    }

    /// Like [`Picked::map`], stopping at the first error.
    pub fn try_map<U>(self, mut f: impl FnMut(T) -> Result<U>) -> Result<Picked<U>> {
        match self {
            Picked::One(v) => f(v).map(Picked::One),
            Picked::Many(vs) => vs
                .into_iter()
                .map(f)
                .collect::<Result<Vec<_>>>()
                .map(Picked::Many),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_negative() {
        assert_eq!(Index::At(2).resolve(5).unwrap(), Picked::One(2));
        assert_eq!(Index::At(-1).resolve(5).unwrap(), Picked::One(4));
        assert!(matches!(
            Index::At(5).resolve(5),
            Err(Error::IndexOutOfRange { index: 5, len: 5 })
        ));
        assert!(Index::At(-6).resolve(5).is_err());
    }

    #[test]
    fn positions_keep_request_order() {
        let idx = Index::from(vec![3, 0, 3]);
        assert_eq!(idx.resolve(4).unwrap(), Picked::Many(vec![3, 0, 3]));
    }

    #[test]
    fn mask_selects_true_positions() {
        let idx = Index::from(vec![true, false, true, true]);
        assert_eq!(idx.resolve(4).unwrap(), Picked::Many(vec![0, 2, 3]));
        assert!(matches!(
            idx.resolve(3),
            Err(Error::LengthMismatch {
                expected: 3,
                got: 4
            })
        ));
    }

    #[test]
    fn range_clamps() {
        assert_eq!(
            Index::from(1..10).resolve(4).unwrap(),
            Picked::Many(vec![1, 2, 3])
        );
        assert_eq!(Index::from(7..9).resolve(4).unwrap(), Picked::Many(vec![]));
    }

    #[test]
    fn single_position_list_is_still_many() {
        let idx = Index::from(vec![1usize]);
        assert!(idx.is_multi());
        assert!(idx.resolve(2).unwrap().is_many());
    }

    #[test]
    fn huge_unsigned_index_is_out_of_range() {
        assert!(matches!(
            Index::from(usize::MAX).resolve(3),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(Index::from(vec![0usize, usize::MAX]).resolve(3).is_err());
        assert!(Index::from(u64::MAX).resolve(3).is_err());
        assert!(Index::from(i64::MIN).resolve(3).is_err());
        assert_eq!(Index::from(-1i64).resolve(3).unwrap(), Picked::One(2));
    }

    #[test]
    fn picked_accessors() {
        assert_eq!(Picked::One(4).into_vec(), vec![4]);
        assert_eq!(Picked::Many(vec![1, 2]).into_vec(), vec![1, 2]);
        assert_eq!(Picked::Many(vec![1, 2]).many(), Some(vec![1, 2]));
        assert_eq!(Picked::One(4).many(), None);
        assert_eq!(Picked::Many(vec![4]).one(), None);
    }

    #[test]
    fn picked_try_map_stops_on_error() {
        let p = Picked::Many(vec![1, 2, 3]);
        let r = p.try_map(|v| if v == 2 { Err(Error::msg("two")) } else { Ok(v) });
        assert!(r.is_err());
    }
}
