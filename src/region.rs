//! Sub-region selection.
//!
//! A `Region` is how callers ask for part of a mask or cube without materialising the
//! rest. It holds one half-open range per leading axis; axes it does not mention are
//! taken in full.

use crate::error::{MaskError, Result};
use ndarray::{ArrayViewD, Slice};
use std::ops::{Bound, Range, RangeBounds};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    axes: Vec<(Bound<usize>, Bound<usize>)>,
}

impl Region {
    /// Selects every element.
    pub fn full() -> Self {
        Self::default()
    }

    /// One range per leading axis, e.g. `Region::new([0..2, 5..10])`.
    pub fn new<R: RangeBounds<usize>>(ranges: impl IntoIterator<Item = R>) -> Self {
        Self {
            axes: ranges
                .into_iter()
                .map(|r| (r.start_bound().cloned(), r.end_bound().cloned()))
                .collect(),
        }
    }

    /// Appends a range for the next axis. Mixes range kinds: `Region::full().axis(2).axis(..3)`.
    pub fn axis(mut self, range: impl IntoAxisRange) -> Self {
        self.axes.push(range.into_axis_range());
        self
    }

    /// Number of axes constrained by this region.
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Resolves the region against a concrete shape into one concrete range per axis.
    pub fn resolve(&self, shape: &[usize]) -> Result<Vec<Range<usize>>> {
        if self.axes.len() > shape.len() {
            return Err(MaskError::RegionOutOfBounds(format!(
                "region has {} axes but the array has {}",
                self.axes.len(),
                shape.len()
            )));
        }

        shape
            .iter()
            .enumerate()
            .map(|(axis, &len)| {
                let Some(&(start, end)) = self.axes.get(axis) else {
                    return Ok(0..len);
                };
                let overflow = || {
                    MaskError::RegionOutOfBounds(format!(
                        "range bound overflows on axis {} of length {}",
                        axis, len
                    ))
                };
                let start = match start {
                    Bound::Included(s) => s,
                    Bound::Excluded(s) => s.checked_add(1).ok_or_else(overflow)?,
                    Bound::Unbounded => 0,
                };
                let end = match end {
                    Bound::Included(e) => e.checked_add(1).ok_or_else(overflow)?,
                    Bound::Excluded(e) => e,
                    Bound::Unbounded => len,
                };
                if start > end || end > len {
                    return Err(MaskError::RegionOutOfBounds(format!(
                        "range {}..{} on axis {} of length {}",
                        start, end, axis, len
                    )));
                }
                Ok(start..end)
            })
            .collect()
    }
}

/// Anything that can constrain a single axis: a range of any kind, or an index (which
/// keeps the axis with length 1).
pub trait IntoAxisRange {
    fn into_axis_range(self) -> (Bound<usize>, Bound<usize>);
}

impl IntoAxisRange for usize {
    fn into_axis_range(self) -> (Bound<usize>, Bound<usize>) {
        (Bound::Included(self), Bound::Included(self))
    }
}

macro_rules! impl_axis_range {
    ($($range:ty),*) => {
        $(
            impl IntoAxisRange for $range {
                fn into_axis_range(self) -> (Bound<usize>, Bound<usize>) {
                    (self.start_bound().cloned(), self.end_bound().cloned())
                }
            }
        )*
    };
}

impl_axis_range!(
    Range<usize>,
    std::ops::RangeFrom<usize>,
    std::ops::RangeTo<usize>,
    std::ops::RangeFull,
    std::ops::RangeInclusive<usize>,
    std::ops::RangeToInclusive<usize>
);

/// The full extent of every axis.
pub(crate) fn full_ranges(shape: &[usize]) -> Vec<Range<usize>> {
    shape.iter().map(|&len| 0..len).collect()
}

/// Narrows a view to `ranges` without copying. `ranges` must already be resolved
/// against the view's shape.
pub(crate) fn slice_view<'a, T>(mut view: ArrayViewD<'a, T>, ranges: &[Range<usize>]) -> ArrayViewD<'a, T> {
    view.slice_each_axis_inplace(|ax| Slice::from(ranges[ax.axis.index()].clone()));
    view
}
