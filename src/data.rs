//! The array view service consumed by masks and cubes.
//!
//! Masks and cubes never own pixel data. They hold an `Arc<dyn DataSource<T>>` and pull
//! exactly the region they need at evaluation time. `CubeData` is the in-memory
//! implementation; disk-backed sources implement the same trait and return owned
//! chunks from `read_region`.

use crate::error::{MaskError, Result};
use crate::region::slice_view;
use crate::units::Unit;
use ndarray::{ArcArray, ArrayD, CowArray, IxDyn};
use num_traits::{Float, NumCast};
use std::fmt;
use std::ops::Range;

/// Numeric element types a cube can hold.
pub trait Element: Float + fmt::Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Float + fmt::Debug + Send + Sync + 'static {}

/// Converts an `f64` (from config or a unit conversion) into the element type.
pub(crate) fn element_from_f64<T: Element>(value: f64) -> Result<T> {
    <T as NumCast>::from(value).ok_or_else(|| {
        MaskError::NumericConversion(format!(
            "{} is not representable as {}",
            value,
            std::any::type_name::<T>()
        ))
    })
}

//==================================================================================
// 1. The DataSource Contract
//==================================================================================

/// Region-indexable, read-only access to an N-dimensional array with a physical unit.
pub trait DataSource<T: Element>: fmt::Debug + Send + Sync {
    fn shape(&self) -> &[usize];

    fn unit(&self) -> &Unit;

    /// Reads `region`, which has already been resolved against `shape()`.
    /// In-memory sources return a borrowed view; others may materialise the chunk.
    fn read_region(&self, region: &[Range<usize>]) -> Result<CowArray<'_, T, IxDyn>>;

    fn ndim(&self) -> usize {
        self.shape().len()
    }
}

//==================================================================================
// 2. In-Memory Implementation
//==================================================================================

/// Shared in-memory pixel storage. Clones share the same buffer.
#[derive(Clone)]
pub struct CubeData<T: Element> {
    values: ArcArray<T, IxDyn>,
    unit: Unit,
}

impl<T: Element> CubeData<T> {
    pub fn new(values: ArrayD<T>, unit: Unit) -> Self {
        Self::from_shared(values.into_shared(), unit)
    }

    /// Wraps an already shared buffer without copying it.
    pub fn from_shared(values: ArcArray<T, IxDyn>, unit: Unit) -> Self {
        Self { values, unit }
    }

    pub fn dimensionless(values: ArrayD<T>) -> Self {
        Self::new(values, Unit::dimensionless())
    }

    /// Builds a cube from a flat row-major buffer.
    pub fn from_shape_vec(shape: &[usize], values: Vec<T>, unit: Unit) -> Result<Self> {
        let len = values.len();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|_| MaskError::shape_mismatch(shape, &[len]))?;
        Ok(Self::new(array, unit))
    }

    pub fn values(&self) -> &ArcArray<T, IxDyn> {
        &self.values
    }

    /// True when both handles point at the same pixel buffer.
    pub fn shares_storage(&self, other: &CubeData<T>) -> bool {
        self.values.as_ptr() == other.values.as_ptr()
    }
}

impl<T: Element> fmt::Debug for CubeData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CubeData")
            .field("shape", &self.values.shape())
            .field("unit", &self.unit)
            .finish()
    }
}

impl<T: Element> DataSource<T> for CubeData<T> {
    fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    fn unit(&self) -> &Unit {
        &self.unit
    }

    fn read_region(&self, region: &[Range<usize>]) -> Result<CowArray<'_, T, IxDyn>> {
        Ok(CowArray::from(slice_view(self.values.view(), region)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_read_region_borrows_storage() {
        let data = CubeData::dimensionless(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn());
        let chunk = data.read_region(&[1..2, 0..2]).unwrap();
        assert!(chunk.is_view());
        assert_eq!(chunk.iter().copied().collect::<Vec<f64>>(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_clones_share_storage() {
        let data = CubeData::dimensionless(array![1.0f32, 2.0].into_dyn());
        let other = data.clone();
        assert!(data.shares_storage(&other));

        let copy = CubeData::dimensionless(array![1.0f32, 2.0].into_dyn());
        assert!(!data.shares_storage(&copy));
    }

    #[test]
    fn test_from_shape_vec_checks_length() {
        let ok = CubeData::from_shape_vec(&[2, 2], vec![0.0f64; 4], Unit::dimensionless());
        assert!(ok.is_ok());
        let bad = CubeData::from_shape_vec(&[2, 3], vec![0.0f64; 4], Unit::dimensionless());
        assert!(matches!(bad, Err(MaskError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_element_from_f64() {
        assert_eq!(element_from_f64::<f32>(2.5).unwrap(), 2.5f32);
        assert!(element_from_f64::<f64>(f64::NAN).unwrap().is_nan());
    }
}
