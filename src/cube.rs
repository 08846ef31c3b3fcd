// In: src/cube.rs

//! The masked data cube.
//!
//! A `MaskedCube` pairs shared, read-only pixel storage with an optional mask and a fill
//! value. Every "modification" (`with_mask`, `with_fill_value`, ...) returns a new cube
//! that points at the same storage, so deriving cubes never copies pixels. The only
//! accessor that allocates pixel data is `filled_data`, because it overwrites excluded
//! positions.

use crate::config::CubeConfig;
use crate::coordinates::{optional_wcs_match, Wcs};
use crate::data::{element_from_f64, CubeData, DataSource, Element};
use crate::error::{MaskError, Result};
use crate::masks::{BooleanArrayMask, CompareOp, ComparisonMask, FunctionMask, Mask};
use crate::region::Region;
use crate::shape::is_broadcastable_and_smaller;
use crate::units::{Quantity, Unit};
use ndarray::{ArcArray, ArrayD, CowArray, IxDyn, Zip};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

//==================================================================================
// 1. Mask Input
//==================================================================================

/// Anything `with_mask` accepts: a ready mask, or a raw boolean array that will be
/// wrapped as a `BooleanArrayMask` carrying the cube's WCS.
#[derive(Debug, Clone)]
pub enum MaskInput {
    Mask(Mask),
    Array(ArcArray<bool, IxDyn>),
}

impl From<Mask> for MaskInput {
    fn from(mask: Mask) -> Self {
        MaskInput::Mask(mask)
    }
}

impl From<&Mask> for MaskInput {
    fn from(mask: &Mask) -> Self {
        MaskInput::Mask(mask.clone())
    }
}

impl From<BooleanArrayMask> for MaskInput {
    fn from(mask: BooleanArrayMask) -> Self {
        MaskInput::Mask(mask.into())
    }
}

impl From<ArrayD<bool>> for MaskInput {
    fn from(array: ArrayD<bool>) -> Self {
        MaskInput::Array(array.into_shared())
    }
}

impl From<ArcArray<bool, IxDyn>> for MaskInput {
    fn from(array: ArcArray<bool, IxDyn>) -> Self {
        MaskInput::Array(array)
    }
}

impl MaskInput {
    /// Validates the input against a data shape and turns it into a `Mask`.
    /// Raw arrays are checked before they are wrapped, so no data is touched on failure.
    pub(crate) fn into_mask(
        self,
        shape: &[usize],
        wcs: Option<&Arc<Wcs>>,
        check_coordinates: bool,
    ) -> Result<Mask> {
        let mask = match self {
            MaskInput::Array(array) => {
                if !is_broadcastable_and_smaller(array.shape(), shape) {
                    return Err(MaskError::shape_mismatch(shape, array.shape()));
                }
                BooleanArrayMask::from_shared(array, wcs.cloned()).into()
            }
            MaskInput::Mask(mask) => {
                if !is_broadcastable_and_smaller(mask.shape(), shape) {
                    return Err(MaskError::shape_mismatch(shape, mask.shape()));
                }
                if check_coordinates && !optional_wcs_match(mask.wcs(), wcs.map(|w| &**w)) {
                    return Err(MaskError::CoordinateMismatch(
                        "mask WCS does not match the cube WCS".to_string(),
                    ));
                }
                mask
            }
        };
        Ok(mask)
    }
}

//==================================================================================
// 2. The Masked Cube
//==================================================================================

#[derive(Clone)]
pub struct MaskedCube<T: Element> {
    data: Arc<dyn DataSource<T>>,
    wcs: Option<Arc<Wcs>>,
    mask: Option<Mask>,
    fill_value: T,
    meta: BTreeMap<String, String>,
    config: Arc<CubeConfig>,
}

impl<T: Element> MaskedCube<T> {
    /// A cube over `data` with no mask, no WCS and a NaN fill value.
    pub fn new(data: Arc<dyn DataSource<T>>) -> Self {
        Self {
            data,
            wcs: None,
            mask: None,
            fill_value: T::nan(),
            meta: BTreeMap::new(),
            config: Arc::new(CubeConfig::default()),
        }
    }

    /// A cube whose fill value and validation behaviour come from `config`.
    pub fn from_config(data: Arc<dyn DataSource<T>>, config: &Arc<CubeConfig>) -> Result<Self> {
        let fill_value = element_from_f64(config.fill_value_or_nan())?;
        Ok(Self {
            fill_value,
            config: Arc::clone(config),
            ..Self::new(data)
        })
    }

    /// Wraps an in-memory array. `unit` falls back to the config's `default_unit`.
    pub fn from_array(
        values: ArrayD<T>,
        unit: Option<Unit>,
        config: &Arc<CubeConfig>,
    ) -> Result<Self> {
        let unit = match unit {
            Some(unit) => unit,
            None => config.default_unit()?,
        };
        Self::from_config(Arc::new(CubeData::new(values, unit)), config)
    }

    // --- Accessors ---

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn unit(&self) -> &Unit {
        self.data.unit()
    }

    pub fn wcs(&self) -> Option<&Wcs> {
        self.wcs.as_deref()
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn fill_value(&self) -> T {
        self.fill_value
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    /// The raw data handle. Derived cubes return the same `Arc`.
    pub fn data(&self) -> &Arc<dyn DataSource<T>> {
        &self.data
    }

    pub fn shares_data_with(&self, other: &MaskedCube<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // --- Derivation (all non-mutating) ---

    /// Attaches a WCS. With coordinate checks enabled it must have one axis per
    /// data dimension.
    pub fn with_wcs(&self, wcs: Wcs) -> Result<Self> {
        if self.config.check_coordinates && wcs.naxis() != self.ndim() {
            return Err(MaskError::CoordinateMismatch(format!(
                "WCS has {} axes but the data has {} dimensions",
                wcs.naxis(),
                self.ndim()
            )));
        }
        Ok(Self {
            wcs: Some(Arc::new(wcs)),
            ..self.clone()
        })
    }

    /// A new cube whose mask is the current mask AND `mask`.
    ///
    /// This returns a view onto the same data, not a copy.
    pub fn with_mask(&self, mask: impl Into<MaskInput>) -> Result<Self> {
        let mask = self.resolve_mask(mask.into())?;
        let combined = match &self.mask {
            Some(existing) => existing.and_checked(&mask, self.config.check_coordinates)?,
            None => mask,
        };
        log::debug!(
            "attached mask to cube of shape {:?} (depth {})",
            self.shape(),
            combined.depth()
        );
        Ok(Self {
            mask: Some(combined),
            ..self.clone()
        })
    }

    /// A new cube carrying `mask` alone, discarding the current mask.
    pub fn with_mask_replacing(&self, mask: impl Into<MaskInput>) -> Result<Self> {
        let mask = self.resolve_mask(mask.into())?;
        Ok(Self {
            mask: Some(mask),
            ..self.clone()
        })
    }

    pub fn with_fill_value(&self, fill_value: T) -> Self {
        Self {
            fill_value,
            ..self.clone()
        }
    }

    pub fn with_meta(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut meta = self.meta.clone();
        meta.insert(key.into(), value.into());
        Self { meta, ..self.clone() }
    }

    pub(crate) fn check_coordinates(&self) -> bool {
        self.config.check_coordinates
    }

    pub(crate) fn resolve_mask(&self, input: MaskInput) -> Result<Mask> {
        input.into_mask(self.shape(), self.wcs.as_ref(), self.config.check_coordinates)
    }

    // --- Mask Factories ---

    /// A lazy mask comparing this cube's data against `threshold`.
    /// The threshold's unit is checked against the data unit when the mask is evaluated.
    pub fn compare(&self, op: CompareOp, threshold: impl Into<Quantity>) -> Mask {
        ComparisonMask::new(Arc::clone(&self.data), op, threshold, self.wcs.clone()).into()
    }

    pub fn gt(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Gt, threshold)
    }

    pub fn ge(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Ge, threshold)
    }

    pub fn lt(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Lt, threshold)
    }

    pub fn le(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Le, threshold)
    }

    pub fn equal_to(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Eq, threshold)
    }

    pub fn not_equal_to(&self, threshold: impl Into<Quantity>) -> Mask {
        self.compare(CompareOp::Ne, threshold)
    }

    /// A lazy mask including only finite values.
    pub fn finite_mask(&self) -> Mask {
        FunctionMask::elementwise(Arc::clone(&self.data), |v: T| v.is_finite(), self.wcs.clone())
            .into()
    }

    // --- Masked Access ---

    /// Included elements of `region`; everything when no mask is attached.
    pub fn include(&self, region: &Region) -> Result<ArrayD<bool>> {
        let ranges = region.resolve(self.shape())?;
        self.include_ranges(&ranges)
    }

    /// Logical complement of [`MaskedCube::include`].
    pub fn exclude(&self, region: &Region) -> Result<ArrayD<bool>> {
        let mut included = self.include(region)?;
        included.mapv_inplace(|b| !b);
        Ok(included)
    }

    fn include_ranges(&self, ranges: &[Range<usize>]) -> Result<ArrayD<bool>> {
        match &self.mask {
            Some(mask) => mask.evaluate_in(self.shape(), ranges),
            None => Ok(ArrayD::from_elem(IxDyn(&crate::shape::region_shape(ranges)), true)),
        }
    }

    /// The raw data of `region`, ignoring the mask. Borrows in-memory storage.
    pub fn unmasked_data(&self, region: &Region) -> Result<CowArray<'_, T, IxDyn>> {
        let ranges = region.resolve(self.shape())?;
        self.data.read_region(&ranges)
    }

    /// A fresh array of `region` with every excluded element replaced by the fill value.
    pub fn filled_data(&self, region: &Region) -> Result<ArrayD<T>> {
        let ranges = region.resolve(self.shape())?;
        let included = self.include_ranges(&ranges)?;
        let mut filled = self.data.read_region(&ranges)?.into_owned();
        let fill = self.fill_value;
        Zip::from(&mut filled).and(&included).for_each(|value, &keep| {
            if !keep {
                *value = fill;
            }
        });
        log::debug!("filled {} elements over {:?}", filled.len(), ranges);
        Ok(filled)
    }

    /// The included values of the whole cube in row-major order.
    ///
    /// The sequence is produced one plane (index of axis 0) at a time, so only a single
    /// plane of data and mask is held at once. Each call starts a new pass.
    pub fn flattened(&self) -> Flattened<'_, T> {
        let planes = match self.shape().first() {
            Some(&len) => len,
            None => 1,
        };
        Flattened {
            cube: self,
            next_plane: 0,
            planes,
            buffer: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Number of included elements.
    pub fn count_included(&self) -> Result<usize> {
        let included = self.include(&Region::full())?;
        Ok(included.iter().filter(|&&b| b).count())
    }

    fn plane_values(&self, plane: usize) -> Result<Vec<T>> {
        let mut ranges = crate::region::full_ranges(self.shape());
        if let Some(first) = ranges.first_mut() {
            *first = plane..plane + 1;
        }
        let included = self.include_ranges(&ranges)?;
        let values = self.data.read_region(&ranges)?;
        Ok(values
            .iter()
            .zip(included.iter())
            .filter(|&(_, &keep)| keep)
            .map(|(&v, _)| v)
            .collect())
    }
}

impl<T: Element> fmt::Debug for MaskedCube<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedCube")
            .field("shape", &self.shape())
            .field("unit", self.unit())
            .field("masked", &self.mask.is_some())
            .field("fill_value", &self.fill_value)
            .finish()
    }
}

//==================================================================================
// 3. Flattened Iteration
//==================================================================================

/// Lazy, row-major sequence of a cube's included values. Stops after the first error.
pub struct Flattened<'a, T: Element> {
    cube: &'a MaskedCube<T>,
    next_plane: usize,
    planes: usize,
    buffer: std::vec::IntoIter<T>,
    failed: bool,
}

impl<T: Element> Iterator for Flattened<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(value) = self.buffer.next() {
                return Some(Ok(value));
            }
            if self.failed || self.next_plane >= self.planes {
                return None;
            }
            let plane = self.next_plane;
            self.next_plane += 1;
            match self.cube.plane_values(plane) {
                Ok(values) => self.buffer = values.into_iter(),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<T: Element> std::iter::FusedIterator for Flattened<'_, T> {}

#[cfg(test)]
#[path = "cube_tests.rs"]
mod tests;
