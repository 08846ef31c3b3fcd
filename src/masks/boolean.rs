//! The eager boolean-array mask.
//!
//! This variant materialises its full boolean array: the array is the entire memory
//! cost, and evaluation is a direct lookup. It suits masks that are cheap to store or
//! computed once (e.g. validity flags read from an image). The array is shared, never
//! copied, and may be smaller than the data as long as it broadcasts.

use super::MaskBase;
use crate::coordinates::Wcs;
use crate::error::Result;
use crate::region::slice_view;
use ndarray::{ArcArray, ArrayD, IxDyn};
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BooleanArrayMask {
    mask: ArcArray<bool, IxDyn>,
    wcs: Option<Arc<Wcs>>,
}

impl BooleanArrayMask {
    /// `true` marks an included element.
    pub fn new(mask: ArrayD<bool>, wcs: Option<Arc<Wcs>>) -> Self {
        Self::from_shared(mask.into_shared(), wcs)
    }

    pub fn from_shared(mask: ArcArray<bool, IxDyn>, wcs: Option<Arc<Wcs>>) -> Self {
        Self { mask, wcs }
    }

    pub fn array(&self) -> &ArcArray<bool, IxDyn> {
        &self.mask
    }
}

impl MaskBase for BooleanArrayMask {
    fn shape(&self) -> &[usize] {
        self.mask.shape()
    }

    fn wcs(&self) -> Option<&Wcs> {
        self.wcs.as_deref()
    }

    fn evaluate(&self, region: &[Range<usize>]) -> Result<ArrayD<bool>> {
        Ok(slice_view(self.mask.view(), region).to_owned())
    }
}
