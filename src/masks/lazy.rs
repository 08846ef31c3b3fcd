//! The lazy function mask.
//!
//! Holds a reference to a data source and a predicate. Nothing is computed at
//! construction; each evaluation reads only the requested slice and runs the predicate
//! on it. The predicate may be called many times for overlapping regions, so it must
//! be pure.

use super::MaskBase;
use crate::coordinates::Wcs;
use crate::data::{DataSource, Element};
use crate::error::{MaskError, Result};
use ndarray::{ArrayD, ArrayViewD};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Evaluates a predicate on a data slice, returning a boolean array of the slice's
/// shape (or anything that broadcasts to it, such as a 0-d scalar result).
pub trait Predicate<T: Element>: Send + Sync {
    fn evaluate(&self, values: ArrayViewD<'_, T>) -> ArrayD<bool>;
}

impl<T, F> Predicate<T> for F
where
    T: Element,
    F: Fn(ArrayViewD<'_, T>) -> ArrayD<bool> + Send + Sync,
{
    fn evaluate(&self, values: ArrayViewD<'_, T>) -> ArrayD<bool> {
        self(values)
    }
}

pub struct FunctionMask<T: Element> {
    data: Arc<dyn DataSource<T>>,
    predicate: Arc<dyn Predicate<T>>,
    wcs: Option<Arc<Wcs>>,
}

impl<T: Element> FunctionMask<T> {
    /// A mask computed by `predicate` over slices of `data`.
    pub fn new<F>(data: Arc<dyn DataSource<T>>, predicate: F, wcs: Option<Arc<Wcs>>) -> Self
    where
        F: Fn(ArrayViewD<'_, T>) -> ArrayD<bool> + Send + Sync + 'static,
    {
        Self::with_predicate(data, Arc::new(predicate), wcs)
    }

    /// Same as [`FunctionMask::new`] for predicates implemented as types.
    pub fn with_predicate(
        data: Arc<dyn DataSource<T>>,
        predicate: Arc<dyn Predicate<T>>,
        wcs: Option<Arc<Wcs>>,
    ) -> Self {
        Self {
            data,
            predicate,
            wcs,
        }
    }

    /// A mask applying a scalar test to every element, e.g. `f64::is_finite`.
    pub fn elementwise<F>(data: Arc<dyn DataSource<T>>, test: F, wcs: Option<Arc<Wcs>>) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        Self::new(data, move |values: ArrayViewD<'_, T>| values.mapv(&test), wcs)
    }
}

impl<T: Element> fmt::Debug for FunctionMask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionMask")
            .field("data", &self.data)
            .field("wcs", &self.wcs)
            .finish_non_exhaustive()
    }
}

impl<T: Element> MaskBase for FunctionMask<T> {
    fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    fn wcs(&self) -> Option<&Wcs> {
        self.wcs.as_deref()
    }

    fn evaluate(&self, region: &[Range<usize>]) -> Result<ArrayD<bool>> {
        let values = self.data.read_region(region)?;
        let result = self.predicate.evaluate(values.view());
        if result.shape() == values.shape() {
            return Ok(result);
        }
        match result.broadcast(values.raw_dim()) {
            Some(view) => Ok(view.to_owned()),
            None => Err(MaskError::shape_mismatch(values.shape(), result.shape())),
        }
    }
}
