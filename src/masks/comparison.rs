//! The lazy comparison mask.
//!
//! This is what `MaskedCube::gt`, `ge` and friends build. It compares each element of
//! the requested slice against a threshold carrying a physical unit. The unit check is
//! deferred to evaluation time because the data unit is only queried then.

use super::MaskBase;
use crate::coordinates::Wcs;
use crate::data::{element_from_f64, DataSource, Element};
use crate::error::Result;
use crate::units::Quantity;
use ndarray::ArrayD;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    /// IEEE semantics: every comparison with NaN is false except `Ne`.
    pub fn apply<T: PartialOrd>(self, value: T, threshold: T) -> bool {
        match self {
            CompareOp::Gt => value > threshold,
            CompareOp::Ge => value >= threshold,
            CompareOp::Lt => value < threshold,
            CompareOp::Le => value <= threshold,
            CompareOp::Eq => value == threshold,
            CompareOp::Ne => value != threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

pub struct ComparisonMask<T: Element> {
    data: Arc<dyn DataSource<T>>,
    op: CompareOp,
    threshold: Quantity,
    wcs: Option<Arc<Wcs>>,
}

impl<T: Element> ComparisonMask<T> {
    pub fn new(
        data: Arc<dyn DataSource<T>>,
        op: CompareOp,
        threshold: impl Into<Quantity>,
        wcs: Option<Arc<Wcs>>,
    ) -> Self {
        Self {
            data,
            op,
            threshold: threshold.into(),
            wcs,
        }
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn threshold(&self) -> &Quantity {
        &self.threshold
    }
}

impl<T: Element> fmt::Debug for ComparisonMask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComparisonMask(data {} {})", self.op, self.threshold)
    }
}

impl<T: Element> MaskBase for ComparisonMask<T> {
    fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    fn wcs(&self) -> Option<&Wcs> {
        self.wcs.as_deref()
    }

    fn evaluate(&self, region: &[Range<usize>]) -> Result<ArrayD<bool>> {
        let values = self.data.read_region(region)?;
        let threshold: T = element_from_f64(self.threshold.to_unit(self.data.unit())?)?;
        let op = self.op;
        Ok(values.mapv(|v| op.apply(v, threshold)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CubeData;
    use crate::error::MaskError;
    use crate::masks::Mask;
    use crate::region::Region;
    use crate::units::Unit;
    use ndarray::array;

    fn kelvin_data(values: ArrayD<f64>) -> Arc<dyn DataSource<f64>> {
        Arc::new(CubeData::new(values, Unit::parse("K").unwrap()))
    }

    #[test]
    fn test_nan_is_never_greater_or_equal() {
        let data: Arc<dyn DataSource<f64>> =
            Arc::new(CubeData::dimensionless(array![1.0, 2.0, 3.0, f64::NAN].into_dyn()));
        let mask: Mask = ComparisonMask::new(data, CompareOp::Ge, 2.0, None).into();
        assert_eq!(
            mask.include(&Region::full()).unwrap(),
            array![false, true, true, false].into_dyn()
        );
    }

    #[test]
    fn test_not_equal_includes_nan() {
        assert!(CompareOp::Ne.apply(f64::NAN, 1.0));
        assert!(!CompareOp::Eq.apply(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_threshold_is_converted_to_data_unit() {
        let data = kelvin_data(array![0.1, 0.5, 1.0].into_dyn());
        let threshold = Quantity::with_symbol(400.0, "mK").unwrap();
        let mask: Mask = ComparisonMask::new(data, CompareOp::Gt, threshold, None).into();
        assert_eq!(
            mask.include(&Region::full()).unwrap(),
            array![false, true, true].into_dyn()
        );
    }

    #[test]
    fn test_unit_mismatch_surfaces_at_evaluation() {
        let data = kelvin_data(array![1.0, 2.0].into_dyn());
        let threshold = Quantity::with_symbol(1.0, "Jy").unwrap();
        // Construction succeeds; the data unit is only consulted lazily.
        let mask: Mask = ComparisonMask::new(data, CompareOp::Lt, threshold, None).into();
        let err = mask.include(&Region::full()).unwrap_err();
        match err {
            MaskError::UnitMismatch {
                data_unit,
                threshold_unit,
            } => {
                assert_eq!(data_unit, "K");
                assert_eq!(threshold_unit, "Jy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_f32_data() {
        let data: Arc<dyn DataSource<f32>> =
            Arc::new(CubeData::dimensionless(array![0.5f32, 1.5, 2.5].into_dyn()));
        let mask: Mask = ComparisonMask::new(data, CompareOp::Le, 1.5, None).into();
        assert_eq!(
            mask.include(&Region::new([1..3])).unwrap(),
            array![true, false].into_dyn()
        );
    }

    #[test]
    fn test_debug_names_operator_and_threshold() {
        let data = kelvin_data(array![1.0].into_dyn());
        let mask = ComparisonMask::new(data, CompareOp::Ge, Quantity::with_symbol(2.0, "K").unwrap(), None);
        assert_eq!(format!("{:?}", mask), "ComparisonMask(data >= 2 K)");
    }
}
