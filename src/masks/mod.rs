// In: src/masks/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Mask Layer
// ====================================================================================
//
// Every mask answers one question: "for this region of this shape, which elements are
// included?". Variants implement `MaskBase::evaluate` over their *own* shape; the
// `Mask` handle owns everything else:
//
//   1. [Mask::include_for(shape, wcs, region)]
//         |
//         `-> validates WCS, resolves `Region` against the caller's shape
//         |
//   2. [Mask::evaluate_in(target, ranges)]
//         |
//         `-> checks the mask broadcasts to `target`
//         `-> maps `ranges` back into the mask's own shape (stretched axes -> 0..1)
//         `-> calls the variant's `evaluate` on that small region only
//         `-> broadcasts the result up to the requested region shape
//
//   3. [Mask::exclude_for] -> `!include_for`, never implemented per variant.
//
// Composite masks recurse through step 2 for each operand over the same region, so a
// lazy operand deep inside an expression still only reads the requested slice.
// ====================================================================================

pub mod bitmap;
pub mod boolean;
pub mod comparison;
pub mod composite;
pub mod lazy;


pub use boolean::BooleanArrayMask;
pub use comparison::{CompareOp, ComparisonMask};
pub use composite::{BoolOp, CompositeMask};
pub use lazy::{FunctionMask, Predicate};

use crate::coordinates::{optional_wcs_match, Wcs};
use crate::error::{MaskError, Result};
use crate::region::Region;
use crate::shape::{is_broadcastable_and_smaller, region_shape, source_region};
use ndarray::{ArrayD, IxDyn};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Range};
use std::sync::Arc;

/// Deepest composite expression `Mask::and` / `Mask::or` will build.
/// Evaluation recurses once per level, so this bounds stack use. A single NOT on top
/// may add one more level.
pub const MAX_MASK_DEPTH: usize = 256;

//==================================================================================
// 1. The Variant Contract
//==================================================================================

/// Implemented by every concrete mask kind.
///
/// Variants only describe how to compute the included elements of a region of their
/// own shape. Broadcasting, coordinate validation and the `exclude` view are provided
/// once by [`Mask`].
pub trait MaskBase: fmt::Debug + Send + Sync {
    fn shape(&self) -> &[usize];

    fn wcs(&self) -> Option<&Wcs> {
        None
    }

    /// Nesting depth of the expression rooted at this mask.
    fn depth(&self) -> usize {
        1
    }

    /// Included elements of `region`, which is resolved against `shape()`.
    /// The result must have the region's shape.
    fn evaluate(&self, region: &[Range<usize>]) -> Result<ArrayD<bool>>;

    fn as_composite(&self) -> Option<&CompositeMask> {
        None
    }
}

//==================================================================================
// 2. The Mask Handle
//==================================================================================

/// A cheap, shareable, immutable handle to any mask variant.
#[derive(Clone)]
pub struct Mask {
    inner: Arc<dyn MaskBase>,
}

impl Mask {
    pub fn new(variant: impl MaskBase + 'static) -> Self {
        Self {
            inner: Arc::new(variant),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.inner.shape()
    }

    pub fn wcs(&self) -> Option<&Wcs> {
        self.inner.wcs()
    }

    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    pub fn variant(&self) -> &dyn MaskBase {
        self.inner.as_ref()
    }

    /// True when both handles refer to the same mask instance.
    pub fn ptr_eq(&self, other: &Mask) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }

    // --- Evaluation ---

    /// Included elements of `region`, resolved against the mask's own shape.
    pub fn include(&self, region: &Region) -> Result<ArrayD<bool>> {
        let shape = self.shape().to_vec();
        self.include_for(&shape, None, region)
    }

    /// Logical complement of [`Mask::include`] over the same region.
    pub fn exclude(&self, region: &Region) -> Result<ArrayD<bool>> {
        let mut included = self.include(region)?;
        included.mapv_inplace(|b| !b);
        Ok(included)
    }

    /// Included elements of `region` of data with the given `shape` and coordinates.
    /// The mask is broadcast to `shape`; a WCS on both sides must agree.
    pub fn include_for(
        &self,
        shape: &[usize],
        wcs: Option<&Wcs>,
        region: &Region,
    ) -> Result<ArrayD<bool>> {
        if !optional_wcs_match(self.wcs(), wcs) {
            return Err(MaskError::CoordinateMismatch(
                "mask WCS does not match the data WCS".to_string(),
            ));
        }
        let ranges = region.resolve(shape)?;
        self.evaluate_in(shape, &ranges)
    }

    /// Logical complement of [`Mask::include_for`] over the same region.
    pub fn exclude_for(
        &self,
        shape: &[usize],
        wcs: Option<&Wcs>,
        region: &Region,
    ) -> Result<ArrayD<bool>> {
        let mut included = self.include_for(shape, wcs, region)?;
        included.mapv_inplace(|b| !b);
        Ok(included)
    }

    /// Evaluates the mask broadcast to `target` over already-resolved `ranges`.
    pub(crate) fn evaluate_in(&self, target: &[usize], ranges: &[Range<usize>]) -> Result<ArrayD<bool>> {
        let own = self.shape();
        if !is_broadcastable_and_smaller(own, target) {
            return Err(MaskError::shape_mismatch(target, own));
        }

        let mapped = source_region(own, target, ranges);
        log::trace!("evaluating mask of shape {:?} over {:?} (target {:?})", own, mapped, target);
        let result = self.inner.evaluate(&mapped)?;

        let wanted = region_shape(ranges);
        if result.shape() == wanted.as_slice() {
            return Ok(result);
        }
        result
            .broadcast(IxDyn(&wanted))
            .map(|view| view.to_owned())
            .ok_or_else(|| MaskError::shape_mismatch(&wanted, result.shape()))
    }

    // --- Boolean Algebra ---

    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.and_checked(other, true)
    }

    /// AND with the WCS comparison optional, for cubes with coordinate checks disabled.
    pub(crate) fn and_checked(&self, other: &Mask, check_wcs: bool) -> Result<Mask> {
        if self.has_conjunct(other) {
            return Ok(self.clone());
        }
        if other.has_conjunct(self) {
            return Ok(other.clone());
        }
        let combined = CompositeMask::combine(BoolOp::And, self.clone(), other.clone(), check_wcs)?;
        log::debug!("combined masks with AND (depth {})", combined.depth());
        Ok(Mask::new(combined))
    }

    pub fn or(&self, other: &Mask) -> Result<Mask> {
        if self.ptr_eq(other) {
            return Ok(self.clone());
        }
        let combined = CompositeMask::binary(BoolOp::Or, self.clone(), other.clone())?;
        log::debug!("combined masks with OR (depth {})", combined.depth());
        Ok(Mask::new(combined))
    }

    /// The complement mask. Negating a negation hands back the original operand.
    pub fn not(&self) -> Mask {
        if let Some(composite) = self.inner.as_composite() {
            if composite.op() == BoolOp::Not {
                return composite.left().clone();
            }
        }
        Mask::new(CompositeMask::negate(self.clone()))
    }

    /// True when `other` is this mask or one of the operands of its AND chain.
    fn has_conjunct(&self, other: &Mask) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match self.inner.as_composite() {
            Some(composite) if composite.op() == BoolOp::And => composite
                .operands()
                .into_iter()
                .any(|operand| operand.has_conjunct(other)),
            _ => false,
        }
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<M: MaskBase + 'static> From<M> for Mask {
    fn from(variant: M) -> Self {
        Mask::new(variant)
    }
}

//==================================================================================
// 3. Operator Sugar
//==================================================================================

impl BitAnd for &Mask {
    type Output = Result<Mask>;

    fn bitand(self, rhs: &Mask) -> Result<Mask> {
        self.and(rhs)
    }
}

impl BitOr for &Mask {
    type Output = Result<Mask>;

    fn bitor(self, rhs: &Mask) -> Result<Mask> {
        self.or(rhs)
    }
}

impl Not for &Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask::not(self)
    }
}
