//! Composite masks built with boolean algebra.
//!
//! A composite holds one (NOT) or two (AND / OR) operand masks. Evaluating it asks each
//! operand for the *same* region and combines the results element-wise. Nesting depth
//! is tracked at construction and capped at [`MAX_MASK_DEPTH`].

use super::{Mask, MaskBase, MAX_MASK_DEPTH};
use crate::coordinates::{optional_wcs_match, Wcs};
use crate::error::{MaskError, Result};
use crate::shape::broadcast_shape;
use ndarray::{ArrayD, Zip};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

#[derive(Debug)]
pub struct CompositeMask {
    op: BoolOp,
    left: Mask,
    right: Option<Mask>,
    shape: Vec<usize>,
    depth: usize,
}

impl CompositeMask {
    /// Combines two masks with AND or OR.
    ///
    /// Fails immediately if the shapes do not broadcast together, if both operands carry
    /// differing coordinates, or if the result would nest too deeply.
    pub fn binary(op: BoolOp, left: Mask, right: Mask) -> Result<Self> {
        Self::combine(op, left, right, true)
    }

    /// As [`CompositeMask::binary`], with the WCS comparison optional. Cubes built with
    /// coordinate checks disabled combine masks through this path.
    pub(crate) fn combine(op: BoolOp, left: Mask, right: Mask, check_wcs: bool) -> Result<Self> {
        if op == BoolOp::Not {
            return Ok(Self::negate(left));
        }

        let shape = broadcast_shape(left.shape(), right.shape())
            .ok_or_else(|| MaskError::shape_mismatch(left.shape(), right.shape()))?;

        if check_wcs && !optional_wcs_match(left.wcs(), right.wcs()) {
            return Err(MaskError::CoordinateMismatch(
                "cannot combine masks with different WCS".to_string(),
            ));
        }

        let depth = left.depth().max(right.depth()) + 1;
        if depth > MAX_MASK_DEPTH {
            return Err(MaskError::MaskTooDeep(depth));
        }

        Ok(Self {
            op,
            left,
            right: Some(right),
            shape,
            depth,
        })
    }

    /// The complement of `operand`.
    ///
    /// Negation is infallible and is not held to [`MAX_MASK_DEPTH`]. Since a NOT of a NOT
    /// collapses in [`Mask::not`], an expression is at most `MAX_MASK_DEPTH + 1` deep.
    pub fn negate(operand: Mask) -> Self {
        Self {
            op: BoolOp::Not,
            shape: operand.shape().to_vec(),
            depth: operand.depth() + 1,
            left: operand,
            right: None,
        }
    }

    pub fn op(&self) -> BoolOp {
        self.op
    }

    pub fn left(&self) -> &Mask {
        &self.left
    }

    pub fn right(&self) -> Option<&Mask> {
        self.right.as_ref()
    }

    pub fn operands(&self) -> Vec<&Mask> {
        std::iter::once(&self.left).chain(self.right.as_ref()).collect()
    }
}

impl MaskBase for CompositeMask {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn wcs(&self) -> Option<&Wcs> {
        self.left
            .wcs()
            .or_else(|| self.right.as_ref().and_then(|m| m.wcs()))
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn evaluate(&self, region: &[Range<usize>]) -> Result<ArrayD<bool>> {
        let mut acc = self.left.evaluate_in(&self.shape, region)?;

        let right = match (&self.op, &self.right) {
            (BoolOp::Not, _) | (_, None) => {
                acc.mapv_inplace(|b| !b);
                return Ok(acc);
            }
            (_, Some(right)) => right.evaluate_in(&self.shape, region)?,
        };

        match self.op {
            BoolOp::And => Zip::from(&mut acc).and(&right).for_each(|a, &b| *a = *a && b),
            BoolOp::Or => Zip::from(&mut acc).and(&right).for_each(|a, &b| *a = *a || b),
            BoolOp::Not => unreachable!("NOT composites have no right operand"),
        }
        Ok(acc)
    }

    fn as_composite(&self) -> Option<&CompositeMask> {
        Some(self)
    }
}
