//! Packed bitmaps for handing masks to export tooling.
//!
//! Image formats store masks as one bit per pixel. These helpers pack a mask's
//! `include` result row-major into a `bitvec` bitmap and rebuild an eager mask from
//! such a bitmap.

use super::{BooleanArrayMask, Mask};
use crate::coordinates::Wcs;
use crate::error::{MaskError, Result};
use crate::region::Region;
use bitvec::prelude::*;
use ndarray::{ArrayD, IxDyn};
use std::sync::Arc;

/// Row-major validity bitmap; bit `i` is set when element `i` is included.
pub type MaskBitmap = BitVec<u8, Lsb0>;

impl Mask {
    /// Packs the mask, broadcast to `shape`, into a bitmap.
    pub fn to_bitmap(&self, shape: &[usize]) -> Result<MaskBitmap> {
        let included = self.include_for(shape, None, &Region::full())?;
        Ok(included.iter().copied().collect())
    }
}

impl BooleanArrayMask {
    /// Rebuilds an eager mask from a bitmap produced by [`Mask::to_bitmap`].
    pub fn from_bitmap(
        bits: &BitSlice<u8, Lsb0>,
        shape: &[usize],
        wcs: Option<Arc<Wcs>>,
    ) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if bits.len() != expected {
            return Err(MaskError::shape_mismatch(shape, &[bits.len()]));
        }
        let values: Vec<bool> = bits.iter().by_vals().collect();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|_| MaskError::shape_mismatch(shape, &[bits.len()]))?;
        Ok(Self::new(array, wcs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bitmap_is_row_major_lsb_first() {
        let mask: Mask = BooleanArrayMask::new(
            array![[true, false, true], [false, false, true]].into_dyn(),
            None,
        )
        .into();
        let bits = mask.to_bitmap(&[2, 3]).unwrap();
        assert_eq!(bits.len(), 6);
        assert_eq!(bits.as_raw_slice(), &[0b0010_0101]);
    }

    #[test]
    fn test_bitmap_of_broadcast_mask() {
        let mask: Mask = BooleanArrayMask::new(array![true, false].into_dyn(), None).into();
        let bits = mask.to_bitmap(&[3, 2]).unwrap();
        assert_eq!(bits.count_ones(), 3);
    }

    #[test]
    fn test_rebuild_from_bitmap() {
        let original = array![[false, true], [true, true]].into_dyn();
        let mask: Mask = BooleanArrayMask::new(original.clone(), None).into();
        let bits = mask.to_bitmap(&[2, 2]).unwrap();

        let rebuilt: Mask = BooleanArrayMask::from_bitmap(&bits, &[2, 2], None).unwrap().into();
        assert_eq!(rebuilt.include(&Region::full()).unwrap(), original);
    }

    #[test]
    fn test_bitmap_length_must_match_shape() {
        let bits = bitvec![u8, Lsb0; 1, 0, 1];
        let result = BooleanArrayMask::from_bitmap(&bits, &[2, 2], None);
        assert!(matches!(result, Err(MaskError::ShapeMismatch { .. })));
    }
}
