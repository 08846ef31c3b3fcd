//! Broadcasting rules shared by every mask and container.
//!
//! Shapes follow the numpy convention: they are aligned on their trailing axes and an
//! axis of length 1 stretches to match any length.

use std::ops::Range;

/// The shape two operands broadcast to, or `None` if they are incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0; ndim];
    for i in 0..ndim {
        let da = axis_from_end(a, ndim - 1 - i);
        let db = axis_from_end(b, ndim - 1 - i);
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(out)
}

/// Length of the axis `offset` positions from the end, or 1 when the shape is too short.
fn axis_from_end(shape: &[usize], offset: usize) -> usize {
    if offset < shape.len() {
        shape[shape.len() - 1 - offset]
    } else {
        1
    }
}

/// True when an array of shape `source` can be viewed as shape `target` without
/// changing `target`, i.e. the source is broadcastable and no larger.
pub fn is_broadcastable_and_smaller(source: &[usize], target: &[usize]) -> bool {
    if source.len() > target.len() {
        return false;
    }
    let offset = target.len() - source.len();
    source
        .iter()
        .zip(&target[offset..])
        .all(|(&s, &t)| s == t || s == 1)
}

/// Maps a region expressed in `target` coordinates onto the `source` array that is
/// being broadcast to `target`. Stretched axes collapse to their single element.
///
/// The caller must have checked `is_broadcastable_and_smaller(source, target)`.
pub(crate) fn source_region(
    source: &[usize],
    target: &[usize],
    region: &[Range<usize>],
) -> Vec<Range<usize>> {
    let offset = target.len() - source.len();
    source
        .iter()
        .enumerate()
        .map(|(i, &len)| {
            let wanted = &region[i + offset];
            if len == 1 && target[i + offset] != 1 {
                if wanted.is_empty() {
                    0..0
                } else {
                    0..1
                }
            } else {
                wanted.clone()
            }
        })
        .collect()
}

pub(crate) fn region_shape(region: &[Range<usize>]) -> Vec<usize> {
    region.iter().map(|r| r.end - r.start).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shape_numpy_rules() {
        assert_eq!(broadcast_shape(&[5, 1, 30], &[20, 1]), Some(vec![5, 20, 30]));
        assert_eq!(broadcast_shape(&[3], &[3]), Some(vec![3]));
        assert_eq!(broadcast_shape(&[], &[4, 2]), Some(vec![4, 2]));
        assert_eq!(broadcast_shape(&[5, 20, 15], &[5, 20, 30]), None);
    }

    #[test]
    fn test_broadcastable_and_smaller() {
        assert!(is_broadcastable_and_smaller(&[20, 30], &[5, 20, 30]));
        assert!(is_broadcastable_and_smaller(&[1, 20, 1], &[5, 20, 30]));
        assert!(is_broadcastable_and_smaller(&[5, 20, 30], &[5, 20, 30]));
        // Broadcastable, but it would grow the data shape.
        assert!(!is_broadcastable_and_smaller(&[5, 20, 30], &[20, 30]));
        assert!(!is_broadcastable_and_smaller(&[5, 20, 15], &[5, 20, 30]));
        assert!(!is_broadcastable_and_smaller(&[1, 5, 20, 30], &[5, 20, 30]));
    }

    #[test]
    fn test_source_region_collapses_stretched_axes() {
        let mapped = source_region(&[1, 4], &[3, 2, 4], &[0..3, 1..2, 1..3]);
        assert_eq!(mapped, vec![0..1, 1..3]);

        let empty = source_region(&[1], &[6], &[2..2]);
        assert_eq!(empty, vec![0..0]);
    }

    #[test]
    fn test_region_shape() {
        assert_eq!(region_shape(&[0..3, 2..2, 1..5]), vec![3, 0, 4]);
    }
}
