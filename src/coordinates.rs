//! World-coordinate descriptors.
//!
//! The masking core never transforms coordinates. It only needs to know whether two
//! descriptors describe the same grid, so `Wcs` is a plain, serialisable record of the
//! FITS-style axis keywords with an equality check.

use serde::{Deserialize, Serialize};

/// Relative tolerance used when comparing the numeric keywords of two descriptors.
const WCS_TOLERANCE: f64 = 1e-10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Wcs {
    /// Axis types, e.g. `RA---TAN`, `DEC--TAN`, `FREQ`.
    pub ctype: Vec<String>,
    #[serde(default)]
    pub cunit: Vec<String>,
    #[serde(default)]
    pub crpix: Vec<f64>,
    #[serde(default)]
    pub crval: Vec<f64>,
    #[serde(default)]
    pub cdelt: Vec<f64>,
}

impl Wcs {
    /// A descriptor with the given axis types and default (unit) numeric keywords.
    pub fn new<S: Into<String>>(ctype: impl IntoIterator<Item = S>) -> Self {
        let ctype: Vec<String> = ctype.into_iter().map(Into::into).collect();
        let n = ctype.len();
        Self {
            ctype,
            cunit: vec![String::new(); n],
            crpix: vec![0.0; n],
            crval: vec![0.0; n],
            cdelt: vec![1.0; n],
        }
    }

    /// The common RA/DEC/FREQ layout of a position-position-spectral cube.
    pub fn spectral_cube() -> Self {
        let mut wcs = Self::new(["RA---TAN", "DEC--TAN", "FREQ"]);
        wcs.cunit = vec!["deg".into(), "deg".into(), "Hz".into()];
        wcs
    }

    pub fn naxis(&self) -> usize {
        self.ctype.len()
    }

    /// True when both descriptors describe the same grid.
    pub fn check_equality(&self, other: &Wcs) -> bool {
        self.ctype == other.ctype
            && self.cunit == other.cunit
            && values_close(&self.crpix, &other.crpix)
            && values_close(&self.crval, &other.crval)
            && values_close(&self.cdelt, &other.cdelt)
    }
}

fn values_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(&x, &y)| {
            x == y || (x - y).abs() <= WCS_TOLERANCE * x.abs().max(y.abs())
        })
}

/// Compares two optional descriptors. A missing descriptor on either side is not a
/// mismatch, since there is nothing to validate against.
pub(crate) fn optional_wcs_match(a: Option<&Wcs>, b: Option<&Wcs>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.check_equality(b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_descriptors_are_equal() {
        assert!(Wcs::spectral_cube().check_equality(&Wcs::spectral_cube()));
    }

    #[test]
    fn test_projection_change_breaks_equality() {
        let a = Wcs::new(["RA---TAN", "DEC--TAN", "FREQ"]);
        let b = Wcs::new(["GLON-CAR", "GLAT-CAR", "FREQ"]);
        assert!(!a.check_equality(&b));
    }

    #[test]
    fn test_numeric_keywords_use_tolerance() {
        let mut c = Wcs::spectral_cube();
        c.crval = vec![10.0, 20.0, 1.42e9];
        let mut d = c.clone();
        d.crval[2] = 1.42e9 * (1.0 + 1e-13);
        assert!(c.check_equality(&d));
        d.crval[2] = 1.43e9;
        assert!(!c.check_equality(&d));
    }

    #[test]
    fn test_optional_match_ignores_missing_side() {
        let wcs = Wcs::spectral_cube();
        assert!(optional_wcs_match(Some(&wcs), None));
        assert!(optional_wcs_match(None, None));
        assert!(!optional_wcs_match(Some(&wcs), Some(&Wcs::new(["X", "Y", "Z"]))));
    }

    #[test]
    fn test_deserialize_with_only_ctype() {
        let wcs: Wcs = serde_json::from_str(r#"{"ctype": ["RA---SIN", "DEC--SIN"]}"#).unwrap();
        assert_eq!(wcs.naxis(), 2);
        assert!(wcs.cdelt.is_empty());
    }
}
