//! Physical units and quantities.
//!
//! This is the unit half of the coordinate service: it answers "are these two units
//! equivalent?" and "by what factor do I scale a value from one to the other?". Units
//! are modelled as a `Dimension` plus a scale relative to that dimension's base unit,
//! which is all the lazy comparison mask needs.

use crate::error::{MaskError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The physical kind of a unit. Two units are equivalent iff their dimensions match.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Dimensionless,
    /// Brightness temperature (base: K).
    Temperature,
    /// Flux density (base: Jy).
    FluxDensity,
    /// Surface brightness per beam (base: Jy/beam).
    BeamFluxDensity,
    /// Base: Hz.
    Frequency,
    /// Base: m/s.
    Velocity,
    /// Base: m.
    Length,
    /// Base: deg.
    Angle,
    /// Base: s.
    Time,
}

/// Base symbols, their dimension, their scale, and whether SI prefixes apply.
const BASE_UNITS: &[(&str, Dimension, f64, bool)] = &[
    ("K", Dimension::Temperature, 1.0, true),
    ("Jy/beam", Dimension::BeamFluxDensity, 1.0, true),
    ("Jy", Dimension::FluxDensity, 1.0, true),
    ("Hz", Dimension::Frequency, 1.0, true),
    ("m/s", Dimension::Velocity, 1.0, true),
    ("m", Dimension::Length, 1.0, true),
    ("s", Dimension::Time, 1.0, true),
    ("deg", Dimension::Angle, 1.0, false),
    ("arcmin", Dimension::Angle, 1.0 / 60.0, false),
    ("arcsec", Dimension::Angle, 1.0 / 3600.0, false),
    ("rad", Dimension::Angle, 180.0 / std::f64::consts::PI, false),
];

const PREFIXES: &[(&str, f64)] = &[
    ("n", 1e-9),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
];

/// A parsed physical unit.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    symbol: String,
    dimension: Dimension,
    /// Multiplier taking a value in this unit to the dimension's base unit.
    scale: f64,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            symbol: String::new(),
            dimension: Dimension::Dimensionless,
            scale: 1.0,
        }
    }

    /// Parses a unit symbol. Exact base symbols win over prefixed readings, so `"m"` is
    /// a metre and `"mK"` is a millikelvin.
    pub fn parse(symbol: &str) -> Result<Self> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" {
            return Ok(Self::dimensionless());
        }

        if let Some(&(_, dimension, scale, _)) =
            BASE_UNITS.iter().find(|(base, ..)| *base == trimmed)
        {
            return Ok(Self {
                symbol: trimmed.to_string(),
                dimension,
                scale,
            });
        }

        for &(prefix, factor) in PREFIXES {
            let Some(rest) = trimmed.strip_prefix(prefix) else {
                continue;
            };
            if let Some(&(_, dimension, scale, _)) = BASE_UNITS
                .iter()
                .find(|(base, _, _, prefixable)| *prefixable && *base == rest)
            {
                return Ok(Self {
                    symbol: trimmed.to_string(),
                    dimension,
                    scale: scale * factor,
                });
            }
        }

        Err(MaskError::UnknownUnit(trimmed.to_string()))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_equivalent(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factor `f` such that `value_in_self * f == value_in_target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64> {
        if !self.is_equivalent(target) {
            return Err(MaskError::UnitMismatch {
                data_unit: target.to_string(),
                threshold_unit: self.to_string(),
            });
        }
        Ok(self.scale / target.scale)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.scale == other.scale
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl FromStr for Unit {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Unit {
    type Error = MaskError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

//==================================================================================
// Quantity
//==================================================================================

/// A scalar value carrying a physical unit, used as a comparison threshold.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Parses the unit symbol and builds the quantity in one step.
    pub fn with_symbol(value: f64, symbol: &str) -> Result<Self> {
        Ok(Self::new(value, Unit::parse(symbol)?))
    }

    /// The value expressed in `target` units.
    pub fn to_unit(&self, target: &Unit) -> Result<f64> {
        Ok(self.value * self.unit.conversion_factor(target)?)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_parse_prefixed_units() {
        let mk = Unit::parse("mK").unwrap();
        assert_eq!(mk.dimension(), Dimension::Temperature);
        assert!(close(mk.conversion_factor(&Unit::parse("K").unwrap()).unwrap(), 1e-3));

        let kms = Unit::parse("km/s").unwrap();
        assert_eq!(kms.dimension(), Dimension::Velocity);
        assert!(close(kms.conversion_factor(&Unit::parse("m/s").unwrap()).unwrap(), 1e3));

        let ghz = Unit::parse("GHz").unwrap();
        assert!(close(ghz.conversion_factor(&Unit::parse("MHz").unwrap()).unwrap(), 1e3));
    }

    #[test]
    fn test_bare_metre_is_not_a_prefix() {
        let m = Unit::parse("m").unwrap();
        assert_eq!(m.dimension(), Dimension::Length);
    }

    #[test]
    fn test_beam_flux_is_distinct_from_flux() {
        let per_beam = Unit::parse("mJy/beam").unwrap();
        let flux = Unit::parse("Jy").unwrap();
        assert!(!per_beam.is_equivalent(&flux));
        assert!(matches!(
            per_beam.conversion_factor(&flux),
            Err(MaskError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_angles_do_not_take_prefixes() {
        assert!(close(
            Unit::parse("arcsec").unwrap().conversion_factor(&Unit::parse("deg").unwrap()).unwrap(),
            1.0 / 3600.0
        ));
        assert!(matches!(Unit::parse("mdeg"), Err(MaskError::UnknownUnit(_))));
    }

    #[test]
    fn test_unknown_unit() {
        assert!(matches!(Unit::parse("furlong"), Err(MaskError::UnknownUnit(s)) if s == "furlong"));
    }

    #[test]
    fn test_dimensionless_aliases() {
        assert_eq!(Unit::parse("").unwrap(), Unit::dimensionless());
        assert_eq!(Unit::parse("dimensionless").unwrap(), Unit::dimensionless());
        assert_eq!(Unit::dimensionless().to_string(), "dimensionless");
    }

    #[test]
    fn test_quantity_conversion() {
        let q = Quantity::with_symbol(250.0, "mK").unwrap();
        assert!(close(q.to_unit(&Unit::parse("K").unwrap()).unwrap(), 0.25));
        let plain: Quantity = 3.0.into();
        assert!(matches!(
            plain.to_unit(&Unit::parse("K").unwrap()),
            Err(MaskError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_unit_serializes_as_symbol() {
        let unit = Unit::parse("Jy/beam").unwrap();
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"Jy/beam\"");
        let back: Unit = serde_json::from_str("\"uJy/beam\"").unwrap();
        assert_eq!(back.dimension(), Dimension::BeamFluxDensity);
        assert!(serde_json::from_str::<Unit>("\"parsec^2\"").is_err());
    }
}
