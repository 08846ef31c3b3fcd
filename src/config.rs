// In: src/config.rs

//! The single source of truth for cube construction defaults.
//!
//! `CubeConfig` is created once at the application boundary (e.g. from a JSON file)
//! and then shared read-only as an `Arc<CubeConfig>` by every `MaskedCube` derived
//! from it. There is no module-level mutable state: the default fill value and the
//! implicit unit system both live here.

use crate::error::Result;
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::path::Path;

//==================================================================================
// I. The Unified CubeConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CubeConfig {
    /// Value written into excluded positions by `filled_data`.
    /// `None` means NaN, which JSON cannot spell.
    #[serde(default)]
    pub fill_value: Option<f64>,

    /// Unit symbol assumed for data that arrives without one (e.g. `"K"` or `"Jy/beam"`).
    /// The empty string is dimensionless.
    #[serde(default)]
    pub default_unit: String,

    /// If true, masks attached to a cube must carry a WCS equal to the cube's, and a
    /// WCS attached to a cube must have one axis per data dimension.
    #[serde(default = "default_true")]
    pub check_coordinates: bool,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            fill_value: None,
            default_unit: String::new(),
            check_coordinates: true,
        }
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

//==================================================================================
// II. Loading & Resolution
//==================================================================================

impl CubeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded cube config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// The effective fill value as an `f64`.
    pub fn fill_value_or_nan(&self) -> f64 {
        self.fill_value.unwrap_or(f64::NAN)
    }

    /// Parses `default_unit`.
    pub fn default_unit(&self) -> Result<Unit> {
        Unit::parse(&self.default_unit)
    }
}
