// In: src/stokes.rs

//! Multi-polarisation cubes.
//!
//! A `StokesCube` groups one `MaskedCube` per polarisation component. All components
//! share a shape and a WCS, and may additionally share a mask that is ANDed onto each
//! component's own mask when the component is requested.

use crate::coordinates::{optional_wcs_match, Wcs};
use crate::cube::{MaskInput, MaskedCube};
use crate::data::Element;
use crate::error::{MaskError, Result};
use crate::masks::Mask;
use crate::shape::is_broadcastable_and_smaller;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

//==================================================================================
// 1. Stokes Parameters
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StokesParameter {
    I,
    Q,
    U,
    V,
    RR,
    LL,
    RL,
    LR,
}

impl StokesParameter {
    pub const ALL: [StokesParameter; 8] = [
        StokesParameter::I,
        StokesParameter::Q,
        StokesParameter::U,
        StokesParameter::V,
        StokesParameter::RR,
        StokesParameter::LL,
        StokesParameter::RL,
        StokesParameter::LR,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StokesParameter::I => "I",
            StokesParameter::Q => "Q",
            StokesParameter::U => "U",
            StokesParameter::V => "V",
            StokesParameter::RR => "RR",
            StokesParameter::LL => "LL",
            StokesParameter::RL => "RL",
            StokesParameter::LR => "LR",
        }
    }
}

impl FromStr for StokesParameter {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self> {
        StokesParameter::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MaskError::InvalidStokesComponent(s.to_string()))
    }
}

impl fmt::Display for StokesParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//==================================================================================
// 2. The Stokes Cube
//==================================================================================

#[derive(Clone)]
pub struct StokesCube<T: Element> {
    /// Components in insertion order.
    components: Vec<(StokesParameter, MaskedCube<T>)>,
    mask: Option<Mask>,
    meta: BTreeMap<String, String>,
    fill_value: Option<T>,
}

impl<T: Element> StokesCube<T> {
    /// Groups `components` under an optional shared mask.
    ///
    /// The first component is the reference: every other one must have its shape and
    /// WCS (either all components carry one or none do). The shared mask must broadcast
    /// to that shape and, with coordinate checks on, carry a matching WCS.
    pub fn new(
        components: impl IntoIterator<Item = (StokesParameter, MaskedCube<T>)>,
        mask: Option<Mask>,
    ) -> Result<Self> {
        let components: Vec<_> = components.into_iter().collect();
        let Some((_, reference)) = components.first() else {
            return Err(MaskError::InvalidStokesCube(
                "at least one component is required".to_string(),
            ));
        };

        for (i, (parameter, cube)) in components.iter().enumerate() {
            if components[..i].iter().any(|(seen, _)| seen == parameter) {
                return Err(MaskError::InvalidStokesCube(format!(
                    "component {} given more than once",
                    parameter
                )));
            }
            if cube.wcs().is_some() != reference.wcs().is_some()
                || !optional_wcs_match(cube.wcs(), reference.wcs())
            {
                return Err(MaskError::CoordinateMismatch(
                    "All component cubes should have the same WCS".to_string(),
                ));
            }
            if cube.shape() != reference.shape() {
                return Err(MaskError::InvalidStokesCube(format!(
                    "All component cubes should have the same shape: {:?} vs {:?}",
                    cube.shape(),
                    reference.shape()
                )));
            }
        }

        if let Some(mask) = &mask {
            if !is_broadcastable_and_smaller(mask.shape(), reference.shape()) {
                return Err(MaskError::shape_mismatch(reference.shape(), mask.shape()));
            }
            if reference.check_coordinates() && !optional_wcs_match(mask.wcs(), reference.wcs()) {
                return Err(MaskError::CoordinateMismatch(
                    "shared mask WCS does not match the component WCS".to_string(),
                ));
            }
        }

        log::debug!(
            "built Stokes cube with {} components of shape {:?}",
            components.len(),
            reference.shape()
        );
        Ok(Self {
            components,
            mask,
            meta: BTreeMap::new(),
            fill_value: None,
        })
    }

    /// Like [`StokesCube::new`], with components named by string (`"I"`, `"RR"`, ...).
    pub fn from_named<S: AsRef<str>>(
        components: impl IntoIterator<Item = (S, MaskedCube<T>)>,
        mask: Option<Mask>,
    ) -> Result<Self> {
        let parsed = components
            .into_iter()
            .map(|(name, cube)| Ok((name.as_ref().parse::<StokesParameter>()?, cube)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed, mask)
    }

    pub fn with_meta(mut self, meta: BTreeMap<String, String>) -> Self {
        self.meta = meta;
        self
    }

    /// Fill value handed to every component returned by [`StokesCube::component`].
    pub fn with_fill_value(mut self, fill_value: T) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    // --- Accessors ---

    /// Component names in insertion order.
    pub fn components(&self) -> Vec<StokesParameter> {
        self.components.iter().map(|(p, _)| *p).collect()
    }

    pub fn shape(&self) -> &[usize] {
        self.reference().shape()
    }

    pub fn wcs(&self) -> Option<&Wcs> {
        self.reference().wcs()
    }

    /// The shared mask.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn contains(&self, parameter: StokesParameter) -> bool {
        self.components.iter().any(|(p, _)| *p == parameter)
    }

    fn reference(&self) -> &MaskedCube<T> {
        &self.components[0].1
    }

    /// The cube for `parameter`, with the shared mask ANDed onto its own mask.
    /// Returns `None` when the component is absent.
    pub fn component(&self, parameter: StokesParameter) -> Option<Result<MaskedCube<T>>> {
        let (_, cube) = self.components.iter().find(|(p, _)| *p == parameter)?;
        let cube = match self.fill_value {
            Some(fill) => cube.with_fill_value(fill),
            None => cube.clone(),
        };
        Some(match &self.mask {
            Some(mask) => cube.with_mask(mask),
            None => Ok(cube),
        })
    }

    /// A new Stokes cube with `mask` applied to every component.
    ///
    /// With `inherit_mask` the new mask is ANDed with the current shared mask; otherwise
    /// it replaces it. Component data is shared, not copied.
    pub fn with_mask(&self, mask: impl Into<MaskInput>, inherit_mask: bool) -> Result<Self> {
        let mask = self.reference().resolve_mask(mask.into())?;
        let mask = match (&self.mask, inherit_mask) {
            (Some(existing), true) => {
                existing.and_checked(&mask, self.reference().check_coordinates())?
            }
            _ => mask,
        };
        Ok(Self {
            mask: Some(mask),
            ..self.clone()
        })
    }
}

impl<T: Element> fmt::Debug for StokesCube<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StokesCube")
            .field("components", &self.components())
            .field("shape", &self.shape())
            .field("masked", &self.mask.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "stokes_tests.rs"]
mod tests;
