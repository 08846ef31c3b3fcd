// In: src/error.rs

//! This module defines the single, unified error type for the cube-mask library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! None of these errors are transient: they describe programmer or input mistakes and
//! are propagated straight to the caller. A failed evaluation never returns a partial
//! boolean result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    // =========================================================================
    // === Semantic Errors (Specific to the masking model)
    // =========================================================================
    /// Two shapes are neither equal nor broadcast-compatible.
    #[error("Mask shape is not broadcastable to data shape: {found:?} vs {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A comparison threshold carries a unit that cannot be converted to the data unit.
    #[error("Unit mismatch: threshold unit '{threshold_unit}' is not equivalent to data unit '{data_unit}'")]
    UnitMismatch {
        data_unit: String,
        threshold_unit: String,
    },

    #[error("Coordinate mismatch: {0}")]
    CoordinateMismatch(String),

    #[error("Region out of bounds: {0}")]
    RegionOutOfBounds(String),

    /// Raised when a composite mask would exceed the supported nesting depth.
    #[error("Composite mask nesting depth {0} exceeds the supported maximum")]
    MaskTooDeep(usize),

    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Invalid Stokes component: {0} - should be one of I, Q, U, V, RR, LL, RL, LR")]
    InvalidStokesComponent(String),

    #[error("Invalid Stokes cube: {0}")]
    InvalidStokesCube(String),

    #[error("Numeric conversion failed: {0}")]
    NumericConversion(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g. a missing config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a `CubeConfig`.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl MaskError {
    /// Shorthand used by every shape check in the crate.
    pub(crate) fn shape_mismatch(expected: &[usize], found: &[usize]) -> Self {
        MaskError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MaskError>;
