//! This file is the root of the `cube_mask` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`masks`, `cube`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the types most callers need, so `use cube_mask::*` covers the
//!     common path of building a cube, attaching masks and reading masked data.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod coordinates;
pub mod cube;
pub mod data;
pub mod error;
pub mod masks;
pub mod observability;
pub mod region;
pub mod shape;
pub mod stokes;
pub mod units;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use config::CubeConfig;
pub use coordinates::Wcs;
pub use cube::{Flattened, MaskInput, MaskedCube};
pub use data::{CubeData, DataSource, Element};
pub use error::{MaskError, Result};
pub use masks::bitmap::MaskBitmap;
pub use masks::{
    BoolOp, BooleanArrayMask, CompareOp, ComparisonMask, CompositeMask, FunctionMask, Mask,
    MaskBase, Predicate, MAX_MASK_DEPTH,
};
pub use region::{IntoAxisRange, Region};
pub use shape::{broadcast_shape, is_broadcastable_and_smaller};
pub use stokes::{StokesCube, StokesParameter};
pub use units::{Dimension, Quantity, Unit};
