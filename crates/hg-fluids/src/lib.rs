//! hg-fluids: liquid-water property correlations for district-heating loops.
//!
//! The network carries single-phase liquid water between roughly 30 and
//! 130 °C, so properties come from compact polynomial correlations rather
//! than a full equation-of-state backend. Density and viscosity are the
//! two properties the hydraulic solver re-evaluates during its refinement
//! pass; specific heat is treated as a configured constant.

pub mod error;
pub mod water;

pub use error::{FluidError, FluidResult};
pub use water::{water_density, water_dynamic_viscosity, WaterProperties};
