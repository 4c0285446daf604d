//! hg-hydraulics: pure pipe-flow relations.
//!
//! Heat-to-mass-flow conversion, flow velocity, Reynolds number and
//! Darcy–Weisbach pressure gradient with a Swamee–Jain friction factor.
//! Everything here is stateless; sizing and solving build on these.

pub mod conversions;
pub mod error;
pub mod friction;

pub use conversions::{heat_to_mass_flow, flow_velocity, reynolds_number};
pub use error::{HydraulicsError, HydraulicsResult};
pub use friction::{friction_factor, pressure_gradient, PipeFlowState};
