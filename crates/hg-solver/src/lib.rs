//! hg-solver: hydraulic resolution of the sized dual-pipe network.
//!
//! Flows are known exactly from aggregation (radial topology, no implicit
//! flow unknowns), so pressures follow from a single outward propagation
//! from the plant boundary. The only iteration is an optional refinement
//! pass that re-evaluates temperature-dependent fluid properties at each
//! pipe's local operating temperature.
//!
//! Meshed topologies are out of scope; supporting them would mean swapping
//! this component for a genuine nonlinear network solver behind the same
//! interface.

pub mod error;
pub mod solve;
pub mod state;

pub use error::{SolverError, SolverResult};
pub use solve::{solve, HydraulicSolver};
pub use state::{HydraulicState, SolverStatus};
