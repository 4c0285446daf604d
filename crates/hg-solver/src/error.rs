//! Error types for the hydraulic solve.

use hg_core::EdgeId;
use thiserror::Error;

/// Hard setup failures. Non-convergence is *not* an error; it surfaces as
/// `SolverStatus::Diverged` on the returned state.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Edge {edge} has no diameter assigned; run sizing first")]
    UnsizedEdge { edge: EdgeId },

    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Fluid property error: {0}")]
    Fluid(#[from] hg_fluids::FluidError),

    #[error("Hydraulic calculation failed: {0}")]
    Hydraulics(#[from] hg_hydraulics::HydraulicsError),
}

pub type SolverResult<T> = Result<T, SolverError>;
