//! Error type for the design pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Configuration rejected: {0}")]
    Config(#[from] hg_config::ConfigurationError),

    #[error("Network construction failed: {0}")]
    Net(#[from] hg_net::NetError),

    #[error("Pipe sizing failed: {0}")]
    Sizing(#[from] hg_sizing::SizingError),

    #[error("Hydraulic solve failed: {0}")]
    Solver(#[from] hg_solver::SolverError),

    #[error("Fluid property error: {0}")]
    Fluid(#[from] hg_fluids::FluidError),

    #[error("Internal invariant broken: {what}")]
    Internal { what: String },
}

pub type DesignResult<T> = Result<T, DesignError>;
