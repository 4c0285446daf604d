//! Error types for pipe sizing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SizingError {
    #[error("Invalid flow rate: {value} kg/s (must be positive)")]
    InvalidFlow { value: f64 },

    #[error("Standard diameter catalog is empty")]
    EmptyCatalog,

    #[error("No cost row for diameter {diameter_m} m")]
    NoCostRow { diameter_m: f64 },

    #[error("Hydraulic evaluation failed: {0}")]
    Hydraulics(#[from] hg_hydraulics::HydraulicsError),
}

pub type SizingResult<T> = Result<T, SizingError>;
