//! Error types for hydraulic calculations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydraulicsError {
    #[error("Invalid flow rate: {value} kg/s (must be positive)")]
    InvalidFlow { value: f64 },

    #[error("Invalid temperature spread: supply {supply_c} °C must exceed return {return_c} °C")]
    InvalidSpread { supply_c: f64, return_c: f64 },

    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },
}

pub type HydraulicsResult<T> = Result<T, HydraulicsError>;

/// Ensure a value is finite, returning `NonPhysical` if not.
pub fn check_finite(value: f64, what: &'static str) -> HydraulicsResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HydraulicsError::NonPhysical { what, value })
    }
}
