//! Error types for fluid property evaluation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluidError {
    #[error("Temperature {t_c} °C outside correlation validity range [{min_c}, {max_c}] °C")]
    OutOfRange { t_c: f64, min_c: f64, max_c: f64 },

    #[error("Non-physical property value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },
}

pub type FluidResult<T> = Result<T, FluidError>;
