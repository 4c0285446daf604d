//! hg-config: design configuration for a sizing run.
//!
//! One immutable, fully validated `DesignConfig` value is built at startup
//! and passed explicitly into every component; there is no ambient global
//! state. Invalid values fail fast with `ConfigurationError` instead of
//! being substituted with defaults.

pub mod category;
pub mod schema;
pub mod validate;

pub use category::{CategorySpec, PipeCategory};
pub use schema::{
    CostRow, DesignConfig, DiversityApplication, PlantBoundary, SolverSettings, StandardsBounds,
};
pub use validate::ConfigurationError;
