//! Pipe categories and their constraint sets.

use serde::{Deserialize, Serialize};

/// Classification of a pipe by its aggregated flow range.
///
/// A tagged variant, not a class hierarchy: classifier, sizing engine and
/// validator all switch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipeCategory {
    /// Building connection pipes.
    Service,
    /// Street-level distribution pipes.
    Distribution,
    /// Trunk mains toward the plant.
    Main,
}

impl PipeCategory {
    pub const ALL: [PipeCategory; 3] = [
        PipeCategory::Service,
        PipeCategory::Distribution,
        PipeCategory::Main,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipeCategory::Service => "service",
            PipeCategory::Distribution => "distribution",
            PipeCategory::Main => "main",
        }
    }
}

/// Constraint set carried by each category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Smallest diameter a pipe of this category may take [m].
    pub min_diameter_m: f64,
    /// Largest diameter a pipe of this category may take [m].
    pub max_diameter_m: f64,
    /// Lower velocity bound [m/s] (EN 13941 fouling/air-pocket limit).
    pub min_velocity_ms: f64,
    /// Upper velocity bound [m/s] (EN 13941 erosion/noise limit).
    pub max_velocity_ms: f64,
    /// Maximum allowed pressure gradient [Pa/m].
    pub max_gradient_pa_m: f64,
}
