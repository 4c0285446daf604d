//! Configuration schema.
//!
//! A flat, serde-friendly value struct. All fields are plain SI floats so
//! the structure round-trips through YAML without unit machinery; the
//! engine converts at its boundaries.

use crate::category::{CategorySpec, PipeCategory};
use serde::{Deserialize, Serialize};

/// How the diversity factor is applied to aggregated flows.
///
/// The source literature is inconsistent here, so the behavior is an
/// explicit switch instead of a hard-coded guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DiversityApplication {
    /// Scale each building's design-hour flow before aggregation.
    #[default]
    DesignHourOnly,
    /// Scale every aggregated edge flow instead.
    AllEdges,
}

/// One row of the piecewise pipe cost table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostRow {
    pub diameter_m: f64,
    pub eur_per_m: f64,
}

/// Plant boundary condition for the hydraulic solve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlantBoundary {
    /// Supply-side pressure at the plant outlet [Pa].
    pub pressure_pa: f64,
    /// Supply temperature at the plant outlet [°C].
    pub temperature_c: f64,
}

impl Default for PlantBoundary {
    fn default() -> Self {
        Self {
            pressure_pa: 6.0e5,
            temperature_c: 80.0,
        }
    }
}

/// Absolute bounds the standards validator checks the plant boundary against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StandardsBounds {
    pub min_plant_pressure_pa: f64,
    pub max_plant_pressure_pa: f64,
    pub min_plant_temperature_c: f64,
    pub max_plant_temperature_c: f64,
    /// Reynolds number below which a turbulence warning is attached.
    pub turbulent_reynolds: f64,
    /// Lower edge of the economic pressure-gradient band [Pa/m]
    /// (VDI 2067-style: mains far below this are uneconomically oversized).
    pub economic_min_gradient_pa_m: f64,
}

impl Default for StandardsBounds {
    fn default() -> Self {
        Self {
            min_plant_pressure_pa: 2.0e5,
            max_plant_pressure_pa: 1.6e6,
            min_plant_temperature_c: 60.0,
            max_plant_temperature_c: 130.0,
            turbulent_reynolds: 4000.0,
            economic_min_gradient_pa_m: 30.0,
        }
    }
}

/// Settings for the hydraulic solver's property-refinement loop and the
/// lumped thermal model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Cap on property-refinement iterations.
    pub max_iterations: u32,
    /// Relative property-change tolerance for convergence.
    pub residual_tolerance: f64,
    /// Ground/ambient temperature around buried pipes [°C].
    pub ambient_temperature_c: f64,
    /// Lumped loss coefficient for insulated pipes [W/(m·K)].
    pub u_insulated_w_per_m_k: f64,
    /// Lumped loss coefficient for uninsulated pipes [W/(m·K)].
    pub u_uninsulated_w_per_m_k: f64,
    /// Differential pressure consumed by each building substation [Pa].
    pub substation_dp_pa: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            residual_tolerance: 1.0e-4,
            ambient_temperature_c: 10.0,
            u_insulated_w_per_m_k: 0.4,
            u_uninsulated_w_per_m_k: 2.0,
            substation_dp_pa: 5.0e4,
        }
    }
}

/// The complete, validated-once design configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Network supply temperature [°C].
    pub supply_temperature_c: f64,
    /// Network return temperature [°C].
    pub return_temperature_c: f64,
    /// Specific heat of the carrier fluid [J/(kg·K)].
    pub cp_j_per_kg_k: f64,
    /// Demand safety factor applied to every building load.
    pub safety_factor: f64,
    /// Simultaneity factor for the design hour.
    pub diversity_factor: f64,
    pub diversity_application: DiversityApplication,
    /// Water density used for diameter sizing [kg/m³].
    pub sizing_density_kg_m3: f64,
    /// Absolute pipe roughness [m].
    pub pipe_roughness_m: f64,
    /// Maximum building-to-street projection distance [m].
    pub max_service_distance_m: f64,
    /// Whether distribution/main pipes are insulated.
    pub insulated_mains: bool,
    /// Manufacturable inner diameters, strictly increasing [m].
    pub standard_diameters_m: Vec<f64>,
    /// Piecewise cost table; must cover every catalog diameter.
    pub cost_table: Vec<CostRow>,
    /// Cost multiplier for service pipes (trenching into private ground).
    pub service_trench_surcharge: f64,
    /// Aggregated flow at or above which a pipe counts as a main [kg/s].
    pub main_flow_threshold_kg_s: f64,
    /// Aggregated flow at or above which a pipe counts as distribution [kg/s].
    pub distribution_flow_threshold_kg_s: f64,
    pub service_category: CategorySpec,
    pub distribution_category: CategorySpec,
    pub main_category: CategorySpec,
    pub plant: PlantBoundary,
    pub standards: StandardsBounds,
    pub solver: SolverSettings,
    /// Cap on auto-resize iterations.
    pub max_resize_iterations: u32,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            supply_temperature_c: 80.0,
            return_temperature_c: 50.0,
            cp_j_per_kg_k: 4186.0,
            safety_factor: 1.15,
            diversity_factor: 0.8,
            diversity_application: DiversityApplication::default(),
            sizing_density_kg_m3: 977.0,
            pipe_roughness_m: 4.5e-5,
            max_service_distance_m: 30.0,
            insulated_mains: true,
            standard_diameters_m: vec![
                0.025, 0.032, 0.040, 0.050, 0.065, 0.080, 0.100, 0.125, 0.150, 0.200, 0.250, 0.300,
            ],
            cost_table: vec![
                CostRow { diameter_m: 0.025, eur_per_m: 195.0 },
                CostRow { diameter_m: 0.032, eur_per_m: 206.0 },
                CostRow { diameter_m: 0.040, eur_per_m: 220.0 },
                CostRow { diameter_m: 0.050, eur_per_m: 240.0 },
                CostRow { diameter_m: 0.065, eur_per_m: 261.0 },
                CostRow { diameter_m: 0.080, eur_per_m: 288.0 },
                CostRow { diameter_m: 0.100, eur_per_m: 325.0 },
                CostRow { diameter_m: 0.125, eur_per_m: 380.0 },
                CostRow { diameter_m: 0.150, eur_per_m: 441.0 },
                CostRow { diameter_m: 0.200, eur_per_m: 577.0 },
                CostRow { diameter_m: 0.250, eur_per_m: 716.0 },
                CostRow { diameter_m: 0.300, eur_per_m: 866.0 },
            ],
            service_trench_surcharge: 1.2,
            main_flow_threshold_kg_s: 2.0,
            distribution_flow_threshold_kg_s: 0.5,
            service_category: CategorySpec {
                min_diameter_m: 0.025,
                max_diameter_m: 0.050,
                min_velocity_ms: 0.1,
                max_velocity_ms: 2.0,
                max_gradient_pa_m: 400.0,
            },
            distribution_category: CategorySpec {
                min_diameter_m: 0.040,
                max_diameter_m: 0.150,
                min_velocity_ms: 0.3,
                max_velocity_ms: 2.5,
                max_gradient_pa_m: 300.0,
            },
            main_category: CategorySpec {
                min_diameter_m: 0.080,
                max_diameter_m: 0.300,
                min_velocity_ms: 0.5,
                max_velocity_ms: 3.0,
                max_gradient_pa_m: 250.0,
            },
            plant: PlantBoundary::default(),
            standards: StandardsBounds::default(),
            solver: SolverSettings::default(),
            max_resize_iterations: 5,
        }
    }
}

impl DesignConfig {
    /// Constraint set for a category.
    pub fn category_spec(&self, category: PipeCategory) -> &CategorySpec {
        match category {
            PipeCategory::Service => &self.service_category,
            PipeCategory::Distribution => &self.distribution_category,
            PipeCategory::Main => &self.main_category,
        }
    }

    /// Design temperature spread [K].
    pub fn temperature_spread_k(&self) -> f64 {
        self.supply_temperature_c - self.return_temperature_c
    }
}
