//! Startup validation of the design configuration.

use crate::category::PipeCategory;
use crate::schema::DesignConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Diameter catalog is empty")]
    EmptyCatalog,

    #[error("Diameter catalog not strictly increasing at index {index}: {value} m")]
    UnsortedCatalog { index: usize, value: f64 },

    #[error("Cost table has no row for catalog diameter {diameter_m} m")]
    MissingCostRow { diameter_m: f64 },

    #[error("Category {category:?}: {reason}")]
    BadCategory {
        category: PipeCategory,
        reason: &'static str,
    },
}

fn positive(value: f64, field: &'static str) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidValue {
            field,
            value,
            reason: "must be positive and finite",
        })
    }
}

impl DesignConfig {
    /// Validate once at startup. Every violation aborts; nothing is
    /// substituted with a default.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.temperature_spread_k() <= 0.0 {
            return Err(ConfigurationError::InvalidValue {
                field: "supply_temperature_c",
                value: self.supply_temperature_c,
                reason: "supply temperature must exceed return temperature",
            });
        }

        positive(self.cp_j_per_kg_k, "cp_j_per_kg_k")?;
        positive(self.safety_factor, "safety_factor")?;
        positive(self.diversity_factor, "diversity_factor")?;
        positive(self.sizing_density_kg_m3, "sizing_density_kg_m3")?;
        positive(self.pipe_roughness_m, "pipe_roughness_m")?;
        positive(self.max_service_distance_m, "max_service_distance_m")?;
        positive(self.service_trench_surcharge, "service_trench_surcharge")?;
        positive(self.plant.pressure_pa, "plant.pressure_pa")?;
        positive(self.solver.residual_tolerance, "solver.residual_tolerance")?;
        positive(self.solver.substation_dp_pa, "solver.substation_dp_pa")?;
        positive(self.solver.u_insulated_w_per_m_k, "solver.u_insulated_w_per_m_k")?;
        positive(
            self.solver.u_uninsulated_w_per_m_k,
            "solver.u_uninsulated_w_per_m_k",
        )?;

        if self.solver.max_iterations == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "solver.max_iterations",
                value: 0.0,
                reason: "iteration cap must be at least 1",
            });
        }
        if self.max_resize_iterations == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "max_resize_iterations",
                value: 0.0,
                reason: "iteration cap must be at least 1",
            });
        }

        self.validate_catalog()?;
        self.validate_thresholds()?;
        for category in PipeCategory::ALL {
            self.validate_category(category)?;
        }
        Ok(())
    }

    fn validate_catalog(&self) -> Result<(), ConfigurationError> {
        if self.standard_diameters_m.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }
        let mut prev = 0.0;
        for (index, &d) in self.standard_diameters_m.iter().enumerate() {
            if !d.is_finite() || d <= prev {
                return Err(ConfigurationError::UnsortedCatalog { index, value: d });
            }
            prev = d;
        }
        // Every catalog diameter must price exactly; nearest-row pricing
        // would hide catalog/cost drift.
        for &d in &self.standard_diameters_m {
            let covered = self
                .cost_table
                .iter()
                .any(|row| (row.diameter_m - d).abs() < 1e-9 && row.eur_per_m > 0.0);
            if !covered {
                return Err(ConfigurationError::MissingCostRow { diameter_m: d });
            }
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), ConfigurationError> {
        positive(self.distribution_flow_threshold_kg_s, "distribution_flow_threshold_kg_s")?;
        positive(self.main_flow_threshold_kg_s, "main_flow_threshold_kg_s")?;
        if self.main_flow_threshold_kg_s <= self.distribution_flow_threshold_kg_s {
            return Err(ConfigurationError::InvalidValue {
                field: "main_flow_threshold_kg_s",
                value: self.main_flow_threshold_kg_s,
                reason: "main threshold must exceed distribution threshold",
            });
        }
        Ok(())
    }

    fn validate_category(&self, category: PipeCategory) -> Result<(), ConfigurationError> {
        let spec = self.category_spec(category);
        if !(spec.min_diameter_m > 0.0 && spec.max_diameter_m > spec.min_diameter_m) {
            return Err(ConfigurationError::BadCategory {
                category,
                reason: "diameter range must be positive and ordered",
            });
        }
        if !(spec.min_velocity_ms >= 0.0 && spec.max_velocity_ms > spec.min_velocity_ms) {
            return Err(ConfigurationError::BadCategory {
                category,
                reason: "velocity range must be ordered",
            });
        }
        if !(spec.max_gradient_pa_m > 0.0) {
            return Err(ConfigurationError::BadCategory {
                category,
                reason: "pressure gradient limit must be positive",
            });
        }
        Ok(())
    }
}
