//! Pipe sizing engine: minimum diameter, catalog snap, evaluation, pricing.

use crate::error::{SizingError, SizingResult};
use hg_config::{DesignConfig, PipeCategory};
use hg_core::units::{m, Density, DynVisc, Length, MassRate};
use hg_hydraulics::friction::pressure_gradient;

/// Non-fatal findings produced while sizing; attached to the pipe, never
/// suppressing processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingWarning {
    /// The demand exceeds what the largest catalog diameter can carry
    /// within the velocity limit; the largest diameter was selected.
    OversizedDemand {
        required_m: f64,
        selected_m: f64,
    },
    /// The selected pipe operates below the turbulent threshold, so the
    /// friction correlation is extrapolating.
    LaminarFlow { reynolds: f64 },
}

/// Minimum inner diameter that keeps the flow at or under `max_velocity`.
///
/// ```text
/// D = sqrt(4 * mdot / (pi * rho * v_max))
/// ```
pub fn required_diameter(
    flow: MassRate,
    max_velocity_ms: f64,
    density: Density,
) -> SizingResult<Length> {
    if !(flow.value > 0.0) {
        return Err(SizingError::InvalidFlow { value: flow.value });
    }
    let d = (4.0 * flow.value / (std::f64::consts::PI * density.value * max_velocity_ms)).sqrt();
    Ok(m(d))
}

/// Smallest catalog diameter that is equal to or larger than `required`.
///
/// If the catalog tops out below the requirement, the largest available
/// diameter is returned together with an `OversizedDemand` warning; the
/// clamp is never silent.
pub fn select_standard_diameter(
    required: Length,
    catalog: &[f64],
) -> SizingResult<(Length, Option<SizingWarning>)> {
    let largest = *catalog.last().ok_or(SizingError::EmptyCatalog)?;
    for &d in catalog {
        if d >= required.value {
            return Ok((m(d), None));
        }
    }
    Ok((
        m(largest),
        Some(SizingWarning::OversizedDemand {
            required_m: required.value,
            selected_m: largest,
        }),
    ))
}

/// Hydraulic operating point of a sized pipe.
#[derive(Debug, Clone, Copy)]
pub struct PipeEvaluation {
    pub velocity_mps: f64,
    pub dp_per_m_pa: f64,
    pub reynolds: f64,
    pub warning: Option<SizingWarning>,
}

/// Price a pipe: piecewise cost table keyed by diameter, linear in length.
pub fn price(
    diameter: Length,
    length: Length,
    category: PipeCategory,
    config: &DesignConfig,
) -> SizingResult<f64> {
    let row = config
        .cost_table
        .iter()
        .find(|row| (row.diameter_m - diameter.value).abs() < 1e-9)
        .ok_or(SizingError::NoCostRow {
            diameter_m: diameter.value,
        })?;
    let surcharge = match category {
        PipeCategory::Service => config.service_trench_surcharge,
        _ => 1.0,
    };
    Ok(row.eur_per_m * length.value * surcharge)
}

/// Result of sizing one pipe.
#[derive(Debug, Clone, Copy)]
pub struct SizedPipe {
    pub diameter: Length,
    pub velocity_mps: f64,
    pub dp_per_m_pa: f64,
    pub reynolds: f64,
    pub unit_cost_eur_per_m: f64,
    pub warnings: [Option<SizingWarning>; 2],
}

/// Sizing engine bound to one immutable configuration.
pub struct PipeSizingEngine<'a> {
    config: &'a DesignConfig,
    density: Density,
    viscosity: DynVisc,
}

impl<'a> PipeSizingEngine<'a> {
    /// `density`/`viscosity` are the design-point fluid properties used
    /// for sizing (the solver later re-evaluates at local temperatures).
    pub fn new(config: &'a DesignConfig, density: Density, viscosity: DynVisc) -> Self {
        Self {
            config,
            density,
            viscosity,
        }
    }

    /// Evaluate velocity, pressure gradient and Reynolds number of a pipe
    /// at the design point. Laminar operation is reported as a warning,
    /// not a failure.
    pub fn evaluate(&self, diameter: Length, flow: MassRate) -> SizingResult<PipeEvaluation> {
        let state = pressure_gradient(
            flow,
            diameter,
            m(self.config.pipe_roughness_m),
            self.density,
            self.viscosity.value,
        )?;
        let warning = if state.reynolds < self.config.standards.turbulent_reynolds {
            Some(SizingWarning::LaminarFlow {
                reynolds: state.reynolds,
            })
        } else {
            None
        };
        Ok(PipeEvaluation {
            velocity_mps: state.velocity_mps,
            dp_per_m_pa: state.dp_per_m_pa,
            reynolds: state.reynolds,
            warning,
        })
    }

    /// Size one pipe for a flow in a given category: minimum diameter from
    /// the category velocity limit, raised to the category floor, snapped
    /// to the catalog, then evaluated and priced.
    pub fn size(&self, flow: MassRate, category: PipeCategory) -> SizingResult<SizedPipe> {
        let spec = self.config.category_spec(category);
        let mut required = required_diameter(flow, spec.max_velocity_ms, self.density)?;
        if required.value < spec.min_diameter_m {
            required = m(spec.min_diameter_m);
        }
        let (diameter, select_warning) =
            select_standard_diameter(required, &self.config.standard_diameters_m)?;
        let eval = self.evaluate(diameter, flow)?;
        // Total cost is unit cost times edge length, applied by the caller.
        let unit_cost = price(diameter, m(1.0), category, self.config)?;
        Ok(SizedPipe {
            diameter,
            velocity_mps: eval.velocity_mps,
            dp_per_m_pa: eval.dp_per_m_pa,
            reynolds: eval.reynolds,
            unit_cost_eur_per_m: unit_cost,
            warnings: [select_warning, eval.warning],
        })
    }

    /// Next-larger catalog diameter, if any. Used by the auto-resize loop,
    /// which steps exactly one entry at a time.
    pub fn step_up(&self, current: Length) -> Option<Length> {
        self.config
            .standard_diameters_m
            .iter()
            .find(|&&d| d > current.value + 1e-9)
            .map(|&d| m(d))
    }
}
