//! Friction factor and Darcy–Weisbach pressure gradient.

use crate::conversions::{flow_velocity, reynolds_number};
use crate::error::{check_finite, HydraulicsResult};
use hg_core::units::{Density, Length, MassRate};

/// Darcy friction factor.
///
/// Laminar (Re < 2300): `f = 64 / Re`. Turbulent: Swamee–Jain explicit
/// approximation of Colebrook–White,
///
/// ```text
/// f = 0.25 / (log10(e/(3.7 D) + 5.74 / Re^0.9))^2
/// ```
pub fn friction_factor(reynolds: f64, roughness: Length, diameter: Length) -> f64 {
    if reynolds < 2300.0 {
        64.0 / reynolds
    } else {
        let e_d = roughness.value / diameter.value;
        let a = e_d / 3.7;
        let b = 5.74 / reynolds.powf(0.9);
        let f = 0.25 / (a + b).log10().powi(2);
        f.max(1e-4)
    }
}

/// Fully evaluated flow state of one pipe at one operating point.
#[derive(Debug, Clone, Copy)]
pub struct PipeFlowState {
    /// Mean velocity [m/s]
    pub velocity_mps: f64,
    /// Darcy–Weisbach pressure gradient [Pa/m]
    pub dp_per_m_pa: f64,
    /// Reynolds number
    pub reynolds: f64,
    /// Darcy friction factor
    pub friction_factor: f64,
}

/// Pressure gradient and companion quantities for a pipe section.
///
/// ```text
/// dp/L = f / D * rho * v^2 / 2
/// ```
pub fn pressure_gradient(
    flow: MassRate,
    diameter: Length,
    roughness: Length,
    density: Density,
    viscosity_pa_s: f64,
) -> HydraulicsResult<PipeFlowState> {
    let v = flow_velocity(flow, diameter, density)?;
    let re = reynolds_number(v, diameter, density, viscosity_pa_s)?;
    let f = friction_factor(re, roughness, diameter);

    let dp_per_m = f / diameter.value * density.value * v.value.powi(2) / 2.0;
    check_finite(dp_per_m, "pressure gradient")?;

    Ok(PipeFlowState {
        velocity_mps: v.value,
        dp_per_m_pa: dp_per_m,
        reynolds: re,
        friction_factor: f,
    })
}
