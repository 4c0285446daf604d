//! Heat-to-flow and flow-to-velocity conversions.

use crate::error::{check_finite, HydraulicsError, HydraulicsResult};
use hg_core::units::{kgps, mps, Density, Length, MassRate, Power, Temperature, Velocity};

/// Convert a heat load into the mass flow that transports it.
///
/// ```text
/// mdot = Q / (cp * (T_supply - T_return))
/// ```
///
/// Fails if the load is non-positive or the temperature spread is inverted.
pub fn heat_to_mass_flow(
    heat: Power,
    supply: Temperature,
    ret: Temperature,
    cp_j_per_kg_k: f64,
) -> HydraulicsResult<MassRate> {
    let q_w = heat.value;
    if !(q_w > 0.0) {
        return Err(HydraulicsError::InvalidFlow { value: q_w });
    }
    let spread_k = supply.value - ret.value;
    if !(spread_k > 0.0) {
        return Err(HydraulicsError::InvalidSpread {
            supply_c: supply.value - 273.15,
            return_c: ret.value - 273.15,
        });
    }
    let mdot = q_w / (cp_j_per_kg_k * spread_k);
    check_finite(mdot, "mass flow")?;
    Ok(kgps(mdot))
}

/// Mean flow velocity in a circular pipe.
///
/// ```text
/// v = mdot / (rho * A),   A = pi * D^2 / 4
/// ```
pub fn flow_velocity(
    flow: MassRate,
    diameter: Length,
    density: Density,
) -> HydraulicsResult<Velocity> {
    if !(flow.value > 0.0) {
        return Err(HydraulicsError::InvalidFlow { value: flow.value });
    }
    let area = std::f64::consts::PI * diameter.value.powi(2) / 4.0;
    let v = flow.value / (density.value * area);
    check_finite(v, "velocity")?;
    Ok(mps(v))
}

/// Reynolds number for pipe flow.
///
/// ```text
/// Re = rho * v * D / mu
/// ```
pub fn reynolds_number(
    velocity: Velocity,
    diameter: Length,
    density: Density,
    viscosity_pa_s: f64,
) -> HydraulicsResult<f64> {
    let re = density.value * velocity.value * diameter.value / viscosity_pa_s;
    check_finite(re, "Reynolds number")
}
