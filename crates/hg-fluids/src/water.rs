//! Liquid-water correlations.
//!
//! Validity: 0.5–150 °C at loop pressures (pressure dependence of liquid
//! density/viscosity is negligible at district-heating conditions and is
//! ignored).

use crate::error::{FluidError, FluidResult};
use hg_core::units::{kg_per_m3, pa_s, Density, DynVisc, Temperature};

const T_MIN_C: f64 = 0.5;
const T_MAX_C: f64 = 150.0;

fn check_range(t_c: f64) -> FluidResult<()> {
    if !t_c.is_finite() || t_c < T_MIN_C || t_c > T_MAX_C {
        return Err(FluidError::OutOfRange {
            t_c,
            min_c: T_MIN_C,
            max_c: T_MAX_C,
        });
    }
    Ok(())
}

fn to_celsius(t: Temperature) -> f64 {
    // uom stores thermodynamic temperature in kelvin
    t.value - 273.15
}

/// Density of liquid water at atmospheric-to-loop pressure.
///
/// Kell (1975) rational polynomial in t [°C]:
///
/// ```text
/// rho = (999.83952 + 16.945176 t - 7.9870401e-3 t^2 - 46.170461e-6 t^3
///        + 105.56302e-9 t^4 - 280.54253e-12 t^5) / (1 + 16.897850e-3 t)
/// ```
pub fn water_density(t: Temperature) -> FluidResult<Density> {
    let t_c = to_celsius(t);
    check_range(t_c)?;

    let num = 999.839_52 + 16.945_176 * t_c - 7.987_040_1e-3 * t_c.powi(2)
        - 46.170_461e-6 * t_c.powi(3)
        + 105.563_02e-9 * t_c.powi(4)
        - 280.542_53e-12 * t_c.powi(5);
    let den = 1.0 + 16.897_850e-3 * t_c;
    let rho = num / den;

    if !rho.is_finite() || rho <= 0.0 {
        return Err(FluidError::NonPhysical {
            what: "density",
            value: rho,
        });
    }
    Ok(kg_per_m3(rho))
}

/// Dynamic viscosity of liquid water.
///
/// Vogel-type correlation in T [K]:
///
/// ```text
/// mu = 1e-3 * exp(-3.7188 + 578.919 / (T - 137.546))   [Pa·s]
/// ```
pub fn water_dynamic_viscosity(t: Temperature) -> FluidResult<DynVisc> {
    let t_c = to_celsius(t);
    check_range(t_c)?;

    let t_k = t.value;
    let mu = 1e-3 * (-3.7188 + 578.919 / (t_k - 137.546)).exp();

    if !mu.is_finite() || mu <= 0.0 {
        return Err(FluidError::NonPhysical {
            what: "dynamic viscosity",
            value: mu,
        });
    }
    Ok(pa_s(mu))
}

/// Density and viscosity evaluated together at one temperature.
#[derive(Debug, Clone, Copy)]
pub struct WaterProperties {
    pub density: Density,
    pub viscosity: DynVisc,
}

impl WaterProperties {
    pub fn at(t: Temperature) -> FluidResult<Self> {
        Ok(Self {
            density: water_density(t)?,
            viscosity: water_dynamic_viscosity(t)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_core::units::celsius;
    use proptest::prelude::*;

    #[test]
    fn density_reference_points() {
        // Kell values: 998.2 kg/m³ at 20 °C, 971.8 at 80 °C
        let rho20 = water_density(celsius(20.0)).unwrap().value;
        assert!((rho20 - 998.2).abs() < 0.5, "rho(20) = {rho20}");

        let rho80 = water_density(celsius(80.0)).unwrap().value;
        assert!((rho80 - 971.8).abs() < 1.0, "rho(80) = {rho80}");
    }

    #[test]
    fn viscosity_reference_points() {
        // ~1.00e-3 Pa·s at 20 °C, ~0.355e-3 at 80 °C
        let mu20 = water_dynamic_viscosity(celsius(20.0)).unwrap().value;
        assert!((mu20 - 1.0e-3).abs() < 0.1e-3, "mu(20) = {mu20}");

        let mu80 = water_dynamic_viscosity(celsius(80.0)).unwrap().value;
        assert!((mu80 - 0.355e-3).abs() < 0.05e-3, "mu(80) = {mu80}");
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(water_density(celsius(-5.0)).is_err());
        assert!(water_density(celsius(200.0)).is_err());
        assert!(water_dynamic_viscosity(celsius(160.0)).is_err());
    }

    proptest! {
        #[test]
        fn density_decreases_with_temperature(t in 5.0_f64..140.0) {
            let a = water_density(celsius(t)).unwrap().value;
            let b = water_density(celsius(t + 5.0)).unwrap().value;
            prop_assert!(b < a);
        }

        #[test]
        fn viscosity_decreases_with_temperature(t in 1.0_f64..140.0) {
            let a = water_dynamic_viscosity(celsius(t)).unwrap().value;
            let b = water_dynamic_viscosity(celsius(t + 5.0)).unwrap().value;
            prop_assert!(b < a);
        }
    }
}
