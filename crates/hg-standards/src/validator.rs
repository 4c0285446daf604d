//! Rule checks for velocity, pressure gradient, flow regime, plant boundary
//! and the economic gradient band.

use hg_config::DesignConfig;
use hg_core::EdgeId;
use hg_net::Network;
use hg_solver::HydraulicState;
use serde::Serialize;

/// What a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    /// Velocity under the category minimum (stagnation/air risk).
    VelocityLow,
    /// Velocity over the category maximum (noise/erosion).
    VelocityHigh,
    /// Pressure gradient over the category maximum.
    PressureGradient,
    /// Flow not fully turbulent at the design point.
    LaminarFlow,
    /// Plant supply pressure outside the admissible band.
    PlantPressure,
    /// Plant supply temperature outside the admissible band.
    PlantTemperature,
    /// Gradient so low the pipe is uneconomically oversized.
    UneconomicGradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Must be fixed; blocks compliance.
    Hard,
    /// Reported but does not block compliance.
    Warning,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::VelocityHigh
            | ViolationKind::PressureGradient
            | ViolationKind::PlantPressure
            | ViolationKind::PlantTemperature => Severity::Hard,
            ViolationKind::VelocityLow
            | ViolationKind::LaminarFlow
            | ViolationKind::UneconomicGradient => Severity::Warning,
        }
    }
}

/// One rule violation. `edge` is `None` for plant-boundary checks.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub edge: Option<EdgeId>,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub measured: f64,
    pub limit: f64,
    /// Standard the limit is taken from.
    pub standard: &'static str,
}

impl Violation {
    fn new(edge: Option<EdgeId>, kind: ViolationKind, measured: f64, limit: f64, standard: &'static str) -> Self {
        Self {
            edge,
            kind,
            severity: kind.severity(),
            measured,
            limit,
            standard,
        }
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceResult {
    pub violations: Vec<Violation>,
    /// True when no hard violation was found.
    pub compliant: bool,
    /// Fraction of edges free of hard violations.
    pub compliance_rate: f64,
}

impl ComplianceResult {
    pub fn hard_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Hard)
    }
}

const EN_13941: &str = "EN 13941";
const DIN_1988: &str = "DIN 1988";
const VDI_2067: &str = "VDI 2067";

/// Check a solved network against the configured limits.
///
/// The state must come from solving this exact network; edge vectors are
/// indexed by edge id.
pub fn validate(network: &Network, state: &HydraulicState, config: &DesignConfig) -> ComplianceResult {
    debug_assert_eq!(network.edges().len(), state.edge_velocity_mps.len());

    let mut violations = Vec::new();
    let mut hard_edges = std::collections::BTreeSet::new();

    for edge in network.edges() {
        let i = edge.id.index() as usize;
        let spec = config.category_spec(edge.category);
        let flow_standard = if edge.role.is_service() {
            DIN_1988
        } else {
            EN_13941
        };

        let v = state.edge_velocity_mps[i];
        if v > spec.max_velocity_ms {
            violations.push(Violation::new(
                Some(edge.id),
                ViolationKind::VelocityHigh,
                v,
                spec.max_velocity_ms,
                flow_standard,
            ));
        } else if v < spec.min_velocity_ms {
            violations.push(Violation::new(
                Some(edge.id),
                ViolationKind::VelocityLow,
                v,
                spec.min_velocity_ms,
                flow_standard,
            ));
        }

        let grad = state.edge_dp_per_m_pa[i];
        if grad > spec.max_gradient_pa_m {
            violations.push(Violation::new(
                Some(edge.id),
                ViolationKind::PressureGradient,
                grad,
                spec.max_gradient_pa_m,
                flow_standard,
            ));
        } else if !edge.role.is_service() && grad < config.standards.economic_min_gradient_pa_m {
            violations.push(Violation::new(
                Some(edge.id),
                ViolationKind::UneconomicGradient,
                grad,
                config.standards.economic_min_gradient_pa_m,
                VDI_2067,
            ));
        }

        let re = state.edge_reynolds[i];
        if re < config.standards.turbulent_reynolds {
            violations.push(Violation::new(
                Some(edge.id),
                ViolationKind::LaminarFlow,
                re,
                config.standards.turbulent_reynolds,
                EN_13941,
            ));
        }
    }

    let bounds = &config.standards;
    let p_plant = config.plant.pressure_pa;
    if p_plant < bounds.min_plant_pressure_pa {
        violations.push(Violation::new(
            None,
            ViolationKind::PlantPressure,
            p_plant,
            bounds.min_plant_pressure_pa,
            EN_13941,
        ));
    } else if p_plant > bounds.max_plant_pressure_pa {
        violations.push(Violation::new(
            None,
            ViolationKind::PlantPressure,
            p_plant,
            bounds.max_plant_pressure_pa,
            EN_13941,
        ));
    }
    let t_plant = config.plant.temperature_c;
    if t_plant < bounds.min_plant_temperature_c {
        violations.push(Violation::new(
            None,
            ViolationKind::PlantTemperature,
            t_plant,
            bounds.min_plant_temperature_c,
            EN_13941,
        ));
    } else if t_plant > bounds.max_plant_temperature_c {
        violations.push(Violation::new(
            None,
            ViolationKind::PlantTemperature,
            t_plant,
            bounds.max_plant_temperature_c,
            EN_13941,
        ));
    }

    for violation in &violations {
        if violation.severity == Severity::Hard {
            if let Some(edge) = violation.edge {
                hard_edges.insert(edge);
            }
        }
    }

    let edge_count = network.edges().len();
    let compliance_rate = if edge_count == 0 {
        1.0
    } else {
        1.0 - hard_edges.len() as f64 / edge_count as f64
    };
    let compliant = !violations.iter().any(|v| v.severity == Severity::Hard);

    ComplianceResult {
        violations,
        compliant,
        compliance_rate,
    }
}
