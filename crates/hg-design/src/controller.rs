//! Size-solve-validate-resize loop.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::Utc;
use hg_config::DesignConfig;
use hg_core::units::{celsius, kg_per_m3};
use hg_core::{EdgeId, StreetNodeId};
use hg_fluids::water_dynamic_viscosity;
use hg_net::{Building, Network, NetworkGraphBuilder, ServiceConnection, StreetGraph};
use hg_sizing::PipeSizingEngine;
use hg_solver::{HydraulicSolver, HydraulicState, SolverStatus};
use hg_standards::{validate, ComplianceResult, ViolationKind};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DesignError, DesignResult};
use crate::run::{EdgeWarning, SizingRun};

/// How a design run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Converged hydraulics, no hard violations.
    ConvergedCompliant,
    /// Converged hydraulics, but the remaining hard violations cannot be
    /// fixed by resizing (plant boundary, velocity floor, catalog
    /// exhausted).
    ConvergedNoncompliant,
    /// The hydraulic solve diverged.
    SolverDiverged,
    /// Iteration or time budget exhausted with violations outstanding.
    MaxIterationsReached,
    /// Oscillation guard tripped: the same violations recurred with no
    /// net diameter change.
    NonConvergent,
}

impl TerminalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminalStatus::ConvergedCompliant => "converged_compliant",
            TerminalStatus::ConvergedNoncompliant => "converged_noncompliant",
            TerminalStatus::SolverDiverged => "solver_diverged",
            TerminalStatus::MaxIterationsReached => "max_iterations_reached",
            TerminalStatus::NonConvergent => "non_convergent",
        }
    }
}

/// Runs the design pipeline for one scenario.
///
/// Diameters only ever step up through the catalog, one entry per
/// iteration and only for pipes carrying a hard velocity or gradient
/// violation, so the loop terminates: either the design becomes compliant
/// or the offending pipes hit the top of the catalog.
pub struct AutoResizeController<'a> {
    config: &'a DesignConfig,
    deadline: Option<Instant>,
}

impl<'a> AutoResizeController<'a> {
    pub fn new(config: &'a DesignConfig) -> Self {
        Self {
            config,
            deadline: None,
        }
    }

    /// Give up (status `MaxIterationsReached`) once this instant passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn run(
        &self,
        streets: &StreetGraph,
        buildings: &[Building],
        connections: &[ServiceConnection],
        plant_node: StreetNodeId,
    ) -> DesignResult<SizingRun> {
        self.config.validate()?;

        let mut network =
            NetworkGraphBuilder::new(self.config).build(streets, buildings, connections, plant_node)?;

        let engine = PipeSizingEngine::new(
            self.config,
            kg_per_m3(self.config.sizing_density_kg_m3),
            water_dynamic_viscosity(celsius(self.config.supply_temperature_c))?,
        );
        let warnings = self.initial_sizing(&mut network, &engine)?;
        info!(
            edges = network.edges().len(),
            warnings = warnings.len(),
            "initial sizing complete"
        );

        let mut solver = HydraulicSolver::new(self.config);
        if let Some(deadline) = self.deadline {
            solver = solver.with_deadline(deadline);
        }

        let mut status = TerminalStatus::MaxIterationsReached;
        let mut iterations = 0;
        let mut last: Option<(HydraulicState, ComplianceResult)> = None;
        let mut previous_round: Option<(BTreeSet<EdgeId>, Vec<f64>)> = None;

        for iteration in 1..=self.config.max_resize_iterations {
            // The first iteration always runs so the run carries a state
            // even under an already-expired deadline.
            if let Some(deadline) = self.deadline {
                if last.is_some() && Instant::now() >= deadline {
                    warn!(iteration, "design deadline exceeded");
                    break;
                }
            }
            iterations = iteration;

            let state = solver.solve(&network)?;
            if state.status == SolverStatus::Diverged {
                let compliance = validate(&network, &state, self.config);
                last = Some((state, compliance));
                status = TerminalStatus::SolverDiverged;
                break;
            }
            sync_edges(&mut network, &state);

            let compliance = validate(&network, &state, self.config);
            debug!(
                iteration,
                violations = compliance.violations.len(),
                compliant = compliance.compliant,
                "validation pass"
            );

            if compliance.compliant {
                last = Some((state, compliance));
                status = TerminalStatus::ConvergedCompliant;
                break;
            }

            // Only velocity and gradient excesses are fixable by a larger
            // pipe; everything else ends the loop as noncompliant.
            let targets: BTreeSet<EdgeId> = compliance
                .hard_violations()
                .filter(|v| {
                    matches!(
                        v.kind,
                        ViolationKind::VelocityHigh | ViolationKind::PressureGradient
                    )
                })
                .filter_map(|v| v.edge)
                .collect();
            if targets.is_empty() {
                last = Some((state, compliance));
                status = TerminalStatus::ConvergedNoncompliant;
                break;
            }

            let diameters: Vec<f64> = network
                .edges()
                .iter()
                .map(|e| e.diameter.map(|d| d.value).unwrap_or(0.0))
                .collect();
            if let Some((prev_targets, prev_diameters)) = &previous_round {
                if *prev_targets == targets && *prev_diameters == diameters {
                    warn!(?targets, "resize loop stalled on the same violations");
                    last = Some((state, compliance));
                    status = TerminalStatus::NonConvergent;
                    break;
                }
            }
            previous_round = Some((targets.clone(), diameters));
            last = Some((state, compliance));

            // The budget's last iteration returns the solved, validated
            // diameters untouched; a trailing grow would leave the network
            // out of step with the recorded compliance result.
            if iteration == self.config.max_resize_iterations {
                break;
            }

            let grown = self.grow(&mut network, &engine, &targets)?;
            info!(iteration, grown, targets = targets.len(), "resize step");
            if grown == 0 {
                // Nothing changed, so nothing will on the next pass either.
                status = TerminalStatus::ConvergedNoncompliant;
                break;
            }
        }

        let (state, compliance) = last.ok_or_else(|| DesignError::Internal {
            what: "design loop produced no state".into(),
        })?;
        let total_cost_eur = network.total_cost_eur();
        Ok(SizingRun {
            id: Uuid::new_v4(),
            created: Utc::now(),
            status,
            iterations,
            network,
            state,
            compliance,
            warnings,
            total_cost_eur,
        })
    }

    /// Assign every pipe its first catalog diameter and record warnings.
    fn initial_sizing(
        &self,
        network: &mut Network,
        engine: &PipeSizingEngine<'_>,
    ) -> DesignResult<Vec<EdgeWarning>> {
        let mut warnings = Vec::new();
        let plan: Vec<_> = network
            .edges()
            .iter()
            .map(|e| (e.id, e.flow, e.category))
            .collect();
        for (id, flow, category) in plan {
            let sized = engine.size(flow, category)?;
            for warning in sized.warnings.into_iter().flatten() {
                warnings.push(EdgeWarning { edge: id, warning });
            }
            let edge = network.edge_mut(id).ok_or_else(|| DesignError::Internal {
                what: format!("edge {id} vanished during sizing"),
            })?;
            edge.diameter = Some(sized.diameter);
            edge.velocity_mps = sized.velocity_mps;
            edge.dp_per_m_pa = sized.dp_per_m_pa;
            edge.reynolds = sized.reynolds;
            edge.unit_cost_eur_per_m = sized.unit_cost_eur_per_m;
        }
        Ok(warnings)
    }

    /// Step each target pipe one catalog entry up; pipes already at the
    /// top of the catalog stay put. Returns how many actually grew.
    fn grow(
        &self,
        network: &mut Network,
        engine: &PipeSizingEngine<'_>,
        targets: &BTreeSet<EdgeId>,
    ) -> DesignResult<usize> {
        let mut grown = 0;
        for &id in targets {
            let (current, flow, category) = {
                let edge = network.edge(id).ok_or_else(|| DesignError::Internal {
                    what: format!("violation references unknown edge {id}"),
                })?;
                let diameter = edge.diameter.ok_or_else(|| DesignError::Internal {
                    what: format!("edge {id} lost its diameter"),
                })?;
                (diameter, edge.flow, edge.category)
            };
            let Some(next) = engine.step_up(current) else {
                debug!(edge = %id, diameter_m = current.value, "catalog exhausted");
                continue;
            };
            let eval = engine.evaluate(next, flow)?;
            let unit_cost =
                hg_sizing::price(next, hg_core::units::m(1.0), category, self.config)?;

            let edge = network.edge_mut(id).ok_or_else(|| DesignError::Internal {
                what: format!("violation references unknown edge {id}"),
            })?;
            edge.diameter = Some(next);
            edge.velocity_mps = eval.velocity_mps;
            edge.dp_per_m_pa = eval.dp_per_m_pa;
            edge.reynolds = eval.reynolds;
            edge.unit_cost_eur_per_m = unit_cost;
            grown += 1;
        }
        Ok(grown)
    }
}

/// Copy the solved operating point back onto the edges so validation and
/// reporting see solver-accurate numbers, not the sizing estimates.
fn sync_edges(network: &mut Network, state: &HydraulicState) {
    let ids: Vec<EdgeId> = network.edges().iter().map(|e| e.id).collect();
    for id in ids {
        let i = id.index() as usize;
        if let Some(edge) = network.edge_mut(id) {
            edge.velocity_mps = state.edge_velocity_mps[i];
            edge.dp_per_m_pa = state.edge_dp_per_m_pa[i];
            edge.reynolds = state.edge_reynolds[i];
        }
    }
}
