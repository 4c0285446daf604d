//! Direct pressure/temperature propagation over the dual-pipe tree.
//!
//! All edge mass flows are fixed by aggregation, so one pass in topological
//! order yields every node pressure. The outer loop only refines the
//! temperature at which each pipe's water properties are evaluated: a pass
//! produces node temperatures, each pipe's operating temperature is re-
//! estimated as the mean of its endpoints, and passes repeat until the
//! implied density shift falls under the residual tolerance.

use std::time::Instant;

use hg_config::DesignConfig;
use hg_core::units::celsius;
use hg_fluids::WaterProperties;
use hg_hydraulics::pressure_gradient;
use hg_net::{Network, NodeKind};
use tracing::{debug, info, warn};

use crate::error::{SolverError, SolverResult};
use crate::state::{HydraulicState, SolverStatus};

pub struct HydraulicSolver<'a> {
    config: &'a DesignConfig,
    deadline: Option<Instant>,
}

impl<'a> HydraulicSolver<'a> {
    pub fn new(config: &'a DesignConfig) -> Self {
        Self {
            config,
            deadline: None,
        }
    }

    /// Abort refinement (status `Diverged`) once this instant passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn solve(&self, network: &Network) -> SolverResult<HydraulicState> {
        for edge in network.edges() {
            if edge.diameter.is_none() {
                return Err(SolverError::UnsizedEdge { edge: edge.id });
            }
        }
        let node_count = network.nodes().len();
        let edge_count = network.edges().len();
        if node_count == 0 || edge_count == 0 {
            return Err(SolverError::ProblemSetup {
                what: "network has no pipes".into(),
            });
        }

        let mut state = HydraulicState::new(node_count, edge_count);

        // Operating-temperature estimate per edge, refined across passes.
        let mut edge_temp_c: Vec<f64> = network
            .edges()
            .iter()
            .map(|e| {
                if e.role.is_supply_side() {
                    self.config.supply_temperature_c
                } else {
                    self.config.return_temperature_c
                }
            })
            .collect();

        let settings = &self.config.solver;
        for iteration in 1..=settings.max_iterations {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    warn!(iteration, "solve deadline exceeded");
                    state.status = SolverStatus::Diverged;
                    state.iterations = iteration - 1;
                    return Ok(state);
                }
            }
            state.status = SolverStatus::Iterating;
            state.iterations = iteration;

            self.propagate(network, &edge_temp_c, &mut state)?;
            if state.status == SolverStatus::Diverged {
                return Ok(state);
            }

            // Re-estimate each pipe's operating temperature and measure the
            // density shift that re-evaluating properties there would cause.
            let mut residual: f64 = 0.0;
            let mut next_temp = edge_temp_c.clone();
            for (i, edge) in network.edges().iter().enumerate() {
                let t_new = 0.5
                    * (state.node_temperature_c[edge.start.index() as usize]
                        + state.node_temperature_c[edge.end.index() as usize]);
                let rho_old = WaterProperties::at(celsius(edge_temp_c[i]))?.density.value;
                let rho_new = WaterProperties::at(celsius(t_new))?.density.value;
                residual = residual.max((rho_new - rho_old).abs() / rho_old);
                next_temp[i] = t_new;
            }
            state.residual = residual;
            debug!(iteration, residual, "refinement pass complete");

            if residual <= settings.residual_tolerance {
                state.status = SolverStatus::Converged;
                info!(
                    iterations = iteration,
                    residual, "hydraulic state converged"
                );
                return Ok(state);
            }
            edge_temp_c = next_temp;
        }

        warn!(
            max_iterations = settings.max_iterations,
            residual = state.residual,
            "property refinement did not converge"
        );
        state.status = SolverStatus::Diverged;
        Ok(state)
    }

    /// One full propagation pass at fixed per-edge operating temperatures.
    fn propagate(
        &self,
        network: &Network,
        edge_temp_c: &[f64],
        state: &mut HydraulicState,
    ) -> SolverResult<()> {
        let settings = &self.config.solver;
        let cp = self.config.cp_j_per_kg_k;
        let t_amb = settings.ambient_temperature_c;
        let roughness = hg_core::units::m(self.config.pipe_roughness_m);

        let mut known = vec![false; network.nodes().len()];
        let plant = network.plant_supply().index() as usize;
        state.node_pressure_pa[plant] = self.config.plant.pressure_pa;
        state.node_temperature_c[plant] = self.config.plant.temperature_c;
        known[plant] = true;

        // Supply side, plant outward. Every node has exactly one feeding
        // edge, so its pressure and temperature are final on first visit.
        for &edge_id in network.supply_order() {
            let edge = network
                .edge(edge_id)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("supply order references unknown edge {edge_id}"),
                })?;
            let start = edge.start.index() as usize;
            let end = edge.end.index() as usize;
            if !known[start] {
                return Err(SolverError::ProblemSetup {
                    what: format!("edge {edge_id} processed before its start node"),
                });
            }

            let props = WaterProperties::at(celsius(edge_temp_c[edge_id.index() as usize]))?;
            let diameter = edge
                .diameter
                .ok_or(SolverError::UnsizedEdge { edge: edge.id })?;
            let flow_state = pressure_gradient(
                edge.flow,
                diameter,
                roughness,
                props.density,
                props.viscosity.value,
            )?;

            let i = edge_id.index() as usize;
            state.edge_flow_kg_s[i] = edge.flow.value;
            state.edge_velocity_mps[i] = flow_state.velocity_mps;
            state.edge_dp_per_m_pa[i] = flow_state.dp_per_m_pa;
            state.edge_reynolds[i] = flow_state.reynolds;

            let p_end =
                state.node_pressure_pa[start] - flow_state.dp_per_m_pa * edge.length.value;
            let t_start = state.node_temperature_c[start];
            let u = if edge.insulated {
                settings.u_insulated_w_per_m_k
            } else {
                settings.u_uninsulated_w_per_m_k
            };
            // Lumped heat loss over the pipe run, clamped at ambient.
            let dt = u * edge.length.value * (t_start - t_amb) / (edge.flow.value * cp);
            let t_end = (t_start - dt).max(t_amb);

            if !p_end.is_finite() || !t_end.is_finite() {
                warn!(edge = %edge_id, p_end, t_end, "non-finite state, aborting");
                state.status = SolverStatus::Diverged;
                return Ok(());
            }
            state.node_pressure_pa[end] = p_end;
            state.node_temperature_c[end] = t_end;
            known[end] = true;
        }

        // Substations: fixed differential pressure, fixed return setpoint.
        for (_, supply_node, return_node) in network.building_nodes() {
            let s = supply_node.index() as usize;
            let r = return_node.index() as usize;
            if !known[s] {
                return Err(SolverError::ProblemSetup {
                    what: format!("building supply node {supply_node} never reached"),
                });
            }
            state.node_pressure_pa[r] = state.node_pressure_pa[s] - settings.substation_dp_pa;
            state.node_temperature_c[r] = self.config.return_temperature_c;
            known[r] = true;
        }

        // Return side, buildings inward. Junction returns can receive
        // several arrivals; the governing pressure is the lowest one.
        for &edge_id in network.return_order() {
            let edge = network
                .edge(edge_id)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("return order references unknown edge {edge_id}"),
                })?;
            let start = edge.start.index() as usize;
            let end = edge.end.index() as usize;
            if !known[start] {
                return Err(SolverError::ProblemSetup {
                    what: format!("edge {edge_id} processed before its start node"),
                });
            }

            let props = WaterProperties::at(celsius(edge_temp_c[edge_id.index() as usize]))?;
            let diameter = edge
                .diameter
                .ok_or(SolverError::UnsizedEdge { edge: edge.id })?;
            let flow_state = pressure_gradient(
                edge.flow,
                diameter,
                roughness,
                props.density,
                props.viscosity.value,
            )?;

            let i = edge_id.index() as usize;
            state.edge_flow_kg_s[i] = edge.flow.value;
            state.edge_velocity_mps[i] = flow_state.velocity_mps;
            state.edge_dp_per_m_pa[i] = flow_state.dp_per_m_pa;
            state.edge_reynolds[i] = flow_state.reynolds;

            let p_end =
                state.node_pressure_pa[start] - flow_state.dp_per_m_pa * edge.length.value;
            if !p_end.is_finite() {
                warn!(edge = %edge_id, p_end, "non-finite state, aborting");
                state.status = SolverStatus::Diverged;
                return Ok(());
            }
            if known[end] {
                state.node_pressure_pa[end] = state.node_pressure_pa[end].min(p_end);
            } else {
                state.node_pressure_pa[end] = p_end;
                state.node_temperature_c[end] = self.config.return_temperature_c;
                known[end] = true;
            }
        }

        // Isolated plant-return check; everything else is covered by the
        // order invariants above.
        for node in network.nodes() {
            if matches!(node.kind, NodeKind::PlantReturn) && !known[node.id.index() as usize] {
                return Err(SolverError::ProblemSetup {
                    what: "plant return node never reached".into(),
                });
            }
        }
        Ok(())
    }
}

/// Solve with default options.
pub fn solve(network: &Network, config: &DesignConfig) -> SolverResult<HydraulicState> {
    HydraulicSolver::new(config).solve(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_core::units::{kw, m};
    use hg_core::Id;
    use hg_net::{Building, NetworkGraphBuilder, Point, ServiceConnection, StreetGraph};
    use hg_sizing::PipeSizingEngine;
    use std::time::Duration;

    /// Plant -- hub street with two buildings hanging off the hub.
    fn two_building_network(config: &DesignConfig) -> hg_net::Network {
        let mut streets = StreetGraph::new();
        let plant = streets.add_node(Point::new(0.0, 0.0));
        let hub = streets.add_node(Point::new(200.0, 0.0));
        streets.add_segment(plant, hub, m(200.0));

        let buildings = vec![
            Building {
                id: Id::from_index(0),
                position: Point::new(210.0, 5.0),
                peak_demand: kw(60.0),
                annual_demand_kwh: 120_000.0,
            },
            Building {
                id: Id::from_index(1),
                position: Point::new(210.0, -5.0),
                peak_demand: kw(90.0),
                annual_demand_kwh: 180_000.0,
            },
        ];
        let connections = vec![
            ServiceConnection::new(
                Id::from_index(0),
                hub,
                Point::new(200.0, 0.0),
                m(11.2),
                m(config.max_service_distance_m),
            )
            .unwrap(),
            ServiceConnection::new(
                Id::from_index(1),
                hub,
                Point::new(200.0, 0.0),
                m(11.2),
                m(config.max_service_distance_m),
            )
            .unwrap(),
        ];

        NetworkGraphBuilder::new(config)
            .build(&streets, &buildings, &connections, plant)
            .unwrap()
    }

    fn size_all(network: &mut hg_net::Network, config: &DesignConfig) {
        let props = WaterProperties::at(celsius(config.supply_temperature_c)).unwrap();
        let engine = PipeSizingEngine::new(config, props.density, props.viscosity);
        let plan: Vec<_> = network
            .edges()
            .iter()
            .map(|e| (e.id, engine.size(e.flow, e.category).unwrap()))
            .collect();
        for (id, sized) in plan {
            let edge = network.edge_mut(id).unwrap();
            edge.diameter = Some(sized.diameter);
            edge.velocity_mps = sized.velocity_mps;
            edge.dp_per_m_pa = sized.dp_per_m_pa;
            edge.reynolds = sized.reynolds;
            edge.unit_cost_eur_per_m = sized.unit_cost_eur_per_m;
        }
    }

    #[test]
    fn unsized_network_is_rejected() {
        let config = DesignConfig::default();
        let network = two_building_network(&config);
        let err = solve(&network, &config).unwrap_err();
        assert!(matches!(err, SolverError::UnsizedEdge { .. }));
    }

    #[test]
    fn sized_network_converges() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let state = solve(&network, &config).unwrap();
        assert_eq!(state.status, SolverStatus::Converged);
        assert!(state.iterations >= 1);
        assert!(state.residual <= config.solver.residual_tolerance);
    }

    #[test]
    fn pressure_drops_along_every_pipe() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let state = solve(&network, &config).unwrap();
        let plant = network.plant_supply().index() as usize;
        assert_eq!(state.node_pressure_pa[plant], config.plant.pressure_pa);

        for edge in network.edges() {
            let p_start = state.node_pressure_pa[edge.start.index() as usize];
            let p_end = state.node_pressure_pa[edge.end.index() as usize];
            assert!(
                p_end < p_start,
                "edge {:?}: {p_start} -> {p_end}",
                edge.id
            );
        }
    }

    #[test]
    fn substation_takes_its_differential() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let state = solve(&network, &config).unwrap();
        for (_, supply_node, return_node) in network.building_nodes() {
            let p_s = state.node_pressure_pa[supply_node.index() as usize];
            let p_r = state.node_pressure_pa[return_node.index() as usize];
            assert!((p_s - p_r - config.solver.substation_dp_pa).abs() < 1e-6);
            assert_eq!(
                state.node_temperature_c[return_node.index() as usize],
                config.return_temperature_c
            );
        }
    }

    #[test]
    fn supply_temperature_decays_toward_ambient() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let state = solve(&network, &config).unwrap();
        let plant_t = config.plant.temperature_c;
        for (_, supply_node, _) in network.building_nodes() {
            let t = state.node_temperature_c[supply_node.index() as usize];
            assert!(t < plant_t, "no heat loss along the run: {t}");
            assert!(t > config.solver.ambient_temperature_c);
        }
    }

    #[test]
    fn repeated_solves_are_identical() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let a = solve(&network, &config).unwrap();
        let b = solve(&network, &config).unwrap();
        assert_eq!(a.node_pressure_pa, b.node_pressure_pa);
        assert_eq!(a.node_temperature_c, b.node_temperature_c);
        assert_eq!(a.edge_dp_per_m_pa, b.edge_dp_per_m_pa);
    }

    #[test]
    fn expired_deadline_reports_divergence() {
        let config = DesignConfig::default();
        let mut network = two_building_network(&config);
        size_all(&mut network, &config);

        let past = Instant::now() - Duration::from_secs(1);
        let state = HydraulicSolver::new(&config)
            .with_deadline(past)
            .solve(&network)
            .unwrap();
        assert_eq!(state.status, SolverStatus::Diverged);
        assert_eq!(state.iterations, 0);
    }
}
