//! Solved hydraulic state.

/// Lifecycle of one solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Initialized,
    Iterating,
    Converged,
    Diverged,
}

/// Complete hydraulic state of a network, recomputed in full on every
/// solve call. Vectors are indexed by node/edge id.
#[derive(Debug, Clone)]
pub struct HydraulicState {
    pub node_pressure_pa: Vec<f64>,
    pub node_temperature_c: Vec<f64>,
    pub edge_flow_kg_s: Vec<f64>,
    pub edge_velocity_mps: Vec<f64>,
    pub edge_dp_per_m_pa: Vec<f64>,
    pub edge_reynolds: Vec<f64>,
    pub status: SolverStatus,
    pub iterations: u32,
    /// Largest relative fluid-property change of the last refinement pass.
    pub residual: f64,
}

impl HydraulicState {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_pressure_pa: vec![0.0; node_count],
            node_temperature_c: vec![0.0; node_count],
            edge_flow_kg_s: vec![0.0; edge_count],
            edge_velocity_mps: vec![0.0; edge_count],
            edge_dp_per_m_pa: vec![0.0; edge_count],
            edge_reynolds: vec![0.0; edge_count],
            status: SolverStatus::Initialized,
            iterations: 0,
            residual: f64::INFINITY,
        }
    }

    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_initialized() {
        let s = HydraulicState::new(4, 6);
        assert_eq!(s.status, SolverStatus::Initialized);
        assert_eq!(s.node_pressure_pa.len(), 4);
        assert_eq!(s.edge_flow_kg_s.len(), 6);
        assert!(!s.converged());
    }
}
