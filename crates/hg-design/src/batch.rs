//! Batch execution of independent scenarios.
//!
//! Scenarios share nothing mutable, so they parallelize trivially.

use hg_config::DesignConfig;
use hg_core::StreetNodeId;
use hg_net::{Building, ServiceConnection, StreetGraph};
use rayon::prelude::*;
use tracing::info;

use crate::controller::AutoResizeController;
use crate::error::DesignResult;
use crate::run::SizingRun;

/// One self-contained design problem.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub streets: StreetGraph,
    pub buildings: Vec<Building>,
    pub connections: Vec<ServiceConnection>,
    pub plant_node: StreetNodeId,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: DesignResult<SizingRun>,
}

/// Run every scenario against the same configuration, in parallel.
/// Output order matches input order regardless of scheduling.
pub fn run_batch(config: &DesignConfig, scenarios: &[Scenario]) -> Vec<BatchOutcome> {
    info!(count = scenarios.len(), "starting batch run");
    scenarios
        .par_iter()
        .map(|scenario| {
            let controller = AutoResizeController::new(config);
            let result = controller.run(
                &scenario.streets,
                &scenario.buildings,
                &scenario.connections,
                scenario.plant_node,
            );
            BatchOutcome {
                name: scenario.name.clone(),
                result,
            }
        })
        .collect()
}
