//! The record of one complete design run.

use chrono::{DateTime, Utc};
use hg_core::EdgeId;
use hg_net::Network;
use hg_sizing::SizingWarning;
use hg_solver::HydraulicState;
use hg_standards::ComplianceResult;
use uuid::Uuid;

use crate::controller::TerminalStatus;

/// A sizing warning attached to the pipe it was raised for.
#[derive(Debug, Clone, Copy)]
pub struct EdgeWarning {
    pub edge: EdgeId,
    pub warning: SizingWarning,
}

/// Everything one run produced: the final network, its hydraulic state,
/// the compliance verdict and run metadata.
#[derive(Debug)]
pub struct SizingRun {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub status: TerminalStatus,
    /// Resize iterations performed (each one includes a full solve).
    pub iterations: u32,
    pub network: Network,
    pub state: HydraulicState,
    pub compliance: ComplianceResult,
    pub warnings: Vec<EdgeWarning>,
    /// Total pipe cost of the final design [EUR].
    pub total_cost_eur: f64,
}

impl SizingRun {
    pub fn succeeded(&self) -> bool {
        self.status == TerminalStatus::ConvergedCompliant
    }
}
