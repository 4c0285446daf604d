//! Serializable summary of a design run.
//!
//! Plain-float mirror of the run structures, so reports round-trip through
//! JSON/YAML without unit machinery.

use hg_net::{NodeKind, PipeMaterial, PipeRole};
use hg_standards::Violation;
use serde::Serialize;

use crate::run::SizingRun;

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: u32,
    pub kind: String,
    pub pressure_pa: f64,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipeReport {
    pub id: u32,
    pub role: &'static str,
    pub category: &'static str,
    pub material: &'static str,
    pub length_m: f64,
    pub flow_kg_s: f64,
    pub diameter_m: Option<f64>,
    pub velocity_mps: f64,
    pub dp_per_m_pa: f64,
    pub reynolds: f64,
    pub cost_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DesignReport {
    pub run_id: String,
    pub created_utc: String,
    pub status: &'static str,
    pub iterations: u32,
    pub compliant: bool,
    pub compliance_rate: f64,
    pub total_cost_eur: f64,
    pub nodes: Vec<NodeReport>,
    pub pipes: Vec<PipeReport>,
    pub violations: Vec<Violation>,
}

fn role_str(role: PipeRole) -> &'static str {
    match role {
        PipeRole::Supply => "supply",
        PipeRole::Return => "return",
        PipeRole::ServiceSupply => "service_supply",
        PipeRole::ServiceReturn => "service_return",
    }
}

fn material_str(material: PipeMaterial) -> &'static str {
    match material {
        PipeMaterial::Steel => "steel",
        PipeMaterial::Pex => "pex",
    }
}

fn kind_str(kind: NodeKind) -> String {
    match kind {
        NodeKind::PlantSupply => "plant_supply".into(),
        NodeKind::PlantReturn => "plant_return".into(),
        NodeKind::JunctionSupply(n) => format!("junction_supply({n})"),
        NodeKind::JunctionReturn(n) => format!("junction_return({n})"),
        NodeKind::BuildingSupply(b) => format!("building_supply({b})"),
        NodeKind::BuildingReturn(b) => format!("building_return({b})"),
    }
}

impl DesignReport {
    pub fn from_run(run: &SizingRun) -> Self {
        let nodes = run
            .network
            .nodes()
            .iter()
            .map(|node| {
                let i = node.id.index() as usize;
                NodeReport {
                    id: node.id.index(),
                    kind: kind_str(node.kind),
                    pressure_pa: run.state.node_pressure_pa[i],
                    temperature_c: run.state.node_temperature_c[i],
                }
            })
            .collect();
        let pipes = run
            .network
            .edges()
            .iter()
            .map(|edge| PipeReport {
                id: edge.id.index(),
                role: role_str(edge.role),
                category: edge.category.as_str(),
                material: material_str(edge.material),
                length_m: edge.length.value,
                flow_kg_s: edge.flow.value,
                diameter_m: edge.diameter.map(|d| d.value),
                velocity_mps: edge.velocity_mps,
                dp_per_m_pa: edge.dp_per_m_pa,
                reynolds: edge.reynolds,
                cost_eur: edge.cost_eur(),
            })
            .collect();

        Self {
            run_id: run.id.to_string(),
            created_utc: run.created.to_rfc3339(),
            status: run.status.as_str(),
            iterations: run.iterations,
            compliant: run.compliance.compliant,
            compliance_rate: run.compliance.compliance_rate,
            total_cost_eur: run.total_cost_eur,
            nodes,
            pipes,
            violations: run.compliance.violations.clone(),
        }
    }
}
