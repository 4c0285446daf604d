//! Scenario file loading.
//!
//! A scenario YAML describes the street layout and the buildings; service
//! connections are derived by attaching each building to its nearest
//! street node.

use std::path::Path;

use hg_config::DesignConfig;
use hg_core::units::{kw, m};
use hg_core::{Id, StreetNodeId};
use hg_design::Scenario;
use hg_net::{Building, Point, ServiceConnection, StreetGraph};
use serde::Deserialize;

use crate::CliError;

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub name: String,
    /// Index into `nodes` where the plant feeds the street network.
    pub plant_node: u32,
    pub nodes: Vec<NodeSpec>,
    pub segments: Vec<SegmentSpec>,
    pub buildings: Vec<BuildingSpec>,
}

#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    pub x_m: f64,
    pub y_m: f64,
}

#[derive(Debug, Deserialize)]
pub struct SegmentSpec {
    pub a: u32,
    pub b: u32,
    /// Optional override; defaults to the straight-line node distance.
    pub length_m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BuildingSpec {
    pub id: u32,
    pub x_m: f64,
    pub y_m: f64,
    pub peak_demand_kw: f64,
    pub annual_demand_kwh: f64,
    /// Street node to attach to; nearest node when omitted.
    pub connect_node: Option<u32>,
}

pub fn load_scenario(path: &Path, config: &DesignConfig) -> Result<Scenario, CliError> {
    let text = std::fs::read_to_string(path)?;
    let file: ScenarioFile = serde_yaml::from_str(&text)?;
    build_scenario(&file, config)
}

pub fn build_scenario(file: &ScenarioFile, config: &DesignConfig) -> Result<Scenario, CliError> {
    let mut streets = StreetGraph::new();
    let mut node_ids: Vec<StreetNodeId> = Vec::with_capacity(file.nodes.len());
    for node in &file.nodes {
        node_ids.push(streets.add_node(Point::new(node.x_m, node.y_m)));
    }

    for segment in &file.segments {
        let a = *node_ids
            .get(segment.a as usize)
            .ok_or_else(|| CliError::Scenario {
                what: format!("segment references unknown node {}", segment.a),
            })?;
        let b = *node_ids
            .get(segment.b as usize)
            .ok_or_else(|| CliError::Scenario {
                what: format!("segment references unknown node {}", segment.b),
            })?;
        let length = match segment.length_m {
            Some(len) => len,
            None => {
                let pa = streets.point(a).copied().ok_or_else(|| CliError::Scenario {
                    what: format!("no point for node {}", segment.a),
                })?;
                let pb = streets.point(b).copied().ok_or_else(|| CliError::Scenario {
                    what: format!("no point for node {}", segment.b),
                })?;
                pa.distance_to(&pb)
            }
        };
        streets.add_segment(a, b, m(length));
    }

    let plant_node = *node_ids
        .get(file.plant_node as usize)
        .ok_or_else(|| CliError::Scenario {
            what: format!("plant node {} does not exist", file.plant_node),
        })?;

    let mut buildings = Vec::with_capacity(file.buildings.len());
    let mut connections = Vec::with_capacity(file.buildings.len());
    for spec in &file.buildings {
        let position = Point::new(spec.x_m, spec.y_m);
        let building = Building {
            id: Id::from_index(spec.id),
            position,
            peak_demand: kw(spec.peak_demand_kw),
            annual_demand_kwh: spec.annual_demand_kwh,
        };

        let street_node = match spec.connect_node {
            Some(index) => *node_ids
                .get(index as usize)
                .ok_or_else(|| CliError::Scenario {
                    what: format!("building {} connects to unknown node {index}", spec.id),
                })?,
            None => nearest_node(&streets, &node_ids, &position)?,
        };
        let attach = *streets
            .point(street_node)
            .ok_or_else(|| CliError::Scenario {
                what: format!("no point for street node {street_node}"),
            })?;
        let connection = ServiceConnection::new(
            building.id,
            street_node,
            attach,
            m(position.distance_to(&attach)),
            m(config.max_service_distance_m),
        )?;

        buildings.push(building);
        connections.push(connection);
    }

    Ok(Scenario {
        name: file.name.clone(),
        streets,
        buildings,
        connections,
        plant_node,
    })
}

fn nearest_node(
    streets: &StreetGraph,
    node_ids: &[StreetNodeId],
    position: &Point,
) -> Result<StreetNodeId, CliError> {
    let mut best: Option<(StreetNodeId, f64)> = None;
    for &id in node_ids {
        let point = streets.point(id).ok_or_else(|| CliError::Scenario {
            what: format!("no point for street node {id}"),
        })?;
        let d = position.distance_to(point);
        let better = match best {
            Some((_, best_d)) => d < best_d,
            None => true,
        };
        if better {
            best = Some((id, d));
        }
    }
    best.map(|(id, _)| id).ok_or_else(|| CliError::Scenario {
        what: "scenario has no street nodes".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"
name: demo
plant_node: 0
nodes:
  - { x_m: 0.0, y_m: 0.0 }
  - { x_m: 200.0, y_m: 0.0 }
segments:
  - { a: 0, b: 1 }
buildings:
  - id: 0
    x_m: 210.0
    y_m: 5.0
    peak_demand_kw: 60.0
    annual_demand_kwh: 120000.0
"#;

    #[test]
    fn parses_and_attaches_nearest_node() {
        let config = DesignConfig::default();
        let file: ScenarioFile = serde_yaml::from_str(DEMO).unwrap();
        let scenario = build_scenario(&file, &config).unwrap();

        assert_eq!(scenario.name, "demo");
        assert_eq!(scenario.streets.node_count(), 2);
        assert_eq!(scenario.buildings.len(), 1);
        // Nearest node to (210, 5) is the hub at (200, 0)
        assert_eq!(scenario.connections[0].street_node, Id::from_index(1));
    }

    #[test]
    fn segment_length_defaults_to_node_distance() {
        let config = DesignConfig::default();
        let file: ScenarioFile = serde_yaml::from_str(DEMO).unwrap();
        let scenario = build_scenario(&file, &config).unwrap();
        assert_eq!(scenario.streets.segment_count(), 1);
    }

    #[test]
    fn unknown_segment_node_rejected() {
        let config = DesignConfig::default();
        let mut file: ScenarioFile = serde_yaml::from_str(DEMO).unwrap();
        file.segments[0].b = 99;
        assert!(build_scenario(&file, &config).is_err());
    }
}
