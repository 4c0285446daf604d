//! The dual-pipe network the solver and validator operate on.

use hg_config::PipeCategory;
use hg_core::units::{Length, MassRate};
use hg_core::{BuildingId, EdgeId, NodeId, StreetNodeId};

/// Which of the four pipe populations an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeRole {
    /// Street pipe carrying hot water away from the plant.
    Supply,
    /// Street pipe carrying cooled water back to the plant.
    Return,
    /// Building connection, supply side.
    ServiceSupply,
    /// Building connection, return side.
    ServiceReturn,
}

impl PipeRole {
    pub fn is_supply_side(self) -> bool {
        matches!(self, PipeRole::Supply | PipeRole::ServiceSupply)
    }

    pub fn is_service(self) -> bool {
        matches!(self, PipeRole::ServiceSupply | PipeRole::ServiceReturn)
    }
}

/// Pipe wall material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeMaterial {
    /// Pre-insulated welded steel, used for street pipes.
    Steel,
    /// Flexible PEX, used for service connections.
    Pex,
}

/// What a network node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    PlantSupply,
    PlantReturn,
    JunctionSupply(StreetNodeId),
    JunctionReturn(StreetNodeId),
    BuildingSupply(BuildingId),
    BuildingReturn(BuildingId),
}

#[derive(Debug, Clone)]
pub struct NetworkNode {
    pub id: NodeId,
    pub kind: NodeKind,
}

/// One directed pipe. `start → end` is the flow direction.
///
/// The diameter starts unassigned, is set by the sizing engine and may
/// only step up through the catalog across resize iterations; everything
/// derived from it (velocity, gradient, Reynolds, cost) is recomputed when
/// it changes.
#[derive(Debug, Clone)]
pub struct NetworkEdge {
    pub id: EdgeId,
    pub role: PipeRole,
    pub start: NodeId,
    pub end: NodeId,
    pub length: Length,
    pub category: PipeCategory,
    pub flow: MassRate,
    pub material: PipeMaterial,
    pub insulated: bool,
    pub diameter: Option<Length>,
    pub velocity_mps: f64,
    pub dp_per_m_pa: f64,
    pub reynolds: f64,
    pub unit_cost_eur_per_m: f64,
}

impl NetworkEdge {
    /// Total pipe cost [EUR].
    pub fn cost_eur(&self) -> f64 {
        self.unit_cost_eur_per_m * self.length.value
    }
}

/// Assembled network: node table, edge list and the propagation orders the
/// direct solver relies on.
///
/// Edge and node vectors are indexed by their ids; ordering is fully
/// deterministic for identical input.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<NetworkNode>,
    edges: Vec<NetworkEdge>,
    plant_supply: NodeId,
    plant_return: NodeId,
    /// Supply-side edges, topologically ordered from the plant outward
    /// (street pipes first in BFS order, then each service pipe after its
    /// junction is reachable).
    supply_order: Vec<EdgeId>,
    /// Return-side edges ordered so every edge's start pressure is known
    /// before it is processed (service returns first, then street returns
    /// leaf-to-plant).
    return_order: Vec<EdgeId>,
}

impl Network {
    pub(crate) fn new(
        nodes: Vec<NetworkNode>,
        edges: Vec<NetworkEdge>,
        plant_supply: NodeId,
        plant_return: NodeId,
        supply_order: Vec<EdgeId>,
        return_order: Vec<EdgeId>,
    ) -> Self {
        Self {
            nodes,
            edges,
            plant_supply,
            plant_return,
            supply_order,
            return_order,
        }
    }

    pub fn nodes(&self) -> &[NetworkNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[NetworkEdge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&NetworkEdge> {
        self.edges.get(id.index() as usize)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut NetworkEdge> {
        self.edges.get_mut(id.index() as usize)
    }

    pub fn node(&self, id: NodeId) -> Option<&NetworkNode> {
        self.nodes.get(id.index() as usize)
    }

    pub fn plant_supply(&self) -> NodeId {
        self.plant_supply
    }

    pub fn plant_return(&self) -> NodeId {
        self.plant_return
    }

    pub fn supply_order(&self) -> &[EdgeId] {
        &self.supply_order
    }

    pub fn return_order(&self) -> &[EdgeId] {
        &self.return_order
    }

    /// Sum of all edge costs [EUR]; zero until edges are sized.
    pub fn total_cost_eur(&self) -> f64 {
        self.edges.iter().map(|e| e.cost_eur()).sum()
    }

    /// Building supply/return node pairs, for substation handling.
    pub fn building_nodes(&self) -> Vec<(BuildingId, NodeId, NodeId)> {
        let mut supply: Vec<(BuildingId, NodeId)> = Vec::new();
        let mut ret: Vec<(BuildingId, NodeId)> = Vec::new();
        for node in &self.nodes {
            match node.kind {
                NodeKind::BuildingSupply(b) => supply.push((b, node.id)),
                NodeKind::BuildingReturn(b) => ret.push((b, node.id)),
                _ => {}
            }
        }
        supply.sort_by_key(|(b, _)| b.index());
        ret.sort_by_key(|(b, _)| b.index());
        supply
            .into_iter()
            .zip(ret)
            .map(|((b, s), (_, r))| (b, s, r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_core::units::{kgps, m};
    use hg_core::Id;

    #[test]
    fn edge_cost_scales_with_length() {
        let edge = NetworkEdge {
            id: Id::from_index(0),
            role: PipeRole::Supply,
            start: Id::from_index(0),
            end: Id::from_index(1),
            length: m(250.0),
            category: hg_config::PipeCategory::Main,
            flow: kgps(3.0),
            material: PipeMaterial::Steel,
            insulated: true,
            diameter: None,
            velocity_mps: 0.0,
            dp_per_m_pa: 0.0,
            reynolds: 0.0,
            unit_cost_eur_per_m: 300.0,
        };
        assert_eq!(edge.cost_eur(), 75_000.0);
    }

    #[test]
    fn role_helpers() {
        assert!(PipeRole::Supply.is_supply_side());
        assert!(PipeRole::ServiceSupply.is_supply_side());
        assert!(!PipeRole::Return.is_supply_side());
        assert!(PipeRole::ServiceReturn.is_service());
        assert!(!PipeRole::Supply.is_service());
    }
}
