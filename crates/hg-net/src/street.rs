//! Street topology and consumer inputs.
//!
//! These structures are built once from externally loaded geometry and
//! demand data and stay read-only for the whole sizing run.

use crate::error::{NetError, NetResult};
use hg_core::units::{Length, Power};
use hg_core::{BuildingId, SegmentId, StreetNodeId};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Planar coordinate in a projected (metric) reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x_m: f64,
    pub y_m: f64,
}

impl Point {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self { x_m, y_m }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x_m - other.x_m).powi(2) + (self.y_m - other.y_m).powi(2)).sqrt()
    }
}

/// A consumer building with its forecast heat demand.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: BuildingId,
    pub position: Point,
    /// Peak heat demand at the design hour.
    pub peak_demand: Power,
    /// Annual heat demand [kWh], carried for downstream economics.
    pub annual_demand_kwh: f64,
}

/// Street segment attributes stored on graph edges.
#[derive(Debug, Clone, Copy)]
pub struct StreetSegment {
    pub id: SegmentId,
    pub length: Length,
}

/// Undirected street graph: nodes are intersections/endpoints, edges are
/// street segments carrying a length.
#[derive(Debug, Clone, Default)]
pub struct StreetGraph {
    graph: UnGraph<Point, StreetSegment>,
    next_segment: u32,
}

impl StreetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an intersection/endpoint and return its stable id.
    pub fn add_node(&mut self, point: Point) -> StreetNodeId {
        let idx = self.graph.add_node(point);
        StreetNodeId::from_index(idx.index() as u32)
    }

    /// Add a street segment between two nodes; the segment id is assigned
    /// in insertion order.
    pub fn add_segment(&mut self, a: StreetNodeId, b: StreetNodeId, length: Length) -> SegmentId {
        let id = SegmentId::from_index(self.next_segment);
        self.next_segment += 1;
        self.graph.add_edge(
            NodeIndex::new(a.index() as usize),
            NodeIndex::new(b.index() as usize),
            StreetSegment { id, length },
        );
        id
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn point(&self, node: StreetNodeId) -> Option<&Point> {
        self.graph.node_weight(NodeIndex::new(node.index() as usize))
    }

    pub fn contains(&self, node: StreetNodeId) -> bool {
        (node.index() as usize) < self.graph.node_count()
    }

    /// Neighbors of a node with the connecting segment, sorted by neighbor
    /// index for deterministic traversal.
    pub fn neighbors(&self, node: StreetNodeId) -> Vec<(StreetNodeId, StreetSegment)> {
        let idx = NodeIndex::new(node.index() as usize);
        let mut out: Vec<(StreetNodeId, StreetSegment)> = self
            .graph
            .edges(idx)
            .map(|edge| {
                let other = if edge.source() == idx {
                    edge.target()
                } else {
                    edge.source()
                };
                (
                    StreetNodeId::from_index(other.index() as u32),
                    *edge.weight(),
                )
            })
            .collect();
        out.sort_by_key(|(n, seg)| (n.index(), seg.id.index()));
        out
    }
}

/// Projection of a building onto its nearest street edge.
///
/// Built from externally computed projection data; construction enforces
/// the maximum service-connection distance. A building farther away is
/// unconnectable, which is a hard error rather than a silent drop.
#[derive(Debug, Clone)]
pub struct ServiceConnection {
    pub building: BuildingId,
    /// Street node the service pipe attaches to.
    pub street_node: StreetNodeId,
    /// Projection point on the street edge.
    pub projection: Point,
    /// Building-to-street distance.
    pub distance: Length,
}

impl ServiceConnection {
    pub fn new(
        building: BuildingId,
        street_node: StreetNodeId,
        projection: Point,
        distance: Length,
        max_distance: Length,
    ) -> NetResult<Self> {
        if distance.value > max_distance.value {
            return Err(NetError::ServiceTooFar {
                building,
                distance_m: distance.value,
                max_m: max_distance.value,
            });
        }
        Ok(Self {
            building,
            street_node,
            projection,
            distance,
        })
    }
}
