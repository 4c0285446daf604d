//! Network assembly: street tree extraction and dual-pipe edge creation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use crate::aggregate::{aggregate_edge_flows, derive_building_flow, TreeEdge};
use crate::error::{NetError, NetResult};
use crate::network::{Network, NetworkEdge, NetworkNode, NodeKind, PipeMaterial, PipeRole};
use crate::street::{Building, ServiceConnection, StreetGraph};
use hg_config::{DesignConfig, DiversityApplication};
use hg_core::units::{celsius, kgps, Length};
use hg_core::{EdgeId, NodeId, SegmentId, StreetNodeId};
use hg_sizing::classify_flow;

/// Builds the rooted dual-pipe network from street topology, buildings and
/// their service connections.
///
/// The street graph is reduced to its shortest-path tree from the plant
/// node (deterministic tie-breaking by node index); branches that serve no
/// building are left out. Every surviving tree edge gets a supply and a
/// mirrored return pipe, every building a service pair.
pub struct NetworkGraphBuilder<'a> {
    config: &'a DesignConfig,
}

impl<'a> NetworkGraphBuilder<'a> {
    pub fn new(config: &'a DesignConfig) -> Self {
        Self { config }
    }

    pub fn build(
        &self,
        streets: &StreetGraph,
        buildings: &[Building],
        connections: &[ServiceConnection],
        plant_node: StreetNodeId,
    ) -> NetResult<Network> {
        if !streets.contains(plant_node) {
            return Err(NetError::UnknownNode { node: plant_node });
        }

        let connection_of: BTreeMap<_, _> = connections
            .iter()
            .map(|c| (c.building, c))
            .collect();

        // Per-building design flows. Diversity is folded in here when it
        // applies at the design hour; in all-edges mode it scales the
        // aggregated street flows below instead.
        let diversity_on_buildings = match self.config.diversity_application {
            DiversityApplication::DesignHourOnly => self.config.diversity_factor,
            DiversityApplication::AllEdges => 1.0,
        };
        let supply = celsius(self.config.supply_temperature_c);
        let ret = celsius(self.config.return_temperature_c);

        let mut ordered: Vec<&Building> = buildings.iter().collect();
        ordered.sort_by_key(|b| b.id.index());

        let mut building_flow: BTreeMap<hg_core::BuildingId, f64> = BTreeMap::new();
        let mut flows_at_node: BTreeMap<StreetNodeId, f64> = BTreeMap::new();
        for building in &ordered {
            let connection = connection_of
                .get(&building.id)
                .ok_or(NetError::MissingServiceConnection {
                    building: building.id,
                })?;
            if !streets.contains(connection.street_node) {
                return Err(NetError::UnknownNode {
                    node: connection.street_node,
                });
            }
            let flow = derive_building_flow(
                building.id,
                building.peak_demand,
                supply,
                ret,
                self.config.cp_j_per_kg_k,
                self.config.safety_factor,
                diversity_on_buildings,
            )?;
            building_flow.insert(building.id, flow.value);
            *flows_at_node.entry(connection.street_node).or_insert(0.0) += flow.value;
        }

        // Shortest-path tree from the plant and the subset of tree edges
        // actually on a building path.
        let pred = shortest_path_tree(streets, plant_node);
        let tree_edges = used_tree_edges(streets, plant_node, &pred, &connection_of, &ordered)?;

        let mut edge_flow = aggregate_edge_flows(&tree_edges, plant_node, &flows_at_node)?;
        if self.config.diversity_application == DiversityApplication::AllEdges {
            for flow in edge_flow.values_mut() {
                *flow *= self.config.diversity_factor;
            }
        }

        self.assemble(
            plant_node,
            &tree_edges,
            &edge_flow,
            &building_flow,
            &ordered,
            &connection_of,
        )
    }

    /// Create node table and edge list in deterministic order.
    fn assemble(
        &self,
        plant_node: StreetNodeId,
        tree_edges: &[TreeEdge],
        edge_flow: &BTreeMap<SegmentId, f64>,
        building_flow: &BTreeMap<hg_core::BuildingId, f64>,
        buildings: &[&Building],
        connection_of: &BTreeMap<hg_core::BuildingId, &ServiceConnection>,
    ) -> NetResult<Network> {
        let mut nodes: Vec<NetworkNode> = Vec::new();
        let push_node = |kind: NodeKind, nodes: &mut Vec<NetworkNode>| -> NodeId {
            let id = NodeId::from_index(nodes.len() as u32);
            nodes.push(NetworkNode { id, kind });
            id
        };

        let plant_supply = push_node(NodeKind::PlantSupply, &mut nodes);
        let plant_return = push_node(NodeKind::PlantReturn, &mut nodes);

        let mut supply_of: BTreeMap<StreetNodeId, NodeId> = BTreeMap::new();
        let mut return_of: BTreeMap<StreetNodeId, NodeId> = BTreeMap::new();
        supply_of.insert(plant_node, plant_supply);
        return_of.insert(plant_node, plant_return);

        // Tree edges arrive in BFS order, so parents are always mapped
        // before their children.
        for edge in tree_edges {
            let s = push_node(NodeKind::JunctionSupply(edge.child), &mut nodes);
            let r = push_node(NodeKind::JunctionReturn(edge.child), &mut nodes);
            supply_of.insert(edge.child, s);
            return_of.insert(edge.child, r);
        }

        let mut building_supply: BTreeMap<hg_core::BuildingId, NodeId> = BTreeMap::new();
        let mut building_return: BTreeMap<hg_core::BuildingId, NodeId> = BTreeMap::new();
        for building in buildings {
            let s = push_node(NodeKind::BuildingSupply(building.id), &mut nodes);
            let r = push_node(NodeKind::BuildingReturn(building.id), &mut nodes);
            building_supply.insert(building.id, s);
            building_return.insert(building.id, r);
        }

        let mut edges: Vec<NetworkEdge> = Vec::new();
        let push_edge = |role: PipeRole,
                         start: NodeId,
                         end: NodeId,
                         length: Length,
                         flow_kg_s: f64,
                         material: PipeMaterial,
                         insulated: bool,
                         edges: &mut Vec<NetworkEdge>|
         -> EdgeId {
            let id = EdgeId::from_index(edges.len() as u32);
            let flow = kgps(flow_kg_s);
            edges.push(NetworkEdge {
                id,
                role,
                start,
                end,
                length,
                category: classify_flow(flow, self.config),
                flow,
                material,
                insulated,
                diameter: None,
                velocity_mps: 0.0,
                dp_per_m_pa: 0.0,
                reynolds: 0.0,
                unit_cost_eur_per_m: 0.0,
            });
            id
        };

        let mut supply_order: Vec<EdgeId> = Vec::new();
        let mut street_return_ids: Vec<EdgeId> = Vec::new();
        let mut service_return_ids: Vec<EdgeId> = Vec::new();

        // Street supply pipes, plant outward.
        for edge in tree_edges {
            let flow = edge_flow[&edge.segment];
            let id = push_edge(
                PipeRole::Supply,
                supply_of[&edge.parent],
                supply_of[&edge.child],
                edge.length,
                flow,
                PipeMaterial::Steel,
                self.config.insulated_mains,
                &mut edges,
            );
            supply_order.push(id);
        }

        // Service pairs, by building id.
        for building in buildings {
            let connection = connection_of[&building.id];
            let junction_supply = supply_of[&connection.street_node];
            let junction_return = return_of[&connection.street_node];
            let flow = building_flow[&building.id];

            let id = push_edge(
                PipeRole::ServiceSupply,
                junction_supply,
                building_supply[&building.id],
                connection.distance,
                flow,
                PipeMaterial::Pex,
                true,
                &mut edges,
            );
            supply_order.push(id);

            let id = push_edge(
                PipeRole::ServiceReturn,
                building_return[&building.id],
                junction_return,
                connection.distance,
                flow,
                PipeMaterial::Pex,
                true,
                &mut edges,
            );
            service_return_ids.push(id);
        }

        // Street return pipes, mirrored direction (child toward parent).
        for edge in tree_edges {
            let flow = edge_flow[&edge.segment];
            let id = push_edge(
                PipeRole::Return,
                return_of[&edge.child],
                return_of[&edge.parent],
                edge.length,
                flow,
                PipeMaterial::Steel,
                self.config.insulated_mains,
                &mut edges,
            );
            street_return_ids.push(id);
        }

        // Return propagation wants leaf-first ordering.
        let mut return_order = service_return_ids;
        return_order.extend(street_return_ids.into_iter().rev());

        Ok(Network::new(
            nodes,
            edges,
            plant_supply,
            plant_return,
            supply_order,
            return_order,
        ))
    }
}

/// Predecessor entry of the shortest-path tree.
#[derive(Debug, Clone, Copy)]
struct Pred {
    parent: StreetNodeId,
    segment: SegmentId,
    length: Length,
}

/// Frontier entry of the shortest-path heap: min on distance, ties toward
/// the lower node index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    dist: f64,
    node: u32,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over the street graph with edge cost = length.
///
/// Deterministic: equal distances settle in node-index order and a
/// predecessor is only replaced on a strict distance improvement.
fn shortest_path_tree(streets: &StreetGraph, plant: StreetNodeId) -> Vec<Option<Pred>> {
    let n = streets.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred: Vec<Option<Pred>> = vec![None; n];
    let mut done = vec![false; n];
    let mut frontier = BinaryHeap::new();
    dist[plant.index() as usize] = 0.0;
    frontier.push(Frontier {
        dist: 0.0,
        node: plant.index(),
    });

    while let Some(Frontier { dist: d, node }) = frontier.pop() {
        let u = node as usize;
        if done[u] {
            continue; // stale entry, a shorter path already settled it
        }
        done[u] = true;

        let u_id = StreetNodeId::from_index(node);
        for (neighbor, segment) in streets.neighbors(u_id) {
            let v = neighbor.index() as usize;
            let candidate = d + segment.length.value;
            if candidate < dist[v] {
                dist[v] = candidate;
                pred[v] = Some(Pred {
                    parent: u_id,
                    segment: segment.id,
                    length: segment.length,
                });
                frontier.push(Frontier {
                    dist: candidate,
                    node: neighbor.index(),
                });
            }
        }
    }

    pred
}

/// Tree edges on at least one building path, in BFS order from the plant.
fn used_tree_edges(
    streets: &StreetGraph,
    plant: StreetNodeId,
    pred: &[Option<Pred>],
    connection_of: &BTreeMap<hg_core::BuildingId, &ServiceConnection>,
    buildings: &[&Building],
) -> NetResult<Vec<TreeEdge>> {
    let n = streets.node_count();
    let mut used = vec![false; n];

    for building in buildings {
        let connection = connection_of[&building.id];
        let mut node = connection.street_node;
        // Walk the predecessor chain to the plant, marking the path.
        loop {
            if node == plant {
                break;
            }
            let idx = node.index() as usize;
            if used[idx] {
                break;
            }
            let Some(p) = pred[idx] else {
                return Err(NetError::DisconnectedBuilding {
                    building: building.id,
                });
            };
            used[idx] = true;
            node = p.parent;
        }
    }

    // BFS over used nodes so parents precede children in the output. A
    // node is only marked used after its predecessor was found above, so
    // pred-less entries simply never made it onto a building path.
    let mut children: Vec<Vec<TreeEdge>> = vec![Vec::new(); n];
    for (i, entry) in pred.iter().enumerate() {
        if !used[i] {
            continue;
        }
        let Some(p) = *entry else { continue };
        children[p.parent.index() as usize].push(TreeEdge {
            segment: p.segment,
            parent: p.parent,
            child: StreetNodeId::from_index(i as u32),
            length: p.length,
        });
    }
    for list in &mut children {
        list.sort_unstable_by_key(|e| e.child.index());
    }

    let mut out = Vec::new();
    let mut queue = VecDeque::from([plant.index()]);
    while let Some(u) = queue.pop_front() {
        for edge in &children[u as usize] {
            out.push(*edge);
            queue.push_back(edge.child.index());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::street::Point;
    use hg_core::units::{kw, m};
    use hg_core::Id;

    fn two_building_scene() -> (StreetGraph, Vec<Building>, Vec<ServiceConnection>, StreetNodeId)
    {
        // plant(0) -- 200m -- hub(1) -- 80m -- a(2)
        //                          \-- 120m -- b(3)
        let mut streets = StreetGraph::new();
        let plant = streets.add_node(Point::new(0.0, 0.0));
        let hub = streets.add_node(Point::new(200.0, 0.0));
        let a = streets.add_node(Point::new(280.0, 0.0));
        let b = streets.add_node(Point::new(200.0, 120.0));
        streets.add_segment(plant, hub, m(200.0));
        streets.add_segment(hub, a, m(80.0));
        streets.add_segment(hub, b, m(120.0));

        let buildings = vec![
            Building {
                id: Id::from_index(0),
                position: Point::new(285.0, 10.0),
                peak_demand: kw(60.0),
                annual_demand_kwh: 120_000.0,
            },
            Building {
                id: Id::from_index(1),
                position: Point::new(205.0, 130.0),
                peak_demand: kw(90.0),
                annual_demand_kwh: 180_000.0,
            },
        ];
        let connections = vec![
            ServiceConnection::new(
                Id::from_index(0),
                a,
                Point::new(280.0, 0.0),
                m(11.2),
                m(30.0),
            )
            .unwrap(),
            ServiceConnection::new(
                Id::from_index(1),
                b,
                Point::new(200.0, 120.0),
                m(11.2),
                m(30.0),
            )
            .unwrap(),
        ];
        (streets, buildings, connections, plant)
    }

    #[test]
    fn build_two_building_network() {
        let cfg = DesignConfig::default();
        let (streets, buildings, connections, plant) = two_building_scene();
        let net = NetworkGraphBuilder::new(&cfg)
            .build(&streets, &buildings, &connections, plant)
            .unwrap();

        // 3 street edges * 2 directions + 2 buildings * 2 service pipes
        assert_eq!(net.edges().len(), 10);
        // plant pair + 3 junction pairs + 2 building pairs
        assert_eq!(net.nodes().len(), 12);

        // Shared trunk carries the sum of both buildings
        let trunk = &net.edges()[0];
        assert_eq!(trunk.role, PipeRole::Supply);
        let expected: f64 = net
            .edges()
            .iter()
            .filter(|e| e.role == PipeRole::ServiceSupply)
            .map(|e| e.flow.value)
            .sum();
        assert!((trunk.flow.value - expected).abs() < 1e-12);

        // Supply and return mirror each other's flows
        let supply_total: f64 = net
            .edges()
            .iter()
            .filter(|e| e.role == PipeRole::Supply)
            .map(|e| e.flow.value)
            .sum();
        let return_total: f64 = net
            .edges()
            .iter()
            .filter(|e| e.role == PipeRole::Return)
            .map(|e| e.flow.value)
            .sum();
        assert!((supply_total - return_total).abs() < 1e-12);
    }

    #[test]
    fn deterministic_output() {
        let cfg = DesignConfig::default();
        let (streets, buildings, connections, plant) = two_building_scene();
        let builder = NetworkGraphBuilder::new(&cfg);
        let n1 = builder
            .build(&streets, &buildings, &connections, plant)
            .unwrap();
        let n2 = builder
            .build(&streets, &buildings, &connections, plant)
            .unwrap();
        assert_eq!(n1.edges().len(), n2.edges().len());
        for (a, b) in n1.edges().iter().zip(n2.edges()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.role, b.role);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.flow.value, b.flow.value);
        }
    }

    #[test]
    fn diversity_application_modes() {
        let cfg_design_hour = DesignConfig::default();
        let cfg_all_edges = DesignConfig {
            diversity_application: DiversityApplication::AllEdges,
            ..DesignConfig::default()
        };
        let (streets, buildings, connections, plant) = two_building_scene();

        let net_dh = NetworkGraphBuilder::new(&cfg_design_hour)
            .build(&streets, &buildings, &connections, plant)
            .unwrap();
        let net_all = NetworkGraphBuilder::new(&cfg_all_edges)
            .build(&streets, &buildings, &connections, plant)
            .unwrap();

        // Street flows agree: a uniform factor commutes with summation.
        let trunk = |net: &Network| {
            net.edges()
                .iter()
                .find(|e| e.role == PipeRole::Supply)
                .unwrap()
                .flow
                .value
        };
        assert!((trunk(&net_dh) - trunk(&net_all)).abs() < 1e-12);

        // Service flows differ: design-hour mode scales them, all-edges
        // mode leaves each building at its full design flow.
        let service_sum = |net: &Network| -> f64 {
            net.edges()
                .iter()
                .filter(|e| e.role == PipeRole::ServiceSupply)
                .map(|e| e.flow.value)
                .sum()
        };
        let scaled = service_sum(&net_all) * cfg_design_hour.diversity_factor;
        assert!((service_sum(&net_dh) - scaled).abs() < 1e-12);
    }

    #[test]
    fn equal_cost_paths_take_the_lower_index_branch() {
        let cfg = DesignConfig::default();
        // Square street loop: both routes to the far corner are 200 m.
        let mut streets = StreetGraph::new();
        let plant = streets.add_node(Point::new(0.0, 0.0));
        let a = streets.add_node(Point::new(100.0, 0.0));
        let b = streets.add_node(Point::new(0.0, 100.0));
        let c = streets.add_node(Point::new(100.0, 100.0));
        streets.add_segment(plant, a, m(100.0));
        streets.add_segment(plant, b, m(100.0));
        streets.add_segment(a, c, m(100.0));
        streets.add_segment(b, c, m(100.0));

        let buildings = vec![Building {
            id: Id::from_index(0),
            position: Point::new(105.0, 105.0),
            peak_demand: kw(60.0),
            annual_demand_kwh: 120_000.0,
        }];
        let connections = vec![ServiceConnection::new(
            Id::from_index(0),
            c,
            Point::new(100.0, 100.0),
            m(7.1),
            m(30.0),
        )
        .unwrap()];

        let net = NetworkGraphBuilder::new(&cfg)
            .build(&streets, &buildings, &connections, plant)
            .unwrap();

        // Two street pairs plus one service pair; the other half of the
        // loop is pruned.
        assert_eq!(net.edges().len(), 6);
        let routed_via = |node: StreetNodeId| {
            net.nodes()
                .iter()
                .any(|n| matches!(n.kind, NodeKind::JunctionSupply(s) if s == node))
        };
        assert!(routed_via(a));
        assert!(!routed_via(b));
    }

    #[test]
    fn disconnected_building_is_a_hard_error() {
        let cfg = DesignConfig::default();
        let (mut streets, buildings, mut connections, plant) = two_building_scene();
        // Island node with no segment to the rest of the graph.
        let island = streets.add_node(Point::new(900.0, 900.0));
        connections[1] = ServiceConnection::new(
            Id::from_index(1),
            island,
            Point::new(900.0, 900.0),
            m(5.0),
            m(30.0),
        )
        .unwrap();

        let r = NetworkGraphBuilder::new(&cfg).build(&streets, &buildings, &connections, plant);
        assert!(matches!(r, Err(NetError::DisconnectedBuilding { .. })));
    }

    #[test]
    fn missing_connection_is_a_hard_error() {
        let cfg = DesignConfig::default();
        let (streets, buildings, mut connections, plant) = two_building_scene();
        connections.pop();
        let r = NetworkGraphBuilder::new(&cfg).build(&streets, &buildings, &connections, plant);
        assert!(matches!(r, Err(NetError::MissingServiceConnection { .. })));
    }

    #[test]
    fn unused_branches_are_pruned() {
        let cfg = DesignConfig::default();
        let (mut streets, buildings, connections, plant) = two_building_scene();
        // Dead-end street with no buildings on it.
        let dead = streets.add_node(Point::new(0.0, 500.0));
        streets.add_segment(plant, dead, m(500.0));

        let net = NetworkGraphBuilder::new(&cfg)
            .build(&streets, &buildings, &connections, plant)
            .unwrap();
        // Same as the plain scene: the dead end adds no pipes.
        assert_eq!(net.edges().len(), 10);
    }

    #[test]
    fn plant_must_be_a_street_node() {
        let cfg = DesignConfig::default();
        let (streets, buildings, connections, _) = two_building_scene();
        let bogus = Id::from_index(99);
        let r = NetworkGraphBuilder::new(&cfg).build(&streets, &buildings, &connections, bogus);
        assert!(matches!(r, Err(NetError::UnknownNode { .. })));
    }
}
