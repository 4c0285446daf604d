//! Demand-to-flow derivation and leaf-to-root flow aggregation.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{NetError, NetResult};
use hg_core::units::{kgps, Length, MassRate, Power, Temperature};
use hg_core::{SegmentId, StreetNodeId};
use hg_hydraulics::conversions::heat_to_mass_flow;
use hg_hydraulics::HydraulicsError;

/// One edge of the rooted street tree, directed parent → child (away from
/// the plant).
#[derive(Debug, Clone, Copy)]
pub struct TreeEdge {
    pub segment: SegmentId,
    pub parent: StreetNodeId,
    pub child: StreetNodeId,
    pub length: Length,
}

/// Design-hour mass flow for one building.
///
/// ```text
/// mdot = Q * safety_factor / (cp * (T_supply - T_return)) * diversity_factor
/// ```
///
/// Fails with an invalid-demand error if the peak load is non-positive or
/// the temperature spread is inverted.
pub fn derive_building_flow(
    building: hg_core::BuildingId,
    peak_heat: Power,
    supply: Temperature,
    ret: Temperature,
    cp_j_per_kg_k: f64,
    safety_factor: f64,
    diversity_factor: f64,
) -> NetResult<MassRate> {
    let scaled = Power::new::<uom::si::power::watt>(peak_heat.value * safety_factor);
    let base = heat_to_mass_flow(scaled, supply, ret, cp_j_per_kg_k).map_err(|e| match e {
        HydraulicsError::InvalidFlow { .. } => NetError::InvalidDemand {
            building,
            value: peak_heat.value / 1000.0,
        },
        HydraulicsError::InvalidSpread { supply_c, return_c } => NetError::InvalidSpread {
            supply_c,
            return_c,
        },
        other => NetError::Hydraulics(other),
    })?;
    Ok(kgps(base.value * diversity_factor))
}

/// Aggregate building flows onto tree edges, leaves toward the root.
///
/// Each edge ends up carrying the sum of all building flows attached at or
/// below its child node. Single post-order traversal, O(V+E).
///
/// The radial assumption is load-bearing: the input is validated to be a
/// tree rooted at `root` and anything else (duplicate parents, cycles,
/// edges unreachable from the root) fails with `CyclicTopology`.
pub fn aggregate_edge_flows(
    edges: &[TreeEdge],
    root: StreetNodeId,
    building_flows: &BTreeMap<StreetNodeId, f64>,
) -> NetResult<BTreeMap<SegmentId, f64>> {
    // Tree shape validation: every node is the child of at most one edge,
    // and the root of none.
    let mut children: BTreeMap<StreetNodeId, Vec<usize>> = BTreeMap::new();
    let mut seen_children: BTreeSet<StreetNodeId> = BTreeSet::new();
    for (i, edge) in edges.iter().enumerate() {
        if edge.child == root {
            return Err(NetError::CyclicTopology {
                what: format!("root node {} appears as a child", root),
            });
        }
        if !seen_children.insert(edge.child) {
            return Err(NetError::CyclicTopology {
                what: format!("node {} has more than one parent", edge.child),
            });
        }
        children.entry(edge.parent).or_default().push(i);
    }

    // Post-order accumulation via an explicit stack (enter/exit phases).
    let mut subtree_flow: BTreeMap<StreetNodeId, f64> = BTreeMap::new();
    let mut edge_flow: BTreeMap<SegmentId, f64> = BTreeMap::new();
    let mut visited_edges = 0_usize;

    enum Phase {
        Enter,
        Exit,
    }
    let mut stack = vec![(root, Phase::Enter)];
    while let Some((node, phase)) = stack.pop() {
        match phase {
            Phase::Enter => {
                stack.push((node, Phase::Exit));
                if let Some(child_edges) = children.get(&node) {
                    for &i in child_edges {
                        visited_edges += 1;
                        stack.push((edges[i].child, Phase::Enter));
                    }
                }
            }
            Phase::Exit => {
                let mut flow = building_flows.get(&node).copied().unwrap_or(0.0);
                if let Some(child_edges) = children.get(&node) {
                    for &i in child_edges {
                        let child_total = subtree_flow.get(&edges[i].child).copied().unwrap_or(0.0);
                        edge_flow.insert(edges[i].segment, child_total);
                        flow += child_total;
                    }
                }
                subtree_flow.insert(node, flow);
            }
        }
    }

    // Edges never reached from the root mean a detached cycle or a second
    // component, both of which break the radial assumption.
    if visited_edges != edges.len() {
        return Err(NetError::CyclicTopology {
            what: format!(
                "{} of {} edges are unreachable from the root",
                edges.len() - visited_edges,
                edges.len()
            ),
        });
    }

    Ok(edge_flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_core::units::{celsius, kw, m};
    use hg_core::Id;
    use proptest::prelude::*;

    fn node(i: u32) -> StreetNodeId {
        Id::from_index(i)
    }

    fn edge(seg: u32, parent: u32, child: u32) -> TreeEdge {
        TreeEdge {
            segment: Id::from_index(seg),
            parent: node(parent),
            child: node(child),
            length: m(100.0),
        }
    }

    #[test]
    fn building_flow_reference() {
        // 100 kW, 30 K spread, safety 1.0, diversity 1.0
        let mdot = derive_building_flow(
            Id::from_index(0),
            kw(100.0),
            celsius(80.0),
            celsius(50.0),
            4186.0,
            1.0,
            1.0,
        )
        .unwrap();
        assert!((mdot.value - 0.7963).abs() < 1e-3);
    }

    #[test]
    fn building_flow_rejects_bad_demand() {
        let r = derive_building_flow(
            Id::from_index(0),
            kw(0.0),
            celsius(80.0),
            celsius(50.0),
            4186.0,
            1.0,
            1.0,
        );
        assert!(matches!(r, Err(NetError::InvalidDemand { .. })));

        let r = derive_building_flow(
            Id::from_index(0),
            kw(50.0),
            celsius(50.0),
            celsius(80.0),
            4186.0,
            1.0,
            1.0,
        );
        assert!(matches!(r, Err(NetError::InvalidSpread { .. })));
    }

    #[test]
    fn shared_edge_sums_exactly() {
        // root(0) -- seg0 -- hub(1) -- seg1 -- A(2)
        //                          \-- seg2 -- B(3)
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2), edge(2, 1, 3)];
        let mut flows = BTreeMap::new();
        flows.insert(node(2), 1.0);
        flows.insert(node(3), 2.0);

        let result = aggregate_edge_flows(&edges, node(0), &flows).unwrap();
        assert_eq!(result[&Id::from_index(0)], 3.0);
        assert_eq!(result[&Id::from_index(1)], 1.0);
        assert_eq!(result[&Id::from_index(2)], 2.0);
    }

    #[test]
    fn cyclic_input_rejected() {
        // A -> B, B -> C, C -> A
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2), edge(2, 2, 0)];
        let r = aggregate_edge_flows(&edges, node(0), &BTreeMap::new());
        assert!(matches!(r, Err(NetError::CyclicTopology { .. })));
    }

    #[test]
    fn detached_cycle_rejected() {
        // Valid edge from root plus a 2-cycle floating off to the side.
        let edges = vec![edge(0, 0, 1), edge(1, 5, 6), edge(2, 6, 5)];
        let r = aggregate_edge_flows(&edges, node(0), &BTreeMap::new());
        assert!(matches!(r, Err(NetError::CyclicTopology { .. })));
    }

    #[test]
    fn duplicate_parent_rejected() {
        let edges = vec![edge(0, 0, 2), edge(1, 1, 2)];
        let r = aggregate_edge_flows(&edges, node(0), &BTreeMap::new());
        assert!(matches!(r, Err(NetError::CyclicTopology { .. })));
    }

    #[test]
    fn deep_chain_accumulates() {
        // root -> 1 -> 2 -> 3, building at 3
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2), edge(2, 2, 3)];
        let mut flows = BTreeMap::new();
        flows.insert(node(3), 0.75);

        let result = aggregate_edge_flows(&edges, node(0), &flows).unwrap();
        for seg in 0..3 {
            assert_eq!(result[&Id::from_index(seg)], 0.75);
        }
    }

    proptest! {
        #[test]
        fn flow_monotone_in_peak_and_safety(
            q in 1.0_f64..500.0,
            safety in 1.0_f64..1.5,
        ) {
            let f = |q_kw: f64, s: f64| {
                derive_building_flow(
                    Id::from_index(0),
                    kw(q_kw),
                    celsius(80.0),
                    celsius(50.0),
                    4186.0,
                    s,
                    1.0,
                )
                .unwrap()
                .value
            };
            prop_assert!(f(q * 1.2, safety) > f(q, safety));
            prop_assert!(f(q, safety * 1.1) > f(q, safety));
        }
    }
}
