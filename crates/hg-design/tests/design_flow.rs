//! End-to-end design runs over a small two-building scene.

use std::time::{Duration, Instant};

use hg_config::DesignConfig;
use hg_core::units::{kw, m};
use hg_core::Id;
use hg_design::{
    run_batch, AutoResizeController, DesignReport, Scenario, TerminalStatus,
};
use hg_net::{Building, Point, ServiceConnection, StreetGraph};
use hg_sizing::SizingWarning;
use hg_standards::ViolationKind;

struct Scene {
    streets: StreetGraph,
    buildings: Vec<Building>,
    connections: Vec<ServiceConnection>,
    plant: hg_core::StreetNodeId,
}

/// Plant -- 200 m trunk -- hub, with a 60 kW and a 90 kW building.
fn two_building_scene(config: &DesignConfig) -> Scene {
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
    let connections = buildings
        .iter()
        .map(|b| {
            ServiceConnection::new(
                b.id,
                hub,
                Point::new(200.0, 0.0),
                m(11.2),
                m(config.max_service_distance_m),
            )
            .unwrap()
        })
        .collect();

    Scene {
        streets,
        buildings,
        connections,
        plant,
    }
}

#[test]
fn resize_loop_reaches_compliance() {
    let config = DesignConfig::default();
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    // First-pass sizing puts the 60 kW service on the smallest catalog
    // diameter, which breaks the service gradient limit; one resize step
    // fixes it.
    assert_eq!(run.status, TerminalStatus::ConvergedCompliant);
    assert!(run.succeeded());
    assert_eq!(run.iterations, 2);
    assert!(run.compliance.compliant);
    assert!(run.state.converged());
    assert!(run.total_cost_eur > 0.0);
    assert!(run.iterations <= config.max_resize_iterations);
}

#[test]
fn resized_pipes_step_one_catalog_entry() {
    let config = DesignConfig::default();
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    // The violating service pair ends exactly one entry above the smallest
    // diameter; nothing overshoots.
    let service_diams: Vec<f64> = run
        .network
        .edges()
        .iter()
        .filter(|e| e.role.is_service() && e.category == hg_config::PipeCategory::Service)
        .map(|e| e.diameter.unwrap().value)
        .collect();
    assert!(!service_diams.is_empty());
    for d in service_diams {
        assert_eq!(d, 0.032, "expected a single step up from 0.025");
    }

    // Every diameter is a catalog entry.
    for edge in run.network.edges() {
        let d = edge.diameter.unwrap().value;
        assert!(config.standard_diameters_m.iter().any(|&c| c == d));
    }
}

#[test]
fn looped_street_reduces_to_a_tree() {
    // Triangle loop in the street graph; the network itself must still be
    // radial, fed over the shortest path.
    let config = DesignConfig::default();
    let mut streets = StreetGraph::new();
    let plant = streets.add_node(Point::new(0.0, 0.0));
    let a = streets.add_node(Point::new(200.0, 0.0));
    let b = streets.add_node(Point::new(100.0, 120.0));
    streets.add_segment(plant, a, m(200.0));
    streets.add_segment(a, b, m(156.2));
    streets.add_segment(b, plant, m(156.2));

    let buildings = vec![Building {
        id: Id::from_index(0),
        position: Point::new(205.0, 8.0),
        peak_demand: kw(60.0),
        annual_demand_kwh: 120_000.0,
    }];
    let connections = vec![ServiceConnection::new(
        Id::from_index(0),
        a,
        Point::new(200.0, 0.0),
        m(9.4),
        m(config.max_service_distance_m),
    )
    .unwrap()];

    let run = AutoResizeController::new(&config)
        .run(&streets, &buildings, &connections, plant)
        .unwrap();

    assert_eq!(run.status, TerminalStatus::ConvergedCompliant);
    // One street pair plus one service pair: the unused loop branch through
    // the third node is pruned, not piped.
    assert_eq!(run.network.edges().len(), 4);
}

#[test]
fn plant_pressure_violation_is_not_resizable() {
    let mut config = DesignConfig::default();
    config.plant.pressure_pa = 1.5e5; // below the admissible minimum
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    assert_eq!(run.status, TerminalStatus::ConvergedNoncompliant);
    assert!(!run.compliance.compliant);
    assert!(run
        .compliance
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::PlantPressure && v.edge.is_none()));
}

#[test]
fn exhausted_catalog_reports_oversize_and_stalls() {
    let mut config = DesignConfig::default();
    config.standard_diameters_m = vec![0.025];
    config.cost_table.retain(|row| row.diameter_m == 0.025);
    config.validate().unwrap();

    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    assert!(run
        .warnings
        .iter()
        .any(|w| matches!(w.warning, SizingWarning::OversizedDemand { .. })));
    assert_eq!(run.status, TerminalStatus::ConvergedNoncompliant);
    assert_eq!(run.iterations, 1);
    assert!(!run.compliance.compliant);
}

#[test]
fn iteration_budget_returns_the_validated_state() {
    let config = DesignConfig {
        max_resize_iterations: 1,
        ..DesignConfig::default()
    };
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    assert_eq!(run.status, TerminalStatus::MaxIterationsReached);
    assert_eq!(run.iterations, 1);
    assert!(!run.succeeded());
    assert!(!run.compliance.compliant);

    // The budget cuts off before any further resize, so every outstanding
    // violation still matches the diameters the run hands back.
    let mut hard = 0;
    for violation in run.compliance.hard_violations() {
        let Some(id) = violation.edge else { continue };
        let edge = run.network.edge(id).unwrap();
        let measured = match violation.kind {
            ViolationKind::PressureGradient => edge.dp_per_m_pa,
            ViolationKind::VelocityHigh => edge.velocity_mps,
            _ => continue,
        };
        assert!(
            (measured - violation.measured).abs() < 1e-9,
            "edge {id} drifted from its recorded violation"
        );
        hard += 1;
    }
    assert!(hard > 0);

    // The overloaded service pair never got its step up.
    assert!(run
        .network
        .edges()
        .iter()
        .filter(|e| e.role.is_service())
        .any(|e| e.diameter.unwrap().value == 0.025));
}

#[test]
fn expired_deadline_stops_the_solve() {
    let config = DesignConfig::default();
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .with_deadline(Instant::now() - Duration::from_secs(1))
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    assert_eq!(run.status, TerminalStatus::SolverDiverged);
    assert_eq!(run.iterations, 1);
}

#[test]
fn report_serializes_to_json() {
    let config = DesignConfig::default();
    let scene = two_building_scene(&config);
    let run = AutoResizeController::new(&config)
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    let report = DesignReport::from_run(&run);
    assert_eq!(report.pipes.len(), run.network.edges().len());
    assert_eq!(report.nodes.len(), run.network.nodes().len());

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("converged_compliant"));
    assert!(json.contains("total_cost_eur"));
}

#[test]
fn batch_preserves_scenario_order() {
    let config = DesignConfig::default();
    let scenarios: Vec<Scenario> = ["north", "south", "east"]
        .iter()
        .map(|name| {
            let scene = two_building_scene(&config);
            Scenario {
                name: (*name).to_string(),
                streets: scene.streets,
                buildings: scene.buildings,
                connections: scene.connections,
                plant_node: scene.plant,
            }
        })
        .collect();

    let outcomes = run_batch(&config, &scenarios);
    assert_eq!(outcomes.len(), 3);
    for (outcome, name) in outcomes.iter().zip(["north", "south", "east"]) {
        assert_eq!(outcome.name, name);
        let run = outcome.result.as_ref().unwrap();
        assert_eq!(run.status, TerminalStatus::ConvergedCompliant);
    }
}

#[test]
fn runs_are_reproducible_apart_from_metadata() {
    let config = DesignConfig::default();
    let scene = two_building_scene(&config);
    let controller = AutoResizeController::new(&config);

    let a = controller
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();
    let b = controller
        .run(&scene.streets, &scene.buildings, &scene.connections, scene.plant)
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(a.status, b.status);
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.total_cost_eur, b.total_cost_eur);
    for (x, y) in a.network.edges().iter().zip(b.network.edges()) {
        assert_eq!(x.diameter.map(|d| d.value), y.diameter.map(|d| d.value));
    }
}
