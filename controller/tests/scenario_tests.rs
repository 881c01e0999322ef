use handover_common::{CellId, Imsi, Rnti, Variant};
use handover_controller::{Config, Event, Scenario, TerminalRegistry};

fn seeded_registry(variant: Variant) -> TerminalRegistry {
    TerminalRegistry::new(&Config {
        variant,
        predictor_seed: Some(3),
        ..Config::default()
    })
}

#[test]
fn test_parse_event_kinds() {
    let scenario = Scenario::parse(
        r#"
[[event]]
kind = "connect"
time = 0.0
rnti = 1
imsi = 42
cell = 1

[[event]]
kind = "neighbour"
time = 0.1
rnti = 1
cell = 2
rsrp = 50.0
rsrq = 30.0

[[event]]
kind = "release"
time = 0.2
rnti = 1
"#,
    )
    .unwrap();

    assert_eq!(scenario.events.len(), 3);
    assert_eq!(
        scenario.events[0],
        Event::Connect {
            time: 0.0,
            rnti: Rnti(1),
            imsi: Imsi(42),
            cell: CellId(1)
        }
    );
    assert_eq!(scenario.events[2].time(), 0.2);
}

#[test]
fn test_unknown_kind_rejected() {
    let result = Scenario::parse(
        r#"
[[event]]
kind = "teleport"
time = 0.0
rnti = 1
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_events_replayed_in_time_order() {
    let scenario = Scenario::parse(
        r#"
[[event]]
kind = "release"
time = 0.5
rnti = 1

[[event]]
kind = "connect"
time = 0.0
rnti = 1
imsi = 1
cell = 1
"#,
    )
    .unwrap();

    let order: Vec<f64> = scenario.ordered_events().iter().map(|e| e.time()).collect();
    assert_eq!(order, vec![0.0, 0.5]);

    let registry = seeded_registry(Variant::Type2);
    scenario.replay(&registry);
    assert_eq!(registry.terminal_count(), 0);
    assert_eq!(registry.metrics().get_stats().terminals_released, 1);
}

#[test]
fn test_bundled_scenario_hands_over() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/rising_neighbour.toml");
    let scenario = Scenario::load(path).unwrap();

    for variant in [Variant::Type1, Variant::Type2] {
        let registry = seeded_registry(variant);
        let issued = scenario.replay(&registry);

        assert!(!issued.is_empty(), "{} issued nothing", variant);
        assert!(issued.iter().all(|c| c.command.target == CellId(2)));
        assert!(issued.iter().all(|c| c.time <= 0.24));

        let stats = registry.metrics().get_stats();
        assert_eq!(stats.neighbour_results_skipped, 1);
        assert_eq!(stats.serving_assignments, 2);
        assert_eq!(registry.terminal_count(), 0);
    }
}
