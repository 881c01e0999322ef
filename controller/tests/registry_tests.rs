use handover_common::{CellId, Imsi, Rnti, Variant};
use handover_controller::{Config, HandoverCommand, MeasurementReport, NeighbourResult, TerminalRegistry};

const STEP: f64 = 0.12;

fn registry(variant: Variant) -> TerminalRegistry {
    let config = Config {
        variant,
        predictor_seed: Some(1),
        ..Config::default()
    };
    TerminalRegistry::new(&config)
}

fn neighbour_report(cells: &[(u16, f64)]) -> MeasurementReport {
    MeasurementReport {
        meas_id: 2,
        serving_rsrp: 40.0,
        serving_rsrq: 20.0,
        neighbours: Some(
            cells
                .iter()
                .map(|&(cell, rsrq)| NeighbourResult {
                    cell: CellId(cell),
                    rsrp: Some(50.0),
                    rsrq: Some(rsrq),
                })
                .collect(),
        ),
    }
}

fn serving_report(rsrq: f64) -> MeasurementReport {
    MeasurementReport {
        meas_id: 1,
        serving_rsrp: 40.0,
        serving_rsrq: rsrq,
        neighbours: None,
    }
}

#[test]
fn test_reports_drive_handover_command() {
    for variant in [Variant::Type1, Variant::Type2] {
        let registry = registry(variant);
        let rnti = Rnti(7);
        registry.connection_established(0.0, Imsi(1001), CellId(1), rnti);

        let mut last = None;
        for i in 0..6 {
            let t = i as f64 * STEP;
            assert!(registry
                .handle_report(t, rnti, &neighbour_report(&[(2, 26.0 + i as f64)]))
                .is_none());
            last = registry.handle_report(t, rnti, &serving_report(20.0));
        }

        assert_eq!(
            last,
            Some(HandoverCommand {
                rnti,
                target: CellId(2)
            }),
            "{}",
            variant
        );
    }
}

#[test]
fn test_unknown_meas_id_ignored() {
    let registry = registry(Variant::Type2);
    let report = MeasurementReport {
        meas_id: 9,
        ..serving_report(5.0)
    };

    assert!(registry.handle_report(0.0, Rnti(1), &report).is_none());
    let stats = registry.metrics().get_stats();
    assert_eq!(stats.reports_received, 1);
    assert_eq!(stats.reports_ignored, 1);
    assert_eq!(stats.evaluations, 0);
}

#[test]
fn test_neighbour_report_without_list_ignored() {
    let registry = registry(Variant::Type2);
    let report = MeasurementReport {
        meas_id: 2,
        ..serving_report(5.0)
    };

    assert!(registry.handle_report(0.0, Rnti(1), &report).is_none());
    assert!(registry.candidate_cells(Rnti(1)).is_empty());
    assert_eq!(registry.metrics().get_stats().reports_ignored, 1);
}

#[test]
fn test_empty_neighbour_list_ignored() {
    let registry = registry(Variant::Type1);
    let report = neighbour_report(&[]);
    assert_eq!(report.neighbours, Some(Vec::new()));

    assert!(registry.handle_report(0.0, Rnti(1), &report).is_none());
    assert!(registry.candidate_cells(Rnti(1)).is_empty());
    let stats = registry.metrics().get_stats();
    assert_eq!(stats.reports_received, 1);
    assert_eq!(stats.reports_ignored, 1);
}

#[test]
fn test_incomplete_neighbour_results_skipped() {
    let registry = registry(Variant::Type1);
    let mut report = neighbour_report(&[(2, 25.0), (3, 27.0)]);
    if let Some(neighbours) = report.neighbours.as_mut() {
        neighbours[0].rsrq = None;
    }

    registry.handle_report(0.0, Rnti(1), &report);

    assert_eq!(registry.candidate_cells(Rnti(1)), vec![CellId(3)]);
    assert_eq!(registry.metrics().get_stats().neighbour_results_skipped, 1);
}

#[test]
fn test_terminals_are_isolated() {
    let registry = registry(Variant::Type2);
    registry.connection_established(0.0, Imsi(1), CellId(1), Rnti(1));
    registry.connection_established(0.0, Imsi(2), CellId(5), Rnti(2));
    registry.record_candidate_measurement(0.0, Rnti(1), CellId(2), 50.0, 30.0);

    assert_eq!(registry.serving_cell(Rnti(1)), Some(CellId(1)));
    assert_eq!(registry.serving_cell(Rnti(2)), Some(CellId(5)));
    assert_eq!(registry.candidate_cells(Rnti(1)), vec![CellId(2)]);
    assert!(registry.candidate_cells(Rnti(2)).is_empty());

    // Terminal 2 never heard of cell 2, so it cannot hand over there
    assert!(registry.evaluate_handover(0.0, Rnti(2), 10.0, 3.0).is_none());
}

#[test]
fn test_handover_complete_moves_serving_cell() {
    let registry = registry(Variant::Type2);
    let rnti = Rnti(4);
    registry.connection_established(0.0, Imsi(10), CellId(1), rnti);
    registry.record_candidate_measurement(0.1, rnti, CellId(2), 50.0, 30.0);
    registry.record_candidate_measurement(0.1, rnti, CellId(3), 50.0, 28.0);

    registry.handover_completed(0.2, Imsi(10), CellId(2), rnti);

    assert_eq!(registry.serving_cell(rnti), Some(CellId(2)));
    assert_eq!(registry.candidate_cells(rnti), vec![CellId(3)]);
    assert_eq!(registry.imsi(rnti), Some(Imsi(10)));
    assert_eq!(registry.decision_stats(rnti).map(|s| s.serving_changes), Some(2));
}

#[test]
fn test_release_drops_state() {
    let registry = registry(Variant::Type1);
    registry.connection_established(0.0, Imsi(1), CellId(1), Rnti(3));
    assert!(registry.contains(Rnti(3)));

    assert!(registry.release(Rnti(3)));
    assert!(!registry.contains(Rnti(3)));
    assert_eq!(registry.terminal_count(), 0);
    assert!(registry.serving_cell(Rnti(3)).is_none());
    assert_eq!(registry.metrics().get_stats().terminals_released, 1);
}

#[test]
fn test_concurrent_terminals() {
    let registry = registry(Variant::Type2);

    std::thread::scope(|scope| {
        for id in 1..=4u16 {
            let registry = &registry;
            scope.spawn(move || {
                let rnti = Rnti(id);
                registry.connection_established(0.0, Imsi(id as u64), CellId(1), rnti);
                for i in 0..6 {
                    let t = i as f64 * STEP;
                    registry.record_candidate_measurement(t, rnti, CellId(2), 50.0, 26.0 + i as f64);
                    registry.evaluate_handover(t, rnti, 40.0, 20.0);
                }
            });
        }
    });

    assert_eq!(registry.terminal_count(), 4);
    let stats = registry.metrics().get_stats();
    assert_eq!(stats.evaluations, 24);
    assert_eq!(stats.serving_assignments, 4);
    for id in 1..=4u16 {
        assert_eq!(registry.decision_stats(Rnti(id)).map(|s| s.evaluations), Some(6));
    }
}
