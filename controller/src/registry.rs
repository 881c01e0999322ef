//! Per-terminal orchestrators behind one shared evaluator
//!
//! Every radio session (RNTI) gets its own [`HandoverOrchestrator`], created
//! on first contact and dropped on release. The fuzzy rule bases are built
//! once and shared by all of them.

use handover_common::{
    evaluator_for, CellId, DecisionStats, DecisionTrace, HandoverOrchestrator, Imsi,
    LinkQualityEvaluator, OrchestratorConfig, Rnti,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::metrics::ControllerMetrics;
use crate::report::{HandoverCommand, MeasurementReport, ReportConfig, ReportKind};

pub type SharedEvaluator = Arc<dyn LinkQualityEvaluator + Send + Sync>;

struct Terminal {
    imsi: Option<Imsi>,
    orchestrator: HandoverOrchestrator<SharedEvaluator>,
}

pub struct TerminalRegistry {
    evaluator: SharedEvaluator,
    config: OrchestratorConfig,
    reports: ReportConfig,
    terminals: RwLock<HashMap<Rnti, Arc<Mutex<Terminal>>>>,
    metrics: ControllerMetrics,
}

impl TerminalRegistry {
    pub fn new(config: &Config) -> Self {
        Self::with_evaluator(
            evaluator_for(config.variant),
            config.orchestrator_config(),
            config.report_config(),
        )
    }

    pub fn with_evaluator(
        evaluator: SharedEvaluator,
        config: OrchestratorConfig,
        reports: ReportConfig,
    ) -> Self {
        Self {
            evaluator,
            config,
            reports,
            terminals: RwLock::new(HashMap::new()),
            metrics: ControllerMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &ControllerMetrics {
        &self.metrics
    }

    pub fn report_config(&self) -> &ReportConfig {
        &self.reports
    }

    pub fn orchestrator_config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.read().len()
    }

    pub fn contains(&self, rnti: Rnti) -> bool {
        self.terminals.read().contains_key(&rnti)
    }

    fn terminal(&self, rnti: Rnti) -> Arc<Mutex<Terminal>> {
        if let Some(terminal) = self.terminals.read().get(&rnti) {
            return terminal.clone();
        }

        let mut terminals = self.terminals.write();
        terminals
            .entry(rnti)
            .or_insert_with(|| {
                debug!(rnti = %rnti, "tracking new terminal");
                // Distinct seeds per session; each orchestrator uses seed and seed + 1
                let config = OrchestratorConfig {
                    seed: self
                        .config
                        .seed
                        .map(|s| s.wrapping_add(2 * u64::from(rnti.0))),
                    ..self.config
                };
                Arc::new(Mutex::new(Terminal {
                    imsi: None,
                    orchestrator: HandoverOrchestrator::with_config(self.evaluator.clone(), config),
                }))
            })
            .clone()
    }

    fn existing(&self, rnti: Rnti) -> Option<Arc<Mutex<Terminal>>> {
        self.terminals.read().get(&rnti).cloned()
    }

    /// `imsi` is kept for logging only
    pub fn assign_serving_cell(&self, time: f64, imsi: Imsi, cell: CellId, rnti: Rnti) {
        let terminal = self.terminal(rnti);
        let mut terminal = terminal.lock();
        terminal.imsi = Some(imsi);
        terminal.orchestrator.assign_serving_cell(time, cell);
        self.metrics.record_serving_assignment();
        debug!(rnti = %rnti, imsi = imsi.0, cell = %cell, "serving cell updated");
    }

    pub fn connection_established(&self, time: f64, imsi: Imsi, cell: CellId, rnti: Rnti) {
        info!(time, imsi = imsi.0, rnti = %rnti, cell = %cell, "connection established");
        self.assign_serving_cell(time, imsi, cell, rnti);
    }

    pub fn handover_completed(&self, time: f64, imsi: Imsi, cell: CellId, rnti: Rnti) {
        info!(time, imsi = imsi.0, rnti = %rnti, cell = %cell, "handover completed");
        self.assign_serving_cell(time, imsi, cell, rnti);
    }

    pub fn record_candidate_measurement(&self, time: f64, rnti: Rnti, cell: CellId, rsrp: f64, rsrq: f64) {
        self.terminal(rnti)
            .lock()
            .orchestrator
            .record_candidate_measurement(time, cell, rsrp, rsrq);
    }

    pub fn evaluate_handover(&self, time: f64, rnti: Rnti, rsrp: f64, rsrq: f64) -> Option<CellId> {
        self.evaluate_handover_traced(time, rnti, rsrp, rsrq).target
    }

    pub fn evaluate_handover_traced(&self, time: f64, rnti: Rnti, rsrp: f64, rsrq: f64) -> DecisionTrace {
        let terminal = self.terminal(rnti);
        let mut terminal = terminal.lock();
        let trace = terminal.orchestrator.evaluate_handover_traced(time, rsrp, rsrq);
        self.metrics.record_evaluation(trace.triggered());

        if let Some(target) = trace.target {
            info!(
                time,
                rnti = %rnti,
                imsi = ?terminal.imsi.map(|i| i.0),
                target = %target,
                trigger = ?trace.trigger_score,
                "handover decision"
            );
        }
        trace
    }

    /// Route a measurement report by its measurement id.
    ///
    /// Serving reports drive an evaluation; neighbour reports feed the
    /// candidate windows. Unknown ids are logged and dropped.
    pub fn handle_report(&self, time: f64, rnti: Rnti, report: &MeasurementReport) -> Option<HandoverCommand> {
        self.metrics.record_report();

        match self.reports.classify(report.meas_id) {
            Some(ReportKind::Serving) => self
                .evaluate_handover(time, rnti, report.serving_rsrp, report.serving_rsrq)
                .map(|target| HandoverCommand { rnti, target }),
            Some(ReportKind::Neighbour) => {
                let neighbours = match &report.neighbours {
                    Some(neighbours) if !neighbours.is_empty() => neighbours,
                    _ => {
                        warn!(rnti = %rnti, meas_id = report.meas_id, "neighbour report without results, ignoring");
                        self.metrics.record_ignored_report();
                        return None;
                    }
                };
                for result in neighbours {
                    match (result.rsrp, result.rsrq) {
                        (Some(rsrp), Some(rsrq)) => {
                            self.record_candidate_measurement(time, rnti, result.cell, rsrp, rsrq)
                        }
                        _ => {
                            warn!(rnti = %rnti, cell = %result.cell, "neighbour result without RSRP and RSRQ, skipping");
                            self.metrics.record_skipped_neighbour();
                        }
                    }
                }
                None
            }
            None => {
                warn!(rnti = %rnti, meas_id = report.meas_id, "ignoring report with unknown measurement id");
                self.metrics.record_ignored_report();
                None
            }
        }
    }

    /// Forget a terminal. Returns whether it was tracked.
    pub fn release(&self, rnti: Rnti) -> bool {
        let removed = self.terminals.write().remove(&rnti).is_some();
        if removed {
            self.metrics.record_release();
            info!(rnti = %rnti, "terminal released");
        }
        removed
    }

    fn with_terminal<R>(&self, rnti: Rnti, f: impl FnOnce(&Terminal) -> R) -> Option<R> {
        let terminal = self.existing(rnti)?;
        let guard = terminal.lock();
        Some(f(&guard))
    }

    pub fn serving_cell(&self, rnti: Rnti) -> Option<CellId> {
        self.with_terminal(rnti, |t| t.orchestrator.serving_cell())
            .flatten()
    }

    pub fn imsi(&self, rnti: Rnti) -> Option<Imsi> {
        self.with_terminal(rnti, |t| t.imsi).flatten()
    }

    pub fn candidate_cells(&self, rnti: Rnti) -> Vec<CellId> {
        self.with_terminal(rnti, |t| t.orchestrator.candidate_cells().collect())
            .unwrap_or_default()
    }

    pub fn decision_stats(&self, rnti: Rnti) -> Option<DecisionStats> {
        self.with_terminal(rnti, |t| t.orchestrator.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals_created_lazily() {
        let registry = TerminalRegistry::new(&Config::default());
        assert_eq!(registry.terminal_count(), 0);

        registry.record_candidate_measurement(0.0, Rnti(1), CellId(2), -80.0, 25.0);
        registry.record_candidate_measurement(0.0, Rnti(1), CellId(3), -80.0, 25.0);
        registry.record_candidate_measurement(0.0, Rnti(2), CellId(2), -80.0, 25.0);

        assert_eq!(registry.terminal_count(), 2);
        assert_eq!(registry.candidate_cells(Rnti(1)), vec![CellId(2), CellId(3)]);
        assert!(registry.serving_cell(Rnti(1)).is_none());
    }

    #[test]
    fn test_release_unknown_terminal() {
        let registry = TerminalRegistry::new(&Config::default());
        assert!(!registry.release(Rnti(9)));
        assert_eq!(registry.metrics().get_stats().terminals_released, 0);
    }
}
