//! Per-terminal handover decision state machine
//!
//! One [`HandoverOrchestrator`] tracks one terminal: its serving cell, the
//! serving measurement window and one window per candidate cell. Every
//! `evaluate_handover` call appends the fresh serving sample, prunes stale
//! candidates, scores the survivors and asks the trigger rule base whether the
//! best of them is worth a handover.

use crate::measurement::{CellId, MeasurementWindow, Sample, DEFAULT_RETENTION};
use crate::predictor::{CellRole, TrendPredictor};
use crate::rule_base::{LinkQualityEvaluator, TriggerPolicy, Variant};
use tracing::{debug, info, warn};

/// Calibration of one orchestrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    /// Candidates whose last sample is older than twice this (seconds) are evicted
    pub staleness_window: f64,
    /// Samples read by the trend predictor
    pub retention: usize,
    pub policy: TriggerPolicy,
    /// Seed for the serving predictor; the neighbour predictor uses `seed + 1`.
    /// `None` seeds both from entropy.
    pub seed: Option<u64>,
}

impl OrchestratorConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            staleness_window: variant.default_staleness_window(),
            retention: DEFAULT_RETENTION,
            policy: TriggerPolicy::for_variant(variant),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Age beyond which a candidate is dropped
    pub fn eviction_age(&self) -> f64 {
        2.0 * self.staleness_window
    }
}

/// Why a candidate was dropped during an evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvictionReason {
    Stale { age: f64 },
    ZeroQuality,
}

/// Predicted trend and fuzzy link quality of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct TrendScore {
    /// Quality values the predictor read, oldest first
    pub recent: Vec<f64>,
    pub predicted: f64,
    /// Prediction minus the last raw sample
    pub delta: f64,
    pub link_quality: f64,
}

/// Everything one `evaluate_handover` call computed
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTrace {
    pub time: f64,
    pub serving_cell: Option<CellId>,
    pub serving: TrendScore,
    /// Surviving candidates in iteration order
    pub candidates: Vec<(CellId, TrendScore)>,
    pub evicted: Vec<(CellId, EvictionReason)>,
    pub best: Option<(CellId, f64)>,
    pub trigger_score: Option<f64>,
    pub target: Option<CellId>,
}

impl DecisionTrace {
    pub fn triggered(&self) -> bool {
        self.target.is_some()
    }
}

/// Counters accumulated over the orchestrator's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionStats {
    pub evaluations: u64,
    pub handovers_triggered: u64,
    pub candidates_evicted: u64,
    pub serving_changes: u64,
    pub inference_failures: u64,
}

fn eviction_reason(window: &MeasurementWindow, time: f64, max_age: f64) -> Option<EvictionReason> {
    let last = window.last()?;
    let age = time - last.time;
    if age > max_age {
        Some(EvictionReason::Stale { age })
    } else if last.quality == 0.0 {
        Some(EvictionReason::ZeroQuality)
    } else {
        None
    }
}

fn score_trend<E: LinkQualityEvaluator>(
    evaluator: &E,
    predictor: &mut TrendPredictor,
    window: &MeasurementWindow,
    stats: &mut DecisionStats,
) -> TrendScore {
    let recent = window.recent_qualities(predictor.retention());
    let predicted = predictor.predict(&recent);
    let last = window.last().map(|s| s.quality).unwrap_or(0.0);
    let delta = predicted - last;

    let link_quality = match evaluator.link_quality(predictor.role(), predicted, delta) {
        Ok(q) => q,
        Err(e) => {
            stats.inference_failures += 1;
            warn!(role = ?predictor.role(), predicted, delta, "link quality inference failed: {}", e);
            0.0
        }
    };

    TrendScore {
        recent,
        predicted,
        delta,
        link_quality,
    }
}

/// Handover decision state of one tracked terminal
#[derive(Debug)]
pub struct HandoverOrchestrator<E> {
    evaluator: E,
    config: OrchestratorConfig,
    serving_cell: Option<CellId>,
    serving: MeasurementWindow,
    candidates: Vec<(CellId, MeasurementWindow)>,
    serving_predictor: TrendPredictor,
    neighbour_predictor: TrendPredictor,
    stats: DecisionStats,
}

impl<E: LinkQualityEvaluator> HandoverOrchestrator<E> {
    /// Orchestrator with the evaluator's variant defaults
    pub fn new(evaluator: E) -> Self {
        let config = OrchestratorConfig::for_variant(evaluator.variant());
        Self::with_config(evaluator, config)
    }

    pub fn with_config(evaluator: E, config: OrchestratorConfig) -> Self {
        let (serving_predictor, neighbour_predictor) = match config.seed {
            Some(seed) => (
                TrendPredictor::with_seed(CellRole::Serving, seed),
                TrendPredictor::with_seed(CellRole::Neighbour, seed.wrapping_add(1)),
            ),
            None => (
                TrendPredictor::new(CellRole::Serving),
                TrendPredictor::new(CellRole::Neighbour),
            ),
        };

        Self {
            evaluator,
            config,
            serving_cell: None,
            serving: MeasurementWindow::new(),
            candidates: Vec::new(),
            serving_predictor: serving_predictor.with_retention(config.retention),
            neighbour_predictor: neighbour_predictor.with_retention(config.retention),
            stats: DecisionStats::default(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn stats(&self) -> DecisionStats {
        self.stats
    }

    pub fn serving_cell(&self) -> Option<CellId> {
        self.serving_cell
    }

    pub fn serving_window(&self) -> &MeasurementWindow {
        &self.serving
    }

    /// Candidate ids in iteration order
    pub fn candidate_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.candidates.iter().map(|(cell, _)| *cell)
    }

    pub fn candidate_window(&self, cell: CellId) -> Option<&MeasurementWindow> {
        self.candidates
            .iter()
            .find(|(id, _)| *id == cell)
            .map(|(_, window)| window)
    }

    /// Make `cell` the serving cell.
    ///
    /// The serving window restarts empty and any candidate entry for `cell`
    /// is dropped.
    pub fn assign_serving_cell(&mut self, time: f64, cell: CellId) {
        let previous = self.serving_cell.replace(cell);
        self.serving.clear();
        self.candidates.retain(|(id, _)| *id != cell);
        self.stats.serving_changes += 1;

        info!(time, cell = %cell, previous = ?previous, "serving cell assigned");
    }

    /// Append a neighbour sample, creating the candidate on first report.
    ///
    /// Reports about the current serving cell are ignored.
    pub fn record_candidate_measurement(&mut self, time: f64, cell: CellId, strength: f64, quality: f64) {
        if self.serving_cell == Some(cell) {
            debug!(time, cell = %cell, "ignoring neighbour report for serving cell");
            return;
        }

        let sample = Sample::new(time, strength, quality);
        match self.candidates.iter_mut().find(|(id, _)| *id == cell) {
            Some((_, window)) => window.push(sample),
            None => {
                let mut window = MeasurementWindow::new();
                window.push(sample);
                self.candidates.push((cell, window));
                debug!(time, cell = %cell, "new candidate cell");
            }
        }
    }

    /// Record a serving sample and decide whether to hand over.
    ///
    /// Returns the target cell, or `None` for no handover.
    pub fn evaluate_handover(&mut self, time: f64, strength: f64, quality: f64) -> Option<CellId> {
        self.evaluate_handover_traced(time, strength, quality).target
    }

    /// [`evaluate_handover`](Self::evaluate_handover) returning every
    /// intermediate score
    pub fn evaluate_handover_traced(&mut self, time: f64, strength: f64, quality: f64) -> DecisionTrace {
        self.stats.evaluations += 1;
        self.serving.push(Sample::new(time, strength, quality));

        let serving = score_trend(
            &self.evaluator,
            &mut self.serving_predictor,
            &self.serving,
            &mut self.stats,
        );
        debug!(
            time,
            cell = ?self.serving_cell,
            window = ?serving.recent,
            predicted = serving.predicted,
            delta = serving.delta,
            link_quality = serving.link_quality,
            "serving cell scored"
        );

        let max_age = self.config.eviction_age();
        let mut evicted = Vec::new();
        self.candidates.retain(|(cell, window)| match eviction_reason(window, time, max_age) {
            Some(reason) => {
                evicted.push((*cell, reason));
                false
            }
            None => true,
        });
        for (cell, reason) in &evicted {
            debug!(time, cell = %cell, reason = ?reason, "candidate evicted");
        }
        self.stats.candidates_evicted += evicted.len() as u64;

        let mut candidates = Vec::with_capacity(self.candidates.len());
        let mut best: Option<(CellId, f64)> = None;
        for (cell, window) in &self.candidates {
            let score = score_trend(
                &self.evaluator,
                &mut self.neighbour_predictor,
                window,
                &mut self.stats,
            );
            debug!(
                time,
                cell = %cell,
                window = ?score.recent,
                predicted = score.predicted,
                delta = score.delta,
                link_quality = score.link_quality,
                "candidate scored"
            );

            // Later candidates win ties
            if best.map_or(true, |(_, b)| b <= score.link_quality) {
                best = Some((*cell, score.link_quality));
            }
            candidates.push((*cell, score));
        }

        let mut trigger_score = None;
        let mut target = None;
        if let Some((cell, neighbour_quality)) = best {
            match self.evaluator.trigger_score(serving.link_quality, neighbour_quality) {
                Ok(score) => {
                    trigger_score = Some(score);
                    if self.config.policy.fires(score) {
                        target = Some(cell);
                    }
                    debug!(time, best = %cell, trigger = score, fired = target.is_some(), "trigger evaluated");
                }
                Err(e) => {
                    self.stats.inference_failures += 1;
                    warn!(time, best = %cell, "trigger inference failed: {}", e);
                }
            }
        }

        if let Some(cell) = target {
            self.stats.handovers_triggered += 1;
            info!(time, from = ?self.serving_cell, to = %cell, "handover triggered");
        }

        DecisionTrace {
            time,
            serving_cell: self.serving_cell,
            serving,
            candidates,
            evicted,
            best,
            trigger_score,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::InferenceError;

    /// Scores a cell by its predicted quality scaled into [0, 1]
    struct LinearEvaluator;

    impl LinkQualityEvaluator for LinearEvaluator {
        fn variant(&self) -> Variant {
            Variant::Type1
        }

        fn link_quality(&self, _role: CellRole, rsrq: f64, _delta: f64) -> Result<f64, InferenceError> {
            Ok((rsrq / 34.0).clamp(0.0, 1.0))
        }

        fn trigger_score(&self, serving: f64, neighbour: f64) -> Result<f64, InferenceError> {
            Ok((0.5 + neighbour - serving).clamp(0.0, 1.0))
        }
    }

    struct BrokenEvaluator;

    impl LinkQualityEvaluator for BrokenEvaluator {
        fn variant(&self) -> Variant {
            Variant::Type2
        }

        fn link_quality(&self, _: CellRole, _: f64, _: f64) -> Result<f64, InferenceError> {
            Err(InferenceError::NoRuleFired("RLQ".to_string()))
        }

        fn trigger_score(&self, _: f64, _: f64) -> Result<f64, InferenceError> {
            Err(InferenceError::NoRuleFired("hT".to_string()))
        }
    }

    fn orchestrator() -> HandoverOrchestrator<LinearEvaluator> {
        let config = OrchestratorConfig::for_variant(Variant::Type1).with_seed(42);
        HandoverOrchestrator::with_config(LinearEvaluator, config)
    }

    #[test]
    fn test_assign_drops_matching_candidate() {
        let mut orch = orchestrator();
        orch.record_candidate_measurement(0.0, CellId(2), -80.0, 25.0);
        orch.record_candidate_measurement(0.0, CellId(3), -80.0, 25.0);
        orch.evaluate_handover(0.0, -90.0, 20.0);

        orch.assign_serving_cell(0.1, CellId(2));

        assert_eq!(orch.serving_cell(), Some(CellId(2)));
        assert!(orch.serving_window().is_empty());
        assert_eq!(orch.candidate_cells().collect::<Vec<_>>(), vec![CellId(3)]);
        assert_eq!(orch.stats().serving_changes, 1);
    }

    #[test]
    fn test_serving_cell_reports_ignored() {
        let mut orch = orchestrator();
        orch.assign_serving_cell(0.0, CellId(1));
        orch.record_candidate_measurement(0.0, CellId(1), -80.0, 25.0);

        assert_eq!(orch.candidate_cells().count(), 0);
    }

    #[test]
    fn test_candidate_windows_grow() {
        let mut orch = orchestrator();
        for i in 0..4 {
            orch.record_candidate_measurement(i as f64 * 0.12, CellId(5), -80.0, 20.0 + i as f64);
        }

        let window = orch.candidate_window(CellId(5)).unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window.last().map(|s| s.quality), Some(23.0));
    }

    #[test]
    fn test_stale_candidate_evicted() {
        let mut orch = orchestrator();
        orch.record_candidate_measurement(1.0, CellId(2), -80.0, 30.0);
        orch.record_candidate_measurement(0.9, CellId(3), -80.0, 30.0);

        // 0.2 old survives a 0.24 limit, 0.3 old does not
        let trace = orch.evaluate_handover_traced(1.2, -90.0, 10.0);

        assert_eq!(trace.candidates.len(), 1);
        assert_eq!(trace.candidates[0].0, CellId(2));
        assert_eq!(trace.evicted.len(), 1);
        assert_eq!(trace.evicted[0].0, CellId(3));
        assert!(matches!(trace.evicted[0].1, EvictionReason::Stale { age } if age > 0.24));
    }

    #[test]
    fn test_trace_reports_trigger() {
        let mut orch = orchestrator();
        orch.assign_serving_cell(0.0, CellId(1));
        orch.record_candidate_measurement(0.0, CellId(2), -70.0, 34.0);

        let trace = orch.evaluate_handover_traced(0.0, -100.0, 5.0);

        assert_eq!(trace.serving.predicted, 6.0);
        assert_eq!(trace.serving.delta, 1.0);
        assert_eq!(trace.best.map(|b| b.0), Some(CellId(2)));
        assert!(trace.trigger_score.unwrap() > 0.75);
        assert!(trace.triggered());
        assert_eq!(orch.stats().handovers_triggered, 1);
    }

    #[test]
    fn test_inference_failure_means_no_handover() {
        let config = OrchestratorConfig::for_variant(Variant::Type2).with_seed(1);
        let mut orch = HandoverOrchestrator::with_config(BrokenEvaluator, config);
        orch.record_candidate_measurement(0.0, CellId(2), -70.0, 34.0);

        let trace = orch.evaluate_handover_traced(0.0, -100.0, 5.0);

        assert_eq!(trace.serving.link_quality, 0.0);
        assert!(trace.trigger_score.is_none());
        assert!(trace.target.is_none());
        assert_eq!(orch.stats().inference_failures, 3);
    }

    #[test]
    fn test_variant_defaults_flow_into_config() {
        let orch = HandoverOrchestrator::new(LinearEvaluator);
        assert!((orch.config().eviction_age() - 0.24).abs() < 1e-12);
        assert_eq!(orch.config().retention, DEFAULT_RETENTION);
    }
}
