//! Handover linguistic variables, rule tables and link-quality evaluators
//!
//! Three rule bases drive a decision:
//! - serving RLQ: (RSRQ, ΔRSRQ) of the serving cell → radio link quality
//! - neighbour RLQ: the same table over neighbour-calibrated partitions
//! - trigger: (neighbour RLQ, serving RLQ) → handover trigger score
//!
//! Both the type-1 and the interval type-2 evaluator are built from the same
//! calibration tables; type-1 sets simply ignore the sigma spread.

use crate::fuzzy::{
    FromCalibration, Inference, InferenceError, IntervalMembershipFn, LinguisticVariable,
    MembershipFn, Rule, RuleBase, Shape, TNorm, Universe,
};
use crate::predictor::CellRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const RSRQ: &str = "RSRQ";
pub const DELTA_RSRQ: &str = "deltaRSRQ";
pub const RLQ: &str = "RLQ";
pub const SERVING_RLQ: &str = "sRLQ";
pub const NEIGHBOUR_RLQ: &str = "nRLQ";
pub const HANDOVER_TRIGGER: &str = "hT";

pub const RSRQ_UNIVERSE: Universe = Universe::new(0.0, 34.0, 35);
pub const DELTA_RSRQ_UNIVERSE: Universe = Universe::new(-4.0, 4.0, 9);
pub const SCORE_UNIVERSE: Universe = Universe::new(0.0, 1.0, 101);

pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 0.75;

/// Calibration of one labelled partition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermSpec {
    pub label: &'static str,
    pub shape: Shape,
    pub centre: f64,
    pub sigma: f64,
    /// Sigma uncertainty of the interval type-2 set
    pub spread: f64,
}

const fn term(label: &'static str, shape: Shape, centre: f64, sigma: f64, spread: f64) -> TermSpec {
    TermSpec {
        label,
        shape,
        centre,
        sigma,
        spread,
    }
}

use crate::fuzzy::Shape::{Gaussian, LeftShoulder, RightShoulder};

pub const SERVING_RSRQ_TERMS: [TermSpec; 4] = [
    term("POOR", RightShoulder, 20.0, 1.5, 0.5),
    term("FAIR", Gaussian, 23.0, 1.5, 0.5),
    term("GOOD", Gaussian, 27.0, 1.5, 0.5),
    term("EXCELLENT", LeftShoulder, 31.0, 1.5, 0.5),
];

// Type-1 widens the serving DEC taper so a flat weak serving cell still
// reads LOW against a rising neighbour
pub const TYPE1_SERVING_DELTA_TERMS: [TermSpec; 2] = [
    term("DEC", RightShoulder, -4.0, 2.5, 0.25),
    term("INC", LeftShoulder, 4.0, 1.5, 0.25),
];

pub const TYPE2_SERVING_DELTA_TERMS: [TermSpec; 2] = [
    term("DEC", RightShoulder, -4.0, 2.0, 0.25),
    term("INC", LeftShoulder, 4.0, 1.5, 0.25),
];

/// Serving ΔRSRQ partitions, the only table calibrated per variant
pub fn serving_delta_terms(variant: Variant) -> &'static [TermSpec; 2] {
    match variant {
        Variant::Type1 => &TYPE1_SERVING_DELTA_TERMS,
        Variant::Type2 => &TYPE2_SERVING_DELTA_TERMS,
    }
}

// Neighbour partitions sit three range steps below the serving ones
pub const NEIGHBOUR_RSRQ_TERMS: [TermSpec; 4] = [
    term("POOR", RightShoulder, 17.0, 1.0, 0.5),
    term("FAIR", Gaussian, 20.0, 1.0, 0.5),
    term("GOOD", Gaussian, 23.0, 1.0, 0.5),
    term("EXCELLENT", LeftShoulder, 26.0, 1.0, 0.5),
];

pub const NEIGHBOUR_DELTA_TERMS: [TermSpec; 2] = [
    term("DEC", RightShoulder, -4.0, 2.0, 0.25),
    term("INC", LeftShoulder, 4.0, 2.0, 0.25),
];

pub const LINK_QUALITY_TERMS: [TermSpec; 3] = [
    term("LOW", RightShoulder, 0.0, 0.2, 0.1),
    term("AVERAGE", Gaussian, 0.5, 0.1, 0.04),
    term("HIGH", LeftShoulder, 1.0, 0.2, 0.1),
];

pub const TRIGGER_TERMS: [TermSpec; 3] = [
    term("NO", RightShoulder, 0.0, 0.2, 0.1),
    term("MIDDLE", Gaussian, 0.5, 0.1, 0.04),
    term("YES", LeftShoulder, 1.0, 0.2, 0.1),
];

/// `(RSRQ label, ΔRSRQ label) → RLQ label`, shared by both cell roles
pub const LINK_QUALITY_TABLE: [(&str, &str, &str); 8] = [
    ("POOR", "DEC", "LOW"),
    ("POOR", "INC", "LOW"),
    ("FAIR", "DEC", "LOW"),
    ("FAIR", "INC", "AVERAGE"),
    ("GOOD", "DEC", "AVERAGE"),
    ("GOOD", "INC", "HIGH"),
    ("EXCELLENT", "DEC", "HIGH"),
    ("EXCELLENT", "INC", "HIGH"),
];

/// `(neighbour RLQ, serving RLQ) → trigger`.
///
/// Handover policy lives here. The two inputs are not interchangeable:
/// a weak serving cell next to a weak neighbour scores MIDDLE, while an
/// AVERAGE neighbour against a LOW serving cell scores YES.
pub const TRIGGER_TABLE: [(&str, &str, &str); 9] = [
    ("LOW", "LOW", "MIDDLE"),
    ("LOW", "AVERAGE", "NO"),
    ("LOW", "HIGH", "NO"),
    ("AVERAGE", "LOW", "YES"),
    ("AVERAGE", "AVERAGE", "MIDDLE"),
    ("AVERAGE", "HIGH", "NO"),
    ("HIGH", "LOW", "YES"),
    ("HIGH", "AVERAGE", "MIDDLE"),
    ("HIGH", "HIGH", "NO"),
];

fn variable<M>(name: &str, universe: Universe, terms: &[TermSpec]) -> LinguisticVariable<M>
where
    M: FromCalibration,
{
    terms.iter().fold(LinguisticVariable::new(name, universe), |var, t| {
        var.with_term(t.label, M::from_calibration(t.shape, t.centre, t.sigma, t.spread))
    })
}

/// RLQ rule base for one cell role under `variant`'s calibration
pub fn link_quality_rule_base<M>(variant: Variant, role: CellRole) -> RuleBase<M>
where
    M: FromCalibration,
    M::Degree: TNorm,
{
    let (rsrq_terms, delta_terms) = match role {
        CellRole::Serving => (&SERVING_RSRQ_TERMS, serving_delta_terms(variant)),
        CellRole::Neighbour => (&NEIGHBOUR_RSRQ_TERMS, &NEIGHBOUR_DELTA_TERMS),
    };

    let inputs = vec![
        variable(RSRQ, RSRQ_UNIVERSE, rsrq_terms),
        variable(DELTA_RSRQ, DELTA_RSRQ_UNIVERSE, delta_terms),
    ];
    let outputs = vec![variable(RLQ, SCORE_UNIVERSE, &LINK_QUALITY_TERMS)];

    RuleBase::new(inputs, outputs).with_rules(
        LINK_QUALITY_TABLE
            .iter()
            .map(|&(level, delta, rlq)| Rule::new(&[(RSRQ, level), (DELTA_RSRQ, delta)], (RLQ, rlq))),
    )
}

/// Trigger rule base over distinct serving and neighbour RLQ inputs
pub fn trigger_rule_base<M>() -> RuleBase<M>
where
    M: FromCalibration,
    M::Degree: TNorm,
{
    let inputs = vec![
        variable(SERVING_RLQ, SCORE_UNIVERSE, &LINK_QUALITY_TERMS),
        variable(NEIGHBOUR_RLQ, SCORE_UNIVERSE, &LINK_QUALITY_TERMS),
    ];
    let outputs = vec![variable(HANDOVER_TRIGGER, SCORE_UNIVERSE, &TRIGGER_TERMS)];

    RuleBase::new(inputs, outputs).with_rules(TRIGGER_TABLE.iter().map(|&(n, s, out)| {
        Rule::new(
            &[(NEIGHBOUR_RLQ, n), (SERVING_RLQ, s)],
            (HANDOVER_TRIGGER, out),
        )
    }))
}

/// Which fuzzy-set family scores the cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Type1,
    Type2,
}

impl Variant {
    /// Staleness window in seconds; candidates older than twice this are evicted
    pub fn default_staleness_window(self) -> f64 {
        match self {
            Variant::Type1 => 0.12,
            Variant::Type2 => 0.12 + 0.06,
        }
    }

    pub fn default_comparison(self) -> ThresholdComparison {
        match self {
            Variant::Type1 => ThresholdComparison::Greater,
            Variant::Type2 => ThresholdComparison::GreaterOrEqual,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Type1 => write!(f, "type-1"),
            Variant::Type2 => write!(f, "interval type-2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdComparison {
    Greater,
    GreaterOrEqual,
}

/// Trigger score threshold and how a score is compared against it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerPolicy {
    pub threshold: f64,
    pub comparison: ThresholdComparison,
}

impl TriggerPolicy {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            threshold: DEFAULT_TRIGGER_THRESHOLD,
            comparison: variant.default_comparison(),
        }
    }

    pub fn fires(&self, score: f64) -> bool {
        match self.comparison {
            ThresholdComparison::Greater => score > self.threshold,
            ThresholdComparison::GreaterOrEqual => score >= self.threshold,
        }
    }
}

/// Scores cells and handover urgency. Implemented once per fuzzy-set family.
pub trait LinkQualityEvaluator {
    fn variant(&self) -> Variant;

    /// Radio link quality in [0, 1] from a predicted RSRQ and its delta to
    /// the last raw sample
    fn link_quality(&self, role: CellRole, rsrq: f64, delta: f64) -> Result<f64, InferenceError>;

    /// Handover trigger score in [0, 1]
    fn trigger_score(&self, serving_rlq: f64, neighbour_rlq: f64) -> Result<f64, InferenceError>;
}

impl<E: LinkQualityEvaluator + ?Sized> LinkQualityEvaluator for Box<E> {
    fn variant(&self) -> Variant {
        (**self).variant()
    }

    fn link_quality(&self, role: CellRole, rsrq: f64, delta: f64) -> Result<f64, InferenceError> {
        (**self).link_quality(role, rsrq, delta)
    }

    fn trigger_score(&self, serving_rlq: f64, neighbour_rlq: f64) -> Result<f64, InferenceError> {
        (**self).trigger_score(serving_rlq, neighbour_rlq)
    }
}

impl<E: LinkQualityEvaluator + ?Sized> LinkQualityEvaluator for Arc<E> {
    fn variant(&self) -> Variant {
        (**self).variant()
    }

    fn link_quality(&self, role: CellRole, rsrq: f64, delta: f64) -> Result<f64, InferenceError> {
        (**self).link_quality(role, rsrq, delta)
    }

    fn trigger_score(&self, serving_rlq: f64, neighbour_rlq: f64) -> Result<f64, InferenceError> {
        (**self).trigger_score(serving_rlq, neighbour_rlq)
    }
}

/// The three handover rule bases over one fuzzy-set family
#[derive(Debug, Clone)]
pub struct FuzzyEvaluator<M> {
    variant: Variant,
    serving: RuleBase<M>,
    neighbour: RuleBase<M>,
    trigger: RuleBase<M>,
}

pub type Type1Evaluator = FuzzyEvaluator<MembershipFn>;
pub type Type2Evaluator = FuzzyEvaluator<IntervalMembershipFn>;

impl<M> FuzzyEvaluator<M>
where
    M: FromCalibration,
    M::Degree: TNorm,
{
    fn build(variant: Variant) -> Self {
        Self {
            variant,
            serving: link_quality_rule_base(variant, CellRole::Serving),
            neighbour: link_quality_rule_base(variant, CellRole::Neighbour),
            trigger: trigger_rule_base(),
        }
    }

    pub fn rule_base(&self, role: CellRole) -> &RuleBase<M> {
        match role {
            CellRole::Serving => &self.serving,
            CellRole::Neighbour => &self.neighbour,
        }
    }

    pub fn trigger_rule_base(&self) -> &RuleBase<M> {
        &self.trigger
    }
}

impl FuzzyEvaluator<MembershipFn> {
    pub fn new() -> Self {
        Self::build(Variant::Type1)
    }
}

impl Default for FuzzyEvaluator<MembershipFn> {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyEvaluator<IntervalMembershipFn> {
    pub fn new() -> Self {
        Self::build(Variant::Type2)
    }
}

impl Default for FuzzyEvaluator<IntervalMembershipFn> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> LinkQualityEvaluator for FuzzyEvaluator<M>
where
    M: FromCalibration,
    M::Degree: TNorm,
    RuleBase<M>: Inference,
{
    fn variant(&self) -> Variant {
        self.variant
    }

    fn link_quality(&self, role: CellRole, rsrq: f64, delta: f64) -> Result<f64, InferenceError> {
        self.rule_base(role)
            .evaluate_output(&[(RSRQ, rsrq), (DELTA_RSRQ, delta)], RLQ)
    }

    fn trigger_score(&self, serving_rlq: f64, neighbour_rlq: f64) -> Result<f64, InferenceError> {
        self.trigger.evaluate_output(
            &[(NEIGHBOUR_RLQ, neighbour_rlq), (SERVING_RLQ, serving_rlq)],
            HANDOVER_TRIGGER,
        )
    }
}

/// Build the evaluator for `variant` behind a shareable trait object
pub fn evaluator_for(variant: Variant) -> Arc<dyn LinkQualityEvaluator + Send + Sync> {
    match variant {
        Variant::Type1 => Arc::new(Type1Evaluator::new()),
        Variant::Type2 => Arc::new(Type2Evaluator::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_bases_are_complete_cross_products() {
        let t1 = Type1Evaluator::new();
        let t2 = Type2Evaluator::new();

        for role in [CellRole::Serving, CellRole::Neighbour] {
            assert_eq!(t1.rule_base(role).rules().len(), 8);
            assert_eq!(t1.rule_base(role).validate(), Ok(()));
            assert_eq!(t2.rule_base(role).validate(), Ok(()));
        }
        assert_eq!(t1.trigger_rule_base().rules().len(), 9);
        assert_eq!(t1.trigger_rule_base().validate(), Ok(()));
        assert_eq!(t2.trigger_rule_base().validate(), Ok(()));
    }

    #[test]
    fn test_neighbour_partitions_shifted_down() {
        for (s, n) in SERVING_RSRQ_TERMS.iter().zip(NEIGHBOUR_RSRQ_TERMS.iter()) {
            assert_eq!(s.label, n.label);
            assert!(s.centre > n.centre);
        }
    }

    #[test]
    fn test_serving_decline_calibrated_per_variant() {
        let dec_sigma_t1 = Type1Evaluator::new()
            .rule_base(CellRole::Serving)
            .input(DELTA_RSRQ)
            .and_then(|v| v.term("DEC"))
            .map(|m| m.sigma);
        let dec_sigma_t2 = Type2Evaluator::new()
            .rule_base(CellRole::Serving)
            .input(DELTA_RSRQ)
            .and_then(|v| v.term("DEC"))
            .map(|m| m.sigma);
        assert_eq!(dec_sigma_t1, Some(2.5));
        assert_eq!(dec_sigma_t2, Some(2.0));

        // Neighbour partitions are shared
        let nb_sigma_t2 = Type2Evaluator::new()
            .rule_base(CellRole::Neighbour)
            .input(DELTA_RSRQ)
            .and_then(|v| v.term("DEC"))
            .map(|m| m.sigma);
        assert_eq!(nb_sigma_t2, Some(2.0));
        assert_eq!(serving_delta_terms(Variant::Type1)[1], serving_delta_terms(Variant::Type2)[1]);
    }

    #[test]
    fn test_trigger_policy_comparison() {
        let t1 = TriggerPolicy::for_variant(Variant::Type1);
        let t2 = TriggerPolicy::for_variant(Variant::Type2);

        assert!(!t1.fires(0.75));
        assert!(t1.fires(0.7501));
        assert!(t2.fires(0.75));
        assert!(!t2.fires(0.7499));
    }

    #[test]
    fn test_variant_staleness_defaults() {
        assert!((Variant::Type1.default_staleness_window() - 0.12).abs() < 1e-12);
        assert!((Variant::Type2.default_staleness_window() - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_link_quality_orders_by_level() {
        for evaluator in [evaluator_for(Variant::Type1), evaluator_for(Variant::Type2)] {
            let poor = evaluator.link_quality(CellRole::Neighbour, 15.0, 0.0).unwrap();
            let fair = evaluator.link_quality(CellRole::Neighbour, 20.0, 0.0).unwrap();
            let excellent = evaluator.link_quality(CellRole::Neighbour, 31.0, 1.0).unwrap();
            assert!(poor < fair && fair < excellent, "{} {} {}", poor, fair, excellent);
        }
    }

    #[test]
    fn test_serving_calibration_stricter_than_neighbour() {
        let evaluator = Type1Evaluator::new();
        let serving = evaluator.link_quality(CellRole::Serving, 23.0, 0.0).unwrap();
        let neighbour = evaluator.link_quality(CellRole::Neighbour, 23.0, 0.0).unwrap();
        assert!(serving < neighbour);
    }
}
