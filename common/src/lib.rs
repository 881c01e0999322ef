pub mod fuzzy;
pub mod measurement;
pub mod orchestrator;
pub mod predictor;
pub mod rule_base;

pub use measurement::*;
pub use orchestrator::*;
pub use predictor::{CellRole, NelderMead, TrendPredictor};
pub use rule_base::{
    evaluator_for, FuzzyEvaluator, LinkQualityEvaluator, ThresholdComparison, TriggerPolicy,
    Type1Evaluator, Type2Evaluator, Variant, DEFAULT_TRIGGER_THRESHOLD,
};
