//! Fuzzy inference primitives
//!
//! Linguistic variables over sampled universes, min/max Mamdani rule bases,
//! and two defuzzification back ends: type-1 centroid ([`type1`]) and
//! interval type-2 center-of-sets ([`type2`]).

pub mod membership;
pub mod rules;
pub mod type1;
pub mod type2;
pub mod variable;

pub use membership::{
    FromCalibration, FuzzySet, Interval, IntervalMembershipFn, MembershipFn, Shape,
};
pub use rules::{Firing, Rule, RuleBase, TNorm};
pub use variable::{LinguisticVariable, Universe};

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// A rule or query names a variable the rule base does not declare
    UnknownVariable(String),
    /// A rule names a label the variable does not declare
    UnknownTerm(String, String),
    /// No crisp value was supplied for an input variable
    MissingInput(String),
    /// Every rule for this output fired with zero strength
    NoRuleFired(String),
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::UnknownVariable(v) => write!(f, "Unknown variable: {}", v),
            InferenceError::UnknownTerm(v, l) => write!(f, "Unknown term {} for {}", l, v),
            InferenceError::MissingInput(v) => write!(f, "Missing input: {}", v),
            InferenceError::NoRuleFired(v) => write!(f, "No rule fired for output {}", v),
        }
    }
}

impl std::error::Error for InferenceError {}

/// Crisp-in, crisp-out evaluation of a rule base
pub trait Inference {
    /// Map crisp inputs to one crisp value per output variable that has rules
    fn evaluate(&self, inputs: &[(&str, f64)]) -> Result<HashMap<String, f64>, InferenceError>;

    fn evaluate_output(&self, inputs: &[(&str, f64)], output: &str) -> Result<f64, InferenceError> {
        self.evaluate(inputs)?
            .remove(output)
            .ok_or_else(|| InferenceError::NoRuleFired(output.to_string()))
    }
}
