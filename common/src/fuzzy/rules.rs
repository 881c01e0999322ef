//! Mamdani rules and rule bases

use super::membership::{FuzzySet, Interval};
use super::variable::LinguisticVariable;
use super::InferenceError;

/// Conjunction of antecedent degrees
pub trait TNorm: Copy + std::fmt::Debug {
    /// Neutral element of the t-norm
    const FULL: Self;

    fn and(self, other: Self) -> Self;
}

impl TNorm for f64 {
    const FULL: f64 = 1.0;

    fn and(self, other: f64) -> f64 {
        self.min(other)
    }
}

impl TNorm for Interval {
    const FULL: Interval = Interval::ONE;

    fn and(self, other: Interval) -> Interval {
        self.min(other)
    }
}

/// `IF v1 is A AND v2 is B ... THEN out is C`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub antecedents: Vec<(String, String)>,
    pub consequent: (String, String),
}

impl Rule {
    pub fn new(antecedents: &[(&str, &str)], consequent: (&str, &str)) -> Self {
        Self {
            antecedents: antecedents
                .iter()
                .map(|(v, l)| (v.to_string(), l.to_string()))
                .collect(),
            consequent: (consequent.0.to_string(), consequent.1.to_string()),
        }
    }
}

/// One rule's firing strength together with the set it fires
#[derive(Debug)]
pub struct Firing<'a, M: FuzzySet> {
    pub rule: &'a Rule,
    pub strength: M::Degree,
    pub output: &'a LinguisticVariable<M>,
    pub consequent: &'a M,
}

/// Input/output variables and the rules relating them. Built once, then
/// only read.
#[derive(Debug, Clone)]
pub struct RuleBase<M> {
    inputs: Vec<LinguisticVariable<M>>,
    outputs: Vec<LinguisticVariable<M>>,
    rules: Vec<Rule>,
}

impl<M> RuleBase<M>
where
    M: FuzzySet,
    M::Degree: TNorm,
{
    pub fn new(inputs: Vec<LinguisticVariable<M>>, outputs: Vec<LinguisticVariable<M>>) -> Self {
        Self {
            inputs,
            outputs,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable<M>> {
        self.inputs.iter().find(|v| v.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&LinguisticVariable<M>> {
        self.outputs.iter().find(|v| v.name() == name)
    }

    pub fn outputs(&self) -> &[LinguisticVariable<M>] {
        &self.outputs
    }

    /// Check that every variable and label a rule mentions is declared
    pub fn validate(&self) -> Result<(), InferenceError> {
        for rule in &self.rules {
            for (var, label) in &rule.antecedents {
                let variable = self
                    .input(var)
                    .ok_or_else(|| InferenceError::UnknownVariable(var.clone()))?;
                variable
                    .term(label)
                    .ok_or_else(|| InferenceError::UnknownTerm(var.clone(), label.clone()))?;
            }
            self.consequent(rule)?;
        }
        Ok(())
    }

    fn consequent<'a>(
        &'a self,
        rule: &Rule,
    ) -> Result<(&'a LinguisticVariable<M>, &'a M), InferenceError> {
        let (var, label) = &rule.consequent;
        let output = self
            .output(var)
            .ok_or_else(|| InferenceError::UnknownVariable(var.clone()))?;
        let set = output
            .term(label)
            .ok_or_else(|| InferenceError::UnknownTerm(var.clone(), label.clone()))?;
        Ok((output, set))
    }

    /// Fuzzify the crisp inputs and combine each rule's antecedents with the
    /// min t-norm.
    pub fn fire(&self, inputs: &[(&str, f64)]) -> Result<Vec<Firing<'_, M>>, InferenceError> {
        let mut firings = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let mut strength = <M::Degree as TNorm>::FULL;
            for (var, label) in &rule.antecedents {
                let variable = self
                    .input(var)
                    .ok_or_else(|| InferenceError::UnknownVariable(var.clone()))?;
                let x = inputs
                    .iter()
                    .find(|(name, _)| *name == var.as_str())
                    .map(|(_, x)| *x)
                    .ok_or_else(|| InferenceError::MissingInput(var.clone()))?;
                let degree = variable
                    .fuzzify(label, x)
                    .ok_or_else(|| InferenceError::UnknownTerm(var.clone(), label.clone()))?;
                strength = strength.and(degree);
            }

            let (output, consequent) = self.consequent(rule)?;
            firings.push(Firing {
                rule,
                strength,
                output,
                consequent,
            });
        }

        Ok(firings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::membership::MembershipFn;
    use crate::fuzzy::variable::Universe;

    fn small_base() -> RuleBase<MembershipFn> {
        let u = Universe::new(0.0, 10.0, 11);
        let a = LinguisticVariable::new("a", u)
            .with_term("LO", MembershipFn::right_shoulder(2.0, 1.0))
            .with_term("HI", MembershipFn::left_shoulder(8.0, 1.0));
        let b = LinguisticVariable::new("b", u)
            .with_term("LO", MembershipFn::right_shoulder(2.0, 1.0))
            .with_term("HI", MembershipFn::left_shoulder(8.0, 1.0));
        let out = LinguisticVariable::new("out", u)
            .with_term("LO", MembershipFn::right_shoulder(2.0, 1.0))
            .with_term("HI", MembershipFn::left_shoulder(8.0, 1.0));

        RuleBase::new(vec![a, b], vec![out])
            .with_rule(Rule::new(&[("a", "LO"), ("b", "HI")], ("out", "HI")))
    }

    #[test]
    fn test_fire_uses_min() {
        let base = small_base();
        let firings = base.fire(&[("a", 0.0), ("b", 7.0)]).unwrap();

        assert_eq!(firings.len(), 1);
        let expected = MembershipFn::left_shoulder(8.0, 1.0).degree(7.0);
        assert!((firings[0].strength - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fire_missing_input() {
        let base = small_base();
        let err = base.fire(&[("a", 0.0)]).unwrap_err();
        assert_eq!(err, InferenceError::MissingInput("b".to_string()));
    }

    #[test]
    fn test_validate_unknown_term() {
        let base = small_base().with_rule(Rule::new(&[("a", "MID")], ("out", "LO")));
        assert_eq!(
            base.validate(),
            Err(InferenceError::UnknownTerm("a".to_string(), "MID".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_output() {
        let base = small_base().with_rule(Rule::new(&[("a", "LO")], ("speed", "LO")));
        assert_eq!(
            base.validate(),
            Err(InferenceError::UnknownVariable("speed".to_string()))
        );
    }
}
