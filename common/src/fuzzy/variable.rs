//! Universes of discourse and linguistic variables

use super::membership::FuzzySet;

/// Evenly spaced sample points over `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Universe {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl Universe {
    pub const fn new(start: f64, end: f64, points: usize) -> Self {
        Self { start, end, points }
    }

    pub fn step(&self) -> f64 {
        if self.points < 2 {
            0.0
        } else {
            (self.end - self.start) / (self.points - 1) as f64
        }
    }

    /// The `i`-th sample point
    pub fn point(&self, i: usize) -> f64 {
        self.start + self.step() * i as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.points).map(move |i| self.point(i))
    }

    /// Pin `x` to the universe edges
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.start, self.end)
    }

    pub fn contains(&self, x: f64) -> bool {
        self.start <= x && x <= self.end
    }
}

/// A named universe with labelled fuzzy partitions
#[derive(Debug, Clone)]
pub struct LinguisticVariable<M> {
    name: String,
    universe: Universe,
    terms: Vec<(String, M)>,
}

impl<M: FuzzySet> LinguisticVariable<M> {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: Vec::new(),
        }
    }

    /// Add or replace the set for `label`
    pub fn with_term(mut self, label: impl Into<String>, set: M) -> Self {
        let label = label.into();
        match self.terms.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = set,
            None => self.terms.push((label, set)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn term(&self, label: &str) -> Option<&M> {
        self.terms.iter().find(|(l, _)| l == label).map(|(_, m)| m)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(l, _)| l.as_str())
    }

    /// Degree of `label` at `x`, with `x` clamped into the universe first.
    ///
    /// Type-1 sets interpolate between universe points, interval sets are
    /// evaluated exactly.
    pub fn fuzzify(&self, label: &str, x: f64) -> Option<M::Degree> {
        let x = self.universe.clamp(x);
        self.term(label)
            .map(|m| m.sampled_degree(&self.universe, x))
    }
}
