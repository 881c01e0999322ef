//! Interval type-2 Mamdani inference with center-of-sets type reduction
//!
//! Each rule contributes its firing interval and the centroid interval of its
//! consequent set. The Karnik–Mendel procedure reduces those to a single
//! interval `[y_l, y_r]`; the crisp output is its midpoint.

use super::membership::{FuzzySet, Interval, IntervalMembershipFn};
use super::rules::RuleBase;
use super::variable::Universe;
use super::{Inference, InferenceError};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Left,
    Right,
}

/// Extreme weighted average of `points` when every weight may take any value
/// inside its interval.
///
/// `Left` returns the minimum, `Right` the maximum. The optimum always sits at
/// a switch point where weights flip between their bounds, so every switch
/// point is scanned with running sums. `None` if all weights are zero.
pub fn karnik_mendel(mut points: Vec<(f64, Interval)>, endpoint: Endpoint) -> Option<f64> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Points left of the switch take `head` weights, the rest `tail` weights
    let weight = |w: &Interval, head: bool| match (endpoint, head) {
        (Endpoint::Left, true) | (Endpoint::Right, false) => w.upper,
        _ => w.lower,
    };

    let mut num: f64 = points.iter().map(|(x, w)| x * weight(w, false)).sum();
    let mut den: f64 = points.iter().map(|(_, w)| weight(w, false)).sum();
    let mut best: Option<f64> = None;

    let mut consider = |num: f64, den: f64| {
        if den <= 0.0 {
            return;
        }
        let y = num / den;
        best = Some(match (best, endpoint) {
            (None, _) => y,
            (Some(b), Endpoint::Left) => b.min(y),
            (Some(b), Endpoint::Right) => b.max(y),
        });
    };

    consider(num, den);
    for (x, w) in &points {
        let delta = weight(w, true) - weight(w, false);
        num += x * delta;
        den += delta;
        consider(num, den);
    }

    best
}

/// Centroid interval of an interval type-2 set sampled over `universe`
pub fn interval_centroid(universe: &Universe, set: &IntervalMembershipFn) -> Option<Interval> {
    let points: Vec<(f64, Interval)> = universe.iter().map(|x| (x, set.degree(x))).collect();
    let left = karnik_mendel(points.clone(), Endpoint::Left)?;
    let right = karnik_mendel(points, Endpoint::Right)?;
    Some(Interval::new(left, right))
}

/// Type-reduce `(consequent centroid, firing strength)` pairs to `[y_l, y_r]`
pub fn center_of_sets(rules: &[(Interval, Interval)]) -> Option<Interval> {
    let left = karnik_mendel(
        rules.iter().map(|(c, f)| (c.lower, *f)).collect(),
        Endpoint::Left,
    )?;
    let right = karnik_mendel(
        rules.iter().map(|(c, f)| (c.upper, *f)).collect(),
        Endpoint::Right,
    )?;
    Some(Interval::new(left, right))
}

impl Inference for RuleBase<IntervalMembershipFn> {
    fn evaluate(&self, inputs: &[(&str, f64)]) -> Result<HashMap<String, f64>, InferenceError> {
        let firings = self.fire(inputs)?;
        let mut crisp = HashMap::new();

        for output in self.outputs() {
            let no_fire = || InferenceError::NoRuleFired(output.name().to_string());
            let mut weighted = Vec::new();

            for firing in firings.iter().filter(|f| f.output.name() == output.name()) {
                let centroid =
                    interval_centroid(output.universe(), firing.consequent).ok_or_else(no_fire)?;
                weighted.push((centroid, firing.strength));
            }

            if weighted.is_empty() {
                continue;
            }

            let reduced = center_of_sets(&weighted).ok_or_else(no_fire)?;
            crisp.insert(output.name().to_string(), reduced.midpoint());
        }

        Ok(crisp)
    }
}
