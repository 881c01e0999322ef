//! Type-1 Mamdani inference: min implication, max aggregation, centroid

use super::membership::{FuzzySet, MembershipFn};
use super::rules::RuleBase;
use super::variable::Universe;
use super::{Inference, InferenceError};
use std::collections::HashMap;

/// Centroid of the piecewise-linear curve through the sampled memberships.
///
/// Each segment between neighbouring sample points is a trapezoid (or a
/// triangle when one end is zero) and contributes its own area and moment.
/// `None` when the total area is zero.
pub fn centroid(universe: &Universe, memberships: &[f64]) -> Option<f64> {
    let points: Vec<f64> = universe.iter().collect();
    let mut moment_area = 0.0;
    let mut area = 0.0;

    for (xs, ys) in points.windows(2).zip(memberships.windows(2)) {
        let (x1, x2, y1, y2) = (xs[0], xs[1], ys[0], ys[1]);
        let width = x2 - x1;
        if (y1 == 0.0 && y2 == 0.0) || width == 0.0 {
            continue;
        }

        let (moment, segment) = if y1 == y2 {
            (0.5 * (x1 + x2), width * y1)
        } else {
            let m = (2.0 / 3.0 * width * (y2 + 0.5 * y1)) / (y1 + y2) + x1;
            (m, 0.5 * width * (y1 + y2))
        };
        moment_area += moment * segment;
        area += segment;
    }

    if area > 0.0 {
        Some(moment_area / area)
    } else {
        None
    }
}

impl Inference for RuleBase<MembershipFn> {
    fn evaluate(&self, inputs: &[(&str, f64)]) -> Result<HashMap<String, f64>, InferenceError> {
        let firings = self.fire(inputs)?;
        let mut crisp = HashMap::new();

        for output in self.outputs() {
            let universe = output.universe();
            let mut aggregate = vec![0.0_f64; universe.points];
            let mut has_rules = false;

            for firing in firings.iter().filter(|f| f.output.name() == output.name()) {
                has_rules = true;
                for (mu, x) in aggregate.iter_mut().zip(universe.iter()) {
                    let clipped = firing.strength.min(firing.consequent.degree(x));
                    *mu = mu.max(clipped);
                }
            }

            if !has_rules {
                continue;
            }

            let value = centroid(universe, &aggregate)
                .ok_or_else(|| InferenceError::NoRuleFired(output.name().to_string()))?;
            crisp.insert(output.name().to_string(), value);
        }

        Ok(crisp)
    }
}
