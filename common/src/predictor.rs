//! Short-horizon RSRQ trend prediction
//!
//! Fits a low-degree Chebyshev series to the most recent quality samples of a
//! cell and extrapolates one report interval ahead. The fit minimises the
//! Euclidean residual norm with a Nelder–Mead simplex search started from a
//! random coefficient vector, so two predictions on the same series agree only
//! up to solver tolerance.

use crate::measurement::DEFAULT_RETENTION;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which side of the handover decision a series belongs to.
///
/// The serving predictor nudges a lone sample up by one range step; the
/// neighbour predictor returns it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRole {
    Serving,
    Neighbour,
}

/// Evaluate a Chebyshev series `Σ c_k T_k(x)` with Clenshaw's recurrence
pub fn chebyshev_eval(coeffs: &[f64], x: f64) -> f64 {
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for &c in coeffs.iter().skip(1).rev() {
        let b0 = c + 2.0 * x * b1 - b2;
        b2 = b1;
        b1 = b0;
    }
    coeffs.first().copied().unwrap_or(0.0) + x * b1 - b2
}

/// `‖T(c)(t) − series‖₂` over time indices `t = 0..len`
pub fn residual_norm(coeffs: &[f64], series: &[f64]) -> f64 {
    series
        .iter()
        .enumerate()
        .map(|(t, &y)| {
            let e = chebyshev_eval(coeffs, t as f64) - y;
            e * e
        })
        .sum::<f64>()
        .sqrt()
}

/// Result of a simplex search
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Derivative-free Nelder–Mead simplex minimiser
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    pub max_iterations: usize,
    /// Simplex diameter (max-norm) at which the search stops
    pub x_tolerance: f64,
    /// Spread of objective values at which the search stops
    pub f_tolerance: f64,
    /// Edge length of the initial simplex along each axis
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            x_tolerance: 1e-8,
            f_tolerance: 1e-10,
            initial_step: 1.0,
        }
    }
}

impl NelderMead {
    /// Minimise `objective` from `start`.
    ///
    /// Never fails: when the iteration budget runs out the best vertex found
    /// so far is returned with `converged == false`.
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = start.len();
        if n == 0 {
            return Minimum {
                point: Vec::new(),
                value: objective(start),
                iterations: 0,
                converged: true,
            };
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), objective(start)));
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += self.initial_step;
            let value = objective(&vertex);
            simplex.push((vertex, value));
        }

        let mut iterations = 0;
        let mut converged = false;

        loop {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            if self.has_converged(&simplex) {
                converged = true;
                break;
            }
            if iterations >= self.max_iterations {
                break;
            }
            iterations += 1;

            let centroid = centroid(&simplex[..n]);
            let (worst, f_worst) = simplex[n].clone();
            let f_best = simplex[0].1;
            let f_second_worst = simplex[n - 1].1;

            let reflected = affine(&centroid, &worst, -1.0);
            let f_reflected = objective(&reflected);

            if f_reflected < f_best {
                let expanded = affine(&centroid, &worst, -2.0);
                let f_expanded = objective(&expanded);
                simplex[n] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }

            if f_reflected < f_second_worst {
                simplex[n] = (reflected, f_reflected);
                continue;
            }

            if f_reflected < f_worst {
                let outside = affine(&centroid, &worst, -0.5);
                let f_outside = objective(&outside);
                if f_outside <= f_reflected {
                    simplex[n] = (outside, f_outside);
                    continue;
                }
            } else {
                let inside = affine(&centroid, &worst, 0.5);
                let f_inside = objective(&inside);
                if f_inside < f_worst {
                    simplex[n] = (inside, f_inside);
                    continue;
                }
            }

            // Shrink towards the best vertex
            let best = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                vertex.0 = affine(&best, &vertex.0, 0.5);
                vertex.1 = objective(&vertex.0);
            }
        }

        let (point, value) = simplex.swap_remove(0);
        Minimum {
            point,
            value,
            iterations,
            converged,
        }
    }

    fn has_converged(&self, sorted: &[(Vec<f64>, f64)]) -> bool {
        let (best, f_best) = &sorted[0];
        sorted[1..].iter().all(|(vertex, value)| {
            (value - f_best).abs() <= self.f_tolerance
                && vertex
                    .iter()
                    .zip(best)
                    .all(|(a, b)| (a - b).abs() <= self.x_tolerance)
        })
    }
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let dim = vertices[0].0.len();
    let mut c = vec![0.0; dim];
    for (vertex, _) in vertices {
        for (acc, x) in c.iter_mut().zip(vertex) {
            *acc += x;
        }
    }
    let k = vertices.len() as f64;
    c.iter_mut().for_each(|x| *x /= k);
    c
}

/// `a + t (b − a)`
fn affine(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(a, b)| a + t * (b - a)).collect()
}

/// Fit Chebyshev coefficients of `seed.len() - 1` degree to `series`.
///
/// The search is restarted once from its own optimum with a smaller simplex,
/// which recovers from the occasional collapsed simplex on the degree-2 fit.
pub fn fit_chebyshev(solver: &NelderMead, series: &[f64], seed: &[f64]) -> Minimum {
    let objective = |c: &[f64]| residual_norm(c, series);
    let first = solver.minimize(objective, seed);

    let refine = NelderMead {
        initial_step: solver.initial_step * 0.1,
        ..*solver
    };
    let second = refine.minimize(objective, &first.point);

    if second.value <= first.value {
        Minimum {
            iterations: first.iterations + second.iterations,
            ..second
        }
    } else {
        first
    }
}

/// One-step-ahead quality predictor for a single cell role
#[derive(Debug, Clone)]
pub struct TrendPredictor {
    role: CellRole,
    retention: usize,
    solver: NelderMead,
    rng: StdRng,
}

impl TrendPredictor {
    /// Predictor seeded from OS entropy
    pub fn new(role: CellRole) -> Self {
        Self::with_rng(role, StdRng::from_entropy())
    }

    /// Reproducible predictor for replays and tests
    pub fn with_seed(role: CellRole, seed: u64) -> Self {
        Self::with_rng(role, StdRng::seed_from_u64(seed))
    }

    fn with_rng(role: CellRole, rng: StdRng) -> Self {
        Self {
            role,
            retention: DEFAULT_RETENTION,
            solver: NelderMead::default(),
            rng,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn with_solver(mut self, solver: NelderMead) -> Self {
        self.solver = solver;
        self
    }

    pub fn role(&self) -> CellRole {
        self.role
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Extrapolate the quality one step past the last sample of `series`.
    ///
    /// Only the `retention` most recent values are used. The fit degree
    /// follows the number of samples: one sample is returned in closed form
    /// (plus one for the serving role), two or three get a line, four or more
    /// a quadratic. An empty series predicts 0.
    pub fn predict(&mut self, series: &[f64]) -> f64 {
        let start = series.len().saturating_sub(self.retention);
        let recent = &series[start..];

        let degree = match recent.len() {
            0 => return 0.0,
            1 => return self.single_sample(recent[0]),
            2 | 3 => 1,
            _ => 2,
        };

        let seed: Vec<f64> = (0..=degree)
            .map(|_| self.rng.gen_range(-0.5..0.5))
            .collect();
        let fit = fit_chebyshev(&self.solver, recent, &seed);
        if !fit.converged {
            debug!(
                role = ?self.role,
                iterations = fit.iterations,
                residual = fit.value,
                "trend fit hit iteration limit, using best vertex"
            );
        }

        chebyshev_eval(&fit.point, recent.len() as f64)
    }

    fn single_sample(&self, value: f64) -> f64 {
        match self.role {
            CellRole::Serving => value + 1.0,
            CellRole::Neighbour => value,
        }
    }
}
