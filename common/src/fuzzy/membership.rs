//! Membership functions for type-1 and interval type-2 fuzzy sets

use super::variable::Universe;
use serde::{Deserialize, Serialize};

/// Shape of a Gaussian-family membership function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Saturates at full height below the centre, Gaussian taper above
    RightShoulder,
    /// Plain Gaussian bump around the centre
    Gaussian,
    /// Saturates at full height above the centre, Gaussian taper below
    LeftShoulder,
}

/// `height · exp(−(x − centre)² / 2σ²)`
#[inline]
pub fn gaussian(x: f64, centre: f64, sigma: f64, height: f64) -> f64 {
    let d = x - centre;
    height * (-(d * d) / (2.0 * sigma * sigma)).exp()
}

/// Anything that assigns a membership degree to a crisp point.
///
/// Type-1 sets return a scalar, interval type-2 sets an [`Interval`].
pub trait FuzzySet {
    type Degree: Copy + std::fmt::Debug;

    fn degree(&self, x: f64) -> Self::Degree;

    /// Degree of a crisp input as the set is seen on `universe`.
    ///
    /// Defaults to the exact degree.
    fn sampled_degree(&self, _universe: &Universe, x: f64) -> Self::Degree {
        self.degree(x)
    }
}

/// Builds a set from the calibration tuple shared by both set families.
///
/// `spread` is the uncertainty in sigma; type-1 sets ignore it.
pub trait FromCalibration: FuzzySet + Sized {
    fn from_calibration(shape: Shape, centre: f64, sigma: f64, spread: f64) -> Self;
}

/// Ordinary (type-1) Gaussian-family membership function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembershipFn {
    pub shape: Shape,
    pub centre: f64,
    pub sigma: f64,
    pub height: f64,
}

impl MembershipFn {
    pub const fn new(shape: Shape, centre: f64, sigma: f64) -> Self {
        Self {
            shape,
            centre,
            sigma,
            height: 1.0,
        }
    }

    pub const fn right_shoulder(centre: f64, sigma: f64) -> Self {
        Self::new(Shape::RightShoulder, centre, sigma)
    }

    pub const fn left_shoulder(centre: f64, sigma: f64) -> Self {
        Self::new(Shape::LeftShoulder, centre, sigma)
    }

    pub const fn gaussian(centre: f64, sigma: f64) -> Self {
        Self::new(Shape::Gaussian, centre, sigma)
    }
}

impl FuzzySet for MembershipFn {
    type Degree = f64;

    fn degree(&self, x: f64) -> f64 {
        match self.shape {
            Shape::RightShoulder if x < self.centre => self.height,
            Shape::LeftShoulder if x > self.centre => self.height,
            _ => gaussian(x, self.centre, self.sigma, self.height),
        }
    }

    /// Linear interpolation between the two universe points around `x`
    fn sampled_degree(&self, universe: &Universe, x: f64) -> f64 {
        let step = universe.step();
        if step <= 0.0 {
            return self.degree(x);
        }

        let last = universe.points - 1;
        let pos = ((x - universe.start) / step).clamp(0.0, last as f64);
        let i = (pos.floor() as usize).min(last - 1);
        let (x0, x1) = (universe.point(i), universe.point(i + 1));
        let (y0, y1) = (self.degree(x0), self.degree(x1));
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

impl FromCalibration for MembershipFn {
    fn from_calibration(shape: Shape, centre: f64, sigma: f64, _spread: f64) -> Self {
        Self::new(shape, centre, sigma)
    }
}

/// Closed sub-interval of [0, 1] holding a type-2 membership degree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub const ZERO: Interval = Interval {
        lower: 0.0,
        upper: 0.0,
    };
    pub const ONE: Interval = Interval {
        lower: 1.0,
        upper: 1.0,
    };

    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Endpoint-wise minimum (the interval min t-norm)
    pub fn min(self, other: Interval) -> Interval {
        Interval {
            lower: self.lower.min(other.lower),
            upper: self.upper.min(other.upper),
        }
    }

    /// Endpoint-wise maximum (the interval max s-norm)
    pub fn max(self, other: Interval) -> Interval {
        Interval {
            lower: self.lower.max(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

/// Interval type-2 Gaussian-family set with uncertain standard deviation.
///
/// The upper membership function uses `σ + spread/2` and the lower one
/// `σ − spread/2`, so the footprint of uncertainty widens with `spread`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalMembershipFn {
    pub shape: Shape,
    pub centre: f64,
    pub sigma: f64,
    pub spread: f64,
    pub height: f64,
}

impl IntervalMembershipFn {
    pub const fn new(shape: Shape, centre: f64, sigma: f64, spread: f64) -> Self {
        Self {
            shape,
            centre,
            sigma,
            spread,
            height: 1.0,
        }
    }

    pub fn upper_fn(&self) -> MembershipFn {
        MembershipFn {
            shape: self.shape,
            centre: self.centre,
            sigma: self.sigma + self.spread / 2.0,
            height: self.height,
        }
    }

    pub fn lower_fn(&self) -> MembershipFn {
        MembershipFn {
            shape: self.shape,
            centre: self.centre,
            sigma: self.sigma - self.spread / 2.0,
            height: self.height,
        }
    }
}

impl FuzzySet for IntervalMembershipFn {
    type Degree = Interval;

    fn degree(&self, x: f64) -> Interval {
        Interval {
            lower: self.lower_fn().degree(x),
            upper: self.upper_fn().degree(x),
        }
    }
}

impl FromCalibration for IntervalMembershipFn {
    fn from_calibration(shape: Shape, centre: f64, sigma: f64, spread: f64) -> Self {
        Self::new(shape, centre, sigma, spread)
    }
}
