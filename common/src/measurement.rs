//! Cell identifiers, quality samples and per-cell measurement windows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of most recent samples the trend predictor reads from a window.
pub const DEFAULT_RETENTION: usize = 6;

/// Physical cell identity as carried in measurement results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u16);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell-{}", self.0)
    }
}

/// Radio network temporary identifier, one per attached terminal session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rnti(pub u16);

impl fmt::Display for Rnti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rnti-{}", self.0)
    }
}

/// Subscriber identity. Carried through for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Imsi(pub u64);

/// One (time, RSRP, RSRQ) observation of a cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Simulation time in seconds
    pub time: f64,
    /// Signal strength (RSRP range value)
    pub strength: f64,
    /// Signal quality (RSRQ range value, 0..34)
    pub quality: f64,
}

impl Sample {
    pub fn new(time: f64, strength: f64, quality: f64) -> Self {
        Self {
            time,
            strength,
            quality,
        }
    }
}

/// Append-only, time-ordered samples of one cell.
///
/// Storage is unbounded; readers only look at the tail through
/// [`MeasurementWindow::recent_qualities`].
#[derive(Debug, Clone, Default)]
pub struct MeasurementWindow {
    samples: Vec<Sample>,
}

impl MeasurementWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Quality values of the `retention` most recent samples, oldest first
    pub fn recent_qualities(&self, retention: usize) -> Vec<f64> {
        let start = self.samples.len().saturating_sub(retention);
        self.samples[start..].iter().map(|s| s.quality).collect()
    }
}
