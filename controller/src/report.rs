//! Measurement reports exchanged with the radio side

use handover_common::{CellId, Rnti};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event that makes a terminal emit a measurement report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportEvent {
    /// Serving cell quality drops below the threshold
    A2,
    /// A neighbour's quality rises above the threshold
    A4,
}

/// One report configuration requested from every attached terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub meas_id: u8,
    pub event: ReportEvent,
    /// RSRQ range value
    pub rsrq_threshold: u8,
    pub interval_ms: u64,
}

/// Which handler an incoming report is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Serving,
    Neighbour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    pub serving_report_id: u8,
    pub neighbour_report_id: u8,
    pub serving_threshold: u8,
    pub neighbour_threshold: u8,
    pub interval_ms: u64,
}

impl ReportConfig {
    /// The A2 and A4 configurations, both periodic on RSRQ
    pub fn requests(&self) -> [ReportRequest; 2] {
        [
            ReportRequest {
                meas_id: self.serving_report_id,
                event: ReportEvent::A2,
                rsrq_threshold: self.serving_threshold,
                interval_ms: self.interval_ms,
            },
            ReportRequest {
                meas_id: self.neighbour_report_id,
                event: ReportEvent::A4,
                rsrq_threshold: self.neighbour_threshold,
                interval_ms: self.interval_ms,
            },
        ]
    }

    pub fn classify(&self, meas_id: u8) -> Option<ReportKind> {
        if meas_id == self.serving_report_id {
            Some(ReportKind::Serving)
        } else if meas_id == self.neighbour_report_id {
            Some(ReportKind::Neighbour)
        } else {
            None
        }
    }
}

/// A neighbour entry of a report. Either quantity may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighbourResult {
    pub cell: CellId,
    #[serde(default)]
    pub rsrp: Option<f64>,
    #[serde(default)]
    pub rsrq: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub meas_id: u8,
    pub serving_rsrp: f64,
    pub serving_rsrq: f64,
    /// `None` when the report carries no neighbour list at all
    #[serde(default)]
    pub neighbours: Option<Vec<NeighbourResult>>,
}

/// Instruction to move a terminal to another cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoverCommand {
    pub rnti: Rnti,
    pub target: CellId,
}

impl fmt::Display for HandoverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.rnti, self.target)
    }
}
