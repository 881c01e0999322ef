//! Timed measurement scenarios replayed through a [`TerminalRegistry`]
//!
//! A scenario is a TOML list of `[[event]]` tables, each tagged by `kind`:
//!
//! ```toml
//! [[event]]
//! kind = "connect"
//! time = 0.0
//! rnti = 1
//! imsi = 1001
//! cell = 1
//!
//! [[event]]
//! kind = "serving"
//! time = 0.12
//! rnti = 1
//! rsrp = 40.0
//! rsrq = 20.0
//! ```

use anyhow::{Context, Result};
use handover_common::{CellId, Imsi, Rnti};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info};

use crate::registry::TerminalRegistry;
use crate::report::{HandoverCommand, MeasurementReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Connection established on `cell`
    Connect {
        time: f64,
        rnti: Rnti,
        imsi: Imsi,
        cell: CellId,
    },
    /// Handover into `cell` finished
    HandoverComplete {
        time: f64,
        rnti: Rnti,
        imsi: Imsi,
        cell: CellId,
    },
    /// Neighbour sample
    Neighbour {
        time: f64,
        rnti: Rnti,
        cell: CellId,
        rsrp: f64,
        rsrq: f64,
    },
    /// Serving sample, triggers an evaluation
    Serving {
        time: f64,
        rnti: Rnti,
        rsrp: f64,
        rsrq: f64,
    },
    /// Raw measurement report routed by its measurement id
    Report {
        time: f64,
        rnti: Rnti,
        report: MeasurementReport,
    },
    Release {
        time: f64,
        rnti: Rnti,
    },
}

impl Event {
    pub fn time(&self) -> f64 {
        match self {
            Event::Connect { time, .. }
            | Event::HandoverComplete { time, .. }
            | Event::Neighbour { time, .. }
            | Event::Serving { time, .. }
            | Event::Report { time, .. }
            | Event::Release { time, .. } => *time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "event")]
    pub events: Vec<Event>,
}

/// A handover command issued during replay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IssuedCommand {
    pub time: f64,
    pub command: HandoverCommand,
}

impl Scenario {
    pub fn load(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading scenario {}", path))?;
        Self::parse(&content).with_context(|| format!("parsing scenario {}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        Ok(scenario)
    }

    /// Events ordered by time; events sharing a timestamp keep file order
    pub fn ordered_events(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        events.sort_by(|a, b| a.time().total_cmp(&b.time()));
        events
    }

    /// Feed every event through `registry` and collect the handover commands
    pub fn replay(&self, registry: &TerminalRegistry) -> Vec<IssuedCommand> {
        let mut issued = Vec::new();

        for event in self.ordered_events() {
            let time = event.time();
            let command = match event {
                Event::Connect {
                    rnti, imsi, cell, ..
                } => {
                    registry.connection_established(time, *imsi, *cell, *rnti);
                    None
                }
                Event::HandoverComplete {
                    rnti, imsi, cell, ..
                } => {
                    registry.handover_completed(time, *imsi, *cell, *rnti);
                    None
                }
                Event::Neighbour {
                    rnti,
                    cell,
                    rsrp,
                    rsrq,
                    ..
                } => {
                    registry.record_candidate_measurement(time, *rnti, *cell, *rsrp, *rsrq);
                    None
                }
                Event::Serving {
                    rnti, rsrp, rsrq, ..
                } => registry
                    .evaluate_handover(time, *rnti, *rsrp, *rsrq)
                    .map(|target| HandoverCommand {
                        rnti: *rnti,
                        target,
                    }),
                Event::Report { rnti, report, .. } => registry.handle_report(time, *rnti, report),
                Event::Release { rnti, .. } => {
                    registry.release(*rnti);
                    None
                }
            };

            if let Some(command) = command {
                debug!(time, command = %command, "handover command issued");
                issued.push(IssuedCommand { time, command });
            }
        }

        info!(
            events = self.events.len(),
            commands = issued.len(),
            "scenario replay finished"
        );
        issued
    }
}
