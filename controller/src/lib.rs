pub mod config;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod scenario;

pub use config::Config;
pub use metrics::{ControllerMetrics, ControllerStats};
pub use registry::{SharedEvaluator, TerminalRegistry};
pub use report::{
    HandoverCommand, MeasurementReport, NeighbourResult, ReportConfig, ReportEvent, ReportKind,
    ReportRequest,
};
pub use scenario::{Event, IssuedCommand, Scenario};
