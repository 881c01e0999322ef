use anyhow::{Context, Result};
use handover_common::{OrchestratorConfig, ThresholdComparison, TriggerPolicy, Variant};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::report::ReportConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_variant")]
    pub variant: Variant,

    /// Overrides the variant's staleness window (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staleness_window_secs: Option<f64>,
    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f64,
    /// Overrides the variant's comparison at the threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_comparison: Option<ThresholdComparison>,
    #[serde(default = "default_retention")]
    pub retention: usize,
    /// Fixed predictor seed for reproducible replays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_seed: Option<u64>,

    // Measurement report configuration
    #[serde(default = "default_serving_report_id")]
    pub serving_report_id: u8,
    #[serde(default = "default_neighbour_report_id")]
    pub neighbour_report_id: u8,
    #[serde(default = "default_serving_cell_threshold")]
    pub serving_cell_threshold: u8,
    #[serde(default)]
    pub neighbour_report_threshold: u8,
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

fn default_variant() -> Variant {
    Variant::Type2
}

fn default_trigger_threshold() -> f64 {
    handover_common::DEFAULT_TRIGGER_THRESHOLD
}

fn default_retention() -> usize {
    handover_common::DEFAULT_RETENTION
}

fn default_serving_report_id() -> u8 {
    1
}

fn default_neighbour_report_id() -> u8 {
    2
}

fn default_serving_cell_threshold() -> u8 {
    34
}

fn default_report_interval_ms() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            staleness_window_secs: None,
            trigger_threshold: default_trigger_threshold(),
            threshold_comparison: None,
            retention: default_retention(),
            predictor_seed: None,
            serving_report_id: default_serving_report_id(),
            neighbour_report_id: default_neighbour_report_id(),
            serving_cell_threshold: default_serving_cell_threshold(),
            neighbour_report_threshold: 0,
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.trigger_threshold) {
            anyhow::bail!("trigger_threshold must lie in [0, 1], got {}", self.trigger_threshold);
        }
        if let Some(window) = self.staleness_window_secs {
            if window.is_nan() || window <= 0.0 {
                anyhow::bail!("staleness_window_secs must be positive, got {}", window);
            }
        }
        if self.retention == 0 {
            anyhow::bail!("retention must be at least 1");
        }
        if self.serving_report_id == self.neighbour_report_id {
            anyhow::bail!(
                "serving and neighbour reports share measurement id {}",
                self.serving_report_id
            );
        }
        Ok(())
    }

    /// Orchestrator calibration with overrides applied over variant defaults
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let defaults = OrchestratorConfig::for_variant(self.variant);
        OrchestratorConfig {
            staleness_window: self
                .staleness_window_secs
                .unwrap_or(defaults.staleness_window),
            retention: self.retention,
            policy: TriggerPolicy {
                threshold: self.trigger_threshold,
                comparison: self
                    .threshold_comparison
                    .unwrap_or(defaults.policy.comparison),
            },
            seed: self.predictor_seed,
        }
    }

    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            serving_report_id: self.serving_report_id,
            neighbour_report_id: self.neighbour_report_id,
            serving_threshold: self.serving_cell_threshold,
            neighbour_threshold: self.neighbour_report_threshold,
            interval_ms: self.report_interval_ms,
        }
    }
}
