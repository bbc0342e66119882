//! `groundwork.toml` loading.
//!
//! Every field has a default, so a missing file or an empty one is a valid
//! configuration. Command-line flags are applied on top by `main`.

use std::path::Path;

use anyhow::Context;
use pipeline::{IterationBudget, PipelineError};
use serde::Deserialize;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "groundwork.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundworkConfig {
    pub pipeline: PipelineSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Iteration budget of the refinement loop.
    pub max_search_iterations: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_search_iterations: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySettings {
    pub log_format: LogFormat,
    /// OTLP/gRPC collector endpoint; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
            service_name: "groundwork".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl GroundworkConfig {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn iteration_budget(&self) -> Result<IterationBudget, PipelineError> {
        IterationBudget::new(self.pipeline.max_search_iterations).ok_or_else(|| {
            PipelineError::configuration("pipeline.max_search_iterations must be at least 1")
        })
    }
}
