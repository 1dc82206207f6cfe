//! Layered settings: built-in defaults, an optional TOML file, then
//! `THERMOWATCH_*` environment variables. Command-line flags are applied on
//! top by the binary.
//!
//! ```toml
//! [serial]
//! port = "/dev/rfcomm0"
//! baud_rate = 9600
//!
//! [thresholds]
//! high = 35.0
//! low = 25.0
//!
//! [ticks]
//! ingest = "1s"
//! render = "1s"
//!
//! [series]
//! retention = 3600
//! samples_per_unit = 10.0
//! time_axis_label = "Time (minutes)"
//!
//! [alert]
//! command = "notify-send -u critical"
//! ```
//!
//! Environment variables use `__` between nesting levels, e.g.
//! `THERMOWATCH_SERIAL__PORT=/dev/ttyUSB0`.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::duration::parse_period;
use crate::data::{EngineConfig, Thresholds, TimeAxis};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub serial: SerialSettings,
    pub thresholds: Thresholds,
    pub ticks: TickSettings,
    pub series: SeriesSettings,
    pub alert: AlertSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/rfcomm0".to_string(),
            baud_rate: 9600,
        }
    }
}

/// Tick periods as duration strings ("1s", "500ms").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSettings {
    pub ingest: String,
    pub render: String,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            ingest: "1s".to_string(),
            render: "1s".to_string(),
        }
    }
}

impl TickSettings {
    pub fn ingest_period(&self) -> Result<Duration> {
        parse_period(&self.ingest).context("invalid ticks.ingest")
    }

    pub fn render_period(&self) -> Result<Duration> {
        parse_period(&self.render).context("invalid ticks.render")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSettings {
    /// Samples kept for the chart; unset keeps everything.
    pub retention: Option<usize>,
    pub samples_per_unit: f64,
    pub time_axis_label: String,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        let axis = TimeAxis::default();
        Self {
            retention: None,
            samples_per_unit: axis.samples_per_unit,
            time_axis_label: axis.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// External notifier; receives title and message as its last two arguments.
    pub command: Option<String>,
}

impl Settings {
    /// Load defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("THERMOWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.thresholds.high.is_finite() || !self.thresholds.low.is_finite() {
            bail!("thresholds must be finite numbers");
        }
        if !(self.series.samples_per_unit.is_finite() && self.series.samples_per_unit > 0.0) {
            bail!(
                "series.samples_per_unit must be positive, got {}",
                self.series.samples_per_unit
            );
        }
        if self.serial.baud_rate == 0 {
            bail!("serial.baud_rate must be positive");
        }
        self.ticks.ingest_period()?;
        self.ticks.render_period()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            thresholds: self.thresholds,
            axis: TimeAxis {
                samples_per_unit: self.series.samples_per_unit,
                label: self.series.time_axis_label.clone(),
            },
            retention: self.series.retention.filter(|&n| n > 0),
        }
    }
}
