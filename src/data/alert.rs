//! Threshold alerts and the sinks that deliver them.
//!
//! The engine only decides *whether* a sample alerts. Delivery is handed to an
//! [`AlertSink`] after the sample has been committed, so a failing notifier can
//! never undo or block ingestion.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use super::sample::format_temperature;
use super::{Sample, Thresholds};
use crate::error::SinkError;

/// Title used for every high-temperature alert.
pub const ALERT_TITLE: &str = "High temperature";

/// A notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub value: f64,
}

impl Alert {
    pub fn high_temperature(sample: Sample) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: format!(
                "Current temperature is {}°C",
                format_temperature(sample.value())
            ),
            value: sample.value(),
        }
    }
}

/// Decide whether `sample` fires an alert. No debouncing: every qualifying
/// sample alerts.
pub fn evaluate_alert(sample: Sample, thresholds: &Thresholds) -> Option<Alert> {
    thresholds.is_alert(sample).then(|| Alert::high_temperature(sample))
}

/// Consumer of `(title, message)` alerts.
///
/// Delivery is best effort. Coalescing and retries are the sink's business.
pub trait AlertSink: Send + Sync + Debug {
    fn deliver(&self, alert: &Alert) -> Result<(), SinkError>;
}

/// Writes alerts to the log.
#[derive(Debug, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        warn!(title = %alert.title, value = alert.value, "{}", alert.message);
        Ok(())
    }
}

/// Runs an external notifier (e.g. `notify-send`) with title and message
/// appended as the last two arguments.
///
/// The child is not awaited; tokio reaps it in the background. Must be used
/// from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct CommandAlertSink {
    program: String,
    args: Vec<String>,
}

impl CommandAlertSink {
    /// Build from a whitespace-separated command line.
    pub fn parse(command: &str) -> Result<Self, SinkError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(SinkError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl AlertSink for CommandAlertSink {
    fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&alert.title)
            .arg(&alert.message)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| SinkError::Command {
                command: self.program.clone(),
                source,
            })
    }
}

/// Keeps the most recent alerts in memory.
///
/// Cloning shares the same buffer, so one clone can be handed to the
/// ingestion loop while another is read by the UI.
#[derive(Debug, Clone)]
pub struct RecordingAlertSink {
    capacity: usize,
    recent: Arc<Mutex<VecDeque<(Alert, Instant)>>>,
}

impl Default for RecordingAlertSink {
    fn default() -> Self {
        Self::new(32)
    }
}

impl RecordingAlertSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            recent: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// The newest alert and when it was delivered.
    pub fn latest(&self) -> Option<(Alert, Instant)> {
        self.recent.lock().back().cloned()
    }

    /// Recorded alerts, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.recent.lock().iter().map(|(a, _)| a.clone()).collect()
    }

    pub fn clear(&self) {
        self.recent.lock().clear();
    }
}

impl AlertSink for RecordingAlertSink {
    fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        let mut recent = self.recent.lock();
        recent.push_back((alert.clone(), Instant::now()));
        while recent.len() > self.capacity {
            recent.pop_front();
        }
        Ok(())
    }
}

/// Delivers each alert to every inner sink, even when some of them fail.
#[derive(Debug, Default)]
pub struct FanoutAlertSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl FanoutAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AlertSink for FanoutAlertSink {
    fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        let mut failed = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(alert) {
                warn!(error = %e, "alert sink failed");
                failed += 1;
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(SinkError::Partial {
                failed,
                total: self.sinks.len(),
            })
        }
    }
}
