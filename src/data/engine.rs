//! The ingestion engine.
//!
//! [`Engine`] is the single owner of all mutable telemetry state: running
//! statistics, the time series and the display labels. Every sample updates
//! all of them in one call, and [`SharedEngine`] puts the whole engine behind
//! one lock so that a reader can never observe a half-applied sample or a
//! half-finished reset.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::alert::{evaluate_alert, Alert};
use super::sample::{format_temperature, parse_line};
use super::series::{SeriesPoint, TimeAxis, TimeSeries};
use super::{RunningStats, Sample, Thresholds};
use crate::error::ParseError;

/// Static engine parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub axis: TimeAxis,
    /// Maximum number of samples kept in the series. `None` keeps everything.
    pub retention: Option<usize>,
}

/// The three text values shown next to the chart.
///
/// `current` changes with every sample; `max` and `min` only when a new
/// extreme is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub current: Option<String>,
    pub max: Option<String>,
    pub min: Option<String>,
}

/// What a successfully ingested sample changed.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub sample: Sample,
    pub new_max: bool,
    pub new_min: bool,
    /// Alert to deliver once the engine lock has been released.
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    config: EngineConfig,
    stats: RunningStats,
    series: TimeSeries,
    labels: Labels,
    rejected: u64,
    alerts_raised: u64,
    source_error: Option<String>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let series = TimeSeries::new(config.retention);
        Self {
            config,
            stats: RunningStats::new(),
            series,
            labels: Labels::default(),
            rejected: 0,
            alerts_raised: 0,
            source_error: None,
        }
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Lines dropped as malformed since the last reset.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source_error.as_deref()
    }

    pub fn set_source_error(&mut self, error: Option<String>) {
        self.source_error = error;
    }

    /// Parse one raw line and, if it is a valid reading, ingest it.
    ///
    /// A malformed line is counted and otherwise leaves the engine untouched.
    pub fn ingest_line(&mut self, line: &[u8]) -> Result<IngestOutcome, ParseError> {
        match parse_line(line) {
            Ok(sample) => Ok(self.ingest(sample)),
            Err(e) => {
                self.rejected += 1;
                Err(e)
            }
        }
    }

    /// Apply one sample: append, update extremes and labels, evaluate the alert.
    pub fn ingest(&mut self, sample: Sample) -> IngestOutcome {
        self.series.push(sample);
        self.labels.current = Some(format!(
            "Current temperature: {}°C",
            format_temperature(sample.value())
        ));

        let new_max = self.stats.update_max(sample);
        if new_max {
            self.labels.max = Some(format!(
                "Maximum temperature: {}°C",
                format_temperature(self.stats.max())
            ));
        }

        let new_min = self.stats.update_min(sample);
        if new_min {
            self.labels.min = Some(format!(
                "Minimum temperature: {}°C",
                format_temperature(self.stats.min())
            ));
        }

        let alert = evaluate_alert(sample, &self.config.thresholds);
        if alert.is_some() {
            self.alerts_raised += 1;
        }

        IngestOutcome {
            sample,
            new_max,
            new_min,
            alert,
        }
    }

    /// Clear series, extremes, labels and counters.
    ///
    /// The result equals a freshly created engine with the same config. The
    /// source error is kept: it describes the device, not the data.
    pub fn reset(&mut self) {
        self.series.clear();
        self.stats.reset();
        self.labels = Labels::default();
        self.rejected = 0;
        self.alerts_raised = 0;
    }

    /// Copy out everything the presentation side needs.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            labels: self.labels.clone(),
            current: self.series.last().map(Sample::value),
            max: self.stats.observed_max(),
            min: self.stats.observed_min(),
            len: self.series.len(),
            total_arrived: self.series.total_arrived(),
            rejected: self.rejected,
            alerts_raised: self.alerts_raised,
            thresholds: self.config.thresholds,
            axis: self.config.axis.clone(),
            source_error: self.source_error.clone(),
            points: self.series.points(&self.config.thresholds, &self.config.axis),
        }
    }
}

/// A consistent, owned view of the engine at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub labels: Labels,
    pub current: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    /// Samples currently retained.
    pub len: usize,
    /// Samples accepted since the last reset, including evicted ones.
    pub total_arrived: u64,
    pub rejected: u64,
    pub alerts_raised: u64,
    pub thresholds: Thresholds,
    pub axis: TimeAxis,
    pub source_error: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Engine::new(EngineConfig::default()).snapshot()
    }
}

/// Cloneable handle to one engine behind a mutex.
///
/// The ingestion loop, the reset control and the presentation tick each hold
/// a clone. Every method takes the lock exactly once.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_engine(Engine::new(config))
    }

    pub fn from_engine(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn ingest_line(&self, line: &[u8]) -> Result<IngestOutcome, ParseError> {
        self.inner.lock().ingest_line(line)
    }

    pub fn ingest(&self, sample: Sample) -> IngestOutcome {
        self.inner.lock().ingest(sample)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn set_source_error(&self, error: Option<String>) {
        self.inner.lock().set_source_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(engine: &mut Engine, lines: &[&str]) -> Vec<Result<IngestOutcome, ParseError>> {
        lines.iter().map(|l| engine.ingest_line(l.as_bytes())).collect()
    }

    #[test]
    fn test_aggregates_match_sequence() {
        let mut engine = Engine::new(EngineConfig::default());
        let values = [22.5, 19.0, 27.25, 31.0, 18.5, 24.0];
        for v in values {
            engine.ingest_line(v.to_string().as_bytes()).unwrap();
        }
        assert_eq!(engine.stats().max(), 31.0);
        assert_eq!(engine.stats().min(), 18.5);
        assert_eq!(engine.series().len(), values.len());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut engine = Engine::new(EngineConfig::default());
        let results = feed(&mut engine, &["21.0", "garbage", "22.0\r", "", "nan", "23.5"]);

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
        assert_eq!(engine.series().len(), 3);
        assert_eq!(engine.rejected(), 3);
        assert_eq!(engine.stats().max(), 23.5);
        assert_eq!(engine.stats().min(), 21.0);
    }

    #[test]
    fn test_rejected_line_leaves_state_untouched() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.ingest_line(b"30").unwrap();
        let before = engine.snapshot();
        assert!(engine.ingest_line(b"99x").is_err());
        let after = engine.snapshot();
        assert_eq!(before.points, after.points);
        assert_eq!(before.labels, after.labels);
        assert_eq!(before.max, after.max);
        assert_eq!(before.min, after.min);
    }

    #[test]
    fn test_alerts_for_boundary_sequence() {
        let mut engine = Engine::new(EngineConfig::default());
        let alerted: Vec<f64> = feed(&mut engine, &["20", "35", "36", "34.9"])
            .into_iter()
            .filter_map(|r| r.unwrap().alert)
            .map(|a| a.value)
            .collect();
        assert_eq!(alerted, vec![35.0, 36.0]);
        assert_eq!(engine.alerts_raised(), 2);
    }

    #[test]
    fn test_sustained_high_reading_realerts() {
        let mut engine = Engine::new(EngineConfig::default());
        let count = feed(&mut engine, &["36", "36", "36"])
            .into_iter()
            .filter(|r| r.as_ref().unwrap().alert.is_some())
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_label_events() {
        let mut engine = Engine::new(EngineConfig::default());
        let first = engine.ingest_line(b"25").unwrap();
        assert!(first.new_max && first.new_min);

        let tie = engine.ingest_line(b"25").unwrap();
        assert!(!tie.new_max && !tie.new_min);

        let higher = engine.ingest_line(b"28.5").unwrap();
        assert!(higher.new_max && !higher.new_min);

        let labels = engine.labels();
        assert_eq!(labels.current.as_deref(), Some("Current temperature: 28.5°C"));
        assert_eq!(labels.max.as_deref(), Some("Maximum temperature: 28.5°C"));
        assert_eq!(labels.min.as_deref(), Some("Minimum temperature: 25.0°C"));
    }

    #[test]
    fn test_reset_matches_fresh_engine() {
        let config = EngineConfig::default();
        let fresh = Engine::new(config.clone());

        let mut engine = Engine::new(config);
        feed(&mut engine, &["20", "bad", "40", "30"]);
        engine.reset();

        assert_eq!(engine, fresh);
        assert_eq!(engine.stats().max(), f64::NEG_INFINITY);
        assert_eq!(engine.stats().min(), f64::INFINITY);
        assert_eq!(engine.snapshot(), fresh.snapshot());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.reset();
        let once = engine.clone();
        engine.reset();
        assert_eq!(engine, once);
        assert_eq!(engine, Engine::new(EngineConfig::default()));
    }

    #[test]
    fn test_reset_keeps_source_error() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.set_source_error(Some("connection closed".to_string()));
        engine.reset();
        assert_eq!(engine.source_error(), Some("connection closed"));
    }

    #[test]
    fn test_retained_samples_within_extremes() {
        let mut engine = Engine::new(EngineConfig {
            retention: Some(4),
            ..EngineConfig::default()
        });
        for v in [50.0, 10.0, 22.0, 23.0, 24.0, 25.0, 26.0] {
            engine.ingest(Sample::new(v).unwrap());
        }
        let snap = engine.snapshot();
        assert_eq!(snap.len, 4);
        assert_eq!(snap.total_arrived, 7);
        assert_eq!(snap.max, Some(50.0));
        assert_eq!(snap.min, Some(10.0));
        assert!(snap.points.iter().all(|p| p.value <= 50.0 && p.value >= 10.0));
        assert_eq!(snap.points[0].index, 3);
    }

    #[test]
    fn test_snapshot_serializes_without_sentinels() {
        let snap = Engine::new(EngineConfig::default()).snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json["max"].is_null());
        assert!(json["min"].is_null());
        assert_eq!(json["len"], 0);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_state() {
        use std::thread;

        let engine = SharedEngine::new(EngineConfig::default());

        let writer = {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..2_000u32 {
                    let value = 15.0 + (i % 37) as f64 * 0.75;
                    engine.ingest_line(value.to_string().as_bytes()).unwrap();
                    if i % 500 == 499 {
                        engine.reset();
                    }
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = engine.snapshot();
                        assert_eq!(snap.len, snap.points.len());
                        assert_eq!(snap.len as u64, snap.total_arrived);
                        if snap.points.is_empty() {
                            assert!(snap.max.is_none() && snap.min.is_none());
                            assert!(snap.labels.max.is_none() && snap.labels.min.is_none());
                        } else {
                            let max = snap.points.iter().map(|p| p.value).fold(f64::MIN, f64::max);
                            let min = snap.points.iter().map(|p| p.value).fold(f64::MAX, f64::min);
                            assert_eq!(snap.max, Some(max));
                            assert_eq!(snap.min, Some(min));
                            assert!(snap.labels.current.is_some());
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
