//! The ingestion loop.
//!
//! An [`Ingestor`] owns the line source and the alert sink and holds a clone
//! of the [`SharedEngine`]. Each tick polls the source once, commits at most
//! one sample under the engine lock, and only then hands any alert to the
//! sink.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::data::duration::format_duration;
use crate::data::{AlertSink, IngestOutcome, SharedEngine};
use crate::error::ParseError;
use crate::source::LineSource;

/// Result of a single ingestion tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No complete line was available.
    Idle,
    /// A sample was committed.
    Accepted(IngestOutcome),
    /// A line was read but dropped as malformed.
    Rejected(ParseError),
}

/// Polls a line source and feeds the engine.
#[derive(Debug)]
pub struct Ingestor {
    engine: SharedEngine,
    source: Box<dyn LineSource>,
    alerts: Box<dyn AlertSink>,
    last_source_error: Option<String>,
}

impl Ingestor {
    pub fn new(engine: SharedEngine, source: Box<dyn LineSource>, alerts: Box<dyn AlertSink>) -> Self {
        Self {
            engine,
            source,
            alerts,
            last_source_error: None,
        }
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Run one ingestion tick. Never blocks and never fails: parse errors are
    /// logged and reported in the outcome, sink errors are logged.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(line) = self.source.poll_line() else {
            self.track_source_error();
            return TickOutcome::Idle;
        };

        match self.engine.ingest_line(&line) {
            Ok(outcome) => {
                debug!(
                    value = outcome.sample.value(),
                    new_max = outcome.new_max,
                    new_min = outcome.new_min,
                    "sample ingested"
                );
                // Engine lock is released here; a slow or failing sink can't
                // affect the committed sample.
                if let Some(alert) = &outcome.alert {
                    if let Err(e) = self.alerts.deliver(alert) {
                        warn!(error = %e, "alert delivery failed");
                    }
                }
                TickOutcome::Accepted(outcome)
            }
            Err(e) => {
                warn!(
                    line = %String::from_utf8_lossy(&line).trim_end(),
                    error = %e,
                    "skipping malformed reading"
                );
                TickOutcome::Rejected(e)
            }
        }
    }

    /// Drain every line currently available. Used for batch replay.
    pub fn drain(&mut self) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.tick() {
                TickOutcome::Idle => break,
                outcome => outcomes.push(outcome),
            }
        }
        outcomes
    }

    /// Mirror source error transitions into the engine and the log.
    fn track_source_error(&mut self) {
        let current = self.source.error();
        if current == self.last_source_error {
            return;
        }
        match &current {
            Some(e) => error!(source = self.source.description(), error = %e, "line source failing"),
            None => info!(source = self.source.description(), "line source recovered"),
        }
        self.engine.set_source_error(current.clone());
        self.last_source_error = current;
    }

    /// Start ticking every `period` on the current tokio runtime.
    ///
    /// The loop never ends on its own; use the returned handle to stop it.
    pub fn spawn(mut self, period: Duration) -> IngestHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        info!(
            source = self.source.description(),
            period = %format_duration(period),
            "starting ingestion loop"
        );

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        self.tick();
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("ingestion loop stopped");
        });

        IngestHandle { stop_tx, task }
    }
}

/// Handle for controlling a running ingestion loop.
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct IngestHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl IngestHandle {
    /// Signal the loop to stop after its current tick.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Alert, EngineConfig, RecordingAlertSink};
    use crate::error::SinkError;
    use crate::source::ChannelSource;

    #[derive(Debug)]
    struct BrokenSink;

    impl AlertSink for BrokenSink {
        fn deliver(&self, _alert: &Alert) -> Result<(), SinkError> {
            Err(SinkError::EmptyCommand)
        }
    }

    fn setup() -> (
        tokio::sync::mpsc::UnboundedSender<Vec<u8>>,
        SharedEngine,
        RecordingAlertSink,
        Ingestor,
    ) {
        let (tx, source) = ChannelSource::create("test");
        let engine = SharedEngine::new(EngineConfig::default());
        let alerts = RecordingAlertSink::default();
        let ingestor = Ingestor::new(engine.clone(), Box::new(source), Box::new(alerts.clone()));
        (tx, engine, alerts, ingestor)
    }

    #[test]
    fn test_tick_without_data_is_idle() {
        let (_tx, engine, _alerts, mut ingestor) = setup();
        assert_eq!(ingestor.tick(), TickOutcome::Idle);
        assert_eq!(engine.snapshot().len, 0);
    }

    #[test]
    fn test_one_sample_per_tick() {
        let (tx, engine, _alerts, mut ingestor) = setup();
        tx.send(b"21".to_vec()).unwrap();
        tx.send(b"22".to_vec()).unwrap();

        assert!(matches!(ingestor.tick(), TickOutcome::Accepted(_)));
        assert_eq!(engine.snapshot().len, 1);
        assert!(matches!(ingestor.tick(), TickOutcome::Accepted(_)));
        assert_eq!(engine.snapshot().len, 2);
        assert_eq!(ingestor.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_malformed_lines_do_not_count() {
        let (tx, engine, _alerts, mut ingestor) = setup();
        for line in ["20", "x", "21", "", "22", "2..3"] {
            tx.send(line.as_bytes().to_vec()).unwrap();
        }
        let outcomes = ingestor.drain();
        assert_eq!(outcomes.len(), 6);

        let snap = engine.snapshot();
        assert_eq!(snap.len, 3);
        assert_eq!(snap.rejected, 3);
    }

    #[test]
    fn test_alerts_reach_the_sink() {
        let (tx, _engine, alerts, mut ingestor) = setup();
        for line in ["20", "35", "36", "34.9"] {
            tx.send(line.as_bytes().to_vec()).unwrap();
        }
        ingestor.drain();
        let values: Vec<f64> = alerts.alerts().iter().map(|a| a.value).collect();
        assert_eq!(values, vec![35.0, 36.0]);
    }

    #[test]
    fn test_sink_failure_keeps_sample() {
        let (tx, source) = ChannelSource::create("test");
        let engine = SharedEngine::new(EngineConfig::default());
        let mut ingestor = Ingestor::new(engine.clone(), Box::new(source), Box::new(BrokenSink));

        tx.send(b"40".to_vec()).unwrap();
        assert!(matches!(ingestor.tick(), TickOutcome::Accepted(_)));

        let snap = engine.snapshot();
        assert_eq!(snap.len, 1);
        assert_eq!(snap.max, Some(40.0));
        assert_eq!(snap.alerts_raised, 1);
    }

    #[test]
    fn test_source_error_is_mirrored_into_engine() {
        let (tx, engine, _alerts, mut ingestor) = setup();
        drop(tx);
        assert_eq!(ingestor.tick(), TickOutcome::Idle);
        assert_eq!(engine.snapshot().source_error.as_deref(), Some("channel closed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_ticks_once_per_period() {
        let (tx, engine, _alerts, ingestor) = setup();
        for v in 0..5 {
            tx.send(format!("{}", 20 + v).into_bytes()).unwrap();
        }

        let handle = ingestor.spawn(Duration::from_secs(1));

        // First tick fires immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.snapshot().len, 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(engine.snapshot().len, 3);

        handle.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.snapshot().len, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_loop() {
        let (tx, engine, _alerts, ingestor) = setup();
        let handle = ingestor.spawn(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());
        drop(handle);

        tx.send(b"25".to_vec()).unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(engine.snapshot().len, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_running() {
        let (tx, engine, _alerts, ingestor) = setup();
        let handle = ingestor.spawn(Duration::from_secs(1));

        tx.send(b"30".to_vec()).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.snapshot().len, 1);

        engine.reset();
        assert_eq!(engine.snapshot().len, 0);

        tx.send(b"31".to_vec()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.len, 1);
        assert_eq!(snap.max, Some(31.0));
        assert_eq!(snap.min, Some(31.0));

        handle.shutdown().await;
    }
}
