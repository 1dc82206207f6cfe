//! Application state and navigation logic.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::{Alert, EngineSnapshot, RecordingAlertSink, SharedEngine};
use crate::ui::Theme;

/// How long an alert stays in the status bar.
const ALERT_DISPLAY: Duration = Duration::from_secs(5);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Line chart of the series with threshold markers.
    Chart,
    /// Table of every retained reading with its classification.
    Readings,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Chart => View::Readings,
            View::Readings => View::Chart,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Chart => "Chart",
            View::Readings => "Readings",
        }
    }
}

/// Main application state.
///
/// The app never mutates telemetry except through [`App::reset`]. Everything
/// it draws comes from `snapshot`, which is replaced wholesale on each
/// presentation tick.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    engine: SharedEngine,
    alerts: RecordingAlertSink,
    source_description: String,
    pub snapshot: EngineSnapshot,
    pub last_refresh: Option<Instant>,

    // Readings view
    pub selected_reading: usize,
    pub follow_latest: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App over a running engine.
    pub fn new(engine: SharedEngine, alerts: RecordingAlertSink, source_description: &str) -> Self {
        Self::with_theme(engine, alerts, source_description, Theme::auto_detect())
    }

    /// Like [`App::new`] but with an explicit theme (no terminal probing).
    pub fn with_theme(
        engine: SharedEngine,
        alerts: RecordingAlertSink,
        source_description: &str,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            current_view: View::Chart,
            show_help: false,
            engine,
            alerts,
            source_description: source_description.to_string(),
            snapshot: EngineSnapshot::default(),
            last_refresh: None,
            selected_reading: 0,
            follow_latest: true,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current line source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Presentation tick: take a consistent copy of the engine state.
    pub fn refresh(&mut self) {
        self.snapshot = self.engine.snapshot();
        self.last_refresh = Some(Instant::now());

        let len = self.snapshot.points.len();
        if self.follow_latest || self.selected_reading >= len {
            self.selected_reading = len.saturating_sub(1);
        }
    }

    /// Clear all telemetry. Takes effect atomically for every observer.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.alerts.clear();
        self.follow_latest = true;
        self.refresh();
        self.set_status_message("Chart reset".to_string());
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// The most recent alert, if it was raised in the last few seconds.
    pub fn recent_alert(&self) -> Option<Alert> {
        self.alerts
            .latest()
            .filter(|(_, at)| at.elapsed() < ALERT_DISPLAY)
            .map(|(alert, _)| alert)
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by n readings.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.snapshot.points.len().saturating_sub(1);
        self.selected_reading = (self.selected_reading + n).min(max);
        self.follow_latest = self.selected_reading == max;
    }

    /// Move selection up by n readings.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_reading = self.selected_reading.saturating_sub(n);
        self.follow_latest = false;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Jump to the oldest reading.
    pub fn select_first(&mut self) {
        self.selected_reading = 0;
        self.follow_latest = false;
    }

    /// Jump to the newest reading and keep following new ones.
    pub fn select_last(&mut self) {
        self.selected_reading = self.snapshot.points.len().saturating_sub(1);
        self.follow_latest = true;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the engine state to a JSON file.
    ///
    /// Takes a fresh snapshot so the file reflects the engine, not the last
    /// rendered frame.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        crate::export::write_snapshot(&self.engine.snapshot(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AlertSink, EngineConfig};

    fn app_with(values: &[&str]) -> App {
        let engine = SharedEngine::new(EngineConfig::default());
        for v in values {
            engine.ingest_line(v.as_bytes()).unwrap();
        }
        App::with_theme(engine, RecordingAlertSink::default(), "test", Theme::dark())
    }

    #[test]
    fn test_refresh_copies_engine_state() {
        let mut app = app_with(&["20", "30"]);
        assert_eq!(app.snapshot.len, 0);
        app.refresh();
        assert_eq!(app.snapshot.len, 2);
        assert_eq!(app.snapshot.max, Some(30.0));
        assert_eq!(app.selected_reading, 1);
    }

    #[test]
    fn test_reset_clears_engine_and_view() {
        let mut app = app_with(&["20", "36"]);
        app.alerts
            .deliver(&Alert::high_temperature(crate::data::Sample::new(36.0).unwrap()))
            .unwrap();
        app.refresh();
        assert!(app.recent_alert().is_some());

        app.reset();
        assert_eq!(app.snapshot.len, 0);
        assert!(app.snapshot.max.is_none());
        assert!(app.snapshot.labels.max.is_none());
        assert!(app.recent_alert().is_none());
        assert_eq!(app.get_status_message(), Some("Chart reset"));
        assert_eq!(app.snapshot, EngineSnapshot::default());
    }

    #[test]
    fn test_selection_follows_latest_until_moved() {
        let mut app = app_with(&["20", "21", "22"]);
        app.refresh();
        assert_eq!(app.selected_reading, 2);

        app.select_prev();
        assert_eq!(app.selected_reading, 1);
        assert!(!app.follow_latest);

        app.engine.ingest_line(b"23").unwrap();
        app.refresh();
        assert_eq!(app.selected_reading, 1);

        app.select_last();
        app.engine.ingest_line(b"24").unwrap();
        app.refresh();
        assert_eq!(app.selected_reading, 4);
    }

    #[test]
    fn test_view_cycling() {
        let mut app = app_with(&[]);
        assert_eq!(app.current_view, View::Chart);
        app.next_view();
        assert_eq!(app.current_view, View::Readings);
        app.prev_view();
        assert_eq!(app.current_view, View::Chart);
    }

    #[test]
    fn test_export_state_writes_json() {
        let app = app_with(&["21.5", "35"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["len"], 2);
        assert_eq!(json["max"], 35.0);
        assert_eq!(json["points"][1]["class"], "HIGH");
    }
}
