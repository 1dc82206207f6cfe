//! Telemetry data model and the ingestion engine.
//!
//! ## Submodules
//!
//! - [`sample`]: Parsing raw serial lines into [`Sample`]s
//! - [`stats`]: Running minimum/maximum ([`RunningStats`])
//! - [`thresholds`]: Alert/marker cutoffs and per-sample [`Classification`]
//! - [`series`]: Arrival-ordered [`TimeSeries`] and its render projection
//! - [`alert`]: Threshold alerts and the [`AlertSink`] implementations
//! - [`engine`]: [`Engine`], which ties the above together under one lock
//! - [`duration`]: Parsing and formatting of tick periods (e.g., "1s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! raw line (bytes)
//!        │
//!        ▼
//! sample::parse_line() ──✗──▶ ParseError (counted, line dropped)
//!        │
//!        ▼
//! Engine::ingest()
//!        ├──▶ TimeSeries::push()
//!        ├──▶ RunningStats::update_max() / update_min()  ──▶ Labels
//!        └──▶ alert::evaluate_alert()  ──▶ Alert (delivered after unlock)
//! ```

pub mod alert;
pub mod duration;
pub mod engine;
pub mod sample;
pub mod series;
pub mod stats;
pub mod thresholds;

pub use alert::{
    evaluate_alert, Alert, AlertSink, CommandAlertSink, FanoutAlertSink, LogAlertSink,
    RecordingAlertSink,
};
pub use engine::{Engine, EngineConfig, EngineSnapshot, IngestOutcome, Labels, SharedEngine};
pub use sample::{parse_line, Sample};
pub use series::{SeriesPoint, TimeAxis, TimeSeries};
pub use stats::RunningStats;
pub use thresholds::{Classification, Thresholds};
