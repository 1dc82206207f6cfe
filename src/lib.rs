//! # thermowatch
//!
//! Serial temperature telemetry ingestion, aggregation and alerting, with a
//! terminal dashboard.
//!
//! A sensor (typically reached through a Bluetooth serial link) writes one
//! decimal reading per line. thermowatch parses each line, keeps the series
//! and its running extremes, raises an alert whenever a reading reaches the
//! high threshold, and shows the result in an interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐  tick  ┌──────────┐ snapshot ┌─────────┐       │
//! │  │ ingest  │───────▶│  engine  │─────────▶│ app/ui  │──▶ TTY│
//! │  │ (loop)  │        │ (locked) │◀─────────│         │       │
//! │  └────┬────┘        └──────────┘  reset   └─────────┘       │
//! │       │  ▲                                                  │
//! │       │  └── source: Serial | Stream | File | Channel       │
//! │       ▼                                                     │
//! │  AlertSink: Log | Command | Recording | Fanout              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Line source abstraction ([`LineSource`] trait) with
//!   implementations for serial ports, async streams, file replay and channels
//! - **[`data`]**: Samples, running extremes, thresholds, the series buffer and
//!   the [`Engine`] that owns them
//! - **[`ingest`]**: The periodic [`Ingestor`] that moves lines from a source
//!   into the engine and hands alerts to an [`AlertSink`]
//! - **[`app`]** / **[`ui`]**: Presentation state and ratatui rendering
//! - **[`config`]**: Layered [`Settings`] (defaults, TOML file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Read from the default Bluetooth serial device
//! thermowatch --port /dev/rfcomm0 --baud 9600
//!
//! # Replay a capture and export the resulting state
//! thermowatch --replay capture.txt --export state.json
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use thermowatch::{ChannelSource, EngineConfig, Ingestor, LogAlertSink, SharedEngine};
//!
//! let (tx, source) = ChannelSource::create("test");
//! let engine = SharedEngine::new(EngineConfig::default());
//! let mut ingestor = Ingestor::new(engine.clone(), Box::new(source), Box::new(LogAlertSink));
//!
//! tx.send(b"36.5\n".to_vec()).unwrap();
//! ingestor.drain();
//!
//! let snapshot = engine.snapshot();
//! assert_eq!(snapshot.max, Some(36.5));
//! assert_eq!(snapshot.alerts_raised, 1);
//! ```
//!
//! ### With a stream source (TCP, etc.)
//!
//! ```no_run
//! use std::io::Cursor;
//! use thermowatch::{LineSource, StreamSource};
//!
//! # tokio_test::block_on(async {
//! // In practice, use a TcpStream
//! let stream = Cursor::new(b"21.5\n22.0\n".to_vec());
//! let mut source = StreamSource::spawn(stream, "example");
//! let line = source.poll_line();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod export;
pub mod ingest;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    Alert, AlertSink, Classification, CommandAlertSink, Engine, EngineConfig, EngineSnapshot,
    FanoutAlertSink, LogAlertSink, RecordingAlertSink, Sample, SharedEngine, Thresholds,
};
pub use error::{ParseError, SinkError, SourceError};
pub use ingest::{IngestHandle, Ingestor, TickOutcome};
pub use source::{ChannelSource, FileSource, LineSource, SerialSource, StreamSource};
