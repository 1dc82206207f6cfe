//! Error types for the ingestion engine and its collaborators.

use thiserror::Error;

/// Why a serial line could not be turned into a sample.
///
/// Parse errors are per-line and recoverable: the line is dropped and
/// ingestion continues on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    Encoding,

    /// The line was empty after trimming whitespace.
    #[error("empty line")]
    Empty,

    /// The line is not a decimal number.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// The number parsed but is infinite or NaN.
    #[error("non-finite reading: {0}")]
    NonFinite(String),
}

/// Failures of a line source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The device or file could not be opened.
    #[error("failed to open {target}: {reason}")]
    Open { target: String, reason: String },

    /// Reading from an already opened source failed.
    #[error("read error: {0}")]
    Read(String),

    /// The peer closed the stream.
    #[error("connection closed")]
    Closed,
}

/// Failures delivering an alert to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The notifier command could not be started.
    #[error("failed to run alert command `{command}`: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The alert command string was empty.
    #[error("alert command is empty")]
    EmptyCommand,

    /// One or more sinks in a fan-out failed.
    #[error("{failed} of {total} alert sinks failed")]
    Partial { failed: usize, total: usize },
}
