//! Line source abstraction for receiving raw temperature readings.
//!
//! A source yields newline-terminated lines as raw bytes. Decoding and
//! parsing happen in the engine, so a source never decides whether a line is
//! a valid sample.

mod channel;
mod file;
mod line_buffer;
mod serial;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use line_buffer::LineBuffer;
pub use serial::SerialSource;
pub use stream::StreamSource;

use std::fmt::Debug;

/// Trait for receiving lines from a device or a stand-in for one.
///
/// # Example
///
/// ```
/// use thermowatch::{ChannelSource, LineSource};
///
/// let (tx, mut source) = ChannelSource::create("test bench");
/// tx.send(b"21.5".to_vec()).unwrap();
/// assert_eq!(source.poll_line(), Some(b"21.5".to_vec()));
/// assert_eq!(source.poll_line(), None);
/// ```
pub trait LineSource: Send + Debug {
    /// Take at most one complete line, without its `\n` terminator.
    ///
    /// Returns `None` when no complete line is buffered. Must not block:
    /// "nothing yet" is a normal state, not an error.
    fn poll_line(&mut self) -> Option<Vec<u8>>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The last transport error, if the source is currently failing.
    fn error(&self) -> Option<String>;
}
