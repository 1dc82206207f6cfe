//! Stream-based line source.
//!
//! Receives readings from an async byte stream. This is useful for network
//! bridges (e.g. a serial-to-TCP gateway) or for piping a capture through
//! stdin.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::{LineBuffer, LineSource};
use crate::error::SourceError;

/// Lines buffered between the reader task and `poll_line()`.
const CHANNEL_CAPACITY: usize = 256;

/// Bytes requested from the reader per read call.
const READ_CHUNK: usize = 1024;

/// A line source that reads from an async stream.
///
/// This source spawns a background task that reads newline-terminated lines
/// from the provided async reader and makes them available via `poll_line()`.
/// Lines longer than the reassembly limit are dropped, so a peer that never
/// sends a newline cannot grow memory without bound.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use thermowatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let stream = Cursor::new(b"21.5\n22.0\n".to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Vec<u8>>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut reader = reader;
            let mut chunk = vec![0u8; READ_CHUNK];
            let mut lines = LineBuffer::new();

            'read: loop {
                let eof = match reader.read(&mut chunk).await {
                    Ok(0) => {
                        lines.finish();
                        true
                    }
                    Ok(n) => {
                        lines.extend(&chunk[..n]);
                        false
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(SourceError::Read(e.to_string()).to_string());
                        break;
                    }
                };

                while let Some(line) = lines.pop_line() {
                    if tx.send(line).await.is_err() {
                        // Receiver dropped
                        break 'read;
                    }
                }

                if eof {
                    *error_handle.lock() = Some(SourceError::Closed.to_string());
                    break;
                }
            }
            debug!("stream reader finished");
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }
}

impl LineSource for StreamSource {
    fn poll_line(&mut self) -> Option<Vec<u8>> {
        // Lines already read stay available after EOF; the error only
        // matters once the channel is drained.
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        if self.receiver.is_empty() {
            self.last_error.lock().clone()
        } else {
            None
        }
    }
}
