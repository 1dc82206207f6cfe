//! Channel-based line source.
//!
//! Receives lines via a tokio mpsc channel. This is useful when the bytes
//! arrive through some other transport the embedding application already
//! owns, and for driving the engine in tests.

use tokio::sync::mpsc;

use super::LineSource;

/// A line source fed through an unbounded channel.
///
/// # Example
///
/// ```
/// use thermowatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("ble-gateway");
/// tx.send(b"24.0".to_vec()).unwrap();
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an unbounded channel
    /// * `source_description` - Where the lines come from
    pub fn new(receiver: mpsc::UnboundedReceiver<Vec<u8>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a channel pair for pushing lines to a ChannelSource.
    ///
    /// Returns (sender, source). Lines are sent without their terminator.
    pub fn create(source_description: &str) -> (mpsc::UnboundedSender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, source_description))
    }
}

impl LineSource for ChannelSource {
    fn poll_line(&mut self) -> Option<Vec<u8>> {
        match self.receiver.try_recv() {
            Ok(line) => Some(line),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.closed.then(|| "channel closed".to_string())
    }
}
