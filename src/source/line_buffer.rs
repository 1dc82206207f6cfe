//! Reassembly of newline-terminated lines from arbitrary byte chunks.

use std::collections::VecDeque;

use tracing::warn;

/// Longest partial line kept while waiting for a terminator.
pub(crate) const MAX_PENDING: usize = 4096;

/// Splits incoming bytes into complete lines.
///
/// Bytes after the last `\n` are held until the rest of the line arrives.
/// Terminators are stripped; a trailing `\r` is left for the parser to trim.
///
/// A line longer than `MAX_PENDING` is dropped whole: once the limit is hit,
/// every byte up to and including the next `\n` is discarded and no line is
/// produced for it.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    lines: VecDeque<Vec<u8>>,
    /// Inside an oversized line; skipping to the next terminator.
    discarding: bool,
    dropped: u64,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes, completing any lines they terminate.
    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.discarding {
                if b == b'\n' {
                    self.discarding = false;
                }
                continue;
            }

            if b == b'\n' {
                self.lines.push_back(std::mem::take(&mut self.pending));
            } else if self.pending.len() == MAX_PENDING {
                warn!(limit = MAX_PENDING, "discarding oversized line");
                self.pending.clear();
                self.discarding = true;
                self.dropped += 1;
            } else {
                self.pending.push(b);
            }
        }
    }

    /// Oversized lines dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Take the oldest complete line.
    pub fn pop_line(&mut self) -> Option<Vec<u8>> {
        self.lines.pop_front()
    }

    /// Whether at least one complete line is buffered.
    pub fn has_line(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Number of complete lines waiting.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Promote a trailing unterminated line to a complete one (end of input).
    pub fn finish(&mut self) {
        self.discarding = false;
        if !self.pending.is_empty() {
            self.lines.push_back(std::mem::take(&mut self.pending));
        }
    }
}
