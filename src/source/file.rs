//! File-based line source.
//!
//! Replays a captured serial log, one line per poll, as if the device were
//! sending it at the ingestion tick rate.

use std::fs;
use std::path::{Path, PathBuf};

use super::{LineBuffer, LineSource};
use crate::error::SourceError;

/// A line source that replays a capture file.
///
/// The whole file is read when the source is opened, so a missing or
/// unreadable file is a startup error rather than a silent empty stream.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    lines: LineBuffer,
}

impl FileSource {
    /// Open and load the capture at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read(&path).map_err(|e| SourceError::Open {
            target: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut lines = LineBuffer::new();
        lines.extend(&content);
        lines.finish();

        let description = format!("replay: {}", path.display());
        Ok(Self {
            path,
            description,
            lines,
        })
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines not yet delivered.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for FileSource {
    fn poll_line(&mut self) -> Option<Vec<u8>> {
        self.lines.pop_line()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::line_buffer::MAX_PENDING;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_replays_lines_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "21.0\r\n22.5\r\noops\r\n23.0").unwrap();

        let mut source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.remaining(), 4);
        assert_eq!(source.poll_line(), Some(b"21.0\r".to_vec()));
        assert_eq!(source.poll_line(), Some(b"22.5\r".to_vec()));
        assert_eq!(source.poll_line(), Some(b"oops\r".to_vec()));
        assert_eq!(source.poll_line(), Some(b"23.0".to_vec()));
        assert_eq!(source.poll_line(), None);
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_description() {
        let file = NamedTempFile::new().unwrap();
        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.path(), file.path());
        assert_eq!(
            source.description(),
            format!("replay: {}", file.path().display())
        );
    }

    #[test]
    fn test_oversized_line_never_becomes_a_sample() {
        use crate::data::{EngineConfig, SharedEngine};

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'9'; MAX_PENDING + 2]).unwrap();
        file.write_all(b"99\n23.0\n").unwrap();

        let mut source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.remaining(), 1);

        let engine = SharedEngine::new(EngineConfig::default());
        while let Some(line) = source.poll_line() {
            engine.ingest_line(&line).unwrap();
        }
        let snap = engine.snapshot();
        assert_eq!(snap.len, 1);
        assert_eq!(snap.max, Some(23.0));
        assert_eq!(snap.alerts_raised, 0);
    }

    #[test]
    fn test_file_source_missing_file() {
        let err = FileSource::open("/nonexistent/path/capture.log").unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/path/capture.log"));
    }
}
