//! JSON export of the engine state.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::EngineSnapshot;

/// Write `snapshot` as pretty-printed JSON.
///
/// Extremes that have not been observed yet are written as `null` rather
/// than as infinities.
pub fn write_snapshot(snapshot: &EngineSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
