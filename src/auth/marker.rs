//! Client-side session marker file

use std::path::Path;
use anyhow::{Context, Result};
use crate::models::SessionMarker;

/// Read the marker. A missing file means "not logged in"; an unreadable
/// one is treated the same way.
pub fn read_marker(path: &Path) -> Result<Option<SessionMarker>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(marker) => Ok(Some(marker)),
        Err(e) => {
            log::warn!("ignoring malformed session file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

pub fn write_marker(path: &Path, marker: &SessionMarker) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(marker)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session file: {}", path.display()))
}

/// Remove the marker; returns whether one existed
pub fn remove_marker(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove session file: {}", path.display()))?;
    Ok(true)
}
