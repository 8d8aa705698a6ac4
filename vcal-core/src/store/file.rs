//! The events JSON file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::VcalResult;
use crate::event::Event;
use crate::serde_util::decode_events;

/// A JSON array of events on disk.
#[derive(Debug, Clone)]
pub struct EventFile {
    path: PathBuf,
}

impl EventFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all events. A missing or empty file is an empty collection;
    /// entries that fail to decode are skipped.
    pub async fn read(&self) -> VcalResult<Vec<Event>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        Ok(decode_events(values))
    }

    /// Replace the file contents with `events`.
    ///
    /// Writes to a sibling temp file and renames it into place, so readers
    /// never see a half-written file.
    pub async fn write(&self, events: &[Event]) -> VcalResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(events)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Wrote {} events to {}", events.len(), self.path.display());
        Ok(())
    }
}
