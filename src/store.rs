use crate::types::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes `content` to `path` through a sibling temp file and a rename, so a
/// crash mid-write leaves the previous generation intact.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Durable record of paper ids that have already been notified successfully.
///
/// The backing file is a JSON array of strings. A missing or unreadable file
/// is treated as "nothing seen yet", never as a fatal error; `save` fully
/// overwrites the previous content.
pub struct SeenSetStore {
    path: PathBuf,
}

impl SeenSetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> HashSet<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Seen-set file {} not readable ({}), starting empty", self.path.display(), e);
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("Seen-set file {} is corrupt ({}), starting empty", self.path.display(), e);
                HashSet::new()
            }
        }
    }

    pub fn save(&self, ids: &HashSet<String>) -> Result<()> {
        // Sorted output keeps the file diffable between cycles
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        let content = serde_json::to_string(&sorted)?;
        write_atomically(&self.path, &content)?;
        debug!("Saved {} seen paper ids to {}", ids.len(), self.path.display());
        Ok(())
    }
}

/// Durable timestamp of the last polling cycle's start, stored as RFC 3339.
///
/// A missing or unparseable file yields `None`, which downstream code treats
/// as "no lower bound: consider all fetched papers new".
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<DateTime<Utc>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Checkpoint file {} not readable ({}), no checkpoint", self.path.display(), e);
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(content.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!("Checkpoint file {} is corrupt ({}), no checkpoint", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, ts: DateTime<Utc>) -> Result<()> {
        write_atomically(&self.path, &ts.to_rfc3339())?;
        debug!("Saved checkpoint {} to {}", ts, self.path.display());
        Ok(())
    }
}
