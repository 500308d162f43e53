//! Persistent set of already-processed release identifiers.
//!
//! Serialized as a JSON map of release id to the timestamp it was marked,
//! loaded once at startup and flushed synchronously after each candidate's
//! terminal transition. Flushes write to a sibling temp file and rename it
//! into place so a crash mid-write cannot corrupt the store.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SeenError {
    #[error("Failed to read seen set from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse seen set at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write seen set to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persisted set of release ids already processed by a prior run.
#[derive(Debug)]
pub struct SeenSet {
    path: PathBuf,
    entries: BTreeMap<u64, DateTime<Utc>>,
}

impl SeenSet {
    /// Loads the seen set from `path`. A missing file is an empty set.
    pub async fn load(path: &Path) -> Result<Self, SeenError> {
        let entries = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| SeenError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(SeenError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        debug!("Loaded seen set with {} entries", entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// An in-memory set that flushes to `path` on first mark.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    pub fn contains(&self, release_id: u64) -> bool {
        self.entries.contains_key(&release_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks a release id as processed. Returns false if it was already
    /// present.
    pub fn mark(&mut self, release_id: u64) -> bool {
        self.entries.insert(release_id, Utc::now()).is_none()
    }

    /// Writes the set to disk via temp-file-then-rename.
    pub async fn flush(&self) -> Result<(), SeenError> {
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|e| SeenError::Parse {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SeenError::Write {
                        path: self.path.clone(),
                        source: e,
                    })?;
            }
        }

        // Temp file in the same directory so the rename stays on one
        // filesystem.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| SeenError::Write {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SeenError::Write {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(())
    }
}
