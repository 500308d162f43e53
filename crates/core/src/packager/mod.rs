//! Torrent packaging.
//!
//! Turns an encoded release directory into a transportable .torrent
//! descriptor. Wire-format construction is delegated to librqbit.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while packaging.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// Content directory missing.
    #[error("Content directory not found: {path}")]
    ContentNotFound { path: PathBuf },

    /// Torrent construction failed.
    #[error("Failed to build torrent: {reason}")]
    BuildFailed { reason: String },

    /// I/O error while writing the descriptor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One packaging request.
#[derive(Debug, Clone)]
pub struct PackageJob {
    /// The encoded release directory to package.
    pub content_dir: PathBuf,
    /// Scratch directory the descriptor is written into; removed by the
    /// caller after the attempt.
    pub work_dir: PathBuf,
    /// Tracker announce URL embedded in the torrent.
    pub announce_url: String,
}

/// A transportable package descriptor.
#[derive(Debug, Clone)]
pub struct TorrentPackage {
    /// Path of the produced .torrent inside the work dir.
    pub torrent_path: PathBuf,
    /// Torrent name (the content directory's basename).
    pub name: String,
    /// Hex info hash.
    pub info_hash: String,
}

/// A packager that can build torrent descriptors.
#[async_trait]
pub trait Packager: Send + Sync {
    /// Returns the name of this packager implementation.
    fn name(&self) -> &str;

    /// Packages a content directory into a torrent descriptor.
    async fn package(&self, job: PackageJob) -> Result<TorrentPackage, PackagerError>;
}

/// librqbit-backed packager.
#[derive(Default)]
pub struct TorrentPackager;

impl TorrentPackager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Packager for TorrentPackager {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn package(&self, job: PackageJob) -> Result<TorrentPackage, PackagerError> {
        if !job.content_dir.is_dir() {
            return Err(PackagerError::ContentNotFound {
                path: job.content_dir.clone(),
            });
        }

        let name = job
            .content_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| PackagerError::BuildFailed {
                reason: "content directory has no basename".to_string(),
            })?;

        let options = librqbit::CreateTorrentOptions {
            name: Some(&name),
            trackers: vec![job.announce_url.clone()],
            ..Default::default()
        };

        let spawner = librqbit::spawn_utils::BlockingSpawner::new(1);
        let torrent = librqbit::create_torrent(&job.content_dir, options, &spawner)
            .await
            .map_err(|e| PackagerError::BuildFailed {
                reason: e.to_string(),
            })?;

        let bytes = torrent.as_bytes().map_err(|e| PackagerError::BuildFailed {
            reason: e.to_string(),
        })?;

        let torrent_path = job.work_dir.join(format!("{}.torrent", name));
        tokio::fs::write(&torrent_path, &bytes).await?;

        let info_hash = torrent.info_hash().as_string();
        debug!("Built torrent {:?} ({})", torrent_path, info_hash);

        Ok(TorrentPackage {
            torrent_path,
            name,
            info_hash,
        })
    }
}
