//! Mock packager for testing.

use async_trait::async_trait;

use crate::packager::{PackageJob, Packager, PackagerError, TorrentPackage};

/// Mock implementation of the Packager trait.
///
/// Writes a placeholder descriptor into the job's work dir so the
/// persistence step has a real file to copy.
#[derive(Debug, Default)]
pub struct MockPackager {
    failure: Option<String>,
}

impl MockPackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every packaging attempt fail.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

#[async_trait]
impl Packager for MockPackager {
    fn name(&self) -> &str {
        "mock-packager"
    }

    async fn package(&self, job: PackageJob) -> Result<TorrentPackage, PackagerError> {
        if let Some(reason) = &self.failure {
            return Err(PackagerError::BuildFailed {
                reason: reason.clone(),
            });
        }

        let name = job
            .content_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "content".to_string());
        let torrent_path = job.work_dir.join(format!("{}.torrent", name));
        tokio::fs::write(&torrent_path, b"d8:announce0:e").await?;

        Ok(TorrentPackage {
            torrent_path,
            name,
            info_hash: "0000000000000000000000000000000000000000".to_string(),
        })
    }
}
