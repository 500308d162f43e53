//! Scoped working directory for one (release, format) attempt.

use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// RAII guard for a scratch directory. The directory is removed when the
/// guard drops, on every exit path of the attempt.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Creates a uniquely named directory under `root`.
    pub async fn create(root: &Path) -> std::io::Result<Self> {
        let path = root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        // Drop cannot await; the synchronous removal is fine for a scratch
        // directory holding a handful of files.
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove work dir {:?}: {}", self.path, e);
            }
        }
    }
}
