//! Transcode detection tooling.
//!
//! The detection tool's contract: invoked with a single directory argument,
//! its process exit status IS the count of suspect files. Stdout/stderr are
//! surfaced to the user verbatim and never parsed.
//!
//! Two implementations exist: a local binary, and the same logic run inside
//! a container when the binary is absent. Selection happens once at
//! startup; when neither path is available the run aborts on the first
//! release that actually needs detection.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DetectorConfig;

/// Errors launching or reaping the detection tool.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Failed to launch detection tool: {0}")]
    Launch(#[from] std::io::Error),

    #[error("Detection tool terminated without an exit status")]
    NoExitStatus,
}

/// Heuristic lossy-source detection over a release directory.
#[async_trait]
pub trait TranscodeDetector: Send + Sync {
    /// Returns the name of this detector implementation.
    fn name(&self) -> &str;

    /// Scans a directory; returns the tool's suspect-file count.
    async fn scan(&self, dir: &Path) -> Result<u32, DetectorError>;
}

async fn run_tool(mut command: Command, label: &str) -> Result<u32, DetectorError> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    // Surface tool output to the user without interpreting it.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        info!("[{}] {}", label, stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        info!("[{}] {}", label, stderr.trim_end());
    }

    let count = output.status.code().ok_or(DetectorError::NoExitStatus)? as u32;
    debug!("{} reported {} suspect file(s)", label, count);
    Ok(count)
}

/// Locally installed detection binary.
pub struct LocalDetector {
    binary: PathBuf,
}

impl LocalDetector {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TranscodeDetector for LocalDetector {
    fn name(&self) -> &str {
        "local"
    }

    async fn scan(&self, dir: &Path) -> Result<u32, DetectorError> {
        let mut command = Command::new(&self.binary);
        command.arg(dir);
        run_tool(command, "detector").await
    }
}

/// Detection logic run inside a container, used when the local binary is
/// not installed.
pub struct ContainerDetector {
    docker_path: PathBuf,
    image: String,
}

impl ContainerDetector {
    pub fn new(docker_path: impl Into<PathBuf>, image: impl Into<String>) -> Self {
        Self {
            docker_path: docker_path.into(),
            image: image.into(),
        }
    }
}

#[async_trait]
impl TranscodeDetector for ContainerDetector {
    fn name(&self) -> &str {
        "container"
    }

    async fn scan(&self, dir: &Path) -> Result<u32, DetectorError> {
        let mut command = Command::new(&self.docker_path);
        command
            .arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:/scan:ro", dir.display()))
            .arg(&self.image)
            .arg("/scan");
        run_tool(command, "detector(container)").await
    }
}

/// Selects the detection path at startup: local binary when it exists on
/// disk, container fallback when an image is configured, otherwise none.
pub fn select_detector(config: &DetectorConfig) -> Option<Arc<dyn TranscodeDetector>> {
    if let Some(binary) = &config.binary {
        if binary.exists() {
            info!("Using local transcode detector at {:?}", binary);
            return Some(Arc::new(LocalDetector::new(binary.clone())));
        }
        debug!("Configured detector binary {:?} not present", binary);
    }

    if let Some(image) = &config.container_image {
        info!("Using containerized transcode detector image '{}'", image);
        return Some(Arc::new(ContainerDetector::new(
            config.docker_path.clone(),
            image.clone(),
        )));
    }

    None
}
