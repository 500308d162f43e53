//! Source integrity validation.
//!
//! Two independent checks run before any encode: tag well-formedness across
//! all source audio files, and a transcode-detection scan that rejects
//! lossless releases actually derived from a lossy source. Tag failures and
//! positive detections are soft (the release is skipped); missing or
//! malfunctioning detection tooling is fatal for the whole run, because the
//! transcode-safety guarantee is void for every later candidate too.

mod detector;
mod tags;

pub use detector::{
    select_detector, ContainerDetector, DetectorError, LocalDetector, TranscodeDetector,
};
pub use tags::{AudioFileTags, FfprobeTagChecker, SourceScan, TagChecker};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::FatalError;
use crate::tracker::Release;

/// Validation failures. `Tags` and `TranscodeSuspected` are soft; the
/// detector variants abort the whole run.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Tag check failed: {message}")]
    Tags { message: String },

    #[error("Transcode detection flagged {count} file(s)")]
    TranscodeSuspected { count: u32 },

    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error("Failed to scan source files: {0}")]
    Scan(String),
}

impl ValidatorError {
    /// Whether this failure must abort the entire run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Suspect counts above this are implausible for a real release and mean
/// the detection tool itself is broken.
const MALFUNCTION_THRESHOLD: u32 = 100;

/// Runs the tag check and the transcode-detection scan for one release.
pub struct SourceValidator {
    detector: Option<Arc<dyn TranscodeDetector>>,
}

impl SourceValidator {
    pub fn new(detector: Option<Arc<dyn TranscodeDetector>>) -> Self {
        Self { detector }
    }

    /// Validates a release. `scan` is the already-collected per-file tag
    /// scan of the source directory.
    pub async fn validate(
        &self,
        release: &Release,
        source_dir: &Path,
        scan: &SourceScan,
    ) -> Result<(), ValidatorError> {
        if let Some(problem) = scan.first_tag_problem() {
            return Err(ValidatorError::Tags { message: problem });
        }

        // Detection is pointless for releases the catalog already accepts
        // as lossy-derived.
        if release.lossy_web_approved || release.lossy_master_approved {
            info!(
                "Release {} is lossy-approved, skipping transcode detection",
                release.id
            );
            return Ok(());
        }

        let detector = self
            .detector
            .as_ref()
            .ok_or(FatalError::DetectorUnavailable)?;

        let count = detector.scan(source_dir).await.map_err(|e| {
            warn!("Transcode detector failed to run: {}", e);
            FatalError::DetectorUnavailable
        })?;

        match count {
            0 => Ok(()),
            c if c > MALFUNCTION_THRESHOLD => {
                Err(ValidatorError::Fatal(FatalError::DetectorMalfunction(c)))
            }
            c => Err(ValidatorError::TranscodeSuspected { count: c }),
        }
    }
}
