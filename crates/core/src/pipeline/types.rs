//! Shared pipeline types.

use std::sync::Arc;

use crate::confirm::Confirmer;
use crate::encoder::Encoder;
use crate::formats::TargetFormat;
use crate::packager::Packager;
use crate::tracker::{OwnedRelease, Tracker};
use crate::validator::{TagChecker, TranscodeDetector};

/// One (group, release) pair to consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub group_id: u64,
    pub release_id: u64,
}

impl From<OwnedRelease> for Candidate {
    fn from(owned: OwnedRelease) -> Self {
        Self {
            group_id: owned.group_id,
            release_id: owned.release_id,
        }
    }
}

/// External collaborators the driver runs against.
#[derive(Clone)]
pub struct PipelineDeps {
    pub tracker: Arc<dyn Tracker>,
    pub tag_checker: Arc<dyn TagChecker>,
    /// None when neither a local detection tool nor a container fallback is
    /// available; fatal on first release that needs detection.
    pub detector: Option<Arc<dyn TranscodeDetector>>,
    pub encoder: Arc<dyn Encoder>,
    pub packager: Arc<dyn Packager>,
    pub confirmer: Arc<dyn Confirmer>,
}

/// Per-release processing outcome.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub succeeded: Vec<TargetFormat>,
    pub failed: Vec<(TargetFormat, String)>,
}

/// Whole-run statistics, logged at the end.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates considered.
    pub candidates: usize,
    /// Candidates that reached the format processor.
    pub processed: usize,
    /// Candidates skipped or rejected before processing.
    pub skipped: usize,
    /// Formats produced across all candidates.
    pub formats_done: usize,
    /// Format attempts that failed.
    pub formats_failed: usize,
}
