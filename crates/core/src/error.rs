//! Run-fatal error type.
//!
//! Everything that aborts the whole run funnels into [`FatalError`] so the
//! binary has a single place mapping error kinds to exit codes. Per-candidate
//! and per-format failures never become fatal; they are logged and the loop
//! continues.

use thiserror::Error;

/// Errors that void the run's safety guarantees for every remaining
/// candidate, not just the current one.
#[derive(Debug, Error)]
pub enum FatalError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracker could not be reached while building the candidate list,
    /// before any candidate was processed.
    #[error("tracker error: {0}")]
    Tracker(String),

    /// The seen-set store could not be persisted; continuing would lose
    /// idempotency guarantees.
    #[error("seen-set store error: {0}")]
    SeenStore(String),

    /// No transcode detection path exists: the local tool is absent and no
    /// container runtime is configured.
    #[error("transcode detection tooling unavailable (no local binary, no container fallback)")]
    DetectorUnavailable,

    /// The detection tool reported an implausible suspect count, which means
    /// the tool or its environment is broken.
    #[error("transcode detector malfunction: reported {0} suspect files")]
    DetectorMalfunction(u32),
}

impl FatalError {
    /// Process exit code for this error.
    ///
    /// Detector malfunction surfaces the tool's own count so the user sees
    /// exactly what the tool reported.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Tracker(_) => 3,
            Self::SeenStore(_) => 4,
            Self::DetectorUnavailable => 99,
            Self::DetectorMalfunction(count) => *count as i32,
        }
    }
}
