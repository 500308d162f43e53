//! Mock transcode detector for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::validator::{DetectorError, TranscodeDetector};

/// Mock implementation of the TranscodeDetector trait.
///
/// Returns a scripted sequence of suspect counts, one per scan; once the
/// script is exhausted every further scan reports zero. `failing()` builds
/// a detector whose scans always error, for exercising the
/// tool-unavailable path.
#[derive(Debug)]
pub struct MockDetector {
    scripted: Mutex<VecDeque<u32>>,
    fail: bool,
}

impl MockDetector {
    /// A detector that reports the given counts in order.
    pub fn counts(counts: Vec<u32>) -> Self {
        Self {
            scripted: Mutex::new(counts.into()),
            fail: false,
        }
    }

    /// A detector whose every scan fails to run.
    pub fn failing() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl TranscodeDetector for MockDetector {
    fn name(&self) -> &str {
        "mock-detector"
    }

    async fn scan(&self, _dir: &Path) -> Result<u32, DetectorError> {
        if self.fail {
            return Err(DetectorError::NoExitStatus);
        }
        let mut scripted = self.scripted.lock().unwrap();
        Ok(scripted.pop_front().unwrap_or(0))
    }
}
