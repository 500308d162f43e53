//! Mock tag checker for testing.

use async_trait::async_trait;
use std::path::Path;

use crate::validator::{SourceScan, TagChecker, ValidatorError};

/// Mock implementation of the TagChecker trait.
///
/// Returns the same configured scan for every directory. Defaults to the
/// fully tagged stereo scan from [`crate::testing::test_scan`].
#[derive(Debug)]
pub struct MockTagChecker {
    scan: SourceScan,
    failure: Option<String>,
}

impl Default for MockTagChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTagChecker {
    pub fn new() -> Self {
        Self {
            scan: crate::testing::test_scan(),
            failure: None,
        }
    }

    /// Uses `scan` instead of the default.
    pub fn with_scan(mut self, scan: SourceScan) -> Self {
        self.scan = scan;
        self
    }

    /// Makes every scan fail.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

#[async_trait]
impl TagChecker for MockTagChecker {
    async fn scan(&self, _dir: &Path) -> Result<SourceScan, ValidatorError> {
        match &self.failure {
            Some(reason) => Err(ValidatorError::Scan(reason.clone())),
            None => Ok(self.scan.clone()),
        }
    }
}
