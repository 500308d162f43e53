//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::encoder::{AudioInfo, EncodeJob, Encoder, EncoderError};
use crate::formats::TargetFormat;

/// Mock implementation of the Encoder trait.
///
/// Successful encodes create the destination directory with one placeholder
/// audio file, so packaging and persistence can run against real paths.
/// Failures are scripted per target format; a bit-depth mismatch can be
/// forced to exercise the abort-remaining-formats path.
#[derive(Debug, Default)]
pub struct MockEncoder {
    failures: HashMap<TargetFormat, String>,
    bit_depth_mismatch: bool,
    jobs: Arc<RwLock<Vec<EncodeJob>>>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes encodes of `format` fail with the given reason.
    pub fn with_failure(mut self, format: TargetFormat, reason: impl Into<String>) -> Self {
        self.failures.insert(format, reason.into());
        self
    }

    /// Makes every encode fail with a bit-depth mismatch.
    pub fn with_bit_depth_mismatch(mut self) -> Self {
        self.bit_depth_mismatch = true;
        self
    }

    /// All encode jobs received so far, in order.
    pub async fn jobs(&self) -> Vec<EncodeJob> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock-encoder"
    }

    async fn probe(&self, path: &Path) -> Result<AudioInfo, EncoderError> {
        Ok(AudioInfo {
            path: path.to_path_buf(),
            duration_secs: 180.0,
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
        })
    }

    async fn encode(&self, job: EncodeJob) -> Result<PathBuf, EncoderError> {
        self.jobs.write().await.push(job.clone());

        if self.bit_depth_mismatch {
            return Err(EncoderError::BitDepthMismatch {
                path: job.source_dir.join("01 - One.flac"),
                actual: 16,
                labeled: 24,
            });
        }
        if let Some(reason) = self.failures.get(&job.format) {
            return Err(EncoderError::encode_failed(reason.clone(), None));
        }

        let out_dir = job.dest_root.join(&job.basename);
        tokio::fs::create_dir_all(&out_dir).await?;
        let extension = job.format.descriptor().extension;
        tokio::fs::write(out_dir.join(format!("01 - One.{}", extension)), b"audio").await?;
        Ok(out_dir)
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        Ok(())
    }
}
