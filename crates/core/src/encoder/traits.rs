//! Trait definitions for the encoder module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::formats::{SourceEncoding, TargetFormat};

use super::error::EncoderError;

/// Technical info about one audio file.
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u32,
}

/// One release-level encode request.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Directory holding the source FLAC files.
    pub source_dir: PathBuf,
    /// Root under which the encoded directory is created.
    pub dest_root: PathBuf,
    /// Canonical directory name for the encoded release.
    pub basename: String,
    pub format: TargetFormat,
    /// The release's labeled source encoding, checked against the real
    /// files before any encode starts.
    pub source_encoding: SourceEncoding,
}

/// An encoder that can transcode a release directory.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Probes one audio file.
    async fn probe(&self, path: &Path) -> Result<AudioInfo, EncoderError>;

    /// Encodes a whole release directory, returning the encoded directory.
    async fn encode(&self, job: EncodeJob) -> Result<PathBuf, EncoderError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), EncoderError>;
}
