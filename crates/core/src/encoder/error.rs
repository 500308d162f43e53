//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Source directory missing or empty.
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// No audio files found under the source directory.
    #[error("No FLAC files found under: {path}")]
    NoAudioFiles { path: PathBuf },

    /// The output directory already exists.
    #[error("Output directory already exists: {path}")]
    OutputExists { path: PathBuf },

    /// A source file's real bit depth contradicts the release's labeled
    /// bit depth. Sentinel: aborts all remaining formats for the release,
    /// since the defect affects every format equally.
    #[error("Bit depth mismatch: {path} is {actual}-bit, release is labeled {labeled}-bit")]
    BitDepthMismatch {
        path: PathBuf,
        actual: u32,
        labeled: u32,
    },

    /// An ffmpeg invocation failed.
    #[error("Encode failed: {reason}")]
    EncodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Failed to probe an audio file.
    #[error("Failed to probe audio file: {reason}")]
    ProbeFailed { reason: String },

    /// I/O error during encoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoderError {
    /// Creates a new encode failed error with stderr output.
    pub fn encode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}
