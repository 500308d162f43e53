//! Audio encoding.
//!
//! Treated by the pipeline as a pure step: (source directory, target
//! format, basename) to an encoded directory. The production implementation
//! shells out to ffmpeg/ffprobe.

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::EncoderConfig;
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::{AudioInfo, EncodeJob, Encoder};
