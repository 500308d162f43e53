//! FFmpeg-based encoder implementation.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use async_trait::async_trait;

use crate::formats::{SourceEncoding, TargetFormat};

use super::config::EncoderConfig;
use super::error::EncoderError;
use super::traits::{AudioInfo, EncodeJob, Encoder};

/// Non-audio files carried over into the encoded directory.
const EXTRA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "pdf", "txt", "log", "cue"];

/// FFmpeg-based encoder implementation.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Walks the source directory collecting FLAC files and carried-over
    /// extras, both sorted for deterministic ordering.
    fn collect_files(source_dir: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut flacs = Vec::new();
        let mut extras = Vec::new();

        for entry in WalkDir::new(source_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.into_path();
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();

            if ext == "flac" {
                flacs.push(path);
            } else if EXTRA_EXTENSIONS.contains(&ext.as_str()) {
                extras.push(path);
            }
        }

        flacs.sort();
        extras.sort();
        (flacs, extras)
    }

    /// Output path mirroring the file's position under the source dir.
    fn output_path(
        out_dir: &Path,
        source_dir: &Path,
        source_file: &Path,
        extension: &str,
    ) -> PathBuf {
        let relative = source_file.strip_prefix(source_dir).unwrap_or(source_file);
        out_dir.join(relative).with_extension(extension)
    }

    /// Builds ffmpeg arguments for one file.
    fn build_encode_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        format: TargetFormat,
        info: &AudioInfo,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            // Audio stream only; embedded art does not survive transcoding.
            "-map".to_string(),
            "0:a".to_string(),
            // Carry source tags into the output.
            "-map_metadata".to_string(),
            "0".to_string(),
        ];

        args.extend(
            format
                .descriptor()
                .ffmpeg_args
                .iter()
                .map(|s| s.to_string()),
        );

        // 24-bit sources get resampled down to a CD-compatible rate for the
        // 16-bit target: 44.1kHz for 44.1-multiples, 48kHz otherwise.
        if format == TargetFormat::Flac16 && info.sample_rate > 48_000 {
            let target_rate = if info.sample_rate % 44_100 == 0 {
                44_100
            } else {
                48_000
            };
            args.extend(["-ar".to_string(), target_rate.to_string()]);
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_path.to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into AudioInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<AudioInfo, EncoderError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            sample_rate: Option<String>,
            channels: Option<u8>,
            bits_per_raw_sample: Option<String>,
            bits_per_sample: Option<u32>,
            sample_fmt: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| EncoderError::ProbeFailed {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "audio")
            .ok_or_else(|| EncoderError::probe_failed(format!("no audio stream in {:?}", path)))?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let sample_rate = stream
            .sample_rate
            .as_ref()
            .and_then(|r| r.parse::<u32>().ok())
            .unwrap_or(0);

        // FLAC reports the meaningful depth in bits_per_raw_sample;
        // bits_per_sample is often 0. Fall back to the sample format.
        let bits_per_sample = stream
            .bits_per_raw_sample
            .as_ref()
            .and_then(|b| b.parse::<u32>().ok())
            .filter(|b| *b > 0)
            .or(stream.bits_per_sample.filter(|b| *b > 0))
            .unwrap_or_else(|| match stream.sample_fmt.as_deref() {
                Some("s16" | "s16p") => 16,
                Some("s32" | "s32p") => 24,
                _ => 0,
            });

        Ok(AudioInfo {
            path: path.to_path_buf(),
            duration_secs,
            sample_rate,
            channels: stream.channels.unwrap_or(0),
            bits_per_sample,
        })
    }

    /// Runs one ffmpeg invocation.
    async fn run_ffmpeg(
        ffmpeg_path: &Path,
        args: &[String],
        input_path: &Path,
    ) -> Result<(), EncoderError> {
        let output = Command::new(ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::FfmpegNotFound {
                        path: ffmpeg_path.to_path_buf(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.chars().rev().take(2000).collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(EncoderError::encode_failed(
                format!(
                    "ffmpeg exited with {:?} for {:?}",
                    output.status.code(),
                    input_path
                ),
                if tail.is_empty() { None } else { Some(tail) },
            ));
        }

        Ok(())
    }

    /// Verifies every file's real bit depth against the release label.
    fn check_bit_depths(
        infos: &[AudioInfo],
        source_encoding: SourceEncoding,
    ) -> Result<(), EncoderError> {
        let labeled = match source_encoding {
            SourceEncoding::Lossless16 => 16,
            SourceEncoding::Lossless24 => 24,
            SourceEncoding::Lossy => return Ok(()),
        };

        for info in infos {
            if info.bits_per_sample != 0 && info.bits_per_sample != labeled {
                return Err(EncoderError::BitDepthMismatch {
                    path: info.path.clone(),
                    actual: info.bits_per_sample,
                    labeled,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<AudioInfo, EncoderError> {
        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EncoderError::probe_failed(format!(
                "ffprobe failed on {:?}: {}",
                path,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn encode(&self, job: EncodeJob) -> Result<PathBuf, EncoderError> {
        if !job.source_dir.is_dir() {
            return Err(EncoderError::SourceNotFound {
                path: job.source_dir.clone(),
            });
        }

        let out_dir = job.dest_root.join(&job.basename);
        if out_dir.exists() {
            return Err(EncoderError::OutputExists { path: out_dir });
        }

        let (flacs, extras) = Self::collect_files(&job.source_dir);
        if flacs.is_empty() {
            return Err(EncoderError::NoAudioFiles {
                path: job.source_dir.clone(),
            });
        }

        info!(
            "Encoding {} files from {:?} to {} ({} parallel jobs)",
            flacs.len(),
            job.source_dir,
            job.format,
            self.config.concurrency
        );

        // Probe everything up front; the bit depth check must run before
        // the first encode starts.
        let mut infos = Vec::with_capacity(flacs.len());
        for flac in &flacs {
            infos.push(self.probe(flac).await?);
        }
        Self::check_bit_depths(&infos, job.source_encoding)?;

        tokio::fs::create_dir_all(&out_dir).await?;

        let extension = job.format.descriptor().extension;
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut join_set: JoinSet<Result<(), EncoderError>> = JoinSet::new();

        for info in &infos {
            let output_path =
                Self::output_path(&out_dir, &job.source_dir, &info.path, extension);
            let args = self.build_encode_args(&info.path, &output_path, job.format, info);
            let ffmpeg_path = self.config.ffmpeg_path.clone();
            let input_path = info.path.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| EncoderError::encode_failed("encoder shut down", None))?;

                if let Some(parent) = output_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }

                debug!("Encoding {:?}", input_path);
                Self::run_ffmpeg(&ffmpeg_path, &args, &input_path).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let result = joined
                .map_err(|e| EncoderError::encode_failed(format!("encode task failed: {}", e), None))
                .and_then(|r| r);

            if let Err(e) = result {
                join_set.abort_all();
                // Partial output is useless; remove it so a retry starts clean.
                if let Err(rm) = tokio::fs::remove_dir_all(&out_dir).await {
                    warn!("Failed to remove partial output {:?}: {}", out_dir, rm);
                }
                return Err(e);
            }
        }

        for extra in &extras {
            let dest = Self::output_path(
                &out_dir,
                &job.source_dir,
                extra,
                &extra
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(extra, &dest).await?;
        }

        Ok(out_dir)
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EncoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(EncoderError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EncoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(EncoderError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(sample_rate: u32, bits: u32) -> AudioInfo {
        AudioInfo {
            path: PathBuf::from("/src/01.flac"),
            duration_secs: 180.0,
            sample_rate,
            channels: 2,
            bits_per_sample: bits,
        }
    }

    #[test]
    fn test_build_args_v0() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_encode_args(
            Path::new("/src/01.flac"),
            Path::new("/out/01.mp3"),
            TargetFormat::Mp3V0,
            &info(44_100, 16),
        );

        assert!(args.contains(&"libmp3lame".to_string()));
        assert!(args.contains(&"-q:a".to_string()));
        assert!(args.contains(&"0".to_string()));
        assert!(args.contains(&"-map_metadata".to_string()));
        assert!(!args.contains(&"-ar".to_string()));
    }

    #[test]
    fn test_build_args_320() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_encode_args(
            Path::new("/src/01.flac"),
            Path::new("/out/01.mp3"),
            TargetFormat::Mp3320,
            &info(44_100, 16),
        );

        assert!(args.contains(&"-b:a".to_string()));
        assert!(args.contains(&"320k".to_string()));
    }

    #[test]
    fn test_build_args_flac16_resample_multiple_of_44100() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_encode_args(
            Path::new("/src/01.flac"),
            Path::new("/out/01.flac"),
            TargetFormat::Flac16,
            &info(88_200, 24),
        );

        assert!(args.contains(&"-sample_fmt".to_string()));
        assert!(args.contains(&"s16".to_string()));
        let ar_pos = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[ar_pos + 1], "44100");
    }

    #[test]
    fn test_build_args_flac16_resample_96k() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_encode_args(
            Path::new("/src/01.flac"),
            Path::new("/out/01.flac"),
            TargetFormat::Flac16,
            &info(96_000, 24),
        );

        let ar_pos = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[ar_pos + 1], "48000");
    }

    #[test]
    fn test_build_args_flac16_no_resample_at_44100() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_encode_args(
            Path::new("/src/01.flac"),
            Path::new("/out/01.flac"),
            TargetFormat::Flac16,
            &info(44_100, 24),
        );
        assert!(!args.contains(&"-ar".to_string()));
    }

    #[test]
    fn test_output_path_preserves_subdirs() {
        let out = FfmpegEncoder::output_path(
            Path::new("/out/Album [V0]"),
            Path::new("/src/Album"),
            Path::new("/src/Album/CD1/01 - Track.flac"),
            "mp3",
        );
        assert_eq!(out, PathBuf::from("/out/Album [V0]/CD1/01 - Track.mp3"));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": { "duration": "212.4" },
            "streams": [
                {
                    "codec_type": "audio",
                    "sample_rate": "96000",
                    "channels": 2,
                    "bits_per_raw_sample": "24",
                    "sample_fmt": "s32"
                }
            ]
        }"#;

        let info = FfmpegEncoder::parse_probe_output(Path::new("t.flac"), json).unwrap();
        assert_eq!(info.sample_rate, 96_000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bits_per_sample, 24);
        assert!((info.duration_secs - 212.4).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_output_sample_fmt_fallback() {
        let json = r#"{
            "format": {},
            "streams": [
                { "codec_type": "audio", "sample_rate": "44100", "channels": 2, "sample_fmt": "s16" }
            ]
        }"#;

        let info = FfmpegEncoder::parse_probe_output(Path::new("t.flac"), json).unwrap();
        assert_eq!(info.bits_per_sample, 16);
    }

    #[test]
    fn test_check_bit_depths_mismatch() {
        let infos = vec![info(44_100, 16), info(44_100, 24)];
        let result = FfmpegEncoder::check_bit_depths(&infos, SourceEncoding::Lossless16);
        assert!(matches!(
            result,
            Err(EncoderError::BitDepthMismatch { actual: 24, .. })
        ));
    }

    #[test]
    fn test_check_bit_depths_unknown_depth_passes() {
        // Probe could not determine a depth; do not reject on 0.
        let infos = vec![info(44_100, 0)];
        assert!(FfmpegEncoder::check_bit_depths(&infos, SourceEncoding::Lossless24).is_ok());
    }
}
