//! Per-format processing: encode, package, publish, persist.
//!
//! Formats are attempted in priority order with failure isolation: one bad
//! format never aborts the others. The two exceptions that do break the
//! remaining formats are a vanished source directory and the encoder's
//! bit-depth-mismatch sentinel, both of which affect every format equally.

use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::encoder::{EncodeJob, EncoderError};
use crate::formats::TargetFormat;
use crate::packager::PackageJob;
use crate::tracker::{Release, ReleaseGroup, SubmitRequest};

use super::types::{PipelineDeps, ProcessSummary};
use super::workdir::WorkDir;

/// Characters that cannot appear in a release directory name.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Canonical directory name for an encoded release.
pub fn release_basename(group: &ReleaseGroup, release: &Release, format: TargetFormat) -> String {
    let year = if release.remaster_year != 0 {
        release.remaster_year
    } else {
        group.year
    };

    let mut name = format!("{} - {}", group.artist, group.name);
    if !release.remaster_title.is_empty() {
        name.push_str(&format!(" ({})", release.remaster_title));
    }
    if year != 0 {
        name.push_str(&format!(" ({})", year));
    }
    name.push_str(&format!(" [{} {}]", release.media, format));

    name.replace(UNSAFE_CHARS, "-")
}

/// Transcode recipe restated in the release description.
fn recipe(format: TargetFormat) -> &'static str {
    match format {
        TargetFormat::Flac16 => {
            "ffmpeg -c:a flac -sample_fmt s16 (resampled to 44.1/48 kHz as needed)"
        }
        TargetFormat::Mp3V0 => "ffmpeg -c:a libmp3lame -q:a 0",
        TargetFormat::Mp3320 => "ffmpeg -c:a libmp3lame -b:a 320k",
    }
}

enum AttemptError {
    /// Break remaining formats for this release.
    BitDepth(EncoderError),
    /// This format failed; continue with the next.
    Failed(String),
}

/// Runs the encode-package-publish-persist chain per missing format.
pub struct FormatProcessor<'a> {
    config: &'a Config,
    deps: &'a PipelineDeps,
}

impl<'a> FormatProcessor<'a> {
    pub fn new(config: &'a Config, deps: &'a PipelineDeps) -> Self {
        Self { config, deps }
    }

    /// Attempts every format in `formats` for one release.
    pub async fn process(
        &self,
        group: &ReleaseGroup,
        release: &Release,
        formats: &[TargetFormat],
        source_dir: &Path,
        single: bool,
        publish: bool,
    ) -> ProcessSummary {
        let mut summary = ProcessSummary::default();

        for &format in formats {
            // Removable storage may have vanished mid-run; nothing further
            // can work without the source.
            if !source_dir.is_dir() {
                warn!(
                    "Source directory {:?} disappeared; skipping remaining formats for release {}",
                    source_dir, release.id
                );
                break;
            }

            match self
                .attempt(group, release, format, source_dir, publish)
                .await
            {
                Ok(()) => {
                    info!("Release {}: {} done", release.id, format);
                    summary.succeeded.push(format);
                    if single {
                        break;
                    }
                }
                Err(AttemptError::BitDepth(e)) => {
                    error!(
                        "Release {}: {}; aborting remaining formats (the defect affects all of them)",
                        release.id, e
                    );
                    summary.failed.push((format, e.to_string()));
                    break;
                }
                Err(AttemptError::Failed(reason)) => {
                    error!("Release {}: {} failed: {}", release.id, format, reason);
                    summary.failed.push((format, reason));
                }
            }
        }

        summary
    }

    async fn attempt(
        &self,
        group: &ReleaseGroup,
        release: &Release,
        format: TargetFormat,
        source_dir: &Path,
        publish: bool,
    ) -> Result<(), AttemptError> {
        // Scoped scratch space; removed on every exit path below.
        let work_dir = WorkDir::create(&self.config.library.work_dir)
            .await
            .map_err(|e| AttemptError::Failed(format!("cannot create work dir: {}", e)))?;

        let basename = release_basename(group, release, format);
        info!("Release {}: encoding {} -> {:?}", release.id, format, basename);

        let encoded_dir = self
            .deps
            .encoder
            .encode(EncodeJob {
                source_dir: source_dir.to_path_buf(),
                dest_root: self.config.library.output_root.clone(),
                basename: basename.clone(),
                format,
                source_encoding: release.source_encoding(),
            })
            .await
            .map_err(|e| match e {
                EncoderError::BitDepthMismatch { .. } => AttemptError::BitDepth(e),
                other => AttemptError::Failed(other.to_string()),
            })?;

        let package = self
            .deps
            .packager
            .package(PackageJob {
                content_dir: encoded_dir,
                work_dir: work_dir.path().to_path_buf(),
                announce_url: self
                    .config
                    .tracker
                    .announce_url
                    .clone()
                    .unwrap_or_default(),
            })
            .await
            .map_err(|e| AttemptError::Failed(e.to_string()))?;

        if publish {
            let description = format!(
                "Transcode of [url={}]{} - {}[/url] ({} source).\n\nProcess: {}",
                release.permalink(&self.config.tracker.base_url),
                group.artist,
                group.name,
                release.encoding,
                recipe(format),
            );

            let confirmed = !self.config.publish.require_confirmation
                || self
                    .deps
                    .confirmer
                    .confirm(&format!("Upload {}?", package.name))
                    .await;

            if confirmed {
                self.deps
                    .tracker
                    .submit_format(SubmitRequest {
                        group_id: group.id,
                        source_release_id: release.id,
                        format,
                        media: release.media.clone(),
                        remaster_year: release.remaster_year,
                        remaster_title: release.remaster_title.clone(),
                        remaster_label: release.remaster_label.clone(),
                        remaster_catalogue_number: release.remaster_catalogue_number.clone(),
                        torrent_path: package.torrent_path.clone(),
                        description,
                    })
                    .await
                    .map_err(|e| AttemptError::Failed(format!("upload failed: {}", e)))?;
                info!("Release {}: uploaded {}", release.id, package.name);
            } else {
                info!("Release {}: upload declined, keeping local artifacts", release.id);
            }
        }

        // Persist the descriptor outside the work dir before the guard
        // removes it.
        tokio::fs::create_dir_all(&self.config.library.torrent_dir)
            .await
            .map_err(|e| AttemptError::Failed(format!("cannot create torrent dir: {}", e)))?;
        let dest = self
            .config
            .library
            .torrent_dir
            .join(format!("{}.torrent", package.name));
        tokio::fs::copy(&package.torrent_path, &dest)
            .await
            .map_err(|e| AttemptError::Failed(format!("cannot persist torrent: {}", e)))?;

        Ok(())
    }
}
