//! The run driver.
//!
//! Walks the candidate sequence through the full chain: fetch, gap
//! analysis, eligibility, validation, processing, bookkeeping. Every
//! decisive outcome marks the release seen and flushes the seen set before
//! the next candidate, so an interrupted run never repeats finished work.
//! Transient outcomes (missing source, unresolved report, fetch failure)
//! deliberately leave the release unmarked.

use std::path::{Component, Path};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::FatalError;
use crate::seen::SeenSet;
use crate::tracker::{Release, TrackerError};
use crate::validator::{SourceValidator, ValidatorError};

use super::candidates::gather_candidates;
use super::eligibility::{check_eligibility, Eligibility};
use super::gaps::missing_formats;
use super::processor::FormatProcessor;
use super::types::{Candidate, PipelineDeps, RunSummary};
use super::workdir::WorkDir;

/// Per-invocation switches, derived from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit release references; empty means "list the whole catalog".
    pub references: Vec<String>,
    /// Stop after the first successfully produced format per release.
    pub single: bool,
    /// Whether produced formats are uploaded back to the catalog.
    pub publish: bool,
}

enum Disposition {
    /// Done with this candidate; mark it seen.
    MarkSeen,
    /// Skip for now; reconsider on a future run.
    LeaveUnseen,
}

pub struct PipelineDriver {
    config: Config,
    deps: PipelineDeps,
    validator: SourceValidator,
}

impl PipelineDriver {
    pub fn new(config: Config, deps: PipelineDeps) -> Self {
        let validator = SourceValidator::new(deps.detector.clone());
        Self {
            config,
            deps,
            validator,
        }
    }

    /// Runs the full pipeline once. Returns statistics, or the first fatal
    /// error encountered.
    pub async fn run(
        &self,
        seen: &mut SeenSet,
        options: &RunOptions,
    ) -> Result<RunSummary, FatalError> {
        let candidates = gather_candidates(
            &options.references,
            &self.config.media.types,
            self.deps.tracker.as_ref(),
            seen,
        )
        .await?;

        let mut summary = RunSummary {
            candidates: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            match self.handle(candidate, options, &mut summary).await? {
                Disposition::MarkSeen => {
                    if seen.mark(candidate.release_id) {
                        seen.flush()
                            .await
                            .map_err(|e| FatalError::SeenStore(e.to_string()))?;
                    }
                }
                Disposition::LeaveUnseen => {}
            }
        }

        info!(
            "Run complete: {} candidate(s), {} processed, {} skipped, {} format(s) produced, {} failed",
            summary.candidates,
            summary.processed,
            summary.skipped,
            summary.formats_done,
            summary.formats_failed
        );
        Ok(summary)
    }

    async fn handle(
        &self,
        candidate: Candidate,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) -> Result<Disposition, FatalError> {
        let group = match self.deps.tracker.release_group(candidate.group_id).await {
            Ok(group) => group,
            Err(TrackerError::GroupNotFound(id)) => {
                warn!("Group {} not found, skipping", id);
                summary.skipped += 1;
                return Ok(Disposition::LeaveUnseen);
            }
            Err(e) => {
                warn!("Failed to fetch group {}: {}, skipping", candidate.group_id, e);
                summary.skipped += 1;
                return Ok(Disposition::LeaveUnseen);
            }
        };

        let release = match group.release(candidate.release_id) {
            Some(release) => release,
            None => {
                warn!(
                    "Release {} not in group {}, skipping",
                    candidate.release_id, candidate.group_id
                );
                summary.skipped += 1;
                return Ok(Disposition::LeaveUnseen);
            }
        };

        // Reports are checked before anything else is spent on the
        // candidate, and never burn it.
        if release.reported {
            info!(
                "Release {} is reported, deferring to a future run",
                release.id
            );
            summary.skipped += 1;
            return Ok(Disposition::LeaveUnseen);
        }

        let gaps = missing_formats(&group, release, &self.config.formats.desired);
        if gaps.is_empty() {
            info!("Release {}: no missing formats", release.id);
            summary.skipped += 1;
            return Ok(Disposition::MarkSeen);
        }

        // Folderless releases are staged from the file listing; the guard
        // keeps the staged directory alive until the candidate is done.
        let mut stage: Option<WorkDir> = None;
        let source_dir = if release.file_path.is_empty() {
            if release.file_list.is_empty() {
                warn!(
                    "Release {} has no recorded directory or file listing in the catalog",
                    release.id
                );
                summary.skipped += 1;
                return Ok(Disposition::MarkSeen);
            }
            match self.stage_loose_files(release).await {
                Ok(Some(staged)) => {
                    let dir = staged.path().to_path_buf();
                    stage = Some(staged);
                    dir
                }
                Ok(None) => {
                    info!(
                        "Release {}: listed files not all present locally, skipping",
                        release.id
                    );
                    summary.skipped += 1;
                    return Ok(Disposition::LeaveUnseen);
                }
                Err(e) => {
                    warn!("Release {}: staging listed files failed: {}", release.id, e);
                    summary.skipped += 1;
                    return Ok(Disposition::LeaveUnseen);
                }
            }
        } else {
            let source_dir = self.config.library.source_root.join(&release.file_path);
            if !source_dir.is_dir() {
                info!(
                    "Release {}: source directory {:?} not present locally, skipping",
                    release.id, source_dir
                );
                summary.skipped += 1;
                return Ok(Disposition::LeaveUnseen);
            }
            source_dir
        };

        let scan = match self.deps.tag_checker.scan(&source_dir).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Release {}: source scan failed: {}", release.id, e);
                summary.skipped += 1;
                return Ok(Disposition::MarkSeen);
            }
        };

        match check_eligibility(release, scan.max_channels()) {
            Eligibility::Eligible => {}
            Eligibility::Rejected(reason) => {
                info!("Release {} rejected: {}", release.id, reason);
                summary.skipped += 1;
                return Ok(Disposition::MarkSeen);
            }
            Eligibility::SkipUnseen(reason) => {
                info!("Release {} deferred: {}", release.id, reason);
                summary.skipped += 1;
                return Ok(Disposition::LeaveUnseen);
            }
        }

        match self.validator.validate(release, &source_dir, &scan).await {
            Ok(()) => {}
            Err(ValidatorError::Fatal(fatal)) => return Err(fatal),
            Err(soft) => {
                warn!("Release {} failed validation: {}", release.id, soft);
                if matches!(soft, ValidatorError::TranscodeSuspected { .. }) {
                    warn!("Review the source spectrograms manually before trusting this release");
                }
                summary.skipped += 1;
                return Ok(Disposition::MarkSeen);
            }
        }

        info!(
            "Release {} ({} - {}): producing {:?}",
            release.id,
            group.artist,
            group.name,
            gaps.iter().map(|f| f.to_string()).collect::<Vec<_>>()
        );

        let processor = FormatProcessor::new(&self.config, &self.deps);
        let outcome = processor
            .process(
                &group,
                release,
                &gaps,
                &source_dir,
                options.single,
                options.publish && self.config.publish.enabled,
            )
            .await;

        summary.processed += 1;
        summary.formats_done += outcome.succeeded.len();
        summary.formats_failed += outcome.failed.len();
        for (format, reason) in &outcome.failed {
            error!("Release {}: {} not produced: {}", release.id, format, reason);
        }

        drop(stage);
        Ok(Disposition::MarkSeen)
    }

    /// Assembles a staging directory for a release whose files sit loose
    /// under the source root, linking each listed file in. Returns `None`
    /// when a listed file is absent or its path escapes the source root.
    async fn stage_loose_files(&self, release: &Release) -> std::io::Result<Option<WorkDir>> {
        let mut sources = Vec::with_capacity(release.file_list.len());
        for name in &release.file_list {
            let relative = Path::new(name);
            let safe = relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if !safe {
                warn!(
                    "Release {}: refusing to stage listed path {:?}",
                    release.id, name
                );
                return Ok(None);
            }
            let src = self.config.library.source_root.join(relative);
            if !src.is_file() {
                return Ok(None);
            }
            sources.push((src, relative.to_path_buf()));
        }

        let stage = WorkDir::create(&self.config.library.work_dir).await?;
        for (src, relative) in sources {
            let dest = stage.path().join(&relative);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            // Hard links keep the staging free; fall back to a copy when
            // the source root sits on another filesystem.
            if tokio::fs::hard_link(&src, &dest).await.is_err() {
                tokio::fs::copy(&src, &dest).await?;
            }
        }
        Ok(Some(stage))
    }
}
