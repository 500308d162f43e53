//! End-to-end driver tests against mock collaborators.
//!
//! Everything except the filesystem is mocked; source, output, torrent and
//! work directories live in a per-test tempdir.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use flacforge_core::config::{
    Config, DetectorConfig, FormatsConfig, LibraryConfig, MediaConfig, PublishConfig,
    TrackerConfig,
};
use flacforge_core::confirm::AutoConfirm;
use flacforge_core::encoder::EncoderConfig;
use flacforge_core::error::FatalError;
use flacforge_core::formats::TargetFormat;
use flacforge_core::pipeline::{PipelineDeps, PipelineDriver, RunOptions, RunSummary};
use flacforge_core::seen::SeenSet;
use flacforge_core::testing::{
    test_group, test_release, MockDetector, MockEncoder, MockPackager, MockTagChecker,
    MockTracker,
};
use flacforge_core::tracker::{OwnedRelease, Release};
use flacforge_core::validator::TranscodeDetector;

const GROUP_ID: u64 = 100;
const RELEASE_ID: u64 = 456;

fn config_in(root: &Path) -> Config {
    Config {
        tracker: TrackerConfig {
            base_url: "https://tracker.example".to_string(),
            api_key: "test-key".to_string(),
            announce_url: Some("https://tracker.example/announce".to_string()),
            page_size: 500,
        },
        library: LibraryConfig {
            source_root: root.join("source"),
            output_root: root.join("output"),
            torrent_dir: root.join("torrents"),
            cache_path: root.join("seen.json"),
            work_dir: root.join("work"),
        },
        formats: FormatsConfig::default(),
        media: MediaConfig::default(),
        encoder: EncoderConfig::default(),
        detector: DetectorConfig::default(),
        publish: PublishConfig {
            enabled: true,
            require_confirmation: false,
        },
    }
}

/// One driver wiring with swappable collaborators.
struct Harness {
    root: TempDir,
    tracker: Arc<MockTracker>,
    encoder: Arc<MockEncoder>,
    detector: Option<Arc<dyn TranscodeDetector>>,
}

impl Harness {
    fn new(tracker: MockTracker) -> Self {
        Self {
            root: TempDir::new().unwrap(),
            tracker: Arc::new(tracker),
            encoder: Arc::new(MockEncoder::new()),
            detector: Some(Arc::new(MockDetector::counts(vec![0]))),
        }
    }

    fn with_encoder(mut self, encoder: MockEncoder) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    fn with_detector(mut self, detector: Option<Arc<dyn TranscodeDetector>>) -> Self {
        self.detector = detector;
        self
    }

    /// Creates the source directory the given release claims to live in.
    fn materialize_source(&self, release: &Release) {
        let dir = self.root.path().join("source").join(&release.file_path);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("01 - One.flac"), b"flac").unwrap();
    }

    fn config(&self) -> Config {
        config_in(self.root.path())
    }

    fn driver(&self) -> PipelineDriver {
        let deps = PipelineDeps {
            tracker: self.tracker.clone(),
            tag_checker: Arc::new(MockTagChecker::new()),
            detector: self.detector.clone(),
            encoder: self.encoder.clone(),
            packager: Arc::new(MockPackager::new()),
            confirmer: Arc::new(AutoConfirm),
        };
        PipelineDriver::new(self.config(), deps)
    }

    fn seen(&self) -> SeenSet {
        SeenSet::empty(&self.root.path().join("seen.json"))
    }

    async fn run(&self, seen: &mut SeenSet, options: &RunOptions) -> Result<RunSummary, FatalError> {
        self.driver().run(seen, options).await
    }

    fn torrent_count(&self) -> usize {
        match std::fs::read_dir(self.root.path().join("torrents")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    fn work_dir_is_empty(&self) -> bool {
        match std::fs::read_dir(self.root.path().join("work")) {
            Ok(entries) => entries.count() == 0,
            // Never created counts as clean.
            Err(_) => true,
        }
    }
}

fn explicit_run() -> RunOptions {
    RunOptions {
        references: vec![format!("{}:{}", GROUP_ID, RELEASE_ID)],
        single: false,
        publish: true,
    }
}

fn listing_run() -> RunOptions {
    RunOptions {
        references: vec![],
        single: false,
        publish: true,
    }
}

fn single_release_tracker(release: Release) -> MockTracker {
    MockTracker::new()
        .with_owned(vec![OwnedRelease {
            group_id: GROUP_ID,
            release_id: RELEASE_ID,
        }])
        .with_group(test_group(GROUP_ID, vec![release]))
}

#[tokio::test]
async fn test_end_to_end_produces_and_publishes_missing_formats() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &explicit_run()).await.unwrap();

    // 16-bit lossless source: V0 and 320 are both missing and permitted.
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.formats_done, 2);
    assert_eq!(summary.formats_failed, 0);

    let submits = harness.tracker.submits().await;
    assert_eq!(submits.len(), 2);
    assert_eq!(submits[0].format, TargetFormat::Mp3V0);
    assert_eq!(submits[1].format, TargetFormat::Mp3320);
    assert_eq!(submits[0].group_id, GROUP_ID);
    assert!(submits[0].description.contains("torrents.php"));

    assert_eq!(harness.torrent_count(), 2);
    assert!(seen.contains(RELEASE_ID));
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn test_second_run_skips_seen_release() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let first = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(first.processed, 1);

    let second = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(second.candidates, 0);
    assert_eq!(second.processed, 0);

    // Still only the first run's submits.
    assert_eq!(harness.tracker.submits().await.len(), 2);
}

#[tokio::test]
async fn test_explicit_reference_overrides_seen_set() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();
    seen.mark(RELEASE_ID);

    let summary = harness.run(&mut seen, &explicit_run()).await.unwrap();
    assert_eq!(summary.processed, 1);
}

#[tokio::test]
async fn test_reported_release_is_deferred_not_burned() {
    let mut release = test_release(RELEASE_ID);
    release.reported = true;
    // Reported wins even over conditions that would otherwise burn the
    // release for good.
    release.scene = true;
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    // Re-emitted on the next listing.
    assert!(!seen.contains(RELEASE_ID));

    let again = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(again.candidates, 1);
}

#[tokio::test]
async fn test_scene_release_is_marked_seen() {
    let mut release = test_release(RELEASE_ID);
    release.scene = true;
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(seen.contains(RELEASE_ID));
    assert!(harness.tracker.submits().await.is_empty());
}

#[tokio::test]
async fn test_no_gaps_marks_seen_without_processing() {
    let flac = test_release(RELEASE_ID);
    let mut v0 = test_release(777);
    v0.format = "MP3".to_string();
    v0.encoding = "V0 (VBR)".to_string();
    let mut cbr = test_release(778);
    cbr.format = "MP3".to_string();
    cbr.encoding = "320".to_string();
    let tracker = MockTracker::new()
        .with_owned(vec![OwnedRelease {
            group_id: GROUP_ID,
            release_id: RELEASE_ID,
        }])
        .with_group(test_group(GROUP_ID, vec![flac.clone(), v0, cbr]));
    let harness = Harness::new(tracker);
    harness.materialize_source(&flac);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_missing_source_dir_skips_without_marking() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release));
    // No materialize_source: the directory does not exist locally.
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert!(!seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_folderless_release_is_staged_from_file_listing() {
    let mut release = test_release(RELEASE_ID);
    release.file_path = String::new();
    let harness = Harness::new(single_release_tracker(release.clone()));
    // The listed files sit loose at the top of the source root.
    let source = harness.root.path().join("source");
    std::fs::create_dir_all(&source).unwrap();
    for name in &release.file_list {
        std::fs::write(source.join(name), b"flac").unwrap();
    }
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.formats_done, 2);
    assert!(seen.contains(RELEASE_ID));
    // The staging directory is gone once the candidate is decided.
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn test_folderless_release_with_absent_files_skips_without_marking() {
    let mut release = test_release(RELEASE_ID);
    release.file_path = String::new();
    let harness = Harness::new(single_release_tracker(release));
    // Source root exists but holds none of the listed files.
    std::fs::create_dir_all(harness.root.path().join("source")).unwrap();
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert!(!seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_release_without_path_or_listing_is_marked_seen() {
    let mut release = test_release(RELEASE_ID);
    release.file_path = String::new();
    release.file_list = Vec::new();
    let harness = Harness::new(single_release_tracker(release));
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert!(seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_positive_detection_skips_and_marks_seen() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()))
        .with_detector(Some(Arc::new(MockDetector::counts(vec![5]))));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(seen.contains(RELEASE_ID));
    assert!(harness.tracker.submits().await.is_empty());
}

#[tokio::test]
async fn test_implausible_detection_count_is_fatal() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()))
        .with_detector(Some(Arc::new(MockDetector::counts(vec![150]))));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let err = harness.run(&mut seen, &listing_run()).await.unwrap_err();
    assert!(matches!(err, FatalError::DetectorMalfunction(150)));
    assert_eq!(err.exit_code(), 150);
    // A malfunction must not burn the release.
    assert!(!seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_missing_detector_is_fatal_when_needed() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone())).with_detector(None);
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let err = harness.run(&mut seen, &listing_run()).await.unwrap_err();
    assert!(matches!(err, FatalError::DetectorUnavailable));
    assert_eq!(err.exit_code(), 99);
}

#[tokio::test]
async fn test_lossy_approved_release_needs_no_detector() {
    let mut release = test_release(RELEASE_ID);
    release.lossy_master_approved = true;
    let harness = Harness::new(single_release_tracker(release.clone())).with_detector(None);
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.formats_done, 2);
}

#[tokio::test]
async fn test_partial_failure_still_marks_seen() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()))
        .with_encoder(MockEncoder::new().with_failure(TargetFormat::Mp3320, "lame exploded"));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.formats_done, 1);
    assert_eq!(summary.formats_failed, 1);
    assert!(seen.contains(RELEASE_ID));

    // Only the successful V0 was published and persisted.
    let submits = harness.tracker.submits().await;
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].format, TargetFormat::Mp3V0);
    assert_eq!(harness.torrent_count(), 1);
}

#[tokio::test]
async fn test_bit_depth_mismatch_aborts_remaining_formats() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()))
        .with_encoder(MockEncoder::new().with_bit_depth_mismatch());
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.formats_done, 0);
    assert_eq!(summary.formats_failed, 1);
    // The second format was never attempted.
    assert_eq!(harness.encoder.jobs().await.len(), 1);
    assert!(seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_failed_publish_is_not_persisted() {
    let release = test_release(RELEASE_ID);
    let tracker = single_release_tracker(release.clone()).with_submit_failure("upload rejected");
    let harness = Harness::new(tracker);
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.formats_done, 0);
    assert_eq!(summary.formats_failed, 2);
    assert_eq!(harness.torrent_count(), 0);
    // The candidate itself was decided; failures are per-format.
    assert!(seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_single_stops_after_first_produced_format() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let options = RunOptions {
        single: true,
        ..listing_run()
    };
    let summary = harness.run(&mut seen, &options).await.unwrap();
    assert_eq!(summary.formats_done, 1);
    assert_eq!(harness.encoder.jobs().await.len(), 1);
}

#[tokio::test]
async fn test_no_publish_still_encodes_and_persists() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let mut seen = harness.seen();

    let options = RunOptions {
        publish: false,
        ..listing_run()
    };
    let summary = harness.run(&mut seen, &options).await.unwrap();
    assert_eq!(summary.formats_done, 2);
    assert!(harness.tracker.submits().await.is_empty());
    assert_eq!(harness.torrent_count(), 2);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let harness = Harness::new(MockTracker::new().with_list_failure("maintenance"));
    let mut seen = harness.seen();

    let err = harness.run(&mut seen, &listing_run()).await.unwrap_err();
    assert!(matches!(err, FatalError::Tracker(_)));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_group_fetch_failure_skips_without_marking() {
    // Owned listing points at a group the tracker no longer knows.
    let tracker = MockTracker::new().with_owned(vec![OwnedRelease {
        group_id: GROUP_ID,
        release_id: RELEASE_ID,
    }]);
    let harness = Harness::new(tracker);
    let mut seen = harness.seen();

    let summary = harness.run(&mut seen, &listing_run()).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert!(!seen.contains(RELEASE_ID));
}

#[tokio::test]
async fn test_seen_set_survives_reload() {
    let release = test_release(RELEASE_ID);
    let harness = Harness::new(single_release_tracker(release.clone()));
    harness.materialize_source(&release);
    let cache_path = harness.root.path().join("seen.json");
    let mut seen = harness.seen();

    harness.run(&mut seen, &listing_run()).await.unwrap();

    // The driver flushed after deciding the candidate; a fresh load sees it.
    let reloaded = SeenSet::load(&cache_path).await.unwrap();
    assert!(reloaded.contains(RELEASE_ID));
}
