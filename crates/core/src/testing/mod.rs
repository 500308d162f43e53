//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of all external collaborator
//! traits, allowing full pipeline testing without a tracker, ffmpeg, or
//! detection tooling on the machine.
//!
//! # Example
//!
//! ```rust,ignore
//! use flacforge_core::testing::{test_group, test_release, MockTracker};
//!
//! let release = test_release(456);
//! let tracker = MockTracker::new().with_group(test_group(123, vec![release]));
//! ```

mod mock_detector;
mod mock_encoder;
mod mock_packager;
mod mock_tag_checker;
mod mock_tracker;

pub use mock_detector::MockDetector;
pub use mock_encoder::MockEncoder;
pub use mock_packager::MockPackager;
pub use mock_tag_checker::MockTagChecker;
pub use mock_tracker::MockTracker;

use crate::tracker::{Release, ReleaseGroup};
use crate::validator::{AudioFileTags, SourceScan};

/// A lossless CD release with a confirmed edition and sensible defaults.
pub fn test_release(id: u64) -> Release {
    Release {
        id,
        group_id: 100,
        media: "CD".to_string(),
        format: "FLAC".to_string(),
        encoding: "Lossless".to_string(),
        remastered: true,
        remaster_year: 2001,
        remaster_title: "Deluxe Edition".to_string(),
        remaster_label: "Some Label".to_string(),
        remaster_catalogue_number: "SL-001".to_string(),
        scene: false,
        reported: false,
        lossy_web_approved: false,
        lossy_master_approved: false,
        file_path: "Artist - Album (2001) [FLAC]".to_string(),
        file_list: vec![
            "01 - One.flac".to_string(),
            "02 - Two.flac".to_string(),
        ],
    }
}

/// A release group wrapping the given releases.
pub fn test_group(id: u64, releases: Vec<Release>) -> ReleaseGroup {
    ReleaseGroup {
        id,
        artist: "Test Artist".to_string(),
        name: "Test Album".to_string(),
        year: 1999,
        releases,
    }
}

/// A fully tagged stereo scan, matching [`test_release`]'s file list.
pub fn test_scan() -> SourceScan {
    SourceScan {
        files: vec![
            AudioFileTags {
                path: "01 - One.flac".into(),
                artist: Some("Test Artist".to_string()),
                album: Some("Test Album".to_string()),
                title: Some("One".to_string()),
                track: Some("1".to_string()),
                channels: 2,
            },
            AudioFileTags {
                path: "02 - Two.flac".into(),
                artist: Some("Test Artist".to_string()),
                album: Some("Test Album".to_string()),
                title: Some("Two".to_string()),
                track: Some("2".to_string()),
                channels: 2,
            },
        ],
    }
}
