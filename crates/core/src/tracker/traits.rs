//! Trait definitions for the tracker module.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::formats::TargetFormat;

use super::error::TrackerError;
use super::types::ReleaseGroup;

/// An owned (group, release) reference produced by the candidate listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnedRelease {
    pub group_id: u64,
    pub release_id: u64,
}

/// A request to publish a newly produced format back to the catalog.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub group_id: u64,
    /// The release the transcode was derived from.
    pub source_release_id: u64,
    pub format: TargetFormat,
    pub media: String,
    pub remaster_year: u16,
    pub remaster_title: String,
    pub remaster_label: String,
    pub remaster_catalogue_number: String,
    /// The .torrent descriptor to upload.
    pub torrent_path: PathBuf,
    /// Human-readable description of the transcode recipe and source.
    pub description: String,
}

/// A Gazelle-style tracker catalog.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Returns the name of this tracker implementation.
    fn name(&self) -> &str;

    /// Lists (group, release) pairs the user owns, filtered server-side to
    /// the given media types. Order-stable across identical calls.
    async fn list_owned(&self, media_types: &[String])
        -> Result<Vec<OwnedRelease>, TrackerError>;

    /// Fetches a release group with all its sibling releases.
    async fn release_group(&self, group_id: u64) -> Result<ReleaseGroup, TrackerError>;

    /// Submits a new format under an existing group.
    async fn submit_format(&self, request: SubmitRequest) -> Result<(), TrackerError>;
}
