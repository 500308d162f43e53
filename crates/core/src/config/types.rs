use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::formats::TargetFormat;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub library: LibraryConfig,
    #[serde(default)]
    pub formats: FormatsConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub encoder: crate::encoder::EncoderConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Tracker API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Base URL of the Gazelle instance, e.g. "https://tracker.example".
    pub base_url: String,
    /// API key sent in the Authorization header.
    pub api_key: String,
    /// Announce URL embedded in created torrents. Required when publishing.
    #[serde(default)]
    pub announce_url: Option<String>,
    /// Page size for owned-release listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    500
}

/// Local filesystem layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root under which source release directories live.
    pub source_root: PathBuf,
    /// Root for finished encoded directories.
    pub output_root: PathBuf,
    /// Destination for produced .torrent descriptors.
    pub torrent_dir: PathBuf,
    /// Persistent seen-set cache file.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    /// Scratch space for per-format working directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("flacforge-seen.json")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("flacforge")
}

/// Desired target formats, in attempt priority order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatsConfig {
    #[serde(default = "default_desired")]
    pub desired: Vec<TargetFormat>,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            desired: default_desired(),
        }
    }
}

fn default_desired() -> Vec<TargetFormat> {
    vec![TargetFormat::Mp3V0, TargetFormat::Mp3320]
}

/// Acceptable source media types
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_media")]
    pub types: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            types: default_media(),
        }
    }
}

fn default_media() -> Vec<String> {
    vec!["CD".to_string(), "WEB".to_string()]
}

/// Transcode detection tool configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Local detection binary. Used when present on disk.
    #[serde(default)]
    pub binary: Option<PathBuf>,
    /// Container image running the same detection logic; fallback when the
    /// local binary is absent.
    #[serde(default)]
    pub container_image: Option<String>,
    /// Container runtime executable.
    #[serde(default = "default_docker_path")]
    pub docker_path: PathBuf,
}

fn default_docker_path() -> PathBuf {
    PathBuf::from("docker")
}

/// Publishing behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishConfig {
    /// Submit produced formats back to the tracker.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ask for confirmation before each submit.
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_confirmation: true,
        }
    }
}

fn default_true() -> bool {
    true
}
