//! Tag well-formedness scanning.
//!
//! Every source file must carry artist, album, title and a track number.
//! Track-number FORMATTING is deliberately not checked here; tag copying
//! during encode normalizes it.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use walkdir::WalkDir;

use super::ValidatorError;

/// Tags and channel layout of one source audio file.
#[derive(Debug, Clone)]
pub struct AudioFileTags {
    pub path: PathBuf,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track: Option<String>,
    pub channels: u8,
}

impl AudioFileTags {
    /// The first missing required tag, if any.
    fn missing_tag(&self) -> Option<&'static str> {
        if self.artist.as_deref().unwrap_or("").is_empty() {
            Some("artist")
        } else if self.album.as_deref().unwrap_or("").is_empty() {
            Some("album")
        } else if self.title.as_deref().unwrap_or("").is_empty() {
            Some("title")
        } else if self.track.as_deref().unwrap_or("").is_empty() {
            Some("track number")
        } else {
            None
        }
    }
}

/// Per-file scan of a release's source directory.
#[derive(Debug, Clone, Default)]
pub struct SourceScan {
    pub files: Vec<AudioFileTags>,
}

impl SourceScan {
    /// Highest channel count across all files.
    pub fn max_channels(&self) -> u8 {
        self.files.iter().map(|f| f.channels).max().unwrap_or(0)
    }

    /// First tag problem across all files, with file context.
    pub fn first_tag_problem(&self) -> Option<String> {
        self.files.iter().find_map(|f| {
            f.missing_tag()
                .map(|tag| format!("{:?} is missing its {} tag", f.path, tag))
        })
    }
}

/// Produces a [`SourceScan`] for a release directory.
#[async_trait]
pub trait TagChecker: Send + Sync {
    async fn scan(&self, dir: &Path) -> Result<SourceScan, ValidatorError>;
}

/// ffprobe-backed tag scanner.
pub struct FfprobeTagChecker {
    ffprobe_path: PathBuf,
}

impl FfprobeTagChecker {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn parse_probe(path: &Path, output: &str) -> Result<AudioFileTags, ValidatorError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            #[serde(default)]
            tags: HashMap<String, String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            channels: Option<u8>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| ValidatorError::Scan(format!("bad ffprobe output for {:?}: {}", path, e)))?;

        // Vorbis comment keys are case-insensitive in the wild.
        let tag = |name: &str| -> Option<String> {
            probe
                .format
                .tags
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        };

        let channels = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "audio")
            .and_then(|s| s.channels)
            .unwrap_or(0);

        Ok(AudioFileTags {
            path: path.to_path_buf(),
            artist: tag("artist"),
            album: tag("album"),
            title: tag("title"),
            track: tag("track").or_else(|| tag("tracknumber")),
            channels,
        })
    }
}

#[async_trait]
impl TagChecker for FfprobeTagChecker {
    async fn scan(&self, dir: &Path) -> Result<SourceScan, ValidatorError> {
        let mut flacs: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .map(|e| e.to_string_lossy().eq_ignore_ascii_case("flac"))
                    .unwrap_or(false)
            })
            .collect();
        flacs.sort();

        let mut files = Vec::with_capacity(flacs.len());
        for flac in flacs {
            let output = Command::new(&self.ffprobe_path)
                .args([
                    "-v",
                    "quiet",
                    "-print_format",
                    "json",
                    "-show_format",
                    "-show_streams",
                ])
                .arg(&flac)
                .output()
                .await
                .map_err(|e| ValidatorError::Scan(format!("failed to run ffprobe: {}", e)))?;

            if !output.status.success() {
                return Err(ValidatorError::Scan(format!(
                    "ffprobe failed on {:?}: {}",
                    flac,
                    String::from_utf8_lossy(&output.stderr)
                )));
            }

            files.push(Self::parse_probe(
                &flac,
                &String::from_utf8_lossy(&output.stdout),
            )?);
        }

        Ok(SourceScan { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_tags() {
        let json = r#"{
            "format": {
                "tags": {
                    "ARTIST": "Some Artist",
                    "Album": "Some Album",
                    "title": "Some Track",
                    "track": "03"
                }
            },
            "streams": [ { "codec_type": "audio", "channels": 2 } ]
        }"#;

        let tags = FfprobeTagChecker::parse_probe(Path::new("t.flac"), json).unwrap();
        assert_eq!(tags.artist.as_deref(), Some("Some Artist"));
        assert_eq!(tags.album.as_deref(), Some("Some Album"));
        assert_eq!(tags.track.as_deref(), Some("03"));
        assert_eq!(tags.channels, 2);
        assert!(tags.missing_tag().is_none());
    }

    #[test]
    fn test_parse_probe_tracknumber_alias() {
        let json = r#"{
            "format": { "tags": { "artist": "A", "album": "B", "title": "C", "TRACKNUMBER": "1" } },
            "streams": [ { "codec_type": "audio", "channels": 2 } ]
        }"#;
        let tags = FfprobeTagChecker::parse_probe(Path::new("t.flac"), json).unwrap();
        assert_eq!(tags.track.as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_tag_reported() {
        let json = r#"{
            "format": { "tags": { "artist": "A", "title": "C", "track": "1" } },
            "streams": [ { "codec_type": "audio", "channels": 2 } ]
        }"#;
        let tags = FfprobeTagChecker::parse_probe(Path::new("t.flac"), json).unwrap();
        assert_eq!(tags.missing_tag(), Some("album"));

        let scan = SourceScan { files: vec![tags] };
        let problem = scan.first_tag_problem().unwrap();
        assert!(problem.contains("album"));
    }

    #[test]
    fn test_max_channels() {
        let scan = SourceScan {
            files: vec![
                AudioFileTags {
                    path: "a.flac".into(),
                    artist: Some("A".into()),
                    album: Some("B".into()),
                    title: Some("C".into()),
                    track: Some("1".into()),
                    channels: 2,
                },
                AudioFileTags {
                    path: "b.flac".into(),
                    artist: Some("A".into()),
                    album: Some("B".into()),
                    title: Some("C".into()),
                    track: Some("2".into()),
                    channels: 6,
                },
            ],
        };
        assert_eq!(scan.max_channels(), 6);
    }
}
