//! Target format registry.
//!
//! Every encoding this tool can produce is described by a fixed
//! [`FormatDescriptor`]. The registry also encodes which source encodings
//! are allowed to produce which targets: a lossy source is never a valid
//! transcode source, and a 16-bit source cannot produce a 16-bit downsample
//! of itself.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media types the catalog knows about. A configured media type outside
/// this set is a configuration error.
pub const KNOWN_MEDIA: &[&str] = &[
    "CD",
    "DVD",
    "Vinyl",
    "Soundboard",
    "SACD",
    "DAT",
    "Cassette",
    "WEB",
    "Blu-Ray",
];

/// A target encoding this tool can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    /// 16-bit / 44.1kHz (or 48kHz) FLAC downsample of a 24-bit source.
    #[serde(rename = "FLAC16", alias = "flac16")]
    Flac16,
    /// MP3 V0 (VBR).
    #[serde(rename = "V0", alias = "v0")]
    Mp3V0,
    /// MP3 320 CBR.
    #[serde(rename = "320")]
    Mp3320,
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// The source encoding of a release, parsed from its catalog
/// (format, encoding) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// FLAC, "Lossless".
    Lossless16,
    /// FLAC, "24bit Lossless".
    Lossless24,
    /// Anything else (MP3, AAC, ...). Never a valid transcode source.
    Lossy,
}

impl SourceEncoding {
    /// Classifies a catalog (format, encoding) pair.
    pub fn parse(format: &str, encoding: &str) -> Self {
        if !format.eq_ignore_ascii_case("flac") {
            return Self::Lossy;
        }
        match encoding {
            "Lossless" => Self::Lossless16,
            "24bit Lossless" => Self::Lossless24,
            _ => Self::Lossy,
        }
    }

    /// Whether `target` may be derived from this source encoding.
    pub fn permits(&self, target: TargetFormat) -> bool {
        match self {
            Self::Lossless24 => true,
            Self::Lossless16 => !matches!(target, TargetFormat::Flac16),
            Self::Lossy => false,
        }
    }
}

/// Static definition of a target encoding.
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    /// Short name used in configuration and logs.
    pub name: &'static str,
    /// Catalog container name ("FLAC", "MP3").
    pub container: &'static str,
    /// Catalog encoding label ("Lossless", "V0 (VBR)", "320").
    pub encoding: &'static str,
    /// Output file extension.
    pub extension: &'static str,
    /// ffmpeg codec/quality arguments, excluding resample flags.
    pub ffmpeg_args: &'static [&'static str],
}

static REGISTRY: Lazy<Vec<(TargetFormat, FormatDescriptor)>> = Lazy::new(|| {
    vec![
        (
            TargetFormat::Flac16,
            FormatDescriptor {
                name: "FLAC16",
                container: "FLAC",
                encoding: "Lossless",
                extension: "flac",
                ffmpeg_args: &["-c:a", "flac", "-sample_fmt", "s16"],
            },
        ),
        (
            TargetFormat::Mp3V0,
            FormatDescriptor {
                name: "V0",
                container: "MP3",
                encoding: "V0 (VBR)",
                extension: "mp3",
                ffmpeg_args: &["-c:a", "libmp3lame", "-q:a", "0"],
            },
        ),
        (
            TargetFormat::Mp3320,
            FormatDescriptor {
                name: "320",
                container: "MP3",
                encoding: "320",
                extension: "mp3",
                ffmpeg_args: &["-c:a", "libmp3lame", "-b:a", "320k"],
            },
        ),
    ]
});

impl TargetFormat {
    /// All formats in registry order.
    pub fn all() -> Vec<TargetFormat> {
        REGISTRY.iter().map(|(f, _)| *f).collect()
    }

    /// The static descriptor for this format.
    pub fn descriptor(&self) -> &'static FormatDescriptor {
        REGISTRY
            .iter()
            .find(|(f, _)| f == self)
            .map(|(_, d)| d)
            .unwrap()
    }

    /// The catalog (container, encoding) pair this format produces.
    pub fn produces(&self) -> (&'static str, &'static str) {
        let d = self.descriptor();
        (d.container, d.encoding)
    }
}
