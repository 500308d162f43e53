//! Domain types for tracker releases and groups.

use serde::{Deserialize, Serialize};

use crate::formats::SourceEncoding;

/// One encoding/edition instance of a musical work. Immutable snapshot of
/// the tracker's state at fetch time; refreshing requires a re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub group_id: u64,
    pub media: String,
    /// Container, e.g. "FLAC" or "MP3".
    pub format: String,
    /// Encoding label, e.g. "Lossless", "24bit Lossless", "320".
    pub encoding: String,
    pub remastered: bool,
    pub remaster_year: u16,
    pub remaster_title: String,
    pub remaster_label: String,
    pub remaster_catalogue_number: String,
    pub scene: bool,
    pub reported: bool,
    pub lossy_web_approved: bool,
    pub lossy_master_approved: bool,
    /// Directory name of the release under the library source root. Empty
    /// when the tracker only exposes a file listing.
    pub file_path: String,
    /// File names within the release, fallback source of the directory
    /// structure when `file_path` is empty.
    pub file_list: Vec<String>,
}

impl Release {
    /// Classifies this release's source encoding.
    pub fn source_encoding(&self) -> SourceEncoding {
        SourceEncoding::parse(&self.format, &self.encoding)
    }

    /// Grouping key identifying "the same pressing" within a group.
    pub fn edition_key(&self) -> EditionKey {
        EditionKey {
            media: self.media.clone(),
            remaster_year: self.remaster_year,
            remaster_title: self.remaster_title.clone(),
            remaster_label: self.remaster_label.clone(),
            remaster_catalogue_number: self.remaster_catalogue_number.clone(),
        }
    }

    /// Permalink to this release on the tracker.
    pub fn permalink(&self, base_url: &str) -> String {
        format!(
            "{}/torrents.php?id={}&torrentid={}",
            base_url.trim_end_matches('/'),
            self.group_id,
            self.id
        )
    }
}

/// The family of sibling releases representing one musical work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub id: u64,
    pub artist: String,
    pub name: String,
    pub year: u16,
    pub releases: Vec<Release>,
}

impl ReleaseGroup {
    /// Finds a release by id within this group.
    pub fn release(&self, release_id: u64) -> Option<&Release> {
        self.releases.iter().find(|r| r.id == release_id)
    }
}

/// Edition identity: releases sharing this key are "the same pressing".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditionKey {
    pub media: String,
    pub remaster_year: u16,
    pub remaster_title: String,
    pub remaster_label: String,
    pub remaster_catalogue_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::SourceEncoding;

    fn release(id: u64) -> Release {
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
            file_list: vec!["01 - Track.flac".to_string()],
        }
    }

    #[test]
    fn test_edition_key_equality() {
        let a = release(1);
        let mut b = release(2);
        assert_eq!(a.edition_key(), b.edition_key());

        b.remaster_year = 2002;
        assert_ne!(a.edition_key(), b.edition_key());
    }

    #[test]
    fn test_source_encoding() {
        let mut r = release(1);
        assert_eq!(r.source_encoding(), SourceEncoding::Lossless16);
        r.encoding = "24bit Lossless".to_string();
        assert_eq!(r.source_encoding(), SourceEncoding::Lossless24);
        r.format = "MP3".to_string();
        assert_eq!(r.source_encoding(), SourceEncoding::Lossy);
    }

    #[test]
    fn test_permalink() {
        let r = release(55);
        assert_eq!(
            r.permalink("https://tracker.example/"),
            "https://tracker.example/torrents.php?id=100&torrentid=55"
        );
    }
}
