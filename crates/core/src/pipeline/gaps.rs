//! Format gap analysis.
//!
//! A desired format is missing when no sibling release in the same edition
//! already carries its (format, encoding) pair, and the target release's
//! source encoding is allowed to produce it.

use std::collections::HashSet;

use crate::formats::TargetFormat;
use crate::tracker::{Release, ReleaseGroup};

/// Computes the ordered list of formats to attempt for `target`.
pub fn missing_formats(
    group: &ReleaseGroup,
    target: &Release,
    desired: &[TargetFormat],
) -> Vec<TargetFormat> {
    let edition = target.edition_key();

    let existing: HashSet<(&str, &str)> = group
        .releases
        .iter()
        .filter(|r| r.edition_key() == edition)
        .map(|r| (r.format.as_str(), r.encoding.as_str()))
        .collect();

    let source = target.source_encoding();

    desired
        .iter()
        .copied()
        .filter(|format| !existing.contains(&format.produces()))
        .filter(|format| source.permits(*format))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_group, test_release};

    #[test]
    fn test_gap_excludes_existing_same_edition() {
        // X: FLAC/Lossless, Y: MP3/320, same edition.
        let x = test_release(1);
        let mut y = test_release(2);
        y.format = "MP3".to_string();
        y.encoding = "320".to_string();
        let target = test_release(3);
        let group = test_group(100, vec![x, y, target.clone()]);

        let desired = vec![
            TargetFormat::Flac16,
            TargetFormat::Mp3V0,
            TargetFormat::Mp3320,
        ];
        // 16-bit source: FLAC16 not permitted, 320 exists, so only V0.
        let gaps = missing_formats(&group, &target, &desired);
        assert_eq!(gaps, vec![TargetFormat::Mp3V0]);
    }

    #[test]
    fn test_gap_ignores_other_editions() {
        let mut other_edition = test_release(2);
        other_edition.format = "MP3".to_string();
        other_edition.encoding = "V0 (VBR)".to_string();
        other_edition.remaster_year = 2010;

        let target = test_release(1);
        let group = test_group(100, vec![other_edition, target.clone()]);

        // The V0 exists only on a different edition, so it's still missing.
        let gaps = missing_formats(&group, &target, &vec![TargetFormat::Mp3V0]);
        assert_eq!(gaps, vec![TargetFormat::Mp3V0]);
    }

    #[test]
    fn test_gap_permits_flac16_from_24bit() {
        let mut target = test_release(1);
        target.encoding = "24bit Lossless".to_string();
        let group = test_group(100, vec![target.clone()]);

        let desired = vec![
            TargetFormat::Flac16,
            TargetFormat::Mp3V0,
            TargetFormat::Mp3320,
        ];
        let gaps = missing_formats(&group, &target, &desired);
        assert_eq!(gaps, desired);
    }

    #[test]
    fn test_gap_empty_for_lossy_source() {
        let mut target = test_release(1);
        target.format = "MP3".to_string();
        target.encoding = "320".to_string();
        let group = test_group(100, vec![target.clone()]);

        let gaps = missing_formats(&group, &target, &vec![TargetFormat::Mp3V0]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_gap_preserves_desired_order() {
        let mut target = test_release(1);
        target.encoding = "24bit Lossless".to_string();
        let group = test_group(100, vec![target.clone()]);

        let desired = vec![TargetFormat::Mp3320, TargetFormat::Mp3V0];
        let gaps = missing_formats(&group, &target, &desired);
        assert_eq!(gaps, vec![TargetFormat::Mp3320, TargetFormat::Mp3V0]);
    }
}
