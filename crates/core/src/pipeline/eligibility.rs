//! Eligibility gate.
//!
//! A chain of independent predicates; the first failing one wins. All
//! rejections are one-shot (the release gets marked seen), except
//! `reported`: a report may be resolved later, so the release must be
//! reconsidered on a future run.

use crate::tracker::Release;

/// Outcome of the eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Rejected for good; mark seen and move on.
    Rejected(String),
    /// Skip this run but do NOT mark seen.
    SkipUnseen(String),
}

/// Checks a release against the gate. `max_channels` comes from the source
/// directory scan.
pub fn check_eligibility(release: &Release, max_channels: u8) -> Eligibility {
    if release.reported {
        return Eligibility::SkipUnseen(format!(
            "release {} is reported; skipping until the report is resolved",
            release.id
        ));
    }

    if release.scene {
        return Eligibility::Rejected(format!(
            "release {} is a scene release; cannot re-derive without descening",
            release.id
        ));
    }

    if !release.remastered && release.remaster_year == 0 {
        return Eligibility::Rejected(format!(
            "release {} has an unconfirmed edition (not remastered, year 0); grouping is ambiguous",
            release.id
        ));
    }

    if release.remastered && release.remaster_year == 0 {
        return Eligibility::Rejected(format!(
            "release {} is a remaster with unknown year; unsafe to label",
            release.id
        ));
    }

    if max_channels > 2 {
        return Eligibility::Rejected(format!(
            "release {} contains multichannel audio ({} channels); not supported",
            release.id, max_channels
        ));
    }

    Eligibility::Eligible
}
