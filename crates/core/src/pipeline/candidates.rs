//! Candidate source.
//!
//! Explicit references always win over history: they are parsed as given
//! and never checked against the seen set. The default source lists owned
//! releases from the tracker and drops everything already seen.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::FatalError;
use crate::seen::SeenSet;
use crate::tracker::Tracker;

use super::types::Candidate;

static PERMALINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"torrents\.php\?id=(\d+)&torrentid=(\d+)").unwrap());
static PAIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+):(\d+)$").unwrap());

/// Parses one explicit release reference: either a tracker permalink or a
/// `GROUPID:RELEASEID` pair.
pub fn parse_reference(input: &str) -> Option<Candidate> {
    let caps = PERMALINK_RE
        .captures(input)
        .or_else(|| PAIR_RE.captures(input))?;
    let group_id = caps.get(1)?.as_str().parse().ok()?;
    let release_id = caps.get(2)?.as_str().parse().ok()?;
    Some(Candidate {
        group_id,
        release_id,
    })
}

/// Produces the deduplicated, order-stable candidate sequence.
pub async fn gather_candidates(
    references: &[String],
    media_types: &[String],
    tracker: &dyn Tracker,
    seen: &SeenSet,
) -> Result<Vec<Candidate>, FatalError> {
    if !references.is_empty() {
        let mut out = Vec::new();
        let mut dedup = HashSet::new();
        for reference in references {
            let candidate = parse_reference(reference).ok_or_else(|| {
                FatalError::Config(format!(
                    "cannot parse release reference '{}' (expected a permalink or GROUPID:RELEASEID)",
                    reference
                ))
            })?;
            if dedup.insert(candidate) {
                out.push(candidate);
            }
        }
        info!("Using {} explicit candidate(s)", out.len());
        return Ok(out);
    }

    let owned = tracker
        .list_owned(media_types)
        .await
        .map_err(|e| FatalError::Tracker(format!("failed to list owned releases: {}", e)))?;

    let mut out = Vec::new();
    let mut dedup = HashSet::new();
    for owned_release in owned {
        let candidate = Candidate::from(owned_release);
        if seen.contains(candidate.release_id) {
            debug!("Release {} already seen, skipping", candidate.release_id);
            continue;
        }
        if dedup.insert(candidate.release_id) {
            out.push(candidate);
        }
    }

    info!(
        "Catalog listing produced {} unseen candidate(s)",
        out.len()
    );
    Ok(out)
}
