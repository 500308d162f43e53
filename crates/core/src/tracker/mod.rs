//! Gazelle-style tracker catalog client.
//!
//! The tracker is an external collaborator: the pipeline only needs to list
//! owned releases, fetch a release group, and submit a newly produced
//! format. Everything else the API offers is out of scope.

mod error;
mod gazelle;
mod traits;
mod types;

pub use error::TrackerError;
pub use gazelle::{GazelleClient, GazelleConfig};
pub use traits::{OwnedRelease, SubmitRequest, Tracker};
pub use types::{EditionKey, Release, ReleaseGroup};
