//! Mock tracker for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tracker::{OwnedRelease, ReleaseGroup, SubmitRequest, Tracker, TrackerError};

/// Mock implementation of the Tracker trait.
///
/// Configured through a consuming builder, then queried for the submits it
/// recorded:
///
/// ```rust,ignore
/// let tracker = MockTracker::new()
///     .with_owned(vec![OwnedRelease { group_id: 1, release_id: 10 }])
///     .with_group(test_group(1, vec![test_release(10)]));
///
/// // ... run the pipeline ...
///
/// let submits = tracker.submits().await;
/// assert_eq!(submits.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTracker {
    owned: Vec<OwnedRelease>,
    groups: HashMap<u64, ReleaseGroup>,
    list_failure: Option<String>,
    submit_failure: Option<String>,
    submits: Arc<RwLock<Vec<SubmitRequest>>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases returned by `list_owned`.
    pub fn with_owned(mut self, owned: Vec<OwnedRelease>) -> Self {
        self.owned = owned;
        self
    }

    /// A group returned by `release_group`; unknown ids yield
    /// `TrackerError::GroupNotFound`.
    pub fn with_group(mut self, group: ReleaseGroup) -> Self {
        self.groups.insert(group.id, group);
        self
    }

    /// Makes `list_owned` fail with an API error.
    pub fn with_list_failure(mut self, message: impl Into<String>) -> Self {
        self.list_failure = Some(message.into());
        self
    }

    /// Makes every `submit_format` fail with an API error. Failed submits
    /// are still recorded.
    pub fn with_submit_failure(mut self, message: impl Into<String>) -> Self {
        self.submit_failure = Some(message.into());
        self
    }

    /// All submit requests received so far, in order.
    pub async fn submits(&self) -> Vec<SubmitRequest> {
        self.submits.read().await.clone()
    }
}

#[async_trait]
impl Tracker for MockTracker {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    async fn list_owned(
        &self,
        _media_types: &[String],
    ) -> Result<Vec<OwnedRelease>, TrackerError> {
        match &self.list_failure {
            Some(message) => Err(TrackerError::api(message.clone())),
            None => Ok(self.owned.clone()),
        }
    }

    async fn release_group(&self, group_id: u64) -> Result<ReleaseGroup, TrackerError> {
        self.groups
            .get(&group_id)
            .cloned()
            .ok_or(TrackerError::GroupNotFound(group_id))
    }

    async fn submit_format(&self, request: SubmitRequest) -> Result<(), TrackerError> {
        self.submits.write().await.push(request);
        match &self.submit_failure {
            Some(message) => Err(TrackerError::api(message.clone())),
            None => Ok(()),
        }
    }
}
