use crate::types::{CandidateItem, Result, VideoDetails};
use async_trait::async_trait;
use std::collections::HashMap;

/// A primary catalog of video episodes (feed document or paginated API).
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Human-readable name for logging
    fn source_name(&self) -> String;

    /// Every candidate item, newest first, with pagination already drained.
    async fn list_candidates(&self) -> Result<Vec<CandidateItem>>;

    /// Whether `fetch_details` adds anything over the list call.
    fn needs_details(&self) -> bool {
        false
    }

    /// Per-id details (duration, full description, thumbnails) keyed by id.
    /// Feed-style sources already carry these inline.
    async fn fetch_details(&self, _ids: &[String]) -> Result<HashMap<String, VideoDetails>> {
        Ok(HashMap::new())
    }
}

/// Looks up an episode on the secondary platform by title.
#[async_trait]
pub trait CrossReferenceLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> crate::enricher::EnrichmentOutcome;
}
