use crate::traits::EpisodeSource;
use crate::types::{CandidateItem, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::info;

/// Feed-style retrieval: one structured document, durations inline where present.
pub struct VideoFeedSource {
    pub url: String,
    fetcher: Fetcher,
}

impl VideoFeedSource {
    pub fn new(url: String, fetcher: Fetcher) -> Self {
        Self { url, fetcher }
    }
}

#[async_trait]
impl EpisodeSource for VideoFeedSource {
    fn source_name(&self) -> String {
        // Extract domain name from URL for log lines
        match url::Url::parse(&self.url).ok().and_then(|u| u.domain().map(str::to_string)) {
            Some(domain) => format!("Video feed ({})", domain),
            None => "Video feed".to_string(),
        }
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateItem>> {
        info!("Pulling video feed: {}", self.url);

        let content = self.fetcher.fetch_text(&self.url).await?;
        let parsed = FeedParser::parse_feed(&content)?;

        info!(
            "Pulled {} items from video feed {} ({})",
            parsed.entries.len(),
            parsed.title.as_deref().unwrap_or("untitled"),
            self.url
        );
        Ok(parsed.entries)
    }
}
