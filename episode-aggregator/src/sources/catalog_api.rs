//! Catalog-API retrieval: paginated channel search, then batched per-video details.

use crate::duration::parse_duration_seconds;
use crate::traits::EpisodeSource;
use crate::types::{CandidateItem, Result, ThumbnailSet, VideoDetails};
use crate::Fetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{debug, info, warn};

/// One page of a paginated listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Call `fetch_page` until a page comes back without a next-page token.
///
/// The first call receives `None`. An error on any page aborts the whole drain.
/// A token the upstream already handed out also ends the drain, so a looping
/// upstream cannot spin forever.
pub async fn drain_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut out = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(token.take()).await?;
        pages += 1;
        out.extend(page.items);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) if seen_tokens.insert(next.clone()) => token = Some(next),
            Some(next) => {
                warn!("Upstream repeated page token {}, stopping pagination", next);
                break;
            }
            None => break,
        }
    }

    debug!("Drained {} pages ({} items)", pages, out.len());
    Ok(out)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    thumbnails: Option<ThumbnailSet>,
}

#[derive(Debug, Default, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: Option<String>,
    #[serde(default)]
    snippet: Snippet,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl SearchItem {
    fn into_candidate(self) -> Option<CandidateItem> {
        let id = self.id.video_id.filter(|id| !id.is_empty())?;
        Some(CandidateItem {
            video_url: CandidateItem::watch_url(&id),
            title: self.snippet.title.unwrap_or_default(),
            description: self.snippet.description,
            published_at: parse_timestamp(self.snippet.published_at.as_deref()),
            thumbnails: self.snippet.thumbnails.unwrap_or_default(),
            duration_seconds: None,
            id,
        })
    }
}

impl VideoItem {
    fn into_details(self) -> Option<(String, VideoDetails)> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let details = VideoDetails {
            duration_seconds: self
                .content_details
                .and_then(|cd| cd.duration)
                .as_deref()
                .map(parse_duration_seconds),
            title: self.snippet.title,
            description: self.snippet.description,
            published_at: parse_timestamp(self.snippet.published_at.as_deref()),
            thumbnails: self.snippet.thumbnails,
        };
        Some((id, details))
    }
}

pub struct CatalogApiSource {
    base_url: String,
    api_key: String,
    channel_id: String,
    page_size: usize,
    batch_size: usize,
    fetcher: Fetcher,
}

impl CatalogApiSource {
    pub fn new(
        base_url: String,
        api_key: String,
        channel_id: String,
        page_size: usize,
        batch_size: usize,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            channel_id,
            page_size: page_size.max(1),
            batch_size: batch_size.max(1),
            fetcher,
        }
    }

    async fn search_page(&self, page_token: Option<String>) -> Result<Page<CandidateItem>> {
        let url = format!("{}/search", self.base_url);
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("channelId", self.channel_id.clone()),
            ("maxResults", self.page_size.to_string()),
            ("type", "video".to_string()),
            ("order", "date".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: SearchResponse = self.fetcher.get_json(&url, &query).await?;
        Ok(Page {
            items: response.items.into_iter().filter_map(SearchItem::into_candidate).collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn details_batch(&self, ids: &[String]) -> Result<Vec<(String, VideoDetails)>> {
        let url = format!("{}/videos", self.base_url);
        let query = [
            ("part", "contentDetails,snippet".to_string()),
            ("id", ids.join(",")),
            ("key", self.api_key.clone()),
        ];

        let response: VideosResponse = self.fetcher.get_json(&url, &query).await?;
        Ok(response.items.into_iter().filter_map(VideoItem::into_details).collect())
    }
}

#[async_trait]
impl EpisodeSource for CatalogApiSource {
    fn source_name(&self) -> String {
        format!("Catalog API (channel {})", self.channel_id)
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateItem>> {
        info!("Listing channel {} via catalog API", self.channel_id);
        let items = drain_pages(|token| self.search_page(token)).await?;
        info!("Listed {} items for channel {}", items.len(), self.channel_id);
        Ok(items)
    }

    fn needs_details(&self) -> bool {
        true
    }

    async fn fetch_details(&self, ids: &[String]) -> Result<HashMap<String, VideoDetails>> {
        let mut out = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            debug!("Fetching details for {} videos", chunk.len());
            out.extend(self.details_batch(chunk).await?);
        }
        Ok(out)
    }
}
