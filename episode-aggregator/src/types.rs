use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// Use the interfaces crate for the records handed to the presentation layer
pub use interfaces::defs::{CrossReference, EpisodeGroup, EpisodeRecord};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Episode-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Thumbnail {
    pub fn is_portrait(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w > 0 && h > w)
    }
}

/// Thumbnail resolutions as the catalog API names them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSet {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
}

impl ThumbnailSet {
    pub fn single(thumbnail: Thumbnail) -> Self {
        Self {
            default: Some(thumbnail),
            ..Default::default()
        }
    }

    /// Highest resolution we select from: high, then medium, then default.
    pub fn best(&self) -> Option<&Thumbnail> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.medium.is_none() && self.high.is_none() && self.standard.is_none()
    }
}

/// A raw upstream item before filtering and mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnails: ThumbnailSet,
    pub duration_seconds: Option<u64>,
    pub video_url: String,
}

impl CandidateItem {
    pub fn watch_url(id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        format!("https://www.youtube.com/watch?v={}", encoded)
    }

    /// Overlay per-item details. Detail fields win wherever they are present.
    pub fn merge_details(&mut self, details: &VideoDetails) {
        if let Some(title) = &details.title {
            self.title = title.clone();
        }
        if let Some(description) = &details.description {
            self.description = Some(description.clone());
        }
        if details.published_at.is_some() {
            self.published_at = details.published_at;
        }
        if let Some(thumbnails) = &details.thumbnails {
            if !thumbnails.is_empty() {
                self.thumbnails = thumbnails.clone();
            }
        }
        if details.duration_seconds.is_some() {
            self.duration_seconds = details.duration_seconds;
        }
    }
}

/// Secondary per-id lookup result from the catalog API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnails: Option<ThumbnailSet>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream fetch failed: {status} {reason} {body}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
