//! Process-wide configuration, resolved once at startup and shared read-only.

use crate::classifier::DEFAULT_SHORT_FORM_THRESHOLD_SECS;
use crate::types::FetchConfig;
use std::fmt;
use tracing::warn;

pub const YOUTUBE_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// Where the primary episode list comes from. Chosen once, never per call.
#[derive(Clone, PartialEq, Eq)]
pub enum PrimarySource {
    Feed { url: String },
    CatalogApi { api_key: String, channel_id: String },
}

impl PrimarySource {
    pub fn feed_for_channel(channel_id: &str) -> Self {
        let encoded: String = url::form_urlencoded::byte_serialize(channel_id.as_bytes()).collect();
        PrimarySource::Feed {
            url: format!("{}?channel_id={}", YOUTUBE_FEED_BASE, encoded),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            PrimarySource::Feed { .. } => "feed",
            PrimarySource::CatalogApi { .. } => "catalog-api",
        }
    }
}

impl fmt::Debug for PrimarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimarySource::Feed { url } => f.debug_struct("Feed").field("url", url).finish(),
            PrimarySource::CatalogApi { channel_id, .. } => f
                .debug_struct("CatalogApi")
                .field("api_key", &"***")
                .field("channel_id", channel_id)
                .finish(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct CrossReferenceCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for CrossReferenceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossReferenceCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Tunables that used to be literals scattered through the aggregation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub short_form_threshold_secs: u64,
    pub detail_batch_size: usize,
    pub page_size: usize,
    pub candidate_limit: usize,
    pub query_max_chars: usize,
    pub description_max_chars: usize,
    pub enrichment_concurrency: usize,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            short_form_threshold_secs: DEFAULT_SHORT_FORM_THRESHOLD_SECS,
            detail_batch_size: 50,
            page_size: 50,
            candidate_limit: 3,
            query_max_chars: 120,
            description_max_chars: 300,
            enrichment_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub catalog_api_base: String,
    pub token_url: String,
    pub search_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalog_api_base: YOUTUBE_API_BASE.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            search_url: SPOTIFY_SEARCH_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    /// `None` means no usable primary source; every aggregation call fails.
    pub source: Option<PrimarySource>,
    pub cross_reference: Option<CrossReferenceCredentials>,
    pub policy: AggregationPolicy,
    pub endpoints: Endpoints,
    pub fetch: FetchConfig,
}

impl AggregatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from any key/value lookup.
    ///
    /// Recognized keys:
    /// - `YOUTUBE_RSS_URL`, `YOUTUBE_CHANNEL_ID`, `YOUTUBE_API_KEY`
    /// - `PODCAST_SOURCE` (`feed` or `api`, default `feed`)
    /// - `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`
    /// - `SHORT_FORM_THRESHOLD_SECS`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let rss_url = get("YOUTUBE_RSS_URL");
        let channel_id = get("YOUTUBE_CHANNEL_ID");
        let api_key = get("YOUTUBE_API_KEY");
        let wants_api = get("PODCAST_SOURCE").is_some_and(|mode| mode.eq_ignore_ascii_case("api"));

        let source = if wants_api {
            match (api_key, channel_id) {
                (Some(api_key), Some(channel_id)) => Some(PrimarySource::CatalogApi { api_key, channel_id }),
                _ => {
                    warn!("PODCAST_SOURCE=api requires YOUTUBE_API_KEY and YOUTUBE_CHANNEL_ID");
                    None
                }
            }
        } else if let Some(url) = rss_url {
            Some(PrimarySource::Feed { url })
        } else {
            channel_id.as_deref().map(PrimarySource::feed_for_channel)
        };

        let cross_reference = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(CrossReferenceCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let mut policy = AggregationPolicy::default();
        if let Some(raw) = get("SHORT_FORM_THRESHOLD_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => policy.short_form_threshold_secs = secs,
                Err(_) => warn!("Ignoring invalid SHORT_FORM_THRESHOLD_SECS: {}", raw),
            }
        }

        Self {
            source,
            cross_reference,
            policy,
            endpoints: Endpoints::default(),
            fetch: FetchConfig::default(),
        }
    }
}
