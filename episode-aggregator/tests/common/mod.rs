// Local stand-in for the video catalog and the audio platform.
#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use episode_aggregator::{AggregatorConfig, CrossReferenceCredentials, PrimarySource};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Default)]
pub struct Counters {
    pub search_pages: AtomicUsize,
    pub page_after_last: AtomicUsize,
    pub video_batches: AtomicUsize,
    pub token_exchanges: AtomicUsize,
    pub episode_searches: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockUpstream {
    pub base_url: String,
    pub counters: Arc<Counters>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let counters = Arc::new(Counters::default());
        let app = Router::new()
            .route("/youtube/v3/search", get(search))
            .route("/youtube/v3/videos", get(videos))
            .route("/feeds/videos.xml", get(feed))
            .route("/feeds/broken.xml", get(broken_feed))
            .route("/api/token", post(token))
            .route("/v1/search", get(episode_search))
            .with_state(counters.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            counters,
        }
    }

    pub fn catalog_config(&self) -> AggregatorConfig {
        let mut config = AggregatorConfig::default();
        config.source = Some(PrimarySource::CatalogApi {
            api_key: "test-key".to_string(),
            channel_id: "UCpodcast".to_string(),
        });
        config.endpoints.catalog_api_base = format!("{}/youtube/v3", self.base_url);
        config.endpoints.token_url = format!("{}/api/token", self.base_url);
        config.endpoints.search_url = format!("{}/v1/search", self.base_url);
        config.policy.detail_batch_size = 2;
        config
    }

    pub fn feed_config(&self, path: &str) -> AggregatorConfig {
        let mut config = self.catalog_config();
        config.source = Some(PrimarySource::Feed {
            url: format!("{}{}", self.base_url, path),
        });
        config
    }

    pub fn with_credentials(mut config: AggregatorConfig) -> AggregatorConfig {
        config.cross_reference = Some(CrossReferenceCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        });
        config
    }
}

fn search_item(id: &str, title: &str, published_at: &str) -> Value {
    json!({
        "id": {"kind": "youtube#video", "videoId": id},
        "snippet": {
            "title": title,
            "description": format!("{} (list description)", title),
            "publishedAt": published_at,
            "thumbnails": {
                "default": {"url": format!("https://i.ytimg.com/vi/{}/default.jpg", id), "width": 120, "height": 90},
                "high": {"url": format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id), "width": 480, "height": 360}
            }
        }
    })
}

// Three pages; the second repeats v2.
async fn search(
    State(counters): State<Arc<Counters>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    counters.search_pages.fetch_add(1, Ordering::SeqCst);
    if params.get("key").map(String::as_str) != Some("test-key") {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"})));
    }

    let body = match params.get("pageToken").map(String::as_str) {
        None => json!({
            "nextPageToken": "p2",
            "items": [
                search_item("v5", "Episode 5: Finale", "2024-05-01T12:00:00Z"),
                search_item("v4", "Behind the scenes #shorts", "2024-04-01T12:00:00Z"),
            ]
        }),
        Some("p2") => json!({
            "nextPageToken": "p3",
            "items": [
                search_item("v3", "Teaser", "2024-03-01T12:00:00Z"),
                search_item("v2", "Episode 2: Middle", "2024-02-01T12:00:00Z"),
            ]
        }),
        Some("p3") => json!({
            "items": [
                search_item("v2", "Episode 2: Middle", "2024-02-01T12:00:00Z"),
                search_item("v1", "Episode 1: Pilot", "2024-01-01T12:00:00Z"),
                {"id": {"kind": "youtube#playlist", "playlistId": "PL1"}, "snippet": {"title": "A playlist"}},
            ]
        }),
        Some(_) => {
            counters.page_after_last.fetch_add(1, Ordering::SeqCst);
            json!({"items": []})
        }
    };
    (StatusCode::OK, Json(body))
}

async fn videos(
    State(counters): State<Arc<Counters>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    counters.video_batches.fetch_add(1, Ordering::SeqCst);
    let ids = params.get("id").cloned().unwrap_or_default();

    let items: Vec<Value> = ids
        .split(',')
        .filter_map(|id| {
            let (duration, description) = match id {
                "v1" => ("PT45M10S", "The very first episode, in full."),
                "v2" => ("PT1H2M3S", "Middle episode with a long description."),
                "v3" => ("PT1M30S", "A teaser clip."),
                "v4" => ("PT10M", "Behind the scenes."),
                "v5" => ("PT58M", "Finale."),
                _ => return None,
            };
            Some(json!({
                "id": id,
                "contentDetails": {"duration": duration},
                "snippet": {"description": description}
            }))
        })
        .collect();

    Json(json!({ "items": items }))
}

pub const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <title>The Podcast</title>
 <entry>
  <id>yt:video:f1</id>
  <title>Episode 1: Pilot</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=f1"/>
  <published>2024-01-01T12:00:00+00:00</published>
  <media:group>
   <media:thumbnail url="https://i1.ytimg.com/vi/f1/hqdefault.jpg" width="480" height="360"/>
   <media:description>Pilot episode.</media:description>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:f3</id>
  <title>Episode 3: Latest</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=f3"/>
  <published>2024-03-01T12:00:00+00:00</published>
  <media:group>
   <media:thumbnail url="https://i1.ytimg.com/vi/f3/hqdefault.jpg" width="480" height="360"/>
   <media:description>Latest episode.</media:description>
   <yt:duration seconds="3725"/>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:t1</id>
  <title>Episode 4 sneak peek</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=t1"/>
  <published>2024-05-01T12:00:00+00:00</published>
  <yt:duration seconds="45"/>
 </entry>
 <entry>
  <id>yt:video:s1</id>
  <title>Quick clip #shorts</title>
  <link rel="alternate" href="https://www.youtube.com/shorts/s1"/>
  <published>2024-04-01T12:00:00+00:00</published>
 </entry>
 <entry>
  <id>yt:video:f1</id>
  <title>Episode 1: Pilot (duplicate)</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=f1"/>
  <published>2024-01-01T12:00:00+00:00</published>
 </entry>
 <entry>
  <id>yt:video:f2</id>
  <title>Episode 2: Middle</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=f2"/>
  <published>2024-02-01T12:00:00+00:00</published>
 </entry>
</feed>"#;

async fn feed() -> impl IntoResponse {
    ([("content-type", "application/atom+xml")], FEED_XML)
}

async fn broken_feed() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "feed backend exploded")
}

async fn token(State(counters): State<Arc<Counters>>, headers: HeaderMap) -> impl IntoResponse {
    counters.token_exchanges.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})));
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": "tok", "token_type": "Bearer", "expires_in": 3600})),
    )
}

// Matches everything except titles mentioning "Finale".
async fn episode_search(
    State(counters): State<Arc<Counters>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    counters.episode_searches.fetch_add(1, Ordering::SeqCst);
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    if bearer != Some("Bearer tok") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "no token"})));
    }

    let query = params.get("q").cloned().unwrap_or_default();
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(0);
    if query.contains("Finale") {
        return (StatusCode::OK, Json(json!({"episodes": {"items": []}})));
    }

    let slug = query.to_lowercase().replace(|c: char| !c.is_alphanumeric(), "-");
    let items: Vec<Value> = vec![
        json!({"id": "unrelated", "name": "Some other show", "duration_ms": 1,
               "external_urls": {"spotify": "https://open.spotify.com/episode/unrelated"}}),
        json!({"id": slug, "name": format!("  {}  ", query.to_uppercase()), "duration_ms": 2_700_000,
               "external_urls": {"spotify": format!("https://open.spotify.com/episode/{}", slug)}}),
    ]
    .into_iter()
    .take(limit)
    .collect();

    (StatusCode::OK, Json(json!({"episodes": {"items": items}})))
}
