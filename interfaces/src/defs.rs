use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Match found for an episode on the secondary (audio) platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub url: Option<String>,
    pub duration_ms: Option<u64>,
    pub external_id: Option<String>,
}

/// One normalized episode, as handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: String,
    pub duration_seconds: Option<u64>,
    pub duration_formatted: Option<String>,
    pub video_url: String,
    pub cross_reference: Option<CrossReference>,
}

impl EpisodeRecord {
    /// Millisecond timestamp used for ordering. A missing date sorts as the epoch.
    pub fn sort_timestamp(&self) -> i64 {
        self.published_at
            .map(|published| published.timestamp_millis())
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeGroup {
    pub id: String,
    pub title: String,
    pub episodes: Vec<EpisodeRecord>,
}

impl EpisodeGroup {
    pub const ALL_ID: &'static str = "all";
    pub const ALL_TITLE: &'static str = "All Episodes";

    /// The full-catalog group. Currently the only group ever produced.
    pub fn all(episodes: Vec<EpisodeRecord>) -> Self {
        Self {
            id: Self::ALL_ID.to_owned(),
            title: Self::ALL_TITLE.to_owned(),
            episodes,
        }
    }
}

// Object style note:
// Everything here is rebuilt on every aggregation call. Nothing is kept
// between calls, so the types carry no identity beyond their `id` strings.

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, published_at: Option<DateTime<Utc>>) -> EpisodeRecord {
        EpisodeRecord {
            id: id.to_owned(),
            title: format!("Episode {id}"),
            description: String::new(),
            published_at,
            thumbnail: String::new(),
            duration_seconds: None,
            duration_formatted: None,
            video_url: format!("https://www.youtube.com/watch?v={id}"),
            cross_reference: None,
        }
    }

    #[test]
    fn missing_date_sorts_as_epoch() {
        assert_eq!(record("a", None).sort_timestamp(), 0);
        let dated = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(record("b", Some(dated)).sort_timestamp(), dated.timestamp_millis());
    }

    #[test]
    fn group_serializes_with_camel_case_fields() {
        let group = EpisodeGroup::all(vec![record("abc", None)]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["id"], "all");
        assert_eq!(json["title"], "All Episodes");
        assert_eq!(json["episodes"][0]["videoUrl"], "https://www.youtube.com/watch?v=abc");
        assert!(json["episodes"][0]["crossReference"].is_null());
        assert!(json["episodes"][0]["durationSeconds"].is_null());
    }
}
