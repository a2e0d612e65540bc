use crate::types::{AggregatorError, CandidateItem, Result, Thumbnail, ThumbnailSet};
use feed_rs::model::{Entry, MediaObject};
use feed_rs::parser;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

const VIDEO_ID_PREFIX: &str = "yt:video:";

static ENTRY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(?:entry|item)[\s>].*?</(?:entry|item)>").expect("valid entry pattern"));

// feed-rs does not map `yt:duration`, entry level or inside `media:group`
static INLINE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<yt:duration\s[^>]*?seconds\s*=\s*["']([^"']*)["']"#).expect("valid inline duration pattern")
});

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<CandidateItem>,
}

/// Turns a video feed document into candidate items, newest first as published.
pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        // Missing ids stay empty so `entry_id` can fall back to the watch link
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let total = feed.entries.len();

        let mut inline_durations = inline_durations(content);
        if inline_durations.len() != total {
            debug!(
                "Found {} entry blocks for {} parsed entries, ignoring inline durations",
                inline_durations.len(),
                total
            );
            inline_durations.clear();
        }

        let entries: Vec<CandidateItem> = feed
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| Self::parse_entry(entry, inline_durations.get(index).copied().flatten()))
            .collect();

        if entries.len() < total {
            debug!("Dropped {} feed entries without an identifier", total - entries.len());
        }
        info!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: Entry, inline_duration: Option<u64>) -> Option<CandidateItem> {
        let link = entry
            .links
            .iter()
            .find(|link| link.rel.as_deref() == Some("alternate"))
            .or(entry.links.first())
            .map(|link| link.href.clone());

        let id = Self::entry_id(&entry.id, link.as_deref())?;
        let title = entry.title.map(|t| t.content).unwrap_or_default();
        let media = entry.media.first();

        let description = entry
            .summary
            .map(|summary| plain_text(&summary.content))
            .filter(|text| !text.is_empty())
            .or_else(|| media.and_then(|m| m.description.as_ref()).map(|d| d.content.clone()))
            .or_else(|| entry.content.and_then(|c| c.body));

        let thumbnails = media.and_then(Self::thumbnail).map(ThumbnailSet::single).unwrap_or_default();
        let duration_seconds = media.and_then(Self::duration_seconds).or(inline_duration);
        let video_url = link.unwrap_or_else(|| CandidateItem::watch_url(&id));

        Some(CandidateItem {
            id,
            title,
            description,
            published_at: entry.published,
            thumbnails,
            duration_seconds,
            video_url,
        })
    }

    /// Identifier priority: `yt:video:` suffix, raw entry id, `v` query parameter of the link.
    fn entry_id(raw_id: &str, link: Option<&str>) -> Option<String> {
        let raw_id = raw_id.trim();
        if let Some(video_id) = raw_id.strip_prefix(VIDEO_ID_PREFIX) {
            if !video_id.is_empty() {
                return Some(video_id.to_string());
            }
        }
        if !raw_id.is_empty() {
            return Some(raw_id.to_string());
        }

        let link = url::Url::parse(link?).ok()?;
        link.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    fn thumbnail(media: &MediaObject) -> Option<Thumbnail> {
        if let Some(thumb) = media.thumbnails.first() {
            return Some(Thumbnail {
                url: thumb.image.uri.clone(),
                width: thumb.image.width,
                height: thumb.image.height,
            });
        }

        // Enclosures land in media content
        media.content.iter().find_map(|content| {
            content.url.as_ref().map(|url| Thumbnail {
                url: url.to_string(),
                width: content.width,
                height: content.height,
            })
        })
    }

    fn duration_seconds(media: &MediaObject) -> Option<u64> {
        media
            .duration
            .or_else(|| media.content.iter().find_map(|content| content.duration))
            .map(|duration| duration.as_secs())
    }
}

/// `yt:duration` seconds per entry, in document order. Unreadable values are `None`.
fn inline_durations(content: &str) -> Vec<Option<u64>> {
    ENTRY_BLOCK
        .find_iter(content)
        .map(|block| {
            INLINE_DURATION
                .captures(block.as_str())
                .and_then(|caps| caps.get(1))
                .and_then(|seconds| seconds.as_str().trim().parse::<u64>().ok())
        })
        .collect()
}

/// Strip markup and collapse whitespace.
pub fn plain_text(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => {
                text.push(' ');
                (text, false)
            }
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
