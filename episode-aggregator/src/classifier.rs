//! Heuristics for spotting short-form clips in a long-form episode catalog.

use crate::types::CandidateItem;
use std::fmt;

pub const DEFAULT_SHORT_FORM_THRESHOLD_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortFormReason {
    Duration(u64),
    Title,
    Url,
    PortraitThumbnail,
}

impl fmt::Display for ShortFormReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortFormReason::Duration(secs) => write!(f, "duration {}s", secs),
            ShortFormReason::Title => write!(f, "title keyword"),
            ShortFormReason::Url => write!(f, "short-form url"),
            ShortFormReason::PortraitThumbnail => write!(f, "portrait thumbnail"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShortFormClassifier {
    threshold_secs: u64,
}

impl Default for ShortFormClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_FORM_THRESHOLD_SECS)
    }
}

impl ShortFormClassifier {
    pub fn new(threshold_secs: u64) -> Self {
        Self { threshold_secs }
    }

    /// First rule that marks the item as short-form, if any.
    pub fn classify(&self, item: &CandidateItem) -> Option<ShortFormReason> {
        if let Some(secs) = item.duration_seconds {
            if secs < self.threshold_secs {
                return Some(ShortFormReason::Duration(secs));
            }
        }

        if title_looks_short(&item.title) {
            return Some(ShortFormReason::Title);
        }

        if item.video_url.to_lowercase().contains("/shorts/") {
            return Some(ShortFormReason::Url);
        }

        if item.thumbnails.best().is_some_and(|thumb| thumb.is_portrait()) {
            return Some(ShortFormReason::PortraitThumbnail);
        }

        None
    }
}

fn title_looks_short(title: &str) -> bool {
    let title = title.to_lowercase();
    // "#shorts" is covered by the substring check
    if title.contains("shorts") {
        return true;
    }
    title
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "short")
}
