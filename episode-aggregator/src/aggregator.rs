use crate::classifier::ShortFormClassifier;
use crate::config::{AggregationPolicy, AggregatorConfig};
use crate::duration::format_duration;
use crate::enricher::CrossReferenceEnricher;
use crate::sources::build_source;
use crate::traits::{CrossReferenceLookup, EpisodeSource};
use crate::types::{AggregatorError, CandidateItem, CrossReference, EpisodeGroup, EpisodeRecord, Result};
use crate::Fetcher;
use futures::stream::{self, StreamExt};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const MISSING_SOURCE: &str = "No primary source configured: set YOUTUBE_RSS_URL or YOUTUBE_CHANNEL_ID \
     (or PODCAST_SOURCE=api with YOUTUBE_API_KEY and YOUTUBE_CHANNEL_ID)";

/// Produces the episode catalog: fetch, dedupe, merge details, drop short-form
/// items, cross-reference, map and sort newest first.
pub struct EpisodeAggregator {
    source: Option<Arc<dyn EpisodeSource>>,
    cross_reference: Option<Arc<dyn CrossReferenceLookup>>,
    classifier: ShortFormClassifier,
    policy: AggregationPolicy,
}

impl EpisodeAggregator {
    pub fn new(source: Option<Arc<dyn EpisodeSource>>, policy: AggregationPolicy) -> Self {
        Self {
            source,
            cross_reference: None,
            classifier: ShortFormClassifier::new(policy.short_form_threshold_secs),
            policy,
        }
    }

    /// Wire up the strategy and enricher named by the configuration.
    pub fn from_config(config: &AggregatorConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetch)?;
        let source = build_source(config, fetcher.clone());
        let mut aggregator = Self::new(source, config.policy.clone());

        let enricher = CrossReferenceEnricher::new(config, fetcher);
        if enricher.is_configured() {
            aggregator = aggregator.with_cross_reference(Arc::new(enricher));
        }

        match &aggregator.source {
            Some(source) => info!("Episode source: {}", source.source_name()),
            None => info!("No episode source configured"),
        }
        info!(
            "Cross-reference enrichment {}",
            if aggregator.cross_reference.is_some() { "enabled" } else { "disabled" }
        );
        Ok(aggregator)
    }

    pub fn with_cross_reference(mut self, lookup: Arc<dyn CrossReferenceLookup>) -> Self {
        self.cross_reference = Some(lookup);
        self
    }

    pub async fn aggregate(&self) -> Result<Vec<EpisodeGroup>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| AggregatorError::Configuration(MISSING_SOURCE.to_string()))?;

        let raw = source.list_candidates().await?;
        let total = raw.len();
        let mut candidates = dedupe_by_id(raw);

        if source.needs_details() && !candidates.is_empty() {
            let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
            let details = source.fetch_details(&ids).await?;
            for candidate in &mut candidates {
                if let Some(detail) = details.get(&candidate.id) {
                    candidate.merge_details(detail);
                }
            }
        }

        let unique = candidates.len();
        candidates.retain(|candidate| match self.classifier.classify(candidate) {
            Some(reason) => {
                debug!("Skipping short-form item {} ({})", candidate.id, reason);
                false
            }
            None => true,
        });

        let pending: Vec<_> = candidates
            .into_iter()
            .map(|candidate| self.build_record(candidate))
            .collect();
        let mut episodes: Vec<EpisodeRecord> = stream::iter(pending)
            .buffered(self.policy.enrichment_concurrency.max(1))
            .collect()
            .await;

        sort_newest_first(&mut episodes);

        info!(
            "Aggregated {} episodes ({} fetched, {} unique)",
            episodes.len(),
            total,
            unique
        );
        Ok(vec![EpisodeGroup::all(episodes)])
    }

    async fn build_record(&self, candidate: CandidateItem) -> EpisodeRecord {
        let cross_reference = match &self.cross_reference {
            Some(lookup) => lookup.lookup(&candidate.title).await.into_match(),
            None => None,
        };
        self.to_record(candidate, cross_reference)
    }

    fn to_record(&self, candidate: CandidateItem, cross_reference: Option<CrossReference>) -> EpisodeRecord {
        let description = truncate_chars(
            candidate.description.as_deref().unwrap_or(""),
            self.policy.description_max_chars,
        );
        let thumbnail = candidate
            .thumbnails
            .best()
            .map(|thumb| thumb.url.clone())
            .unwrap_or_default();

        EpisodeRecord {
            id: candidate.id,
            title: candidate.title,
            description,
            published_at: candidate.published_at,
            thumbnail,
            duration_seconds: candidate.duration_seconds,
            duration_formatted: candidate.duration_seconds.map(format_duration),
            video_url: candidate.video_url,
            cross_reference,
        }
    }
}

/// Drop repeated ids, keeping the first occurrence and the original order.
pub fn dedupe_by_id(items: Vec<CandidateItem>) -> Vec<CandidateItem> {
    let mut seen = HashSet::new();
    let before = items.len();
    let unique: Vec<CandidateItem> = items.into_iter().filter(|item| seen.insert(item.id.clone())).collect();

    let removed = before - unique.len();
    if removed > 0 {
        debug!("Removed {} duplicate items", removed);
    }
    unique
}

/// Stable sort, newest first; undated records sort as the epoch.
pub fn sort_newest_first(episodes: &mut [EpisodeRecord]) {
    episodes.sort_by_key(|episode| Reverse(episode.sort_timestamp()));
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
