//! Best-effort cross-referencing of episodes on the secondary (audio) platform.
//!
//! Nothing in here returns an error to the caller. Every failure becomes an
//! [`EnrichmentOutcome`] that collapses to "no enrichment".

use crate::config::{AggregatorConfig, CrossReferenceCredentials};
use crate::traits::CrossReferenceLookup;
use crate::types::{CrossReference, Result};
use crate::Fetcher;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Matched(CrossReference),
    NoMatch,
    NotConfigured,
    Failed(String),
}

impl EnrichmentOutcome {
    pub fn into_match(self) -> Option<CrossReference> {
        match self {
            EnrichmentOutcome::Matched(reference) => Some(reference),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    episodes: Option<EpisodePage>,
}

#[derive(Debug, Default, Deserialize)]
struct EpisodePage {
    // the platform occasionally returns null entries
    #[serde(default)]
    items: Vec<Option<ExternalEpisode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalEpisode {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl From<&ExternalEpisode> for CrossReference {
    fn from(episode: &ExternalEpisode) -> Self {
        Self {
            url: episode.external_urls.spotify.clone(),
            duration_ms: episode.duration_ms,
            external_id: episode.id.clone(),
        }
    }
}

/// Collapse whitespace runs, trim and lowercase.
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// First candidate whose normalized name equals the target or is a prefix
/// match in either direction; otherwise the first candidate.
pub fn select_best_candidate<'a>(target: &str, candidates: &'a [ExternalEpisode]) -> Option<&'a ExternalEpisode> {
    let target = normalize_title(target);
    candidates
        .iter()
        .find(|candidate| {
            let name = normalize_title(candidate.name.as_deref().unwrap_or(""));
            name == target || name.starts_with(&target) || target.starts_with(&name)
        })
        .or_else(|| candidates.first())
}

pub struct CrossReferenceEnricher {
    credentials: Option<CrossReferenceCredentials>,
    token_url: String,
    search_url: String,
    candidate_limit: usize,
    query_max_chars: usize,
    fetcher: Fetcher,
}

impl CrossReferenceEnricher {
    pub fn new(config: &AggregatorConfig, fetcher: Fetcher) -> Self {
        Self {
            credentials: config.cross_reference.clone(),
            token_url: config.endpoints.token_url.clone(),
            search_url: config.endpoints.search_url.clone(),
            candidate_limit: config.policy.candidate_limit.max(1),
            query_max_chars: config.policy.query_max_chars,
            fetcher,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn enrich(&self, title: &str) -> EnrichmentOutcome {
        let Some(credentials) = &self.credentials else {
            return EnrichmentOutcome::NotConfigured;
        };

        let token = match self.access_token(credentials).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Cross-reference token exchange failed: {}", e);
                return EnrichmentOutcome::Failed(format!("token exchange: {}", e));
            }
        };

        let candidates = match self.search(title, &token).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Cross-reference search failed for {:?}: {}", title, e);
                return EnrichmentOutcome::Failed(format!("search: {}", e));
            }
        };

        match select_best_candidate(title, &candidates) {
            Some(best) => EnrichmentOutcome::Matched(best.into()),
            None => EnrichmentOutcome::NoMatch,
        }
    }

    /// Client-credentials exchange for a short-lived bearer token.
    async fn access_token(&self, credentials: &CrossReferenceCredentials) -> Result<String> {
        let response = self
            .fetcher
            .client()
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let body = Fetcher::ensure_success(response).await?.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.access_token)
    }

    async fn search(&self, title: &str, token: &str) -> Result<Vec<ExternalEpisode>> {
        let query: String = title.chars().take(self.query_max_chars).collect();
        let response = self
            .fetcher
            .client()
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "episode".to_string()),
                ("limit", self.candidate_limit.to_string()),
            ])
            .send()
            .await?;

        let body = Fetcher::ensure_success(response).await?.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .episodes
            .map(|page| page.items.into_iter().flatten().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CrossReferenceLookup for CrossReferenceEnricher {
    async fn lookup(&self, title: &str) -> EnrichmentOutcome {
        self.enrich(title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchConfig;

    fn episode(id: &str, name: &str) -> ExternalEpisode {
        ExternalEpisode {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            duration_ms: Some(3_600_000),
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/episode/{}", id)),
            },
        }
    }

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(normalize_title("  Episode   12:\tThe  Talk "), "episode 12: the talk");
    }

    #[test]
    fn picks_exact_or_prefix_match_before_fallback() {
        let candidates = vec![
            episode("other", "Something unrelated"),
            episode("match", "EPISODE 12:  The Talk (extended)"),
        ];
        let best = select_best_candidate("Episode 12: The Talk", &candidates).unwrap();
        assert_eq!(best.id.as_deref(), Some("match"));

        // candidate name that is a prefix of the target also matches
        let candidates = vec![episode("a", "Nope"), episode("b", "Episode 12")];
        let best = select_best_candidate("Episode 12: The Talk", &candidates).unwrap();
        assert_eq!(best.id.as_deref(), Some("b"));
    }

    #[test]
    fn falls_back_to_first_candidate() {
        let candidates = vec![episode("first", "Alpha"), episode("second", "Beta")];
        let best = select_best_candidate("Gamma", &candidates).unwrap();
        assert_eq!(best.id.as_deref(), Some("first"));
        assert!(select_best_candidate("Gamma", &[]).is_none());
    }

    #[test]
    fn search_response_skips_null_items() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"episodes": {"items": [null, {"id": "e1", "name": "Ep", "duration_ms": 1000,
                "external_urls": {"spotify": "https://open.spotify.com/episode/e1"}}]}}"#,
        )
        .unwrap();
        let items: Vec<ExternalEpisode> = parsed.episodes.unwrap().items.into_iter().flatten().collect();
        assert_eq!(items.len(), 1);
        let reference = CrossReference::from(&items[0]);
        assert_eq!(reference.external_id.as_deref(), Some("e1"));
        assert_eq!(reference.duration_ms, Some(1000));
        assert_eq!(reference.url.as_deref(), Some("https://open.spotify.com/episode/e1"));
    }

    #[tokio::test]
    async fn unconfigured_enricher_skips_without_network() {
        let config = AggregatorConfig::default();
        let enricher = CrossReferenceEnricher::new(&config, Fetcher::new(&FetchConfig::default()).unwrap());
        assert!(!enricher.is_configured());
        assert_eq!(enricher.enrich("Episode 1").await, EnrichmentOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_degrades_to_failure() {
        let mut config = AggregatorConfig::default();
        config.cross_reference = Some(CrossReferenceCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        });
        // port 9 (discard) on localhost refuses connections
        config.endpoints.token_url = "http://127.0.0.1:9/api/token".to_string();
        let enricher = CrossReferenceEnricher::new(&config, Fetcher::new(&FetchConfig::default()).unwrap());

        let outcome = enricher.enrich("Episode 1").await;
        assert!(matches!(outcome, EnrichmentOutcome::Failed(_)));
        assert!(outcome.into_match().is_none());
    }
}
