use crate::types::{EpisodeGroup, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_REVALIDATE_SECS: u64 = 600;

struct CachedGroups {
    fetched_at: Instant,
    groups: Arc<Vec<EpisodeGroup>>,
}

/// Time-boxed revalidation of the aggregated catalog. Failures are never cached.
pub struct EpisodeCache {
    ttl: Duration,
    entry: RwLock<Option<CachedGroups>>,
}

impl EpisodeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Return the cached catalog while it is fresh, otherwise run `refresh`
    /// and keep its result if it succeeded.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<Vec<EpisodeGroup>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<EpisodeGroup>>>,
    {
        {
            let entry = self.entry.read().await;
            if let Some(cached) = entry.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!("Serving cached episodes ({}s old)", cached.fetched_at.elapsed().as_secs());
                    return Ok(cached.groups.clone());
                }
            }
        }

        let groups = Arc::new(refresh().await?);
        {
            let mut entry = self.entry.write().await;
            *entry = Some(CachedGroups {
                fetched_at: Instant::now(),
                groups: groups.clone(),
            });
        }
        Ok(groups)
    }
}

impl Default for EpisodeCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_REVALIDATE_SECS))
    }
}
