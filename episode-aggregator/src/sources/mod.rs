pub mod catalog_api;
pub mod video_feed;

pub use catalog_api::{drain_pages, CatalogApiSource, Page};
pub use video_feed::VideoFeedSource;

use crate::config::{AggregatorConfig, PrimarySource};
use crate::traits::EpisodeSource;
use crate::Fetcher;
use std::sync::Arc;

/// Build the retrieval strategy named by the configuration, if any.
pub fn build_source(config: &AggregatorConfig, fetcher: Fetcher) -> Option<Arc<dyn EpisodeSource>> {
    let source: Arc<dyn EpisodeSource> = match config.source.as_ref()? {
        PrimarySource::Feed { url } => Arc::new(VideoFeedSource::new(url.clone(), fetcher)),
        PrimarySource::CatalogApi { api_key, channel_id } => Arc::new(CatalogApiSource::new(
            config.endpoints.catalog_api_base.clone(),
            api_key.clone(),
            channel_id.clone(),
            config.policy.page_size,
            config.policy.detail_batch_size,
            fetcher,
        )),
    };
    Some(source)
}
