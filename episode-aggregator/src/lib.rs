pub mod types;
pub mod config;
pub mod duration;
pub mod classifier;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod sources;
pub mod enricher;
pub mod aggregator;
pub mod cache;
pub mod server;

pub use types::*;
pub use config::{AggregationPolicy, AggregatorConfig, CrossReferenceCredentials, Endpoints, PrimarySource};
pub use classifier::ShortFormClassifier;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::{CrossReferenceLookup, EpisodeSource};
pub use sources::{CatalogApiSource, VideoFeedSource};
pub use enricher::{CrossReferenceEnricher, EnrichmentOutcome};
pub use aggregator::EpisodeAggregator;
pub use cache::EpisodeCache;
pub use server::{AppState, ServerConfig};
