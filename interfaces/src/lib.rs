pub mod defs;

pub use defs::{CrossReference, EpisodeGroup, EpisodeRecord};
