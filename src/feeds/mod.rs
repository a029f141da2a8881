//! HTTP clients for the two upstream data sources.
//!
//! `statsapi` is the official MLB feed (schedule, play-by-play, game
//! content). `savant` is the third-party site that holds the raw per-pitch
//! records and the actual video assets.

pub mod savant;
pub mod statsapi;

pub use savant::SavantClient;
pub use statsapi::StatsApiClient;
