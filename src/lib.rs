//! dinger - MLB home run clip tracker
//!
//! Polls the official MLB stats feed for the tracked team's home runs, finds
//! the matching broadcast clip on Baseball Savant, converts it to a short
//! GIF with ffmpeg, and posts it to Discord/Telegram.
//!
//! # Architecture
//!
//! The two data sources share no identifier and use different vocabularies,
//! so the heart of the system is a matching heuristic:
//!
//! - plays from the official feed are normalized to a `PlayDescriptor`
//! - the third-party per-pitch feed is scored with weighted signals to find
//!   the pitch carrying the footage, with a relaxation chain when strict
//!   scoring comes up empty
//! - clip resolution probes direct CDN templates, then scrapes the viewer
//!   page; only probed-alive URLs are handed downstream
//! - an official-highlights lookup runs as a secondary source
//! - "no clip" is a normal outcome everywhere, never an error
//!
//! # Modules
//!
//! - `adapters`: chat delivery (Discord webhook, Telegram bot)
//! - `core`: normalization, scoring, lookup orchestration
//! - `feeds`: HTTP clients for the official and third-party feeds
//! - `media`: ffmpeg GIF conversion
//! - `tracker`: the background polling loop
//! - `cli`: operator commands
//!
//! # Usage
//!
//! ```bash
//! # Run the tracker
//! dinger track
//!
//! # Browse today's games, then a game's plays
//! dinger games
//! dinger plays --game 717465
//!
//! # Manually clip one play
//! dinger clip --game 717465 --at-bat 21
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod dedup;
pub mod domain;
pub mod feeds;
pub mod media;
pub mod tracker;

// Re-export the main types at crate root for convenience
pub use crate::core::{best_match, normalize, select_with_fallback, ClipLocator};
pub use config::Config;
pub use dedup::SeenStore;
pub use domain::{
    Candidate, Half, MatchResult, PlayDescriptor, PlaySummary, ResolvedClip, SelectionTier,
};
pub use feeds::{SavantClient, StatsApiClient};
pub use media::{FfmpegTranscoder, MediaTranscoder};
pub use tracker::HomeRunTracker;

// Chat integrations
pub use adapters::{DiscordWebhook, NotificationSender, TelegramBot};
