//! The per-play lookup state machine.
//!
//! Linear, no backtracking across sources:
//!
//! - PRIMARY_LOOKUP: third-party pitch feed, weighted scorer with fallback
//!   chain, clip resolver.
//! - SECONDARY_LOOKUP: official highlights feed, text-overlap scorer,
//!   rendition preference. Entered only when the primary yields nothing.
//! - UNAVAILABLE: both exhausted. A normal terminal state, not an error;
//!   the surrounding poller retries naturally on a later cycle.
//!
//! Collaborator clients are injected at construction so tests can point them
//! at stub hosts. The locator holds no mutable state, so concurrent lookups
//! need no locking.

use tracing::{debug, info, instrument, warn};

use crate::core::highlights::{best_highlight, best_playback};
use crate::core::scorer::select_with_fallback;
use crate::domain::{PlayDescriptor, ResolvedClip};
use crate::feeds::{SavantClient, StatsApiClient};

/// Finds a fetchable video URL for one play.
pub struct ClipLocator {
    savant: SavantClient,
    statsapi: StatsApiClient,
}

impl Default for ClipLocator {
    fn default() -> Self {
        Self::new(SavantClient::new(), StatsApiClient::new())
    }
}

impl ClipLocator {
    pub fn new(savant: SavantClient, statsapi: StatsApiClient) -> Self {
        Self { savant, statsapi }
    }

    /// One end-to-end resolution attempt. Returns `None` both for "no clip
    /// exists" and for transient upstream failure; the latter is logged at
    /// the boundary where it happened.
    #[instrument(skip(self, play), fields(batter = %play.batter_name, event = %play.event_kind))]
    pub async fn find_video_for_play(
        &self,
        game_pk: u64,
        play: &PlayDescriptor,
    ) -> Option<ResolvedClip> {
        if let Some(clip) = self.primary_lookup(game_pk, play).await {
            return Some(clip);
        }
        if let Some(clip) = self.secondary_lookup(game_pk, play).await {
            return Some(clip);
        }
        info!("no clip available from either source");
        None
    }

    async fn primary_lookup(&self, game_pk: u64, play: &PlayDescriptor) -> Option<ResolvedClip> {
        let candidates = self.savant.fetch_candidates(game_pk).await;
        if candidates.is_empty() {
            debug!("primary feed empty, skipping to secondary");
            return None;
        }

        let selected = select_with_fallback(play, &candidates)?;
        info!(
            score = selected.score,
            tier = selected.tier.as_str(),
            candidate_batter = %selected.candidate.batter_name,
            "selected candidate"
        );

        // Selection invariant: a video-less candidate is never selected.
        let clip_id = selected.candidate.clip_id.as_deref()?;
        self.savant.resolve_clip(clip_id, game_pk).await
    }

    async fn secondary_lookup(&self, game_pk: u64, play: &PlayDescriptor) -> Option<ResolvedClip> {
        let highlights = match self.statsapi.game_content(game_pk).await {
            Ok(highlights) => highlights,
            Err(e) => {
                warn!(error = %e, "highlights fetch failed");
                return None;
            }
        };

        let highlight = best_highlight(play, &highlights)?;
        let playback = best_playback(highlight)?;
        info!(title = %highlight.title, url = %playback.url, "selected highlight");

        // Same liveness rule as the primary path: never hand back an
        // unprobed URL.
        if self.savant.probe(&playback.url, false).await {
            Some(ResolvedClip {
                url: playback.url.clone(),
                is_segmented_stream: false,
            })
        } else {
            None
        }
    }
}
