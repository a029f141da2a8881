//! Background home run tracker: the polling loop that drives the pipeline.
//!
//! Each cycle finds the tracked team's live and recent games, scans their
//! plays for new home runs, and for each one runs lookup, transcode and
//! notification. Every step degrades to "nothing this cycle" rather than
//! killing the loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::adapters::NotificationSender;
use crate::config::Config;
use crate::core::{normalize, ClipLocator};
use crate::dedup::SeenStore;
use crate::domain::{impact_score, PlayDescriptor, PlaySummary};
use crate::feeds::statsapi::{Game, Play};
use crate::feeds::StatsApiClient;
use crate::media::MediaTranscoder;

/// Notifications get a couple of retries before the play is given up on.
const MAX_SEND_ATTEMPTS: u32 = 3;
const SEND_RETRY_DELAY: Duration = Duration::from_secs(30);

pub struct HomeRunTracker {
    config: Config,
    statsapi: StatsApiClient,
    locator: ClipLocator,
    transcoder: Arc<dyn MediaTranscoder>,
    senders: Vec<Arc<dyn NotificationSender>>,
    seen: SeenStore,
}

impl HomeRunTracker {
    pub fn new(
        config: Config,
        statsapi: StatsApiClient,
        locator: ClipLocator,
        transcoder: Arc<dyn MediaTranscoder>,
        senders: Vec<Arc<dyn NotificationSender>>,
    ) -> Self {
        let seen = SeenStore::new(config.seen_capacity);
        Self {
            config,
            statsapi,
            locator,
            transcoder,
            senders,
            seen,
        }
    }

    /// Poll until the task is cancelled. In-flight attempts are simply
    /// abandoned on shutdown; they are side-effect-free until the final send.
    pub async fn run(&self) {
        info!(
            team_id = self.config.team_id,
            interval_secs = self.config.poll_interval.as_secs(),
            "tracker started"
        );

        let mut cycle = 0u64;
        loop {
            cycle += 1;
            debug!(cycle, "poll cycle");
            if let Err(e) = self.poll_once().await {
                warn!(error = %e, "poll cycle failed");
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One monitoring cycle, also usable standalone.
    pub async fn poll_once(&self) -> Result<()> {
        let games = self.watchable_games().await?;
        if games.is_empty() {
            debug!("no games for team, standing by");
            return Ok(());
        }

        for game in &games {
            self.scan_game(game).await;
        }
        Ok(())
    }

    /// The team's games worth scanning: today's and yesterday's slate with
    /// live games first, warmups and recently finished games after, and
    /// not-yet-started games dropped.
    async fn watchable_games(&self) -> Result<Vec<Game>> {
        let mut all = Vec::new();
        for date in query_dates() {
            match self.statsapi.schedule(date, Some(self.config.team_id)).await {
                Ok(games) => all.extend(games),
                Err(e) => warn!(%date, error = %e, "schedule fetch failed"),
            }
        }

        let mut live = Vec::new();
        let mut recent = Vec::new();
        for game in all {
            match game.status.status_code.as_str() {
                "I" => live.push(game),
                "F" | "FT" | "FR" | "P" => recent.push(game),
                _ => {}
            }
        }

        live.extend(recent);
        Ok(live)
    }

    async fn scan_game(&self, game: &Game) {
        let plays = self.statsapi.play_by_play(game.game_pk).await;
        if plays.is_empty() {
            return;
        }

        let mut new_found = 0usize;
        for play in &plays {
            let Some((play_key, descriptor)) = self.detect_home_run(game, play) else {
                continue;
            };
            if self.seen.seen(&play_key) {
                continue;
            }
            // Marked before processing so a crash mid-send cannot double-post
            // on the next cycle.
            self.seen.mark_seen(&play_key);
            new_found += 1;

            info!(
                batter = %descriptor.batter_name,
                inning = descriptor.inning,
                game_pk = game.game_pk,
                "new home run detected"
            );
            self.process_home_run(game, play, &descriptor).await;
        }

        if new_found == 0 {
            debug!(game_pk = game.game_pk, scanned = plays.len(), "no new home runs");
        }
    }

    /// A play qualifies when it is a home run and the batting side (away in
    /// the top half, home in the bottom) is the tracked team.
    fn detect_home_run(&self, game: &Game, play: &Play) -> Option<(String, PlayDescriptor)> {
        let descriptor = normalize(play);
        if descriptor.event_kind != "home_run" {
            return None;
        }

        let batting_team_id = if descriptor.half.home_is_batting() {
            game.teams.home.team.id
        } else {
            game.teams.away.team.id
        };
        if batting_team_id != self.config.team_id {
            return None;
        }

        let play_key = format!(
            "{}_{}_{}_{}",
            game.game_pk,
            descriptor.inning,
            descriptor.half.as_str(),
            play.about.at_bat_index.unwrap_or(0)
        );
        Some((play_key, descriptor))
    }

    async fn process_home_run(&self, game: &Game, play: &Play, descriptor: &PlayDescriptor) {
        let clip = self
            .locator
            .find_video_for_play(game.game_pk, descriptor)
            .await;

        let gif = match &clip {
            Some(clip) => {
                self.transcoder
                    .to_short_clip(
                        &clip.url,
                        clip.is_segmented_stream,
                        self.config.max_clip_seconds,
                        self.config.max_clip_bytes,
                    )
                    .await
            }
            // No footage found: the notification still goes out text-only.
            // Real video or nothing; a placeholder image is never substituted.
            None => None,
        };

        let summary = build_summary(game, play, descriptor);
        let delivered = self.deliver(&summary, gif.as_deref()).await;
        if !delivered {
            warn!(batter = %descriptor.batter_name, "notification not delivered");
        }

        if let Some(path) = gif {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(path = %path.display(), error = %e, "clip cleanup failed");
            }
        }
    }

    /// Push to every configured channel; delivery counts if any confirms.
    async fn deliver(&self, summary: &PlaySummary, attachment: Option<&std::path::Path>) -> bool {
        let configured: Vec<_> = self
            .senders
            .iter()
            .filter(|s| s.is_configured())
            .collect();
        if configured.is_empty() {
            warn!("no notification channel configured");
            return false;
        }

        for attempt in 1..=MAX_SEND_ATTEMPTS {
            let mut any = false;
            for sender in &configured {
                if sender.send(summary, attachment).await {
                    any = true;
                }
            }
            if any {
                return true;
            }
            if attempt < MAX_SEND_ATTEMPTS {
                warn!(attempt, "all sends failed, retrying");
                tokio::time::sleep(SEND_RETRY_DELAY).await;
            }
        }
        false
    }
}

/// Today and yesterday in Eastern time. A fixed UTC-5 offset is close
/// enough: the two-day window absorbs both the DST hour and games that run
/// past midnight.
fn query_dates() -> [NaiveDate; 2] {
    let eastern_now = Utc::now() - chrono::Duration::hours(5);
    let today = eastern_now.date_naive();
    [today, today - chrono::Duration::days(1)]
}

/// Assemble the notification payload for a detected play.
pub fn build_summary(game: &Game, play: &Play, descriptor: &PlayDescriptor) -> PlaySummary {
    PlaySummary {
        event: play
            .result
            .event
            .clone()
            .unwrap_or_else(|| "Home Run".to_string()),
        description: play.result.description.clone().unwrap_or_default(),
        away_team: game.teams.away.team.short_name().to_string(),
        home_team: game.teams.home.team.short_name().to_string(),
        inning: descriptor.inning,
        half: descriptor.half,
        batter: descriptor.batter_name.clone(),
        pitcher: descriptor.pitcher_name.clone(),
        away_score: descriptor.away_score,
        home_score: descriptor.home_score,
        impact: impact_score(
            &descriptor.event_kind,
            play.leverage_index.unwrap_or(1.0),
            play.win_probability_added.unwrap_or(0.0),
        ),
    }
}
