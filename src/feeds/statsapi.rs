//! Official MLB stats feed client.
//!
//! Wire types are all-`Option` serde shapes. Absent fields are tolerated
//! everywhere and only default at the normalization boundary, so a partial
//! payload degrades matching power instead of failing the fetch.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://statsapi.mlb.com";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the official feed.
pub struct StatsApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl Default for StatsApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsApiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Games for one date, optionally filtered to a team.
    pub async fn schedule(&self, date: NaiveDate, team_id: Option<u32>) -> Result<Vec<Game>> {
        let mut url = format!(
            "{}/api/v1/schedule?sportId=1&date={}&hydrate=team,linescore",
            self.base_url,
            date.format("%Y-%m-%d")
        );
        if let Some(team) = team_id {
            url.push_str(&format!("&teamId={}", team));
        }

        let response: ScheduleResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("schedule request failed")?
            .error_for_status()
            .context("schedule request rejected")?
            .json()
            .await
            .context("malformed schedule payload")?;

        Ok(response
            .dates
            .into_iter()
            .flat_map(|d| d.games)
            .collect())
    }

    /// All plays for a game.
    ///
    /// The feed has moved between endpoint variants over the seasons, so the
    /// known ones are tried in order. Exhausting the list yields an empty
    /// vec, not an error: callers treat "no plays" as a normal quiet cycle.
    pub async fn play_by_play(&self, game_pk: u64) -> Vec<Play> {
        let endpoints = [
            format!("{}/api/v1/game/{}/playByPlay", self.base_url, game_pk),
            format!("{}/api/v1.1/game/{}/playByPlay", self.base_url, game_pk),
            format!("{}/api/v1/game/{}/feed/live", self.base_url, game_pk),
        ];

        for endpoint in &endpoints {
            match self.try_play_endpoint(endpoint).await {
                Ok(plays) if !plays.is_empty() => {
                    debug!(endpoint, count = plays.len(), "fetched plays");
                    return plays;
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!(endpoint, error = %e, "play endpoint failed");
                    continue;
                }
            }
        }

        warn!(game_pk, "no play-by-play endpoint returned plays");
        Vec::new()
    }

    async fn try_play_endpoint(&self, url: &str) -> Result<Vec<Play>> {
        let response: PlayByPlayResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.all_plays.is_empty() {
            return Ok(response.all_plays);
        }
        Ok(response
            .live_data
            .map(|d| d.plays.all_plays)
            .unwrap_or_default())
    }

    /// Editorial content for a game; only the highlight reel entries are
    /// surfaced.
    pub async fn game_content(&self, game_pk: u64) -> Result<Vec<Highlight>> {
        let url = format!("{}/api/v1/game/{}/content", self.base_url, game_pk);

        let response: GameContent = self
            .client
            .get(&url)
            .send()
            .await
            .context("content request failed")?
            .error_for_status()
            .context("content request rejected")?
            .json()
            .await
            .context("malformed content payload")?;

        Ok(response
            .highlights
            .and_then(|h| h.highlights)
            .map(|h| h.items)
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Schedule wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScheduleResponse {
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScheduleDate {
    games: Vec<Game>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    pub game_pk: u64,
    /// ISO 8601 start time.
    pub game_date: String,
    pub status: GameStatus,
    pub teams: GameTeams,
    pub linescore: Option<Linescore>,
    pub venue: Option<Venue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStatus {
    pub status_code: String,
    pub detailed_state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameTeams {
    pub away: TeamSide,
    pub home: TeamSide,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamSide {
    pub team: Team,
    pub score: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub abbreviation: Option<String>,
}

impl Team {
    /// Abbreviation when the hydrate included it, otherwise the full name.
    pub fn short_name(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Linescore {
    pub current_inning: Option<u32>,
    pub inning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Venue {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Play-by-play wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayByPlayResponse {
    all_plays: Vec<Play>,
    live_data: Option<LiveData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LiveData {
    plays: PlaysNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlaysNode {
    all_plays: Vec<Play>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Play {
    pub result: PlayResult,
    pub about: PlayAbout,
    pub matchup: PlayMatchup,
    pub leverage_index: Option<f64>,
    pub win_probability_added: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayResult {
    pub event: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayAbout {
    pub inning: Option<u32>,
    pub half_inning: Option<String>,
    pub at_bat_index: Option<u32>,
    pub away_score: Option<u32>,
    pub home_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayMatchup {
    pub batter: Option<Person>,
    pub pitcher: Option<Person>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub id: Option<u64>,
    pub full_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Game content wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameContent {
    highlights: Option<HighlightsNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HighlightsNode {
    highlights: Option<HighlightItems>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HighlightItems {
    items: Vec<Highlight>,
}

/// One highlight reel entry with its available renditions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Highlight {
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub playbacks: Vec<Playback>,
}

/// A single rendition of a highlight.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Playback {
    pub name: Option<String>,
    pub url: String,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_by_play_top_level_shape() {
        let json = r#"{
            "allPlays": [
                {"result": {"event": "Home Run", "description": "He homers."},
                 "about": {"inning": 3, "halfInning": "top", "atBatIndex": 21}}
            ]
        }"#;
        let parsed: PlayByPlayResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.all_plays.len(), 1);
        assert_eq!(parsed.all_plays[0].about.inning, Some(3));
    }

    #[test]
    fn test_play_by_play_live_feed_shape() {
        let json = r#"{
            "liveData": {"plays": {"allPlays": [
                {"result": {"event": "Double"}, "about": {"inning": 1}}
            ]}}
        }"#;
        let parsed: PlayByPlayResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.all_plays.is_empty());
        let live = parsed.live_data.unwrap();
        assert_eq!(live.plays.all_plays.len(), 1);
    }

    #[test]
    fn test_play_missing_fields_tolerated() {
        let parsed: Play = serde_json::from_str("{}").unwrap();
        assert!(parsed.result.event.is_none());
        assert!(parsed.about.inning.is_none());
    }

    #[test]
    fn test_content_shape() {
        let json = r#"{
            "highlights": {"highlights": {"items": [
                {"title": "Alonso's 448-foot homer",
                 "playbacks": [{"name": "mp4Avc", "url": "https://x/clip.mp4", "height": "720"}]}
            ]}}
        }"#;
        let parsed: GameContent = serde_json::from_str(json).unwrap();
        let items = parsed.highlights.unwrap().highlights.unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].playbacks[0].height.as_deref(), Some("720"));
    }

    #[test]
    fn test_team_short_name_fallback() {
        let team = Team {
            id: 121,
            name: "New York Mets".to_string(),
            abbreviation: None,
        };
        assert_eq!(team.short_name(), "New York Mets");
    }
}
