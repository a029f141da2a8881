//! Baseball Savant client: the per-game pitch feed and clip resolution.
//!
//! The site identifies clips only by opaque play UUIDs. Resolution tries a
//! fixed list of CDN URL templates first and falls back to scraping the clip
//! viewer page with prioritized patterns. Every URL is probed with a
//! metadata-only request before being accepted, so a `ResolvedClip` is always
//! known fetchable.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{Candidate, ResolvedClip};

const DEFAULT_BASE_URL: &str = "https://baseballsavant.mlb.com";
const DEFAULT_CLIP_CDN_URL: &str = "https://fastball-clips.mlb.com";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Cap on scraped URLs probed, keeping the whole resolution attempt bounded
/// by the sum of per-probe timeouts.
const MAX_SCRAPE_PROBES: usize = 5;

// The site occasionally rejects non-browser clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Client for the third-party site.
pub struct SavantClient {
    base_url: String,
    clip_cdn_url: String,
    client: reqwest::Client,
}

impl Default for SavantClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SavantClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_BASE_URL, DEFAULT_CLIP_CDN_URL)
    }

    /// Point the client at different hosts (used by tests).
    pub fn with_base_urls(base_url: impl Into<String>, clip_cdn_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clip_cdn_url: clip_cdn_url.into(),
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// The full candidate list for a game: one network call, both team
    /// sub-lists flattened.
    ///
    /// Any failure (non-success status, malformed payload, timeout) yields an
    /// empty list so callers treat "no data" and "no match possible" the
    /// same. The surrounding poller retries by resubmission on a later cycle.
    pub async fn fetch_candidates(&self, game_pk: u64) -> Vec<Candidate> {
        match self.fetch_game_feed(game_pk).await {
            Ok(feed) => {
                let candidates: Vec<Candidate> = feed
                    .team_home
                    .into_iter()
                    .chain(feed.team_away)
                    .map(RawPitch::into_candidate)
                    .collect();
                debug!(game_pk, count = candidates.len(), "fetched candidates");
                candidates
            }
            Err(e) => {
                warn!(game_pk, error = %e, "candidate fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_game_feed(&self, game_pk: u64) -> Result<GameFeed> {
        let url = format!("{}/gf?game_pk={}", self.base_url, game_pk);
        self.client
            .get(&url)
            .send()
            .await
            .context("game feed request failed")?
            .error_for_status()
            .context("game feed request rejected")?
            .json()
            .await
            .context("malformed game feed payload")
    }

    /// Find a fetchable video URL for a clip id.
    ///
    /// Direct CDN templates are tried first (cheapest for the transcoder),
    /// then the viewer page is scraped for embedded media URLs. The first
    /// URL whose probe succeeds wins; exhausting both strategies returns
    /// `None`, which is the single most common outcome and not an error.
    pub async fn resolve_clip(&self, clip_id: &str, game_pk: u64) -> Option<ResolvedClip> {
        for (url, segmented) in self.candidate_urls(clip_id, game_pk) {
            if self.probe(&url, segmented).await {
                info!(%url, "resolved clip via template");
                return Some(ResolvedClip {
                    url,
                    is_segmented_stream: segmented,
                });
            }
        }

        let html = match self.fetch_viewer_page(clip_id).await {
            Ok(html) => html,
            Err(e) => {
                warn!(clip_id, error = %e, "viewer page fetch failed");
                return None;
            }
        };

        for url in extract_media_urls(&html).into_iter().take(MAX_SCRAPE_PROBES) {
            if self.probe(&url, false).await {
                info!(%url, "resolved clip via viewer page");
                return Some(ResolvedClip {
                    url,
                    is_segmented_stream: false,
                });
            }
        }

        debug!(clip_id, "no fetchable clip url");
        None
    }

    /// Ordered URL constructions for an opaque clip id: direct files before
    /// segmented playlists, home before away CDN variants.
    fn candidate_urls(&self, clip_id: &str, game_pk: u64) -> Vec<(String, bool)> {
        let cdn = &self.clip_cdn_url;
        vec![
            (format!("{cdn}/{game_pk}/home/{clip_id}.mp4"), false),
            (format!("{cdn}/{game_pk}/away/{clip_id}.mp4"), false),
            (format!("{cdn}/{game_pk}/home/{clip_id}.m3u8"), true),
            (format!("{cdn}/{game_pk}/away/{clip_id}.m3u8"), true),
        ]
    }

    async fn fetch_viewer_page(&self, clip_id: &str) -> Result<String> {
        let url = format!("{}/sporty-videos?playId={}", self.base_url, clip_id);
        self.client
            .get(&url)
            .send()
            .await
            .context("viewer page request failed")?
            .error_for_status()
            .context("viewer page request rejected")?
            .text()
            .await
            .context("viewer page body unreadable")
    }

    /// Metadata-only liveness check. Success means status 200 and, for
    /// direct files, a media content type; the body is never downloaded.
    pub async fn probe(&self, url: &str, segmented: bool) -> bool {
        let response = match self
            .client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(%url, error = %e, "probe failed");
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(%url, status = %response.status(), "probe rejected");
            return false;
        }

        if segmented {
            return true;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if content_type.contains("video") || content_type.contains("mpegurl") {
            true
        } else {
            debug!(%url, content_type, "probe hit a non-media url");
            false
        }
    }
}

/// Extraction patterns for the viewer page, in fixed priority order. The
/// first grabs any bare clip CDN URL; the rest pull quoted src/url attributes
/// out of markup and embedded JSON. Attribute patterns accept any host since
/// the probe gates what is actually returned.
static MEDIA_URL_PATTERNS: &[&str] = &[
    r#"(?i)https://sporty-clips\.mlb\.com/[^"'\s]+\.mp4"#,
    r#"(?i)"src"\s*:\s*"(https?://[^"]+\.mp4)""#,
    r#"(?i)data-src="(https?://[^"]+\.mp4)""#,
    r#"(?i)source\s+src="(https?://[^"]+\.mp4)""#,
    r#"(?i)"url"\s*:\s*"(https?://[^"]+\.mp4)""#,
    r#"(?i)href="(https?://[^"]+\.mp4)""#,
];

fn media_url_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MEDIA_URL_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static media url pattern"))
            .collect()
    })
}

/// All media URLs found in viewer page HTML, in pattern-priority order with
/// duplicates removed.
pub fn extract_media_urls(html: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for pattern in media_url_patterns() {
        for captures in pattern.captures_iter(html) {
            let url = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|m| m.as_str().to_string());
            if let Some(url) = url {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
    }
    urls
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameFeed {
    team_home: Vec<RawPitch>,
    team_away: Vec<RawPitch>,
}

/// One row of the per-game feed. Numeric fields arrive as numbers or strings
/// depending on the season, so they are held as raw values and coerced.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPitch {
    batter_name: Option<String>,
    events: Option<String>,
    des: Option<String>,
    inning: Option<Value>,
    pitch_call: Option<String>,
    call: Option<String>,
    hit_speed: Option<Value>,
    hit_distance: Option<Value>,
    play_id: Option<String>,
}

impl RawPitch {
    fn into_candidate(self) -> Candidate {
        let is_contact_pitch = self.pitch_call.as_deref() == Some("hit_into_play")
            || self.call.as_deref() == Some("X");
        let has_hit_data = value_present(&self.hit_speed) || value_present(&self.hit_distance);

        Candidate {
            batter_name: self.batter_name.unwrap_or_default().to_lowercase(),
            event_text: self.events.unwrap_or_default().to_lowercase(),
            description_text: self.des.unwrap_or_default().to_lowercase(),
            inning: value_as_u32(&self.inning),
            is_contact_pitch,
            has_hit_data,
            clip_id: self.play_id.filter(|id| !id.is_empty()),
        }
    }
}

fn value_as_u32(value: &Option<Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as u32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn value_present(value: &Option<Value>) -> bool {
    match value {
        Some(Value::Null) | None => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_pitch_contact_detection() {
        let json = r#"{"batter_name": "Alonso, Pete", "events": "home_run",
                       "pitch_call": "hit_into_play", "inning": 3,
                       "play_id": "abc-123", "hit_speed": "108.2"}"#;
        let pitch: RawPitch = serde_json::from_str(json).unwrap();
        let candidate = pitch.into_candidate();

        assert!(candidate.is_contact_pitch);
        assert!(candidate.has_hit_data);
        assert_eq!(candidate.inning, 3);
        assert_eq!(candidate.clip_id.as_deref(), Some("abc-123"));
        assert_eq!(candidate.batter_name, "alonso, pete");
    }

    #[test]
    fn test_raw_pitch_no_contact() {
        let json = r#"{"events": "ball", "pitch_call": "ball", "inning": "3"}"#;
        let pitch: RawPitch = serde_json::from_str(json).unwrap();
        let candidate = pitch.into_candidate();

        assert!(!candidate.is_contact_pitch);
        assert!(!candidate.has_hit_data);
        assert_eq!(candidate.inning, 3); // string inning coerced
        assert!(candidate.clip_id.is_none());
    }

    #[test]
    fn test_empty_play_id_is_no_clip() {
        let json = r#"{"play_id": ""}"#;
        let pitch: RawPitch = serde_json::from_str(json).unwrap();
        assert!(pitch.into_candidate().clip_id.is_none());
    }

    #[test]
    fn test_candidate_url_ordering() {
        let client = SavantClient::with_base_urls("http://savant", "http://cdn");
        let urls = client.candidate_urls("abc", 717_000);

        assert_eq!(urls.len(), 4);
        // Direct files come before playlists.
        assert_eq!(urls[0].0, "http://cdn/717000/home/abc.mp4");
        assert!(!urls[0].1);
        assert_eq!(urls[2].0, "http://cdn/717000/home/abc.m3u8");
        assert!(urls[2].1);
    }

    #[test]
    fn test_extract_media_urls_priority_and_dedup() {
        let html = r#"
            <video><source src="https://sporty-clips.mlb.com/a1b2.mp4"></video>
            <script>{"src": "https://sporty-clips.mlb.com/a1b2.mp4"}</script>
            <a href="https://sporty-clips.mlb.com/c3d4.mp4">raw</a>
        "#;
        let urls = extract_media_urls(html);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://sporty-clips.mlb.com/a1b2.mp4");
        assert_eq!(urls[1], "https://sporty-clips.mlb.com/c3d4.mp4");
    }

    #[test]
    fn test_extract_media_urls_nothing_found() {
        assert!(extract_media_urls("<html><body>no videos here</body></html>").is_empty());
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(value_as_u32(&Some(serde_json::json!(7))), 7);
        assert_eq!(value_as_u32(&Some(serde_json::json!("7"))), 7);
        assert_eq!(value_as_u32(&Some(serde_json::json!("x"))), 0);
        assert_eq!(value_as_u32(&None), 0);

        assert!(value_present(&Some(serde_json::json!(108.2))));
        assert!(!value_present(&Some(serde_json::json!(""))));
        assert!(!value_present(&Some(serde_json::json!(null))));
        assert!(!value_present(&None));
    }
}
