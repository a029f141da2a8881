//! Text-overlap scoring for the official highlights feed.
//!
//! This is the secondary lookup source: when the pitch feed yields nothing,
//! highlight reel entries are scored by name-token and event-keyword overlap
//! against their title and description. Analogous to the candidate scorer
//! but simpler, since highlights carry no inning or pitch structure.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::PlayDescriptor;
use crate::feeds::statsapi::{Highlight, Playback};

pub const NAME_TOKEN_WEIGHT: i64 = 25;
pub const EVENT_KEYWORD_WEIGHT: i64 = 50;

/// Playback resolution preference: aim for 720p, reject anything below 360p
/// (unwatchable) or above 1080p (slows the transcoder for no visible gain).
const IDEAL_HEIGHT: i64 = 720;
const MIN_HEIGHT: i64 = 360;
const MAX_HEIGHT: i64 = 1080;

/// Keywords a highlight title would use for an event kind.
fn event_keywords(event_kind: &str) -> Vec<String> {
    match event_kind {
        "home_run" => vec!["home run".into(), "homer".into(), "hr".into()],
        "grand_slam" => vec!["grand slam".into(), "homer".into()],
        "" => Vec::new(),
        other => vec![other.replace('_', " ")],
    }
}

/// Name-token plus event-keyword overlap over the highlight's title and
/// description.
pub fn score_highlight(target: &PlayDescriptor, highlight: &Highlight) -> i64 {
    let text = format!(
        "{} {}",
        highlight.title,
        highlight.description.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let mut score = 0;

    for name in [&target.batter_name, &target.pitcher_name] {
        score += name
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|t| t.len() > 2)
            .filter(|t| text.contains(t))
            .count() as i64
            * NAME_TOKEN_WEIGHT;
    }

    if event_keywords(&target.event_kind)
        .iter()
        .any(|kw| text.contains(kw.as_str()))
    {
        score += EVENT_KEYWORD_WEIGHT;
    }

    score
}

/// The best strictly-positive highlight, ties going to the first listed.
pub fn best_highlight<'a>(
    target: &PlayDescriptor,
    highlights: &'a [Highlight],
) -> Option<&'a Highlight> {
    let mut best: Option<(&Highlight, i64)> = None;
    for highlight in highlights {
        let score = score_highlight(target, highlight);
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((highlight, score));
        }
    }
    best.map(|(h, _)| h)
}

/// The most transcoder-friendly rendition of a highlight: direct mp4 files
/// only, resolution closest to 720p within the acceptable range. When no
/// rendition advertises a parseable resolution, the first mp4 wins.
pub fn best_playback(highlight: &Highlight) -> Option<&Playback> {
    let mp4s: Vec<&Playback> = highlight
        .playbacks
        .iter()
        .filter(|p| p.url.contains(".mp4"))
        .collect();

    mp4s.iter()
        .filter_map(|p| playback_height(p).map(|h| (*p, h)))
        .filter(|(_, h)| (MIN_HEIGHT..=MAX_HEIGHT).contains(h))
        .min_by_key(|(_, h)| (h - IDEAL_HEIGHT).abs())
        .map(|(p, _)| p)
        .or_else(|| mp4s.first().copied())
}

/// Vertical resolution of a playback, from its height field or a
/// `1280x720`-style token in the rendition name or URL.
fn playback_height(playback: &Playback) -> Option<i64> {
    if let Some(h) = playback
        .height
        .as_deref()
        .and_then(|h| h.trim().parse::<i64>().ok())
    {
        return Some(h);
    }

    static DIMENSIONS: OnceLock<Regex> = OnceLock::new();
    let pattern = DIMENSIONS
        .get_or_init(|| Regex::new(r"(\d{3,4})[xX](\d{3,4})").expect("static dimensions pattern"));

    for source in [playback.name.as_deref().unwrap_or(""), &playback.url] {
        if let Some(captures) = pattern.captures(source) {
            if let Ok(h) = captures[2].parse() {
                return Some(h);
            }
        }
    }
    None
}
