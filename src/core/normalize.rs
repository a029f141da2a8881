//! Canonicalization of raw feed plays.
//!
//! The normalizer is total: upstream data is uncontrolled, so absent or
//! malformed fields default instead of failing. A weak descriptor just has
//! less matching power downstream.

use crate::domain::{Half, PlayDescriptor};
use crate::feeds::statsapi::Play;

/// Build the canonical descriptor for a raw feed play. Never fails and has
/// no side effects.
pub fn normalize(raw: &Play) -> PlayDescriptor {
    let event = raw.result.event.as_deref().unwrap_or("");
    let half_inning = raw.about.half_inning.as_deref().unwrap_or("");

    PlayDescriptor {
        batter_name: person_name(&raw.matchup.batter),
        pitcher_name: person_name(&raw.matchup.pitcher),
        event_kind: event_kind_token(event),
        description: raw
            .result
            .description
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase(),
        inning: raw.about.inning.unwrap_or(0),
        half: Half::from_feed(half_inning),
        away_score: raw.about.away_score.unwrap_or(0),
        home_score: raw.about.home_score.unwrap_or(0),
    }
}

fn person_name(person: &Option<crate::feeds::statsapi::Person>) -> String {
    person
        .as_ref()
        .and_then(|p| p.full_name.clone())
        .unwrap_or_default()
}

/// `"Home Run"` becomes `"home_run"`: the candidate feed's event vocabulary,
/// so lexical containment between the two sources works.
pub fn event_kind_token(event: &str) -> String {
    event
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
