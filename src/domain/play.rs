//! Play-side types: the canonical descriptor built from the official feed
//! and the summary handed to notification senders.

use serde::{Deserialize, Serialize};

/// Which half of the inning a play happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Top,
    Bottom,
}

impl Half {
    /// Parse the feed's `halfInning` string. Anything unrecognized maps to
    /// `Top` so a malformed play still yields a usable descriptor.
    pub fn from_feed(value: &str) -> Self {
        if value.eq_ignore_ascii_case("bottom") {
            Self::Bottom
        } else {
            Self::Top
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// The home side bats in the bottom of the inning.
    pub fn home_is_batting(&self) -> bool {
        matches!(self, Self::Bottom)
    }
}

impl Default for Half {
    fn default() -> Self {
        Self::Top
    }
}

/// Canonical representation of the play to illustrate.
///
/// `event_kind` uses the same lowercase underscore vocabulary as the
/// candidate feed's event field (`"Home Run"` becomes `"home_run"`) so
/// containment comparisons between the two sources are meaningful.
/// `description` is lowercased for the same reason.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayDescriptor {
    pub batter_name: String,
    pub pitcher_name: String,
    pub event_kind: String,
    pub description: String,
    pub inning: u32,
    pub half: Half,
    pub away_score: u32,
    pub home_score: u32,
}

/// Notification payload for a single play.
#[derive(Debug, Clone, Serialize)]
pub struct PlaySummary {
    pub event: String,
    pub description: String,
    pub away_team: String,
    pub home_team: String,
    pub inning: u32,
    pub half: Half,
    pub batter: String,
    pub pitcher: String,
    pub away_score: u32,
    pub home_score: u32,
    /// 0.0 to 1.0, see [`impact_score`].
    pub impact: f64,
}

/// How notable a play is, on a 0.0 to 1.0 scale.
///
/// Base score comes from the event kind, multiplied up in high-leverage
/// spots, plus any win probability the play actually moved.
pub fn impact_score(event_kind: &str, leverage: f64, wpa: f64) -> f64 {
    let event = event_kind.replace('_', " ");

    let mut base = if event.contains("home run") || event.contains("grand slam") {
        0.3
    } else if event.contains("triple") || event.contains("double") {
        0.25
    } else if event.contains("single") {
        0.15
    } else if event.contains("strikeout") {
        0.12
    } else if event.contains("walk") || event.contains("hit by pitch") {
        0.1
    } else {
        0.1
    };

    if leverage > 2.0 {
        base *= 1.5;
    } else if leverage > 1.5 {
        base *= 1.2;
    }

    (base + wpa.abs()).min(1.0)
}
