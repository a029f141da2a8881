//! Clip-side types shared between the candidate feed, the scorer and the
//! resolver.

/// One raw per-pitch record from the third-party feed.
///
/// Candidates are a superset of plays: every pitch of every at-bat shows up,
/// and only the contact pitch carries the footage worth clipping. They are
/// fetched fresh per resolution attempt and never persisted.
///
/// Text fields arrive pre-lowercased from the fetcher so the scorer can do
/// plain containment checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub batter_name: String,
    pub event_text: String,
    pub description_text: String,
    pub inning: u32,
    /// True only for the pitch the ball was struck into play on.
    pub is_contact_pitch: bool,
    /// Statcast hit fields (exit velocity, distance) are only populated on
    /// the contact pitch, so their presence confirms the footage.
    pub has_hit_data: bool,
    /// Opaque UUID correlating this pitch to a video asset. Absent means no
    /// video exists for this candidate.
    pub clip_id: Option<String>,
}

/// Which selection pass produced a match, recorded for quality auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    /// Weighted scoring over inning-matched candidates.
    Scored,
    /// First inning-matched candidate with a clip id.
    InningClip,
    /// First contact pitch anywhere in the game with a clip id.
    AnyContact,
    /// First candidate in the game with any clip id.
    AnyClip,
}

impl SelectionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scored => "scored",
            Self::InningClip => "inning_clip",
            Self::AnyContact => "any_contact",
            Self::AnyClip => "any_clip",
        }
    }
}

/// A selected candidate with its score.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub candidate: Candidate,
    pub score: i64,
    pub tier: SelectionTier,
}

/// A video URL that answered a liveness probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClip {
    pub url: String,
    /// Playlist-style stream (`.m3u8`) rather than a direct file.
    pub is_segmented_stream: bool,
}
