//! Weighted candidate scoring and the relaxation chain.
//!
//! The official play-by-play feed and the third-party pitch feed share no
//! identifier and use incompatible vocabularies, so selection triangulates
//! from several weak signals summed into one score. The contact-pitch signal
//! alone outweighs every lexical signal combined: the contact pitch is
//! definitionally the one carrying the footage, and a lexical match on an
//! earlier ball or strike in the same at-bat is a false positive.
//!
//! Weights are fixed design constants, not runtime configuration.

use crate::domain::{Candidate, MatchResult, PlayDescriptor, SelectionTier};

pub const CONTACT_PITCH_WEIGHT: i64 = 1000;
pub const HIT_DATA_WEIGHT: i64 = 500;
pub const EXACT_EVENT_WEIGHT: i64 = 200;
pub const DESCRIPTION_WEIGHT: i64 = 100;
pub const SYNONYM_DESCRIPTION_WEIGHT: i64 = 100;
pub const EVENT_FIELD_WEIGHT: i64 = 50;
pub const SYNONYM_EVENT_WEIGHT: i64 = 50;
pub const BATTER_TOKEN_WEIGHT: i64 = 50;

/// Domain synonyms for compound event kinds, keyed by normalized token.
/// Broadcast descriptions rarely repeat the feed's exact phrasing.
fn synonyms_for(event_kind: &str) -> &'static [&'static str] {
    match event_kind {
        "home_run" => &["homer", "home run"],
        "grand_slam" => &["grand slam", "homer", "home run"],
        _ => &[],
    }
}

/// Event kinds where the ball was put in play, so Statcast hit data on the
/// candidate confirms it is the contact pitch.
fn is_hit_kind(event_kind: &str) -> bool {
    matches!(
        event_kind,
        "single" | "double" | "triple" | "home_run" | "grand_slam"
    )
}

/// Sum of all signals that fire for one candidate against the target.
/// Inning and clip-id eligibility are enforced by [`best_match`], not here.
pub fn score_candidate(target: &PlayDescriptor, candidate: &Candidate) -> i64 {
    let mut score = 0;

    if candidate.is_contact_pitch {
        score += CONTACT_PITCH_WEIGHT;
    }

    let target_event = target.event_kind.as_str();
    let target_desc = target.description.as_str();
    let cand_desc = candidate.description_text.as_str();

    if contains_either(target_desc, cand_desc)
        || contains_either(&strip_whitespace(target_desc), &strip_whitespace(cand_desc))
    {
        score += DESCRIPTION_WEIGHT;
    }

    if contains_either(target_event, &candidate.event_text) {
        score += EVENT_FIELD_WEIGHT;
    }

    if !target_event.is_empty() && candidate.event_text.trim() == target_event {
        score += EXACT_EVENT_WEIGHT;
    }

    if batter_tokens_overlap(&target.batter_name, &candidate.batter_name) {
        score += BATTER_TOKEN_WEIGHT;
    }

    let synonyms = synonyms_for(target_event);
    if synonyms.iter().any(|s| cand_desc.contains(s)) {
        score += SYNONYM_DESCRIPTION_WEIGHT;
    }
    if synonyms.iter().any(|s| candidate.event_text.contains(s)) {
        score += SYNONYM_EVENT_WEIGHT;
    }

    if is_hit_kind(target_event) && candidate.has_hit_data {
        score += HIT_DATA_WEIGHT;
    }

    score
}

/// Substring containment in either direction, with empty strings never
/// counting as a signal.
fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn strip_whitespace(s: &str) -> String {
    s.split_whitespace().collect()
}

/// Token-level name overlap: any whitespace-delimited token of one name
/// appearing as a case-insensitive substring of the other. Tolerates the
/// "Alonso, Pete" vs "Pete Alonso" and Jr./diacritic drift between sources.
fn batter_tokens_overlap(target_name: &str, candidate_name: &str) -> bool {
    let target = target_name.to_lowercase();
    let candidate = candidate_name.to_lowercase();
    if target.is_empty() || candidate.is_empty() {
        return false;
    }

    let token_hits = |name: &str, other: &str| {
        name.split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|t| t.len() > 1)
            .any(|t| other.contains(t))
    };

    token_hits(&target, &candidate) || token_hits(&candidate, &target)
}

/// The strict pass: eligibility filter, scoring, stable descending sort.
///
/// Candidates without a clip id or with a mismatched inning are excluded
/// entirely, regardless of other signal strength. Zero scores are discarded
/// as "no real match". Ties keep original feed order, so the first-listed
/// candidate wins deterministically.
pub fn best_match(target: &PlayDescriptor, candidates: &[Candidate]) -> Option<MatchResult> {
    let mut scored: Vec<(&Candidate, i64)> = candidates
        .iter()
        .filter(|c| c.clip_id.is_some() && c.inning == target.inning)
        .filter_map(|c| {
            let score = score_candidate(target, c);
            (score > 0).then_some((c, score))
        })
        .collect();

    // sort_by is stable, so equal scores preserve feed order
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored.first().map(|(candidate, score)| MatchResult {
        candidate: (*candidate).clone(),
        score: *score,
        tier: SelectionTier::Scored,
    })
}

/// Strict scoring first, then three progressively weaker passes. Each level
/// runs only after the stricter one yields nothing:
///
/// 1. first inning-matching candidate with a clip id
/// 2. first contact pitch anywhere in the game with a clip id
/// 3. first candidate with any clip id
///
/// The tier is recorded on the result for offline quality auditing.
pub fn select_with_fallback(
    target: &PlayDescriptor,
    candidates: &[Candidate],
) -> Option<MatchResult> {
    if let Some(result) = best_match(target, candidates) {
        return Some(result);
    }

    let relaxed = |tier: SelectionTier, candidate: &Candidate| MatchResult {
        candidate: candidate.clone(),
        score: 0,
        tier,
    };

    if let Some(c) = candidates
        .iter()
        .find(|c| c.clip_id.is_some() && c.inning == target.inning)
    {
        return Some(relaxed(SelectionTier::InningClip, c));
    }

    if let Some(c) = candidates
        .iter()
        .find(|c| c.clip_id.is_some() && c.is_contact_pitch)
    {
        return Some(relaxed(SelectionTier::AnyContact, c));
    }

    if let Some(c) = candidates.iter().find(|c| c.clip_id.is_some()) {
        return Some(relaxed(SelectionTier::AnyClip, c));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Half;

    fn target() -> PlayDescriptor {
        PlayDescriptor {
            batter_name: "Pete Alonso".to_string(),
            pitcher_name: "Spencer Strider".to_string(),
            event_kind: "home_run".to_string(),
            description: "pete alonso homers (12) on a fly ball to left field.".to_string(),
            inning: 3,
            half: Half::Top,
            away_score: 2,
            home_score: 1,
        }
    }

    fn candidate(event: &str, contact: bool, clip: Option<&str>) -> Candidate {
        Candidate {
            batter_name: "alonso, pete".to_string(),
            event_text: event.to_string(),
            description_text: String::new(),
            inning: 3,
            is_contact_pitch: contact,
            has_hit_data: false,
            clip_id: clip.map(str::to_string),
        }
    }

    #[test]
    fn test_contact_pitch_dominates_lexical_signals() {
        let t = target();
        let contact = candidate("", true, Some("a"));
        let lexical = Candidate {
            event_text: "home_run".to_string(),
            description_text: t.description.clone(),
            has_hit_data: false,
            ..candidate("home_run", false, Some("b"))
        };

        assert!(score_candidate(&t, &contact) > score_candidate(&t, &lexical));
    }

    #[test]
    fn test_batter_token_overlap_handles_reordered_names() {
        assert!(batter_tokens_overlap("Pete Alonso", "alonso, pete"));
        assert!(batter_tokens_overlap("Ronald Acuña Jr.", "acuña jr., ronald"));
        assert!(!batter_tokens_overlap("Pete Alonso", "francisco lindor"));
        assert!(!batter_tokens_overlap("", "alonso, pete"));
    }

    #[test]
    fn test_empty_fields_fire_no_signal() {
        let mut t = target();
        t.description = String::new();
        t.event_kind = String::new();
        t.batter_name = String::new();
        let c = candidate("", false, Some("a"));

        assert_eq!(score_candidate(&t, &c), 0);
    }

    #[test]
    fn test_whitespace_stripped_description_containment() {
        let mut t = target();
        t.event_kind = "double".to_string();
        t.batter_name = String::new();
        t.description = "ground rule double".to_string();
        let mut c = candidate("", false, Some("a"));
        c.batter_name = String::new();
        c.description_text = "hits a groundruledouble down the line".to_string();

        assert_eq!(score_candidate(&t, &c), DESCRIPTION_WEIGHT);
    }

    #[test]
    fn test_best_match_excludes_clipless_candidates() {
        let t = target();
        // A perfect match in every respect except it has no video.
        let mut perfect = candidate("home_run", true, None);
        perfect.description_text = t.description.clone();

        assert!(best_match(&t, &[perfect]).is_none());
    }

    #[test]
    fn test_best_match_excludes_inning_mismatch() {
        let t = target();
        let mut wrong_inning = candidate("home_run", true, Some("a"));
        wrong_inning.description_text = t.description.clone();
        wrong_inning.inning = 7;

        assert!(best_match(&t, &[wrong_inning]).is_none());
    }

    #[test]
    fn test_ties_break_by_feed_order() {
        let t = target();
        let first = candidate("home_run", true, Some("first"));
        let second = candidate("home_run", true, Some("second"));

        let result = best_match(&t, &[first.clone(), second.clone()]).unwrap();
        assert_eq!(result.candidate.clip_id.as_deref(), Some("first"));

        // Reversed input order flips the winner: order is the tie-break.
        let result = best_match(&t, &[second, first]).unwrap();
        assert_eq!(result.candidate.clip_id.as_deref(), Some("second"));
    }

    #[test]
    fn test_fallback_tier_any_contact() {
        let mut t = target();
        t.inning = 9; // nothing in the 9th
        let c = candidate("single", true, Some("x"));

        let result = select_with_fallback(&t, &[c]).unwrap();
        assert_eq!(result.tier, SelectionTier::AnyContact);
    }

    #[test]
    fn test_fallback_tier_any_clip() {
        let mut t = target();
        t.inning = 9;
        let c = candidate("ball", false, Some("x"));

        let result = select_with_fallback(&t, &[c]).unwrap();
        assert_eq!(result.tier, SelectionTier::AnyClip);
    }

    #[test]
    fn test_fallback_exhausted_is_none() {
        let t = target();
        let clipless = candidate("home_run", true, None);

        assert!(select_with_fallback(&t, &[clipless]).is_none());
        assert!(select_with_fallback(&t, &[]).is_none());
    }
}
