//! Scorer property tests.
//!
//! Covers the selection invariants: no video-less candidate is ever chosen,
//! inning mismatches never enter the strict pass, selection is deterministic
//! with feed-order tie-breaks, and the fallback chain is idempotent.

use dinger::domain::{Candidate, Half, PlayDescriptor, SelectionTier};
use dinger::{best_match, select_with_fallback};

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

fn candidate(
    batter: &str,
    event: &str,
    inning: u32,
    contact: bool,
    clip: Option<&str>,
) -> Candidate {
    Candidate {
        batter_name: batter.to_string(),
        event_text: event.to_string(),
        description_text: String::new(),
        inning,
        is_contact_pitch: contact,
        has_hit_data: false,
        clip_id: clip.map(str::to_string),
    }
}

/// Scenario A from the design notes: the contact pitch wins over a
/// non-contact pitch in the same at-bat.
#[test]
fn contact_pitch_beats_other_pitches_of_the_at_bat() {
    let candidates = vec![
        candidate("alonso, pete", "home_run", 3, true, Some("abc")),
        candidate("alonso, pete", "ball", 3, false, Some("xyz")),
    ];

    let result = best_match(&target(), &candidates).unwrap();
    assert_eq!(result.candidate.clip_id.as_deref(), Some("abc"));
    assert_eq!(result.tier, SelectionTier::Scored);
}

/// Scenario B: a candidate set with no clip ids can never produce a match,
/// at any fallback level.
#[test]
fn clipless_candidates_are_never_selected() {
    let candidates = vec![
        candidate("alonso, pete", "home_run", 3, true, None),
        candidate("alonso, pete", "home_run", 3, false, None),
    ];

    assert!(best_match(&target(), &candidates).is_none());
    assert!(select_with_fallback(&target(), &candidates).is_none());
}

/// Whenever a result is returned, it carries a clip id.
#[test]
fn selected_result_always_has_clip_id() {
    let mixed = vec![
        candidate("alonso, pete", "home_run", 3, true, None),
        candidate("lindor, francisco", "single", 5, true, Some("only-clip")),
    ];

    let result = select_with_fallback(&target(), &mixed).unwrap();
    assert!(result.candidate.clip_id.is_some());
    assert_eq!(result.candidate.clip_id.as_deref(), Some("only-clip"));
}

/// An inning-mismatched but otherwise perfect textual match returns none at
/// the strict level; only the fallback chain may pick it up.
#[test]
fn inning_mismatch_disqualifies_from_strict_pass() {
    let t = target();
    let mut perfect_wrong_inning =
        candidate("alonso, pete", "home_run", 7, true, Some("abc"));
    perfect_wrong_inning.description_text = t.description.clone();

    assert!(best_match(&t, &[perfect_wrong_inning.clone()]).is_none());

    let fallback = select_with_fallback(&t, &[perfect_wrong_inning]).unwrap();
    assert_eq!(fallback.tier, SelectionTier::AnyContact);
}

/// Identical inputs produce identical outputs, run after run.
#[test]
fn selection_is_deterministic() {
    let candidates = vec![
        candidate("alonso, pete", "home_run", 3, true, Some("a")),
        candidate("alonso, pete", "home_run", 3, true, Some("b")),
        candidate("alonso, pete", "ball", 3, false, Some("c")),
    ];

    let first = best_match(&target(), &candidates).unwrap();
    for _ in 0..10 {
        let again = best_match(&target(), &candidates).unwrap();
        assert_eq!(again.candidate.clip_id, first.candidate.clip_id);
        assert_eq!(again.score, first.score);
    }
}

/// Two equal-score candidates: the first listed wins, and swapping input
/// order swaps the winner. Order is the tie-break, nothing else.
#[test]
fn equal_scores_break_ties_by_feed_order() {
    let a = candidate("alonso, pete", "home_run", 3, true, Some("a"));
    let b = candidate("alonso, pete", "home_run", 3, true, Some("b"));

    let forward = best_match(&target(), &[a.clone(), b.clone()]).unwrap();
    assert_eq!(forward.candidate.clip_id.as_deref(), Some("a"));

    let reversed = best_match(&target(), &[b, a]).unwrap();
    assert_eq!(reversed.candidate.clip_id.as_deref(), Some("b"));
}

/// Exhausted input produces the same terminal answer every time.
#[test]
fn fallback_chain_is_idempotent_on_exhausted_input() {
    let exhausted = vec![
        candidate("alonso, pete", "home_run", 3, true, None),
        candidate("nimmo, brandon", "walk", 4, false, None),
    ];

    assert!(select_with_fallback(&target(), &exhausted).is_none());
    assert!(select_with_fallback(&target(), &exhausted).is_none());
}

/// Fallback levels engage strictly in order.
#[test]
fn fallback_levels_engage_in_order() {
    let t = target();

    // Level (a): inning matches but zero lexical/contact signal would score
    // positive anyway via batter overlap; use a fully foreign candidate.
    let inning_only = candidate("ramirez, jose", "foul", 3, false, Some("x"));
    let result = select_with_fallback(&t, &[inning_only]).unwrap();
    assert_eq!(result.tier, SelectionTier::InningClip);

    // Level (b): wrong inning, contact pitch.
    let contact_elsewhere = candidate("ramirez, jose", "single", 6, true, Some("y"));
    let result = select_with_fallback(&t, &[contact_elsewhere]).unwrap();
    assert_eq!(result.tier, SelectionTier::AnyContact);

    // Level (c): wrong inning, not a contact pitch.
    let any_clip = candidate("ramirez, jose", "ball", 6, false, Some("z"));
    let result = select_with_fallback(&t, &[any_clip]).unwrap();
    assert_eq!(result.tier, SelectionTier::AnyClip);
}
