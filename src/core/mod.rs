//! The matching core: normalization, candidate scoring, and the per-play
//! lookup state machine.

pub mod highlights;
pub mod normalize;
pub mod orchestrator;
pub mod scorer;

pub use highlights::{best_highlight, best_playback};
pub use normalize::normalize;
pub use orchestrator::ClipLocator;
pub use scorer::{best_match, score_candidate, select_with_fallback};
