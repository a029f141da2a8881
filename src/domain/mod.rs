//! Core value types.
//!
//! The four matching types (`PlayDescriptor`, `Candidate`, `MatchResult`,
//! `ResolvedClip`) are immutable value records produced and consumed within a
//! single resolution attempt. Nothing here is persisted.

pub mod clip;
pub mod play;

pub use clip::{Candidate, MatchResult, ResolvedClip, SelectionTier};
pub use play::{impact_score, Half, PlayDescriptor, PlaySummary};
