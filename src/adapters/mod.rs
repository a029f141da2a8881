//! Chat delivery adapters.
//!
//! Senders are constructed from config in the entry point and injected into
//! the tracker; an unconfigured sender reports so and is skipped rather than
//! erroring.

pub mod discord;
pub mod telegram;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::PlaySummary;

pub use discord::DiscordWebhook;
pub use telegram::{ChatInfo, TelegramBot};

/// A channel that can deliver a play notification, optionally with an
/// animation attached.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool;

    /// Deliver a summary. Returns true only on confirmed delivery; transport
    /// errors are logged inside and surface as false.
    async fn send(&self, summary: &PlaySummary, attachment: Option<&Path>) -> bool;
}
