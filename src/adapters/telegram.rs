//! Telegram Bot API adapter.
//!
//! Clips go out as `sendAnimation` uploads with a Markdown caption; plays
//! without a clip fall back to a plain `sendMessage`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::NotificationSender;
use crate::domain::PlaySummary;

const TEXT_TIMEOUT: Duration = Duration::from_secs(30);
// File uploads get longer to push the animation through.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Telegram Bot API client.
pub struct TelegramBot {
    bot_token: Option<String>,
    chat_id: Option<String>,
    client: reqwest::Client,
}

/// Response envelope from the Bot API.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
    #[serde(default)]
    result: serde_json::Value,
}

/// A chat the bot can see, for first-time setup.
#[derive(Debug, Clone)]
pub struct ChatInfo {
    pub id: i64,
    pub kind: String,
    pub title: String,
}

impl TelegramBot {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        if bot_token.is_none() || chat_id.is_none() {
            warn!("telegram bot token or chat id not set, telegram notifications disabled");
        } else {
            info!("telegram bot configured");
        }
        Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> Option<String> {
        let token = self.bot_token.as_deref()?;
        Some(format!("https://api.telegram.org/bot{}/{}", token, method))
    }

    /// Markdown caption in the shape the channel expects.
    fn build_caption(summary: &PlaySummary) -> String {
        let mut caption = format!("🎯 *{}*\n\n", summary.event);
        if !summary.description.is_empty() {
            caption.push_str(&format!("📝 {}\n\n", summary.description));
        }
        caption.push_str(&format!(
            "⚾ *Matchup:* {} @ {}\n",
            summary.away_team, summary.home_team
        ));
        caption.push_str(&format!("📊 *Impact:* {:.1}%\n", summary.impact * 100.0));
        caption.push_str(&format!(
            "⏰ *Inning:* {} {}\n",
            summary.half.as_str(),
            summary.inning
        ));
        caption.push_str(&format!("🏏 *Batter:* {}\n", summary.batter));
        caption.push_str(&format!("⚾ *Pitcher:* {}\n", summary.pitcher));
        caption.push_str(&format!(
            "📈 *Score:* {}-{}",
            summary.away_score, summary.home_score
        ));
        caption
    }

    async fn send_animation(&self, caption: &str, path: &Path) -> Result<()> {
        let url = self
            .api_url("sendAnimation")
            .context("telegram not configured")?;
        let chat_id = self.chat_id.clone().context("telegram not configured")?;

        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .context("failed to read animation file")?;

        let form = Form::new()
            .text("chat_id", chat_id)
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part(
                "animation",
                Part::bytes(bytes).file_name(file_name).mime_str("image/gif")?,
            );

        let response: TelegramResponse = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .context("failed to send telegram animation")?
            .json()
            .await
            .context("failed to parse telegram response")?;

        if !response.ok {
            anyhow::bail!(
                "telegram api error: {}",
                response.description.unwrap_or_default()
            );
        }
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let url = self
            .api_url("sendMessage")
            .context("telegram not configured")?;
        let chat_id = self.chat_id.clone().context("telegram not configured")?;

        let response: TelegramResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .timeout(TEXT_TIMEOUT)
            .send()
            .await
            .context("failed to send telegram message")?
            .json()
            .await
            .context("failed to parse telegram response")?;

        if !response.ok {
            anyhow::bail!(
                "telegram api error: {}",
                response.description.unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Chats with pending updates for the bot. Setup helper: message the bot
    /// first, then run this to learn the chat id to configure.
    pub async fn list_chat_ids(&self) -> Result<Vec<ChatInfo>> {
        let url = self
            .api_url("getUpdates")
            .context("telegram bot token not set")?;

        let response: TelegramResponse = self
            .client
            .get(&url)
            .timeout(TEXT_TIMEOUT)
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("failed to parse getUpdates response")?;

        if !response.ok {
            anyhow::bail!(
                "telegram api error: {}",
                response.description.unwrap_or_default()
            );
        }

        let mut chats = Vec::new();
        for update in response.result.as_array().into_iter().flatten() {
            let Some(chat) = update.pointer("/message/chat") else {
                continue;
            };
            let Some(id) = chat.get("id").and_then(|v| v.as_i64()) else {
                continue;
            };
            if chats.iter().any(|c: &ChatInfo| c.id == id) {
                continue;
            }
            let title = chat
                .get("title")
                .or_else(|| chat.get("username"))
                .or_else(|| chat.get("first_name"))
                .and_then(|v| v.as_str())
                .unwrap_or("(unnamed)")
                .to_string();
            chats.push(ChatInfo {
                id,
                kind: chat
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                title,
            });
        }
        Ok(chats)
    }
}

#[async_trait]
impl NotificationSender for TelegramBot {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    async fn send(&self, summary: &PlaySummary, attachment: Option<&Path>) -> bool {
        if !self.is_configured() {
            debug!("telegram not configured, skipping notification");
            return false;
        }

        let caption = Self::build_caption(summary);
        let result = match attachment {
            Some(path) => self.send_animation(&caption, path).await,
            None => self.send_text(&caption).await,
        };

        match result {
            Ok(()) => {
                info!("telegram notification sent");
                true
            }
            Err(e) => {
                error!(error = %e, "telegram notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Half;

    fn summary() -> PlaySummary {
        PlaySummary {
            event: "Home Run".to_string(),
            description: "Pete Alonso homers (12) on a fly ball.".to_string(),
            away_team: "NYM".to_string(),
            home_team: "ATL".to_string(),
            inning: 3,
            half: Half::Top,
            batter: "Pete Alonso".to_string(),
            pitcher: "Spencer Strider".to_string(),
            away_score: 2,
            home_score: 1,
            impact: 1.0,
        }
    }

    #[test]
    fn test_api_url() {
        let bot = TelegramBot::new(Some("TOKEN".to_string()), Some("123".to_string()));
        assert_eq!(
            bot.api_url("sendMessage").unwrap(),
            "https://api.telegram.org/botTOKEN/sendMessage"
        );
    }

    #[test]
    fn test_api_url_unconfigured() {
        let bot = TelegramBot::new(None, None);
        assert!(bot.api_url("sendMessage").is_none());
        assert!(!bot.is_configured());
    }

    #[test]
    fn test_caption_contents() {
        let caption = TelegramBot::build_caption(&summary());
        assert!(caption.contains("*Home Run*"));
        assert!(caption.contains("NYM @ ATL"));
        assert!(caption.contains("*Impact:* 100.0%"));
        assert!(caption.contains("top 3"));
        assert!(caption.contains("Pete Alonso"));
        assert!(caption.contains("2-1"));
    }
}
