//! Discord webhook adapter.
//!
//! Plays go out as a rich embed; when a clip is attached the embed rides in
//! the `payload_json` field of a multipart upload.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, error, info, warn};

use super::NotificationSender;
use crate::domain::PlaySummary;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const EMBED_COLOR: u32 = 0xFF6B35;

/// Discord webhook client.
pub struct DiscordWebhook {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_none() {
            warn!("discord webhook url not set, discord notifications disabled");
        } else {
            info!("discord webhook configured");
        }
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_payload(summary: &PlaySummary) -> serde_json::Value {
        serde_json::json!({
            "username": "dinger",
            "embeds": [{
                "title": format!("🎯 {}", summary.event),
                "description": summary.description,
                "color": EMBED_COLOR,
                "fields": [
                    {
                        "name": "⚾ Matchup",
                        "value": format!("{} @ {}", summary.away_team, summary.home_team),
                        "inline": true
                    },
                    {
                        "name": "📊 Impact",
                        "value": format!("{:.1}%", summary.impact * 100.0),
                        "inline": true
                    },
                    {
                        "name": "⏰ Inning",
                        "value": format!("{} {}", summary.half.as_str(), summary.inning),
                        "inline": true
                    },
                    {
                        "name": "🏏 Batter",
                        "value": summary.batter,
                        "inline": true
                    },
                    {
                        "name": "⚾ Pitcher",
                        "value": summary.pitcher,
                        "inline": true
                    },
                    {
                        "name": "📈 Score",
                        "value": format!("{}-{}", summary.away_score, summary.home_score),
                        "inline": true
                    }
                ]
            }]
        })
    }

    async fn post(&self, summary: &PlaySummary, attachment: Option<&Path>) -> Result<()> {
        let url = self
            .webhook_url
            .as_deref()
            .context("discord not configured")?;
        let payload = Self::build_payload(summary);

        let response = match attachment {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .context("failed to read attachment")?;
                let file_name = format!("{}.gif", summary.event.replace(' ', "_"));
                let form = Form::new()
                    .text("payload_json", payload.to_string())
                    .part(
                        "file",
                        Part::bytes(bytes).file_name(file_name).mime_str("image/gif")?,
                    );

                self.client
                    .post(url)
                    .multipart(form)
                    .timeout(SEND_TIMEOUT)
                    .send()
                    .await
                    .context("failed to post discord webhook")?
            }
            None => self
                .client
                .post(url)
                .json(&payload)
                .timeout(SEND_TIMEOUT)
                .send()
                .await
                .context("failed to post discord webhook")?,
        };

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 204 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("discord webhook rejected ({}): {}", status, body)
        }
    }
}

#[async_trait]
impl NotificationSender for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, summary: &PlaySummary, attachment: Option<&Path>) -> bool {
        if !self.is_configured() {
            debug!("discord not configured, skipping notification");
            return false;
        }

        match self.post(summary, attachment).await {
            Ok(()) => {
                info!("discord notification sent");
                true
            }
            Err(e) => {
                error!(error = %e, "discord notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Half;

    #[test]
    fn test_payload_shape() {
        let summary = PlaySummary {
            event: "Home Run".to_string(),
            description: "Pete Alonso homers (12).".to_string(),
            away_team: "NYM".to_string(),
            home_team: "ATL".to_string(),
            inning: 3,
            half: Half::Top,
            batter: "Pete Alonso".to_string(),
            pitcher: "Spencer Strider".to_string(),
            away_score: 2,
            home_score: 1,
            impact: 0.45,
        };

        let payload = DiscordWebhook::build_payload(&summary);
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "🎯 Home Run");
        assert_eq!(embed["fields"][0]["value"], "NYM @ ATL");
        assert_eq!(embed["fields"][1]["value"], "45.0%");
        assert_eq!(embed["fields"][5]["value"], "2-1");
    }

    #[test]
    fn test_unconfigured() {
        let webhook = DiscordWebhook::new(None);
        assert!(!webhook.is_configured());
    }
}
