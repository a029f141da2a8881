//! Configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`DINGER_*`, `TELEGRAM_BOT_TOKEN`,
//!    `TELEGRAM_CHAT_ID`, `DISCORD_WEBHOOK_URL`)
//! 2. Config file (`.dinger/config.yaml`, searched upward from the current
//!    directory, then `~/.dinger/config.yaml`)
//! 3. Defaults
//!
//! The resolved config is built once in the entry point and passed by value
//! into collaborators; there is no global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// New York Mets.
pub const DEFAULT_TEAM_ID: u32 = 121;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
const DEFAULT_MAX_CLIP_SECONDS: u32 = 8;
/// Discord's upload ceiling; Telegram's is higher, one budget keeps it simple.
const DEFAULT_MAX_CLIP_BYTES: u64 = 8 * 1024 * 1024;
const DEFAULT_SEEN_CAPACITY: usize = 200;

/// Raw config file schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub team_id: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    pub telegram: Option<TelegramSection>,
    pub discord: Option<DiscordSection>,
    pub clip: Option<ClipSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscordSection {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClipSection {
    pub max_seconds: Option<u32>,
    pub max_bytes: Option<u64>,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub team_id: u32,
    pub poll_interval: Duration,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub max_clip_seconds: u32,
    pub max_clip_bytes: u64,
    pub seen_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            team_id: DEFAULT_TEAM_ID,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            telegram_bot_token: None,
            telegram_chat_id: None,
            discord_webhook_url: None,
            max_clip_seconds: DEFAULT_MAX_CLIP_SECONDS,
            max_clip_bytes: DEFAULT_MAX_CLIP_BYTES,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
        }
    }
}

impl Config {
    /// Load from file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::from_file_contents(&load_config_file(&path)?)
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file_contents(file: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            team_id: file.team_id.unwrap_or(defaults.team_id),
            poll_interval: file
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            telegram_bot_token: file.telegram.as_ref().and_then(|t| t.bot_token.clone()),
            telegram_chat_id: file.telegram.as_ref().and_then(|t| t.chat_id.clone()),
            discord_webhook_url: file.discord.as_ref().and_then(|d| d.webhook_url.clone()),
            max_clip_seconds: file
                .clip
                .as_ref()
                .and_then(|c| c.max_seconds)
                .unwrap_or(defaults.max_clip_seconds),
            max_clip_bytes: file
                .clip
                .as_ref()
                .and_then(|c| c.max_bytes)
                .unwrap_or(defaults.max_clip_bytes),
            seen_capacity: defaults.seen_capacity,
        }
    }

    fn apply_env(&mut self) {
        if let Some(token) = non_empty_env("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty_env("TELEGRAM_CHAT_ID") {
            self.telegram_chat_id = Some(chat_id);
        }
        if let Some(url) = non_empty_env("DISCORD_WEBHOOK_URL") {
            self.discord_webhook_url = Some(url);
        }
        if let Some(team) = non_empty_env("DINGER_TEAM_ID").and_then(|v| v.parse().ok()) {
            self.team_id = team;
        }
        if let Some(secs) = non_empty_env("DINGER_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok())
        {
            self.poll_interval = Duration::from_secs(secs);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Search the current directory and its parents, then the home directory.
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let candidate = current.join(".dinger").join("config.yaml");
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                break;
            }
        }
    }

    let home_candidate = dirs::home_dir()?.join(".dinger").join("config.yaml");
    home_candidate.exists().then_some(home_candidate)
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.team_id, DEFAULT_TEAM_ID);
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.max_clip_bytes, 8 * 1024 * 1024);
        assert!(config.telegram_bot_token.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
team_id: 147
poll_interval_secs: 60
telegram:
  bot_token: "tok"
  chat_id: "42"
clip:
  max_seconds: 6
"#
        )
        .unwrap();

        let parsed = load_config_file(&path).unwrap();
        let config = Config::from_file_contents(&parsed);

        assert_eq!(config.team_id, 147);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.telegram_bot_token.as_deref(), Some("tok"));
        assert_eq!(config.telegram_chat_id.as_deref(), Some("42"));
        assert_eq!(config.max_clip_seconds, 6);
        // Unset values keep their defaults
        assert_eq!(config.max_clip_bytes, 8 * 1024 * 1024);
        assert!(config.discord_webhook_url.is_none());
    }

    #[test]
    fn test_partial_file_tolerated() {
        let file: ConfigFile = serde_yaml::from_str("team_id: 110").unwrap();
        let config = Config::from_file_contents(&file);
        assert_eq!(config.team_id, 110);
        assert_eq!(config.poll_interval, Duration::from_secs(120));
    }
}
