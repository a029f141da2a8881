//! Operator commands.
//!
//! The CLI stands in for the old web dashboard: browse the day's games,
//! list a game's plays, and trigger the clip pipeline for one play by hand.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::{DiscordWebhook, NotificationSender, TelegramBot};
use crate::config::Config;
use crate::core::{normalize, ClipLocator};
use crate::domain::impact_score;
use crate::feeds::statsapi::Game;
use crate::feeds::{SavantClient, StatsApiClient};
use crate::media::{FfmpegTranscoder, MediaTranscoder};
use crate::tracker::{build_summary, HomeRunTracker};

#[derive(Parser)]
#[command(name = "dinger", about = "MLB home run clip tracker", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the background tracker until interrupted
    Track,

    /// List games for a date (default: today)
    Games {
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// List a game's plays with at-bat indexes
    Plays {
        /// Game identifier (gamePk)
        #[arg(long)]
        game: u64,
    },

    /// Find, convert and send the clip for one play
    Clip {
        /// Game identifier (gamePk)
        #[arg(long)]
        game: u64,

        /// At-bat index of the play (see `plays`)
        #[arg(long)]
        at_bat: u32,

        /// Keep the GIF locally instead of sending it
        #[arg(long)]
        no_send: bool,
    },

    /// Show chat ids visible to the configured Telegram bot
    ChatId,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Commands::Track => run_tracker(config).await,
            Commands::Games { date } => list_games(date).await,
            Commands::Plays { game } => list_plays(game).await,
            Commands::Clip {
                game,
                at_bat,
                no_send,
            } => clip_play(config, game, at_bat, no_send).await,
            Commands::ChatId => list_chat_ids(config).await,
        }
    }
}

fn build_senders(config: &Config) -> Vec<Arc<dyn NotificationSender>> {
    vec![
        Arc::new(DiscordWebhook::new(config.discord_webhook_url.clone())),
        Arc::new(TelegramBot::new(
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
        )),
    ]
}

async fn run_tracker(config: Config) -> Result<()> {
    let senders = build_senders(&config);
    let tracker = HomeRunTracker::new(
        config,
        StatsApiClient::new(),
        ClipLocator::default(),
        Arc::new(FfmpegTranscoder::new()),
        senders,
    );

    tokio::select! {
        _ = tracker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }
    Ok(())
}

async fn list_games(date: Option<String>) -> Result<()> {
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .context("date must be YYYY-MM-DD")?,
        None => chrono::Utc::now().date_naive(),
    };

    let client = StatsApiClient::new();
    let mut games = client.schedule(date, None).await?;
    if games.is_empty() {
        println!("No games on {}.", date);
        return Ok(());
    }

    games.sort_by_key(|g| (status_priority(g), g.game_date.clone()));

    println!("{} games on {}:\n", games.len(), date);
    for game in &games {
        let away = game.teams.away.team.short_name();
        let home = game.teams.home.team.short_name();
        let score = match (game.teams.away.score, game.teams.home.score) {
            (Some(a), Some(h)) => format!("{}-{}", a, h),
            _ => "-".to_string(),
        };
        println!(
            "  {:<8} {:>4} @ {:<4} {:>5}  {}",
            game.game_pk, away, home, score, game.status.detailed_state
        );
    }
    Ok(())
}

/// Live first, then warmup, scheduled, finished.
fn status_priority(game: &Game) -> u8 {
    match game.status.status_code.as_str() {
        "I" => 0,
        "P" => 1,
        "S" => 2,
        "F" | "FT" | "FR" => 3,
        _ => 4,
    }
}

async fn list_plays(game_pk: u64) -> Result<()> {
    let client = StatsApiClient::new();
    let plays = client.play_by_play(game_pk).await;
    if plays.is_empty() {
        println!("No plays found for game {}.", game_pk);
        return Ok(());
    }

    println!("{} plays in game {}:\n", plays.len(), game_pk);
    for play in &plays {
        let descriptor = normalize(play);
        let Some(event) = play.result.event.as_deref() else {
            continue;
        };
        let impact = impact_score(
            &descriptor.event_kind,
            play.leverage_index.unwrap_or(1.0),
            play.win_probability_added.unwrap_or(0.0),
        );
        println!(
            "  [{:>3}] {:<3}{} {:<20} {:<25} impact {:.2}",
            play.about.at_bat_index.unwrap_or(0),
            descriptor.half.as_str(),
            descriptor.inning,
            event,
            descriptor.batter_name,
            impact
        );
    }
    Ok(())
}

async fn clip_play(config: Config, game_pk: u64, at_bat: u32, no_send: bool) -> Result<()> {
    let statsapi = StatsApiClient::new();
    let plays = statsapi.play_by_play(game_pk).await;
    let play = plays
        .iter()
        .find(|p| p.about.at_bat_index == Some(at_bat))
        .with_context(|| format!("no play with at-bat index {} in game {}", at_bat, game_pk))?;

    // Team names for the notification; a miss just means blank fields.
    let today = chrono::Utc::now().date_naive();
    let mut game = None;
    for date in [today, today - chrono::Duration::days(1)] {
        let games = statsapi.schedule(date, None).await.unwrap_or_default();
        game = games.into_iter().find(|g| g.game_pk == game_pk);
        if game.is_some() {
            break;
        }
    }
    let game = game.unwrap_or_else(|| Game {
        game_pk,
        ..Game::default()
    });

    let descriptor = normalize(play);
    println!(
        "Looking for a clip: {} by {} ({}{})...",
        descriptor.event_kind,
        descriptor.batter_name,
        descriptor.half.as_str(),
        descriptor.inning
    );

    let locator = ClipLocator::new(SavantClient::new(), StatsApiClient::new());
    let Some(clip) = locator.find_video_for_play(game_pk, &descriptor).await else {
        // The dominant expected outcome, reported plainly.
        println!("No clip available for this play.");
        return Ok(());
    };
    println!("Resolved: {}", clip.url);

    let transcoder = FfmpegTranscoder::new();
    let Some(gif) = transcoder
        .to_short_clip(
            &clip.url,
            clip.is_segmented_stream,
            config.max_clip_seconds,
            config.max_clip_bytes,
        )
        .await
    else {
        println!("Transcode failed or over the size budget.");
        return Ok(());
    };

    if no_send {
        println!("GIF written to {}", gif.display());
        return Ok(());
    }

    let summary = build_summary(&game, play, &descriptor);
    let mut delivered = false;
    for sender in build_senders(&config) {
        if sender.is_configured() && sender.send(&summary, Some(gif.as_path())).await {
            println!("Sent via {}.", sender.name());
            delivered = true;
        }
    }
    if !delivered {
        println!("No configured channel confirmed delivery.");
    }

    if let Err(e) = tokio::fs::remove_file(&gif).await {
        println!("Note: could not remove {}: {}", gif.display(), e);
    }
    Ok(())
}

async fn list_chat_ids(config: Config) -> Result<()> {
    let bot = TelegramBot::new(config.telegram_bot_token, config.telegram_chat_id);
    let chats = bot.list_chat_ids().await?;

    if chats.is_empty() {
        println!("No chats found. Message the bot first, then run this again.");
        return Ok(());
    }

    println!("Chats visible to the bot:\n");
    for chat in chats {
        println!("  {:<16} {:<10} {}", chat.id, chat.kind, chat.title);
    }
    Ok(())
}
