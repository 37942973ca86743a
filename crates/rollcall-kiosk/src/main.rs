//! `kiosk` — attendance kiosk client for a rollcall server.
//!
//! # Usage
//!
//! ```
//! kiosk --url http://localhost:3000 run --frames feed.jsonl --descriptors faces.json
//! kiosk --config ~/.config/rollcall/kiosk.toml current
//! ```
//!
//! While `run` is active, type `m` + Enter to toggle check-in/check-out
//! mode and `q` + Enter (or Ctrl-C) to power off.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rollcall_core::attendance::Direction;
use rollcall_kiosk::{
  client::{ApiClient, ApiConfig},
  matcher::{DEFAULT_THRESHOLD, FaceMatcher},
  notify::ConsoleNotifier,
  replay::{ReplayCamera, load_descriptors},
  session::{Control, KioskSession, SessionSettings, Stopped},
};
use serde::Deserialize;
use tokio::{
  io::{AsyncBufReadExt, BufReader},
  sync::mpsc,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kiosk", about = "Camera attendance kiosk for a rollcall server")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the rollcall server (default: http://localhost:3000).
  #[arg(long, env = "ROLLCALL_URL", global = true)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Power on and record attendance until powered off or the feed ends.
  Run {
    /// JSON-lines frames file to use as the camera feed.
    #[arg(long, value_name = "FILE")]
    frames: Option<PathBuf>,

    /// JSON file of reference descriptors per label.
    #[arg(long, value_name = "FILE")]
    descriptors: Option<PathBuf>,

    /// Initial mode: `in` or `out`.
    #[arg(long)]
    mode: Option<String>,

    /// Milliseconds between captures.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Seconds a label stays quiet after the server has answered.
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Match distance cutoff.
    #[arg(long)]
    threshold: Option<f32>,
  },
  /// List enrolled subjects with their photo URLs.
  Roster,
  /// Show who is on shift.
  Current,
  /// Show recent log entries.
  Logs,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:             Option<String>,
  #[serde(default)]
  tick_ms:         Option<u64>,
  #[serde(default)]
  cooldown_secs:   Option<u64>,
  #[serde(default)]
  match_threshold: Option<f32>,
  #[serde(default)]
  mode:            Option<String>,
  #[serde(default)]
  frames:          Option<PathBuf>,
  #[serde(default)]
  descriptors:     Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or(file_cfg.url.clone())
    .unwrap_or_else(|| "http://localhost:3000".to_string());
  let client = ApiClient::new(ApiConfig::new(base_url))?;

  match args.command {
    Command::Run { frames, descriptors, mode, tick_ms, cooldown_secs, threshold } => {
      let frames = frames
        .or(file_cfg.frames)
        .ok_or_else(|| anyhow!("no frames file given (--frames or `frames` in config)"))?;
      let descriptors = descriptors
        .or(file_cfg.descriptors)
        .ok_or_else(|| anyhow!("no descriptors file given (--descriptors or `descriptors` in config)"))?;

      let defaults = SessionSettings::default();
      let settings = SessionSettings {
        tick:     tick_ms
          .or(file_cfg.tick_ms)
          .map_or(defaults.tick, Duration::from_millis),
        cooldown: cooldown_secs
          .or(file_cfg.cooldown_secs)
          .map_or(defaults.cooldown, Duration::from_secs),
        mode:     match mode.or(file_cfg.mode) {
          Some(m) => parse_mode(&m)?,
          None => defaults.mode,
        },
      };
      settings.validate().context("invalid tick_ms")?;
      let threshold = threshold.or(file_cfg.match_threshold).unwrap_or(DEFAULT_THRESHOLD);

      run(client, frames, descriptors, settings, threshold).await
    }
    Command::Roster => {
      for user in client.list_users().await? {
        println!(
          "{:>4}  {:<20} {:<16} {}",
          user.id,
          user.username,
          user.department.as_deref().unwrap_or("-"),
          client.photo_url(&user.username)?
        );
      }
      Ok(())
    }
    Command::Current => {
      for row in client.current().await? {
        println!(
          "{:<20} {:<16} since {}",
          row.username,
          row.department.as_deref().unwrap_or("-"),
          row.check_in_time.format("%Y-%m-%d %H:%M:%S")
        );
      }
      Ok(())
    }
    Command::Logs => {
      for log in client.logs().await? {
        let out = log
          .check_out_time
          .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
          .unwrap_or_else(|| "-".to_string());
        println!(
          "{:>5}  {:<20} {} → {:<19} {}",
          log.id,
          log.username,
          log.check_in_time.format("%Y-%m-%d %H:%M:%S"),
          out,
          log.status
        );
      }
      Ok(())
    }
  }
}

fn parse_mode(mode: &str) -> Result<Direction> {
  match mode.trim().to_ascii_lowercase().as_str() {
    "in" => Ok(Direction::In),
    "out" => Ok(Direction::Out),
    other => bail!("unknown mode {other:?} (expected \"in\" or \"out\")"),
  }
}

// ─── Kiosk loop ───────────────────────────────────────────────────────────────

async fn run(
  client: ApiClient,
  frames: PathBuf,
  descriptors: PathBuf,
  settings: SessionSettings,
  threshold: f32,
) -> Result<()> {
  let roster = client.list_users().await.context("loading roster")?;
  let descriptors = load_descriptors(&descriptors)
    .await
    .with_context(|| format!("loading descriptors from {}", descriptors.display()))?;
  let matcher = FaceMatcher::from_roster(&roster, &descriptors, threshold);
  tracing::info!(
    roster = roster.len(),
    recognisable = matcher.recognisable(),
    "roster loaded"
  );

  let mut session = KioskSession::new(
    ReplayCamera::new(frames),
    client,
    ConsoleNotifier,
    matcher,
    settings,
  );

  let (controls_tx, controls) = mpsc::channel(4);
  spawn_controls(controls_tx);

  match session.run(controls).await? {
    Stopped::PoweredOff => tracing::info!(session = %session.id(), "powered off"),
    Stopped::FeedEnded => tracing::info!(session = %session.id(), "feed ended"),
  }
  Ok(())
}

/// Forward Ctrl-C and stdin commands to the session.
fn spawn_controls(controls: mpsc::Sender<Control>) {
  let on_signal = controls.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_signal.send(Control::PowerOff).await.ok();
    }
  });

  tokio::spawn(async move {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
      let control = match line.trim() {
        "m" | "mode" => Control::ToggleMode,
        "q" | "quit" => Control::PowerOff,
        "" => continue,
        other => {
          println!("unknown command {other:?}: `m` toggles mode, `q` powers off");
          continue;
        }
      };
      if controls.send(control).await.is_err() {
        break;
      }
    }
  });
}
