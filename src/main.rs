// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use gesture_remote::config::Config;
use gesture_remote::dispatch::Command;
use gesture_remote::gesture::GestureLabel;
use gesture_remote::media::{SimulatedPlayer, TimeoutController};
use gesture_remote::pipeline::ControllerLoop;
use gesture_remote::session::SessionRecorder;
use gesture_remote::source::{LandmarkSource, RecordedSource, ScriptedSource};
use gesture_remote::status::{StatusBoard, StatusReader};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gesture_remote", about = "Control a media player with hand gestures")]
struct Cli {
    /// Config file (default: platform config dir, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay recorded landmarks (JSON lines) instead of the scripted demo
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write a per-frame CSV session log
    #[arg(long)]
    record: bool,

    /// Send one command and exit: play, pause, toggle, next, previous, volume_up, volume_down
    #[arg(long)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if args.record {
        config.record_session = true;
    }

    let player = SimulatedPlayer::new();

    // Manual control: run one command and exit.
    if let Some(command) = args.command {
        let controller = TimeoutController::new(player, config.command_timeout());
        let effect = command.execute(&controller, config.volume_step)?;
        println!("{}", effect);
        return Ok(());
    }

    let controller = TimeoutController::new(player, config.command_timeout());
    let source: Box<dyn LandmarkSource> = match &args.replay {
        Some(path) => {
            info!("Replaying landmarks from {}", path.display());
            Box::new(
                RecordedSource::open(path, config.frame_width, config.frame_height)
                    .with_context(|| format!("Failed to open {}", path.display()))?,
            )
        }
        None => {
            info!("No landmark file given, running the scripted demo (Ctrl-C to stop)");
            Box::new(ScriptedSource::demo())
        }
    };

    let board = Arc::new(StatusBoard::new());
    let presenter = tokio::spawn(log_status(board.subscribe()));

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stopping");
            let _ = stop_tx.send(true);
        }
    });

    let mut controller_loop =
        ControllerLoop::new(config.clone(), source, controller, Arc::clone(&board));
    if config.record_session {
        let recorder = SessionRecorder::create(&config.session_dir, None)?;
        controller_loop = controller_loop.with_recorder(recorder);
    }

    let summary = controller_loop.run(stop_rx).await?;
    drop(board);
    presenter.await.ok();

    if let Some(path) = summary.session_file {
        println!("Session saved to {}", path.display());
    }
    Ok(())
}

/// Log what a status display would show: stable gesture changes, dispatch
/// results and the current track.
async fn log_status(mut reader: StatusReader) {
    let mut shown_gesture = GestureLabel::NoHand;
    let mut shown_dispatch = None;
    let mut shown_track = None;

    while reader.changed().await.is_ok() {
        let status = reader.borrow_and_update().clone();

        if status.stable_gesture != shown_gesture {
            info!("Gesture: {}", status.stable_gesture);
            shown_gesture = status.stable_gesture;
        }

        if let Some(report) = &status.last_dispatch {
            if shown_dispatch != Some(report.at) {
                if report.success {
                    info!("{}", report.message);
                } else {
                    warn!("{}", report.message);
                }
                shown_dispatch = Some(report.at);
            }
        }

        if let Some(track) = &status.track {
            if shown_track.as_ref() != Some(&track.name) {
                info!("Now playing: {} - {}", track.name, track.artist);
                shown_track = Some(track.name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_manual_command() {
        let cli = Cli::try_parse_from([
            "gesture_remote",
            "--replay",
            "hands.jsonl",
            "--record",
            "--command",
            "volume_up",
        ])
        .unwrap();
        assert_eq!(cli.replay, Some(PathBuf::from("hands.jsonl")));
        assert!(cli.record);
        assert_eq!(cli.command, Some(Command::VolumeUp));
        assert!(cli.config.is_none());
    }

    #[test]
    fn rejects_unknown_command_and_flags() {
        assert!(Cli::try_parse_from(["gesture_remote", "--command", "rewind"]).is_err());
        assert!(Cli::try_parse_from(["gesture_remote", "--bogus"]).is_err());
    }
}
