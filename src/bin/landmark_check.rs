// src/bin/landmark_check.rs
//
// Replays a landmark file and prints what each stage decided, frame by frame.
// No commands are sent.
use anyhow::{Context, Result};
use clap::Parser;
use gesture_remote::config::Config;
use gesture_remote::fingers::FingerStateExtractor;
use gesture_remote::gesture::GestureClassifier;
use gesture_remote::smoothing::TemporalSmoother;
use gesture_remote::source::{LandmarkSource, RecordedSource};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "landmark_check", about = "Print per-frame gesture decisions for a recording")]
struct Cli {
    /// Recorded landmarks, one JSON frame per line
    landmarks: PathBuf,

    /// Config file (default: platform config dir, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let path = cli.landmarks;
    let config = Config::load_or_default(cli.config.as_deref())?;

    let mut source = RecordedSource::open(&path, config.frame_width, config.frame_height)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let extractor = FingerStateExtractor::new(config.mid_joint_tolerance_px);
    let classifier = GestureClassifier::new();
    let mut smoother = TemporalSmoother::new(config.smoothing_window, config.switch_ratio_percent);

    println!("=== Landmark Check: {} ===", path.display());
    println!("{:>6}  {:>5}  {:<8}  {:<16}  {:<16}", "frame", "hands", "fingers", "raw", "stable");

    let mut frame_no = 0u64;
    let mut transitions = 0u64;
    while let Some(frame) = source.next_frame()? {
        let fingers = extractor.extract(&frame, config.hand_index);
        let raw = classifier.classify(fingers);
        let before = smoother.stable();
        let stable = smoother.update(raw);
        if stable != before {
            transitions += 1;
        }

        println!(
            "{:>6}  {:>5}  {:<8}  {:<16}  {:<16}",
            frame_no,
            frame.hands.len(),
            fingers.map(|f| f.to_string()).unwrap_or_else(|| "-".into()),
            raw.as_str(),
            stable.as_str()
        );
        frame_no += 1;
    }

    println!("============================");
    println!("{} frames, {} stable gesture changes", frame_no, transitions);
    Ok(())
}
