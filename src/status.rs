// src/status.rs - Shared status for presentation layers
//
// The pipeline is the only writer. Readers hold a `StatusReader` and see the
// latest published snapshot; they never block the producer.
use crate::dispatch::DispatchOutcome;
use crate::gesture::GestureLabel;
use crate::media::TrackInfo;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::watch;

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub at: DateTime<Local>,
    pub success: bool,
    pub message: String,
    pub outcome: DispatchOutcome,
}

impl From<DispatchOutcome> for DispatchReport {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            at: Local::now(),
            success: outcome.is_success(),
            message: outcome.message(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub frame: u64,
    pub raw_gesture: GestureLabel,
    pub stable_gesture: GestureLabel,
    pub last_dispatch: Option<DispatchReport>,
    pub track: Option<TrackInfo>,
    pub fps: f32,
}

pub struct StatusBoard {
    tx: watch::Sender<StatusSnapshot>,
}

pub type StatusReader = watch::Receiver<StatusSnapshot>;

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> StatusReader {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    /// Apply `update` to the current snapshot and notify readers.
    pub fn publish(&self, update: impl FnOnce(&mut StatusSnapshot)) {
        // send_modify works with zero subscribers, unlike send.
        self.tx.send_modify(update);
    }
}

/// Rolling frame rate over the last `window` frame intervals.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    frame_times: VecDeque<f32>,
    window: usize,
    last: Option<Instant>,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(30)
    }
}

impl FrameRateMeter {
    pub fn new(window: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(window),
            window: window.max(1),
            last: None,
        }
    }

    pub fn tick(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last.replace(now) {
            self.frame_times
                .push_front(now.saturating_duration_since(last).as_secs_f32());
            if self.frame_times.len() > self.window {
                self.frame_times.pop_back();
            }
        }
        self.fps()
    }

    pub fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Command, Effect};
    use std::time::Duration;

    #[test]
    fn readers_see_latest_snapshot() {
        let board = StatusBoard::new();
        let reader = board.subscribe();

        board.publish(|s| {
            s.frame = 1;
            s.stable_gesture = GestureLabel::Fist;
        });
        board.publish(|s| s.frame = 2);

        let seen = reader.borrow().clone();
        assert_eq!(seen.frame, 2);
        assert_eq!(seen.stable_gesture, GestureLabel::Fist);
    }

    #[test]
    fn publish_without_readers_still_updates() {
        let board = StatusBoard::new();
        board.publish(|s| s.raw_gesture = GestureLabel::Point);
        assert_eq!(board.snapshot().raw_gesture, GestureLabel::Point);
    }

    #[tokio::test]
    async fn readers_are_notified() {
        let board = StatusBoard::new();
        let mut reader = board.subscribe();
        board.publish(|s| s.stable_gesture = GestureLabel::VolumeUp);
        reader.changed().await.unwrap();
        assert_eq!(reader.borrow_and_update().stable_gesture, GestureLabel::VolumeUp);
    }

    #[test]
    fn dispatch_report_carries_reason() {
        let report = DispatchReport::from(DispatchOutcome::Failed {
            command: Command::Next,
            reason: "no active playback device".into(),
        });
        assert!(!report.success);
        assert_eq!(report.message, "next failed: no active playback device");

        let report = DispatchReport::from(DispatchOutcome::Fired {
            command: Command::Next,
            effect: Effect::Skipped,
        });
        assert!(report.success);
    }

    #[test]
    fn frame_rate_averages_intervals() {
        let mut meter = FrameRateMeter::new(3);
        let t0 = Instant::now();
        assert_eq!(meter.tick(t0), 0.0);
        for i in 1..=5 {
            meter.tick(t0 + Duration::from_millis(20 * i));
        }
        assert!((meter.fps() - 50.0).abs() < 0.5);
    }
}
