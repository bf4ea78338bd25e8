// src/pipeline.rs - Per-frame gesture pipeline and the paced run loop
use crate::config::Config;
use crate::dispatch::{ActionDispatcher, DispatchOutcome};
use crate::fingers::{FingerState, FingerStateExtractor};
use crate::gesture::{GestureClassifier, GestureLabel};
use crate::landmarks::LandmarkFrame;
use crate::media::MediaController;
use crate::session::SessionRecorder;
use crate::smoothing::TemporalSmoother;
use crate::source::LandmarkSource;
use crate::status::{DispatchReport, FrameRateMeter, StatusBoard};
use crate::timer::RefreshTimer;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Everything the pipeline decided for one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: u64,
    pub fingers: Option<FingerState>,
    pub raw: GestureLabel,
    pub stable: GestureLabel,
    pub outcome: Option<DispatchOutcome>,
}

/// extraction → classification → smoothing → dispatch, one frame at a time.
pub struct GesturePipeline {
    extractor: FingerStateExtractor,
    classifier: GestureClassifier,
    smoother: TemporalSmoother,
    dispatcher: ActionDispatcher,
    hand_index: usize,
    frames: u64,
}

impl Default for GesturePipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl GesturePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: FingerStateExtractor::new(config.mid_joint_tolerance_px),
            classifier: GestureClassifier::new(),
            smoother: TemporalSmoother::new(config.smoothing_window, config.switch_ratio_percent),
            dispatcher: ActionDispatcher::new(config.cooldown(), config.volume_step),
            hand_index: config.hand_index,
            frames: 0,
        }
    }

    pub fn stable(&self) -> GestureLabel {
        self.smoother.stable()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn process<C>(&mut self, frame: &LandmarkFrame, now: Instant, controller: &C) -> FrameReport
    where
        C: MediaController + ?Sized,
    {
        let fingers = self.extractor.extract(frame, self.hand_index);
        let raw = self.classifier.classify(fingers);
        let stable = self.smoother.update(raw);
        let outcome = self.dispatcher.dispatch(stable, now, controller);

        let report = FrameReport {
            frame: self.frames,
            fingers,
            raw,
            stable,
            outcome,
        };
        self.frames += 1;
        report
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub fired: u64,
    pub failed: u64,
    pub session_file: Option<PathBuf>,
}

/// Owns a source, a controller and the pipeline; publishes every frame to the
/// status board.
pub struct ControllerLoop<S, C> {
    pipeline: GesturePipeline,
    source: S,
    controller: C,
    board: Arc<StatusBoard>,
    refresh: RefreshTimer,
    fps: FrameRateMeter,
    recorder: Option<SessionRecorder>,
    summary: RunSummary,
    config: Config,
}

impl<S, C> ControllerLoop<S, C>
where
    S: LandmarkSource + 'static,
    C: MediaController + 'static,
{
    pub fn new(config: Config, source: S, controller: C, board: Arc<StatusBoard>) -> Self {
        Self {
            pipeline: GesturePipeline::new(&config),
            source,
            controller,
            board,
            refresh: RefreshTimer::immediate(config.track_refresh(), Instant::now()),
            fps: FrameRateMeter::default(),
            recorder: None,
            summary: RunSummary::default(),
            config,
        }
    }

    pub fn with_recorder(mut self, recorder: SessionRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Pull and process one frame. `Ok(None)` once the source is exhausted.
    pub fn step(&mut self, now: Instant) -> Result<Option<FrameReport>> {
        let Some(frame) = self.source.next_frame().context("Landmark source failed")? else {
            return Ok(None);
        };

        let report = self.pipeline.process(&frame, now, &self.controller);
        let fps = self.fps.tick(now);

        let dispatched_ok = report.outcome.as_ref().is_some_and(DispatchOutcome::is_success);
        match &report.outcome {
            Some(o) if o.is_success() => self.summary.fired += 1,
            Some(_) => self.summary.failed += 1,
            None => {}
        }
        self.summary.frames += 1;

        // Refresh on schedule, and right after a command changed the player.
        let track = if self.refresh.poll(now) || dispatched_ok {
            match self.controller.current_track() {
                Ok(track) => Some(track),
                Err(e) => {
                    debug!("Track refresh failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        self.board.publish(|status| {
            status.frame = report.frame;
            status.raw_gesture = report.raw;
            status.stable_gesture = report.stable;
            status.fps = fps;
            if let Some(outcome) = &report.outcome {
                status.last_dispatch = Some(DispatchReport::from(outcome.clone()));
            }
            if let Some(track) = track {
                status.track = track;
            }
        });

        if let Some(recorder) = self.recorder.as_mut() {
            let fingers = report.fingers.map(|f| f.to_string());
            let written = recorder.record(
                report.frame,
                fingers,
                report.raw,
                report.stable,
                report.outcome.as_ref(),
            );
            if let Err(e) = written {
                warn!("Session log disabled after write error: {:#}", e);
                self.recorder = None;
            }
        }

        Ok(Some(report))
    }

    /// Run until the source ends or `shutdown` flips to true. Frames are paced at
    /// `target_fps`; a slow frame delays the next one rather than queueing.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
        let mut ticker = interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Gesture loop started ({} fps, cooldown {:?})",
            self.config.target_fps,
            self.config.cooldown()
        );

        loop {
            let ticked = tokio::select! {
                _ = ticker.tick() => true,
                changed = shutdown.changed() => {
                    // Sender dropped.
                    if changed.is_err() {
                        break;
                    }
                    false
                }
            };
            if *shutdown.borrow() {
                break;
            }
            if !ticked {
                continue;
            }

            // Source reads and media calls block; keep them off the async workers.
            let (returned, step) = tokio::task::spawn_blocking(move || {
                let step = self.step(Instant::now());
                (self, step)
            })
            .await
            .context("Frame worker panicked")?;
            self = returned;

            if step?.is_none() {
                info!("Landmark source exhausted");
                break;
            }
        }

        self.finish()
    }

    fn finish(mut self) -> Result<RunSummary> {
        if let Some(recorder) = self.recorder.take() {
            let path = recorder.finish()?;
            info!("Session log written to {}", path.display());
            self.summary.session_file = Some(path);
        }
        info!(
            "Processed {} frames, {} commands sent, {} failed",
            self.summary.frames, self.summary.fired, self.summary.failed
        );
        Ok(self.summary)
    }
}
