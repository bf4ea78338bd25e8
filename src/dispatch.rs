// src/dispatch.rs - Edge-triggered, cooldown-gated command dispatch
use crate::error::MediaError;
use crate::gesture::GestureLabel;
use crate::media::MediaController;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Pause when the player reports playback, otherwise play.
    TogglePlayback,
    Play,
    Pause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
}

impl Command {
    pub fn for_gesture(label: GestureLabel) -> Option<Self> {
        match label {
            GestureLabel::PlayPause => Some(Self::TogglePlayback),
            GestureLabel::NextTrack => Some(Self::Next),
            GestureLabel::PreviousTrack => Some(Self::Previous),
            GestureLabel::VolumeUp => Some(Self::VolumeUp),
            GestureLabel::VolumeDown => Some(Self::VolumeDown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TogglePlayback => "toggle",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
        }
    }

    /// Run the command against `controller`. Volume commands move by `volume_step` percent.
    pub fn execute<C>(&self, controller: &C, volume_step: u8) -> Result<Effect, MediaError>
    where
        C: MediaController + ?Sized,
    {
        match self {
            Self::TogglePlayback => {
                let playing = match controller.playback_state() {
                    Ok(state) => state.is_playing,
                    Err(e) => {
                        warn!("Could not read playback state ({}), assuming paused", e);
                        false
                    }
                };
                if playing {
                    controller.pause().map(|_| Effect::Paused)
                } else {
                    controller.play().map(|_| Effect::Started)
                }
            }
            Self::Play => controller.play().map(|_| Effect::Started),
            Self::Pause => controller.pause().map(|_| Effect::Paused),
            Self::Next => controller.next().map(|_| Effect::Skipped),
            Self::Previous => controller.previous().map(|_| Effect::WentBack),
            Self::VolumeUp => controller.increase_volume(volume_step).map(Effect::Volume),
            Self::VolumeDown => controller.decrease_volume(volume_step).map(Effect::Volume),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" | "play_pause" => Ok(Self::TogglePlayback),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            "volume_up" => Ok(Self::VolumeUp),
            "volume_down" => Ok(Self::VolumeDown),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// What the player did in response to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Started,
    Paused,
    Skipped,
    WentBack,
    Volume(u8),
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Started playback"),
            Self::Paused => write!(f, "Paused playback"),
            Self::Skipped => write!(f, "Skipped to next track"),
            Self::WentBack => write!(f, "Went to previous track"),
            Self::Volume(v) => write!(f, "Volume set to {}%", v),
        }
    }
}

/// Result of one dispatch attempt, suitable for showing to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Fired { command: Command, effect: Effect },
    Failed { command: Command, reason: String },
}

impl DispatchOutcome {
    pub fn command(&self) -> Command {
        match self {
            Self::Fired { command, .. } | Self::Failed { command, .. } => *command,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fired { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Fired { effect, .. } => effect.to_string(),
            Self::Failed { command, reason } => format!("{} failed: {}", command, reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    Cooldown,
}

#[derive(Debug, Clone)]
pub struct DispatchState {
    pub last_stable: GestureLabel,
    pub last_action: Option<Instant>,
    pub cooldown: Duration,
}

pub struct ActionDispatcher {
    state: DispatchState,
    volume_step: u8,
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 5)
    }
}

impl ActionDispatcher {
    pub fn new(cooldown: Duration, volume_step: u8) -> Self {
        Self {
            state: DispatchState {
                last_stable: GestureLabel::NoHand,
                last_action: None,
                cooldown,
            },
            volume_step,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn phase(&self, now: Instant) -> DispatchPhase {
        match self.state.last_action {
            Some(at) if now.saturating_duration_since(at) < self.state.cooldown => {
                DispatchPhase::Cooldown
            }
            _ => DispatchPhase::Idle,
        }
    }

    /// Called once per frame with the smoothed gesture. Fires at most one
    /// command, only on the transition into an actionable gesture and only
    /// outside the cooldown window.
    pub fn dispatch<C>(
        &mut self,
        stable: GestureLabel,
        now: Instant,
        controller: &C,
    ) -> Option<DispatchOutcome>
    where
        C: MediaController + ?Sized,
    {
        let previous = std::mem::replace(&mut self.state.last_stable, stable);

        if stable == previous || self.phase(now) == DispatchPhase::Cooldown {
            return None;
        }
        let command = Command::for_gesture(stable)?;

        // Cooldown starts with the attempt; a failing backend is not hammered.
        self.state.last_action = Some(now);

        let outcome = match command.execute(controller, self.volume_step) {
            Ok(effect) => {
                info!("{} -> {}", stable, effect);
                DispatchOutcome::Fired { command, effect }
            }
            Err(e) => {
                warn!("{} -> {} failed: {}", stable, command, e);
                DispatchOutcome::Failed {
                    command,
                    reason: e.to_string(),
                }
            }
        };

        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{PlayerCall, SimulatedPlayer};
    use GestureLabel::*;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn held_gesture_fires_once() {
        let player = SimulatedPlayer::new();
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        let first = dispatcher.dispatch(NextTrack, t0, &player);
        let second = dispatcher.dispatch(NextTrack, at(t0, 0.03), &player);
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(player.calls(), vec![PlayerCall::Next]);

        // Still held long after the cooldown: no edge, no command.
        assert!(dispatcher.dispatch(NextTrack, at(t0, 5.0), &player).is_none());
        assert_eq!(player.calls().len(), 1);
    }

    #[test]
    fn returning_to_a_gesture_fires_again() {
        let player = SimulatedPlayer::new();
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        dispatcher.dispatch(PlayPause, t0, &player);
        dispatcher.dispatch(VolumeUp, at(t0, 1.5), &player);
        dispatcher.dispatch(PlayPause, at(t0, 3.0), &player);

        assert_eq!(
            player.calls(),
            vec![PlayerCall::Play, PlayerCall::SetVolume(55), PlayerCall::Pause]
        );
    }

    #[test]
    fn cooldown_blocks_new_edges() {
        let player = SimulatedPlayer::new();
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        assert!(dispatcher.dispatch(NextTrack, t0, &player).is_some());
        assert_eq!(dispatcher.phase(at(t0, 0.5)), DispatchPhase::Cooldown);
        assert!(dispatcher.dispatch(PreviousTrack, at(t0, 0.5), &player).is_none());
        // The edge was consumed during cooldown; holding it afterwards does nothing.
        assert!(dispatcher.dispatch(PreviousTrack, at(t0, 1.2), &player).is_none());
        assert_eq!(dispatcher.phase(at(t0, 1.2)), DispatchPhase::Idle);

        assert!(dispatcher.dispatch(VolumeDown, at(t0, 1.3), &player).is_some());
        assert_eq!(player.calls(), vec![PlayerCall::Next, PlayerCall::SetVolume(45)]);
    }

    #[test]
    fn non_media_labels_never_fire() {
        let player = SimulatedPlayer::new();
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        for (i, label) in [NoHand, Unknown, Fist, OpenHand, Point].into_iter().enumerate() {
            assert!(dispatcher.dispatch(label, at(t0, i as f64 * 2.0), &player).is_none());
        }
        assert!(player.calls().is_empty());
        assert!(dispatcher.state().last_action.is_none());
    }

    #[test]
    fn no_hand_in_between_is_a_new_edge() {
        let player = SimulatedPlayer::new();
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        dispatcher.dispatch(NextTrack, t0, &player);
        dispatcher.dispatch(NoHand, at(t0, 1.0), &player);
        assert!(dispatcher.dispatch(NextTrack, at(t0, 2.0), &player).is_some());
        assert_eq!(player.calls(), vec![PlayerCall::Next, PlayerCall::Next]);
    }

    #[test]
    fn toggle_pauses_when_playing() {
        let player = SimulatedPlayer::new().with_playing(true);
        let mut dispatcher = ActionDispatcher::default();

        let outcome = dispatcher.dispatch(PlayPause, Instant::now(), &player).unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Fired {
                command: Command::TogglePlayback,
                effect: Effect::Paused
            }
        );
        assert!(!player.is_playing());
    }

    #[test]
    fn failure_is_reported_and_keeps_cooldown() {
        let player = SimulatedPlayer::new();
        player.set_device_active(false);
        let mut dispatcher = ActionDispatcher::default();
        let t0 = Instant::now();

        let outcome = dispatcher.dispatch(VolumeUp, t0, &player).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.command(), Command::VolumeUp);
        assert!(outcome.message().contains("no active playback device"));
        assert_eq!(dispatcher.state().last_action, Some(t0));

        player.set_device_active(true);
        dispatcher.dispatch(Fist, at(t0, 0.2), &player);
        assert!(dispatcher.dispatch(VolumeUp, at(t0, 0.4), &player).is_none());
        assert!(dispatcher.dispatch(NextTrack, at(t0, 1.1), &player).is_some());
    }

    #[test]
    fn commands_parse_from_action_names() {
        assert_eq!("play".parse::<Command>(), Ok(Command::Play));
        assert_eq!("Volume_Up".parse::<Command>(), Ok(Command::VolumeUp));
        assert_eq!("prev".parse::<Command>(), Ok(Command::Previous));
        assert!("rewind".parse::<Command>().is_err());
    }

    #[test]
    fn effects_read_as_status_lines() {
        assert_eq!(Effect::Skipped.to_string(), "Skipped to next track");
        assert_eq!(Effect::Volume(70).to_string(), "Volume set to 70%");
    }
}
