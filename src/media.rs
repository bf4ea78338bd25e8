// src/media.rs - Media-control collaborator boundary
use crate::error::MediaError;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;
use tracing::warn;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub volume_percent: u8,
    pub has_active_device: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub cover_url: Option<String>,
    pub is_playing: bool,
}

/// External player the dispatcher drives. Implementations talk to the real
/// backend; calls may block and may fail.
pub trait MediaController: Send + Sync {
    fn play(&self) -> MediaResult<()>;
    fn pause(&self) -> MediaResult<()>;
    fn next(&self) -> MediaResult<()>;
    fn previous(&self) -> MediaResult<()>;
    fn playback_state(&self) -> MediaResult<PlaybackState>;
    fn set_volume(&self, percent: u8) -> MediaResult<()>;
    fn current_track(&self) -> MediaResult<Option<TrackInfo>>;

    /// Read the current volume and set `current + step`, clamped to 100.
    fn increase_volume(&self, step: u8) -> MediaResult<u8> {
        adjust_volume(self, i16::from(step))
    }

    /// Read the current volume and set `current - step`, clamped to 0.
    fn decrease_volume(&self, step: u8) -> MediaResult<u8> {
        adjust_volume(self, -i16::from(step))
    }
}

fn adjust_volume<C: MediaController + ?Sized>(controller: &C, delta: i16) -> MediaResult<u8> {
    let state = controller.playback_state()?;
    if !state.has_active_device {
        return Err(MediaError::NoActiveDevice);
    }

    let target = clamp_volume(state.volume_percent, delta);
    controller.set_volume(target)?;
    Ok(target)
}

pub fn clamp_volume(current: u8, delta: i16) -> u8 {
    (i16::from(current) + delta).clamp(0, 100) as u8
}

impl<C: MediaController + ?Sized> MediaController for Arc<C> {
    fn play(&self) -> MediaResult<()> {
        (**self).play()
    }
    fn pause(&self) -> MediaResult<()> {
        (**self).pause()
    }
    fn next(&self) -> MediaResult<()> {
        (**self).next()
    }
    fn previous(&self) -> MediaResult<()> {
        (**self).previous()
    }
    fn playback_state(&self) -> MediaResult<PlaybackState> {
        (**self).playback_state()
    }
    fn set_volume(&self, percent: u8) -> MediaResult<()> {
        (**self).set_volume(percent)
    }
    fn current_track(&self) -> MediaResult<Option<TrackInfo>> {
        (**self).current_track()
    }
    fn increase_volume(&self, step: u8) -> MediaResult<u8> {
        (**self).increase_volume(step)
    }
    fn decrease_volume(&self, step: u8) -> MediaResult<u8> {
        (**self).decrease_volume(step)
    }
}

// ── Simulated player ───────────────────────────────────────

/// Calls observed by [`SimulatedPlayer`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCall {
    Play,
    Pause,
    Next,
    Previous,
    SetVolume(u8),
}

#[derive(Debug)]
struct PlayerState {
    playing: bool,
    volume: u8,
    has_device: bool,
    tracks: Vec<TrackInfo>,
    cursor: usize,
    failure: Option<MediaError>,
    delay: Duration,
    calls: Vec<PlayerCall>,
}

/// In-memory player used for headless runs and tests.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        let tracks = [
            ("Clair de Lune", "Claude Debussy", "Suite bergamasque"),
            ("Gymnopedie No. 1", "Erik Satie", "Trois Gymnopedies"),
            ("Spiegel im Spiegel", "Arvo Part", "Alina"),
        ]
        .iter()
        .map(|(name, artist, album)| TrackInfo {
            name: name.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            cover_url: None,
            is_playing: false,
        })
        .collect();

        Self {
            state: Arc::new(Mutex::new(PlayerState {
                playing: false,
                volume: 50,
                has_device: true,
                tracks,
                cursor: 0,
                failure: None,
                delay: Duration::ZERO,
                calls: Vec::new(),
            })),
        }
    }

    pub fn with_volume(self, volume: u8) -> Self {
        self.lock().volume = volume.min(100);
        self
    }

    pub fn with_playing(self, playing: bool) -> Self {
        self.lock().playing = playing;
        self
    }

    pub fn set_device_active(&self, active: bool) {
        self.lock().has_device = active;
    }

    /// Every subsequent command fails with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<MediaError>) {
        self.lock().failure = error;
    }

    /// Artificial latency applied to every call.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.lock().calls.clone()
    }

    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn command(&self, call: PlayerCall) -> MediaResult<()> {
        let delay = self.lock().delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        if !state.has_device {
            return Err(MediaError::NoActiveDevice);
        }

        match call {
            PlayerCall::Play => state.playing = true,
            PlayerCall::Pause => state.playing = false,
            PlayerCall::Next => state.cursor = (state.cursor + 1) % state.tracks.len().max(1),
            PlayerCall::Previous => {
                let len = state.tracks.len().max(1);
                state.cursor = (state.cursor + len - 1) % len;
            }
            PlayerCall::SetVolume(v) => state.volume = v.min(100),
        }
        state.calls.push(call);
        Ok(())
    }
}

impl MediaController for SimulatedPlayer {
    fn play(&self) -> MediaResult<()> {
        self.command(PlayerCall::Play)
    }

    fn pause(&self) -> MediaResult<()> {
        self.command(PlayerCall::Pause)
    }

    fn next(&self) -> MediaResult<()> {
        self.command(PlayerCall::Next)
    }

    fn previous(&self) -> MediaResult<()> {
        self.command(PlayerCall::Previous)
    }

    fn playback_state(&self) -> MediaResult<PlaybackState> {
        let state = self.lock();
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        Ok(PlaybackState {
            is_playing: state.playing,
            volume_percent: state.volume,
            has_active_device: state.has_device,
        })
    }

    fn set_volume(&self, percent: u8) -> MediaResult<()> {
        self.command(PlayerCall::SetVolume(percent))
    }

    fn current_track(&self) -> MediaResult<Option<TrackInfo>> {
        let state = self.lock();
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        if !state.has_device {
            return Ok(None);
        }
        Ok(state.tracks.get(state.cursor).map(|track| TrackInfo {
            is_playing: state.playing,
            ..track.clone()
        }))
    }
}

// ── Timeout wrapper ────────────────────────────────────────

/// Runs each call on a helper thread and gives up after `timeout`.
///
/// A call that times out keeps running in the background; until it finishes,
/// further calls fail immediately with [`MediaError::Busy`]. Nothing is retried.
pub struct TimeoutController<C> {
    inner: Arc<C>,
    timeout: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl<C: MediaController + 'static> TimeoutController<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    fn call<T, F>(&self, f: F) -> MediaResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&C) -> MediaResult<T> + Send + 'static,
    {
        let gate = Arc::clone(&self.in_flight);
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::sync_channel(1);

        // Probe the gate before spawning so a stuck backend does not pile up threads.
        if enter(&gate).is_none() {
            return Err(MediaError::Busy);
        }

        thread::spawn(move || {
            let Some(_held) = enter(&gate) else {
                let _ = tx.send(Err(MediaError::Busy));
                return;
            };
            let _ = tx.send(f(&inner));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!("Media command exceeded {:?}", self.timeout);
                Err(MediaError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(MediaError::Backend("media worker exited without a result".into()))
            }
        }
    }
}

/// Take the in-flight gate unless another call holds it. A call that panicked
/// poisons the gate but no longer holds it.
fn enter(gate: &Mutex<()>) -> Option<MutexGuard<'_, ()>> {
    match gate.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

impl<C: MediaController + 'static> MediaController for TimeoutController<C> {
    fn play(&self) -> MediaResult<()> {
        self.call(|c| c.play())
    }

    fn pause(&self) -> MediaResult<()> {
        self.call(|c| c.pause())
    }

    fn next(&self) -> MediaResult<()> {
        self.call(|c| c.next())
    }

    fn previous(&self) -> MediaResult<()> {
        self.call(|c| c.previous())
    }

    fn playback_state(&self) -> MediaResult<PlaybackState> {
        self.call(|c| c.playback_state())
    }

    fn set_volume(&self, percent: u8) -> MediaResult<()> {
        self.call(move |c| c.set_volume(percent))
    }

    fn current_track(&self) -> MediaResult<Option<TrackInfo>> {
        self.call(|c| c.current_track())
    }

    // Read-modify-write runs as one bounded call.
    fn increase_volume(&self, step: u8) -> MediaResult<u8> {
        self.call(move |c| c.increase_volume(step))
    }

    fn decrease_volume(&self, step: u8) -> MediaResult<u8> {
        self.call(move |c| c.decrease_volume(step))
    }
}
