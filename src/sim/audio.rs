/// Music controller: {not-started} → {fading-in} → {steady} → {ended}.
///
/// Activation sets volume to 0 and asks the backend to play. Success starts
/// a 200ms ramp toward the 0.6 cap; a blocked play re-attempts the whole
/// activation after 2000ms, forever. The natural end of the track is the
/// show's only terminal signal: it gates further shell waves and triggers
/// the final photo plus the replay control.

use std::time::Duration;

use crate::sim::event::SceneEvent;
use crate::sim::timer::{TimerAction, TimerQueue};

pub const VOLUME_CAP: f32 = 0.6;
pub const RAMP_STEP: f32 = 0.05;
pub const RAMP_INTERVAL: Duration = Duration::from_millis(200);
pub const RETRY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayError {
    /// No output device / sink could not be opened.
    NoDevice,
    /// The source could not be decoded.
    BadSource,
}

/// What the controller needs from an actual playback device.
/// `play()` (re)starts the track from the beginning.
pub trait MusicBackend {
    fn play(&mut self) -> Result<(), PlayError>;
    fn set_volume(&mut self, volume: f32);
    fn ended(&self) -> bool;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MusicState {
    NotStarted,
    FadingIn,
    Steady,
    Ended,
}

pub struct AudioController {
    backend: Box<dyn MusicBackend>,
    state: MusicState,
    /// Guards against duplicate external activation. Deliberately NOT
    /// consulted on the retry path, so a blocked play keeps retrying.
    started: bool,
    volume: f32,
}

impl AudioController {
    pub fn new(backend: Box<dyn MusicBackend>) -> Self {
        AudioController {
            backend,
            state: MusicState::NotStarted,
            started: false,
            volume: 0.0,
        }
    }

    /// First activation attempt. No-op if already activated.
    pub fn activate(
        &mut self,
        now: Duration,
        timers: &mut TimerQueue,
        events: &mut Vec<SceneEvent>,
    ) {
        if self.started {
            return;
        }
        self.started = true;
        self.try_play(now, timers, events);
    }

    /// Scheduled re-attempt after a blocked play.
    pub fn on_retry(
        &mut self,
        now: Duration,
        timers: &mut TimerQueue,
        events: &mut Vec<SceneEvent>,
    ) {
        if self.state != MusicState::NotStarted {
            return;
        }
        self.try_play(now, timers, events);
    }

    fn try_play(
        &mut self,
        now: Duration,
        timers: &mut TimerQueue,
        events: &mut Vec<SceneEvent>,
    ) {
        self.volume = 0.0;
        self.backend.set_volume(0.0);
        match self.backend.play() {
            Ok(()) => {
                self.state = MusicState::FadingIn;
                timers.schedule(now, RAMP_INTERVAL, TimerAction::VolumeStep);
                events.push(SceneEvent::MusicStarted);
            }
            Err(_) => {
                timers.schedule(now, RETRY_DELAY, TimerAction::MusicRetry);
                events.push(SceneEvent::MusicBlocked);
            }
        }
    }

    /// One ramp step. Re-arms itself until the cap is reached.
    pub fn on_volume_step(&mut self, now: Duration, timers: &mut TimerQueue) {
        if self.state != MusicState::FadingIn {
            return;
        }
        self.volume = (self.volume + RAMP_STEP).min(VOLUME_CAP);
        self.backend.set_volume(self.volume);
        if self.volume < VOLUME_CAP {
            timers.schedule(now, RAMP_INTERVAL, TimerAction::VolumeStep);
        } else {
            self.state = MusicState::Steady;
        }
    }

    /// Frame poll. Returns true exactly once, on the frame the track's
    /// natural end is first observed.
    pub fn poll_ended(&mut self) -> bool {
        if matches!(self.state, MusicState::FadingIn | MusicState::Steady)
            && self.backend.ended()
        {
            self.state = MusicState::Ended;
            return true;
        }
        false
    }

    pub fn ended(&self) -> bool {
        self.state == MusicState::Ended
    }

    /// Back to {not-started} for a replay. The caller re-activates.
    pub fn reset(&mut self) {
        self.state = MusicState::NotStarted;
        self.started = false;
        self.volume = 0.0;
    }

    #[cfg(test)]
    pub fn state(&self) -> MusicState {
        self.state
    }
}
