use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::Window;
use crate::sources::{RecordedMetric, SessionRecording};

use super::clock::{Clock, SystemClock};

/// Analysis window sliced out of the recording per poll
pub const DEFAULT_WINDOW_SECONDS: f64 = 2.0;

/// Playback speed multiplier bounds
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 5.0;

/// Remaining playtime under which the playlist should move on
const AUTO_ADVANCE_MARGIN_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn name(&self) -> &str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

/// One poll result: the signal window plus everything the consumer needs to
/// render it in context
#[derive(Debug, Clone)]
pub struct PlaybackFrame {
    pub window: Window,
    /// Seconds from session start
    pub position: f64,
    /// Fraction of the session elapsed, in [0, 1]
    pub progress: f64,
    pub paused: bool,
    /// Metrics captured at this position during the original recording
    pub recorded: Option<RecordedMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub session_name: String,
    pub is_playing: bool,
    pub is_paused: bool,
    pub position: f64,
    pub duration: f64,
    pub progress_percent: f64,
    pub speed: f64,
}

/// Wall-clock-paced playback over one loaded recording.
///
/// Position advances by `elapsed_wall_time x speed` measured against an
/// anchor timestamp, never by per-poll increments, so any number of
/// concurrent observers polling the same player see one shared timeline
/// instead of each accelerating it.
pub struct SessionPlayer {
    recording: SessionRecording,
    clock: Arc<dyn Clock>,
    state: PlaybackState,
    position: f64,
    speed: f64,
    window_duration: f64,
    /// Clock reading at the last advance; cleared while not playing
    anchor: Option<f64>,
}

impl SessionPlayer {
    pub fn new(recording: SessionRecording) -> Self {
        Self::with_clock(recording, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(recording: SessionRecording, clock: Arc<dyn Clock>) -> Self {
        info!(
            session = %recording.name,
            duration = recording.total_duration(),
            "player ready"
        );
        Self {
            recording,
            clock,
            state: PlaybackState::Stopped,
            position: 0.0,
            speed: 1.0,
            window_duration: DEFAULT_WINDOW_SECONDS,
            anchor: None,
        }
    }

    pub fn with_window_duration(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.window_duration = seconds;
        }
        self
    }

    pub fn recording(&self) -> &SessionRecording {
        &self.recording
    }

    /// Swap in a new recording, rewinding to a stopped state
    pub fn load(&mut self, recording: SessionRecording) {
        info!(session = %recording.name, "session loaded");
        self.recording = recording;
        self.position = 0.0;
        self.anchor = None;
        self.state = PlaybackState::Stopped;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn total_duration(&self) -> f64 {
        self.recording.total_duration()
    }

    pub fn play(&mut self) {
        self.anchor = Some(self.clock.now());
        self.state = PlaybackState::Playing;
        debug!(position = self.position, "playback started");
    }

    /// Freeze the position. Elapsed time since the last poll is folded in
    /// first so pausing never discards playtime.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.advance_position();
        }
        self.anchor = None;
        self.state = PlaybackState::Paused;
        debug!(position = self.position, "playback paused");
    }

    pub fn restart(&mut self) {
        self.position = 0.0;
        if self.state == PlaybackState::Playing {
            self.anchor = Some(self.clock.now());
        }
        debug!("playback restarted");
    }

    /// Jump to `position` seconds. Out-of-range or non-finite targets are
    /// rejected without touching any state; returns whether the seek landed.
    pub fn seek(&mut self, position: f64) -> bool {
        if !position.is_finite() {
            return false;
        }
        if position < 0.0 || position > self.recording.total_duration() {
            return false;
        }
        if self.state == PlaybackState::Playing {
            self.anchor = Some(self.clock.now());
        }
        self.position = position;
        debug!(position, "seek");
        true
    }

    /// Clamp and apply a speed multiplier, returning the value in effect.
    /// Time already elapsed is folded in at the old speed first.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        if speed.is_finite() {
            if self.state == PlaybackState::Playing {
                self.advance_position();
            }
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
        self.speed
    }

    /// Current window of signal.
    ///
    /// Playing advances the position by wall-clock elapsed time and wraps to
    /// the start when the remaining signal is shorter than one window.
    /// Paused or stopped returns the frozen position without advancing.
    /// `None` means the recording cannot supply a full window here.
    pub fn next_window(&mut self) -> Option<PlaybackFrame> {
        if self.state == PlaybackState::Playing {
            self.advance_position();
        }
        let window = self
            .recording
            .slice_window(self.position, self.window_duration)?;
        let recorded = self.recording.nearest_metric(self.position).cloned();
        let total = self.recording.total_duration();
        let progress = if total > 0.0 {
            (self.position / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(PlaybackFrame {
            window,
            position: self.position,
            progress,
            paused: self.state != PlaybackState::Playing,
            recorded,
        })
    }

    /// True once less than one second of session remains at the live
    /// position; the playlist owner decides what to do about it.
    pub fn should_auto_advance(&self) -> bool {
        let total = self.recording.total_duration();
        total > 0.0 && self.effective_position() >= total - AUTO_ADVANCE_MARGIN_SECS
    }

    pub fn get_status(&self) -> PlaybackStatus {
        let total = self.recording.total_duration();
        let position = self.effective_position().min(total);
        let progress_percent = if total > 0.0 {
            (position / total * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        PlaybackStatus {
            session_name: self.recording.name.clone(),
            is_playing: self.state == PlaybackState::Playing,
            is_paused: self.state == PlaybackState::Paused,
            position,
            duration: total,
            progress_percent,
            speed: self.speed,
        }
    }

    /// Position as of right now, without committing the advance
    fn effective_position(&self) -> f64 {
        match (self.state, self.anchor) {
            (PlaybackState::Playing, Some(anchor)) => {
                self.position + (self.clock.now() - anchor).max(0.0) * self.speed
            }
            _ => self.position,
        }
    }

    /// Fold wall-clock time since the anchor into the position, re-anchor,
    /// and wrap to the start at end-of-recording
    fn advance_position(&mut self) {
        let now = self.clock.now();
        if let Some(anchor) = self.anchor {
            self.position += (now - anchor).max(0.0) * self.speed;
        }
        self.anchor = Some(now);

        let total = self.recording.total_duration();
        if self.position >= total - self.window_duration {
            debug!(position = self.position, "looping to start");
            self.position = 0.0;
        }
    }
}
