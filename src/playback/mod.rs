//! Temporal playback over recorded sessions.
//!
//! A [`SessionPlayer`] paces one recording against the wall clock with
//! pause, seek, and speed control; a [`Playlist`] sequences recordings and
//! tells the orchestrator when to move on. Pacing reads time through the
//! [`Clock`] trait so tests can step a mock clock instead of sleeping.

pub mod clock;
pub mod player;
pub mod playlist;

pub use clock::{Clock, MockClock, SystemClock};
pub use player::{
    PlaybackFrame, PlaybackState, PlaybackStatus, SessionPlayer, DEFAULT_WINDOW_SECONDS,
};
pub use playlist::{Playlist, PlaylistEntry, PlaylistInfo, SourceType};
