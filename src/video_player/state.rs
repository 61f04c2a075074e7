// SPDX-License-Identifier: MPL-2.0
//! Lifecycle bookkeeping for one playback attempt.
//!
//! [`PlayerStatus`] decides which notifications a transition produces. It
//! never calls the consumer itself: the controller applies a transition
//! under its status lock, releases the lock, then delivers the returned
//! [`Notifications`]. That keeps consumer callbacks free to query the
//! controller.
//!
//! Delivery rules:
//! - init-done is reported exactly once, success or failure
//! - `error` fires at most once
//! - `stop` only fires from playing or paused
//! - nothing fires after the player is destroyed

use crate::domain::video::{PlaybackState, PlayerEvent};
use crate::error::VideoError;

/// Notifications produced by one transition, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    /// Whether `video_player_init_done` must be called before the events.
    pub init_done: bool,
    pub events: Vec<PlayerEvent>,
}

impl Notifications {
    fn none() -> Self {
        Self::default()
    }

    fn event(event: PlayerEvent) -> Self {
        Self {
            init_done: false,
            events: vec![event],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.init_done && self.events.is_empty()
    }
}

/// Playback state plus the flags that gate event delivery.
#[derive(Debug, Clone, Default)]
pub struct PlayerStatus {
    state: PlaybackState,
    init_done: bool,
    ready: bool,
    destroyed: bool,
    last_error: Option<VideoError>,
}

impl PlayerStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True once the first frame is published and playback started.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn is_init_done(&self) -> bool {
        self.init_done
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&VideoError> {
        self.last_error.as_ref()
    }

    /// Loading finished with the first frame published.
    pub fn loaded(&mut self) -> Notifications {
        if self.destroyed || self.init_done {
            return Notifications::none();
        }
        self.init_done = true;
        self.ready = true;
        self.state = PlaybackState::Playing;
        Notifications {
            init_done: true,
            events: vec![PlayerEvent::LoadedMetadata, PlayerEvent::Playing],
        }
    }

    /// Loading failed before any frame was published.
    pub fn load_failed(&mut self, error: VideoError) -> Notifications {
        if self.destroyed || self.init_done {
            return Notifications::none();
        }
        self.init_done = true;
        self.record_error(error);
        self.state = PlaybackState::Failed;
        Notifications {
            init_done: true,
            events: vec![PlayerEvent::Error],
        }
    }

    /// The last frame was shown and no loops remain.
    pub fn ended(&mut self) -> Notifications {
        if self.destroyed || !self.state.is_active() {
            return Notifications::none();
        }
        self.state = PlaybackState::Ended;
        Notifications::event(PlayerEvent::Ended)
    }

    /// Decoding failed during playback.
    pub fn failed(&mut self, error: VideoError) -> Notifications {
        if !self.init_done {
            return self.load_failed(error);
        }
        if self.destroyed || !self.state.is_active() {
            return Notifications::none();
        }
        self.record_error(error);
        self.state = PlaybackState::Failed;
        Notifications::event(PlayerEvent::Error)
    }

    /// The decode thread exited on a stop request.
    pub fn stopped(&mut self) -> Notifications {
        if self.destroyed || !self.state.is_active() {
            return Notifications::none();
        }
        self.state = PlaybackState::Stopped;
        Notifications::event(PlayerEvent::Stop)
    }

    pub fn paused(&mut self) -> Notifications {
        if self.destroyed || !self.state.is_playing() {
            return Notifications::none();
        }
        self.state = PlaybackState::Paused;
        Notifications::event(PlayerEvent::Paused)
    }

    pub fn resumed(&mut self) -> Notifications {
        if self.destroyed || !self.state.is_paused() {
            return Notifications::none();
        }
        self.state = PlaybackState::Playing;
        Notifications::event(PlayerEvent::Play)
    }

    /// Playback restarted from the first frame for another loop.
    pub fn rewound(&mut self) -> Notifications {
        if self.destroyed || !self.state.is_active() {
            return Notifications::none();
        }
        Notifications::event(PlayerEvent::Rewind)
    }

    /// Suppresses every later notification.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn record_error(&mut self, error: VideoError) {
        if self.last_error.is_none() {
            self.last_error = Some(error);
        }
    }
}
