// SPDX-License-Identifier: MPL-2.0
//! Lifecycle events reported to the playback consumer.

/// Events fired by the player, named after their HTML5 media counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    /// Dimensions, duration and framerate are known.
    LoadedMetadata,
    /// Playback started.
    Playing,
    /// Playback was paused.
    Paused,
    /// Playback resumed after a pause.
    Play,
    /// Last frame shown, no loops left.
    Ended,
    /// Playback failed. Fired at most once.
    Error,
    /// Playback was stopped by the owner (not part of HTML5).
    Stop,
    /// Video restarted from the first frame for another loop.
    Rewind,
}

impl PlayerEvent {
    /// Returns the event name delivered to hosts.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadedMetadata => "loadedmetadata",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Play => "play",
            Self::Ended => "ended",
            Self::Error => "error",
            Self::Stop => "stop",
            Self::Rewind => "rewind",
        }
    }

    /// Returns true for events that end a playback attempt.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Error | Self::Stop)
    }
}

impl std::fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
