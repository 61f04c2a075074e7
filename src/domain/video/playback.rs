// SPDX-License-Identifier: MPL-2.0
//! Video playback state machine.
//!
//! ```text
//! Loading ──▶ Playing ◀──▶ Paused
//!    │           │            │
//!    ▼           ▼            ▼
//!  Failed    Stopped | Ended | Failed
//! ```
//!
//! `Stopped` is only reachable from `Playing` or `Paused`.

/// Represents the current playback state of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Source is being opened and the first frame decoded.
    #[default]
    Loading,
    /// Frames are being decoded and published.
    Playing,
    /// Decode thread is parked on the pause gate.
    Paused,
    /// Playback was stopped by the owner.
    Stopped,
    /// Last frame was shown and no loops remain.
    Ended,
    /// Open, decode or rewind failed.
    Failed,
}

impl PlaybackState {
    /// Returns the state name reported to hosts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Ended => "ended",
            Self::Failed => "error",
        }
    }

    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the video is playing or paused.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Ended | Self::Failed)
    }

    /// Checks whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::{Ended, Failed, Loading, Paused, Playing, Stopped};

        match (self, next) {
            (Loading, Playing | Failed) => true,
            (Playing, Paused) | (Paused, Playing) => true,
            (Playing | Paused, Stopped | Ended | Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
