// SPDX-License-Identifier: MPL-2.0
//! Video playback newtypes.
//!
//! This module provides type-safe wrappers for playback values,
//! ensuring they are always within valid ranges.

// =============================================================================
// LoopCount
// =============================================================================

/// Remaining number of replays after the current pass.
///
/// `-1` is infinite, `0` means the video ends at the next end of stream,
/// `N` means N more full plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopCount(i32);

impl LoopCount {
    /// Loops forever.
    pub const INFINITE: Self = Self(-1);
    /// Plays once.
    pub const NONE: Self = Self(0);

    /// Normalizes an integer loop count; every negative value means infinite.
    #[must_use]
    pub fn new(count: i32) -> Self {
        if count < 0 {
            Self::INFINITE
        } else {
            Self(count)
        }
    }

    /// `true` loops forever, `false` plays once.
    #[must_use]
    pub fn from_bool(looping: bool) -> Self {
        if looping {
            Self::INFINITE
        } else {
            Self::NONE
        }
    }

    /// Returns the raw value (-1, 0 or N).
    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }

    #[must_use]
    pub fn is_infinite(self) -> bool {
        self.0 < 0
    }

    /// Consumes one replay at end of stream.
    ///
    /// Returns `true` if playback should rewind and continue.
    pub fn consume(&mut self) -> bool {
        match self.0 {
            n if n < 0 => true,
            0 => false,
            n => {
                self.0 = n - 1;
                true
            }
        }
    }
}

impl From<bool> for LoopCount {
    fn from(looping: bool) -> Self {
        Self::from_bool(looping)
    }
}

impl From<i32> for LoopCount {
    fn from(count: i32) -> Self {
        Self::new(count)
    }
}

// =============================================================================
// FrameId
// =============================================================================

/// Identifier of a published frame.
///
/// Strictly increasing across publishes within one playback session.
/// [`FrameId::NONE`] is never published and marks "nothing consumed yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameId(u64);

impl FrameId {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}
