// SPDX-License-Identifier: MPL-2.0
//! Video playback domain types.
//!
//! This module contains video-related value objects and enums that are
//! independent of any presentation or infrastructure concerns.

pub mod events;
pub mod newtypes;
pub mod options;
pub mod playback;
pub mod source;

// Re-export commonly used types
pub use events::PlayerEvent;
pub use newtypes::{FrameId, LoopCount};
pub use options::DecoderOptions;
pub use playback::PlaybackState;
pub use source::{StreamInfo, VideoSource, VideoSourceHandle};
