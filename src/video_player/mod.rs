// SPDX-License-Identifier: MPL-2.0
//! Video playback engine.
//!
//! A [`PlaybackController`] owns a [`FrameDecoder`] and runs it on a
//! dedicated decode thread, pacing frames against a [`PlaybackClock`] and
//! publishing them through a double-buffered [`FrameBuffer`]. The render
//! side pulls frames with a [`FrameUploader`]; lifecycle events reach the
//! host through its [`VideoConsumer`].
//!
//! [`FrameDecoder`]: crate::application::port::FrameDecoder
//! [`VideoConsumer`]: crate::application::port::VideoConsumer

mod consumer;
mod controller;
mod frame_buffer;
mod state;
pub mod sync;

pub use consumer::{ChannelConsumer, ConsumerMessage, ConsumerReceiver};
pub use controller::{PlaybackController, DECODE_THREAD_NAME};
pub use frame_buffer::{FrameBuffer, FrameUploader, FrameView, UploadOutcome};
pub use state::{Notifications, PlayerStatus};
pub use sync::{PauseGate, PlaybackClock, SharedMediaTime};

use std::sync::Arc;

use crate::application::port::VideoConsumer;
use crate::config::PlayerConfig;
use crate::domain::video::VideoSourceHandle;
use crate::infrastructure::ffmpeg::Demuxer;

/// Creates a controller backed by the `FFmpeg` demuxer.
///
/// Nothing is opened until [`PlaybackController::init`] is called.
pub fn create_player(
    source: VideoSourceHandle,
    consumer: Arc<dyn VideoConsumer>,
    config: &PlayerConfig,
) -> PlaybackController<Demuxer> {
    PlaybackController::new(Demuxer::new(config), source, consumer)
}
