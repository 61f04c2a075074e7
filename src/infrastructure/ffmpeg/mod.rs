// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` adapters implementing the video ports.
//!
//! - [`Demuxer`]: container/stream demuxing and software decoding
//!   (implements [`FrameDecoder`] and [`PacketSource`])
//! - [`VideoFileStream`]: byte-stream view over a packet source or a raw
//!   elementary-stream file, for hardware decoder feed loops
//!
//! [`FrameDecoder`]: crate::application::port::FrameDecoder
//! [`PacketSource`]: crate::application::port::PacketSource

mod demuxer;
mod stream;
pub mod timeout;

pub use demuxer::{DecoderBackend, Demuxer};
pub use stream::{StreamChunk, StreamFlags, VideoFileStream};

use crate::error::VideoError;
use std::sync::OnceLock;

static FFMPEG_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initializes FFmpeg once per process.
///
/// Sets FFmpeg's own log level to errors only and enables networking.
///
/// # Errors
///
/// `DemuxerInitFailed` if FFmpeg could not be initialized.
pub fn init_ffmpeg() -> Result<(), VideoError> {
    FFMPEG_INIT
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|e| format!("FFmpeg initialization failed: {e}"))?;

            // SAFETY: av_log_set_level is thread-safe and only affects logging
            unsafe {
                ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
            }
            ffmpeg_next::format::network::init();
            tracing::debug!("FFmpeg initialized");
            Ok(())
        })
        .clone()
        .map_err(VideoError::DemuxerInitFailed)
}

/// Raises FFmpeg's log level to info, or lowers it back to errors.
pub fn set_verbose_logging(verbose: bool) {
    let level = if verbose {
        ffmpeg_next::ffi::AV_LOG_INFO
    } else {
        ffmpeg_next::ffi::AV_LOG_ERROR
    };
    // SAFETY: av_log_set_level is thread-safe and only affects logging
    unsafe {
        ffmpeg_next::ffi::av_log_set_level(level);
    }
}
