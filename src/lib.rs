// SPDX-License-Identifier: MPL-2.0
//! `amino_video` plays video files and streams into a renderer-owned texture.
//!
//! `FFmpeg` demuxes and decodes on a background thread; frames are converted
//! to RGB24, paced against their presentation timestamps, and handed to the
//! render thread through a double buffer. Hosts receive lifecycle events
//! (`loaded`, `paused`, `ended`, ...) through a [`VideoConsumer`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use amino_video::config::PlayerConfig;
//! use amino_video::domain::video::{VideoSource, VideoSourceHandle};
//! use amino_video::video_player::{create_player, ChannelConsumer};
//!
//! let config = PlayerConfig::default();
//! let (consumer, _events) = ChannelConsumer::new();
//! let source = VideoSourceHandle::new(VideoSource::new("clip.mp4").with_loop(true));
//! let mut player = create_player(source, Arc::new(consumer), &config);
//! player.init().expect("video opens");
//! ```
//!
//! [`VideoConsumer`]: application::port::VideoConsumer

#![doc(html_root_url = "https://docs.rs/amino_video/0.3.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod video_player;

#[cfg(test)]
mod test_utils;
