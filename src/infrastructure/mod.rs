// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`, wrapping `FFmpeg`.
//!
//! - [`ffmpeg`]: demuxing and decoding (implements [`FrameDecoder`] and
//!   [`PacketSource`]) plus the byte-stream adapter for hardware decoders
//!
//! [`FrameDecoder`]: crate::application::port::FrameDecoder
//! [`PacketSource`]: crate::application::port::PacketSource

pub mod ffmpeg;

pub use ffmpeg::{Demuxer, VideoFileStream};
