// SPDX-License-Identifier: MPL-2.0
//! Video decoding port definitions.
//!
//! [`FrameDecoder`] is what the playback controller drives from its decode
//! thread. [`PacketSource`] is the compressed side used by byte-stream
//! adapters feeding hardware decoders.
//!
//! # Design Notes
//!
//! - Decoders are **stateful**: they own the open source, the codec and the
//!   RGB back buffer
//! - Methods block; the controller calls them from its own thread
//! - Uses domain types only (`StreamInfo`, `VideoSource`, `VideoError`)

use crate::domain::video::{StreamInfo, VideoSource};
use crate::error::VideoError;
use crate::video_player::FrameBuffer;
use std::sync::Arc;

/// Outcome of a successful decoded-frame read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRead {
    /// A frame was decoded into the back buffer.
    Frame {
        /// Presentation time in seconds.
        pts_secs: f64,
    },
    /// No more frames.
    EndOfStream,
}

/// One compressed access unit of the video stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    /// Presentation time in seconds, if the container provided one.
    pub pts_secs: Option<f64>,
    pub is_key: bool,
}

/// Outcome of a successful compressed-packet read.
#[derive(Debug, Clone, PartialEq)]
pub enum PacketRead {
    Packet(EncodedPacket),
    EndOfStream,
}

// =============================================================================
// FrameDecoder Trait
// =============================================================================

/// Port for the demux + decode backend driven by the playback controller.
///
/// # Lifecycle
///
/// 1. `open()` loads the source and prepares the decoder
/// 2. `read_decoded_frame()` fills the back buffer, `switch_frame()` publishes it
/// 3. `rewind_decoder()` restarts from the first frame when looping
/// 4. `close(true)` releases everything including the published frame
pub trait FrameDecoder: Send {
    /// Opens the source and prepares a decoder for its video stream.
    ///
    /// # Errors
    ///
    /// `OpenFailed`, `NoStreams`, `NoVideoStream`, `UnsupportedCodec` or
    /// `CodecOpenFailed`.
    fn open(&mut self, source: &VideoSource) -> Result<StreamInfo, VideoError>;

    /// Properties of the open stream.
    fn info(&self) -> StreamInfo;

    /// Decodes the next frame into the back buffer.
    ///
    /// Packets of other streams and frames the decoder has not completed yet
    /// are skipped internally.
    ///
    /// # Errors
    ///
    /// I/O, container or conversion failure, including read timeouts.
    fn read_decoded_frame(&mut self) -> Result<FrameRead, VideoError>;

    /// Publishes the last decoded frame to consumers.
    fn switch_frame(&mut self);

    /// Shared hand-off buffer consumers read from.
    fn frame_buffer(&self) -> Arc<FrameBuffer>;

    /// Pauses network reading. Idempotent.
    fn pause(&mut self);

    /// Resumes network reading. Idempotent.
    fn resume(&mut self);

    /// Re-opens the source and decodes its first frame.
    ///
    /// Returns the presentation time of that frame.
    ///
    /// # Errors
    ///
    /// Fails if re-opening fails, the geometry changed, or no frame could be read.
    fn rewind_decoder(&mut self) -> Result<f64, VideoError>;

    /// Releases decoding resources; `destroy_front` also drops the published frame.
    fn close(&mut self, destroy_front: bool);
}

// =============================================================================
// PacketSource Trait
// =============================================================================

/// Port for sources of compressed video packets.
pub trait PacketSource: Send {
    /// Reads the next packet of the video stream.
    ///
    /// # Errors
    ///
    /// I/O failure or read timeout.
    fn read_packet(&mut self) -> Result<PacketRead, VideoError>;

    /// Codec configuration bytes (SPS/PPS, avcC, hvcC), if any.
    fn header(&self) -> Option<&[u8]>;

    /// Restarts the source from its first packet.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be re-opened or its geometry changed.
    fn rewind(&mut self) -> Result<(), VideoError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn info(&self) -> StreamInfo;

    /// Returns true if H.264 packets use Annex B start codes.
    fn has_start_codes(&self) -> bool;
}
