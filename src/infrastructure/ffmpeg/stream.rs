// SPDX-License-Identifier: MPL-2.0
//! Byte-stream view of a video source for hardware decoder feed loops.
//!
//! A hardware decoder consumes fixed-size input buffers. [`VideoFileStream`]
//! fills them either straight from a local elementary-stream file or from
//! demuxed packets, carrying partially consumed packets across calls:
//!
//! ```text
//! read #1  [ header ............ ]          CODEC_CONFIG
//! read #2  [ packet A ......... ]           A continues
//! read #3  [ A tail | packet B .]           B continues
//! read #4  [ B tail ]                       END_OF_FRAME
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use bitflags::bitflags;
use tracing::{debug, warn};

use super::Demuxer;
use crate::application::port::{EncodedPacket, PacketRead, PacketSource};
use crate::config::PlayerConfig;
use crate::domain::video::options::has_uri_scheme;
use crate::domain::video::VideoSource;
use crate::error::VideoError;

bitflags! {
    /// Buffer flags understood by hardware decoder input ports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StreamFlags: u32 {
        /// The chunk ends exactly at the end of a packet.
        const END_OF_FRAME = 0x10;
        /// The chunk holds codec configuration bytes only.
        const CODEC_CONFIG = 0x80;
    }
}

/// Result of one [`VideoFileStream::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamChunk {
    /// Bytes written into the caller's buffer.
    pub len: usize,
    pub flags: StreamFlags,
    /// Presentation time of the packet ending in this chunk, in microseconds.
    pub timestamp_us: i64,
}

/// Codec of a raw elementary-stream file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawCodec {
    H264,
    Hevc,
}

/// Detects local H.264/HEVC elementary-stream files by extension.
fn raw_codec(src: &str) -> Option<RawCodec> {
    if has_uri_scheme(src) {
        return None;
    }
    let extension = Path::new(src).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "h264" | "264" => Some(RawCodec::H264),
        "h265" | "hevc" => Some(RawCodec::Hevc),
        _ => None,
    }
}

enum Backing<P> {
    RawFile { file: File, codec: RawCodec },
    Packets(P),
}

/// Uniform byte source over a raw file or a packet source.
pub struct VideoFileStream<P: PacketSource = Demuxer> {
    backing: Backing<P>,
    header_done: bool,
    header_offset: usize,
    pending: Option<EncodedPacket>,
    pending_offset: usize,
    eof: bool,
    failed: bool,
    last_error: Option<VideoError>,
}

impl VideoFileStream<Demuxer> {
    /// Opens `source` as a raw file when it is a local elementary stream,
    /// through a [`Demuxer`] otherwise.
    ///
    /// # Errors
    ///
    /// `FileNotFound` for a missing raw file, `DemuxerInitFailed` when the
    /// container cannot be opened.
    pub fn open(source: &VideoSource, config: &PlayerConfig) -> Result<Self, VideoError> {
        if let Some(codec) = raw_codec(&source.src) {
            let file = File::open(&source.src).map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => VideoError::FileNotFound(source.src.clone()),
                _ => VideoError::OpenFailed(format!("{}: {err}", source.src)),
            })?;
            debug!(src = %source.src, ?codec, "reading raw elementary stream");
            return Ok(Self::with_backing(Backing::RawFile { file, codec }));
        }

        let mut demuxer = Demuxer::new(config);
        demuxer
            .load(source)
            .map_err(|err| VideoError::DemuxerInitFailed(err.to_string()))?;
        debug!(src = %source.src, "reading demuxed packets");
        Ok(Self::from_packets(demuxer))
    }
}

impl<P: PacketSource> VideoFileStream<P> {
    /// Wraps an already open packet source.
    pub fn from_packets(source: P) -> Self {
        Self::with_backing(Backing::Packets(source))
    }

    fn with_backing(backing: Backing<P>) -> Self {
        Self {
            backing,
            header_done: false,
            header_offset: 0,
            pending: None,
            pending_offset: 0,
            eof: false,
            failed: false,
            last_error: None,
        }
    }

    /// Fills `buf` with the next bytes of the stream.
    ///
    /// Never writes more than `buf.len()` bytes. A short chunk means the
    /// stream ended, failed, or a codec header was delivered on its own.
    pub fn read(&mut self, buf: &mut [u8]) -> StreamChunk {
        match &mut self.backing {
            Backing::RawFile { file, .. } => {
                if self.eof || self.failed {
                    return StreamChunk::default();
                }
                match read_full(file, buf) {
                    Ok(len) => {
                        if len < buf.len() {
                            self.eof = true;
                        }
                        StreamChunk {
                            len,
                            ..StreamChunk::default()
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "raw video read failed");
                        self.failed = true;
                        self.last_error = Some(VideoError::DecodeError(err.to_string()));
                        StreamChunk::default()
                    }
                }
            }
            Backing::Packets(_) => self.read_packets(buf),
        }
    }

    fn read_packets(&mut self, buf: &mut [u8]) -> StreamChunk {
        let Backing::Packets(source) = &mut self.backing else {
            return StreamChunk::default();
        };

        if !self.header_done {
            match source.header().filter(|header| !header.is_empty()) {
                Some(header) => {
                    let left = &header[self.header_offset.min(header.len())..];
                    let len = left.len().min(buf.len());
                    buf[..len].copy_from_slice(&left[..len]);
                    if len == left.len() {
                        self.header_done = true;
                        self.header_offset = 0;
                    } else {
                        self.header_offset += len;
                    }
                    return StreamChunk {
                        len,
                        flags: StreamFlags::CODEC_CONFIG,
                        timestamp_us: 0,
                    };
                }
                None => self.header_done = true,
            }
        }

        let mut chunk = StreamChunk::default();

        if let Some(packet) = self.pending.take() {
            let left = &packet.data[self.pending_offset.min(packet.data.len())..];
            let len = left.len().min(buf.len());
            buf[..len].copy_from_slice(&left[..len]);
            chunk.len = len;
            chunk.timestamp_us = timestamp_us(&packet);

            if len < left.len() {
                self.pending_offset += len;
                self.pending = Some(packet);
                return chunk;
            }
            self.pending_offset = 0;
            chunk.flags |= StreamFlags::END_OF_FRAME;
            if chunk.len == buf.len() {
                return chunk;
            }
        }

        if self.eof || self.failed {
            return chunk;
        }

        match source.read_packet() {
            Ok(PacketRead::Packet(packet)) => {
                let room = buf.len() - chunk.len;
                let len = packet.data.len().min(room);
                buf[chunk.len..chunk.len + len].copy_from_slice(&packet.data[..len]);
                chunk.len += len;
                chunk.timestamp_us = timestamp_us(&packet);

                if len < packet.data.len() {
                    chunk.flags.remove(StreamFlags::END_OF_FRAME);
                    self.pending_offset = len;
                    self.pending = Some(packet);
                } else {
                    chunk.flags |= StreamFlags::END_OF_FRAME;
                }
            }
            Ok(PacketRead::EndOfStream) => {
                debug!("byte stream reached end of video");
                self.eof = true;
            }
            Err(err) => {
                warn!(error = %err, "packet read failed");
                self.failed = true;
                self.last_error = Some(err);
            }
        }

        chunk
    }

    /// Restarts from the first byte (raw) or first packet (demuxed).
    ///
    /// # Errors
    ///
    /// I/O failure, or a failed re-open of the packet source.
    pub fn rewind(&mut self) -> Result<(), VideoError> {
        self.pending = None;
        self.pending_offset = 0;
        self.header_done = false;
        self.header_offset = 0;
        self.eof = false;
        self.failed = false;

        let result = match &mut self.backing {
            Backing::RawFile { file, .. } => file
                .seek(SeekFrom::Start(0))
                .map(|_| ())
                .map_err(|err| VideoError::DecodeError(err.to_string())),
            Backing::Packets(source) => source.rewind(),
        };
        if let Err(err) = &result {
            self.failed = true;
            self.last_error = Some(err.clone());
        }
        result
    }

    pub fn pause(&mut self) {
        if let Backing::Packets(source) = &mut self.backing {
            source.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Backing::Packets(source) = &mut self.backing {
            source.resume();
        }
    }

    /// True once all bytes were delivered.
    #[must_use]
    pub fn end_of_stream(&self) -> bool {
        self.eof && self.pending.is_none()
    }

    /// True after a read or rewind failure.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&VideoError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn is_h264(&self) -> bool {
        match &self.backing {
            Backing::RawFile { codec, .. } => *codec == RawCodec::H264,
            Backing::Packets(source) => source.info().is_h264,
        }
    }

    #[must_use]
    pub fn is_hevc(&self) -> bool {
        match &self.backing {
            Backing::RawFile { codec, .. } => *codec == RawCodec::Hevc,
            Backing::Packets(source) => source.info().is_hevc,
        }
    }

    /// Raw elementary-stream files are always Annex B.
    #[must_use]
    pub fn has_start_codes(&self) -> bool {
        match &self.backing {
            Backing::RawFile { .. } => true,
            Backing::Packets(source) => source.has_start_codes(),
        }
    }

    /// Duration in seconds, -1 when unknown.
    #[must_use]
    pub fn duration(&self) -> f64 {
        match &self.backing {
            Backing::RawFile { .. } => -1.0,
            Backing::Packets(source) => source.info().duration_secs,
        }
    }

    /// Frames per second, 0 when unknown.
    #[must_use]
    pub fn framerate(&self) -> f64 {
        match &self.backing {
            Backing::RawFile { .. } => 0.0,
            Backing::Packets(source) => source.info().fps,
        }
    }

    #[must_use]
    pub fn is_raw_file(&self) -> bool {
        matches!(self.backing, Backing::RawFile { .. })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_us(packet: &EncodedPacket) -> i64 {
    packet
        .pts_secs
        .filter(|pts| pts.is_finite())
        .map_or(0, |pts| (pts * 1_000_000.0) as i64)
}

/// Reads until `buf` is full or the file ends.
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
