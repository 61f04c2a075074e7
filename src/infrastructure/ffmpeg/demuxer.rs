// SPDX-License-Identifier: MPL-2.0
//! FFmpeg demuxer and software decoder.
//!
//! [`Demuxer`] opens a container or network stream, selects its best video
//! stream and produces either compressed packets ([`PacketSource`]) or RGB24
//! frames ([`FrameDecoder`]).
//!
//! # Design Notes
//!
//! - Every blocking open or read re-arms the [`Deadline`] polled by FFmpeg's
//!   interrupt callback, which bounds stalls on dead network sources
//! - The decoder backend is chosen once per open: a named platform decoder
//!   when enabled and available, the generic decoder otherwise
//! - Frames are converted into a private back buffer and only become visible
//!   through [`FrameBuffer::publish`]

use std::ffi::CString;
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, decoder, format, frame, media, software::scaling, Dictionary, Packet};
use tracing::{debug, info, trace, warn};

use super::timeout::{interrupt_callback, Deadline};
use super::{init_ffmpeg, set_verbose_logging};
use crate::application::port::{EncodedPacket, FrameDecoder, FrameRead, PacketRead, PacketSource};
use crate::config::PlayerConfig;
use crate::domain::video::{DecoderOptions, StreamInfo, VideoSource};
use crate::error::VideoError;
use crate::video_player::FrameBuffer;

/// Platform decoders tried before the generic one, per codec.
fn hardware_decoder_names(codec_id: codec::Id) -> &'static [&'static str] {
    match codec_id {
        codec::Id::H264 => &["h264_v4l2m2m"],
        codec::Id::HEVC => &["hevc_rpi", "hevc_v4l2m2m"],
        _ => &[],
    }
}

/// Decoder implementation selected by [`Demuxer::prepare_decoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderBackend {
    /// FFmpeg's generic decoder for the codec.
    Software,
    /// A platform decoder looked up by name.
    Hardware { name: String },
}

impl DecoderBackend {
    #[must_use]
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware { .. })
    }
}

/// Presentation-time bookkeeping for decoded frames.
///
/// Uses the decoder's best-effort timestamp when it moves forward, otherwise
/// extrapolates from the previous frame so timestamps never go backwards.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PtsTracker {
    last: Option<f64>,
    expected: f64,
}

impl PtsTracker {
    /// Returns the presentation time for the next frame.
    ///
    /// `frame_delay` is the nominal frame duration, `repeat` the frame's
    /// repeat-picture count (each repeat adds half a frame).
    pub(crate) fn next(&mut self, timestamp: Option<f64>, frame_delay: f64, repeat: f64) -> f64 {
        let pts = match (timestamp, self.last) {
            (Some(ts), Some(last)) if ts.is_finite() && ts >= last => ts,
            (Some(ts), None) if ts.is_finite() => ts,
            _ => self.expected,
        };
        let delay = frame_delay * (1.0 + repeat * 0.5);
        self.last = Some(pts);
        self.expected = pts + delay;
        pts
    }
}

/// The open container and its selected video stream.
struct OpenInput {
    input: format::context::Input,
    stream_index: usize,
    time_base: f64,
    frame_delay: f64,
    codec_id: codec::Id,
    /// Codec extradata (SPS/PPS, avcC or hvcC).
    header: Option<Vec<u8>>,
}

/// Open decoder plus conversion state.
struct Decoding {
    decoder: decoder::Video,
    backend: DecoderBackend,
    native: frame::Video,
    rgb: frame::Video,
    /// Created on the first frame, recreated if the native format changes.
    scaler: Option<(scaling::Context, format::Pixel, u32, u32)>,
    pts: PtsTracker,
    draining: bool,
}

// SAFETY: both hold FFmpeg contexts with raw pointers. They are only ever
// touched by the thread that currently owns the `Demuxer`, which moves
// between threads by value and is never shared.
unsafe impl Send for OpenInput {}
unsafe impl Send for Decoding {}

/// FFmpeg-backed demuxer and decoder.
///
/// Owned by one thread at a time: the playback controller moves it into its
/// decode thread and gets it back on join.
pub struct Demuxer {
    // Dropped before `deadline`, whose address the format context holds.
    decoding: Option<Decoding>,
    input: Option<OpenInput>,
    deadline: Box<Deadline>,
    source: Option<VideoSource>,
    info: StreamInfo,
    open_timeout: Duration,
    default_read_timeout: Duration,
    read_timeout: Duration,
    prefer_hardware: bool,
    verbose: bool,
    paused: bool,
    back: Vec<u8>,
    frame_buffer: Arc<FrameBuffer>,
    last_error: Option<VideoError>,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new(&PlayerConfig::default())
    }
}

impl Demuxer {
    /// Creates a closed demuxer using the timeouts and decoder preference of `config`.
    #[must_use]
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            decoding: None,
            input: None,
            deadline: Box::new(Deadline::new()),
            source: None,
            info: StreamInfo::default(),
            open_timeout: config.open_timeout(),
            default_read_timeout: config.read_timeout(),
            read_timeout: config.read_timeout(),
            prefer_hardware: config.prefer_hardware(),
            verbose: config.is_verbose(),
            paused: false,
            back: Vec::new(),
            frame_buffer: Arc::new(FrameBuffer::new()),
            last_error: None,
        }
    }

    /// Opens `source` and selects its video stream. No decoder is prepared.
    ///
    /// Any previously open container is closed first; the published frame is kept.
    ///
    /// # Errors
    ///
    /// `OpenFailed`, `Timeout`, `NoStreams`, `NoVideoStream` or `DemuxerInitFailed`.
    pub fn load(&mut self, source: &VideoSource) -> Result<StreamInfo, VideoError> {
        let result = self.load_inner(source);
        self.remember(result)
    }

    fn load_inner(&mut self, source: &VideoSource) -> Result<StreamInfo, VideoError> {
        init_ffmpeg()?;
        self.close_contexts();

        let options = DecoderOptions::parse(&source.opts);
        for (key, value) in &options.rejected {
            warn!(key = %key, value = %value, "ignoring invalid player option");
        }
        self.read_timeout = options.timeout_read.unwrap_or(self.default_read_timeout);
        let open_timeout = options.timeout_open.unwrap_or(self.open_timeout);
        let realtime = options.is_realtime(&source.src);
        if options.dump_format || self.verbose {
            set_verbose_logging(true);
        }

        debug!(src = %source.src, timeout_ms = open_timeout.as_millis(), realtime, "opening container");
        let input = open_input(&source.src, &options, &self.deadline, open_timeout)?;

        if options.dump_format || self.verbose {
            format::context::input::dump(&input, 0, Some(&source.src));
        }

        let opened = select_video_stream(input)?;
        let info = describe_stream(&opened, realtime)?;

        info!(
            src = %source.src,
            width = info.width,
            height = info.height,
            fps = info.fps,
            duration = info.duration_secs,
            realtime,
            h264 = info.is_h264,
            hevc = info.is_hevc,
            "video found"
        );

        self.input = Some(opened);
        self.info = info;
        self.source = Some(source.clone());
        self.paused = false;
        Ok(info)
    }

    /// Opens a decoder for the loaded stream.
    ///
    /// # Errors
    ///
    /// `UnsupportedCodec` when no decoder exists for the codec,
    /// `CodecOpenFailed` when it cannot be opened.
    pub fn prepare_decoder(&mut self) -> Result<DecoderBackend, VideoError> {
        let result = self.prepare_decoder_inner();
        self.remember(result)
    }

    fn prepare_decoder_inner(&mut self) -> Result<DecoderBackend, VideoError> {
        let opened = self.input.as_ref().ok_or_else(not_open)?;
        if self.info.width == 0 || self.info.height == 0 {
            return Err(VideoError::CodecOpenFailed(
                "stream has no frame size".to_string(),
            ));
        }
        let stream = opened
            .input
            .stream(opened.stream_index)
            .ok_or(VideoError::NoVideoStream)?;
        let parameters = stream.parameters();

        let mut selected = None;
        if self.prefer_hardware {
            for name in hardware_decoder_names(opened.codec_id) {
                let Some(codec) = decoder::find_by_name(name) else {
                    continue;
                };
                match open_decoder(parameters.clone(), codec) {
                    Ok(video) => {
                        selected = Some((
                            video,
                            DecoderBackend::Hardware {
                                name: (*name).to_string(),
                            },
                        ));
                        break;
                    }
                    Err(err) => debug!(decoder = name, error = %err, "platform decoder unavailable"),
                }
            }
        }

        let (video, backend) = match selected {
            Some(selected) => selected,
            None => {
                let codec = decoder::find(opened.codec_id).ok_or_else(|| {
                    VideoError::UnsupportedCodec(format!("{:?}", opened.codec_id))
                })?;
                let video = open_decoder(parameters, codec)
                    .map_err(|err| VideoError::CodecOpenFailed(err.to_string()))?;
                (video, DecoderBackend::Software)
            }
        };

        debug!(?backend, codec = ?opened.codec_id, "decoder ready");
        self.decoding = Some(Decoding {
            decoder: video,
            backend: backend.clone(),
            native: frame::Video::empty(),
            rgb: frame::Video::empty(),
            scaler: None,
            pts: PtsTracker::default(),
            draining: false,
        });
        Ok(backend)
    }

    /// Reads the next compressed packet of the video stream.
    ///
    /// # Errors
    ///
    /// `Timeout` when the read deadline passes, `DecodeError` on I/O failure.
    pub fn read_compressed_packet(&mut self) -> Result<PacketRead, VideoError> {
        let result = self.read_compressed_packet_inner();
        self.remember(result)
    }

    fn read_compressed_packet_inner(&mut self) -> Result<PacketRead, VideoError> {
        let opened = self.input.as_mut().ok_or_else(not_open)?;
        let Some(packet) = next_video_packet(opened, &self.deadline, self.read_timeout)? else {
            return Ok(PacketRead::EndOfStream);
        };
        #[allow(clippy::cast_precision_loss)]
        let pts_secs = packet.pts().map(|pts| pts as f64 * opened.time_base);
        Ok(PacketRead::Packet(EncodedPacket {
            data: packet.data().map(<[u8]>::to_vec).unwrap_or_default(),
            pts_secs,
            is_key: packet.is_key(),
        }))
    }

    /// Read timeout in effect for the loaded source.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn read_decoded_frame_inner(&mut self) -> Result<FrameRead, VideoError> {
        let opened = self.input.as_mut().ok_or_else(not_open)?;
        let decoding = self.decoding.as_mut().ok_or_else(not_open)?;

        loop {
            match decoding.decoder.receive_frame(&mut decoding.native) {
                Ok(()) => {
                    convert_frame(decoding, self.info.width, self.info.height, &mut self.back)?;
                    #[allow(clippy::cast_precision_loss)]
                    let timestamp = decoding
                        .native
                        .timestamp()
                        .map(|ts| ts as f64 * opened.time_base);
                    let pts = decoding.pts.next(
                        timestamp,
                        opened.frame_delay,
                        decoding.native.repeat(),
                    );
                    trace!(pts, "frame decoded");
                    return Ok(FrameRead::Frame { pts_secs: pts });
                }
                Err(err) => match receive_step(&err, decoding.draining) {
                    ReceiveStep::NeedInput => {}
                    ReceiveStep::Skip => {
                        warn!(error = %err, "decoder dropped a frame");
                    }
                    ReceiveStep::Finished => {
                        if err != ffmpeg::Error::Eof {
                            debug!(error = %err, "decoder stopped while draining");
                        }
                        return Ok(FrameRead::EndOfStream);
                    }
                },
            }

            match next_video_packet(opened, &self.deadline, self.read_timeout)? {
                Some(packet) => {
                    if let Err(err) = decoding.decoder.send_packet(&packet) {
                        match err {
                            ffmpeg::Error::InvalidData => {
                                warn!(error = %err, "skipping undecodable packet");
                            }
                            other => return Err(VideoError::DecodeError(other.to_string())),
                        }
                    }
                }
                None => {
                    decoding
                        .decoder
                        .send_eof()
                        .map_err(|err| VideoError::DecodeError(err.to_string()))?;
                    decoding.draining = true;
                }
            }
        }
    }

    /// Re-opens the same source and checks that the geometry is unchanged.
    ///
    /// Re-prepares the decoder if one was open.
    ///
    /// # Errors
    ///
    /// Any open error, or `DecodeError` if the frame size changed.
    pub fn rewind(&mut self) -> Result<(), VideoError> {
        let result = self.rewind_inner();
        self.remember(result)
    }

    fn rewind_inner(&mut self) -> Result<(), VideoError> {
        let source = self.source.clone().ok_or_else(not_open)?;
        let previous = self.info;
        let had_decoder = self.decoding.is_some();

        debug!(src = %source.src, "rewinding");
        let reopened = self.load_inner(&source)?;
        if !previous.same_geometry(&reopened) {
            self.close_contexts();
            return Err(VideoError::DecodeError(format!(
                "video size changed from {}x{} to {}x{}",
                previous.width, previous.height, reopened.width, reopened.height
            )));
        }
        if had_decoder {
            self.prepare_decoder_inner()?;
        }
        Ok(())
    }

    /// Pauses network reading. Idempotent.
    pub fn pause_reading(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        if let Some(opened) = self.input.as_mut() {
            if let Err(err) = opened.input.pause() {
                trace!(error = %err, "container does not support read pause");
            }
        }
    }

    /// Resumes network reading. Idempotent.
    pub fn resume_reading(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(opened) = self.input.as_mut() {
            if let Err(err) = opened.input.play() {
                trace!(error = %err, "container does not support read play");
            }
        }
    }

    /// Codec configuration bytes of the open stream.
    #[must_use]
    pub fn header(&self) -> Option<&[u8]> {
        self.input.as_ref().and_then(|opened| opened.header.as_deref())
    }

    /// Returns true if H.264 packets carry Annex B start codes rather than
    /// length prefixes (an avcC header starts with version byte 1).
    #[must_use]
    pub fn has_start_codes(&self) -> bool {
        if self.input.is_none() || !self.info.is_h264 {
            return false;
        }
        self.header()
            .map_or(true, |header| header.len() < 7 || header[0] != 1)
    }

    /// Backend of the open decoder.
    #[must_use]
    pub fn backend(&self) -> Option<&DecoderBackend> {
        self.decoding.as_ref().map(|decoding| &decoding.backend)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.input.is_some()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last failure of an open, read or rewind.
    #[must_use]
    pub fn last_error(&self) -> Option<&VideoError> {
        self.last_error.as_ref()
    }

    fn remember<T>(&mut self, result: Result<T, VideoError>) -> Result<T, VideoError> {
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        result
    }

    /// Drops decoder and container; the published frame survives.
    fn close_contexts(&mut self) {
        self.decoding = None;
        self.input = None;
        self.deadline.disarm();
        self.info = StreamInfo::default();
        self.paused = false;
    }
}

impl FrameDecoder for Demuxer {
    fn open(&mut self, source: &VideoSource) -> Result<StreamInfo, VideoError> {
        let info = self.load(source)?;
        self.prepare_decoder()?;
        Ok(info)
    }

    fn info(&self) -> StreamInfo {
        self.info
    }

    fn read_decoded_frame(&mut self) -> Result<FrameRead, VideoError> {
        let result = self.read_decoded_frame_inner();
        self.remember(result)
    }

    fn switch_frame(&mut self) {
        let id = self
            .frame_buffer
            .publish(&mut self.back, self.info.width, self.info.height);
        trace!(frame_id = id.value(), "frame published");
    }

    fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    fn pause(&mut self) {
        self.pause_reading();
    }

    fn resume(&mut self) {
        self.resume_reading();
    }

    fn rewind_decoder(&mut self) -> Result<f64, VideoError> {
        self.rewind()?;
        match self.read_decoded_frame()? {
            FrameRead::Frame { pts_secs } => Ok(pts_secs),
            FrameRead::EndOfStream => Err(VideoError::EmptyVideo),
        }
    }

    fn close(&mut self, destroy_front: bool) {
        self.close_contexts();
        self.back = Vec::new();
        if destroy_front {
            self.frame_buffer.release();
        }
    }
}

impl PacketSource for Demuxer {
    fn read_packet(&mut self) -> Result<PacketRead, VideoError> {
        self.read_compressed_packet()
    }

    fn header(&self) -> Option<&[u8]> {
        Demuxer::header(self)
    }

    fn rewind(&mut self) -> Result<(), VideoError> {
        Demuxer::rewind(self)
    }

    fn pause(&mut self) {
        self.pause_reading();
    }

    fn resume(&mut self) {
        self.resume_reading();
    }

    fn info(&self) -> StreamInfo {
        self.info
    }

    fn has_start_codes(&self) -> bool {
        Demuxer::has_start_codes(self)
    }
}

// =============================================================================
// FFmpeg helpers
// =============================================================================

fn not_open() -> VideoError {
    VideoError::DecodeError("demuxer is not open".to_string())
}

/// Opens a container with the interrupt callback and options installed.
fn open_input(
    uri: &str,
    options: &DecoderOptions,
    deadline: &Deadline,
    timeout: Duration,
) -> Result<format::context::Input, VideoError> {
    let path = CString::new(uri)
        .map_err(|_| VideoError::OpenFailed(format!("invalid source path: {uri:?}")))?;

    let mut dictionary = Dictionary::new();
    for (key, value) in &options.passthrough {
        dictionary.set(key, value);
    }

    deadline.arm(timeout);
    // SAFETY: the context is allocated here and either handed to `Input`,
    // which frees it on drop, or freed on every error path. `avformat_open_input`
    // frees it itself when it fails. The deadline outlives the context (see
    // field order in `Demuxer`).
    let result = unsafe {
        let mut context = ffmpeg::ffi::avformat_alloc_context();
        if context.is_null() {
            deadline.disarm();
            return Err(VideoError::OpenFailed(
                "could not allocate format context".to_string(),
            ));
        }
        (*context).interrupt_callback = ffmpeg::ffi::AVIOInterruptCB {
            callback: Some(interrupt_callback),
            opaque: deadline.as_opaque(),
        };

        let mut raw_options = dictionary.disown();
        let status = ffmpeg::ffi::avformat_open_input(
            &mut context,
            path.as_ptr(),
            ptr::null_mut(),
            &mut raw_options,
        );
        let unused = Dictionary::own(raw_options);
        for (key, _) in unused.iter() {
            debug!(key, "option not recognized by FFmpeg");
        }

        if status < 0 {
            Err(open_error(ffmpeg::Error::from(status)))
        } else {
            let status = ffmpeg::ffi::avformat_find_stream_info(context, ptr::null_mut());
            if status < 0 {
                ffmpeg::ffi::avformat_close_input(&mut context);
                Err(match ffmpeg::Error::from(status) {
                    ffmpeg::Error::Exit => VideoError::Timeout,
                    err => VideoError::OpenFailed(format!("could not find streams: {err}")),
                })
            } else {
                Ok(format::context::Input::wrap(context))
            }
        }
    };
    deadline.disarm();
    result
}

fn open_error(err: ffmpeg::Error) -> VideoError {
    match err {
        ffmpeg::Error::Exit => VideoError::Timeout,
        err => VideoError::OpenFailed(format!("file open error: {err}")),
    }
}

fn select_video_stream(input: format::context::Input) -> Result<OpenInput, VideoError> {
    if input.nb_streams() == 0 {
        return Err(VideoError::NoStreams);
    }
    let stream = input
        .streams()
        .best(media::Type::Video)
        .ok_or(VideoError::NoVideoStream)?;

    let stream_index = stream.index();
    let time_base = f64::from(stream.time_base());
    let codec_id = stream.parameters().id();
    let fps = stream_fps(&stream);
    let frame_delay = if fps > 0.0 { 1.0 / fps } else { time_base };
    let header = codec_header(&stream.parameters());

    Ok(OpenInput {
        input,
        stream_index,
        time_base,
        frame_delay,
        codec_id,
        header,
    })
}

fn describe_stream(opened: &OpenInput, realtime: bool) -> Result<StreamInfo, VideoError> {
    let stream = opened
        .input
        .stream(opened.stream_index)
        .ok_or(VideoError::NoVideoStream)?;
    let (width, height) = frame_size(&stream.parameters());

    #[allow(clippy::cast_precision_loss)]
    let mut duration_secs = stream.duration() as f64 * opened.time_base;
    if duration_secs < 0.0 && !realtime && opened.input.duration() > 0 {
        duration_secs =
            opened.input.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE);
    }
    if duration_secs < 0.0 || !duration_secs.is_finite() {
        duration_secs = -1.0;
    }

    Ok(StreamInfo {
        width,
        height,
        fps: stream_fps(&stream),
        duration_secs,
        realtime,
        is_h264: opened.codec_id == codec::Id::H264,
        is_hevc: opened.codec_id == codec::Id::HEVC,
    })
}

/// Average frame rate, falling back to the base rate; 0 when unknown.
fn stream_fps(stream: &format::stream::Stream<'_>) -> f64 {
    [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
        .map_or(0.0, f64::from)
}

fn frame_size(parameters: &codec::Parameters) -> (u32, u32) {
    // SAFETY: `parameters` owns a valid AVCodecParameters.
    let (width, height) = unsafe {
        let raw = parameters.as_ptr();
        ((*raw).width, (*raw).height)
    };
    (
        u32::try_from(width).unwrap_or(0),
        u32::try_from(height).unwrap_or(0),
    )
}

fn codec_header(parameters: &codec::Parameters) -> Option<Vec<u8>> {
    // SAFETY: extradata is either null or points to `extradata_size` bytes
    // owned by `parameters`; they are copied before it is dropped.
    unsafe {
        let raw = parameters.as_ptr();
        let data = (*raw).extradata;
        let size = usize::try_from((*raw).extradata_size).unwrap_or(0);
        if data.is_null() || size == 0 {
            None
        } else {
            Some(std::slice::from_raw_parts(data, size).to_vec())
        }
    }
}

fn open_decoder(
    parameters: codec::Parameters,
    codec: ffmpeg::Codec,
) -> Result<decoder::Video, ffmpeg::Error> {
    let context = codec::Context::from_parameters(parameters)?;
    context.decoder().open_as(codec)?.video()
}

/// Reads packets until one of the video stream shows up. `None` at end of file.
fn next_video_packet(
    opened: &mut OpenInput,
    deadline: &Deadline,
    timeout: Duration,
) -> Result<Option<Packet>, VideoError> {
    loop {
        let mut packet = Packet::empty();
        deadline.arm(timeout);
        let result = packet.read(&mut opened.input);
        deadline.disarm();

        match result {
            Ok(()) if packet.stream() == opened.stream_index => return Ok(Some(packet)),
            Ok(()) => trace!(stream = packet.stream(), "skipping non-video packet"),
            Err(ffmpeg::Error::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
}

/// Converts the decoded native frame into tightly packed RGB24 in `back`.
fn convert_frame(
    decoding: &mut Decoding,
    width: u32,
    height: u32,
    back: &mut Vec<u8>,
) -> Result<(), VideoError> {
    let native = &decoding.native;
    let key = (native.format(), native.width(), native.height());

    let stale = decoding
        .scaler
        .as_ref()
        .map_or(true, |(_, format, w, h)| (*format, *w, *h) != key);
    if stale {
        let scaler = scaling::Context::get(
            key.0,
            key.1,
            key.2,
            format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|err| VideoError::DecodeError(format!("could not create scaler: {err}")))?;
        decoding.scaler = Some((scaler, key.0, key.1, key.2));
    }

    let Some((scaler, ..)) = decoding.scaler.as_mut() else {
        return Err(VideoError::DecodeError("scaler missing".to_string()));
    };
    scaler
        .run(&decoding.native, &mut decoding.rgb)
        .map_err(|err| VideoError::DecodeError(format!("scaling failed: {err}")))?;

    copy_packed_rows(
        decoding.rgb.data(0),
        decoding.rgb.stride(0),
        width as usize * 3,
        height as usize,
        back,
    );
    Ok(())
}

/// What a failed `receive_frame` means for the decode loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveStep {
    /// The decoder wants another packet.
    NeedInput,
    /// A frame was lost; keep feeding packets.
    Skip,
    /// No more frames will come.
    Finished,
}

fn receive_step(err: &ffmpeg::Error, draining: bool) -> ReceiveStep {
    match err {
        ffmpeg::Error::Eof => ReceiveStep::Finished,
        _ if draining => ReceiveStep::Finished,
        ffmpeg::Error::Other { errno } if *errno == ffmpeg::util::error::EAGAIN => {
            ReceiveStep::NeedInput
        }
        _ => ReceiveStep::Skip,
    }
}

/// Copies `rows` rows of `row_len` bytes out of a strided plane.
fn copy_packed_rows(plane: &[u8], stride: usize, row_len: usize, rows: usize, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(row_len * rows);
    for row in plane.chunks(stride.max(1)).take(rows) {
        out.extend_from_slice(&row[..row_len.min(row.len())]);
    }
    out.resize(row_len * rows, 0);
}
