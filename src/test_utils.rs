// SPDX-License-Identifier: MPL-2.0
//! Test helpers shared by unit tests: a scripted decoder and event polling.

use crate::application::port::{FrameDecoder, FrameRead};
use crate::domain::video::{PlayerEvent, StreamInfo, VideoSource};
use crate::error::VideoError;
use crate::video_player::{ConsumerMessage, ConsumerReceiver, FrameBuffer};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default epsilon for f64 comparisons.
pub const F64_EPSILON: f64 = 1e-9;

/// Calls recorded by a [`ScriptedDecoder`].
#[derive(Debug, Default, Clone)]
pub struct DecoderLog {
    pub opens: usize,
    pub reads: usize,
    pub switches: usize,
    pub pauses: usize,
    pub resumes: usize,
    pub rewinds: usize,
    pub closed: bool,
}

/// What a [`ScriptedDecoder`] does.
#[derive(Debug, Clone)]
pub struct Script {
    pub info: StreamInfo,
    /// Timestamps of the frames in one pass.
    pub frames: Vec<f64>,
    pub open_error: Option<VideoError>,
    /// Fail the n-th read (0-based, counted across passes).
    pub read_error_at: Option<usize>,
    pub rewind_error: Option<VideoError>,
}

impl Script {
    /// Frames spaced `interval` seconds apart, 4x4 geometry.
    pub fn frames(count: usize, interval: f64) -> Self {
        Self {
            info: StreamInfo {
                width: 4,
                height: 4,
                fps: if interval > 0.0 { 1.0 / interval } else { 0.0 },
                duration_secs: count as f64 * interval,
                ..StreamInfo::default()
            },
            frames: (0..count).map(|i| i as f64 * interval).collect(),
            open_error: None,
            read_error_at: None,
            rewind_error: None,
        }
    }
}

/// In-memory [`FrameDecoder`] that plays a fixed list of timestamps.
///
/// Every frame fills the back buffer with one byte value so readers can
/// detect torn frames.
pub struct ScriptedDecoder {
    script: Script,
    position: usize,
    total_reads: usize,
    back: Vec<u8>,
    frame_buffer: Arc<FrameBuffer>,
    log: Arc<Mutex<DecoderLog>>,
}

impl ScriptedDecoder {
    pub fn new(script: Script) -> (Self, Arc<Mutex<DecoderLog>>) {
        let log = Arc::new(Mutex::new(DecoderLog::default()));
        let decoder = Self {
            script,
            position: 0,
            total_reads: 0,
            back: Vec::new(),
            frame_buffer: Arc::new(FrameBuffer::new()),
            log: Arc::clone(&log),
        };
        (decoder, log)
    }

    fn record(&self, f: impl FnOnce(&mut DecoderLog)) {
        f(&mut self.log.lock().unwrap());
    }

    fn fill_back(&mut self, value: u8) {
        self.back.clear();
        self.back.resize(self.script.info.rgb_frame_size(), value);
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn open(&mut self, _source: &VideoSource) -> Result<StreamInfo, VideoError> {
        self.record(|log| log.opens += 1);
        match &self.script.open_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.script.info),
        }
    }

    fn info(&self) -> StreamInfo {
        self.script.info
    }

    fn read_decoded_frame(&mut self) -> Result<FrameRead, VideoError> {
        self.record(|log| log.reads += 1);
        let read_index = self.total_reads;
        self.total_reads += 1;
        if self.script.read_error_at == Some(read_index) {
            return Err(VideoError::DecodeError("scripted failure".into()));
        }
        let Some(&pts) = self.script.frames.get(self.position) else {
            return Ok(FrameRead::EndOfStream);
        };
        self.fill_back((self.position % 251) as u8);
        self.position += 1;
        Ok(FrameRead::Frame { pts_secs: pts })
    }

    fn switch_frame(&mut self) {
        self.record(|log| log.switches += 1);
        let info = self.script.info;
        self.frame_buffer
            .publish(&mut self.back, info.width, info.height);
    }

    fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    fn pause(&mut self) {
        self.record(|log| log.pauses += 1);
    }

    fn resume(&mut self) {
        self.record(|log| log.resumes += 1);
    }

    fn rewind_decoder(&mut self) -> Result<f64, VideoError> {
        self.record(|log| log.rewinds += 1);
        if let Some(err) = &self.script.rewind_error {
            return Err(err.clone());
        }
        self.position = 0;
        match self.read_decoded_frame()? {
            FrameRead::Frame { pts_secs } => Ok(pts_secs),
            FrameRead::EndOfStream => Err(VideoError::EmptyVideo),
        }
    }

    fn close(&mut self, destroy_front: bool) {
        self.record(|log| log.closed = true);
        if destroy_front {
            self.frame_buffer.release();
        }
    }
}

/// Drains `rx` into `seen` until `target` shows up or `timeout` elapses.
pub fn wait_for_event(
    rx: &mut ConsumerReceiver,
    seen: &mut Vec<ConsumerMessage>,
    target: PlayerEvent,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        while let Ok(message) = rx.try_recv() {
            seen.push(message);
            if message == ConsumerMessage::Event(target) {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Drains everything currently queued in `rx`.
pub fn drain(rx: &mut ConsumerReceiver, seen: &mut Vec<ConsumerMessage>) {
    while let Ok(message) = rx.try_recv() {
        seen.push(message);
    }
}

/// Extracts the events from a message list.
pub fn events(seen: &[ConsumerMessage]) -> Vec<PlayerEvent> {
    seen.iter()
        .filter_map(|message| match message {
            ConsumerMessage::Event(event) => Some(*event),
            ConsumerMessage::InitDone => None,
        })
        .collect()
}
