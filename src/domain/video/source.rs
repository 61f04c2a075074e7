// SPDX-License-Identifier: MPL-2.0
//! Playback source descriptor and stream properties.

use super::newtypes::LoopCount;
use std::sync::Arc;

/// What to play and how.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoSource {
    /// Local file path or URI.
    pub src: String,
    /// Decoder option string, see [`DecoderOptions`](super::DecoderOptions).
    pub opts: String,
    /// Replays after the first pass.
    pub loop_count: LoopCount,
}

impl VideoSource {
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_options(mut self, opts: impl Into<String>) -> Self {
        self.opts = opts.into();
        self
    }

    #[must_use]
    pub fn with_loop(mut self, loop_count: impl Into<LoopCount>) -> Self {
        self.loop_count = loop_count.into();
        self
    }
}

/// Reference-counted handle to a [`VideoSource`].
///
/// The host keeps one handle, every controller playing the source holds a
/// clone until it is dropped.
#[derive(Debug, Clone)]
pub struct VideoSourceHandle(Arc<VideoSource>);

impl VideoSourceHandle {
    #[must_use]
    pub fn new(source: VideoSource) -> Self {
        Self(Arc::new(source))
    }

    #[must_use]
    pub fn source(&self) -> &VideoSource {
        &self.0
    }

    /// Number of live handles, host included.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl From<VideoSource> for VideoSourceHandle {
    fn from(source: VideoSource) -> Self {
        Self::new(source)
    }
}

/// Properties of the selected video stream, known after open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second, 0 if unknown.
    pub fps: f64,
    /// Duration in seconds, -1 if unknown or live.
    pub duration_secs: f64,
    /// Live source that must not be paced.
    pub realtime: bool,
    pub is_h264: bool,
    pub is_hevc: bool,
}

impl StreamInfo {
    /// Size of one RGB24 frame in bytes.
    #[must_use]
    pub fn rgb_frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Returns true if both streams have the same geometry.
    #[must_use]
    pub fn same_geometry(&self, other: &StreamInfo) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns the duration, or `None` when unknown.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        (self.duration_secs >= 0.0).then_some(self.duration_secs)
    }
}
