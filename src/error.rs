// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    Video(VideoError),
}

/// Specific error types for video playback issues.
///
/// Every failure of the demuxer, the byte stream or the decode thread ends up
/// as one of these variants. The player maps all of them to a single terminal
/// `error` event.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoError {
    /// Bad URI or file, container open failure.
    OpenFailed(String),

    /// The container has no streams at all.
    NoStreams,

    /// The container has streams but none of them is a video.
    NoVideoStream,

    /// No decoder available for the codec.
    UnsupportedCodec(String),

    /// A decoder was found but could not be opened.
    CodecOpenFailed(String),

    /// Mid-stream demux, decode or conversion failure.
    DecodeError(String),

    /// An open or read call exceeded its deadline.
    Timeout,

    /// End of stream on the very first read.
    EmptyVideo,

    /// Local elementary stream file does not exist.
    FileNotFound(String),

    /// The packet source behind a byte stream could not be set up.
    DemuxerInitFailed(String),
}

impl VideoError {
    /// Returns a stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            VideoError::OpenFailed(_) => "open-failed",
            VideoError::NoStreams => "no-streams",
            VideoError::NoVideoStream => "no-video-stream",
            VideoError::UnsupportedCodec(_) => "unsupported-codec",
            VideoError::CodecOpenFailed(_) => "codec-open-failed",
            VideoError::DecodeError(_) => "decode-error",
            VideoError::Timeout => "timeout",
            VideoError::EmptyVideo => "empty-video",
            VideoError::FileNotFound(_) => "file-not-found",
            VideoError::DemuxerInitFailed(_) => "demuxer-init-failed",
        }
    }

    /// Maps an I/O timeout to the error reported for the phase it happened in.
    ///
    /// Timeouts during open surface as `OpenFailed`, timeouts while streaming
    /// as `DecodeError`.
    pub fn for_phase(self, opening: bool) -> Self {
        match self {
            VideoError::Timeout if opening => VideoError::OpenFailed("timeout".to_string()),
            VideoError::Timeout => VideoError::DecodeError("timeout".to_string()),
            other => other,
        }
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::OpenFailed(msg) => write!(f, "Could not open video: {}", msg),
            VideoError::NoStreams => write!(f, "Could not find streams"),
            VideoError::NoVideoStream => write!(f, "Not a video"),
            VideoError::UnsupportedCodec(codec) => write!(f, "Unsupported codec: {}", codec),
            VideoError::CodecOpenFailed(msg) => write!(f, "Could not open codec: {}", msg),
            VideoError::DecodeError(msg) => write!(f, "Decoding failed: {}", msg),
            VideoError::Timeout => write!(f, "Timeout"),
            VideoError::EmptyVideo => write!(f, "Empty video"),
            VideoError::FileNotFound(path) => write!(f, "File not found: {}", path),
            VideoError::DemuxerInitFailed(msg) => {
                write!(f, "Could not initialize demuxer: {}", msg)
            }
        }
    }
}

impl std::error::Error for VideoError {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Video(e) => write!(f, "Video Error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<VideoError> for Error {
    fn from(err: VideoError) -> Self {
        Error::Video(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<ffmpeg_next::Error> for VideoError {
    fn from(err: ffmpeg_next::Error) -> Self {
        match err {
            ffmpeg_next::Error::Exit => VideoError::Timeout,
            ffmpeg_next::Error::StreamNotFound => VideoError::NoVideoStream,
            ffmpeg_next::Error::DecoderNotFound => {
                VideoError::UnsupportedCodec("decoder not found".to_string())
            }
            other => VideoError::DecodeError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
