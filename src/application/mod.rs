// SPDX-License-Identifier: MPL-2.0
//! Application layer - Ports between the playback engine and its collaborators.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The playback engine (`video_player`) drives the ports
//!
//! # Example
//!
//! ```ignore
//! use amino_video::application::port::FrameDecoder;
//!
//! // Infrastructure implements the port trait
//! struct FfmpegDemuxer { /* ... */ }
//! impl FrameDecoder for FfmpegDemuxer { /* ... */ }
//! ```

pub mod port;
