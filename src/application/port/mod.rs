// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters and
//! host applications implement.
//!
//! # Available Ports
//!
//! - [`video`]: Decoding backends ([`FrameDecoder`]) and compressed packet
//!   sources ([`PacketSource`])
//! - [`consumer`]: The host side receiving lifecycle events ([`VideoConsumer`])
//!   and decoded pixels ([`TextureTarget`])
//!
//! # Design Notes
//!
//! - No FFmpeg types cross these traits
//! - Decoders are `Send`, they move into the decode thread
//! - Consumers are `Send + Sync`, the decode thread calls them

pub mod consumer;
pub mod video;

pub use consumer::{TextureTarget, VideoConsumer};
pub use video::{EncodedPacket, FrameDecoder, FrameRead, PacketRead, PacketSource};
