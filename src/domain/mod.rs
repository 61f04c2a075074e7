// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core playback types with ZERO external dependencies.
//!
//! This module contains pure domain types, value objects, and business rules.
//! It has no dependencies on external crates (except `std`) to ensure
//! testability and architectural purity.
//!
//! # Modules
//!
//! - [`video`]: Video playback types ([`PlaybackState`](video::PlaybackState),
//!   [`LoopCount`](video::LoopCount), [`DecoderOptions`](video::DecoderOptions),
//!   [`PlayerEvent`](video::PlayerEvent), [`VideoSource`](video::VideoSource))

pub mod video;
