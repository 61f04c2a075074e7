// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Timeouts**: Open and read deadlines for blocking container I/O
//! - **Decoding**: Decoder selection
//! - **Logging**: Default tracing filter

// ==========================================================================
// Timeout Defaults
// ==========================================================================

/// Default deadline for opening a source and probing its streams (in milliseconds).
pub const DEFAULT_OPEN_TIMEOUT_MS: u64 = 10_000;

/// Default deadline for a single packet read (in milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// Smallest accepted timeout (in milliseconds).
pub const MIN_TIMEOUT_MS: u64 = 10;

/// Largest accepted timeout (in milliseconds).
pub const MAX_TIMEOUT_MS: u64 = 600_000;

// ==========================================================================
// Decoding Defaults
// ==========================================================================

/// Whether platform hardware decoders are tried before the generic decoder.
pub const DEFAULT_PREFER_HARDWARE_DECODER: bool = true;

// ==========================================================================
// Logging Defaults
// ==========================================================================

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "amino_video=info";
