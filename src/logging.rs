// SPDX-License-Identifier: MPL-2.0
//! Tracing subscriber setup for hosts embedding the player.
//!
//! The library only emits `tracing` events. Hosts that do not install their own
//! subscriber can call [`init`] once at start-up.

use crate::config::PlayerConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` or the configured filter.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &PlayerConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective_filter(config)));

    fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(true)
        .try_init()
        .is_ok()
}

fn effective_filter(config: &PlayerConfig) -> String {
    if config.is_verbose() && config.log_filter.is_none() {
        "amino_video=debug".to_string()
    } else {
        config.log_filter().to_string()
    }
}
