// SPDX-License-Identifier: MPL-2.0
//! Decoder option string parsing.
//!
//! A source carries a free-form option string of `key=value` pairs separated
//! by semicolons or whitespace, e.g. `"rtsp_transport=tcp; amino_timeout_read=2000"`.
//! Keys prefixed with `amino_` are consumed by the player itself, all other
//! pairs are handed verbatim to the container/decoder option parser.

use std::time::Duration;

/// Overrides the URI-scheme realtime heuristic (`0`/`false` disable it).
pub const OPT_REALTIME: &str = "amino_realtime";
/// Open timeout in milliseconds.
pub const OPT_TIMEOUT_OPEN: &str = "amino_timeout_open";
/// Read timeout in milliseconds.
pub const OPT_TIMEOUT_READ: &str = "amino_timeout_read";
/// Any value enables a verbose container dump after open.
pub const OPT_DUMP_FORMAT: &str = "amino_dump_format";

const RESERVED_PREFIX: &str = "amino_";

/// URI schemes of live sources that must never be paced against timestamps.
const REALTIME_SCHEMES: &[&str] = &["rtsp://", "rtsps://", "rtmp://", "rtp://", "udp://", "srt://"];

/// Parsed decoder options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecoderOptions {
    pub realtime: Option<bool>,
    pub timeout_open: Option<Duration>,
    pub timeout_read: Option<Duration>,
    pub dump_format: bool,
    /// Pairs forwarded to the container, in source order.
    pub passthrough: Vec<(String, String)>,
    /// `amino_*` pairs whose value could not be interpreted.
    pub rejected: Vec<(String, String)>,
}

impl DecoderOptions {
    /// Parses an option string. Never fails; malformed reserved values end up in `rejected`.
    #[must_use]
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();

        for (key, value) in split_pairs(options) {
            match key {
                OPT_REALTIME => parsed.realtime = Some(parse_flag(value)),
                OPT_TIMEOUT_OPEN => match parse_millis(value) {
                    Some(timeout) => parsed.timeout_open = Some(timeout),
                    None => parsed.reject(key, value),
                },
                OPT_TIMEOUT_READ => match parse_millis(value) {
                    Some(timeout) => parsed.timeout_read = Some(timeout),
                    None => parsed.reject(key, value),
                },
                OPT_DUMP_FORMAT => parsed.dump_format = true,
                _ if key.starts_with(RESERVED_PREFIX) => parsed.reject(key, value),
                _ => parsed.set_passthrough(key, value),
            }
        }

        parsed
    }

    /// Decides whether `uri` is a realtime source.
    ///
    /// An explicit `amino_realtime` wins over the URI-scheme heuristic.
    #[must_use]
    pub fn is_realtime(&self, uri: &str) -> bool {
        self.realtime.unwrap_or_else(|| is_realtime_uri(uri))
    }

    fn reject(&mut self, key: &str, value: &str) {
        self.rejected.push((key.to_string(), value.to_string()));
    }

    // Later duplicates replace earlier ones, like `av_dict_set`.
    fn set_passthrough(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.passthrough.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.passthrough.push((key.to_string(), value.to_string()));
        }
    }
}

/// URI-scheme heuristic for live sources.
#[must_use]
pub fn is_realtime_uri(uri: &str) -> bool {
    let lower = uri.trim_start().to_ascii_lowercase();
    REALTIME_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Returns true if `uri` carries a URI scheme (`scheme://`).
#[must_use]
pub fn has_uri_scheme(uri: &str) -> bool {
    uri.contains("://")
}

fn split_pairs(options: &str) -> impl Iterator<Item = (&str, &str)> {
    options
        .split(|c: char| c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            let key = key.trim();
            (!key.is_empty()).then_some((key, value.trim()))
        })
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "0" | "false")
}

fn parse_millis(value: &str) -> Option<Duration> {
    value.parse::<u64>().ok().map(Duration::from_millis)
}
