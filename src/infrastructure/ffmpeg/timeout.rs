// SPDX-License-Identifier: MPL-2.0
//! Deadline polled by FFmpeg's interrupt callback.
//!
//! FFmpeg calls the callback periodically inside blocking open and read
//! calls; a non-zero return aborts the call with `AVERROR_EXIT`. Each
//! [`Demuxer`](super::Demuxer) owns one boxed [`Deadline`] and hands its
//! address to the format context as the callback's opaque pointer, so no
//! global state is involved.

use std::ffi::{c_int, c_void};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Reference instant for storing deadlines as atomic microseconds.
static REFERENCE_INSTANT: OnceLock<Instant> = OnceLock::new();

/// Sentinel for "no deadline armed".
const DISARMED: u64 = u64::MAX;

#[allow(clippy::cast_possible_truncation)] // u64 microseconds cover ~584k years
fn instant_to_us(instant: Instant) -> u64 {
    let reference = REFERENCE_INSTANT.get_or_init(Instant::now);
    instant.saturating_duration_since(*reference).as_micros() as u64
}

/// Point in time after which blocking FFmpeg I/O is aborted.
#[derive(Debug)]
pub struct Deadline {
    expires_at_us: AtomicU64,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new()
    }
}

impl Deadline {
    /// Creates a disarmed deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expires_at_us: AtomicU64::new(DISARMED),
        }
    }

    /// Sets the deadline to `now + timeout`.
    pub fn arm(&self, timeout: Duration) {
        self.arm_at(Instant::now(), timeout);
    }

    /// Sets the deadline to `now + timeout` for an explicit `now`.
    pub fn arm_at(&self, now: Instant, timeout: Duration) {
        let expires = instant_to_us(now).saturating_add(
            u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX),
        );
        self.expires_at_us
            .store(expires.min(DISARMED - 1), Ordering::Release);
    }

    /// Removes the deadline; calls are no longer interrupted.
    pub fn disarm(&self) {
        self.expires_at_us.store(DISARMED, Ordering::Release);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.expires_at_us.load(Ordering::Acquire) != DISARMED
    }

    /// Returns true if armed and `now` is past the deadline.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        let expires = self.expires_at_us.load(Ordering::Acquire);
        expires != DISARMED && instant_to_us(now) > expires
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Opaque pointer handed to FFmpeg alongside [`interrupt_callback`].
    pub(crate) fn as_opaque(&self) -> *mut c_void {
        std::ptr::from_ref(self).cast_mut().cast()
    }
}

/// FFmpeg interrupt callback. `opaque` must point to a live [`Deadline`].
pub(crate) unsafe extern "C" fn interrupt_callback(opaque: *mut c_void) -> c_int {
    if opaque.is_null() {
        return 0;
    }
    // SAFETY: the demuxer sets `opaque` to its boxed deadline and closes the
    // format context before dropping that box.
    let deadline = unsafe { &*(opaque as *const Deadline) };
    c_int::from(deadline.is_expired())
}
