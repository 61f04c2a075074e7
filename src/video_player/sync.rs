// SPDX-License-Identifier: MPL-2.0
//! Frame pacing and decode-thread synchronization.
//!
//! # Pacing Strategy
//!
//! Frames are paced against the wall clock: the frame with timestamp `pts`
//! is due at `start + (pts - first_pts)`. A pause shifts `start` forward by
//! the pause length so the media clock does not jump on resume. Realtime
//! sources are never paced, they are shown as soon as they are decoded.
//!
//! A wait longer than one frame interval means the timestamps jumped
//! forward. The clock then re-anchors so the frame is shown one interval
//! later and the frames after it keep their spacing from there.
//!
//! ```text
//!  first_pts          pts
//!     │────────────────│            media timeline
//!  start        now    due
//!     │──────────│─────│            wall clock
//!                 sleep
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Sleeps shorter than this are skipped.
pub const MIN_SLEEP: Duration = Duration::from_micros(500);

/// Longest wait for a single frame when the frame rate is unknown.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(1);

/// Longest wait for one frame of a stream running at `fps`.
#[must_use]
pub fn frame_interval(fps: f64) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps).max(MIN_SLEEP)
    } else {
        DEFAULT_MAX_WAIT
    }
}

/// Wall-clock reference for presenting frames on time.
///
/// Owned by the decode thread; all methods take the current instant so the
/// pacing arithmetic can be tested without sleeping.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    first_pts: f64,
    start: Instant,
    realtime: bool,
    paused_at: Option<Instant>,
    max_wait: Duration,
}

impl PlaybackClock {
    /// Starts a clock whose origin is the frame with timestamp `first_pts`.
    #[must_use]
    pub fn new(first_pts: f64, now: Instant, realtime: bool) -> Self {
        Self {
            first_pts,
            start: now,
            realtime,
            paused_at: None,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Bounds the wait for any one frame, usually to [`frame_interval`].
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait.max(MIN_SLEEP);
        self
    }

    /// Re-anchors the clock after a rewind.
    pub fn restart(&mut self, first_pts: f64, now: Instant) {
        self.first_pts = first_pts;
        self.start = now;
        self.paused_at = None;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Shifts the origin by the pause length and returns that length.
    pub fn resume(&mut self, now: Instant) -> Duration {
        let Some(paused_at) = self.paused_at.take() else {
            return Duration::ZERO;
        };
        let paused_for = now.saturating_duration_since(paused_at);
        self.start += paused_for;
        paused_for
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// How long to wait before presenting the frame with timestamp `pts`.
    ///
    /// `None` for realtime sources, late frames, and waits under [`MIN_SLEEP`].
    /// A wait over the maximum re-anchors the timeline so the frame is due
    /// exactly one maximum wait from `now`.
    pub fn sleep_for(&mut self, pts: f64, now: Instant) -> Option<Duration> {
        if self.realtime {
            return None;
        }
        let due = pts - self.first_pts;
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let mut wait = due - elapsed;
        if !wait.is_finite() || wait <= 0.0 {
            return None;
        }
        let max_wait = self.max_wait.as_secs_f64();
        if wait > max_wait {
            self.first_pts += wait - max_wait;
            wait = max_wait;
        }
        let wait = Duration::from_secs_f64(wait);
        (wait >= MIN_SLEEP).then_some(wait)
    }

    /// Seconds of playback since the clock origin, pauses excluded.
    #[must_use]
    pub fn media_time(&self, now: Instant) -> f64 {
        let reference = self.paused_at.unwrap_or(now);
        reference.saturating_duration_since(self.start).as_secs_f64()
    }
}

/// Media time published by the decode thread and read by the owner.
///
/// Stored as `f64` bits so reads are lock-free.
#[derive(Debug)]
pub struct SharedMediaTime(AtomicU64);

impl Default for SharedMediaTime {
    fn default() -> Self {
        Self(AtomicU64::new(0f64.to_bits()))
    }
}

impl SharedMediaTime {
    pub fn store(&self, secs: f64) {
        self.0.store(secs.to_bits(), Ordering::Release);
    }

    #[must_use]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

// =============================================================================
// Pause Gate
// =============================================================================

/// Binary gate the decode thread parks on while paused.
///
/// The decode thread arms the gate before it reports the pause, then waits.
/// Resume or stop releases it. Waiting also ends as soon as the stop flag is
/// set, so a stop can never be lost between arming and waiting.
#[derive(Debug, Default)]
pub struct PauseGate {
    released: Mutex<bool>,
    wake: Condvar,
}

impl PauseGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.released.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes the gate ahead of a [`wait`](Self::wait).
    pub fn arm(&self) {
        *self.lock() = false;
    }

    /// Opens the gate and wakes any waiter.
    pub fn release(&self) {
        *self.lock() = true;
        self.wake.notify_all();
    }

    /// Blocks until the gate is released or `stop` is set.
    pub fn wait(&self, stop: &AtomicBool) {
        let guard = self.lock();
        let _guard = self
            .wake
            .wait_while(guard, |released| {
                !*released && !stop.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Wakes a [`sleep`](Self::sleep) without opening the gate.
    pub fn interrupt(&self) {
        let _guard = self.lock();
        self.wake.notify_all();
    }

    /// Sleeps for `duration` unless `stop` or `pause` is set first.
    ///
    /// Returns false if the sleep was cut short.
    pub fn sleep(&self, duration: Duration, stop: &AtomicBool, pause: &AtomicBool) -> bool {
        let guard = self.lock();
        let (_guard, timeout) = self
            .wake
            .wait_timeout_while(guard, duration, |_| {
                !stop.load(Ordering::SeqCst) && !pause.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);
        timeout.timed_out()
    }
}
