// SPDX-License-Identifier: MPL-2.0
//! Playback controller: owns the decoder, runs the decode thread, reports
//! lifecycle events.
//!
//! # Threads
//!
//! ```text
//! owner thread                decode thread                 render thread
//! ────────────                ─────────────                 ─────────────
//! init() ── open ──▶ spawn ─▶ first frame, publish
//!                             loaded: loadedmetadata,playing
//! pause()  ── do_pause ────▶  park on gate ─ paused
//! resume() ── release ─────▶  wake ─ play
//! stop()   ── do_stop ─────▶  exit ─ stop                    with_current()
//! drop     ── join ◀───────── returns decoder                (never blocks
//!             free under hand-off lock                        on decoding)
//! ```
//!
//! The decoder moves into the decode thread and comes back through the join
//! handle, so it is owned by exactly one thread at any time.

use super::frame_buffer::FrameBuffer;
use super::state::{Notifications, PlayerStatus};
use super::sync::{frame_interval, PauseGate, PlaybackClock, SharedMediaTime};
use crate::application::port::{FrameDecoder, FrameRead, VideoConsumer};
use crate::domain::video::{
    LoopCount, PlaybackState, StreamInfo, VideoSource, VideoSourceHandle,
};
use crate::error::VideoError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Name given to decode threads.
pub const DECODE_THREAD_NAME: &str = "amino-video-decode";

/// State shared between the controller and its decode thread.
struct Shared {
    consumer: Arc<dyn VideoConsumer>,
    status: Mutex<PlayerStatus>,
    do_stop: AtomicBool,
    do_pause: AtomicBool,
    gate: PauseGate,
    media_time: SharedMediaTime,
}

impl Shared {
    fn new(consumer: Arc<dyn VideoConsumer>) -> Self {
        Self {
            consumer,
            status: Mutex::new(PlayerStatus::new()),
            do_stop: AtomicBool::new(false),
            do_pause: AtomicBool::new(false),
            gate: PauseGate::new(),
            media_time: SharedMediaTime::default(),
        }
    }

    fn status(&self) -> MutexGuard<'_, PlayerStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a transition, then notifies the consumer outside the lock.
    fn transition(&self, apply: impl FnOnce(&mut PlayerStatus) -> Notifications) {
        let notifications = apply(&mut self.status());
        if notifications.init_done {
            self.consumer.video_player_init_done();
        }
        for event in notifications.events {
            debug!(%event, "video event");
            self.consumer.fire_video_event(event);
        }
    }

    fn stop_requested(&self) -> bool {
        self.do_stop.load(Ordering::SeqCst)
    }

    fn request_stop(&self) {
        self.do_stop.store(true, Ordering::SeqCst);
        self.gate.release();
    }
}

/// Drives one video from open to teardown.
///
/// Generic over the decoding backend so the state machine can run against
/// FFmpeg or an in-memory decoder.
pub struct PlaybackController<D: FrameDecoder + 'static> {
    shared: Arc<Shared>,
    handle: VideoSourceHandle,
    source: Option<VideoSource>,
    decoder: Option<D>,
    decode_thread: Option<JoinHandle<D>>,
    frame_buffer: Arc<FrameBuffer>,
    info: Option<StreamInfo>,
    closed: bool,
}

impl<D: FrameDecoder + 'static> PlaybackController<D> {
    /// Creates a controller in the `Loading` state. Nothing is opened yet.
    pub fn new(decoder: D, handle: VideoSourceHandle, consumer: Arc<dyn VideoConsumer>) -> Self {
        let frame_buffer = decoder.frame_buffer();
        Self {
            shared: Arc::new(Shared::new(consumer)),
            handle,
            source: None,
            decoder: Some(decoder),
            decode_thread: None,
            frame_buffer,
            info: None,
            closed: false,
        }
    }

    /// Snapshots source, options and loop count from the source handle.
    ///
    /// Later changes to the handle's source do not affect this controller.
    pub fn init_stream(&mut self) -> &VideoSource {
        let handle = &self.handle;
        self.source
            .get_or_insert_with(|| handle.source().clone())
    }

    /// Opens the source and starts the decode thread.
    ///
    /// Runs [`init_stream`](Self::init_stream) first if it was not called.
    /// On failure the controller ends in `Failed` and the consumer receives
    /// init-done followed by a single `error` event.
    ///
    /// # Errors
    ///
    /// Returns the open failure, or `DemuxerInitFailed` if the controller was
    /// already closed or the thread could not be spawned.
    pub fn init(&mut self) -> Result<(), VideoError> {
        if self.decode_thread.is_some() {
            return Ok(());
        }
        if self.shared.status().is_init_done() {
            return Err(self.last_error().unwrap_or_else(|| {
                VideoError::DemuxerInitFailed("player already initialized".to_string())
            }));
        }
        let source = self.init_stream().clone();
        let Some(mut decoder) = self.decoder.take() else {
            return Err(VideoError::DemuxerInitFailed(
                "player already closed".to_string(),
            ));
        };

        info!(src = %source.src, loop_count = source.loop_count.value(), "opening video");
        let info = match decoder.open(&source) {
            Ok(info) => info,
            Err(err) => {
                let err = err.for_phase(true);
                warn!(src = %source.src, error = %err, "failed to open video");
                self.decoder = Some(decoder);
                self.shared.transition(|status| status.load_failed(err.clone()));
                return Err(err);
            }
        };
        debug!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            duration = info.duration_secs,
            realtime = info.realtime,
            "video opened"
        );
        self.info = Some(info);

        let shared = Arc::clone(&self.shared);
        let loops = source.loop_count;
        let spawned = thread::Builder::new()
            .name(DECODE_THREAD_NAME.to_string())
            .spawn(move || run_decode_loop(decoder, &shared, info, loops));

        match spawned {
            Ok(handle) => {
                self.decode_thread = Some(handle);
                Ok(())
            }
            Err(err) => {
                let err = VideoError::DemuxerInitFailed(err.to_string());
                error!(error = %err, "failed to spawn decode thread");
                self.shared.transition(|status| status.load_failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Asks the decode thread to stop. No-op unless playing or paused.
    pub fn stop(&self) {
        if !self.state().is_active() {
            return;
        }
        debug!("stop requested");
        self.shared.request_stop();
    }

    /// Asks the decode thread to pause. No-op unless playing.
    pub fn pause(&self) {
        if !self.is_playing() {
            return;
        }
        debug!("pause requested");
        self.shared.do_pause.store(true, Ordering::SeqCst);
        self.shared.gate.interrupt();
    }

    /// Wakes a paused decode thread. No-op unless paused.
    pub fn resume(&self) {
        if !self.is_paused() {
            return;
        }
        debug!("resume requested");
        self.shared.gate.release();
    }

    /// Stops the decode thread, joins it and frees the decoder.
    ///
    /// The decoder is closed and the published frame dropped under the
    /// hand-off lock, so a render thread inside
    /// [`FrameBuffer::with_current`] finishes first. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.shared.request_stop();

        if let Some(handle) = self.decode_thread.take() {
            match handle.join() {
                Ok(decoder) => self.decoder = Some(decoder),
                Err(_) => error!("decode thread panicked"),
            }
        }

        let decoder = self.decoder.take();
        self.frame_buffer.release_with(move || {
            if let Some(mut decoder) = decoder {
                decoder.close(false);
            }
        });
        debug!("video player closed");
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.shared.status().state()
    }

    /// True once the first frame is published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.status().is_ready()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    /// First error that ended playback.
    #[must_use]
    pub fn last_error(&self) -> Option<VideoError> {
        self.shared.status().last_error().cloned()
    }

    /// Width and height once the source is open.
    #[must_use]
    pub fn video_dimension(&self) -> Option<(u32, u32)> {
        self.info.map(|info| (info.width, info.height))
    }

    /// Duration in seconds, -1 when unknown.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.info.map_or(-1.0, |info| info.duration_secs)
    }

    /// Frames per second, 0 when unknown.
    #[must_use]
    pub fn framerate(&self) -> f64 {
        self.info.map_or(0.0, |info| info.fps)
    }

    /// Seconds played since the last (re)start, -1 unless playing or paused.
    #[must_use]
    pub fn media_time(&self) -> f64 {
        if self.state().is_active() {
            self.shared.media_time.load()
        } else {
            -1.0
        }
    }

    /// Hand-off buffer the render thread reads from.
    #[must_use]
    pub fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    #[must_use]
    pub fn source(&self) -> &VideoSourceHandle {
        &self.handle
    }
}

impl<D: FrameDecoder + 'static> Drop for PlaybackController<D> {
    fn drop(&mut self) {
        self.shared.status().destroy();
        self.close();
    }
}

// =============================================================================
// Decode Thread
// =============================================================================

/// Body of the decode thread. Returns the decoder for teardown.
fn run_decode_loop<D: FrameDecoder>(
    mut decoder: D,
    shared: &Shared,
    info: StreamInfo,
    mut loops: LoopCount,
) -> D {
    let first_pts = match decoder.read_decoded_frame() {
        Ok(FrameRead::Frame { pts_secs }) => pts_secs,
        Ok(FrameRead::EndOfStream) => {
            warn!("video has no frames");
            shared.transition(|status| status.load_failed(VideoError::EmptyVideo));
            return decoder;
        }
        Err(err) => {
            let err = err.for_phase(true);
            warn!(error = %err, "failed to read first frame");
            shared.transition(|status| status.load_failed(err.clone()));
            return decoder;
        }
    };

    decoder.switch_frame();
    let mut clock = PlaybackClock::new(first_pts, Instant::now(), info.realtime)
        .with_max_wait(frame_interval(info.fps));
    shared.transition(PlayerStatus::loaded);

    loop {
        if shared.stop_requested() {
            debug!("decode thread stopping");
            shared.transition(PlayerStatus::stopped);
            break;
        }

        if shared.do_pause.load(Ordering::SeqCst) {
            park(&mut decoder, shared, &mut clock);
            continue;
        }

        let pts = match decoder.read_decoded_frame() {
            Ok(FrameRead::Frame { pts_secs }) => pts_secs,
            Ok(FrameRead::EndOfStream) => {
                if !loops.consume() {
                    debug!("end of video");
                    shared.transition(PlayerStatus::ended);
                    break;
                }
                match decoder.rewind_decoder() {
                    Ok(pts_secs) => {
                        debug!(remaining = loops.value(), "video rewound");
                        clock.restart(pts_secs, Instant::now());
                        shared.transition(PlayerStatus::rewound);
                        pts_secs
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to rewind video");
                        shared.transition(|status| status.failed(err.clone()));
                        break;
                    }
                }
            }
            Err(err) => {
                let err = err.for_phase(false);
                warn!(error = %err, "failed to read frame");
                shared.transition(|status| status.failed(err.clone()));
                break;
            }
        };

        // A pause during pacing keeps the decoded frame; it is shown once
        // the remaining wait has passed after resume.
        while let Some(wait) = clock.sleep_for(pts, Instant::now()) {
            trace!(wait_ms = wait.as_millis(), pts, "pacing frame");
            if shared.gate.sleep(wait, &shared.do_stop, &shared.do_pause)
                || shared.stop_requested()
            {
                break;
            }
            park(&mut decoder, shared, &mut clock);
        }
        if shared.stop_requested() {
            continue;
        }

        decoder.switch_frame();
        shared.media_time.store(clock.media_time(Instant::now()));
    }

    decoder
}

/// Parks the decode thread until resume or stop.
fn park<D: FrameDecoder>(decoder: &mut D, shared: &Shared, clock: &mut PlaybackClock) {
    shared.gate.arm();
    decoder.pause();
    clock.pause(Instant::now());
    shared.transition(PlayerStatus::paused);

    shared.gate.wait(&shared.do_stop);
    shared.do_pause.store(false, Ordering::SeqCst);

    if !shared.stop_requested() {
        decoder.resume();
        let paused_for = clock.resume(Instant::now());
        debug!(paused_ms = paused_for.as_millis(), "playback resumed");
        shared.transition(PlayerStatus::resumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::video::PlayerEvent;
    use crate::test_utils::{
        drain, events, wait_for_event, DecoderLog, Script, ScriptedDecoder,
    };
    use crate::video_player::{ChannelConsumer, ConsumerMessage, ConsumerReceiver};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn controller(
        script: Script,
        source: VideoSource,
    ) -> (
        PlaybackController<ScriptedDecoder>,
        ConsumerReceiver,
        Arc<Mutex<DecoderLog>>,
    ) {
        let (decoder, log) = ScriptedDecoder::new(script);
        let (consumer, rx) = ChannelConsumer::new();
        let controller = PlaybackController::new(
            decoder,
            VideoSourceHandle::new(source),
            Arc::new(consumer),
        );
        (controller, rx, log)
    }

    fn snapshot(log: &Arc<Mutex<DecoderLog>>) -> DecoderLog {
        log.lock().unwrap().clone()
    }

    #[test]
    fn short_clip_plays_to_end() {
        let (mut player, mut rx, log) =
            controller(Script::frames(3, 0.01), VideoSource::new("clip.mp4"));

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Ended, WAIT));

        assert_eq!(seen[0], ConsumerMessage::InitDone);
        assert_eq!(
            events(&seen),
            [
                PlayerEvent::LoadedMetadata,
                PlayerEvent::Playing,
                PlayerEvent::Ended
            ]
        );
        assert_eq!(player.state(), PlaybackState::Ended);
        assert!(player.is_ready());
        assert_eq!(snapshot(&log).switches, 3);
        assert_eq!(player.frame_buffer().current_frame_id().value(), 3);
    }

    #[test]
    fn loop_count_gives_that_many_replays() {
        let source = VideoSource::new("clip.mp4").with_loop(2);
        let (mut player, mut rx, log) = controller(Script::frames(3, 0.0), source);

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Ended, WAIT));

        let rewinds = events(&seen)
            .iter()
            .filter(|event| **event == PlayerEvent::Rewind)
            .count();
        assert_eq!(rewinds, 2);

        let log = snapshot(&log);
        assert_eq!(log.rewinds, 2);
        assert_eq!(log.switches, 9);
    }

    #[test]
    fn infinite_loop_runs_until_stopped() {
        let source = VideoSource::new("clip.mp4").with_loop(true);
        let (mut player, mut rx, _log) = controller(Script::frames(2, 0.0), source);

        player.init().unwrap();
        let mut seen = Vec::new();
        for _ in 0..3 {
            assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Rewind, WAIT));
        }

        player.stop();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Stop, WAIT));
        assert!(!events(&seen).contains(&PlayerEvent::Ended));
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn pause_holds_frames_and_resume_continues() {
        let (mut player, mut rx, log) =
            controller(Script::frames(500, 0.01), VideoSource::new("clip.mp4"));
        let buffer = player.frame_buffer();

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));

        player.pause();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Paused, WAIT));
        assert!(player.is_paused());

        let held = buffer.current_frame_id();
        let held_time = player.media_time();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(buffer.current_frame_id(), held);
        assert_eq!(player.media_time(), held_time);

        player.resume();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Play, WAIT));
        std::thread::sleep(Duration::from_millis(60));
        assert!(buffer.current_frame_id() > held);

        player.stop();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Stop, WAIT));

        let log = snapshot(&log);
        assert_eq!(log.pauses, 1);
        assert_eq!(log.resumes, 1);
    }

    #[test]
    fn pause_interrupts_a_pacing_wait_and_keeps_the_frame() {
        let (mut player, mut rx, log) =
            controller(Script::frames(3, 1.0), VideoSource::new("clip.mp4"));

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));
        std::thread::sleep(Duration::from_millis(50));

        let requested = Instant::now();
        player.pause();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Paused, WAIT));
        assert!(requested.elapsed() < Duration::from_millis(500));
        assert_eq!(snapshot(&log).switches, 1);

        player.resume();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Ended, WAIT));
        assert_eq!(snapshot(&log).switches, 3);
    }

    #[test]
    fn timestamp_jump_waits_one_frame_interval() {
        let mut script = Script::frames(4, 0.04);
        script.frames = vec![0.0, 0.04, 3600.0, 3600.04];
        let (mut player, mut rx, log) = controller(script, VideoSource::new("clip.mp4"));

        let started = Instant::now();
        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Ended, WAIT));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(snapshot(&log).switches, 4);
    }

    #[test]
    fn stop_while_paused_exits_without_ended() {
        let (mut player, mut rx, log) =
            controller(Script::frames(500, 0.01), VideoSource::new("clip.mp4"));

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));

        player.pause();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Paused, WAIT));
        player.stop();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Stop, WAIT));

        drop(player);
        drain(&mut rx, &mut seen);

        let fired = events(&seen);
        assert!(!fired.contains(&PlayerEvent::Ended));
        assert!(!fired.contains(&PlayerEvent::Play));
        assert_eq!(snapshot(&log).resumes, 0);
        assert!(snapshot(&log).closed);
    }

    #[test]
    fn controls_are_ignored_in_wrong_state() {
        let (mut player, mut rx, _log) =
            controller(Script::frames(500, 0.01), VideoSource::new("clip.mp4"));

        // Nothing started yet.
        player.stop();
        player.pause();
        player.resume();
        assert_eq!(player.state(), PlaybackState::Loading);

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));

        // Resume while playing does nothing.
        player.resume();
        std::thread::sleep(Duration::from_millis(20));
        drain(&mut rx, &mut seen);
        assert!(!events(&seen).contains(&PlayerEvent::Play));
        assert!(player.is_playing());
    }

    #[test]
    fn empty_video_fails_during_loading() {
        let (mut player, mut rx, _log) =
            controller(Script::frames(0, 0.04), VideoSource::new("empty.mp4"));

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Error, WAIT));

        assert_eq!(seen, [
            ConsumerMessage::InitDone,
            ConsumerMessage::Event(PlayerEvent::Error)
        ]);
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(player.last_error(), Some(VideoError::EmptyVideo));
        assert!(!player.is_ready());
    }

    #[test]
    fn open_failure_reports_error_without_thread() {
        let mut script = Script::frames(3, 0.04);
        script.open_error = Some(VideoError::Timeout);
        let (mut player, mut rx, _log) = controller(script, VideoSource::new("rtsp://cam"));

        let err = player.init().unwrap_err();
        assert!(matches!(err, VideoError::OpenFailed(_)));
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(player.video_dimension(), None);
        assert_eq!(player.duration(), -1.0);

        let mut seen = Vec::new();
        drain(&mut rx, &mut seen);
        assert_eq!(seen, [
            ConsumerMessage::InitDone,
            ConsumerMessage::Event(PlayerEvent::Error)
        ]);
    }

    #[test]
    fn init_after_open_failure_does_not_reopen() {
        let mut script = Script::frames(3, 0.04);
        script.open_error = Some(VideoError::FileNotFound("gone.mp4".into()));
        let (mut player, mut rx, log) = controller(script, VideoSource::new("gone.mp4"));

        let first = player.init().unwrap_err();
        let second = player.init().unwrap_err();
        assert_eq!(first, second);
        assert_eq!(snapshot(&log).opens, 1);
        assert_eq!(player.state(), PlaybackState::Failed);

        let mut seen = Vec::new();
        drain(&mut rx, &mut seen);
        assert_eq!(seen, [
            ConsumerMessage::InitDone,
            ConsumerMessage::Event(PlayerEvent::Error)
        ]);
    }

    #[test]
    fn read_error_fails_once() {
        let mut script = Script::frames(10, 0.0);
        script.read_error_at = Some(4);
        let (mut player, mut rx, _log) = controller(script, VideoSource::new("clip.mp4"));

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Error, WAIT));
        player.close();
        drain(&mut rx, &mut seen);

        let fired = events(&seen);
        assert_eq!(
            fired.iter().filter(|e| **e == PlayerEvent::Error).count(),
            1
        );
        assert!(!fired.contains(&PlayerEvent::Ended));
        assert!(matches!(
            player.last_error(),
            Some(VideoError::DecodeError(_))
        ));
    }

    #[test]
    fn rewind_failure_is_fatal() {
        let mut script = Script::frames(2, 0.0);
        script.rewind_error = Some(VideoError::DecodeError("geometry changed".into()));
        let source = VideoSource::new("clip.mp4").with_loop(true);
        let (mut player, mut rx, _log) = controller(script, source);

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Error, WAIT));
        assert!(!events(&seen).contains(&PlayerEvent::Rewind));
        assert_eq!(player.state(), PlaybackState::Failed);
    }

    #[test]
    fn realtime_source_is_not_paced() {
        let mut script = Script::frames(3, 10.0);
        script.info.realtime = true;
        let (mut player, mut rx, _log) = controller(script, VideoSource::new("rtsp://cam"));

        let started = Instant::now();
        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Ended, WAIT));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn queries_reflect_stream_info() {
        let (mut player, mut rx, _log) =
            controller(Script::frames(500, 0.01), VideoSource::new("clip.mp4"));
        assert_eq!(player.media_time(), -1.0);
        assert_eq!(player.framerate(), 0.0);

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));

        assert_eq!(player.video_dimension(), Some((4, 4)));
        assert!((player.duration() - 5.0).abs() < 1e-9);
        assert!((player.framerate() - 100.0).abs() < 1e-9);
        assert!(player.media_time() >= 0.0);
        assert_eq!(player.state().as_str(), "playing");
    }

    #[test]
    fn init_stream_snapshots_the_source() {
        let source = VideoSource::new("clip.mp4")
            .with_options("amino_realtime=0")
            .with_loop(3);
        let (mut player, _rx, _log) = controller(Script::frames(1, 0.0), source.clone());

        assert_eq!(player.init_stream(), &source);
        assert_eq!(player.source().ref_count(), 1);
    }

    #[test]
    fn drop_while_playing_joins_and_frees() {
        let (mut player, mut rx, log) =
            controller(Script::frames(5_000, 0.01), VideoSource::new("clip.mp4"));
        let buffer = player.frame_buffer();

        player.init().unwrap();
        let mut seen = Vec::new();
        assert!(wait_for_event(&mut rx, &mut seen, PlayerEvent::Playing, WAIT));

        let started = Instant::now();
        drop(player);
        assert!(started.elapsed() < Duration::from_secs(1));

        assert!(snapshot(&log).closed);
        assert!(!buffer.has_frame());

        // Destroyed players stay silent.
        drain(&mut rx, &mut seen);
        assert!(!events(&seen).contains(&PlayerEvent::Stop));
    }

    #[test]
    fn close_is_idempotent_and_blocks_reinit() {
        let (mut player, _rx, _log) =
            controller(Script::frames(3, 0.0), VideoSource::new("clip.mp4"));
        player.close();
        player.close();
        assert!(matches!(
            player.init(),
            Err(VideoError::DemuxerInitFailed(_))
        ));
    }

    #[test]
    fn render_thread_sees_whole_frames_in_order() {
        let (mut player, mut rx, _log) =
            controller(Script::frames(200, 0.0), VideoSource::new("clip.mp4"));
        let buffer = player.frame_buffer();

        player.init().unwrap();

        let mut last = crate::domain::video::FrameId::NONE;
        let mut seen = Vec::new();
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if let Some(id) = buffer.with_current(|frame| {
                let first = frame.data[0];
                assert!(frame.data.iter().all(|&b| b == first));
                frame.frame_id
            }) {
                assert!(id >= last);
                last = id;
            }
            drain(&mut rx, &mut seen);
            if events(&seen).contains(&PlayerEvent::Ended) {
                break;
            }
        }
        assert!(events(&seen).contains(&PlayerEvent::Ended));
        assert_eq!(buffer.current_frame_id().value(), 200);
    }
}
