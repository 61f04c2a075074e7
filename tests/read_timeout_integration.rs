// SPDX-License-Identifier: MPL-2.0
//! Read deadlines against a server that stops sending mid-stream.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use amino_video::application::port::PacketRead;
use amino_video::config::PlayerConfig;
use amino_video::domain::video::{PlaybackState, PlayerEvent, VideoSource, VideoSourceHandle};
use amino_video::error::VideoError;
use amino_video::infrastructure::ffmpeg::Demuxer;
use amino_video::video_player::{create_player, ChannelConsumer, ConsumerMessage};
use common::{drain, events, wait_for, write_clip, y4m_bytes, StallingServer};

/// Frames served before the connection goes quiet.
const SERVED_FRAMES: usize = 20;
const READ_TIMEOUT: Duration = Duration::from_millis(300);
const STALL_OPTIONS: &str =
    "amino_timeout_open=5000;amino_timeout_read=300;amino_realtime=1;probesize=4096";

fn stalling_clip() -> StallingServer {
    StallingServer::start("stall.y4m", y4m_bytes(16, 16, 10, SERVED_FRAMES))
}

#[test]
fn stalled_read_times_out_within_bound() {
    let server = stalling_clip();
    let source = VideoSource::new(server.url()).with_options(STALL_OPTIONS);

    let mut demuxer = Demuxer::new(&PlayerConfig::default());
    demuxer.load(&source).unwrap();
    assert_eq!(demuxer.read_timeout(), READ_TIMEOUT);

    let mut packets = 0;
    let (err, elapsed) = loop {
        let started = Instant::now();
        match demuxer.read_compressed_packet() {
            Ok(PacketRead::Packet(_)) => packets += 1,
            Ok(PacketRead::EndOfStream) => panic!("stream ended instead of stalling"),
            Err(err) => break (err, started.elapsed()),
        }
        assert!(packets <= SERVED_FRAMES, "read past the served frames");
    };

    assert_eq!(err, VideoError::Timeout);
    assert!(packets >= 1);
    assert!(elapsed >= Duration::from_millis(250), "gave up early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2_300), "timeout overshot: {elapsed:?}");
}

#[test]
fn stalled_playback_fails_once_with_decode_timeout() {
    let server = stalling_clip();
    let source = VideoSource::new(server.url()).with_options(STALL_OPTIONS);
    let (consumer, mut rx) = ChannelConsumer::new();
    let mut player = create_player(
        VideoSourceHandle::new(source),
        Arc::new(consumer),
        &PlayerConfig::default(),
    );

    player.init().unwrap();
    let mut seen = Vec::new();
    assert!(wait_for(&mut rx, &mut seen, PlayerEvent::Error, Duration::from_secs(10)));
    player.close();
    drain(&mut rx, &mut seen);

    assert_eq!(seen[0], ConsumerMessage::InitDone);
    let fired = events(&seen);
    assert_eq!(fired.iter().filter(|e| **e == PlayerEvent::Error).count(), 1);
    assert!(fired.contains(&PlayerEvent::Playing));
    assert!(!fired.contains(&PlayerEvent::Ended));
    assert_eq!(player.state(), PlaybackState::Failed);
    assert_eq!(
        player.last_error(),
        Some(VideoError::DecodeError("timeout".to_string()))
    );
}

#[test]
fn read_timeout_override_applies_to_one_load() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_clip(dir.path(), "first.y4m", 16, 16, 10, 2);
    let second = write_clip(dir.path(), "second.y4m", 16, 16, 10, 2);
    let config = PlayerConfig::default();

    let mut demuxer = Demuxer::new(&config);
    demuxer
        .load(&VideoSource::new(first.to_string_lossy()).with_options("amino_timeout_read=250"))
        .unwrap();
    assert_eq!(demuxer.read_timeout(), Duration::from_millis(250));

    demuxer.load(&VideoSource::new(second.to_string_lossy())).unwrap();
    assert_eq!(demuxer.read_timeout(), config.read_timeout());
}
