// SPDX-License-Identifier: MPL-2.0
//! Shared helpers for the FFmpeg-backed integration tests.
//!
//! Clips are synthesized as YUV4MPEG2 files so no fixtures are needed: the
//! format is plain text headers followed by raw planar frames.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use amino_video::domain::video::{FrameId, PlayerEvent};
use amino_video::video_player::{ConsumerMessage, ConsumerReceiver, FrameBuffer};
use tokio::sync::mpsc::error::TryRecvError;

/// Builds a YUV 4:2:0 clip whose luma plane changes on every frame.
pub fn y4m_bytes(width: u32, height: u32, fps: u32, frames: usize) -> Vec<u8> {
    let luma = (width * height) as usize;
    let chroma = luma / 4;
    let mut out = format!("YUV4MPEG2 W{width} H{height} F{fps}:1 Ip A1:1 C420jpeg\n").into_bytes();
    for index in 0..frames {
        out.extend_from_slice(b"FRAME\n");
        let level = 16 + u8::try_from((index * 37) % 200).unwrap_or(0);
        out.extend(std::iter::repeat(level).take(luma));
        out.extend(std::iter::repeat(128u8).take(chroma * 2));
    }
    out
}

/// Writes a clip into `dir` and returns its path.
pub fn write_clip(dir: &Path, name: &str, width: u32, height: u32, fps: u32, frames: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, y4m_bytes(width, height, fps, frames)).expect("write clip");
    path
}

/// Atomically replaces `path` with a clip of another geometry.
///
/// The old inode stays readable through already open handles.
pub fn replace_clip(path: &Path, width: u32, height: u32, fps: u32, frames: usize) -> io::Result<()> {
    let staging = path.with_extension("staging");
    fs::write(&staging, y4m_bytes(width, height, fps, frames))?;
    fs::rename(staging, path)
}

/// Polls the channel until a message arrives or `timeout` elapses.
pub fn next_message(rx: &mut ConsumerReceiver, timeout: Duration) -> Option<ConsumerMessage> {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.try_recv() {
            Ok(message) => return Some(message),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) if Instant::now() >= deadline => return None,
            Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(2)),
        }
    }
}

/// Records messages until `target` shows up. Returns false on timeout.
pub fn wait_for(
    rx: &mut ConsumerReceiver,
    seen: &mut Vec<ConsumerMessage>,
    target: PlayerEvent,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match next_message(rx, left) {
            Some(message) => {
                seen.push(message);
                if message == ConsumerMessage::Event(target) {
                    return true;
                }
            }
            None => return false,
        }
    }
}

/// Collects everything still queued.
pub fn drain(rx: &mut ConsumerReceiver, seen: &mut Vec<ConsumerMessage>) {
    while let Ok(message) = rx.try_recv() {
        seen.push(message);
    }
}

pub fn events(seen: &[ConsumerMessage]) -> Vec<PlayerEvent> {
    seen.iter()
        .filter_map(|message| match message {
            ConsumerMessage::Event(event) => Some(*event),
            ConsumerMessage::InitDone => None,
        })
        .collect()
}

/// Samples the published frame id from a render-like thread.
pub struct PublishWatcher {
    stop: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<(FrameId, Instant)>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PublishWatcher {
    pub fn start(buffer: Arc<FrameBuffer>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let samples = Arc::new(Mutex::new(Vec::new()));
        let handle = {
            let stop = Arc::clone(&stop);
            let samples = Arc::clone(&samples);
            thread::spawn(move || {
                let mut last = FrameId::NONE;
                while !stop.load(Ordering::Acquire) {
                    let id = buffer.current_frame_id();
                    if id != last {
                        samples.lock().unwrap().push((id, Instant::now()));
                        last = id;
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };
        Self {
            stop,
            samples,
            handle: Some(handle),
        }
    }

    /// Stops sampling and returns every change observed.
    pub fn finish(mut self) -> Vec<(FrameId, Instant)> {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
        std::mem::take(&mut *self.samples.lock().unwrap())
    }
}

impl Drop for PublishWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// HTTP server that sends a fixed body and then keeps every connection open
/// without sending anything more.
pub struct StallingServer {
    url: String,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StallingServer {
    pub fn start(name: &str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let url = format!("http://{}/{name}", listener.local_addr().expect("addr"));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut held = Vec::new();
                while !stop.load(Ordering::Acquire) {
                    match listener.accept() {
                        Ok((stream, _)) => {
                            if let Ok(stream) = serve_then_stall(stream, &body) {
                                held.push(stream);
                            }
                        }
                        Err(_) => thread::sleep(Duration::from_millis(5)),
                    }
                }
            })
        };
        Self {
            url,
            stop,
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for StallingServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_then_stall(mut stream: TcpStream, body: &[u8]) -> io::Result<TcpStream> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut request = Vec::new();
    let mut buf = [0u8; 512];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }
    stream.write_all(b"HTTP/1.0 200 OK\r\nContent-Type: application/octet-stream\r\n\r\n")?;
    stream.write_all(body)?;
    stream.flush()?;
    Ok(stream)
}
