// SPDX-License-Identifier: MPL-2.0
//! `amino-play`: plays a video headlessly and prints its lifecycle events.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use amino_video::application::port::TextureTarget;
use amino_video::config::{self, PlayerConfig};
use amino_video::domain::video::{LoopCount, PlayerEvent, VideoSource, VideoSourceHandle};
use amino_video::logging;
use amino_video::video_player::{create_player, ChannelConsumer, ConsumerMessage, FrameUploader};
use tokio::sync::mpsc::error::TryRecvError;

const HELP: &str = "\
amino-play: headless video player

USAGE:
  amino-play [OPTIONS] <SOURCE>

OPTIONS:
  --loop <N>            Replay N more times after the first pass (-1 = forever)
  --opts <OPTIONS>      Decoder options, e.g. \"amino_timeout_open=5000;rtsp_transport=tcp\"
  --config <PATH>       Read settings from PATH instead of the user config dir
  --max-seconds <SECS>  Stop after SECS seconds of wall time
  -v, --verbose         Verbose logging (FFmpeg included)
  -h, --help            Print this help
";

/// Render loop period, roughly one display refresh.
const RENDER_INTERVAL: Duration = Duration::from_millis(16);

struct Args {
    src: String,
    opts: String,
    loops: i32,
    config: Option<PathBuf>,
    max_secs: Option<f64>,
    verbose: bool,
}

fn parse_args() -> Result<Option<Args>, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let args = Args {
        verbose: pargs.contains(["-v", "--verbose"]),
        loops: pargs.opt_value_from_str("--loop")?.unwrap_or(0),
        opts: pargs.opt_value_from_str("--opts")?.unwrap_or_default(),
        config: pargs.opt_value_from_str("--config")?,
        max_secs: pargs.opt_value_from_str("--max-seconds")?,
        src: pargs.free_from_str()?,
    };

    let rest = pargs.finish();
    if !rest.is_empty() {
        eprintln!("warning: ignoring unused arguments: {rest:?}");
    }
    Ok(Some(args))
}

/// Stands in for a GPU texture: counts uploads.
#[derive(Debug, Default)]
struct FrameCounter {
    width: u32,
    height: u32,
    uploads: u64,
    bytes: u64,
}

impl TextureTarget for FrameCounter {
    fn init_texture(&mut self, width: u32, height: u32, rgb: &[u8]) {
        self.width = width;
        self.height = height;
        self.update_texture(width, height, rgb);
    }

    fn update_texture(&mut self, _width: u32, _height: u32, rgb: &[u8]) {
        self.uploads += 1;
        self.bytes += rgb.len() as u64;
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            return ExitCode::from(2);
        }
    };

    let loaded = match &args.config {
        Some(path) => config::load_from_path(path),
        None => config::load(),
    };
    let mut config = loaded.unwrap_or_else(|err| {
        eprintln!("warning: {err}, using default settings");
        PlayerConfig::default()
    });
    if args.verbose {
        config.verbose = Some(true);
    }
    logging::init(&config);

    play(&args, &config)
}

fn play(args: &Args, config: &PlayerConfig) -> ExitCode {
    let (consumer, mut events) = ChannelConsumer::new();
    let source = VideoSource::new(args.src.as_str())
        .with_options(args.opts.as_str())
        .with_loop(LoopCount::new(args.loops));
    let mut player = create_player(VideoSourceHandle::new(source), Arc::new(consumer), config);

    if let Err(err) = player.init() {
        eprintln!("cannot open {}: {err}", args.src);
        return ExitCode::FAILURE;
    }

    let frames = player.frame_buffer();
    let mut uploader = FrameUploader::new();
    let mut texture = FrameCounter::default();
    let started = Instant::now();
    let mut failed = false;

    'render: loop {
        loop {
            match events.try_recv() {
                Ok(ConsumerMessage::InitDone) => {
                    if let Some((width, height)) = player.video_dimension() {
                        println!(
                            "{width}x{height}, {:.3} fps, duration {:.3}s",
                            player.framerate(),
                            player.duration()
                        );
                    }
                }
                Ok(ConsumerMessage::Event(event)) => {
                    println!("{:>9.3}s  {event}", started.elapsed().as_secs_f64());
                    if event.is_terminal() {
                        failed = event == PlayerEvent::Error;
                        break 'render;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'render,
            }
        }

        uploader.upload(&frames, &mut texture);

        if args
            .max_secs
            .is_some_and(|limit| started.elapsed().as_secs_f64() >= limit)
        {
            println!("{:>9.3}s  time limit reached", started.elapsed().as_secs_f64());
            break;
        }
        thread::sleep(RENDER_INTERVAL);
    }

    if let Some(err) = player.last_error() {
        eprintln!("playback failed: {err}");
    }
    player.close();

    println!(
        "{} frames uploaded at {}x{} ({} bytes)",
        texture.uploads, texture.width, texture.height, texture.bytes
    );
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
