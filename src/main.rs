//! Cthulhu Saucer headless entry point
//!
//! Runs the coordinator for a fixed number of frames with recording/scripted
//! collaborators and a file-backed session store:
//!
//! ```text
//! cthulhu-saucer [settings.json] [--frames N] [--peer]
//! ```
//!
//! `--peer` attaches an in-process loopback peer that echoes nothing but
//! logs every notice it receives.

use std::path::Path;
use std::process::ExitCode;

use glam::Vec2;

use cthulhu_saucer::audio::SilentCue;
use cthulhu_saucer::consts::STEP_TIME;
use cthulhu_saucer::net::{LoopbackTransport, PeerSession};
use cthulhu_saucer::persistence::Persistence;
use cthulhu_saucer::platform::{RecordingTarget, ScriptedInput};
use cthulhu_saucer::{Collaborators, Game, GameError, Settings};

const DEFAULT_FRAMES: u32 = 600;
/// Frames between scripted taps
const TAP_EVERY: u32 = 24;

struct Options {
    settings: Settings,
    frames: u32,
    peer: bool,
}

fn parse_args() -> Options {
    let mut options = Options {
        settings: Settings::default(),
        frames: DEFAULT_FRAMES,
        peer: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--peer" => options.peer = true,
            "--frames" => match args.next().and_then(|n| n.parse().ok()) {
                Some(frames) => options.frames = frames,
                None => log::warn!("--frames needs a number, keeping {}", options.frames),
            },
            path => options.settings = Settings::load(Path::new(path)),
        }
    }
    options
}

fn run(options: Options) -> Result<(), GameError> {
    let Options {
        settings,
        frames,
        peer,
    } = options;

    let persistence = Persistence::file_backed(&settings.save_dir)?;
    let target = RecordingTarget::new();
    let input = ScriptedInput::new();

    let mut remote = None;
    let local_peer = if peer {
        let (local, other) = LoopbackTransport::pair();
        let mut session = PeerSession::new(Box::new(other));
        session.connect()?;
        remote = Some(session);
        Some(PeerSession::new(Box::new(local)))
    } else {
        None
    };

    // Tap near the top of the screen every so often
    let tap = Vec2::new(settings.viewport_width / 2.0, settings.viewport_height / 4.0);
    input.queue((0..frames).map(|frame| (frame % TAP_EVERY == 0).then_some(tap)));

    let mut game = Game::new(
        settings.clone(),
        Collaborators {
            target: Box::new(target.clone()),
            input: Box::new(input.clone()),
            intro: Box::new(SilentCue::new(settings.intro_track.clone())),
            gameplay: Box::new(SilentCue::new(settings.gameplay_track.clone())),
            persistence: Box::new(persistence),
            peer: local_peer,
        },
    )?;
    game.create();

    let mut draw_calls = 0usize;
    for frame in 0..frames {
        if frame == frames / 2 {
            log::info!("Host focus lost at frame {}", frame);
            game.pause();
            game.resume();
        }
        game.render(STEP_TIME);
        draw_calls += target.take_calls().len();

        if let Some(remote) = remote.as_mut() {
            for notice in remote.poll() {
                log::info!("Peer saw {} (#{})", notice.state.as_str(), notice.seq);
            }
        }
    }

    if let Some(player) = game.player() {
        log::info!(
            "After {} frames: state {}, health {}/{}, score {}, {} draw calls",
            frames,
            game.state().map_or("unset", |s| s.as_str()),
            player.health(),
            player.max_health(),
            player.score(),
            draw_calls
        );
    }
    log::info!(
        "Saved session available: {}",
        game.has_saved_session()
    );
    game.dispose();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Cthulhu Saucer (headless) starting...");

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
