/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::ShowConfig;
use sim::audio::MusicBackend;
use sim::scene::SceneState;
use sim::step;
use ui::input::InputState;
use ui::overlay::OverlayStage;
use ui::renderer::Renderer;
use ui::sound::SilentTrack;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];
const KEYS_REPLAY: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];

fn main() {
    let config = ShowConfig::load();
    let backend = build_backend(&config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut overlay = OverlayStage::new();
    let mut scene = SceneState::new(renderer.viewport(), &config, backend, &mut overlay);

    let result = show_loop(&mut scene, &mut overlay, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Show error: {e}");
    }

    println!();
    println!("Thanks for watching!");
}

/// The real music file when the sound feature and the device allow it,
/// otherwise a silent stand-in of the configured length.
#[cfg(feature = "sound")]
fn build_backend(config: &ShowConfig) -> Box<dyn MusicBackend> {
    match ui::sound::RodioMusic::load(&config.music_path) {
        Some(music) => Box::new(music),
        None => {
            eprintln!(
                "Warning: no audio for {}, running a silent show.",
                config.music_path.display()
            );
            Box::new(SilentTrack::new(Duration::from_secs(config.silent_track_secs)))
        }
    }
}

#[cfg(not(feature = "sound"))]
fn build_backend(config: &ShowConfig) -> Box<dyn MusicBackend> {
    Box::new(SilentTrack::new(Duration::from_secs(config.silent_track_secs)))
}

fn show_loop(
    scene: &mut SceneState,
    overlay: &mut OverlayStage,
    renderer: &mut Renderer,
    config: &ShowConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let tick_rate = Duration::from_millis(config.frame_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }
        // The replay control only responds while it is shown.
        if scene.replay_offered && kb.any_pressed(KEYS_REPLAY) {
            scene.reset(overlay);
        }

        if last_tick.elapsed() >= tick_rate {
            let _events = step::step(scene, overlay, tick_rate);
            last_tick = Instant::now();
        }

        renderer.render(scene, overlay)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
