/// The step function: advances the show by one display frame.
///
/// Processing order:
///   1. Observe the music's natural end (terminal photo + replay control)
///   2. Drain every timer action due by the new clock value
///   3. Frame pass: update shells, trigger bursts, drop spent shells
///
/// Everything runs on this single cooperative pass — there are no other
/// threads and no other queue.

use std::time::Duration;

use crate::domain::firework::Firework;
use crate::sim::event::SceneEvent;
use crate::sim::presenter::PHOTO_OPACITY;
use crate::sim::scene::SceneState;
use crate::sim::stage::Stage;
use crate::sim::timer::TimerAction;

/// The burst count that reveals the greeting. A strict equality check:
/// the reveal fires on the burst where the counter becomes exactly this
/// value, once, and never again.
pub const REVEAL_BURST: u32 = 4;

const REVEAL_DELAY: Duration = Duration::from_millis(500);
const EMOJI_BOUNCE: Duration = Duration::from_millis(1000);

/// Spawn waves re-arm after 600 + [0,200) ms.
const SPAWN_DELAY_MIN_MS: u64 = 600;
const SPAWN_DELAY_SPREAD_MS: u64 = 200;

pub fn step(scene: &mut SceneState, stage: &mut dyn Stage, dt: Duration) -> Vec<SceneEvent> {
    let mut events: Vec<SceneEvent> = Vec::new();
    scene.now += dt;

    if scene.audio.poll_ended() {
        events.push(SceneEvent::MusicEnded);
        scene.presenter.place_final(
            scene.view,
            scene.now,
            &mut scene.timers,
            stage,
            &mut events,
        );
        scene.replay_offered = true;
        events.push(SceneEvent::ReplayOffered);
    }

    while let Some(action) = scene.timers.pop_due(scene.now) {
        apply(scene, stage, action, &mut events);
    }

    advance_fireworks(scene, stage, &mut events);

    events
}

fn apply(
    scene: &mut SceneState,
    stage: &mut dyn Stage,
    action: TimerAction,
    events: &mut Vec<SceneEvent>,
) {
    match action {
        TimerAction::SpawnWave => spawn_wave(scene, events),

        TimerAction::Reveal => {
            stage.set_emphasis(scene.greeting, true);
            for i in 0..scene.emojis.len() {
                let id = scene.emojis[i];
                stage.set_emphasis(id, true);
                scene
                    .timers
                    .schedule(scene.now, EMOJI_BOUNCE, TimerAction::EmojiSettle(id));
            }
            scene.presenter.start_intro(
                scene.view,
                scene.now,
                &mut scene.timers,
                stage,
                events,
            );
            events.push(SceneEvent::GreetingRevealed);
        }

        TimerAction::EmojiSettle(id) => stage.set_emphasis(id, false),

        TimerAction::PhotoFadeIn(id) => stage.set_opacity(id, PHOTO_OPACITY),

        TimerAction::IntroPhotoOut(id) => {
            scene
                .presenter
                .intro_out(id, scene.now, &mut scene.timers, stage)
        }

        TimerAction::PhotoLoopTick => scene.presenter.loop_tick(
            scene.view,
            scene.now,
            &mut scene.timers,
            stage,
            &mut scene.rng,
            events,
        ),

        TimerAction::PhotoFadeOut(id) => {
            scene
                .presenter
                .fade_out(id, scene.now, &mut scene.timers, stage)
        }

        TimerAction::PhotoRemove(id) => stage.remove(id),

        TimerAction::VolumeStep => scene.audio.on_volume_step(scene.now, &mut scene.timers),

        TimerAction::MusicRetry => {
            scene
                .audio
                .on_retry(scene.now, &mut scene.timers, events)
        }
    }
}

/// One spawn wave: 2 or 3 shells at random columns aiming into the upper
/// half of the canvas. Gated on the music: once the track has ended the
/// wave neither spawns nor re-arms — in-flight shells still finish.
fn spawn_wave(scene: &mut SceneState, events: &mut Vec<SceneEvent>) {
    if scene.audio.ended() {
        return;
    }

    let count = if scene.rng.bool() { 2 } else { 3 };
    let w = scene.view.unit_width();
    let h = scene.view.unit_height();
    for _ in 0..count {
        let x = scene.rng.f32() * w;
        let target_y = scene.rng.f32() * (h / 2.0);
        let shell = Firework::launch(x, target_y, h, &mut scene.rng);
        scene.fireworks.push(shell);
    }
    events.push(SceneEvent::WaveLaunched { count });

    let delay = Duration::from_millis(
        SPAWN_DELAY_MIN_MS + scene.rng.u64(0..SPAWN_DELAY_SPREAD_MS),
    );
    scene.timers.schedule(scene.now, delay, TimerAction::SpawnWave);
}

/// Frame pass: advance every shell, count bursts, fire the one-shot
/// greeting trigger on burst four, and drop fully faded shells.
fn advance_fireworks(
    scene: &mut SceneState,
    stage: &mut dyn Stage,
    events: &mut Vec<SceneEvent>,
) {
    let greeting = scene.greeting;
    for fw in &mut scene.fireworks {
        if fw.update(&mut scene.rng) {
            scene.explosion_count += 1;
            events.push(SceneEvent::ShellBurst {
                total: scene.explosion_count,
            });
            if scene.explosion_count == REVEAL_BURST {
                stage.set_visible(greeting, true);
                for &id in &scene.emojis {
                    stage.set_visible(id, true);
                }
                scene
                    .timers
                    .schedule(scene.now, REVEAL_DELAY, TimerAction::Reveal);
                events.push(SceneEvent::GreetingShown);
            }
        }
    }
    scene.fireworks.retain(|fw| !fw.is_spent());
}
