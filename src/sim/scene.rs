/// SceneState: the complete snapshot of a running show.
///
/// ## Canvas units
///
/// The sim works in virtual canvas units, not terminal cells: every cell is
/// 8 units wide and 16 tall, so a `cols × rows` terminal is a
/// `cols·8 × rows·16` unit canvas. Shell kinematics (ascent [4,8) per
/// frame, particle drift [-2,2)) then behave like they would on a
/// pixel-sized canvas. The renderer maps units back to half-block pixels.
///
/// ## Reset
///
/// `reset()` is the single well-defined replay operation: it clears the
/// stage, the timer queue, the shells and every counter, re-creates the
/// greeting placards, and re-activates the music — the whole show starts
/// over from nothing.

use std::time::Duration;

use crate::config::ShowConfig;
use crate::domain::firework::Firework;
use crate::sim::audio::{AudioController, MusicBackend};
use crate::sim::event::SceneEvent;
use crate::sim::presenter::PhotoPresenter;
use crate::sim::stage::{HandleId, Stage, VisualKind, VisualSpec};
use crate::sim::timer::{TimerAction, TimerQueue};

pub const UNITS_PER_COL: f32 = 8.0;
pub const UNITS_PER_ROW: f32 = 16.0;

/// Columns between emoji placards.
const EMOJI_SPACING: i32 = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn unit_width(self) -> f32 {
        self.cols as f32 * UNITS_PER_COL
    }

    pub fn unit_height(self) -> f32 {
        self.rows as f32 * UNITS_PER_ROW
    }
}

pub struct SceneState {
    pub view: Viewport,
    /// Scene clock, advanced by the frame loop. Restarts at zero on reset.
    pub now: Duration,

    // ── Fireworks ──
    pub fireworks: Vec<Firework>,
    /// Process-wide burst count. Monotone; the greeting reveal keys off it.
    pub explosion_count: u32,

    // ── Terminal state ──
    pub replay_offered: bool,

    // ── Cooperative scheduling ──
    pub timers: TimerQueue,
    pub rng: fastrand::Rng,

    // ── Collaborator components ──
    pub presenter: PhotoPresenter,
    pub audio: AudioController,

    // ── Stage handles (greeting banner + emoji row) ──
    pub greeting: HandleId,
    pub emojis: Vec<HandleId>,

    // Kept for re-creating the banner on reset.
    banner_text: String,
    emoji_glyphs: Vec<String>,
}

impl SceneState {
    pub fn new(
        view: Viewport,
        config: &ShowConfig,
        backend: Box<dyn MusicBackend>,
        stage: &mut dyn Stage,
    ) -> Self {
        let mut scene = SceneState {
            view,
            now: Duration::ZERO,
            fireworks: Vec::new(),
            explosion_count: 0,
            replay_offered: false,
            timers: TimerQueue::new(),
            rng: fastrand::Rng::new(),
            presenter: PhotoPresenter::new(config.photos.clone()),
            audio: AudioController::new(backend),
            greeting: HandleId(0),
            emojis: Vec::new(),
            banner_text: config.greeting.clone(),
            emoji_glyphs: config.emojis.clone(),
        };
        scene.arm(stage);
        scene
    }

    /// Full reinitialization — the replay control's reset operation.
    pub fn reset(&mut self, stage: &mut dyn Stage) {
        self.now = Duration::ZERO;
        self.fireworks.clear();
        self.explosion_count = 0;
        self.replay_offered = false;
        self.timers.clear();
        self.presenter.reset();
        self.audio.reset();
        self.arm(stage);
    }

    /// Build the hidden greeting placards, arm the spawn loop, start the
    /// music. Shared by construction and reset.
    fn arm(&mut self, stage: &mut dyn Stage) {
        stage.clear();

        let text_cols = self.banner_text.chars().count() as i32;
        let banner_row = self.view.rows as i32 / 3;
        self.greeting = stage.create(VisualSpec {
            kind: VisualKind::Greeting(self.banner_text.clone()),
            col: self.view.cols as i32 / 2 - text_cols / 2,
            row: banner_row,
            width: text_cols.max(0) as u16,
            height: 1,
            visible: false,
            opacity: 1.0,
        });

        self.emojis.clear();
        let n = self.emoji_glyphs.len() as i32;
        let row_width = (n * EMOJI_SPACING - 2).max(0);
        let start = self.view.cols as i32 / 2 - row_width / 2;
        for (i, glyph) in self.emoji_glyphs.iter().enumerate() {
            let id = stage.create(VisualSpec {
                kind: VisualKind::Emoji(glyph.clone()),
                col: start + i as i32 * EMOJI_SPACING,
                row: banner_row + 2,
                width: 2,
                height: 1,
                visible: false,
                opacity: 1.0,
            });
            self.emojis.push(id);
        }

        self.timers.schedule(self.now, Duration::ZERO, TimerAction::SpawnWave);

        let mut events: Vec<SceneEvent> = Vec::new();
        self.audio.activate(self.now, &mut self.timers, &mut events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::audio::testing::scripted_backend;
    use crate::sim::stage::testing::RecordingStage;

    #[test]
    fn arm_creates_hidden_banner_and_emojis() {
        let config = ShowConfig::default();
        let mut stage = RecordingStage::new();
        let (_, backend) = scripted_backend(vec![]);
        let scene = SceneState::new(
            Viewport { cols: 80, rows: 24 },
            &config,
            backend,
            &mut stage,
        );

        assert_eq!(stage.items.len(), 1 + config.emojis.len());
        assert!(!stage.item(scene.greeting).visible);
        for &id in &scene.emojis {
            assert!(!stage.item(id).visible);
        }
    }

    #[test]
    fn viewport_resize_does_not_move_placards() {
        let config = ShowConfig::default();
        let mut stage = RecordingStage::new();
        let (_, backend) = scripted_backend(vec![]);
        let mut scene = SceneState::new(
            Viewport { cols: 80, rows: 24 },
            &config,
            backend,
            &mut stage,
        );

        let before: Vec<(i32, i32)> =
            stage.items.iter().map(|i| (i.spec.col, i.spec.row)).collect();
        scene.view = Viewport { cols: 120, rows: 40 };
        let after: Vec<(i32, i32)> =
            stage.items.iter().map(|i| (i.spec.col, i.spec.row)).collect();
        assert_eq!(before, after);
        assert_eq!(scene.view.unit_width(), 120.0 * UNITS_PER_COL);
    }

    #[test]
    fn reset_clears_everything_and_rearms() {
        let config = ShowConfig::default();
        let mut stage = RecordingStage::new();
        let (_, backend) = scripted_backend(vec![]);
        let mut scene = SceneState::new(
            Viewport { cols: 80, rows: 24 },
            &config,
            backend,
            &mut stage,
        );

        scene.explosion_count = 9;
        scene.replay_offered = true;
        scene.now = Duration::from_secs(120);

        scene.reset(&mut stage);
        assert_eq!(scene.explosion_count, 0);
        assert!(!scene.replay_offered);
        assert_eq!(scene.now, Duration::ZERO);
        assert!(scene.fireworks.is_empty());
        // arm() clears once on construction, once more on reset
        assert_eq!(stage.cleared, 2);
        assert_eq!(stage.items.len(), 1 + config.emojis.len());
    }
}
