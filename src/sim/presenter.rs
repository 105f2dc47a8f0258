/// Photo presenter: times the appearance and fade of the photo placards.
///
/// Phase 1 (intro): deck[0] centered, faded up after 100ms, held to the
/// 5000ms mark, then faded out and removed 1500ms later. Phase 2 is armed
/// at the 5000ms mark regardless of how the fade-out goes.
///
/// Phase 2 (loop): a self-rescheduling 5000ms tick. Each tick places a
/// random deck entry (never the same index twice in a row) in the left or
/// right half of the screen, fades it up after 100ms, down at 3000ms, and
/// removes it at 4000ms. Ticks overlap freely and the loop is never
/// canceled — it keeps placing photos even after the music ends.
///
/// Terminal: on music end one more centered deck[0] placard appears, faded
/// up after 200ms and never removed.

use std::time::Duration;

use crate::sim::event::SceneEvent;
use crate::sim::scene::Viewport;
use crate::sim::stage::{HandleId, Stage, VisualKind, VisualSpec};
use crate::sim::timer::{TimerAction, TimerQueue};

/// Placard footprint in terminal cells.
pub const PHOTO_COLS: u16 = 26;
pub const PHOTO_ROWS: u16 = 9;

/// Centered placards sit a little below the vertical center.
const CENTER_DROP: i32 = 1;

/// Rows kept clear under the loop photos.
const BOTTOM_MARGIN: u16 = 2;

/// Display opacity of a faded-in photo.
pub const PHOTO_OPACITY: f32 = 0.8;

const FADE_IN_DELAY: Duration = Duration::from_millis(100);
const INTRO_HOLD: Duration = Duration::from_millis(5000);
const INTRO_REMOVE_DELAY: Duration = Duration::from_millis(1500);
const LOOP_INTERVAL: Duration = Duration::from_millis(5000);
const LOOP_FADE_OUT_AT: Duration = Duration::from_millis(3000);
const LOOP_REMOVE_DELAY: Duration = Duration::from_millis(1000);
const FINAL_FADE_IN_DELAY: Duration = Duration::from_millis(200);

pub struct PhotoPresenter {
    deck: Vec<String>,
    last_index: Option<usize>,
}

impl PhotoPresenter {
    pub fn new(deck: Vec<String>) -> Self {
        PhotoPresenter { deck, last_index: None }
    }

    pub fn reset(&mut self) {
        self.last_index = None;
    }

    fn centered_spec(&self, view: Viewport, label: &str, opacity: f32) -> VisualSpec {
        VisualSpec {
            kind: VisualKind::Photo(label.to_string()),
            col: view.cols as i32 / 2 - PHOTO_COLS as i32 / 2,
            row: view.rows as i32 / 2 - PHOTO_ROWS as i32 / 2 + CENTER_DROP,
            width: PHOTO_COLS,
            height: PHOTO_ROWS,
            visible: true,
            opacity,
        }
    }

    /// Phase 1: place the intro photo and arm its whole timeline.
    pub fn start_intro(
        &mut self,
        view: Viewport,
        now: Duration,
        timers: &mut TimerQueue,
        stage: &mut dyn Stage,
        events: &mut Vec<SceneEvent>,
    ) {
        if self.deck.is_empty() {
            return;
        }
        let label = self.deck[0].clone();
        let id = stage.create(self.centered_spec(view, &label, 0.0));
        timers.schedule(now, FADE_IN_DELAY, TimerAction::PhotoFadeIn(id));
        timers.schedule(now, INTRO_HOLD, TimerAction::IntroPhotoOut(id));
        events.push(SceneEvent::IntroPhotoPlaced);
    }

    /// The intro's 5000ms mark: fade out, schedule removal, arm phase 2.
    /// Phase 2 starts here unconditionally — not chained on the fade-out.
    pub fn intro_out(
        &mut self,
        id: HandleId,
        now: Duration,
        timers: &mut TimerQueue,
        stage: &mut dyn Stage,
    ) {
        stage.set_opacity(id, 0.0);
        timers.schedule(now, INTRO_REMOVE_DELAY, TimerAction::PhotoRemove(id));
        timers.schedule(now, LOOP_INTERVAL, TimerAction::PhotoLoopTick);
    }

    /// One phase-2 tick: place a photo, arm its fades, re-arm the tick.
    pub fn loop_tick(
        &mut self,
        view: Viewport,
        now: Duration,
        timers: &mut TimerQueue,
        stage: &mut dyn Stage,
        rng: &mut fastrand::Rng,
        events: &mut Vec<SceneEvent>,
    ) {
        timers.schedule(now, LOOP_INTERVAL, TimerAction::PhotoLoopTick);
        if self.deck.is_empty() {
            return;
        }

        let index = self.pick_next(rng);
        let (col, row) = self.side_position(view, rng);
        let id = stage.create(VisualSpec {
            kind: VisualKind::Photo(self.deck[index].clone()),
            col,
            row,
            width: PHOTO_COLS,
            height: PHOTO_ROWS,
            visible: true,
            opacity: 0.0,
        });
        timers.schedule(now, FADE_IN_DELAY, TimerAction::PhotoFadeIn(id));
        timers.schedule(now, LOOP_FADE_OUT_AT, TimerAction::PhotoFadeOut(id));
        events.push(SceneEvent::LoopPhotoPlaced { index });
    }

    /// Fade a loop photo to zero; it lingers 1000ms before removal.
    pub fn fade_out(
        &mut self,
        id: HandleId,
        now: Duration,
        timers: &mut TimerQueue,
        stage: &mut dyn Stage,
    ) {
        stage.set_opacity(id, 0.0);
        timers.schedule(now, LOOP_REMOVE_DELAY, TimerAction::PhotoRemove(id));
    }

    /// Terminal state: one more centered intro photo, never removed.
    pub fn place_final(
        &mut self,
        view: Viewport,
        now: Duration,
        timers: &mut TimerQueue,
        stage: &mut dyn Stage,
        events: &mut Vec<SceneEvent>,
    ) {
        if self.deck.is_empty() {
            return;
        }
        let label = self.deck[0].clone();
        let id = stage.create(self.centered_spec(view, &label, 0.0));
        timers.schedule(now, FINAL_FADE_IN_DELAY, TimerAction::PhotoFadeIn(id));
        events.push(SceneEvent::FinalPhotoPlaced);
    }

    /// Random deck index, never repeating the previous pick.
    fn pick_next(&mut self, rng: &mut fastrand::Rng) -> usize {
        let index = if self.deck.len() < 2 {
            0
        } else {
            loop {
                let i = rng.usize(0..self.deck.len());
                if Some(i) != self.last_index {
                    break i;
                }
            }
        };
        self.last_index = Some(index);
        index
    }

    /// Uniform position in a uniformly chosen left or right half, clamped
    /// so the placard fits inside that half; vertical position uniform
    /// over the height minus a margin.
    fn side_position(&self, view: Viewport, rng: &mut fastrand::Rng) -> (i32, i32) {
        let half = (view.cols / 2) as i32;
        let span = (half - PHOTO_COLS as i32).max(1) as usize;
        let col = if rng.bool() {
            rng.usize(0..span) as i32
        } else {
            half + rng.usize(0..span) as i32
        };
        let row_span = (view.rows as i32 - (PHOTO_ROWS + BOTTOM_MARGIN) as i32).max(1) as usize;
        let row = rng.usize(0..row_span) as i32;
        (col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stage::testing::RecordingStage;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn deck() -> Vec<String> {
        (1..=5).map(|i| format!("photo-{i}")).collect()
    }

    fn view() -> Viewport {
        Viewport { cols: 80, rows: 24 }
    }

    /// Drain and dispatch photo-related timer actions up to `to`.
    fn run(
        p: &mut PhotoPresenter,
        timers: &mut TimerQueue,
        stage: &mut RecordingStage,
        rng: &mut fastrand::Rng,
        events: &mut Vec<SceneEvent>,
        from: Duration,
        to: Duration,
    ) {
        let mut now = from;
        while now <= to {
            while let Some(action) = timers.pop_due(now) {
                match action {
                    TimerAction::PhotoFadeIn(id) => stage.set_opacity(id, PHOTO_OPACITY),
                    TimerAction::IntroPhotoOut(id) => p.intro_out(id, now, timers, stage),
                    TimerAction::PhotoLoopTick => {
                        p.loop_tick(view(), now, timers, stage, rng, events)
                    }
                    TimerAction::PhotoFadeOut(id) => p.fade_out(id, now, timers, stage),
                    TimerAction::PhotoRemove(id) => stage.remove(id),
                    _ => unreachable!(),
                }
            }
            now += ms(50);
        }
    }

    #[test]
    fn intro_timeline() {
        let mut p = PhotoPresenter::new(deck());
        let mut timers = TimerQueue::new();
        let mut stage = RecordingStage::new();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut events = Vec::new();

        p.start_intro(view(), ms(0), &mut timers, &mut stage, &mut events);
        assert_eq!(events, vec![SceneEvent::IntroPhotoPlaced]);
        let id = HandleId(0);
        assert_eq!(stage.item(id).opacity, 0.0);
        assert_eq!(stage.item(id).spec.kind, VisualKind::Photo("photo-1".into()));

        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(0), ms(100));
        assert_eq!(stage.item(id).opacity, PHOTO_OPACITY);

        // Holds until the 5000ms mark, then fades and is gone 1500ms later.
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(150), ms(4950));
        assert_eq!(stage.item(id).opacity, PHOTO_OPACITY);
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(5000), ms(5000));
        assert_eq!(stage.item(id).opacity, 0.0);
        assert!(!stage.item(id).removed);
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(5050), ms(6500));
        assert!(stage.item(id).removed);

        // First loop photo lands 5000ms after the intro's 5000ms mark.
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(6550), ms(10000));
        assert!(events.iter().any(|e| matches!(e, SceneEvent::LoopPhotoPlaced { .. })));
    }

    #[test]
    fn loop_photo_lifecycle_overlaps_next_tick() {
        let mut p = PhotoPresenter::new(deck());
        let mut timers = TimerQueue::new();
        let mut stage = RecordingStage::new();
        let mut rng = fastrand::Rng::with_seed(11);
        let mut events = Vec::new();

        p.loop_tick(view(), ms(0), &mut timers, &mut stage, &mut rng, &mut events);
        let first = HandleId(0);

        // Faded in at 100ms, out at 3000ms, removed at 4000ms.
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(0), ms(100));
        assert_eq!(stage.item(first).opacity, PHOTO_OPACITY);
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(150), ms(3000));
        assert_eq!(stage.item(first).opacity, 0.0);
        assert!(!stage.item(first).removed);
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(3050), ms(4000));
        assert!(stage.item(first).removed);

        // The tick re-armed itself at 5000ms.
        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(4050), ms(5000));
        assert_eq!(stage.items.len(), 2);
    }

    #[test]
    fn never_repeats_previous_index() {
        let mut p = PhotoPresenter::new(deck());
        let mut rng = fastrand::Rng::with_seed(13);
        let mut prev = None;
        for _ in 0..500 {
            let i = p.pick_next(&mut rng);
            assert!(i < 5);
            assert_ne!(Some(i), prev);
            prev = Some(i);
        }
    }

    #[test]
    fn single_entry_deck_does_not_spin() {
        let mut p = PhotoPresenter::new(vec!["only".into()]);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(p.pick_next(&mut rng), 0);
        assert_eq!(p.pick_next(&mut rng), 0);
    }

    #[test]
    fn side_positions_fit_their_half() {
        let p = PhotoPresenter::new(deck());
        let mut rng = fastrand::Rng::with_seed(17);
        let v = view();
        let half = v.cols as i32 / 2;
        let mut seen_left = false;
        let mut seen_right = false;
        for _ in 0..200 {
            let (col, row) = p.side_position(v, &mut rng);
            assert!(col >= 0);
            if col < half {
                assert!(col + PHOTO_COLS as i32 <= half);
                seen_left = true;
            } else {
                assert!(col >= half);
                seen_right = true;
            }
            assert!(row >= 0);
            assert!(row + (PHOTO_ROWS + BOTTOM_MARGIN) as i32 <= v.rows as i32);
        }
        assert!(seen_left && seen_right);
    }

    #[test]
    fn final_photo_is_never_removed() {
        let mut p = PhotoPresenter::new(deck());
        let mut timers = TimerQueue::new();
        let mut stage = RecordingStage::new();
        let mut rng = fastrand::Rng::with_seed(19);
        let mut events = Vec::new();

        p.place_final(view(), ms(0), &mut timers, &mut stage, &mut events);
        assert_eq!(events, vec![SceneEvent::FinalPhotoPlaced]);
        let id = HandleId(0);
        assert_eq!(stage.item(id).opacity, 0.0);

        run(&mut p, &mut timers, &mut stage, &mut rng, &mut events, ms(0), ms(60000));
        assert_eq!(stage.item(id).opacity, PHOTO_OPACITY);
        assert!(!stage.item(id).removed);
    }
}
