/// Deferred work queue: a min-heap of (fire time, action) pairs.
///
/// Replaces ad-hoc nested timeout callbacks with one explicit structure the
/// frame loop drains. Guarantees: an entry never fires before its due time,
/// and entries scheduled for the same instant fire in scheduling order.
/// There is no upper bound on lateness — due entries fire on whatever frame
/// first observes them.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::sim::stage::HandleId;

/// Everything the show defers. Each variant is one former timeout/interval.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerAction {
    /// Launch 2-3 shells and re-arm (unless the music has ended).
    SpawnWave,
    /// 500ms after the fourth burst: emphasize the greeting, bounce the
    /// emojis, start the photo intro.
    Reveal,
    /// One emoji's bounce settling back, 1000ms after Reveal.
    EmojiSettle(HandleId),
    /// Fade a placed photo up to its display opacity.
    PhotoFadeIn(HandleId),
    /// 5000ms mark of the intro photo: fade out, arm the random loop.
    IntroPhotoOut(HandleId),
    /// One tick of the perpetual 5000ms side-photo loop.
    PhotoLoopTick,
    /// Fade a loop photo to zero and schedule its removal.
    PhotoFadeOut(HandleId),
    /// Drop a fully faded photo from the stage.
    PhotoRemove(HandleId),
    /// One 200ms volume ramp step.
    VolumeStep,
    /// Re-attempt music activation after a blocked play.
    MusicRetry,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    due: Duration,
    seq: u64,
    action: TimerAction,
}

// Heap order ignores the action: (due, seq) alone decides.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        TimerQueue { heap: BinaryHeap::new(), seq: 0 }
    }

    /// Schedule `action` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: TimerAction) {
        let entry = Entry { due: now + delay, seq: self.seq, action };
        self.seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Pop the next action due at or before `now`, if any.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerAction> {
        match self.heap.peek() {
            Some(Reverse(e)) if e.due <= now => {}
            _ => return None,
        }
        self.heap.pop().map(|Reverse(e)| e.action)
    }

    /// Drop every pending entry (full scene reset).
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(0), ms(500), TimerAction::Reveal);
        q.schedule(ms(0), ms(100), TimerAction::PhotoLoopTick);
        q.schedule(ms(0), ms(300), TimerAction::SpawnWave);

        assert_eq!(q.pop_due(ms(1000)), Some(TimerAction::PhotoLoopTick));
        assert_eq!(q.pop_due(ms(1000)), Some(TimerAction::SpawnWave));
        assert_eq!(q.pop_due(ms(1000)), Some(TimerAction::Reveal));
        assert_eq!(q.pop_due(ms(1000)), None);
    }

    #[test]
    fn equal_due_times_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(0), ms(200), TimerAction::VolumeStep);
        q.schedule(ms(0), ms(200), TimerAction::MusicRetry);
        q.schedule(ms(0), ms(200), TimerAction::SpawnWave);

        assert_eq!(q.pop_due(ms(200)), Some(TimerAction::VolumeStep));
        assert_eq!(q.pop_due(ms(200)), Some(TimerAction::MusicRetry));
        assert_eq!(q.pop_due(ms(200)), Some(TimerAction::SpawnWave));
    }

    #[test]
    fn never_fires_early() {
        let mut q = TimerQueue::new();
        q.schedule(ms(100), ms(400), TimerAction::Reveal);

        assert_eq!(q.pop_due(ms(499)), None);
        assert_eq!(q.pop_due(ms(500)), Some(TimerAction::Reveal));
    }

    #[test]
    fn clear_discards_everything() {
        let mut q = TimerQueue::new();
        q.schedule(ms(0), ms(10), TimerAction::SpawnWave);
        q.schedule(ms(0), ms(20), TimerAction::Reveal);
        q.clear();
        assert_eq!(q.pop_due(ms(1000)), None);
        assert_eq!(q.len(), 0);
    }
}
