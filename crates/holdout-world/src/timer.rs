//! Pending per-map timers.
//!
//! Timers count down once per map turn, in the always-run tier of the turn
//! effects, so they keep firing on low-detail turns.

use holdout_types::Point;

/// What happens when a timer completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Remove a decoration (vomit, blood) from a tile.
    RemoveDecoration {
        /// Tile of the decoration.
        pos: Point,
        /// Decoration name.
        name: String,
    },
    /// A fire burns itself out.
    BurnOut {
        /// Burning tile.
        pos: Point,
    },
    /// A message for actors on the map (radio, sirens).
    Announcement {
        /// Message text.
        message: String,
    },
}

/// A scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTimer {
    /// Map turns until the task fires.
    pub turns_left: u32,
    /// The task.
    pub task: TimerTask,
}

/// The timers of one map, in scheduling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerQueue {
    timers: Vec<MapTimer>,
}

impl TimerQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { timers: Vec::new() }
    }

    /// Schedule `task` to fire after `turns` map turns (at least one).
    pub fn schedule(&mut self, turns: u32, task: TimerTask) {
        self.timers.push(MapTimer {
            turns_left: turns.max(1),
            task,
        });
    }

    /// Count every timer down by one turn, removing and returning the ones
    /// that completed, in scheduling order.
    pub fn tick(&mut self) -> Vec<TimerTask> {
        let mut fired = Vec::new();
        let mut pending = Vec::with_capacity(self.timers.len());
        for mut timer in self.timers.drain(..) {
            timer.turns_left = timer.turns_left.saturating_sub(1);
            if timer.turns_left == 0 {
                fired.push(timer.task);
            } else {
                pending.push(timer);
            }
        }
        self.timers = pending;
        fired
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Iterate over pending timers.
    pub fn iter(&self) -> impl Iterator<Item = &MapTimer> {
        self.timers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_after_their_delay() {
        let mut queue = TimerQueue::new();
        queue.schedule(2, TimerTask::BurnOut { pos: Point::new(1, 1) });
        queue.schedule(1, TimerTask::Announcement { message: "siren".to_owned() });

        let first = queue.tick();
        assert_eq!(first.len(), 1);
        assert!(matches!(first.first(), Some(TimerTask::Announcement { .. })));
        assert_eq!(queue.len(), 1);

        let second = queue.tick();
        assert_eq!(second, vec![TimerTask::BurnOut { pos: Point::new(1, 1) }]);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_delay_is_one_turn() {
        let mut queue = TimerQueue::new();
        queue.schedule(0, TimerTask::BurnOut { pos: Point::new(0, 0) });
        assert_eq!(queue.tick().len(), 1);
    }
}
