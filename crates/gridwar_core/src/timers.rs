//! Scheduled actions run from the tick loop.
//!
//! A timer accumulates tick deltas and fires its action each time a full
//! interval has elapsed. One-shot timers are dropped after firing.

use serde::{Deserialize, Serialize};

use crate::grid::GridCoord;
use crate::player::PlayerId;

/// Unique identifier for timers.
pub type TimerId = u64;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerAction {
    /// Force-create a mob for `owner`.
    SpawnMob {
        /// Hostile player receiving the mob.
        owner: PlayerId,
        /// Spawn cell; a random cell when `None`.
        at: Option<GridCoord>,
    },
}

/// A scheduled action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timer {
    /// Scheduler id.
    pub id: TimerId,
    /// Time between firings. Zero fires once per tick.
    pub interval: u32,
    /// Time accumulated toward the next firing.
    pub elapsed: u32,
    /// Keep firing after the first time.
    pub repeats: bool,
    /// Action to run.
    pub action: TimerAction,
}

/// All pending timers, run in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: TimerId,
}

impl TimerQueue {
    /// Empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule an action.
    pub fn add(&mut self, interval: u32, repeats: bool, action: TimerAction) -> TimerId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.timers.push(Timer {
            id,
            interval,
            elapsed: 0,
            repeats,
            action,
        });
        id
    }

    /// Cancel a timer. Returns `false` if it was not scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Pending timers.
    #[must_use]
    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    /// Advance every timer and collect the actions that fired, in order.
    pub fn advance(&mut self, delta: u32) -> Vec<TimerAction> {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            if timer.interval == 0 {
                fired.push(timer.action);
                if !timer.repeats {
                    timer.elapsed = u32::MAX;
                }
                continue;
            }

            timer.elapsed = timer.elapsed.saturating_add(delta);
            while timer.elapsed >= timer.interval {
                fired.push(timer.action);
                if !timer.repeats {
                    timer.elapsed = u32::MAX;
                    break;
                }
                timer.elapsed -= timer.interval;
            }
        }
        self.timers
            .retain(|t| t.repeats || t.elapsed != u32::MAX);
        fired
    }
}
