//! Clipboard auto-clear bookkeeping.
//!
//! Every copy attempt bumps the generation and arms a clear timer tagged
//! with it. Only the timer carrying the latest generation clears, so a
//! newer copy always keeps its full delay.

use std::time::Duration;

use super::Command;

#[derive(Debug, Clone)]
pub struct ClipboardState {
    generation: u64,
    clear_after: Duration,
}

impl ClipboardState {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            generation: 0,
            clear_after,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear_after(&self) -> Duration {
        self.clear_after
    }

    /// Records a copy attempt and returns the timer to arm for it.
    pub fn record_copy(&mut self) -> Command {
        self.generation += 1;
        Command::ScheduleClipboardClear {
            generation: self.generation,
            after: self.clear_after,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
