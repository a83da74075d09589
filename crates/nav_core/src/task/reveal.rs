use crate::config::{RevealClock, TargetRevealMode};
use serde::{Deserialize, Serialize};

/// When a hidden target comes back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealSchedule {
    mode: TargetRevealMode,
    delay_secs: f32,
    clock: RevealClock,
    start_time: f64,
    revealed: bool,
}

impl RevealSchedule {
    pub fn new(
        mode: TargetRevealMode,
        delay_secs: f32,
        clock: RevealClock,
        start_time: f64,
    ) -> Self {
        Self { mode, delay_secs, clock, start_time, revealed: !mode.hides_target() }
    }

    pub fn mode(&self) -> TargetRevealMode {
        self.mode
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Check the reveal condition for this frame.
    ///
    /// Returns true on every frame the target must be forced active; the
    /// first such frame also flips `is_revealed`.
    pub fn check(&mut self, now: f64, wall_second: u32, manual: bool) -> bool {
        if !self.mode.hides_target() {
            return false;
        }

        let waited = match self.clock {
            RevealClock::Elapsed => now - self.start_time,
            RevealClock::WallSecondOfMinute => wall_second as f64 - self.start_time,
        };

        if manual || waited > self.delay_secs as f64 {
            self.revealed = true;
            return true;
        }
        false
    }
}
