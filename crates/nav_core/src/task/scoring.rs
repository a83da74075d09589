//! Score with a time-based penalty
//!
//! The score rises by a fixed increment on each target reached and drains by
//! one point per penalty interval while it is positive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    score: i32,
    increment: i32,
    penalty_interval_ms: f32,
    /// 페널티 누적 타이머 (ms)
    penalty_timer_ms: f32,
    enabled: bool,
}

impl ScoreKeeper {
    pub fn new(enabled: bool, increment: i32, penalty_interval_ms: u32) -> Self {
        Self {
            score: 0,
            increment,
            penalty_interval_ms: penalty_interval_ms.max(1) as f32,
            penalty_timer_ms: 0.0,
            enabled,
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn penalty_timer_ms(&self) -> f32 {
        self.penalty_timer_ms
    }

    /// Advance the penalty timer by `dt` seconds.
    ///
    /// Returns the number of points removed this frame. The timer only runs
    /// while the score is positive, and each full interval costs one point.
    pub fn apply_penalty(&mut self, dt: f32) -> u32 {
        if self.score <= 0 || dt.is_nan() || dt <= 0.0 {
            return 0;
        }

        self.penalty_timer_ms += dt * 1000.0;

        let mut removed = 0;
        while self.penalty_timer_ms >= self.penalty_interval_ms {
            self.penalty_timer_ms -= self.penalty_interval_ms;
            if self.score > 0 {
                self.score -= 1;
                removed += 1;
            }
        }
        removed
    }

    /// Reward for reaching the target; returns the new score if scoring is on
    pub fn reward(&mut self) -> Option<i32> {
        if !self.enabled {
            return None;
        }
        self.score = self.score.saturating_add(self.increment);
        Some(self.score)
    }
}
