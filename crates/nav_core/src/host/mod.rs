//! Host collaborators
//!
//! The navigation task never reaches into the host engine directly. Everything
//! it reads (avatar positions, time) or writes (HUD, experiment log) goes
//! through the traits below, injected once through [`TaskBindings`].

mod memory;

pub use memory::{HudEvent, HudRecorder, LogEntry, LogRecorder, ManualClock, ScriptedAvatar};

use chrono::Timelike;
use nalgebra::Vector3;

/// On-screen HUD
pub trait HudSink {
    fn show_message(&mut self, text: &str);

    fn set_score(&mut self, score: i32);

    fn set_score_visible(&mut self, visible: bool);

    /// Unhide every HUD element
    fn show_everything(&mut self) {}

    /// Keep the current message until it is replaced
    fn pin_message(&mut self) {}

    /// Restore message duration and panel layout
    fn restore_defaults(&mut self) {}
}

/// Experiment data log
pub trait LogSink {
    fn record(&mut self, line: &str, level: u8);
}

/// A tracked avatar (the participant, or its scaled twin)
pub trait AvatarTracker {
    fn position(&self) -> Vector3<f32>;

    /// Per-frame position logging on the host side
    fn set_nav_logging(&mut self, _enabled: bool) {}
}

/// Host time source
pub trait Clock {
    /// Seconds since the host started
    fn now(&self) -> f64;

    fn wall_second_of_minute(&self) -> u32 {
        chrono::Local::now().second()
    }
}

/// Monotonic clock anchored at creation
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Everything the task needs from the host, injected at construction
pub struct TaskBindings {
    pub hud: Box<dyn HudSink>,
    pub log: Box<dyn LogSink>,
    pub avatar: Box<dyn AvatarTracker>,
    /// Present when the experiment runs a scaled copy of the avatar
    pub scaled_avatar: Option<Box<dyn AvatarTracker>>,
    pub clock: Box<dyn Clock>,
}

impl TaskBindings {
    pub fn new(
        hud: impl HudSink + 'static,
        log: impl LogSink + 'static,
        avatar: impl AvatarTracker + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            hud: Box::new(hud),
            log: Box::new(log),
            avatar: Box::new(avatar),
            scaled_avatar: None,
            clock: Box::new(clock),
        }
    }

    pub fn with_scaled_avatar(mut self, scaled: impl AvatarTracker + 'static) -> Self {
        self.scaled_avatar = Some(Box::new(scaled));
        self
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled_avatar.is_some()
    }

    pub(crate) fn set_nav_logging(&mut self, enabled: bool) {
        self.avatar.set_nav_logging(enabled);
        if let Some(scaled) = self.scaled_avatar.as_mut() {
            scaled.set_nav_logging(enabled);
        }
    }
}

impl std::fmt::Debug for TaskBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBindings").field("scaled", &self.is_scaled()).finish_non_exhaustive()
    }
}
