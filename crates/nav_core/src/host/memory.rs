//! In-memory host collaborators
//!
//! Used by the scenario runner, the Godot bridge and tests. Each type is a
//! cheap handle over shared state: clone it, hand one copy to the task and
//! keep the other to drive or inspect it.

use super::{AvatarTracker, Clock, HudSink, LogSink};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// HUD call, in the order the task made it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HudEvent {
    Message { text: String },
    Score { score: i32 },
    ScoreVisible { visible: bool },
    ShowEverything,
    PinMessage,
    RestoreDefaults,
}

#[derive(Debug, Default)]
struct HudState {
    events: Vec<HudEvent>,
    message: String,
    score: i32,
    score_visible: bool,
}

/// Records HUD calls and tracks what is currently on screen
#[derive(Debug, Clone, Default)]
pub struct HudRecorder {
    inner: Rc<RefCell<HudState>>,
}

impl HudRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&self) -> String {
        self.inner.borrow().message.clone()
    }

    pub fn score(&self) -> i32 {
        self.inner.borrow().score
    }

    pub fn score_visible(&self) -> bool {
        self.inner.borrow().score_visible
    }

    pub fn events(&self) -> Vec<HudEvent> {
        self.inner.borrow().events.clone()
    }

    /// Take all events recorded so far
    pub fn drain(&self) -> Vec<HudEvent> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }
}

impl HudSink for HudRecorder {
    fn show_message(&mut self, text: &str) {
        let mut state = self.inner.borrow_mut();
        state.message = text.to_string();
        state.events.push(HudEvent::Message { text: text.to_string() });
    }

    fn set_score(&mut self, score: i32) {
        let mut state = self.inner.borrow_mut();
        state.score = score;
        state.events.push(HudEvent::Score { score });
    }

    fn set_score_visible(&mut self, visible: bool) {
        let mut state = self.inner.borrow_mut();
        state.score_visible = visible;
        state.events.push(HudEvent::ScoreVisible { visible });
    }

    fn show_everything(&mut self) {
        self.inner.borrow_mut().events.push(HudEvent::ShowEverything);
    }

    fn pin_message(&mut self) {
        self.inner.borrow_mut().events.push(HudEvent::PinMessage);
    }

    fn restore_defaults(&mut self) {
        self.inner.borrow_mut().events.push(HudEvent::RestoreDefaults);
    }
}

/// One experiment log write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub line: String,
    pub level: u8,
}

/// Collects experiment log lines
#[derive(Debug, Clone, Default)]
pub struct LogRecorder {
    entries: Rc<RefCell<Vec<LogEntry>>>,
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.line.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl LogSink for LogRecorder {
    fn record(&mut self, line: &str, level: u8) {
        self.entries.borrow_mut().push(LogEntry { line: line.to_string(), level });
    }
}

#[derive(Debug)]
struct AvatarState {
    position: Vector3<f32>,
    nav_logging: bool,
}

/// Avatar whose position is set by the caller each frame
#[derive(Debug, Clone)]
pub struct ScriptedAvatar {
    inner: Rc<RefCell<AvatarState>>,
}

impl ScriptedAvatar {
    pub fn at(position: Vector3<f32>) -> Self {
        Self { inner: Rc::new(RefCell::new(AvatarState { position, nav_logging: false })) }
    }

    pub fn move_to(&self, position: Vector3<f32>) {
        self.inner.borrow_mut().position = position;
    }

    pub fn nav_logging(&self) -> bool {
        self.inner.borrow().nav_logging
    }
}

impl AvatarTracker for ScriptedAvatar {
    fn position(&self) -> Vector3<f32> {
        self.inner.borrow().position
    }

    fn set_nav_logging(&mut self, enabled: bool) {
        self.inner.borrow_mut().nav_logging = enabled;
    }
}

/// Clock advanced by hand
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
    wall_second: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(seconds: f64) -> Self {
        let clock = Self::new();
        clock.now.set(seconds);
        clock
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set_wall_second(&self, second: u32) {
        self.wall_second.set(second % 60);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn wall_second_of_minute(&self) -> u32 {
        self.wall_second.get()
    }
}
