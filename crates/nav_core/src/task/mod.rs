//! # Navigation Task
//!
//! One navigation trial: the participant walks from wherever they stand to the
//! current destination. The task tracks path length and time, runs the score
//! penalty, hides/reveals the target and writes one output record at the end.
//!
//! ## Lifecycle
//! ```text
//! Idle --start--> Active --end--> Idle (record written)
//!                  |  ^
//!            pause |  | resume
//!                  v  |
//!                 Paused --end--> Idle (record written)
//!
//! Idle --start (skip)--> Skipped --end--> Idle (skip marker only, no record)
//! ```
//!
//! The host calls `tick` once per frame while the task is running.

mod odometer;
mod record;
mod reveal;
mod scoring;


pub use odometer::PathOdometer;
pub use record::{TrialContext, TrialRecord, OUTPUT_SOURCE, OUTPUT_TAG, TRIAL_HEADER};
pub use reveal::RevealSchedule;
pub use scoring::ScoreKeeper;

use crate::config::{NavigationConfig, TargetRevealMode};
use crate::destinations::{DestinationProvider, ObjectId, SceneObject};
use crate::error::{Result, TaskError};
use crate::host::TaskBindings;
use tracing::{debug, info, warn};

/// Experiment log level of the trial output block
pub const OUTPUT_LOG_LEVEL: u8 = 1;

/// Experiment log marker written when a skipped task starts
pub const SKIP_MARKER: &str = "INFO    skip task    ";

/// Per-frame input from the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Participant asked to see the target now
    pub manual_reveal: bool,
}

/// Data of the trial in progress
#[derive(Debug, Clone, PartialEq)]
pub struct TrialState {
    pub context: TrialContext,
    pub target_id: ObjectId,
    pub target_name: String,
    /// Straight-line distance at start; never recomputed
    pub optimal_distance: f32,
    pub start_time: f64,
    pub real_path: PathOdometer,
    pub scaled_path: Option<PathOdometer>,
    pub reveal: RevealSchedule,
}

impl TrialState {
    /// Distance used for the output record
    pub fn performance_distance(&self) -> f32 {
        match &self.scaled_path {
            Some(scaled) => scaled.distance(),
            None => self.real_path.distance(),
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TaskState {
    #[default]
    Idle,
    Skipped,
    Active(TrialState),
    Paused(TrialState),
}

impl TaskState {
    pub fn name(&self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Skipped => "skipped",
            TaskState::Active(_) => "active",
            TaskState::Paused(_) => "paused",
        }
    }

    pub fn trial(&self) -> Option<&TrialState> {
        match self {
            TaskState::Active(trial) | TaskState::Paused(trial) => Some(trial),
            _ => None,
        }
    }
}

/// Navigation trial tracker
#[derive(Debug)]
pub struct NavigationTask {
    config: NavigationConfig,
    bindings: TaskBindings,
    state: TaskState,
    score: ScoreKeeper,
    kill_requested: bool,
}

impl NavigationTask {
    pub fn new(config: NavigationConfig, bindings: TaskBindings) -> Result<Self> {
        config.validate()?;
        let score = ScoreKeeper::new(
            config.scoring_enabled,
            config.score_increment,
            config.penalty_interval_ms,
        );
        Ok(Self { config, bindings, state: TaskState::Idle, score, kill_requested: false })
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn trial(&self) -> Option<&TrialState> {
        self.state.trial()
    }

    pub fn score(&self) -> i32 {
        self.score.score()
    }

    /// Ask the task to finish on the next tick
    pub fn request_kill(&mut self) {
        self.kill_requested = true;
    }

    fn invalid(&self, op: &'static str) -> TaskError {
        TaskError::InvalidTransition { op, state: self.state.name() }
    }

    /// Begin a trial toward the destination list's current target
    pub fn start<D: DestinationProvider + ?Sized>(
        &mut self,
        destinations: &mut D,
        context: TrialContext,
    ) -> Result<()> {
        if !matches!(self.state, TaskState::Idle) {
            return Err(self.invalid("start"));
        }
        // A kill requested between trials belongs to no trial
        self.kill_requested = false;

        if self.config.skip {
            info!(task = %context.trial_label, "skip task");
            self.bindings
                .log
                .record(&format!("{}{}", SKIP_MARKER, context.trial_label), OUTPUT_LOG_LEVEL);
            self.state = TaskState::Skipped;
            return Ok(());
        }

        let target = destinations.current_target().ok_or(TaskError::NoCurrentTarget)?.clone();
        debug!(target_name = %target.name, id = %target.id, "find target");

        let hud = self.bindings.hud.as_mut();
        hud.show_everything();
        hud.set_score_visible(self.config.scoring_enabled);
        if self.config.instruction_template.is_none() {
            hud.pin_message();
        }
        hud.show_message(&self.config.instruction_for(&target.name));

        if self.config.hide_non_targets {
            let others: Vec<ObjectId> = destinations
                .all_targets()
                .iter()
                .filter(|d| d.id != target.id)
                .map(|d| d.id)
                .collect();
            for id in others {
                destinations.set_active(id, false)?;
            }
            destinations.set_active(target.id, true)?;
        }

        match self.config.reveal_mode {
            TargetRevealMode::Off => {
                destinations.set_active(target.id, true)?;
                destinations.set_renderer_enabled(target.id, true)?;
            }
            TargetRevealMode::SetInactive => destinations.set_active(target.id, false)?,
            TargetRevealMode::SetInvisible => {
                destinations.set_renderer_enabled(target.id, false)?
            }
        }

        let start_time = self.bindings.clock.now();
        let real_start = self.bindings.avatar.position();
        let scaled_start = self.bindings.scaled_avatar.as_ref().map(|a| a.position());

        // The scaled avatar is the one being measured when present
        let measured_from = scaled_start.unwrap_or(real_start);
        let optimal_distance = (target.position - measured_from).norm();

        self.bindings.set_nav_logging(true);

        self.state = TaskState::Active(TrialState {
            context,
            target_id: target.id,
            target_name: target.name,
            optimal_distance,
            start_time,
            real_path: PathOdometer::starting_at(real_start),
            scaled_path: scaled_start.map(PathOdometer::starting_at),
            reveal: RevealSchedule::new(
                self.config.reveal_mode,
                self.config.reveal_delay_secs,
                self.config.reveal_clock,
                start_time,
            ),
        });
        Ok(())
    }

    /// Advance one frame; returns true when the host should end the task
    pub fn tick<D: DestinationProvider + ?Sized>(
        &mut self,
        destinations: &mut D,
        dt: f32,
        input: FrameInput,
    ) -> Result<bool> {
        let trial = match &mut self.state {
            TaskState::Skipped => return Ok(true),
            TaskState::Active(trial) => trial,
            TaskState::Paused(_) => return Ok(false),
            TaskState::Idle => {
                return Err(TaskError::InvalidTransition { op: "tick", state: "idle" })
            }
        };

        // One HUD update per point removed, oldest first
        let removed = self.score.apply_penalty(dt) as i32;
        let score = self.score.score();
        for k in (0..removed).rev() {
            self.bindings.hud.set_score(score + k);
        }

        trial.real_path.update(self.bindings.avatar.position());
        if let (Some(path), Some(scaled)) =
            (trial.scaled_path.as_mut(), self.bindings.scaled_avatar.as_ref())
        {
            path.update(scaled.position());
        }

        let was_revealed = trial.reveal.is_revealed();
        let now = self.bindings.clock.now();
        let wall_second = self.bindings.clock.wall_second_of_minute();
        if trial.reveal.check(now, wall_second, input.manual_reveal) {
            destinations.set_active(trial.target_id, true)?;
            if self.config.reveal_enables_renderer {
                destinations.set_renderer_enabled(trial.target_id, true)?;
            }
            if !was_revealed {
                debug!(
                    target_name = %trial.target_name,
                    elapsed = now - trial.start_time,
                    "target revealed"
                );
            }
        }

        if self.kill_requested {
            self.kill_requested = false;
            warn!(target_name = %trial.target_name, "trial killed by host");
            return Ok(true);
        }

        Ok(false)
    }

    /// Contact between the avatar and a scene object.
    ///
    /// Returns true when the object is the current target or a direct child
    /// of it. A deactivated target cannot be touched.
    pub fn on_contact<D: DestinationProvider + ?Sized>(
        &mut self,
        destinations: &D,
        hit: SceneObject,
    ) -> bool {
        let TaskState::Active(trial) = &self.state else {
            return false;
        };

        if !hit.is_or_child_of(trial.target_id) {
            return false;
        }

        let contactable =
            destinations.get(trial.target_id).map(|d| d.is_contactable()).unwrap_or(false);
        if !contactable {
            return false;
        }

        if let Some(score) = self.score.reward() {
            self.bindings.hud.set_score(score);
        }
        debug!(target_name = %trial.target_name, hit = %hit.id, "target reached");
        true
    }

    /// Suspend the trial without finishing it
    pub fn pause(&mut self) -> Result<()> {
        let trial = match std::mem::take(&mut self.state) {
            TaskState::Active(trial) => trial,
            other => {
                self.state = other;
                return Err(self.invalid("pause"));
            }
        };

        self.bindings.set_nav_logging(false);
        self.bindings.hud.show_message("");
        self.bindings.hud.set_score_visible(false);
        info!(task = %trial.context.trial_label, "task paused");

        self.state = TaskState::Paused(trial);
        Ok(())
    }

    /// Continue a paused trial; distance and timers carry on
    pub fn resume(&mut self) -> Result<()> {
        let trial = match std::mem::take(&mut self.state) {
            TaskState::Paused(trial) => trial,
            other => {
                self.state = other;
                return Err(self.invalid("resume"));
            }
        };

        self.bindings.set_nav_logging(true);
        self.bindings.hud.set_score_visible(self.config.scoring_enabled);
        info!(task = %trial.context.trial_label, "task resumed");

        self.state = TaskState::Active(trial);
        Ok(())
    }

    /// Finish the trial and write its record.
    ///
    /// Returns `None` for a skipped task.
    pub fn end<D: DestinationProvider + ?Sized>(
        &mut self,
        destinations: &mut D,
    ) -> Result<Option<TrialRecord>> {
        let trial = match std::mem::take(&mut self.state) {
            TaskState::Active(trial) | TaskState::Paused(trial) => trial,
            TaskState::Skipped => {
                self.kill_requested = false;
                return Ok(None);
            }
            TaskState::Idle => {
                return Err(TaskError::InvalidTransition { op: "end", state: "idle" })
            }
        };
        self.kill_requested = false;

        self.bindings.set_nav_logging(false);

        if self.config.increment_list {
            destinations.advance();
        }

        let hud = self.bindings.hud.as_mut();
        hud.show_message("");
        hud.set_score_visible(false);
        hud.restore_defaults();

        let duration = (self.bindings.clock.now() - trial.start_time) as f32;
        let record = TrialRecord::new(
            &trial.context,
            &trial.target_name,
            trial.optimal_distance,
            trial.performance_distance(),
            duration,
        );

        self.bindings.log.record(&record.to_string(), OUTPUT_LOG_LEVEL);
        info!(
            target_name = %record.target_name,
            optimal = record.optimal_path,
            actual = record.actual_path,
            duration = record.route_duration,
            "trial complete"
        );

        Ok(Some(record))
    }
}
