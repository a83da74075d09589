//! Trial identity and the end-of-trial output record

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column header of the trial output block
pub const TRIAL_HEADER: &str =
    "Task\tBlock\tTrial\tTargetName\tOptimalPath\tActualPath\tExcessPath\tRouteDuration";

/// Tag that opens every trial output block
pub const OUTPUT_TAG: &str = "LM_OUTPUT";

/// Source column of the tag line; analysis scripts match on it
pub const OUTPUT_SOURCE: &str = "NavigationTask.cs";

/// Where this trial sits in the experiment, supplied by the sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrialContext {
    /// Name of the enclosing experiment task (block owner)
    pub task_name: String,
    /// Repeat count of the enclosing task
    pub block_repeat: u32,
    /// Repeat count of the direct parent
    pub trial_repeat: u32,
    /// Name of this navigation task instance
    #[serde(default)]
    pub trial_label: String,
}

impl TrialContext {
    pub fn new(task_name: impl Into<String>, block_repeat: u32, trial_repeat: u32) -> Self {
        Self {
            task_name: task_name.into(),
            block_repeat,
            trial_repeat,
            trial_label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.trial_label = label.into();
        self
    }
}

/// Final performance of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub task: String,
    pub block: u32,
    pub trial: u32,
    pub target_name: String,
    pub optimal_path: f32,
    pub actual_path: f32,
    pub excess_path: f32,
    pub route_duration: f32,
    #[serde(skip)]
    pub trial_label: String,
}

impl TrialRecord {
    pub fn new(
        context: &TrialContext,
        target_name: &str,
        optimal_path: f32,
        actual_path: f32,
        route_duration: f32,
    ) -> Self {
        Self {
            task: context.task_name.clone(),
            block: context.block_repeat,
            trial: context.trial_repeat,
            target_name: target_name.to_string(),
            optimal_path,
            actual_path,
            excess_path: actual_path - optimal_path,
            route_duration,
            trial_label: context.trial_label.clone(),
        }
    }

    /// Tab-delimited data row (no header)
    pub fn row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.task,
            self.block,
            self.trial,
            self.target_name,
            self.optimal_path,
            self.actual_path,
            self.excess_path,
            self.route_duration
        )
    }
}

/// The full log block: tag line, header, data row
impl fmt::Display for TrialRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\n{}\n{}",
            OUTPUT_TAG,
            OUTPUT_SOURCE,
            self.task,
            self.trial_label,
            TRIAL_HEADER,
            self.row()
        )
    }
}
