//! Trial Runner Library
//!
//! Scenario file (JSON/YAML) → scripted navigation session → trial records
//! Records → CSV summary, session report with SHA256 checksum of the log output

pub mod scenario;

use anyhow::{Context, Result};
use nav_core::host::{HudRecorder, LogRecorder, ManualClock, ScriptedAvatar};
use nav_core::{FrameInput, NavigationTask, TaskBindings, TrialRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub use scenario::{vec3, Scenario, ScenarioContact, ScenarioFrame, ScenarioTrial};

/// How a scripted trial finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    /// Avatar touched the target
    Reached,
    /// Host kill signal ended the trial
    Killed,
    /// Task configured to skip
    Skipped,
    /// Frames ran out before the target was reached
    Exhausted,
}

/// Result of one scripted trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSummary {
    pub outcome: TrialOutcome,
    /// Frames consumed, including the completing frame
    pub frames: usize,
    pub final_score: i32,
    pub record: Option<TrialRecord>,
}

/// 세션 리포트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub scenario: String,
    /// 생성 시각 (RFC3339 형식)
    pub created_at: String,
    pub trials: Vec<TrialSummary>,
    /// Experiment log lines in write order
    pub log_lines: Vec<String>,
    /// SHA256 of the log lines joined with '\n' (hex)
    pub checksum: String,
}

impl SessionReport {
    pub fn records(&self) -> impl Iterator<Item = &TrialRecord> {
        self.trials.iter().filter_map(|t| t.record.as_ref())
    }
}

/// Replay every trial of a scenario on one task instance
///
/// The destination pointer and the score carry over between trials, the same
/// way a host sequencer reuses one task across repeats.
pub fn run_scenario(scenario: &Scenario) -> Result<SessionReport> {
    let mut destinations = scenario.destination_list()?;

    let avatar = ScriptedAvatar::at(nalgebra::Vector3::zeros());
    let scaled = ScriptedAvatar::at(nalgebra::Vector3::zeros());
    let clock = ManualClock::new();
    let hud = HudRecorder::new();
    let log = LogRecorder::new();

    let mut bindings = TaskBindings::new(hud.clone(), log.clone(), avatar.clone(), clock.clone());
    if scenario.scaled {
        bindings = bindings.with_scaled_avatar(scaled.clone());
    }

    let mut task = NavigationTask::new(scenario.config.clone(), bindings)
        .context("Failed to create navigation task")?;

    let mut trials = Vec::with_capacity(scenario.trials.len());

    for (index, trial) in scenario.trials.iter().enumerate() {
        if let Some(start) = trial.start {
            avatar.move_to(vec3(start));
        }
        if let Some(start) = trial.scaled_start {
            scaled.move_to(vec3(start));
        }

        task.start(&mut destinations, trial.context.clone())
            .with_context(|| format!("Trial {}: start failed", index))?;

        let mut outcome = TrialOutcome::Exhausted;
        let mut frames = 0;

        for frame in &trial.frames {
            frames += 1;

            if frame.pause {
                task.pause().with_context(|| format!("Trial {} frame {}", index, frames))?;
            }
            if frame.resume {
                task.resume().with_context(|| format!("Trial {} frame {}", index, frames))?;
            }
            if let Some(p) = frame.avatar {
                avatar.move_to(vec3(p));
            }
            if let Some(p) = frame.scaled_avatar {
                scaled.move_to(vec3(p));
            }
            if frame.kill {
                task.request_kill();
            }

            clock.advance(frame.dt as f64);
            let input = FrameInput { manual_reveal: frame.manual_reveal };
            let completed = task
                .tick(&mut destinations, frame.dt, input)
                .with_context(|| format!("Trial {} frame {}: tick failed", index, frames))?;

            if completed {
                outcome = if task.config().skip {
                    TrialOutcome::Skipped
                } else {
                    TrialOutcome::Killed
                };
                break;
            }

            if let Some(contact) = frame.contact {
                if task.on_contact(&destinations, contact.into()) {
                    outcome = TrialOutcome::Reached;
                    break;
                }
            }
        }

        // A skipped task with no frames still completes on its own
        if task.config().skip {
            outcome = TrialOutcome::Skipped;
        }

        let record = task
            .end(&mut destinations)
            .with_context(|| format!("Trial {}: end failed", index))?;
        debug!(trial = index, ?outcome, frames, "trial finished");

        trials.push(TrialSummary { outcome, frames, final_score: task.score(), record });
    }

    let log_lines = log.lines();
    let checksum = checksum_lines(&log_lines);
    info!(scenario = %scenario.name, trials = trials.len(), %checksum, "session complete");

    Ok(SessionReport {
        scenario: scenario.name.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
        trials,
        log_lines,
        checksum,
    })
}

/// SHA256 over the log lines, newline-joined
pub fn checksum_lines(lines: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write one CSV row per logged trial
pub fn write_csv(path: &Path, report: &SessionReport) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    let mut rows = 0;
    for record in report.records() {
        writer.serialize(record).context("Failed to write CSV row")?;
        rows += 1;
    }
    writer.flush().context("Failed to flush CSV file")?;
    Ok(rows)
}

pub fn write_report(path: &Path, report: &SessionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::task::TRIAL_HEADER;

    fn scenario(json: serde_json::Value) -> Scenario {
        let scenario: Scenario = serde_json::from_value(json).unwrap();
        scenario.validate().unwrap();
        scenario
    }

    fn two_stores() -> Scenario {
        scenario(serde_json::json!({
            "name": "two-stores",
            "config": { "scoring_enabled": true },
            "destinations": [
                { "id": 1, "name": "Bakery", "position": [10.0, 0.0, 0.0] },
                { "id": 2, "name": "Bank", "position": [10.0, 0.0, 10.0] }
            ],
            "trials": [
                {
                    "context": { "task_name": "FindStores", "block_repeat": 1, "trial_repeat": 1 },
                    "start": [0.0, 0.0, 0.0],
                    "frames": [
                        { "dt": 0.5, "avatar": [0.0, 0.0, 2.5] },
                        { "dt": 0.5, "avatar": [0.0, 0.0, 0.0] },
                        { "dt": 0.5, "avatar": [5.0, 0.0, 0.0] },
                        { "dt": 0.5, "avatar": [10.0, 0.0, 0.0], "contact": { "id": 1 } }
                    ]
                },
                {
                    "context": { "task_name": "FindStores", "block_repeat": 1, "trial_repeat": 2 },
                    "frames": [
                        { "dt": 1.0, "avatar": [10.0, 0.0, 5.0] },
                        {
                            "dt": 1.0,
                            "avatar": [10.0, 0.0, 10.0],
                            "contact": { "id": 22, "parent": 2 }
                        }
                    ]
                }
            ]
        }))
    }

    #[test]
    fn test_detour_scenario() {
        let report = run_scenario(&two_stores()).unwrap();
        assert_eq!(report.trials.len(), 2);

        let first = &report.trials[0];
        assert_eq!(first.outcome, TrialOutcome::Reached);
        assert_eq!(first.frames, 4);
        let record = first.record.as_ref().unwrap();
        assert_eq!(record.target_name, "Bakery");
        assert_eq!(record.optimal_path, 10.0);
        assert_eq!(record.actual_path, 15.0);
        assert_eq!(record.excess_path, 5.0);
        assert_eq!(record.route_duration, 2.0);
        assert_eq!(first.final_score, 50);

        // Pointer advanced: second trial goes to the bank via a child object
        let second = report.trials[1].record.as_ref().unwrap();
        assert_eq!(second.target_name, "Bank");
        assert_eq!(second.optimal_path, 10.0);
        assert_eq!(report.trials[1].outcome, TrialOutcome::Reached);
        // Score carried over: 50 - 1 (2s elapsed) + 50
        assert_eq!(report.trials[1].final_score, 99);

        assert_eq!(report.log_lines.len(), 2);
        assert!(report.log_lines[0].contains(TRIAL_HEADER));
        assert!(report.log_lines[0].ends_with("FindStores\t1\t1\tBakery\t10\t15\t5\t2"));
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = run_scenario(&two_stores()).unwrap();
        let b = run_scenario(&two_stores()).unwrap();
        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.checksum.len(), 64);
        assert_eq!(a.checksum, checksum_lines(&a.log_lines));
    }

    #[test]
    fn test_exhausted_and_killed_trials() {
        let s = scenario(serde_json::json!({
            "destinations": [ { "id": 1, "name": "Park", "position": [0.0, 0.0, 50.0] } ],
            "config": { "increment_list": false },
            "trials": [
                {
                    "context": { "task_name": "T", "block_repeat": 1, "trial_repeat": 1 },
                    "frames": [ { "dt": 1.0, "avatar": [0.0, 0.0, 1.0] } ]
                },
                {
                    "context": { "task_name": "T", "block_repeat": 1, "trial_repeat": 2 },
                    "start": [0.0, 0.0, 0.0],
                    "frames": [
                        { "dt": 1.0, "avatar": [0.0, 0.0, 3.0], "kill": true },
                        { "dt": 1.0, "avatar": [0.0, 0.0, 9.0] }
                    ]
                }
            ]
        }));

        let report = run_scenario(&s).unwrap();
        assert_eq!(report.trials[0].outcome, TrialOutcome::Exhausted);
        assert_eq!(report.trials[1].outcome, TrialOutcome::Killed);
        assert_eq!(report.trials[1].frames, 1);
        assert_eq!(report.trials[1].record.as_ref().unwrap().actual_path, 3.0);
        assert_eq!(report.log_lines.len(), 2);
    }

    #[test]
    fn test_skipped_task_writes_only_marker() {
        let s = scenario(serde_json::json!({
            "config": { "skip": true },
            "destinations": [ { "id": 1, "name": "Park", "position": [0.0, 0.0, 5.0] } ],
            "trials": [
                {
                    "context": {
                        "task_name": "T",
                        "block_repeat": 1,
                        "trial_repeat": 1,
                        "trial_label": "SkipMe"
                    },
                    "frames": [ { "dt": 0.1 } ]
                }
            ]
        }));

        let report = run_scenario(&s).unwrap();
        assert_eq!(report.trials[0].outcome, TrialOutcome::Skipped);
        assert!(report.trials[0].record.is_none());
        assert_eq!(report.log_lines, vec!["INFO    skip task    SkipMe".to_string()]);
    }

    #[test]
    fn test_pause_frames_do_not_count_distance() {
        let s = scenario(serde_json::json!({
            "destinations": [ { "id": 1, "name": "Park", "position": [0.0, 0.0, 10.0] } ],
            "trials": [
                {
                    "context": { "task_name": "T", "block_repeat": 1, "trial_repeat": 1 },
                    "frames": [
                        { "dt": 1.0, "avatar": [0.0, 0.0, 4.0] },
                        { "dt": 1.0, "avatar": [0.0, 0.0, 40.0], "pause": true },
                        { "dt": 1.0, "avatar": [0.0, 0.0, 4.0], "resume": true },
                        { "dt": 1.0, "avatar": [0.0, 0.0, 10.0], "contact": { "id": 1 } }
                    ]
                }
            ]
        }));

        let report = run_scenario(&s).unwrap();
        let record = report.trials[0].record.as_ref().unwrap();
        assert_eq!(record.actual_path, 10.0);
        assert_eq!(record.route_duration, 4.0);
    }

    #[test]
    fn test_write_csv_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_scenario(&two_stores()).unwrap();

        let csv_path = dir.path().join("out/trials.csv");
        assert_eq!(write_csv(&csv_path, &report).unwrap(), 2);
        let csv_text = fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "task,block,trial,target_name,optimal_path,actual_path,excess_path,route_duration"
        );
        assert_eq!(csv_text.lines().count(), 3);

        let report_path = dir.path().join("report.json");
        write_report(&report_path, &report).unwrap();
        let parsed: SessionReport =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(parsed.checksum, report.checksum);
    }

    #[test]
    fn test_bundled_town_walk_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/town_walk.yaml");
        let scenario = Scenario::load(&path).unwrap();
        let report = run_scenario(&scenario).unwrap();

        let outcomes: Vec<_> = report.trials.iter().map(|t| t.outcome).collect();
        assert_eq!(outcomes, vec![TrialOutcome::Reached, TrialOutcome::Reached]);

        let bakery = report.trials[0].record.as_ref().unwrap();
        assert_eq!(bakery.target_name, "Bakery");
        assert_eq!(bakery.optimal_path, 10.0);
        assert_eq!(bakery.actual_path, 20.0);
        assert_eq!(bakery.excess_path, 10.0);
        assert_eq!(report.trials[0].final_score, 50);

        // One penalty point lost on the way to the Bank, then rewarded again
        let bank = report.trials[1].record.as_ref().unwrap();
        assert_eq!(bank.target_name, "Bank");
        assert!((bank.optimal_path - 200f32.sqrt()).abs() < 1e-4);
        assert_eq!(bank.actual_path, 20.0);
        assert_eq!(report.trials[1].final_score, 99);

        assert_eq!(report.log_lines.len(), 2);
        assert!(report.log_lines[1].contains("\tFindBank\n"));
    }
}
