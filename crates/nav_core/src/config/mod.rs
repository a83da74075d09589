//! # Navigation Task Configuration
//!
//! All knobs of a navigation trial in one serde struct, so experiment files
//! can set them from JSON or YAML.
//!
//! ## Usage
//! ```rust
//! use nav_core::config::NavigationConfig;
//!
//! let config = NavigationConfig::default();
//! let scored = NavigationConfig::scored();
//! assert!(scored.validate().is_ok());
//! ```

mod reveal_config;

pub use reveal_config::{RevealClock, TargetRevealMode};

use crate::error::{Result, TaskError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of the reveal delay in seconds (exclusive of a full minute)
pub const MAX_REVEAL_DELAY_SECS: f32 = 59.99;

/// Navigation trial settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NavigationConfig {
    /// Show and update a score on the HUD
    pub scoring_enabled: bool,
    /// Points awarded on reaching the target
    pub score_increment: i32,
    /// One point is lost per interval while the score is positive
    pub penalty_interval_ms: u32,
    pub reveal_mode: TargetRevealMode,
    /// Seconds before a hidden target is forced active (0 - 59.99)
    pub reveal_delay_secs: f32,
    pub reveal_clock: RevealClock,
    /// Also re-enable the renderer when a `SetInvisible` target is revealed
    pub reveal_enables_renderer: bool,
    /// Deactivate every destination except the current target
    pub hide_non_targets: bool,
    /// Instruction text; `{0}` or `{target}` is replaced by the target name
    pub instruction_template: Option<String>,
    /// Advance the destination list when the trial ends
    pub increment_list: bool,
    /// Skip the task entirely (host advances immediately)
    pub skip: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            scoring_enabled: false,
            score_increment: 50,
            penalty_interval_ms: 2000,
            reveal_mode: TargetRevealMode::Off,
            reveal_delay_secs: 0.0,
            reveal_clock: RevealClock::Elapsed,
            reveal_enables_renderer: false,
            hide_non_targets: false,
            instruction_template: None,
            increment_list: true,
            skip: false,
        }
    }
}

impl NavigationConfig {
    /// Scored navigation with the default reward/penalty
    pub fn scored() -> Self {
        Self { scoring_enabled: true, ..Self::default() }
    }

    /// Target hidden (inactive) until `delay_secs` have passed
    pub fn hidden_target(delay_secs: f32) -> Self {
        Self {
            reveal_mode: TargetRevealMode::SetInactive,
            reveal_delay_secs: delay_secs,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.penalty_interval_ms == 0 {
            return Err(TaskError::InvalidConfig(
                "penalty_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.score_increment < 0 {
            return Err(TaskError::InvalidConfig(format!(
                "score_increment must not be negative, got {}",
                self.score_increment
            )));
        }

        if !(0.0..=MAX_REVEAL_DELAY_SECS).contains(&self.reveal_delay_secs) {
            return Err(TaskError::InvalidConfig(format!(
                "reveal_delay_secs must be within 0..={}, got {}",
                MAX_REVEAL_DELAY_SECS, self.reveal_delay_secs
            )));
        }

        Ok(())
    }

    /// Render the HUD instruction for a target
    pub fn instruction_for(&self, target_name: &str) -> String {
        match &self.instruction_template {
            Some(template) => {
                template.replace("{0}", target_name).replace("{target}", target_name)
            }
            None => format!("Please find the {}", target_name),
        }
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = NavigationConfig::default();
        assert!(!cfg.scoring_enabled);
        assert_eq!(cfg.score_increment, 50);
        assert_eq!(cfg.penalty_interval_ms, 2000);
        assert_eq!(cfg.reveal_mode, TargetRevealMode::Off);
        assert_eq!(cfg.reveal_clock, RevealClock::Elapsed);
        assert!(cfg.increment_list);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(NavigationConfig::scored().scoring_enabled);

        let hidden = NavigationConfig::hidden_target(5.0);
        assert_eq!(hidden.reveal_mode, TargetRevealMode::SetInactive);
        assert!((hidden.reveal_delay_secs - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_range_delay() {
        let cfg = NavigationConfig::hidden_target(60.0);
        assert!(matches!(cfg.validate(), Err(TaskError::InvalidConfig(_))));

        let cfg = NavigationConfig::hidden_target(-1.0);
        assert!(cfg.validate().is_err());

        let cfg = NavigationConfig::hidden_target(MAX_REVEAL_DELAY_SECS);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = NavigationConfig { penalty_interval_ms: 0, ..NavigationConfig::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_instruction_template() {
        let mut cfg = NavigationConfig::default();
        assert_eq!(cfg.instruction_for("Bakery"), "Please find the Bakery");

        cfg.instruction_template = Some("Walk to the {0}. Hurry!".to_string());
        assert_eq!(cfg.instruction_for("Bakery"), "Walk to the Bakery. Hurry!");

        cfg.instruction_template = Some("Target: {target}".to_string());
        assert_eq!(cfg.instruction_for("Bank"), "Target: Bank");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = NavigationConfig::from_json(r#"{"scoring_enabled": true}"#).unwrap();
        assert!(cfg.scoring_enabled);
        assert_eq!(cfg.penalty_interval_ms, 2000);
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "reveal_mode: set_invisible\nreveal_delay_secs: 3.5\nhide_non_targets: true\n";
        let cfg = NavigationConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.reveal_mode, TargetRevealMode::SetInvisible);
        assert!(cfg.hide_non_targets);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = NavigationConfig::from_json("{not json").unwrap_err();
        assert!(err.is_config_error());
    }
}
