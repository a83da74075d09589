//! Target reveal settings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the target is hidden when a trial starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetRevealMode {
    /// Target active and rendered from the first frame
    #[default]
    Off,
    /// Target deactivated: not rendered and not contactable until revealed
    SetInactive,
    /// Only the renderer is disabled; contact still counts.
    ///
    /// The reveal only reactivates the target, so it stays invisible for the
    /// rest of the session (later trials included) unless
    /// `reveal_enables_renderer` is set.
    SetInvisible,
}

impl TargetRevealMode {
    pub fn hides_target(self) -> bool {
        !matches!(self, TargetRevealMode::Off)
    }
}

/// Time base for the delayed reveal check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RevealClock {
    /// Host seconds elapsed since the trial started
    #[default]
    Elapsed,
    /// Wall-clock second-of-minute minus the trial start time.
    ///
    /// Wraps every 60 seconds. Only for parity with data collected by older
    /// builds of the experiment.
    WallSecondOfMinute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_mode_serde_names() {
        let json = serde_json::to_string(&TargetRevealMode::SetInvisible).unwrap();
        assert_eq!(json, "\"set_invisible\"");

        let parsed: TargetRevealMode = serde_json::from_str("\"set_inactive\"").unwrap();
        assert_eq!(parsed, TargetRevealMode::SetInactive);
    }

    #[test]
    fn test_only_off_keeps_target_visible() {
        assert!(!TargetRevealMode::Off.hides_target());
        assert!(TargetRevealMode::SetInactive.hides_target());
        assert!(TargetRevealMode::SetInvisible.hides_target());
    }
}
