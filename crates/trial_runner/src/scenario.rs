//! Scenario files: a destination layout plus scripted avatar frames

use anyhow::{bail, Context, Result};
use nalgebra::Vector3;
use nav_core::{Destination, DestinationList, NavigationConfig, SceneObject, TrialContext};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn default_dt() -> f32 {
    1.0 / 60.0
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioDestination {
    pub id: u32,
    pub name: String,
    /// World position [x, y, z]
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioContact {
    pub id: u32,
    #[serde(default)]
    pub parent: Option<u32>,
}

impl From<ScenarioContact> for SceneObject {
    fn from(contact: ScenarioContact) -> Self {
        match contact.parent {
            Some(parent) => SceneObject::child_of(contact.id, parent),
            None => SceneObject::new(contact.id),
        }
    }
}

/// One host frame
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioFrame {
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Avatar position this frame; unchanged when omitted
    #[serde(default)]
    pub avatar: Option<[f32; 3]>,
    #[serde(default)]
    pub scaled_avatar: Option<[f32; 3]>,
    /// Object touched after the frame's update
    #[serde(default)]
    pub contact: Option<ScenarioContact>,
    #[serde(default)]
    pub manual_reveal: bool,
    #[serde(default)]
    pub kill: bool,
    #[serde(default)]
    pub pause: bool,
    #[serde(default)]
    pub resume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioTrial {
    pub context: TrialContext,
    /// Teleport the avatar here before the trial starts
    #[serde(default)]
    pub start: Option<[f32; 3]>,
    #[serde(default)]
    pub scaled_start: Option<[f32; 3]>,
    #[serde(default)]
    pub frames: Vec<ScenarioFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: NavigationConfig,
    /// Track a scaled avatar alongside the real one
    #[serde(default)]
    pub scaled: bool,
    pub destinations: Vec<ScenarioDestination>,
    pub trials: Vec<ScenarioTrial>,
}

impl Scenario {
    /// Load a scenario; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let scenario: Scenario = if is_yaml {
            serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse YAML scenario: {}", path.display()))?
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse JSON scenario: {}", path.display()))?
        };

        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate().context("Invalid navigation config")?;

        if self.destinations.is_empty() {
            bail!("Scenario has no destinations");
        }

        let mut seen = HashSet::new();
        for d in &self.destinations {
            if !seen.insert(d.id) {
                bail!("Duplicate destination id {}", d.id);
            }
        }

        for (t, trial) in self.trials.iter().enumerate() {
            for (f, frame) in trial.frames.iter().enumerate() {
                if frame.dt.is_nan() || frame.dt < 0.0 {
                    bail!("Trial {} frame {}: dt must be >= 0, got {}", t, f, frame.dt);
                }
                if frame.pause && frame.resume {
                    bail!("Trial {} frame {}: pause and resume in the same frame", t, f);
                }
            }
        }

        Ok(())
    }

    pub fn destination_list(&self) -> Result<DestinationList> {
        let objects = self
            .destinations
            .iter()
            .map(|d| Destination::new(d.id, d.name.clone(), vec3(d.position)))
            .collect();
        Ok(DestinationList::new(objects)?)
    }

    pub fn frame_count(&self) -> usize {
        self.trials.iter().map(|t| t.frames.len()).sum()
    }
}

pub fn vec3(p: [f32; 3]) -> Vector3<f32> {
    Vector3::new(p[0], p[1], p[2])
}
