//! Destination objects and the ordered destination list
//!
//! The host owns the scene; this module only mirrors what the trial needs:
//! identity, name, position and the two visibility switches (`active` covers
//! rendering and contact, `renderer_enabled` covers rendering only).

use crate::error::{Result, TaskError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Scene object identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A candidate target placed in the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: ObjectId,
    pub name: String,
    pub position: Vector3<f32>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub renderer_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Destination {
    pub fn new(id: u32, name: impl Into<String>, position: Vector3<f32>) -> Self {
        Self { id: ObjectId(id), name: name.into(), position, active: true, renderer_enabled: true }
    }

    /// Drawn on screen
    pub fn is_rendered(&self) -> bool {
        self.active && self.renderer_enabled
    }

    /// Reachable by the avatar's contact checks
    pub fn is_contactable(&self) -> bool {
        self.active
    }
}

/// An object the avatar touched, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Direct parent in the scene hierarchy
    #[serde(default)]
    pub parent: Option<ObjectId>,
}

impl SceneObject {
    pub fn new(id: u32) -> Self {
        Self { id: ObjectId(id), parent: None }
    }

    pub fn child_of(id: u32, parent: u32) -> Self {
        Self { id: ObjectId(id), parent: Some(ObjectId(parent)) }
    }

    /// Is this the given object or one of its direct children
    pub fn is_or_child_of(&self, target: ObjectId) -> bool {
        self.id == target || self.parent == Some(target)
    }
}

/// Host-side list of destinations with a current pointer
pub trait DestinationProvider {
    fn current_target(&self) -> Option<&Destination>;

    fn all_targets(&self) -> &[Destination];

    /// Move the current pointer to the next destination
    fn advance(&mut self);

    fn set_active(&mut self, id: ObjectId, active: bool) -> Result<()>;

    fn set_renderer_enabled(&mut self, id: ObjectId, enabled: bool) -> Result<()>;

    fn get(&self, id: ObjectId) -> Option<&Destination> {
        self.all_targets().iter().find(|d| d.id == id)
    }
}

/// Ordered destination list; advancing past the end wraps to the first entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationList {
    objects: Vec<Destination>,
    #[serde(default)]
    current: usize,
}

impl DestinationList {
    pub fn new(objects: Vec<Destination>) -> Result<Self> {
        if objects.is_empty() {
            return Err(TaskError::EmptyDestinations);
        }
        Ok(Self { objects, current: 0 })
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Jump to a specific destination (host sequencer control)
    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.objects.len() {
            return Err(TaskError::NoCurrentTarget);
        }
        self.current = index;
        Ok(())
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut Destination> {
        self.objects
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(TaskError::UnknownObject { id: id.0 })
    }
}

impl DestinationProvider for DestinationList {
    fn current_target(&self) -> Option<&Destination> {
        self.objects.get(self.current)
    }

    fn all_targets(&self) -> &[Destination] {
        &self.objects
    }

    fn advance(&mut self) {
        if self.objects.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.objects.len();
    }

    fn set_active(&mut self, id: ObjectId, active: bool) -> Result<()> {
        self.get_mut(id)?.active = active;
        Ok(())
    }

    fn set_renderer_enabled(&mut self, id: ObjectId, enabled: bool) -> Result<()> {
        self.get_mut(id)?.renderer_enabled = enabled;
        Ok(())
    }
}
