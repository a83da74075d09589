use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Distance traveled along one position stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathOdometer {
    last_position: Vector3<f32>,
    distance: f32,
}

impl PathOdometer {
    /// Start measuring from `origin` (distance = 0)
    pub fn starting_at(origin: Vector3<f32>) -> Self {
        Self { last_position: origin, distance: 0.0 }
    }

    /// Add the step from the last known position; returns the step length.
    ///
    /// A non-finite position is skipped entirely: it adds nothing and the
    /// next step is measured from the last finite position.
    pub fn update(&mut self, position: Vector3<f32>) -> f32 {
        if !position.iter().all(|c| c.is_finite()) {
            return 0.0;
        }
        let step = (position - self.last_position).norm();
        self.distance += step;
        self.last_position = position;
        step
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn last_position(&self) -> Vector3<f32> {
        self.last_position
    }
}
