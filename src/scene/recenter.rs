use crate::foundation::core::{Direction, Resolution, Vector3};

/// Keeps the subject in frame by moving the camera along with the pelvis.
///
/// The camera keeps its setup offset from a reference pelvis position; recentering places it at
/// `original_camera + (pelvis_now - reference_pelvis)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecenterPolicy {
    original_camera: Vector3<f32>,
    reference_pelvis: Vector3<f32>,
}

impl RecenterPolicy {
    /// `pelvis_at_setup` is the pelvis world position before any pose is applied.
    pub fn new(
        original_camera: Vector3<f32>,
        pelvis_at_setup: Vector3<f32>,
        direction: Direction,
    ) -> Self {
        Self {
            original_camera,
            reference_pelvis: pelvis_at_setup - Self::framing_offset(direction),
        }
    }

    /// Where the subject sits relative to the camera axis at setup, per walking direction.
    pub fn framing_offset(direction: Direction) -> Vector3<f32> {
        match direction {
            Direction::Forward => Vector3::new(-1.0, 0.75, -1.15),
            Direction::Backward => Vector3::new(-1.0, 0.75, 3.1),
        }
    }

    pub fn original_camera(&self) -> Vector3<f32> {
        self.original_camera
    }

    pub fn reference_pelvis(&self) -> Vector3<f32> {
        self.reference_pelvis
    }

    pub fn camera_for(&self, pelvis_now: Vector3<f32>) -> Vector3<f32> {
        self.original_camera + (pelvis_now - self.reference_pelvis)
    }

    /// True iff any joint lies outside the pixel grid `[0, w-1] x [0, h-1]`.
    pub fn needs_recenter(joints2d: &[[f32; 2]], resolution: Resolution) -> bool {
        let (max_x, max_y) = resolution.max_pixel();
        joints2d
            .iter()
            .any(|&[x, y]| x < 0.0 || x > max_x || y < 0.0 || y > max_y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/recenter.rs"]
mod tests;
