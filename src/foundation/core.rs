use crate::foundation::error::{SynthError, SynthResult};

pub use nalgebra::{Matrix3, UnitQuaternion, Vector2, Vector3};

/// Absolute 0-based frame index in the engine timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Output image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> SynthResult<Self> {
        if width == 0 || height == 0 {
            return Err(SynthError::validation(
                "resolution width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Largest valid pixel coordinate on each axis.
    pub fn max_pixel(self) -> (f32, f32) {
        (
            self.width.saturating_sub(1) as f32,
            self.height.saturating_sub(1) as f32,
        )
    }

    /// Convert a normalized `[0, 1]` screen position into (rounded) pixel coordinates.
    pub fn to_pixels(self, normalized: Vector2<f32>) -> [f32; 2] {
        [
            (normalized.x * self.width as f32).round(),
            (normalized.y * self.height as f32).round(),
        ]
    }
}

/// Body model gender. The numeric value is what the annotation record stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male = 0,
    Female = 1,
}

impl Gender {
    /// Subjects alternate genders by local id: even ids are male, odd ids female.
    pub fn from_subject_id(subject_id: usize) -> Self {
        if subject_id % 2 == 0 {
            Self::Male
        } else {
            Self::Female
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Walking direction of the subject relative to the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl std::str::FromStr for Direction {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => Err(SynthError::validation(format!(
                "unknown direction '{other}' (expected 'forward' or 'backward')"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
