use std::path::{Path, PathBuf};

use ndarray as nd;

use crate::{
    body::solver::shape_coeffs,
    body::rig::NUM_SHAPE_COEFFS,
    config::ClothingOption,
    foundation::core::Gender,
    foundation::error::{SynthError, SynthResult},
    scene::seed::JobRng,
};

/// Number of spherical-harmonics lighting coefficients.
pub const NUM_LIGHT_COEFFS: usize = 9;

/// Spherical-harmonics lighting for the clip. `0` is the ambient term.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightingCoeffs(pub [f32; NUM_LIGHT_COEFFS]);

impl LightingCoeffs {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Position of the randomizer in its fixed draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStage {
    MotionBlur,
    Background,
    Lighting,
    Exhausted,
}

/// Owns the job RNG and hands out scene draws in a fixed order.
///
/// The order is part of the reproducibility contract: motion-blur factor (only when that channel
/// is enabled), then background, then lighting. Asking out of order is an error instead of a
/// silently different dataset.
#[derive(Debug)]
pub struct SceneRandomizer {
    rng: JobRng,
    stage: DrawStage,
}

impl SceneRandomizer {
    pub fn new(rng: JobRng, motion_blur: bool) -> Self {
        let stage = if motion_blur {
            DrawStage::MotionBlur
        } else {
            DrawStage::Background
        };
        Self { rng, stage }
    }

    pub fn stage(&self) -> DrawStage {
        self.stage
    }

    fn advance(&mut self, expected: DrawStage, next: DrawStage) -> SynthResult<()> {
        if self.stage != expected {
            return Err(SynthError::phase(format!(
                "randomizer draw {expected:?} requested while at {:?}",
                self.stage
            )));
        }
        self.stage = next;
        Ok(())
    }

    /// Vector-blur strength, `N(0.5, 0.5)`.
    pub fn draw_motion_blur_factor(&mut self) -> SynthResult<f32> {
        self.advance(DrawStage::MotionBlur, DrawStage::Background)?;
        self.rng.normal(0.5, 0.5)
    }

    pub fn choose_background<'a>(&mut self, backgrounds: &'a [PathBuf]) -> SynthResult<&'a Path> {
        self.advance(DrawStage::Background, DrawStage::Lighting)?;
        let i = self
            .rng
            .index(backgrounds.len())
            .map_err(|_| SynthError::precondition("background list is empty"))?;
        Ok(&backgrounds[i])
    }

    /// Nine coefficients uniform in `[-0.7, 0.7)`, then the ambient term is redrawn in
    /// `[0.5, 1.4)` and the second term in `(-0.7, 0]`.
    pub fn draw_lighting(&mut self) -> SynthResult<LightingCoeffs> {
        self.advance(DrawStage::Lighting, DrawStage::Exhausted)?;
        let mut c = [0.0f32; NUM_LIGHT_COEFFS];
        for v in &mut c {
            *v = 0.7 * (2.0 * self.rng.uniform() - 1.0);
        }
        c[0] = 0.5 + 0.9 * self.rng.uniform();
        c[1] = -0.7 * self.rng.uniform();
        Ok(LightingCoeffs(c))
    }
}

/// Keep the clothing textures allowed by `option`.
pub fn filter_clothing(textures: Vec<PathBuf>, option: ClothingOption) -> Vec<PathBuf> {
    let is_nongrey = |p: &PathBuf| p.to_string_lossy().contains("nongrey");
    match option {
        ClothingOption::All => textures,
        ClothingOption::Grey => textures.into_iter().filter(|p| !is_nongrey(p)).collect(),
        ClothingOption::Nongrey => textures.into_iter().filter(is_nongrey).collect(),
    }
}

/// Per-subject appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectAssets {
    pub gender: Gender,
    pub clothing: PathBuf,
    pub shape: [f32; NUM_SHAPE_COEFFS],
}

/// Pick gender, clothing and body shape for a local subject id.
///
/// Selection is by direct index, not random: the same subject id always gets the same
/// clothing texture (from the gender's filtered list) and the same shape row.
pub fn select_subject(
    subject_id: usize,
    clothing: &[PathBuf],
    shapes: &nd::Array2<f32>,
) -> SynthResult<SubjectAssets> {
    let gender = Gender::from_subject_id(subject_id);
    let texture = clothing.get(subject_id).ok_or_else(|| {
        SynthError::precondition(format!(
            "subject {subject_id} has no clothing texture ({} available for {})",
            clothing.len(),
            gender.as_str()
        ))
    })?;
    if subject_id >= shapes.nrows() {
        return Err(SynthError::precondition(format!(
            "subject {subject_id} has no body shape ({} available for {})",
            shapes.nrows(),
            gender.as_str()
        )));
    }
    let row: Vec<f32> = shapes.row(subject_id).to_vec();
    Ok(SubjectAssets {
        gender,
        clothing: texture.clone(),
        shape: shape_coeffs(&row)?,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/scene/randomizer.rs"]
mod tests;
