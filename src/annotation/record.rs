use std::path::Path;

use ndarray as nd;

use crate::{
    body::rig::{NUM_JOINTS, NUM_SHAPE_COEFFS, POSE_DIM},
    foundation::core::{Gender, Vector3},
    foundation::error::{SynthError, SynthResult},
    scene::randomizer::{LightingCoeffs, NUM_LIGHT_COEFFS},
};

/// Motion-capture corpus a sequence comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MocapSource {
    Cmu,
    H36m,
}

impl MocapSource {
    /// Human3.6M sequences are prefixed with `h36m`; everything else is CMU.
    pub fn from_sequence_name(name: &str) -> Self {
        if name.starts_with("h36m") {
            Self::H36m
        } else {
            Self::Cmu
        }
    }
}

/// Clip-level metadata stored alongside the per-frame arrays.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipMeta {
    /// 1-based cut number.
    pub clip_no: usize,
    pub sequence: String,
    pub cam_dist: f32,
    pub stride: usize,
    pub source: MocapSource,
}

/// Values fixed while animating a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRow {
    pub pose: [f32; POSE_DIM],
    pub shape: [f32; NUM_SHAPE_COEFFS],
    pub zrot: f32,
    pub gender: Gender,
    pub vblur_factor: Option<f32>,
}

/// Values read back after rendering a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRow {
    pub joints2d: [[f32; 2]; NUM_JOINTS],
    pub joints3d: [[f32; 3]; NUM_JOINTS],
    pub light: LightingCoeffs,
    pub bg: String,
    pub cloth: String,
}

/// Ground truth for one clip. Per-frame arrays have the frame axis last.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationRecord {
    #[serde(rename = "joints2D")]
    pub joints2d: nd::Array3<f32>,
    #[serde(rename = "joints3D")]
    pub joints3d: nd::Array3<f32>,
    pub pose: nd::Array2<f32>,
    pub shape: nd::Array2<f32>,
    pub light: nd::Array2<f32>,
    pub zrot: nd::Array1<f32>,
    pub gender: Vec<u8>,
    pub bg: Vec<String>,
    pub cloth: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vblur_factor: Option<nd::Array1<f32>>,
    #[serde(rename = "camLoc")]
    pub cam_loc: [f32; 3],
    #[serde(flatten)]
    pub meta: ClipMeta,
}

impl AnnotationRecord {
    /// Number of frame slots.
    pub fn frames(&self) -> usize {
        self.zrot.len()
    }
}

/// Fills an [`AnnotationRecord`] frame by frame.
///
/// Rows never written keep their zero / empty defaults.
#[derive(Debug)]
pub struct AnnotationRecorder {
    record: AnnotationRecord,
}

impl AnnotationRecorder {
    pub fn allocate(n: usize, meta: ClipMeta, with_vblur: bool) -> Self {
        Self {
            record: AnnotationRecord {
                joints2d: nd::Array3::zeros((2, NUM_JOINTS, n)),
                joints3d: nd::Array3::zeros((3, NUM_JOINTS, n)),
                pose: nd::Array2::zeros((POSE_DIM, n)),
                shape: nd::Array2::zeros((NUM_SHAPE_COEFFS, n)),
                light: nd::Array2::zeros((NUM_LIGHT_COEFFS, n)),
                zrot: nd::Array1::zeros(n),
                gender: vec![0; n],
                bg: vec![String::new(); n],
                cloth: vec![String::new(); n],
                vblur_factor: with_vblur.then(|| nd::Array1::zeros(n)),
                cam_loc: [0.0; 3],
                meta,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.record.frames()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_index(&self, i: usize) -> SynthResult<()> {
        if i >= self.len() {
            return Err(SynthError::validation(format!(
                "annotation row {i} out of range (clip has {} frames)",
                self.len()
            )));
        }
        Ok(())
    }

    pub fn record_animation(&mut self, i: usize, row: &AnimationRow) -> SynthResult<()> {
        self.check_index(i)?;
        let r = &mut self.record;
        r.pose
            .column_mut(i)
            .assign(&nd::ArrayView1::from(&row.pose[..]));
        r.shape
            .column_mut(i)
            .assign(&nd::ArrayView1::from(&row.shape[..]));
        r.zrot[i] = row.zrot;
        r.gender[i] = row.gender.code();
        if let (Some(col), Some(v)) = (r.vblur_factor.as_mut(), row.vblur_factor) {
            col[i] = v;
        }
        Ok(())
    }

    pub fn record_capture(&mut self, i: usize, row: &CaptureRow) -> SynthResult<()> {
        self.check_index(i)?;
        let r = &mut self.record;
        for j in 0..NUM_JOINTS {
            for (axis, &v) in row.joints2d[j].iter().enumerate() {
                r.joints2d[[axis, j, i]] = v;
            }
            for (axis, &v) in row.joints3d[j].iter().enumerate() {
                r.joints3d[[axis, j, i]] = v;
            }
        }
        r.light
            .column_mut(i)
            .assign(&nd::ArrayView1::from(row.light.as_slice()));
        r.bg[i] = row.bg.clone();
        r.cloth[i] = row.cloth.clone();
        Ok(())
    }

    /// Camera location after the latest recenter.
    pub fn set_camera_location(&mut self, loc: Vector3<f32>) {
        self.record.cam_loc = [loc.x, loc.y, loc.z];
    }

    pub fn record(&self) -> &AnnotationRecord {
        &self.record
    }

    pub fn finalize(self) -> AnnotationRecord {
        self.record
    }
}

/// Path text as stored in the record.
pub fn path_label(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/record.rs"]
mod tests;
