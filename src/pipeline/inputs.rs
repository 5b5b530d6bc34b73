//! On-disk inputs of a job: the sequence catalog, body model data and asset lists.

use std::collections::BTreeMap;
use std::io::BufRead as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use ndarray as nd;

use crate::{
    body::rig::{NUM_JOINTS, NUM_SHAPE_COEFFS, POSE_DIM},
    body::solver::PoseFrame,
    foundation::core::{Gender, Vector3},
    foundation::error::{SynthError, SynthResult},
};

fn open_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> SynthResult<T> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(f))
        .map_err(|e| SynthError::serde(format!("parse {what} '{}': {e}", path.display())))
}

/// One row of the sequence index.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub nb_frames: usize,
}

/// Ordered index of every mocap sequence; dataset indices wrap around it.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SequenceCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl SequenceCatalog {
    pub fn from_path(path: &Path) -> SynthResult<Self> {
        let cat: Self = open_json(path, "sequence catalog")?;
        if cat.entries.is_empty() {
            return Err(SynthError::validation("sequence catalog is empty"));
        }
        Ok(cat)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Per-frame SMPL parameters of one mocap sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MotionSequence {
    pub poses: Vec<Vec<f32>>,
    pub trans: Vec<[f32; 3]>,
}

impl MotionSequence {
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn validate(&self, name: &str) -> SynthResult<()> {
        if self.poses.len() != self.trans.len() {
            return Err(SynthError::validation(format!(
                "sequence '{name}' has {} poses but {} translations",
                self.poses.len(),
                self.trans.len()
            )));
        }
        if let Some(i) = self.poses.iter().position(|p| p.len() != POSE_DIM) {
            return Err(SynthError::validation(format!(
                "sequence '{name}' frame {i} has {} pose values, expected {POSE_DIM}",
                self.poses[i].len()
            )));
        }
        Ok(())
    }

    /// Drop known-bad frame ranges of specific captures.
    pub fn trimmed(mut self, name: &str) -> Self {
        match name {
            "05_01" => {
                let keep = self.poses.len().saturating_sub(100);
                self.poses.truncate(keep);
                self.trans.truncate(keep);
            }
            "10_04" => {
                let skip = self.poses.len().min(60);
                self.poses.drain(..skip);
                self.trans.drain(..skip.min(self.trans.len()));
            }
            _ => {}
        }
        self
    }

    pub fn frame(&self, i: usize, shape: &[f32; NUM_SHAPE_COEFFS]) -> SynthResult<PoseFrame> {
        let (pose, t) = self
            .poses
            .get(i)
            .zip(self.trans.get(i))
            .ok_or_else(|| SynthError::validation(format!("mocap frame {i} out of range")))?;
        PoseFrame::new(pose, Vector3::new(t[0], t[1], t[2]), shape)
    }
}

/// Body model data: joint regression, per-gender shape tables and the mocap sequences.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BodyData {
    pub regression_verts: Vec<usize>,
    /// `24 x K` rows over `regression_verts`.
    pub joint_regressor: Vec<Vec<f32>>,
    pub maleshapes: Vec<Vec<f32>>,
    pub femaleshapes: Vec<Vec<f32>>,
    /// Neutral template mesh; only needed by engines without their own body asset.
    #[serde(default)]
    pub v_template: Vec<[f32; 3]>,
    pub sequences: BTreeMap<String, MotionSequence>,
}

impl BodyData {
    pub fn from_path(path: &Path) -> SynthResult<Self> {
        let data: Self = open_json(path, "body data")?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> SynthResult<()> {
        let k = self.regression_verts.len();
        if self.joint_regressor.len() != NUM_JOINTS
            || self.joint_regressor.iter().any(|r| r.len() != k)
        {
            return Err(SynthError::validation(format!(
                "joint_regressor must be {NUM_JOINTS}x{k}"
            )));
        }
        for (name, seq) in &self.sequences {
            seq.validate(name)?;
        }
        Ok(())
    }

    pub fn joint_regressor(&self) -> SynthResult<nd::Array2<f32>> {
        rows_to_array(&self.joint_regressor, self.regression_verts.len())
    }

    /// Shape table of one gender, truncated to the coefficients the rig uses.
    pub fn shapes(&self, gender: Gender) -> SynthResult<nd::Array2<f32>> {
        let rows = match gender {
            Gender::Male => &self.maleshapes,
            Gender::Female => &self.femaleshapes,
        };
        let table = rows_to_array(rows, rows.first().map_or(NUM_SHAPE_COEFFS, Vec::len))?;
        if table.ncols() < NUM_SHAPE_COEFFS {
            return Err(SynthError::validation(format!(
                "{} shapes need at least {NUM_SHAPE_COEFFS} coefficients",
                gender.as_str()
            )));
        }
        Ok(table
            .slice_axis(nd::Axis(1), nd::Slice::from(..NUM_SHAPE_COEFFS))
            .to_owned())
    }

    /// Sequence by name with per-capture trimming applied.
    pub fn sequence(&self, name: &str) -> SynthResult<MotionSequence> {
        self.sequences
            .get(name)
            .cloned()
            .map(|s| s.trimmed(name))
            .ok_or_else(|| SynthError::precondition(format!("no mocap data for sequence '{name}'")))
    }

    pub fn template_vertices(&self) -> Vec<Vector3<f32>> {
        self.v_template
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect()
    }
}

fn rows_to_array(rows: &[Vec<f32>], cols: usize) -> SynthResult<nd::Array2<f32>> {
    let mut flat = Vec::with_capacity(rows.len() * cols);
    for (i, r) in rows.iter().enumerate() {
        if r.len() != cols {
            return Err(SynthError::validation(format!(
                "row {i} has {} values, expected {cols}",
                r.len()
            )));
        }
        flat.extend_from_slice(r);
    }
    nd::Array2::from_shape_vec((rows.len(), cols), flat)
        .map_err(|e| SynthError::validation(format!("matrix shape: {e}")))
}

/// Read a newline-separated asset list, resolving each non-empty line against `base`.
pub fn read_asset_list(list: &Path, base: &Path) -> SynthResult<Vec<PathBuf>> {
    let f = std::fs::File::open(list)
        .with_context(|| format!("open asset list '{}'", list.display()))?;
    let mut out = Vec::new();
    for line in std::io::BufReader::new(f).lines() {
        let line = line.with_context(|| format!("read asset list '{}'", list.display()))?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(base.join(line));
        }
    }
    Ok(out)
}

/// `bg.txt` inside the background directory.
pub fn background_list(bg_path: &Path) -> SynthResult<Vec<PathBuf>> {
    read_asset_list(&bg_path.join("bg.txt"), bg_path)
}

/// `textures/{gender}_train.txt`; entries are relative to the body data folder.
pub fn clothing_list(smpl_data_folder: &Path, gender: Gender) -> SynthResult<Vec<PathBuf>> {
    let list = smpl_data_folder
        .join("textures")
        .join(format!("{}_train.txt", gender.as_str()));
    read_asset_list(&list, smpl_data_folder)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/inputs.rs"]
mod tests;
