use std::path::{Path, PathBuf};

use crate::{
    foundation::core::Resolution,
    foundation::error::{SynthError, SynthResult},
};

/// Which clothing textures subjects may wear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingOption {
    /// Scan-based textures only (file names without `nongrey`).
    Grey,
    Nongrey,
    #[default]
    All,
}

/// Optional render channels. The composite image is always produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputTypes {
    pub depth: bool,
    pub normal: bool,
    #[serde(rename = "gtflow")]
    pub flow: bool,
    #[serde(rename = "segm")]
    pub segmentation: bool,
    #[serde(rename = "fg")]
    pub foreground: bool,
    #[serde(rename = "vblur")]
    pub motion_blur: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Generator settings shared by every job of a dataset run.
pub struct SynthConfig {
    pub resolution: Resolution,
    /// Take every `stepsize`-th mocap frame.
    pub stepsize: usize,
    /// Sampled frames per clip.
    pub clipsize: usize,
    /// Hard cap on animated/rendered frames per clip. Annotation rows past it stay empty.
    pub max_frames: usize,
    pub camera_distance: f32,
    pub fps: u32,
    pub clothing_option: ClothingOption,
    pub output_types: OutputTypes,
    pub tmp_path: PathBuf,
    pub output_path: PathBuf,
    /// Directory holding `bg.txt` and the background images it lists.
    pub bg_path: PathBuf,
    /// Directory holding body model data and `textures/{gender}_train.txt`.
    pub smpl_data_folder: PathBuf,
    /// Body model and mocap catalog file inside `smpl_data_folder`.
    pub smpl_data_filename: String,
    /// Draw the projected skeleton onto composite frames.
    pub draw_skeleton: bool,
    pub encode_videos: bool,
    pub archive_frames: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                width: 320,
                height: 240,
            },
            stepsize: 1,
            clipsize: 100,
            max_frames: 122,
            camera_distance: 11.0,
            fps: 25,
            clothing_option: ClothingOption::All,
            output_types: OutputTypes::default(),
            tmp_path: PathBuf::from("tmp"),
            output_path: PathBuf::from("output"),
            bg_path: PathBuf::from("backgrounds"),
            smpl_data_folder: PathBuf::from("smpl_data"),
            smpl_data_filename: "smpl_data.json".to_string(),
            draw_skeleton: false,
            encode_videos: true,
            archive_frames: true,
        }
    }
}

impl SynthConfig {
    pub fn from_path(path: &Path) -> SynthResult<Self> {
        let f = std::fs::File::open(path).map_err(|e| {
            SynthError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let r = std::io::BufReader::new(f);
        Self::from_reader(r)
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> SynthResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| SynthError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SynthResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(SynthError::validation(
                "resolution width/height must be > 0",
            ));
        }
        if self.stepsize == 0 {
            return Err(SynthError::validation("stepsize must be > 0"));
        }
        if self.clipsize == 0 {
            return Err(SynthError::validation("clipsize must be > 0"));
        }
        if self.max_frames == 0 {
            return Err(SynthError::validation("max_frames must be > 0"));
        }
        if self.fps == 0 {
            return Err(SynthError::validation("fps must be > 0"));
        }
        if !(self.camera_distance.is_finite() && self.camera_distance > 0.0) {
            return Err(SynthError::validation(
                "camera_distance must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Body model data file.
    pub fn smpl_data_path(&self) -> PathBuf {
        self.smpl_data_folder.join(&self.smpl_data_filename)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
