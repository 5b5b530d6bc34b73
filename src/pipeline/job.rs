use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    annotation::sink::annotation_path,
    config::SynthConfig,
    foundation::core::Direction,
    foundation::error::{SynthError, SynthResult},
    pipeline::inputs::SequenceCatalog,
    render::graph::ChannelPaths,
    scene::seed::JobSeed,
};

/// Stride used when a request does not name one.
pub const DEFAULT_STRIDE: usize = 50;

/// What a caller asks for: one clip of one sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobRequest {
    /// Dataset index; indices past the catalog length select later run passes.
    pub idx: usize,
    /// Sequence name; overrides the catalog position when it matches an entry.
    pub name: Option<String>,
    /// 0-based clip (cut) within the sequence.
    pub cut: usize,
    pub stride: Option<usize>,
    #[serde(default)]
    pub direction: Direction,
    /// Local subject id; picks gender, clothing and body shape.
    #[serde(default)]
    pub subject_id: usize,
}

/// Number of clips a sequence of `nb_frames` yields: `max(1, ceil((nb_frames - (clip_len -
/// stride)) / stride))`.
pub fn max_cuts(nb_frames: usize, clip_len: usize, stride: usize) -> SynthResult<usize> {
    if stride == 0 {
        return Err(SynthError::validation("stride must be > 0"));
    }
    let overhang = nb_frames as i64 - (clip_len as i64 - stride as i64);
    let s = stride as i64;
    let cuts = if overhang <= 0 { 0 } else { (overhang + s - 1) / s };
    Ok(cuts.max(1) as usize)
}

/// Heading of the body around the vertical axis, per capture.
///
/// Most captures walk across the frame with `-pi/2`; a few were recorded facing other ways.
/// Backward walkers are turned around.
pub fn zrot_for(sequence: &str, direction: Direction) -> f32 {
    let base = match sequence {
        "15_01" | "26_01" | "ung_74_01" | "ung_113_25" => PI / 2.0,
        "ung_82_11" | "ung_82_12" | "ung_104_02" | "ung_136_21" | "ung_139_28" | "143_32" => PI,
        "32_01" => 3.0 * PI / 4.0,
        _ => -PI / 2.0,
    };
    match direction {
        Direction::Forward => base,
        Direction::Backward => base + PI,
    }
}

/// Source-frame window of one clip: `[start, end)` sampled every `step` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClipWindow {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl ClipWindow {
    pub fn for_cut(
        cut: usize,
        step: usize,
        stride: usize,
        clip_len: usize,
        total_frames: usize,
    ) -> Self {
        let start = cut * step * stride;
        let end = (start + step * clip_len).min(total_frames);
        Self { start, end, step }
    }

    /// Number of sampled frames (`N`).
    pub fn len(&self) -> usize {
        if self.end <= self.start || self.step == 0 {
            0
        } else {
            (self.end - self.start).div_ceil(self.step)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source frame index of every sampled frame, increasing.
    pub fn source_frames(&self) -> impl Iterator<Item = usize> {
        (self.start..self.end).step_by(self.step.max(1))
    }
}

/// A request resolved against the catalog and configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedJob {
    /// Index within the catalog (after removing the run pass).
    pub dataset_index: usize,
    pub run_pass: usize,
    pub sequence: String,
    pub nb_frames: usize,
    pub cut: usize,
    pub stride: usize,
    pub max_cuts: usize,
    pub direction: Direction,
    pub subject_id: usize,
    pub zrot: f32,
    /// `output/run{p}/{name}`.
    pub output_dir: PathBuf,
    /// `tmp/run{p}_{name}_c{clip:04}`.
    pub tmp_dir: PathBuf,
}

impl ResolvedJob {
    #[tracing::instrument(skip(catalog, cfg), fields(idx = request.idx, cut = request.cut))]
    pub fn resolve(
        request: &JobRequest,
        catalog: &SequenceCatalog,
        cfg: &SynthConfig,
    ) -> SynthResult<Self> {
        if catalog.is_empty() {
            return Err(SynthError::validation("sequence catalog is empty"));
        }
        let run_pass = request.idx / catalog.len();
        let dataset_index = request.idx % catalog.len();

        let entry = request
            .name
            .as_deref()
            .and_then(|n| catalog.by_name(n))
            .unwrap_or(&catalog.entries[dataset_index]);

        let stride = match request.stride {
            Some(s) => s,
            None => {
                tracing::warn!("stride not specified, using default value {DEFAULT_STRIDE}");
                DEFAULT_STRIDE
            }
        };

        let max_cuts = max_cuts(entry.nb_frames, cfg.clipsize, stride)?;
        if request.cut >= max_cuts {
            return Err(SynthError::precondition(format!(
                "cut {} out of range for sequence '{}' ({} frames, {max_cuts} cuts)",
                request.cut, entry.name, entry.nb_frames
            )));
        }

        let name = compact_name(&entry.name);
        let clip_no = request.cut + 1;
        let job = Self {
            dataset_index,
            run_pass,
            sequence: entry.name.clone(),
            nb_frames: entry.nb_frames,
            cut: request.cut,
            stride,
            max_cuts,
            direction: request.direction,
            subject_id: request.subject_id,
            zrot: zrot_for(&entry.name, request.direction),
            output_dir: cfg.output_path.join(format!("run{run_pass}")).join(&name),
            tmp_dir: cfg
                .tmp_path
                .join(format!("run{run_pass}_{name}_c{clip_no:04}")),
        };
        tracing::info!(
            sequence = %job.sequence,
            run_pass,
            dataset_index,
            max_cut = max_cuts - 1,
            "job resolved"
        );
        Ok(job)
    }

    pub fn clip_no(&self) -> usize {
        self.cut + 1
    }

    /// `{name}_c{clip:04}`, the clip's name in file names and annotations.
    pub fn clip_name(&self) -> String {
        format!("{}_c{:04}", compact_name(&self.sequence), self.clip_no())
    }

    pub fn seed(&self) -> JobSeed {
        JobSeed::derive(self.dataset_index, self.run_pass, self.cut)
    }

    /// Composite frame directory, named like the video it becomes.
    pub fn composite_dir(&self) -> PathBuf {
        self.tmp_dir.join(format!("{}.mp4", self.clip_name()))
    }

    pub fn channel_paths(&self) -> ChannelPaths {
        ChannelPaths {
            composite_dir: self.composite_dir(),
            tmp_root: self.tmp_dir.clone(),
            dataset_index: self.dataset_index,
        }
    }

    pub fn clip_window(&self, cfg: &SynthConfig, total_frames: usize) -> ClipWindow {
        ClipWindow::for_cut(
            self.cut,
            cfg.stepsize,
            self.stride,
            cfg.clipsize,
            total_frames,
        )
    }

    pub fn annotation_path(&self) -> PathBuf {
        annotation_path(&self.output_dir, &self.sequence, self.clip_no())
    }

    /// Remove leftovers of an earlier attempt and recreate the temp and output directories.
    pub fn prepare_workdir(&self) -> SynthResult<()> {
        if is_protected(&self.tmp_dir) {
            return Err(SynthError::precondition(format!(
                "refusing to clear temp directory '{}'",
                self.tmp_dir.display()
            )));
        }
        if self.tmp_dir.exists() {
            std::fs::remove_dir_all(&self.tmp_dir)
                .with_context(|| format!("clear temp directory '{}'", self.tmp_dir.display()))?;
        }
        for dir in [&self.tmp_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create directory '{}'", dir.display()))?;
        }
        Ok(())
    }
}

fn compact_name(name: &str) -> String {
    name.chars().filter(|c| *c != ' ').collect()
}

fn is_protected(dir: &Path) -> bool {
    dir.as_os_str().is_empty() || dir.parent().is_none()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
