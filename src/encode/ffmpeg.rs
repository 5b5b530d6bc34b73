use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{
    annotation::record::AnnotationRecord,
    annotation::sink,
    foundation::error::{SynthError, SynthResult},
    render::graph::{ChannelOutput, RenderChannel},
};

/// Everything the packaging step needs from a finished clip.
#[derive(Clone, Debug)]
pub struct PackageRequest<'a> {
    /// Sequence name without spaces.
    pub name: String,
    pub clip_no: usize,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub outputs: &'a BTreeMap<RenderChannel, ChannelOutput>,
    pub record: &'a AnnotationRecord,
    pub annotation_path: PathBuf,
}

impl PackageRequest<'_> {
    /// `{output_dir}/{name}{suffix}_c{clip:04}.mp4`.
    pub fn video_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{suffix}_c{:04}.mp4", self.name, self.clip_no))
    }
}

/// Files produced by packaging.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PackageReport {
    pub videos: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub annotations: Option<PathBuf>,
}

/// Turns a finished clip into deliverables.
pub trait Packager {
    fn package(&mut self, request: &PackageRequest<'_>) -> SynthResult<PackageReport>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageOpts {
    pub fps: u32,
    pub encode_videos: bool,
    pub archive_frames: bool,
}

impl Default for PackageOpts {
    fn default() -> Self {
        Self {
            fps: 25,
            encode_videos: true,
            archive_frames: true,
        }
    }
}

impl PackageOpts {
    pub fn from_config(cfg: &crate::config::SynthConfig) -> Self {
        Self {
            fps: cfg.fps,
            encode_videos: cfg.encode_videos,
            archive_frames: cfg.archive_frames,
        }
    }
}

/// Encodes channel frames with the system `ffmpeg`, tars the composite frames and writes the
/// annotation JSON. Failures are returned, not retried.
#[derive(Clone, Debug, Default)]
pub struct FfmpegPackager {
    opts: PackageOpts,
}

impl FfmpegPackager {
    pub fn new(opts: PackageOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &PackageOpts {
        &self.opts
    }
}

/// Channels encoded to video and the file-name suffix of each.
const VIDEO_CHANNELS: [(RenderChannel, &str); 3] = [
    (RenderChannel::Composite, ""),
    (RenderChannel::MotionBlur, "_vblur"),
    (RenderChannel::Foreground, "_fg"),
];

impl Packager for FfmpegPackager {
    #[tracing::instrument(skip_all, fields(name = %request.name, clip = request.clip_no))]
    fn package(&mut self, request: &PackageRequest<'_>) -> SynthResult<PackageReport> {
        let mut report = PackageReport::default();

        if self.opts.encode_videos {
            if !is_ffmpeg_on_path() {
                return Err(SynthError::package(
                    "ffmpeg is required for video encoding, but was not found on PATH",
                ));
            }
            for (channel, suffix) in VIDEO_CHANNELS {
                let Some(out) = request.outputs.get(&channel) else {
                    continue;
                };
                let video = request.video_path(suffix);
                ensure_parent_dir(&video)?;
                let args = transcode_args(
                    &out.frame_pattern(),
                    &video,
                    self.opts.fps,
                    channel == RenderChannel::MotionBlur,
                );
                tracing::info!(channel = ?channel, video = %video.display(), "encoding video");
                run_tool("ffmpeg", &args)?;
                report.videos.push(video);
            }
        }

        if self.opts.archive_frames {
            if let Some(out) = request.outputs.get(&RenderChannel::Composite) {
                let archive = archive_frames(&out.dir, &request.output_dir)?;
                report.archive = Some(archive);
            }
        }

        sink::write_json(&request.annotation_path, request.record)?;
        report.annotations = Some(request.annotation_path.clone());
        Ok(report)
    }
}

/// `ffmpeg` arguments encoding an image sequence to H.264 at `fps`.
///
/// `even_scale` crops odd dimensions, which yuv420p cannot encode.
pub fn transcode_args(
    input_pattern: &Path,
    output: &Path,
    fps: u32,
    even_scale: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-r"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(fps.to_string().into());
    args.push("-i".into());
    args.push(input_pattern.as_os_str().to_owned());
    for a in ["-c:v", "h264", "-pix_fmt", "yuv420p", "-crf", "23"] {
        args.push(a.into());
    }
    if even_scale {
        args.push("-vf".into());
        args.push("scale=trunc(iw/2)*2:trunc(ih/2)*2".into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

/// `tar` arguments archiving `frames_dir` as `{output_dir}/{dirname}.tar.gz`, relative to its
/// parent.
pub fn archive_args(frames_dir: &Path, output_dir: &Path) -> SynthResult<(PathBuf, Vec<OsString>)> {
    let (Some(parent), Some(dirname)) = (frames_dir.parent(), frames_dir.file_name()) else {
        return Err(SynthError::validation(format!(
            "cannot archive '{}': no parent directory",
            frames_dir.display()
        )));
    };
    let mut archive_name = dirname.to_owned();
    archive_name.push(".tar.gz");
    let archive = output_dir.join(archive_name);
    let args = vec![
        OsString::from("-czf"),
        archive.as_os_str().to_owned(),
        OsString::from("-C"),
        parent.as_os_str().to_owned(),
        dirname.to_owned(),
    ];
    Ok((archive, args))
}

fn archive_frames(frames_dir: &Path, output_dir: &Path) -> SynthResult<PathBuf> {
    let (archive, args) = archive_args(frames_dir, output_dir)?;
    ensure_parent_dir(&archive)?;
    tracing::info!(archive = %archive.display(), "archiving frames");
    run_tool("tar", &args)?;
    Ok(archive)
}

fn run_tool(program: &str, args: &[OsString]) -> SynthResult<()> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            SynthError::package(format!(
                "failed to spawn {program} (is it installed and on PATH?): {e}"
            ))
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SynthError::package(format!(
            "{program} exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> SynthResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
