//! bodysynth generates synthetic human-body video datasets.
//!
//! Each job picks a motion-capture clip, poses a parametric 24-joint body through it inside an
//! external scene engine, randomizes the scene from a per-job seed and records per-frame ground
//! truth:
//!
//! - Resolve a [`JobRequest`] against the [`SequenceCatalog`] into a [`ResolvedJob`]
//! - Drive it through a [`FrameOrchestrator`] over any [`SceneEngine`]
//! - Package frames, videos and the [`AnnotationRecord`] through a [`Packager`]
#![forbid(unsafe_code)]

mod foundation;

/// Per-frame annotation recording and serialization.
pub mod annotation;
/// Body rig and pose/shape solver.
pub mod body;
/// Run configuration.
pub mod config;
/// Clip packaging (ffmpeg, tar, annotations).
pub mod encode;
/// Job resolution, inputs and phase orchestration.
pub mod pipeline;
/// Scene engine seam, compositor graph and overlays.
pub mod render;
/// Seeded randomization and camera recentering.
pub mod scene;

pub use crate::foundation::core::{Direction, FrameIndex, Gender, Resolution};
pub use crate::foundation::error::{SynthError, SynthResult};

pub use crate::annotation::record::AnnotationRecord;
pub use crate::config::{ClothingOption, OutputTypes, SynthConfig};
pub use crate::encode::ffmpeg::{FfmpegPackager, PackageOpts, Packager};
pub use crate::pipeline::inputs::{BodyData, SequenceCatalog};
pub use crate::pipeline::job::{JobRequest, ResolvedJob};
pub use crate::pipeline::orchestrator::{FrameOrchestrator, JobAssets, JobPhase, JobReport};
pub use crate::render::engine::{InMemoryEngine, SceneEngine};
pub use crate::scene::seed::JobSeed;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
