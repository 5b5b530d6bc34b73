use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray as nd;

use crate::{
    annotation::record::{
        AnimationRow, AnnotationRecord, AnnotationRecorder, CaptureRow, ClipMeta, MocapSource,
        path_label,
    },
    body::rig::{BodyPart, NUM_JOINTS, SkeletonRig},
    body::solver::{apply_pose, reset_joint_positions},
    config::SynthConfig,
    encode::ffmpeg::{PackageReport, PackageRequest, Packager},
    foundation::core::{FrameIndex, Resolution, UnitQuaternion, Vector3},
    foundation::error::{SynthError, SynthResult},
    pipeline::inputs::{BodyData, MotionSequence, background_list, clothing_list},
    pipeline::job::{ClipWindow, ResolvedJob},
    render::engine::{AnimProperty, SceneEngine},
    render::graph::{
        ChannelOutput, RenderChannel, RenderChannelSet, RenderGraph, build_render_graph,
    },
    render::overlay,
    scene::randomizer::{
        LightingCoeffs, SceneRandomizer, SubjectAssets, filter_clothing, select_subject,
    },
    scene::recenter::RecenterPolicy,
};

/// Stages of one job, strictly in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum JobPhase {
    Init,
    AnimateLoop,
    LightRandomize,
    RenderLoop,
    Package,
    Done,
}

/// Inputs a job reads from disk before touching the engine.
#[derive(Clone, Debug)]
pub struct JobAssets {
    pub backgrounds: Vec<PathBuf>,
    pub subject: SubjectAssets,
    pub regression_verts: Vec<usize>,
    pub joint_regressor: nd::Array2<f32>,
    pub sequence: MotionSequence,
}

impl JobAssets {
    pub fn load(cfg: &SynthConfig, job: &ResolvedJob, body: &BodyData) -> SynthResult<Self> {
        let gender = crate::foundation::core::Gender::from_subject_id(job.subject_id);
        let clothing = filter_clothing(
            clothing_list(&cfg.smpl_data_folder, gender)?,
            cfg.clothing_option,
        );
        let subject = select_subject(job.subject_id, &clothing, &body.shapes(gender)?)?;
        Ok(Self {
            backgrounds: background_list(&cfg.bg_path)?,
            subject,
            regression_verts: body.regression_verts.clone(),
            joint_regressor: body.joint_regressor()?,
            sequence: body.sequence(&job.sequence)?,
        })
    }
}

/// Summary of a finished (or partially run) job.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobReport {
    pub seed: u64,
    pub window: ClipWindow,
    /// Frame slots in the annotation record (`N`).
    pub frames_allocated: usize,
    pub frames_animated: usize,
    pub frames_rendered: usize,
    pub recenters: usize,
    /// Rendered frames with at least one joint off screen.
    pub offscreen_frames: usize,
    pub motion_blur_factor: Option<f32>,
    pub background: Option<PathBuf>,
    pub lighting: Option<LightingCoeffs>,
    pub outputs: BTreeMap<RenderChannel, ChannelOutput>,
    pub package: Option<PackageReport>,
}

/// Per-clip state created by the init phase.
#[derive(Debug)]
struct ClipState {
    rig: SkeletonRig,
    graph: RenderGraph,
    recenter: RecenterPolicy,
    recorder: AnnotationRecorder,
    background: PathBuf,
}

/// Drives one job through its phases against a scene engine it owns.
///
/// Every engine call goes through the single `&mut E` held here; the two frame loops are
/// separate phases so lighting can be drawn once the whole animation is keyframed.
pub struct FrameOrchestrator<E: SceneEngine> {
    engine: E,
    cfg: SynthConfig,
    job: ResolvedJob,
    assets: JobAssets,
    channels: RenderChannelSet,
    randomizer: SceneRandomizer,
    phase: JobPhase,
    state: Option<ClipState>,
    lighting: Option<LightingCoeffs>,
    record: Option<AnnotationRecord>,
    report: JobReport,
}

impl<E: SceneEngine> FrameOrchestrator<E> {
    /// Seed the job and take its first draw (the motion-blur factor, when that channel is on).
    pub fn new(
        engine: E,
        cfg: SynthConfig,
        job: ResolvedJob,
        assets: JobAssets,
    ) -> SynthResult<Self> {
        cfg.validate()?;
        let channels = RenderChannelSet::new(cfg.output_types);
        let seed = job.seed();
        let seed_value = seed.value();
        let motion_blur = channels.contains(RenderChannel::MotionBlur);
        let mut randomizer = SceneRandomizer::new(seed.into_rng(), motion_blur);
        let motion_blur_factor = if motion_blur {
            Some(randomizer.draw_motion_blur_factor()?)
        } else {
            None
        };
        let window = job.clip_window(&cfg, assets.sequence.len());
        tracing::info!(
            seed = seed_value,
            clip = %job.clip_name(),
            frames = window.len(),
            "job seeded"
        );

        Ok(Self {
            engine,
            cfg,
            assets,
            channels,
            randomizer,
            phase: JobPhase::Init,
            state: None,
            lighting: None,
            record: None,
            report: JobReport {
                seed: seed_value,
                window,
                frames_allocated: window.len(),
                frames_animated: 0,
                frames_rendered: 0,
                recenters: 0,
                offscreen_frames: 0,
                motion_blur_factor,
                background: None,
                lighting: None,
                outputs: BTreeMap::new(),
                package: None,
            },
            job,
        })
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn report(&self) -> &JobReport {
        &self.report
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The finalized record, available once the render loop is done.
    pub fn record(&self) -> Option<&AnnotationRecord> {
        self.record.as_ref()
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    fn enter(&self, expected: JobPhase) -> SynthResult<()> {
        if self.phase != expected {
            return Err(SynthError::phase(format!(
                "cannot run {expected:?} while in {:?}",
                self.phase
            )));
        }
        Ok(())
    }

    /// Number of frames both loops visit: `N` clipped to the frame cap.
    fn frame_budget(&self) -> usize {
        self.report.window.len().min(self.cfg.max_frames)
    }

    /// Place the camera, fit the rig to the subject's shape and wire the compositor.
    #[tracing::instrument(skip(self), fields(clip = %self.job.clip_name()))]
    pub fn init(&mut self) -> SynthResult<()> {
        self.enter(JobPhase::Init)?;
        let n = self.report.window.len();
        if n == 0 {
            return Err(SynthError::precondition(format!(
                "clip window {:?} of '{}' holds no frames ({} available)",
                self.report.window,
                self.job.sequence,
                self.assets.sequence.len()
            )));
        }

        let background = self
            .randomizer
            .choose_background(&self.assets.backgrounds)?
            .to_path_buf();

        let engine = &mut self.engine;
        engine.set_camera_location(Vector3::new(self.cfg.camera_distance, -1.0, 0.0))?;
        engine.set_clothing(&self.assets.subject.clothing)?;
        engine.set_background(&background)?;

        let graph = build_render_graph(
            &self.channels,
            &self.job.channel_paths(),
            self.report.motion_blur_factor,
        )?;
        engine.configure_compositor(&graph)?;

        let mut rig = SkeletonRig::load(&*engine)?;
        let recenter = RecenterPolicy::new(
            engine.camera_location()?,
            engine.joint_world_position(BodyPart::ROOT)?,
            self.job.direction,
        );
        let orig_trans = rig.root_translation;
        reset_joint_positions(
            engine,
            &mut rig,
            orig_trans,
            &self.assets.subject.shape,
            &self.assets.regression_verts,
            &self.assets.joint_regressor,
        )?;
        engine.clear_animation()?;

        let meta = ClipMeta {
            clip_no: self.job.clip_no(),
            sequence: self.job.clip_name(),
            cam_dist: self.cfg.camera_distance,
            stride: self.job.stride,
            source: MocapSource::from_sequence_name(&self.job.clip_name()),
        };
        let recorder =
            AnnotationRecorder::allocate(n, meta, self.report.motion_blur_factor.is_some());

        tracing::info!(
            frames = n,
            background = %background.display(),
            clothing = %self.assets.subject.clothing.display(),
            gender = self.assets.subject.gender.as_str(),
            "clip initialised"
        );
        self.report.background = Some(background.clone());
        self.report.outputs = graph.outputs.clone();
        self.state = Some(ClipState {
            rig,
            graph,
            recenter,
            recorder,
            background,
        });
        self.phase = JobPhase::AnimateLoop;
        Ok(())
    }

    /// Pose, heading and camera keyframes for every sampled frame up to the cap.
    #[tracing::instrument(skip(self), fields(clip = %self.job.clip_name()))]
    pub fn animate(&mut self) -> SynthResult<()> {
        self.enter(JobPhase::AnimateLoop)?;
        let budget = self.frame_budget();
        let window = self.report.window;
        let zrot = self.job.zrot;
        let heading = UnitQuaternion::from_euler_angles(0.0, 0.0, zrot);
        let resolution = self.cfg.resolution;
        let subject = self.assets.subject.clone();
        let vblur_factor = self.report.motion_blur_factor;

        let mut needs_recenter = false;
        let mut recenters = 0;
        let mut animated = 0;
        let Self {
            engine,
            assets,
            state,
            ..
        } = &mut *self;
        let state = state
            .as_mut()
            .ok_or_else(|| SynthError::phase("clip state missing (init did not run)"))?;

        for (i, src) in window.source_frames().enumerate().take(budget) {
            let t = FrameIndex(i as u64);
            engine.set_current_time(t)?;

            let frame = assets.sequence.frame(src, &subject.shape)?;
            apply_pose(engine, &mut state.rig, &frame, Some(t))?;
            engine.set_root_rotation(heading)?;
            engine.insert_keyframe(AnimProperty::RootRotation, t)?;

            state.recorder.record_animation(
                i,
                &AnimationRow {
                    pose: frame.pose,
                    shape: subject.shape,
                    zrot,
                    gender: subject.gender,
                    vblur_factor,
                },
            )?;

            if i == 0 || needs_recenter {
                let pelvis = engine.joint_world_position(BodyPart::ROOT)?;
                let cam = state.recenter.camera_for(pelvis);
                engine.set_camera_location(cam)?;
                engine.insert_keyframe(AnimProperty::CameraLocation, t)?;
                state.recorder.set_camera_location(cam);
                recenters += 1;
                tracing::debug!(frame = i, camera = ?cam, "camera recentered");
            }

            let (joints2d, _) = capture_joints(engine, resolution)?;
            needs_recenter = RecenterPolicy::needs_recenter(&joints2d, resolution);
            animated += 1;
        }

        self.report.recenters += recenters;
        self.report.frames_animated = animated;
        tracing::info!(frames = animated, recenters, "animation keyframed");
        self.phase = JobPhase::LightRandomize;
        Ok(())
    }

    /// One lighting draw for the whole clip.
    #[tracing::instrument(skip(self), fields(clip = %self.job.clip_name()))]
    pub fn randomize_lighting(&mut self) -> SynthResult<()> {
        self.enter(JobPhase::LightRandomize)?;
        let lighting = self.randomizer.draw_lighting()?;
        self.engine.set_lighting(&lighting)?;
        tracing::info!(ambient = lighting.0[0], "lighting drawn");
        self.report.lighting = Some(lighting);
        self.lighting = Some(lighting);
        self.phase = JobPhase::RenderLoop;
        Ok(())
    }

    /// Render every animated frame and read the joints back after each render.
    #[tracing::instrument(skip(self), fields(clip = %self.job.clip_name()))]
    pub fn render(&mut self) -> SynthResult<()> {
        self.enter(JobPhase::RenderLoop)?;
        let light = self
            .lighting
            .ok_or_else(|| SynthError::phase("lighting missing before render"))?;
        let frames = self.report.frames_animated;
        let resolution = self.cfg.resolution;
        let draw_skeleton = self.cfg.draw_skeleton;
        let cloth = path_label(&self.assets.subject.clothing);

        let mut offscreen = 0;
        let engine = &mut self.engine;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| SynthError::phase("clip state missing (init did not run)"))?;
        let composite = state
            .graph
            .output(RenderChannel::Composite)
            .cloned()
            .ok_or_else(|| SynthError::precondition("render graph has no composite output"))?;
        let bg = path_label(&state.background);

        for i in 0..frames {
            let t = FrameIndex(i as u64);
            engine.set_current_time(t)?;
            let path = composite.frame_path(t);
            engine.render(&path)?;

            let (joints2d, joints3d) = capture_joints(engine, resolution)?;
            state.recorder.record_capture(
                i,
                &CaptureRow {
                    joints2d,
                    joints3d,
                    light,
                    bg: bg.clone(),
                    cloth: cloth.clone(),
                },
            )?;

            if draw_skeleton {
                if path.exists() {
                    overlay::draw_joints_on_file(&path, &joints2d)?;
                } else {
                    tracing::warn!(path = %path.display(), "frame missing, skeleton not drawn");
                }
            }

            // The camera is fixed by now; off-screen frames are only reported.
            let off = RecenterPolicy::needs_recenter(&joints2d, resolution);
            if off {
                offscreen += 1;
            }
            tracing::debug!(frame = i, offscreen = off, "frame rendered");
        }

        self.report.frames_rendered = frames;
        self.report.offscreen_frames = offscreen;
        let recorder = self
            .state
            .take()
            .map(|s| s.recorder)
            .ok_or_else(|| SynthError::phase("clip state missing (init did not run)"))?;
        self.record = Some(recorder.finalize());
        tracing::info!(frames, offscreen, "clip rendered");
        self.phase = JobPhase::Package;
        Ok(())
    }

    /// Hand the finished clip to `packager`.
    #[tracing::instrument(skip_all, fields(clip = %self.job.clip_name()))]
    pub fn package<P: Packager + ?Sized>(&mut self, packager: &mut P) -> SynthResult<()> {
        self.enter(JobPhase::Package)?;
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| SynthError::phase("annotation record missing before package"))?;
        let name: String = self.job.sequence.chars().filter(|c| *c != ' ').collect();
        let request = PackageRequest {
            name,
            clip_no: self.job.clip_no(),
            output_dir: self.job.output_dir.clone(),
            tmp_dir: self.job.tmp_dir.clone(),
            outputs: &self.report.outputs,
            record,
            annotation_path: self.job.annotation_path(),
        };
        let packaged = packager.package(&request)?;
        self.report.package = Some(packaged);
        self.phase = JobPhase::Done;
        Ok(())
    }

    /// Run every remaining phase in order.
    pub fn run<P: Packager + ?Sized>(&mut self, packager: &mut P) -> SynthResult<JobReport> {
        self.init()?;
        self.animate()?;
        self.randomize_lighting()?;
        self.render()?;
        self.package(packager)?;
        Ok(self.report.clone())
    }
}

type JointCapture = ([[f32; 2]; NUM_JOINTS], [[f32; 3]; NUM_JOINTS]);

/// Pixel (y up, rounded) and world positions of every joint head in the current pose.
fn capture_joints<E: SceneEngine + ?Sized>(
    engine: &mut E,
    resolution: Resolution,
) -> SynthResult<JointCapture> {
    let mut joints2d = [[0.0; 2]; NUM_JOINTS];
    let mut joints3d = [[0.0; 3]; NUM_JOINTS];
    for part in BodyPart::ALL {
        let world = engine.joint_world_position(part)?;
        let screen = engine.project_to_screen(world)?;
        joints2d[part.index()] = resolution.to_pixels(screen);
        joints3d[part.index()] = [world.x, world.y, world.z];
    }
    Ok((joints2d, joints3d))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
