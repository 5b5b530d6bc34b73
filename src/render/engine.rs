use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::{
    body::rig::{BlendshapeKey, BodyPart, NUM_JOINTS, RestBone},
    foundation::core::{FrameIndex, Resolution, UnitQuaternion, Vector2, Vector3},
    foundation::error::{SynthError, SynthResult},
    render::graph::RenderGraph,
    scene::randomizer::LightingCoeffs,
};

/// Animatable engine property addressed by [`SceneEngine::insert_keyframe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimProperty {
    JointLocation(BodyPart),
    JointRotation(BodyPart),
    /// Rotation of the armature root above the pelvis (per-clip heading).
    RootRotation,
    Blendshape(BlendshapeKey),
    CameraLocation,
}

/// Capabilities the pipeline needs from the external 3D scene/rendering engine.
///
/// The engine holds one mutable scene. Every pose, camera and render call goes through a
/// `&mut` borrow of the single engine handle owned by the orchestrator; implementations must not
/// assume calls are reordered or batched.
pub trait SceneEngine {
    fn set_current_time(&mut self, frame: FrameIndex) -> SynthResult<()>;

    fn set_joint_rotation(
        &mut self,
        part: BodyPart,
        rotation: UnitQuaternion<f32>,
    ) -> SynthResult<()>;

    fn set_joint_translation(&mut self, part: BodyPart, translation: Vector3<f32>)
    -> SynthResult<()>;

    fn joint_translation(&self, part: BodyPart) -> SynthResult<Vector3<f32>>;

    fn set_root_rotation(&mut self, rotation: UnitQuaternion<f32>) -> SynthResult<()>;

    fn set_blendshape_weight(&mut self, key: BlendshapeKey, value: f32) -> SynthResult<()>;

    /// Snapshot the current value of `property` at `frame`.
    fn insert_keyframe(&mut self, property: AnimProperty, frame: FrameIndex) -> SynthResult<()>;

    /// Drop every keyframe on the armature and camera.
    fn clear_animation(&mut self) -> SynthResult<()>;

    /// Mesh vertices after shape and pose deformation.
    fn deformed_vertices(&mut self) -> SynthResult<Vec<Vector3<f32>>>;

    fn rest_bone(&self, part: BodyPart) -> SynthResult<RestBone>;

    fn set_rest_bone(&mut self, part: BodyPart, bone: RestBone) -> SynthResult<()>;

    /// World-space head position of a joint in the current pose.
    fn joint_world_position(&mut self, part: BodyPart) -> SynthResult<Vector3<f32>>;

    /// Project a world point to normalized screen space (`[0, 1]` is visible, y grows upwards).
    fn project_to_screen(&mut self, world: Vector3<f32>) -> SynthResult<Vector2<f32>>;

    fn camera_location(&self) -> SynthResult<Vector3<f32>>;

    fn set_camera_location(&mut self, location: Vector3<f32>) -> SynthResult<()>;

    fn set_lighting(&mut self, coeffs: &LightingCoeffs) -> SynthResult<()>;

    fn set_background(&mut self, image: &Path) -> SynthResult<()>;

    fn set_clothing(&mut self, texture: &Path) -> SynthResult<()>;

    fn configure_compositor(&mut self, graph: &RenderGraph) -> SynthResult<()>;

    /// Render the current frame; the composite goes to `output`, enabled side channels to the
    /// directories configured through [`SceneEngine::configure_compositor`].
    fn render(&mut self, output: &Path) -> SynthResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PropValue {
    Vec3(Vector3<f32>),
    Quat(UnitQuaternion<f32>),
    Scalar(f32),
}

/// In-memory engine for tests, dry runs and debugging.
///
/// It keeps the scene state, replays keyframes (step interpolation) on
/// [`SceneEngine::set_current_time`] and projects through a pinhole camera looking down `-X`.
/// There is no skinning: deformed vertices are the template mesh and joint world positions are
/// `root_rotation * (rest_head + pelvis_translation)`.
#[derive(Clone, Debug)]
pub struct InMemoryEngine {
    resolution: Resolution,
    focal: f32,
    rest: Vec<RestBone>,
    translations: Vec<Vector3<f32>>,
    rotations: Vec<UnitQuaternion<f32>>,
    root_rotation: UnitQuaternion<f32>,
    blendshapes: HashMap<BlendshapeKey, f32>,
    mesh: Vec<Vector3<f32>>,
    camera: Vector3<f32>,
    current: FrameIndex,
    tracks: HashMap<AnimProperty, BTreeMap<u64, PropValue>>,
    write_frames: bool,
    lighting: Option<LightingCoeffs>,
    background: Option<PathBuf>,
    clothing: Option<PathBuf>,
    compositor: Option<RenderGraph>,
    renders: Vec<(FrameIndex, PathBuf)>,
}

impl InMemoryEngine {
    /// Create an engine over a template armature (canonical order) and mesh.
    pub fn new(
        resolution: Resolution,
        rest: Vec<RestBone>,
        mesh: Vec<Vector3<f32>>,
    ) -> SynthResult<Self> {
        if rest.len() != NUM_JOINTS {
            return Err(SynthError::validation(format!(
                "in-memory engine needs {NUM_JOINTS} rest bones, got {}",
                rest.len()
            )));
        }
        Ok(Self {
            resolution,
            focal: 1.0,
            rest,
            translations: vec![Vector3::zeros(); NUM_JOINTS],
            rotations: vec![UnitQuaternion::identity(); NUM_JOINTS],
            root_rotation: UnitQuaternion::identity(),
            blendshapes: HashMap::new(),
            mesh,
            camera: Vector3::zeros(),
            current: FrameIndex(0),
            tracks: HashMap::new(),
            write_frames: false,
            lighting: None,
            background: None,
            clothing: None,
            compositor: None,
            renders: Vec::new(),
        })
    }

    /// Build the armature from a template mesh: heads are regressed from `regression_verts`,
    /// tails sit 10 cm above their heads.
    pub fn from_template(
        resolution: Resolution,
        mesh: Vec<Vector3<f32>>,
        regression_verts: &[usize],
        regressor: &ndarray::Array2<f32>,
    ) -> SynthResult<Self> {
        if regressor.dim() != (NUM_JOINTS, regression_verts.len()) {
            return Err(SynthError::validation(format!(
                "joint regressor is {:?}, expected ({NUM_JOINTS}, {})",
                regressor.dim(),
                regression_verts.len()
            )));
        }
        let picked = regression_verts
            .iter()
            .map(|&v| {
                mesh.get(v).copied().ok_or_else(|| {
                    SynthError::validation(format!(
                        "regression vertex {v} outside template mesh ({} vertices)",
                        mesh.len()
                    ))
                })
            })
            .collect::<SynthResult<Vec<_>>>()?;
        let rest = regressor
            .rows()
            .into_iter()
            .map(|row| {
                let head = row
                    .iter()
                    .zip(&picked)
                    .fold(Vector3::zeros(), |acc, (&w, v)| acc + v * w);
                RestBone {
                    head,
                    tail: head + Vector3::new(0.0, 0.0, 0.1),
                }
            })
            .collect();
        Self::new(resolution, rest, mesh)
    }

    /// Write a flat placeholder PNG for every render call.
    pub fn with_frame_output(mut self, enabled: bool) -> Self {
        self.write_frames = enabled;
        self
    }

    pub fn with_focal(mut self, focal: f32) -> Self {
        self.focal = focal;
        self
    }

    pub fn current_time(&self) -> FrameIndex {
        self.current
    }

    /// Render calls in call order.
    pub fn renders(&self) -> &[(FrameIndex, PathBuf)] {
        &self.renders
    }

    /// Keyframed frames of one property, ascending.
    pub fn keyframes(&self, property: AnimProperty) -> Vec<FrameIndex> {
        self.tracks
            .get(&property)
            .map(|t| t.keys().map(|&f| FrameIndex(f)).collect())
            .unwrap_or_default()
    }

    pub fn blendshape_weight(&self, key: BlendshapeKey) -> f32 {
        self.blendshapes.get(&key).copied().unwrap_or(0.0)
    }

    pub fn joint_rotation(&self, part: BodyPart) -> UnitQuaternion<f32> {
        self.rotations[part.index()]
    }

    pub fn root_rotation(&self) -> UnitQuaternion<f32> {
        self.root_rotation
    }

    pub fn lighting(&self) -> Option<&LightingCoeffs> {
        self.lighting.as_ref()
    }

    pub fn background(&self) -> Option<&Path> {
        self.background.as_deref()
    }

    pub fn clothing(&self) -> Option<&Path> {
        self.clothing.as_deref()
    }

    pub fn compositor(&self) -> Option<&RenderGraph> {
        self.compositor.as_ref()
    }

    fn read_property(&self, property: AnimProperty) -> PropValue {
        match property {
            AnimProperty::JointLocation(p) => PropValue::Vec3(self.translations[p.index()]),
            AnimProperty::JointRotation(p) => PropValue::Quat(self.rotations[p.index()]),
            AnimProperty::RootRotation => PropValue::Quat(self.root_rotation),
            AnimProperty::Blendshape(k) => PropValue::Scalar(self.blendshape_weight(k)),
            AnimProperty::CameraLocation => PropValue::Vec3(self.camera),
        }
    }

    fn write_property(&mut self, property: AnimProperty, value: PropValue) {
        match (property, value) {
            (AnimProperty::JointLocation(p), PropValue::Vec3(v)) => self.translations[p.index()] = v,
            (AnimProperty::JointRotation(p), PropValue::Quat(q)) => self.rotations[p.index()] = q,
            (AnimProperty::RootRotation, PropValue::Quat(q)) => self.root_rotation = q,
            (AnimProperty::Blendshape(k), PropValue::Scalar(s)) => {
                self.blendshapes.insert(k, s);
            }
            (AnimProperty::CameraLocation, PropValue::Vec3(v)) => self.camera = v,
            // Values are always recorded through `read_property`, so kinds line up.
            _ => {}
        }
    }

    fn write_placeholder_png(&self, output: &Path) -> SynthResult<()> {
        use anyhow::Context as _;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create frame dir '{}'", parent.display()))?;
        }
        let img = image::RgbaImage::from_pixel(
            self.resolution.width,
            self.resolution.height,
            image::Rgba([96, 96, 96, 255]),
        );
        img.save_with_format(output, image::ImageFormat::Png)
            .with_context(|| format!("write frame '{}'", output.display()))?;
        Ok(())
    }
}

impl SceneEngine for InMemoryEngine {
    fn set_current_time(&mut self, frame: FrameIndex) -> SynthResult<()> {
        self.current = frame;
        let mut updates = Vec::with_capacity(self.tracks.len());
        for (&property, track) in &self.tracks {
            if let Some((_, &value)) = track.range(..=frame.0).next_back() {
                updates.push((property, value));
            }
        }
        for (property, value) in updates {
            self.write_property(property, value);
        }
        Ok(())
    }

    fn set_joint_rotation(
        &mut self,
        part: BodyPart,
        rotation: UnitQuaternion<f32>,
    ) -> SynthResult<()> {
        self.rotations[part.index()] = rotation;
        Ok(())
    }

    fn set_joint_translation(
        &mut self,
        part: BodyPart,
        translation: Vector3<f32>,
    ) -> SynthResult<()> {
        self.translations[part.index()] = translation;
        Ok(())
    }

    fn joint_translation(&self, part: BodyPart) -> SynthResult<Vector3<f32>> {
        Ok(self.translations[part.index()])
    }

    fn set_root_rotation(&mut self, rotation: UnitQuaternion<f32>) -> SynthResult<()> {
        self.root_rotation = rotation;
        Ok(())
    }

    fn set_blendshape_weight(&mut self, key: BlendshapeKey, value: f32) -> SynthResult<()> {
        self.blendshapes.insert(key, value);
        Ok(())
    }

    fn insert_keyframe(&mut self, property: AnimProperty, frame: FrameIndex) -> SynthResult<()> {
        let value = self.read_property(property);
        self.tracks
            .entry(property)
            .or_default()
            .insert(frame.0, value);
        Ok(())
    }

    fn clear_animation(&mut self) -> SynthResult<()> {
        self.tracks.clear();
        Ok(())
    }

    fn deformed_vertices(&mut self) -> SynthResult<Vec<Vector3<f32>>> {
        Ok(self.mesh.clone())
    }

    fn rest_bone(&self, part: BodyPart) -> SynthResult<RestBone> {
        Ok(self.rest[part.index()])
    }

    fn set_rest_bone(&mut self, part: BodyPart, bone: RestBone) -> SynthResult<()> {
        self.rest[part.index()] = bone;
        Ok(())
    }

    fn joint_world_position(&mut self, part: BodyPart) -> SynthResult<Vector3<f32>> {
        let pelvis = self.translations[BodyPart::ROOT.index()];
        Ok(self.root_rotation * (self.rest[part.index()].head + pelvis))
    }

    fn project_to_screen(&mut self, world: Vector3<f32>) -> SynthResult<Vector2<f32>> {
        let rel = world - self.camera;
        let depth = -rel.x;
        if depth <= f32::EPSILON {
            return Ok(Vector2::new(-1.0, -1.0));
        }
        // Camera right is world -Z, camera up is world -Y.
        let u = 0.5 + self.focal * (-rel.z) / depth;
        let v = 0.5 + self.focal * (-rel.y) / depth;
        Ok(Vector2::new(u, v))
    }

    fn camera_location(&self) -> SynthResult<Vector3<f32>> {
        Ok(self.camera)
    }

    fn set_camera_location(&mut self, location: Vector3<f32>) -> SynthResult<()> {
        self.camera = location;
        Ok(())
    }

    fn set_lighting(&mut self, coeffs: &LightingCoeffs) -> SynthResult<()> {
        self.lighting = Some(coeffs.clone());
        Ok(())
    }

    fn set_background(&mut self, image: &Path) -> SynthResult<()> {
        self.background = Some(image.to_path_buf());
        Ok(())
    }

    fn set_clothing(&mut self, texture: &Path) -> SynthResult<()> {
        self.clothing = Some(texture.to_path_buf());
        Ok(())
    }

    fn configure_compositor(&mut self, graph: &RenderGraph) -> SynthResult<()> {
        self.compositor = Some(graph.clone());
        Ok(())
    }

    fn render(&mut self, output: &Path) -> SynthResult<()> {
        if self.write_frames {
            self.write_placeholder_png(output)?;
        }
        self.renders.push((self.current, output.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
