use crate::{
    foundation::core::{UnitQuaternion, Vector3},
    foundation::error::{SynthError, SynthResult},
    render::engine::SceneEngine,
};

/// Number of skeleton joints (root included).
pub const NUM_JOINTS: usize = 24;
/// Length of an axis-angle pose vector.
pub const POSE_DIM: usize = NUM_JOINTS * 3;
/// Number of pose-blendshape weights (non-root joints x 9 matrix entries).
pub const NUM_POSE_BLENDSHAPES: usize = (NUM_JOINTS - 1) * 9;
/// Number of shape coefficients driving shape blendshapes.
pub const NUM_SHAPE_COEFFS: usize = 10;

/// Canonical body part, one per skeleton joint.
///
/// Declaration order is the canonical order: it matches the joint order of pose vectors and
/// defines segmentation labels (`label = index + 1`). Never reorder.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum BodyPart {
    Hips,
    LeftUpLeg,
    RightUpLeg,
    Spine,
    LeftLeg,
    RightLeg,
    Spine1,
    LeftFoot,
    RightFoot,
    Spine2,
    LeftToeBase,
    RightToeBase,
    Neck,
    LeftShoulder,
    RightShoulder,
    Head,
    LeftArm,
    RightArm,
    LeftForeArm,
    RightForeArm,
    LeftHand,
    RightHand,
    LeftHandIndex1,
    RightHandIndex1,
}

impl BodyPart {
    pub const ALL: [BodyPart; NUM_JOINTS] = [
        BodyPart::Hips,
        BodyPart::LeftUpLeg,
        BodyPart::RightUpLeg,
        BodyPart::Spine,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::Spine1,
        BodyPart::LeftFoot,
        BodyPart::RightFoot,
        BodyPart::Spine2,
        BodyPart::LeftToeBase,
        BodyPart::RightToeBase,
        BodyPart::Neck,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::Head,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftForeArm,
        BodyPart::RightForeArm,
        BodyPart::LeftHand,
        BodyPart::RightHand,
        BodyPart::LeftHandIndex1,
        BodyPart::RightHandIndex1,
    ];

    /// The pelvis joint carries the global translation.
    pub const ROOT: BodyPart = BodyPart::Hips;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Segment name used for segmentation materials.
    pub fn part_name(self) -> &'static str {
        match self {
            BodyPart::Hips => "hips",
            BodyPart::LeftUpLeg => "leftUpLeg",
            BodyPart::RightUpLeg => "rightUpLeg",
            BodyPart::Spine => "spine",
            BodyPart::LeftLeg => "leftLeg",
            BodyPart::RightLeg => "rightLeg",
            BodyPart::Spine1 => "spine1",
            BodyPart::LeftFoot => "leftFoot",
            BodyPart::RightFoot => "rightFoot",
            BodyPart::Spine2 => "spine2",
            BodyPart::LeftToeBase => "leftToeBase",
            BodyPart::RightToeBase => "rightToeBase",
            BodyPart::Neck => "neck",
            BodyPart::LeftShoulder => "leftShoulder",
            BodyPart::RightShoulder => "rightShoulder",
            BodyPart::Head => "head",
            BodyPart::LeftArm => "leftArm",
            BodyPart::RightArm => "rightArm",
            BodyPart::LeftForeArm => "leftForeArm",
            BodyPart::RightForeArm => "rightForeArm",
            BodyPart::LeftHand => "leftHand",
            BodyPart::RightHand => "rightHand",
            BodyPart::LeftHandIndex1 => "leftHandIndex1",
            BodyPart::RightHandIndex1 => "rightHandIndex1",
        }
    }

    /// Armature bone (joint) name of this part in the body model rig.
    pub fn bone_name(self) -> &'static str {
        match self {
            BodyPart::Hips => "Pelvis",
            BodyPart::LeftUpLeg => "L_Hip",
            BodyPart::RightUpLeg => "R_Hip",
            BodyPart::Spine => "Spine1",
            BodyPart::LeftLeg => "L_Knee",
            BodyPart::RightLeg => "R_Knee",
            BodyPart::Spine1 => "Spine2",
            BodyPart::LeftFoot => "L_Ankle",
            BodyPart::RightFoot => "R_Ankle",
            BodyPart::Spine2 => "Spine3",
            BodyPart::LeftToeBase => "L_Foot",
            BodyPart::RightToeBase => "R_Foot",
            BodyPart::Neck => "Neck",
            BodyPart::LeftShoulder => "L_Collar",
            BodyPart::RightShoulder => "R_Collar",
            BodyPart::Head => "Head",
            BodyPart::LeftArm => "L_Shoulder",
            BodyPart::RightArm => "R_Shoulder",
            BodyPart::LeftForeArm => "L_Elbow",
            BodyPart::RightForeArm => "R_Elbow",
            BodyPart::LeftHand => "L_Wrist",
            BodyPart::RightHand => "R_Wrist",
            BodyPart::LeftHandIndex1 => "L_Hand",
            BodyPart::RightHandIndex1 => "R_Hand",
        }
    }

    pub fn from_part_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.part_name() == name)
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.part_name())
    }
}

/// Mesh deformation target addressed by the engine (`Pose000`.., `Shape000`..).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendshapeKey {
    Pose(u16),
    Shape(u16),
}

impl std::fmt::Display for BlendshapeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlendshapeKey::Pose(i) => write!(f, "Pose{i:03}"),
            BlendshapeKey::Shape(i) => write!(f, "Shape{i:03}"),
        }
    }
}

/// Rest-pose placement of one bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestBone {
    pub head: Vector3<f32>,
    pub tail: Vector3<f32>,
}

impl RestBone {
    /// Move the head to `head`, keeping the head->tail offset.
    pub fn moved_to(self, head: Vector3<f32>) -> Self {
        let offset = self.tail - self.head;
        Self {
            head,
            tail: head + offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RigJoint {
    pub part: BodyPart,
    pub rest: RestBone,
    pub rotation: UnitQuaternion<f32>,
}

/// Local mirror of the body armature and its blendshape weights.
///
/// Loaded once per job from the engine and mutated every frame by the pose solver; every
/// mutation is pushed to the engine in the same call.
#[derive(Clone, Debug)]
pub struct SkeletonRig {
    joints: Vec<RigJoint>,
    /// Pose-space location of the root joint.
    pub root_translation: Vector3<f32>,
    pub pose_weights: Vec<f32>,
    pub shape_weights: Vec<f32>,
}

impl SkeletonRig {
    /// Build a rig from explicit rest bones, in canonical order.
    pub fn from_rest_bones(rest: &[RestBone]) -> SynthResult<Self> {
        if rest.len() != NUM_JOINTS {
            return Err(SynthError::validation(format!(
                "rig needs {NUM_JOINTS} rest bones, got {}",
                rest.len()
            )));
        }
        let joints = BodyPart::ALL
            .iter()
            .zip(rest)
            .map(|(&part, &rest)| RigJoint {
                part,
                rest,
                rotation: UnitQuaternion::identity(),
            })
            .collect();
        Ok(Self {
            joints,
            root_translation: Vector3::zeros(),
            pose_weights: vec![0.0; NUM_POSE_BLENDSHAPES],
            shape_weights: vec![0.0; NUM_SHAPE_COEFFS],
        })
    }

    /// Read the template armature from the engine.
    pub fn load<E: SceneEngine + ?Sized>(engine: &E) -> SynthResult<Self> {
        let mut rest = Vec::with_capacity(NUM_JOINTS);
        for part in BodyPart::ALL {
            rest.push(engine.rest_bone(part)?);
        }
        let mut rig = Self::from_rest_bones(&rest)?;
        rig.root_translation = engine.joint_translation(BodyPart::ROOT)?;
        Ok(rig)
    }

    pub fn joint(&self, part: BodyPart) -> &RigJoint {
        &self.joints[part.index()]
    }

    pub(crate) fn joint_mut(&mut self, part: BodyPart) -> &mut RigJoint {
        &mut self.joints[part.index()]
    }

    pub fn joints(&self) -> &[RigJoint] {
        &self.joints
    }
}

#[cfg(test)]
#[path = "../../tests/unit/body/rig.rs"]
mod tests;
