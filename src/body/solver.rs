use ndarray as nd;

use crate::{
    body::rig::{
        BlendshapeKey, BodyPart, NUM_JOINTS, NUM_POSE_BLENDSHAPES, NUM_SHAPE_COEFFS, POSE_DIM,
        SkeletonRig,
    },
    foundation::core::{FrameIndex, Matrix3, UnitQuaternion, Vector3},
    foundation::error::{SynthError, SynthResult},
    render::engine::{AnimProperty, SceneEngine},
};

/// One frame of body parameters: axis-angle pose, root translation and shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseFrame {
    pub pose: [f32; POSE_DIM],
    pub trans: Vector3<f32>,
    pub shape: [f32; NUM_SHAPE_COEFFS],
}

impl PoseFrame {
    pub fn new(pose: &[f32], trans: Vector3<f32>, shape: &[f32]) -> SynthResult<Self> {
        let pose: [f32; POSE_DIM] = pose.try_into().map_err(|_| {
            SynthError::validation(format!(
                "pose vector must have {POSE_DIM} entries, got {}",
                pose.len()
            ))
        })?;
        Ok(Self {
            pose,
            trans,
            shape: shape_coeffs(shape)?,
        })
    }

    /// Zero pose with the given translation and shape.
    pub fn rest(trans: Vector3<f32>, shape: [f32; NUM_SHAPE_COEFFS]) -> Self {
        Self {
            pose: [0.0; POSE_DIM],
            trans,
            shape,
        }
    }
}

/// Take the leading shape coefficients the rig has blendshapes for.
pub fn shape_coeffs(shape: &[f32]) -> SynthResult<[f32; NUM_SHAPE_COEFFS]> {
    if shape.len() < NUM_SHAPE_COEFFS {
        return Err(SynthError::validation(format!(
            "shape vector must have at least {NUM_SHAPE_COEFFS} entries, got {}",
            shape.len()
        )));
    }
    let mut out = [0.0; NUM_SHAPE_COEFFS];
    out.copy_from_slice(&shape[..NUM_SHAPE_COEFFS]);
    Ok(out)
}

/// Per-joint rotation matrices and the pose-blendshape weights derived from them.
#[derive(Clone, Debug)]
pub struct RotationSet {
    pub rotations: Vec<Matrix3<f32>>,
    /// `(R_i - I)` flattened row-major for joints `1..24`.
    pub offsets: Vec<f32>,
}

/// Axis-angle vector to rotation matrix.
///
/// A zero vector maps to the exact identity.
pub fn rodrigues(v: Vector3<f32>) -> Matrix3<f32> {
    let theta = v.norm();
    if theta == 0.0 {
        return Matrix3::identity();
    }
    let r = v / theta;
    let (sin, cos) = theta.sin_cos();
    Matrix3::identity() * cos + (r * r.transpose()) * (1.0 - cos) + r.cross_matrix() * sin
}

pub fn to_blendshapes(pose: &[f32]) -> SynthResult<RotationSet> {
    if pose.len() != POSE_DIM {
        return Err(SynthError::validation(format!(
            "pose vector must have {POSE_DIM} entries, got {}",
            pose.len()
        )));
    }

    let rotations: Vec<Matrix3<f32>> = pose
        .chunks_exact(3)
        .map(|aa| rodrigues(Vector3::new(aa[0], aa[1], aa[2])))
        .collect();

    let mut offsets = Vec::with_capacity(NUM_POSE_BLENDSHAPES);
    for rot in &rotations[1..] {
        let delta = rot - Matrix3::identity();
        for r in 0..3 {
            for c in 0..3 {
                offsets.push(delta[(r, c)]);
            }
        }
    }

    Ok(RotationSet { rotations, offsets })
}

/// Apply translation, pose and shape to the rig and mirror it into the engine.
///
/// With `keyframe` set, every mutated property is also keyframed at that frame so the engine can
/// replay it during rendering.
pub fn apply_pose<E: SceneEngine + ?Sized>(
    engine: &mut E,
    rig: &mut SkeletonRig,
    frame: &PoseFrame,
    keyframe: Option<FrameIndex>,
) -> SynthResult<()> {
    let set = to_blendshapes(&frame.pose)?;

    rig.root_translation = frame.trans;
    engine.set_joint_translation(BodyPart::ROOT, frame.trans)?;
    if let Some(t) = keyframe {
        engine.insert_keyframe(AnimProperty::JointLocation(BodyPart::ROOT), t)?;
    }

    for (part, rot) in BodyPart::ALL.into_iter().zip(&set.rotations) {
        let q = UnitQuaternion::from_rotation_matrix(
            &nalgebra::Rotation3::from_matrix_unchecked(*rot),
        );
        rig.joint_mut(part).rotation = q;
        engine.set_joint_rotation(part, q)?;
        if let Some(t) = keyframe {
            engine.insert_keyframe(AnimProperty::JointRotation(part), t)?;
            engine.insert_keyframe(AnimProperty::JointLocation(part), t)?;
        }
    }

    for (i, &w) in set.offsets.iter().enumerate() {
        let key = BlendshapeKey::Pose(i as u16);
        rig.pose_weights[i] = w;
        engine.set_blendshape_weight(key, w)?;
        if let Some(t) = keyframe {
            engine.insert_keyframe(AnimProperty::Blendshape(key), t)?;
        }
    }

    for (i, &w) in frame.shape.iter().enumerate() {
        let key = BlendshapeKey::Shape(i as u16);
        rig.shape_weights[i] = w;
        engine.set_blendshape_weight(key, w)?;
        if let Some(t) = keyframe {
            engine.insert_keyframe(AnimProperty::Blendshape(key), t)?;
        }
    }

    Ok(())
}

/// Move the rig's rest joints to where the joint regressor places them for `shape`.
///
/// The template armature is built for the average body; a sampled shape moves the joints. This
/// zero-poses the body, regresses joint positions from a sparse vertex subset
/// (`joint_regressor` is `24 x K`, `regression_verts` holds the `K` vertex indices) and rewrites
/// every rest head, keeping each bone's head->tail offset. Returns the regressed `24 x 3` joints.
pub fn reset_joint_positions<E: SceneEngine + ?Sized>(
    engine: &mut E,
    rig: &mut SkeletonRig,
    orig_trans: Vector3<f32>,
    shape: &[f32; NUM_SHAPE_COEFFS],
    regression_verts: &[usize],
    joint_regressor: &nd::Array2<f32>,
) -> SynthResult<nd::Array2<f32>> {
    if joint_regressor.dim() != (NUM_JOINTS, regression_verts.len()) {
        return Err(SynthError::validation(format!(
            "joint regressor must be {NUM_JOINTS}x{}, got {:?}",
            regression_verts.len(),
            joint_regressor.dim()
        )));
    }

    apply_pose(engine, rig, &PoseFrame::rest(orig_trans, *shape), None)?;

    let verts = engine.deformed_vertices()?;
    let mut gathered = nd::Array2::<f32>::zeros((regression_verts.len(), 3));
    for (mut row, &vi) in gathered.rows_mut().into_iter().zip(regression_verts) {
        let v = verts.get(vi).ok_or_else(|| {
            SynthError::validation(format!(
                "regression vertex {vi} out of range for mesh with {} vertices",
                verts.len()
            ))
        })?;
        row[0] = v.x;
        row[1] = v.y;
        row[2] = v.z;
    }

    let joints = joint_regressor.dot(&gathered);
    for part in BodyPart::ALL {
        let row = joints.row(part.index());
        let rest = rig
            .joint(part)
            .rest
            .moved_to(Vector3::new(row[0], row[1], row[2]));
        engine.set_rest_bone(part, rest)?;
        rig.joint_mut(part).rest = rest;
    }

    tracing::debug!(
        pelvis = ?rig.joint(BodyPart::ROOT).rest.head,
        "rest joints regressed for body shape"
    );
    Ok(joints)
}

#[cfg(test)]
#[path = "../../tests/unit/body/solver.rs"]
mod tests;
