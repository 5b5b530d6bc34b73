use super::*;
use crate::test_support::{identity_regressor, template_bones, test_engine};

fn assert_rotation(m: &Matrix3<f32>) {
    let should_be_identity = m * m.transpose();
    assert!(
        (should_be_identity - Matrix3::identity()).abs().max() < 1e-5,
        "R*R^T != I for {m}"
    );
    assert!((m.determinant() - 1.0).abs() < 1e-5);
}

#[test]
fn rodrigues_zero_is_exact_identity() {
    assert_eq!(rodrigues(Vector3::zeros()), Matrix3::identity());
}

#[test]
fn rodrigues_is_orthonormal_for_a_spread_of_vectors() {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        ((state >> 40) as f32 / (1u64 << 24) as f32) * 8.0 - 4.0
    };
    for _ in 0..500 {
        let v = Vector3::new(next(), next(), next());
        assert_rotation(&rodrigues(v));
    }
    assert_rotation(&rodrigues(Vector3::new(1e-7, 0.0, 0.0)));
    assert_rotation(&rodrigues(Vector3::new(0.0, std::f32::consts::PI, 0.0)));
}

#[test]
fn rodrigues_matches_known_quarter_turn() {
    let r = rodrigues(Vector3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
    let x = r * Vector3::x();
    assert!((x - Vector3::y()).norm() < 1e-6);
}

#[test]
fn blendshapes_of_zero_pose_are_zero() {
    let set = to_blendshapes(&[0.0; POSE_DIM]).unwrap();
    assert_eq!(set.rotations.len(), NUM_JOINTS);
    assert_eq!(set.offsets.len(), NUM_POSE_BLENDSHAPES);
    assert!(set.offsets.iter().all(|&o| o == 0.0));
}

#[test]
fn blendshape_offsets_skip_root_and_flatten_row_major() {
    let mut pose = [0.0f32; POSE_DIM];
    // Root rotation must not show up in the offsets.
    pose[0] = 1.0;
    // Joint 1: quarter turn about Z.
    pose[5] = std::f32::consts::FRAC_PI_2;
    let set = to_blendshapes(&pose).unwrap();

    let expected = set.rotations[1] - Matrix3::identity();
    for r in 0..3 {
        for c in 0..3 {
            assert_eq!(set.offsets[r * 3 + c], expected[(r, c)]);
        }
    }
    // Row 0 of a +90 deg Z rotation is [0, -1, 0]; minus identity gives [-1, -1, 0].
    assert!((set.offsets[0] + 1.0).abs() < 1e-6);
    assert!((set.offsets[1] + 1.0).abs() < 1e-6);
    assert!(set.offsets[9..].iter().all(|&o| o == 0.0));
}

#[test]
fn to_blendshapes_rejects_wrong_length() {
    assert!(to_blendshapes(&[0.0; 69]).is_err());
    assert!(PoseFrame::new(&[0.0; 73], Vector3::zeros(), &[0.0; 10]).is_err());
    assert!(PoseFrame::new(&[0.0; 72], Vector3::zeros(), &[0.0; 4]).is_err());
}

#[test]
fn apply_pose_mirrors_state_into_engine() {
    let mut engine = test_engine();
    let mut rig = SkeletonRig::load(&engine).unwrap();

    let mut pose = vec![0.0f32; POSE_DIM];
    pose[3 * BodyPart::LeftArm.index() + 2] = 0.5;
    let shape: Vec<f32> = (0..12).map(|i| i as f32 * 0.1).collect();
    let frame = PoseFrame::new(&pose, Vector3::new(0.1, 0.2, 0.3), &shape).unwrap();

    apply_pose(&mut engine, &mut rig, &frame, None).unwrap();

    assert_eq!(rig.root_translation, Vector3::new(0.1, 0.2, 0.3));
    assert_eq!(
        engine.joint_translation(BodyPart::ROOT).unwrap(),
        Vector3::new(0.1, 0.2, 0.3)
    );
    let q = engine.joint_rotation(BodyPart::LeftArm);
    assert!((q.angle() - 0.5).abs() < 1e-5);
    assert_eq!(rig.joint(BodyPart::LeftArm).rotation, q);
    assert_eq!(engine.blendshape_weight(BlendshapeKey::Shape(9)), shape[9]);
    let arm_first = 9 * (BodyPart::LeftArm.index() - 1);
    assert_eq!(
        engine.blendshape_weight(BlendshapeKey::Pose(arm_first as u16)),
        rig.pose_weights[arm_first]
    );
    // Nothing keyframed without a time.
    assert!(
        engine
            .keyframes(AnimProperty::JointRotation(BodyPart::LeftArm))
            .is_empty()
    );
}

#[test]
fn apply_pose_keyframes_every_mutated_property() {
    let mut engine = test_engine();
    let mut rig = SkeletonRig::load(&engine).unwrap();
    let frame = PoseFrame::rest(Vector3::zeros(), [0.0; NUM_SHAPE_COEFFS]);

    apply_pose(&mut engine, &mut rig, &frame, Some(FrameIndex(4))).unwrap();

    for part in BodyPart::ALL {
        assert_eq!(
            engine.keyframes(AnimProperty::JointRotation(part)),
            vec![FrameIndex(4)]
        );
        assert_eq!(
            engine.keyframes(AnimProperty::JointLocation(part)),
            vec![FrameIndex(4)]
        );
    }
    for i in [0u16, 100, 206] {
        assert_eq!(
            engine.keyframes(AnimProperty::Blendshape(BlendshapeKey::Pose(i))),
            vec![FrameIndex(4)]
        );
    }
    assert_eq!(
        engine.keyframes(AnimProperty::Blendshape(BlendshapeKey::Shape(9))),
        vec![FrameIndex(4)]
    );
}

#[test]
fn reset_joint_positions_moves_heads_and_keeps_offsets() {
    let mut engine = test_engine();
    let mut rig = SkeletonRig::load(&engine).unwrap();
    let (verts, _) = identity_regressor();

    // The in-memory engine does no skinning, so a scaled identity regressor doubles every head.
    let regressor = ndarray::Array2::<f32>::eye(NUM_JOINTS) * 2.0;
    let joints = reset_joint_positions(
        &mut engine,
        &mut rig,
        Vector3::zeros(),
        &[0.0; NUM_SHAPE_COEFFS],
        &verts,
        &regressor,
    )
    .unwrap();

    let template = template_bones();
    for part in BodyPart::ALL {
        let old = template[part.index()];
        let new = rig.joint(part).rest;
        assert!((new.head - old.head * 2.0).norm() < 1e-6);
        assert!(((new.tail - new.head) - (old.tail - old.head)).norm() < 1e-6);
        assert_eq!(engine.rest_bone(part).unwrap(), new);
        assert!((joints[[part.index(), 2]] - old.head.z * 2.0).abs() < 1e-6);
    }
}

#[test]
fn reset_joint_positions_validates_inputs() {
    let mut engine = test_engine();
    let mut rig = SkeletonRig::load(&engine).unwrap();
    let shape = [0.0; NUM_SHAPE_COEFFS];

    let bad_shape = ndarray::Array2::<f32>::zeros((NUM_JOINTS, 3));
    assert!(
        reset_joint_positions(
            &mut engine,
            &mut rig,
            Vector3::zeros(),
            &shape,
            &[0, 1],
            &bad_shape
        )
        .is_err()
    );

    let regressor = ndarray::Array2::<f32>::zeros((NUM_JOINTS, 1));
    assert!(
        reset_joint_positions(
            &mut engine,
            &mut rig,
            Vector3::zeros(),
            &shape,
            &[10_000],
            &regressor
        )
        .is_err()
    );
}
