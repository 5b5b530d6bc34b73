use super::*;

#[test]
fn canonical_order_matches_indices() {
    for (i, part) in BodyPart::ALL.iter().enumerate() {
        assert_eq!(part.index(), i);
        assert_eq!(BodyPart::from_index(i), Some(*part));
    }
    assert_eq!(BodyPart::from_index(NUM_JOINTS), None);
    assert_eq!(BodyPart::ALL[0], BodyPart::ROOT);
}

#[test]
fn names_are_unique_and_round_trip() {
    let mut seen = std::collections::HashSet::new();
    for part in BodyPart::ALL {
        assert!(seen.insert(part.part_name()));
        assert_eq!(BodyPart::from_part_name(part.part_name()), Some(part));
    }
    assert_eq!(BodyPart::LeftForeArm.bone_name(), "L_Elbow");
    assert_eq!(BodyPart::Spine2.bone_name(), "Spine3");
    assert_eq!(BodyPart::from_part_name("tail"), None);
}

#[test]
fn blendshape_keys_are_zero_padded() {
    assert_eq!(BlendshapeKey::Pose(7).to_string(), "Pose007");
    assert_eq!(BlendshapeKey::Shape(9).to_string(), "Shape009");
    assert_eq!(BlendshapeKey::Pose(206).to_string(), "Pose206");
}

#[test]
fn rest_bone_move_keeps_offset() {
    let bone = RestBone {
        head: Vector3::new(1.0, 1.0, 1.0),
        tail: Vector3::new(1.0, 2.0, 1.5),
    };
    let moved = bone.moved_to(Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(moved.head, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(moved.tail, Vector3::new(0.0, 1.0, 0.5));
}

#[test]
fn rig_requires_full_joint_set() {
    let bone = RestBone {
        head: Vector3::zeros(),
        tail: Vector3::new(0.0, 0.1, 0.0),
    };
    assert!(SkeletonRig::from_rest_bones(&[bone; 3]).is_err());

    let rig = SkeletonRig::from_rest_bones(&[bone; NUM_JOINTS]).unwrap();
    assert_eq!(rig.joints().len(), NUM_JOINTS);
    assert_eq!(rig.pose_weights.len(), NUM_POSE_BLENDSHAPES);
    assert_eq!(rig.shape_weights.len(), NUM_SHAPE_COEFFS);
    assert_eq!(rig.joint(BodyPart::Head).part, BodyPart::Head);
}
