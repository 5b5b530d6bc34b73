//! Shared fixtures for in-crate unit tests.

use crate::{
    body::rig::{BodyPart, NUM_JOINTS, RestBone},
    foundation::core::{Resolution, Vector3},
    render::engine::InMemoryEngine,
};

/// A small upright skeleton around the origin: joints spread along Z (height) and Y (sides).
pub(crate) fn template_bones() -> Vec<RestBone> {
    BodyPart::ALL
        .iter()
        .map(|&part| {
            let i = part.index() as f32;
            let side = match part.index() % 3 {
                1 => 0.1,
                2 => -0.1,
                _ => 0.0,
            };
            let head = Vector3::new(0.0, side, 0.05 * i - 0.5);
            RestBone {
                head,
                tail: head + Vector3::new(0.0, 0.0, 0.05),
            }
        })
        .collect()
}

/// Mesh with one vertex per joint (at the joint head) plus a few extra points.
pub(crate) fn template_mesh() -> Vec<Vector3<f32>> {
    let mut mesh: Vec<Vector3<f32>> = template_bones().iter().map(|b| b.head).collect();
    mesh.push(Vector3::new(0.0, 0.2, 0.0));
    mesh.push(Vector3::new(0.0, -0.2, 0.0));
    mesh
}

pub(crate) fn test_engine() -> InMemoryEngine {
    let res = Resolution::new(320, 240).unwrap();
    let mut engine = InMemoryEngine::new(res, template_bones(), template_mesh()).unwrap();
    use crate::render::engine::SceneEngine as _;
    engine
        .set_camera_location(Vector3::new(11.0, -1.0, 0.0))
        .unwrap();
    engine
}

/// Identity regressor selecting the first `NUM_JOINTS` mesh vertices.
pub(crate) fn identity_regressor() -> (Vec<usize>, ndarray::Array2<f32>) {
    let verts: Vec<usize> = (0..NUM_JOINTS).collect();
    (verts, ndarray::Array2::eye(NUM_JOINTS))
}

/// Body data over the template skeleton: identity regressor, four subjects per gender and
/// straight-line walks along +Z (`trans = (0, 0, 0.01 * frame)`).
pub(crate) fn body_data(sequences: &[(&str, usize)]) -> crate::pipeline::inputs::BodyData {
    let (verts, regressor) = identity_regressor();
    let shapes = |offset: f32| -> Vec<Vec<f32>> {
        (0..4)
            .map(|s| (0..16).map(|c| offset + s as f32 + c as f32 * 0.01).collect())
            .collect()
    };
    crate::pipeline::inputs::BodyData {
        regression_verts: verts,
        joint_regressor: regressor.rows().into_iter().map(|r| r.to_vec()).collect(),
        maleshapes: shapes(0.0),
        femaleshapes: shapes(10.0),
        v_template: template_mesh().iter().map(|v| [v.x, v.y, v.z]).collect(),
        sequences: sequences
            .iter()
            .map(|&(name, frames)| {
                let seq = crate::pipeline::inputs::MotionSequence {
                    poses: (0..frames)
                        .map(|f| {
                            let mut p = vec![0.0; crate::body::rig::POSE_DIM];
                            p[5] = 0.01 * f as f32;
                            p
                        })
                        .collect(),
                    trans: (0..frames).map(|f| [0.0, 0.0, 0.01 * f as f32]).collect(),
                };
                (name.to_string(), seq)
            })
            .collect(),
    }
}
