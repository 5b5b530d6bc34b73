use super::*;
use crate::test_support::body_data;

#[test]
fn catalog_loads_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("idx_info.json");
    std::fs::write(
        &p,
        r#"[{"name": "01_01", "nb_frames": 300}, {"name": "h36m_S1", "nb_frames": 90}]"#,
    )
    .unwrap();
    let cat = SequenceCatalog::from_path(&p).unwrap();
    assert_eq!(cat.len(), 2);
    assert_eq!(cat.entries[1].name, "h36m_S1");
    assert_eq!(cat.by_name("01_01").unwrap().nb_frames, 300);
    assert!(cat.by_name("nope").is_none());

    std::fs::write(&p, "[]").unwrap();
    assert!(SequenceCatalog::from_path(&p).is_err());
}

#[test]
fn known_captures_are_trimmed() {
    let seq = |n: usize| MotionSequence {
        poses: (0..n).map(|i| vec![i as f32; POSE_DIM]).collect(),
        trans: (0..n).map(|i| [i as f32; 3]).collect(),
    };
    let a = seq(250).trimmed("05_01");
    assert_eq!(a.len(), 150);
    assert_eq!(a.trans.len(), 150);
    assert_eq!(a.poses[149][0], 149.0);

    let b = seq(250).trimmed("10_04");
    assert_eq!(b.len(), 190);
    assert_eq!(b.poses[0][0], 60.0);
    assert_eq!(b.trans[0], [60.0; 3]);

    assert_eq!(seq(50).trimmed("05_01").len(), 0);
    assert_eq!(seq(10).trimmed("01_01").len(), 10);
}

#[test]
fn body_data_validation_and_tables() {
    let data = body_data(&[("01_01", 5)]);
    data.validate().unwrap();
    assert_eq!(data.joint_regressor().unwrap().dim(), (24, 24));
    let shapes = data.shapes(Gender::Female).unwrap();
    assert_eq!(shapes.dim(), (4, NUM_SHAPE_COEFFS));
    assert_eq!(shapes[[2, 9]], data.femaleshapes[2][9]);
    assert_eq!(shapes.row(0).to_vec(), data.femaleshapes[0][..NUM_SHAPE_COEFFS].to_vec());
    assert!(data.sequence("01_01").is_ok());
    assert!(matches!(
        data.sequence("02_02"),
        Err(SynthError::Precondition(_))
    ));

    let mut bad = data.clone();
    bad.joint_regressor.pop();
    assert!(bad.validate().is_err());

    let mut bad = data.clone();
    if let Some(s) = bad.sequences.get_mut("01_01") {
        s.trans.pop();
    }
    assert!(bad.validate().is_err());
}

#[test]
fn mocap_frame_lookup() {
    let data = body_data(&[("01_01", 3)]);
    let seq = data.sequence("01_01").unwrap();
    let f = seq.frame(2, &[0.0; NUM_SHAPE_COEFFS]).unwrap();
    assert_eq!(f.trans, Vector3::new(0.0, 0.0, 0.02));
    assert!(seq.frame(3, &[0.0; NUM_SHAPE_COEFFS]).is_err());
}

#[test]
fn asset_lists_resolve_against_base() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bg.txt"), "a.jpg\n\n  b.jpg  \n").unwrap();
    let bgs = background_list(dir.path()).unwrap();
    assert_eq!(bgs, vec![dir.path().join("a.jpg"), dir.path().join("b.jpg")]);

    std::fs::create_dir_all(dir.path().join("textures")).unwrap();
    std::fs::write(
        dir.path().join("textures").join("female_train.txt"),
        "textures/female/nongrey_female_0001.jpg\n",
    )
    .unwrap();
    let cloth = clothing_list(dir.path(), Gender::Female).unwrap();
    assert_eq!(
        cloth,
        vec![dir.path().join("textures/female/nongrey_female_0001.jpg")]
    );
    assert!(clothing_list(dir.path(), Gender::Male).is_err());
}
