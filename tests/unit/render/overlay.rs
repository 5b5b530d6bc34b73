use super::*;

#[test]
fn every_joint_has_a_group_colour() {
    let colors = joint_colors();
    assert!(colors.iter().all(|c| c.0 != [0, 0, 0, 255]));
    assert_eq!(colors[0], colors[15]);
    assert_eq!(colors[1].0, [255, 255, 0, 255]);
    assert_eq!(colors[23].0, [255, 0, 0, 255]);
}

#[test]
fn markers_are_flipped_to_image_rows() {
    let mut img = image::RgbaImage::new(32, 24);
    let mut joints = [[-100.0f32, -100.0]; NUM_JOINTS];
    joints[0] = [10.0, 4.0];
    draw_joints(&mut img, &joints);

    let spine = joint_colors()[0];
    assert_eq!(*img.get_pixel(10, 19), spine);
    assert_eq!(*img.get_pixel(12, 19), spine);
    assert_eq!(img.get_pixel(10, 4).0, [0, 0, 0, 0]);
    // Corner of the bounding square is outside the disc.
    assert_eq!(img.get_pixel(12, 21).0, [0, 0, 0, 0]);
}

#[test]
fn pixel_rows_zero_and_top_map_to_image_edges() {
    let mut img = image::RgbaImage::new(16, 12);
    let mut joints = [[-100.0f32, -100.0]; NUM_JOINTS];
    joints[1] = [3.0, 0.0];
    joints[2] = [12.0, 11.0];
    draw_joints(&mut img, &joints);

    let colors = joint_colors();
    assert_eq!(*img.get_pixel(3, 11), colors[1]);
    assert_eq!(*img.get_pixel(12, 0), colors[2]);
}

#[test]
fn off_image_markers_are_clipped() {
    let mut img = image::RgbaImage::new(8, 8);
    draw_joints(&mut img, &[[0.0, 8.0], [f32::NAN, 1.0]]);
    assert_eq!(*img.get_pixel(0, 0), joint_colors()[0]);
}

#[test]
fn draws_onto_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("Image0000.png");
    image::RgbaImage::new(16, 16).save(&p).unwrap();

    let mut joints = [[-100.0f32, -100.0]; NUM_JOINTS];
    joints[14] = [8.0, 8.0];
    draw_joints_on_file(&p, &joints).unwrap();

    let img = image::open(&p).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(8, 7), joint_colors()[14]);
    assert!(draw_joints_on_file(&dir.path().join("missing.png"), &joints).is_err());
}
