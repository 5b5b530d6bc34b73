use std::path::Path;

use anyhow::Context as _;

use crate::{body::rig::NUM_JOINTS, foundation::error::SynthResult};

/// Marker radius in pixels.
pub const JOINT_RADIUS: i64 = 2;

const LEFT_LEG: [usize; 4] = [1, 4, 7, 10];
const RIGHT_LEG: [usize; 4] = [2, 5, 8, 11];
const LEFT_ARM: [usize; 5] = [13, 16, 18, 20, 22];
const RIGHT_ARM: [usize; 5] = [14, 17, 19, 21, 23];
const SPINE: [usize; 6] = [0, 3, 6, 9, 12, 15];

/// Marker colour of each joint, grouped by limb.
pub fn joint_colors() -> [image::Rgba<u8>; NUM_JOINTS] {
    let mut colors = [image::Rgba([0, 0, 0, 255]); NUM_JOINTS];
    let groups: [(&[usize], [u8; 3]); 5] = [
        (&LEFT_LEG, [255, 255, 0]),
        (&RIGHT_LEG, [0, 255, 0]),
        (&LEFT_ARM, [0, 0, 255]),
        (&RIGHT_ARM, [255, 0, 0]),
        (&SPINE, [0, 128, 128]),
    ];
    for (joints, [r, g, b]) in groups {
        for &j in joints {
            colors[j] = image::Rgba([r, g, b, 255]);
        }
    }
    colors
}

/// Draw filled joint markers. `joints2d` are pixel coordinates with y growing upwards, as
/// recorded in the annotations; markers partially off the image are clipped.
pub fn draw_joints(img: &mut image::RgbaImage, joints2d: &[[f32; 2]]) {
    let colors = joint_colors();
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    for (i, &[x, y]) in joints2d.iter().enumerate().take(NUM_JOINTS) {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let cx = x.round() as i64;
        let cy = h - 1 - y.round() as i64;
        for dy in -JOINT_RADIUS..=JOINT_RADIUS {
            for dx in -JOINT_RADIUS..=JOINT_RADIUS {
                if dx * dx + dy * dy > JOINT_RADIUS * JOINT_RADIUS {
                    continue;
                }
                let (px, py) = (cx + dx, cy + dy);
                if (0..w).contains(&px) && (0..h).contains(&py) {
                    img.put_pixel(px as u32, py as u32, colors[i]);
                }
            }
        }
    }
}

/// Draw the skeleton onto a rendered frame in place.
pub fn draw_joints_on_file(path: &Path, joints2d: &[[f32; 2]]) -> SynthResult<()> {
    let mut img = image::open(path)
        .with_context(|| format!("open frame '{}'", path.display()))?
        .to_rgba8();
    draw_joints(&mut img, joints2d);
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write frame '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
