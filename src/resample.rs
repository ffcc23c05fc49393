// src/resample.rs

use image::RgbImage;

/// Coordinates this close to the image border are snapped onto it, so the
/// inverse-mapping warps don't drop border pixels to numerical noise.
const BORDER_EPS: f64 = 1e-9;

/// Bilinear sample of an RGB image at fractional coordinates.
///
/// Returns `None` when the sample point falls outside the image, which the
/// warps render as black.
pub(crate) fn bilinear(image: &RgbImage, x: f64, y: f64) -> Option<[u8; 3]> {
    let (width, height) = image.dimensions();
    let x = snap_to_border(x, (width - 1) as f64);
    let y = snap_to_border(y, (height - 1) as f64);
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let value = p00[c] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f64 * fx * (1.0 - fy)
            + p01[c] as f64 * (1.0 - fx) * fy
            + p11[c] as f64 * fx * fy;
        out[c] = value.round() as u8;
    }
    Some(out)
}

fn snap_to_border(value: f64, max: f64) -> f64 {
    if value < 0.0 && value > -BORDER_EPS {
        0.0
    } else if value > max && value < max + BORDER_EPS {
        max
    } else {
        value
    }
}
