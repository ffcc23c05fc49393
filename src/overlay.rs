// src/overlay.rs
//
// Rendering of tracking results: the green lane-surface overlay blended
// onto the camera frame, and a debug view of the binarized frame with the
// smoothed boundary curves drawn in.

use image::{Rgb, RgbImage};

use crate::curve::Curve2;
use crate::mask::BinaryMask;
use crate::perspective::Perspective;

const LANE_FILL: Rgb<u8> = Rgb([0, 255, 0]);
const LEFT_CURVE: Rgb<u8> = Rgb([255, 0, 0]);
const RIGHT_CURVE: Rgb<u8> = Rgb([0, 0, 255]);

/// Fill the lane surface between the two smoothed curves in the rectified
/// view, map it back into camera space and alpha-blend it onto the frame.
///
/// Unfit curves simply produce no overlay; the frame passes through
/// unchanged.
pub fn lane_overlay(
    frame: &RgbImage,
    perspective: &Perspective,
    left: &Curve2,
    right: &Curve2,
) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut lane = RgbImage::new(width, height);

    for y in 0..height {
        let bounds = (left.eval(y as f64), right.eval(y as f64));
        if let (Some(left_x), Some(right_x)) = bounds {
            let lo = left_x.max(0.0) as u32;
            let hi = right_x.min((width - 1) as f64).max(0.0) as u32;
            for x in lo..=hi.min(width - 1) {
                lane.put_pixel(x, y, LANE_FILL);
            }
        }
    }

    blend(frame, &perspective.unwarp(&lane), 0.3)
}

/// Debug view: the binary mask as a grayscale image with the boundary
/// curves traced over it (left red, right blue).
pub fn mask_debug(mask: &BinaryMask, left: &Curve2, right: &Curve2) -> RgbImage {
    let (width, height) = (mask.width(), mask.height());
    let mut out = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            if mask.get(x, y) {
                out.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
    }

    for (curve, color) in [(left, LEFT_CURVE), (right, RIGHT_CURVE)] {
        for y in 0..height {
            if let Some(x) = curve.eval(y as f64) {
                let x = x.round();
                if x >= 0.0 && x < width as f64 {
                    out.put_pixel(x as u32, y, color);
                }
            }
        }
    }

    out
}

/// out = base + alpha * overlay, saturating per channel.
fn blend(base: &RgbImage, overlay: &RgbImage, alpha: f64) -> RgbImage {
    let mut out = base.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let top = overlay.get_pixel(x, y).0;
        for c in 0..3 {
            let value = pixel.0[c] as f64 + alpha * top[c] as f64;
            pixel.0[c] = value.min(255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perspective::Correspondence;

    fn identity_perspective(width: f64, height: f64) -> Perspective {
        Perspective::new([
            Correspondence {
                src: [0.0, 0.0],
                dst: [0.0, 0.0],
            },
            Correspondence {
                src: [width, 0.0],
                dst: [width, 0.0],
            },
            Correspondence {
                src: [width, height],
                dst: [width, height],
            },
            Correspondence {
                src: [0.0, height],
                dst: [0.0, height],
            },
        ])
        .unwrap()
    }

    fn straight(c: f64) -> Curve2 {
        Curve2::Fitted { a: 0.0, b: 0.0, c }
    }

    #[test]
    fn test_lane_overlay_tints_between_curves() {
        let frame = RgbImage::from_pixel(100, 40, Rgb([100, 100, 100]));
        let perspective = identity_perspective(100.0, 40.0);
        let out = lane_overlay(&frame, &perspective, &straight(20.0), &straight(80.0));

        // Inside the lane the green channel rose by 0.3 * 255
        let inside = out.get_pixel(50, 20).0;
        assert_eq!(inside[1], 176);
        assert_eq!(inside[0], 100);

        // Outside it the frame is untouched
        assert_eq!(out.get_pixel(5, 20).0, [100, 100, 100]);
    }

    #[test]
    fn test_lane_overlay_with_unfit_curves_passes_frame_through() {
        let frame = RgbImage::from_pixel(60, 30, Rgb([42, 42, 42]));
        let perspective = identity_perspective(60.0, 30.0);
        let out = lane_overlay(&frame, &perspective, &Curve2::Unfit, &Curve2::Unfit);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_mask_debug_draws_mask_and_curves() {
        let mut mask = BinaryMask::zeros(50, 20);
        mask.set(10, 10);
        let out = mask_debug(&mask, &straight(20.0), &straight(40.0));

        assert_eq!(out.get_pixel(10, 10).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(20, 5).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(40, 5).0, [0, 0, 255]);
        assert_eq!(out.get_pixel(30, 5).0, [0, 0, 0]);
    }
}
