// src/perspective.rs
//
// Bird's-eye rectification. Built once from four fixed src→dst point
// correspondences; warp and unwarp are pure per-image functions using
// inverse mapping with bilinear interpolation.

use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use thiserror::Error;

use crate::resample::bilinear;

#[derive(Debug, Error)]
pub enum PerspectiveError {
    #[error("perspective correspondences are degenerate (collinear or repeated points)")]
    Degenerate,
}

/// One src→dst point pair of the rectification geometry.
#[derive(Debug, Clone, Copy)]
pub struct Correspondence {
    pub src: [f64; 2],
    pub dst: [f64; 2],
}

pub struct Perspective {
    matrix: Matrix3<f64>,
    back: Matrix3<f64>,
}

impl Perspective {
    /// Solve the homography that maps the four src points exactly onto the
    /// four dst points (h33 fixed to 1).
    pub fn new(pairs: [Correspondence; 4]) -> Result<Self, PerspectiveError> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, pair) in pairs.iter().enumerate() {
            let [x, y] = pair.src;
            let [u, v] = pair.dst;
            a[(2 * i, 0)] = x;
            a[(2 * i, 1)] = y;
            a[(2 * i, 2)] = 1.0;
            a[(2 * i, 6)] = -x * u;
            a[(2 * i, 7)] = -y * u;
            b[2 * i] = u;

            a[(2 * i + 1, 3)] = x;
            a[(2 * i + 1, 4)] = y;
            a[(2 * i + 1, 5)] = 1.0;
            a[(2 * i + 1, 6)] = -x * v;
            a[(2 * i + 1, 7)] = -y * v;
            b[2 * i + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(PerspectiveError::Degenerate)?;
        let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        let back = matrix.try_inverse().ok_or(PerspectiveError::Degenerate)?;

        Ok(Self { matrix, back })
    }

    /// Project a point from camera space into the rectified view.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        apply(&self.matrix, x, y)
    }

    /// Rectify an undistorted camera frame into the bird's-eye view.
    pub fn warp(&self, image: &RgbImage) -> RgbImage {
        remap(image, &self.back)
    }

    /// Map a rectified image back into camera space.
    pub fn unwarp(&self, image: &RgbImage) -> RgbImage {
        remap(image, &self.matrix)
    }
}

fn apply(h: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = h * Vector3::new(x, y, 1.0);
    (p[0] / p[2], p[1] / p[2])
}

/// Inverse mapping: each output pixel samples the source through `inverse`.
fn remap(image: &RgbImage, inverse: &Matrix3<f64>) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = apply(inverse, x as f64, y as f64);
            if let Some(rgb) = bilinear(image, sx, sy) {
                out.put_pixel(x, y, Rgb(rgb));
            }
        }
    }
    out
}
