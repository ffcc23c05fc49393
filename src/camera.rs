// src/camera.rs
//
// Camera model: pinhole intrinsics plus Brown–Conrady distortion, loaded
// from a persisted YAML document produced by the offline calibration step.
// A missing or corrupt model aborts startup; undistortion itself never
// fails per frame.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::resample::bilinear;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("camera model {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("camera model has invalid intrinsics (fx = {fx}, fy = {fy})")]
    InvalidIntrinsics { fx: f64, fy: f64 },
}

/// The persisted calibration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraModel {
    /// 3×3 camera matrix.
    pub matrix: [[f64; 3]; 3],
    /// Distortion coefficients (k1, k2, p1, p2, k3).
    pub distortion: [f64; 5],
}

/// Brown–Conrady radial-tangential distortion.
#[derive(Debug, Clone, Copy)]
struct Distortion {
    k1: f64,
    k2: f64,
    p1: f64,
    p2: f64,
    k3: f64,
}

impl Distortion {
    /// Apply distortion to normalized pinhole coordinates.
    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + x_tan, y * radial + y_tan)
    }
}

#[derive(Debug)]
pub struct Camera {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    distortion: Distortion,
}

impl Camera {
    pub fn load(path: &Path) -> Result<Self, CameraError> {
        let contents = fs::read_to_string(path).map_err(|source| CameraError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: CameraModel =
            serde_yaml::from_str(&contents).map_err(|source| CameraError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let camera = Self::from_model(&model)?;
        info!("camera model loaded from {}", path.display());
        Ok(camera)
    }

    pub fn from_model(model: &CameraModel) -> Result<Self, CameraError> {
        let fx = model.matrix[0][0];
        let fy = model.matrix[1][1];
        if !fx.is_finite() || !fy.is_finite() || fx.abs() < 1e-9 || fy.abs() < 1e-9 {
            return Err(CameraError::InvalidIntrinsics { fx, fy });
        }
        let [k1, k2, p1, p2, k3] = model.distortion;
        Ok(Self {
            fx,
            fy,
            cx: model.matrix[0][2],
            cy: model.matrix[1][2],
            distortion: Distortion { k1, k2, p1, p2, k3 },
        })
    }

    /// Remove lens distortion by resampling: each undistorted pixel maps
    /// through the distortion model back into the source image. Samples
    /// that leave the source render black.
    pub fn undistort(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        let mut out = RgbImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let xn = (x as f64 - self.cx) / self.fx;
                let yn = (y as f64 - self.cy) / self.fy;
                let (xd, yd) = self.distortion.distort(xn, yn);
                let src_x = self.fx * xd + self.cx;
                let src_y = self.fy * yd + self.cy;
                if let Some(rgb) = bilinear(image, src_x, src_y) {
                    out.put_pixel(x, y, Rgb(rgb));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Power-of-two focal lengths keep the normalize/denormalize round trip
    // exact, so zero distortion reproduces the input bit for bit.
    fn model(distortion: [f64; 5]) -> CameraModel {
        CameraModel {
            matrix: [[128.0, 0.0, 8.0], [0.0, 64.0, 6.0], [0.0, 0.0, 1.0]],
            distortion,
        }
    }

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        let mut image = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.put_pixel(x, y, Rgb([(x * 15) as u8, (y * 20) as u8, 128]));
            }
        }
        image
    }

    #[test]
    fn test_zero_distortion_is_identity() {
        let camera = Camera::from_model(&model([0.0; 5])).unwrap();
        let image = gradient_image(16, 12);
        assert_eq!(camera.undistort(&image), image);
    }

    #[test]
    fn test_distortion_moves_off_center_pixels() {
        let camera = Camera::from_model(&model([0.4, 0.0, 0.0, 0.0, 0.0])).unwrap();
        let image = gradient_image(16, 12);
        let out = camera.undistort(&image);
        assert_ne!(out, image);
        // The principal point itself is a fixed point of the model
        assert_eq!(out.get_pixel(8, 6), image.get_pixel(8, 6));
    }

    #[test]
    fn test_zero_focal_length_is_rejected() {
        let mut bad = model([0.0; 5]);
        bad.matrix[0][0] = 0.0;
        assert!(matches!(
            Camera::from_model(&bad),
            Err(CameraError::InvalidIntrinsics { .. })
        ));
    }

    #[test]
    fn test_missing_model_file_fails_at_load() {
        let err = Camera::load(Path::new("/nonexistent/camera.yaml")).unwrap_err();
        assert!(matches!(err, CameraError::Read { .. }));
    }

    #[test]
    fn test_model_yaml_round_trip() {
        let text = serde_yaml::to_string(&model([0.1, -0.2, 0.0, 0.0, 0.05])).unwrap();
        let parsed: CameraModel = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed.distortion[0], 0.1);
        assert_eq!(parsed.matrix[0][0], 100.0);
    }
}
