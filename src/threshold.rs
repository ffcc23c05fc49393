// src/threshold.rs
//
// The threshold operator family that turns a rectified color frame into
// binary masks. A small closed set of variants dispatched by a colorspace
// tag: scaled |Sobel| derivatives, gradient magnitude and direction over
// the grayscale plane, and single-channel band selects over HLS. Each
// operator keeps pixels whose extracted value falls inside an inclusive
// (min, max) range.

use std::f32::consts::PI;

use image::RgbImage;

use crate::colorspace::{FrameChannels, Plane};
use crate::mask::BinaryMask;

/// Which per-frame plane an operator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Gray,
    Hls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HlsChannel {
    Hue,
    Lightness,
    Saturation,
}

/// The extraction each operator performs before range filtering.
#[derive(Debug, Clone, Copy)]
pub enum ThresholdKind {
    /// |Sobel x|, rescaled to 0..255.
    SobelX { kernel: usize },
    /// |Sobel y|, rescaled to 0..255.
    SobelY { kernel: usize },
    /// Gradient magnitude, rescaled to 0..255.
    Magnitude { kernel: usize },
    /// Gradient direction atan2(|gy|, |gx|) in radians.
    Direction { kernel: usize },
    /// One HLS channel, 8-bit convention.
    Channel(HlsChannel),
}

/// A named range filter over one extracted channel.
#[derive(Debug, Clone)]
pub struct ThresholdOp {
    name: &'static str,
    kind: ThresholdKind,
    min: f32,
    max: f32,
}

impl ThresholdOp {
    pub fn new(name: &'static str, kind: ThresholdKind, min: f32, max: f32) -> Self {
        Self {
            name,
            kind,
            min,
            max,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn colorspace(&self) -> Colorspace {
        match self.kind {
            ThresholdKind::Channel(_) => Colorspace::Hls,
            _ => Colorspace::Gray,
        }
    }

    fn core(&self, channels: &FrameChannels) -> Plane {
        match self.kind {
            ThresholdKind::SobelX { kernel } => scaled_abs(&sobel_x(&channels.gray, kernel)),
            ThresholdKind::SobelY { kernel } => scaled_abs(&sobel_y(&channels.gray, kernel)),
            ThresholdKind::Magnitude { kernel } => {
                let gx = sobel_x(&channels.gray, kernel);
                let gy = sobel_y(&channels.gray, kernel);
                let mut mag = Plane::new(gx.width(), gx.height());
                for y in 0..gx.height() {
                    for x in 0..gx.width() {
                        let value = (gx.get(x, y).powi(2) + gy.get(x, y).powi(2)).sqrt();
                        mag.set(x, y, value);
                    }
                }
                scaled_abs(&mag)
            }
            ThresholdKind::Direction { kernel } => {
                let gx = sobel_x(&channels.gray, kernel);
                let gy = sobel_y(&channels.gray, kernel);
                let mut dir = Plane::new(gx.width(), gx.height());
                for y in 0..gx.height() {
                    for x in 0..gx.width() {
                        dir.set(x, y, gy.get(x, y).abs().atan2(gx.get(x, y).abs()));
                    }
                }
                dir
            }
            ThresholdKind::Channel(HlsChannel::Hue) => channels.hue.clone(),
            ThresholdKind::Channel(HlsChannel::Lightness) => channels.lightness.clone(),
            ThresholdKind::Channel(HlsChannel::Saturation) => channels.saturation.clone(),
        }
    }

    /// Extract the operator's channel and keep pixels inside the range.
    pub fn apply(&self, channels: &FrameChannels) -> BinaryMask {
        let candidate = self.core(channels);
        let mut mask = BinaryMask::zeros(candidate.width(), candidate.height());
        for y in 0..candidate.height() {
            for x in 0..candidate.width() {
                let value = candidate.get(x, y);
                if value >= self.min && value <= self.max {
                    mask.set(x, y);
                }
            }
        }
        mask
    }
}

/// The tuned operator set plus the fixed boolean combination that produces
/// the tracking mask.
#[derive(Debug, Clone)]
pub struct ThresholdBank {
    yellow_h: ThresholdOp,
    yellow_s: ThresholdOp,
    white_l: ThresholdOp,
    sobel_x: ThresholdOp,
    sobel_y: ThresholdOp,
    magnitude: ThresholdOp,
    direction: ThresholdOp,
}

impl Default for ThresholdBank {
    fn default() -> Self {
        Self::standard()
    }
}

impl ThresholdBank {
    pub fn standard() -> Self {
        Self {
            yellow_h: ThresholdOp::new(
                "yellow_h",
                ThresholdKind::Channel(HlsChannel::Hue),
                20.0,
                40.0,
            ),
            yellow_s: ThresholdOp::new(
                "yellow_s",
                ThresholdKind::Channel(HlsChannel::Saturation),
                120.0,
                255.0,
            ),
            white_l: ThresholdOp::new(
                "white_l",
                ThresholdKind::Channel(HlsChannel::Lightness),
                220.0,
                255.0,
            ),
            sobel_x: ThresholdOp::new("sobelx", ThresholdKind::SobelX { kernel: 3 }, 10.0, 120.0),
            sobel_y: ThresholdOp::new("sobely", ThresholdKind::SobelY { kernel: 3 }, 10.0, 120.0),
            magnitude: ThresholdOp::new(
                "mag",
                ThresholdKind::Magnitude { kernel: 3 },
                5.0,
                150.0,
            ),
            direction: ThresholdOp::new(
                "dir",
                ThresholdKind::Direction { kernel: 5 },
                PI / 8.0,
                PI / 2.0 - PI / 8.0,
            ),
        }
    }

    pub fn ops(&self) -> [&ThresholdOp; 7] {
        [
            &self.yellow_h,
            &self.yellow_s,
            &self.white_l,
            &self.sobel_x,
            &self.sobel_y,
            &self.magnitude,
            &self.direction,
        ]
    }

    /// Binarize one rectified frame:
    /// `sobelx | (mag & dir) | (yellow_s & yellow_h) | white_l`.
    pub fn binarize(&self, image: &RgbImage) -> BinaryMask {
        let channels = FrameChannels::of(image);

        let select_sobel = self
            .sobel_x
            .apply(&channels)
            .or(&self.magnitude.apply(&channels).and(&self.direction.apply(&channels)));
        let select_yellow = self
            .yellow_s
            .apply(&channels)
            .and(&self.yellow_h.apply(&channels));
        let select_white = self.white_l.apply(&channels);

        select_sobel.or(&select_yellow).or(&select_white)
    }
}

// ── Sobel ────────────────────────────────────────────────────────────────

// Separable derivative kernels matching the OpenCV Sobel pairs.
const DERIV_3: [f32; 3] = [-1.0, 0.0, 1.0];
const SMOOTH_3: [f32; 3] = [1.0, 2.0, 1.0];
const DERIV_5: [f32; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];
const SMOOTH_5: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];

fn kernels(ksize: usize) -> (&'static [f32], &'static [f32]) {
    match ksize {
        3 => (&DERIV_3, &SMOOTH_3),
        5 => (&DERIV_5, &SMOOTH_5),
        other => panic!("unsupported Sobel kernel size {}", other),
    }
}

pub fn sobel_x(plane: &Plane, ksize: usize) -> Plane {
    let (deriv, smooth) = kernels(ksize);
    convolve_separable(plane, deriv, smooth)
}

pub fn sobel_y(plane: &Plane, ksize: usize) -> Plane {
    let (deriv, smooth) = kernels(ksize);
    convolve_separable(plane, smooth, deriv)
}

/// Convolve with a horizontal and a vertical 1-D kernel, clamping at the
/// borders.
fn convolve_separable(src: &Plane, horizontal: &[f32], vertical: &[f32]) -> Plane {
    let width = src.width();
    let height = src.height();
    let radius = (horizontal.len() / 2) as i64;

    let mut horizontal_pass = Plane::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for (k, &weight) in horizontal.iter().enumerate() {
                let sx = (x as i64 + k as i64 - radius).clamp(0, width as i64 - 1);
                sum += weight * src.get(sx as u32, y);
            }
            horizontal_pass.set(x, y, sum);
        }
    }

    let mut out = Plane::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for (k, &weight) in vertical.iter().enumerate() {
                let sy = (y as i64 + k as i64 - radius).clamp(0, height as i64 - 1);
                sum += weight * horizontal_pass.get(x, sy as u32);
            }
            out.set(x, y, sum);
        }
    }
    out
}

/// |v| rescaled so the largest magnitude maps to 255. An all-zero plane
/// stays zero.
fn scaled_abs(plane: &Plane) -> Plane {
    let mut out = Plane::new(plane.width(), plane.height());
    let max = plane.data().iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if max == 0.0 {
        return out;
    }
    for y in 0..plane.height() {
        for x in 0..plane.width() {
            out.set(x, y, 255.0 * plane.get(x, y).abs() / max);
        }
    }
    out
}
