// src/geometry.rs
//
// Real-world lane geometry. The rectified perspective is not isotropic, so
// curvature is computed by resampling a pixel-space curve into meters and
// refitting before evaluating — converting a pixel-space curvature after
// the fact would be biased by the differing x/y scales.

use serde::{Deserialize, Serialize};

use crate::curve::{Curve2, PointCloud};

/// Anisotropic pixel-to-meter scale of the rectified view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PixelScale {
    /// Meters per pixel along x.
    pub x_m_per_px: f64,
    /// Meters per pixel along y.
    pub y_m_per_px: f64,
}

impl Default for PixelScale {
    fn default() -> Self {
        Self {
            x_m_per_px: 3.7 / 700.0,
            y_m_per_px: 30.0 / 720.0,
        }
    }
}

impl PixelScale {
    pub fn x_to_meters(&self, pixels: f64) -> f64 {
        pixels * self.x_m_per_px
    }

    pub fn y_to_meters(&self, pixels: f64) -> f64 {
        pixels * self.y_m_per_px
    }

    /// Refit a pixel-space curve in real-world units by sampling it at
    /// every pixel row of an image of the given height.
    pub fn curve_to_meters(&self, curve: &Curve2, height: u32) -> Curve2 {
        let (a, b, c) = match curve.coefficients() {
            Some(coeffs) => coeffs,
            None => return Curve2::Unfit,
        };
        let mut xs = Vec::with_capacity(height as usize);
        let mut ys = Vec::with_capacity(height as usize);
        for row in 0..height {
            let y = row as f64;
            xs.push(self.x_to_meters(a * y * y + b * y + c));
            ys.push(self.y_to_meters(y));
        }
        PointCloud::new(xs, ys).fit_quadratic()
    }
}

/// Radius of curvature in meters at the image row closest to the vehicle.
///
/// `None` when the curve is unfit; `f64::INFINITY` for a perfectly straight
/// boundary.
pub fn curvature_m(curve: &Curve2, scale: &PixelScale, height: u32) -> Option<f64> {
    let meters = scale.curve_to_meters(curve, height);
    meters.curvature(scale.y_to_meters(height as f64))
}

/// The two (possibly smoothed) boundary curves viewed as one lane.
pub struct Lane<'a> {
    left: &'a Curve2,
    right: &'a Curve2,
    scale: PixelScale,
}

impl<'a> Lane<'a> {
    pub fn new(left: &'a Curve2, right: &'a Curve2, scale: PixelScale) -> Self {
        Self { left, right, scale }
    }

    /// Left and right boundary x in pixel space at row `y`.
    pub fn base(&self, y: f64) -> Option<(f64, f64)> {
        Some((self.left.eval(y)?, self.right.eval(y)?))
    }

    /// Lane center x in pixel space at row `y`.
    pub fn center(&self, y: f64) -> Option<f64> {
        let (left, right) = self.base(y)?;
        Some((left + right) / 2.0)
    }

    /// Lane width in meters at row `y`.
    pub fn width_m(&self, y: f64) -> Option<f64> {
        let (left, right) = self.base(y)?;
        Some(self.scale.x_to_meters(right - left))
    }

    /// Mean radius of curvature of both boundaries in meters, evaluated at
    /// the row closest to the vehicle.
    pub fn curvature_m(&self, height: u32) -> Option<f64> {
        let left = curvature_m(self.left, &self.scale, height)?;
        let right = curvature_m(self.right, &self.scale, height)?;
        Some((left + right) / 2.0)
    }

    /// Lateral offset of the vehicle from the lane center in meters,
    /// assuming the camera is mounted at the image midline. Positive means
    /// the vehicle sits right of center.
    pub fn offset_m(&self, width: u32, height: u32) -> Option<f64> {
        let vehicle_center = width as f64 / 2.0;
        let lane_center = self.center(height as f64)?;
        Some(self.scale.x_to_meters(vehicle_center - lane_center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(c: f64) -> Curve2 {
        Curve2::Fitted { a: 0.0, b: 0.0, c }
    }

    #[test]
    fn test_width_uses_x_scale() {
        let scale = PixelScale::default();
        let left = straight(260.0);
        let right = straight(960.0);
        let lane = Lane::new(&left, &right, scale);

        // 700 px at 3.7/700 m/px is exactly the etalon width
        let width = lane.width_m(720.0).unwrap();
        assert!((width - 3.7).abs() < 1e-12);
    }

    #[test]
    fn test_center_and_offset() {
        let scale = PixelScale::default();
        let left = straight(240.0);
        let right = straight(940.0);
        let lane = Lane::new(&left, &right, scale);

        assert!((lane.center(720.0).unwrap() - 590.0).abs() < 1e-12);

        // Image 1280 wide: vehicle at 640, lane center at 590 → 50 px right
        let offset = lane.offset_m(1280, 720).unwrap();
        assert!((offset - scale.x_to_meters(50.0)).abs() < 1e-12);
    }

    #[test]
    fn test_straight_lane_radius_is_effectively_infinite() {
        // The meter-space refit of a perfectly straight boundary may pick up
        // a vanishing quadratic term from round-off, so the radius is either
        // infinite or far beyond any road geometry.
        let scale = PixelScale::default();
        let left = straight(260.0);
        let right = straight(960.0);
        let lane = Lane::new(&left, &right, scale);
        assert!(lane.curvature_m(720).unwrap() > 1e6);
    }

    #[test]
    fn test_meter_refit_differs_from_naive_conversion() {
        // A genuinely curved boundary: the refit radius must reflect the
        // anisotropic scale, not the pixel-space radius times a factor.
        let scale = PixelScale::default();
        let curve = Curve2::Fitted {
            a: 2e-4,
            b: -0.3,
            c: 400.0,
        };
        let radius = curvature_m(&curve, &scale, 720).unwrap();
        assert!(radius.is_finite());
        assert!(radius > 0.0);

        let pixel_radius = curve.curvature(720.0).unwrap();
        assert!((radius - pixel_radius).abs() > 1.0);
    }

    #[test]
    fn test_unfit_boundary_disables_metrics() {
        let scale = PixelScale::default();
        let left = straight(260.0);
        let unfit = Curve2::Unfit;
        let lane = Lane::new(&left, &unfit, scale);

        assert!(lane.width_m(720.0).is_none());
        assert!(lane.center(720.0).is_none());
        assert!(lane.curvature_m(720).is_none());
        assert!(lane.offset_m(1280, 720).is_none());
    }

    #[test]
    fn test_curve_to_meters_preserves_straightness() {
        let scale = PixelScale::default();
        let meters = scale.curve_to_meters(&straight(350.0), 720);
        let (a, b, c) = meters.coefficients().unwrap();
        assert!(a.abs() < 1e-6);
        assert!(b.abs() < 1e-6);
        assert!((c - scale.x_to_meters(350.0)).abs() < 1e-6);
    }
}
