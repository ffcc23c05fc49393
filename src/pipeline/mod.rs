// src/pipeline/mod.rs
//
// Frame orchestration: undistort → rectify → threshold → track → render,
// once per frame, with the per-frame metrics accumulated for the run.

pub mod metrics;
pub mod tracker;

pub use metrics::{FrameMetrics, MetricsLog, MetricsSummary};
pub use tracker::{FrameEstimate, LaneTracker, TrackerConfig};

use image::RgbImage;
use thiserror::Error;

use crate::camera::Camera;
use crate::mask::BinaryMask;
use crate::overlay;
use crate::perspective::Perspective;
use crate::threshold::ThresholdBank;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "frame is {got_width}x{got_height} but the rectification geometry \
         expects {expected_width}x{expected_height}"
    )]
    FrameSizeMismatch {
        expected_width: u32,
        expected_height: u32,
        got_width: u32,
        got_height: u32,
    },
}

/// Everything produced for one frame.
pub struct ProcessedFrame {
    /// Camera frame with the lane surface blended in.
    pub overlay: RgbImage,
    /// Binarized rectified view with the smoothed curves traced over it.
    pub debug: RgbImage,
    /// Smoothed curves and the flat metrics record.
    pub estimate: FrameEstimate,
}

/// The per-video pipeline: fixed collaborators plus the tracking state.
///
/// Frames must arrive strictly in order; each frame's tracking outcome
/// drives the next frame's search mode.
pub struct Pipeline {
    camera: Camera,
    perspective: Perspective,
    thresholds: ThresholdBank,
    tracker: LaneTracker,
    log: MetricsLog,
    frame_width: u32,
    frame_height: u32,
}

impl Pipeline {
    pub fn new(
        camera: Camera,
        perspective: Perspective,
        config: TrackerConfig,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            camera,
            perspective,
            thresholds: ThresholdBank::standard(),
            tracker: LaneTracker::new(config),
            log: MetricsLog::new(),
            frame_width,
            frame_height,
        }
    }

    pub fn tracker(&self) -> &LaneTracker {
        &self.tracker
    }

    pub fn metrics(&self) -> &MetricsLog {
        &self.log
    }

    /// Undistort, rectify and threshold one camera frame into the binary
    /// mask the tracker consumes.
    pub fn binarize(&self, frame: &RgbImage) -> BinaryMask {
        let undistorted = self.camera.undistort(frame);
        let warped = self.perspective.warp(&undistorted);
        self.thresholds.binarize(&warped)
    }

    /// Process one frame. The only hard failure is a frame whose size does
    /// not match the configured rectification geometry; everything else
    /// degrades to the last smoothed estimate inside the tracker.
    pub fn process(&mut self, frame: &RgbImage) -> Result<ProcessedFrame, PipelineError> {
        let (got_width, got_height) = frame.dimensions();
        if (got_width, got_height) != (self.frame_width, self.frame_height) {
            return Err(PipelineError::FrameSizeMismatch {
                expected_width: self.frame_width,
                expected_height: self.frame_height,
                got_width,
                got_height,
            });
        }

        let mask = self.binarize(frame);
        let estimate = self.tracker.process(&mask);

        let debug = overlay::mask_debug(&mask, &estimate.left, &estimate.right);
        let rendered = overlay::lane_overlay(frame, &self.perspective, &estimate.left, &estimate.right);

        self.log.push(estimate.metrics.clone());

        Ok(ProcessedFrame {
            overlay: rendered,
            debug,
            estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraModel;
    use crate::perspective::Correspondence;
    use image::Rgb;

    // Half-resolution footage with a proportionally scaled geometry keeps
    // the end-to-end test quick; full-resolution masks are covered by the
    // tracker tests.
    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 360;

    fn plain_camera() -> Camera {
        Camera::from_model(&CameraModel {
            matrix: [
                [512.0, 0.0, WIDTH as f64 / 2.0],
                [0.0, 512.0, HEIGHT as f64 / 2.0],
                [0.0, 0.0, 1.0],
            ],
            distortion: [0.0; 5],
        })
        .unwrap()
    }

    fn identity_perspective() -> Perspective {
        Perspective::new([
            Correspondence {
                src: [0.0, 0.0],
                dst: [0.0, 0.0],
            },
            Correspondence {
                src: [WIDTH as f64, 0.0],
                dst: [WIDTH as f64, 0.0],
            },
            Correspondence {
                src: [WIDTH as f64, HEIGHT as f64],
                dst: [WIDTH as f64, HEIGHT as f64],
            },
            Correspondence {
                src: [0.0, HEIGHT as f64],
                dst: [0.0, HEIGHT as f64],
            },
        ])
        .unwrap()
    }

    /// Dark road with a yellow line centered at x = 150 and a white line
    /// at x = 500: exactly the 350 px (3.7 m at this scale) separation.
    fn road_frame() -> RgbImage {
        let mut frame = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([55, 55, 55]));
        for y in 0..HEIGHT {
            for x in 140..160 {
                frame.put_pixel(x, y, Rgb([230, 200, 30]));
            }
            for x in 490..510 {
                frame.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
        frame
    }

    fn pipeline() -> Pipeline {
        let config = TrackerConfig {
            scale: crate::geometry::PixelScale {
                x_m_per_px: 3.7 / 350.0,
                y_m_per_px: 30.0 / 360.0,
            },
            ..TrackerConfig::default()
        };
        Pipeline::new(
            plain_camera(),
            identity_perspective(),
            config,
            WIDTH,
            HEIGHT,
        )
    }

    #[test]
    fn test_end_to_end_frame_is_tracked() {
        let mut pipeline = pipeline();
        let frame = road_frame();

        let first = pipeline.process(&frame).unwrap();
        assert!(first.estimate.metrics.used_sliding_window);
        assert!(first.estimate.metrics.sanity_passed);
        let width = first.estimate.metrics.lane_width_m.unwrap();
        assert!((width - 3.7).abs() < 0.3, "width = {}", width);
        assert_eq!(first.overlay.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(first.debug.dimensions(), (WIDTH, HEIGHT));

        // Second identical frame rides the margin search
        let second = pipeline.process(&frame).unwrap();
        assert!(!second.estimate.metrics.used_sliding_window);
        assert!(second.estimate.metrics.sanity_passed);
        assert_eq!(pipeline.metrics().len(), 2);
    }

    #[test]
    fn test_mismatched_frame_size_is_fatal() {
        let mut pipeline = pipeline();
        let small = RgbImage::new(320, 180);
        assert!(matches!(
            pipeline.process(&small),
            Err(PipelineError::FrameSizeMismatch { .. })
        ));
        assert!(pipeline.metrics().is_empty());
    }
}
