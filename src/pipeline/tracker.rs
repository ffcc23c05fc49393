// src/pipeline/tracker.rs
//
// The per-frame lane-tracking state machine.
//
// Each frame: pick a search mode from the previous frame's outcome, fit a
// candidate curve per boundary, gate the pair through the sanity check,
// then either fold the fits into the per-boundary histories or count a
// miss. Enough consecutive misses force the next frame back into the full
// sliding-window search, so a lost track re-acquires on its own.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::curve::Curve2;
use crate::geometry::{curvature_m, Lane, PixelScale};
use crate::mask::{BinaryMask, ForegroundPixels};
use crate::pipeline::metrics::FrameMetrics;
use crate::search::{margin_search, search, SearchParams};
use crate::track::LineTrack;

/// Radii beyond this are indistinguishable from a straight boundary and
/// compare as equal in the sanity check.
const STRAIGHT_RADIUS_M: f64 = 10_000.0;

/// Tracking constants, passed in at construction so the state machine is
/// testable in isolation with synthetic masks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Sliding-window search parameters.
    pub windows: SearchParams,
    /// Band half-width for the margin search around a prior fit.
    pub search_margin: f64,
    /// Bounded history length per boundary.
    pub history_length: usize,
    /// Consecutive misses before the next frame must rescan from scratch.
    pub allowed_misses: u32,
    /// Expected lane width in meters.
    pub expected_lane_width_m: f64,
    /// Tolerated deviation from the expected lane width.
    pub width_tolerance_m: f64,
    /// Maximum disagreement between boundary curvature radii.
    pub max_radius_diff_m: f64,
    /// Pixel-to-meter scale of the rectified view.
    pub scale: PixelScale,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            windows: SearchParams::default(),
            search_margin: 30.0,
            history_length: 5,
            allowed_misses: 5,
            expected_lane_width_m: 3.7,
            width_tolerance_m: 1.0,
            max_radius_diff_m: 1000.0,
            scale: PixelScale::default(),
        }
    }
}

/// Per-frame output: the smoothed boundary curves for rendering plus the
/// flat metrics record.
#[derive(Debug)]
pub struct FrameEstimate {
    pub left: Curve2,
    pub right: Curve2,
    pub metrics: FrameMetrics,
}

/// Tracking state for one video stream. Strictly sequential: each frame's
/// history and miss-streak updates feed the next frame's mode selection.
#[derive(Debug)]
pub struct LaneTracker {
    config: TrackerConfig,
    left: LineTrack,
    right: LineTrack,
    misses: u32,
    frame_count: u64,
}

impl LaneTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let history = config.history_length;
        Self {
            config,
            left: LineTrack::new(history),
            right: LineTrack::new(history),
            misses: 0,
            frame_count: 0,
        }
    }

    pub fn left(&self) -> &LineTrack {
        &self.left
    }

    pub fn right(&self) -> &LineTrack {
        &self.right
    }

    pub fn miss_streak(&self) -> u32 {
        self.misses
    }

    /// Whether the next frame must re-acquire with the sliding-window
    /// search instead of the cheap margin search.
    pub fn should_run_sliding_window(&self) -> bool {
        if self.misses >= self.config.allowed_misses {
            return true;
        }
        !self.left.detected() || !self.right.detected()
    }

    /// Process one binarized, rectified frame.
    pub fn process(&mut self, mask: &BinaryMask) -> FrameEstimate {
        self.frame_count += 1;
        let height = mask.height();
        let pixels = ForegroundPixels::of(mask);

        let used_sliding_window = self.should_run_sliding_window();
        let (left_cloud, right_cloud) = if used_sliding_window {
            search(mask, &pixels, &self.config.windows)
        } else {
            let left_prior = self.left.current().copied().unwrap_or(Curve2::Unfit);
            let right_prior = self.right.current().copied().unwrap_or(Curve2::Unfit);
            margin_search(
                &pixels,
                &left_prior,
                &right_prior,
                self.config.search_margin,
            )
        };

        let left_points = left_cloud.len();
        let right_points = right_cloud.len();

        let left_candidate = left_cloud.fit_quadratic();
        let right_candidate = right_cloud.fit_quadratic();

        let sanity_passed = self.sanity_check(height, &left_candidate, &right_candidate);

        if sanity_passed {
            self.left.accept(left_candidate);
            self.right.accept(right_candidate);
            self.misses = 0;
        } else {
            self.left.reject(left_candidate);
            self.right.reject(right_candidate);
            self.misses += 1;
            if self.misses == self.config.allowed_misses {
                warn!(
                    frame = self.frame_count,
                    miss_streak = self.misses,
                    "lane track lost, re-acquiring with sliding windows"
                );
            }
        }

        let left_smoothed = self.left.smoothed();
        let right_smoothed = self.right.smoothed();

        let scale = self.config.scale;
        let lane = Lane::new(&left_smoothed, &right_smoothed, scale);
        let reference_y = height as f64;
        let (left_base_x, right_base_x) = match lane.base(reference_y) {
            Some((left, right)) => (Some(left), Some(right)),
            None => (None, None),
        };

        let metrics = FrameMetrics {
            left_points,
            right_points,
            curvature_m: lane.curvature_m(height),
            offset_m: lane.offset_m(mask.width(), height),
            left_base_x,
            right_base_x,
            lane_width_m: lane.width_m(reference_y),
            left_radius_m: curvature_m(&left_smoothed, &scale, height),
            right_radius_m: curvature_m(&right_smoothed, &scale, height),
            sanity_passed,
            used_sliding_window,
            miss_streak: self.misses,
        };

        debug!(
            frame = self.frame_count,
            sliding = used_sliding_window,
            left_points,
            right_points,
            sanity = sanity_passed,
            miss_streak = self.misses,
            "frame tracked"
        );

        FrameEstimate {
            left: left_smoothed,
            right: right_smoothed,
            metrics,
        }
    }

    /// Plausibility gate for a candidate pair: both boundaries must carry a
    /// usable fit, their curvature radii must agree, and the implied lane
    /// width must sit near the expected width. Pure function of the
    /// candidates and the reference row.
    fn sanity_check(&self, height: u32, left: &Curve2, right: &Curve2) -> bool {
        let scale = self.config.scale;

        let radii = (
            curvature_m(left, &scale, height),
            curvature_m(right, &scale, height),
        );
        let (left_radius, right_radius) = match radii {
            (Some(left), Some(right)) => (left, right),
            // An unfit candidate means no usable data this frame
            _ => return false,
        };

        let roc_diff = (left_radius.min(STRAIGHT_RADIUS_M)
            - right_radius.min(STRAIGHT_RADIUS_M))
        .abs();
        if roc_diff > self.config.max_radius_diff_m {
            return false;
        }

        let width = match Lane::new(left, right, scale).width_m(height as f64) {
            Some(width) => width,
            None => return false,
        };

        (self.config.expected_lane_width_m - width).abs() <= self.config.width_tolerance_m
    }
}
