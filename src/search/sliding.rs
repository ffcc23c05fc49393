// src/search/sliding.rs
//
// The two lane-pixel searches. The sliding-window search re-acquires both
// boundaries from scratch; the margin search assumes locality of the
// previous frame's curves and only scans a band around them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{Curve2, PointCloud};
use crate::mask::{BinaryMask, ForegroundPixels};
use crate::search::histogram::BottomHalfHistogram;
use crate::search::window::SlidingWindow;

/// Sliding-window search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of vertical window steps.
    pub nwindows: usize,
    /// Window half-width in pixels.
    pub margin: i64,
    /// Minimum collected pixels before a window re-centers.
    pub minpix: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            nwindows: 9,
            margin: 100,
            minpix: 50,
        }
    }
}

/// Locate both boundary point clouds from scratch.
///
/// Seeds one window per boundary at the bottom-half histogram peaks, then
/// walks `nwindows` steps up the image. A window that collects more than
/// `minpix` pixels re-centers on their mean x; one that collects nothing
/// keeps its x and contributes nothing.
pub fn search(
    mask: &BinaryMask,
    pixels: &ForegroundPixels,
    params: &SearchParams,
) -> (PointCloud, PointCloud) {
    let window_height = (mask.height() as i64) / params.nwindows as i64;
    let hist = BottomHalfHistogram::new(mask);

    let mut left_window = SlidingWindow::new(
        hist.left_peak_x() as i64,
        mask.height() as i64,
        window_height,
        params.margin,
    );
    let mut right_window = SlidingWindow::new(
        hist.right_peak_x() as i64,
        mask.height() as i64,
        window_height,
        params.margin,
    );

    let mut left_indices: Vec<usize> = Vec::new();
    let mut right_indices: Vec<usize> = Vec::new();

    for _ in 0..params.nwindows {
        let left_slice = pixels.in_window(&left_window);
        let right_slice = pixels.in_window(&right_window);

        if left_slice.len() > params.minpix {
            if let Some(mean) = pixels.mean_x(&left_slice) {
                left_window.recenter(mean as i64);
            }
        }
        if right_slice.len() > params.minpix {
            if let Some(mean) = pixels.mean_x(&right_slice) {
                right_window.recenter(mean as i64);
            }
        }

        left_indices.extend(left_slice);
        right_indices.extend(right_slice);

        left_window.step_up();
        right_window.step_up();
    }

    debug!(
        left = left_indices.len(),
        right = right_indices.len(),
        "sliding-window search"
    );

    (pixels.resolve(&left_indices), pixels.resolve(&right_indices))
}

/// Locate both boundary point clouds in a band around known curves.
///
/// Strictly cheaper than a rescan; an unfit curve selects nothing, so a
/// boundary with no usable prior yields an empty cloud.
pub fn margin_search(
    pixels: &ForegroundPixels,
    left_curve: &Curve2,
    right_curve: &Curve2,
    margin: f64,
) -> (PointCloud, PointCloud) {
    let left = pixels.resolve(&pixels.near_curve(left_curve, margin));
    let right = pixels.resolve(&pixels.near_curve(right_curve, margin));

    debug!(left = left.len(), right = right.len(), "margin search");

    (left, right)
}
