// src/mask.rs
//
// Binary pixel mask plus the frame-scoped foreground coordinate cache that
// the lane searches query. The cache is built once per frame and both
// queries are pure reads over it.

use crate::curve::{Curve2, PointCloud};
use crate::search::window::SlidingWindow;

/// A 2-D grid of 0/1 values, immutable once produced for a frame.
#[derive(Debug, Clone)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize] != 0
    }

    pub fn set(&mut self, x: u32, y: u32) {
        self.data[(y * self.width + x) as usize] = 1;
    }

    /// Pixel-wise AND with a mask of the same dimensions.
    pub fn and(&self, other: &BinaryMask) -> BinaryMask {
        assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a & b)
            .collect();
        BinaryMask::new(self.width, self.height, data)
    }

    /// Pixel-wise OR with a mask of the same dimensions.
    pub fn or(&self, other: &BinaryMask) -> BinaryMask {
        assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a | b)
            .collect();
        BinaryMask::new(self.width, self.height, data)
    }

    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Coordinates of every foreground pixel of one frame's mask, cached once.
///
/// Queries return indices into the cache; `resolve` turns an index set into
/// the `(xs, ys)` point cloud the curve fit consumes.
#[derive(Debug)]
pub struct ForegroundPixels {
    xs: Vec<u32>,
    ys: Vec<u32>,
}

impl ForegroundPixels {
    pub fn of(mask: &BinaryMask) -> Self {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if mask.get(x, y) {
                    xs.push(x);
                    ys.push(y);
                }
            }
        }
        Self { xs, ys }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Indices of pixels inside the window's closed x and y bounds.
    pub fn in_window(&self, window: &SlidingWindow) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| {
                let x = self.xs[i] as i64;
                let y = self.ys[i] as i64;
                x >= window.x_low()
                    && x <= window.x_high()
                    && y >= window.y_low()
                    && y <= window.y_high()
            })
            .collect()
    }

    /// Indices of pixels whose x lies within `margin` of `curve(y)` at the
    /// pixel's own y. An unfit curve selects nothing — it is never evaluated.
    pub fn near_curve(&self, curve: &Curve2, margin: f64) -> Vec<usize> {
        let (a, b, c) = match curve.coefficients() {
            Some(coeffs) => coeffs,
            None => return Vec::new(),
        };
        (0..self.len())
            .filter(|&i| {
                let y = self.ys[i] as f64;
                let center = a * y * y + b * y + c;
                let x = self.xs[i] as f64;
                x > center - margin && x < center + margin
            })
            .collect()
    }

    /// Mean x of an index set. `None` when the set is empty.
    pub fn mean_x(&self, indices: &[usize]) -> Option<f64> {
        if indices.is_empty() {
            return None;
        }
        let sum: f64 = indices.iter().map(|&i| self.xs[i] as f64).sum();
        Some(sum / indices.len() as f64)
    }

    /// Resolve an index set to concrete coordinates.
    pub fn resolve(&self, indices: &[usize]) -> PointCloud {
        let xs = indices.iter().map(|&i| self.xs[i] as f64).collect();
        let ys = indices.iter().map(|&i| self.ys[i] as f64).collect();
        PointCloud::new(xs, ys)
    }
}
