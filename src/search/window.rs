// src/search/window.rs

/// A tracking rectangle for the sliding-window search.
///
/// The window is defined by its current center x, a fixed half-width
/// (margin), a fixed height, and its bottom edge `y_high`. Stepping moves
/// the window up the image by one window height; only the center x carries
/// state between steps.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    x_current: i64,
    y_high: i64,
    height: i64,
    margin: i64,
}

impl SlidingWindow {
    pub fn new(x_current: i64, y_high: i64, height: i64, margin: i64) -> Self {
        Self {
            x_current,
            y_high,
            height,
            margin,
        }
    }

    pub fn x_low(&self) -> i64 {
        self.x_current - self.margin
    }

    pub fn x_high(&self) -> i64 {
        self.x_current + self.margin
    }

    pub fn y_low(&self) -> i64 {
        self.y_high - self.height
    }

    pub fn y_high(&self) -> i64 {
        self.y_high
    }

    /// Advance one step up the image.
    pub fn step_up(&mut self) {
        self.y_high -= self.height;
    }

    /// Re-center on the mean x of the pixels the window just collected.
    pub fn recenter(&mut self, new_x: i64) {
        self.x_current = new_x;
    }
}
