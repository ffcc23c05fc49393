use serde::{Deserialize, Serialize};

use crate::perspective::Correspondence;
use crate::pipeline::TrackerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    pub perspective: PerspectiveConfig,
    pub video: VideoConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Path to the persisted calibration model.
    pub model_path: String,
}

/// The four fixed src→dst correspondences of the rectification geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveConfig {
    pub src: [[f64; 2]; 4],
    pub dst: [[f64; 2]; 4],
}

impl PerspectiveConfig {
    pub fn correspondences(&self) -> [Correspondence; 4] {
        let pair = |i: usize| Correspondence {
            src: self.src[i],
            dst: self.dst[i],
        };
        [pair(0), pair(1), pair(2), pair(3)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Also write the binarized debug view next to each overlay.
    #[serde(default)]
    pub save_debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}
