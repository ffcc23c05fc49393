// src/pipeline/metrics.rs
//
// Per-frame tracking metrics, accumulated across a run and persisted as
// JSON Lines. Curve-derived fields are absent (null) on frames where no
// usable curve existed.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Flat per-frame record emitted by the tracking state machine.
#[derive(Debug, Clone, Serialize)]
pub struct FrameMetrics {
    pub left_points: usize,
    pub right_points: usize,
    pub curvature_m: Option<f64>,
    pub offset_m: Option<f64>,
    pub left_base_x: Option<f64>,
    pub right_base_x: Option<f64>,
    pub lane_width_m: Option<f64>,
    pub left_radius_m: Option<f64>,
    pub right_radius_m: Option<f64>,
    pub sanity_passed: bool,
    pub used_sliding_window: bool,
    pub miss_streak: u32,
}

/// Run-level accumulation of frame metrics.
#[derive(Debug, Default)]
pub struct MetricsLog {
    frames: Vec<FrameMetrics>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: FrameMetrics) {
        self.frames.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameMetrics] {
        &self.frames
    }

    pub fn summary(&self) -> MetricsSummary {
        let total = self.frames.len() as u64;
        let accepted = self.frames.iter().filter(|f| f.sanity_passed).count() as u64;
        let sliding = self
            .frames
            .iter()
            .filter(|f| f.used_sliding_window)
            .count() as u64;
        let max_miss_streak = self.frames.iter().map(|f| f.miss_streak).max().unwrap_or(0);
        MetricsSummary {
            total_frames: total,
            accepted_frames: accepted,
            rejected_frames: total - accepted,
            sliding_window_frames: sliding,
            max_miss_streak,
        }
    }

    /// Write one JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for frame in &self.frames {
            let line = serde_json::to_string(frame)?;
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_jsonl(&mut writer)?;
        writer.flush()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub accepted_frames: u64,
    pub rejected_frames: u64,
    pub sliding_window_frames: u64,
    pub max_miss_streak: u32,
}
