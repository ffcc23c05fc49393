// src/main.rs

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use lanetrack::{Camera, Config, Perspective, Pipeline};

fn main() -> Result<()> {
    let config = Config::load("config.yaml").context("loading config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .init();

    info!("🛣️  Lane Tracking Pipeline Starting");

    let camera = Camera::load(Path::new(&config.camera.model_path))?;
    info!("✓ Camera model ready");

    let perspective = Perspective::new(config.perspective.correspondences())?;
    info!("✓ Perspective rectification ready");

    let mut pipeline = Pipeline::new(
        camera,
        perspective,
        config.tracker.clone(),
        config.video.frame_width,
        config.video.frame_height,
    );

    let frames = find_frame_files(&config.video.input_dir)?;
    if frames.is_empty() {
        bail!("no frame images found in {}", config.video.input_dir);
    }
    info!("Found {} frame(s) to process", frames.len());

    let output_dir = Path::new(&config.video.output_dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut processed: u64 = 0;
    for (idx, frame_path) in frames.iter().enumerate() {
        let frame = match image::open(frame_path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                error!("Frame {} failed to decode: {}", frame_path.display(), e);
                continue;
            }
        };

        let result = pipeline
            .process(&frame)
            .with_context(|| format!("processing {}", frame_path.display()))?;

        let name = frame_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        result
            .overlay
            .save(output_dir.join(format!("{}_overlay.png", name)))?;
        if config.video.save_debug {
            result
                .debug
                .save(output_dir.join(format!("{}_debug.png", name)))?;
        }
        processed += 1;

        if (idx + 1) % 50 == 0 {
            let metrics = &result.estimate.metrics;
            info!(
                "Progress: {}/{} | sliding: {} | sanity: {} | miss streak: {}",
                idx + 1,
                frames.len(),
                metrics.used_sliding_window,
                metrics.sanity_passed,
                metrics.miss_streak
            );
        }
    }

    let metrics_path = output_dir.join("metrics.jsonl");
    pipeline
        .metrics()
        .save(&metrics_path)
        .with_context(|| format!("writing {}", metrics_path.display()))?;
    info!("💾 Metrics written to {}", metrics_path.display());

    let summary = pipeline.metrics().summary();
    info!("\n📊 Final Report:");
    info!("  Frames processed: {}", processed);
    info!(
        "  Accepted: {} | Rejected: {}",
        summary.accepted_frames, summary.rejected_frames
    );
    info!(
        "  Sliding-window frames: {}",
        summary.sliding_window_frames
    );
    if summary.max_miss_streak >= config.tracker.allowed_misses {
        warn!(
            "  Track was lost at least once (max miss streak: {})",
            summary.max_miss_streak
        );
    }

    Ok(())
}

/// Collect frame images from the input directory in name order.
fn find_frame_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = WalkDir::new(input_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("png") | Some("jpg") | Some("jpeg")
            )
        })
        .collect();
    frames.sort();
    Ok(frames)
}
