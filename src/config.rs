use crate::types::Config;
use anyhow::Result;
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses_with_tracker_defaults() {
        let yaml = r#"
camera:
  model_path: camera.yaml
perspective:
  src: [[580, 460], [700, 460], [1040, 680], [260, 680]]
  dst: [[260, 0], [1040, 0], [1040, 780], [260, 780]]
video:
  input_dir: frames
  output_dir: out
  frame_width: 1280
  frame_height: 720
logging:
  level: info
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.video.frame_width, 1280);
        assert!(!config.video.save_debug);
        // Tracker section omitted: the tuned defaults apply
        assert_eq!(config.tracker.allowed_misses, 5);
        assert_eq!(config.tracker.windows.nwindows, 9);
        assert!((config.tracker.expected_lane_width_m - 3.7).abs() < 1e-12);

        let pairs = config.perspective.correspondences();
        assert_eq!(pairs[2].src, [1040.0, 680.0]);
        assert_eq!(pairs[2].dst, [1040.0, 780.0]);
    }
}
