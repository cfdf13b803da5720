use crate::detector::DetectionConfig;
use crate::error::{PerfscanError, Result};
use crate::image::Rotation;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Everything one slicing run needs besides the strip itself.
///
/// Every field is optional in JSON; command-line flags override the file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    pub input: Option<PathBuf>,
    pub rotation: Rotation,
    pub frame: FrameConfig,
    pub output: OutputConfig,
    pub detection: DetectionConfig,
}

/// Size of the extracted frames. Without a height the run only probes.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: Option<usize>,
    pub height: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Frames are written as `<base>.<index:03>.jpg`; defaults to the input path.
    pub base: Option<PathBuf>,
    pub quality: u8,
    pub report_json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base: None,
            quality: DEFAULT_JPEG_QUALITY,
            report_json: None,
        }
    }
}

impl SlicerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output.quality > 100 {
            return Err(PerfscanError::InvalidConfig(format!(
                "JPEG quality {} is outside 0-100",
                self.output.quality
            )));
        }
        if self.frame.width == Some(0) || self.frame.height == Some(0) {
            return Err(PerfscanError::InvalidConfig(
                "frame width and height must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Frame height if extraction was requested.
    pub fn extraction_height(&self) -> Option<usize> {
        self.frame.height
    }
}

pub fn load_config(path: &Path) -> Result<SlicerConfig> {
    let contents = fs::read_to_string(path).map_err(|e| PerfscanError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| PerfscanError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FilmType;

    #[test]
    fn parses_nested_json() {
        let json = r#"{
            "input": "roll.jpg",
            "rotation": "ccw90",
            "frame": { "height": 420 },
            "output": { "quality": 92 },
            "detection": { "film_type": "Super8", "frame_height": { "min": 300, "max": 500 } }
        }"#;
        let cfg: SlicerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.input.as_deref(), Some(Path::new("roll.jpg")));
        assert_eq!(cfg.rotation, Rotation::Ccw90);
        assert_eq!(cfg.extraction_height(), Some(420));
        assert_eq!(cfg.frame.width, None);
        assert_eq!(cfg.output.quality, 92);
        assert_eq!(cfg.detection.film_type, FilmType::Super8);
        assert_eq!(cfg.detection.white_level, 0xe0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn quality_above_100_is_invalid() {
        let mut cfg = SlicerConfig::default();
        cfg.output.quality = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config(Path::new("/nonexistent/perfscan.json")).unwrap_err();
        assert!(matches!(err, PerfscanError::Config { .. }));
    }
}
