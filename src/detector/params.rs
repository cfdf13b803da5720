//! Parameter types configuring perforation detection.
//!
//! [`DetectionConfig`] is what callers (and the JSON config) provide: sample
//! thresholds plus height bounds expressed as fractions of the strip width,
//! each with an optional explicit pixel override. [`DetectionConfig::resolve`]
//! turns it into [`ScanLimits`], the concrete pixel values every core stage
//! reads.
//!
//! Defaults follow a typical 8mm strip scanned upright with the perforations
//! on the left edge.

use crate::error::{PerfscanError, Result};
use crate::image::Channel;
use serde::{Deserialize, Serialize};

/// Default largest frame-to-frame x jump, as a fraction of the frame width.
pub const DEFAULT_JITTER_FRAC: f32 = 0.002;

/// Film stock; decides where a frame starts relative to its perforation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilmType {
    /// Frame starts level with the perforation centre.
    #[default]
    Double8,
    /// Frame starts half a frame above the perforation centre.
    Super8,
}

/// Inclusive pixel range `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: usize,
    pub max: usize,
}

impl HeightRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl std::str::FromStr for HeightRange {
    type Err = String;

    /// Parses `"<min>-<max>"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <min>-<max>, got '{s}'"))?;
        let min = lo
            .trim()
            .parse()
            .map_err(|e| format!("bad minimum in '{s}': {e}"))?;
        let max = hi
            .trim()
            .parse()
            .map_err(|e| format!("bad maximum in '{s}': {e}"))?;
        Ok(Self { min, max })
    }
}

/// Detector-wide configuration. Immutable once handed to the detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A sample above this level opens a bright run.
    pub white_level: u8,
    /// A sample below this level closes a bright run.
    pub black_level: u8,
    pub channel: Channel,
    pub film_type: FilmType,
    /// Rows above this one are leader/noise and never scanned.
    pub column_start_y: usize,
    /// Column where the horizontal locator starts looking for the perforation.
    pub perf_x_start: usize,
    /// Perforation height bounds as fractions of strip width.
    pub min_perf_frac: f32,
    pub max_perf_frac: f32,
    /// Frame height bounds as fractions of strip width.
    pub min_frame_frac: f32,
    pub max_frame_frac: f32,
    /// Explicit perforation height bounds (pixels), overriding the fractions.
    pub perf_height: Option<HeightRange>,
    /// Explicit frame height bounds (pixels), overriding the fractions.
    pub frame_height: Option<HeightRange>,
    /// Largest tolerated spread of perforation heights within one column.
    pub max_perf_diff: usize,
    /// Largest tolerated spread of frame heights within one column.
    pub max_frame_diff: usize,
    /// Width of the wide consensus pass, as a fraction of strip width.
    pub scan_width_frac: f32,
    /// Explicit number of columns for the wide pass.
    pub scan_columns: Option<usize>,
    /// Stop folding after this many accepted columns (in column order).
    pub accepted_column_limit: Option<usize>,
    /// Inward margin from the perforation edge to the frame, fraction of width.
    pub frame_margin_frac: f32,
    /// Explicit inward margin in pixels.
    pub frame_margin: Option<usize>,
    /// Largest frame-to-frame x jump, as a fraction of the output frame width.
    pub jitter_frac: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            white_level: 0xe0,
            black_level: 0xc0,
            channel: Channel::Blue,
            film_type: FilmType::Double8,
            column_start_y: 40,
            perf_x_start: 0,
            min_perf_frac: 0.04,
            max_perf_frac: 0.25,
            min_frame_frac: 0.25,
            max_frame_frac: 0.75,
            perf_height: None,
            frame_height: None,
            max_perf_diff: 20,
            max_frame_diff: 30,
            scan_width_frac: 0.25,
            scan_columns: None,
            accepted_column_limit: None,
            frame_margin_frac: 0.015,
            frame_margin: None,
            jitter_frac: DEFAULT_JITTER_FRAC,
        }
    }
}

/// Concrete pixel limits derived from a [`DetectionConfig`] and a strip width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLimits {
    pub white_level: u8,
    pub black_level: u8,
    pub film_type: FilmType,
    pub column_start_y: usize,
    pub perf_x_start: usize,
    pub min_perf_height: usize,
    pub max_perf_height: usize,
    pub min_frame_height: usize,
    pub max_frame_height: usize,
    pub max_perf_diff: usize,
    pub max_frame_diff: usize,
    /// Columns `[0, scan_columns)` take part in the wide pass.
    pub scan_columns: usize,
    pub accepted_column_limit: Option<usize>,
    pub frame_margin: usize,
    /// Half the strip width: the locator never scans past it.
    pub register_limit_x: usize,
}

impl DetectionConfig {
    /// Validate the config and scale it to a strip `strip_width` samples wide.
    pub fn resolve(&self, strip_width: usize) -> Result<ScanLimits> {
        if self.white_level <= self.black_level {
            return Err(PerfscanError::InvalidConfig(format!(
                "white level {} must be above black level {}",
                self.white_level, self.black_level
            )));
        }
        if strip_width == 0 {
            return Err(PerfscanError::InvalidConfig("strip has zero width".into()));
        }
        let scale = |frac: f32| (frac.max(0.0) * strip_width as f32).round() as usize;

        let perf = self
            .perf_height
            .unwrap_or_else(|| HeightRange::new(scale(self.min_perf_frac), scale(self.max_perf_frac)));
        let frame = self
            .frame_height
            .unwrap_or_else(|| HeightRange::new(scale(self.min_frame_frac), scale(self.max_frame_frac)));
        check_range("perforation", perf)?;
        check_range("frame", frame)?;

        let scan_columns = self
            .scan_columns
            .unwrap_or_else(|| scale(self.scan_width_frac))
            .clamp(1, strip_width);
        let frame_margin = self
            .frame_margin
            .unwrap_or_else(|| scale(self.frame_margin_frac));

        Ok(ScanLimits {
            white_level: self.white_level,
            black_level: self.black_level,
            film_type: self.film_type,
            column_start_y: self.column_start_y,
            perf_x_start: self.perf_x_start,
            min_perf_height: perf.min,
            max_perf_height: perf.max,
            min_frame_height: frame.min,
            max_frame_height: frame.max,
            max_perf_diff: self.max_perf_diff,
            max_frame_diff: self.max_frame_diff,
            scan_columns,
            accepted_column_limit: self.accepted_column_limit,
            frame_margin,
            register_limit_x: strip_width / 2,
        })
    }

    /// Largest tolerated horizontal jump between consecutive frames.
    pub fn jitter_limit(&self, frame_width: usize) -> usize {
        jitter_limit(self.jitter_frac, frame_width)
    }
}

/// `frac` of `frame_width`, rounded; negative fractions count as zero.
pub fn jitter_limit(frac: f32, frame_width: usize) -> usize {
    (frac.max(0.0) * frame_width as f32).round() as usize
}

fn check_range(what: &str, range: HeightRange) -> Result<()> {
    if range.min == 0 || range.max == 0 {
        return Err(PerfscanError::InvalidConfig(format!(
            "{what} height bounds must be positive, got {}-{}",
            range.min, range.max
        )));
    }
    if range.min >= range.max {
        return Err(PerfscanError::InvalidConfig(format!(
            "{what} height minimum {} must be below maximum {}",
            range.min, range.max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scale_with_strip_width() {
        let limits = DetectionConfig::default().resolve(800).unwrap();
        assert_eq!(limits.min_perf_height, 32);
        assert_eq!(limits.max_perf_height, 200);
        assert_eq!(limits.min_frame_height, 200);
        assert_eq!(limits.max_frame_height, 600);
        assert_eq!(limits.scan_columns, 200);
        assert_eq!(limits.frame_margin, 12);
        assert_eq!(limits.register_limit_x, 400);
    }

    #[test]
    fn explicit_bounds_override_fractions() {
        let cfg = DetectionConfig {
            perf_height: Some(HeightRange::new(10, 60)),
            frame_height: Some(HeightRange::new(100, 300)),
            ..Default::default()
        };
        let limits = cfg.resolve(100).unwrap();
        assert_eq!((limits.min_perf_height, limits.max_perf_height), (10, 60));
        assert_eq!((limits.min_frame_height, limits.max_frame_height), (100, 300));
    }

    #[test]
    fn rejects_inverted_levels() {
        let cfg = DetectionConfig {
            white_level: 100,
            black_level: 100,
            ..Default::default()
        };
        assert!(matches!(cfg.resolve(100), Err(PerfscanError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_height_bounds() {
        // 0.04 * 10 rounds to 0
        assert!(DetectionConfig::default().resolve(10).is_err());
    }

    #[test]
    fn jitter_limit_uses_frame_width() {
        assert_eq!(DetectionConfig::default().jitter_limit(1000), 2);
    }

    #[test]
    fn height_range_parses_dash_pair() {
        assert_eq!("30-200".parse::<HeightRange>(), Ok(HeightRange::new(30, 200)));
        assert!("30".parse::<HeightRange>().is_err());
    }

    #[test]
    fn config_deserializes_partial_json() {
        let cfg: DetectionConfig =
            serde_json::from_str(r#"{"white_level": 200, "black_level": 150, "channel": "Y", "film_type": "Super8"}"#)
                .unwrap();
        assert_eq!(cfg.white_level, 200);
        assert_eq!(cfg.channel, Channel::Luma);
        assert_eq!(cfg.film_type, FilmType::Super8);
        assert_eq!(cfg.column_start_y, 40);
    }
}
