//! Two-pass detection orchestrating the consensus voter and the locator.
//!
//! The wide pass scans the first `scan_columns` columns, votes, and yields the
//! best column plus the frame height mode. The narrow pass re-scans only the
//! best column with the mode as the locator's expected frame height; its
//! marker array is the one handed to the segmenter.
//!
//! Typical usage:
//! ```no_run
//! use perfscan::{DetectionConfig, StripDetector};
//! use perfscan::image::{io::decode_strip, Channel};
//! use std::path::Path;
//!
//! # fn example() -> perfscan::Result<()> {
//! let config = DetectionConfig { channel: Channel::Blue, ..Default::default() };
//! let strip = decode_strip(Path::new("roll.jpg"), config.channel)?;
//! let detection = StripDetector::new(config).detect(&strip)?;
//! println!("frame height {}", detection.frame_height_mode());
//! # Ok(())
//! # }
//! ```
use super::consensus::{scan_column, vote, Consensus};
use super::markers::MarkerArray;
use super::params::{DetectionConfig, ScanLimits};
use super::register::{register_frame_start, Registration};
use crate::diagnostics::{DetectionReport, InputDescriptor, MarkerEntry, TimingBreakdown};
use crate::error::Result;
use crate::image::PixelBuffer;
use std::time::Instant;

/// Result of [`StripDetector::detect`].
#[derive(Clone, Debug)]
pub struct Detection {
    /// Frame starts of the best column; the segmenter walks these.
    pub markers: MarkerArray,
    pub consensus: Consensus,
    pub limits: ScanLimits,
    pub report: DetectionReport,
}

impl Detection {
    pub fn frame_height_mode(&self) -> usize {
        self.consensus.frame_height_mode
    }

    pub fn best_column(&self) -> usize {
        self.consensus.best_column
    }

    /// Widest frame that fits every registered offset: strip width minus the
    /// largest marked x offset.
    pub fn default_frame_width(&self, strip_width: usize) -> usize {
        strip_width.saturating_sub(self.markers.max_x_offset())
    }
}

/// Perforation detector for one configuration; reusable across strips.
#[derive(Clone, Debug, Default)]
pub struct StripDetector {
    config: DetectionConfig,
}

impl StripDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Run both passes over `strip`.
    ///
    /// Fails with `NoConsistentGeometry` when no column of the wide pass
    /// voted, and with a config/channel error before scanning anything.
    pub fn detect(&self, strip: &PixelBuffer) -> Result<Detection> {
        let total_start = Instant::now();
        self.config.channel.check(strip.color_space())?;
        let limits = self.config.resolve(strip.width())?;
        let view = strip.as_view().channel(self.config.channel);
        let mut timings = TimingBreakdown::default();

        let wide_start = Instant::now();
        let wide = vote(&view, &limits, 0..limits.scan_columns, None);
        timings.push("widePass", elapsed_ms(wide_start));
        let consensus = match wide.consensus {
            Ok(c) => c,
            Err(err) => {
                log::warn!("{err}");
                return Err(err);
            }
        };
        log::debug!(
            "global: num perfs: {} num frames: {} (best column {})",
            consensus.perforations,
            consensus.frames,
            consensus.best_column
        );
        log::debug!(
            "        frame height: max {} min {} mean {} mode {}",
            consensus.max_frame_height,
            consensus.min_frame_height,
            consensus.mean_frame_height,
            consensus.frame_height_mode
        );

        let narrow_start = Instant::now();
        let mut markers = MarkerArray::new(strip.height());
        let final_column = scan_column(
            &view,
            &limits,
            consensus.best_column,
            Some(consensus.frame_height_mode),
            &mut markers,
        );
        timings.push("narrowPass", elapsed_ms(narrow_start));
        timings.total_ms = elapsed_ms(total_start);
        log::debug!(
            "column {}: {} frame starts marked",
            final_column.column,
            markers.count()
        );

        let report = DetectionReport {
            input: InputDescriptor {
                width: strip.width(),
                height: strip.height(),
                color_space: strip.color_space(),
                channel: self.config.channel,
            },
            limits,
            columns: wide.columns,
            consensus,
            final_column,
            markers: marker_entries(&markers),
            timings,
        };

        Ok(Detection {
            markers,
            consensus,
            limits,
            report,
        })
    }

    /// Mark the frame lying wholly above the first complete perforation.
    ///
    /// `consensus.mean_offset` is where the first complete perforation sits.
    /// When it lies more than `frame_height` rows down, the perforation one
    /// frame higher was cut off or never closed, and a frame start is
    /// registered for it as if it had been detected there. Returns `None`
    /// when no whole frame fits above, or when `strip` is not the buffer
    /// `detection` came from.
    pub fn recover_leading_frame(
        &self,
        strip: &PixelBuffer,
        detection: &mut Detection,
        frame_height: usize,
    ) -> Option<Registration> {
        let offset = detection.consensus.mean_offset;
        if frame_height == 0 || offset <= frame_height {
            return None;
        }
        if strip.height() != detection.markers.len() || offset >= strip.height() {
            return None;
        }
        self.config.channel.check(strip.color_space()).ok()?;

        let view = strip.as_view().channel(self.config.channel);
        let perf_row = offset - frame_height;
        let reg = register_frame_start(
            &view,
            &detection.limits,
            perf_row,
            frame_height,
            &mut detection.markers,
        )?;
        log::debug!(
            "offset {offset} leaves room for a frame above, marked at row {} ({:?})",
            reg.row,
            reg.marker
        );
        detection.report.markers = marker_entries(&detection.markers);
        Some(reg)
    }
}

fn marker_entries(markers: &MarkerArray) -> Vec<MarkerEntry> {
    markers
        .frame_starts()
        .map(|(row, marker)| MarkerEntry { row, marker })
        .collect()
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
