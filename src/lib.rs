#![doc = include_str!("../README.md")]

pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod segment;

// --- High-level re-exports -------------------------------------------------

pub use crate::detector::{Detection, DetectionConfig, FilmType, MarkerArray, StripDetector};
pub use crate::diagnostics::DetectionReport;
pub use crate::error::{PerfscanError, Result};
pub use crate::segment::{segment, ExtractedFrame, FrameRegion, Segmenter};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use perfscan::prelude::*;
///
/// # fn main() -> perfscan::Result<()> {
/// let (w, h) = (100usize, 1000usize);
/// let strip = PixelBuffer::new(w, h, ColorSpace::Gray, vec![0u8; w * h])?;
///
/// let detector = StripDetector::new(DetectionConfig {
///     channel: Channel::Luma,
///     ..Default::default()
/// });
///
/// let detection = detector.detect(&strip)?;
/// for frame in segment(&strip, &detection.markers, detection.default_frame_width(w), 200)? {
///     println!("frame {} at row {}", frame.index(), frame.region().row);
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{Channel, ColorSpace, ImageView, PixelBuffer};
    pub use crate::{segment, DetectionConfig, FilmType, StripDetector};
}
