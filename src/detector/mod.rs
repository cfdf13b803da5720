//! Perforation detector locating frame starts along a film strip.
//!
//! Overview
//! - A hysteresis run detector (`runs`) turns one column of samples into
//!   bright runs: candidate perforations.
//! - The consensus voter (`consensus`) scans a range of columns, filters
//!   outlier runs, rejects columns whose perforations disagree, and folds the
//!   rest into a best column, a frame height mode and a first-frame offset.
//! - For every accepted perforation the locator (`register`) scans the row
//!   through its centre to find the perforation's right edge and marks the
//!   frame start in a per-row [`MarkerArray`].
//! - `pipeline` runs the wide voting pass, then re-scans the best column
//!   with the mode as prior to produce the markers the segmenter consumes.
//!
//! Modules
//! - [`params`] – configuration and resolved pixel limits.
//! - [`runs`] – the hysteresis run detector.
//! - [`register`] – horizontal registration.
//! - [`markers`] – per-row frame start markers.
//! - [`consensus`] – column statistics and voting.
//! - `pipeline` – the [`StripDetector`] entry point.

pub mod consensus;
pub mod markers;
pub mod params;
mod pipeline;
pub mod register;
pub mod runs;

pub use consensus::{ColumnStats, Consensus, FrameHistogram};
pub use markers::{Marker, MarkerArray};
pub use params::{DetectionConfig, FilmType, HeightRange, ScanLimits};
pub use pipeline::{Detection, StripDetector};
pub use runs::{Hysteresis, Run};
