//! Serializable diagnostics describing one detection run.
//!
//! [`DetectionReport`] is attached to every successful detection: the input
//! geometry, the resolved pixel limits, one trace per wide-pass column, the
//! consensus, the narrow-pass column and the final frame start markers. The
//! CLI dumps it as JSON with `--report`.

pub mod pipeline;
pub mod timing;

pub use pipeline::{DetectionReport, InputDescriptor, MarkerEntry};
pub use timing::{StageTiming, TimingBreakdown};
