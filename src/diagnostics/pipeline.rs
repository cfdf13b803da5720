use crate::detector::consensus::{ColumnStats, Consensus};
use crate::detector::markers::Marker;
use crate::detector::params::ScanLimits;
use crate::diagnostics::TimingBreakdown;
use crate::image::{Channel, ColorSpace};
use serde::Serialize;

/// Result trace produced by [`StripDetector::detect`](crate::StripDetector).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub input: InputDescriptor,
    pub limits: ScanLimits,
    /// Wide-pass columns in scan order.
    pub columns: Vec<ColumnStats>,
    pub consensus: Consensus,
    /// The single column whose markers were kept.
    pub final_column: ColumnStats,
    pub markers: Vec<MarkerEntry>,
    pub timings: TimingBreakdown,
}

impl DetectionReport {
    pub fn accepted_columns(&self) -> impl Iterator<Item = &ColumnStats> {
        self.columns.iter().filter(|c| c.accepted)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub color_space: ColorSpace,
    pub channel: Channel,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct MarkerEntry {
    pub row: usize,
    pub marker: Marker,
}
