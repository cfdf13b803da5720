//! Column consensus voting.
//!
//! Every column of the scan range is run through the hysteresis detector on
//! its own. Each closed bright run is a candidate perforation; the distance
//! from the previous run's end to this run's end is the candidate frame
//! height. Candidates outside the configured bounds are outliers and skipped.
//! A column only votes when the accepted perforations agree with each other:
//! both the perforation height spread and the frame height spread must stay
//! within tolerance. This throws out columns crossing the strip edge, dirt or
//! scratches.
//!
//! Voting columns are folded into an [`Aggregate`]: best column (most
//! frames, lowest index on ties), a frame height histogram (mode with lowest
//! height on ties) and the mean vertical offset of the first frame.
use super::markers::MarkerArray;
use super::params::ScanLimits;
use super::register::register_frame_start;
use super::runs::Hysteresis;
use crate::error::{PerfscanError, Result};
use crate::image::ChannelView;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Inclusive `[min, max]` of observed heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub min: usize,
    pub max: usize,
}

impl Span {
    fn single(v: usize) -> Self {
        Self { min: v, max: v }
    }

    fn include(&mut self, v: usize) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    pub fn spread(&self) -> usize {
        self.max - self.min
    }
}

fn include(span: &mut Option<Span>, v: usize) {
    match span {
        Some(s) => s.include(v),
        None => *span = Some(Span::single(v)),
    }
}

/// Frame height occurrences keyed by integer pixel height.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameHistogram {
    counts: BTreeMap<usize, usize>,
}

impl FrameHistogram {
    pub fn add(&mut self, height: usize) {
        *self.counts.entry(height).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &FrameHistogram) {
        for (&h, &n) in &other.counts {
            *self.counts.entry(h).or_insert(0) += n;
        }
    }

    /// Most frequent height; the lowest height wins a tie.
    pub fn mode(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (&h, &n) in &self.counts {
            if best.map_or(true, |(_, bn)| n > bn) {
                best = Some((h, n));
            }
        }
        best.map(|(h, _)| h)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Statistics of one scanned column.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub column: usize,
    /// Closed bright runs, accepted or not.
    pub runs: usize,
    /// Runs rejected as outliers.
    pub rejected: usize,
    pub perforations: usize,
    pub frames: usize,
    pub perf_height: Option<Span>,
    pub frame_height: Option<Span>,
    pub first_perf_start: Option<usize>,
    pub perf_height_sum: usize,
    pub frame_height_sum: usize,
    /// Markers written by the horizontal locator.
    pub registered: usize,
    /// Set once the column passed the consistency check.
    pub accepted: bool,
    #[serde(skip)]
    pub histogram: FrameHistogram,
}

impl ColumnStats {
    /// Both spreads present and within tolerance.
    pub fn is_consistent(&self, limits: &ScanLimits) -> bool {
        match (self.perf_height, self.frame_height) {
            (Some(p), Some(f)) => {
                p.spread() <= limits.max_perf_diff && f.spread() <= limits.max_frame_diff
            }
            _ => false,
        }
    }

    /// Vertical offset of the first frame: first perforation start plus half
    /// the perforation height, averaged over the frames seen.
    pub fn mean_offset(&self) -> Option<f64> {
        let start = self.first_perf_start?;
        if self.frames == 0 {
            return None;
        }
        Some(start as f64 + self.perf_height_sum as f64 / (2.0 * self.frames as f64))
    }

    pub fn mean_frame_height(&self) -> Option<f64> {
        (self.frames > 0).then(|| self.frame_height_sum as f64 / self.frames as f64)
    }
}

/// Scan column `x` and mark frame starts into `markers` (cleared first).
///
/// `frame_prior` is handed to the locator as the expected frame height; when
/// `None` each perforation's own frame height is used.
pub fn scan_column(
    view: &ChannelView<'_>,
    limits: &ScanLimits,
    x: usize,
    frame_prior: Option<usize>,
    markers: &mut MarkerArray,
) -> ColumnStats {
    markers.clear();
    let detector = Hysteresis::new(limits.white_level, limits.black_level, limits.min_perf_height);
    let mut stats = ColumnStats {
        column: x,
        ..Default::default()
    };
    let mut prev_end = 0usize;
    let mut prev_accepted = false;

    for run in detector.runs(view.column(x, limits.column_start_y), limits.column_start_y) {
        stats.runs += 1;
        let perf_height = run.len();
        let frame_height = run.end - prev_end;
        prev_end = run.end;

        let ok = perf_height <= limits.max_perf_height
            && frame_height > limits.min_frame_height
            && frame_height < limits.max_frame_height;
        if !ok {
            log::trace!(
                "x = {x}, perf start {} end {} height {perf_height} frame height {frame_height} [rej]",
                run.start,
                run.end
            );
            stats.rejected += 1;
            prev_accepted = false;
            continue;
        }

        stats.perforations += 1;
        stats.perf_height_sum += perf_height;
        stats.first_perf_start.get_or_insert(run.start);
        include(&mut stats.perf_height, perf_height);

        // a frame needs two consecutive accepted perforations
        if prev_accepted {
            stats.frames += 1;
            stats.frame_height_sum += frame_height;
            include(&mut stats.frame_height, frame_height);
            stats.histogram.add(frame_height);
        }
        prev_accepted = true;

        log::trace!(
            "x = {x}, perf {} start {} end {} height {perf_height} frame height {frame_height}",
            stats.perforations - 1,
            run.start,
            run.end
        );

        let expected = frame_prior.unwrap_or(frame_height);
        if register_frame_start(view, limits, run.midpoint(), expected, markers).is_some() {
            stats.registered += 1;
        }
    }

    stats.accepted = stats.is_consistent(limits);
    stats
}

/// Running totals over the columns that voted.
#[derive(Clone, Debug, Default)]
pub struct Aggregate {
    best: Option<ColumnStats>,
    offset_sum: f64,
    frame_mean_sum: f64,
    frame_min_sum: usize,
    frame_max_sum: usize,
    histogram: FrameHistogram,
    accepted_columns: usize,
}

impl Aggregate {
    /// Fold one column in; inconsistent columns are ignored.
    pub fn fold(&mut self, stats: &ColumnStats, limits: &ScanLimits) {
        if !stats.is_consistent(limits) {
            return;
        }
        let (Some(offset), Some(frame_mean), Some(frames)) =
            (stats.mean_offset(), stats.mean_frame_height(), stats.frame_height)
        else {
            return;
        };
        self.accepted_columns += 1;
        self.offset_sum += offset;
        self.frame_mean_sum += frame_mean;
        self.frame_min_sum += frames.min;
        self.frame_max_sum += frames.max;
        self.histogram.merge(&stats.histogram);

        let better = match &self.best {
            None => true,
            Some(b) => {
                stats.frames > b.frames || (stats.frames == b.frames && stats.column < b.column)
            }
        };
        if better {
            self.best = Some(stats.clone());
        }
    }

    pub fn accepted_columns(&self) -> usize {
        self.accepted_columns
    }

    /// Final geometry, or [`PerfscanError::NoConsistentGeometry`] if no column voted.
    pub fn finish(self, columns_scanned: usize) -> Result<Consensus> {
        let n = self.accepted_columns;
        let (Some(best), Some(mode)) = (self.best, self.histogram.mode()) else {
            return Err(PerfscanError::NoConsistentGeometry { columns_scanned });
        };
        log::debug!(
            "frame height mode {mode} over {} frame samples",
            self.histogram.total()
        );
        let nf = n as f64;
        Ok(Consensus {
            best_column: best.column,
            perforations: best.perforations,
            frames: best.frames,
            frame_height_mode: mode,
            mean_offset: (self.offset_sum / nf).round() as usize,
            mean_frame_height: (self.frame_mean_sum / nf).round() as usize,
            min_frame_height: (self.frame_min_sum as f64 / nf).round() as usize,
            max_frame_height: (self.frame_max_sum as f64 / nf).round() as usize,
            accepted_columns: n,
            columns_scanned,
        })
    }
}

/// Global geometry agreed on by the voting columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub best_column: usize,
    /// Accepted perforations on the best column.
    pub perforations: usize,
    /// Frames on the best column.
    pub frames: usize,
    pub frame_height_mode: usize,
    /// Mean row of the first frame start over voting columns.
    pub mean_offset: usize,
    pub mean_frame_height: usize,
    pub min_frame_height: usize,
    pub max_frame_height: usize,
    pub accepted_columns: usize,
    pub columns_scanned: usize,
}

/// Per-column traces plus the folded result of one voting pass.
#[derive(Debug)]
pub struct VoteOutcome {
    pub columns: Vec<ColumnStats>,
    pub consensus: Result<Consensus>,
}

/// Scan every column in `range` and fold them in column order.
///
/// Marker arrays written during the scan are private to each column and
/// dropped; only statistics leave this function.
pub fn vote(
    view: &ChannelView<'_>,
    limits: &ScanLimits,
    range: Range<usize>,
    frame_prior: Option<usize>,
) -> VoteOutcome {
    let range = range.start.min(view.width())..range.end.min(view.width());
    let columns = scan_columns(view, limits, range.clone(), frame_prior);

    let mut aggregate = Aggregate::default();
    for stats in &columns {
        if limits
            .accepted_column_limit
            .is_some_and(|limit| aggregate.accepted_columns() >= limit)
        {
            break;
        }
        aggregate.fold(stats, limits);
        if stats.accepted {
            log::debug!(
                "x = {}, perf: max {} min {}, frame: max {} min {}; ok count now {}",
                stats.column,
                stats.perf_height.map_or(0, |s| s.max),
                stats.perf_height.map_or(0, |s| s.min),
                stats.frame_height.map_or(0, |s| s.max),
                stats.frame_height.map_or(0, |s| s.min),
                aggregate.accepted_columns()
            );
        }
    }

    VoteOutcome {
        consensus: aggregate.finish(range.len()),
        columns,
    }
}

#[cfg(feature = "parallel")]
fn scan_columns(
    view: &ChannelView<'_>,
    limits: &ScanLimits,
    range: Range<usize>,
    frame_prior: Option<usize>,
) -> Vec<ColumnStats> {
    use rayon::prelude::*;

    let height = view.height();
    range
        .into_par_iter()
        .map_init(
            || MarkerArray::new(height),
            |markers, x| scan_column(view, limits, x, frame_prior, markers),
        )
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn scan_columns(
    view: &ChannelView<'_>,
    limits: &ScanLimits,
    range: Range<usize>,
    frame_prior: Option<usize>,
) -> Vec<ColumnStats> {
    let mut markers = MarkerArray::new(view.height());
    range
        .map(|x| scan_column(view, limits, x, frame_prior, &mut markers))
        .collect()
}
