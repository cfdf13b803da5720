//! Frame segmentation: walk the marker array and cut one region per frame.
//!
//! Walking starts at the top. Each frame start found yields a `width x height`
//! region at the marker's x offset, provided a whole frame still fits below
//! it; the first start that does not fit ends the walk. The search for the
//! next start resumes on the row after the previous one.
//!
//! Horizontal offsets are smoothed: an offset jumping more than the jitter
//! limit away from the previous frame's offset is replaced by that previous
//! offset. Frames whose perforation edge was not found reuse the previous
//! offset too (or `0` for the first frame).
use crate::detector::params::{jitter_limit, DEFAULT_JITTER_FRAC};
use crate::detector::{Marker, MarkerArray};
use crate::error::{PerfscanError, Result};
use crate::image::{ColorSpace, ImageView, PixelBuffer, StripView};
use serde::Serialize;

/// Placement of one extracted frame inside the strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRegion {
    /// Sequential frame number, starting at 0.
    pub index: usize,
    pub row: usize,
    pub x: usize,
    pub width: usize,
    pub height: usize,
}

/// Borrowed `width x height` window into the strip for one frame.
#[derive(Clone, Copy, Debug)]
pub struct ExtractedFrame<'a> {
    strip: StripView<'a>,
    color_space: ColorSpace,
    region: FrameRegion,
}

impl<'a> ExtractedFrame<'a> {
    pub fn region(&self) -> FrameRegion {
        self.region
    }

    pub fn index(&self) -> usize {
        self.region.index
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }
}

impl<'a> ImageView for ExtractedFrame<'a> {
    fn width(&self) -> usize {
        self.region.width
    }

    fn height(&self) -> usize {
        self.region.height
    }

    fn components(&self) -> usize {
        self.strip.components
    }

    fn stride(&self) -> usize {
        self.strip.stride
    }

    fn row(&self, y: usize) -> &[u8] {
        let c = self.strip.components;
        let start = (self.region.row + y) * self.strip.stride + self.region.x * c;
        &self.strip.data[start..start + self.region.width * c]
    }
}

/// Lazy, single-use walk over the frames of one marker array.
pub struct Segmenter<'a> {
    strip: StripView<'a>,
    color_space: ColorSpace,
    markers: &'a MarkerArray,
    width: usize,
    height: usize,
    jitter_limit: usize,
    next_row: usize,
    prev_x: Option<usize>,
    index: usize,
}

/// Start walking `markers` over `strip`, cutting `width x height` frames.
///
/// The jitter limit defaults to [`DEFAULT_JITTER_FRAC`] of `width`; pass
/// [`DetectionConfig::jitter_limit`](crate::DetectionConfig::jitter_limit) to
/// [`Segmenter::with_jitter_limit`] to follow a custom config.
pub fn segment<'a>(
    strip: &'a PixelBuffer,
    markers: &'a MarkerArray,
    width: usize,
    height: usize,
) -> Result<Segmenter<'a>> {
    if width == 0 || height == 0 {
        return Err(PerfscanError::FrameGeometry(format!(
            "frame size {width}x{height} must be non-zero"
        )));
    }
    if width > strip.width() {
        return Err(PerfscanError::FrameGeometry(format!(
            "frame width {width} exceeds strip width {}",
            strip.width()
        )));
    }
    if markers.len() != strip.height() {
        return Err(PerfscanError::FrameGeometry(format!(
            "marker array covers {} rows, strip has {}",
            markers.len(),
            strip.height()
        )));
    }
    let jitter_limit = jitter_limit(DEFAULT_JITTER_FRAC, width);
    Ok(Segmenter {
        strip: strip.as_view(),
        color_space: strip.color_space(),
        markers,
        width,
        height,
        jitter_limit,
        next_row: 0,
        prev_x: None,
        index: 0,
    })
}

impl<'a> Segmenter<'a> {
    /// Override the largest accepted frame-to-frame x jump, in pixels.
    pub fn with_jitter_limit(mut self, jitter_limit: usize) -> Self {
        self.jitter_limit = jitter_limit;
        self
    }

    /// Only measured offsets become the baseline for the next jump check; a
    /// frame without one borrows the baseline (or 0) and leaves it alone.
    fn smooth(&mut self, row: usize, marker: Marker) -> usize {
        match (marker.x_offset(), self.prev_x) {
            (Some(x), Some(prev)) if x.abs_diff(prev) > self.jitter_limit => {
                log::trace!("frame at {row}: x offset {x} jumps from {prev}, keeping {prev}");
                prev
            }
            (Some(x), _) => {
                self.prev_x = Some(x);
                x
            }
            (None, prev) => prev.unwrap_or(0),
        }
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = ExtractedFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (row, marker) = self.markers.next_frame_start(self.next_row)?;
        if row + self.height > self.strip.h {
            self.next_row = self.strip.h;
            return None;
        }
        self.next_row = row + 1;

        let x = self.smooth(row, marker).min(self.strip.w - self.width);
        let region = FrameRegion {
            index: self.index,
            row,
            x,
            width: self.width,
            height: self.height,
        };
        self.index += 1;
        log::debug!("FRAME_START at {row}, xoffs {x}");

        Some(ExtractedFrame {
            strip: self.strip,
            color_space: self.color_space,
            region,
        })
    }
}
