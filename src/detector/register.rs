//! Horizontal registration: where does the frame start on a perforation row?
//!
//! The row through the perforation centre is scanned left to right up to half
//! the strip width. The first bright span is the perforation itself; the frame
//! content begins a fixed margin inside its right edge.
use super::markers::{Marker, MarkerArray};
use super::params::{FilmType, ScanLimits};
use super::runs::{Hysteresis, Run};
use crate::image::ChannelView;

/// Outcome of registering one perforation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Row that received the marker.
    pub row: usize,
    pub marker: Marker,
    /// Horizontal perforation span, if one was found on the scanned row.
    pub span: Option<Run>,
}

/// Register the perforation centred on `perf_row` and mark its frame start.
///
/// `frame_height` is the expected frame height; it filters span noise
/// (spans must exceed a tenth of it) and places Super-8 frames half a frame
/// above the perforation. Returns `None` without touching `markers` when that
/// shift would land above the first row.
pub fn register_frame_start(
    view: &ChannelView<'_>,
    limits: &ScanLimits,
    perf_row: usize,
    frame_height: usize,
    markers: &mut MarkerArray,
) -> Option<Registration> {
    let row = match limits.film_type {
        FilmType::Double8 => perf_row,
        FilmType::Super8 => match perf_row.checked_sub(frame_height / 2) {
            Some(r) => r,
            None => {
                log::trace!("perf at row {perf_row}: leading Super-8 frame incomplete, dropped");
                return None;
            }
        },
    };

    let span = locate_perforation(view, limits, perf_row);
    let marker = match span {
        Some(s) if s.len() > frame_height / 10 && s.end > limits.frame_margin => {
            Marker::Registered(s.end - limits.frame_margin)
        }
        _ => Marker::Unregistered,
    };
    if let Some(s) = span {
        log::trace!("perf x start {} end {} -> {:?} at row {row}", s.start, s.end, marker);
    }

    markers.set(row, marker);
    Some(Registration { row, marker, span })
}

/// First bright/dark edge pair on `row`, from `perf_x_start` up to half width.
pub fn locate_perforation(view: &ChannelView<'_>, limits: &ScanLimits, row: usize) -> Option<Run> {
    if row >= view.height() {
        return None;
    }
    let detector = Hysteresis::new(limits.white_level, limits.black_level, 0);
    let from_x = limits.perf_x_start;
    detector.first_span(view.row_span(row, from_x, limits.register_limit_x), from_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::params::{DetectionConfig, HeightRange};
    use crate::image::{Channel, StripView};

    /// 100x300 gray strip, rows bright on `[0, perf_w)` only.
    fn strip(perf_w: usize) -> Vec<u8> {
        let (w, h) = (100usize, 300usize);
        let mut data = vec![30u8; w * h];
        for y in 0..h {
            data[y * w..y * w + perf_w].fill(250);
        }
        data
    }

    fn view(data: &[u8]) -> ChannelView<'_> {
        StripView {
            w: 100,
            h: 300,
            components: 1,
            stride: 100,
            data,
        }
        .channel(Channel::Luma)
    }

    fn limits(film_type: FilmType) -> ScanLimits {
        DetectionConfig {
            film_type,
            perf_height: Some(HeightRange::new(10, 60)),
            frame_height: Some(HeightRange::new(100, 300)),
            frame_margin: Some(2),
            ..Default::default()
        }
        .resolve(100)
        .unwrap()
    }

    #[test]
    fn registers_inside_perforation_edge() {
        let data = strip(30);
        let mut markers = MarkerArray::new(300);
        let reg = register_frame_start(&view(&data), &limits(FilmType::Double8), 120, 200, &mut markers)
            .unwrap();
        assert_eq!(reg.span, Some(Run { start: 0, end: 30 }));
        assert_eq!(reg.marker, Marker::Registered(28));
        assert_eq!(markers.get(120), Marker::Registered(28));
    }

    #[test]
    fn narrow_span_falls_back_to_unregistered() {
        // 15 px span is not above 200 / 10
        let data = strip(15);
        let mut markers = MarkerArray::new(300);
        let reg = register_frame_start(&view(&data), &limits(FilmType::Double8), 50, 200, &mut markers)
            .unwrap();
        assert_eq!(reg.marker, Marker::Unregistered);
        assert!(markers.get(50).is_frame_start());
    }

    #[test]
    fn span_reaching_half_width_is_unregistered() {
        let data = strip(60);
        let mut markers = MarkerArray::new(300);
        let reg = register_frame_start(&view(&data), &limits(FilmType::Double8), 50, 200, &mut markers)
            .unwrap();
        assert_eq!(reg.span, None);
        assert_eq!(reg.marker, Marker::Unregistered);
    }

    #[test]
    fn super8_marks_half_a_frame_above() {
        let data = strip(30);
        let mut markers = MarkerArray::new(300);
        let reg = register_frame_start(&view(&data), &limits(FilmType::Super8), 220, 200, &mut markers)
            .unwrap();
        assert_eq!(reg.row, 120);
        assert_eq!(markers.get(120), Marker::Registered(28));
        assert_eq!(markers.get(220), Marker::None);
    }

    #[test]
    fn super8_drops_incomplete_leading_frame() {
        let data = strip(30);
        let mut markers = MarkerArray::new(300);
        let reg = register_frame_start(&view(&data), &limits(FilmType::Super8), 60, 200, &mut markers);
        assert!(reg.is_none());
        assert_eq!(markers.count(), 0);
    }
}
