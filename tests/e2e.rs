mod common;

use common::synthetic_strip::{gray_buffer, landscape_u8, perforated_strip_u8};
use perfscan::detector::{DetectionConfig, FilmType, HeightRange, Marker};
use perfscan::image::{Channel, ImageView, PixelBuffer, Rotation};
use perfscan::{segment, PerfscanError, StripDetector};

const WIDTH: usize = 100;
const HEIGHT: usize = 1000;

fn config() -> DetectionConfig {
    DetectionConfig {
        channel: Channel::Luma,
        perf_height: Some(HeightRange::new(10, 60)),
        frame_height: Some(HeightRange::new(100, 300)),
        scan_columns: Some(40),
        frame_margin: Some(2),
        ..Default::default()
    }
}

fn regular_strip() -> PixelBuffer {
    let data = perforated_strip_u8(WIDTH, HEIGHT, 30, 40, &[100, 300, 500, 700]);
    gray_buffer(WIDTH, HEIGHT, data)
}

// Every accepted perforation is marked, so all four frames that fit in the
// 1000 rows come out, not just the first two.
#[test]
fn regular_strip_yields_every_frame_that_fits() {
    let strip = regular_strip();
    let detection = StripDetector::new(config()).detect(&strip).unwrap();

    assert_eq!(detection.best_column(), 0);
    assert_eq!(detection.frame_height_mode(), 200);
    assert_eq!(detection.consensus.frames, 3);
    assert_eq!(detection.consensus.perforations, 4);
    assert_eq!(detection.consensus.accepted_columns, 30);
    assert_eq!(detection.consensus.columns_scanned, 40);

    let starts: Vec<(usize, Marker)> = detection.markers.frame_starts().collect();
    assert_eq!(
        starts,
        vec![
            (120, Marker::Registered(28)),
            (320, Marker::Registered(28)),
            (520, Marker::Registered(28)),
            (720, Marker::Registered(28)),
        ]
    );

    let width = detection.default_frame_width(strip.width());
    assert_eq!(width, 72);
    let frames: Vec<_> = segment(&strip, &detection.markers, width, 200)
        .unwrap()
        .collect();
    let rows: Vec<usize> = frames.iter().map(|f| f.region().row).collect();
    assert_eq!(rows, vec![120, 320, 520, 720]);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index(), i);
        assert_eq!((frame.width(), frame.height()), (72, 200));
        assert_eq!(frame.region().x, 28);
    }
}

#[test]
fn report_mirrors_detection() {
    let strip = regular_strip();
    let detection = StripDetector::new(config()).detect(&strip).unwrap();
    let report = &detection.report;

    assert_eq!(report.columns.len(), 40);
    assert_eq!(report.accepted_columns().count(), 30);
    assert_eq!(report.final_column.column, 0);
    assert_eq!(report.markers.len(), 4);
    assert!(report.timings.stage_ms("widePass").is_some());
    assert!(report.timings.stage_ms("narrowPass").is_some());

    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["consensus"]["frameHeightMode"], 200);
    assert_eq!(json["markers"][0]["row"], 120);
    assert_eq!(json["markers"][0]["marker"]["kind"], "registered");
}

#[test]
fn dark_strip_has_no_geometry() {
    let strip = gray_buffer(WIDTH, HEIGHT, perforated_strip_u8(WIDTH, HEIGHT, 30, 40, &[]));
    let err = StripDetector::new(config()).detect(&strip).unwrap_err();
    assert!(err.is_degenerate());
    assert!(matches!(
        err,
        PerfscanError::NoConsistentGeometry { columns_scanned: 40 }
    ));
}

#[test]
fn detection_is_repeatable() {
    let strip = regular_strip();
    let detector = StripDetector::new(config());
    let a = detector.detect(&strip).unwrap();
    let b = detector.detect(&strip).unwrap();
    assert_eq!(a.markers, b.markers);
    assert_eq!(a.consensus, b.consensus);
}

#[test]
fn super8_drops_incomplete_leading_frame() {
    // first perforation ends at 110: accepted, but half a frame above its
    // centre (90 - 100) falls off the top of the strip
    let data = perforated_strip_u8(WIDTH, HEIGHT, 30, 40, &[70, 270, 470, 670]);
    let strip = gray_buffer(WIDTH, HEIGHT, data);
    let cfg = DetectionConfig {
        film_type: FilmType::Super8,
        column_start_y: 0,
        ..config()
    };
    let detection = StripDetector::new(cfg).detect(&strip).unwrap();
    assert_eq!(detection.frame_height_mode(), 200);

    let rows: Vec<usize> = detection.markers.frame_starts().map(|(r, _)| r).collect();
    assert_eq!(rows, vec![190, 390, 590]);
}

#[test]
fn landscape_strip_is_turned_upright() {
    let upright = perforated_strip_u8(WIDTH, HEIGHT, 30, 40, &[100, 300, 500, 700]);
    let landscape = gray_buffer(HEIGHT, WIDTH, landscape_u8(&upright, WIDTH, HEIGHT));

    let (strip, rotated) = landscape.rotate(Rotation::Auto);
    assert!(rotated);
    assert_eq!((strip.width(), strip.height()), (WIDTH, HEIGHT));
    assert_eq!(strip.samples(), &upright[..]);

    let detection = StripDetector::new(config()).detect(&strip).unwrap();
    assert_eq!(detection.markers.count(), 4);
}

#[test]
fn upright_strip_is_left_alone() {
    let (strip, rotated) = regular_strip().rotate(Rotation::Auto);
    assert!(!rotated);
    assert_eq!(strip.width(), WIDTH);
}

#[test]
fn segmenting_twice_yields_identical_regions() {
    let strip = regular_strip();
    let detection = StripDetector::new(config()).detect(&strip).unwrap();
    let regions = || {
        segment(&strip, &detection.markers, 72, 200)
            .unwrap()
            .map(|f| f.region())
            .collect::<Vec<_>>()
    };
    let first = regions();
    assert_eq!(first.len(), 4);
    assert_eq!(first, regions());
}

#[test]
fn whole_frame_above_first_perforation_is_sliced() {
    let data = perforated_strip_u8(WIDTH, HEIGHT, 30, 40, &[250, 450, 650]);
    let strip = gray_buffer(WIDTH, HEIGHT, data);
    let detector = StripDetector::new(config());
    let mut detection = detector.detect(&strip).unwrap();
    assert_eq!(detection.consensus.mean_offset, 280);

    let reg = detector
        .recover_leading_frame(&strip, &mut detection, 200)
        .expect("room for a frame above row 280");
    assert_eq!(reg.row, 80);

    let regions: Vec<(usize, usize)> = segment(&strip, &detection.markers, 72, 200)
        .unwrap()
        .map(|f| (f.region().row, f.region().x))
        .collect();
    assert_eq!(regions, vec![(80, 0), (270, 28), (470, 28), (670, 28)]);
}
