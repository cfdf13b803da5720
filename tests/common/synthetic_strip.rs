use perfscan::image::{ColorSpace, PixelBuffer};

pub const DARK: u8 = 25;
pub const BRIGHT: u8 = 240;

/// Upright gray strip: dark film with bright perforations on `[0, perf_w)`,
/// each `perf_h` rows tall starting at the given rows.
pub fn perforated_strip_u8(
    width: usize,
    height: usize,
    perf_w: usize,
    perf_h: usize,
    starts: &[usize],
) -> Vec<u8> {
    assert!(perf_w <= width, "perforation wider than strip");
    let mut img = vec![DARK; width * height];
    for &s in starts {
        for y in s..(s + perf_h).min(height) {
            img[y * width..y * width + perf_w].fill(BRIGHT);
        }
    }
    img
}

pub fn gray_buffer(width: usize, height: usize, data: Vec<u8>) -> PixelBuffer {
    PixelBuffer::new(width, height, ColorSpace::Gray, data).expect("valid gray buffer")
}

/// Lay an upright `width x height` strip on its side so that a -90 degree
/// rotation brings it back.
pub fn landscape_u8(upright: &[u8], width: usize, height: usize) -> Vec<u8> {
    // landscape is `height` wide and `width` tall
    let (lw, lh) = (height, width);
    let mut out = vec![0u8; lw * lh];
    for r in 0..height {
        for c in 0..width {
            out[c * lw + (lw - 1 - r)] = upright[r * width + c];
        }
    }
    out
}
