//! Owned interleaved sample buffer holding one whole film strip.
//!
//! The buffer is immutable once built; re-orienting it produces a new buffer
//! and consumes the old one.
use super::view::StripView;
use crate::error::{PerfscanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Component layout the decoder produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// One luma sample per pixel.
    Gray,
    /// `R, G, B` per pixel.
    Rgb,
    /// JFIF `Y, Cb, Cr` per pixel, luma first.
    YCbCr,
}

impl ColorSpace {
    pub fn components(self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb | ColorSpace::YCbCr => 3,
        }
    }
}

/// Sample channel the perforation detector looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    #[serde(alias = "R")]
    Red,
    #[serde(alias = "G")]
    Green,
    #[default]
    #[serde(alias = "B")]
    Blue,
    #[serde(alias = "Y")]
    Luma,
}

impl Channel {
    /// Offset of this channel inside one interleaved pixel.
    pub fn sample_offset(self) -> usize {
        match self {
            Channel::Red | Channel::Luma => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    /// Color space the decoder must produce for this channel.
    pub fn decode_color_space(self) -> ColorSpace {
        match self {
            Channel::Luma => ColorSpace::YCbCr,
            _ => ColorSpace::Rgb,
        }
    }

    /// Luma is only available from a luma-first layout and R/G/B only from RGB.
    pub fn check(self, color_space: ColorSpace) -> Result<()> {
        let ok = match self {
            Channel::Luma => matches!(color_space, ColorSpace::Gray | ColorSpace::YCbCr),
            Channel::Red | Channel::Green | Channel::Blue => color_space == ColorSpace::Rgb,
        };
        if ok {
            Ok(())
        } else {
            Err(PerfscanError::ChannelMismatch {
                channel: self,
                color_space,
            })
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "R" | "r" => Ok(Channel::Red),
            "G" | "g" => Ok(Channel::Green),
            "B" | "b" => Ok(Channel::Blue),
            "Y" | "y" => Ok(Channel::Luma),
            other => Err(format!("unknown channel '{other}', expected R, G, B or Y")),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
            Channel::Luma => "Y",
        };
        f.write_str(c)
    }
}

/// Axis-aligned re-orientation applied before detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rotation {
    /// Transpose only when the strip is wider than tall.
    #[default]
    Auto,
    /// Leave the buffer as decoded.
    None,
    /// Rotate by -90 degrees: `new[x][y] = old[y][w - 1 - x]`.
    Ccw90,
}

#[derive(Clone, Debug)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    color_space: ColorSpace,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap decoded samples; the length must be `width * height * components`.
    pub fn new(
        width: usize,
        height: usize,
        color_space: ColorSpace,
        data: Vec<u8>,
    ) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(color_space.components()))
            .ok_or(PerfscanError::BufferSize {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() != expected {
            return Err(PerfscanError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            color_space,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn components(&self) -> usize {
        self.color_space.components()
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    /// Borrow as a read-only `StripView`.
    pub fn as_view(&self) -> StripView<'_> {
        StripView {
            w: self.width,
            h: self.height,
            components: self.components(),
            stride: self.width * self.components(),
            data: &self.data,
        }
    }

    /// Apply `rotation`, returning the (possibly new) buffer and whether it moved.
    pub fn rotate(self, rotation: Rotation) -> (Self, bool) {
        match rotation {
            Rotation::None => (self, false),
            Rotation::Ccw90 => (self.rotate_ccw90(), true),
            Rotation::Auto => self.normalize_orientation(),
        }
    }

    /// Frames are stacked vertically during detection, so a landscape strip
    /// is turned upright first.
    pub fn normalize_orientation(self) -> (Self, bool) {
        if self.width > self.height {
            (self.rotate_ccw90(), true)
        } else {
            (self, false)
        }
    }

    /// Remap into a `height x width` buffer, reading source rows right to left.
    pub fn rotate_ccw90(self) -> Self {
        let c = self.components();
        let (w, h) = (self.width, self.height);
        let new_w = h;
        let new_h = w;
        let mut out = vec![0u8; self.data.len()];
        for y in 0..h {
            let src_row = &self.data[y * w * c..(y + 1) * w * c];
            for x in 0..w {
                let src = (w - (x + 1)) * c;
                let dst = (x * new_w + y) * c;
                out[dst..dst + c].copy_from_slice(&src_row[src..src + c]);
            }
        }
        log::debug!("rotated strip -90 deg: {w}x{h} -> {new_w}x{new_h}");
        Self {
            width: new_w,
            height: new_h,
            color_space: self.color_space,
            data: out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: usize, height: usize) -> PixelBuffer {
        let data = (0..width * height).map(|v| v as u8).collect();
        PixelBuffer::new(width, height, ColorSpace::Gray, data).unwrap()
    }

    #[test]
    fn rejects_mismatched_sample_count() {
        let err = PixelBuffer::new(4, 4, ColorSpace::Rgb, vec![0; 16]).unwrap_err();
        assert!(matches!(
            err,
            PerfscanError::BufferSize {
                expected: 48,
                actual: 16
            }
        ));
    }

    #[test]
    fn rotation_reads_rows_right_to_left() {
        // 3 wide, 2 tall:
        // 0 1 2
        // 3 4 5
        let (rot, moved) = gray(3, 2).normalize_orientation();
        assert!(moved);
        assert_eq!((rot.width(), rot.height()), (2, 3));
        assert_eq!(rot.samples(), &[2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn upright_strip_is_left_alone() {
        let (buf, moved) = gray(2, 5).normalize_orientation();
        assert!(!moved);
        assert_eq!((buf.width(), buf.height()), (2, 5));
    }

    #[test]
    fn rotation_keeps_pixels_together() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let buf = PixelBuffer::new(2, 1, ColorSpace::Rgb, data).unwrap();
        let (rot, _) = buf.rotate(Rotation::Ccw90);
        assert_eq!((rot.width(), rot.height()), (1, 2));
        assert_eq!(rot.samples(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn channel_must_match_color_space() {
        assert!(Channel::Luma.check(ColorSpace::YCbCr).is_ok());
        assert!(Channel::Luma.check(ColorSpace::Gray).is_ok());
        assert!(Channel::Blue.check(ColorSpace::Rgb).is_ok());
        assert!(Channel::Blue.check(ColorSpace::YCbCr).is_err());
        assert!(Channel::Luma.check(ColorSpace::Rgb).is_err());
    }

    #[test]
    fn channel_parses_short_names() {
        assert_eq!("Y".parse::<Channel>(), Ok(Channel::Luma));
        assert_eq!("g".parse::<Channel>(), Ok(Channel::Green));
        assert!("X".parse::<Channel>().is_err());
    }
}
