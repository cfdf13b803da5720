//! Decode/encode collaborators and JSON helpers.
//!
//! - `decode_strip`: read a JPEG/PNG/etc. into an owned interleaved buffer laid
//!   out for the requested detection channel.
//! - `encode_frame_jpeg`: write one extracted frame as a JPEG.
//! - `frame_file_name`: `<base>.<index:03>.jpg`.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::buffer::{Channel, ColorSpace, PixelBuffer};
use super::traits::ImageView;
use crate::error::{PerfscanError, Result};
use crate::segment::ExtractedFrame;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Load an image from disk in the layout `channel` expects.
///
/// Luma detection gets a JFIF YCbCr buffer so the luma sample sits at offset
/// 0; every other channel gets plain RGB.
pub fn decode_strip(path: &Path, channel: Channel) -> Result<PixelBuffer> {
    let rgb = image::open(path)
        .map_err(|source| PerfscanError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    let mut data = rgb.into_raw();

    let color_space = channel.decode_color_space();
    if color_space == ColorSpace::YCbCr {
        for px in data.chunks_exact_mut(3) {
            let [y, cb, cr] = rgb_to_ycbcr(px[0], px[1], px[2]);
            px.copy_from_slice(&[y, cb, cr]);
        }
    }
    PixelBuffer::new(width, height, color_space, data)
}

/// Encode one frame as a JPEG at `quality` (0-100, passed through).
pub fn encode_frame_jpeg(frame: &ExtractedFrame<'_>, quality: u8, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let (pixels, color) = frame_pixels(frame);
    let file = File::create(path).map_err(|source| PerfscanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    encoder
        .encode(&pixels, frame.width() as u32, frame.height() as u32, color)
        .map_err(|source| PerfscanError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Output name for the `index`-th frame cut from `base`.
pub fn frame_file_name(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index:03}.jpg"));
    PathBuf::from(name)
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| PerfscanError::Config {
        path: path.to_path_buf(),
        message: format!("failed to serialize JSON: {e}"),
    })?;
    fs::write(path, json).map_err(|source| PerfscanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PerfscanError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Gather the frame rows into one packed buffer the encoder understands.
fn frame_pixels(frame: &ExtractedFrame<'_>) -> (Vec<u8>, ExtendedColorType) {
    let mut out = Vec::with_capacity(frame.width() * frame.height() * frame.components());
    for row in frame.rows() {
        out.extend_from_slice(row);
    }
    match frame.color_space() {
        ColorSpace::Gray => (out, ExtendedColorType::L8),
        ColorSpace::Rgb => (out, ExtendedColorType::Rgb8),
        ColorSpace::YCbCr => {
            for px in out.chunks_exact_mut(3) {
                let [r, g, b] = ycbcr_to_rgb(px[0], px[1], px[2]);
                px.copy_from_slice(&[r, g, b]);
            }
            (out, ExtendedColorType::Rgb8)
        }
    }
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// JFIF full-range RGB -> YCbCr.
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    [clamp_u8(y), clamp_u8(cb), clamp_u8(cr)]
}

/// JFIF full-range YCbCr -> RGB.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = f32::from(y);
    let cb = f32::from(cb) - 128.0;
    let cr = f32::from(cr) - 128.0;
    let r = y + 1.402 * cr;
    let g = y - 0.344_136 * cb - 0.714_136 * cr;
    let b = y + 1.772 * cb;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}
