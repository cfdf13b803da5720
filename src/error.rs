//! Error taxonomy shared by the detector, the segmenter and the I/O helpers.
//!
//! Fatal I/O problems (`Decode`, `Encode`, `Io`, `Config`) abort a run. The
//! degenerate detection outcome is kept apart as
//! [`PerfscanError::NoConsistentGeometry`] so callers can report it as an empty
//! result instead of a crash.
use crate::image::{Channel, ColorSpace};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PerfscanError>;

#[derive(Error, Debug)]
pub enum PerfscanError {
    #[error("can't decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("can't encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("can't open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("channel {channel:?} cannot be sampled from a {color_space:?} buffer")]
    ChannelMismatch {
        channel: Channel,
        color_space: ColorSpace,
    },

    #[error("sample buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("invalid frame geometry: {0}")]
    FrameGeometry(String),

    #[error("no consistent perforation geometry found in {columns_scanned} scanned columns")]
    NoConsistentGeometry { columns_scanned: usize },
}

impl PerfscanError {
    /// True for the degenerate "nothing to slice" outcome of detection.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, PerfscanError::NoConsistentGeometry { .. })
    }
}
