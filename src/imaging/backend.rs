//! Image probe trait and shared types.
//!
//! The [`ImageProbe`] trait is the one operation the review pipeline needs
//! from an image library: read the pixel dimensions of a file. Decoding is
//! someone else's job; a probe only has to say how big an image is, or why
//! it can't tell.
//!
//! The production implementation is
//! [`RustProbe`](super::rust_backend::RustProbe). Tests use the
//! path-keyed [`MockProbe`](tests::MockProbe) so classification can run
//! without touching the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("image not found: {0}")]
    NotFound(PathBuf),
    #[error("image unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image undecodable: {path}: {reason}")]
    Undecodable { path: PathBuf, reason: String },
}

impl ProbeError {
    /// Whether the file exists and could be read, even though no usable
    /// dimensions came out of it.
    ///
    /// A raw capture that is present but corrupt still counts as "has raw";
    /// the defect is reported through size validation instead.
    pub fn file_present(&self) -> bool {
        matches!(self, ProbeError::Undecodable { .. })
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Reads image dimensions.
///
/// `Sync` so a single probe can be shared across rayon workers.
pub trait ImageProbe: Sync {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError>;
}
