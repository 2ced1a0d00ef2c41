//! Pure Rust probe backed by the `image` crate.
//!
//! Only the container header is read: `ImageReader::into_dimensions` stops
//! once width and height are known, so probing a full-resolution App Store
//! screenshot costs a few hundred bytes of I/O rather than a full decode.
//!
//! | Format | Decoder |
//! |---|---|
//! | PNG | `image` (`png` feature) |
//! | JPEG | `image` (`jpeg` feature) |
//! | WebP | `image` (`webp` feature) |

use super::backend::{Dimensions, ImageProbe, ProbeError};
use image::ImageReader;
use std::io::ErrorKind;
use std::path::Path;

/// Probe implementation used by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustProbe;

impl RustProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ImageProbe for RustProbe {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let io_err = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                ProbeError::NotFound(path.to_path_buf())
            } else {
                ProbeError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        };

        let reader = ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ProbeError::Undecodable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let dims = Dimensions::new(width, height);
        if dims.is_empty() {
            return Err(ProbeError::Undecodable {
                path: path.to_path_buf(),
                reason: format!("zero-sized image ({dims})"),
            });
        }
        Ok(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_png;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn probe_synthetic_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("home.png");
        write_png(&path, 120, 260);

        let dims = RustProbe::new().probe(&path).unwrap();
        assert_eq!(dims, Dimensions::new(120, 260));
    }

    #[test]
    fn probe_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = RustProbe::new().probe(&tmp.path().join("nope.png"));
        assert!(matches!(result, Err(ProbeError::NotFound(_))));
    }

    #[test]
    fn probe_garbage_is_undecodable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = RustProbe::new().probe(&path).unwrap_err();
        assert!(err.file_present(), "expected Undecodable, got {err}");
    }

    #[test]
    fn probe_directory_is_not_present() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("home.png");
        fs::create_dir(&dir).unwrap();

        let err = RustProbe::new().probe(&dir).unwrap_err();
        assert!(!err.file_present(), "directory must not count as an image: {err}");
    }
}
