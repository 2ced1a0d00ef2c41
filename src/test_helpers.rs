//! Shared test utilities.
//!
//! Fixtures are built on the fly in a `TempDir` rather than checked in: a
//! review tree only needs real PNG headers of the right size.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_png(&tmp.path().join("framed/en/iPhone_Air/home.png"), 1320, 2868);
//!
//! let entry = find_entry(&manifest, "en|iPhone_Air|home");
//! assert_eq!(entry.status, ReviewStatus::Ready);
//! ```

use crate::types::{ReviewEntry, ReviewManifest};
use image::{Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Fixture images
// =========================================================================

/// Write a solid PNG of the given size, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]))
        .save(path)
        .unwrap_or_else(|e| panic!("write fixture {}: {e}", path.display()));
}

// =========================================================================
// Manifest lookups, panicking with a clear message on miss
// =========================================================================

/// Find an entry by review key. Panics if not found.
pub fn find_entry<'a>(manifest: &'a ReviewManifest, key: &str) -> &'a ReviewEntry {
    manifest
        .entries
        .iter()
        .find(|e| e.key.as_str() == key)
        .unwrap_or_else(|| {
            let keys = entry_keys(manifest);
            panic!("entry '{key}' not found. Available: {keys:?}")
        })
}

/// All entry keys in manifest order.
pub fn entry_keys(manifest: &ReviewManifest) -> Vec<&str> {
    manifest.entries.iter().map(|e| e.key.as_str()).collect()
}
