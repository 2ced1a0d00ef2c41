//! Directory walks that feed the review pipeline.
//!
//! Two listings come out of the filesystem, and nothing else in the crate
//! walks directories:
//!
//! ```text
//! screenshots/framed/              # framed root (required)
//! ├── en/                          # locale
//! │   ├── iPhone_Air/              # device
//! │   │   ├── home.png             # → key en|iPhone_Air|home
//! │   │   └── details.png          # → key en|iPhone_Air|details
//! │   └── iPad_Pro_13/
//! │       └── home.png
//! └── fr/
//!     └── iPhone_Air/
//!         └── home.png
//!
//! screenshots/raw/                 # raw root (optional)
//! ├── home.png                     # joined on screenshot id
//! └── details.png
//! ```
//!
//! - [`list_framed`] yields one [`FramedShot`] per `locale/device/<id>.<ext>`
//!   file, sorted by (locale, device, id). Anything at another depth, with an
//!   unknown extension, or with a hidden name is skipped silently.
//! - [`RawIndex`] maps screenshot ids to raw files. A missing or unreadable
//!   raw directory is an empty index, not an error.
//!
//! Both are plain data. [`crate::classify`] consumes them without touching
//! the disk, so tests can build listings by hand
//! ([`FramedShot::from_relative`], [`RawIndex::from_paths`]).

use crate::naming::{ReviewKey, is_key_segment};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("read framed directory: {path}: {source}")]
    ReadFramedDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image extensions recognized in both trees, in lookup preference order.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A framed screenshot found at `<framed>/<locale>/<device>/<id>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedShot {
    pub locale: String,
    pub device: String,
    pub screenshot_id: String,
    /// Lowercased extension without the dot.
    pub extension: String,
    pub path: PathBuf,
}

impl FramedShot {
    /// Build a shot from a path relative to the framed root.
    ///
    /// Returns `None` unless the path is exactly `locale/device/file` with a
    /// recognized image extension and usable segment names.
    pub fn from_relative(framed_dir: &Path, relative: &Path) -> Option<Self> {
        let segments: Vec<&str> = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        let [locale, device, filename] = segments.as_slice() else {
            return None;
        };
        let (screenshot_id, extension) = split_image_name(filename)?;

        if !is_key_segment(locale) || !is_key_segment(device) || !is_key_segment(screenshot_id)
        {
            return None;
        }

        Some(Self {
            locale: locale.to_string(),
            device: device.to_string(),
            screenshot_id: screenshot_id.to_string(),
            extension,
            path: framed_dir.join(relative),
        })
    }

    pub fn key(&self) -> ReviewKey {
        ReviewKey::new(&self.locale, &self.device, &self.screenshot_id)
    }

    fn sort_key(&self) -> (&str, &str, &str, usize) {
        (
            &self.locale,
            &self.device,
            &self.screenshot_id,
            extension_rank(&self.extension),
        )
    }
}

/// Split `home.PNG` into (`home`, `png`) if the extension is a known image type.
fn split_image_name(filename: &str) -> Option<(&str, String)> {
    let (stem, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if stem.is_empty() || !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some((stem, ext))
}

fn extension_rank(ext: &str) -> usize {
    IMAGE_EXTENSIONS
        .iter()
        .position(|e| *e == ext)
        .unwrap_or(IMAGE_EXTENSIONS.len())
}

/// List framed screenshots in deterministic (locale, device, id) order.
///
/// The framed root itself must be listable; that failure is fatal and
/// carries the path. Unreadable subdirectories are skipped.
///
/// If the same id appears with two extensions in one device directory
/// (`home.png` and `home.jpg`), only the preferred extension is kept so
/// keys stay unique.
pub fn list_framed(framed_dir: &Path) -> Result<Vec<FramedShot>, ScanError> {
    fs::read_dir(framed_dir).map_err(|source| ScanError::ReadFramedDir {
        path: framed_dir.to_path_buf(),
        source,
    })?;

    let walker = WalkDir::new(framed_dir)
        .min_depth(3)
        .max_depth(3)
        .follow_links(true)
        .sort_by_file_name();

    let mut shots = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable framed entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(framed_dir) else {
            continue;
        };
        if let Some(shot) = FramedShot::from_relative(framed_dir, relative) {
            shots.push(shot);
        }
    }

    Ok(dedupe_sorted(shots))
}

/// Sort shots and drop duplicate keys, keeping the preferred extension.
pub fn dedupe_sorted(mut shots: Vec<FramedShot>) -> Vec<FramedShot> {
    shots.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    shots.dedup_by(|later, kept| {
        let duplicate = later.locale == kept.locale
            && later.device == kept.device
            && later.screenshot_id == kept.screenshot_id;
        if duplicate {
            tracing::warn!(
                kept = %kept.path.display(),
                ignored = %later.path.display(),
                "duplicate framed screenshot id"
            );
        }
        duplicate
    });
    shots
}

/// Raw captures keyed by screenshot id.
#[derive(Debug, Clone, Default)]
pub struct RawIndex {
    by_id: BTreeMap<String, Vec<(String, PathBuf)>>,
}

impl RawIndex {
    /// Index the top level of the raw directory.
    ///
    /// `None`, a missing directory, or an unreadable one all give an empty
    /// index: every framed shot is then reported as missing its raw.
    pub fn scan(raw_dir: Option<&Path>) -> Self {
        let Some(raw_dir) = raw_dir else {
            return Self::default();
        };
        let entries = match fs::read_dir(raw_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    raw_dir = %raw_dir.display(),
                    error = %e,
                    "raw directory unavailable, treating every screenshot as missing raw"
                );
                return Self::default();
            }
        };

        let paths = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file());
        Self::from_paths(paths)
    }

    /// Build an index from candidate file paths. Non-image files are ignored.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut by_id: BTreeMap<String, Vec<(String, PathBuf)>> = BTreeMap::new();
        for path in paths {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((stem, ext)) = split_image_name(filename) else {
                continue;
            };
            by_id.entry(stem.to_string()).or_default().push((ext, path.clone()));
        }
        for candidates in by_id.values_mut() {
            candidates.sort_by_key(|(ext, _)| extension_rank(ext));
        }
        Self { by_id }
    }

    /// Raw file for a screenshot id.
    ///
    /// Prefers the same extension as the framed file, then the first
    /// candidate in [`IMAGE_EXTENSIONS`] order.
    pub fn lookup(&self, screenshot_id: &str, preferred_ext: &str) -> Option<&Path> {
        let candidates = self.by_id.get(screenshot_id)?;
        candidates
            .iter()
            .find(|(ext, _)| ext == preferred_ext)
            .or_else(|| candidates.first())
            .map(|(_, path)| path.as_path())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
