//! Review key convention: `locale|device|screenshot_id`.
//!
//! A review key identifies one framed screenshot across runs. It is derived
//! from the framed file's path (`<framed>/<locale>/<device>/<id>.png`), so two
//! entries in one manifest can never share a key. The same string is the join
//! key between raw and framed artifacts and the unit stored in the approval
//! ledger.
//!
//! - `en` / `iPhone_Air` / `home` → `"en|iPhone_Air|home"`
//! - `"fr-CA|iPad_Pro_13|settings"` → locale `fr-CA`, device `iPad_Pro_13`, id `settings`
//! - `"en|iPhone_Air"` → not a key (two segments)
//! - `"en||home"` → not a key (empty segment)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment separator inside a review key.
pub const KEY_SEPARATOR: char = '|';

/// Composite `locale|device|screenshot_id` identifier.
///
/// Ordered lexicographically on the full string, which is what the ledger
/// uses for its stable on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewKey(String);

/// The three segments of a well-formed review key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub locale: &'a str,
    pub device: &'a str,
    pub screenshot_id: &'a str,
}

impl ReviewKey {
    pub fn new(locale: &str, device: &str, screenshot_id: &str) -> Self {
        Self(format!(
            "{locale}{KEY_SEPARATOR}{device}{KEY_SEPARATOR}{screenshot_id}"
        ))
    }

    /// Wrap an arbitrary string without validation.
    ///
    /// Ledger files and `--key` selectors are matched literally, so a key
    /// that doesn't parse is kept as-is rather than rejected.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into segments, or `None` if the key isn't three non-empty parts.
    pub fn parts(&self) -> Option<KeyParts<'_>> {
        parse_key(&self.0)
    }
}

impl fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReviewKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse `locale|device|screenshot_id`.
pub fn parse_key(raw: &str) -> Option<KeyParts<'_>> {
    let mut segments = raw.split(KEY_SEPARATOR);
    let locale = segments.next()?;
    let device = segments.next()?;
    let screenshot_id = segments.next()?;
    if segments.next().is_some()
        || locale.is_empty()
        || device.is_empty()
        || screenshot_id.is_empty()
    {
        return None;
    }
    Some(KeyParts {
        locale,
        device,
        screenshot_id,
    })
}

/// Whether a path segment can become part of a key.
///
/// The separator would make the key ambiguous, and hidden names (`.DS_Store`,
/// editor swap dirs) are never screenshots.
pub fn is_key_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.starts_with('.') && !segment.contains(KEY_SEPARATOR)
}
