//! Types serialized into `manifest.json`.
//!
//! The generator writes them and the approver reads them back, so both sides
//! share one definition. The first five entry fields (`key`, `screenshot_id`,
//! `locale`, `device`, `status`) are the stable contract; everything after
//! them is informational and defaults when absent, so a hand-written minimal
//! manifest still loads.

use crate::imaging::Dimensions;
use crate::naming::ReviewKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Display label for an entry, derived by priority.
///
/// This is a label only. Summary counts come from the underlying
/// predicates, so one entry can be both missing its raw and invalid in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Ready,
    MissingRaw,
    InvalidSize,
}

impl ReviewStatus {
    /// `missing_raw` beats `invalid_size` beats `ready`.
    pub fn derive(has_raw: bool, size_valid: bool) -> Self {
        if !has_raw {
            ReviewStatus::MissingRaw
        } else if !size_valid {
            ReviewStatus::InvalidSize
        } else {
            ReviewStatus::Ready
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Ready => "ready",
            ReviewStatus::MissingRaw => "missing_raw",
            ReviewStatus::InvalidSize => "invalid_size",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel size as written to JSON: `{"width": 1320, "height": 2868}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for Size {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width,
            height: d.height,
        }
    }
}

/// One framed screenshot under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub key: ReviewKey,
    pub screenshot_id: String,
    pub locale: String,
    pub device: String,
    pub status: ReviewStatus,
    #[serde(default)]
    pub has_raw: bool,
    #[serde(default)]
    pub size_valid: bool,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framed_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framed_size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_size: Option<Size>,
}

/// Counts over a manifest's entries.
///
/// `ready`, `missing_raw` and `invalid_size` are independent predicate
/// counts and need not sum to `total`. `pending_approval` is always
/// `total - approved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub ready: usize,
    pub missing_raw: usize,
    pub invalid_size: usize,
    pub approved: usize,
    pub pending_approval: usize,
}

/// The generated `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewManifest {
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub framed_dir: PathBuf,
    pub output_dir: PathBuf,
    pub summary: Summary,
    pub entries: Vec<ReviewEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_priority() {
        assert_eq!(ReviewStatus::derive(false, false), ReviewStatus::MissingRaw);
        assert_eq!(ReviewStatus::derive(false, true), ReviewStatus::MissingRaw);
        assert_eq!(ReviewStatus::derive(true, false), ReviewStatus::InvalidSize);
        assert_eq!(ReviewStatus::derive(true, true), ReviewStatus::Ready);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReviewStatus::MissingRaw).unwrap(),
            r#""missing_raw""#
        );
        assert_eq!(
            serde_json::to_string(&ReviewStatus::InvalidSize).unwrap(),
            r#""invalid_size""#
        );
    }

    #[test]
    fn minimal_entry_deserializes() {
        let json = r#"{ "key": "en|iPhone_Air|home", "screenshot_id": "home",
                        "locale": "en", "device": "iPhone_Air", "status": "ready" }"#;
        let entry: ReviewEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.key.as_str(), "en|iPhone_Air|home");
        assert_eq!(entry.status, ReviewStatus::Ready);
        assert!(!entry.approved);
        assert_eq!(entry.framed_path, None);
    }

    #[test]
    fn entry_contract_fields_come_first() {
        let entry = ReviewEntry {
            key: ReviewKey::new("en", "iPhone_Air", "home"),
            screenshot_id: "home".into(),
            locale: "en".into(),
            device: "iPhone_Air".into(),
            status: ReviewStatus::Ready,
            has_raw: true,
            size_valid: true,
            approved: false,
            framed_path: None,
            raw_path: None,
            framed_size: None,
            raw_size: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.starts_with(
            r#"{"key":"en|iPhone_Air|home","screenshot_id":"home","locale":"en","device":"iPhone_Air","status":"ready""#
        ));
        assert!(!json.contains("raw_path"));
    }
}
