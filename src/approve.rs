//! Approving manifest entries into the ledger.
//!
//! [`approve`] reads a manifest produced by [`crate::generate`], picks the
//! entries a [`Selector`] matches, and unions their keys into the ledger.
//!
//! ## Selectors
//!
//! | Component | Matches |
//! |---|---|
//! | `all_ready` | every entry with `status == ready` |
//! | `keys` | entries whose key is literally listed |
//! | `id` | entries with that screenshot id, narrowed by `locale`/`device` when given |
//! | `locale`/`device` without `id` | every entry matching the given filters |
//!
//! Each component is an independent membership test and the matches are
//! unioned, so the order flags are given in never matters. An empty selector
//! is rejected before any file is read.

use crate::approvals::{ApprovalError, ApprovalLedger, approvals_path};
use crate::cancel::CancelFlag;
use crate::generate::MANIFEST_FILENAME;
use crate::naming::ReviewKey;
use crate::types::{ReviewEntry, ReviewManifest, ReviewStatus};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApproveError {
    #[error("provide at least one selector: --all-ready, --key, --id, --locale, or --device")]
    NoSelector,
    #[error("read manifest {path}: {source} (run review-generate first)")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse manifest {path}: {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Approvals(#[from] ApprovalError),
    #[error("resolve path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("approval cancelled before writing")]
    Cancelled,
}

impl ApproveError {
    /// Errors the caller should present as a usage problem.
    pub fn is_usage(&self) -> bool {
        matches!(self, ApproveError::NoSelector)
    }
}

/// Which manifest entries to approve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub all_ready: bool,
    pub keys: Vec<String>,
    pub id: Option<String>,
    pub locale: Option<String>,
    pub device: Option<String>,
}

impl Selector {
    /// Build from raw flag values: `key_csv` is split on commas, and blank
    /// strings count as absent.
    pub fn from_flags(
        all_ready: bool,
        key_csv: Option<&str>,
        id: Option<&str>,
        locale: Option<&str>,
        device: Option<&str>,
    ) -> Self {
        Self {
            all_ready,
            keys: key_csv.map(split_csv).unwrap_or_default(),
            id: non_blank(id),
            locale: non_blank(locale),
            device: non_blank(device),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.all_ready
            && self.keys.is_empty()
            && self.id.is_none()
            && self.locale.is_none()
            && self.device.is_none()
    }

    pub fn matches(&self, entry: &ReviewEntry) -> bool {
        let ready = self.all_ready && entry.status == ReviewStatus::Ready;
        let listed = self.keys.iter().any(|k| k == entry.key.as_str());
        let filters = self.filters_match(entry);
        let by_id = match &self.id {
            Some(id) => *id == entry.screenshot_id && filters,
            None => (self.locale.is_some() || self.device.is_some()) && filters,
        };
        ready || listed || by_id
    }

    fn filters_match(&self, entry: &ReviewEntry) -> bool {
        let eq = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);
        eq(&self.locale, &entry.locale) && eq(&self.device, &entry.device)
    }

    /// Keys of all matching entries, deduplicated and sorted.
    pub fn select(&self, entries: &[ReviewEntry]) -> BTreeSet<ReviewKey> {
        entries
            .iter()
            .filter(|e| self.matches(e))
            .map(|e| e.key.clone())
            .collect()
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct ApproveRequest {
    pub output_dir: PathBuf,
    /// Defaults to `<output_dir>/manifest.json`.
    pub manifest_path: Option<PathBuf>,
    /// Defaults to `<output_dir>/approved.json`.
    pub approval_path: Option<PathBuf>,
    pub selector: Selector,
    pub cancel: CancelFlag,
}

impl ApproveRequest {
    pub fn new(output_dir: impl Into<PathBuf>, selector: Selector) -> Self {
        Self {
            output_dir: output_dir.into(),
            manifest_path: None,
            approval_path: None,
            selector,
            cancel: CancelFlag::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproveResult {
    /// Distinct entries the selector matched, approved before or not.
    pub matched: usize,
    /// Matches that were not yet approved.
    pub added: usize,
    /// Ledger size after the merge.
    pub total_approved: usize,
    /// The newly approved keys, sorted. Not the whole ledger.
    pub keys: Vec<ReviewKey>,
    pub approval_path: PathBuf,
}

pub fn approve(req: &ApproveRequest) -> Result<ApproveResult, ApproveError> {
    if req.selector.is_empty() {
        return Err(ApproveError::NoSelector);
    }

    let manifest_path = req
        .manifest_path
        .clone()
        .unwrap_or_else(|| req.output_dir.join(MANIFEST_FILENAME));
    let manifest = load_manifest(&manifest_path)?;

    let candidates = req.selector.select(&manifest.entries);
    warn_unmatched_keys(&req.selector, &candidates);
    tracing::debug!(
        candidates = candidates.len(),
        entries = manifest.entries.len(),
        "selector evaluated"
    );

    let approval_path = approvals_path(&req.output_dir, req.approval_path.as_deref());
    let approval_path =
        std::path::absolute(&approval_path).map_err(|source| ApproveError::Resolve {
            path: approval_path.clone(),
            source,
        })?;
    let mut ledger = ApprovalLedger::load(&approval_path)?;
    let outcome = ledger.merge(candidates);

    if req.cancel.is_cancelled() {
        return Err(ApproveError::Cancelled);
    }
    ledger.save(&approval_path)?;

    Ok(ApproveResult {
        matched: outcome.matched,
        added: outcome.added.len(),
        total_approved: ledger.len(),
        keys: outcome.added,
        approval_path,
    })
}

/// Read a manifest written by the generator. Absent or malformed is fatal.
pub fn load_manifest(path: &Path) -> Result<ReviewManifest, ApproveError> {
    let content = std::fs::read_to_string(path).map_err(|source| ApproveError::ReadManifest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ApproveError::ParseManifest {
        path: path.to_path_buf(),
        source,
    })
}

fn warn_unmatched_keys(selector: &Selector, matched: &BTreeSet<ReviewKey>) {
    for key in &selector.keys {
        if !matched.iter().any(|m| m.as_str() == key) {
            tracing::warn!(key = %key, "review key matches no manifest entry");
        }
    }
}
