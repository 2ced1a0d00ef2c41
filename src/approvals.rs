//! The approval ledger: which review keys a human has signed off on.
//!
//! # Storage
//!
//! One ledger per review output directory, at `<output_dir>/approved.json`
//! unless the caller names another path. The file is a JSON array of key
//! strings:
//!
//! ```json
//! [
//!   "en|iPhone_Air|details",
//!   "en|iPhone_Air|home"
//! ]
//! ```
//!
//! Keys are written sorted, so saving an unchanged ledger reproduces the
//! file byte for byte and diffs stay small.
//!
//! # Lifecycle
//!
//! - A missing file is an empty ledger. A file that exists but isn't a JSON
//!   array of strings is an error: silently starting over would throw away
//!   approvals.
//! - The ledger only grows. [`ApprovalLedger::merge`] is a set union, so
//!   approving a key twice is a no-op and merge order doesn't matter.
//! - The generator reads the ledger to fill in `approved`; only the approver
//!   writes it.
//!
//! Two approvers racing on the same file can lose one side's additions;
//! there is no locking.

use crate::atomic::{AtomicWriteError, write_atomic};
use crate::naming::ReviewKey;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default ledger file name inside the review output directory.
pub const APPROVALS_FILENAME: &str = "approved.json";

#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("read approvals {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse approvals {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode approvals: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Write(#[from] AtomicWriteError),
}

/// Resolve the ledger path: explicit override, else `<output_dir>/approved.json`.
pub fn approvals_path(output_dir: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.join(APPROVALS_FILENAME))
}

/// Result of merging candidate keys into the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Distinct candidate keys, whether new or already approved.
    pub matched: usize,
    /// Keys that were not approved before the merge, sorted.
    pub added: Vec<ReviewKey>,
}

/// Set of approved review keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalLedger {
    keys: BTreeSet<ReviewKey>,
}

impl ApprovalLedger {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from disk. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, ApprovalError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no approvals file, starting empty");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(ApprovalError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let keys: Vec<ReviewKey> =
            serde_json::from_str(&content).map_err(|source| ApprovalError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_keys(keys))
    }

    /// Persist atomically in sorted key order.
    pub fn save(&self, path: &Path) -> Result<(), ApprovalError> {
        write_atomic(path, &self.to_json()?)?;
        tracing::debug!(path = %path.display(), keys = self.len(), "saved approvals");
        Ok(())
    }

    /// Serialized form: pretty JSON array with a trailing newline.
    pub fn to_json(&self) -> Result<Vec<u8>, ApprovalError> {
        let mut json = serde_json::to_vec_pretty(&self.keys).map_err(ApprovalError::Encode)?;
        json.push(b'\n');
        Ok(json)
    }

    pub fn from_keys(keys: impl IntoIterator<Item = ReviewKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Union `candidates` into the ledger.
    pub fn merge(&mut self, candidates: impl IntoIterator<Item = ReviewKey>) -> MergeOutcome {
        let candidates: BTreeSet<ReviewKey> = candidates.into_iter().collect();
        let matched = candidates.len();
        let added: Vec<ReviewKey> = candidates
            .into_iter()
            .filter(|key| self.keys.insert(key.clone()))
            .collect();
        MergeOutcome { matched, added }
    }

    pub fn contains(&self, key: &ReviewKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewKey> {
        self.keys.iter()
    }
}
