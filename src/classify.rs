//! Cross-matching framed screenshots against raw captures.
//!
//! Given the two listings from [`crate::scan`], an [`ImageProbe`], the device
//! table and the current approval ledger, this module decides for every
//! framed screenshot:
//!
//! | Predicate | True when |
//! |---|---|
//! | `has_raw` | a raw `<id>.<ext>` exists and could be read |
//! | `size_valid` | framed dimensions decode and equal the raw's; with no raw, they match an accepted size for the device |
//! | `approved` | the entry's key is in the ledger |
//!
//! The status label is derived from the first two predicates by priority
//! ([`ReviewStatus::derive`]), but the summary counts the predicates
//! themselves: an entry with no raw and a bad size adds to both
//! `missing_raw` and `invalid_size`.
//!
//! Nothing here lists directories; everything arrives as data, so tests feed
//! hand-built listings and a mock probe.

use crate::approvals::ApprovalLedger;
use crate::config::DeviceTable;
use crate::imaging::{Dimensions, ImageProbe, ProbeError};
use crate::scan::{FramedShot, RawIndex};
use crate::types::{ReviewEntry, ReviewStatus, Summary};
use rayon::prelude::*;

/// Shared read-only inputs to classification.
pub struct Classifier<'a, P: ImageProbe> {
    pub probe: &'a P,
    pub raw: &'a RawIndex,
    pub devices: &'a DeviceTable,
    pub ledger: &'a ApprovalLedger,
}

impl<P: ImageProbe> Classifier<'_, P> {
    /// Classify every shot, preserving input order.
    ///
    /// Probing fans out over the rayon pool; `collect` on an indexed parallel
    /// iterator keeps the listing's order regardless of completion order.
    pub fn classify_all(&self, shots: &[FramedShot]) -> Vec<ReviewEntry> {
        shots.par_iter().map(|shot| self.classify(shot)).collect()
    }

    pub fn classify(&self, shot: &FramedShot) -> ReviewEntry {
        let framed = match self.probe.probe(&shot.path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!(error = %e, "framed screenshot not decodable");
                None
            }
        };

        let raw_path = self.raw.lookup(&shot.screenshot_id, &shot.extension);
        let raw_probe = raw_path.map(|p| self.probe.probe(p));
        let has_raw = match &raw_probe {
            Some(Ok(_)) => true,
            Some(Err(e)) => e.file_present(),
            None => false,
        };
        let raw_dims = raw_probe.as_ref().and_then(|r| r.as_ref().ok()).copied();

        let size_valid = self.size_valid(shot, framed, has_raw, raw_probe.as_ref());
        let key = shot.key();
        let approved = self.ledger.contains(&key);

        ReviewEntry {
            status: ReviewStatus::derive(has_raw, size_valid),
            key,
            screenshot_id: shot.screenshot_id.clone(),
            locale: shot.locale.clone(),
            device: shot.device.clone(),
            has_raw,
            size_valid,
            approved,
            framed_path: Some(shot.path.clone()),
            raw_path: has_raw.then(|| raw_path.map(|p| p.to_path_buf())).flatten(),
            framed_size: framed.map(Into::into),
            raw_size: raw_dims.map(Into::into),
        }
    }

    /// With a raw counterpart, dimensions must match it exactly. Without one,
    /// the device table is the only reference; an unknown device fails.
    fn size_valid(
        &self,
        shot: &FramedShot,
        framed: Option<Dimensions>,
        has_raw: bool,
        raw_probe: Option<&Result<Dimensions, ProbeError>>,
    ) -> bool {
        let Some(framed) = framed else {
            return false;
        };
        match raw_probe {
            Some(Ok(raw)) => framed == *raw,
            Some(Err(_)) if has_raw => false,
            _ => self
                .devices
                .get(&shot.device)
                .is_some_and(|spec| spec.accepts(framed)),
        }
    }
}

/// Count predicates over a set of entries.
pub fn summarize(entries: &[ReviewEntry]) -> Summary {
    let total = entries.len();
    let count = |pred: fn(&ReviewEntry) -> bool| entries.iter().filter(|e| pred(e)).count();
    let approved = count(|e| e.approved);
    Summary {
        total,
        ready: count(|e| e.has_raw && e.size_valid),
        missing_raw: count(|e| !e.has_raw),
        invalid_size: count(|e| !e.size_valid),
        approved,
        pending_approval: total - approved,
    }
}
