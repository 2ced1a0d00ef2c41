//! # Shots Review
//!
//! Review tooling for App Store screenshots. A capture step leaves raw
//! simulator screenshots in one directory, a framing step composites them
//! onto device chrome in another, and this crate reconciles the two:
//! which framed screenshots have a raw counterpart, which have the right
//! pixel size, and which a human has already signed off on.
//!
//! # Architecture: Three Commands, Two Files of State
//!
//! ```text
//! review-generate   framed/ + raw/ + approved.json  →  manifest.json + index.html
//! review-approve    manifest.json + selector        →  approved.json (grows)
//! review-open       index.html                      →  default browser
//! ```
//!
//! The manifest is regenerated wholesale on every run. The approval ledger
//! (`approved.json`) is the only state that carries across runs, and only the
//! approver writes it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the framed tree and indexes the raw directory, as plain data |
//! | [`classify`] | Decides `has_raw`, `size_valid`, `approved` per entry and counts them |
//! | [`generate`] | Runs scan and classify, writes `manifest.json` and the maud HTML report |
//! | [`approve`] | Selector evaluation against a manifest, merged into the ledger |
//! | [`approvals`] | The approval ledger: load, union-merge, sorted atomic save |
//! | [`open`] | Resolves the report path and hands it to the platform launcher |
//! | [`imaging`] | Header-only dimension probing behind the [`imaging::ImageProbe`] trait |
//! | [`naming`] | Review keys: locale, device and screenshot id joined by `\|` |
//! | [`types`] | Manifest types shared by generator and approver |
//! | [`atomic`] | Temp-file-then-rename writes for every artifact |
//! | [`cancel`] | Cooperative cancellation checked before the first write |
//! | [`config`] | `review.toml` loading, merging over stock defaults, validation |
//! | [`output`] | Text rendering of command results |
//!
//! # Design Decisions
//!
//! ## Predicates, Not a Status Enum
//!
//! Every entry carries two independent booleans, `has_raw` and `size_valid`.
//! The `status` label is derived from them by priority, but the summary
//! counts the booleans. A framed screenshot with no raw counterpart and an
//! unexpected size is counted under both `missing_raw` and `invalid_size`.
//!
//! ## Listings as Data
//!
//! [`scan`] turns the filesystem into `Vec<FramedShot>` and a `RawIndex`;
//! [`classify`] never touches a directory. Classification tests build
//! listings by hand and answer probes from a mock.
//!
//! ## Explicit Paths
//!
//! Library entry points take every directory as an argument. Defaults
//! (`screenshots/raw`, `screenshots/framed`, `screenshots/review`) live in
//! [`config`] and are applied by the binary only.
//!
//! ## No Ledger Locking
//!
//! Two approvers writing the same ledger at once can drop one side's
//! additions. Each write is atomic, so the file is never corrupt, but the
//! read-merge-write cycle is not serialized across processes.

pub mod approvals;
pub mod approve;
pub mod atomic;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod naming;
pub mod open;
pub mod output;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
