//! Review artifact generation.
//!
//! One run reads the framed tree, the raw directory and the approval ledger,
//! and writes two artifacts into the output directory:
//!
//! ```text
//! screenshots/review/
//! ├── manifest.json      # ReviewManifest: summary + one entry per framed shot
//! ├── index.html         # side-by-side raw/framed report, grouped by locale then device
//! └── approved.json      # ledger, read here, written only by the approver
//! ```
//!
//! Both artifacts are regenerated wholesale and written atomically. The
//! ledger is never touched.
//!
//! ## Pipeline
//!
//! 1. [`scan::list_framed`] (fatal on an unreadable framed root)
//! 2. [`RawIndex::scan`] (missing raw dir is an empty index)
//! 3. [`ApprovalLedger::load`]
//! 4. [`Classifier::classify_all`] on the rayon pool, then [`summarize`]
//! 5. cancellation check, then `manifest.json` and `index.html`, both staged
//!    before either is committed
//!
//! ## HTML
//!
//! Rendered with [maud](https://maud.lambda.xyz/). Images are referenced by
//! absolute `file://` URL so the report works wherever the output directory
//! lives. The stylesheet is embedded at compile time from
//! `static/review.css`.

use crate::approvals::{ApprovalError, ApprovalLedger, approvals_path};
use crate::atomic::{self, AtomicWriteError};
use crate::cancel::CancelFlag;
use crate::classify::{Classifier, summarize};
use crate::config::{DeviceTable, default_devices};
use crate::imaging::ImageProbe;
use crate::scan::{self, RawIndex, ScanError};
use crate::types::{ReviewEntry, ReviewManifest, ReviewStatus, Size, Summary};
use chrono::{SecondsFormat, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const MANIFEST_FILENAME: &str = "manifest.json";
pub const HTML_FILENAME: &str = "index.html";

const CSS: &str = include_str!("../static/review.css");

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Approvals(#[from] ApprovalError),
    #[error("resolve path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Write(#[from] AtomicWriteError),
    #[error("review generation cancelled before writing")]
    Cancelled,
}

/// Inputs to [`generate`]. All paths are explicit; nothing is read from the
/// environment.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Raw captures. `None` treats every entry as missing its raw.
    pub raw_dir: Option<PathBuf>,
    pub framed_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Ledger override; defaults to `<output_dir>/approved.json`.
    pub approval_path: Option<PathBuf>,
    pub devices: DeviceTable,
    pub cancel: CancelFlag,
}

impl GenerateRequest {
    pub fn new(framed_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: None,
            framed_dir: framed_dir.into(),
            output_dir: output_dir.into(),
            approval_path: None,
            devices: default_devices(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_raw_dir(mut self, raw_dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = Some(raw_dir.into());
        self
    }
}

/// What the caller prints after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    pub manifest_path: PathBuf,
    pub html_path: PathBuf,
    pub total: usize,
    pub ready: usize,
    pub missing_raw: usize,
    pub invalid_size: usize,
    pub approved: usize,
    pub pending: usize,
}

impl GenerateResult {
    fn new(manifest_path: PathBuf, html_path: PathBuf, summary: &Summary) -> Self {
        Self {
            manifest_path,
            html_path,
            total: summary.total,
            ready: summary.ready,
            missing_raw: summary.missing_raw,
            invalid_size: summary.invalid_size,
            approved: summary.approved,
            pending: summary.pending_approval,
        }
    }
}

pub fn generate(
    req: &GenerateRequest,
    probe: &impl ImageProbe,
) -> Result<GenerateResult, GenerateError> {
    let framed_dir = absolute(&req.framed_dir)?;
    let output_dir = absolute(&req.output_dir)?;

    let manifest = build_manifest(req, &framed_dir, &output_dir, probe)?;

    if req.cancel.is_cancelled() {
        return Err(GenerateError::Cancelled);
    }

    let mut json = serde_json::to_vec_pretty(&manifest)?;
    json.push(b'\n');
    let html = render_report(&manifest).into_string();

    let manifest_path = output_dir.join(MANIFEST_FILENAME);
    let html_path = output_dir.join(HTML_FILENAME);
    let staged_manifest = atomic::stage(&manifest_path, &json)?;
    let staged_html = atomic::stage(&html_path, html.as_bytes())?;
    staged_manifest.commit()?;
    staged_html.commit()?;

    tracing::debug!(
        manifest = %manifest_path.display(),
        html = %html_path.display(),
        "review artifacts written"
    );
    Ok(GenerateResult::new(
        manifest_path,
        html_path,
        &manifest.summary,
    ))
}

/// Everything up to the writes: walk, classify, summarize.
pub fn build_manifest(
    req: &GenerateRequest,
    framed_dir: &Path,
    output_dir: &Path,
    probe: &impl ImageProbe,
) -> Result<ReviewManifest, GenerateError> {
    let shots = scan::list_framed(framed_dir)?;
    let raw = RawIndex::scan(req.raw_dir.as_deref());
    let ledger_path = approvals_path(output_dir, req.approval_path.as_deref());
    let ledger = ApprovalLedger::load(&ledger_path)?;
    tracing::debug!(
        framed = shots.len(),
        raw = raw.len(),
        approved = ledger.len(),
        "inputs collected"
    );

    let entries = Classifier {
        probe,
        raw: &raw,
        devices: &req.devices,
        ledger: &ledger,
    }
    .classify_all(&shots);
    let summary = summarize(&entries);

    Ok(ReviewManifest {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        framed_dir: framed_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        summary,
        entries,
    })
}

fn absolute(path: &Path) -> Result<PathBuf, GenerateError> {
    std::path::absolute(path).map_err(|source| GenerateError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// HTML report
// ============================================================================

/// Render the whole report page.
pub fn render_report(manifest: &ReviewManifest) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Screenshot review" }
                style { (PreEscaped(CSS)) }
            }
            body {
                header.review-header {
                    h1 { "Screenshot review" }
                    p.meta {
                        "Generated " (manifest.generated_at)
                        " from " code { (manifest.framed_dir.display().to_string()) }
                    }
                }
                (render_summary(&manifest.summary))
                @if manifest.entries.is_empty() {
                    p.empty { "No framed screenshots found." }
                }
                @for locale_group in manifest.entries.chunk_by(|a, b| a.locale == b.locale) {
                    section.locale {
                        h2 { (locale_group[0].locale) }
                        @for device_group in locale_group.chunk_by(|a, b| a.device == b.device) {
                            section.device {
                                h3 { (device_group[0].device) }
                                @for entry in device_group {
                                    (render_entry(entry))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_summary(summary: &Summary) -> Markup {
    html! {
        table.summary {
            tr {
                th { "Total" } th { "Ready" } th { "Missing raw" }
                th { "Invalid size" } th { "Approved" } th { "Pending" }
            }
            tr {
                td { (summary.total) }
                td { (summary.ready) }
                td { (summary.missing_raw) }
                td { (summary.invalid_size) }
                td { (summary.approved) }
                td { (summary.pending_approval) }
            }
        }
    }
}

/// One raw/framed pair. A missing raw gets a placeholder; a bad size flags
/// the whole card.
fn render_entry(entry: &ReviewEntry) -> Markup {
    let status_class = format!("badge status-{}", entry.status);
    html! {
        article.entry.size-invalid[!entry.size_valid] id=(entry.key.as_str()) {
            div.entry-head {
                strong { (entry.screenshot_id) }
                span class=(status_class) { (status_label(entry.status)) }
                @if entry.approved {
                    span.badge.approved { "Approved" }
                } @else {
                    span.badge.pending { "Pending" }
                }
                code { (entry.key.as_str()) }
            }
            div.pair {
                figure.raw {
                    @match (entry.raw_path.as_deref().and_then(file_url), entry.has_raw) {
                        (Some(src), true) => {
                            img src=(src) alt={ "Raw " (entry.screenshot_id) } loading="lazy";
                        }
                        _ => {
                            div.placeholder { "No raw capture" }
                        }
                    }
                    figcaption { "Raw " (size_caption(entry.raw_size)) }
                }
                figure.framed {
                    @if let Some(src) = entry.framed_path.as_deref().and_then(file_url) {
                        img src=(src) alt={ "Framed " (entry.screenshot_id) } loading="lazy";
                    }
                    figcaption {
                        "Framed " (size_caption(entry.framed_size))
                        @if !entry.size_valid {
                            " " span.size-flag { "size mismatch" }
                        }
                    }
                }
            }
        }
    }
}

fn status_label(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Ready => "Ready",
        ReviewStatus::MissingRaw => "Missing raw",
        ReviewStatus::InvalidSize => "Invalid size",
    }
}

fn size_caption(size: Option<Size>) -> String {
    match size {
        Some(s) => format!("{}×{}", s.width, s.height),
        None => "(unknown size)".to_string(),
    }
}

/// `file://` URL for an absolute path. `None` for a relative one.
pub fn file_url(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}
