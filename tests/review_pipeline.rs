//! End-to-end review flow through the library: generate, approve, regenerate,
//! open, against real PNG files in a temp directory.
//!
//! Run with: `cargo test --test review_pipeline`

use image::{Rgba, RgbaImage};
use shots_review::approvals::ApprovalLedger;
use shots_review::approve::{ApproveRequest, Selector, approve};
use shots_review::generate::{GenerateRequest, generate};
use shots_review::imaging::RustProbe;
use shots_review::open::{Launcher, OpenRequest, open_review};
use shots_review::types::{ReviewManifest, ReviewStatus};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
        .save(path)
        .unwrap();
}

struct Workspace {
    _tmp: TempDir,
    raw: PathBuf,
    framed: PathBuf,
    review: PathBuf,
}

impl Workspace {
    /// Raw `home` at 1320x2868; framed `en/iPhone_Air/home` matching it and
    /// `en/iPhone_Air/details` at 1000x1000 with no raw.
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let raw = tmp.path().join("screenshots/raw");
        let framed = tmp.path().join("screenshots/framed");
        let review = tmp.path().join("screenshots/review");
        write_png(&raw.join("home.png"), 1320, 2868);
        write_png(&framed.join("en/iPhone_Air/home.png"), 1320, 2868);
        write_png(&framed.join("en/iPhone_Air/details.png"), 1000, 1000);
        Self {
            _tmp: tmp,
            raw,
            framed,
            review,
        }
    }

    fn generate(&self) -> shots_review::generate::GenerateResult {
        let req = GenerateRequest::new(&self.framed, &self.review).with_raw_dir(&self.raw);
        generate(&req, &RustProbe::new()).unwrap()
    }

    fn approve(&self, selector: Selector) -> shots_review::approve::ApproveResult {
        approve(&ApproveRequest::new(&self.review, selector)).unwrap()
    }

    fn manifest(&self) -> ReviewManifest {
        let json = fs::read_to_string(self.review.join("manifest.json")).unwrap();
        serde_json::from_str(&json).unwrap()
    }
}

fn all_ready() -> Selector {
    Selector::from_flags(true, None, None, None, None)
}

struct NeverLaunch;

impl Launcher for NeverLaunch {
    fn launch(&self, path: &Path) -> io::Result<()> {
        panic!("launcher called for {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn worked_example_counts() {
    let ws = Workspace::new();
    fs::create_dir_all(&ws.review).unwrap();
    fs::write(ws.review.join("approved.json"), r#"["en|iPhone_Air|home"]"#).unwrap();

    let result = ws.generate();
    assert_eq!(
        (
            result.total,
            result.ready,
            result.missing_raw,
            result.invalid_size,
            result.approved,
            result.pending
        ),
        (2, 1, 1, 1, 1, 1)
    );

    let manifest = ws.manifest();
    assert_eq!(manifest.summary.total, manifest.entries.len());
    assert_eq!(
        manifest.summary.pending_approval,
        manifest.summary.total - manifest.summary.approved
    );
}

#[test]
fn approve_then_regenerate_reflects_ledger() {
    let ws = Workspace::new();
    let first = ws.generate();
    assert_eq!(first.approved, 0);

    let approved = ws.approve(all_ready());
    assert_eq!(approved.matched, first.ready);
    assert_eq!(approved.keys.len(), 1);
    assert_eq!(approved.keys[0].as_str(), "en|iPhone_Air|home");

    let second = ws.generate();
    assert_eq!(second.approved, 1);
    assert_eq!(second.pending, 1);
    let home = ws
        .manifest()
        .entries
        .into_iter()
        .find(|e| e.key.as_str() == "en|iPhone_Air|home")
        .unwrap();
    assert!(home.approved);
    assert_eq!(home.status, ReviewStatus::Ready);
}

#[test]
fn approve_all_ready_is_idempotent() {
    let ws = Workspace::new();
    ws.generate();

    let first = ws.approve(all_ready());
    let ledger_bytes = fs::read(&first.approval_path).unwrap();
    let second = ws.approve(all_ready());

    assert_eq!(second.added, 0);
    assert_eq!(second.matched, first.matched);
    assert_eq!(second.total_approved, first.total_approved);
    assert_eq!(fs::read(&second.approval_path).unwrap(), ledger_bytes);
}

#[test]
fn approve_locale_and_device_includes_non_ready() {
    let ws = Workspace::new();
    ws.generate();

    let result = ws.approve(Selector::from_flags(
        false,
        None,
        None,
        Some("en"),
        Some("iPhone_Air"),
    ));
    assert_eq!(result.matched, 2);

    let ledger = ApprovalLedger::load(&result.approval_path).unwrap();
    let keys: Vec<&str> = ledger.iter().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["en|iPhone_Air|details", "en|iPhone_Air|home"]);
}

#[test]
fn approving_before_generate_fails() {
    let ws = Workspace::new();
    let err = approve(&ApproveRequest::new(&ws.review, all_ready())).unwrap_err();
    assert!(err.to_string().contains("manifest.json"));
}

#[test]
fn open_dry_run_after_generate() {
    let ws = Workspace::new();
    let generated = ws.generate();

    let result = open_review(
        &OpenRequest {
            output_dir: ws.review.clone(),
            html_path: None,
            dry_run: true,
        },
        &NeverLaunch,
    )
    .unwrap();
    assert!(!result.opened);
    assert!(result.html_path.is_absolute());
    assert_eq!(result.html_path, generated.html_path);
}

#[test]
fn report_references_both_images() {
    let ws = Workspace::new();
    let result = ws.generate();

    let html = fs::read_to_string(&result.html_path).unwrap();
    assert!(html.contains("raw/home.png"));
    assert!(html.contains("framed/en/iPhone_Air/details.png"));
    assert!(html.contains("No raw capture"));
}
