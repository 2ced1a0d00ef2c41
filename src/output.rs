//! Text rendering of command results.
//!
//! The default output is JSON (the result structs serialize directly). With
//! `--format text` the binary prints these renderings instead.
//!
//! # Output Format
//!
//! ## review-generate
//!
//! ```text
//! Review generated
//!     Manifest: /work/screenshots/review/manifest.json
//!     Report: /work/screenshots/review/index.html
//! 2 screenshots: 1 ready, 1 missing raw, 1 invalid size
//! 1 approved, 1 pending
//! ```
//!
//! ## review-approve
//!
//! ```text
//! Approved 1 new (2 matched, 3 total)
//!     en|iPhone_Air|details
//!     Ledger: /work/screenshots/review/approved.json
//! ```
//!
//! ## list-devices
//!
//! ```text
//! iPhone_Air (default)
//!     1260×2736
//!     1320×2868
//! ```
//!
//! Each command has a `format_*` function returning lines and a `print_*`
//! wrapper that writes them to stdout. Format functions do no I/O.

use crate::approve::ApproveResult;
use crate::config::{DEFAULT_DEVICE, DeviceTable};
use crate::generate::GenerateResult;
use crate::open::OpenResult;
use serde::Serialize;

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Serialize a result for stdout, compact or indented.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

// ============================================================================
// review-generate
// ============================================================================

pub fn format_generate_result(result: &GenerateResult) -> Vec<String> {
    vec![
        "Review generated".to_string(),
        format!("{}Manifest: {}", indent(1), result.manifest_path.display()),
        format!("{}Report: {}", indent(1), result.html_path.display()),
        format!(
            "{}: {} ready, {} missing raw, {} invalid size",
            plural(result.total, "screenshot", "screenshots"),
            result.ready,
            result.missing_raw,
            result.invalid_size
        ),
        format!("{} approved, {} pending", result.approved, result.pending),
    ]
}

pub fn print_generate_result(result: &GenerateResult) {
    print_lines(format_generate_result(result));
}

// ============================================================================
// review-approve
// ============================================================================

pub fn format_approve_result(result: &ApproveResult) -> Vec<String> {
    let counts = format!("{} matched, {} total", result.matched, result.total_approved);
    let mut lines = if result.added == 0 {
        vec![format!("Nothing new to approve ({counts})")]
    } else {
        vec![format!("Approved {} new ({counts})", result.added)]
    };
    lines.extend(result.keys.iter().map(|k| format!("{}{k}", indent(1))));
    lines.push(format!("{}Ledger: {}", indent(1), result.approval_path.display()));
    lines
}

pub fn print_approve_result(result: &ApproveResult) {
    print_lines(format_approve_result(result));
}

// ============================================================================
// review-open
// ============================================================================

pub fn format_open_result(result: &OpenResult) -> Vec<String> {
    if result.opened {
        vec![format!("Opened {}", result.html_path.display())]
    } else {
        vec![format!("Would open {} (dry run)", result.html_path.display())]
    }
}

pub fn print_open_result(result: &OpenResult) {
    print_lines(format_open_result(result));
}

// ============================================================================
// list-devices
// ============================================================================

/// `list-devices` result: the table plus the device assumed when none is named.
#[derive(Debug, Serialize)]
pub struct DeviceList<'a> {
    pub default: &'static str,
    pub devices: &'a DeviceTable,
}

impl<'a> DeviceList<'a> {
    pub fn new(devices: &'a DeviceTable) -> Self {
        Self {
            default: DEFAULT_DEVICE,
            devices,
        }
    }
}

pub fn format_devices(list: &DeviceList) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, spec) in list.devices {
        if name == list.default {
            lines.push(format!("{name} (default)"));
        } else {
            lines.push(name.clone());
        }
        for [w, h] in &spec.sizes {
            lines.push(format!("{}{w}×{h}", indent(1)));
        }
    }
    lines
}

pub fn print_devices(list: &DeviceList) {
    print_lines(format_devices(list));
}
