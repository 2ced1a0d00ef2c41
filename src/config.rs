//! Review configuration.
//!
//! Handles loading, validating, and merging `review.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names.
//!
//! ## Config File Location
//!
//! `./review.toml` unless `--config` points elsewhere. A missing file means
//! stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! raw_dir = "screenshots/raw"          # Raw captures, joined on screenshot id
//! framed_dir = "screenshots/framed"    # <locale>/<device>/<id>.png
//! output_dir = "screenshots/review"    # manifest.json, index.html, approved.json
//!
//! [processing]
//! max_processes = 4                    # Probe workers (omit for auto = CPU cores)
//!
//! [devices.iPhone_Air]
//! sizes = [[1260, 2736], [1320, 2868]] # Accepted framed sizes when no raw exists
//! ```
//!
//! ## Device Table
//!
//! `[devices.<name>]` keys match the device directory names under the framed
//! root. When a framed screenshot has no raw counterpart, its size is checked
//! against this table instead; an unlisted device can't be confirmed and is
//! reported as `invalid_size`. User tables merge into the stock one, so a
//! config only needs to add or override the devices it cares about.
//!
//! The library never reads this file itself. The binary resolves it and
//! passes explicit paths and tables into the pipeline.

use crate::imaging::Dimensions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "review.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `review.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewConfig {
    /// Default directories for the three review commands.
    pub paths: PathsConfig,
    /// Parallel probing settings.
    pub processing: ProcessingConfig,
    /// Accepted framed sizes per device directory name.
    #[serde(default = "default_devices")]
    pub devices: DeviceTable,
}

impl ReviewConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, dir) in [
            ("paths.raw_dir", &self.paths.raw_dir),
            ("paths.framed_dir", &self.paths.framed_dir),
            ("paths.output_dir", &self.paths.output_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        for (device, spec) in &self.devices {
            if spec.sizes.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "devices.{device}.sizes must not be empty"
                )));
            }
            if spec.sizes.iter().any(|[w, h]| *w == 0 || *h == 0) {
                return Err(ConfigError::Validation(format!(
                    "devices.{device}.sizes values must be non-zero"
                )));
            }
        }
        Ok(())
    }
}

/// Default directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub framed_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("screenshots/raw"),
            framed_dir: PathBuf::from("screenshots/framed"),
            output_dir: PathBuf::from("screenshots/review"),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel probe workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Accepted output sizes for one device class, as `[width, height]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSpec {
    pub sizes: Vec<[u32; 2]>,
}

impl DeviceSpec {
    pub fn new(sizes: &[[u32; 2]]) -> Self {
        Self {
            sizes: sizes.to_vec(),
        }
    }

    pub fn accepts(&self, dims: Dimensions) -> bool {
        self.sizes
            .iter()
            .any(|[w, h]| *w == dims.width && *h == dims.height)
    }
}

/// Device directory name → accepted sizes.
pub type DeviceTable = BTreeMap<String, DeviceSpec>;

/// The device a framed tree is assumed to target when none is named.
pub const DEFAULT_DEVICE: &str = "iPhone_Air";

/// Stock device table: current App Store screenshot classes.
pub fn default_devices() -> DeviceTable {
    [
        ("iPhone_Air", &[[1260, 2736], [1320, 2868]][..]),
        ("iPhone_17_Pro_Max", &[[1320, 2868]][..]),
        ("iPhone_17_Pro", &[[1206, 2622]][..]),
        ("iPhone_17", &[[1206, 2622]][..]),
        ("iPhone_16e", &[[1170, 2532]][..]),
        ("iPad_Pro_13", &[[2064, 2752]][..]),
        ("iPad_Pro_11", &[[1668, 2420]][..]),
        ("Mac", &[[2880, 1800], [2560, 1600], [1440, 900], [1280, 800]][..]),
    ]
    .into_iter()
    .map(|(name, sizes)| (name.to_string(), DeviceSpec::new(sizes)))
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    let config = ReviewConfig {
        devices: default_devices(),
        ..ReviewConfig::default()
    };
    // Only PathBuf, integers and string-keyed maps: always representable.
    toml::Value::try_from(config).unwrap_or_else(|_| toml::Value::Table(Default::default()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ReviewConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ReviewConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults.
///
/// Anything wrong after the merge came from the user file, so errors name it.
pub fn load_config(path: &Path) -> Result<ReviewConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay).map_err(|err| match err {
        ConfigError::Toml(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ConfigError::Validation(msg) => {
            ConfigError::Validation(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Returns a fully-commented stock `review.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Screenshot Review Configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[paths]
# Raw simulator captures, one <screenshot_id>.png per screenshot.
raw_dir = "screenshots/raw"

# Framed screenshots laid out as <locale>/<device>/<screenshot_id>.png.
framed_dir = "screenshots/framed"

# Where manifest.json, index.html and approved.json are written.
output_dir = "screenshots/review"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-probe workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Devices
# ---------------------------------------------------------------------------
# Accepted [width, height] pairs per device directory name. Used only when a
# framed screenshot has no raw counterpart to compare against. Tables here
# are merged with these stock entries.
[devices.iPhone_Air]
sizes = [[1260, 2736], [1320, 2868]]

[devices.iPhone_17_Pro_Max]
sizes = [[1320, 2868]]

[devices.iPhone_17_Pro]
sizes = [[1206, 2622]]

[devices.iPhone_17]
sizes = [[1206, 2622]]

[devices.iPhone_16e]
sizes = [[1170, 2532]]

[devices.iPad_Pro_13]
sizes = [[2064, 2752]]

[devices.iPad_Pro_11]
sizes = [[1668, 2420]]

[devices.Mac]
sizes = [[2880, 1800], [2560, 1600], [1440, 900], [1280, 800]]
"##
}
