//! Opening the HTML report.
//!
//! [`open_review`] resolves `<output_dir>/index.html` (or an explicit path),
//! insists that it exists, and hands it to a [`Launcher`]. In dry-run mode
//! the launcher is never called.

use crate::generate::HTML_FILENAME;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("--output-dir or --html-path is required")]
    NoTarget,
    #[error("review HTML not found: {0} (run review-generate first)")]
    NotFound(PathBuf),
    #[error("review HTML path is not a file: {0}")]
    NotAFile(PathBuf),
    #[error("resolve path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("open {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OpenError {
    pub fn is_usage(&self) -> bool {
        matches!(self, OpenError::NoTarget)
    }
}

/// Hands a file to whatever shows it to the user.
pub trait Launcher {
    fn launch(&self, path: &Path) -> io::Result<()>;
}

/// The platform's default-application opener: `open` on macOS,
/// `cmd /C start` on Windows, `xdg-open` elsewhere.
///
/// The opener's stdout is sent to stderr; stdout carries only the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn command(path: &Path) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        } else if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, path: &Path) -> io::Result<()> {
        let mut cmd = Self::command(path);
        cmd.stdin(Stdio::null()).stdout(io::stderr());
        tracing::debug!(command = ?cmd, "launching viewer");
        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {status}",
                cmd.get_program().to_string_lossy()
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub output_dir: PathBuf,
    /// Overrides `<output_dir>/index.html`.
    pub html_path: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenResult {
    /// Absolute path of the report.
    pub html_path: PathBuf,
    pub opened: bool,
}

pub fn open_review(req: &OpenRequest, launcher: &impl Launcher) -> Result<OpenResult, OpenError> {
    let html_path = resolve_html_path(&req.output_dir, req.html_path.as_deref())?;

    match std::fs::metadata(&html_path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(OpenError::NotAFile(html_path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OpenError::NotFound(html_path));
        }
        Err(source) => {
            return Err(OpenError::Resolve {
                path: html_path,
                source,
            });
        }
    }

    if req.dry_run {
        return Ok(OpenResult {
            html_path,
            opened: false,
        });
    }

    launcher
        .launch(&html_path)
        .map_err(|source| OpenError::Launch {
            path: html_path.clone(),
            source,
        })?;
    Ok(OpenResult {
        html_path,
        opened: true,
    })
}

/// Absolute report path: the explicit one, else `<output_dir>/index.html`.
pub fn resolve_html_path(output_dir: &Path, explicit: Option<&Path>) -> Result<PathBuf, OpenError> {
    let path = match explicit {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ if output_dir.as_os_str().is_empty() => return Err(OpenError::NoTarget),
        _ => output_dir.join(HTML_FILENAME),
    };
    std::path::absolute(&path).map_err(|source| OpenError::Resolve { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Records launches instead of spawning anything.
    #[derive(Default)]
    struct RecordingLauncher {
        launched: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, path: &Path) -> io::Result<()> {
            self.launched.borrow_mut().push(path.to_path_buf());
            if self.fail {
                Err(io::Error::other("no display"))
            } else {
                Ok(())
            }
        }
    }

    fn with_report() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(HTML_FILENAME), "<!DOCTYPE html>").unwrap();
        tmp
    }

    fn request(dir: &Path, dry_run: bool) -> OpenRequest {
        OpenRequest {
            output_dir: dir.to_path_buf(),
            html_path: None,
            dry_run,
        }
    }

    #[test]
    fn dry_run_resolves_without_launching() {
        let tmp = with_report();
        let launcher = RecordingLauncher::default();

        let result = open_review(&request(tmp.path(), true), &launcher).unwrap();
        assert!(!result.opened);
        assert!(result.html_path.is_absolute());
        assert_eq!(result.html_path, tmp.path().join(HTML_FILENAME));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn open_launches_resolved_path() {
        let tmp = with_report();
        let launcher = RecordingLauncher::default();

        let result = open_review(&request(tmp.path(), false), &launcher).unwrap();
        assert!(result.opened);
        assert_eq!(*launcher.launched.borrow(), vec![tmp.path().join(HTML_FILENAME)]);
    }

    #[test]
    fn launcher_failure_propagates() {
        let tmp = with_report();
        let launcher = RecordingLauncher {
            fail: true,
            ..Default::default()
        };

        let err = open_review(&request(tmp.path(), false), &launcher).unwrap_err();
        assert!(matches!(err, OpenError::Launch { .. }));
        assert!(err.to_string().contains(HTML_FILENAME));
    }

    #[test]
    fn missing_report_is_error_even_in_dry_run() {
        let tmp = TempDir::new().unwrap();
        let launcher = RecordingLauncher::default();

        let err = open_review(&request(tmp.path(), true), &launcher).unwrap_err();
        assert!(matches!(err, OpenError::NotFound(_)));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn explicit_html_path_wins() {
        let tmp = TempDir::new().unwrap();
        let custom = tmp.path().join("custom.html");
        fs::write(&custom, "x").unwrap();
        let req = OpenRequest {
            output_dir: tmp.path().join("unused"),
            html_path: Some(custom.clone()),
            dry_run: true,
        };

        let result = open_review(&req, &RecordingLauncher::default()).unwrap();
        assert_eq!(result.html_path, custom);
    }

    #[test]
    fn directory_is_not_a_report() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(HTML_FILENAME)).unwrap();

        let err = open_review(&request(tmp.path(), true), &RecordingLauncher::default())
            .unwrap_err();
        assert!(matches!(err, OpenError::NotAFile(_)));
    }

    #[test]
    fn no_target_is_usage_error() {
        let err = resolve_html_path(Path::new(""), None).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn relative_output_dir_becomes_absolute() {
        let path = resolve_html_path(Path::new("screenshots/review"), None).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("screenshots/review/index.html"));
    }
}
