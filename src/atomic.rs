//! Temp-file-then-rename writes.
//!
//! Every artifact the pipeline produces (`manifest.json`, `index.html`,
//! `approved.json`) is written through [`write_atomic`]. The bytes land in a
//! temp file next to the destination, are flushed to disk, and only then
//! renamed over the target. A reader sees either the old file or the new
//! one, and a crash mid-write leaves the old one in place.
//!
//! The destination is never a symlink or a directory: both are refused
//! before anything is written.
//!
//! Artifacts that belong together are staged first with [`stage`] and only
//! committed once every one of them has been written to its temp file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtomicWriteError {
    #[error("create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refusing to overwrite symlink {0}")]
    Symlink(PathBuf),
    #[error("output path {0} is a directory")]
    IsDirectory(PathBuf),
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Atomically replace `path` with `contents`, creating parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AtomicWriteError> {
    stage(path, contents)?.commit()
}

/// Contents flushed to a temp file beside their destination, not yet visible.
/// Dropping it without [`StagedWrite::commit`] removes the temp file.
#[derive(Debug)]
pub struct StagedWrite {
    tmp: tempfile::NamedTempFile,
    path: PathBuf,
}

impl StagedWrite {
    /// Rename the temp file over the destination.
    pub fn commit(self) -> Result<(), AtomicWriteError> {
        let path = self.path;
        self.tmp
            .persist(&path)
            .map_err(|e| AtomicWriteError::Write {
                path: path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

/// Check the destination and write `contents` to a synced temp file next to
/// it. Nothing at `path` changes until the returned write is committed.
pub fn stage(path: &Path, contents: &[u8]) -> Result<StagedWrite, AtomicWriteError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| AtomicWriteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(AtomicWriteError::Symlink(path.to_path_buf()));
        }
        Ok(meta) if meta.is_dir() => {
            return Err(AtomicWriteError::IsDirectory(path.to_path_buf()));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(AtomicWriteError::Write {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let write_err = |source: io::Error| AtomicWriteError::Write {
        path: path.to_path_buf(),
        source,
    };

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string())
    );
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;

    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    Ok(StagedWrite {
        tmp,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn writes_new_file_and_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("review/nested/manifest.json");

        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(leftovers(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("approved.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[test]
    fn refuses_directory_destination() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.html");
        fs::create_dir(&path).unwrap();

        let err = write_atomic(&path, b"x").unwrap_err();
        assert!(matches!(err, AtomicWriteError::IsDirectory(_)));
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[test]
    fn staged_write_is_invisible_until_commit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        fs::write(&path, "old").unwrap();

        let staged = stage(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(leftovers(tmp.path()).len(), 1);

        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[test]
    fn dropped_stage_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.html");

        drop(stage(&path, b"<html>").unwrap());
        assert!(!path.exists());
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_symlink_destination() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("elsewhere.json");
        fs::write(&target, "keep").unwrap();
        let link = tmp.path().join("approved.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = write_atomic(&link, b"x").unwrap_err();
        assert!(matches!(err, AtomicWriteError::Symlink(_)));
        assert_eq!(fs::read_to_string(&target).unwrap(), "keep");
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");

        write_atomic(&path, b"{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
