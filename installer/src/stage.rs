//! Placement of the verified archive into the installation target.
//!
//! This is the only step that writes to the target directory. It runs after
//! verification, so a failed run never leaves files there.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::fs;

/// Name of the probe file used to test target writability.
const WRITE_PROBE: &str = ".stage3-installer-probe";

/// A local archive whose detached signature has been confirmed.
///
/// Values are only created by [`place_archive`], which the pipeline calls
/// after a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArchive {
    path: Utf8PathBuf,
}

impl VerifiedArchive {
    /// Return the archive's location inside the target directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Consume the handle and return the path.
    #[must_use]
    pub fn into_path(self) -> Utf8PathBuf {
        self.path
    }
}

impl fmt::Display for VerifiedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

/// Check that `target_dir` exists and accepts new files.
///
/// # Errors
///
/// Returns [`InstallerError::TargetNotWritable`] if the directory is missing
/// or a probe file cannot be created in it.
pub fn ensure_writable(target_dir: &Utf8Path) -> Result<()> {
    if !target_dir.is_dir() {
        return Err(InstallerError::TargetNotWritable {
            path: target_dir.to_owned(),
            reason: "not a directory".to_owned(),
        });
    }

    let probe = target_dir.join(WRITE_PROBE);
    match fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(e) => Err(InstallerError::TargetNotWritable {
            path: target_dir.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Check that downloads into `work_dir` cannot touch `target_dir`.
///
/// Both paths are compared after resolving symlinks and `..` through their
/// longest existing ancestor, so a work directory that does not exist yet is
/// still caught.
///
/// # Errors
///
/// Returns [`InstallerError::WorkDirInsideTarget`] when `work_dir` is
/// `target_dir` or one of its descendants.
pub fn ensure_outside_target(work_dir: &Utf8Path, target_dir: &Utf8Path) -> Result<()> {
    let work = resolve(work_dir);
    let target = resolve(target_dir);
    if work.starts_with(&target) {
        return Err(InstallerError::WorkDirInsideTarget {
            work_dir: work_dir.to_owned(),
            target_dir: target_dir.to_owned(),
        });
    }
    Ok(())
}

/// Canonicalise the longest existing ancestor of `path` and re-append the
/// rest.
fn resolve(path: &Utf8Path) -> Utf8PathBuf {
    for ancestor in path.ancestors() {
        let Ok(real) = ancestor.canonicalize_utf8() else {
            continue;
        };
        return match path.strip_prefix(ancestor) {
            Ok(rest) if !rest.as_str().is_empty() => real.join(rest),
            _ => real,
        };
    }
    path.to_owned()
}

/// Move a verified archive from `work_dir` into `target_dir`.
///
/// A rename is attempted first; across filesystems the archive is copied and
/// the original removed.
///
/// # Errors
///
/// Returns [`InstallerError::TargetNotWritable`] when the target cannot accept
/// files and [`InstallerError::StagingFailed`] when the move itself fails.
pub(crate) fn place_archive(
    work_dir: &Utf8Path,
    archive_name: &str,
    target_dir: &Utf8Path,
) -> Result<VerifiedArchive> {
    ensure_writable(target_dir)?;

    let source = work_dir.join(archive_name);
    let dest = target_dir.join(archive_name);

    if let Err(rename_err) = fs::rename(&source, &dest) {
        debug!("rename {source} -> {dest} failed ({rename_err}), copying instead");
        copy_then_remove(&source, &dest)?;
    }

    info!("placed verified archive at {dest}");
    Ok(VerifiedArchive { path: dest })
}

fn copy_then_remove(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    if let Err(e) = fs::copy(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(InstallerError::StagingFailed {
            reason: format!("failed to copy {source} to {dest}: {e}"),
        });
    }
    fs::remove_file(source).map_err(|e| InstallerError::StagingFailed {
        reason: format!("failed to remove {source} after copying: {e}"),
    })
}
