//! Handoff of the verified archive to `tar`.
//!
//! Extraction is opt-in. The archive is unpacked in place, preserving
//! permissions, extended attributes, and numeric ownership, and removed once
//! `tar` succeeds.

use crate::command::{CommandExecutor, SystemCommandExecutor, run_checked};
use crate::error::Result;
use crate::stage::VerifiedArchive;
use camino::Utf8Path;
use log::info;
use std::fs;
use std::time::Duration;

/// Program used to unpack stage archives.
pub const TAR_PROGRAM: &str = "tar";

/// Wall-clock budget for unpacking a stage archive (2 hours).
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Executor for `tar`, allowing for slow disks on a full stage unpack.
#[must_use]
pub fn extraction_executor() -> SystemCommandExecutor {
    SystemCommandExecutor::with_timeout(EXTRACT_TIMEOUT)
}

/// Build the `tar` argument list for unpacking `archive` into `target_dir`.
#[must_use]
pub fn tar_arguments<'a>(archive: &'a Utf8Path, target_dir: &'a Utf8Path) -> Vec<&'a str> {
    vec![
        "xpf",
        archive.as_str(),
        "--xattrs-include=*.*",
        "--numeric-owner",
        "-C",
        target_dir.as_str(),
    ]
}

/// Unpack a verified archive into `target_dir` and delete the archive.
///
/// # Errors
///
/// Returns [`crate::error::InstallerError::CommandFailed`] when `tar` exits
/// non-zero (the archive is kept), timeout or spawn errors from the executor,
/// and I/O errors if the archive cannot be removed afterwards.
pub fn extract_archive(
    executor: &dyn CommandExecutor,
    archive: VerifiedArchive,
    target_dir: &Utf8Path,
) -> Result<()> {
    let path = archive.into_path();
    run_checked(executor, TAR_PROGRAM, &tar_arguments(&path, target_dir))?;
    info!("unpacked {path} into {target_dir}");
    fs::remove_file(&path)?;
    Ok(())
}
