//! Output formatting for the installer CLI.
//!
//! Progress and summary lines go to stderr. This module holds the shared
//! writer helper together with the success and dry-run texts.

use crate::pipeline::ReleasePlan;
use camino::Utf8Path;
use std::io::Write;

/// Write a line to stderr, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after the archive has been placed.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use stage3_installer::output::success_message;
///
/// let msg = success_message(Utf8Path::new("/mnt/gentoo/stage3.tar.xz"), false);
/// assert!(msg.contains("/mnt/gentoo/stage3.tar.xz"));
/// ```
#[must_use]
pub fn success_message(archive: &Utf8Path, extracted: bool) -> String {
    if extracted {
        let target = archive.parent().unwrap_or(archive);
        format!("Verified archive extracted into {target}")
    } else {
        format!("Verified archive ready at {archive}")
    }
}

/// Information shown by `--dry-run`.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Directory index that was searched.
    pub mirror_url: &'a str,
    /// Archive family being selected.
    pub archive_family: String,
    /// Download directory.
    pub work_dir: &'a Utf8Path,
    /// Installation target.
    pub target_dir: &'a Utf8Path,
    /// Whether extraction was requested.
    pub extract: bool,
    /// The discovered release.
    pub plan: &'a ReleasePlan,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be downloaded".to_owned(),
            String::new(),
            format!("Mirror: {}", self.mirror_url),
            format!("Archive family: {}", self.archive_family),
            format!("Working directory: {}", self.work_dir),
            format!("Target directory: {}", self.target_dir),
            format!("Extract: {}", self.extract),
            String::new(),
            format!("Latest release: {}", self.plan.folder),
            format!("Release URL: {}", self.plan.folder_url),
            String::new(),
            "Files to download:".to_owned(),
        ];
        for entry in self.plan.files.iter() {
            lines.push(format!("  - {}", entry.name()));
        }
        lines.join("\n")
    }
}
