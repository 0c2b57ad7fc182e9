//! Release discovery, download, and verification orchestration.
//!
//! [`ReleasePipeline`] walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> IndexFetched -> FolderSelected -> FilesListed -> Downloaded -> Verified -> Done
//! ```
//!
//! Any failure moves it to [`PipelineState::Failed`], recording the last stage
//! that completed, and returns the originating error. Nothing is written to
//! the target directory before the `Verified` stage has been reached.

use crate::command::CommandExecutor;
use crate::error::{InstallerError, Result};
use crate::fetch::{Fetched, RedirectFetcher};
use crate::index::{file_entries, folder_entries};
use crate::naming::ArchiveNaming;
use crate::output::write_stderr_line;
use crate::picker::ReleaseFiles;
use crate::release::select_latest;
use crate::stage::{VerifiedArchive, ensure_outside_target, place_archive};
use crate::verify::{VerifierCommand, verify_downloads};
use camino::Utf8PathBuf;
use log::debug;
use std::fmt;
use std::fs;
use std::io::Write;
use url::Url;

/// Default mirror directory holding timestamped release folders.
pub const DEFAULT_MIRROR_URL: &str = "https://distfiles.gentoo.org/releases/amd64/autobuilds/";

/// Default installation target directory.
pub const DEFAULT_TARGET_DIR: &str = "/mnt/gentoo";

/// A completed pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Idle,
    /// The root index page was retrieved and parsed.
    IndexFetched,
    /// The newest release folder was chosen.
    FolderSelected,
    /// The release folder's files were listed.
    FilesListed,
    /// Every listed file was downloaded to the working directory.
    Downloaded,
    /// A signature was checked against its archive.
    Verified,
    /// The verified archive was placed in the target directory.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::IndexFetched => "index fetched",
            Self::FolderSelected => "folder selected",
            Self::FilesListed => "files listed",
            Self::Downloaded => "downloaded",
            Self::Verified => "verified",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where a pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Running or finished successfully; holds the last completed stage.
    Active(Stage),
    /// Terminal failure.
    Failed {
        /// The last stage that completed before the failure.
        after: Stage,
    },
}

impl PipelineState {
    /// Return the last completed stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Active(stage) | Self::Failed { after: stage } => *stage,
        }
    }

    /// Return whether the pipeline has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Directory index listing timestamped release folders.
    pub mirror_url: Url,
    /// Archive family to select.
    pub naming: ArchiveNaming,
    /// Directory receiving downloads before verification.
    pub work_dir: Utf8PathBuf,
    /// Installation target receiving the verified archive.
    pub target_dir: Utf8PathBuf,
    /// External signature verifier.
    pub verifier: VerifierCommand,
    /// Suppress progress output.
    pub quiet: bool,
}

impl PipelineContext {
    /// Create a context with default naming and verifier.
    #[must_use]
    pub fn new(mirror_url: Url, work_dir: Utf8PathBuf, target_dir: Utf8PathBuf) -> Self {
        Self {
            mirror_url,
            naming: ArchiveNaming::default(),
            work_dir,
            target_dir,
            verifier: VerifierCommand::default(),
            quiet: false,
        }
    }
}

/// The release chosen for download, before anything touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Timestamp name of the newest release folder.
    pub folder: String,
    /// URL the folder listing was served from.
    pub folder_url: Url,
    /// Files to download from the folder.
    pub files: ReleaseFiles,
}

impl ReleasePlan {
    /// Resolve the download URL and local base name of every listed file.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidUrl`] when a listed href cannot be
    /// resolved against the folder URL.
    pub fn downloads(&self) -> Result<Vec<(Url, String)>> {
        self.files
            .iter()
            .map(|entry| {
                let href = entry.name();
                let url = self
                    .folder_url
                    .join(href)
                    .map_err(|e| InstallerError::InvalidUrl {
                        url: href.to_owned(),
                        reason: e.to_string(),
                    })?;
                Ok((url, local_name(href).to_owned()))
            })
            .collect()
    }
}

/// Drives one release discovery, download, and verification run.
pub struct ReleasePipeline<'a> {
    context: &'a PipelineContext,
    fetcher: &'a RedirectFetcher<'a>,
    executor: &'a dyn CommandExecutor,
    state: PipelineState,
}

impl<'a> ReleasePipeline<'a> {
    /// Create an idle pipeline.
    #[must_use]
    pub fn new(
        context: &'a PipelineContext,
        fetcher: &'a RedirectFetcher<'a>,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            context,
            fetcher,
            executor,
            state: PipelineState::Active(Stage::Idle),
        }
    }

    /// Return the current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Discover the newest release and list its files without downloading.
    ///
    /// Leaves the pipeline in [`Stage::FilesListed`] on success.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::IndexFetch`] when an index page cannot be
    /// retrieved, [`InstallerError::NoReleasesFound`] when the root index
    /// lists no release folders, and [`InstallerError::NoArchivesFound`] when
    /// the release folder lists no matching files.
    pub fn plan(&mut self, stderr: &mut dyn Write) -> Result<ReleasePlan> {
        self.state = PipelineState::Active(Stage::Idle);
        let context = self.context;

        self.progress(
            stderr,
            format!("Fetching release index from {}...", context.mirror_url),
        );
        let root = self.fetcher.fetch(&context.mirror_url);
        let root = self.advance(Stage::IndexFetched, root.map_err(InstallerError::from))?;
        let folders = folder_entries(&root.text());
        debug!("{} release folders listed at {}", folders.len(), root.final_url);

        let selected = select_latest(&folders, root.final_url.as_str())
            .and_then(|folder| folder_url(&root.final_url, &folder).map(|url| (folder, url)));
        let (folder, release_url) = self.advance(Stage::FolderSelected, selected)?;
        self.progress(stderr, format!("Latest release: {folder}"));

        let listing = self.list_files(&release_url);
        let (files, listed_at) = self.advance(Stage::FilesListed, listing)?;

        Ok(ReleasePlan {
            folder,
            folder_url: listed_at,
            files,
        })
    }

    /// Run every stage and return the verified archive in the target
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::WorkDirInsideTarget`] before any request when
    /// downloads would land in the target directory. Otherwise returns the
    /// error of the first failing stage; see [`Self::plan`],
    /// [`InstallerError::Download`], and the errors of
    /// [`verify_downloads`] and [`crate::stage::ensure_writable`].
    pub fn run(&mut self, stderr: &mut dyn Write) -> Result<VerifiedArchive> {
        let context = self.context;
        if let Err(err) = ensure_outside_target(&context.work_dir, &context.target_dir) {
            debug!("pipeline: refusing to start: {err}");
            self.state = PipelineState::Failed { after: Stage::Idle };
            return Err(err);
        }

        let plan = self.plan(stderr)?;

        let downloaded = self.download_all(&plan, stderr);
        let downloaded = self.advance(Stage::Downloaded, downloaded)?;

        self.progress(stderr, "Verifying signature...");
        let verified = verify_downloads(
            self.executor,
            &context.verifier,
            &context.work_dir,
            &downloaded,
            &context.naming,
        );
        let outcome = self.advance(Stage::Verified, verified)?;

        let placed = place_archive(
            &context.work_dir,
            outcome.archive_name(),
            &context.target_dir,
        );
        self.advance(Stage::Done, placed)
    }

    fn list_files(&self, folder_url: &Url) -> Result<(ReleaseFiles, Url)> {
        let Fetched { content, final_url } = self.fetcher.fetch(folder_url)?;
        let html = String::from_utf8_lossy(&content);
        let entries = file_entries(&html, &self.context.naming);
        debug!("{} candidate files listed at {final_url}", entries.len());
        let files = ReleaseFiles::from_entries(entries, &self.context.naming, final_url.as_str())?;
        Ok((files, final_url))
    }

    fn download_all(&self, plan: &ReleasePlan, stderr: &mut dyn Write) -> Result<Vec<String>> {
        let work_dir = &self.context.work_dir;
        fs::create_dir_all(work_dir)?;

        let mut downloaded = Vec::with_capacity(plan.files.len());
        for (url, name) in plan.downloads()? {
            self.progress(stderr, format!("Downloading {name}..."));
            self.fetcher
                .download_to(&url, work_dir.join(&name).as_std_path())
                .map_err(|source| InstallerError::Download {
                    name: name.clone(),
                    source,
                })?;
            downloaded.push(name);
        }
        Ok(downloaded)
    }

    /// Record the outcome of the step leading to `next`.
    fn advance<T>(&mut self, next: Stage, result: Result<T>) -> Result<T> {
        let from = self.state.stage();
        match result {
            Ok(value) => {
                debug!("pipeline: {from} -> {next}");
                self.state = PipelineState::Active(next);
                Ok(value)
            }
            Err(err) => {
                debug!("pipeline: failed after {from}: {err}");
                self.state = PipelineState::Failed { after: from };
                Err(err)
            }
        }
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl fmt::Display) {
        if !self.context.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Resolve a release folder against the index it was listed on.
///
/// The index URL is treated as a directory even when the server dropped the
/// trailing slash.
fn folder_url(index_url: &Url, folder: &str) -> Result<Url> {
    let mut base = index_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("{folder}/"))
        .map_err(|e| InstallerError::InvalidUrl {
            url: folder.to_owned(),
            reason: e.to_string(),
        })
}

/// Return the final path segment of an href.
fn local_name(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
