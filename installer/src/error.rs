//! Error types for the stage3 installer.
//!
//! This module defines the pipeline-level error variants. Each variant carries
//! enough context (URL, file name, underlying status) for an operator to
//! diagnose a failed run without re-running it with extra logging.

use crate::fetch::FetchError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, downloading, and verifying a
/// release archive.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A directory index page could not be retrieved.
    #[error("failed to fetch directory index: {0}")]
    IndexFetch(#[from] FetchError),

    /// The root index page listed no timestamp-named release folders.
    #[error("no release folders found at {url}")]
    NoReleasesFound {
        /// The index URL that was searched.
        url: String,
    },

    /// The release folder listed no files matching the archive convention.
    #[error("no stage3 archives found at {url}")]
    NoArchivesFound {
        /// The release folder URL that was searched.
        url: String,
    },

    /// A release file could not be downloaded.
    #[error("failed to download {name}: {source}")]
    Download {
        /// Base name of the file being downloaded.
        name: String,
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// None of the downloaded files is a detached signature.
    #[error("no signature file found among the downloaded files")]
    NoSignatureFound,

    /// The external verifier rejected a signature.
    #[error("file failed verification: {file}: {reason}")]
    VerificationFailed {
        /// The signature file that failed verification.
        file: String,
        /// Verifier diagnostics (captured stderr or exit status).
        reason: String,
    },

    /// Several signatures and several archives were downloaded, so the pairing
    /// between them cannot be decided.
    #[error(
        "ambiguous verification: {signatures} signatures and {archives} archives downloaded"
    )]
    AmbiguousVerification {
        /// Number of downloaded signature files.
        signatures: usize,
        /// Number of downloaded archive files.
        archives: usize,
    },

    /// A signature certifies an archive that was not downloaded.
    #[error("signature {signature} certifies {archive}, which was not downloaded")]
    UnpairedSignature {
        /// The signature file name.
        signature: String,
        /// The archive name derived from the signature.
        archive: String,
    },

    /// A URL could not be parsed or resolved.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL or reference.
        url: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// The installation target directory exists but is not writable.
    #[error("target directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Moving the verified archive into the target directory failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// Downloads would land inside the installation target.
    #[error("working directory {work_dir} lies inside target {target_dir}; choose another --work-dir")]
    WorkDirInsideTarget {
        /// The download directory.
        work_dir: Utf8PathBuf,
        /// The installation target.
        target_dir: Utf8PathBuf,
    },

    /// An external command exited unsuccessfully.
    #[error("{command} failed: {message}")]
    CommandFailed {
        /// The program that was run.
        command: String,
        /// Captured stderr or exit status.
        message: String,
    },

    /// An external command exceeded its wall-clock budget and was killed.
    #[error("{command} timed out after {seconds} seconds")]
    CommandTimedOut {
        /// The program that was run.
        command: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
