//! Detached signature verification.
//!
//! Verification is delegated to an external program (GnuPG by default) run
//! through [`CommandExecutor`]. Exit status zero means the archive is
//! authentic; anything else is a hard failure.

use crate::command::{CommandExecutor, failure_message};
use crate::error::{InstallerError, Result};
use crate::naming::ArchiveNaming;
use camino::Utf8Path;
use log::{debug, info};
use serde::Deserialize;
use std::fs;

/// Default verifier program.
pub const DEFAULT_VERIFIER_PROGRAM: &str = "gpg";

/// The external program used to check a detached signature.
///
/// The signature path is appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierCommand {
    /// Program to execute.
    pub program: String,
    /// Leading arguments placed before the signature path.
    pub args: Vec<String>,
}

impl VerifierCommand {
    /// Build the argument list for verifying `signature`.
    #[must_use]
    pub fn arguments_for<'a>(&'a self, signature: &'a str) -> Vec<&'a str> {
        self.args
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(signature))
            .collect()
    }
}

impl Default for VerifierCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_VERIFIER_PROGRAM.to_owned(),
            args: vec!["--verify".to_owned()],
        }
    }
}

/// Result of a successful verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The named archive matched its detached signature.
    Verified {
        /// File name of the certified archive inside the working directory.
        archive_name: String,
    },
}

impl VerificationOutcome {
    /// Return the certified archive name.
    #[must_use]
    pub fn archive_name(&self) -> &str {
        match self {
            Self::Verified { archive_name } => archive_name,
        }
    }
}

/// Verify the downloaded release files in `work_dir`.
///
/// `downloaded` lists the base names of every file fetched into `work_dir`.
/// On success the signature file is removed and the certified archive name is
/// returned. On failure every file is left in place.
///
/// # Errors
///
/// - [`InstallerError::NoSignatureFound`] when no signature was downloaded.
/// - [`InstallerError::AmbiguousVerification`] when several signatures and
///   several archives were downloaded.
/// - [`InstallerError::UnpairedSignature`] when the chosen signature
///   certifies an archive that was not downloaded.
/// - [`InstallerError::VerificationFailed`] when the verifier exits non-zero.
/// - [`InstallerError::Io`] when the verified signature cannot be removed.
/// - Spawn and timeout errors from the executor.
pub fn verify_downloads(
    executor: &dyn CommandExecutor,
    verifier: &VerifierCommand,
    work_dir: &Utf8Path,
    downloaded: &[String],
    naming: &ArchiveNaming,
) -> Result<VerificationOutcome> {
    let signature = choose_signature(downloaded, naming)?;
    let archive_name = naming.archive_name_from_signature(signature);
    let signature_path = work_dir.join(signature);

    debug!("verifying {archive_name} with {signature_path}");
    let output = executor.run(
        &verifier.program,
        &verifier.arguments_for(signature_path.as_str()),
    )?;
    if !output.status.success() {
        return Err(InstallerError::VerificationFailed {
            file: signature.to_owned(),
            reason: failure_message(&output),
        });
    }

    info!("signature {signature} verified {archive_name}");
    fs::remove_file(&signature_path)?;

    Ok(VerificationOutcome::Verified {
        archive_name: archive_name.to_owned(),
    })
}

/// Pick the one signature to check, pairing it with a downloaded archive.
fn choose_signature<'a>(downloaded: &'a [String], naming: &ArchiveNaming) -> Result<&'a str> {
    let (signatures, archives): (Vec<&str>, Vec<&str>) = downloaded
        .iter()
        .map(String::as_str)
        .partition(|name| naming.is_signature(name));

    let chosen = match (signatures.as_slice(), archives.as_slice()) {
        ([], _) => return Err(InstallerError::NoSignatureFound),
        ([only], _) => *only,
        ([first, ..], [archive]) => signatures
            .iter()
            .copied()
            .find(|sig| naming.archive_name_from_signature(sig) == *archive)
            .unwrap_or(*first),
        ([first, ..], []) => *first,
        (many, several) => {
            return Err(InstallerError::AmbiguousVerification {
                signatures: many.len(),
                archives: several.len(),
            });
        }
    };

    let certified = naming.archive_name_from_signature(chosen);
    if !archives.contains(&certified) {
        return Err(InstallerError::UnpairedSignature {
            signature: chosen.to_owned(),
            archive: certified.to_owned(),
        });
    }
    Ok(chosen)
}
