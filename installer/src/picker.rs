//! Release file selection.
//!
//! File-mode index entries are classified into payload archives and detached
//! signatures. Every entry is downloaded; the split only matters when the
//! verifier later pairs signatures with archives.

use crate::error::{InstallerError, Result};
use crate::naming::{ArchiveNaming, CandidateFile};

/// The distributable files listed in one release folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFiles {
    entries: Vec<CandidateFile>,
}

impl ReleaseFiles {
    /// Classify file-mode entries, preserving listing order.
    ///
    /// `url` is the release folder the entries were listed from and is only
    /// used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoArchivesFound`] when `entries` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use stage3_installer::naming::ArchiveNaming;
    /// use stage3_installer::picker::ReleaseFiles;
    ///
    /// let entries = vec![
    ///     "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz".to_owned(),
    ///     "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc".to_owned(),
    /// ];
    /// let files = ReleaseFiles::from_entries(entries, &ArchiveNaming::default(), "https://m.test/")?;
    /// assert_eq!(files.archives().count(), 1);
    /// assert_eq!(files.signatures().count(), 1);
    /// # Ok::<(), stage3_installer::error::InstallerError>(())
    /// ```
    pub fn from_entries(entries: Vec<String>, naming: &ArchiveNaming, url: &str) -> Result<Self> {
        if entries.is_empty() {
            return Err(InstallerError::NoArchivesFound {
                url: url.to_owned(),
            });
        }
        Ok(Self {
            entries: entries.iter().map(|name| naming.classify(name)).collect(),
        })
    }

    /// Iterate over every listed file in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateFile> {
        self.entries.iter()
    }

    /// Iterate over payload archive names.
    pub fn archives(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            CandidateFile::Archive(name) => Some(name.as_str()),
            CandidateFile::Signature(_) => None,
        })
    }

    /// Iterate over signature names.
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            CandidateFile::Signature(name) => Some(name.as_str()),
            CandidateFile::Archive(_) => None,
        })
    }

    /// Return the number of listed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether no files are listed. Always false once constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the archive certified by a signature file name.
///
/// ```
/// use stage3_installer::naming::ArchiveNaming;
/// use stage3_installer::picker::archive_name_from_signature;
///
/// let naming = ArchiveNaming::default();
/// assert_eq!(archive_name_from_signature("a.tar.xz.asc", &naming), "a.tar.xz");
/// ```
#[must_use]
pub fn archive_name_from_signature<'a>(signature: &'a str, naming: &ArchiveNaming) -> &'a str {
    naming.archive_name_from_signature(signature)
}
