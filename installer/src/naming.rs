//! Archive naming convention for stage3 release files.
//!
//! Every release folder publishes payload archives named
//! `<prefix>-<timestamp><payload suffix>` and, for each of them, a detached
//! signature named by appending the signature suffix to the archive name:
//! `stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc`.

use serde::Deserialize;
use std::fmt;

/// Default archive family published by the autobuild mirrors.
pub const DEFAULT_ARCHIVE_PREFIX: &str = "stage3-amd64-hardened-openrc";

/// Default payload suffix.
pub const DEFAULT_PAYLOAD_SUFFIX: &str = ".tar.xz";

/// Default detached-signature suffix.
pub const DEFAULT_SIGNATURE_SUFFIX: &str = ".asc";

/// The naming convention used to recognise release files.
///
/// # Examples
///
/// ```
/// use stage3_installer::naming::ArchiveNaming;
///
/// let naming = ArchiveNaming::default();
/// assert!(naming.matches("stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz"));
/// assert!(naming.matches("stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc"));
/// assert!(!naming.matches("stage3-amd64-openrc-20240601T120000Z.tar.xz"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveNaming {
    /// Fixed name prefix shared by the archive family.
    pub prefix: String,
    /// Suffix of payload archives.
    pub payload_suffix: String,
    /// Suffix appended to an archive name to form its signature name.
    pub signature_suffix: String,
}

impl ArchiveNaming {
    /// Return whether `name` belongs to the archive family and carries either
    /// the payload or the signature suffix.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
            && (name.ends_with(&self.payload_suffix) || name.ends_with(&self.signature_suffix))
    }

    /// Return whether `name` is a detached signature.
    #[must_use]
    pub fn is_signature(&self, name: &str) -> bool {
        name.ends_with(&self.signature_suffix)
    }

    /// Derive the archive name certified by a signature file.
    ///
    /// Names without the signature suffix are returned unchanged.
    ///
    /// ```
    /// use stage3_installer::naming::ArchiveNaming;
    ///
    /// let naming = ArchiveNaming::default();
    /// assert_eq!(
    ///     naming.archive_name_from_signature(
    ///         "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc"
    ///     ),
    ///     "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz"
    /// );
    /// ```
    #[must_use]
    pub fn archive_name_from_signature<'a>(&self, signature: &'a str) -> &'a str {
        signature
            .strip_suffix(self.signature_suffix.as_str())
            .unwrap_or(signature)
    }

    /// Derive the signature name for an archive.
    #[must_use]
    pub fn signature_name_for(&self, archive: &str) -> String {
        format!("{archive}{}", self.signature_suffix)
    }

    /// Classify a matching file name.
    #[must_use]
    pub fn classify(&self, name: &str) -> CandidateFile {
        if self.is_signature(name) {
            CandidateFile::Signature(name.to_owned())
        } else {
            CandidateFile::Archive(name.to_owned())
        }
    }
}

impl Default for ArchiveNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ARCHIVE_PREFIX.to_owned(),
            payload_suffix: DEFAULT_PAYLOAD_SUFFIX.to_owned(),
            signature_suffix: DEFAULT_SIGNATURE_SUFFIX.to_owned(),
        }
    }
}

impl fmt::Display for ArchiveNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}*{{{},{}}}",
            self.prefix, self.payload_suffix, self.signature_suffix
        )
    }
}

/// A release file classified by role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateFile {
    /// A payload archive intended for extraction.
    Archive(String),
    /// A detached signature for the archive it names.
    Signature(String),
}

impl CandidateFile {
    /// Return the file name regardless of role.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Archive(name) | Self::Signature(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const ARCHIVE: &str = "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz";
    const SIGNATURE: &str = "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc";

    #[fixture]
    fn naming() -> ArchiveNaming {
        ArchiveNaming::default()
    }

    #[rstest]
    #[case::archive(ARCHIVE, true)]
    #[case::signature(SIGNATURE, true)]
    #[case::digests("stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.DIGESTS", false)]
    #[case::other_family("stage3-amd64-openrc-20240601T120000Z.tar.xz", false)]
    #[case::readme("readme.txt", false)]
    #[case::prefix_only("stage3-amd64-hardened-openrc", false)]
    fn matches_follows_prefix_and_suffix_rules(
        naming: ArchiveNaming,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(naming.matches(name), expected);
    }

    #[rstest]
    fn archive_name_from_signature_strips_suffix(naming: ArchiveNaming) {
        assert_eq!(naming.archive_name_from_signature(SIGNATURE), ARCHIVE);
    }

    #[rstest]
    fn archive_name_from_signature_leaves_archives_alone(naming: ArchiveNaming) {
        assert_eq!(naming.archive_name_from_signature(ARCHIVE), ARCHIVE);
    }

    #[rstest]
    fn signature_name_round_trips(naming: ArchiveNaming) {
        let signature = naming.signature_name_for(ARCHIVE);
        assert_eq!(signature, SIGNATURE);
        assert_eq!(naming.archive_name_from_signature(&signature), ARCHIVE);
    }

    #[rstest]
    fn classify_separates_roles(naming: ArchiveNaming) {
        assert_eq!(
            naming.classify(ARCHIVE),
            CandidateFile::Archive(ARCHIVE.to_owned())
        );
        assert_eq!(
            naming.classify(SIGNATURE),
            CandidateFile::Signature(SIGNATURE.to_owned())
        );
        assert_eq!(naming.classify(SIGNATURE).name(), SIGNATURE);
    }

    #[test]
    fn display_summarises_pattern() {
        assert_eq!(
            ArchiveNaming::default().to_string(),
            "stage3-amd64-hardened-openrc*{.tar.xz,.asc}"
        );
    }
}
