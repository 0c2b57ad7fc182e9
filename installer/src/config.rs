//! Installer configuration.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, an optional TOML file, and built-in defaults. The file mirrors the
//! flag set in four tables:
//!
//! ```toml
//! [mirror]
//! url = "https://distfiles.gentoo.org/releases/amd64/autobuilds/"
//! max_redirects = 10
//! timeout_secs = 30
//!
//! [archive]
//! prefix = "stage3-amd64-hardened-openrc"
//! payload_suffix = ".tar.xz"
//! signature_suffix = ".asc"
//!
//! [paths]
//! work_dir = "/var/tmp/stage3"
//! target_dir = "/mnt/gentoo"
//!
//! [verify]
//! program = "gpg"
//! args = ["--verify"]
//! ```

use crate::cli::Cli;
use crate::error::{InstallerError, Result};
use crate::fetch::DEFAULT_MAX_REDIRECTS;
use crate::naming::ArchiveNaming;
use crate::pipeline::{DEFAULT_MIRROR_URL, DEFAULT_TARGET_DIR, PipelineContext};
use crate::verify::VerifierCommand;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Default network timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Mirror access settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Directory index listing timestamped release folders.
    pub url: String,
    /// Redirect bound per request.
    pub max_redirects: usize,
    /// Network timeout per request, in seconds.
    pub timeout_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MIRROR_URL.to_owned(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Local directories used by a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Download directory; the current directory when unset.
    pub work_dir: Option<Utf8PathBuf>,
    /// Installation target receiving the verified archive.
    pub target_dir: Utf8PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            target_dir: Utf8PathBuf::from(DEFAULT_TARGET_DIR),
        }
    }
}

/// Fully resolved installer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Mirror access settings.
    pub mirror: MirrorConfig,
    /// Archive family naming.
    pub archive: ArchiveNaming,
    /// Local directories.
    pub paths: PathsConfig,
    /// External signature verifier.
    pub verify: VerifierCommand,
}

impl InstallerConfig {
    /// Parse configuration from TOML text.
    ///
    /// `path` is only used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] on malformed TOML, unknown
    /// keys, or mistyped values.
    pub fn from_toml(contents: &str, path: &Utf8Path) -> Result<Self> {
        toml::from_str(contents).map_err(|e| InstallerError::InvalidConfig {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| InstallerError::InvalidConfig {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        Self::from_toml(&contents, path)
    }

    /// Resolve settings for a CLI invocation.
    ///
    /// Loads `--config` when given, then applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] when the configuration file
    /// is unreadable or invalid.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay explicitly given CLI flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.mirror_url {
            self.mirror.url.clone_from(url);
        }
        if let Some(limit) = cli.max_redirects {
            self.mirror.max_redirects = limit;
        }
        if let Some(secs) = cli.timeout_secs {
            self.mirror.timeout_secs = secs;
        }
        if let Some(prefix) = &cli.archive_prefix {
            self.archive.prefix.clone_from(prefix);
        }
        if let Some(dir) = &cli.work_dir {
            self.paths.work_dir = Some(dir.clone());
        }
        if let Some(dir) = &cli.target_dir {
            self.paths.target_dir.clone_from(dir);
        }
    }

    /// Return the network timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.mirror.timeout_secs)
    }

    /// Parse the mirror URL.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidUrl`] if the URL does not parse.
    pub fn mirror_url(&self) -> Result<Url> {
        Url::parse(&self.mirror.url).map_err(|e| InstallerError::InvalidUrl {
            url: self.mirror.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Build the pipeline context, defaulting the working directory to
    /// `current_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidUrl`] if the mirror URL does not
    /// parse.
    pub fn pipeline_context(&self, current_dir: &Utf8Path, quiet: bool) -> Result<PipelineContext> {
        Ok(PipelineContext {
            mirror_url: self.mirror_url()?,
            naming: self.archive.clone(),
            work_dir: self
                .paths
                .work_dir
                .clone()
                .unwrap_or_else(|| current_dir.to_owned()),
            target_dir: self.paths.target_dir.clone(),
            verifier: self.verify.clone(),
            quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    fn path() -> Utf8PathBuf {
        Utf8PathBuf::from("/etc/stage3-installer.toml")
    }

    #[test]
    fn defaults_match_gentoo_hardened_amd64() {
        let config = InstallerConfig::default();
        assert_eq!(config.mirror.url, DEFAULT_MIRROR_URL);
        assert_eq!(config.mirror.max_redirects, 10);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.archive.prefix, "stage3-amd64-hardened-openrc");
        assert_eq!(config.paths.target_dir, "/mnt/gentoo");
        assert!(config.paths.work_dir.is_none());
        assert_eq!(config.verify.program, "gpg");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = InstallerConfig::from_toml(
            "[archive]\nprefix = \"stage3-amd64-systemd\"\n\n[paths]\nwork_dir = \"/var/tmp\"\n",
            &path(),
        )
        .expect("valid config");
        assert_eq!(config.archive.prefix, "stage3-amd64-systemd");
        assert_eq!(config.archive.signature_suffix, ".asc");
        assert_eq!(config.paths.work_dir, Some(Utf8PathBuf::from("/var/tmp")));
        assert_eq!(config.paths.target_dir, "/mnt/gentoo");
    }

    #[test]
    fn verifier_table_replaces_program_and_args() {
        let config = InstallerConfig::from_toml(
            "[verify]\nprogram = \"gpgv\"\nargs = [\"--keyring\", \"/usr/share/openpgp-keys/gentoo-release.asc\"]\n",
            &path(),
        )
        .expect("valid config");
        assert_eq!(config.verify.program, "gpgv");
        assert_eq!(config.verify.args.len(), 2);
    }

    #[rstest]
    #[case::unknown_table("[mirrors]\nurl = \"x\"\n")]
    #[case::unknown_key("[mirror]\nretries = 3\n")]
    #[case::wrong_type("[mirror]\nmax_redirects = \"ten\"\n")]
    #[case::malformed("[mirror\n")]
    fn invalid_files_are_rejected(#[case] contents: &str) {
        let err = InstallerConfig::from_toml(contents, &path()).expect_err("invalid config");
        assert!(matches!(err, InstallerError::InvalidConfig { .. }));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = InstallerConfig::from_toml(
            "[mirror]\nurl = \"https://file.test/\"\nmax_redirects = 4\n",
            &path(),
        )
        .expect("valid config");
        let cli = Cli::parse_from([
            "stage3-installer",
            "--mirror-url",
            "https://flag.test/",
            "--target-dir",
            "/mnt/other",
        ]);
        config.apply_cli(&cli);
        assert_eq!(config.mirror.url, "https://flag.test/");
        assert_eq!(config.mirror.max_redirects, 4);
        assert_eq!(config.paths.target_dir, "/mnt/other");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = InstallerConfig::load(Utf8Path::new("/nonexistent/stage3.toml"))
            .expect_err("missing file");
        assert!(matches!(err, InstallerError::InvalidConfig { .. }));
    }

    #[test]
    fn pipeline_context_defaults_work_dir_to_current_dir() {
        let config = InstallerConfig::default();
        let context = config
            .pipeline_context(Utf8Path::new("/root"), true)
            .expect("context");
        assert_eq!(context.work_dir, "/root");
        assert_eq!(context.target_dir, "/mnt/gentoo");
        assert!(context.quiet);
    }

    #[test]
    fn invalid_mirror_url_is_reported() {
        let config = InstallerConfig {
            mirror: MirrorConfig {
                url: "not a url".to_owned(),
                ..MirrorConfig::default()
            },
            ..InstallerConfig::default()
        };
        let err = config.mirror_url().expect_err("invalid URL");
        assert!(matches!(err, InstallerError::InvalidUrl { .. }));
    }
}
