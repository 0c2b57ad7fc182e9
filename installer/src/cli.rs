//! CLI argument definitions for the stage3 installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Fetch, verify, and stage the latest Gentoo stage3 archive.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "stage3-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch, verify, and stage the latest Gentoo stage3 archive.\n\n",
    "The installer reads the mirror's directory index, picks the newest ",
    "timestamped release folder, downloads the stage3 archive and its detached ",
    "signature, checks the signature with gpg, and moves the verified archive ",
    "into the installation target.\n\n",
    "The target directory (by default /mnt/gentoo) must already be mounted and ",
    "writable. Partitioning and filesystem setup are not performed.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Fetch the default hardened OpenRC archive into /mnt/gentoo:\n",
    "    $ stage3-installer\n\n",
    "  Use a nearby mirror and extract after verification:\n",
    "    $ stage3-installer --mirror-url https://mirror.example/gentoo/releases/amd64/autobuilds/ --extract\n\n",
    "  Select a different archive family:\n",
    "    $ stage3-installer --archive-prefix stage3-amd64-systemd\n\n",
    "  Preview the release that would be installed:\n",
    "    $ stage3-installer --dry-run",
))]
pub struct Cli {
    /// Read settings from a TOML file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory index listing timestamped release folders.
    #[arg(short, long, value_name = "URL")]
    pub mirror_url: Option<String>,

    /// File name prefix of the archive family to install.
    #[arg(short, long, value_name = "PREFIX")]
    pub archive_prefix: Option<String>,

    /// Directory to download into [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Installation target receiving the verified archive [default: /mnt/gentoo].
    #[arg(short, long, value_name = "DIR")]
    pub target_dir: Option<Utf8PathBuf>,

    /// Maximum number of HTTP redirects to follow per request.
    #[arg(long, value_name = "N")]
    pub max_redirects: Option<usize>,

    /// Network timeout per request, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Do not synchronise the system clock before downloading.
    #[arg(long)]
    pub skip_time_sync: bool,

    /// Unpack the verified archive into the target directory and remove it.
    #[arg(short = 'x', long)]
    pub extract: bool,

    /// Show the release that would be installed and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        alias = "verbosity",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
