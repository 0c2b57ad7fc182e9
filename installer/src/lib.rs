//! Gentoo stage3 installer library.
//!
//! This crate locates the newest timestamped release on a Gentoo mirror,
//! downloads the stage3 archive with its detached signature, verifies the
//! signature with an external tool, and places the verified archive in the
//! installation target. It is used by the `stage3-installer` CLI binary and
//! can be consumed programmatically for testing or custom workflows.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`clock`] - System clock synchronisation before downloading
//! - [`command`] - External command execution with timeouts
//! - [`config`] - Layered TOML and CLI configuration
//! - [`error`] - Semantic error types
//! - [`extract`] - Optional `tar` handoff of the verified archive
//! - [`fetch`] - Redirect-following HTTP retrieval
//! - [`index`] - Directory index parsing
//! - [`logging`] - Stderr subscriber setup for diagnostics
//! - [`naming`] - Archive family naming convention
//! - [`output`] - Progress and summary output
//! - [`picker`] - Release file classification
//! - [`pipeline`] - Discovery, download, and verification orchestration
//! - [`release`] - Release folder selection
//! - [`stage`] - Placement of the verified archive
//! - [`timestamp`] - Release folder timestamp codec
//! - [`verify`] - Detached signature verification

pub mod cli;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod logging;
pub mod naming;
pub mod output;
pub mod picker;
pub mod pipeline;
pub mod release;
pub mod stage;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod timestamp;
pub mod verify;
