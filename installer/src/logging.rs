//! Diagnostic logging setup.
//!
//! Library code logs through the `log` facade. The binary installs a
//! `tracing-subscriber` formatter on stderr, which also picks up `log`
//! records, at a level chosen by the `-v`/`-q` flags. `RUST_LOG` overrides
//! the flags when set.

use log::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map CLI verbosity flags to a maximum log level.
///
/// Warnings are shown by default; each `-v` adds one level. `--quiet` keeps
/// errors only.
#[must_use]
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Render `level` as an `EnvFilter` directive.
fn directive(level: LevelFilter) -> String {
    level.as_str().to_ascii_lowercase()
}

/// Build the event filter: `RUST_LOG` when set, otherwise `level`.
#[must_use]
pub fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)))
}

/// Install the stderr subscriber for the process.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(verbosity: u8, quiet: bool) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level_for(verbosity, quiet)))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        log::debug!("logging already initialised");
    }
}
