//! System clock synchronisation.
//!
//! Signature checks and TLS both reject a badly skewed clock, so the clock is
//! stepped once before anything is downloaded. A failed sync is reported but
//! does not stop the run.

use crate::command::{CommandExecutor, failure_message};
use log::{info, warn};

/// Program used to step the clock.
pub const CLOCK_SYNC_PROGRAM: &str = "chronyd";

/// Arguments making chronyd set the clock once and exit.
pub const CLOCK_SYNC_ARGS: &[&str] = &["-q"];

/// Outcome of a clock synchronisation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockSync {
    /// The clock was synchronised.
    Synced,
    /// Synchronisation failed; the run continues with the current clock.
    Failed {
        /// Why the attempt failed.
        reason: String,
    },
}

/// Step the system clock with `chronyd -q`.
///
/// Never fails; problems are logged at warn level and returned as
/// [`ClockSync::Failed`].
pub fn sync_clock(executor: &dyn CommandExecutor) -> ClockSync {
    let reason = match executor.run(CLOCK_SYNC_PROGRAM, CLOCK_SYNC_ARGS) {
        Ok(output) if output.status.success() => {
            info!("system clock synchronised");
            return ClockSync::Synced;
        }
        Ok(output) => failure_message(&output),
        Err(err) => err.to_string(),
    };
    warn!("clock synchronisation failed, continuing: {reason}");
    ClockSync::Failed { reason }
}
