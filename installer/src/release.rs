//! Release folder selection.
//!
//! Mirrors publish each build in a folder named after its UTC build time. The
//! newest folder on the root index is the release to install.

use crate::error::{InstallerError, Result};
use crate::timestamp;
use log::debug;

/// Pick the most recent release folder from folder-mode index entries.
///
/// `url` names the index the entries came from and is only used for error
/// context.
///
/// # Errors
///
/// Returns [`InstallerError::NoReleasesFound`] when `folders` is empty or
/// contains no valid timestamp.
///
/// # Examples
///
/// ```
/// use stage3_installer::release::select_latest;
///
/// let folders = vec![
///     "20240101T000000Z".to_owned(),
///     "20240601T120000Z".to_owned(),
///     "20240315T083000Z".to_owned(),
/// ];
/// let latest = select_latest(&folders, "https://mirror.test/autobuilds/")?;
/// assert_eq!(latest, "20240601T120000Z");
/// # Ok::<(), stage3_installer::error::InstallerError>(())
/// ```
pub fn select_latest(folders: &[String], url: &str) -> Result<String> {
    match timestamp::latest(folders.iter().map(String::as_str)) {
        Ok(latest) => {
            debug!("selected release folder {latest} from {} candidates", folders.len());
            Ok(latest.to_owned())
        }
        Err(err) => {
            debug!("no usable release folder at {url}: {err}");
            Err(InstallerError::NoReleasesFound {
                url: url.to_owned(),
            })
        }
    }
}
