//! Release timestamp codec.
//!
//! Release folders on the mirror are named after the UTC build time in the
//! compact ISO 8601 form `YYYYMMDDTHHMMSSZ`. This module validates such names,
//! orders them chronologically, and picks the most recent one.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `chrono` format string matching release folder names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Exact length of a release timestamp.
const TIMESTAMP_LEN: usize = 16;

/// Byte offset of the `T` date/time separator.
const DATE_TIME_SEPARATOR: usize = 8;

/// Byte offset of the trailing `Z` zone designator.
const ZONE_DESIGNATOR: usize = 15;

/// Errors arising from timestamp parsing and selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The value does not have the `YYYYMMDDTHHMMSSZ` shape or is not a real
    /// calendar date and time.
    #[error("invalid release timestamp \"{value}\": {reason}")]
    Format {
        /// The rejected string.
        value: String,
        /// Description of the violated constraint.
        reason: String,
    },

    /// `latest` was called with no candidates.
    #[error("cannot select the latest timestamp from an empty set")]
    EmptyInput,
}

/// Result type alias using [`TimestampError`].
pub type Result<T> = std::result::Result<T, TimestampError>;

/// A parsed release timestamp.
///
/// Ordering is chronological.
///
/// # Examples
///
/// ```
/// use stage3_installer::timestamp::ReleaseTimestamp;
///
/// let early = ReleaseTimestamp::parse("20240101T000000Z").expect("valid");
/// let late = ReleaseTimestamp::parse("20240601T120000Z").expect("valid");
/// assert!(early < late);
/// assert_eq!(late.to_string(), "20240601T120000Z");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseTimestamp(NaiveDateTime);

impl ReleaseTimestamp {
    /// Parse a release timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] unless `value` matches
    /// `YYYYMMDDTHHMMSSZ` exactly.
    pub fn parse(value: &str) -> Result<Self> {
        check_shape(value)?;
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| format_error(value, e.to_string()))
    }

    /// Return whether `value` is a well-formed release timestamp.
    ///
    /// ```
    /// use stage3_installer::timestamp::ReleaseTimestamp;
    ///
    /// assert!(ReleaseTimestamp::is_valid("20240601T120000Z"));
    /// assert!(!ReleaseTimestamp::is_valid("current-stage3-amd64"));
    /// ```
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_ok()
    }
}

impl FromStr for ReleaseTimestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ReleaseTimestamp {
    type Error = TimestampError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Display for ReleaseTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Return the input string whose timestamp is the most recent.
///
/// The returned slice is one of the inputs, not a re-formatted value.
///
/// # Errors
///
/// Returns [`TimestampError::EmptyInput`] when `values` is empty and
/// [`TimestampError::Format`] when any element is not a valid timestamp.
///
/// # Examples
///
/// ```
/// use stage3_installer::timestamp::latest;
///
/// let folders = ["20240101T000000Z", "20240601T120000Z", "20240301T080000Z"];
/// assert_eq!(latest(folders).expect("non-empty"), "20240601T120000Z");
/// ```
pub fn latest<'a, I>(values: I) -> Result<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(ReleaseTimestamp, &'a str)> = None;
    for value in values {
        let parsed = ReleaseTimestamp::parse(value)?;
        if best.is_none_or(|(current, _)| parsed > current) {
            best = Some((parsed, value));
        }
    }
    best.map(|(_, value)| value)
        .ok_or(TimestampError::EmptyInput)
}

/// Reject anything that is not exactly eight digits, `T`, six digits, `Z`.
///
/// `chrono` alone is more lenient (signs, short years), so the shape is
/// checked first.
fn check_shape(value: &str) -> Result<()> {
    if value.len() != TIMESTAMP_LEN {
        return Err(format_error(
            value,
            format!("expected {TIMESTAMP_LEN} characters, got {}", value.len()),
        ));
    }
    for (index, byte) in value.bytes().enumerate() {
        let ok = match index {
            DATE_TIME_SEPARATOR => byte == b'T',
            ZONE_DESIGNATOR => byte == b'Z',
            _ => byte.is_ascii_digit(),
        };
        if !ok {
            return Err(format_error(
                value,
                format!("unexpected character at position {index}"),
            ));
        }
    }
    Ok(())
}

fn format_error(value: &str, reason: String) -> TimestampError {
    TimestampError::Format {
        value: value.to_owned(),
        reason,
    }
}
