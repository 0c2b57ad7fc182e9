//! Redirect-following HTTP retrieval.
//!
//! The fetcher is split in two layers. [`HttpTransport`] performs exactly one
//! GET request and reports the raw status, `Location` header, and body; it
//! never follows redirects on its own. [`RedirectFetcher`] drives a transport,
//! resolving `301`/`302` responses against the current URL until a `200`
//! arrives or the hop budget is spent. Tests substitute the transport.

mod transport;

pub use transport::{DEFAULT_TIMEOUT, UreqTransport};

use log::{debug, info};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use url::Url;

/// Default number of redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Errors arising from HTTP retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a status other than 200 that is not a
    /// followable redirect.
    #[error("GET {url} returned {status} {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The reason phrase for the status.
        reason: String,
    },

    /// More redirects were issued than the configured bound allows.
    #[error("too many redirects fetching {url} (limit {limit})")]
    RedirectLoop {
        /// The URL the chain started from.
        url: String,
        /// The redirect bound that was exceeded.
        limit: usize,
    },

    /// A `Location` header could not be resolved to a URL.
    #[error("invalid redirect from {url} to {location}: {reason}")]
    InvalidRedirect {
        /// The URL that issued the redirect.
        url: String,
        /// The raw `Location` header value.
        location: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// The request could not be completed (DNS, TLS, connection, timeout).
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// Reading the body or writing it to disk failed.
    #[error("I/O error during transfer: {0}")]
    Io(#[from] std::io::Error),
}

/// A single, un-followed HTTP response.
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase for the status code.
    pub reason: String,
    /// Raw `Location` header, if present.
    pub location: Option<String>,
    /// The response body, streamed.
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    /// Build a response with an in-memory body.
    #[must_use]
    pub fn from_bytes(status: u16, reason: &str, location: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            reason: reason.to_owned(),
            location,
            body: Box::new(std::io::Cursor::new(body)),
        }
    }

    fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Capability for issuing one GET request.
///
/// Implementations must not follow redirects themselves.
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport {
    /// Issue a GET request for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when no response was received. Any
    /// received status, including error statuses, is returned as `Ok`.
    fn get(&self, url: &Url) -> Result<HttpResponse, FetchError>;
}

/// A fully read page together with the URL it was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// The response body.
    pub content: Vec<u8>,
    /// The URL after all redirects; relative links resolve against it.
    pub final_url: Url,
}

impl Fetched {
    /// Return the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Follows redirects on top of an [`HttpTransport`].
pub struct RedirectFetcher<'a> {
    transport: &'a dyn HttpTransport,
    max_redirects: usize,
}

impl<'a> RedirectFetcher<'a> {
    /// Create a fetcher with the default redirect bound.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self::with_max_redirects(transport, DEFAULT_MAX_REDIRECTS)
    }

    /// Create a fetcher that follows at most `max_redirects` redirects.
    #[must_use]
    pub fn with_max_redirects(transport: &'a dyn HttpTransport, max_redirects: usize) -> Self {
        Self {
            transport,
            max_redirects,
        }
    }

    /// Fetch `url` into memory.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on non-200 responses, redirect loops,
    /// transport failures, or body read failures.
    pub fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let (mut response, final_url) = self.follow(url)?;
        let mut content = Vec::new();
        response.body.read_to_end(&mut content)?;
        Ok(Fetched { content, final_url })
    }

    /// Stream `url` into a new file at `dest`, returning the final URL.
    ///
    /// A partially written file is removed when the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on non-200 responses, redirect loops,
    /// transport failures, or I/O failures.
    pub fn download_to(&self, url: &Url, dest: &Path) -> Result<Url, FetchError> {
        let (mut response, final_url) = self.follow(url)?;
        let copied = File::create(dest)
            .and_then(|mut file| std::io::copy(&mut response.body, &mut file));
        match copied {
            Ok(bytes) => {
                info!("downloaded {bytes} bytes from {final_url} to {}", dest.display());
                Ok(final_url)
            }
            Err(e) => {
                let _ = std::fs::remove_file(dest);
                Err(FetchError::Io(e))
            }
        }
    }

    /// Issue requests until a 200 response arrives.
    fn follow(&self, url: &Url) -> Result<(HttpResponse, Url), FetchError> {
        let mut current = url.clone();
        for _ in 0..=self.max_redirects {
            let response = self.transport.get(&current)?;
            if response.status == 200 {
                return Ok((response, current));
            }
            let next = match (&response.location, response.is_redirect()) {
                (Some(location), true) => resolve_location(&current, location)?,
                _ => {
                    return Err(FetchError::Http {
                        url: current.to_string(),
                        status: response.status,
                        reason: response.reason,
                    });
                }
            };
            debug!("redirect {} {current} -> {next}", response.status);
            current = next;
        }
        Err(FetchError::RedirectLoop {
            url: url.to_string(),
            limit: self.max_redirects,
        })
    }
}

/// Resolve a `Location` header against the URL that issued it.
fn resolve_location(base: &Url, location: &str) -> Result<Url, FetchError> {
    base.join(location)
        .map_err(|e| FetchError::InvalidRedirect {
            url: base.to_string(),
            location: location.to_owned(),
            reason: e.to_string(),
        })
}
