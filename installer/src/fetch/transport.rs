//! `ureq`-backed implementation of [`HttpTransport`].

use super::{FetchError, HttpResponse, HttpTransport};
use std::time::Duration;
use url::Url;

/// Default network timeout for a single request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP transport using `ureq`.
///
/// Redirect handling is disabled in the agent so that every hop is visible
/// to [`super::RedirectFetcher`], and error statuses are returned as
/// responses rather than errors.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with the given global request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .max_redirects(0)
            // With redirects disabled, hand the 3xx response back instead of
            // failing with TooManyRedirects.
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let status = response.status();
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            location,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &Url, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Http {
            url: url.to_string(),
            status: *status,
            reason: String::new(),
        },
        other => FetchError::Transport {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
