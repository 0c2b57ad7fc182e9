//! Shared test utilities for the installer crate.

use crate::command::CommandExecutor;
use crate::error::{InstallerError, Result};
use crate::fetch::{FetchError, HttpResponse, HttpTransport};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::process::{ExitStatus, Output};
use url::Url;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Render a minimal directory index page linking to each of `hrefs`.
pub fn index_page(hrefs: &[&str]) -> String {
    let rows: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>\r\n"))
        .collect();
    format!("<html><head><title>Index</title></head><body><pre>\r\n{rows}</pre></body></html>")
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "gpg").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Build an expectation from borrowed command parts.
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// A canned HTTP answer served by [`StubTransport`].
#[derive(Debug, Clone)]
pub enum StubRoute {
    /// `200 OK` with the given body.
    Body(Vec<u8>),
    /// A redirect with the given status and `Location` header.
    Redirect(u16, String),
    /// Any other status with an empty body.
    Status(u16),
    /// A transport-level failure.
    Unreachable,
}

/// An `HttpTransport` that serves canned routes keyed by absolute URL.
///
/// Unknown URLs answer `404 Not Found`. Every request is recorded.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: HashMap<String, StubRoute>,
    requests: RefCell<Vec<String>>,
}

impl StubTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    #[must_use]
    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(url.to_owned(), StubRoute::Body(body.into()));
        self
    }

    /// Redirect `url` to `location` with `status`.
    #[must_use]
    pub fn with_redirect(mut self, url: &str, status: u16, location: &str) -> Self {
        self.routes
            .insert(url.to_owned(), StubRoute::Redirect(status, location.to_owned()));
        self
    }

    /// Answer `url` with a bare status.
    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_owned(), StubRoute::Status(status));
        self
    }

    /// Fail requests for `url` at the transport level.
    #[must_use]
    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.routes.insert(url.to_owned(), StubRoute::Unreachable);
        self
    }

    /// Return every requested URL in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, url: &Url) -> std::result::Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        let response = match self.routes.get(url.as_str()) {
            Some(StubRoute::Body(body)) => HttpResponse::from_bytes(200, "OK", None, body.clone()),
            Some(StubRoute::Redirect(status, location)) => {
                HttpResponse::from_bytes(*status, "Found", Some(location.clone()), Vec::new())
            }
            Some(StubRoute::Status(status)) => {
                HttpResponse::from_bytes(*status, "Error", None, Vec::new())
            }
            Some(StubRoute::Unreachable) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    reason: "connection refused".to_owned(),
                });
            }
            None => HttpResponse::from_bytes(404, "Not Found", None, Vec::new()),
        };
        Ok(response)
    }
}
