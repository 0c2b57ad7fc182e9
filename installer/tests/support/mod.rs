//! Test support utilities for installer integration tests.
//!
//! Provides a minimal HTTP/1.1 server on the loopback interface that answers
//! GET requests from a fixed route table, so the real `ureq` transport can be
//! exercised without network access.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A canned answer for one request path.
#[derive(Debug, Clone)]
pub enum Route {
    /// `200 OK` with the given body.
    Body(Vec<u8>),
    /// A redirect with the given status and `Location` header value.
    Redirect(u16, String),
    /// A bare status with an empty body.
    Status(u16, &'static str),
}

/// Starts a server in a background thread serving `routes` keyed by request
/// path (e.g. `/autobuilds/`). Unknown paths answer 404. Returns the base URL
/// without a trailing slash (e.g. `http://127.0.0.1:12345`). The server runs
/// until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, route)| (path.to_owned(), route))
            .collect(),
    );
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{port}")
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(path) = read_request_path(&mut stream) else {
        return;
    };

    let (status_line, location, body) = match routes.get(&path) {
        Some(Route::Body(body)) => ("200 OK".to_owned(), None, body.clone()),
        Some(Route::Redirect(status, location)) => {
            (format!("{status} Moved"), Some(location.clone()), Vec::new())
        }
        Some(Route::Status(status, reason)) => (format!("{status} {reason}"), None, Vec::new()),
        None => ("404 Not Found".to_owned(), None, Vec::new()),
    };

    let location_header = location
        .map(|value| format!("Location: {value}\r\n"))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\n{location_header}Connection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

/// Read the request head and return the path of the request line.
fn read_request_path(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|window| window == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(chunk.get(..n)?);
    }
    let request = String::from_utf8_lossy(&buf);
    let line = request.lines().next()?;
    line.split_whitespace().nth(1).map(str::to_owned)
}
